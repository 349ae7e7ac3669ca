//! Search terms derived from project information

use crate::models::ProjectInfo;
use crate::models::SearchQuery;

/// Ceilings above this height (metres) call for high-bay fixtures
pub const HIGH_CEILING_THRESHOLD: f64 = 8.0;

pub const HIGH_CEILING: &str = "高天井";
pub const LOW_CEILING: &str = "低天井";
pub const SPECIAL_ENVIRONMENT: &str = "特殊環境";
pub const CLEAN_ROOM: &str = "クリーンルーム";
pub const KITCHEN: &str = "厨房";

const CLEAN_ROOM_CUES: [&str; 2] = ["クリーン", "無塵"];
const KITCHEN_CUES: [&str; 2] = ["厨房", "HACCP"];
const QUERY_SUFFIX: &str = "に適した照明器具";

/// Build the retrieval query and keyword set for a project
///
/// Property and room names feed both the query text and the keywords.
/// A ceiling above [`HIGH_CEILING_THRESHOLD`] adds `高天井` to both; any
/// other known height adds `低天井` to the keywords only. Zero, negative and
/// non-finite heights are treated as missing and add neither
/// (see [`ProjectInfo::known_ceiling_height`]). A special
/// environment adds `特殊環境` to both, plus cue-driven keywords taken
/// from the user's latest message.
#[must_use]
pub fn derive_search_terms(info: &ProjectInfo, latest_message: &str, limit: usize) -> SearchQuery {
    let mut parts: Vec<String> = Vec::new();
    let mut keywords: Vec<String> = Vec::new();

    for name in [&info.property_name, &info.room_name].into_iter().flatten() {
        let name = name.trim();
        if !name.is_empty() {
            parts.push(name.to_string());
            keywords.push(name.to_string());
        }
    }

    if let Some(height) = info.known_ceiling_height() {
        if height > HIGH_CEILING_THRESHOLD {
            keywords.push(HIGH_CEILING.to_string());
            parts.push(HIGH_CEILING.to_string());
        } else {
            keywords.push(LOW_CEILING.to_string());
        }
    }

    if info.special_environment {
        keywords.push(SPECIAL_ENVIRONMENT.to_string());
        parts.push(SPECIAL_ENVIRONMENT.to_string());
        if CLEAN_ROOM_CUES.iter().any(|cue| latest_message.contains(cue)) {
            keywords.push(CLEAN_ROOM.to_string());
        }
        if KITCHEN_CUES.iter().any(|cue| latest_message.contains(cue)) {
            keywords.push(KITCHEN.to_string());
        }
    }

    let text = format!("{}{QUERY_SUFFIX}", parts.join(" "));
    SearchQuery::new(text, keywords, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(property: &str) -> ProjectInfo {
        ProjectInfo {
            property_name: Some(property.to_string()),
            ..ProjectInfo::default()
        }
    }

    #[test]
    fn test_high_ceiling_special_environment() {
        let project = ProjectInfo {
            room_name: Some("製造エリア".to_string()),
            ceiling_height: Some(10.0),
            special_environment: true,
            ..info("山田工場")
        };

        let query = derive_search_terms(&project, "クリーンルーム対応が必要", 10);
        assert_eq!(query.text, "山田工場 製造エリア 高天井 特殊環境に適した照明器具");
        assert_eq!(
            query.keywords,
            vec!["山田工場", "製造エリア", "高天井", "特殊環境", "クリーンルーム"]
        );
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_low_ceiling_only_adds_keyword() {
        let project = ProjectInfo {
            room_name: Some("会議室".to_string()),
            ceiling_height: Some(2.7),
            ..info("本社ビル")
        };

        let query = derive_search_terms(&project, "", 10);
        assert_eq!(query.text, "本社ビル 会議室に適した照明器具");
        assert_eq!(query.keywords, vec!["本社ビル", "会議室", "低天井"]);
    }

    #[test]
    fn test_exact_threshold_is_low_ceiling() {
        let project = ProjectInfo {
            ceiling_height: Some(8.0),
            ..info("倉庫")
        };
        let query = derive_search_terms(&project, "", 10);
        assert!(query.keywords.contains(&LOW_CEILING.to_string()));
        assert!(!query.text.contains(HIGH_CEILING));
    }

    #[test]
    fn test_zero_height_adds_nothing() {
        let project = ProjectInfo {
            ceiling_height: Some(0.0),
            ..info("倉庫")
        };
        assert_eq!(derive_search_terms(&project, "", 10).keywords, vec!["倉庫"]);
    }

    #[test]
    fn test_negative_height_adds_nothing() {
        let project = ProjectInfo {
            ceiling_height: Some(-2.5),
            ..info("倉庫")
        };
        let query = derive_search_terms(&project, "", 10);
        assert_eq!(query.keywords, vec!["倉庫"]);
        assert_eq!(query.text, "倉庫に適した照明器具");
    }

    #[test]
    fn test_kitchen_cues() {
        let project = ProjectInfo {
            special_environment: true,
            ..info("セントラルキッチン")
        };
        let query = derive_search_terms(&project, "HACCP準拠の施設です", 10);
        assert_eq!(query.keywords, vec!["セントラルキッチン", "特殊環境", "厨房"]);
    }

    #[test]
    fn test_cues_ignored_without_special_environment() {
        let query = derive_search_terms(&info("病院"), "無塵室もあります", 10);
        assert_eq!(query.keywords, vec!["病院"]);
    }
}
