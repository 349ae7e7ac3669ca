use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// One selectable lighting-fixture category from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    /// Absent or zero means unconstrained
    #[serde(default)]
    pub ceiling_height_min: Option<f64>,
    /// Absent or zero means unconstrained
    #[serde(default)]
    pub ceiling_height_max: Option<f64>,
    #[serde(default)]
    pub suitable_for: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FixtureCategory {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            manufacturer: None,
            series: None,
            ceiling_height_min: None,
            ceiling_height_max: None,
            suitable_for: Vec::new(),
            description: None,
            embedding: None,
            updated_at: None,
        }
    }

    /// Whether a ceiling of `height` metres is inside the category's range
    #[must_use]
    pub fn fits_ceiling(&self, height: f64) -> bool {
        let bound = |b: Option<f64>| b.filter(|v| *v > 0.0);
        let above_min = bound(self.ceiling_height_min).map_or(true, |min| height >= min);
        let below_max = bound(self.ceiling_height_max).map_or(true, |max| height <= max);
        above_min && below_max
    }

    /// Tags joined for prompts and display
    #[must_use]
    pub fn tags_joined(&self) -> String {
        self.suitable_for.join(", ")
    }

    /// Text used to compute the stored embedding: description, then a usage line
    #[must_use]
    pub fn embedding_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(desc) = self.description.as_deref().map(str::trim) {
            if !desc.is_empty() {
                parts.push(desc.to_string());
            }
        }
        if !self.suitable_for.is_empty() {
            parts.push(format!("用途: {}", self.tags_joined()));
        }
        parts.join("\n")
    }
}

/// A catalog entry together with its vector similarity, when one was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCategory {
    #[serde(flatten)]
    pub category: FixtureCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl ScoredCategory {
    #[must_use]
    pub const fn unscored(category: FixtureCategory) -> Self {
        Self {
            category,
            similarity: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.category.id
    }
}

impl From<FixtureCategory> for ScoredCategory {
    fn from(category: FixtureCategory) -> Self {
        Self::unscored(category)
    }
}

/// Per-request search input derived from the project attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub keywords: Vec<String>,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, keywords: Vec<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            keywords,
            limit,
        }
    }
}

/// Relevance-ordered candidates, unique by id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedCandidateList {
    items: Vec<ScoredCategory>,
    #[serde(skip)]
    ids: HashSet<i64>,
}

impl RankedCandidateList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless an entry with the same id is already present
    pub fn push(&mut self, candidate: ScoredCategory) -> bool {
        if !self.ids.insert(candidate.id()) {
            return false;
        }
        self.items.push(candidate);
        true
    }

    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn truncate(&mut self, len: usize) {
        for dropped in self.items.drain(len.min(self.items.len())..) {
            self.ids.remove(&dropped.id());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredCategory> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ScoredCategory] {
        &self.items
    }

    #[must_use]
    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(ScoredCategory::id).collect()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ScoredCategory> {
        self.items
    }
}

impl FromIterator<ScoredCategory> for RankedCandidateList {
    fn from_iter<I: IntoIterator<Item = ScoredCategory>>(iter: I) -> Self {
        let mut list = Self::new();
        for candidate in iter {
            list.push(candidate);
        }
        list
    }
}

impl IntoIterator for RankedCandidateList {
    type Item = ScoredCategory;
    type IntoIter = std::vec::IntoIter<ScoredCategory>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedCandidateList {
    type Item = &'a ScoredCategory;
    type IntoIter = std::slice::Iter<'a, ScoredCategory>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Kind of quotation the project is for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[serde(alias = "リニューアル")]
    Renewal,
    #[serde(alias = "相見積もり", alias = "他社との相見積もり")]
    CompetitiveQuote,
    #[default]
    #[serde(alias = "新規見積")]
    NewQuote,
}

impl ProjectType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Renewal => "リニューアル",
            Self::CompetitiveQuote => "相見積もり",
            Self::NewQuote => "新規見積",
        }
    }
}

/// Project attributes gathered through the conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    /// Metres
    #[serde(default)]
    pub ceiling_height: Option<f64>,
    /// Impression taken from the drawings
    #[serde(default)]
    pub impression: Option<String>,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub special_environment: bool,
    #[serde(default)]
    pub dimming: bool,
    #[serde(default)]
    pub color_temperature: bool,
}

impl ProjectInfo {
    /// Ceiling height in metres, if one usable for fixture selection was given
    ///
    /// Zero, negative and non-finite values count as not given.
    #[must_use]
    pub fn known_ceiling_height(&self) -> Option<f64> {
        self.ceiling_height.filter(|h| h.is_finite() && *h > 0.0)
    }

    /// Enough information to search the catalog
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        self.property_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub search_queries: Option<Vec<String>>,
    #[serde(default)]
    pub candidates: Option<Vec<ScoredCategory>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: i64) -> ScoredCategory {
        FixtureCategory::new(id, format!("fixture-{id}")).into()
    }

    #[test]
    fn test_ranked_list_rejects_duplicate_ids() {
        let mut list = RankedCandidateList::new();
        assert!(list.push(scored(1)));
        assert!(list.push(scored(2)));
        assert!(!list.push(scored(1)));
        assert_eq!(list.ids(), vec![1, 2]);
    }

    #[test]
    fn test_ranked_list_truncate_releases_ids() {
        let mut list: RankedCandidateList = (1..=4).map(scored).collect();
        list.truncate(2);
        assert_eq!(list.ids(), vec![1, 2]);
        assert!(!list.contains(3));
        assert!(list.push(scored(3)));
    }

    #[test]
    fn test_ranked_list_serializes_as_array() {
        let list: RankedCandidateList = vec![scored(7)].into_iter().collect();
        let json = serde_json::to_value(&list).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], 7);
        assert!(json[0].get("embedding").is_none());
    }

    #[test]
    fn test_fits_ceiling_treats_zero_as_unbounded() {
        let mut category = FixtureCategory::new(1, "high bay");
        category.ceiling_height_min = Some(6.0);
        category.ceiling_height_max = Some(0.0);
        assert!(category.fits_ceiling(12.0));
        assert!(!category.fits_ceiling(3.0));

        category.ceiling_height_min = None;
        assert!(category.fits_ceiling(2.4));
    }

    #[test]
    fn test_embedding_text() {
        let mut category = FixtureCategory::new(1, "ダウンライト");
        category.description = Some("  汎用ダウンライト  ".to_string());
        category.suitable_for = vec!["事務所".to_string(), "会議室".to_string()];
        assert_eq!(category.embedding_text(), "汎用ダウンライト\n用途: 事務所, 会議室");

        let bare = FixtureCategory::new(2, "bare");
        assert!(bare.embedding_text().is_empty());
    }

    #[test]
    fn test_project_info_accepts_japanese_project_type() {
        let info: ProjectInfo = serde_json::from_value(serde_json::json!({
            "property_name": "本社ビル",
            "project_type": "リニューアル",
            "ceiling_height": 9.5
        }))
        .unwrap();
        assert_eq!(info.project_type, ProjectType::Renewal);
        assert!(info.is_searchable());
        assert!(!info.dimming);
    }

    #[test]
    fn test_unusable_ceiling_heights_are_unknown() {
        for height in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let info = ProjectInfo {
                ceiling_height: Some(height),
                ..ProjectInfo::default()
            };
            assert_eq!(info.known_ceiling_height(), None, "height {height}");
        }
        let info = ProjectInfo {
            ceiling_height: Some(2.7),
            ..ProjectInfo::default()
        };
        assert_eq!(info.known_ceiling_height(), Some(2.7));
    }

    #[test]
    fn test_blank_property_name_is_not_searchable() {
        let info = ProjectInfo {
            property_name: Some("  ".to_string()),
            ..ProjectInfo::default()
        };
        assert!(!info.is_searchable());
    }
}
