//! Prompt templates for the fixture-selection dialogue

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::models::ProjectInfo;
use crate::models::ScoredCategory;

/// Candidates listed in the reply prompt
pub const REPLY_CANDIDATE_COUNT: usize = 5;

/// Description characters kept per candidate in the reply prompt
pub const REPLY_DESCRIPTION_LIMIT: usize = 100;

const UNSPECIFIED: &str = "未指定";

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    ///
    /// Placeholders without a value are left as written.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var.as_str()) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract `{{name}}` placeholders in order of first appearance
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() && !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
        rest = &after[end + 2..];
    }

    variables
}

/// Prompts used by the lighting agent
pub struct LightingPrompts;

impl LightingPrompts {
    /// Persona and conversation flow for every chat turn
    #[must_use]
    pub const fn system() -> &'static str {
        "あなたは施設照明の器具選定をサポートする専門アシスタントです。
ユーザーから物件名、部屋名、天井高、図面から受けた印象などの物件情報を受け取り、
カタログから条件に合う照明器具を選ぶお手伝いをします。

進め方:
1. 物件情報を確認する
2. 必要であれば案件タイプ、特殊環境の有無、調光・調色の要否を質問する
3. 選定の考え方を分かりやすく示す
4. カタログから候補となる機種を検索する
5. 候補機種を紹介する

丁寧で親しみやすい口調を保ち、判断の根拠はユーザーに伝わる言葉で説明してください。"
    }

    /// System prompt for the short reasoning summary
    #[must_use]
    pub const fn thinking_system() -> &'static str {
        "あなたは照明器具選定の専門家です。物件情報から、どのような考え方で機種を選ぶかを簡潔に説明してください。"
    }

    #[must_use]
    pub fn thinking() -> PromptTemplate {
        PromptTemplate::new(
            r"次の物件情報をもとに、機種選定の考え方を説明してください。

物件名: {{property_name}}
部屋名: {{room_name}}
天井高: {{ceiling_height}}m
図面からの印象: {{impression}}
案件タイプ: {{project_type}}
特殊環境: {{special_environment}}
調光: {{dimming}}
調色: {{color_temperature}}

説明は2〜3行にまとめ、専門用語はできるだけ避けてください。",
        )
    }

    /// Asks for whatever project information is still missing
    #[must_use]
    pub fn question() -> PromptTemplate {
        PromptTemplate::new(
            r"ユーザーのメッセージを読み、必要に応じて次の項目を質問してください。

1. 案件タイプ: リニューアル / 他社との相見積もり / 新規見積
2. 特殊環境: はい / いいえ(クリーンルーム、無塵室など)
3. 調光・調色: はい / いいえ

物件情報がすでに示されていればまず内容を確認し、足りない項目だけを尋ねてください。
物件情報が無い場合は、物件名、部屋名、天井高、図面からの印象を伺ってください。

丁寧で親しみやすい口調で答えてください。

ユーザーのメッセージ: {{user_message}}",
        )
    }

    /// Presents the shortlisted fixtures to the user
    #[must_use]
    pub fn candidates_reply() -> PromptTemplate {
        PromptTemplate::new(
            r"次の候補機種をもとに、ユーザーへ丁寧で親しみやすい口調で回答してください。

候補機種:
{{candidates}}

物件情報:
物件名: {{property_name}}
部屋名: {{room_name}}
天井高: {{ceiling_height}}m

各候補の特徴を簡潔に紹介し、必要であれば追加の条件を尋ねてください。",
        )
    }

    /// System prompt sent with every re-ranking request
    #[must_use]
    pub const fn rerank_system() -> &'static str {
        "あなたは照明器具選定の専門家です。与えられたカテゴリリストから最適なカテゴリを選定してください。"
    }

    /// Asks for the `max_results` best categories as 1-based indices
    #[must_use]
    pub fn rerank() -> PromptTemplate {
        PromptTemplate::new(
            r"以下の照明器具カテゴリリストから、ユーザーのクエリ「{{query}}」に最も適した上位{{max_results}}件を選定してください。

カテゴリリスト:
{{categories}}
選定基準:
1. クエリの意図に最も合致するカテゴリ
2. 用途や説明がクエリに関連しているカテゴリ
3. 一般的な用途のカテゴリも考慮

選定したカテゴリの番号を、重要度の高い順にカンマ区切りで回答してください。

回答形式: 番号のみ(例: 1,5,3,12,8)",
        )
    }

    /// Shown in place of the candidate listing when nothing was found
    #[must_use]
    pub const fn no_candidates() -> &'static str {
        "候補が見つかりませんでした。"
    }
}

/// Template values describing a project
#[must_use]
pub fn project_values(info: &ProjectInfo) -> HashMap<&'static str, String> {
    let or_unspecified =
        |value: &Option<String>| value.clone().unwrap_or_else(|| UNSPECIFIED.to_string());
    let yes_no = |flag: bool, yes: &str, no: &str| if flag { yes } else { no }.to_string();

    let mut values = HashMap::new();
    values.insert("property_name", or_unspecified(&info.property_name));
    values.insert("room_name", or_unspecified(&info.room_name));
    values.insert(
        "ceiling_height",
        info.ceiling_height.unwrap_or(0.0).to_string(),
    );
    values.insert("impression", or_unspecified(&info.impression));
    values.insert("project_type", info.project_type.label().to_string());
    values.insert(
        "special_environment",
        yes_no(info.special_environment, "はい", "いいえ"),
    );
    values.insert("dimming", yes_no(info.dimming, "可能", "不可"));
    values.insert(
        "color_temperature",
        yes_no(info.color_temperature, "可能", "不可"),
    );
    values
}

/// Listing of the leading candidates for the reply prompt
#[must_use]
pub fn format_reply_candidates(candidates: &[ScoredCategory]) -> String {
    if candidates.is_empty() {
        return LightingPrompts::no_candidates().to_string();
    }

    let mut out = String::new();
    for (i, candidate) in candidates.iter().take(REPLY_CANDIDATE_COUNT).enumerate() {
        let category = &candidate.category;
        let _ = writeln!(out, "{}. {}", i + 1, category.name);
        if let Some(manufacturer) = category.manufacturer.as_deref().filter(|m| !m.is_empty()) {
            let _ = writeln!(out, "   メーカー: {manufacturer}");
        }
        if let Some(series) = category.series.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(out, "   シリーズ: {series}");
        }
        if let Some(description) = category.description.as_deref().filter(|d| !d.is_empty()) {
            let short = crate::retrieval::rerank::truncate_chars(description, REPLY_DESCRIPTION_LIMIT);
            let _ = writeln!(out, "   説明: {short}...");
        }
        if !category.suitable_for.is_empty() {
            let _ = writeln!(out, "   用途: {}", category.tags_joined());
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FixtureCategory;

    #[test]
    fn test_template_variables() {
        let template = PromptTemplate::new("物件: {{property_name}} / {{room_name}} / {{property_name}}");
        assert_eq!(template.variables(), &["property_name", "room_name"]);
    }

    #[test]
    fn test_template_render_leaves_unknown_placeholders() {
        let template = PromptTemplate::new("Hello {{name}} from {{place}}!");
        let mut values = HashMap::new();
        values.insert("name", "Alice".to_string());
        assert_eq!(template.render(&values), "Hello Alice from {{place}}!");
    }

    #[test]
    fn test_thinking_prompt_defaults() {
        let info = ProjectInfo {
            property_name: Some("本社ビル".to_string()),
            dimming: true,
            ..ProjectInfo::default()
        };
        let prompt = LightingPrompts::thinking().render(&project_values(&info));
        assert!(prompt.contains("物件名: 本社ビル"));
        assert!(prompt.contains("部屋名: 未指定"));
        assert!(prompt.contains("天井高: 0m"));
        assert!(prompt.contains("調光: 可能"));
        assert!(prompt.contains("調色: 不可"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_reply_candidates_are_capped_and_truncated() {
        let candidates: Vec<ScoredCategory> = (1..=7)
            .map(|id| {
                let mut c = FixtureCategory::new(id, format!("fixture-{id}"));
                c.description = Some("光".repeat(150));
                c.into()
            })
            .collect();

        let text = format_reply_candidates(&candidates);
        assert!(text.contains("5. fixture-5"));
        assert!(!text.contains("fixture-6"));
        assert!(text.contains(&format!("説明: {}...\n", "光".repeat(100))));
    }

    #[test]
    fn test_rerank_template_variables() {
        assert_eq!(
            LightingPrompts::rerank().variables(),
            &["query", "max_results", "categories"]
        );
    }

    #[test]
    fn test_reply_candidates_empty() {
        assert_eq!(format_reply_candidates(&[]), LightingPrompts::no_candidates());
    }
}
