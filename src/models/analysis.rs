//! Request and response shapes exchanged with the remote analysis service.
//!
//! The service answers in several historical layouts (`analysis.answer`,
//! `data.answer`, bare string `data`, fields nested under `result`). Every
//! `from_raw` constructor here folds those into one canonical struct so the
//! dialogue engine never inspects raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Outcome of `AnalysisBackend::analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub phone_number: String,
    /// Free-text reading of the number, when the service produced one.
    #[serde(default)]
    pub narrative: Option<String>,
    /// Structured star/energy payload, opaque to the dialogue engine.
    #[serde(default)]
    pub analysis_data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalysisResult {
    pub fn succeeded(phone_number: impl Into<String>, narrative: Option<String>, data: Value) -> Self {
        Self {
            success: true,
            phone_number: phone_number.into(),
            narrative,
            analysis_data: Some(data),
            message: None,
        }
    }

    pub fn failed(phone_number: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            phone_number: phone_number.into(),
            narrative: None,
            analysis_data: None,
            message: Some(message.into()),
        }
    }

    /// Normalizes a raw `/analysis/analyze` reply.
    pub fn from_raw(phone_number: &str, raw: &Value) -> Self {
        let success = raw.get("success").and_then(Value::as_bool).unwrap_or(false);
        let message = string_field(raw, "message");
        let body = raw
            .get("analysis")
            .filter(|value| value.is_object())
            .or_else(|| raw.get("data").filter(|value| value.is_object()))
            .unwrap_or(raw);
        let narrative = string_field(body, "geminiResponse")
            .or_else(|| string_field(body, "narrative"))
            .or_else(|| string_field(raw, "geminiResponse"));
        let phone = string_field(body, "phoneNumber").unwrap_or_else(|| phone_number.to_string());
        Self {
            success,
            phone_number: phone,
            narrative,
            analysis_data: success.then(|| body.clone()),
            message,
        }
    }
}

/// Category of question sent to `/analysis/question`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AskKind {
    Question,
    Followup,
    General,
    Compare,
}

impl AskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AskKind::Question => "question",
            AskKind::Followup => "followup",
            AskKind::General => "general",
            AskKind::Compare => "compare",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: AskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<String>,
}

impl AskRequest {
    /// Question bound to the number currently under discussion.
    pub fn question(question: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            kind: AskKind::Question,
            phone_number: Some(phone_number.into()),
            phone_numbers: Vec::new(),
        }
    }

    pub fn followup(question: impl Into<String>, phone_number: Option<String>) -> Self {
        Self {
            question: question.into(),
            kind: AskKind::Followup,
            phone_number,
            phone_numbers: Vec::new(),
        }
    }

    pub fn general(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            kind: AskKind::General,
            phone_number: None,
            phone_numbers: Vec::new(),
        }
    }

    pub fn compare(question: impl Into<String>, phone_numbers: Vec<String>) -> Self {
        Self {
            question: question.into(),
            kind: AskKind::Compare,
            phone_number: None,
            phone_numbers,
        }
    }

    /// JSON body for the question endpoint; only the fields relevant to the
    /// request kind are included.
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "question": self.question,
            "type": self.kind.as_str(),
        });
        match self.kind {
            AskKind::Question | AskKind::Followup => {
                if let Some(phone) = &self.phone_number {
                    payload["phoneNumber"] = Value::String(phone.clone());
                }
            }
            AskKind::Compare => {
                payload["phoneNumbers"] = json!(self.phone_numbers);
            }
            AskKind::General => {}
        }
        payload
    }
}

/// Canonical reply of `AnalysisBackend::ask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AskResponse {
    pub success: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AskResponse {
    pub fn answered(answer: impl Into<String>) -> Self {
        Self {
            success: true,
            answer: Some(answer.into()),
            message: None,
        }
    }

    /// Normalizes a raw `/analysis/question` reply. Answer lookup order:
    /// `analysis.answer`, `data.answer`, top-level `answer`, string `data`.
    pub fn from_raw(raw: &Value) -> Self {
        let answer = raw
            .get("analysis")
            .and_then(|analysis| string_field(analysis, "answer"))
            .or_else(|| raw.get("data").and_then(|data| string_field(data, "answer")))
            .or_else(|| string_field(raw, "answer"))
            .or_else(|| {
                raw.get("data")
                    .and_then(Value::as_str)
                    .filter(|text| !text.trim().is_empty())
                    .map(str::to_string)
            });
        Self {
            success: raw.get("success").and_then(Value::as_bool).unwrap_or(false),
            answer,
            message: string_field(raw, "message"),
        }
    }
}

/// Pagination block returned with analysis history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
}

const fn first_page() -> u32 {
    1
}

/// One page of stored analyses from `AnalysisBackend::history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HistoryPage {
    pub records: Vec<AnalysisRecord>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl HistoryPage {
    /// Normalizes a raw `/analysis/history` reply (`data`, `history`, or a
    /// bare array). Records are normalized individually; unreadable entries are
    /// skipped.
    pub fn from_raw(raw: &Value) -> Self {
        let items = raw
            .get("data")
            .and_then(Value::as_array)
            .or_else(|| raw.get("history").and_then(Value::as_array))
            .or_else(|| raw.as_array());
        let records = items
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<AnalysisRecord>(item.clone()).ok())
                    .map(AnalysisRecord::normalize)
                    .collect()
            })
            .unwrap_or_default();
        let pagination = raw
            .get("pagination")
            .and_then(|value| serde_json::from_value(value.clone()).ok());
        Self {
            records,
            pagination,
        }
    }

    /// Pagination to apply when the service omitted it.
    pub fn pagination_or(&self, page: u32, limit: u32) -> Pagination {
        self.pagination.unwrap_or_else(|| {
            let total = self.records.len() as u32;
            Pagination {
                page,
                limit,
                total,
                pages: if limit == 0 { 1 } else { total.div_ceil(limit).max(1) },
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EnergyLevel {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub cat: f64,
    #[serde(default)]
    pub hung: f64,
    #[serde(default)]
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StarEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub energy_level: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed view of a stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub result: Option<Value>,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub energy_level: Option<EnergyLevel>,
    #[serde(default)]
    pub star_sequence: Vec<StarEntry>,
    #[serde(default)]
    pub dangerous_combinations: Vec<Value>,
    #[serde(default)]
    pub gemini_response: Option<String>,
}

/// Compact display bundle for the history panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub phone_number: String,
    pub balance: String,
    pub energy_summary: String,
    pub top_stars: Vec<StarEntry>,
    pub has_warnings: bool,
}

impl AnalysisRecord {
    /// Lifts fields the service nested under `result` to the root when the
    /// root copy is missing.
    pub fn normalize(mut self) -> Self {
        let Some(result) = self.result.take() else {
            return self;
        };
        if self.balance.is_none() {
            self.balance = string_field(&result, "balance");
        }
        if self.energy_level.is_none() {
            self.energy_level = typed_field(&result, "energyLevel");
        }
        if self.star_sequence.is_empty() {
            self.star_sequence = typed_field(&result, "starSequence").unwrap_or_default();
        }
        if self.dangerous_combinations.is_empty() {
            self.dangerous_combinations =
                typed_field(&result, "dangerousCombinations").unwrap_or_default();
        }
        self
    }

    pub fn balance_text(&self) -> &'static str {
        match self.balance.as_deref() {
            Some("BALANCED") => "Cân bằng tốt giữa sao cát và hung",
            Some("CAT_HEAVY") => "Thiên về sao cát (>70%)",
            Some("HUNG_HEAVY") => "Thiên về sao hung (>70%)",
            _ => "Cân bằng không xác định",
        }
    }

    pub fn energy_summary(&self) -> String {
        match &self.energy_level {
            Some(level) => format!(
                "Tổng: {} (Cát: {}, Hung: {})",
                level.total,
                level.cat,
                level.hung.abs()
            ),
            None => String::new(),
        }
    }

    /// Strongest stars first.
    pub fn top_stars(&self, count: usize) -> Vec<StarEntry> {
        let mut stars = self.star_sequence.clone();
        stars.sort_by(|a, b| b.energy_level.total_cmp(&a.energy_level));
        stars.truncate(count);
        stars
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            phone_number: format_phone_number(&self.phone_number),
            balance: self.balance_text().to_string(),
            energy_summary: self.energy_summary(),
            top_stars: self.top_stars(3),
            has_warnings: !self.dangerous_combinations.is_empty(),
        }
    }
}

/// Groups a number for display: 4-3-3 for ten digits, 5-3-3 for eleven,
/// bare digits otherwise.
pub fn format_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => format!("{} {} {}", &digits[..4], &digits[4..7], &digits[7..]),
        11 => format!("{} {} {}", &digits[..5], &digits[5..8], &digits[8..]),
        _ => digits,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn typed_field<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    value
        .get(key)
        .and_then(|field| serde_json::from_value(field.clone()).ok())
}
