//! Rule-based classification of raw chat input.
//!
//! Rules are evaluated in a fixed order (phone, compare, follow-up, general,
//! context fallback) and the first match wins. Classification is a pure
//! function of the text and the [`DialogueContext`].

use super::context::DialogueContext;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Digit-count window for a bare phone number.
const PHONE_MIN_DIGITS: usize = 8;
const PHONE_MAX_DIGITS: usize = 15;

static PHONE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s.\-+()]+$").expect("valid regex"));

/// Ten-digit runs, or 4-3-3 / 3-3-4 groups separated by space, dot or dash.
/// ASCII digits and ASCII word boundaries only.
static PHONE_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?-u:\b)[0-9]{10}(?-u:\b)",
        r"|(?-u:\b)[0-9]{4}[\s.\-]?[0-9]{3}[\s.\-]?[0-9]{3}(?-u:\b)",
        r"|(?-u:\b)[0-9]{3}[\s.\-]?[0-9]{3}[\s.\-]?[0-9]{4}(?-u:\b)",
    ))
    .expect("valid regex")
});

const COMPARE_KEYWORDS: &[&str] = &[
    "so sánh",
    "đối chiếu",
    "so với",
    "so với nhau",
    "so le",
    "số nào tốt hơn",
    "số nào hay hơn",
    "số nào phù hợp hơn",
    "số nào thích hợp hơn",
    "số nào mạnh hơn",
];

const FOLLOW_UP_KEYWORDS: &[&str] = &[
    "vậy còn",
    "thế còn",
    "vậy thì",
    "liên quan đến",
    "điểm mạnh",
    "điểm yếu",
    "vậy",
    "thế",
    "tiếp theo",
    "còn nữa",
    "thêm",
    "chi tiết hơn",
    "nói thêm",
    "giải thích thêm",
    "ngoài ra",
];

const QUESTION_KEYWORDS: &[&str] = &[
    "tại sao",
    "vì sao",
    "như thế nào",
    "có ý nghĩa gì",
    "là gì",
    "có nghĩa gì",
    "để làm gì",
    "nên làm gì",
    "làm sao",
    "cách nào",
    "cải thiện",
    "giải quyết",
];

const GENERAL_KEYWORDS: &[&str] = &[
    "ý nghĩa số",
    "con số",
    "các số",
    "ba số",
    "tứ cát",
    "tứ hung",
    "bát tinh",
    "chiêm tinh học số",
    "phong thủy số",
    "phương pháp",
    "nguyên lý",
    "phân tích số",
    "quy tắc",
    "cách xem",
    "ý nghĩa bát tinh",
];

/// Category assigned to a user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Phone,
    Compare,
    FollowUp,
    General,
    /// Question about the number in context. Never produced by
    /// [`InputClassifier::classify`]; requested explicitly by category
    /// shortcuts.
    Question,
    /// Nothing to classify (blank input).
    Unknown,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InputClassifier;

impl InputClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, raw: &str, context: &DialogueContext) -> Intent {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Intent::Unknown;
        }
        if is_phone_number(trimmed) {
            return Intent::Phone;
        }

        let lower = trimmed.to_lowercase();
        if contains_any(&lower, COMPARE_KEYWORDS) && extract_phone_numbers(&lower).len() >= 2 {
            return Intent::Compare;
        }
        if context.accepts_follow_up()
            && (contains_any(&lower, FOLLOW_UP_KEYWORDS) || contains_any(&lower, QUESTION_KEYWORDS))
        {
            return Intent::FollowUp;
        }
        if contains_any(&lower, GENERAL_KEYWORDS) {
            return Intent::General;
        }

        if context.has_history() {
            Intent::FollowUp
        } else {
            Intent::General
        }
    }

    /// Intent used for dispatch. Same as [`classify`](Self::classify) except
    /// that a general input naming a comparison is sent down the compare
    /// route, where the two-number requirement is enforced.
    pub fn route(&self, raw: &str, context: &DialogueContext) -> Intent {
        match self.classify(raw, context) {
            Intent::General if mentions_comparison(raw) => Intent::Compare,
            intent => intent,
        }
    }
}

/// Classifies with a default [`InputClassifier`].
pub fn classify(raw: &str, context: &DialogueContext) -> Intent {
    InputClassifier::new().classify(raw, context)
}

/// True when the whole input is a phone number: only phone punctuation and
/// 8 to 15 digits.
pub fn is_phone_number(raw: &str) -> bool {
    let trimmed = raw.trim();
    let digits = normalize_digits(trimmed).len();
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits) && PHONE_CHARS.is_match(trimmed)
}

pub fn mentions_comparison(raw: &str) -> bool {
    contains_any(&raw.to_lowercase(), COMPARE_KEYWORDS)
}

/// Phone-number-shaped substrings of `text`, digits only, first occurrence
/// order, duplicates removed.
pub fn extract_phone_numbers(text: &str) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for found in PHONE_IN_TEXT.find_iter(text) {
        let digits = normalize_digits(found.as_str());
        if !digits.is_empty() && !numbers.contains(&digits) {
            numbers.push(digits);
        }
    }
    numbers
}

pub fn normalize_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}
