use serde::{Deserialize, Serialize};

/// Topic shortcuts offered next to an analyzed number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Business,
    Love,
    Wealth,
    Health,
    Other(String),
}

impl Category {
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "business" => Category::Business,
            "love" => Category::Love,
            "wealth" => Category::Wealth,
            "health" => Category::Health,
            _ => Category::Other(key.trim().to_string()),
        }
    }

    /// Question submitted on the user's behalf.
    pub fn question(&self) -> String {
        match self {
            Category::Business => {
                "Số điện thoại này ảnh hưởng thế nào đến công việc kinh doanh?".to_string()
            }
            Category::Love => "Số điện thoại này có ý nghĩa gì về tình duyên của tôi?".to_string(),
            Category::Wealth => {
                "Số điện thoại này ảnh hưởng thế nào đến tài chính của tôi?".to_string()
            }
            Category::Health => {
                "Số điện thoại này có liên quan đến sức khỏe của tôi không?".to_string()
            }
            Category::Other(topic) => format!("Hãy phân tích thêm về {topic}"),
        }
    }
}
