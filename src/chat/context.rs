use serde::{Deserialize, Serialize};

/// Intent recorded for the previous turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LastIntent {
    #[default]
    None,
    Phone,
    Question,
    FollowUp,
    General,
    Compare,
}

/// Short-term dialogue memory used to disambiguate follow-up questions.
///
/// `last_phone_number` is only ever written by [`DialogueContext::record_phone`];
/// later intents keep it so questions can still refer to "this number".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DialogueContext {
    pub last_intent: LastIntent,
    pub last_phone_number: Option<String>,
    pub question_count: u32,
}

impl DialogueContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new number is under discussion; restarts the question counter.
    pub fn record_phone(&mut self, digits: impl Into<String>) {
        self.last_intent = LastIntent::Phone;
        self.last_phone_number = Some(digits.into());
        self.question_count = 0;
    }

    pub fn record_follow_up(&mut self) {
        self.question_count += 1;
        self.last_intent = LastIntent::FollowUp;
    }

    pub fn record_question(&mut self) {
        self.question_count += 1;
        self.last_intent = LastIntent::Question;
    }

    pub fn record_general(&mut self) {
        self.last_intent = LastIntent::General;
    }

    pub fn record_compare(&mut self) {
        self.last_intent = LastIntent::Compare;
    }

    pub fn has_history(&self) -> bool {
        self.last_intent != LastIntent::None
    }

    /// Whether a keyword follow-up can attach to the previous turn.
    pub fn accepts_follow_up(&self) -> bool {
        matches!(
            self.last_intent,
            LastIntent::Phone | LastIntent::Question | LastIntent::FollowUp
        )
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
