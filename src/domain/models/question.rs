#[cfg(test)]
#[path = "question_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionCategory {
    Time,
    Technique,
    Portion,
    Tips,
}

/// A canned question offered next to the chat. `text` is the short label shown
/// to the user, `question` is what gets sent to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickQuestion {
    pub text: String,
    pub question: String,
    pub category: QuestionCategory,
}

impl QuickQuestion {
    pub fn new(text: &str, question: &str, category: QuestionCategory) -> QuickQuestion {
        return QuickQuestion {
            text: text.to_string(),
            question: question.to_string(),
            category,
        };
    }

    pub fn defaults() -> Vec<QuickQuestion> {
        return vec![
            QuickQuestion::new(
                "How long to cook?",
                "How long does this dish take to cook?",
                QuestionCategory::Time,
            ),
            QuickQuestion::new(
                "What heat?",
                "Should I use high or low heat?",
                QuestionCategory::Technique,
            ),
            QuickQuestion::new(
                "How many servings?",
                "How many people does this recipe serve?",
                QuestionCategory::Portion,
            ),
            QuickQuestion::new(
                "Any tips?",
                "Any tips to make this dish taste better?",
                QuestionCategory::Tips,
            ),
        ];
    }
}
