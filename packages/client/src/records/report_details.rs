use serde::{Deserialize, Serialize};

use super::JsonContainer;

/// The questions asked when filing a report of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetails {
    pub organization: Option<String>,
    pub title: String,
    pub questions: Vec<Question>,
}

impl JsonContainer for ReportDetails {}

impl ReportDetails {
    /// Questions that must be answered before submitting.
    pub fn required_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.response_required)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub primary_key: String,
    pub question: String,
    pub question_type: QuestionType,
    pub answer_kept_private: bool,
    pub response_required: bool,
    pub select_values: Option<Vec<SelectValue>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Datetime,
    File,
    Note,
    Select,
    Text,
    Textarea,
    Multivaluelist,
}

/// One choice of a `select` or `multivaluelist` question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectValue {
    pub key: String,
    pub name: String,
}
