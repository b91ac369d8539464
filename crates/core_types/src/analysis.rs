use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionTemplate {
    pub id: String,
    pub question: String,
}

impl QuestionTemplate {
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
        }
    }
}

/// The stock analysis catalog. Callers may substitute their own; each
/// template is evaluated independently of the others.
pub fn default_templates() -> Vec<QuestionTemplate> {
    vec![
        QuestionTemplate::new(
            "summary",
            "Provide a concise summary of this document in a few paragraphs.",
        ),
        QuestionTemplate::new(
            "key_points",
            "What are the key points and findings presented in this document?",
        ),
        QuestionTemplate::new(
            "entities",
            "List the people, organizations, and places mentioned in this document.",
        ),
        QuestionTemplate::new(
            "figures",
            "What important dates, figures, or statistics appear in this document?",
        ),
        QuestionTemplate::new(
            "action_items",
            "What recommendations or action items does this document contain?",
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResult {
    pub question: String,
    pub document_path: String,
    pub answer: String,
    pub completed_at: DateTime<Utc>,
}
