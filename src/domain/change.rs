use serde::Serialize;

/// What kind of change a check cycle found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeType {
    None,
    Content,
    Form,
    Keyword,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::None => "NONE",
            ChangeType::Content => "CONTENT",
            ChangeType::Form => "FORM",
            ChangeType::Keyword => "KEYWORD",
        }
    }
}

/// Alert urgency, also part of the rate-limit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Priority {
    Info,
    Important,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Info => "INFO",
            Priority::Important => "IMPORTANT",
            Priority::Critical => "CRITICAL",
        }
    }
}

/// Outcome of classifying one check cycle. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub has_changed: bool,
    pub change_type: ChangeType,
    pub priority: Priority,
    pub confidence: f64,
    pub description: String,
    pub diff: Option<String>,
    pub matched_keywords: Option<Vec<String>>,
}

impl Classification {
    pub fn unchanged(confidence: f64, description: &str) -> Self {
        Self {
            has_changed: false,
            change_type: ChangeType::None,
            priority: Priority::Info,
            confidence,
            description: description.to_string(),
            diff: None,
            matched_keywords: None,
        }
    }
}
