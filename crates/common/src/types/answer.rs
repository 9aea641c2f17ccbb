use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CaseId;

/// A coerced answer value. Coercion precedence is fixed: boolean vocabulary
/// first, then integer, then the raw string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl AnswerValue {
    /// Coerces operator input. Recognizes the yes/no vocabulary the wizard
    /// presents ("si"/"sí"/"true", "no"/"false"), case-insensitively.
    pub fn coerce(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "true" | "si" | "sí" => return Self::Bool(true),
            "false" | "no" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(n) = lowered.parse::<i64>() {
            return Self::Int(n);
        }
        Self::Text(raw.trim().to_string())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Latest answer per stable question code, as kept by the session.
pub type AnswerMap = HashMap<String, AnswerValue>;

/// One persisted answer row. Append-only per case; the session keeps only
/// the latest value per question code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Answer {
    pub case_id: CaseId,
    pub question_id: i64,
    pub raw_value: String,
    pub value: AnswerValue,
    pub answered_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(case_id: CaseId, question_id: i64, raw_value: impl Into<String>) -> Self {
        let raw_value = raw_value.into();
        let value = AnswerValue::coerce(&raw_value);
        Self {
            case_id,
            question_id,
            raw_value,
            value,
            answered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_precedence() {
        assert_eq!(AnswerValue::coerce("Sí"), AnswerValue::Bool(true));
        assert_eq!(AnswerValue::coerce("si"), AnswerValue::Bool(true));
        assert_eq!(AnswerValue::coerce("TRUE"), AnswerValue::Bool(true));
        assert_eq!(AnswerValue::coerce("No"), AnswerValue::Bool(false));
        assert_eq!(AnswerValue::coerce("false"), AnswerValue::Bool(false));
        assert_eq!(AnswerValue::coerce("42"), AnswerValue::Int(42));
        assert_eq!(AnswerValue::coerce("-3"), AnswerValue::Int(-3));
        assert_eq!(
            AnswerValue::coerce("Hace ciclos (prende/apaga)"),
            AnswerValue::Text("Hace ciclos (prende/apaga)".to_string())
        );
    }

    #[test]
    fn test_coercion_trims_whitespace() {
        assert_eq!(AnswerValue::coerce("  no  "), AnswerValue::Bool(false));
        assert_eq!(AnswerValue::coerce(" 7 "), AnswerValue::Int(7));
    }
}
