use serde::{Deserialize, Serialize};

/// How a question expects to be answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    YesNo,
    MultipleChoice,
    FreeText,
}

/// A diagnostic question. Defined statically by a rule, never mutated at
/// runtime. The numeric id is what the boundary sees; answers are stored
/// under the rule's stable string code instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub prompt: String,
    pub kind: AnswerKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Critical questions gate the traversal (e.g. safety checks).
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Question {
    pub fn yes_no(id: i64, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            kind: AnswerKind::YesNo,
            options: Vec::new(),
            critical: false,
            help: None,
        }
    }

    pub fn multiple_choice(id: i64, prompt: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            kind: AnswerKind::MultipleChoice,
            options,
            critical: false,
            help: None,
        }
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}
