//! Answer values held by the engine's answer map

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Value of a single checkpoint answer.
///
/// Scalar types (text, email, number, date, ...) store `Text`; checkboxes
/// and multi-select dropdowns store `Multi`; `Pic/Camera` stores `File`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnswerValue {
    Text(String),
    Multi(Vec<String>),
    File(FileAnswer),
}

impl AnswerValue {
    /// True when the answer counts as unanswered for mandatory validation:
    /// empty or whitespace-only text, or an empty selection list.
    /// A captured file always counts as answered.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Multi(v) => v.is_empty(),
            AnswerValue::File(_) => false,
        }
    }

    /// Normalize to a list of selected option strings. Scalar text splits
    /// on commas so a CSV-stored multi-select round-trips.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            AnswerValue::Text(s) => {
                if s.trim().is_empty() {
                    Vec::new()
                } else {
                    s.split(',').map(|v| v.trim().to_string()).collect()
                }
            }
            AnswerValue::Multi(v) => v.clone(),
            AnswerValue::File(_) => Vec::new(),
        }
    }

    /// Scalar text view, `None` for files.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AnswerValue::Text(s) => Some(s.clone()),
            AnswerValue::Multi(v) => Some(v.join(",")),
            AnswerValue::File(_) => None,
        }
    }

    /// Numeric view used by derived fields; unparseable values read as 0.
    pub fn as_number(&self) -> f64 {
        match self {
            AnswerValue::Text(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::Text(s)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(v: Vec<String>) -> Self {
        AnswerValue::Multi(v)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(v: Vec<&str>) -> Self {
        AnswerValue::Multi(v.into_iter().map(str::to_string).collect())
    }
}

/// File captured for a `Pic/Camera` checkpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileAnswer {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileAnswer {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Encode as a `data:` URL, the wire format the attachments endpoint
    /// expects for every file payload.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}
