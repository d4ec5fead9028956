use crate::errors::EvalError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Highest score the judge may hand out.
pub const MAX_RATING: u8 = 3;

/// One input email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "id_from_string_or_int")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl Record {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sender: None,
            subject: None,
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

fn id_from_string_or_int<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(de)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// A judge's score for one evaluation axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub rating: u8,
    pub reasoning: String,
}

/// Characters of the judge reply kept in a zero rating.
const UNPARSED_RAW_CHARS: usize = 200;

impl Rating {
    /// The zero rating recorded when the judge output could not be parsed and
    /// the run is configured to keep going. Keeps the start of the judge's reply.
    pub fn unparsed(reason: impl fmt::Display, raw: &str) -> Self {
        let raw = raw.trim();
        let shown: String = raw.chars().take(UNPARSED_RAW_CHARS).collect();
        let ellipsis = if shown.len() < raw.len() { "..." } else { "" };
        Self {
            rating: 0,
            reasoning: format!(
                "unparseable judge response: {}; raw: {:?}{}",
                reason, shown, ellipsis
            ),
        }
    }
}

/// An editing operation applied to a single email.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    Lengthen,
    Shorten,
    ChangeTone(String),
}

impl Instruction {
    /// Prompt catalog entry used to perform the edit.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Self::Lengthen => "lengthen",
            Self::Shorten => "shorten",
            Self::ChangeTone(_) => "change_tone",
        }
    }

    /// Tag used to group results, e.g. `change_tone_friendly`.
    pub fn tag(&self) -> String {
        match self {
            Self::Lengthen | Self::Shorten => self.prompt_name().to_string(),
            Self::ChangeTone(tone) => format!("change_tone_{}", tone),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// The batch-level operation. `ChangeTone` fans out into one instruction per tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTask {
    Lengthen,
    Shorten,
    ChangeTone { tones: Vec<String> },
}

impl EditTask {
    pub fn change_tone<I, S>(tones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ChangeTone {
            tones: tones.into_iter().map(Into::into).collect(),
        }
    }

    /// Instructions applied to every record, in processing order.
    pub fn instructions(&self) -> Result<Vec<Instruction>, EvalError> {
        match self {
            Self::Lengthen => Ok(vec![Instruction::Lengthen]),
            Self::Shorten => Ok(vec![Instruction::Shorten]),
            Self::ChangeTone { tones } => {
                if tones.is_empty() {
                    return Err(EvalError::InvalidRequest(
                        "change_tone requires at least one tone".into(),
                    ));
                }
                if tones.iter().any(|t| t.trim().is_empty()) {
                    return Err(EvalError::InvalidRequest("tone labels must not be empty".into()));
                }
                Ok(tones.iter().cloned().map(Instruction::ChangeTone).collect())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lengthen => "lengthen",
            Self::Shorten => "shorten",
            Self::ChangeTone { .. } => "change_tone",
        }
    }
}

/// One applied edit on one record, with both judge ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    pub record_id: String,
    pub instruction: String,
    pub original_text: String,
    pub edited_text: String,
    pub faithfulness: Rating,
    pub completeness: Rating,
    /// Ratings in this result that were defaulted to zero instead of parsed.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub judge_fallbacks: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Which side of the evaluation a completion call serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Worker,
    Judge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub role: ModelRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}
