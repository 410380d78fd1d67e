//! Transfer Error Classifier
//!
//! Maps a raw transport failure onto one of a fixed set of user-facing
//! messages plus a bounded technical detail string.
//!
//! Matching is lower-cased substring search over an ordered rule table;
//! the first matching rule wins. The table sits behind [`ErrorClassifier`]
//! so the strategy can change without touching callers.

use std::fmt;

use serde::Serialize;

use crate::chain::ChainError;

/// Technical detail is cut to this many characters
pub const MAX_DETAIL_CHARS: usize = 700;

/// Appended when the detail is cut
pub const TRUNCATION_MARKER: &str = "...";

/// Substituted when the failure carries no text
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// User-facing failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMessage {
    TimedOut,
    Cancelled,
    InsufficientBalance,
    NonceConflict,
    Generic,
}

impl UserMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserMessage::TimedOut => {
                "Transfer timed out. The network may be congested, please retry."
            }
            UserMessage::Cancelled => "Transaction was cancelled.",
            UserMessage::InsufficientBalance => "Insufficient balance for transfer or fees.",
            UserMessage::NonceConflict => {
                "Transaction nonce conflict. Please retry in a few seconds."
            }
            UserMessage::Generic => "Transfer failed. Please try again.",
        }
    }

    /// Stable identifier for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            UserMessage::TimedOut => "TIMED_OUT",
            UserMessage::Cancelled => "CANCELLED",
            UserMessage::InsufficientBalance => "INSUFFICIENT_BALANCE",
            UserMessage::NonceConflict => "NONCE_CONFLICT",
            UserMessage::Generic => "TRANSFER_FAILED",
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw failure as seen by the classifier. Both fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawError {
    pub short_message: Option<String>,
    pub message: Option<String>,
}

impl RawError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            short_message: None,
            message: Some(message.into()),
        }
    }

    /// Short message, then message, then [`UNKNOWN_ERROR`]; empty strings
    /// count as missing.
    pub fn text(&self) -> &str {
        self.short_message
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.message.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(UNKNOWN_ERROR)
    }
}

impl From<&ChainError> for RawError {
    fn from(e: &ChainError) -> Self {
        Self {
            short_message: e.short_message.clone(),
            message: e.message.clone(),
        }
    }
}

impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Classified failure; immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    user_message: UserMessage,
    technical_detail: String,
}

impl ClassifiedError {
    pub fn new(user_message: UserMessage, detail: &str) -> Self {
        Self {
            user_message,
            technical_detail: truncate_detail(detail),
        }
    }

    pub fn user_message(&self) -> UserMessage {
        self.user_message
    }

    pub fn technical_detail(&self) -> &str {
        &self.technical_detail
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.user_message, self.technical_detail)
    }
}

/// Swappable classification strategy
pub trait ErrorClassifier: Send + Sync {
    /// Never fails; unknown input maps to [`UserMessage::Generic`].
    fn classify(&self, raw: &RawError) -> ClassifiedError;
}

/// One row of the substring rule table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub needles: &'static [&'static str],
    pub message: UserMessage,
}

/// Precedence: timeout, cancellation, balance, nonce.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule {
        needles: &["timed out", "timeout", "too long"],
        message: UserMessage::TimedOut,
    },
    Rule {
        needles: &["rejected", "cancelled"],
        message: UserMessage::Cancelled,
    },
    Rule {
        needles: &["insufficient"],
        message: UserMessage::InsufficientBalance,
    },
    Rule {
        needles: &["nonce"],
        message: UserMessage::NonceConflict,
    },
];

/// Lower-cased substring matcher over an ordered rule table
#[derive(Debug, Clone, Copy)]
pub struct SubstringClassifier {
    rules: &'static [Rule],
}

impl SubstringClassifier {
    pub const fn new() -> Self {
        Self {
            rules: DEFAULT_RULES,
        }
    }

    pub const fn with_rules(rules: &'static [Rule]) -> Self {
        Self { rules }
    }
}

impl Default for SubstringClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, raw: &RawError) -> ClassifiedError {
        let text = raw.text();
        let lower = text.to_lowercase();

        let user_message = self
            .rules
            .iter()
            .find(|rule| rule.needles.iter().any(|needle| lower.contains(needle)))
            .map(|rule| rule.message)
            .unwrap_or(UserMessage::Generic);

        ClassifiedError::new(user_message, text)
    }
}

/// Classify with the default rule table
pub fn classify(raw: &RawError) -> ClassifiedError {
    SubstringClassifier::new().classify(raw)
}

fn truncate_detail(detail: &str) -> String {
    match detail.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((cut, _)) => format!("{}{}", &detail[..cut], TRUNCATION_MARKER),
        None => detail.to_string(),
    }
}
