use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Phase, ProfileUpdate};

/// Intent labels - restricted enum so the model cannot invent categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Explains why they want to volunteer
    MotivationShared,
    /// Mentions teaching, tutoring, mentoring or training others
    ExperienceShared,
    /// Explicitly states no teaching or mentoring experience
    NoExperience,
    /// Comfort or hesitation working with children
    ComfortShared,
    TimeYes,
    TimeMaybe,
    TimeNo,
    Ok,
    NotOk,
    /// Thanks / nothing more to ask
    Thanks,
    /// Lexical: yes / sure / okay
    Affirm,
    /// Lexical: no / can't / not really
    Negate,
    /// Lexical: shares background details
    Info,
    /// Stop / unsubscribe / leave
    Stop,
    /// Asks a question instead of answering
    Query,
    /// Vague, off-topic or unclear
    Ambiguous,
}

impl Intent {
    /// Labels valid in every phase
    pub fn is_universal(self) -> bool {
        matches!(self, Intent::Stop | Intent::Query | Intent::Ambiguous)
    }

    /// Labels produced by the lexical classifier, valid in every phase
    pub fn is_lexical(self) -> bool {
        matches!(self, Intent::Affirm | Intent::Negate | Intent::Info)
    }

    /// Off-topic or clarifying input that must never move the interview
    pub fn is_non_advancing(self) -> bool {
        matches!(self, Intent::Query | Intent::Ambiguous)
    }

    pub fn label(self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Parse a model-produced label, tolerating case and separator differences
    pub fn parse_label(raw: &str) -> Option<Intent> {
        let normalized = raw.trim().to_uppercase().replace(['-', ' '], "_");
        serde_json::from_value(serde_json::Value::String(normalized)).ok()
    }
}

/// Which classifier produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Model,
    RuleBased,
    /// No classifier produced a result; the turn was recorded as unclear
    Degraded,
}

/// Normalized output of the classifier adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Acknowledgement / next question for the volunteer
    pub reply: String,
    #[serde(default)]
    pub signals: ProfileUpdate,
    pub source: ClassificationSource,
}

/// One classified exchange. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Global turn index (0-based)
    pub index: u32,
    pub phase: Phase,
    /// Turn index within the phase (0-based)
    pub turn_in_phase: u32,
    /// Raw volunteer text
    pub text: String,
    pub intent: Intent,
    pub confidence: f64,
    pub reply: String,
    /// Signals extracted from this turn
    #[serde(default, skip_serializing_if = "ProfileUpdate::is_empty")]
    pub signals: ProfileUpdate,
    pub source: ClassificationSource,
    pub timestamp: DateTime<Utc>,
}
