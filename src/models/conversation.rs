use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Phase, SignalStore, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

/// A role-tagged message, as rendered by the UI and sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
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

/// Why an interview ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Termination {
    /// The volunteer asked to stop
    Stopped,
    /// All phases finished
    Complete,
    /// Finished by a forced exit before enough was learned
    CompleteInsufficientInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationLabel {
    Recommend,
    Hold,
    NotRecommended,
}

/// Evaluator rating of one finished phase against its rubric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseScore {
    pub phase: Phase,
    /// 1.0 (poor) to 5.0 (excellent)
    pub score: f64,
    pub notes: String,
}

/// Coordinator-facing outcome of an interview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub label: RecommendationLabel,
    pub reason: String,
    /// Mean of the phase scores the label was derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    /// Free-text coordinator summary, when the model produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// The full state of one interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Session-unique key, also the record file prefix
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub phase: Phase,
    /// Turns taken in the current phase
    pub turn_in_phase: u32,
    /// Turns taken in the whole session
    pub total_turns: u32,
    pub turns: Vec<Turn>,
    pub messages: Vec<ChatMessage>,
    pub profile: SignalStore,
    /// One entry per scored phase, in phase order
    #[serde(default)]
    pub phase_scores: Vec<PhaseScore>,
    pub termination: Option<Termination>,
    pub recommendation: Option<Recommendation>,
    /// The last snapshot failed to persist
    #[serde(skip)]
    pub persist_pending: bool,
}

impl ConversationState {
    pub fn new(first_phase: Phase) -> Self {
        let started_at = Utc::now();
        Self {
            session_id: make_session_id(&started_at),
            started_at,
            phase: first_phase,
            turn_in_phase: 0,
            total_turns: 0,
            turns: Vec::new(),
            messages: Vec::new(),
            profile: SignalStore::new(),
            phase_scores: Vec::new(),
            termination: None,
            recommendation: None,
            persist_pending: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.termination.is_some()
    }

    /// The last `window` messages, for model context
    pub fn recent_messages(&self, window: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }
}

/// `vol_<YYYYmmdd_HHMMSS>_<6 hex>`
fn make_session_id(at: &DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("vol_{}_{}", at.format("%Y%m%d_%H%M%S"), &suffix[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let state = ConversationState::new(Phase::Greeting);
        let parts: Vec<&str> = state.session_id.split('_').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "vol");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 6);
    }

    #[test]
    fn test_recent_messages_window() {
        let mut state = ConversationState::new(Phase::Greeting);
        for i in 0..10 {
            state.messages.push(ChatMessage::user(format!("m{}", i)));
        }

        let recent = state.recent_messages(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "m7");
        assert_eq!(state.recent_messages(50).len(), 10);
    }
}
