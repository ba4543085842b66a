use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::PersistenceError;
use crate::models::{
    ChatMessage, ConversationState, Phase, PhaseScore, Recommendation, SignalStore, Termination,
    Turn,
};

/// Machine-readable session record
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord<'a> {
    pub session_id: &'a str,
    pub started_at: DateTime<Utc>,
    pub phase: Phase,
    pub total_turns: u32,
    /// Full classified turn history
    pub turns: &'a [Turn],
    /// Profile snapshot at the time of writing
    pub profile: SignalStore,
    pub phase_scores: &'a [PhaseScore],
    pub termination: Option<Termination>,
    pub recommendation: Option<&'a Recommendation>,
    /// Role-tagged messages as shown to the volunteer
    pub messages: &'a [ChatMessage],
    pub saved_at: DateTime<Utc>,
}

impl<'a> SessionRecord<'a> {
    pub fn from_state(state: &'a ConversationState) -> Self {
        Self {
            session_id: &state.session_id,
            started_at: state.started_at,
            phase: state.phase,
            total_turns: state.total_turns,
            turns: &state.turns,
            profile: state.profile.snapshot(),
            phase_scores: &state.phase_scores,
            termination: state.termination,
            recommendation: state.recommendation.as_ref(),
            messages: &state.messages,
            saved_at: Utc::now(),
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| PersistenceError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Human-readable transcript: `ROLE: content` blocks separated by blank lines
pub struct HumanTranscript<'a> {
    messages: &'a [ChatMessage],
}

impl<'a> HumanTranscript<'a> {
    pub fn new(messages: &'a [ChatMessage]) -> Self {
        Self { messages }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        for message in self.messages {
            output.push_str(&format!(
                "{}: {}\n\n",
                message.role.as_str().to_uppercase(),
                message.content
            ));
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<(), PersistenceError> {
        let io_error = |source| PersistenceError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut file = std::fs::File::create(path).map_err(io_error)?;
        write!(file, "{}", self.format()).map_err(io_error)?;
        Ok(())
    }
}

/// Destination for session snapshots, written at phase boundaries and at termination
pub trait RecordSink: Send + Sync {
    fn persist(&self, state: &ConversationState) -> Result<(), PersistenceError>;
}

/// Writes `<session_id>.txt` and `<session_id>.json` into a records directory.
/// Each write overwrites the previous snapshot of the session.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn transcript_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", session_id))
    }

    pub fn record_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }
}

impl RecordSink for FileSink {
    fn persist(&self, state: &ConversationState) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        let transcript_path = self.transcript_path(&state.session_id);
        let record_path = self.record_path(&state.session_id);

        HumanTranscript::new(&state.messages).write_file(&transcript_path)?;
        SessionRecord::from_state(state).write_json(&record_path)?;

        debug!("Session {} saved to {:?}", state.session_id, record_path);
        Ok(())
    }
}

/// Sink that keeps nothing, for sessions that must not touch disk
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn persist(&self, _state: &ConversationState) -> Result<(), PersistenceError> {
        Ok(())
    }
}
