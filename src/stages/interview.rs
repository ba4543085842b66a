use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{decide, score_phase, summarize, Action, DecisionInput, EnginePolicy};
use crate::error::ConfigError;
use crate::heuristics::CLARIFY_ACKNOWLEDGEMENT;
use crate::io::RecordSink;
use crate::llm::{ClassificationRequest, Classifier, LanguageModel};
use crate::models::{
    ChatMessage, Classification, ClassificationSource, ConversationState, Intent, Phase,
    PhaseSpec, PhaseTable, ProfileUpdate, Termination, Turn,
};

/// Configuration for the conversation loop
#[derive(Debug, Clone)]
pub struct InterviewConfig {
    pub policy: EnginePolicy,
    /// Number of recent messages given to the classifier
    pub history_window: usize,
    /// Session-wide turn cap, after which the interview completes regardless
    pub max_total_turns: u32,
    /// Profile signals needed for a Recommend label when no phase was scored
    pub recommend_min_signals: usize,
    /// Bound on each evaluator call (phase score, coordinator summary)
    pub model_timeout: Duration,
    pub welcome_message: String,
    pub closing_message: String,
    pub stop_message: String,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            policy: EnginePolicy::default(),
            history_window: 6,
            max_total_turns: 30,
            recommend_min_signals: 4,
            model_timeout: Duration::from_secs(20),
            welcome_message: "Hi! I'm Shiksha Mitra, so nice to meet you. I'll ask a few friendly \
                              questions to understand your background and availability. This is \
                              a casual chat."
                .to_string(),
            closing_message: "Thank you so much for sharing! Based on this conversation, our team \
                              will get in touch with you shortly."
                .to_string(),
            stop_message: "No problem at all, thank you for your time. You are always welcome \
                           to join the SERVE community whenever you are ready."
                .to_string(),
        }
    }
}

/// Result of handling one volunteer message
#[derive(Debug, Clone)]
pub struct Reply {
    /// Assistant messages to render, in order
    pub messages: Vec<String>,
    /// The engine's decision, or `None` if the interview had already ended
    pub action: Option<Action>,
    /// Phase after the turn
    pub phase: Phase,
    pub finished: bool,
}

/// Drives interview sessions turn by turn.
///
/// The loop holds no per-session state: each call takes the session's
/// [`ConversationState`] by `&mut`, so one `Interview` can serve many
/// independent sessions.
pub struct Interview<C, S> {
    table: Arc<PhaseTable>,
    classifier: C,
    sink: S,
    evaluator: Option<Arc<dyn LanguageModel>>,
    config: InterviewConfig,
}

impl<C: Classifier, S: RecordSink> Interview<C, S> {
    pub fn new(table: Arc<PhaseTable>, classifier: C, sink: S, config: InterviewConfig) -> Self {
        Self {
            table,
            classifier,
            sink,
            evaluator: None,
            config,
        }
    }

    /// Use a model to score each phase against its rubric and to write the
    /// coordinator summary at the end of each session
    pub fn with_evaluator(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.evaluator = Some(model);
        self
    }

    pub fn table(&self) -> &PhaseTable {
        &self.table
    }

    /// Open a new session with the welcome message and the first question
    pub fn start(&self) -> Result<ConversationState, ConfigError> {
        let mut state = ConversationState::new(self.table.first());
        let spec = self.table.lookup(state.phase)?;

        state.messages.push(ChatMessage::assistant(format!(
            "{} {}",
            self.config.welcome_message, spec.opening_prompt
        )));

        info!("Session {} started in phase {:?}", state.session_id, state.phase);
        Ok(state)
    }

    /// Process one volunteer message: classify, merge signals, decide, and
    /// emit the next assistant message(s).
    pub async fn handle_message(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<Reply, ConfigError> {
        if let Some(termination) = state.termination {
            debug!("Session {}: ignoring input after termination", state.session_id);
            return Ok(Reply {
                messages: vec![self.farewell(termination).to_string()],
                action: None,
                phase: state.phase,
                finished: true,
            });
        }

        let spec = self.table.lookup(state.phase)?;

        let classification = {
            let request = ClassificationRequest {
                spec,
                history: state.recent_messages(self.config.history_window),
                message: text,
                profile: &state.profile,
            };
            match self.classifier.classify(&request).await {
                Ok(classification) => classification,
                Err(e) => {
                    warn!("Session {}: classification failed: {}", state.session_id, e);
                    Classification {
                        intent: Intent::Ambiguous,
                        confidence: 0.0,
                        reply: format!("{} {}", CLARIFY_ACKNOWLEDGEMENT, spec.opening_prompt),
                        signals: ProfileUpdate::default(),
                        source: ClassificationSource::Degraded,
                    }
                }
            }
        };

        debug!(
            "Session {} turn {}: {:?} ({:.2}, {:?})",
            state.session_id,
            state.total_turns,
            classification.intent,
            classification.confidence,
            classification.source
        );

        state.messages.push(ChatMessage::user(text));

        let changed = state.profile.merge(&classification.signals);
        if !changed.is_empty() {
            debug!("Session {}: profile updated {:?}", state.session_id, changed);
        }

        let mut action = decide(&DecisionInput {
            spec,
            turn_in_phase: state.turn_in_phase,
            classification: &classification,
            profile: &state.profile,
            policy: &self.config.policy,
        });

        state.turns.push(Turn {
            index: state.total_turns,
            phase: state.phase,
            turn_in_phase: state.turn_in_phase,
            text: text.to_string(),
            intent: classification.intent,
            confidence: classification.confidence,
            reply: classification.reply.clone(),
            signals: classification.signals.clone(),
            source: classification.source,
            timestamp: Utc::now(),
        });
        state.total_turns += 1;
        state.turn_in_phase += 1;

        if !action.is_terminal() && state.total_turns >= self.config.max_total_turns {
            warn!(
                "Session {}: reached {} turns, closing the interview",
                state.session_id, state.total_turns
            );
            action = Action::TerminateComplete {
                insufficient_info: true,
            };
        }

        if matches!(action, Action::Advance { .. } | Action::TerminateComplete { .. }) {
            self.record_phase_score(state, spec).await;
        }

        let mut messages = Vec::new();
        match action {
            Action::Continue => {
                messages.push(classification.reply);
                if state.persist_pending {
                    self.checkpoint(state);
                }
            }
            Action::Advance { next } => {
                let next_spec = self.table.lookup(next)?;
                info!(
                    "Session {}: {:?} -> {:?} after {} turns",
                    state.session_id, state.phase, next, state.turn_in_phase
                );
                messages.push(classification.reply);
                messages.push(next_spec.opening_prompt.clone());
                state.phase = next;
                state.turn_in_phase = 0;
            }
            Action::TerminateStop => {
                state.termination = Some(Termination::Stopped);
                messages.push(self.farewell(Termination::Stopped).to_string());
            }
            Action::TerminateComplete { insufficient_info } => {
                let termination = if insufficient_info {
                    Termination::CompleteInsufficientInfo
                } else {
                    Termination::Complete
                };
                state.termination = Some(termination);
                messages.push(self.farewell(termination).to_string());
            }
        }

        state
            .messages
            .extend(messages.iter().map(|m| ChatMessage::assistant(m.as_str())));

        if action.is_terminal() {
            info!(
                "Session {} ended: {:?} after {} turns",
                state.session_id, state.termination, state.total_turns
            );
            let recommendation = summarize(
                state,
                self.config.recommend_min_signals,
                self.evaluator.as_deref(),
                self.config.model_timeout,
            )
            .await;
            state.recommendation = recommendation;
        }

        if !matches!(action, Action::Continue) {
            self.checkpoint(state);
        }

        Ok(Reply {
            messages,
            action: Some(action),
            phase: state.phase,
            finished: state.is_finished(),
        })
    }

    /// Score the phase being left, if an evaluator is configured
    async fn record_phase_score(&self, state: &mut ConversationState, spec: &PhaseSpec) {
        let Some(evaluator) = self.evaluator.as_deref() else {
            return;
        };
        let score = score_phase(evaluator, spec, &state.turns, self.config.model_timeout).await;
        state.phase_scores.extend(score);
    }

    fn farewell(&self, termination: Termination) -> &str {
        match termination {
            Termination::Stopped => &self.config.stop_message,
            Termination::Complete | Termination::CompleteInsufficientInfo => {
                &self.config.closing_message
            }
        }
    }

    /// Persist a snapshot of the session. Called at phase boundaries and at
    /// termination, and by callers abandoning a session mid-phase. A failure
    /// is logged and retried on the next turn.
    pub fn checkpoint(&self, state: &mut ConversationState) {
        match self.sink.persist(state) {
            Ok(()) => state.persist_pending = false,
            Err(e) => {
                warn!("Session {}: {}; will retry", state.session_id, e);
                state.persist_pending = true;
            }
        }
    }
}
