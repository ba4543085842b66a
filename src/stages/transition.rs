use serde::Serialize;

use crate::models::{Classification, Intent, Phase, PhaseSpec, SignalStore};

/// Tunables of the transition policy
#[derive(Debug, Clone)]
pub struct EnginePolicy {
    /// Classifications below this confidence never move the interview
    pub min_confidence: f64,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self { min_confidence: 0.4 }
    }
}

/// What the conversation loop should do after a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Stay in the phase and ask the next guided question
    Continue,
    /// Move to the next phase and reset the per-phase turn counter
    Advance { next: Phase },
    /// The volunteer asked to stop
    TerminateStop,
    /// The interview is finished
    TerminateComplete { insufficient_info: bool },
}

impl Action {
    pub fn is_terminal(self) -> bool {
        matches!(self, Action::TerminateStop | Action::TerminateComplete { .. })
    }
}

/// Inputs to one transition decision
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub spec: &'a PhaseSpec,
    /// 0-based index of the classified turn within the phase
    pub turn_in_phase: u32,
    pub classification: &'a Classification,
    pub profile: &'a SignalStore,
    pub policy: &'a EnginePolicy,
}

/// Decide the next action. Rules apply in strict priority order:
///
/// 1. STOP terminates, regardless of confidence or turn count.
/// 2. QUERY, AMBIGUOUS or low confidence continue the phase.
/// 3. In the final phase, a substantive answer completes the interview
///    once `min_turns` is reached.
/// 4. In earlier phases, a sufficiently complete profile advances once
///    `min_turns - 1` is reached.
/// 5. At `max_turns - 1` the phase is left anyway; leaving the final phase
///    this way completes with insufficient info.
/// 6. Otherwise continue.
pub fn decide(input: &DecisionInput<'_>) -> Action {
    let spec = input.spec;
    let turn = input.turn_in_phase;
    let classification = input.classification;
    let next = spec.phase.next();

    if classification.intent == Intent::Stop {
        return Action::TerminateStop;
    }

    if classification.intent.is_non_advancing() || classification.confidence < input.policy.min_confidence {
        return Action::Continue;
    }

    match next {
        None => {
            if turn >= spec.min_turns {
                return Action::TerminateComplete {
                    insufficient_info: false,
                };
            }
        }
        Some(next) => {
            if input.profile.is_sufficiently_complete(spec.required_signals)
                && turn >= spec.min_turns.saturating_sub(1)
            {
                return Action::Advance { next };
            }
        }
    }

    if turn >= spec.max_turns.saturating_sub(1) {
        return match next {
            Some(next) => Action::Advance { next },
            None => Action::TerminateComplete {
                insufficient_info: true,
            },
        };
    }

    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgeComfort, ClassificationSource, PhaseTable, ProfileUpdate, TeachingInterest,
    };

    fn classification(intent: Intent, confidence: f64) -> Classification {
        Classification {
            intent,
            confidence,
            reply: "Thanks!".to_string(),
            signals: ProfileUpdate::default(),
            source: ClassificationSource::Model,
        }
    }

    fn decide_in(
        spec: &PhaseSpec,
        turn_in_phase: u32,
        classification: &Classification,
        profile: &SignalStore,
    ) -> Action {
        decide(&DecisionInput {
            spec,
            turn_in_phase,
            classification,
            profile,
            policy: &EnginePolicy::default(),
        })
    }

    fn full_profile() -> SignalStore {
        let mut profile = SignalStore::new();
        profile.merge(&ProfileUpdate {
            motivation: Some("help".to_string()),
            has_teaching_experience: Some(true),
            teaching_interest: Some(TeachingInterest::Yes),
            subjects: vec!["math".to_string()],
            children_age_comfort: Some(AgeComfort::Middle),
            ..Default::default()
        });
        profile
    }

    #[test]
    fn test_stop_takes_precedence() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Greeting).unwrap();

        for confidence in [0.0, 0.2, 1.0] {
            let action = decide_in(spec, 0, &classification(Intent::Stop, confidence), &full_profile());
            assert_eq!(action, Action::TerminateStop);
        }
    }

    #[test]
    fn test_low_confidence_does_not_advance() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Background).unwrap();

        let action = decide_in(spec, 0, &classification(Intent::Affirm, 0.2), &full_profile());
        assert_eq!(action, Action::Continue);

        // Not even at the forced-exit point
        let action = decide_in(spec, 20, &classification(Intent::Affirm, 0.2), &full_profile());
        assert_eq!(action, Action::Continue);
    }

    #[test]
    fn test_query_and_ambiguous_continue() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Faq).unwrap();

        for intent in [Intent::Query, Intent::Ambiguous] {
            let action = decide_in(spec, 3, &classification(intent, 0.95), &full_profile());
            assert_eq!(action, Action::Continue);
        }
    }

    #[test]
    fn test_final_phase_completes_after_min_turns() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Faq).unwrap();
        let thanks = classification(Intent::Thanks, 0.9);

        assert_eq!(decide_in(spec, 0, &thanks, &SignalStore::new()), Action::Continue);
        assert_eq!(
            decide_in(spec, 1, &thanks, &SignalStore::new()),
            Action::TerminateComplete {
                insufficient_info: false
            }
        );
    }

    #[test]
    fn test_sufficient_profile_advances_after_dwell() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Background).unwrap();
        let answer = classification(Intent::ExperienceShared, 0.9);

        assert_eq!(decide_in(spec, 0, &answer, &full_profile()), Action::Continue);
        assert_eq!(
            decide_in(spec, 1, &answer, &full_profile()),
            Action::Advance {
                next: Phase::ProgramExplainer
            }
        );
    }

    #[test]
    fn test_forced_advance_at_max_turns() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Background).unwrap();
        let answer = classification(Intent::Info, 0.7);
        let empty = SignalStore::new();

        assert_eq!(decide_in(spec, spec.max_turns - 2, &answer, &empty), Action::Continue);
        assert_eq!(
            decide_in(spec, spec.max_turns - 1, &answer, &empty),
            Action::Advance {
                next: Phase::ProgramExplainer
            }
        );
    }

    #[test]
    fn test_forced_exit_from_final_phase_is_insufficient() {
        let mut spec = PhaseTable::default().lookup(Phase::Faq).unwrap().clone();
        spec.min_turns = 3;
        spec.max_turns = 3;

        let action = decide_in(&spec, 2, &classification(Intent::Affirm, 0.8), &SignalStore::new());
        assert_eq!(
            action,
            Action::TerminateComplete {
                insufficient_info: true
            }
        );
    }

    #[test]
    fn test_background_scenario() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Background).unwrap();
        let mut profile = SignalStore::new();

        let mut turn1 = classification(Intent::MotivationShared, 0.8);
        turn1.signals.motivation = Some("help".to_string());
        profile.merge(&turn1.signals);
        assert_eq!(profile.filled_count(), 1);
        assert_eq!(decide_in(spec, 0, &turn1, &profile), Action::Continue);

        let mut turn2 = classification(Intent::ExperienceShared, 0.9);
        turn2.signals = ProfileUpdate {
            has_teaching_experience: Some(false),
            subjects: vec![],
            teaching_interest: Some(TeachingInterest::Yes),
            children_age_comfort: Some(AgeComfort::Primary),
            ..Default::default()
        };
        profile.merge(&turn2.signals);
        assert_eq!(profile.filled_count(), 4);
        assert_eq!(
            decide_in(spec, 1, &turn2, &profile),
            Action::Advance {
                next: Phase::ProgramExplainer
            }
        );
    }

    #[test]
    fn test_never_moves_backward() {
        let table = PhaseTable::default();
        let answer = classification(Intent::Affirm, 0.9);

        for spec in table.specs() {
            for turn in 0..spec.max_turns + 2 {
                if let Action::Advance { next } = decide_in(spec, turn, &answer, &full_profile()) {
                    assert!(next > spec.phase);
                }
            }
        }
    }
}
