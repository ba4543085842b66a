use serde::{Deserialize, Serialize};

use super::Intent;
use crate::error::ConfigError;

/// Conversational phases, in interview order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Warm greeting, small talk, reassurance that this is casual
    Greeting,
    /// Work/studies, motivation, teaching experience, comfort with children
    Background,
    /// How the smart-class programme works
    ProgramExplainer,
    /// Weekly time, preferred slots, consistency
    Commitment,
    /// Volunteer questions, then a warm close
    Faq,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Greeting,
        Phase::Background,
        Phase::ProgramExplainer,
        Phase::Commitment,
        Phase::Faq,
    ];

    /// Position in the interview sequence
    pub fn index(self) -> usize {
        self as usize
    }

    /// The phase that follows this one, if any
    pub fn next(self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }
}

/// Static definition of one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub phase: Phase,
    /// Display name
    pub name: String,
    /// Tells the classifier what to listen for in this phase
    pub guidance: String,
    /// Assistant message emitted when the phase is entered
    pub opening_prompt: String,
    /// Phase-specific intent labels (universal and lexical labels are always allowed)
    pub allowed_intents: Vec<Intent>,
    /// Turns required in the phase before an early exit is allowed
    pub min_turns: u32,
    /// Forced exit point regardless of signal completeness
    pub max_turns: u32,
    /// Profile fields that must be filled for an early exit
    #[serde(default)]
    pub required_signals: usize,
    /// What the evaluator rates (1-5) when the phase ends; empty skips scoring
    #[serde(default)]
    pub rubric: String,
}

impl PhaseSpec {
    /// Whether `intent` is a valid label for this phase
    pub fn allows(&self, intent: Intent) -> bool {
        intent.is_universal() || intent.is_lexical() || self.allowed_intents.contains(&intent)
    }
}

/// Read-only mapping from phase to its definition, shared across sessions
#[derive(Debug, Clone)]
pub struct PhaseTable {
    specs: Vec<PhaseSpec>,
}

impl PhaseTable {
    /// Build a table from deployment-provided specs, validating the invariants
    pub fn from_specs(mut specs: Vec<PhaseSpec>) -> Result<Self, ConfigError> {
        specs.sort_by_key(|s| s.phase);

        if specs.len() != Phase::ALL.len() {
            return Err(ConfigError::InvalidPhaseTable(format!(
                "expected {} phases, found {}",
                Phase::ALL.len(),
                specs.len()
            )));
        }

        for (spec, expected) in specs.iter().zip(Phase::ALL) {
            if spec.phase != expected {
                return Err(ConfigError::InvalidPhaseTable(format!(
                    "phase {:?} is missing or duplicated",
                    expected
                )));
            }
            if spec.min_turns == 0 || spec.min_turns > spec.max_turns {
                return Err(ConfigError::InvalidPhaseTable(format!(
                    "phase {:?}: need 1 <= min_turns ({}) <= max_turns ({})",
                    spec.phase, spec.min_turns, spec.max_turns
                )));
            }
            if spec.required_signals > super::SignalStore::TRACKED_FIELDS {
                return Err(ConfigError::InvalidPhaseTable(format!(
                    "phase {:?}: required_signals {} exceeds tracked fields",
                    spec.phase, spec.required_signals
                )));
            }
        }

        Ok(Self { specs })
    }

    pub fn lookup(&self, phase: Phase) -> Result<&PhaseSpec, ConfigError> {
        self.specs
            .get(phase.index())
            .filter(|s| s.phase == phase)
            .ok_or(ConfigError::UnknownPhase(phase))
    }

    pub fn first(&self) -> Phase {
        Phase::ALL[0]
    }

    pub fn specs(&self) -> &[PhaseSpec] {
        &self.specs
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        let specs = vec![
            PhaseSpec {
                phase: Phase::Greeting,
                name: "Greeting & Rapport".to_string(),
                guidance: "Greet warmly, ask their name and how their day is going, check they are \
                           comfortable, and reassure them this is a casual chat."
                    .to_string(),
                opening_prompt: "To start, may I know your name and how your day is going?"
                    .to_string(),
                allowed_intents: vec![Intent::Thanks],
                min_turns: 1,
                max_turns: 3,
                required_signals: 0,
                rubric: "Rate comfort, clarity, and engagement.".to_string(),
            },
            PhaseSpec {
                phase: Phase::Background,
                name: "Getting to Know You".to_string(),
                guidance: "Understand their work or studies, why they want to volunteer, any \
                           teaching or mentoring experience (formal or informal), subjects they are \
                           comfortable teaching, the age group of children they are comfortable \
                           with, and their interest in teaching. Beginners are welcome; never judge. \
                           Do not ask personal questions (phone, email, family, health, finances)."
                    .to_string(),
                opening_prompt: "Could you tell me a little about yourself, your work or studies, \
                                 and what brought you to volunteering with children?"
                    .to_string(),
                allowed_intents: vec![
                    Intent::MotivationShared,
                    Intent::ExperienceShared,
                    Intent::NoExperience,
                    Intent::ComfortShared,
                ],
                min_turns: 2,
                max_turns: 8,
                required_signals: 4,
                rubric: "Rate motivation, empathy, and stability.".to_string(),
            },
            PhaseSpec {
                phase: Phase::ProgramExplainer,
                name: "Programme Explanation".to_string(),
                guidance: "Explain the smart-class setup: a TV in the school classroom with the \
                           volunteer joining remotely, 30-45 minute sessions once or twice a week, \
                           lesson plans and orientation provided, connection and patience matter \
                           more than expertise. Then check it is clear."
                    .to_string(),
                opening_prompt: "Let me quickly explain how it works: we connect volunteers to \
                                 classrooms through a smart TV, sessions are short (30-45 minutes), \
                                 and we provide lesson plans and orientation. Does that sound clear?"
                    .to_string(),
                allowed_intents: vec![Intent::Ok, Intent::NotOk],
                min_turns: 1,
                max_turns: 3,
                required_signals: 0,
                rubric: "Rate understanding of the programme and comfort with the idea of \
                         teaching."
                    .to_string(),
            },
            PhaseSpec {
                phase: Phase::Commitment,
                name: "Commitment & Availability".to_string(),
                guidance: "Check comfort with about 2 hours per week, preferred days and times, how \
                           they keep sessions consistent, and willingness to inform the team early \
                           if they miss a session. Less than 2 hours is TIME_NO; hesitation is \
                           TIME_MAYBE."
                    .to_string(),
                opening_prompt: "Would around 2 hours a week work for you? Which days and times \
                                 usually suit you best?"
                    .to_string(),
                allowed_intents: vec![Intent::TimeYes, Intent::TimeMaybe, Intent::TimeNo],
                min_turns: 2,
                max_turns: 5,
                required_signals: 0,
                rubric: "Rate availability consistency, reliability, and communication \
                         responsibility."
                    .to_string(),
            },
            PhaseSpec {
                phase: Phase::Faq,
                name: "Questions & Close".to_string(),
                guidance: "Invite their questions about the syllabus, class flow, technology, \
                           orientation, missed sessions or school matching, answer briefly, and \
                           close warmly once they have nothing more to ask."
                    .to_string(),
                opening_prompt: "Do you have any questions for me about the programme, the \
                                 technology, or the classroom setup?"
                    .to_string(),
                allowed_intents: vec![Intent::Thanks, Intent::Ok],
                min_turns: 1,
                max_turns: 4,
                required_signals: 0,
                rubric: "Rate clarity of questions and comfort asking doubts.".to_string(),
            },
        ];

        Self { specs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::Greeting.next(), Some(Phase::Background));
        assert_eq!(Phase::Commitment.next(), Some(Phase::Faq));
        assert_eq!(Phase::Faq.next(), None);
        assert!(Phase::Faq.is_final());
        assert!(Phase::Greeting < Phase::Faq);
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = PhaseTable::default();
        let validated = PhaseTable::from_specs(table.specs().to_vec()).unwrap();

        for phase in Phase::ALL {
            assert_eq!(validated.lookup(phase).unwrap().phase, phase);
        }
        assert_eq!(validated.lookup(Phase::Background).unwrap().required_signals, 4);
    }

    #[test]
    fn test_rejects_missing_phase() {
        let mut specs = PhaseTable::default().specs().to_vec();
        specs.retain(|s| s.phase != Phase::Commitment);

        let err = PhaseTable::from_specs(specs).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPhaseTable(_)));
    }

    #[test]
    fn test_rejects_inverted_turn_bounds() {
        let mut specs = PhaseTable::default().specs().to_vec();
        specs[1].min_turns = 9;

        assert!(PhaseTable::from_specs(specs).is_err());
    }

    #[test]
    fn test_allows_universal_and_lexical_labels() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Commitment).unwrap();

        assert!(spec.allows(Intent::TimeMaybe));
        assert!(spec.allows(Intent::Stop));
        assert!(spec.allows(Intent::Affirm));
        assert!(!spec.allows(Intent::MotivationShared));
    }
}
