use std::time::Duration;

use tracing::{info, warn};

use crate::llm::{
    build_scoring_prompt, normalize_phase_score, scoring_tool, LanguageModel, SCORING_SYSTEM_PROMPT,
};
use crate::models::{PhaseScore, PhaseSpec, Turn};

/// Rate the volunteer's turns in `spec.phase` against the phase rubric.
///
/// Returns `None` when the phase has no rubric or no turns, or when the
/// evaluator fails, times out or answers without a usable score. Scoring
/// never blocks the interview.
pub async fn score_phase(
    model: &dyn LanguageModel,
    spec: &PhaseSpec,
    turns: &[Turn],
    timeout: Duration,
) -> Option<PhaseScore> {
    let phase_turns: Vec<Turn> = turns.iter().filter(|t| t.phase == spec.phase).cloned().collect();
    if spec.rubric.trim().is_empty() || phase_turns.is_empty() {
        return None;
    }

    let prompt = build_scoring_prompt(spec, &phase_turns);
    let tool = scoring_tool();

    let request = model.send_with_tool(SCORING_SYSTEM_PROMPT, &prompt, &tool);
    let raw = match tokio::time::timeout(timeout, request).await {
        Ok(Ok(Some(raw))) => raw,
        Ok(Ok(None)) => {
            warn!("Phase {:?}: evaluator returned no score", spec.phase);
            return None;
        }
        Ok(Err(e)) => {
            warn!("Phase {:?}: scoring failed: {:#}", spec.phase, e);
            return None;
        }
        Err(_) => {
            warn!("Phase {:?}: scoring timed out after {:?}", spec.phase, timeout);
            return None;
        }
    };

    match normalize_phase_score(spec.phase, &raw) {
        Ok(score) => {
            info!("Phase {:?} scored {:.1}", spec.phase, score.score);
            Some(score)
        }
        Err(e) => {
            warn!("Phase {:?}: {}", spec.phase, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolSpec;
    use crate::models::{ClassificationSource, Intent, Phase, PhaseTable};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;

    enum Evaluator {
        Score(serde_json::Value),
        Hang,
    }

    #[async_trait]
    impl LanguageModel for Evaluator {
        async fn send_message(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn send_with_tool(
            &self,
            _system: &str,
            user: &str,
            _tool: &ToolSpec,
        ) -> Result<Option<serde_json::Value>> {
            assert!(user.contains("Rubric:"));
            match self {
                Evaluator::Score(raw) => Ok(Some(raw.clone())),
                Evaluator::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }

    fn turn(phase: Phase, text: &str) -> Turn {
        Turn {
            index: 0,
            phase,
            turn_in_phase: 0,
            text: text.to_string(),
            intent: Intent::Info,
            confidence: 0.8,
            reply: "Thanks!".to_string(),
            signals: Default::default(),
            source: ClassificationSource::Model,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_scores_only_the_phase_turns() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Greeting).unwrap();
        let evaluator = Evaluator::Score(serde_json::json!({"score": 4, "notes": "Friendly"}));
        let turns = vec![turn(Phase::Greeting, "Hi, I'm Asha"), turn(Phase::Background, "I code")];

        let score = score_phase(&evaluator, spec, &turns, Duration::from_secs(1)).await.unwrap();

        assert_eq!(score.phase, Phase::Greeting);
        assert_eq!(score.score, 4.0);

        let faq = table.lookup(Phase::Faq).unwrap();
        assert!(score_phase(&evaluator, faq, &turns, Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_failures_yield_no_score() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Greeting).unwrap();
        let turns = vec![turn(Phase::Greeting, "hello")];

        let malformed = Evaluator::Score(serde_json::json!({"notes": "forgot the score"}));
        assert!(score_phase(&malformed, spec, &turns, Duration::from_secs(1)).await.is_none());

        let hung = score_phase(&Evaluator::Hang, spec, &turns, Duration::from_millis(50)).await;
        assert!(hung.is_none());
    }
}
