use std::time::Duration;

use tracing::{info, warn};

use crate::llm::{build_summary_prompt, LanguageModel, SUMMARY_SYSTEM_PROMPT};
use crate::models::{
    ConversationState, PhaseScore, Recommendation, RecommendationLabel, Termination,
};

/// Mean phase score at or above which the volunteer is recommended
const RECOMMEND_AVERAGE: f64 = 4.0;
/// Mean phase score at or above which the volunteer is held for re-screening
const HOLD_AVERAGE: f64 = 2.5;

pub fn average_score(scores: &[PhaseScore]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64)
}

/// Recommendation from how the interview ended, the phase scores and what
/// was learned.
///
/// A stopped interview is never recommended. Otherwise the mean phase score
/// decides (>= 4 Recommend, >= 2.5 Hold, else NotRecommended), except that
/// an interview cut short is held at best. Without scores the label falls
/// back to profile completeness.
pub fn recommend(
    termination: Termination,
    scores: &[PhaseScore],
    profile_filled: usize,
    required: usize,
) -> Recommendation {
    let average = average_score(scores);

    let (label, reason) = match (termination, average) {
        (Termination::Stopped, _) => (
            RecommendationLabel::NotRecommended,
            "Volunteer chose to end the conversation".to_string(),
        ),
        (_, Some(average)) => {
            let label = if average >= RECOMMEND_AVERAGE {
                RecommendationLabel::Recommend
            } else if average >= HOLD_AVERAGE {
                RecommendationLabel::Hold
            } else {
                RecommendationLabel::NotRecommended
            };

            if termination == Termination::CompleteInsufficientInfo
                && label == RecommendationLabel::Recommend
            {
                (
                    RecommendationLabel::Hold,
                    format!(
                        "Average phase score {:.2}, but the interview was cut short; re-screen",
                        average
                    ),
                )
            } else {
                (
                    label,
                    format!("Average phase score {:.2} over {} phases", average, scores.len()),
                )
            }
        }
        (Termination::CompleteInsufficientInfo, None) => (
            RecommendationLabel::Hold,
            "Interview ended before enough was learned; re-screen".to_string(),
        ),
        (Termination::Complete, None) if profile_filled >= required => (
            RecommendationLabel::Recommend,
            format!("Completed all phases with {} of 5 profile signals", profile_filled),
        ),
        (Termination::Complete, None) => (
            RecommendationLabel::Hold,
            format!("Completed all phases but only {} of 5 profile signals known", profile_filled),
        ),
    };

    Recommendation {
        label,
        reason,
        average_score: average,
        summary: None,
    }
}

/// Build the coordinator recommendation for a finished interview, asking the
/// model for a short free-text summary when one is available. The model call
/// is bounded by `timeout`; expiry leaves the summary empty.
pub async fn summarize(
    state: &ConversationState,
    required_signals: usize,
    model: Option<&dyn LanguageModel>,
    timeout: Duration,
) -> Option<Recommendation> {
    let termination = state.termination?;
    let mut recommendation = recommend(
        termination,
        &state.phase_scores,
        state.profile.filled_count(),
        required_signals,
    );

    if let Some(model) = model {
        let prompt = build_summary_prompt(&state.messages, &state.profile);
        match tokio::time::timeout(timeout, model.send_message(SUMMARY_SYSTEM_PROMPT, &prompt)).await {
            Ok(Ok(summary)) if !summary.trim().is_empty() => {
                recommendation.summary = Some(summary.trim().to_string());
            }
            Ok(Ok(_)) => warn!("Session {}: empty coordinator summary", state.session_id),
            Ok(Err(e)) => warn!("Session {}: coordinator summary failed: {:#}", state.session_id, e),
            Err(_) => warn!(
                "Session {}: coordinator summary timed out after {:?}",
                state.session_id, timeout
            ),
        }
    }

    info!(
        "Session {}: recommendation {:?} ({})",
        state.session_id, recommendation.label, recommendation.reason
    );
    Some(recommendation)
}
