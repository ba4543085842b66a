use serde_json::Value;

use crate::error::ClassifierError;
use crate::models::{
    AgeComfort, Classification, ClassificationSource, Intent, Phase, PhaseScore, PhaseSpec,
    ProfileUpdate, TeachingInterest,
};

/// Validate and normalize the model's structured classification.
///
/// Intent must be a label the phase allows, confidence must be numeric
/// (it is clamped to [0, 1]) and the reply must be non-blank. Signals are
/// parsed leniently: unrecognized values are dropped, never fatal.
pub fn normalize_classification(
    spec: &PhaseSpec,
    raw: &Value,
) -> Result<Classification, ClassifierError> {
    let object = raw
        .as_object()
        .ok_or_else(|| ClassifierError::Malformed("output is not a JSON object".to_string()))?;

    let label = object
        .get("intent")
        .and_then(Value::as_str)
        .ok_or_else(|| ClassifierError::Malformed("missing intent".to_string()))?;
    let intent = Intent::parse_label(label)
        .ok_or_else(|| ClassifierError::Malformed(format!("unknown intent label {:?}", label)))?;
    if !spec.allows(intent) {
        return Err(ClassifierError::Malformed(format!(
            "intent {} is not allowed in phase {:?}",
            label, spec.phase
        )));
    }

    let confidence = object
        .get("confidence")
        .and_then(parse_number)
        .filter(|c| c.is_finite())
        .ok_or_else(|| ClassifierError::Malformed("missing or non-numeric confidence".to_string()))?
        .clamp(0.0, 1.0);

    let reply = object
        .get("tone_reply")
        .or_else(|| object.get("reply"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ClassifierError::Malformed("missing reply text".to_string()))?
        .to_string();

    let signals = object.get("signals").map(parse_signals).unwrap_or_default();

    Ok(Classification {
        intent,
        confidence,
        reply,
        signals,
        source: ClassificationSource::Model,
    })
}

/// Validate the evaluator's score for `phase`, clamping it to 1-5
pub fn normalize_phase_score(phase: Phase, raw: &Value) -> Result<PhaseScore, ClassifierError> {
    let score = raw
        .get("score")
        .and_then(parse_number)
        .filter(|s| s.is_finite())
        .ok_or_else(|| ClassifierError::Malformed("missing or non-numeric score".to_string()))?
        .clamp(1.0, 5.0);

    let notes = raw
        .get("notes")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    Ok(PhaseScore { phase, score, notes })
}

/// Parse the signals object, keeping only explicitly stated values
pub fn parse_signals(raw: &Value) -> ProfileUpdate {
    let Some(object) = raw.as_object() else {
        return ProfileUpdate::default();
    };

    let motivation = object
        .get("motivation")
        .and_then(non_null_str)
        .map(str::to_string);

    let has_teaching_experience = object.get("has_teaching_experience").and_then(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    });

    let teaching_interest = object
        .get("teaching_interest")
        .and_then(non_null_str)
        .and_then(|s| match s.to_lowercase().as_str() {
            "yes" => Some(TeachingInterest::Yes),
            "no" => Some(TeachingInterest::No),
            "maybe" => Some(TeachingInterest::Maybe),
            _ => None,
        });

    let children_age_comfort = object
        .get("children_age_comfort")
        .and_then(non_null_str)
        .and_then(|s| match s.to_lowercase().as_str() {
            "primary" => Some(AgeComfort::Primary),
            "middle" => Some(AgeComfort::Middle),
            "secondary" => Some(AgeComfort::Secondary),
            "unsure" => Some(AgeComfort::Unsure),
            _ => None,
        });

    let text = |key: &str| object.get(key).and_then(non_null_str).map(str::to_string);

    ProfileUpdate {
        motivation,
        has_teaching_experience,
        teaching_interest,
        subjects: string_list(object.get("subjects")),
        children_age_comfort,
        name: text("name"),
        languages: string_list(object.get("languages")),
        availability: text("availability"),
        concerns: text("concerns"),
    }
}

/// A list given as a JSON array or a comma-separated string, lowercased
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(non_null_str)
            .map(str::to_lowercase)
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty() && !is_null_word(p))
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A trimmed string that is not a spelled-out null
fn non_null_str(value: &Value) -> Option<&str> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_null_word(s))
}

fn is_null_word(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "null" | "none" | "n/a")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Phase, PhaseTable};
    use serde_json::json;

    fn background() -> PhaseSpec {
        PhaseTable::default().lookup(Phase::Background).unwrap().clone()
    }

    #[test]
    fn test_normalize_valid_output() {
        let raw = json!({
            "intent": "EXPERIENCE_SHARED",
            "confidence": 0.9,
            "tone_reply": "That's lovely! Which subjects do you enjoy teaching?",
            "signals": {
                "has_teaching_experience": true,
                "teaching_interest": "yes",
                "motivation": null,
                "subjects": ["Math", "null"],
                "children_age_comfort": "primary"
            }
        });

        let classification = normalize_classification(&background(), &raw).unwrap();

        assert_eq!(classification.intent, Intent::ExperienceShared);
        assert_eq!(classification.confidence, 0.9);
        assert_eq!(classification.source, ClassificationSource::Model);
        assert_eq!(classification.signals.has_teaching_experience, Some(true));
        assert_eq!(classification.signals.subjects, vec!["math".to_string()]);
        assert_eq!(classification.signals.motivation, None);
        assert_eq!(classification.signals.children_age_comfort, Some(AgeComfort::Primary));
    }

    #[test]
    fn test_rejects_label_from_other_phase() {
        let raw = json!({"intent": "TIME_YES", "confidence": 0.8, "tone_reply": "ok"});
        let err = normalize_classification(&background(), &raw).unwrap_err();

        assert!(matches!(err, ClassifierError::Malformed(_)));
    }

    #[test]
    fn test_rejects_missing_confidence() {
        let raw = json!({"intent": "QUERY", "tone_reply": "Good question!"});

        assert!(normalize_classification(&background(), &raw).is_err());
    }

    #[test]
    fn test_clamps_confidence_and_accepts_string_number() {
        let raw = json!({"intent": "STOP", "confidence": "1.7", "tone_reply": "Take care!"});
        let classification = normalize_classification(&background(), &raw).unwrap();

        assert_eq!(classification.confidence, 1.0);
    }

    #[test]
    fn test_rejects_blank_reply() {
        let raw = json!({"intent": "AMBIGUOUS", "confidence": 0.3, "tone_reply": "  "});

        assert!(normalize_classification(&background(), &raw).is_err());
    }

    #[test]
    fn test_lenient_signals() {
        let signals = parse_signals(&json!({
            "has_teaching_experience": "No",
            "teaching_interest": "MAYBE",
            "motivation": "None",
            "subjects": "english, science,",
            "children_age_comfort": "teenagers"
        }));

        assert_eq!(signals.has_teaching_experience, Some(false));
        assert_eq!(signals.teaching_interest, Some(TeachingInterest::Maybe));
        assert_eq!(signals.motivation, None);
        assert_eq!(signals.subjects, vec!["english".to_string(), "science".to_string()]);
        assert_eq!(signals.children_age_comfort, None);
    }

    #[test]
    fn test_phase_score() {
        let score = normalize_phase_score(Phase::Faq, &json!({"score": "7", "notes": " Curious "})).unwrap();
        assert_eq!(score.score, 5.0);
        assert_eq!(score.notes, "Curious");

        let score = normalize_phase_score(Phase::Faq, &json!({"score": 3.5})).unwrap();
        assert_eq!(score.score, 3.5);
        assert!(score.notes.is_empty());

        assert!(normalize_phase_score(Phase::Faq, &json!({"notes": "no score"})).is_err());
    }

    #[test]
    fn test_key_details() {
        let signals = parse_signals(&json!({
            "name": "Ravi",
            "languages": "Kannada, English",
            "availability": "weekends after 4pm",
            "concerns": "n/a"
        }));

        assert_eq!(signals.name.as_deref(), Some("Ravi"));
        assert_eq!(signals.languages, vec!["kannada".to_string(), "english".to_string()]);
        assert_eq!(signals.availability.as_deref(), Some("weekends after 4pm"));
        assert_eq!(signals.concerns, None);
    }
}
