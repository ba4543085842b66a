use async_trait::async_trait;

use super::{pick_acknowledgement, HeuristicsConfig, CLARIFY_ACKNOWLEDGEMENT, QUERY_ACKNOWLEDGEMENT};
use crate::error::ClassifierError;
use crate::llm::{ClassificationRequest, Classifier};
use crate::models::{Classification, ClassificationSource, Intent, ProfileUpdate};

/// Deterministic classifier working on lexical cues only.
///
/// Used when the model is unavailable or its output cannot be parsed.
/// Confidence never exceeds `max_confidence` (0.6 by default).
#[derive(Debug, Clone, Default)]
pub struct RuleBasedClassifier {
    config: HeuristicsConfig,
}

impl RuleBasedClassifier {
    pub fn new(config: HeuristicsConfig) -> Self {
        Self { config }
    }

    /// Classify a message without any phase context
    pub fn infer_intent(&self, text: &str) -> Intent {
        let text = normalize(text);
        if text.trim().is_empty() {
            return Intent::Ambiguous;
        }

        if self.is_stop(&text) {
            return Intent::Stop;
        }
        if text.contains('?') {
            return Intent::Query;
        }
        if contains_any(&text, &self.config.affirm_idioms) {
            return Intent::Affirm;
        }
        // Negation wins over "i am" / "i will" in the same sentence
        if contains_any(&text, &self.config.negate_words) {
            return Intent::Negate;
        }
        if contains_any(&text, &self.config.affirm_words) {
            return Intent::Affirm;
        }
        if starts_with_any(&text, &self.config.question_openers) {
            return Intent::Query;
        }
        if contains_any(&text, &self.config.background_words) {
            return Intent::Info;
        }

        Intent::Ambiguous
    }

    /// Confidence from how clear and decisive the message is
    pub fn compute_confidence(&self, text: &str) -> f64 {
        let text = normalize(text);
        let cap = self.config.max_confidence;

        let confidence: f64 = if text.trim().len() < 3 {
            0.2
        } else if self.is_stop(&text)
            || contains_any(&text, &self.config.affirm_idioms)
            || contains_any(&text, &self.config.affirm_words)
            || contains_any(&text, &self.config.negate_words)
        {
            0.6
        } else if text.contains('?') {
            0.5
        } else if contains_any(&text, &self.config.detail_words)
            || contains_any(&text, &self.config.background_words)
        {
            0.5
        } else {
            0.3
        };

        confidence.min(cap)
    }

    /// A bare stop command ("quit", "please stop") or an explicit stop phrase
    fn is_stop(&self, normalized: &str) -> bool {
        let command = normalized
            .trim_end_matches('?')
            .trim()
            .trim_start_matches("please ")
            .trim_end_matches(" please");
        self.config.stop_commands.iter().any(|c| c == command)
            || contains_any(normalized, &self.config.stop_phrases)
    }

    /// Extract the signals that can be read off the text directly
    pub fn extract_signals(&self, raw: &str) -> ProfileUpdate {
        let text = normalize(raw);

        let mut subjects: Vec<String> = Vec::new();
        for (keyword, subject) in &self.config.subjects {
            if contains_phrase(&text, keyword) && !subjects.contains(subject) {
                subjects.push(subject.clone());
            }
        }

        let has_teaching_experience = if contains_any(&text, &self.config.no_experience_phrases) {
            Some(false)
        } else if contains_any(&text, &self.config.experience_phrases) {
            Some(true)
        } else {
            None
        };

        let children_age_comfort = self
            .config
            .age_groups
            .iter()
            .find(|(keyword, _)| contains_phrase(&text, keyword))
            .map(|(_, age)| *age);

        let availability = contains_any(&text, &self.config.availability_words)
            .then(|| raw.trim().to_string());

        ProfileUpdate {
            subjects,
            has_teaching_experience,
            children_age_comfort,
            availability,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Classifier for RuleBasedClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
    ) -> Result<Classification, ClassifierError> {
        let intent = self.infer_intent(request.message);
        let confidence = self.compute_confidence(request.message);
        let signals = self.extract_signals(request.message);

        let reply = match intent {
            Intent::Stop => "No problem at all. Thank you for your time.".to_string(),
            Intent::Query => format!("{} {}", QUERY_ACKNOWLEDGEMENT, request.spec.opening_prompt),
            Intent::Ambiguous => format!("{} {}", CLARIFY_ACKNOWLEDGEMENT, request.spec.opening_prompt),
            _ => {
                let negative = intent == Intent::Negate || signals.has_teaching_experience == Some(false);
                format!(
                    "{} {}",
                    pick_acknowledgement(negative, request.history.len()),
                    request.spec.opening_prompt
                )
            }
        };

        Ok(Classification {
            intent,
            confidence,
            reply,
            signals,
            source: ClassificationSource::RuleBased,
        })
    }
}

/// Lowercase, unify apostrophes, and pad words with single spaces so phrase
/// matching works on word boundaries.
fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' || c == '?' { c } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .map(|w| w.trim_end_matches('?'))
        .filter(|w| !w.is_empty())
        .collect();

    let mut normalized = format!(" {} ", words.join(" "));
    if cleaned.contains('?') {
        normalized.push('?');
    }
    normalized
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {} ", phrase))
}

fn contains_any(normalized: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| contains_phrase(normalized, p))
}

fn starts_with_any(normalized: &str, phrases: &[String]) -> bool {
    phrases
        .iter()
        .any(|p| normalized.starts_with(&format!(" {} ", p)))
}
