use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{build_turn_prompt, classification_tool, normalize_classification, LanguageModel, SYSTEM_PROMPT};
use crate::error::ClassifierError;
use crate::models::{ChatMessage, Classification, PhaseSpec, SignalStore};

/// Everything a classifier sees for one volunteer message
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRequest<'a> {
    pub spec: &'a PhaseSpec,
    /// Bounded window of recent messages, oldest first
    pub history: &'a [ChatMessage],
    pub message: &'a str,
    pub profile: &'a SignalStore,
}

/// Produces a normalized classification for one turn
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
    ) -> Result<Classification, ClassifierError>;
}

/// Classifier backed by a hosted language model with structured output
pub struct ModelBackedClassifier<M> {
    model: M,
}

impl<M: LanguageModel> ModelBackedClassifier<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: LanguageModel> Classifier for ModelBackedClassifier<M> {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
    ) -> Result<Classification, ClassifierError> {
        let prompt = build_turn_prompt(request.spec, request.history, request.message, request.profile);
        let tool = classification_tool(request.spec);

        let raw = self
            .model
            .send_with_tool(SYSTEM_PROMPT, &prompt, &tool)
            .await
            .map_err(|e| ClassifierError::Unavailable(format!("{:#}", e)))?
            .ok_or_else(|| ClassifierError::Malformed("no tool_use response found".to_string()))?;

        debug!("Raw classification: {}", raw);
        normalize_classification(request.spec, &raw)
    }
}

/// Runs a primary classifier under a timeout and degrades to a fallback
/// classifier on any failure, so a turn is always classified.
pub struct FallbackClassifier<P, F> {
    primary: P,
    fallback: F,
    timeout: Duration,
}

impl<P: Classifier, F: Classifier> FallbackClassifier<P, F> {
    pub fn new(primary: P, fallback: F, timeout: Duration) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }
}

#[async_trait]
impl<P: Classifier, F: Classifier> Classifier for FallbackClassifier<P, F> {
    async fn classify(
        &self,
        request: &ClassificationRequest<'_>,
    ) -> Result<Classification, ClassifierError> {
        let primary = tokio::time::timeout(self.timeout, self.primary.classify(request))
            .await
            .unwrap_or_else(|_| {
                Err(ClassifierError::Unavailable(format!(
                    "timed out after {:?}",
                    self.timeout
                )))
            });

        match primary {
            Ok(classification) => Ok(classification),
            Err(e) => {
                warn!("Phase {:?}: {}; using rule-based fallback", request.spec.phase, e);
                self.fallback.classify(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::RuleBasedClassifier;
    use crate::llm::ToolSpec;
    use crate::models::{ClassificationSource, Intent, Phase, PhaseTable};
    use anyhow::Result;

    enum Behaviour {
        Answer(serde_json::Value),
        NoTool,
        Fail,
        Hang,
    }

    struct ScriptedModel(Behaviour);

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn send_message(&self, _system: &str, _user: &str) -> Result<String> {
            anyhow::bail!("not used")
        }

        async fn send_with_tool(
            &self,
            _system: &str,
            _user: &str,
            _tool: &ToolSpec,
        ) -> Result<Option<serde_json::Value>> {
            match &self.0 {
                Behaviour::Answer(v) => Ok(Some(v.clone())),
                Behaviour::NoTool => Ok(None),
                Behaviour::Fail => anyhow::bail!("connection refused"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(None)
                }
            }
        }
    }

    async fn classify_with(behaviour: Behaviour, message: &str) -> Classification {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Background).unwrap();
        let profile = SignalStore::new();
        let request = ClassificationRequest {
            spec,
            history: &[],
            message,
            profile: &profile,
        };

        let classifier = FallbackClassifier::new(
            ModelBackedClassifier::new(ScriptedModel(behaviour)),
            RuleBasedClassifier::default(),
            Duration::from_millis(50),
        );
        classifier.classify(&request).await.unwrap()
    }

    #[tokio::test]
    async fn test_model_answer_is_used() {
        let raw = serde_json::json!({
            "intent": "MOTIVATION_SHARED",
            "confidence": 0.8,
            "tone_reply": "That's wonderful!",
            "signals": {"motivation": "help"}
        });
        let classification = classify_with(Behaviour::Answer(raw), "I want to help").await;

        assert_eq!(classification.intent, Intent::MotivationShared);
        assert_eq!(classification.source, ClassificationSource::Model);
        assert_eq!(classification.signals.motivation.as_deref(), Some("help"));
    }

    #[tokio::test]
    async fn test_unavailable_model_falls_back() {
        let classification = classify_with(Behaviour::Fail, "please stop").await;

        assert_eq!(classification.intent, Intent::Stop);
        assert_eq!(classification.source, ClassificationSource::RuleBased);
        assert!(classification.confidence <= 0.6);
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let raw = serde_json::json!({"intent": "DANCING", "confidence": 0.9, "tone_reply": "hi"});
        let classification = classify_with(Behaviour::Answer(raw), "yes sure").await;

        assert_eq!(classification.source, ClassificationSource::RuleBased);
        assert_eq!(classification.intent, Intent::Affirm);
    }

    #[tokio::test]
    async fn test_missing_tool_call_falls_back() {
        let classification = classify_with(Behaviour::NoTool, "what time are classes?").await;

        assert_eq!(classification.intent, Intent::Query);
        assert_eq!(classification.source, ClassificationSource::RuleBased);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let classification = classify_with(Behaviour::Hang, "hmm").await;

        assert_eq!(classification.source, ClassificationSource::RuleBased);
        assert!(classification.confidence <= 0.6);
    }
}
