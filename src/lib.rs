pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod stages;

pub use error::{ClassifierError, ConfigError, PersistenceError};
pub use heuristics::{HeuristicsConfig, RuleBasedClassifier};
pub use io::{load_phase_table, parse_phase_table, FileSink, HumanTranscript, NullSink, RecordSink, SessionRecord};
pub use llm::{
    AnthropicClient, AnthropicConfig, Classifier, ClassificationRequest, FallbackClassifier,
    LanguageModel, ModelBackedClassifier,
};
pub use models::{
    Classification, ConversationState, Intent, Phase, PhaseScore, PhaseSpec, PhaseTable,
    Recommendation, SignalStore, Termination,
};
pub use stages::{
    decide, recommend, score_phase, Action, EnginePolicy, Interview, InterviewConfig, Reply,
};
