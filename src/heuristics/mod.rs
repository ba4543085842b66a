pub mod acknowledgements;
pub mod lexical;

pub use acknowledgements::*;
pub use lexical::*;

use crate::models::AgeComfort;

/// Lexical cue tables for the rule-based classifier.
///
/// Single words are matched on word boundaries; multi-word entries match as
/// whole phrases.
#[derive(Debug, Clone)]
pub struct HeuristicsConfig {
    /// Words that stop the chat only when they are the whole message
    pub stop_commands: Vec<String>,
    /// Phrases that stop the chat anywhere in a message
    pub stop_phrases: Vec<String>,
    /// Positive idioms built from negation words ("no problem")
    pub affirm_idioms: Vec<String>,
    /// Clear yes / confirmation
    pub affirm_words: Vec<String>,
    /// Clear no / rejection
    pub negate_words: Vec<String>,
    /// Question openers (a '?' anywhere also counts)
    pub question_openers: Vec<String>,
    /// Background / experience vocabulary
    pub background_words: Vec<String>,
    /// Cues that make an answer concrete
    pub detail_words: Vec<String>,
    /// Subject keyword -> canonical subject
    pub subjects: Vec<(String, String)>,
    /// Age keyword -> age group
    pub age_groups: Vec<(String, AgeComfort)>,
    /// Phrases stating no teaching experience
    pub no_experience_phrases: Vec<String>,
    /// Phrases stating teaching experience
    pub experience_phrases: Vec<String>,
    /// Days and times of day; a message naming one states availability
    pub availability_words: Vec<String>,
    /// Upper bound on rule-based confidence
    pub max_confidence: f64,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            stop_commands: words(&["stop", "exit", "quit", "cancel", "bye", "end"]),
            stop_phrases: words(&[
                "please stop", "stop messaging", "stop this", "stop the chat", "i want to stop",
                "i want to quit", "i want to exit", "unsubscribe", "leave me alone",
                "not interested", "end the chat", "don't contact me", "do not contact me",
            ]),
            affirm_idioms: words(&["no problem", "no worries", "not a problem", "why not", "of course"]),
            affirm_words: words(&[
                "yes", "yeah", "yep", "sure", "ok", "okay", "fine", "i do", "i am",
                "absolutely", "definitely", "i can", "i will",
            ]),
            negate_words: words(&[
                "no", "nope", "not", "never", "not really", "can't", "cannot", "won't", "don't",
                "do not", "not possible", "unable",
            ]),
            question_openers: words(&[
                "how", "what", "when", "where", "why", "can you", "is it", "do i", "will i",
            ]),
            background_words: words(&[
                "teacher", "teaching", "student", "engineer", "working", "work", "experience",
                "background", "volunteer", "profession", "mentor", "worked", "homemaker",
                "housewife", "studying", "college", "job",
            ]),
            detail_words: words(&["years", "hours", "week", "weekend", "experience", "background"]),
            subjects: [
                ("math", "math"),
                ("maths", "math"),
                ("mathematics", "math"),
                ("science", "science"),
                ("physics", "physics"),
                ("chemistry", "chemistry"),
                ("biology", "biology"),
                ("english", "english"),
                ("hindi", "hindi"),
                ("kannada", "kannada"),
                ("tamil", "tamil"),
                ("telugu", "telugu"),
                ("marathi", "marathi"),
                ("social studies", "social studies"),
                ("history", "history"),
                ("geography", "geography"),
                ("computers", "computers"),
                ("computer", "computers"),
                ("art", "art"),
                ("music", "music"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            age_groups: vec![
                ("primary".to_string(), AgeComfort::Primary),
                ("young children".to_string(), AgeComfort::Primary),
                ("small kids".to_string(), AgeComfort::Primary),
                ("middle school".to_string(), AgeComfort::Middle),
                ("secondary".to_string(), AgeComfort::Secondary),
                ("high school".to_string(), AgeComfort::Secondary),
                ("teenagers".to_string(), AgeComfort::Secondary),
                ("any age".to_string(), AgeComfort::Unsure),
            ],
            no_experience_phrases: words(&[
                "no experience",
                "never taught",
                "not taught",
                "haven't taught",
                "no teaching",
            ]),
            experience_phrases: words(&[
                "i taught", "i teach", "have taught", "tutored", "tutoring", "mentored",
                "i was a teacher", "i am a teacher",
            ]),
            availability_words: words(&[
                "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
                "mondays", "tuesdays", "wednesdays", "thursdays", "fridays", "saturdays",
                "sundays", "weekend", "weekends", "weekday", "weekdays", "morning", "mornings",
                "afternoon", "afternoons", "evening", "evenings",
            ]),
            max_confidence: 0.6,
        }
    }
}
