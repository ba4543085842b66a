use crate::models::{ChatMessage, Intent, PhaseSpec, SignalStore, Turn};

use super::ToolSpec;

pub const CLASSIFICATION_TOOL: &str = "submit_classification";
pub const SCORING_TOOL: &str = "submit_phase_score";

/// System prompt for the interviewer (non-negotiable tone and boundaries)
pub const SYSTEM_PROMPT: &str = r#"You are SIA (Shiksha Mitra), a warm, respectful volunteer-screening guide for SERVE, a remote education programme.

You MUST follow these rules:

1. Ask only ONE question at a time. Keep replies short (1-3 lines), in warm, simple Indian English.
2. Never mention onboarding, evaluation, selection, phases, states or internal processes.
3. Never judge; beginners are welcome. Be reassuring when someone has no experience.
4. Do NOT ask personal questions (phone number, email, family, marital status, health, finances).
5. Do NOT invent or infer facts the volunteer has not stated.

For every volunteer message you classify the reply, extract signals, and write the next message using the submit_classification tool.

INTENT RULES:
- Use exactly one label from the allowed list for the current phase.
- STOP: the volunteer wants to stop, leave or unsubscribe.
- QUERY: they ask a question instead of answering. Answer briefly and return to the current question.
- AMBIGUOUS: vague, off-topic or unclear.
- AFFIRM / NEGATE / INFO: a plain yes, a plain no, or background details that fit no specific label.

SIGNAL RULES (extract ONLY what is explicitly stated, otherwise null or an empty list):
- motivation: short phrase (help, give back, serve, bring joy, uplift, outreach) or null
- has_teaching_experience: true / false / null
- teaching_interest: "yes" / "no" / "maybe" / null
- subjects: lowercase subjects explicitly mentioned, or []
- children_age_comfort: "primary" (ages 5-10), "middle" (11-14), "secondary" (15-18), "unsure", or null
- name: the name they gave, or null
- languages: languages they say they speak, or []
- availability: short phrase of days/times they can give, or null
- concerns: short phrase of any worry or doubt they raise, or null

CONFIDENCE: 0.0-1.0, how clearly the message maps to the chosen label."#;

/// System prompt for the coordinator summary
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a coordinator summarizer for a volunteer screening programme. \
Write plain text only, 3-5 short lines: one-line volunteer background, availability, motivation, \
and a final line with a recommendation label (Recommend / Hold / Not Recommended) and a one-line reason.";

/// System prompt for the per-phase evaluator
pub const SCORING_SYSTEM_PROMPT: &str = "You are an evaluator for a volunteer screening programme. \
Rate only the volunteer's replies in the given conversation section against the rubric, \
on a scale of 1 (poor) to 5 (excellent). Do not reward length; beginners can score well. \
Submit the result with the submit_phase_score tool.";

/// Build the user prompt for one classification turn
pub fn build_turn_prompt(
    spec: &PhaseSpec,
    history: &[ChatMessage],
    message: &str,
    profile: &SignalStore,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Current phase: {}\n", spec.name));
    prompt.push_str(&format!("{}\n\n", spec.guidance));

    let labels = allowed_labels(spec);
    prompt.push_str("## Allowed intents\n");
    prompt.push_str(&labels.join(", "));
    prompt.push_str("\n\n");

    prompt.push_str("## Known volunteer details\n");
    prompt.push_str(&serde_json::to_string(profile).unwrap_or_else(|_| "{}".to_string()));
    prompt.push_str("\n\n");

    if !history.is_empty() {
        prompt.push_str("## Recent conversation\n");
        prompt.push_str(&format_history(history));
        prompt.push('\n');
    }

    prompt.push_str("## Latest volunteer message\n");
    prompt.push_str(message.trim());
    prompt.push_str("\n\n");

    prompt.push_str("## Instructions\n");
    prompt.push_str("Classify the latest message and submit it with the submit_classification tool.\n");
    prompt.push_str("In reply, acknowledge warmly and ask the next question for this phase.\n");

    prompt
}

/// Build the user prompt for the coordinator summary
pub fn build_summary_prompt(history: &[ChatMessage], profile: &SignalStore) -> String {
    let mut prompt = String::new();

    prompt.push_str("## Extracted profile\n");
    prompt.push_str(&serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string()));
    prompt.push_str("\n\n## Conversation\n");
    prompt.push_str(&format_history(history));

    prompt
}

/// Build the evaluator prompt for the turns of one phase
pub fn build_scoring_prompt(spec: &PhaseSpec, turns: &[Turn]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("# Phase: {}\n", spec.name));
    prompt.push_str(&format!("Rubric: {}\n\n", spec.rubric));
    prompt.push_str("## Conversation section\n");
    for turn in turns {
        prompt.push_str(&format!("Volunteer: {}\n", turn.text));
        prompt.push_str(&format!("Assistant: {}\n", turn.reply));
    }

    prompt
}

fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                crate::models::Role::Assistant => "Assistant",
                crate::models::Role::User => "Volunteer",
            };
            format!("{}: {}\n", speaker, m.content)
        })
        .collect()
}

/// Phase labels followed by the labels valid everywhere
fn allowed_labels(spec: &PhaseSpec) -> Vec<String> {
    spec.allowed_intents
        .iter()
        .chain(&[
            Intent::Affirm,
            Intent::Negate,
            Intent::Info,
            Intent::Query,
            Intent::Ambiguous,
            Intent::Stop,
        ])
        .map(|i| i.label())
        .collect()
}

/// Tool definition for structured classification output
pub fn classification_tool(spec: &PhaseSpec) -> ToolSpec {
    let labels = allowed_labels(spec);

    ToolSpec {
        name: CLASSIFICATION_TOOL.to_string(),
        description: "Submit the intent classification, extracted signals and the reply for the volunteer"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "intent": {"type": "string", "enum": labels},
                "confidence": {"type": "number", "minimum": 0, "maximum": 1},
                "tone_reply": {
                    "type": "string",
                    "description": "Short warm acknowledgement plus the next question"
                },
                "signals": {
                    "type": "object",
                    "properties": {
                        "motivation": {"type": ["string", "null"]},
                        "has_teaching_experience": {"type": ["boolean", "null"]},
                        "teaching_interest": {"type": ["string", "null"], "enum": ["yes", "no", "maybe", null]},
                        "subjects": {"type": "array", "items": {"type": "string"}},
                        "children_age_comfort": {
                            "type": ["string", "null"],
                            "enum": ["primary", "middle", "secondary", "unsure", null]
                        },
                        "name": {"type": ["string", "null"]},
                        "languages": {"type": "array", "items": {"type": "string"}},
                        "availability": {"type": ["string", "null"]},
                        "concerns": {"type": ["string", "null"]}
                    }
                }
            },
            "required": ["intent", "confidence", "tone_reply"]
        }),
    }
}

/// Tool definition for the per-phase score
pub fn scoring_tool() -> ToolSpec {
    ToolSpec {
        name: SCORING_TOOL.to_string(),
        description: "Submit the rubric score for this conversation section".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "score": {"type": "number", "minimum": 1, "maximum": 5},
                "notes": {"type": "string", "description": "One-sentence explanation"}
            },
            "required": ["score", "notes"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Phase, PhaseTable};

    #[test]
    fn test_turn_prompt_contains_phase_context() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Background).unwrap();
        let history = vec![
            ChatMessage::assistant("What brought you here?"),
            ChatMessage::user("I want to give back"),
        ];

        let prompt = build_turn_prompt(spec, &history, "I taught maths", &SignalStore::new());

        assert!(prompt.contains("Getting to Know You"));
        assert!(prompt.contains("MOTIVATION_SHARED"));
        assert!(prompt.contains("STOP"));
        assert!(prompt.contains("Volunteer: I want to give back"));
        assert!(prompt.ends_with("for this phase.\n"));
    }

    #[test]
    fn test_scoring_prompt_has_rubric_and_turns() {
        let table = PhaseTable::default();
        let spec = table.lookup(Phase::Commitment).unwrap();
        let turn = Turn {
            index: 3,
            phase: Phase::Commitment,
            turn_in_phase: 0,
            text: "Saturdays work for me".to_string(),
            intent: Intent::TimeYes,
            confidence: 0.9,
            reply: "Lovely! How will you keep sessions regular?".to_string(),
            signals: Default::default(),
            source: crate::models::ClassificationSource::Model,
            timestamp: chrono::Utc::now(),
        };

        let prompt = build_scoring_prompt(spec, &[turn]);

        assert!(prompt.contains("Rubric: Rate availability consistency"));
        assert!(prompt.contains("Volunteer: Saturdays work for me"));
    }

    #[test]
    fn test_tool_enum_restricted_to_phase() {
        let table = PhaseTable::default();
        let tool = classification_tool(table.lookup(Phase::Commitment).unwrap());
        let labels = tool.input_schema["properties"]["intent"]["enum"]
            .as_array()
            .unwrap();

        assert!(labels.iter().any(|l| l == "TIME_MAYBE"));
        assert!(labels.iter().any(|l| l == "QUERY"));
        assert!(!labels.iter().any(|l| l == "MOTIVATION_SHARED"));

        let signals = &tool.input_schema["properties"]["signals"]["properties"];
        assert!(signals["availability"].is_object());
        assert!(signals["languages"].is_object());
    }
}
