use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{PhaseSpec, PhaseTable};

/// Load a deployment phase table from a JSON file (an array of phase specs)
pub fn load_phase_table(path: &Path) -> Result<PhaseTable> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_phase_table(&content)
}

/// Parse and validate a phase table from JSON
pub fn parse_phase_table(json: &str) -> Result<PhaseTable> {
    let specs: Vec<PhaseSpec> = serde_json::from_str(json).context("Failed to parse phase table JSON")?;
    PhaseTable::from_specs(specs).context("Phase table failed validation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;

    #[test]
    fn test_parse_round_trip_of_default_table() {
        let json = serde_json::to_string(PhaseTable::default().specs()).unwrap();
        let table = parse_phase_table(&json).unwrap();

        assert_eq!(table.lookup(Phase::Commitment).unwrap().max_turns, 5);
    }

    #[test]
    fn test_deployment_override() {
        let mut specs = PhaseTable::default().specs().to_vec();
        specs[1].max_turns = 12;
        specs.reverse();
        let json = serde_json::to_string(&specs).unwrap();

        let table = parse_phase_table(&json).unwrap();
        assert_eq!(table.lookup(Phase::Background).unwrap().max_turns, 12);
        assert_eq!(table.specs()[0].phase, Phase::Greeting);
    }

    #[test]
    fn test_rejects_unknown_phase_name() {
        let json = r#"[{"phase": "SMALL_TALK", "name": "x", "guidance": "x", "opening_prompt": "x",
                        "allowed_intents": [], "min_turns": 1, "max_turns": 2}]"#;

        assert!(parse_phase_table(json).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_phase_table(Path::new("/nonexistent/phases.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read file"));
    }
}
