use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Stated interest in teaching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeachingInterest {
    Yes,
    No,
    Maybe,
}

/// Age group of children the volunteer is comfortable with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeComfort {
    /// Ages ~5-10
    Primary,
    /// Ages ~11-14
    Middle,
    /// Ages ~15-18
    Secondary,
    /// Uncertain or uncomfortable
    Unsure,
}

/// Signals extracted from a single turn. Absent fields mean "not mentioned".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_teaching_experience: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teaching_interest: Option<TeachingInterest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_age_comfort: Option<AgeComfort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concerns: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}

/// Volunteer profile accumulated across turns.
///
/// Every field is first-write-wins: once a value is recorded, later turns
/// cannot overwrite it. `subjects` and `languages` accumulate deduplicated
/// sets and `concerns` collects each distinct concern raised.
///
/// Only the first five fields count toward completeness; the key details
/// after them are kept for the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalStore {
    pub motivation: Option<String>,
    pub has_teaching_experience: Option<bool>,
    pub teaching_interest: Option<TeachingInterest>,
    pub subjects: BTreeSet<String>,
    pub children_age_comfort: Option<AgeComfort>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub languages: BTreeSet<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

impl SignalStore {
    /// Number of fields tracked for completeness
    pub const TRACKED_FIELDS: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update, returning the names of fields that changed
    pub fn merge(&mut self, update: &ProfileUpdate) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if fill_text(&mut self.motivation, update.motivation.as_deref()) {
            changed.push("motivation");
        }

        if self.has_teaching_experience.is_none() && update.has_teaching_experience.is_some() {
            self.has_teaching_experience = update.has_teaching_experience;
            changed.push("has_teaching_experience");
        }

        if self.teaching_interest.is_none() && update.teaching_interest.is_some() {
            self.teaching_interest = update.teaching_interest;
            changed.push("teaching_interest");
        }

        if extend_lowercase(&mut self.subjects, &update.subjects) {
            changed.push("subjects");
        }

        if self.children_age_comfort.is_none() && update.children_age_comfort.is_some() {
            self.children_age_comfort = update.children_age_comfort;
            changed.push("children_age_comfort");
        }

        if fill_text(&mut self.name, update.name.as_deref()) {
            changed.push("name");
        }

        if extend_lowercase(&mut self.languages, &update.languages) {
            changed.push("languages");
        }

        if fill_text(&mut self.availability, update.availability.as_deref()) {
            changed.push("availability");
        }

        if let Some(concern) = update.concerns.as_deref().map(str::trim) {
            if !concern.is_empty() && !self.concerns.iter().any(|c| c == concern) {
                self.concerns.push(concern.to_string());
                changed.push("concerns");
            }
        }

        changed
    }

    /// Count of non-empty tracked fields
    pub fn filled_count(&self) -> usize {
        [
            self.motivation.is_some(),
            self.has_teaching_experience.is_some(),
            self.teaching_interest.is_some(),
            !self.subjects.is_empty(),
            self.children_age_comfort.is_some(),
        ]
        .into_iter()
        .filter(|filled| *filled)
        .count()
    }

    pub fn is_sufficiently_complete(&self, required_count: usize) -> bool {
        self.filled_count() >= required_count
    }

    /// Read-only copy for persistence and reporting
    pub fn snapshot(&self) -> SignalStore {
        self.clone()
    }
}

/// Set an empty text field from a non-blank value
fn fill_text(field: &mut Option<String>, value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(value) if field.is_none() && !value.is_empty() => {
            *field = Some(value.to_string());
            true
        }
        _ => false,
    }
}

/// Union trimmed, lowercased values into a set; true if any were new
fn extend_lowercase(set: &mut BTreeSet<String>, values: &[String]) -> bool {
    let mut added = false;
    for value in values {
        let value = value.trim().to_lowercase();
        if !value.is_empty() && set.insert(value) {
            added = true;
        }
    }
    added
}
