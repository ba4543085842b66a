/// Neutral acknowledgements used when the model is unavailable
pub const ACKNOWLEDGEMENTS: &[&str] = &[
    "Thank you for sharing that.",
    "That's lovely to hear.",
    "Got it, thank you!",
    "Wonderful, thanks for telling me.",
];

/// Reassuring acknowledgements for negative or limiting answers
pub const NEGATIVE_ACKNOWLEDGEMENTS: &[&str] = &[
    "That's completely okay.",
    "Thanks for sharing honestly.",
    "No worries at all.",
    "Appreciate your honesty.",
];

pub const QUERY_ACKNOWLEDGEMENT: &str =
    "That's a good question. Our team will make sure you get a clear answer during orientation.";

pub const CLARIFY_ACKNOWLEDGEMENT: &str = "Sorry, I didn't quite catch that.";

/// Pick an acknowledgement deterministically, rotating with the conversation
/// length so consecutive turns do not repeat the same line.
pub fn pick_acknowledgement(negative: bool, seed: usize) -> &'static str {
    let pool = if negative {
        NEGATIVE_ACKNOWLEDGEMENTS
    } else {
        ACKNOWLEDGEMENTS
    };
    pool[seed % pool.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation() {
        assert_ne!(pick_acknowledgement(false, 0), pick_acknowledgement(false, 1));
        assert_eq!(pick_acknowledgement(true, 0), pick_acknowledgement(true, 4));
        assert!(NEGATIVE_ACKNOWLEDGEMENTS.contains(&pick_acknowledgement(true, 7)));
    }
}
