//! Time-of-day salutations used in handler replies.

/// Salutation for a local hour (0-23), without trailing punctuation.
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good Morning",
        12..=16 => "Good Afternoon",
        _ => "Good Evening",
    }
}
