/// Canonical status values, in column/display order.
pub const STATUSES: [&str; 3] = ["Pending", "In progress", "Done"];

/// Canonical difficulty values, in rank order.
pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

/// Visible tasks allowed before `add` is refused. Deleted tasks do not
/// count against the cap.
pub const VISIBLE_CAP: usize = 10;

pub const DATA_FILE: &str = "tasks.json";

/// Case-insensitive membership test returning the canonical spelling, or
/// `None` when the input is not in the allowed set. The store itself does
/// not validate, so every user-supplied status or difficulty goes through
/// here before it reaches the store.
pub fn canonicalize<'a>(input: &str, allowed: &[&'a str]) -> Option<&'a str> {
    let lowered = input.trim().to_lowercase();
    allowed.iter().copied().find(|v| v.to_lowercase() == lowered)
}
