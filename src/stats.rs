use crate::task::Task;
use crate::validate::{DIFFICULTIES, STATUSES};

/// Count and share of one seeded category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub percentage: String,
}

/// Snapshot over the visible tasks. Every canonical status and difficulty
/// appears, zero counts included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_visible: usize,
    pub by_status: Vec<CategoryCount>,
    pub by_difficulty: Vec<CategoryCount>,
}

/// Pure aggregation: callers pass `store.visible()` and the store is never
/// touched.
pub fn compute_statistics(visible: &[&Task]) -> Statistics {
    let total = visible.len();
    let mut by_status = seed(&STATUSES);
    let mut by_difficulty = seed(&DIFFICULTIES);

    for task in visible {
        // Normalized keys must match a seeded label exactly; anything else
        // stays out of the counts without an "other" bucket.
        let status_key = capitalize_first(&task.status);
        if let Some(entry) = by_status.iter_mut().find(|c| c.label == status_key) {
            entry.count += 1;
        }
        let difficulty_key = task.difficulty.to_lowercase();
        if let Some(entry) = by_difficulty.iter_mut().find(|c| c.label == difficulty_key) {
            entry.count += 1;
        }
    }

    for entry in by_status.iter_mut().chain(by_difficulty.iter_mut()) {
        entry.percentage = percentage(entry.count, total);
    }

    Statistics {
        total_visible: total,
        by_status,
        by_difficulty,
    }
}

fn seed(labels: &[&str]) -> Vec<CategoryCount> {
    labels
        .iter()
        .map(|label| CategoryCount {
            label: label.to_string(),
            count: 0,
            percentage: "0.00%".to_string(),
        })
        .collect()
}

/// First character uppercased, remainder untouched.
fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn percentage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", count as f64 / total as f64 * 100.0)
}
