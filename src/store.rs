use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::task::{Task, TaskPatch, TIMESTAMP_FORMAT};
use crate::validate::DIFFICULTIES;

/// Sort criteria accepted by [`TaskStore::sort_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    DueDate,
    CreatedDate,
    Difficulty,
}

/// Cycling order used by the presentation layer.
pub const SORT_KEYS: [SortKey; 4] = [
    SortKey::Title,
    SortKey::DueDate,
    SortKey::CreatedDate,
    SortKey::Difficulty,
];

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::DueDate => "due date",
            SortKey::CreatedDate => "creation date",
            SortKey::Difficulty => "difficulty",
        }
    }
}

/// What a date sort does with values that do not parse. The default keeps
/// the historical behavior: unparseable and empty dates compare as epoch 0,
/// so they land before every real date and are equal to each other.
/// `LastOnError` is the stricter alternative that pushes them to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePolicy {
    #[default]
    EarliestOnError,
    LastOnError,
}

/// Owns the full task collection, deleted records included. The store never
/// touches the filesystem or the clock; timestamps and "today" arrive as
/// parameters from the presentation layer.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Appends; the caller is responsible for having drawn a unique id from
    /// [`TaskStore::next_id`].
    pub fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// `1 + max(id)` over the whole collection, deleted tasks included, so
    /// ids are never reused after a soft delete.
    pub fn next_id(&self) -> u32 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Returns `true` only when a live task transitioned to deleted.
    /// Unknown ids and already-deleted tasks both come back `false`;
    /// callers that need to tell them apart query [`TaskStore::find_by_id`]
    /// first.
    pub fn soft_delete(&mut self, id: u32) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) if !task.is_deleted() => {
                task.soft_delete();
                true
            }
            _ => false,
        }
    }

    /// Applies the sparse patch; `false` for unknown ids. Enumerated values
    /// are not validated here.
    pub fn edit(&mut self, id: u32, patch: &TaskPatch, edited_at: &str) -> bool {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.apply(patch, edited_at);
            true
        } else {
            false
        }
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Non-deleted tasks in insertion order.
    pub fn visible(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| !t.is_deleted()).collect()
    }

    /// The entire backing collection, for persistence only.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter_by_status(&self, status: &str) -> Vec<&Task> {
        let wanted = status.to_lowercase();
        self.visible()
            .into_iter()
            .filter(|t| t.status.to_lowercase() == wanted)
            .collect()
    }

    pub fn sort_by(&self, key: SortKey) -> Vec<&Task> {
        self.sort_by_with_policy(key, DatePolicy::default())
    }

    /// Stable ascending sort over the visible tasks. This is a view: the
    /// store's internal order is untouched.
    pub fn sort_by_with_policy(&self, key: SortKey, policy: DatePolicy) -> Vec<&Task> {
        let mut view = self.visible();
        match key {
            SortKey::Title => view.sort_by_key(|t| t.title.to_lowercase()),
            SortKey::DueDate => view.sort_by_key(|t| date_rank(&t.due_date, policy)),
            SortKey::CreatedDate => view.sort_by_key(|t| date_rank(&t.created_at, policy)),
            SortKey::Difficulty => view.sort_by_key(|t| difficulty_rank(&t.difficulty)),
        }
        view
    }

    /// Visible tasks whose due date, truncated to midnight, is strictly
    /// before `today`. Tasks without a parseable due date never show up.
    pub fn overdue(&self, today: NaiveDate) -> Vec<&Task> {
        self.visible()
            .into_iter()
            .filter(|t| matches!(parse_day(&t.due_date), Some(due) if due < today))
            .collect()
    }

    /// Visible tasks, other than the reference, whose title or description
    /// contains the reference task's title (case-insensitively). Empty when
    /// the reference id is unknown or deleted.
    pub fn related_to(&self, id: u32) -> Vec<&Task> {
        let needle = match self.find_by_id(id) {
            Some(reference) if !reference.is_deleted() => reference.title.to_lowercase(),
            _ => return Vec::new(),
        };
        self.visible()
            .into_iter()
            .filter(|t| t.id != id)
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Free-text lookup across title, description and status.
    pub fn search(&self, term: &str) -> Vec<&Task> {
        let needle = term.to_lowercase();
        self.visible()
            .into_iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
                    || t.status.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

fn parse_epoch(value: &str) -> Option<i64> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

fn date_rank(value: &str, policy: DatePolicy) -> (u8, i64) {
    match (parse_epoch(value), policy) {
        (Some(epoch), _) => (0, epoch),
        (None, DatePolicy::EarliestOnError) => (0, 0),
        (None, DatePolicy::LastOnError) => (1, 0),
    }
}

/// easy(1) < medium(2) < hard(3); anything outside the set sorts last.
fn difficulty_rank(value: &str) -> u8 {
    let lowered = value.to_lowercase();
    DIFFICULTIES
        .iter()
        .position(|d| *d == lowered)
        .map_or(4, |i| i as u8 + 1)
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| dt.date())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u32, title: &str, status: &str, difficulty: &str, due: &str) -> Task {
        Task::new(
            id,
            title,
            format!("{title} description"),
            status,
            "2024-05-01 09:00:00",
            due,
            difficulty,
        )
    }

    fn ids(tasks: &[&Task]) -> Vec<u32> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn next_id_counts_up_from_an_empty_store() {
        let mut store = TaskStore::default();
        assert_eq!(store.next_id(), 1);
        for expected in 1..=4 {
            let id = store.next_id();
            assert_eq!(id, expected);
            store.add(task(id, "t", "Pending", "easy", ""));
        }
        assert_eq!(store.next_id(), 5);
    }

    #[test]
    fn deleted_ids_still_count_toward_next_id() {
        let mut store = TaskStore::default();
        store.add(task(1, "only", "Pending", "easy", ""));
        assert_eq!(store.next_id(), 2);
        assert!(store.soft_delete(1));
        let id = store.next_id();
        assert_eq!(id, 2);
        store.add(task(id, "second", "Pending", "easy", ""));
        assert_eq!(store.next_id(), 3);
    }

    #[test]
    fn soft_delete_hides_from_queries_but_not_from_all() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "easy", ""));
        store.add(task(2, "b", "Pending", "easy", ""));
        assert!(store.soft_delete(1));
        assert_eq!(ids(&store.visible()), vec![2]);
        assert_eq!(ids(&store.filter_by_status("pending")), vec![2]);
        assert_eq!(store.all().len(), 2);
        assert!(store.all()[0].is_deleted());
    }

    #[test]
    fn soft_delete_reports_false_the_second_time() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "easy", ""));
        assert!(store.soft_delete(1));
        assert!(!store.soft_delete(1));
        assert!(store.all()[0].is_deleted());
    }

    #[test]
    fn soft_delete_unknown_id_reports_false() {
        let mut store = TaskStore::default();
        assert!(!store.soft_delete(99));
    }

    #[test]
    fn edit_applies_patch_and_reports_unknown_ids() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "easy", ""));
        let patch = TaskPatch {
            title: Some("renamed".to_string()),
            ..Default::default()
        };
        assert!(store.edit(1, &patch, "2024-05-02 12:00:00"));
        assert!(!store.edit(99, &patch, "2024-05-02 12:00:00"));
        let edited = store.find_by_id(1).unwrap();
        assert_eq!(edited.title, "renamed");
        assert_eq!(edited.last_edited, "2024-05-02 12:00:00");
    }

    #[test]
    fn filter_by_status_is_case_insensitive_and_skips_deleted() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "easy", ""));
        store.add(task(2, "b", "Done", "easy", ""));
        store.add(task(3, "c", "Pending", "easy", ""));
        store.soft_delete(3);
        assert_eq!(ids(&store.filter_by_status("PENDING")), vec![1]);
        assert_eq!(ids(&store.filter_by_status("done")), vec![2]);
        assert!(store.filter_by_status("In progress").is_empty());
    }

    #[test]
    fn sort_by_difficulty_ranks_and_stays_stable() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "hard", ""));
        store.add(task(2, "b", "Pending", "easy", ""));
        store.add(task(3, "c", "Pending", "medium", ""));
        store.add(task(4, "d", "Pending", "easy", ""));
        // the two easy entries keep their original relative order
        assert_eq!(ids(&store.sort_by(SortKey::Difficulty)), vec![2, 4, 3, 1]);
    }

    #[test]
    fn unknown_difficulty_sorts_last() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "herculean", ""));
        store.add(task(2, "b", "Pending", "hard", ""));
        assert_eq!(ids(&store.sort_by(SortKey::Difficulty)), vec![2, 1]);
    }

    #[test]
    fn sort_by_title_ignores_case() {
        let mut store = TaskStore::default();
        store.add(task(1, "banana", "Pending", "easy", ""));
        store.add(task(2, "Apple", "Pending", "easy", ""));
        store.add(task(3, "cherry", "Pending", "easy", ""));
        assert_eq!(ids(&store.sort_by(SortKey::Title)), vec![2, 1, 3]);
    }

    #[test]
    fn unparseable_due_dates_sort_first_by_default() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "easy", ""));
        store.add(task(2, "b", "Pending", "easy", "2024-05-10"));
        store.add(task(3, "c", "Pending", "easy", "not a date"));
        store.add(task(4, "d", "Pending", "easy", "1999-01-01"));
        // empty and garbage act as epoch 0: before both real dates, equal
        // to each other, insertion order preserved between them
        assert_eq!(ids(&store.sort_by(SortKey::DueDate)), vec![1, 3, 4, 2]);
    }

    #[test]
    fn strict_policy_sorts_unparseable_dates_last() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "easy", ""));
        store.add(task(2, "b", "Pending", "easy", "2024-05-10"));
        store.add(task(3, "c", "Pending", "easy", "not a date"));
        store.add(task(4, "d", "Pending", "easy", "1999-01-01"));
        assert_eq!(
            ids(&store.sort_by_with_policy(SortKey::DueDate, DatePolicy::LastOnError)),
            vec![4, 2, 1, 3]
        );
    }

    #[test]
    fn sorting_never_reorders_the_store() {
        let mut store = TaskStore::default();
        store.add(task(1, "b", "Pending", "hard", ""));
        store.add(task(2, "a", "Pending", "easy", ""));
        let _ = store.sort_by(SortKey::Title);
        let _ = store.sort_by(SortKey::Difficulty);
        assert_eq!(ids(&store.visible()), vec![1, 2]);
    }

    #[test]
    fn sort_by_created_date_orders_ascending() {
        let mut store = TaskStore::default();
        let mut early = task(1, "a", "Pending", "easy", "");
        early.created_at = "2024-04-01 08:00:00".to_string();
        let mut late = task(2, "b", "Pending", "easy", "");
        late.created_at = "2024-06-01 08:00:00".to_string();
        store.add(late);
        store.add(early);
        assert_eq!(ids(&store.sort_by(SortKey::CreatedDate)), vec![1, 2]);
    }

    #[test]
    fn overdue_is_strictly_before_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let mut store = TaskStore::default();
        store.add(task(1, "late", "Pending", "easy", "2024-05-09"));
        store.add(task(2, "due today", "Pending", "easy", "2024-05-10"));
        store.add(task(3, "future", "Pending", "easy", "2024-05-11"));
        store.add(task(4, "no date", "Pending", "easy", ""));
        store.add(task(5, "garbage", "Pending", "easy", "soon"));
        store.add(task(6, "deleted late", "Pending", "easy", "2024-05-01"));
        store.soft_delete(6);
        assert_eq!(ids(&store.overdue(today)), vec![1]);
    }

    #[test]
    fn related_matches_title_or_description_excluding_self() {
        let mut store = TaskStore::default();
        store.add(Task::new(
            1,
            "report",
            "write it",
            "Pending",
            "2024-05-01 09:00:00",
            "",
            "easy",
        ));
        store.add(Task::new(
            2,
            "Quarterly Report",
            "numbers",
            "Pending",
            "2024-05-01 09:00:00",
            "",
            "easy",
        ));
        store.add(Task::new(
            3,
            "mail",
            "send the report out",
            "Pending",
            "2024-05-01 09:00:00",
            "",
            "easy",
        ));
        store.add(Task::new(
            4,
            "groceries",
            "milk and eggs",
            "Pending",
            "2024-05-01 09:00:00",
            "",
            "easy",
        ));
        store.add(Task::new(
            5,
            "old report",
            "archived",
            "Pending",
            "2024-05-01 09:00:00",
            "",
            "easy",
        ));
        store.soft_delete(5);
        assert_eq!(ids(&store.related_to(1)), vec![2, 3]);
    }

    #[test]
    fn related_to_unknown_or_deleted_reference_is_empty() {
        let mut store = TaskStore::default();
        store.add(task(1, "a", "Pending", "easy", ""));
        store.soft_delete(1);
        assert!(store.related_to(1).is_empty());
        assert!(store.related_to(42).is_empty());
    }

    #[test]
    fn search_spans_title_description_and_status() {
        let mut store = TaskStore::default();
        store.add(Task::new(
            1,
            "Groceries",
            "milk and eggs",
            "Pending",
            "2024-05-01 09:00:00",
            "",
            "easy",
        ));
        store.add(Task::new(
            2,
            "Taxes",
            "file the return",
            "Done",
            "2024-05-01 09:00:00",
            "",
            "hard",
        ));
        assert_eq!(ids(&store.search("MILK")), vec![1]);
        assert_eq!(ids(&store.search("done")), vec![2]);
        assert_eq!(ids(&store.search("e")), vec![1, 2]);
        assert!(store.search("nothing here").is_empty());
    }
}
