//! Task registry: the external owner of tasks.
//!
//! The board only references tasks by id. Handlers read tasks, patch them,
//! and flip their "live" flag (whether a card for the task is on the board).

use std::collections::BTreeMap;

use chrono::{Days, Months, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::error::{BoardError, Result};
use crate::core::kind::DefId;

/// Recurrence step type. Unknown types behave like `Daily`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    #[default]
    Daily,
    Weekly,
    Monthly,
    #[serde(other)]
    Other,
}

fn one() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub kind: RecurrenceKind,
    #[serde(default = "one")]
    pub interval: u32,
}

impl Recurrence {
    #[must_use]
    pub fn daily(interval: u32) -> Self {
        Self { kind: RecurrenceKind::Daily, interval }
    }

    #[must_use]
    pub fn weekly(interval: u32) -> Self {
        Self { kind: RecurrenceKind::Weekly, interval }
    }

    #[must_use]
    pub fn monthly(interval: u32) -> Self {
        Self { kind: RecurrenceKind::Monthly, interval }
    }

    /// One recurrence step after `from`.
    #[must_use]
    pub fn step(&self, from: NaiveDate) -> NaiveDate {
        let n = self.interval.max(1);
        let next = match self.kind {
            RecurrenceKind::Weekly => from.checked_add_days(Days::new(7 * u64::from(n))),
            RecurrenceKind::Monthly => from.checked_add_months(Months::new(n)),
            RecurrenceKind::Daily | RecurrenceKind::Other => from.checked_add_days(Days::new(u64::from(n))),
        };
        next.unwrap_or(from)
    }

    /// First occurrence strictly after `due` that falls on or after `tick`.
    #[must_use]
    pub fn next_on_or_after(&self, due: NaiveDate, tick: NaiveDate) -> NaiveDate {
        let mut next = self.step(due);
        while next < tick {
            let stepped = self.step(next);
            if stepped <= next {
                break;
            }
            next = stepped;
        }
        next
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// A task as the registry stores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub assigned_villager: Option<String>,
    /// Modifier definition ids attached to the task itself.
    #[serde(default)]
    pub modifiers: Vec<DefId>,
    #[serde(default)]
    pub next_action: bool,
    /// A card for this task is on the board.
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub worked_today: bool,
    #[serde(default)]
    pub project: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            done: false,
            due: None,
            recurrence: None,
            assigned_villager: None,
            modifiers: Vec::new(),
            next_action: false,
            live: false,
            priority: Priority::Normal,
            worked_today: false,
            project: None,
        }
    }

    #[must_use]
    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }

    #[must_use]
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, def_id: impl Into<DefId>) -> Self {
        self.modifiers.push(def_id.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn next_action(mut self) -> Self {
        self.next_action = true;
        self
    }

    #[must_use]
    pub fn completed(mut self) -> Self {
        self.done = true;
        self
    }
}

/// Partial update. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub done: Option<bool>,
    pub due: Option<Option<NaiveDate>>,
    pub assigned_villager: Option<Option<String>>,
    pub worked_today: Option<bool>,
    pub next_action: Option<bool>,
}

impl TaskPatch {
    #[must_use]
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_due(mut self, due: Option<NaiveDate>) -> Self {
        self.due = Some(due);
        self
    }

    #[must_use]
    pub fn with_worked_today(mut self, worked: bool) -> Self {
        self.worked_today = Some(worked);
        self
    }

    #[must_use]
    pub fn with_assigned_villager(mut self, villager: Option<String>) -> Self {
        self.assigned_villager = Some(villager);
        self
    }

    /// Apply onto a task.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(due) = self.due {
            task.due = due;
        }
        if let Some(villager) = &self.assigned_villager {
            task.assigned_villager.clone_from(villager);
        }
        if let Some(worked) = self.worked_today {
            task.worked_today = worked;
        }
        if let Some(next) = self.next_action {
            task.next_action = next;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Done,
}

/// Filter for [`TaskRegistry::list`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub live: Option<bool>,
    pub project: Option<String>,
}

impl TaskFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: StatusFilter::Pending,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn done() -> Self {
        Self {
            status: StatusFilter::Done,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn live(mut self, live: bool) -> Self {
        self.live = Some(live);
        self
    }

    #[must_use]
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.done,
            StatusFilter::Done => task.done,
        };
        status_ok
            && self.live.map_or(true, |live| task.live == live)
            && self
                .project
                .as_ref()
                .map_or(true, |p| task.project.as_ref() == Some(p))
    }
}

/// Task store consumed by the board engine.
pub trait TaskRegistry: Send + Sync {
    fn get(&self, id: &str) -> Result<Task>;

    /// Apply a partial patch and return the updated task.
    fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task>;

    fn set_live(&self, id: &str, live: bool) -> Result<()>;

    /// Tasks matching `filter`, ordered by id.
    fn list(&self, filter: &TaskFilter) -> Vec<Task>;
}

/// In-memory task registry.
#[derive(Debug, Default)]
pub struct MemoryTaskRegistry {
    tasks: RwLock<BTreeMap<String, Task>>,
}

impl MemoryTaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task.
    pub fn insert(&self, task: Task) {
        self.tasks.write().insert(task.id.clone(), task);
    }

    #[must_use]
    pub fn with_task(self, task: Task) -> Self {
        self.insert(task);
        self
    }
}

impl TaskRegistry for MemoryTaskRegistry {
    fn get(&self, id: &str) -> Result<Task> {
        self.tasks
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| BoardError::not_found("task", id))
    }

    fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| BoardError::not_found("task", id))?;
        patch.apply(task);
        Ok(task.clone())
    }

    fn set_live(&self, id: &str, live: bool) -> Result<()> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| BoardError::not_found("task", id))?;
        task.live = live;
        Ok(())
    }

    fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks
            .read()
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_recurrence_steps() {
        let start = date(2024, 1, 31);
        assert_eq!(Recurrence::daily(2).step(start), date(2024, 2, 2));
        assert_eq!(Recurrence::weekly(1).step(start), date(2024, 2, 7));
        assert_eq!(Recurrence::monthly(1).step(start), date(2024, 2, 29));
        let other = Recurrence { kind: RecurrenceKind::Other, interval: 3 };
        assert_eq!(other.step(start), date(2024, 2, 3));
    }

    #[test]
    fn test_next_on_or_after() {
        let weekly = Recurrence::weekly(1);
        let today = date(2024, 3, 10);

        assert_eq!(weekly.next_on_or_after(today, today), date(2024, 3, 17));
        assert_eq!(weekly.next_on_or_after(date(2024, 2, 20), today), date(2024, 3, 12));
    }

    #[test]
    fn test_unknown_recurrence_kind_parses() {
        let r: Recurrence = serde_json::from_str(r#"{ "kind": "fortnightly" }"#).unwrap();
        assert_eq!(r.kind, RecurrenceKind::Other);
        assert_eq!(r.interval, 1);
    }

    #[test]
    fn test_registry_update_and_live() {
        let registry = MemoryTaskRegistry::new().with_task(Task::new("t1", "Dishes"));

        registry.set_live("t1", true).unwrap();
        let task = registry.update("t1", &TaskPatch::done(true)).unwrap();
        assert!(task.done);
        assert!(task.live);

        assert!(matches!(registry.get("nope"), Err(BoardError::NotFound { .. })));
        assert!(registry.set_live("nope", true).is_err());
    }

    #[test]
    fn test_filters() {
        let registry = MemoryTaskRegistry::new()
            .with_task(Task::new("a", "A").with_project("home"))
            .with_task(Task::new("b", "B").completed())
            .with_task(Task::new("c", "C").with_project("work"));
        registry.set_live("c", true).unwrap();

        assert_eq!(registry.list(&TaskFilter::all()).len(), 3);
        assert_eq!(registry.list(&TaskFilter::pending()).len(), 2);
        assert_eq!(registry.list(&TaskFilter::done()).len(), 1);
        assert_eq!(registry.list(&TaskFilter::pending().live(true))[0].id, "c");
        assert_eq!(registry.list(&TaskFilter::all().in_project("home"))[0].id, "a");
    }
}
