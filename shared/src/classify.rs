//! Derived groupings and metrics over a task collection.
//!
//! Nothing here reads the clock. Callers pass the reference timestamp, and
//! its time zone decides what "the same calendar day" means.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::task::{Category, Priority, Task};

#[derive(Debug, Default, PartialEq)]
pub struct CompletionPartition<'a> {
    pub completed: Vec<&'a Task>,
    pub pending: Vec<&'a Task>,
}

#[derive(Debug, Default, PartialEq)]
pub struct CategoryBuckets<'a> {
    pub new: Vec<&'a Task>,
    pub pending: Vec<&'a Task>,
    pub scheduled: Vec<&'a Task>,
    pub uncategorized: Vec<&'a Task>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub new: usize,
    pub pending: usize,
    pub scheduled: usize,
    pub uncategorized: usize,
}

impl CategoryBuckets<'_> {
    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            new: self.new.len(),
            pending: self.pending.len(),
            scheduled: self.scheduled.len(),
            uncategorized: self.uncategorized.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityHistogram {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityHistogram {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }
}

pub fn partition_by_completion(tasks: &[Task]) -> CompletionPartition<'_> {
    let (completed, pending): (Vec<&Task>, Vec<&Task>) = tasks.iter().partition(|t| t.completed);
    CompletionPartition { completed, pending }
}

pub fn partition_by_category(tasks: &[Task]) -> CategoryBuckets<'_> {
    let mut buckets = CategoryBuckets::default();
    for task in tasks {
        match task.category {
            Some(Category::New) => buckets.new.push(task),
            Some(Category::Pending) => buckets.pending.push(task),
            Some(Category::Scheduled) => buckets.scheduled.push(task),
            None => buckets.uncategorized.push(task),
        }
    }
    buckets
}

/// Tasks whose due date falls on the calendar day of `date`.
pub fn tasks_due_on<'a, Tz: TimeZone>(tasks: &'a [Task], date: &DateTime<Tz>) -> Vec<&'a Task> {
    tasks.iter().filter(|t| is_due_on(t, date)).collect()
}

fn is_due_on<Tz: TimeZone>(task: &Task, date: &DateTime<Tz>) -> bool {
    task.due_date
        .is_some_and(|due| due.with_timezone(&date.timezone()).date_naive() == date.date_naive())
}

pub fn is_today<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    match task.due_date {
        Some(_) => is_due_on(task, now),
        None => task.category == Some(Category::New),
    }
}

pub fn today<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    tasks.iter().filter(|t| is_today(t, now)).collect()
}

/// Open tasks due strictly after `now`.
pub fn upcoming<'a, Tz: TimeZone>(tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
    let now = now.with_timezone(&Utc);
    tasks
        .iter()
        .filter(|t| !t.completed && t.due_date.is_some_and(|due| due > now))
        .collect()
}

pub fn priority_histogram(tasks: &[Task]) -> PriorityHistogram {
    tasks
        .iter()
        .fold(PriorityHistogram::default(), |mut histogram, task| {
            match task.priority {
                Priority::Low => histogram.low += 1,
                Priority::Medium => histogram.medium += 1,
                Priority::High => histogram.high += 1,
            }
            histogram
        })
}

/// Share of completed tasks, rounded to the nearest whole percent.
pub fn progress_percentage(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count();
    (completed as f64 * 100.0 / tasks.len() as f64).round() as u8
}

/// Everything the dashboard and today views show about one user's tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOverview {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub progress: u8,
    pub today: usize,
    pub today_open: usize,
    pub upcoming: usize,
    pub categories: CategoryCounts,
    pub priorities: PriorityHistogram,
}

impl TaskOverview {
    pub fn compute<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Self {
        let partition = partition_by_completion(tasks);
        let due_today = today(tasks, now);
        Self {
            total: tasks.len(),
            completed: partition.completed.len(),
            pending: partition.pending.len(),
            progress: progress_percentage(tasks),
            today: due_today.len(),
            today_open: due_today.iter().filter(|t| !t.completed).count(),
            upcoming: upcoming(tasks, now).len(),
            categories: partition_by_category(tasks).counts(),
            priorities: priority_histogram(tasks),
        }
    }
}
