//! Cross-user aggregates for the admin dashboard.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::classify::{priority_histogram, PriorityHistogram};
use crate::profile::{Profile, FALLBACK_DISPLAY_NAME};
use crate::task::Task;

/// How many users the completion breakdown shows.
pub const TOP_USERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub display_name: String,
    pub completed_count: usize,
    pub pending_count: usize,
}

impl UserSummary {
    pub fn total(&self) -> usize {
        self.completed_count + self.pending_count
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total_users: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub urgent_tasks: usize,
}

/// Per-user completion breakdown, busiest users first.
///
/// Only users that own at least one task are kept. Users with the same
/// total keep their order in `users`. Tasks owned by someone missing from
/// `users` are not counted.
pub fn summarize_by_user(tasks: &[Task], users: &[Profile], limit: usize) -> Vec<UserSummary> {
    let mut summaries: Vec<UserSummary> = users
        .iter()
        .map(|user| UserSummary {
            user_id: user.id,
            display_name: user.display_name(),
            completed_count: 0,
            pending_count: 0,
        })
        .collect();

    let mut slots: HashMap<Uuid, usize> = HashMap::with_capacity(users.len());
    for (slot, user) in users.iter().enumerate() {
        slots.entry(user.id).or_insert(slot);
    }

    for task in tasks {
        let Some(&slot) = slots.get(&task.owner_id) else {
            continue;
        };
        let summary = &mut summaries[slot];
        if task.completed {
            summary.completed_count += 1;
        } else {
            summary.pending_count += 1;
        }
    }

    summaries.retain(|s| s.total() > 0);
    summaries.sort_by(|a, b| b.total().cmp(&a.total()));
    summaries.truncate(limit);
    summaries
}

pub fn dashboard_counts(tasks: &[Task], users: &[Profile]) -> DashboardCounts {
    let completed_tasks = tasks.iter().filter(|t| t.completed).count();
    DashboardCounts {
        total_users: users.len(),
        completed_tasks,
        pending_tasks: tasks.len() - completed_tasks,
        urgent_tasks: tasks.iter().filter(|t| t.is_urgent()).count(),
    }
}

/// A task in the admin task list, labelled with its owner's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedTask {
    #[serde(flatten)]
    pub task: Task,
    pub owner_name: String,
}

/// Pairs each task with its owner's display name, keeping task order.
/// Owners missing from `users` get the fallback name.
pub fn label_owners(tasks: Vec<Task>, users: &[Profile]) -> Vec<OwnedTask> {
    let names: HashMap<Uuid, String> = users
        .iter()
        .map(|user| (user.id, user.display_name()))
        .collect();
    tasks
        .into_iter()
        .map(|task| {
            let owner_name = names
                .get(&task.owner_id)
                .cloned()
                .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string());
            OwnedTask { task, owner_name }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminDashboard {
    pub counts: DashboardCounts,
    pub priorities: PriorityHistogram,
    pub top_users: Vec<UserSummary>,
}

impl AdminDashboard {
    pub fn compute(tasks: &[Task], users: &[Profile]) -> Self {
        Self {
            counts: dashboard_counts(tasks, users),
            priorities: priority_histogram(tasks),
            top_users: summarize_by_user(tasks, users, TOP_USERS),
        }
    }
}
