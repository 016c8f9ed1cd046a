pub mod classify;
pub mod profile;
pub mod summary;
pub mod task;
pub mod validation;

pub use classify::{
    is_today, partition_by_category, partition_by_completion, priority_histogram,
    progress_percentage, tasks_due_on, today, upcoming, CategoryBuckets, CategoryCounts,
    CompletionPartition, PriorityHistogram, TaskOverview,
};
pub use profile::{Caller, Profile, ProfileInput, Role, FALLBACK_DISPLAY_NAME};
pub use summary::{
    dashboard_counts, label_owners, summarize_by_user, AdminDashboard, DashboardCounts, OwnedTask,
    UserSummary, TOP_USERS,
};
pub use task::{Category, Priority, Task, TaskState};
pub use validation::{
    CreateTaskInput, FieldError, TaskChanges, TaskDraft, ToggleInput, UpdateTaskInput,
    ValidationError,
};
