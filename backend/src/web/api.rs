use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use shared::{
    label_owners, AdminDashboard, Caller, CreateTaskInput, OwnedTask, Profile, ProfileInput, Task,
    TaskOverview, ToggleInput, UpdateTaskInput,
};
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;

type CurrentCaller = Option<Extension<Caller>>;

fn caller(current: CurrentCaller) -> Option<Caller> {
    current.map(|Extension(caller)| caller)
}

#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    now: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    date: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignTaskRequest {
    pub user_id: Uuid,
    pub task: CreateTaskInput,
}

/// RFC 3339 keeps its offset; a bare date is read as midnight UTC.
fn parse_reference(raw: &str) -> Result<DateTime<FixedOffset>, ApiError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().fixed_offset())
        .ok_or_else(|| ApiError::BadRequest(format!("`{}` is not a valid date", raw)))
}

fn reference_or_now(query: &ReferenceQuery) -> Result<DateTime<FixedOffset>, ApiError> {
    match query.now.as_deref() {
        Some(raw) => parse_reference(raw),
        None => Ok(Utc::now().fixed_offset()),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    current: CurrentCaller,
) -> Result<Json<Vec<Task>>, ApiError> {
    let caller = caller(current);
    Ok(Json(state.tasks.list(caller.as_ref()).await?))
}

#[tracing::instrument(skip(state))]
pub async fn create_task(
    State(state): State<AppState>,
    current: CurrentCaller,
    Json(input): Json<CreateTaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let caller = caller(current);
    let task = state.tasks.create(caller.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[tracing::instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    current: CurrentCaller,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let caller = caller(current);
    Ok(Json(state.tasks.get(id, caller.as_ref()).await?))
}

#[tracing::instrument(skip(state))]
pub async fn update_task(
    State(state): State<AppState>,
    current: CurrentCaller,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> Result<Json<Task>, ApiError> {
    let caller = caller(current);
    Ok(Json(state.tasks.update(id, caller.as_ref(), input).await?))
}

#[tracing::instrument(skip(state))]
pub async fn set_completion(
    State(state): State<AppState>,
    current: CurrentCaller,
    Path(id): Path<Uuid>,
    Json(input): Json<ToggleInput>,
) -> Result<StatusCode, ApiError> {
    let caller = caller(current);
    state
        .tasks
        .toggle_completion(id, caller.as_ref(), input.completed)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    current: CurrentCaller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let caller = caller(current);
    state.tasks.delete(id, caller.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn overview(
    State(state): State<AppState>,
    current: CurrentCaller,
    Query(query): Query<ReferenceQuery>,
) -> Result<Json<TaskOverview>, ApiError> {
    let caller = caller(current);
    let now = reference_or_now(&query)?;
    let tasks = state.tasks.list(caller.as_ref()).await?;
    Ok(Json(TaskOverview::compute(&tasks, &now)))
}

#[tracing::instrument(skip(state))]
pub async fn today(
    State(state): State<AppState>,
    current: CurrentCaller,
    Query(query): Query<ReferenceQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let caller = caller(current);
    let now = reference_or_now(&query)?;
    let tasks = state.tasks.list(caller.as_ref()).await?;
    Ok(Json(shared::today(&tasks, &now).into_iter().cloned().collect()))
}

#[tracing::instrument(skip(state))]
pub async fn calendar(
    State(state): State<AppState>,
    current: CurrentCaller,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let caller = caller(current);
    let date = parse_reference(&query.date)?;
    let tasks = state.tasks.list(caller.as_ref()).await?;
    Ok(Json(
        shared::tasks_due_on(&tasks, &date)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentCaller,
    Json(input): Json<ProfileInput>,
) -> Result<Json<Profile>, ApiError> {
    let caller = caller(current);
    Ok(Json(state.admin.update_profile(caller.as_ref(), input).await?))
}

#[tracing::instrument(skip(state))]
pub async fn list_all_tasks(
    State(state): State<AppState>,
    current: CurrentCaller,
) -> Result<Json<Vec<OwnedTask>>, ApiError> {
    let caller = caller(current);
    let tasks = state.tasks.list_all(caller.as_ref()).await?;
    let users = state.admin.users(caller.as_ref()).await?;
    Ok(Json(label_owners(tasks, &users)))
}

#[tracing::instrument(skip(state))]
pub async fn assign_task(
    State(state): State<AppState>,
    current: CurrentCaller,
    Json(request): Json<AssignTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let caller = caller(current);
    let task = state
        .tasks
        .assign(caller.as_ref(), request.user_id, request.task)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[tracing::instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentCaller,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let caller = caller(current);
    Ok(Json(state.admin.users(caller.as_ref()).await?))
}

#[tracing::instrument(skip(state))]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    current: CurrentCaller,
) -> Result<Json<AdminDashboard>, ApiError> {
    let caller = caller(current);
    Ok(Json(state.admin.dashboard(caller.as_ref()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reference_keeps_the_offset() {
        let parsed = parse_reference("2024-05-01T12:00:00-03:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), -3 * 3600);
        assert_eq!(
            parsed.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn bare_dates_are_utc_midnight() {
        let parsed = parse_reference("2024-05-01").unwrap();
        assert_eq!(
            parsed.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_reference("someday"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
