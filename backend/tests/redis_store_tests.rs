//! Runs the Redis backend against a throwaway container. Needs Docker:
//! `cargo test -- --ignored`.

use backend::store::{ProfileStore, RedisStore, TaskStore};
use chrono::{TimeZone, Utc};
use shared::{CreateTaskInput, Profile, Task};
use std::collections::HashSet;
use testcontainers_modules::redis::{Redis, REDIS_PORT};
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;
use uuid::Uuid;

pub struct TestContext {
    #[allow(dead_code)] // dropping the container stops Redis
    pub container: ContainerAsync<Redis>,
    pub store: RedisStore,
}

async fn setup() -> anyhow::Result<TestContext> {
    let _ = tracing_subscriber::fmt().try_init();
    let container = Redis::default().start().await?;
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(REDIS_PORT).await?;
    let store = RedisStore::open(&format!("redis://{}:{}", host, port))?;
    Ok(TestContext { container, store })
}

fn task(owner: Uuid, title: &str) -> Task {
    let draft = CreateTaskInput {
        title: title.to_string(),
        ..Default::default()
    }
    .validate()
    .expect("valid draft");
    Task::new(owner, draft, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
}

fn ids(tasks: &[Task]) -> HashSet<Uuid> {
    tasks.iter().map(|t| t.id).collect()
}

#[tokio::test]
#[ignore = "starts a Redis container"]
async fn replace_does_not_resurrect_removed_tasks() {
    let ctx = setup().await.expect("Failed to setup test context");
    let mut buy_milk = task(Uuid::new_v4(), "Buy milk");
    ctx.store.insert_task(&buy_milk).await.unwrap();

    buy_milk.completed = true;
    assert!(ctx.store.replace_task(&buy_milk).await.unwrap());
    let stored = ctx.store.fetch_task(buy_milk.id).await.unwrap();
    assert_eq!(stored, Some(buy_milk.clone()));

    assert!(ctx.store.remove_task(buy_milk.id).await.unwrap());
    assert!(!ctx.store.replace_task(&buy_milk).await.unwrap());
    assert_eq!(ctx.store.fetch_task(buy_milk.id).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "starts a Redis container"]
async fn owner_index_scopes_listing() {
    let ctx = setup().await.expect("Failed to setup test context");
    let (ana, bia) = (Uuid::new_v4(), Uuid::new_v4());
    let anas = [task(ana, "Write report"), task(ana, "Call mom")];
    let bias = [task(bia, "Water plants")];
    for t in anas.iter().chain(&bias) {
        ctx.store.insert_task(t).await.unwrap();
    }

    let listed = ctx.store.fetch_tasks(Some(ana)).await.unwrap();
    assert_eq!(ids(&listed), ids(&anas));
    assert!(listed.iter().all(|t| t.owner_id == ana));

    let everything = ctx.store.fetch_tasks(None).await.unwrap();
    assert_eq!(everything.len(), 3);

    assert!(ctx.store.remove_task(anas[0].id).await.unwrap());
    let listed = ctx.store.fetch_tasks(Some(ana)).await.unwrap();
    assert_eq!(ids(&listed), ids(&anas[1..]));
    assert!(ctx
        .store
        .fetch_tasks(Some(Uuid::new_v4()))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[ignore = "starts a Redis container"]
async fn missing_tasks_are_reported_not_written() {
    let ctx = setup().await.expect("Failed to setup test context");
    let ghost = task(Uuid::new_v4(), "Never stored");

    assert!(!ctx.store.remove_task(ghost.id).await.unwrap());
    assert!(!ctx.store.replace_task(&ghost).await.unwrap());
    assert!(ctx.store.fetch_tasks(None).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "starts a Redis container"]
async fn profiles_are_upserted() {
    let ctx = setup().await.expect("Failed to setup test context");
    let mut ana = Profile::new(Uuid::new_v4(), "ana@example.com");
    ctx.store.upsert_profile(&ana).await.unwrap();

    ana.name = Some("Ana Souza".to_string());
    ctx.store.upsert_profile(&ana).await.unwrap();

    assert_eq!(ctx.store.fetch_profile(ana.id).await.unwrap(), Some(ana.clone()));
    assert_eq!(ctx.store.fetch_profiles().await.unwrap(), vec![ana]);
    assert_eq!(ctx.store.fetch_profile(Uuid::new_v4()).await.unwrap(), None);
}
