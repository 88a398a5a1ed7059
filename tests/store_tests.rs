//! Record store tests against in-memory and file-backed libsql databases.

mod common;

use chrono::Utc;
use common::mocks;
use dossier::db::{LibsqlStore, RecordStore, StoreProvider};
use dossier::fusion;
use dossier::types::{
    CompanyDossier, CompanyStatus, EvolutionEvent, EvolutionEventType, JobStatus, ResearchJob,
    ResearchStage, SourceReliability, StageStatus,
};
use std::sync::Arc;
use uuid::Uuid;

async fn memory_store() -> Arc<dyn RecordStore> {
    StoreProvider::Memory
        .create_store()
        .await
        .expect("memory store")
}

fn event(event_type: EvolutionEventType, source: Option<&str>) -> EvolutionEvent {
    EvolutionEvent {
        id: Uuid::new_v4(),
        event_type,
        source_name: source.map(|s| s.to_string()),
        company_id: None,
        duration_ms: Some(100),
        quality_score: None,
        completeness_score: None,
        error_code: None,
        error_message: None,
        retry_count: None,
        fallback_used: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn memory_store_shares_one_database_across_operations() {
    // Each new connection to ":memory:" is a separate private database, so
    // the schema is only visible if every operation reuses the connection
    // opened at construction.
    let store = LibsqlStore::new_memory().await.expect("open");
    let company = mocks::company("Acme Corp");

    store.create_company(&company).await.expect("create");
    assert!(store.get_company(company.id).await.unwrap().is_some());
    assert_eq!(store.event_count().await.unwrap(), 0);
}

#[tokio::test]
async fn company_round_trip_and_status_update() {
    let store = memory_store().await;
    let company = mocks::company("Acme Corp");

    store.create_company(&company).await.expect("create");

    let loaded = store.get_company(company.id).await.unwrap().expect("found");
    assert_eq!(loaded.name, "Acme Corp");
    assert_eq!(loaded.status, CompanyStatus::Pending);
    assert_eq!(loaded.website.as_deref(), Some("https://acme.example"));

    store
        .update_company_status(company.id, CompanyStatus::Researching)
        .await
        .expect("update");
    let loaded = store.get_company(company.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, CompanyStatus::Researching);

    assert!(store.get_company(Uuid::new_v4()).await.unwrap().is_none());
    assert_eq!(store.list_companies().await.unwrap().len(), 1);
}

#[tokio::test]
async fn status_update_for_missing_company_is_not_found() {
    let store = memory_store().await;
    let err = store
        .update_company_status(Uuid::new_v4(), CompanyStatus::Failed)
        .await
        .expect_err("missing row");
    assert!(err.to_string().contains("not found") || err.to_string().contains("Not found"));
}

#[tokio::test]
async fn job_round_trip_preserves_stage_map() {
    let store = memory_store().await;
    let company = mocks::company("Acme Corp");
    store.create_company(&company).await.unwrap();

    let mut job = ResearchJob::queued(company.id, 7);
    store.create_job(&job).await.expect("create");

    job.status = JobStatus::Running;
    job.progress = 50;
    job.started_at = Some(Utc::now());
    job.stages.insert(ResearchStage::Website, StageStatus::Completed);
    job.stages.insert(ResearchStage::Social, StageStatus::Running);
    store.update_job(&job).await.expect("update");

    let loaded = store.get_job(job.id).await.unwrap().expect("found");
    assert_eq!(loaded.status, JobStatus::Running);
    assert_eq!(loaded.progress, 50);
    assert_eq!(loaded.priority, 7);
    assert!(loaded.started_at.is_some());
    assert_eq!(loaded.stages[&ResearchStage::Website], StageStatus::Completed);
    assert_eq!(loaded.stages[&ResearchStage::Social], StageStatus::Running);
    assert_eq!(loaded.stages[&ResearchStage::News], StageStatus::Pending);
}

#[tokio::test]
async fn dossier_upsert_is_idempotent_per_company() {
    let store = memory_store().await;
    let company = mocks::company("Acme Corp");
    store.create_company(&company).await.unwrap();

    let mut dossier = CompanyDossier::empty(company.id, &company.name);
    fusion::fuse(&mut dossier);
    store.upsert_dossier(&dossier).await.expect("first upsert");

    dossier.completeness_score = 85;
    store.upsert_dossier(&dossier).await.expect("second upsert");

    let loaded = store
        .get_dossier(company.id)
        .await
        .unwrap()
        .expect("found");
    assert_eq!(loaded.completeness_score, 85);
    assert_eq!(loaded.company_name, "Acme Corp");
}

#[tokio::test]
async fn reliability_upsert_and_listing() {
    let store = memory_store().await;

    let mut row = SourceReliability::seed("probe", 100.0);
    store.upsert_reliability(&row).await.expect("insert");

    row.success_rate = 90.0;
    row.current_daily_usage = 3;
    row.last_used = Some(Utc::now());
    store.upsert_reliability(&row).await.expect("update");

    let loaded = store
        .get_reliability("probe")
        .await
        .unwrap()
        .expect("found");
    assert!((loaded.success_rate - 90.0).abs() < f64::EPSILON);
    assert_eq!(loaded.current_daily_usage, 3);
    assert!(loaded.last_used.is_some());

    assert!(store.get_reliability("unknown").await.unwrap().is_none());
    assert_eq!(store.list_reliability().await.unwrap().len(), 1);
}

#[tokio::test]
async fn events_are_returned_most_recent_first() {
    let store = memory_store().await;

    store
        .append_event(&event(EvolutionEventType::SourceSuccess, Some("a")))
        .await
        .unwrap();
    store
        .append_event(&event(EvolutionEventType::SourceFailure, Some("b")))
        .await
        .unwrap();
    store
        .append_event(&event(EvolutionEventType::SourceSuccess, Some("c")))
        .await
        .unwrap();

    let recent = store.recent_events(10).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].source_name.as_deref(), Some("c"));
    assert_eq!(recent[2].source_name.as_deref(), Some("a"));

    let successes = store
        .recent_events_of_type(EvolutionEventType::SourceSuccess, 10)
        .await
        .unwrap();
    assert_eq!(successes.len(), 2);
    assert_eq!(successes[0].source_name.as_deref(), Some("c"));

    let limited = store.recent_events(2).await.unwrap();
    assert_eq!(limited.len(), 2);

    assert_eq!(store.event_count().await.unwrap(), 3);
}

#[tokio::test]
async fn local_database_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dossier.db");
    let path = path.to_str().expect("utf8 path");

    let company = mocks::company("Acme Corp");
    {
        let store = LibsqlStore::new_local(path).await.expect("open");
        store.create_company(&company).await.expect("create");
    }

    let store = LibsqlStore::new_local(path).await.expect("reopen");
    let loaded = store.get_company(company.id).await.unwrap().expect("found");
    assert_eq!(loaded.name, "Acme Corp");
}
