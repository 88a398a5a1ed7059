//! Evolution engine tests over an in-memory store.

use dossier::db::{RecordStore, StoreProvider};
use dossier::evolution::{EvolutionEngine, QualityTrend};
use dossier::types::EvolutionEventType;
use std::sync::Arc;
use uuid::Uuid;

async fn engine() -> (Arc<dyn RecordStore>, EvolutionEngine) {
    let store = StoreProvider::Memory
        .create_store()
        .await
        .expect("memory store");
    let engine = EvolutionEngine::new(store.clone());
    (store, engine)
}

#[tokio::test]
async fn first_success_seeds_a_full_confidence_row() {
    let (store, engine) = engine().await;

    engine.log_success("probe", 1200, 80.0, None).await;

    let row = store
        .get_reliability("probe")
        .await
        .unwrap()
        .expect("seeded");
    assert!((row.success_rate - 100.0).abs() < f64::EPSILON);
    assert_eq!(row.avg_duration_ms, 1200);
    assert!((row.avg_quality_score - 80.0).abs() < f64::EPSILON);
    assert_eq!(row.priority, 5);
    assert_eq!(row.requests_per_minute, 10);
    assert_eq!(row.delay_between_ms, 6000);
    assert_eq!(row.daily_limit, 500);
    // Seeding is not a usage tick.
    assert_eq!(row.current_daily_usage, 0);
    assert!(row.enabled);
}

#[tokio::test]
async fn first_failure_seeds_a_disabled_row() {
    let (store, engine) = engine().await;

    engine
        .log_failure("probe", "timeout", "request timed out", None, Some(5000), None, None)
        .await;

    let row = store
        .get_reliability("probe")
        .await
        .unwrap()
        .expect("seeded");
    assert!((row.success_rate - 0.0).abs() < f64::EPSILON);
    assert!(!row.enabled);
}

#[tokio::test]
async fn failure_events_carry_retry_and_fallback_details() {
    let (store, engine) = engine().await;

    engine
        .log_failure(
            "probe",
            "timeout",
            "request timed out",
            None,
            Some(2500),
            Some(2),
            Some(true),
        )
        .await;

    let events = store
        .recent_events_of_type(EvolutionEventType::SourceFailure, 10)
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].error_code.as_deref(), Some("timeout"));
    assert_eq!(events[0].duration_ms, Some(2500));
    assert_eq!(events[0].retry_count, Some(2));
    assert_eq!(events[0].fallback_used, Some(true));
}

#[tokio::test]
async fn outcomes_smooth_the_existing_row() {
    let (store, engine) = engine().await;

    engine.log_success("probe", 1000, 80.0, None).await;
    engine
        .log_failure("probe", "timeout", "request timed out", None, None, None, None)
        .await;

    let row = store.get_reliability("probe").await.unwrap().unwrap();
    assert!((row.success_rate - 90.0).abs() < f64::EPSILON);
    assert_eq!(row.current_daily_usage, 1);

    engine.log_success("probe", 2000, 60.0, None).await;
    let row = store.get_reliability("probe").await.unwrap().unwrap();
    // 90 + (100 - 90) * 0.1
    assert!((row.success_rate - 91.0).abs() < f64::EPSILON);
    assert_eq!(row.avg_duration_ms, 1500);
    assert!((row.avg_quality_score - 70.0).abs() < f64::EPSILON);
    assert_eq!(row.current_daily_usage, 2);
}

#[tokio::test]
async fn repeated_failures_disable_the_source() {
    let (store, engine) = engine().await;

    engine.log_success("flaky", 500, 50.0, None).await;
    for _ in 0..8 {
        engine
            .log_failure("flaky", "http_500", "upstream error", None, None, None, None)
            .await;
    }

    let row = store.get_reliability("flaky").await.unwrap().unwrap();
    assert!((row.success_rate - 20.0).abs() < f64::EPSILON);
    assert!(!row.enabled);
}

#[tokio::test]
async fn best_sources_filters_and_orders() {
    let (_store, engine) = engine().await;

    engine.log_success("strong", 500, 90.0, None).await;
    engine.log_success("weak", 500, 40.0, None).await;
    for _ in 0..6 {
        engine
            .log_failure("weak", "http_500", "upstream error", None, None, None, None)
            .await;
    }
    engine
        .log_failure("dead", "dns", "no such host", None, None, None, None)
        .await;

    let best = engine.best_sources(70.0).await.expect("query");
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].source_name, "strong");

    let all = engine.source_performance().await.expect("query");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].source_name, "strong");
    assert_eq!(all[2].source_name, "dead");
}

#[tokio::test]
async fn insights_without_history_are_neutral() {
    let (_store, engine) = engine().await;

    let insights = engine.analyze_insights().await.expect("insights");
    assert!(insights.top_performers.is_empty());
    assert!(insights.problem_sources.is_empty());
    assert!(insights.avg_processing_secs.is_none());
    assert_eq!(insights.quality_trend, QualityTrend::Stable);
    assert!(insights.recommendations.is_empty());
}

#[tokio::test]
async fn insights_surface_problem_sources_and_timing() {
    let (store, engine) = engine().await;

    engine.log_success("strong", 500, 90.0, None).await;
    engine
        .log_failure("dead", "dns", "no such host", None, None, None, None)
        .await;

    for _ in 0..4 {
        engine
            .log_research_complete(Uuid::new_v4(), 80.0, &[], &[], &[], 4_000)
            .await;
    }

    let insights = engine.analyze_insights().await.expect("insights");
    assert_eq!(insights.top_performers.len(), 1);
    assert_eq!(insights.top_performers[0].source_name, "strong");
    assert_eq!(insights.problem_sources.len(), 1);
    assert_eq!(insights.problem_sources[0].source_name, "dead");
    assert!((insights.avg_processing_secs.unwrap() - 4.0).abs() < 1e-9);
    // Fewer than ten completions: no trend computation.
    assert_eq!(insights.quality_trend, QualityTrend::Stable);
    assert!(!insights.recommendations.is_empty());

    let completions = store
        .recent_events_of_type(EvolutionEventType::ResearchComplete, 50)
        .await
        .unwrap();
    assert_eq!(completions.len(), 4);
}

#[tokio::test]
async fn declining_completeness_is_flagged() {
    let (_store, engine) = engine().await;

    // Ten strong runs, then ten weak ones; the fresh window trails.
    for _ in 0..10 {
        engine
            .log_research_complete(Uuid::new_v4(), 90.0, &[], &[], &[], 1_000)
            .await;
    }
    for _ in 0..10 {
        engine
            .log_research_complete(Uuid::new_v4(), 40.0, &[], &[], &[], 1_000)
            .await;
    }

    let insights = engine.analyze_insights().await.expect("insights");
    assert_eq!(insights.quality_trend, QualityTrend::Declining);
    assert!(insights
        .recommendations
        .iter()
        .any(|r| r.contains("declining")));
}
