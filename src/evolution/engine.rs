//! Evolution engine: outcome logging, reliability smoothing, insight queries.

use crate::db::RecordStore;
use crate::types::{EvolutionEvent, EvolutionEventType, Result, SourceReliability};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;
use uuid::Uuid;

/// Smoothing factor for success updates. Each success closes a tenth of the
/// remaining gap to 100.
const SUCCESS_SMOOTHING: f64 = 0.1;
/// Flat penalty per failure.
const FAILURE_PENALTY: f64 = 10.0;
/// Sources at or below this success rate are disabled.
const ENABLE_THRESHOLD: f64 = 20.0;

/// Events considered for processing-time and trend analysis.
const INSIGHT_WINDOW: usize = 20;
/// Completeness samples per trend window.
const TREND_WINDOW: usize = 10;
/// Mean completeness delta beyond which the trend is no longer stable.
const TREND_DELTA: f64 = 5.0;

/// Mean job duration above this many seconds triggers a recommendation.
const SLOW_PIPELINE_SECS: f64 = 300.0;

/// Direction of the recent completeness trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityTrend {
    Improving,
    Declining,
    Stable,
}

/// System-level snapshot derived from reliability rows and the event log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvolutionInsights {
    /// Up to five enabled sources with a success rate of 70 or better,
    /// best first.
    pub top_performers: Vec<SourceReliability>,
    /// Up to five sources below a success rate of 50, worst first.
    pub problem_sources: Vec<SourceReliability>,
    /// Mean job duration over the recent completion window, rounded to
    /// whole seconds. `None` until at least one research run has completed.
    pub avg_processing_secs: Option<f64>,
    pub quality_trend: QualityTrend,
    pub recommendations: Vec<String>,
}

pub struct EvolutionEngine {
    store: Arc<dyn RecordStore>,
    /// One async mutex per source serializes the read-modify-write cycle on
    /// its reliability row.
    source_locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EvolutionEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            source_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    fn source_lock(&self, source_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.source_locks.lock();
        Arc::clone(
            locks
                .entry(source_name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Record a successful collaborator invocation. Errors are swallowed
    /// after logging; a lost observation never fails the job.
    pub async fn log_success(
        &self,
        source_name: &str,
        duration_ms: i64,
        quality_score: f64,
        company_id: Option<Uuid>,
    ) {
        let event = EvolutionEvent {
            id: Uuid::new_v4(),
            event_type: EvolutionEventType::SourceSuccess,
            source_name: Some(source_name.to_string()),
            company_id,
            duration_ms: Some(duration_ms),
            quality_score: Some(quality_score),
            completeness_score: None,
            error_code: None,
            error_message: None,
            retry_count: None,
            fallback_used: None,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.append_event(&event).await {
            tracing::warn!(source = source_name, error = %e, "Failed to record success event");
        }

        if let Err(e) = self
            .record_outcome(source_name, Outcome::Success {
                duration_ms,
                quality_score,
            })
            .await
        {
            tracing::warn!(source = source_name, error = %e, "Failed to update reliability");
        }
    }

    /// Record a failed collaborator invocation. Retry count and fallback
    /// flag are recorded when the caller tracked them.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_failure(
        &self,
        source_name: &str,
        error_code: &str,
        error_message: &str,
        company_id: Option<Uuid>,
        duration_ms: Option<i64>,
        retry_count: Option<u32>,
        fallback_used: Option<bool>,
    ) {
        let event = EvolutionEvent {
            id: Uuid::new_v4(),
            event_type: EvolutionEventType::SourceFailure,
            source_name: Some(source_name.to_string()),
            company_id,
            duration_ms,
            quality_score: None,
            completeness_score: None,
            error_code: Some(error_code.to_string()),
            error_message: Some(error_message.to_string()),
            retry_count,
            fallback_used,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.append_event(&event).await {
            tracing::warn!(source = source_name, error = %e, "Failed to record failure event");
        }

        if let Err(e) = self.record_outcome(source_name, Outcome::Failure).await {
            tracing::warn!(source = source_name, error = %e, "Failed to update reliability");
        }
    }

    /// Record the completion of a full research run.
    pub async fn log_research_complete(
        &self,
        company_id: Uuid,
        completeness_score: f64,
        sources_used: &[String],
        sources_degraded: &[String],
        gaps: &[String],
        duration_ms: i64,
    ) {
        tracing::info!(
            company_id = %company_id,
            completeness = completeness_score,
            sources_used = sources_used.len(),
            sources_degraded = sources_degraded.len(),
            gaps = gaps.len(),
            duration_ms,
            "Research run recorded"
        );

        let event = EvolutionEvent {
            id: Uuid::new_v4(),
            event_type: EvolutionEventType::ResearchComplete,
            source_name: None,
            company_id: Some(company_id),
            duration_ms: Some(duration_ms),
            quality_score: None,
            completeness_score: Some(completeness_score),
            error_code: None,
            error_message: None,
            retry_count: None,
            fallback_used: None,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.append_event(&event).await {
            tracing::warn!(company_id = %company_id, error = %e, "Failed to record completion event");
        }
    }

    /// Serialized read-modify-write of one reliability row.
    async fn record_outcome(&self, source_name: &str, outcome: Outcome) -> Result<()> {
        let lock = self.source_lock(source_name);
        let _guard = lock.lock().await;

        let row = self.store.get_reliability(source_name).await?;

        let updated = match (row, outcome) {
            (
                Some(mut row),
                Outcome::Success {
                    duration_ms,
                    quality_score,
                },
            ) => {
                apply_success(&mut row, duration_ms, quality_score);
                row.current_daily_usage += 1;
                row.last_used = Some(Utc::now());
                row
            }
            (Some(mut row), Outcome::Failure) => {
                apply_failure(&mut row);
                row.current_daily_usage += 1;
                row.last_used = Some(Utc::now());
                row
            }
            (
                None,
                Outcome::Success {
                    duration_ms,
                    quality_score,
                },
            ) => {
                let mut row = SourceReliability::seed(source_name, 100.0);
                row.avg_duration_ms = duration_ms;
                row.avg_quality_score = quality_score;
                row.last_used = Some(Utc::now());
                row
            }
            (None, Outcome::Failure) => {
                let mut row = SourceReliability::seed(source_name, 0.0);
                row.last_used = Some(Utc::now());
                row
            }
        };

        self.store.upsert_reliability(&updated).await
    }

    /// Every known source, best success rate first.
    pub async fn source_performance(&self) -> Result<Vec<SourceReliability>> {
        let mut rows = self.store.list_reliability().await?;
        rows.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }

    /// Up to five enabled sources at or above the given success rate,
    /// ordered by success rate then quality.
    pub async fn best_sources(&self, min_success_rate: f64) -> Result<Vec<SourceReliability>> {
        let mut rows: Vec<SourceReliability> = self
            .store
            .list_reliability()
            .await?
            .into_iter()
            .filter(|r| r.enabled && r.success_rate >= min_success_rate)
            .collect();

        rows.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.avg_quality_score
                        .partial_cmp(&a.avg_quality_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        rows.truncate(5);
        Ok(rows)
    }

    /// Derive the current insight snapshot.
    pub async fn analyze_insights(&self) -> Result<EvolutionInsights> {
        let rows = self.store.list_reliability().await?;

        let mut top_performers: Vec<SourceReliability> = rows
            .iter()
            .filter(|r| r.enabled && r.success_rate >= 70.0)
            .cloned()
            .collect();
        top_performers.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top_performers.truncate(5);

        let mut problem_sources: Vec<SourceReliability> = rows
            .iter()
            .filter(|r| r.success_rate < 50.0)
            .cloned()
            .collect();
        problem_sources.sort_by(|a, b| {
            a.success_rate
                .partial_cmp(&b.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        problem_sources.truncate(5);

        let completions = self
            .store
            .recent_events_of_type(EvolutionEventType::ResearchComplete, INSIGHT_WINDOW)
            .await?;

        let durations: Vec<f64> = completions
            .iter()
            .filter_map(|e| e.duration_ms)
            .map(|ms| ms as f64 / 1000.0)
            .collect();
        let avg_processing_secs = if durations.is_empty() {
            None
        } else {
            Some((durations.iter().sum::<f64>() / durations.len() as f64).round())
        };

        let completeness: Vec<f64> = completions
            .iter()
            .filter_map(|e| e.completeness_score)
            .collect();
        let quality_trend = classify_trend(&completeness);

        let mut recommendations = Vec::new();
        if !problem_sources.is_empty() {
            let names: Vec<&str> = problem_sources
                .iter()
                .map(|r| r.source_name.as_str())
                .collect();
            recommendations.push(format!(
                "Review or deprioritize low-reliability sources: {}",
                names.join(", ")
            ));
        }
        if quality_trend == QualityTrend::Declining {
            recommendations
                .push("Dossier completeness is declining; inspect recent source failures".into());
        }
        if let Some(secs) = avg_processing_secs {
            if secs > SLOW_PIPELINE_SECS {
                recommendations.push(format!(
                    "Average research run takes {:.0}s; consider raising concurrency or tightening timeouts",
                    secs
                ));
            }
        }

        Ok(EvolutionInsights {
            top_performers,
            problem_sources,
            avg_processing_secs,
            quality_trend,
            recommendations,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Success { duration_ms: i64, quality_score: f64 },
    Failure,
}

/// Success update: the rate closes a tenth of its remaining gap to 100, the
/// duration and quality averages blend half-and-half with the new sample.
pub fn apply_success(row: &mut SourceReliability, duration_ms: i64, quality_score: f64) {
    row.success_rate =
        (row.success_rate + (100.0 - row.success_rate) * SUCCESS_SMOOTHING).min(100.0);
    row.avg_duration_ms =
        ((row.avg_duration_ms as f64 + duration_ms as f64) / 2.0).round() as i64;
    row.avg_quality_score = (row.avg_quality_score + quality_score) / 2.0;
    row.enabled = row.success_rate > ENABLE_THRESHOLD;
}

/// Failure update: flat penalty, floored at zero. Averages are untouched.
pub fn apply_failure(row: &mut SourceReliability) {
    row.success_rate = (row.success_rate - FAILURE_PENALTY).max(0.0);
    row.enabled = row.success_rate > ENABLE_THRESHOLD;
}

/// Classify the completeness trend from samples ordered most recent first.
///
/// Compares the mean of the freshest window against the mean of the window
/// before it. With fewer than two full windows the older mean falls back to
/// the fresh one; with less than one full window no comparison is made.
pub fn classify_trend(completeness_newest_first: &[f64]) -> QualityTrend {
    if completeness_newest_first.len() < TREND_WINDOW {
        return QualityTrend::Stable;
    }

    let mean = |slice: &[f64]| slice.iter().sum::<f64>() / slice.len() as f64;

    let recent = mean(&completeness_newest_first[..TREND_WINDOW]);
    let older = if completeness_newest_first.len() >= 2 * TREND_WINDOW {
        mean(&completeness_newest_first[TREND_WINDOW..2 * TREND_WINDOW])
    } else {
        recent
    };

    let delta = recent - older;
    if delta > TREND_DELTA {
        QualityTrend::Improving
    } else if delta < -TREND_DELTA {
        QualityTrend::Declining
    } else {
        QualityTrend::Stable
    }
}
