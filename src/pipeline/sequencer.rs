//! Stage Sequencer
//!
//! Executes the fixed research sequence for one job: website, social fan-out
//! with optional verification, news, business analysis. Each stage bumps job
//! progress to its cutoff once its collaborator call returns, whether or not
//! the call produced usable data.
//!
//! Error tiers: a degraded collaborator result (errors list populated, `Ok`
//! returned) completes the stage with lower-quality data; a collaborator
//! `Err` or any record-store failure aborts the job, marking job and company
//! `Failed`.

use crate::collaborators::{CollaboratorSet, ResearchContext, SubjectSnapshot};
use crate::db::RecordStore;
use crate::evolution::EvolutionEngine;
use crate::fusion;
use crate::pipeline::CancelToken;
use crate::types::{
    AppError, CompanyDossier, CompanyStatus, JobStatus, ResearchStage, Result, SocialIntel,
    StageStatus,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Confidence adjustment applied by the verification pass.
const VERIFY_BOOST: u8 = 10;
const VERIFY_PENALTY: u8 = 10;

pub struct ResearchSequencer {
    store: Arc<dyn RecordStore>,
    collaborators: CollaboratorSet,
    evolution: Arc<EvolutionEngine>,
    /// Platforms the social stage fans out over.
    platforms: Vec<String>,
}

impl ResearchSequencer {
    pub fn new(
        store: Arc<dyn RecordStore>,
        collaborators: CollaboratorSet,
        evolution: Arc<EvolutionEngine>,
        platforms: Vec<String>,
    ) -> Self {
        Self {
            store,
            collaborators,
            evolution,
            platforms,
        }
    }

    /// Drive the job with the given id to a terminal status.
    ///
    /// Hard failures (job/company cannot be loaded, persistence fails, a
    /// collaborator call escapes with an error) mark the job and company
    /// `Failed` and are re-thrown to the caller.
    pub async fn execute_research(&self, job_id: Uuid, cancel: CancelToken) -> Result<()> {
        match self.run_pipeline(job_id, &cancel).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_failed(job_id, &e).await;
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, job_id: Uuid, cancel: &CancelToken) -> Result<()> {
        let run_start = Instant::now();

        let mut job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", job_id)))?;

        let company = self
            .store
            .get_company(job.company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company not found: {}", job.company_id)))?;

        if !job.status.can_transition_to(JobStatus::Running) {
            return Err(AppError::InvalidTransition(format!(
                "Cannot start research from status '{}'",
                job.status.as_str()
            )));
        }

        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        self.store.update_job(&job).await?;
        self.store
            .update_company_status(company.id, CompanyStatus::Researching)
            .await?;

        tracing::info!(job_id = %job.id, company = %company.name, "Research started");

        let subject = SubjectSnapshot::from(&company);
        let mut ctx = ResearchContext {
            job_id: job.id,
            cancel: cancel.clone(),
            ..Default::default()
        };
        let mut dossier = CompanyDossier::empty(company.id, &company.name);
        let mut sources_used: Vec<String> = Vec::new();
        let mut sources_degraded: Vec<String> = Vec::new();

        for stage in ResearchStage::ALL {
            if cancel.is_cancelled() {
                tracing::info!(job_id = %job.id, stage = stage.as_str(), "Research cancelled, stopping");
                return Ok(());
            }

            job.stages.insert(stage, StageStatus::Running);
            self.store.update_job(&job).await?;

            let stage_start = Instant::now();
            let outcome = self
                .run_stage(stage, &subject, &mut ctx, &mut dossier)
                .await;
            let duration_ms = stage_start.elapsed().as_millis() as i64;

            match outcome {
                Ok(report) => {
                    self.evolution
                        .log_success(
                            &report.source,
                            duration_ms,
                            f64::from(report.quality),
                            Some(company.id),
                        )
                        .await;
                    if report.degraded {
                        sources_degraded.push(report.source);
                    } else {
                        sources_used.push(report.source);
                    }

                    // Progress reaches the cutoff whether or not the stage
                    // produced usable data.
                    job.stages.insert(stage, StageStatus::Completed);
                    job.progress = stage.progress_cutoff();

                    if cancel.is_cancelled() {
                        tracing::info!(job_id = %job.id, stage = stage.as_str(), "Research cancelled, suppressing writes");
                        return Ok(());
                    }
                    self.store.update_job(&job).await?;
                }
                Err(e) => {
                    self.evolution
                        .log_failure(
                            self.stage_source(stage),
                            "stage_error",
                            &e.to_string(),
                            Some(company.id),
                            Some(duration_ms),
                            None,
                            None,
                        )
                        .await;
                    job.stages.insert(stage, StageStatus::Failed);
                    // Best effort; the outer failure path owns job status.
                    if let Err(persist) = self.store.update_job(&job).await {
                        tracing::error!(job_id = %job.id, error = %persist, "Failed to persist failed stage");
                    }
                    return Err(e);
                }
            }
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        fusion::fuse(&mut dossier);
        self.store.upsert_dossier(&dossier).await?;

        self.evolution
            .log_research_complete(
                company.id,
                f64::from(dossier.completeness_score),
                &sources_used,
                &sources_degraded,
                &dossier.gaps,
                run_start.elapsed().as_millis() as i64,
            )
            .await;

        job.status = JobStatus::Completed;
        job.progress = 100;
        job.completed_at = Some(Utc::now());
        self.store.update_job(&job).await?;
        self.store
            .update_company_status(company.id, CompanyStatus::Completed)
            .await?;

        tracing::info!(
            job_id = %job.id,
            completeness = dossier.completeness_score,
            confidence = dossier.confidence_score,
            gaps = dossier.gaps.len(),
            "Research completed"
        );

        Ok(())
    }

    fn stage_source(&self, stage: ResearchStage) -> &str {
        match stage {
            ResearchStage::Website => self.collaborators.website.source_name(),
            ResearchStage::Social => self.collaborators.social.source_name(),
            ResearchStage::News => self.collaborators.news.source_name(),
            ResearchStage::BusinessAnalysis => self.collaborators.business.source_name(),
        }
    }

    async fn run_stage(
        &self,
        stage: ResearchStage,
        subject: &SubjectSnapshot,
        ctx: &mut ResearchContext,
        dossier: &mut CompanyDossier,
    ) -> Result<StageReport> {
        match stage {
            ResearchStage::Website => {
                let intel = self.collaborators.website.invoke(subject, ctx).await?;
                let report = StageReport {
                    source: self.collaborators.website.source_name().to_string(),
                    quality: intel.confidence,
                    degraded: !intel.errors.is_empty(),
                };
                ctx.website = Some(intel.clone());
                dossier.website = Some(intel);
                Ok(report)
            }
            ResearchStage::Social => {
                let intel = self.social_fan_out(subject, ctx).await?;
                let report = StageReport {
                    source: self.collaborators.social.source_name().to_string(),
                    quality: intel.presence_score,
                    degraded: !intel.errors.is_empty(),
                };
                ctx.social = Some(intel.clone());
                dossier.social = Some(intel);
                Ok(report)
            }
            ResearchStage::News => {
                let intel = self.collaborators.news.invoke(subject, ctx).await?;
                let report = StageReport {
                    source: self.collaborators.news.source_name().to_string(),
                    quality: intel.confidence,
                    degraded: !intel.errors.is_empty(),
                };
                ctx.news = Some(intel.clone());
                dossier.news = Some(intel);
                Ok(report)
            }
            ResearchStage::BusinessAnalysis => {
                let intel = self.collaborators.business.invoke(subject, ctx).await?;
                let report = StageReport {
                    source: self.collaborators.business.source_name().to_string(),
                    quality: intel.confidence,
                    degraded: !intel.errors.is_empty(),
                };
                dossier.business = Some(intel);
                Ok(report)
            }
        }
    }

    /// One sub-call per configured platform, joined before the optional
    /// verification pass adjusts per-profile confidence.
    async fn social_fan_out(
        &self,
        subject: &SubjectSnapshot,
        ctx: &ResearchContext,
    ) -> Result<SocialIntel> {
        let mut set = JoinSet::new();

        for platform in &self.platforms {
            if ctx.cancel.is_cancelled() {
                break;
            }
            let collaborator = self.collaborators.social.clone();
            let subject = subject.clone();
            let platform = platform.clone();
            let ctx = ctx.clone();

            set.spawn(async move { collaborator.platform_lookup(&subject, &platform, &ctx).await });
        }

        let mut profiles = Vec::new();
        let mut errors = Vec::new();

        // Join semantics: wait for every sub-call, not just the first.
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(lookup)) => {
                    if let Some(profile) = lookup.profile {
                        profiles.push(profile);
                    }
                    errors.extend(lookup.errors);
                }
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    return Err(AppError::Internal(format!(
                        "Social lookup task panicked: {}",
                        e
                    )))
                }
            }
        }

        // Join order is arbitrary; keep the output deterministic.
        profiles.sort_by(|a, b| a.platform.cmp(&b.platform).then_with(|| a.url.cmp(&b.url)));

        if let Some(verifier) = &self.collaborators.verifier {
            for profile in &mut profiles {
                match verifier.verify(subject, profile).await {
                    Ok(true) => {
                        profile.verified = Some(true);
                        profile.confidence = profile.confidence.saturating_add(VERIFY_BOOST).min(100);
                    }
                    Ok(false) => {
                        profile.verified = Some(false);
                        profile.confidence = profile.confidence.saturating_sub(VERIFY_PENALTY);
                    }
                    Err(e) => {
                        errors.push(format!("Verification failed for {}: {}", profile.url, e));
                    }
                }
            }
        }

        let presence_score = self.collaborators.social.presence_score(&profiles);

        Ok(SocialIntel {
            profiles,
            presence_score,
            errors,
        })
    }

    /// Failure path: mark job and company `Failed` with the captured message.
    /// Best-effort; persistence failures here are logged, not propagated.
    async fn mark_failed(&self, job_id: Uuid, error: &AppError) {
        let job = match self.store.get_job(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Failed to load job for failure marking");
                return;
            }
        };

        // A job already terminal (e.g. cancelled between submit and start)
        // keeps its status; the cancel surface owns that record and the
        // company's Pending revert.
        if !job.status.can_transition_to(JobStatus::Failed) {
            return;
        }

        let mut failed = job;
        failed.status = JobStatus::Failed;
        failed.error_message = Some(error.to_string());
        failed.completed_at = Some(Utc::now());

        if let Err(e) = self.store.update_job(&failed).await {
            tracing::error!(job_id = %job_id, error = %e, "Failed to persist failed job");
        }
        if let Err(e) = self
            .store
            .update_company_status(failed.company_id, CompanyStatus::Failed)
            .await
        {
            tracing::error!(company_id = %failed.company_id, error = %e, "Failed to mark company failed");
        }
    }
}

struct StageReport {
    source: String,
    quality: u8,
    degraded: bool,
}
