use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use thiserror::Error;
use tracing::info;

use laborlink_core::types::{Job, JobStatus};
use laborlink_storage::{Database, JobStoreError, LaborerStoreError};

/// Executes the multi-record workflows that couple the jobs and
/// laborers collections: assignment and job deletion. Each workflow
/// runs inside a single SQLite transaction, so the availability flag
/// and the assignment set cannot diverge through a partial failure,
/// and concurrent assigns against the same laborer serialize on the
/// write transaction instead of racing the availability check.
#[derive(Clone)]
pub struct AssignmentService {
    database: Database,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

/// Result of a successful assignment: the reloaded job and the numbers
/// this call requested.
#[derive(Debug)]
pub struct AssignmentOutcome {
    pub job: Job,
    pub assigned: Vec<String>,
}

impl AssignmentService {
    pub fn new(database: Database, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        Self { database, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Assigns laborers to a job by phone number.
    ///
    /// Validation is all-or-nothing: every requested number must
    /// resolve to a laborer record, and every resolved laborer must be
    /// available, before anything is written. On success the numbers
    /// are merged into the job's assignment set (set union), the job
    /// moves to `assigned`, and each requested laborer becomes
    /// unavailable, all in one transaction.
    pub async fn assign(
        &self,
        job_id: &str,
        phone_numbers: &[String],
    ) -> Result<AssignmentOutcome, AssignError> {
        let jobs = self.database.jobs();
        let laborers = self.database.laborers();
        let mut tx = self.database.begin().await?;

        if jobs.fetch_tx(&mut tx, job_id).await?.is_none() {
            return Err(AssignError::JobNotFound);
        }

        let mut resolved = Vec::with_capacity(phone_numbers.len());
        let mut unknown = Vec::new();
        for phone in phone_numbers {
            match laborers.fetch_by_phone_tx(&mut tx, phone).await? {
                Some(laborer) => resolved.push(laborer),
                None => unknown.push(phone.clone()),
            }
        }
        if !unknown.is_empty() {
            counter!("assignments_total", "result" => "unknown_laborer").increment(1);
            return Err(AssignError::UnknownLaborers(unknown));
        }

        let unavailable: Vec<String> = resolved
            .iter()
            .filter(|laborer| !laborer.available)
            .map(|laborer| laborer.phone.clone())
            .collect();
        if !unavailable.is_empty() {
            counter!("assignments_total", "result" => "unavailable").increment(1);
            return Err(AssignError::Unavailable(unavailable));
        }

        let now = self.now();
        jobs.add_assignments_tx(&mut tx, job_id, phone_numbers, now)
            .await?;
        jobs.set_status_tx(&mut tx, job_id, JobStatus::Assigned)
            .await?;
        for phone in phone_numbers {
            laborers.set_available_tx(&mut tx, phone, false).await?;
        }
        tx.commit().await?;

        counter!("assignments_total", "result" => "assigned").increment(1);
        info!(
            stage = "assignment",
            job_id,
            count = phone_numbers.len(),
            "laborers assigned to job"
        );

        let job = jobs.fetch(job_id).await?;
        Ok(AssignmentOutcome {
            job,
            assigned: phone_numbers.to_vec(),
        })
    }

    /// Deletes a job, first returning every laborer in its assignment
    /// set to `available = true`. Runs in one transaction so a failure
    /// rolls both sides back; the assignment rows themselves cascade
    /// with the job. Returns how many laborers were freed.
    pub async fn delete_job(&self, job_id: &str) -> Result<usize, AssignError> {
        let jobs = self.database.jobs();
        let laborers = self.database.laborers();
        let mut tx = self.database.begin().await?;

        let assigned = jobs.assignments_tx(&mut tx, job_id).await?;
        for phone in &assigned {
            laborers.set_available_tx(&mut tx, phone, true).await?;
        }
        jobs.delete_tx(&mut tx, job_id).await?;
        tx.commit().await?;

        counter!("jobs_deleted_total").increment(1);
        if !assigned.is_empty() {
            counter!("laborers_freed_total").increment(assigned.len() as u64);
        }
        info!(
            stage = "assignment",
            job_id,
            freed = assigned.len(),
            "job deleted and assigned laborers freed"
        );
        Ok(assigned.len())
    }
}

/// Failures of the assignment and deletion workflows.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("job not found")]
    JobNotFound,
    #[error("laborers not found for phone numbers: {0:?}")]
    UnknownLaborers(Vec<String>),
    #[error("laborers are not available: {0:?}")]
    Unavailable(Vec<String>),
    #[error("laborer store error: {0}")]
    Laborer(#[from] LaborerStoreError),
    #[error("job store error: {0}")]
    Job(JobStoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JobStoreError> for AssignError {
    fn from(err: JobStoreError) -> Self {
        match err {
            JobStoreError::NotFound => Self::JobNotFound,
            other => Self::Job(other),
        }
    }
}
