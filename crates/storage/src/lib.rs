use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError, sqlite::SqlitePoolOptions, Row, Sqlite, SqlitePool, Transaction,
};
use thiserror::Error;

use laborlink_core::types::{Job, JobPatch, JobStatus, Laborer, LaborerPatch};

/// Rows returned by unbounded list reads are capped at this many, the
/// documented truncation point of the marketplace API.
pub const LIST_LIMIT: i64 = 1000;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on laborer records.
    pub fn laborers(&self) -> LaborerRepository {
        LaborerRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle to operate on job records and their assignment sets.
    pub fn jobs(&self) -> JobRepository {
        JobRepository {
            pool: self.pool.clone(),
        }
    }

    /// Begins a SQLite transaction for multi-record workflows.
    pub async fn begin(&self) -> Result<Transaction<'_, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors for operations on laborer records.
#[derive(Debug, Error)]
pub enum LaborerStoreError {
    #[error("a laborer with this phone number already exists")]
    DuplicatePhone,
    #[error("laborer not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for LaborerStoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

/// Errors for operations on job records.
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("job not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for JobStoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

// SQLite extended error code for UNIQUE constraint violations.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

fn map_unique_violation(err: sqlx::Error) -> LaborerStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_UNIQUE) {
                LaborerStoreError::DuplicatePhone
            } else {
                LaborerStoreError::Database(sqlx::Error::Database(db_err))
            }
        }
        other => LaborerStoreError::Database(other),
    }
}

/// Repository for laborer records.
#[derive(Clone)]
pub struct LaborerRepository {
    pool: SqlitePool,
}

impl LaborerRepository {
    /// Inserts a fully-formed laborer record. A phone collision with an
    /// existing record maps to [`LaborerStoreError::DuplicatePhone`].
    pub async fn insert(&self, laborer: &Laborer) -> Result<(), LaborerStoreError> {
        sqlx::query(
            "INSERT INTO laborers \
             (id, name, phone, skill, location, language, available, registered_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&laborer.id)
        .bind(&laborer.name)
        .bind(&laborer.phone)
        .bind(&laborer.skill)
        .bind(&laborer.location)
        .bind(&laborer.language)
        .bind(laborer.available as i64)
        .bind(to_rfc3339(laborer.registered_at))
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    /// Fetches a laborer by identifier.
    pub async fn fetch(&self, id: &str) -> Result<Laborer, LaborerStoreError> {
        let row = sqlx::query_as::<_, LaborerRow>(
            "SELECT id, name, phone, skill, location, language, available, registered_at \
             FROM laborers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LaborerStoreError::NotFound)?;

        Ok(row.into_domain())
    }

    /// Lists all laborers, capped at [`LIST_LIMIT`] rows.
    pub async fn list(&self) -> Result<Vec<Laborer>, LaborerStoreError> {
        let rows = sqlx::query_as::<_, LaborerRow>(
            "SELECT id, name, phone, skill, location, language, available, registered_at \
             FROM laborers ORDER BY registered_at LIMIT ?",
        )
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LaborerRow::into_domain).collect())
    }

    /// Lists laborers whose skill matches exactly, capped at [`LIST_LIMIT`].
    pub async fn list_by_skill(&self, skill: &str) -> Result<Vec<Laborer>, LaborerStoreError> {
        let rows = sqlx::query_as::<_, LaborerRow>(
            "SELECT id, name, phone, skill, location, language, available, registered_at \
             FROM laborers WHERE skill = ? ORDER BY registered_at LIMIT ?",
        )
        .bind(skill)
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LaborerRow::into_domain).collect())
    }

    /// Applies a partial update: only the fields present in the patch
    /// change, the rest are carried over from the stored record.
    pub async fn update(
        &self,
        id: &str,
        patch: &LaborerPatch,
    ) -> Result<Laborer, LaborerStoreError> {
        let mut laborer = self.fetch(id).await?;

        if let Some(name) = &patch.name {
            laborer.name = name.clone();
        }
        if let Some(phone) = &patch.phone {
            laborer.phone = phone.clone();
        }
        if let Some(skill) = &patch.skill {
            laborer.skill = skill.clone();
        }
        if let Some(location) = &patch.location {
            laborer.location = location.clone();
        }
        if let Some(language) = &patch.language {
            laborer.language = language.clone();
        }
        if let Some(available) = patch.available {
            laborer.available = available;
        }

        sqlx::query(
            "UPDATE laborers \
             SET name = ?, phone = ?, skill = ?, location = ?, language = ?, available = ? \
             WHERE id = ?",
        )
        .bind(&laborer.name)
        .bind(&laborer.phone)
        .bind(&laborer.skill)
        .bind(&laborer.location)
        .bind(&laborer.language)
        .bind(laborer.available as i64)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(laborer)
    }

    /// Deletes a laborer unconditionally. Jobs referencing the phone in
    /// their assignment sets are not touched; that gap is inherited
    /// from the source system.
    pub async fn delete(&self, id: &str) -> Result<(), LaborerStoreError> {
        let result = sqlx::query("DELETE FROM laborers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LaborerStoreError::NotFound);
        }
        Ok(())
    }

    /// Resolves a phone number inside a transaction, returning the
    /// laborer when one exists.
    pub async fn fetch_by_phone_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        phone: &str,
    ) -> Result<Option<Laborer>, LaborerStoreError> {
        let row = sqlx::query_as::<_, LaborerRow>(
            "SELECT id, name, phone, skill, location, language, available, registered_at \
             FROM laborers WHERE phone = ?",
        )
        .bind(phone)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(LaborerRow::into_domain))
    }

    /// Flips the availability flag for a phone number inside a transaction.
    pub async fn set_available_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        phone: &str,
        available: bool,
    ) -> Result<(), LaborerStoreError> {
        sqlx::query("UPDATE laborers SET available = ? WHERE phone = ?")
            .bind(available as i64)
            .bind(phone)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

/// Laborer row as stored.
#[derive(Debug, sqlx::FromRow)]
struct LaborerRow {
    id: String,
    name: String,
    phone: String,
    skill: String,
    location: String,
    language: String,
    available: i64,
    registered_at: DateTime<Utc>,
}

impl LaborerRow {
    fn into_domain(self) -> Laborer {
        Laborer {
            id: self.id,
            name: self.name,
            phone: self.phone,
            skill: self.skill,
            location: self.location,
            language: self.language,
            available: self.available != 0,
            registered_at: self.registered_at,
        }
    }
}

/// Repository for job records and their assignment sets.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    /// Inserts a fully-formed job record. The assignment set of a new
    /// job is empty, so only the jobs table is written.
    pub async fn insert(&self, job: &Job) -> Result<(), JobStoreError> {
        sqlx::query(
            "INSERT INTO jobs \
             (job_id, title, description, skill_required, location, date, time, contact_number, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&job.job_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.skill_required)
        .bind(&job.location)
        .bind(&job.date)
        .bind(&job.time)
        .bind(&job.contact_number)
        .bind(job.status.as_str())
        .bind(to_rfc3339(job.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a job by identifier with its assignment set loaded.
    pub async fn fetch(&self, job_id: &str) -> Result<Job, JobStoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            "SELECT job_id, title, description, skill_required, location, date, time, contact_number, status, created_at \
             FROM jobs WHERE job_id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(JobStoreError::NotFound)?;

        let assigned = self.assignments(job_id).await?;
        Ok(row.into_domain(assigned))
    }

    /// Lists all jobs, capped at [`LIST_LIMIT`] rows.
    pub async fn list(&self) -> Result<Vec<Job>, JobStoreError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT job_id, title, description, skill_required, location, date, time, contact_number, status, created_at \
             FROM jobs ORDER BY created_at LIMIT ?",
        )
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        self.with_assignments(rows).await
    }

    /// Lists jobs whose required skill matches exactly.
    pub async fn list_by_skill(&self, skill: &str) -> Result<Vec<Job>, JobStoreError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT job_id, title, description, skill_required, location, date, time, contact_number, status, created_at \
             FROM jobs WHERE skill_required = ? ORDER BY created_at LIMIT ?",
        )
        .bind(skill)
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        self.with_assignments(rows).await
    }

    async fn with_assignments(&self, rows: Vec<JobRow>) -> Result<Vec<Job>, JobStoreError> {
        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let assigned = self.assignments(&row.job_id).await?;
            jobs.push(row.into_domain(assigned));
        }
        Ok(jobs)
    }

    /// Returns the assignment set for a job, ordered for stable output.
    pub async fn assignments(&self, job_id: &str) -> Result<Vec<String>, JobStoreError> {
        let rows = sqlx::query(
            "SELECT phone FROM job_assignments WHERE job_id = ? ORDER BY phone",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("phone")).collect())
    }

    /// Applies a partial update with the same merge semantics as the
    /// laborer update. A supplied status is written without any
    /// transition guard.
    pub async fn update(&self, job_id: &str, patch: &JobPatch) -> Result<Job, JobStoreError> {
        let mut job = self.fetch(job_id).await?;

        if let Some(title) = &patch.title {
            job.title = title.clone();
        }
        if let Some(description) = &patch.description {
            job.description = description.clone();
        }
        if let Some(skill_required) = &patch.skill_required {
            job.skill_required = skill_required.clone();
        }
        if let Some(location) = &patch.location {
            job.location = location.clone();
        }
        if let Some(date) = &patch.date {
            job.date = date.clone();
        }
        if let Some(time) = &patch.time {
            job.time = time.clone();
        }
        if let Some(contact_number) = &patch.contact_number {
            job.contact_number = contact_number.clone();
        }
        if let Some(status) = patch.status {
            job.status = status;
        }

        sqlx::query(
            "UPDATE jobs \
             SET title = ?, description = ?, skill_required = ?, location = ?, date = ?, time = ?, contact_number = ?, status = ? \
             WHERE job_id = ?",
        )
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.skill_required)
        .bind(&job.location)
        .bind(&job.date)
        .bind(&job.time)
        .bind(&job.contact_number)
        .bind(job.status.as_str())
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        Ok(job)
    }

    /// Fetches a job inside a transaction without its assignment set.
    pub async fn fetch_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        job_id: &str,
    ) -> Result<Option<Job>, JobStoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            "SELECT job_id, title, description, skill_required, location, date, time, contact_number, status, created_at \
             FROM jobs WHERE job_id = ?",
        )
        .bind(job_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|row| row.into_domain(Vec::new())))
    }

    /// Returns the assignment set for a job inside a transaction.
    pub async fn assignments_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        job_id: &str,
    ) -> Result<Vec<String>, JobStoreError> {
        let rows = sqlx::query(
            "SELECT phone FROM job_assignments WHERE job_id = ? ORDER BY phone",
        )
        .bind(job_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("phone")).collect())
    }

    /// Merges phone numbers into a job's assignment set. The composite
    /// primary key plus `ON CONFLICT DO NOTHING` yields set-union
    /// semantics, so re-assigning an overlapping list cannot
    /// accumulate duplicates.
    pub async fn add_assignments_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        job_id: &str,
        phones: &[String],
        assigned_at: DateTime<Utc>,
    ) -> Result<(), JobStoreError> {
        for phone in phones {
            sqlx::query(
                "INSERT INTO job_assignments (job_id, phone, assigned_at) \
                 VALUES (?, ?, ?) \
                 ON CONFLICT(job_id, phone) DO NOTHING",
            )
            .bind(job_id)
            .bind(phone)
            .bind(to_rfc3339(assigned_at))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Sets the job status inside a transaction.
    pub async fn set_status_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        job_id: &str,
        status: JobStatus,
    ) -> Result<(), JobStoreError> {
        sqlx::query("UPDATE jobs SET status = ? WHERE job_id = ?")
            .bind(status.as_str())
            .bind(job_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Deletes a job inside a transaction; assignment rows cascade.
    pub async fn delete_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        job_id: &str,
    ) -> Result<(), JobStoreError> {
        let result = sqlx::query("DELETE FROM jobs WHERE job_id = ?")
            .bind(job_id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(JobStoreError::NotFound);
        }
        Ok(())
    }
}

/// Job row as stored, without the assignment set.
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    job_id: String,
    title: String,
    description: String,
    skill_required: String,
    location: String,
    date: String,
    time: String,
    contact_number: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl JobRow {
    fn into_domain(self, assigned_laborers: Vec<String>) -> Job {
        let status = match self.status.as_str() {
            "open" => JobStatus::Open,
            "assigned" => JobStatus::Assigned,
            "completed" => JobStatus::Completed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Open,
        };
        Job {
            job_id: self.job_id,
            title: self.title,
            description: self.description,
            skill_required: self.skill_required,
            location: self.location,
            date: self.date,
            time: self.time,
            contact_number: self.contact_number,
            status,
            assigned_laborers,
            created_at: self.created_at,
        }
    }
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn setup_db(tag: &str) -> Database {
        let url = format!("sqlite:file:{tag}?mode=memory&cache=shared");
        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    fn laborer(phone: &str) -> Laborer {
        Laborer {
            id: Uuid::new_v4().to_string(),
            name: "Raju".to_string(),
            phone: phone.to_string(),
            skill: "mason".to_string(),
            location: "Delhi".to_string(),
            language: "hindi".to_string(),
            available: true,
            registered_at: Utc::now(),
        }
    }

    fn job() -> Job {
        Job {
            job_id: Uuid::new_v4().to_string(),
            title: "Build wall".to_string(),
            description: "Two day masonry project".to_string(),
            skill_required: "mason".to_string(),
            location: "Delhi".to_string(),
            date: "2025-07-15".to_string(),
            time: "08:00".to_string(),
            contact_number: "+919876543211".to_string(),
            status: JobStatus::Open,
            assigned_laborers: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_phone_maps_to_typed_error() {
        let db = setup_db("storage-dup-phone").await;
        let repo = db.laborers();

        repo.insert(&laborer("+919876543210")).await.expect("first insert");
        let err = repo.insert(&laborer("+919876543210")).await.unwrap_err();
        assert!(matches!(err, LaborerStoreError::DuplicatePhone));
    }

    #[tokio::test]
    async fn fetch_missing_laborer_is_not_found() {
        let db = setup_db("storage-missing-laborer").await;
        let err = db.laborers().fetch("no-such-id").await.unwrap_err();
        assert!(matches!(err, LaborerStoreError::NotFound));
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_intact() {
        let db = setup_db("storage-partial-update").await;
        let repo = db.laborers();
        let original = laborer("+919876543210");
        repo.insert(&original).await.expect("insert");

        let patch = LaborerPatch {
            available: Some(false),
            ..LaborerPatch::default()
        };
        let updated = repo.update(&original.id, &patch).await.expect("update");

        assert!(!updated.available);
        assert_eq!(updated.name, original.name);
        assert_eq!(updated.phone, original.phone);
        assert_eq!(updated.skill, original.skill);
        assert_eq!(updated.location, original.location);
        assert_eq!(updated.language, original.language);
    }

    #[tokio::test]
    async fn update_to_colliding_phone_is_duplicate() {
        let db = setup_db("storage-update-collision").await;
        let repo = db.laborers();
        let first = laborer("+919876543210");
        let second = laborer("+919876543211");
        repo.insert(&first).await.expect("insert first");
        repo.insert(&second).await.expect("insert second");

        let patch = LaborerPatch {
            phone: Some(first.phone.clone()),
            ..LaborerPatch::default()
        };
        let err = repo.update(&second.id, &patch).await.unwrap_err();
        assert!(matches!(err, LaborerStoreError::DuplicatePhone));
    }

    #[tokio::test]
    async fn delete_missing_laborer_is_not_found() {
        let db = setup_db("storage-delete-missing").await;
        let err = db.laborers().delete("no-such-id").await.unwrap_err();
        assert!(matches!(err, LaborerStoreError::NotFound));
    }

    #[tokio::test]
    async fn list_by_skill_filters_exactly() {
        let db = setup_db("storage-skill-filter").await;
        let repo = db.laborers();
        let mut mason = laborer("+919876543210");
        mason.skill = "mason".to_string();
        let mut carpenter = laborer("+919876543211");
        carpenter.skill = "carpenter".to_string();
        repo.insert(&mason).await.expect("insert mason");
        repo.insert(&carpenter).await.expect("insert carpenter");

        let masons = repo.list_by_skill("mason").await.expect("list");
        assert_eq!(masons.len(), 1);
        assert_eq!(masons[0].id, mason.id);

        // No case normalization at this layer.
        let upper = repo.list_by_skill("Mason").await.expect("list");
        assert!(upper.is_empty());
    }

    #[tokio::test]
    async fn job_round_trips_with_empty_assignment_set() {
        let db = setup_db("storage-job-roundtrip").await;
        let repo = db.jobs();
        let posted = job();
        repo.insert(&posted).await.expect("insert");

        let fetched = repo.fetch(&posted.job_id).await.expect("fetch");
        assert_eq!(fetched.status, JobStatus::Open);
        assert!(fetched.assigned_laborers.is_empty());
        assert_eq!(fetched.title, posted.title);
    }

    #[tokio::test]
    async fn assignment_merge_deduplicates() {
        let db = setup_db("storage-assign-dedup").await;
        let repo = db.jobs();
        let posted = job();
        repo.insert(&posted).await.expect("insert");

        let phones = vec!["+911111111111".to_string(), "+912222222222".to_string()];
        let mut tx = db.begin().await.expect("begin");
        repo.add_assignments_tx(&mut tx, &posted.job_id, &phones, Utc::now())
            .await
            .expect("first merge");
        repo.add_assignments_tx(&mut tx, &posted.job_id, &phones, Utc::now())
            .await
            .expect("second merge");
        tx.commit().await.expect("commit");

        let assigned = repo.assignments(&posted.job_id).await.expect("assignments");
        assert_eq!(assigned, phones);
    }

    #[tokio::test]
    async fn deleting_job_cascades_assignment_rows() {
        let db = setup_db("storage-delete-cascade").await;
        let repo = db.jobs();
        let posted = job();
        repo.insert(&posted).await.expect("insert");

        let phones = vec!["+911111111111".to_string()];
        let mut tx = db.begin().await.expect("begin");
        repo.add_assignments_tx(&mut tx, &posted.job_id, &phones, Utc::now())
            .await
            .expect("merge");
        repo.delete_tx(&mut tx, &posted.job_id).await.expect("delete");
        tx.commit().await.expect("commit");

        let err = repo.fetch(&posted.job_id).await.unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound));

        let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_assignments")
            .fetch_one(db.pool())
            .await
            .expect("count");
        assert_eq!(rows.0, 0);
    }

    #[tokio::test]
    async fn status_update_has_no_transition_guard() {
        let db = setup_db("storage-status-unguarded").await;
        let repo = db.jobs();
        let posted = job();
        repo.insert(&posted).await.expect("insert");

        let patch = JobPatch {
            status: Some(JobStatus::Completed),
            ..JobPatch::default()
        };
        let updated = repo.update(&posted.job_id, &patch).await.expect("update");
        assert_eq!(updated.status, JobStatus::Completed);

        // Terminal states are not enforced as terminal.
        let patch = JobPatch {
            status: Some(JobStatus::Open),
            ..JobPatch::default()
        };
        let updated = repo.update(&posted.job_id, &patch).await.expect("update");
        assert_eq!(updated.status, JobStatus::Open);
    }

    #[tokio::test]
    async fn file_database_runs_in_wal_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .expect("pragma");
        assert_eq!(mode.0, "wal");
    }

    #[tokio::test]
    async fn migrations_apply() {
        let db = setup_db("storage-migrations").await;
        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('laborers', 'jobs', 'job_assignments')",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 3);
    }
}
