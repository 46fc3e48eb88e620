//! HR database source implementation.
//!
//! `HrSource` holds a lazily created `PostgreSQL` pool and exposes the two
//! seams the pipeline consumes: `PersonSource` (change-set selection) and
//! `JobAccessSource` (the four access-artifact lookups). Both traits exist
//! so the pipeline can run against in-memory fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use embark_core::EmployeeId;

use crate::config::HrSourceConfig;
use crate::error::{HrError, HrResult};
use crate::records::{
    AccessArtifact, EmploymentStatus, JobMapping, PersonRecord, TrainingTrack,
};

/// Source of person records in scope for a run.
#[async_trait]
pub trait PersonSource: Send + Sync {
    /// Person records created within the lookback window, oldest first.
    async fn changed_within(&self, days: u32) -> HrResult<Vec<PersonRecord>>;

    /// Person records matching one employee ID (manual runs).
    async fn by_employee_id(&self, id: &EmployeeId) -> HrResult<Vec<PersonRecord>>;
}

/// Source of job-access mapping rows and artifact lookups.
#[async_trait]
pub trait JobAccessSource: Send + Sync {
    /// Job-mapping rows matching the person's (title, department) pair.
    async fn job_mappings(&self, title: &str, department: &str) -> HrResult<Vec<JobMapping>>;

    /// Access templates keyed by (title, job role).
    async fn templates(&self, title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>>;

    /// Sub-templates keyed by (title, job role).
    async fn subtemplates(&self, title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>>;

    /// Blueprints keyed by (title, job role).
    async fn blueprints(&self, title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>>;

    /// Training tracks keyed by job category.
    async fn training_tracks(&self, job_category: &str) -> HrResult<Vec<TrainingTrack>>;
}

/// Read-only HR database source.
pub struct HrSource {
    /// Configuration.
    config: HrSourceConfig,

    /// `PostgreSQL` connection pool (lazily initialized).
    pool: Arc<RwLock<Option<PgPool>>>,
}

impl std::fmt::Debug for HrSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HrSource")
            .field("config", &self.config.redacted())
            .finish()
    }
}

/// Raw person row as returned by the HR queries.
#[derive(Debug, FromRow)]
struct PersonRow {
    employee_id: String,
    first_name: String,
    middle_name: Option<String>,
    last_name: String,
    job_title: String,
    department: String,
    division: String,
    mailstop: String,
    supervisor_id: Option<String>,
    employment_status: String,
    contact_email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PersonRow> for PersonRecord {
    fn from(row: PersonRow) -> Self {
        PersonRecord {
            employee_id: EmployeeId::new(row.employee_id),
            first_name: row.first_name,
            middle_name: row.middle_name.filter(|m| !m.trim().is_empty()),
            last_name: row.last_name,
            job_title: row.job_title,
            department: row.department,
            division: row.division,
            mailstop: row.mailstop,
            supervisor_id: row.supervisor_id.map(EmployeeId::new),
            status: EmploymentStatus::parse(&row.employment_status),
            contact_email: row.contact_email.filter(|e| !e.trim().is_empty()),
            created_at: row.created_at,
        }
    }
}

/// Raw job-mapping row.
#[derive(Debug, FromRow)]
struct JobMappingRow {
    job_title: String,
    department: String,
    job_category: String,
    job_role: String,
}

/// Raw artifact row (shared by templates, sub-templates, blueprints).
#[derive(Debug, FromRow)]
struct ArtifactRow {
    id: String,
    name: String,
}

const PERSON_COLUMNS: &str = "employee_id, first_name, middle_name, last_name, job_title, \
     department, division, mailstop, supervisor_id, employment_status, \
     contact_email, created_at";

impl HrSource {
    /// Create a new HR source with the given configuration.
    pub fn new(config: HrSourceConfig) -> HrResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            pool: Arc::new(RwLock::new(None)),
        })
    }

    /// Get a connection pool, creating one if necessary.
    async fn get_pool(&self) -> HrResult<PgPool> {
        {
            let pool_guard = self.pool.read().await;
            if let Some(ref pool) = *pool_guard {
                return Ok(pool.clone());
            }
        }

        let pool = self.create_pool().await?;

        {
            let mut pool_guard = self.pool.write().await;
            *pool_guard = Some(pool.clone());
        }

        Ok(pool)
    }

    /// Create a new connection pool.
    async fn create_pool(&self) -> HrResult<PgPool> {
        let url = self.build_connection_url();

        debug!(host = %self.config.host, database = %self.config.database, "Connecting to HR database");

        let pool = PgPoolOptions::new()
            .max_connections(self.config.pool_size)
            .acquire_timeout(std::time::Duration::from_secs(
                self.config.connection_timeout_secs,
            ))
            .connect(&url)
            .await
            .map_err(|e| {
                HrError::connection_failed_with_source(
                    format!(
                        "Failed to connect to HR database at {}:{}",
                        self.config.host, self.config.port
                    ),
                    e,
                )
            })?;

        info!(
            host = %self.config.host,
            database = %self.config.database,
            "HR database connection pool established"
        );

        Ok(pool)
    }

    /// Build the connection URL for `SQLx`.
    fn build_connection_url(&self) -> String {
        let password = self.config.password.as_deref().unwrap_or("");

        let mut url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.config.username, password, self.config.host, self.config.port, self.config.database
        );

        url.push_str(&format!("?sslmode={}", self.config.ssl_mode.as_str()));

        if let Some(ref schema) = self.config.schema {
            url.push_str(&format!("&options=-c%20search_path={schema}"));
        }

        url
    }
}

#[async_trait]
impl PersonSource for HrSource {
    #[instrument(skip(self))]
    async fn changed_within(&self, days: u32) -> HrResult<Vec<PersonRecord>> {
        let pool = self.get_pool().await?;

        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM personnel \
             WHERE created_at >= NOW() - make_interval(days => $1) \
             ORDER BY created_at"
        );

        let rows: Vec<PersonRow> = sqlx::query_as(&sql)
            .bind(days as i32)
            .fetch_all(&pool)
            .await
            .map_err(|e| HrError::query_failed_with_source("personnel", e))?;

        info!(count = rows.len(), lookback_days = days, "Selected change set");

        Ok(rows.into_iter().map(PersonRecord::from).collect())
    }

    #[instrument(skip(self), fields(employee_id = %id))]
    async fn by_employee_id(&self, id: &EmployeeId) -> HrResult<Vec<PersonRecord>> {
        let pool = self.get_pool().await?;

        let sql = format!("SELECT {PERSON_COLUMNS} FROM personnel WHERE employee_id = $1");

        let rows: Vec<PersonRow> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .fetch_all(&pool)
            .await
            .map_err(|e| HrError::query_failed_with_source("personnel", e))?;

        Ok(rows.into_iter().map(PersonRecord::from).collect())
    }
}

#[async_trait]
impl JobAccessSource for HrSource {
    #[instrument(skip(self))]
    async fn job_mappings(&self, title: &str, department: &str) -> HrResult<Vec<JobMapping>> {
        let pool = self.get_pool().await?;

        let rows: Vec<JobMappingRow> = sqlx::query_as(
            "SELECT job_title, department, job_category, job_role \
             FROM job_mappings WHERE job_title = $1 AND department = $2",
        )
        .bind(title)
        .bind(department)
        .fetch_all(&pool)
        .await
        .map_err(|e| HrError::query_failed_with_source("job_mappings", e))?;

        Ok(rows
            .into_iter()
            .map(|r| JobMapping {
                job_title: r.job_title,
                department: r.department,
                job_category: r.job_category,
                job_role: r.job_role,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn templates(&self, title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>> {
        self.artifact_lookup("access_templates", "template_id", "template_name", title, job_role)
            .await
    }

    #[instrument(skip(self))]
    async fn subtemplates(&self, title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>> {
        self.artifact_lookup(
            "access_subtemplates",
            "subtemplate_id",
            "subtemplate_name",
            title,
            job_role,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn blueprints(&self, title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>> {
        self.artifact_lookup(
            "access_blueprints",
            "blueprint_id",
            "blueprint_name",
            title,
            job_role,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn training_tracks(&self, job_category: &str) -> HrResult<Vec<TrainingTrack>> {
        let pool = self.get_pool().await?;

        let rows: Vec<ArtifactRow> = sqlx::query_as(
            "SELECT track_id AS id, track_name AS name \
             FROM training_tracks WHERE job_category = $1 ORDER BY track_id",
        )
        .bind(job_category)
        .fetch_all(&pool)
        .await
        .map_err(|e| HrError::query_failed_with_source("training_tracks", e))?;

        Ok(rows
            .into_iter()
            .map(|r| TrainingTrack {
                id: r.id,
                name: r.name,
            })
            .collect())
    }
}

impl HrSource {
    /// Shared query shape for the three parallel artifact tables.
    async fn artifact_lookup(
        &self,
        table: &str,
        id_column: &str,
        name_column: &str,
        title: &str,
        job_role: &str,
    ) -> HrResult<Vec<AccessArtifact>> {
        let pool = self.get_pool().await?;

        let sql = format!(
            "SELECT {id_column} AS id, {name_column} AS name \
             FROM {table} WHERE job_title = $1 AND job_role = $2 ORDER BY {id_column}"
        );

        let rows: Vec<ArtifactRow> = sqlx::query_as(&sql)
            .bind(title)
            .bind(job_role)
            .fetch_all(&pool)
            .await
            .map_err(|e| HrError::query_failed_with_source(table, e))?;

        Ok(rows
            .into_iter()
            .map(|r| AccessArtifact {
                id: r.id,
                name: r.name,
            })
            .collect())
    }
}
