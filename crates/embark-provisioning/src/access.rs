//! Job-access resolution.
//!
//! The four-stage chained lookup that turns a person's (title, department)
//! pair into clinical-system access artifacts:
//!
//! 1. Match job-mapping rows on title and department; collapse exact
//!    duplicates.
//! 2. Per distinct match, resolve access templates by (title, job role).
//! 3. Resolve sub-templates by the same key.
//! 4. Resolve blueprints by the same key.
//! 5. Resolve training tracks by job category — the one soft lookup:
//!    a query failure here is logged and yields an empty list instead of
//!    aborting the run.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use embark_hr::{
    AccessArtifact, HrResult, JobAccessSource, JobMapping, PersonRecord, TrainingTrack,
};

/// Everything resolved for one distinct job-mapping match.
///
/// Templates, sub-templates, and blueprints are structurally parallel
/// collections; each is reported as independent flattened rows rather than
/// a nested tree.
#[derive(Debug, Clone)]
pub struct JobAccessMatch {
    /// The matched mapping row.
    pub mapping: JobMapping,

    /// Access templates for this match.
    pub templates: Vec<AccessArtifact>,

    /// Sub-templates for this match.
    pub subtemplates: Vec<AccessArtifact>,

    /// Blueprints for this match.
    pub blueprints: Vec<AccessArtifact>,

    /// Training tracks for this match's job category.
    pub training: Vec<TrainingTrack>,
}

/// The result of matching one person against the job-mapping tables.
#[derive(Debug, Clone, Default)]
pub struct JobAccessMap {
    /// One entry per distinct matched mapping row; empty when the person's
    /// (title, department) pair matches nothing.
    pub matches: Vec<JobAccessMatch>,
}

impl JobAccessMap {
    /// Whether the person matched no mapping rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Distinct training track names across all matches, in first-seen order.
    #[must_use]
    pub fn training_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for track in self.matches.iter().flat_map(|m| m.training.iter()) {
            if seen.insert(track.name.clone()) {
                names.push(track.name.clone());
            }
        }
        names
    }
}

/// Resolves a person's access artifacts from the job-mapping tables.
pub struct JobAccessResolver<'a, S: JobAccessSource> {
    source: &'a S,
}

impl<'a, S: JobAccessSource> JobAccessResolver<'a, S> {
    /// Create a resolver over the given source.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Run the four-stage lookup for one person.
    ///
    /// # Errors
    /// Job-mapping, template, sub-template, and blueprint query failures
    /// are fatal and propagate. Training-track failures are logged and
    /// produce an empty list for the affected match.
    #[instrument(skip(self, person), fields(employee_id = %person.employee_id))]
    pub async fn resolve(&self, person: &PersonRecord) -> HrResult<JobAccessMap> {
        let rows = self
            .source
            .job_mappings(&person.job_title, &person.department)
            .await?;

        // Collapse exact-duplicate rows, preserving first-seen order
        let mut seen = HashSet::new();
        let distinct: Vec<JobMapping> = rows
            .into_iter()
            .filter(|row| seen.insert(row.clone()))
            .collect();

        if distinct.is_empty() {
            debug!(
                title = %person.job_title,
                department = %person.department,
                "No job-mapping rows matched"
            );
            return Ok(JobAccessMap::default());
        }

        let mut matches = Vec::with_capacity(distinct.len());

        for mapping in distinct {
            let templates = self
                .source
                .templates(&mapping.job_title, &mapping.job_role)
                .await?;
            let subtemplates = self
                .source
                .subtemplates(&mapping.job_title, &mapping.job_role)
                .await?;
            let blueprints = self
                .source
                .blueprints(&mapping.job_title, &mapping.job_role)
                .await?;

            let training = match self.source.training_tracks(&mapping.job_category).await {
                Ok(tracks) => tracks,
                Err(e) => {
                    warn!(
                        job_category = %mapping.job_category,
                        error = %e,
                        "Training-track lookup failed; continuing without tracks"
                    );
                    Vec::new()
                }
            };

            debug!(
                job_role = %mapping.job_role,
                templates = templates.len(),
                subtemplates = subtemplates.len(),
                blueprints = blueprints.len(),
                training = training.len(),
                "Resolved job-access match"
            );

            matches.push(JobAccessMatch {
                mapping,
                templates,
                subtemplates,
                blueprints,
                training,
            });
        }

        Ok(JobAccessMap { matches })
    }
}
