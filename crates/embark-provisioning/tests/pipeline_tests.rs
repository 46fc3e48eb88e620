//! End-to-end pipeline tests over in-memory sources and a counting
//! directory mock.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;
use uuid::Uuid;

use embark_core::EmployeeId;
use embark_directory::{
    AccountOp, AccountRequest, Connector, ContainerOp, CreatedAccount, DirectoryResult, GroupOp,
};
use embark_hr::{
    AccessArtifact, EmploymentStatus, HrResult, JobAccessSource, JobMapping, PersonRecord,
    PersonSource, TrainingTrack,
};
use embark_provisioning::{DedupCache, IdentityDeriver, OnboardingPipeline, RunSelection};

/// In-memory person source.
struct FakePersons {
    people: Vec<PersonRecord>,
}

#[async_trait]
impl PersonSource for FakePersons {
    async fn changed_within(&self, _days: u32) -> HrResult<Vec<PersonRecord>> {
        Ok(self.people.clone())
    }

    async fn by_employee_id(&self, id: &EmployeeId) -> HrResult<Vec<PersonRecord>> {
        Ok(self
            .people
            .iter()
            .filter(|p| &p.employee_id == id)
            .cloned()
            .collect())
    }
}

/// In-memory job-access source.
#[derive(Default)]
struct FakeAccess {
    mappings: Vec<JobMapping>,
}

#[async_trait]
impl JobAccessSource for FakeAccess {
    async fn job_mappings(&self, title: &str, department: &str) -> HrResult<Vec<JobMapping>> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| m.job_title == title && m.department == department)
            .cloned()
            .collect())
    }

    async fn templates(&self, _title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>> {
        Ok(vec![AccessArtifact {
            id: format!("T-{job_role}"),
            name: format!("{job_role} template"),
        }])
    }

    async fn subtemplates(&self, _title: &str, _job_role: &str) -> HrResult<Vec<AccessArtifact>> {
        Ok(vec![])
    }

    async fn blueprints(&self, _title: &str, job_role: &str) -> HrResult<Vec<AccessArtifact>> {
        Ok(vec![AccessArtifact {
            id: format!("B-{job_role}"),
            name: format!("{job_role} blueprint"),
        }])
    }

    async fn training_tracks(&self, job_category: &str) -> HrResult<Vec<TrainingTrack>> {
        Ok(vec![TrainingTrack {
            id: format!("TR-{job_category}"),
            name: format!("{job_category} orientation"),
        }])
    }
}

/// Directory mock that counts every provisioning call.
#[derive(Default)]
struct CountingDirectory {
    containers: Mutex<HashSet<String>>,
    create_calls: AtomicUsize,
    group_calls: AtomicUsize,
    manager_calls: AtomicUsize,
    fail_group_adds: bool,
}

#[async_trait]
impl Connector for CountingDirectory {
    fn display_name(&self) -> &str {
        "counting"
    }

    async fn test_connection(&self) -> DirectoryResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ContainerOp for CountingDirectory {
    fn container_dn(&self, department: &str) -> String {
        format!("OU={department},OU=Staff,DC=corp,DC=example,DC=org")
    }

    async fn container_exists(&self, department: &str) -> DirectoryResult<bool> {
        Ok(self
            .containers
            .lock()
            .unwrap()
            .contains(&self.container_dn(department)))
    }

    async fn create_container(&self, department: &str) -> DirectoryResult<String> {
        let dn = self.container_dn(department);
        self.containers.lock().unwrap().insert(dn.clone());
        Ok(dn)
    }
}

#[async_trait]
impl AccountOp for CountingDirectory {
    async fn create_account(&self, request: &AccountRequest) -> DirectoryResult<CreatedAccount> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedAccount {
            dn: format!("CN={},{}", request.display_name, request.container_dn),
            guid: Uuid::new_v4(),
        })
    }

    async fn set_manager(&self, _account_dn: &str, _manager_dn: &str) -> DirectoryResult<()> {
        self.manager_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_account_by_employee_id(
        &self,
        employee_id: &str,
    ) -> DirectoryResult<Option<String>> {
        Ok(Some(format!("CN=Supervisor {employee_id},OU=Staff,DC=x")))
    }
}

#[async_trait]
impl GroupOp for CountingDirectory {
    async fn add_member(&self, group_dn: &str, _member_dn: &str) -> DirectoryResult<()> {
        self.group_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_group_adds {
            return Err(embark_directory::DirectoryError::ObjectNotFound {
                identifier: group_dn.to_string(),
            });
        }
        Ok(())
    }
}

fn mary_ann() -> PersonRecord {
    PersonRecord {
        employee_id: EmployeeId::new("12345"),
        first_name: "Mary-Ann".to_string(),
        middle_name: None,
        last_name: "O'Brien".to_string(),
        job_title: "Nurse".to_string(),
        department: "ICU".to_string(),
        division: "Inpatient".to_string(),
        mailstop: String::new(),
        supervisor_id: Some(EmployeeId::new("54321")),
        status: EmploymentStatus::Active,
        contact_email: None,
        created_at: Utc::now(),
    }
}

fn supervisor() -> PersonRecord {
    PersonRecord {
        employee_id: EmployeeId::new("54321"),
        first_name: "Pat".to_string(),
        middle_name: None,
        last_name: "Quinn".to_string(),
        job_title: "Charge Nurse".to_string(),
        department: "ICU".to_string(),
        division: "Inpatient".to_string(),
        mailstop: "MS-200".to_string(),
        supervisor_id: None,
        status: EmploymentStatus::Active,
        contact_email: Some("pat.quinn@corp.example.org".to_string()),
        created_at: Utc::now() - chrono::Duration::days(400),
    }
}

fn nurse_mapping() -> JobMapping {
    JobMapping {
        job_title: "Nurse".to_string(),
        department: "ICU".to_string(),
        job_category: "Clinical".to_string(),
        job_role: "RN".to_string(),
    }
}

fn cache_in(dir: &TempDir) -> DedupCache {
    DedupCache::open(&dir.path().join("processed.txt"), 2).unwrap()
}

fn baseline_groups() -> Vec<String> {
    vec!["CN=All Staff,OU=Groups,DC=x".to_string()]
}

#[tokio::test]
async fn test_end_to_end_derivation_and_reports() {
    let persons = FakePersons {
        people: vec![mary_ann()],
    };
    let access = FakeAccess::default(); // no mapping rows
    let directory = CountingDirectory::default();
    let dir = TempDir::new().unwrap();

    let mut pipeline = OnboardingPipeline::new(
        &persons,
        &access,
        &directory,
        IdentityDeriver::new("corp.example.org"),
        baseline_groups(),
        cache_in(&dir),
    );

    let (batch, summary) = pipeline
        .run(&RunSelection::Window { days: 14 })
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 0);

    // Hyphen and apostrophe stripped, five-char surname prefix, ID suffix
    assert_eq!(batch.user.len(), 1);
    assert_eq!(batch.user[0].username, "MOBrie45");
    assert_eq!(batch.user[0].email, "MOBrie45@corp.example.org");

    // No job-mapping match: zero access and training rows, user/HR/manager
    // rows still present
    assert!(batch.access.is_empty());
    assert!(batch.training.is_empty());
    assert_eq!(batch.hr.len(), 1);
    assert_eq!(batch.manager.len(), 1);

    assert_eq!(directory.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_matched_person_gets_flat_access_rows() {
    let persons = FakePersons {
        people: vec![mary_ann(), supervisor()],
    };
    let access = FakeAccess {
        mappings: vec![nurse_mapping()],
    };
    let directory = CountingDirectory::default();
    let dir = TempDir::new().unwrap();

    let mut pipeline = OnboardingPipeline::new(
        &persons,
        &access,
        &directory,
        IdentityDeriver::new("corp.example.org"),
        baseline_groups(),
        cache_in(&dir),
    );

    let (batch, summary) = pipeline
        .run(&RunSelection::Single {
            employee_id: EmployeeId::new("12345"),
        })
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);

    // One template row and one blueprint row, GUID-keyed, blanks crossed
    assert_eq!(batch.access.len(), 2);
    let template_row = batch
        .access
        .iter()
        .find(|r| !r.template_id.is_empty())
        .unwrap();
    assert_eq!(template_row.template_id, "T-RN");
    assert!(template_row.blueprint_id.is_empty());

    assert_eq!(batch.training.len(), 1);
    assert_eq!(batch.training[0].tracks[0], "Clinical orientation");

    // Supervisor address resolved from their HR record
    assert_eq!(
        batch.manager[0].supervisor_email.as_deref(),
        Some("pat.quinn@corp.example.org")
    );
    assert_eq!(directory.manager_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cached_person_is_fully_skipped() {
    let persons = FakePersons {
        people: vec![mary_ann()],
    };
    let access = FakeAccess::default();
    let directory = CountingDirectory::default();
    let dir = TempDir::new().unwrap();

    let mut cache = cache_in(&dir);
    cache.record(&EmployeeId::new("12345")).unwrap();

    let mut pipeline = OnboardingPipeline::new(
        &persons,
        &access,
        &directory,
        IdentityDeriver::new("corp.example.org"),
        baseline_groups(),
        cache,
    );

    let (batch, summary) = pipeline
        .run(&RunSelection::Window { days: 14 })
        .await
        .unwrap();

    // Zero directory calls and zero report rows for a cached ID
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 0);
    assert!(batch.is_empty());
    assert_eq!(directory.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(directory.group_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_double_run_is_idempotent() {
    let persons = FakePersons {
        people: vec![mary_ann(), supervisor()],
    };
    let access = FakeAccess {
        mappings: vec![nurse_mapping()],
    };
    let directory = CountingDirectory::default();
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("processed.txt");

    for run in 0..2 {
        let mut pipeline = OnboardingPipeline::new(
            &persons,
            &access,
            &directory,
            IdentityDeriver::new("corp.example.org"),
            baseline_groups(),
            DedupCache::open(&cache_path, 2).unwrap(),
        );

        let (_, summary) = pipeline
            .run(&RunSelection::Window { days: 14 })
            .await
            .unwrap();

        if run == 0 {
            assert_eq!(summary.processed, 2);
        } else {
            assert_eq!(summary.processed, 0);
            assert_eq!(summary.skipped, 2);
        }
    }

    // Same unchanged window, unexpired cache: no new accounts on run two
    assert_eq!(directory.create_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_expired_cache_forgets_everyone() {
    let persons = FakePersons {
        people: vec![mary_ann()],
    };
    let access = FakeAccess::default();
    let directory = CountingDirectory::default();
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("processed.txt");

    // A store created three days ago already containing the person
    let stale = Utc::now() - chrono::Duration::days(3);
    std::fs::write(
        &cache_path,
        format!("#created={}\n12345\n", stale.to_rfc3339()),
    )
    .unwrap();

    let mut pipeline = OnboardingPipeline::new(
        &persons,
        &access,
        &directory,
        IdentityDeriver::new("corp.example.org"),
        baseline_groups(),
        DedupCache::open(&cache_path, 2).unwrap(),
    );

    let (_, summary) = pipeline
        .run(&RunSelection::Window { days: 14 })
        .await
        .unwrap();

    // The wholesale reset treats every ID as unseen again
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(directory.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_terminated_person_provisioned_but_filtered_from_reports() {
    let mut terminated = mary_ann();
    terminated.status = EmploymentStatus::Terminated;

    let persons = FakePersons {
        people: vec![terminated],
    };
    let access = FakeAccess {
        mappings: vec![nurse_mapping()],
    };
    let directory = CountingDirectory::default();
    let dir = TempDir::new().unwrap();

    let mut pipeline = OnboardingPipeline::new(
        &persons,
        &access,
        &directory,
        IdentityDeriver::new("corp.example.org"),
        baseline_groups(),
        cache_in(&dir),
    );

    let (batch, summary) = pipeline
        .run(&RunSelection::Window { days: 14 })
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert!(batch.user.is_empty());
    assert!(batch.hr.is_empty());
    assert!(batch.manager.is_empty());
    // Access rows are emitted regardless of status
    assert_eq!(batch.access.len(), 2);
}

#[tokio::test]
async fn test_group_failure_yields_partial_not_abort() {
    let persons = FakePersons {
        people: vec![mary_ann(), supervisor()],
    };
    let access = FakeAccess::default();
    let directory = CountingDirectory {
        fail_group_adds: true,
        ..Default::default()
    };
    let dir = TempDir::new().unwrap();

    let mut pipeline = OnboardingPipeline::new(
        &persons,
        &access,
        &directory,
        IdentityDeriver::new("corp.example.org"),
        baseline_groups(),
        cache_in(&dir),
    );

    let (batch, summary) = pipeline
        .run(&RunSelection::Window { days: 14 })
        .await
        .unwrap();

    // Both people processed despite every group add failing
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.partial, 2);
    assert_eq!(batch.user.len(), 2);
}
