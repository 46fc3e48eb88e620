//! # Embark Provisioning Pipeline
//!
//! The per-person identity resolution and provisioning sequence:
//!
//! ```text
//! ┌──────────────┐    ┌─────────────┐    ┌──────────────┐
//! │  Change-Set  │───►│ Dedup Cache │───►│   Identity   │
//! │   Selector   │    │   (skip?)   │    │   Deriver    │
//! └──────────────┘    └─────────────┘    └──────┬───────┘
//!                                               │
//!                     ┌─────────────┐    ┌──────▼───────┐
//!                     │   Report    │◄───│  Job-Access  │
//!                     │ Classifier  │    │   Resolver   │
//!                     └──────▲──────┘    └──────┬───────┘
//!                            │                  │
//!                            │           ┌──────▼───────┐
//!                            └───────────│   Account    │
//!                                        │ Provisioner  │
//!                                        └──────────────┘
//! ```
//!
//! One person is carried through the whole sequence before the next
//! begins; the only exit paths are batch completion or abort on a fatal
//! error. Sub-step failures during provisioning are recorded as explicit
//! step results, never silently suppressed.

pub mod access;
pub mod cache;
pub mod classify;
pub mod identity;
pub mod pipeline;
pub mod provisioner;

pub use access::{JobAccessMap, JobAccessMatch, JobAccessResolver};
pub use cache::{CacheError, DedupCache};
pub use classify::classify;
pub use identity::{DerivedIdentity, IdentityDeriver, IdentityError};
pub use pipeline::{OnboardingPipeline, PipelineSummary, RunSelection};
pub use provisioner::{AccountProvisioner, ProvisionOutcome, StepResult};
