//! nadir-common: Shared types, errors, and configuration used across all nadir crates.

pub mod error;
pub mod entities;
pub mod study_config;

// Re-export commonly used types
pub use entities::{PatientId, SiteCode, SiteRule, ResponseCategory, NormalisedResponse, BaselineDisease};
pub use error::{NadirError, Result};
pub use study_config::{StudyConfig, SheetSpec, RecistThresholds};
