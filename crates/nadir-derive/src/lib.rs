//! nadir-derive: RECIST v1.1 response derivation.
//! Joins the extracted CRF records per (patient, visit) and computes SLD
//! change from baseline and nadir plus the normalised investigator response.
//! Data-quality problems are collected as anomalies, never corrected.

pub mod models;
pub mod normalise;
pub mod nadir;
pub mod classify;
pub mod anomalies;
pub mod engine;

pub use anomalies::{Anomaly, AnomalyKind};
pub use engine::{derive_assessments, DerivationOptions, DerivationOutput};
pub use models::{DerivedAssessment, ResponseFlags};
