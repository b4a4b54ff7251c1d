//! nadir-ingestion: CRF spreadsheet extraction.
//! - Sheet access (xlsx workbooks or csv exports) with header normalisation
//! - Intention-to-Treat cohort
//! - Baseline and follow-up lesion sums
//! - First new-lesion visit
//! - Investigator overall response

pub mod sheet;
pub mod sources;
pub mod models;
pub mod cohort;
pub mod baseline;
pub mod followup;
pub mod new_lesions;
pub mod responses;
pub mod pipeline;

pub use sheet::{Cell, Table, normalise_header};
pub use models::{BaselineRecord, FollowUpRecord, NewLesionRecord, ResponseRecord};
pub use cohort::Cohort;
pub use pipeline::{extract_study, ExtractedStudy};
