//! Records produced by the extractors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use nadir_common::{BaselineDisease, PatientId};

/// Canonical column names, after header normalisation.
pub mod columns {
    pub const PATIENT: &str = "patient";
    pub const EVENT_NUM: &str = "event_num";
    pub const DOSE_TAKEN: &str = "dose_taken";
    pub const EVALUATION_DATE: &str = "evaluation_date";
    pub const LONGEST_DIAMETER: &str = "longest_diameter";
    pub const NONTARGET_PRESENT: &str = "non_target_lesion_present";
    pub const TARGET_RESPONSE: &str = "target_response";
    pub const NONTARGET_RESPONSE: &str = "non_target_response";
    pub const OVERALL_RESPONSE: &str = "overall_response";
}

/// One screening record per patient (visit 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub patient: PatientId,
    pub evaluation_date: Option<NaiveDate>,
    /// Present only for measurable disease.
    pub sum_of_lesions: Option<f64>,
    pub disease: BaselineDisease,
}

/// One post-baseline visit after joining target and non-target sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpRecord {
    pub patient: PatientId,
    pub event_num: u32,
    pub evaluation_date: Option<NaiveDate>,
    pub sum_of_lesions: Option<f64>,
    /// None when the visit is missing from the non-target sheet.
    pub nontarget_present: Option<bool>,
}

/// First visit at which a new lesion was reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLesionRecord {
    pub patient: PatientId,
    pub event_num: u32,
    pub evaluation_date: Option<NaiveDate>,
}

/// Investigator response texts for one visit, verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub patient: PatientId,
    pub event_num: u32,
    pub target_response: Option<String>,
    pub nontarget_response: Option<String>,
    pub overall_response: Option<String>,
}
