//! Derived per-visit assessment rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use nadir_common::{BaselineDisease, NormalisedResponse, PatientId, ResponseCategory, SiteCode};

/// Five mutually exclusive response indicators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFlags {
    pub pd: bool,
    pub cr: bool,
    pub pr: bool,
    pub sd: bool,
    pub nn: bool,
}

impl ResponseFlags {
    /// All false when the response is missing or unmapped.
    pub fn from_response(response: Option<&NormalisedResponse>) -> Self {
        let mut flags = Self::default();
        if let Some(category) = response.and_then(NormalisedResponse::category) {
            *flags.slot(category) = true;
        }
        flags
    }

    fn slot(&mut self, category: ResponseCategory) -> &mut bool {
        match category {
            ResponseCategory::ProgressiveDisease => &mut self.pd,
            ResponseCategory::CompleteResponse   => &mut self.cr,
            ResponseCategory::PartialResponse    => &mut self.pr,
            ResponseCategory::StableDisease      => &mut self.sd,
            ResponseCategory::NonCrNonPd         => &mut self.nn,
        }
    }

    pub fn get(&self, category: ResponseCategory) -> bool {
        match category {
            ResponseCategory::ProgressiveDisease => self.pd,
            ResponseCategory::CompleteResponse   => self.cr,
            ResponseCategory::PartialResponse    => self.pr,
            ResponseCategory::StableDisease      => self.sd,
            ResponseCategory::NonCrNonPd         => self.nn,
        }
    }

    pub fn count(&self) -> usize {
        [self.pd, self.cr, self.pr, self.sd, self.nn].iter().filter(|f| **f).count()
    }
}

/// One (patient, visit) row of the final analysis table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedAssessment {
    pub patient: PatientId,
    pub site: Option<SiteCode>,
    pub event_num: u32,
    pub evaluation_date: Option<NaiveDate>,
    pub sum_of_lesions: Option<f64>,
    pub baseline_sld: Option<f64>,
    pub change_from_baseline: Option<f64>,
    pub percent_change_from_baseline: Option<f64>,
    pub nadir: Option<f64>,
    pub change_from_nadir: Option<f64>,
    pub percent_change_from_nadir: Option<f64>,
    pub nontarget_present: Option<bool>,
    /// Set on the visit-0 row only.
    pub baseline_disease: Option<BaselineDisease>,
    pub new_lesions: bool,
    pub target_response: Option<String>,
    pub nontarget_response: Option<String>,
    pub overall_response_raw: Option<String>,
    pub response: Option<NormalisedResponse>,
    pub flags: ResponseFlags,
    /// Target-lesion-only category computed from the SLD numbers.
    pub sld_category: Option<ResponseCategory>,
}

impl DerivedAssessment {
    /// "Which visit" marker: this row's visit number when it carries `category`.
    pub fn marker(&self, category: ResponseCategory) -> Option<u32> {
        self.flags.get(category).then_some(self.event_num)
    }

    pub fn is_baseline(&self) -> bool {
        self.event_num == 0
    }
}
