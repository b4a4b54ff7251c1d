//! Target-lesion-only RECIST category computed from the SLD numbers.
//!
//! Advisory: reviewers compare it against the investigator call. It never
//! replaces the recorded response and ignores non-target progression.

use nadir_common::{RecistThresholds, ResponseCategory};

/// Inputs for one post-baseline visit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SldSnapshot {
    pub event_num: u32,
    pub sum_of_lesions: Option<f64>,
    pub baseline_sld: Option<f64>,
    pub change_from_nadir: Option<f64>,
    pub percent_change_from_baseline: Option<f64>,
    pub percent_change_from_nadir: Option<f64>,
    pub new_lesions: bool,
}

/// PD → CR → PR → SD, first match wins. Undefined at baseline.
pub fn classify_sld(s: &SldSnapshot, t: &RecistThresholds) -> Option<ResponseCategory> {
    if s.event_num == 0 {
        return None;
    }
    if s.new_lesions {
        return Some(ResponseCategory::ProgressiveDisease);
    }
    let sum = s.sum_of_lesions?;

    let progressed = matches!(
        (s.percent_change_from_nadir, s.change_from_nadir),
        (Some(pct), Some(abs)) if pct >= t.progression_pct && abs >= t.progression_min_mm
    );
    if progressed {
        return Some(ResponseCategory::ProgressiveDisease);
    }
    if sum == 0.0 && s.baseline_sld.is_some_and(|b| b > 0.0) {
        return Some(ResponseCategory::CompleteResponse);
    }
    if s.percent_change_from_baseline.is_some_and(|pct| pct <= t.response_pct) {
        return Some(ResponseCategory::PartialResponse);
    }
    Some(ResponseCategory::StableDisease)
}
