//! Data-quality anomalies surfaced for manual review.
//!
//! Nothing here corrects data: each anomaly records what was seen so the
//! analyst can fix the source export and re-run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nadir_common::PatientId;

use crate::models::DerivedAssessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// More than one final row for (patient, visit).
    DuplicateVisit,
    /// Overall response text outside the known CRF labels.
    UnmappedResponse,
    /// Post-baseline visit whose baseline SLD is zero or missing.
    UndefinedPercentChange,
    /// Row dropped because it has no evaluation date.
    MissingEvaluationDate,
    /// Patient identifier does not match the site rule.
    UnknownSite,
    /// Configured exclusion applied.
    ExcludedPatient,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::DuplicateVisit         => "duplicate_visit",
            AnomalyKind::UnmappedResponse       => "unmapped_response",
            AnomalyKind::UndefinedPercentChange => "undefined_percent_change",
            AnomalyKind::MissingEvaluationDate  => "missing_evaluation_date",
            AnomalyKind::UnknownSite            => "unknown_site",
            AnomalyKind::ExcludedPatient        => "excluded_patient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub patient: PatientId,
    pub event_num: Option<u32>,
    pub detail: String,
}

impl Anomaly {
    pub fn new(kind: AnomalyKind, patient: &PatientId, event_num: Option<u32>, detail: impl Into<String>) -> Self {
        Self { kind, patient: patient.clone(), event_num, detail: detail.into() }
    }
}

/// Post-derivation checks over the final table.
pub fn scan_rows(rows: &[DerivedAssessment]) -> Vec<Anomaly> {
    let mut out = Vec::new();

    let mut per_visit: BTreeMap<(&PatientId, u32), usize> = BTreeMap::new();
    for row in rows {
        *per_visit.entry((&row.patient, row.event_num)).or_default() += 1;
    }
    for ((patient, event_num), n) in per_visit {
        if n > 1 {
            out.push(Anomaly::new(
                AnomalyKind::DuplicateVisit,
                patient,
                Some(event_num),
                format!("{n} rows for this visit"),
            ));
        }
    }

    for row in rows {
        if let Some(nadir_common::NormalisedResponse::Unmapped(text)) = &row.response {
            out.push(Anomaly::new(
                AnomalyKind::UnmappedResponse,
                &row.patient,
                Some(row.event_num),
                format!("overall response '{text}' not recognised"),
            ));
        }
        if !row.is_baseline()
            && row.sum_of_lesions.is_some()
            && row.percent_change_from_baseline.is_none()
        {
            let reason = match row.baseline_sld {
                Some(_) => "baseline SLD is zero",
                None => "no baseline SLD",
            };
            out.push(Anomaly::new(
                AnomalyKind::UndefinedPercentChange,
                &row.patient,
                Some(row.event_num),
                reason,
            ));
        }
    }

    let mut unknown_sites: Vec<&PatientId> = rows
        .iter()
        .filter(|r| r.site.is_none())
        .map(|r| &r.patient)
        .collect();
    unknown_sites.dedup();
    for patient in unknown_sites {
        out.push(Anomaly::new(
            AnomalyKind::UnknownSite,
            patient,
            None,
            "identifier does not match the site pattern",
        ));
    }

    out
}

/// Anomaly counts by kind, for the run summary.
pub fn count_by_kind(anomalies: &[Anomaly]) -> BTreeMap<AnomalyKind, usize> {
    let mut counts = BTreeMap::new();
    for a in anomalies {
        *counts.entry(a.kind).or_insert(0) += 1;
    }
    counts
}
