//! Response derivation engine.
//!
//! Per patient, over visits in ascending order:
//!   1. Union baseline (visit 0) and follow-up SLD records; drop excluded patients
//!   2. Baseline SLD from visit 0
//!   3. Change / percent change from baseline
//!   4. Nadir via running minimum
//!   5. Change / percent change from nadir
//!   6. Outer-join new-lesion flags on (patient, visit, date)
//!   7. Outer-join investigator responses on (patient, visit)
//!   8. Drop rows without an evaluation date
//!   9. Normalise overall response labels
//!  10. Response indicators (markers are derived from them per row)
//!  11. Site from the patient identifier
//!  12. Restrict to the Intention-to-Treat cohort
//!
//! Joins never resolve duplicate keys; every combination is emitted and the
//! duplicates are reported as anomalies.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use nadir_common::error::Result;
use nadir_common::{BaselineDisease, PatientId, RecistThresholds, SiteRule, StudyConfig};
use nadir_ingestion::models::ResponseRecord;
use nadir_ingestion::ExtractedStudy;

use crate::anomalies::{scan_rows, Anomaly, AnomalyKind};
use crate::classify::{classify_sld, SldSnapshot};
use crate::models::{DerivedAssessment, ResponseFlags};
use crate::nadir::NadirTracker;
use crate::normalise::{change, normalise_response, percent_change};

// ── Options ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DerivationOptions {
    /// Patients removed before any join.
    pub excluded: BTreeSet<PatientId>,
    pub site_rule: SiteRule,
    pub thresholds: RecistThresholds,
}

impl DerivationOptions {
    pub fn from_config(config: &StudyConfig) -> Result<Self> {
        Ok(Self {
            excluded: config.exclusions.patients.iter().map(|p| PatientId::from(p.as_str())).collect(),
            site_rule: config.site_rule()?,
            thresholds: config.thresholds,
        })
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DerivationOutput {
    pub rows: Vec<DerivedAssessment>,
    pub anomalies: Vec<Anomaly>,
    /// Rows removed in step 8.
    pub dropped_undated: usize,
    /// Rows removed in step 12.
    pub dropped_outside_cohort: usize,
}

// ── Step 1: SLD union ─────────────────────────────────────────────────────────

/// Union key: (patient, visit, date, SLD bits).
type SldKey = (PatientId, u32, Option<NaiveDate>, Option<u64>);

#[derive(Debug, Clone, Default)]
struct SldRow {
    nontarget_present: Option<bool>,
    baseline_disease: Option<BaselineDisease>,
}

fn union_sld(study: &ExtractedStudy, excluded: &BTreeSet<PatientId>) -> BTreeMap<SldKey, SldRow> {
    let mut rows: BTreeMap<SldKey, SldRow> = BTreeMap::new();

    for b in study.baseline.iter().filter(|b| !excluded.contains(&b.patient)) {
        let key = (b.patient.clone(), 0, b.evaluation_date, b.sum_of_lesions.map(f64::to_bits));
        rows.entry(key).or_default().baseline_disease = Some(b.disease);
    }
    for f in study.followup.iter().filter(|f| !excluded.contains(&f.patient)) {
        let key = (f.patient.clone(), f.event_num, f.evaluation_date, f.sum_of_lesions.map(f64::to_bits));
        rows.entry(key).or_default().nontarget_present = f.nontarget_present;
    }
    rows
}

// ── Steps 2-5: baseline / nadir arithmetic ────────────────────────────────────

fn blank_row(patient: &PatientId, event_num: u32, evaluation_date: Option<NaiveDate>) -> DerivedAssessment {
    DerivedAssessment {
        patient: patient.clone(),
        site: None,
        event_num,
        evaluation_date,
        sum_of_lesions: None,
        baseline_sld: None,
        change_from_baseline: None,
        percent_change_from_baseline: None,
        nadir: None,
        change_from_nadir: None,
        percent_change_from_nadir: None,
        nontarget_present: None,
        baseline_disease: None,
        new_lesions: false,
        target_response: None,
        nontarget_response: None,
        overall_response_raw: None,
        response: None,
        flags: ResponseFlags::default(),
        sld_category: None,
    }
}

fn compute_sld_changes(union: BTreeMap<SldKey, SldRow>) -> Vec<DerivedAssessment> {
    // Baseline SLD per patient: first visit-0 row carrying a sum.
    let mut baselines: BTreeMap<PatientId, f64> = BTreeMap::new();
    for ((patient, event_num, _, bits), _) in &union {
        if let (0, Some(bits)) = (*event_num, bits) {
            baselines.entry(patient.clone()).or_insert(f64::from_bits(*bits));
        }
    }

    let mut out = Vec::with_capacity(union.len());
    let mut tracker = NadirTracker::new();
    let mut current_patient: Option<PatientId> = None;

    for ((patient, event_num, date, bits), sld) in union {
        if current_patient.as_ref() != Some(&patient) {
            tracker = NadirTracker::new();
            current_patient = Some(patient.clone());
        }

        let sum = bits.map(f64::from_bits);
        let baseline_sld = baselines.get(&patient).copied();
        let nadir = tracker.observe(event_num, sum);

        let change_from_baseline = change(sum, baseline_sld);
        let change_from_nadir = change(sum, nadir);

        let mut row = blank_row(&patient, event_num, date);
        row.sum_of_lesions = sum;
        row.baseline_sld = baseline_sld;
        row.change_from_baseline = change_from_baseline;
        row.percent_change_from_baseline = percent_change(change_from_baseline, baseline_sld);
        row.nadir = nadir;
        row.change_from_nadir = change_from_nadir;
        row.percent_change_from_nadir = percent_change(change_from_nadir, nadir);
        row.nontarget_present = sld.nontarget_present;
        row.baseline_disease = sld.baseline_disease;
        out.push(row);
    }
    out
}

// ── Step 6: new lesions ───────────────────────────────────────────────────────

fn join_new_lesions(
    mut rows: Vec<DerivedAssessment>,
    study: &ExtractedStudy,
    excluded: &BTreeSet<PatientId>,
) -> Vec<DerivedAssessment> {
    let mut pending: BTreeSet<(PatientId, u32, Option<NaiveDate>)> = study
        .new_lesions
        .iter()
        .filter(|n| !excluded.contains(&n.patient))
        .map(|n| (n.patient.clone(), n.event_num, n.evaluation_date))
        .collect();
    let all = pending.clone();

    for row in rows.iter_mut() {
        let key = (row.patient.clone(), row.event_num, row.evaluation_date);
        if all.contains(&key) {
            row.new_lesions = true;
            pending.remove(&key);
        }
    }

    // New-lesion visits with no lesion measurements still become rows. They
    // keep the patient's baseline SLD and the nadir reached so far.
    let mut extra = Vec::with_capacity(pending.len());
    for (patient, event_num, date) in pending {
        debug!(patient = %patient, event_num, "New-lesion visit without SLD record");
        let earlier = rows
            .iter()
            .filter(|r| r.patient == patient && (r.event_num, r.evaluation_date) <= (event_num, date))
            .max_by_key(|r| (r.event_num, r.evaluation_date));
        let mut row = blank_row(&patient, event_num, date);
        row.baseline_sld = rows.iter().find(|r| r.patient == patient).and_then(|r| r.baseline_sld);
        row.nadir = earlier.and_then(|r| r.nadir);
        row.new_lesions = true;
        extra.push(row);
    }
    rows.extend(extra);
    rows
}

// ── Step 7: responses ─────────────────────────────────────────────────────────

fn join_responses(
    rows: Vec<DerivedAssessment>,
    study: &ExtractedStudy,
    excluded: &BTreeSet<PatientId>,
) -> Vec<DerivedAssessment> {
    let mut by_visit: BTreeMap<(PatientId, u32), Vec<&ResponseRecord>> = BTreeMap::new();
    for r in study.responses.iter().filter(|r| !excluded.contains(&r.patient)) {
        by_visit.entry((r.patient.clone(), r.event_num)).or_default().push(r);
    }

    let mut matched: HashSet<(PatientId, u32)> = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let key = (row.patient.clone(), row.event_num);
        match by_visit.get(&key) {
            Some(records) => {
                for r in records {
                    let mut joined = row.clone();
                    joined.target_response = r.target_response.clone();
                    joined.nontarget_response = r.nontarget_response.clone();
                    joined.overall_response_raw = r.overall_response.clone();
                    out.push(joined);
                }
                matched.insert(key);
            }
            None => out.push(row),
        }
    }

    // Responses without an assessment carry no date and are dropped in step 8.
    for ((patient, event_num), records) in by_visit {
        if matched.contains(&(patient.clone(), event_num)) {
            continue;
        }
        for r in records {
            let mut row = blank_row(&patient, event_num, None);
            row.target_response = r.target_response.clone();
            row.nontarget_response = r.nontarget_response.clone();
            row.overall_response_raw = r.overall_response.clone();
            out.push(row);
        }
    }
    out
}

// ── Orchestration ─────────────────────────────────────────────────────────────

/// Derive the analysis table from extracted CRF records.
#[instrument(skip_all, fields(cohort = study.cohort.len()))]
pub fn derive_assessments(study: &ExtractedStudy, opts: &DerivationOptions) -> DerivationOutput {
    let mut anomalies = Vec::new();

    for patient in &opts.excluded {
        let present = study.baseline.iter().any(|b| &b.patient == patient)
            || study.followup.iter().any(|f| &f.patient == patient)
            || study.new_lesions.iter().any(|n| &n.patient == patient)
            || study.responses.iter().any(|r| &r.patient == patient);
        if present {
            info!(patient = %patient, "Excluding patient from derivation");
            anomalies.push(Anomaly::new(
                AnomalyKind::ExcludedPatient,
                patient,
                None,
                "excluded by configuration",
            ));
        }
    }

    let union = union_sld(study, &opts.excluded);
    let rows = compute_sld_changes(union);
    let rows = join_new_lesions(rows, study, &opts.excluded);
    let rows = join_responses(rows, study, &opts.excluded);

    let before = rows.len();
    let mut rows: Vec<DerivedAssessment> = rows
        .into_iter()
        .filter(|row| {
            if row.evaluation_date.is_some() {
                return true;
            }
            anomalies.push(Anomaly::new(
                AnomalyKind::MissingEvaluationDate,
                &row.patient,
                Some(row.event_num),
                "row dropped: no evaluation date",
            ));
            false
        })
        .collect();
    let dropped_undated = before - rows.len();

    for row in rows.iter_mut() {
        row.response = normalise_response(row.overall_response_raw.as_deref());
        row.flags = ResponseFlags::from_response(row.response.as_ref());
        row.site = opts.site_rule.site_of(&row.patient);
        row.sld_category = classify_sld(
            &SldSnapshot {
                event_num: row.event_num,
                sum_of_lesions: row.sum_of_lesions,
                baseline_sld: row.baseline_sld,
                change_from_nadir: row.change_from_nadir,
                percent_change_from_baseline: row.percent_change_from_baseline,
                percent_change_from_nadir: row.percent_change_from_nadir,
                new_lesions: row.new_lesions,
            },
            &opts.thresholds,
        );
    }

    let before = rows.len();
    rows.retain(|row| study.cohort.contains(&row.patient));
    let dropped_outside_cohort = before - rows.len();

    rows.sort_by(|a, b| {
        (&a.patient, a.event_num, a.evaluation_date).cmp(&(&b.patient, b.event_num, b.evaluation_date))
    });

    anomalies.extend(scan_rows(&rows));
    for a in &anomalies {
        warn!(
            kind = a.kind.as_str(),
            patient = %a.patient,
            event_num = ?a.event_num,
            "{}", a.detail
        );
    }

    info!(
        rows = rows.len(),
        dropped_undated,
        dropped_outside_cohort,
        anomalies = anomalies.len(),
        "Derivation complete"
    );

    DerivationOutput { rows, anomalies, dropped_undated, dropped_outside_cohort }
}
