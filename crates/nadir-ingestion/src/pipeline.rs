//! Extraction stage of a run.
//!
//! Reads every configured sheet and runs the extractors in dependency order:
//!   1. Cohort from the medication-intake sheet
//!   2. Baseline from the screening target / non-target sheets
//!   3. Follow-up from the tumour-assessment target / non-target sheets
//!   4. First new-lesion visit
//!   5. Investigator overall response
//!
//! Any missing file, sheet or column aborts the stage.

use serde::Serialize;
use tracing::{info, instrument};

use nadir_common::error::Result;
use nadir_common::study_config::InputsConfig;

use crate::baseline::extract_baseline;
use crate::cohort::Cohort;
use crate::followup::extract_followup;
use crate::models::{BaselineRecord, FollowUpRecord, NewLesionRecord, ResponseRecord};
use crate::new_lesions::extract_new_lesions;
use crate::responses::extract_responses;
use crate::sheet::Table;
use crate::sources::read_spec;

/// Everything the derivation engine needs, already typed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedStudy {
    pub cohort: Cohort,
    pub baseline: Vec<BaselineRecord>,
    pub followup: Vec<FollowUpRecord>,
    pub new_lesions: Vec<NewLesionRecord>,
    pub responses: Vec<ResponseRecord>,
}

/// The seven input sheets, loaded but not yet interpreted.
#[derive(Debug, Clone)]
pub struct StudySheets {
    pub medication: Table,
    pub screening_target: Table,
    pub screening_nontarget: Table,
    pub followup_target: Table,
    pub followup_nontarget: Table,
    pub new_lesions: Table,
    pub overall_response: Table,
}

impl StudySheets {
    #[instrument(skip_all)]
    pub fn load(inputs: &InputsConfig) -> Result<Self> {
        Ok(Self {
            medication: read_spec(&inputs.medication)?,
            screening_target: read_spec(&inputs.screening_target)?,
            screening_nontarget: read_spec(&inputs.screening_nontarget)?,
            followup_target: read_spec(&inputs.followup_target)?,
            followup_nontarget: read_spec(&inputs.followup_nontarget)?,
            new_lesions: read_spec(&inputs.new_lesions)?,
            overall_response: read_spec(&inputs.overall_response)?,
        })
    }
}

/// Run every extractor over already-loaded sheets.
pub fn extract_sheets(sheets: &StudySheets) -> Result<ExtractedStudy> {
    let cohort = Cohort::from_medication(&sheets.medication)?;
    let baseline = extract_baseline(&sheets.screening_target, &sheets.screening_nontarget, &cohort)?;
    let followup = extract_followup(&sheets.followup_target, &sheets.followup_nontarget)?;
    let new_lesions = extract_new_lesions(&sheets.new_lesions)?;
    let responses = extract_responses(&sheets.overall_response)?;

    Ok(ExtractedStudy { cohort, baseline, followup, new_lesions, responses })
}

/// Load and extract the whole study described by `inputs`.
#[instrument(skip_all)]
pub fn extract_study(inputs: &InputsConfig) -> Result<ExtractedStudy> {
    info!("Reading CRF exports");
    let sheets = StudySheets::load(inputs)?;
    let study = extract_sheets(&sheets)?;
    info!(
        cohort = study.cohort.len(),
        baseline = study.baseline.len(),
        followup = study.followup.len(),
        new_lesions = study.new_lesions.len(),
        responses = study.responses.len(),
        "Extraction complete"
    );
    Ok(study)
}
