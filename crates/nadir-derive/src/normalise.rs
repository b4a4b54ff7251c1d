//! Label and arithmetic normalisation.

use nadir_common::{NormalisedResponse, ResponseCategory};

/// CRF overall-response labels and their categories.
pub const RESPONSE_LABELS: &[(&str, ResponseCategory)] = &[
    ("Progressive Disease (PD)", ResponseCategory::ProgressiveDisease),
    ("Complete Response (CR)",   ResponseCategory::CompleteResponse),
    ("Partial Response (PR)",    ResponseCategory::PartialResponse),
    ("Stable Disease (SD)",      ResponseCategory::StableDisease),
    ("Non-CR/Non-PD",            ResponseCategory::NonCrNonPd),
];

/// Map free-text overall response to a category.
///
/// Matching is exact after trimming. Unknown text comes back as `Unmapped`
/// so the caller can flag it; blank text is `None`.
pub fn normalise_response(text: Option<&str>) -> Option<NormalisedResponse> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    let known = RESPONSE_LABELS
        .iter()
        .find(|(label, _)| *label == text)
        .map(|(_, category)| NormalisedResponse::Known(*category));
    Some(known.unwrap_or_else(|| NormalisedResponse::Unmapped(text.to_string())))
}

/// `value - reference`, undefined if either side is missing.
pub fn change(value: Option<f64>, reference: Option<f64>) -> Option<f64> {
    Some(value? - reference?)
}

/// Percent change relative to `reference`; undefined for a zero or missing denominator.
pub fn percent_change(change: Option<f64>, reference: Option<f64>) -> Option<f64> {
    let reference = reference.filter(|r| *r != 0.0)?;
    Some(change? * 100.0 / reference)
}
