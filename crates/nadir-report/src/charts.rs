//! Per-site SVG: visit timeline on top, percent-change spider chart below.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::{debug, info, instrument};

use nadir_common::error::{NadirError, Result};
use nadir_common::{BaselineDisease, PatientId, RecistThresholds, ResponseCategory, SiteCode};
use nadir_derive::DerivedAssessment;

use crate::palette::{style_for, MarkerShape, BASELINE_COLOUR, MARKER_SIZE};

pub const CHART_WIDTH: u32 = 1000;
pub const CHART_HEIGHT: u32 = 1100;

type Chart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn render_err(e: impl std::fmt::Display) -> NadirError {
    NadirError::Render(e.to_string())
}

/// Rows grouped by site, then by patient in visit order. Rows without a site are skipped.
pub fn group_by_site(rows: &[DerivedAssessment]) -> BTreeMap<SiteCode, BTreeMap<PatientId, Vec<&DerivedAssessment>>> {
    let mut sites: BTreeMap<SiteCode, BTreeMap<PatientId, Vec<&DerivedAssessment>>> = BTreeMap::new();
    for row in rows {
        let Some(site) = &row.site else { continue };
        sites
            .entry(site.clone())
            .or_default()
            .entry(row.patient.clone())
            .or_default()
            .push(row);
    }
    for patients in sites.values_mut() {
        for visits in patients.values_mut() {
            visits.sort_by_key(|r| (r.event_num, r.evaluation_date));
        }
    }
    sites
}

pub fn chart_file_name(site: &SiteCode) -> String {
    format!("site_{site}.svg")
}

/// Render one SVG per site into `dir`.
#[instrument(skip(rows, thresholds), fields(dir = %dir.display()))]
pub fn render_site_charts(dir: &Path, rows: &[DerivedAssessment], thresholds: &RecistThresholds) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (site, patients) in group_by_site(rows) {
        let path = dir.join(chart_file_name(&site));
        render_site_chart(&path, &site, &patients, thresholds)?;
        written.push(path);
    }
    info!(sites = written.len(), "Rendered site charts");
    Ok(written)
}

pub fn render_site_chart(
    path: &Path,
    site: &SiteCode,
    patients: &BTreeMap<PatientId, Vec<&DerivedAssessment>>,
    thresholds: &RecistThresholds,
) -> Result<()> {
    debug!(site = %site, patients = patients.len(), "Rendering site chart");
    let root = SVGBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let (upper, lower) = root.split_vertically((CHART_HEIGHT / 2) as i32);

    let max_visit = patients
        .values()
        .flatten()
        .map(|r| r.event_num)
        .max()
        .unwrap_or(0)
        .max(1);

    draw_timeline(&upper, site, patients, max_visit)?;
    draw_spider(&lower, site, patients, max_visit, thresholds)?;
    root.present().map_err(render_err)?;
    Ok(())
}

// ── Markers ───────────────────────────────────────────────────────────────────

fn draw_response_marker(
    chart: &mut Chart<'_, '_>,
    at: (f64, f64),
    category: ResponseCategory,
    with_legend: bool,
) -> Result<()> {
    let style = style_for(category);
    let colour = style.colour;
    let anno = match style.shape {
        MarkerShape::Circle => chart
            .draw_series(std::iter::once(Circle::new(at, MARKER_SIZE, colour.filled())))
            .map_err(render_err)?,
        MarkerShape::Triangle => chart
            .draw_series(std::iter::once(TriangleMarker::new(at, MARKER_SIZE + 1, colour.filled())))
            .map_err(render_err)?,
        MarkerShape::Cross => chart
            .draw_series(std::iter::once(Cross::new(at, MARKER_SIZE, colour.stroke_width(2))))
            .map_err(render_err)?,
        MarkerShape::Square => chart
            .draw_series(std::iter::once(
                EmptyElement::at(at)
                    + Rectangle::new([(-MARKER_SIZE, -MARKER_SIZE), (MARKER_SIZE, MARKER_SIZE)], colour.filled()),
            ))
            .map_err(render_err)?,
    };
    if with_legend {
        anno.label(category.code())
            .legend(move |(x, y)| Circle::new((x, y), MARKER_SIZE, colour.filled()));
    }
    Ok(())
}

// ── Timeline ──────────────────────────────────────────────────────────────────

fn draw_timeline(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    site: &SiteCode,
    patients: &BTreeMap<PatientId, Vec<&DerivedAssessment>>,
    max_visit: u32,
) -> Result<()> {
    let names: Vec<String> = patients.keys().map(|p| p.to_string()).collect();
    let n = names.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Site {site}: visits and investigator response"), ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5f64..(max_visit as f64 + 0.5), -0.5f64..(n as f64 - 0.5))
        .map_err(render_err)?;

    let patient_label = |y: &f64| {
        let i = y.round();
        if (y - i).abs() < 1e-6 && i >= 0.0 {
            names.get(i as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Visit")
        .x_labels(max_visit as usize + 1)
        .y_labels(n)
        .y_label_formatter(&patient_label)
        .draw()
        .map_err(render_err)?;

    let mut legend_done: BTreeSet<ResponseCategory> = BTreeSet::new();
    for (idx, visits) in patients.values().enumerate() {
        let y = idx as f64;
        chart
            .draw_series(LineSeries::new(
                visits.iter().map(|r| (r.event_num as f64, y)),
                BLACK.mix(0.4).stroke_width(1),
            ))
            .map_err(render_err)?;

        for row in visits.iter().filter(|r| r.is_baseline()) {
            let style = match row.baseline_disease {
                Some(BaselineDisease::Measurable) => BASELINE_COLOUR.filled(),
                Some(BaselineDisease::NonMeasurableOnly) => BASELINE_COLOUR.stroke_width(2),
                None => continue,
            };
            chart
                .draw_series(std::iter::once(Circle::new((0.0, y), MARKER_SIZE + 1, style)))
                .map_err(render_err)?;
        }

        for row in visits {
            for category in ResponseCategory::ALL {
                if let Some(visit) = row.marker(category) {
                    let first = legend_done.insert(category);
                    draw_response_marker(&mut chart, (visit as f64, y), category, first)?;
                }
            }
        }
    }

    if !legend_done.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;
    }
    Ok(())
}

// ── Spider ────────────────────────────────────────────────────────────────────

fn draw_spider(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    site: &SiteCode,
    patients: &BTreeMap<PatientId, Vec<&DerivedAssessment>>,
    max_visit: u32,
    thresholds: &RecistThresholds,
) -> Result<()> {
    let pcts = patients.values().flatten().filter_map(|r| r.percent_change_from_baseline);
    let (lo, hi) = pcts.fold((thresholds.response_pct, thresholds.progression_pct), |(lo, hi), p| {
        (lo.min(p), hi.max(p))
    });
    let (lo, hi) = (lo - 10.0, hi + 10.0);
    let x_max = max_visit as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Site {site}: % change in SLD from baseline"), ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(90)
        .build_cartesian_2d(0f64..x_max, lo..hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Visit")
        .y_desc("% change from baseline")
        .x_labels(max_visit as usize + 1)
        .draw()
        .map_err(render_err)?;

    // Progression and response bands.
    chart
        .draw_series([
            Rectangle::new([(0.0, thresholds.progression_pct), (x_max, hi)], RED.mix(0.08).filled()),
            Rectangle::new([(0.0, lo), (x_max, thresholds.response_pct)], GREEN.mix(0.08).filled()),
        ])
        .map_err(render_err)?;
    for (level, colour) in [(thresholds.progression_pct, RED), (thresholds.response_pct, GREEN)] {
        chart
            .draw_series(DashedLineSeries::new(
                [(0.0, level), (x_max, level)],
                6,
                4,
                colour.stroke_width(1),
            ))
            .map_err(render_err)?;
    }
    chart
        .draw_series(LineSeries::new([(0.0, 0.0), (x_max, 0.0)], BLACK.mix(0.5).stroke_width(1)))
        .map_err(render_err)?;

    for (idx, (patient, visits)) in patients.iter().enumerate() {
        let colour = Palette99::pick(idx).to_rgba();
        let points: Vec<(f64, f64)> = visits
            .iter()
            .filter_map(|r| r.percent_change_from_baseline.map(|p| (r.event_num as f64, p)))
            .collect();
        if points.is_empty() {
            continue;
        }
        chart
            .draw_series(LineSeries::new(points, colour.stroke_width(2)))
            .map_err(render_err)?
            .label(patient.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], colour.stroke_width(2)));

        for row in visits {
            let Some(pct) = row.percent_change_from_baseline else { continue };
            for category in ResponseCategory::ALL {
                if row.marker(category).is_some() {
                    draw_response_marker(&mut chart, (row.event_num as f64, pct), category, false)?;
                }
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_file_name() {
        assert_eq!(chart_file_name(&SiteCode::from("0101")), "site_0101.svg");
    }
}
