mod aggregate;
pub mod builder;
mod config;
mod joins;
pub mod manual;
mod merge;

use log::{info, warn};

pub use crate::aggregate::{aggregate_regions, derive_ratios};
pub use crate::config::*;
pub use crate::joins::{
    is_overseas, join_areas, join_references, AreaJoinStats, OVERSEAS_MARKER,
};
pub use crate::merge::{merge_geometries, MergeStats};

/// Runs the tabular part of the pipeline: reference join, area join with
/// the overseas exclusion, aggregation by region and ratio derivation.
///
/// Arguments:
/// * `records` the results of every voting unit
/// * `regions` the region reference table
/// * `departments` the department reference table
/// * `policy` what to do with regions that have no expressed ballot
///
/// The geometry counters of the returned diagnostics are left at zero.
pub fn compute_region_results(
    records: &[ReferendumRecord],
    regions: &[Region],
    departments: &[Department],
    policy: RatioPolicy,
) -> Result<(Vec<RegionResult>, Diagnostics), PipelineError> {
    info!(
        "compute_region_results: processing {} records, {} regions, {} departments",
        records.len(),
        regions.len(),
        departments.len()
    );
    let (lookup, departments_without_region) = join_references(regions, departments)?;
    let (areas, area_stats) = join_areas(records, &lookup)?;
    let summaries = aggregate_regions(&areas)?;
    let (results, regions_without_ratio) = derive_ratios(summaries, policy)?;

    let diagnostics = Diagnostics {
        departments_without_region,
        records_without_department: area_stats.records_without_department,
        overseas_records_excluded: area_stats.overseas_records_excluded,
        regions_without_ratio,
        ..Diagnostics::default()
    };
    Ok((results, diagnostics))
}

/// Runs the whole pipeline, up to the merge with the region boundaries.
///
/// Either every stage succeeds and the full output is returned, or the
/// first error is returned and nothing else.
pub fn run_pipeline<G>(
    records: &[ReferendumRecord],
    regions: &[Region],
    departments: &[Department],
    features: Vec<GeometryFeature<G>>,
    policy: RatioPolicy,
) -> Result<PipelineOutput<G>, PipelineError> {
    let (results, mut diagnostics) =
        compute_region_results(records, regions, departments, policy)?;
    let (spatial, merge_stats) = merge_geometries(&results, features)?;
    diagnostics.regions_without_geometry = merge_stats.regions_without_geometry;
    diagnostics.geometries_without_region = merge_stats.geometries_without_region;
    log_diagnostics(&diagnostics);
    Ok(PipelineOutput {
        results,
        spatial,
        diagnostics,
    })
}

fn log_diagnostics(d: &Diagnostics) {
    if d.departments_without_region > 0 {
        warn!(
            "{} departments dropped: unknown region",
            d.departments_without_region
        );
    }
    if d.records_without_department > 0 {
        warn!(
            "{} records dropped: unknown department",
            d.records_without_department
        );
    }
    if d.overseas_records_excluded > 0 {
        info!(
            "{} records excluded: overseas or abroad",
            d.overseas_records_excluded
        );
    }
    if d.regions_without_geometry > 0 {
        warn!(
            "{} regions dropped: no boundary",
            d.regions_without_geometry
        );
    }
    if d.geometries_without_region > 0 {
        warn!(
            "{} boundaries dropped: no result",
            d.geometries_without_region
        );
    }
    if !d.regions_without_ratio.is_empty() {
        warn!(
            "regions without expressed ballot: {:?}",
            d.regions_without_ratio
        );
    }
}
