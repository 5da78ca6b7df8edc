use log::{debug, info, warn};

use referendum_regions::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::refmap::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_geojson;

#[derive(Debug, Snafu)]
pub enum RefmapError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing JSON"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("{path}:{lineno}: could not read CSV line"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("{path}: missing column {column:?}"))]
    CsvMissingColumn { path: String, column: String },
    #[snafu(display("{path}:{lineno}: missing value in column {column:?}"))]
    CsvMissingValue {
        path: String,
        lineno: usize,
        column: String,
    },
    #[snafu(display("{path}:{lineno}: column {column:?}: {value:?} is not a count"))]
    CsvNumber {
        source: std::num::ParseIntError,
        path: String,
        lineno: usize,
        column: String,
        value: String,
    },
    #[snafu(display("Error parsing GeoJSON file {path}"))]
    GeoJsonParse {
        source: geojson::Error,
        path: String,
    },
    #[snafu(display("{path}: expected a FeatureCollection"))]
    GeoJsonNotCollection { path: String },
    #[snafu(display("{path}: feature #{index} has no region code in property {property:?}"))]
    GeoJsonMissingCode {
        path: String,
        index: usize,
        property: String,
    },
    #[snafu(display("{path}: feature #{index}: numeric region code {value} in {property:?}"))]
    GeoJsonNumericCode {
        path: String,
        index: usize,
        property: String,
        value: String,
    },
    #[snafu(display("{path}: feature #{index} has no geometry"))]
    GeoJsonMissingGeometry { path: String, index: usize },
    #[snafu(display("Missing parent directory for {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Error while processing the tables"))]
    Pipeline { source: PipelineError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type RefmapResult<T> = Result<T, RefmapError>;

/// The settings of one run, after the command line has been applied on top
/// of the configuration file.
#[derive(Debug, Clone)]
struct RunSettings {
    config: RefmapConfig,
    root: String,
    policy: RatioPolicy,
    summary_out: Option<String>,
    geojson_out: Option<String>,
}

fn policy_name(policy: RatioPolicy) -> &'static str {
    match policy {
        RatioPolicy::Abort => "abort",
        RatioPolicy::Skip => "skip",
    }
}

fn results_to_json(results: &[RegionResult]) -> Vec<JSValue> {
    results
        .iter()
        .map(|r| {
            let s = &r.summary;
            json!({
                "regionCode": s.region_code,
                "regionName": s.region_name,
                "registered": s.registered,
                "abstentions": s.abstentions,
                "null": s.null_votes,
                "choiceA": s.choice_a,
                "choiceB": s.choice_b,
                "ratio": r.ratio,
            })
        })
        .collect()
}

fn diagnostics_to_json(d: &Diagnostics) -> JSValue {
    json!({
        "departmentsWithoutRegion": d.departments_without_region,
        "recordsWithoutDepartment": d.records_without_department,
        "overseasRecordsExcluded": d.overseas_records_excluded,
        "regionsWithoutGeometry": d.regions_without_geometry,
        "geometriesWithoutRegion": d.geometries_without_region,
        "regionsWithoutRatio": d.regions_without_ratio,
    })
}

fn build_summary_js(
    settings: &RunSettings,
    results: &[RegionResult],
    d: &Diagnostics,
) -> JSValue {
    let c = OutputConfig {
        name: settings.config.output_settings.name.clone(),
        undefined_ratio: policy_name(settings.policy).to_string(),
    };
    json!({
        "config": c,
        "results": results_to_json(results),
        "diagnostics": diagnostics_to_json(d),
    })
}

fn print_results(results: &[RegionResult]) {
    println!(
        "{:<8} {:<28} {:>12} {:>12} {:>10} {:>12} {:>12} {:>8}",
        "code_reg", "name_reg", "Registered", "Abstentions", "Null", "Choice A", "Choice B", "ratio"
    );
    for r in results.iter() {
        let s = &r.summary;
        println!(
            "{:<8} {:<28} {:>12} {:>12} {:>10} {:>12} {:>12} {:>8.4}",
            s.region_code,
            s.region_name,
            s.registered,
            s.abstentions,
            s.null_votes,
            s.choice_a,
            s.choice_b,
            r.ratio
        );
    }
}

fn settings_from_args(args: &Args) -> RefmapResult<RunSettings> {
    let config = read_config(&args.config)?;
    info!("config: {:?}", config);
    let root = Path::new(args.config.as_str())
        .parent()
        .context(MissingParentDirSnafu {
            path: args.config.clone(),
        })?;
    let policy = ratio_policy(args.undefined_ratio.as_deref(), config.rules.as_ref())?;
    let summary_out = args
        .out
        .clone()
        .or_else(|| config.output_settings.summary_path.clone())
        .filter(|s| !s.is_empty());
    let geojson_out = args
        .geojson_out
        .clone()
        .or_else(|| config.output_settings.geojson_path.clone())
        .filter(|s| !s.is_empty());
    if geojson_out.is_some() && config.sources.geometry.is_none() {
        whatever!("a GeoJSON output is requested but no geometry source is configured");
    }
    Ok(RunSettings {
        config,
        root: root.display().to_string(),
        policy,
        summary_out,
        geojson_out,
    })
}

/// Loads all the tables of a run, runs the pipeline and writes the outputs.
///
/// Nothing is written if any step fails.
fn run_settings(settings: &RunSettings, check_summary_path: Option<&str>) -> RefmapResult<JSValue> {
    let root = Path::new(settings.root.as_str());
    let sources = &settings.config.sources;
    let path_of = |file_path: &str| io_common::resolve_path(root, file_path);

    let records = io_csv::read_referendum(
        &path_of(&sources.referendum.file_path),
        &sources.referendum,
    )?;
    let regions = io_csv::read_regions(&path_of(&sources.regions.file_path), &sources.regions)?;
    let departments = io_csv::read_departments(
        &path_of(&sources.departments.file_path),
        &sources.departments,
    )?;

    let (results, diagnostics, map_layer) = match &sources.geometry {
        Some(geo_src) => {
            let features = io_geojson::read_features(&path_of(&geo_src.file_path), geo_src)?;
            let out = run_pipeline(&records, &regions, &departments, features, settings.policy)
                .context(PipelineSnafu {})?;
            let fc =
                io_geojson::spatial_to_collection(&out.spatial, geo_src.region_code_property());
            (out.results, out.diagnostics, Some(fc))
        }
        None => {
            let (results, diagnostics) =
                compute_region_results(&records, &regions, &departments, settings.policy)
                    .context(PipelineSnafu {})?;
            (results, diagnostics, None)
        }
    };
    debug!("diagnostics: {:?}", diagnostics);

    print_results(&results);

    let summary_js = build_summary_js(settings, &results, &diagnostics);
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(SerializingJsonSnafu {})?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        info!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_ref(),
                "\n",
            );
            whatever!("Difference detected between computed summary and reference summary")
        }
    }

    match settings.summary_out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_summary),
        Some(p) => {
            let p = path_of(p);
            fs::write(&p, &pretty_js_summary).context(WritingFileSnafu { path: p.clone() })?;
            info!("wrote summary to {}", p);
        }
        None => {}
    }
    if let (Some(p), Some(fc)) = (settings.geojson_out.as_deref(), map_layer.as_ref()) {
        io_geojson::write_collection(&path_of(p), fc)?;
    }

    Ok(summary_js)
}

pub fn run_referendum(args: &Args) -> RefmapResult<JSValue> {
    let settings = settings_from_args(args)?;
    run_settings(&settings, args.reference.as_deref())
}

pub fn print_error(e: &RefmapError) {
    eprintln!("An error occured: {}", e);
    for cause in e.iter_chain().skip(1) {
        eprintln!("  caused by: {}", cause);
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args(test_name: &str) -> Args {
        let test_dir = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name);
        Args {
            config: format!("{}/{}_config.json", test_dir, test_name),
            reference: Some(format!("{}/{}_expected_summary.json", test_dir, test_name)),
            out: None,
            geojson_out: None,
            undefined_ratio: None,
            verbose: false,
        }
    }

    #[test]
    fn metropole_mini() {
        let _ = env_logger::builder().is_test(true).try_init();
        let summary = run_referendum(&test_args("metropole_mini")).unwrap();
        let results = summary["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["regionCode"], json!("11"));
        assert_eq!(summary["diagnostics"]["overseasRecordsExcluded"], json!(2));
        assert_eq!(summary["diagnostics"]["regionsWithoutGeometry"], json!(1));
    }

    #[test]
    fn reference_mismatch_fails() {
        let mut args = test_args("metropole_mini");
        args.undefined_ratio = Some("abort".to_string());
        let err = run_referendum(&args).unwrap_err();
        assert!(matches!(err, RefmapError::Whatever { .. }));
    }

    #[test]
    fn undefined_ratio_aborts() {
        let mut args = test_args("empty_region");
        args.reference = None;
        args.undefined_ratio = Some("abort".to_string());
        let err = run_referendum(&args).unwrap_err();
        assert!(matches!(
            err,
            RefmapError::Pipeline {
                source: PipelineError::RatioUndefined { .. }
            }
        ));

        args.undefined_ratio = Some("skip".to_string());
        let summary = run_referendum(&args).unwrap();
        assert_eq!(summary["diagnostics"]["regionsWithoutRatio"], json!(["53"]));
        assert_eq!(summary["config"]["undefinedRatio"], json!("skip"));
    }

    #[test]
    fn missing_rule() {
        let mut args = test_args("empty_region");
        args.reference = None;
        let err = run_referendum(&args).unwrap_err();
        assert!(matches!(err, RefmapError::Whatever { .. }));
    }
}
