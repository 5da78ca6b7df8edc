use log::{debug, info};
use snafu::ensure;

use std::collections::{HashMap, HashSet};

use crate::config::*;

/// Counts of the regions dropped by `merge_geometries`, in each direction.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct MergeStats {
    pub regions_without_geometry: usize,
    pub geometries_without_region: usize,
}

/// Attaches the ratio of each region to its boundary (inner join on the
/// region code).
///
/// The output follows the order of the features and moves their geometry
/// through untouched.
pub fn merge_geometries<G>(
    results: &[RegionResult],
    features: Vec<GeometryFeature<G>>,
) -> Result<(Vec<SpatialResult<G>>, MergeStats), PipelineError> {
    let ratios: HashMap<&str, f64> = results
        .iter()
        .map(|r| (r.summary.region_code.as_str(), r.ratio))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut stats = MergeStats::default();
    let mut res: Vec<SpatialResult<G>> = Vec::new();
    let num_features = features.len();
    for f in features {
        ensure!(
            seen.insert(f.region_code.clone()),
            DuplicateKeySnafu {
                table: "geometry features",
                key: f.region_code.clone(),
            }
        );
        match ratios.get(f.region_code.as_str()) {
            Some(ratio) => res.push(SpatialResult {
                region_code: f.region_code,
                geometry: f.geometry,
                ratio: *ratio,
            }),
            None => {
                debug!("merge_geometries: no result for boundary {}", f.region_code);
                stats.geometries_without_region += 1;
            }
        }
    }
    for r in results.iter() {
        if !seen.contains(&r.summary.region_code) {
            debug!(
                "merge_geometries: no boundary for region {} ({})",
                r.summary.region_code, r.summary.region_name
            );
            stats.regions_without_geometry += 1;
        }
    }

    info!(
        "merge_geometries: {} results, {} features -> {} spatial results ({:?})",
        results.len(),
        num_features,
        res.len(),
        stats
    );
    Ok((res, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(code: &str, ratio: f64) -> RegionResult {
        RegionResult {
            summary: RegionSummary {
                region_code: code.to_string(),
                region_name: format!("Region {}", code),
                registered: 10,
                abstentions: 0,
                null_votes: 0,
                choice_a: 5,
                choice_b: 5,
            },
            ratio,
        }
    }

    fn feature(code: &str, shape: &str) -> GeometryFeature<String> {
        GeometryFeature {
            region_code: code.to_string(),
            geometry: shape.to_string(),
        }
    }

    #[test]
    fn inner_join_with_counts() {
        let results = vec![result("R1", 0.25), result("R2", 0.5), result("R3", 0.75)];
        let features = vec![
            feature("R4", "square"),
            feature("R2", "circle"),
            feature("R1", "triangle"),
        ];
        let (spatial, stats) = merge_geometries(&results, features).unwrap();
        assert_eq!(
            spatial,
            vec![
                SpatialResult {
                    region_code: "R2".to_string(),
                    geometry: "circle".to_string(),
                    ratio: 0.5,
                },
                SpatialResult {
                    region_code: "R1".to_string(),
                    geometry: "triangle".to_string(),
                    ratio: 0.25,
                },
            ]
        );
        assert_eq!(
            stats,
            MergeStats {
                regions_without_geometry: 1,
                geometries_without_region: 1,
            }
        );
    }

    #[test]
    fn duplicate_feature_is_an_error() {
        let results = vec![result("R1", 0.25)];
        let features = vec![feature("R1", "a"), feature("R1", "b")];
        assert_eq!(
            merge_geometries(&results, features),
            Err(PipelineError::DuplicateKey {
                table: "geometry features".to_string(),
                key: "R1".to_string(),
            })
        );
    }

    #[test]
    fn nothing_to_merge() {
        let (spatial, stats) = merge_geometries::<String>(&[], vec![]).unwrap();
        assert!(spatial.is_empty());
        assert_eq!(stats, MergeStats::default());
    }
}
