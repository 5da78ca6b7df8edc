use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::config::*;

fn add_count(
    total: &mut u64,
    value: u64,
    region_code: &str,
    field: &str,
) -> Result<(), PipelineError> {
    *total = total.checked_add(value).context(IntegerOverflowSnafu {
        region_code,
        field,
    })?;
    Ok(())
}

fn accumulate(acc: &mut RegionSummary, rec: &AreaRecord) -> Result<(), PipelineError> {
    ensure!(
        acc.region_name == rec.region_name,
        ConflictingRegionNameSnafu {
            region_code: acc.region_code.clone(),
            first: acc.region_name.clone(),
            second: rec.region_name.clone(),
        }
    );
    let code = rec.region_code.as_str();
    add_count(&mut acc.registered, rec.registered, code, "registered")?;
    add_count(&mut acc.abstentions, rec.abstentions, code, "abstentions")?;
    add_count(&mut acc.null_votes, rec.null_votes, code, "null_votes")?;
    add_count(&mut acc.choice_a, rec.choice_a, code, "choice_a")?;
    add_count(&mut acc.choice_b, rec.choice_b, code, "choice_b")?;
    Ok(())
}

/// Sums the counts of the area records for each region.
///
/// The output contains exactly one row per region code, sorted by code.
pub fn aggregate_regions(records: &[AreaRecord]) -> Result<Vec<RegionSummary>, PipelineError> {
    let mut groups: BTreeMap<String, RegionSummary> = BTreeMap::new();
    for rec in records.iter() {
        match groups.entry(rec.region_code.clone()) {
            Entry::Vacant(e) => {
                e.insert(RegionSummary {
                    region_code: rec.region_code.clone(),
                    region_name: rec.region_name.clone(),
                    registered: rec.registered,
                    abstentions: rec.abstentions,
                    null_votes: rec.null_votes,
                    choice_a: rec.choice_a,
                    choice_b: rec.choice_b,
                });
            }
            Entry::Occupied(mut e) => accumulate(e.get_mut(), rec)?,
        }
    }
    info!(
        "aggregate_regions: {} area records -> {} regions",
        records.len(),
        groups.len()
    );
    Ok(groups.into_values().collect())
}

/// Computes the share of choice A among the expressed ballots of each region.
///
/// Regions without any expressed ballot either abort the run or are
/// skipped, depending on the policy. The skipped region codes are returned
/// with the results.
pub fn derive_ratios(
    summaries: Vec<RegionSummary>,
    policy: RatioPolicy,
) -> Result<(Vec<RegionResult>, Vec<String>), PipelineError> {
    let mut res: Vec<RegionResult> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();
    for summary in summaries {
        let expressed = summary.expressed().context(IntegerOverflowSnafu {
            region_code: summary.region_code.clone(),
            field: "expressed",
        })?;
        if expressed == 0 {
            match policy {
                RatioPolicy::Abort => {
                    return RatioUndefinedSnafu {
                        region_code: summary.region_code,
                    }
                    .fail();
                }
                RatioPolicy::Skip => {
                    warn!(
                        "derive_ratios: region {} ({}): no expressed ballot, skipping",
                        summary.region_code, summary.region_name
                    );
                    skipped.push(summary.region_code);
                    continue;
                }
            }
        }
        let ratio = summary.choice_a as f64 / expressed as f64;
        debug!("derive_ratios: region {}: {}", summary.region_code, ratio);
        res.push(RegionResult { summary, ratio });
    }
    Ok((res, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(region_code: &str, region_name: &str, counts: [u64; 5]) -> AreaRecord {
        AreaRecord {
            department_code: "01".to_string(),
            department_name: "Dep1".to_string(),
            town_code: "001".to_string(),
            town_name: "Town1".to_string(),
            region_code: region_code.to_string(),
            region_name: region_name.to_string(),
            registered: counts[0],
            abstentions: counts[1],
            null_votes: counts[2],
            choice_a: counts[3],
            choice_b: counts[4],
        }
    }

    fn summary(region_code: &str, choice_a: u64, choice_b: u64) -> RegionSummary {
        RegionSummary {
            region_code: region_code.to_string(),
            region_name: format!("Region {}", region_code),
            registered: choice_a.saturating_add(choice_b),
            abstentions: 0,
            null_votes: 0,
            choice_a,
            choice_b,
        }
    }

    #[test]
    fn sums_per_region() {
        let records = vec![
            area("R2", "Region2", [2000, 200, 20, 900, 880]),
            area("R1", "Region1", [1000, 100, 10, 450, 440]),
            area("R1", "Region1", [500, 50, 5, 200, 245]),
        ];
        let res = aggregate_regions(&records).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].region_code, "R1");
        assert_eq!(
            res[0],
            RegionSummary {
                region_code: "R1".to_string(),
                region_name: "Region1".to_string(),
                registered: 1500,
                abstentions: 150,
                null_votes: 15,
                choice_a: 650,
                choice_b: 685,
            }
        );
        assert_eq!(res[1].registered, 2000);

        let total_in: u64 = records.iter().map(|r| r.registered).sum();
        let total_out: u64 = res.iter().map(|r| r.registered).sum();
        assert_eq!(total_in, total_out);
    }

    #[test]
    fn empty_input() {
        assert_eq!(aggregate_regions(&[]), Ok(vec![]));
    }

    #[test]
    fn conflicting_region_name() {
        let records = vec![
            area("R1", "Region1", [1, 0, 0, 1, 0]),
            area("R1", "Other name", [1, 0, 0, 1, 0]),
        ];
        assert_eq!(
            aggregate_regions(&records),
            Err(PipelineError::ConflictingRegionName {
                region_code: "R1".to_string(),
                first: "Region1".to_string(),
                second: "Other name".to_string(),
            })
        );
    }

    #[test]
    fn overflow_is_fatal() {
        let records = vec![
            area("R1", "Region1", [u64::MAX, 0, 0, 1, 0]),
            area("R1", "Region1", [1, 0, 0, 1, 0]),
        ];
        assert_eq!(
            aggregate_regions(&records),
            Err(PipelineError::IntegerOverflow {
                region_code: "R1".to_string(),
                field: "registered".to_string(),
            })
        );
    }

    #[test]
    fn expressed_overflow_is_fatal() {
        for policy in [RatioPolicy::Abort, RatioPolicy::Skip] {
            let res = derive_ratios(vec![summary("R1", u64::MAX, 1)], policy);
            assert_eq!(
                res,
                Err(PipelineError::IntegerOverflow {
                    region_code: "R1".to_string(),
                    field: "expressed".to_string(),
                })
            );
        }
    }

    #[test]
    fn ratio_values() {
        let (res, skipped) = derive_ratios(
            vec![summary("R1", 450, 440), summary("R2", 0, 10)],
            RatioPolicy::Abort,
        )
        .unwrap();
        assert!(skipped.is_empty());
        assert!((res[0].ratio - 450.0 / 890.0).abs() < 1e-12);
        assert_eq!(res[1].ratio, 0.0);
        assert!(res.iter().all(|r| (0.0..=1.0).contains(&r.ratio)));
    }

    #[test]
    fn ratio_undefined_abort() {
        let res = derive_ratios(vec![summary("R1", 0, 0)], RatioPolicy::Abort);
        assert_eq!(
            res,
            Err(PipelineError::RatioUndefined {
                region_code: "R1".to_string()
            })
        );
    }

    #[test]
    fn ratio_undefined_skip() {
        let (res, skipped) = derive_ratios(
            vec![summary("R1", 0, 0), summary("R2", 3, 1)],
            RatioPolicy::Skip,
        )
        .unwrap();
        assert_eq!(skipped, vec!["R1".to_string()]);
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].summary.region_code, "R2");
        assert_eq!(res[0].ratio, 0.75);
    }
}
