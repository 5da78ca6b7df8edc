use log::{debug, info};
use snafu::ensure;

use std::collections::HashMap;

use crate::config::*;

/// The character marking overseas departments, collectivities and the
/// votes cast abroad.
pub const OVERSEAS_MARKER: char = 'Z';

/// Whether a department code designates a voting unit outside of
/// metropolitan France.
pub fn is_overseas(department_code: &str) -> bool {
    department_code.contains(OVERSEAS_MARKER)
}

/// Counts of the records dropped by `join_areas`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct AreaJoinStats {
    pub records_without_department: usize,
    pub overseas_records_excluded: usize,
}

/// Joins the departments to their region (inner join on the region code).
///
/// Returns the lookup rows, in department order, and the number of
/// departments that were dropped because their region is unknown. A region
/// code that appears twice in the region table is a duplicate key.
pub fn join_references(
    regions: &[Region],
    departments: &[Department],
) -> Result<(Vec<DepartmentRegionLookup>, usize), PipelineError> {
    let mut regions_by_code: HashMap<&str, &Region> = HashMap::new();
    for r in regions.iter() {
        let previous = regions_by_code.insert(r.region_code.as_str(), r);
        ensure!(
            previous.is_none(),
            DuplicateKeySnafu {
                table: "regions",
                key: r.region_code.clone(),
            }
        );
    }

    let mut res: Vec<DepartmentRegionLookup> = Vec::new();
    let mut dropped = 0;
    for d in departments.iter() {
        match regions_by_code.get(d.region_code.as_str()) {
            Some(r) => {
                res.push(DepartmentRegionLookup {
                    region_code: r.region_code.clone(),
                    region_name: r.region_name.clone(),
                    department_code: d.department_code.clone(),
                    department_name: d.department_name.clone(),
                });
            }
            None => {
                debug!(
                    "join_references: department {} ({}): unknown region {:?}",
                    d.department_code, d.department_name, d.region_code
                );
                dropped += 1;
            }
        }
    }
    info!(
        "join_references: {} regions, {} departments -> {} lookup rows",
        regions.len(),
        departments.len(),
        res.len()
    );
    Ok((res, dropped))
}

/// Attaches every referendum record to its region, then removes the
/// overseas and abroad voting units.
///
/// Records whose department is not in the lookup are dropped. A department
/// code that matches several lookup rows is reported as a duplicate key
/// instead of multiplying the record.
pub fn join_areas(
    records: &[ReferendumRecord],
    lookup: &[DepartmentRegionLookup],
) -> Result<(Vec<AreaRecord>, AreaJoinStats), PipelineError> {
    let mut lookup_by_code: HashMap<&str, Vec<&DepartmentRegionLookup>> = HashMap::new();
    for l in lookup.iter() {
        lookup_by_code
            .entry(l.department_code.as_str())
            .or_default()
            .push(l);
    }

    let mut stats = AreaJoinStats::default();
    let mut joined: Vec<AreaRecord> = Vec::new();
    for rec in records.iter() {
        let matches = match lookup_by_code.get(rec.department_code.as_str()) {
            Some(m) => m,
            None => {
                stats.records_without_department += 1;
                continue;
            }
        };
        ensure!(
            matches.len() == 1,
            DuplicateKeySnafu {
                table: "department lookup",
                key: rec.department_code.clone(),
            }
        );
        let l = matches[0];
        joined.push(AreaRecord {
            department_code: rec.department_code.clone(),
            department_name: l.department_name.clone(),
            town_code: rec.town_code.clone(),
            town_name: rec.town_name.clone(),
            region_code: l.region_code.clone(),
            region_name: l.region_name.clone(),
            registered: rec.registered,
            abstentions: rec.abstentions,
            null_votes: rec.null_votes,
            choice_a: rec.choice_a,
            choice_b: rec.choice_b,
        });
    }

    let before = joined.len();
    joined.retain(|a| !is_overseas(&a.department_code));
    stats.overseas_records_excluded = before - joined.len();

    info!(
        "join_areas: {} records -> {} area records ({:?})",
        records.len(),
        joined.len(),
        stats
    );
    Ok((joined, stats))
}
