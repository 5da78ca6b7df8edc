// ********* Input data structures ***********

use snafu::Snafu;

/// The results of one voting unit (a town).
///
/// Codes are kept as strings: department and town codes carry leading zeros
/// and some of them are not numeric at all ("2A", "ZA").
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ReferendumRecord {
    pub department_code: String,
    pub department_name: String,
    pub town_code: String,
    pub town_name: String,
    pub registered: u64,
    pub abstentions: u64,
    pub null_votes: u64,
    pub choice_a: u64,
    pub choice_b: u64,
}

/// An entry of the region reference table. Unique by `region_code`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Region {
    pub region_code: String,
    pub region_name: String,
}

/// An entry of the department reference table.
///
/// `region_code` is not guaranteed to exist in the region table. Such
/// departments are not usable and get dropped by the reference join.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Department {
    pub department_code: String,
    pub department_name: String,
    pub region_code: String,
}

/// A boundary shape for a region. The geometry is opaque to this crate and
/// is passed through the merge unchanged.
#[derive(PartialEq, Debug, Clone)]
pub struct GeometryFeature<G> {
    pub region_code: String,
    pub geometry: G,
}

// ******** Intermediate data structures *********

/// One department matched to its region.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct DepartmentRegionLookup {
    pub region_code: String,
    pub region_name: String,
    pub department_code: String,
    pub department_name: String,
}

/// A referendum record that has been attached to its region.
///
/// Invariant: `department_code` never contains 'Z'.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct AreaRecord {
    pub department_code: String,
    /// The name from the reference table, not the one in the results file.
    pub department_name: String,
    pub town_code: String,
    pub town_name: String,
    pub region_code: String,
    pub region_name: String,
    pub registered: u64,
    pub abstentions: u64,
    pub null_votes: u64,
    pub choice_a: u64,
    pub choice_b: u64,
}

// ******** Output data structures *********

/// The absolute counts for one region.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RegionSummary {
    pub region_code: String,
    pub region_name: String,
    pub registered: u64,
    pub abstentions: u64,
    pub null_votes: u64,
    pub choice_a: u64,
    pub choice_b: u64,
}

impl RegionSummary {
    /// The ballots cast for either option, `None` on overflow.
    pub fn expressed(&self) -> Option<u64> {
        self.choice_a.checked_add(self.choice_b)
    }
}

/// A region summary with the share of expressed ballots for choice A.
#[derive(PartialEq, Debug, Clone)]
pub struct RegionResult {
    pub summary: RegionSummary,
    /// In [0, 1].
    pub ratio: f64,
}

/// A boundary with the ratio of its region attached.
#[derive(PartialEq, Debug, Clone)]
pub struct SpatialResult<G> {
    pub region_code: String,
    pub geometry: G,
    pub ratio: f64,
}

/// Counters about the rows that the business rules dropped during a run.
///
/// None of these are errors, but a caller can use them to detect an
/// unexpectedly high drop rate.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Diagnostics {
    /// Departments whose region code is not in the region table.
    pub departments_without_region: usize,
    /// Referendum records whose department is not in the lookup table.
    pub records_without_department: usize,
    /// Joined records removed because their department code contains 'Z'.
    pub overseas_records_excluded: usize,
    /// Regions with a result but no boundary.
    pub regions_without_geometry: usize,
    /// Boundaries whose region has no result.
    pub geometries_without_region: usize,
    /// Regions skipped because no ballot was expressed (sorted by code).
    pub regions_without_ratio: Vec<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PipelineOutput<G> {
    pub results: Vec<RegionResult>,
    pub spatial: Vec<SpatialResult<G>>,
    pub diagnostics: Diagnostics,
}

/// Errors that abort a run. A failed run produces no output at all.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    #[snafu(display("Duplicate key {key:?} in {table}"))]
    DuplicateKey { table: String, key: String },

    #[snafu(display(
        "Region {region_code:?} appears with two names: {first:?} and {second:?}"
    ))]
    ConflictingRegionName {
        region_code: String,
        first: String,
        second: String,
    },

    #[snafu(display("Region {region_code:?} has no expressed ballot, its ratio is undefined"))]
    RatioUndefined { region_code: String },

    #[snafu(display("Overflow while summing {field} for region {region_code:?}"))]
    IntegerOverflow {
        region_code: String,
        field: String,
    },
}

// ********* Configuration **********

/// What to do with a region whose choice A and choice B counts are both
/// zero. There is no default: the caller has to pick one.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RatioPolicy {
    /// Fail the run with `PipelineError::RatioUndefined`.
    Abort,
    /// Leave the region out of the results and list it in the diagnostics.
    Skip,
}
