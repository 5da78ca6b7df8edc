pub use crate::config::*;

use log::warn;
use std::collections::HashMap;

/// A builder for assembling the inputs of a run row by row.
///
/// Convenient when the tables come from a source that is read one line at
/// a time.
///
/// ```
/// use referendum_regions::builder::Builder;
/// use referendum_regions::RatioPolicy;
/// # use referendum_regions::PipelineError;
///
/// let mut builder = Builder::<()>::new(RatioPolicy::Abort)
///     .region("R1", "Region1")
///     .department("01", "Dep1", "R1");
///
/// builder.add_town("01", "001", "Town1", [1000, 100, 10, 450, 440]);
/// builder.add_feature("R1", ());
///
/// let output = builder.run()?;
/// assert_eq!(output.spatial.len(), 1);
///
/// # Ok::<(), PipelineError>(())
/// ```
pub struct Builder<G> {
    pub(crate) _policy: RatioPolicy,
    pub(crate) _regions: Vec<Region>,
    pub(crate) _departments: Vec<Department>,
    pub(crate) _department_names: HashMap<String, String>,
    pub(crate) _records: Vec<ReferendumRecord>,
    pub(crate) _features: Vec<GeometryFeature<G>>,
}

impl<G> Builder<G> {
    pub fn new(policy: RatioPolicy) -> Builder<G> {
        Builder {
            _policy: policy,
            _regions: Vec::new(),
            _departments: Vec::new(),
            _department_names: HashMap::new(),
            _records: Vec::new(),
            _features: Vec::new(),
        }
    }

    pub fn region(mut self, code: &str, name: &str) -> Builder<G> {
        self._regions.push(Region {
            region_code: code.to_string(),
            region_name: name.to_string(),
        });
        self
    }

    pub fn department(mut self, code: &str, name: &str, region_code: &str) -> Builder<G> {
        self._department_names
            .entry(code.to_string())
            .or_insert_with(|| name.to_string());
        self._departments.push(Department {
            department_code: code.to_string(),
            department_name: name.to_string(),
            region_code: region_code.to_string(),
        });
        self
    }

    /// Adds the results of a town.
    ///
    /// counts: registered, abstentions, null votes, choice A, choice B.
    /// The department name is taken from the first department declared with
    /// this code. An undeclared department keeps its code as name; the town
    /// is then dropped by the run and counted in the diagnostics.
    pub fn add_town(
        &mut self,
        department_code: &str,
        town_code: &str,
        town_name: &str,
        counts: [u64; 5],
    ) {
        let department_name = match self._department_names.get(department_code) {
            Some(name) => name.clone(),
            None => {
                warn!(
                    "Builder: town {} ({}): unknown department {:?}",
                    town_code, town_name, department_code
                );
                department_code.to_string()
            }
        };
        self.add_record(ReferendumRecord {
            department_code: department_code.to_string(),
            department_name,
            town_code: town_code.to_string(),
            town_name: town_name.to_string(),
            registered: counts[0],
            abstentions: counts[1],
            null_votes: counts[2],
            choice_a: counts[3],
            choice_b: counts[4],
        })
    }

    pub fn add_record(&mut self, record: ReferendumRecord) {
        self._records.push(record);
    }

    pub fn add_feature(&mut self, region_code: &str, geometry: G) {
        self._features.push(GeometryFeature {
            region_code: region_code.to_string(),
            geometry,
        });
    }

    /// Runs the pipeline on everything added so far.
    pub fn run(self) -> Result<PipelineOutput<G>, PipelineError> {
        crate::run_pipeline(
            &self._records,
            &self._regions,
            &self._departments,
            self._features,
            self._policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_matches_direct_call() {
        let mut builder = Builder::<u8>::new(RatioPolicy::Skip)
            .region("R1", "Region1")
            .region("R2", "Region2")
            .department("01", "Dep1", "R1")
            .department("02", "Dep2", "R2");
        builder.add_town("01", "001", "Town1", [1000, 100, 10, 450, 440]);
        builder.add_town("02", "002", "Town2", [2000, 200, 20, 900, 880]);
        builder.add_feature("R2", 2);

        let regions = builder._regions.clone();
        let departments = builder._departments.clone();
        let records = builder._records.clone();
        assert_eq!(records[1].department_name, "Dep2");

        let out = builder.run().unwrap();
        let direct = crate::run_pipeline(
            &records,
            &regions,
            &departments,
            vec![GeometryFeature {
                region_code: "R2".to_string(),
                geometry: 2,
            }],
            RatioPolicy::Skip,
        )
        .unwrap();
        assert_eq!(out, direct);
        assert_eq!(out.spatial[0].geometry, 2);
        assert_eq!(out.diagnostics.regions_without_geometry, 1);
    }

    #[test]
    fn unknown_department_town() {
        let mut builder = Builder::<u8>::new(RatioPolicy::Abort)
            .region("R1", "Region1")
            .department("01", "Dep1", "R1")
            .department("01", "Dep1 bis", "R1");
        builder.add_town("01", "001", "Town1", [1000, 100, 10, 450, 440]);
        builder.add_town("07", "007", "Town7", [70, 7, 0, 30, 33]);
        assert_eq!(builder._records[0].department_name, "Dep1");
        assert_eq!(builder._records[1].department_name, "07");

        let (results, diagnostics) = crate::compute_region_results(
            &builder._records,
            &builder._regions,
            &builder._departments[..1],
            RatioPolicy::Abort,
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summary.registered, 1000);
        assert_eq!(diagnostics.records_without_department, 1);
    }
}
