use crate::refmap::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::BTreeMap;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub name: String,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "geojsonPath")]
    pub geojson_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub name: String,
    #[serde(rename = "undefinedRatio")]
    pub undefined_ratio: String,
}

/// A CSV table.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TableSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// A single ASCII character. Defaults to ','.
    pub delimiter: Option<String>,
    /// Overrides of the header names, keyed by field name.
    pub columns: Option<BTreeMap<String, String>>,
}

impl TableSource {
    pub fn delimiter_byte(&self) -> RefmapResult<u8> {
        match self.delimiter.as_deref() {
            None => Ok(b','),
            Some(d) if d.len() == 1 && d.is_ascii() => Ok(d.as_bytes()[0]),
            Some(d) => whatever!("{}: invalid delimiter {:?}", self.file_path, d),
        }
    }

    /// The header of the column holding the given field.
    pub fn column(&self, field: &str, default: &str) -> String {
        self.columns
            .as_ref()
            .and_then(|cols| cols.get(field))
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GeometrySource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// The feature property holding the region code. Defaults to "code".
    #[serde(rename = "regionCodeProperty")]
    pub region_code_property: Option<String>,
}

impl GeometrySource {
    pub fn region_code_property(&self) -> &str {
        self.region_code_property.as_deref().unwrap_or("code")
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Sources {
    pub referendum: TableSource,
    pub regions: TableSource,
    pub departments: TableSource,
    /// Without boundaries, only the summary is produced.
    pub geometry: Option<GeometrySource>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RefmapRules {
    #[serde(rename = "undefinedRatio")]
    pub undefined_ratio: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RefmapConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub sources: Sources,
    pub rules: Option<RefmapRules>,
}

pub fn read_config(path: &str) -> RefmapResult<RefmapConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: RefmapConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> RefmapResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {:?}", js["results"]);
    Ok(js)
}

/// Reads the rule for undefined ratios. The command line takes precedence
/// over the configuration, and there is no fallback.
pub fn ratio_policy(cli: Option<&str>, rules: Option<&RefmapRules>) -> RefmapResult<RatioPolicy> {
    let rule = cli.or_else(|| rules.and_then(|r| r.undefined_ratio.as_deref()));
    match rule {
        Some("skip") => Ok(RatioPolicy::Skip),
        Some("abort") => Ok(RatioPolicy::Abort),
        Some(x) => whatever!(
            "unknown undefinedRatio rule: {:?} (expected 'skip' or 'abort')",
            x
        ),
        None => whatever!(
            "no undefinedRatio rule: set it in the configuration or with --undefined-ratio"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let js = r#"{
            "outputSettings": { "name": "Referendum" },
            "sources": {
                "referendum": { "filePath": "referendum.csv", "delimiter": ";",
                                "columns": { "registered": "Inscrits" } },
                "regions": { "filePath": "regions.csv" },
                "departments": { "filePath": "departments.csv" }
            },
            "rules": { "undefinedRatio": "abort" }
        }"#;
        let config: RefmapConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings.summary_path, None);
        assert_eq!(config.sources.geometry, None);
        let referendum = &config.sources.referendum;
        assert_eq!(referendum.delimiter_byte().unwrap(), b';');
        assert_eq!(referendum.column("registered", "Registered"), "Inscrits");
        assert_eq!(referendum.column("abstentions", "Abstentions"), "Abstentions");
        assert_eq!(config.sources.regions.delimiter_byte().unwrap(), b',');
        assert_eq!(
            ratio_policy(None, config.rules.as_ref()).unwrap(),
            RatioPolicy::Abort
        );
    }

    #[test]
    fn invalid_delimiter() {
        let src = TableSource {
            file_path: "x.csv".to_string(),
            delimiter: Some(";;".to_string()),
            columns: None,
        };
        assert!(src.delimiter_byte().is_err());
    }

    #[test]
    fn ratio_policy_precedence() {
        let rules = RefmapRules {
            undefined_ratio: Some("abort".to_string()),
        };
        assert_eq!(
            ratio_policy(Some("skip"), Some(&rules)).unwrap(),
            RatioPolicy::Skip
        );
        assert!(ratio_policy(None, None).is_err());
        assert!(ratio_policy(Some("ignore"), None).is_err());
    }
}
