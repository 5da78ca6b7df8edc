use clap::Parser;

/// Summarizes referendum results per region and attaches them to the region boundaries.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the run: input tables, boundaries, outputs and rules.
    /// For more information about the file format, read the manual of the referendum_regions crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference summary in JSON format. If provided, refmap will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the run will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the boundaries with their ratio will be written in GeoJSON format to the given
    /// location. Setting this option overrides the path that may be specified in the configuration.
    #[clap(long, value_parser)]
    pub geojson_out: Option<String>,

    /// ('skip' or 'abort') What to do with a region without any expressed ballot. Setting this option overrides
    /// the rule that may be specified in the configuration. One of them must be provided.
    #[clap(long, value_parser)]
    pub undefined_ratio: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
