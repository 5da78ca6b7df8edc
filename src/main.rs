mod args;
mod refmap;

use clap::Parser;
use log::{debug, info};

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    debug!("args: {:?}", args);

    match refmap::run_referendum(&args) {
        Ok(_) => info!("Run {} completed", args.config),
        Err(e) => {
            refmap::print_error(&e);
            std::process::exit(1);
        }
    }
}
