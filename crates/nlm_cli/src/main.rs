//! Command line Non-Local Means denoiser.
//!
//! Reads run paths from a YAML configuration file and NLM parameters from
//! the command line, then denoises either a single grayscale image or a
//! whole dataset tree, logging timing and CNR/CV quality metrics.

mod config;
mod io;
mod process;

use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use nlm_core::NlmConfig;

#[derive(Parser, Debug)]
#[command(name = "nlm", version, about = "Non-Local Means grayscale image denoiser")]
struct Args {
    /// Smoothing parameter
    #[arg(long = "h", default_value_t = 15.0)]
    h: f64,

    /// Size of the processing window
    #[arg(long, default_value_t = 3)]
    small_window_size: usize,

    /// Size of the search window
    #[arg(long, default_value_t = 21)]
    big_window_size: usize,

    /// Save denoised images under the configured save path
    #[arg(long)]
    save: bool,

    /// Process the single image named in the configuration
    #[arg(long)]
    single: bool,

    /// Process the whole dataset tree
    #[arg(long)]
    process_all: bool,

    /// Path to the YAML run configuration
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    info!(
        "args set: h: {} small-window-size: {} big-window-size: {} save: {} mode: single: {}, all-data: {}",
        args.h, args.small_window_size, args.big_window_size, args.save, args.single, args.process_all
    );

    let run = config::load(&args.config)?;
    let nlm = NlmConfig::new(args.h, args.small_window_size, args.big_window_size);
    nlm.validate()?;

    if args.single {
        process::run_single(&run, &nlm, args.save)
    } else if args.process_all {
        process::run_dataset(&run, &nlm, args.save)
    } else {
        bail!("nothing to do: pass --single or --process-all");
    }
}
