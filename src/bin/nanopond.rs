//! nanopond: run the artificial-life simulation until interrupted.
//!
//! Flags follow this codebase's existing `--flag value` parsing style (see
//! the historical `prover`/`verifier` binaries this crate also ships):
//! every [`nanopond::Config`] field has a matching `--kebab-case` flag, plus
//! `--csv-path`, `--viz`, `--viz-path`, and `--viz-frequency` for the
//! reporting/visualization sinks.

use std::fs::File;
use std::io::BufWriter;

use nanopond::{Config, CsvSink, ExitSignal, World};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = Config::from_args(args)?;

    let exit = ExitSignal::new();
    let handler_exit = exit.clone();
    ctrlc::set_handler(move || {
        tracing::info!(target: "sim.scheduler", "interrupt_received");
        handler_exit.set();
    })?;

    let mut world = World::new(&cfg);

    tracing::info!(
        target: "sim.scheduler",
        pond_size_x = cfg.pond_size_x,
        pond_size_y = cfg.pond_size_y,
        pond_depth = cfg.pond_depth,
        random_seed = cfg.random_seed,
        "starting_run"
    );

    match &cfg.csv_path {
        Some(path) => {
            let file = File::create(path)?;
            let mut sink = CsvSink::new(BufWriter::new(file));
            nanopond::run(&cfg, &mut world, &mut sink, &exit)?;
        }
        None => {
            let mut sink = CsvSink::new(std::io::stdout());
            nanopond::run(&cfg, &mut world, &mut sink, &exit)?;
        }
    }

    Ok(())
}
