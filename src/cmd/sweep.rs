use crate::reports;
use clap::Args;
use gesturegate::config::Config;
use gesturegate::confirm::{ConfirmationEngine, EngineParams};
use gesturegate::error::GgResult;
use gesturegate::trace::{self, ReplayReport, Trace};
use rayon::prelude::*;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short, long)]
    pub trace: String,
}

/// Replays one trace at every configured level in parallel.
pub fn run(args: &SweepArgs, config: &Config, json: bool) -> GgResult<()> {
    let trace = Trace::load_from_file(&args.trace)?;
    let params = EngineParams::from_config(&config.confirm)?;

    let table: Vec<(u8, f32)> = params
        .thresholds
        .levels()
        .map(|l| (l, params.thresholds.threshold_for(l)))
        .collect();
    info!("Sweeping {} levels over {} frames", table.len(), trace.len());

    let results: Vec<ReplayReport> = table
        .par_iter()
        .map(|&(level, _)| {
            let mut engine = ConfirmationEngine::new(params.clone());
            engine.set_level(level);
            trace::replay(&trace, &mut engine)
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        reports::print_sweep_report(&results, &table);
    }
    Ok(())
}
