use crate::reports;
use clap::Args;
use gesturegate::config::Config;
use gesturegate::confirm::ConfirmationEngine;
use gesturegate::error::GgResult;
use gesturegate::trace::{self, Trace};

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub config: Config,

    /// Prediction trace (`time_s,label,confidence`)
    #[arg(short, long)]
    pub trace: String,

    #[arg(short, long)]
    pub level: Option<u8>,
}

pub fn run(args: &ReplayArgs, config: &Config, json: bool) -> GgResult<()> {
    let trace = Trace::load_from_file(&args.trace)?;

    let mut engine = ConfirmationEngine::from_config(&config.confirm)?;
    if let Some(level) = args.level {
        engine.set_level(level);
    }

    let report = trace::replay(&trace, &mut engine);
    engine.evaluate_level();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        reports::print_replay_report(&report);
    }
    Ok(())
}
