use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use gesturegate::config::Config;
use gesturegate::error::GgResult;
use std::process;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config; flags given on the command line override its values
    #[arg(global = true, long)]
    config: Option<String>,

    /// Print the summary as JSON instead of tables
    #[arg(global = true, long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded prediction trace through the confirmation engine
    Replay(cmd::replay::ReplayArgs),
    /// Generate a synthetic session from a gesture script and run it
    Simulate(cmd::simulate::SimulateArgs),
    /// Replay a trace at every configured level
    Sweep(cmd::sweep::SweepArgs),
}

/// File config (if any) with explicit CLI flags merged on top.
fn resolve_config(path: Option<&str>, cli_config: &Config, sub_matches: &ArgMatches) -> GgResult<Config> {
    match path {
        Some(p) => {
            tracing::info!("Loading config from {}", p);
            let mut config = Config::load_from_file(p)?;
            config.merge_from_cli(cli_config, sub_matches);
            config.validate()?;
            Ok(config)
        }
        None => {
            cli_config.validate()?;
            Ok(cli_config.clone())
        }
    }
}

fn run(cli: &Cli, matches: &ArgMatches) -> GgResult<()> {
    let (cli_config, name) = match &cli.command {
        Commands::Replay(args) => (&args.config, "replay"),
        Commands::Simulate(args) => (&args.config, "simulate"),
        Commands::Sweep(args) => (&args.config, "sweep"),
    };
    // Config flags live inside the subcommand's matches, not the root.
    let sub_matches = matches.subcommand_matches(name).unwrap_or(matches);
    let config = resolve_config(cli.config.as_deref(), cli_config, sub_matches)?;

    match &cli.command {
        Commands::Replay(args) => cmd::replay::run(args, &config, cli.json),
        Commands::Simulate(args) => cmd::simulate::run(args, &config, cli.json),
        Commands::Sweep(args) => cmd::sweep::run(args, &config, cli.json),
    }
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Raw matches distinguish user input from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if let Err(e) = run(&cli, &matches) {
        eprintln!("\n❌ {}", e);
        process::exit(1);
    }
}
