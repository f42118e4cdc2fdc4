use crate::reports;
use clap::Args;
use gesturegate::classifier::{ClassifierAdapter, TemplateModel};
use gesturegate::config::Config;
use gesturegate::confirm::{ConfirmationEngine, FrameOutcome};
use gesturegate::consts::DEFAULT_TEMPLATE_TEMPERATURE;
use gesturegate::error::GgResult;
use gesturegate::landmarks::{Point3, ScriptedFrame, ScriptedSource};
use gesturegate::pipeline::{GesturePipeline, ManualClock};
use gesturegate::poses;
use gesturegate::telemetry::{CsvSink, TelemetryLogger};
use gesturegate::trace::{self, ReplayReport, SynthOptions, Trace};
use std::thread;
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: Config,

    /// Comma-separated `label:seconds` steps, e.g. `fist:2.0,none:0.5,palm:2.5`
    #[arg(short, long)]
    pub script: String,

    #[arg(long, default_value_t = 30.0)]
    pub fps: f64,

    #[arg(long, default_value_t = 0.95)]
    pub confidence: f32,

    /// Confidence noise, or landmark noise relative to hand size with --landmarks
    #[arg(long, default_value_t = 0.0)]
    pub jitter: f32,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,

    #[arg(short, long)]
    pub level: Option<u8>,

    /// Write the synthesized prediction trace to this CSV
    #[arg(long)]
    pub save_trace: Option<String>,

    /// Drive the full landmark pipeline with reference poses
    #[arg(long, default_value_t = false)]
    pub landmarks: bool,

    /// Template model JSON for --landmarks (defaults to the reference poses)
    #[arg(long)]
    pub model: Option<String>,

    /// Run in real time and log telemetry (implies --landmarks)
    #[arg(long, default_value_t = false)]
    pub telemetry: bool,
}

const HAND_ORIGIN: Point3 = Point3 {
    x: 0.5,
    y: 0.75,
    z: 0.0,
};
const HAND_SCALE: f32 = 0.25;

pub fn run(args: &SimulateArgs, config: &Config, json: bool) -> GgResult<()> {
    let steps = trace::parse_script(&args.script)?;
    let opts = SynthOptions {
        fps: args.fps,
        confidence: args.confidence,
        jitter: if args.landmarks || args.telemetry {
            0.0
        } else {
            args.jitter
        },
        seed: args.seed,
    };
    let synthetic = trace::synthesize(&steps, &opts)?;
    info!(
        "Simulating {} frames ({:.2}s) at {} fps",
        synthetic.len(),
        synthetic.duration().as_secs_f64(),
        args.fps
    );

    if let Some(path) = &args.save_trace {
        synthetic.save_to_file(path)?;
        info!("Trace written to {}", path);
    }

    let report = if args.landmarks || args.telemetry {
        run_pipeline(args, config, &synthetic)?
    } else {
        let mut engine = ConfirmationEngine::from_config(&config.confirm)?;
        if let Some(level) = args.level {
            engine.set_level(level);
        }
        let report = trace::replay(&synthetic, &mut engine);
        engine.evaluate_level();
        report
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        reports::print_replay_report(&report);
    }
    Ok(())
}

fn run_pipeline(args: &SimulateArgs, config: &Config, synthetic: &Trace) -> GgResult<ReplayReport> {
    let model = match &args.model {
        Some(path) => TemplateModel::load_from_file(path)?,
        None => poses::reference_model(DEFAULT_TEMPLATE_TEMPERATURE)?,
    };

    let mut rng = if let Some(s) = args.seed {
        fastrand::Rng::with_seed(s)
    } else {
        fastrand::Rng::new()
    };
    let noise = args.jitter * HAND_SCALE;
    let frames: Vec<ScriptedFrame> = synthetic
        .frames
        .iter()
        .map(|f| match f.prediction {
            Some(p) => ScriptedFrame::Hand(poses::placed(
                p.label,
                HAND_ORIGIN,
                HAND_SCALE,
                noise,
                &mut rng,
            )),
            None => ScriptedFrame::NoHand,
        })
        .collect();

    let clock = ManualClock::new();
    let mut pipeline = GesturePipeline::with_clock(
        ScriptedSource::new(frames),
        ClassifierAdapter::new(model),
        &config.confirm,
        Box::new(clock.clone()),
    )?;
    pipeline.set_game_fps(args.fps as f32);
    if let Some(level) = args.level {
        pipeline.set_level(level);
    }

    let mut logger = None;
    if args.telemetry {
        let (sink, _) = CsvSink::create_in_dir(&config.telemetry.telemetry_dir)?;
        let mut l = TelemetryLogger::new(pipeline.board(), config.telemetry.interval()?);
        l.start(sink);
        logger = Some(l);
    }

    let wall = Instant::now();
    let mut confirmations = Vec::new();
    let mut actions = Vec::new();
    for frame in &synthetic.frames {
        if args.telemetry {
            let elapsed = wall.elapsed();
            if frame.at > elapsed {
                thread::sleep(frame.at - elapsed);
            }
        }
        clock.set(frame.at);
        if let FrameOutcome::Confirmed(record) = pipeline.process() {
            confirmations.push(record);
        }
        if let Some(action) = pipeline.consume_action() {
            actions.push(action);
        }
    }

    if let Some(mut l) = logger {
        l.stop();
    }
    pipeline.release();

    Ok(ReplayReport {
        level: pipeline.level(),
        frames: synthetic.len(),
        confirmations,
        actions,
        evaluation: pipeline.evaluate_level(),
        label_counts: pipeline.engine().stats().per_label_counts(),
    })
}
