use std::{path::PathBuf, sync::mpsc, thread};

use clap::{Parser, Subcommand};
use pulse_ring_core::{
    AppConfig, Event, FrameRecorder, HeadlessTextures, ImageSource, ParamName, Pipeline,
    SettingValue, TapTempo, UploadOutcome,
};
use tracing_subscriber::EnvFilter;

fn main() -> pulse_ring_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_session(args),
        Commands::Tap { timestamps } => run_tap(&timestamps),
        Commands::Defaults => {
            println!("{}", AppConfig::live_defaults().to_json()?);
            Ok(())
        }
    }
}

fn run_session(args: RunArgs) -> pulse_ring_core::Result<()> {
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::live_defaults(),
    };
    tracing::info!(frames = args.frames, fps = args.fps, "starting headless session");

    let mut pipeline = Pipeline::new(&config, HeadlessTextures::new(), FrameRecorder::new());

    for (name, value) in args.assignments {
        pipeline.handle(Event::SettingChanged { name, value })?;
    }

    // Uploads decode on worker threads; results come back through the channel
    // and are applied on this thread only.
    let (tx, rx) = mpsc::channel::<UploadOutcome>();
    let mut workers = Vec::new();
    for path in args.images {
        match pipeline.begin_upload(ImageSource::Path(path.clone())) {
            Ok(job) => {
                let tx = tx.clone();
                workers.push(thread::spawn(move || {
                    let _ = tx.send(job.run());
                }));
            }
            Err(error) => tracing::warn!(path = %path.display(), %error, "skipping upload"),
        }
    }
    drop(tx);

    let fps = if args.fps.is_finite() && args.fps > 0.0 {
        args.fps
    } else {
        60.0
    };
    let delta = 1.0 / fps;
    let mut taps = args.taps;
    taps.sort_by(|a, b| a.total_cmp(b));
    let mut taps = taps.into_iter().peekable();

    for frame in 0..args.frames {
        let elapsed_ms = frame as f64 * 1000.0 / fps as f64;
        while let Some(timestamp_ms) = taps.next_if(|&t| t <= elapsed_ms) {
            pipeline.handle(Event::Tap { timestamp_ms })?;
        }

        if args.pause_at == Some(frame) {
            pipeline.handle(Event::SettingChanged {
                name: ParamName::Animate,
                value: false.into(),
            })?;
        }

        if let Some((width, height)) = args.resize {
            if frame == args.frames / 2 {
                pipeline.handle(Event::Resize { width, height })?;
            }
        }

        while let Ok(outcome) = rx.try_recv() {
            apply_upload(&mut pipeline, outcome)?;
        }

        pipeline.handle(Event::Frame {
            delta_seconds: delta,
        })?;
    }

    for taps_left in taps {
        pipeline.handle(Event::Tap {
            timestamp_ms: taps_left,
        })?;
    }
    for outcome in rx {
        apply_upload(&mut pipeline, outcome)?;
    }
    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("upload worker panicked");
        }
    }

    tracing::info!(
        frames = pipeline.render().stage().frames(),
        bpm = pipeline.settings().bpm(),
        "session finished"
    );
    println!("{}", serde_json::to_string_pretty(pipeline.params())?);
    Ok(())
}

fn apply_upload(
    pipeline: &mut Pipeline<HeadlessTextures, FrameRecorder>,
    outcome: UploadOutcome,
) -> pulse_ring_core::Result<()> {
    if let Some(status) = pipeline.handle(Event::ImageLoaded(outcome))? {
        tracing::info!(%status, "upload finished");
    }
    Ok(())
}

fn run_tap(timestamps: &[f64]) -> pulse_ring_core::Result<()> {
    let mut tempo = TapTempo::default();
    let estimate = timestamps
        .iter()
        .fold(None, |_, &timestamp| tempo.record_tap(timestamp));

    match estimate {
        Some(bpm) => println!("{bpm}"),
        None => println!("need at least two taps"),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_assignment(raw: &str) -> Result<(ParamName, SettingValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    let name: ParamName = name.trim().parse().map_err(|err| format!("{err}"))?;
    let value = name.parse_value(value).map_err(|err| format!("{err}"))?;
    Ok((name, value))
}

fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{raw}`"))?;
    let width = width.trim().parse().map_err(|_| format!("bad width in `{raw}`"))?;
    let height = height.trim().parse().map_err(|_| format!("bad height in `{raw}`"))?;
    Ok((width, height))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pulsing ring visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the pipeline headlessly and print the final render parameters.
    Run(RunArgs),
    /// Estimate BPM from tap timestamps in milliseconds.
    Tap {
        #[arg(value_delimiter = ',', required = true, allow_negative_numbers = true)]
        timestamps: Vec<f64>,
    },
    /// Print the default configuration as JSON.
    Defaults,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of frames to render.
    #[arg(long, default_value_t = 120)]
    frames: u32,
    #[arg(long, default_value_t = 60.0)]
    fps: f32,
    /// Image to upload; may be repeated. Uploads decode concurrently.
    #[arg(long = "image")]
    images: Vec<PathBuf>,
    /// Comma-separated tap timestamps in milliseconds of session time.
    #[arg(long = "tap", value_delimiter = ',')]
    taps: Vec<f64>,
    /// Setting override such as `ringRadius=0.3`; may be repeated.
    #[arg(long = "set", value_parser = parse_assignment)]
    assignments: Vec<(ParamName, SettingValue)>,
    /// Frame at which animation is switched off.
    #[arg(long)]
    pause_at: Option<u32>,
    /// Viewport size applied halfway through, e.g. `1920x1080`.
    #[arg(long, value_parser = parse_size)]
    resize: Option<(u32, u32)>,
}
