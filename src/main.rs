use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use aligntrack::geometry::Viewport;
use aligntrack::io::DetectionLog;
use aligntrack::link::{AlignmentCommand, LinkConfig, SerialLink};
use aligntrack::system::{
    DivisorHandle, FrameOutcome, Pipeline, SelectionOutcome, SelectionRequest,
};
use aligntrack::tracking::{Observation, TrackingSession};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let log_path = args
        .next()
        .unwrap_or_else(|| "data/detections.csv".to_string());
    let viewport_width: f32 = parse_arg(args.next(), 1080.0, "viewport width")?;
    let viewport_height: f32 = parse_arg(args.next(), 1920.0, "viewport height")?;
    let divisor: u32 = parse_arg(args.next(), 1, "frame divisor")?;

    println!("Loading detection log from: {}", log_path);
    let log = DetectionLog::load(&log_path)?;
    println!("Loaded {} frames", log.len());

    let frame_numbers: Vec<u64> = log.frame_numbers().collect();
    let mut detector = log.into_detector();

    let mut pipeline = Pipeline::new(
        TrackingSession::new(),
        Viewport::new(viewport_width, viewport_height),
        DivisorHandle::new(divisor),
    );
    pipeline.request_selection(SelectionRequest::NearestCenter);

    // Commands go to stdout as they would to the controller's serial port.
    let link = SerialLink::new(LinkConfig::default());
    link.connect(std::io::stdout());

    let mut tracked = 0usize;
    let mut lost = 0usize;
    for &number in &frame_numbers {
        let outcome = pipeline.process(number, &mut detector);
        match outcome {
            FrameOutcome::Skipped => {}
            FrameOutcome::DetectorFailed | FrameOutcome::Malformed => {
                println!("Frame {}: no usable detections", number);
            }
            FrameOutcome::Idle {
                candidates,
                selection,
            } => {
                println!("Frame {}: {} candidates", number, candidates.len());
                match selection {
                    Some(SelectionOutcome::Locked(event)) => println!("  {:?}", event),
                    Some(SelectionOutcome::NoCandidate) => {
                        // Keep asking until something shows up.
                        pipeline.request_selection(SelectionRequest::NearestCenter);
                    }
                    None => {}
                }
            }
            FrameOutcome::Locked(Observation::Tracked(report)) => {
                tracked += 1;
                println!(
                    "Frame {}: {} dx={:.1} dy={:.1} {}",
                    number,
                    report
                        .identity
                        .map_or_else(|| "untracked".to_string(), |id| id.to_string()),
                    report.deviation.x,
                    report.deviation.y,
                    if report.aligned { "ALIGNED" } else { "off" }
                );
                if let Err(e) = link.transmit(&AlignmentCommand::from_report(&report)) {
                    tracing::warn!("{:#}", e);
                }
            }
            FrameOutcome::Locked(Observation::Lost { consecutive, .. }) => {
                lost += 1;
                println!("Frame {}: target lost ({} frames)", number, consecutive);
            }
            FrameOutcome::Locked(other) => {
                println!("Frame {}: {:?}", number, other);
            }
        }
    }

    println!(
        "Done! {} frames, {} tracked, {} lost, aligned at end: {}",
        frame_numbers.len(),
        tracked,
        lost,
        pipeline.session().is_aligned()
    );

    pipeline.stop();
    link.disconnect();
    Ok(())
}

fn parse_arg<T>(arg: Option<String>, default: T, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match arg {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", what, raw)),
        None => Ok(default),
    }
}
