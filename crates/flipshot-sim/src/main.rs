mod engine;
mod host;
mod session;

use tracing_subscriber::EnvFilter;

use flipshot_pinball::TableConfig;

use session::{SimOptions, run};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let flag = |name: &str| {
        args.iter()
            .find_map(|a| a.strip_prefix(name).map(String::from))
    };

    let config = match flag("--config=") {
        Some(path) => match TableConfig::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load {path}: {e}");
                std::process::exit(1);
            },
        },
        None => TableConfig::load(),
    };
    if let Err(e) = config.validate() {
        tracing::error!("Invalid table configuration: {e}");
        std::process::exit(1);
    }

    let mut options = SimOptions::default();
    if let Some(fraction) = flag("--drag=").and_then(|v| v.parse::<f32>().ok()) {
        options.drag_fraction = fraction.clamp(0.0, 1.0);
    }
    if let Some(seconds) = flag("--seconds=").and_then(|v| v.parse::<f32>().ok()) {
        options.seconds = seconds.max(0.0);
    }
    let json = args.iter().any(|a| a == "--json");

    tracing::info!(
        drag = options.drag_fraction,
        seconds = options.seconds,
        "Starting scripted round"
    );
    let report = run(config, options);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("Failed to encode report: {e}");
                std::process::exit(1);
            },
        }
        return;
    }

    println!(
        "{} frames, {} physics ticks",
        report.frames, report.ticks
    );
    println!(
        "launches: {}  cancelled: {}  drains: {}",
        report.launches, report.cancelled, report.drains
    );
    println!(
        "paddle sweeps: {}  balls struck: {}",
        report.discharges, report.balls_struck
    );
    for ball in &report.snapshot.balls {
        println!(
            "{}: {:?} at ({:.2}, {:.2}, {:.2})",
            ball.id, ball.state, ball.position.x, ball.position.y, ball.position.z
        );
    }
}
