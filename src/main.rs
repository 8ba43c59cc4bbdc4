use anyhow::Context;
use clap::Parser;

use stereograph::{AppConfig, LoggingConfig, StereoConfig, init_logging};

/// Side-by-side stereo viewer.
///
/// Move the rig with A/D (strafe) and W/S (forward/back). Drag with the left
/// mouse button to orbit the main camera, with the right button to pan, and
/// scroll to zoom. F1 toggles a flat tint on both eye views, F2 the depth
/// preview. Escape quits.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Distance between the two eye cameras.
    #[arg(long, default_value_t = 10.0)]
    baseline: f32,

    /// Distance the rig moves per key press.
    #[arg(long, default_value_t = 0.5)]
    step: f32,

    /// Initial window width.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Hide the FPS panel.
    #[arg(long)]
    no_stats: bool,

    /// Show the depth preview from the start.
    #[arg(long)]
    depth_preview: bool,

    /// Log filter, e.g. "debug" or "stereograph=trace,wgpu=warn".
    #[arg(long)]
    log: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default();
    if let Some(filter) = &cli.log {
        logging = logging.filter(filter);
    }
    init_logging(logging);

    let config = AppConfig::new()
        .title("Stereograph")
        .size(cli.width, cli.height)
        .stereo(StereoConfig::new().baseline(cli.baseline).step(cli.step))
        .show_stats(!cli.no_stats)
        .depth_preview(cli.depth_preview);

    stereograph::run(config).context("stereo viewer failed")
}
