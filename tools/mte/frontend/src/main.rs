use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use mte_core::{Machine, Scene, DEMO_BACKGROUND};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "mte")]
#[command(version, about = "Headless driver for the miniature video machine", long_about = None)]
struct Cli {
    /// Number of frames to run
    #[arg(short, long, default_value_t = 64)]
    frames: u64,

    /// PNG file for the last frame
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Nearest-neighbour upscale factor for the PNG
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=16))]
    scale: u32,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,

    /// Skip the periodic fade toward the background
    #[arg(long)]
    no_fade: bool,
}

fn setup_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

/// One frame of the demo: composite, then animate slot 0 and fade.
fn step(machine: &mut Machine, frame: u64, fade: bool) {
    let report = machine.rasterize_sprites();
    if !report.skipped.is_empty() {
        warn!("frame {}: {} sprite infos skipped", frame, report.skipped.len());
    }

    if frame % 4 == 0 {
        let info = &mut machine.sprite_infos_mut()[0];
        info.toggle_flip_y();
        info.x = info.x.wrapping_add(1);
        debug!("frame {}: slot 0 now at x={}, flip_y={}", frame, info.x, info.is_flipped_y());
    }

    if fade && frame % 16 == 0 {
        machine.screen().fade_toward(DEMO_BACKGROUND);
    }
}

fn save_png(machine: &Machine, path: &Path, scale: u32) -> Result<()> {
    let framebuffer = machine.memory().framebuffer();
    let (width, height) = (framebuffer.width() as u32, framebuffer.height() as u32);

    let mut img = RgbaImage::new(width, height);
    framebuffer.write_rgba8(&mut img).context("converting framebuffer")?;

    let img = imageops::resize(&img, width * scale, height * scale, FilterType::Nearest);
    img.save(path).with_context(|| format!("writing {}", path.display()))?;

    info!("wrote {}x{} frame to {}", width * scale, height * scale, path.display());
    Ok(())
}

fn run(cli: &Cli) -> Result<Machine> {
    let mut machine = Machine::new();
    for line in machine.memory_map().to_string().lines() {
        info!("{}", line);
    }

    machine.screen().fill(DEMO_BACKGROUND);
    machine.load_scene(&Scene::demo()).context("loading demo scene")?;

    for frame in 1..=cli.frames {
        step(&mut machine, frame, !cli.no_fade);
    }

    save_png(&machine, &cli.output, cli.scale)?;
    Ok(machine)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);
    info!("stdout logger started");

    run(&cli)?;
    Ok(())
}
