use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use multiview::decoder::{SimulatedDecoderFactory, SimulationScript};
use multiview::layout::{LayoutEngine, Template};
use multiview::session::{HeadlessHost, ScreenSession};
use multiview::surface::{DrawTarget, PaintableSurface};
use multiview::utils::{Config, IntoMultiviewError};
use multiview::Size;

/// Multiview - concurrent live-stream playback core
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file to use instead of the system and user files
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute stream container geometry for a template
    Layout {
        /// Template to lay out (a, b or c)
        #[arg(short, long, default_value = "a")]
        template: Template,

        /// Container width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Container height in pixels
        #[arg(long, default_value = "720")]
        height: u32,

        /// Lay out for portrait orientation
        #[arg(long)]
        portrait: bool,

        /// Print the geometry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a headless session with simulated decoders
    Simulate {
        /// Template to start with (a, b or c)
        #[arg(short, long, default_value = "a")]
        template: Template,

        /// How long to play before rotating and switching, in seconds
        #[arg(short, long, default_value = "1")]
        seconds: u64,

        /// Screen width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Screen height in pixels
        #[arg(long, default_value = "720")]
        height: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    let log_level = if args.debug { "debug" } else { config.general.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    debug!("Starting Multiview v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Layout {
            template,
            width,
            height,
            portrait,
            json,
        } => print_layout(&config, template, width, height, !portrait, json),
        Command::Simulate {
            template,
            seconds,
            width,
            height,
        } => simulate(config, template, Duration::from_secs(seconds), Size::new(width, height)).await,
    }
}

fn print_layout(
    config: &Config,
    template: Template,
    width: u32,
    height: u32,
    is_landscape: bool,
    json: bool,
) -> Result<()> {
    let engine = LayoutEngine::new(config.layout.clone());
    let geometry = engine.compute_geometry(width, height, is_landscape, template);

    if json {
        let output = serde_json::to_string_pretty(&geometry)
            .layout_err("Failed to serialize geometry")?;
        println!("{}", output);
        return Ok(());
    }

    println!(
        "Template {} ({}) in {}x{} {:?}",
        template,
        template.name(),
        width,
        height,
        geometry.orientation
    );
    for slot in &geometry.slots {
        println!(
            "  slot {}: {}x{} margin {}",
            slot.slot_index, slot.width_px, slot.height_px, slot.margin_px
        );
    }

    Ok(())
}

async fn simulate(config: Config, template: Template, play_for: Duration, screen: Size) -> Result<()> {
    let factory = Arc::new(SimulatedDecoderFactory::new(SimulationScript::default()));
    let mut current = template;
    let mut surface_id = 0u64;

    // Visit every template once, rotating the screen while each one plays
    for _ in 0..Template::ALL.len() {
        let host = Arc::new(HeadlessHost::new(screen, current.slot_count()));
        let session = ScreenSession::new(current, config.clone(), factory.clone(), host.clone());

        let mut errors = session.streams().errors.subscribe();
        let mut buffering = session.streams().buffering.subscribe();

        session.on_view_created();
        for slot_index in 0..current.slot_count() {
            let Some(target) = host.target(slot_index) else {
                continue;
            };
            let target: Arc<dyn DrawTarget> = target;
            surface_id += 1;
            session.surface_available(slot_index, PaintableSurface::new(surface_id), &target)?;
        }

        session.on_resume();
        report_relayout(session.settle().await);

        tokio::time::sleep(play_for).await;
        for snapshot in buffering.drain() {
            debug!("Buffering: {:?}", snapshot);
        }
        while let Some(failure) = errors.try_next() {
            error!(
                "Stream {} failed ({}): {}",
                failure.slot_index, failure.code, failure.message
            );
        }
        {
            let orchestrator = session.orchestrator().lock();
            info!(
                "Template {}: {} players, playing: {}",
                current,
                orchestrator.handle_count(),
                orchestrator.is_playing()
            );
        }

        host.rotate();
        session.on_orientation_changed();
        report_relayout(session.settle().await);

        let paused = !session.toggle_playback();
        info!("Playback {}", if paused { "paused" } else { "resumed" });

        let next = session.switch_stream().await;
        session.on_destroy();
        current = next;
    }

    info!("Simulation finished, {} decoders created", factory.created());
    Ok(())
}

fn report_relayout(outcome: Option<multiview::scheduler::RelayoutOutcome>) {
    match outcome {
        Some(outcome) => {
            if let Some(geometry) = &outcome.geometry {
                let sizes: Vec<String> = geometry
                    .slots
                    .iter()
                    .map(|slot| format!("{}x{}", slot.width_px, slot.height_px))
                    .collect();
                info!(
                    "Layout after {} ({:?}): {}",
                    outcome.trigger,
                    geometry.orientation,
                    sizes.join(", ")
                );
            }
        }
        None => warn!("Re-layout did not complete"),
    }
}
