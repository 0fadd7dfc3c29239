use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use companion_overlay::{
    ControlId, ControlKind, ItemKind, MemoryHost, NodeClass, OverlayConfig, OverlayEvent,
    OverlayRenderer, Rect,
};
use glam::Vec3;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Run the companion overlay headless against an in-memory window", version)]
struct Args {
    /// Simulated seconds to run
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Frame rate of the simulated display
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// RNG seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON overlay config; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mischievousness in [0, 1]
    #[arg(long)]
    mischief: Option<f32>,

    /// Drop a toy, a bamboo stick and a hat at startup
    #[arg(long)]
    items: bool,
}

#[derive(Serialize)]
struct ControlReport {
    id: ControlId,
    kind: &'static str,
    activations: u32,
}

#[derive(Serialize)]
struct Summary {
    simulated_seconds: f64,
    frames: u64,
    decisions: u64,
    interactions: u64,
    activations: u32,
    index_rebuilds: u64,
    character_moves: usize,
    below_changes: usize,
    final_state: companion_overlay::BehaviorState,
    final_position: [f32; 3],
    controls: Vec<ControlReport>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    ensure!(args.seconds >= 0.0, "--seconds must be non-negative");
    ensure!(args.fps > 0.0, "--fps must be positive");

    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            OverlayConfig::from_json_str(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => OverlayConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let host = Rc::new(RefCell::new(MemoryHost::new(800.0, 600.0)));
    let controls = populate(&mut host.borrow_mut());

    let mut overlay = OverlayRenderer::new(&host, config).context("attaching overlay")?;
    if let Some(m) = args.mischief {
        let p = overlay.config().behavior.playfulness;
        let b = &overlay.config().behavior;
        let interval = (b.min_interval, b.max_interval);
        overlay.set_behavior_parameters(m, p, interval)?;
    }
    if args.items {
        overlay.spawn_item(ItemKind::Toy, Vec3::new(-0.8, 1.0, 0.3));
        overlay.spawn_item(ItemKind::Food, Vec3::new(0.6, 0.8, -0.2));
        overlay.spawn_item(ItemKind::Clothing, Vec3::new(0.2, 1.5, 0.5));
    }

    let frame_dt = 1.0 / args.fps;
    let frames = (args.seconds * args.fps).ceil() as u64;
    let (mut moves, mut below_changes) = (0, 0);
    for _ in 0..frames {
        overlay.tick(frame_dt);
        for event in overlay.drain_events() {
            match event {
                OverlayEvent::CharacterMoved { .. } => moves += 1,
                OverlayEvent::ControlBelowChanged { .. } => below_changes += 1,
                OverlayEvent::ControlActivated { id, kind } => {
                    log::info!("activated {} {:?}", kind.type_name(), id);
                }
            }
        }
    }

    let host = host.borrow();
    let position = overlay.character().body.position;
    let summary = Summary {
        simulated_seconds: overlay.now(),
        frames: overlay.frame_count(),
        decisions: overlay.decisions(),
        interactions: overlay.completed_interactions(),
        activations: host.total_activations(),
        index_rebuilds: overlay.index_rebuilds(),
        character_moves: moves,
        below_changes,
        final_state: overlay.behavior_state(),
        final_position: position.to_array(),
        controls: controls
            .iter()
            .map(|&(id, kind)| ControlReport {
                id,
                kind: kind.type_name(),
                activations: host.activation_count(id),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// A small settings dialog: a tab strip, a form and an OK/Cancel row.
fn populate(host: &mut MemoryHost) -> Vec<(ControlId, ControlKind)> {
    let mut controls = Vec::new();
    let mut add = |kind: ControlKind, rect: Rect| {
        let id = host.add_control(kind, rect);
        controls.push((id, kind));
        id
    };

    let tabs = add(ControlKind::Tab, Rect::new(20.0, 20.0, 760.0, 30.0));
    add(ControlKind::Checkbox, Rect::new(60.0, 120.0, 160.0, 24.0));
    let volume = add(ControlKind::Slider, Rect::new(300.0, 200.0, 200.0, 24.0));
    let theme = add(ControlKind::Combo, Rect::new(300.0, 260.0, 160.0, 26.0));
    add(ControlKind::Textbox, Rect::new(300.0, 320.0, 240.0, 26.0));
    let ok = add(ControlKind::Button, Rect::new(560.0, 540.0, 100.0, 32.0));
    add(ControlKind::Button, Rect::new(680.0, 540.0, 100.0, 32.0));

    host.configure_indexed(tabs, 4, 0);
    host.configure_slider(volume, 0, 100, 50);
    host.configure_indexed(theme, 3, 0);
    // Label inside the OK button, resolved to the button by the index.
    host.add_node(ok, NodeClass::Passive, Rect::new(580.0, 548.0, 60.0, 16.0));
    controls
}
