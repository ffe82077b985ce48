mod brush;

use anyhow::{Context, Result};
use brush::{cells_in_circle, DragStroke};
use clap::Parser;
use fluid_sim_core::solver::DEFAULT_WORLD_SIZE;
use fluid_sim_core::{
    DensityEdit, FluidSession, FluidSimError, GridGeometry, QualityPreset, RunState,
    SolverParams, Vec2,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Stable-fluids demo running a scripted session without a window
#[derive(Parser, Debug)]
#[command(name = "fluid-sim-demo")]
#[command(about = "Headless stable-fluids demo", long_about = None)]
struct Args {
    /// Quality preset (low, medium, high, ultra)
    #[arg(short, long, default_value = "medium")]
    quality: QualityPreset,

    /// Grid resolution, overriding the preset
    #[arg(short = 'n', long)]
    resolution: Option<usize>,

    /// World-space side length of the grid
    #[arg(short, long, default_value_t = DEFAULT_WORLD_SIZE)]
    world_size: f32,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Frame rate of the simulated clock
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// JSON file with solver parameters (missing fields keep their defaults)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Diffusion rate, overriding the parameter file
    #[arg(long)]
    diffusion: Option<f32>,

    /// CFL factor, overriding the parameter file
    #[arg(long)]
    cfl: Option<f32>,

    /// Gauss-Seidel iterations, overriding the preset and parameter file
    #[arg(long)]
    iterations: Option<usize>,

    /// Minimum sub-steps per second, overriding the parameter file
    #[arg(long)]
    min_steps: Option<u32>,

    /// Brush radius in world units
    #[arg(short, long, default_value_t = 0.6)]
    brush_radius: f32,

    /// Drag force multiplier
    #[arg(long, default_value_t = 1.0)]
    move_force: f32,

    /// Frames spent dragging across the grid after starting
    #[arg(long, default_value_t = 30)]
    drag_frames: u32,

    /// Chance per frame of a random density puff
    #[arg(long, default_value_t = 0.0)]
    puff_chance: f64,

    /// Seed for random puffs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Report interval in frames
    #[arg(short, long, default_value_t = 60)]
    report_interval: u32,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    frames: u32,
    sub_steps: u64,
    final_state: RunState,
    resolution: usize,
    params: SolverParams,
    total_density: f32,
    max_speed: f32,
    max_divergence: f32,
    restored_density: f32,
}

fn load_params(args: &Args) -> Result<SolverParams> {
    let mut params = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => args.quality.apply(SolverParams::default()),
    };

    if let Some(diffusion) = args.diffusion {
        params.diffusion_rate = diffusion;
    }
    if let Some(cfl) = args.cfl {
        params.cfl = cfl;
    }
    if let Some(iterations) = args.iterations {
        params.gauss_seidel_iterations = iterations;
    }
    if let Some(min_steps) = args.min_steps {
        params.minimum_steps_per_second = min_steps;
    }
    params.validate()?;
    Ok(params)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let resolution = args.resolution.unwrap_or(args.quality.resolution());
    let geometry = GridGeometry::new(resolution, args.world_size)?;
    let params = load_params(&args)?;
    let mut session = FluidSession::new(geometry, params)?;

    println!("=== Fluid Simulation Demo ===\n");
    println!(
        "Grid: {}x{} cells over {:.2} units (cell {:.4})",
        geometry.resolution,
        geometry.resolution,
        geometry.world_size,
        geometry.cell_size()
    );
    println!(
        "Params: diffusion {:.4}, CFL {:.2}, {} iterations, >= {} steps/s\n",
        params.diffusion_rate,
        params.cfl,
        params.gauss_seidel_iterations,
        params.minimum_steps_per_second
    );

    // Seed a blob on the left while stopped so stop() can restore it.
    let size = geometry.world_size;
    let seed_cells = cells_in_circle(
        Vec2::new(0.3 * size, 0.5 * size),
        args.brush_radius * 1.5,
        &geometry,
    );
    session.paint_density(&seed_cells, DensityEdit::Fill)?;
    info!("Painted {} starting cells", seed_cells.len());

    session.toggle_start_pause();

    let frame_dt = 1.0 / args.fps;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut stroke = DragStroke::default();
    let mut sub_steps: u64 = 0;
    let mut frames_run = 0;

    println!("Frame | State   | Steps | dt(ms) |   FPS | Steps/s | Density | Max speed | Max div");
    println!("------|---------|-------|--------|-------|---------|---------|-----------|--------");

    for frame in 0..args.frames {
        // Sweep the brush left to right through the middle of the grid.
        if frame < args.drag_frames {
            let progress = frame as f32 / args.drag_frames.max(1) as f32;
            let position = Vec2::new((0.2 + 0.6 * progress) * size, 0.5 * size);
            if let Some((cells, movement)) =
                stroke.advance(position, args.brush_radius, args.move_force, &geometry)
            {
                session.drag(&cells, movement)?;
            }
        } else if stroke.is_active() {
            stroke.finish();
            session.end_drag();
        }

        if args.puff_chance > 0.0 && rng.random_bool(args.puff_chance.min(1.0)) {
            let center = Vec2::new(
                rng.random_range(0.0..size),
                rng.random_range(0.0..size),
            );
            let cells = cells_in_circle(center, args.brush_radius, &geometry);
            session.paint_density(&cells, DensityEdit::Fill)?;
        }

        frames_run = frame + 1;
        match session.update(frame_dt) {
            Ok(report) => sub_steps += u64::from(report.sub_steps),
            Err(err @ FluidSimError::StepRateExceeded { .. }) => {
                warn!("Stopping run at frame {}: {}", frame, err);
                break;
            }
            Err(err) => return Err(err.into()),
        }

        if frame % args.report_interval.max(1) == 0 {
            let solver = session.solver();
            let stats = session.stats();
            let state = format!("{:?}", session.state());
            println!(
                "{:5} | {:7} | {:5} | {:6.2} | {:5} | {:7} | {:7.2} | {:9.3} | {:7.4}",
                frame,
                state,
                sub_steps,
                solver.time_step() * 1000.0,
                stats.fps(),
                stats.steps_per_second(),
                solver.total_density(),
                solver.max_speed(),
                solver.max_divergence()
            );
        }
    }

    let solver = session.solver();
    let mut summary = RunSummary {
        frames: frames_run,
        sub_steps,
        final_state: session.state(),
        resolution: geometry.resolution,
        params: solver.params(),
        total_density: solver.total_density(),
        max_speed: solver.max_speed(),
        max_divergence: solver.max_divergence(),
        restored_density: 0.0,
    };

    session.stop();
    summary.restored_density = session.solver().total_density();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n=== Simulation Complete ===");
        println!("Frames: {} ({} sub-steps)", summary.frames, summary.sub_steps);
        println!("Final state: {:?}", summary.final_state);
        println!("Total density: {:.3}", summary.total_density);
        println!("Max speed: {:.3}", summary.max_speed);
        println!("Max divergence: {:.5}", summary.max_divergence);
        println!("Density restored on stop: {:.3}", summary.restored_density);
    }

    Ok(())
}
