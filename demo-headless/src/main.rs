use aerocell_core::{
    DiffusionGridEngine, EmissionSource, EngineConfig, MapPreset, Playback, PlaybackPolicy,
    StopReason,
};
use clap::Parser;
use std::ops::ControlFlow;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shading ramp from faint to saturated
const SHADES: &[u8] = b".:-=+*%@";
/// Values below this render as clean air
const CLEAN_AIR: f32 = 1e-4;
/// Concentration mapped to the first shade
const SHADE_MIN: f32 = 0.1;
/// Concentration mapped to the last shade
const SHADE_MAX: f32 = 1.0;

/// Contaminant release demo on a 2D grid
#[derive(Parser, Debug)]
#[command(name = "aerocell-demo")]
#[command(about = "Headless contaminant diffusion demo", long_about = None)]
struct Args {
    /// Obstacle layout (open, simple, complex)
    #[arg(short, long, default_value = "simple")]
    map: MapPreset,

    /// Grid width in cells
    #[arg(long, default_value_t = 50)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 50)]
    height: usize,

    /// Diffusion coefficient (0-1)
    #[arg(short, long, default_value_t = 0.2)]
    diffusion: f32,

    /// Decay per step (0-1)
    #[arg(long, default_value_t = 0.005)]
    decay: f32,

    /// Maximum number of steps
    #[arg(short, long, default_value_t = 200)]
    steps: u32,

    /// Steps run before stopping on clean air is allowed
    #[arg(long, default_value_t = 5)]
    min_steps: u32,

    /// Field maximum below which the air counts as clean
    #[arg(long, default_value_t = 1e-4)]
    threshold: f32,

    /// Pause between frames in milliseconds
    #[arg(long, default_value_t = 0)]
    frame_delay_ms: u64,

    /// Print a frame every N steps (0 = final frame only)
    #[arg(short, long, default_value_t = 10)]
    report_interval: u32,

    /// Split each step across worker threads by row
    #[arg(long)]
    parallel: bool,

    /// Suppress frames, print only the summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = EngineConfig::new(args.width, args.height, args.diffusion, args.decay)
        .with_parallel(args.parallel);
    let mut engine = match DiffusionGridEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Cannot create engine: {e}");
            return ExitCode::FAILURE;
        }
    };

    args.map.apply(&mut engine);

    let source = EmissionSource::default();
    if !source.release(&mut engine) {
        error!(
            "Release point ({}, {}) lies outside the {}x{} grid",
            source.x,
            source.y,
            engine.width(),
            engine.height()
        );
        return ExitCode::FAILURE;
    }
    info!(
        "Released {} at ({}, {}) on '{}' map",
        source.concentration, source.x, source.y, args.map
    );

    let policy = PlaybackPolicy {
        max_steps: args.steps,
        min_steps: args.min_steps,
        quiescence_threshold: args.threshold,
    };
    let delay = Duration::from_millis(args.frame_delay_ms);

    let summary = Playback::run(&mut engine, &policy, |step, engine| {
        if !args.quiet && is_report_step(step, args.report_interval) {
            print_frame(&format!("Step {step}"), engine);
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        ControlFlow::Continue(())
    });

    if !args.quiet {
        if let Some(label) = closing_frame_label(summary.steps_run, args.report_interval) {
            print_frame(&label, &engine);
        }
    }

    let stats = engine.stats();
    println!("\n=== Simulation Complete ===");
    println!("Steps run: {}", summary.steps_run);
    println!(
        "Stopped: {}",
        match summary.stop_reason {
            StopReason::Completed => "step limit reached",
            StopReason::Quiescent => "air is clean",
            StopReason::Cancelled => "cancelled",
        }
    );
    println!("Remaining mass: {:.4}", stats.total_mass);
    println!("Peak concentration: {:.4}", stats.max_concentration);
    println!("Obstacle cells: {}", stats.obstacle_cells);
    println!("Last step: {:.3} ms", stats.last_step_time_ms);
    println!("Mean step: {:.3} ms", stats.mean_step_time_ms);

    ExitCode::SUCCESS
}

/// Whether the frame after step `step` is printed during playback
fn is_report_step(step: u32, report_interval: u32) -> bool {
    report_interval > 0 && step % report_interval == 0
}

/// Label of the frame printed after playback, `None` if the last step
/// was already shown
fn closing_frame_label(steps_run: u32, report_interval: u32) -> Option<String> {
    match steps_run.checked_sub(1) {
        None => Some("Initial".to_string()),
        Some(last) if is_report_step(last, report_interval) => None,
        Some(last) => Some(format!("Step {last}")),
    }
}

fn print_frame(label: &str, engine: &DiffusionGridEngine) {
    println!(
        "\n{label} | max {:.4} | mass {:.4}",
        engine.max_concentration(),
        engine.total_mass()
    );
    print!("{}", render_frame(engine));
}

/// Map a concentration to its display character
fn shade(value: f32) -> char {
    if value < CLEAN_AIR {
        return ' ';
    }
    let t = ((value - SHADE_MIN) / (SHADE_MAX - SHADE_MIN)).clamp(0.0, 1.0);
    let idx = (t * (SHADES.len() - 1) as f32).round() as usize;
    char::from(SHADES[idx])
}

/// Render the field as text, one line per row, obstacles as `#`
fn render_frame(engine: &DiffusionGridEngine) -> String {
    let mut out = String::with_capacity((engine.width() + 1) * engine.height());
    let mask = engine.obstacles().as_slice();
    for (y, row) in engine.concentration().rows().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            if mask[y * engine.width() + x] {
                out.push('#');
            } else {
                out.push(shade(value));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shade_ramp_endpoints() {
        assert_eq!(shade(0.0), ' ');
        assert_eq!(shade(5e-5), ' ');
        assert_eq!(shade(0.01), '.');
        assert_eq!(shade(1.0), '@');
        assert_eq!(shade(10.0), '@');
    }

    #[test]
    fn test_render_marks_obstacles_and_plume() {
        let mut engine = DiffusionGridEngine::with_dimensions(4, 2, 0.1, 0.0).unwrap();
        engine.add_obstacle(0, 0, 1, 2);
        engine.emit(2, 1, 1.0);

        assert_eq!(render_frame(&engine), "#   \n# @ \n");
    }

    #[test]
    fn test_closing_frame_not_repeated() {
        // 11 steps, interval 10: step 10 was the last one shown
        assert_eq!(closing_frame_label(11, 10), None);
        assert_eq!(closing_frame_label(1, 10), None);
        assert_eq!(closing_frame_label(15, 10), Some("Step 14".to_string()));
    }

    #[test]
    fn test_closing_frame_without_periodic_frames() {
        assert_eq!(closing_frame_label(200, 0), Some("Step 199".to_string()));
        assert_eq!(closing_frame_label(0, 10), Some("Initial".to_string()));
        assert_eq!(closing_frame_label(0, 0), Some("Initial".to_string()));
    }

    #[test]
    fn test_args_parse_map_and_defaults() {
        let args = Args::parse_from(["demo-headless", "--map", "complex", "--quiet"]);
        assert_eq!(args.map, MapPreset::Complex);
        assert!(args.quiet);
        assert_eq!(args.steps, 200);
        assert_eq!(args.diffusion, 0.2);
        assert_eq!(args.frame_delay_ms, 0);

        assert!(Args::try_parse_from(["demo-headless", "--map", "maze"]).is_err());
    }
}
