//! Headless playback: drives the visualization with a fixed-step (or paced
//! wall) clock and reports which time keys were shown and how long each frame
//! hook took.

use clap::Parser;
use colored::Colorize;
use solar_hex_rust::config::VisualizationConfig;
use solar_hex_rust::controller::{PlaybackHook, VisualizationController};
use solar_hex_rust::data_loader::load_inputs;
use solar_hex_rust::error::Result;
use solar_hex_rust::hex_prototype::HexPrototype;
use solar_hex_rust::scene::{FixedStepClock, FrameClock, FrameHook, FramePacer, SceneContext, WallClock};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

#[derive(Debug, Parser)]
#[command(name = "solar-playback", about = "Play a solar time series over hex cells without a renderer")]
struct Args {
    /// GeoJSON FeatureCollection of the region
    #[arg(long)]
    geo: PathBuf,

    /// Time-series JSON from solar-generate
    #[arg(long)]
    series: PathBuf,

    #[arg(long, default_value_t = 600)]
    frames: u64,

    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// JSON overrides for the visualization settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use real elapsed time, paced to --fps, instead of a fixed step
    #[arg(long)]
    realtime: bool,
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => VisualizationConfig::from_json_file(path)?,
        None => VisualizationConfig::default(),
    };

    let (features, series) = load_inputs(&args.geo, &args.series)?;
    let controller = VisualizationController::new(&features, series, Rc::new(HexPrototype::new()), config)?;
    let controller = Rc::new(RefCell::new(controller));

    println!("🌞 {}", "Solar hex playback".bold());
    {
        let controller = controller.borrow();
        println!("  Cells:      {}", controller.registry().len());
        println!("  Time keys:  {}", controller.time_keys().len());
        println!("  Daily max:  {:.1} Wh", controller.daily_max());
        let fit = controller.view_fit();
        println!("  View fit:   scale {:.2}, offset ({:.2}, {:.2})", fit.scale, fit.offset.x, fit.offset.z);
    }

    let hook = Rc::new(RefCell::new(PlaybackHook::new(controller.clone())));
    let clock: Box<dyn FrameClock> = if args.realtime {
        Box::new(WallClock::new())
    } else {
        Box::new(FixedStepClock::from_fps(args.fps))
    };
    let mut scene = SceneContext::new("solar playback", clock);
    scene.add_hook(Box::new(SharedHook(hook.clone())));
    if args.realtime {
        scene.add_hook(Box::new(FramePacer::new(args.fps)));
    }
    scene.run_frames(args.frames);

    let controller = controller.borrow();
    println!("\n🗓️  {}", "Time keys shown".bold());
    for key in hook.borrow().visited() {
        let total = controller.time_series().total_for(key);
        println!("  {} {:>12.1} Wh", key, total);
    }
    if let Some(label) = controller.hud_label() {
        println!("\n{}", label.green());
    }
    scene.print_timing_report();
    Ok(())
}

/// Lets the scene own a hook that the caller still reads afterwards
struct SharedHook(Rc<RefCell<PlaybackHook>>);

impl FrameHook for SharedHook {
    fn name(&self) -> &str {
        "Playback"
    }

    fn init_frame(&mut self) {
        self.0.borrow_mut().init_frame();
    }

    fn on_frame(&mut self, delta_time: f64) {
        self.0.borrow_mut().on_frame(delta_time);
    }

    fn after_frames(&mut self) {
        self.0.borrow_mut().after_frames();
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
