/// Frame scheduling
///
/// A `SceneContext` pulls a delta from its `FrameClock` once per frame and
/// hands it to each `FrameHook` in registration order. Time-key stepping runs
/// on its own fixed interval through `TimeKeyTimer`, independent of frame
/// rate.

use std::thread;
use std::time::{Duration, Instant};

pub trait FrameClock {
    /// Seconds since the previous call
    fn delta(&mut self) -> f64;
}

/// Real elapsed time; the first frame reports zero
#[derive(Debug, Default)]
pub struct WallClock {
    last: Option<Instant>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameClock for WallClock {
    fn delta(&mut self) -> f64 {
        let now = Instant::now();
        let delta = self.last.map_or(0.0, |last| (now - last).as_secs_f64());
        self.last = Some(now);
        delta
    }
}

/// Constant step, for headless runs and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    step: f64,
}

impl FixedStepClock {
    pub fn new(step: f64) -> Self {
        Self { step: step.max(0.0) }
    }

    pub fn from_fps(fps: f64) -> Self {
        if fps > 0.0 { Self::new(1.0 / fps) } else { Self::new(0.0) }
    }
}

impl FrameClock for FixedStepClock {
    fn delta(&mut self) -> f64 {
        self.step
    }
}

/// Accumulates frame time and reports how many fixed intervals have elapsed
#[derive(Debug, Clone, Copy)]
pub struct TimeKeyTimer {
    interval: f64,
    elapsed: f64,
}

impl TimeKeyTimer {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval: interval_secs,
            elapsed: 0.0,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Ticks due after adding `delta_time`; the remainder carries over
    pub fn poll(&mut self, delta_time: f64) -> u32 {
        if !(self.interval > 0.0) || !delta_time.is_finite() || delta_time <= 0.0 {
            return 0;
        }
        self.elapsed += delta_time;
        let due = (self.elapsed / self.interval).floor();
        self.elapsed -= due * self.interval;
        due as u32
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

pub trait FrameHook {
    fn name(&self) -> &str;

    /// Called once before the first frame
    fn init_frame(&mut self) {}

    /// Called every frame
    fn on_frame(&mut self, delta_time: f64);

    /// Called once after the last frame
    fn after_frames(&mut self) {}
}

/// Sleeps out the rest of each frame's budget so a `WallClock` scene runs at
/// roughly `fps` instead of as fast as the hooks allow
#[derive(Debug)]
pub struct FramePacer {
    budget: Duration,
    last: Option<Instant>,
}

impl FramePacer {
    pub fn new(fps: f64) -> Self {
        let budget = if fps > 0.0 && fps.is_finite() {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };
        Self { budget, last: None }
    }
}

impl FrameHook for FramePacer {
    fn name(&self) -> &str {
        "FramePacer"
    }

    fn init_frame(&mut self) {
        self.last = Some(Instant::now());
    }

    fn on_frame(&mut self, _delta_time: f64) {
        let now = Instant::now();
        if let Some(last) = self.last {
            let spent = now - last;
            if spent < self.budget {
                thread::sleep(self.budget - spent);
            }
        }
        self.last = Some(Instant::now());
    }
}

#[derive(Debug, Clone)]
pub struct HookTiming {
    pub hook_name: String,
    pub init_time: Duration,
    pub total_frame_time: Duration,
    pub frame_call_count: u32,
    pub after_time: Duration,
}

impl HookTiming {
    pub fn new(hook_name: String) -> Self {
        Self {
            hook_name,
            init_time: Duration::ZERO,
            total_frame_time: Duration::ZERO,
            frame_call_count: 0,
            after_time: Duration::ZERO,
        }
    }

    pub fn avg_frame_time(&self) -> Duration {
        if self.frame_call_count > 0 {
            self.total_frame_time / self.frame_call_count
        } else {
            Duration::ZERO
        }
    }

    pub fn total_time(&self) -> Duration {
        self.init_time + self.total_frame_time + self.after_time
    }
}

pub struct SceneContext {
    pub name: String,
    clock: Box<dyn FrameClock>,
    hooks: Vec<Box<dyn FrameHook>>,
    hook_timings: Vec<HookTiming>,
    frame: u64,
    elapsed: f64,
}

impl SceneContext {
    pub fn new(name: &str, clock: Box<dyn FrameClock>) -> Self {
        Self {
            name: name.to_string(),
            clock,
            hooks: Vec::new(),
            hook_timings: Vec::new(),
            frame: 0,
            elapsed: 0.0,
        }
    }

    pub fn add_hook(&mut self, hook: Box<dyn FrameHook>) {
        self.hook_timings.push(HookTiming::new(hook.name().to_string()));
        self.hooks.push(hook);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn hook_timings(&self) -> &[HookTiming] {
        &self.hook_timings
    }

    /// Run a single frame with borrowed hooks, bypassing timing
    pub fn step_with_hooks(&mut self, hooks: &mut [&mut dyn FrameHook]) {
        let delta_time = self.clock.delta();
        for hook in hooks.iter_mut() {
            hook.on_frame(delta_time);
        }
        self.frame += 1;
        self.elapsed += delta_time;
    }

    /// Init, `frames` frames, then teardown of every registered hook
    pub fn run_frames(&mut self, frames: u64) {
        log::info!("Running scene '{}' for {} frames", self.name, frames);

        for (hook, timing) in self.hooks.iter_mut().zip(self.hook_timings.iter_mut()) {
            let start = Instant::now();
            hook.init_frame();
            timing.init_time += start.elapsed();
        }

        for _ in 0..frames {
            let delta_time = self.clock.delta();
            for (hook, timing) in self.hooks.iter_mut().zip(self.hook_timings.iter_mut()) {
                let start = Instant::now();
                hook.on_frame(delta_time);
                timing.total_frame_time += start.elapsed();
                timing.frame_call_count += 1;
            }
            self.frame += 1;
            self.elapsed += delta_time;
        }

        for (hook, timing) in self.hooks.iter_mut().zip(self.hook_timings.iter_mut()) {
            let start = Instant::now();
            hook.after_frames();
            timing.after_time += start.elapsed();
        }
    }

    pub fn print_timing_report(&self) {
        println!("\n📊 === SCENE TIMING REPORT ===");
        println!("🎬 Scene: {}", self.name);
        println!("🔄 Frames: {}", self.frame);
        println!("⏱️  Simulated time: {:.2}s", self.elapsed);
        println!();

        let total_time: Duration = self.hook_timings.iter().map(HookTiming::total_time).sum();

        println!("📈 PER-HOOK BREAKDOWN:");
        for timing in &self.hook_timings {
            let hook_time = timing.total_time();
            let share = if total_time > Duration::ZERO {
                hook_time.as_secs_f64() / total_time.as_secs_f64() * 100.0
            } else {
                0.0
            };
            println!(
                "  🔧 {:<25} | Total: {:>8.2}ms | Avg/frame: {:>8.3}ms | Init: {:>6.2}ms | After: {:>6.2}ms | Share: {:>5.1}%",
                timing.hook_name,
                hook_time.as_secs_f64() * 1000.0,
                timing.avg_frame_time().as_secs_f64() * 1000.0,
                timing.init_time.as_secs_f64() * 1000.0,
                timing.after_time.as_secs_f64() * 1000.0,
                share
            );
        }

        println!();
        println!("⏱️  TOTAL HOOK TIME: {:.2}ms", total_time.as_secs_f64() * 1000.0);
        if self.frame > 0 {
            println!(
                "🚀 Average time per frame: {:.3}ms",
                total_time.as_secs_f64() * 1000.0 / self.frame as f64
            );
        }
        println!("📊 === END TIMING REPORT ===\n");
    }
}
