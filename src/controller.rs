/// Visualization controller
///
/// Builds one bar per region cell, normalizes each time key's totals against
/// the series maximum and feeds the results to the registry as spring
/// targets. The registry does the per-frame motion; the controller only
/// decides where things should end up.

use crate::cell_projector::{CellProjector, cell_plane_position};
use crate::config::VisualizationConfig;
use crate::constants::HUD_SUBTITLE;
use crate::error::Result;
use crate::geo_json::FeatureCollection;
use crate::hex_prototype::HexPrototype;
use crate::instance_registry::InstanceRegistry;
use crate::math_utils::{lerp, normalized_intensity};
use crate::scene::{FrameHook, TimeKeyTimer};
use crate::time_series::TimeSeries;
use chrono::DateTime;
use glam::{Mat4, Vec3};
use h3o::CellIndex;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Uniform scale and offset that fit the bars into a square of `target_size`
/// centred on the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFit {
    pub scale: f32,
    pub offset: Vec3,
}

impl ViewFit {
    pub const IDENTITY: ViewFit = ViewFit {
        scale: 1.0,
        offset: Vec3::ZERO,
    };

    /// Bounds of every allocated bar at its current transform. Extents below
    /// one plane unit are treated as one, so small regions share a scale.
    pub fn compute(registry: &InstanceRegistry, target_size: f64) -> Self {
        if registry.is_empty() {
            return Self::IDENTITY;
        }

        let corners = registry.prototype().vertices();
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for record in registry.records() {
            let transform = record.transform();
            for corner in &corners {
                let point = transform.transform_point3(*corner);
                min = min.min(point);
                max = max.max(point);
            }
        }

        let size = max - min;
        let scale = target_size as f32 / size.x.max(size.z).max(1.0);
        let center = (min + max) * 0.5;
        Self {
            scale,
            offset: -center * scale,
        }
    }

    pub fn group_transform(&self) -> Mat4 {
        Mat4::from_translation(self.offset) * Mat4::from_scale(Vec3::splat(self.scale))
    }

    pub fn apply(&self, point: Vec3) -> Vec3 {
        point * self.scale + self.offset
    }
}

pub struct VisualizationController {
    registry: InstanceRegistry,
    cell_slots: BTreeMap<CellIndex, usize>,
    /// (cell key as stored in the series, slot), in slot order
    cell_keys: Vec<(String, usize)>,
    time_series: TimeSeries,
    time_keys: Vec<String>,
    daily_max: f64,
    cursor: Option<usize>,
    current_time_key: Option<String>,
    config: VisualizationConfig,
    view_fit: ViewFit,
}

impl VisualizationController {
    /// Cells come from every polygon feature of `features`
    pub fn new(
        features: &FeatureCollection,
        time_series: TimeSeries,
        prototype: Rc<HexPrototype>,
        config: VisualizationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let projector = CellProjector::new(config.h3_resolution()?).with_coverage(config.coverage);
        let cells = projector.cells_covering_features(features)?;
        Self::from_cells(cells, time_series, prototype, config)
    }

    pub fn from_cells(
        cells: impl IntoIterator<Item = CellIndex>,
        time_series: TimeSeries,
        prototype: Rc<HexPrototype>,
        config: VisualizationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let cells: BTreeSet<CellIndex> = cells.into_iter().collect();

        let mut registry = InstanceRegistry::new(cells.len(), prototype, config.spring_preset);
        let mut cell_slots = BTreeMap::new();
        let mut cell_keys = Vec::with_capacity(cells.len());
        for cell in cells {
            let slot = registry.allocate(cell_plane_position(cell))?;
            cell_slots.insert(cell, slot);
            cell_keys.push((cell.to_string(), slot));
        }

        let daily_max = time_series.daily_max();
        let mut time_keys = time_series.time_keys();
        time_keys.sort();
        let view_fit = ViewFit::compute(&registry, config.fit_target_size);

        log::info!(
            "Visualization ready: {} cells, {} time keys, daily max {:.1} Wh",
            registry.len(),
            time_keys.len(),
            daily_max
        );

        let mut controller = Self {
            registry,
            cell_slots,
            cell_keys,
            time_series,
            time_keys,
            daily_max,
            cursor: None,
            current_time_key: None,
            config,
            view_fit,
        };
        if !controller.time_keys.is_empty() {
            controller.select(0);
        }
        Ok(controller)
    }

    /// Push targets for `time_key`; an unknown key reads as an empty history
    pub fn apply_time_key(&mut self, time_key: &str) {
        let history = self.time_series.history(time_key);
        if history.is_none() {
            log::debug!("No data for time key {}", time_key);
        }

        for (cell_key, slot) in &self.cell_keys {
            let value = history
                .and_then(|h| h.get(cell_key))
                .copied()
                .unwrap_or(0.0);
            let t = normalized_intensity(value, self.daily_max);
            let scale = lerp(self.config.min_scale_y, self.config.max_scale_y, t);
            self.registry.set_targets(*slot, scale, t);
        }

        self.current_time_key = Some(time_key.to_string());
    }

    fn select(&mut self, index: usize) {
        self.cursor = Some(index);
        let key = self.time_keys[index].clone();
        self.apply_time_key(&key);
    }

    /// Step to the next time key, wrapping at the end
    pub fn tick(&mut self) -> Option<&str> {
        if self.time_keys.is_empty() {
            return None;
        }
        let next = self.cursor.map_or(0, |cursor| (cursor + 1) % self.time_keys.len());
        self.select(next);
        self.current_time_key.as_deref()
    }

    /// Integrate the bars for one frame
    pub fn advance(&mut self, delta_time: f64) {
        self.registry.advance(delta_time);
    }

    pub fn slot_for(&self, cell: CellIndex) -> Option<usize> {
        self.cell_slots.get(&cell).copied()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CellIndex, &usize)> {
        self.cell_slots.iter()
    }

    pub fn current_time_key(&self) -> Option<&str> {
        self.current_time_key.as_deref()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn time_keys(&self) -> &[String] {
        &self.time_keys
    }

    pub fn daily_max(&self) -> f64 {
        self.daily_max
    }

    pub fn time_series(&self) -> &TimeSeries {
        &self.time_series
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn view_fit(&self) -> ViewFit {
        self.view_fit
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    /// Two-line caption for the current key, e.g. `2024-06-01 12:30\nDOMESTIC ...`
    pub fn hud_label(&self) -> Option<String> {
        self.current_time_key.as_deref().and_then(hud_label)
    }
}

/// Caption for a time key; `None` when the key is not an ISO instant
pub fn hud_label(time_key: &str) -> Option<String> {
    let time = DateTime::parse_from_rfc3339(time_key).ok()?;
    Some(format!("{}\n{}", time.format("%Y-%m-%d %H:%M"), HUD_SUBTITLE).to_uppercase())
}

/// Drives a shared controller from the frame loop: due time-key steps are
/// applied first, then the bars integrate over the same frame delta.
pub struct PlaybackHook {
    controller: Rc<RefCell<VisualizationController>>,
    timer: TimeKeyTimer,
    visited: Vec<String>,
}

impl PlaybackHook {
    pub fn new(controller: Rc<RefCell<VisualizationController>>) -> Self {
        let interval = controller.borrow().config().time_key_interval_secs;
        Self {
            controller,
            timer: TimeKeyTimer::new(interval),
            visited: Vec::new(),
        }
    }

    /// Time keys applied by this hook, in order
    pub fn visited(&self) -> &[String] {
        &self.visited
    }
}

impl FrameHook for PlaybackHook {
    fn name(&self) -> &str {
        "Playback"
    }

    fn init_frame(&mut self) {
        self.timer.reset();
        if let Some(key) = self.controller.borrow().current_time_key() {
            self.visited.push(key.to_string());
        }
    }

    fn on_frame(&mut self, delta_time: f64) {
        let mut controller = self.controller.borrow_mut();
        for _ in 0..self.timer.poll(delta_time) {
            if let Some(key) = controller.tick() {
                log::debug!("Showing {}", key);
                self.visited.push(key.to_string());
            }
        }
        controller.advance(delta_time);
    }

    fn after_frames(&mut self) {
        let controller = self.controller.borrow();
        log::info!(
            "Playback finished on {} after {} key changes",
            controller.current_time_key().unwrap_or("<none>"),
            self.visited.len().saturating_sub(1)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_SCALE_Y, MIN_SCALE_Y};
    use approx::assert_abs_diff_eq;

    fn cells_near_london() -> Vec<CellIndex> {
        let projector = CellProjector::default();
        [(-0.12, 51.5), (-0.5, 51.5), (0.3, 51.6)]
            .iter()
            .filter_map(|&(lon, lat)| projector.cell_for(lon, lat))
            .collect()
    }

    fn series_for(cells: &[CellIndex]) -> TimeSeries {
        let mut series = TimeSeries::new();
        series.accumulate("2024-06-01T12:00:00.000Z", &cells[0].to_string(), 400.0);
        series.accumulate("2024-06-01T12:00:00.000Z", &cells[1].to_string(), 100.0);
        series.accumulate("2024-06-01T06:00:00.000Z", &cells[2].to_string(), 50.0);
        series
    }

    fn controller() -> (VisualizationController, Vec<CellIndex>) {
        let cells = cells_near_london();
        let controller = VisualizationController::from_cells(
            cells.clone(),
            series_for(&cells),
            Rc::new(HexPrototype::new()),
            VisualizationConfig::default(),
        )
        .unwrap();
        (controller, cells)
    }

    #[test]
    fn test_one_slot_per_cell() {
        let (controller, cells) = controller();
        assert_eq!(controller.registry().len(), 3);
        assert_eq!(controller.registry().capacity(), 3);
        let mut slots: Vec<_> = cells.iter().map(|c| controller.slot_for(*c).unwrap()).collect();
        slots.sort();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn test_starts_on_first_key() {
        let (controller, cells) = controller();
        assert_eq!(controller.current_time_key(), Some("2024-06-01T06:00:00.000Z"));
        assert_eq!(controller.daily_max(), 400.0);

        let lit = controller.slot_for(cells[2]).unwrap();
        let record = controller.registry().record(lit).unwrap();
        let t = (50.0_f64 / 400.0).sqrt();
        assert_abs_diff_eq!(record.scale_spring.target, MIN_SCALE_Y + t * (MAX_SCALE_Y - MIN_SCALE_Y), epsilon = 1e-12);
        assert_abs_diff_eq!(record.color_spring.target, t * 1.5, epsilon = 1e-12);

        let dark = controller.slot_for(cells[0]).unwrap();
        assert_eq!(controller.registry().record(dark).unwrap().scale_spring.target, MIN_SCALE_Y);
    }

    #[test]
    fn test_tick_wraps() {
        let (mut controller, cells) = controller();
        assert_eq!(controller.tick(), Some("2024-06-01T12:00:00.000Z"));

        let peak = controller.slot_for(cells[0]).unwrap();
        let record = controller.registry().record(peak).unwrap();
        assert_eq!(record.scale_spring.target, MAX_SCALE_Y);
        assert_eq!(record.color_spring.target, 1.0);

        assert_eq!(controller.tick(), Some("2024-06-01T06:00:00.000Z"));
        assert_eq!(controller.cursor(), Some(0));
    }

    #[test]
    fn test_unknown_key_reads_empty() {
        let (mut controller, cells) = controller();
        controller.apply_time_key("1999-01-01T00:00:00.000Z");
        for cell in &cells {
            let slot = controller.slot_for(*cell).unwrap();
            assert_eq!(controller.registry().record(slot).unwrap().scale_spring.target, MIN_SCALE_Y);
        }
    }

    #[test]
    fn test_empty_series_is_quiet() {
        let cells = cells_near_london();
        let mut controller = VisualizationController::from_cells(
            cells,
            TimeSeries::new(),
            Rc::new(HexPrototype::new()),
            VisualizationConfig::default(),
        )
        .unwrap();
        assert_eq!(controller.tick(), None);
        assert_eq!(controller.current_time_key(), None);
        assert_eq!(controller.daily_max(), 0.0);
    }

    #[test]
    fn test_view_fit_centres_scene() {
        let (controller, _) = controller();
        let fit = controller.view_fit();
        // the region is far smaller than one plane unit
        assert_abs_diff_eq!(fit.scale, 250.0, epsilon = 1e-3);

        let positions: Vec<Vec3> = controller
            .registry()
            .records()
            .iter()
            .map(|r| fit.apply(r.base_position))
            .collect();
        let min_x = positions.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = positions.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        assert!(min_x < 0.0 && max_x > 0.0);
        assert_abs_diff_eq!(min_x + max_x, 0.0, epsilon = 0.01);

        let base = controller.registry().records()[0].base_position;
        let transformed = fit.group_transform().transform_point3(base);
        assert_abs_diff_eq!(transformed.x, positions[0].x, epsilon = 1e-3);
        assert_abs_diff_eq!(transformed.z, positions[0].z, epsilon = 1e-3);
    }

    #[test]
    fn test_view_fit_of_empty_registry() {
        let registry = InstanceRegistry::new(0, Rc::new(HexPrototype::new()), crate::spring::SpringPreset::Fast);
        assert_eq!(ViewFit::compute(&registry, 250.0), ViewFit::IDENTITY);

        // spare capacity with nothing allocated is still empty
        let spare = InstanceRegistry::new(8, Rc::new(HexPrototype::new()), crate::spring::SpringPreset::Fast);
        let fit = ViewFit::compute(&spare, 250.0);
        assert_eq!(fit, ViewFit::IDENTITY);
        assert!(fit.offset.is_finite());
    }

    #[test]
    fn test_hud_label() {
        assert_eq!(
            hud_label("2024-06-01T12:30:00.000Z").as_deref(),
            Some("2024-06-01 12:30\nDOMESTIC SOLAR POWER GENERATION")
        );
        assert_eq!(hud_label("noon"), None);

        let (controller, _) = controller();
        assert!(controller.hud_label().unwrap().starts_with("2024-06-01 06:00"));
    }

    #[test]
    fn test_playback_hook_steps_keys_then_animates() {
        let (controller, cells) = controller();
        let shared = Rc::new(RefCell::new(controller));
        let mut hook = PlaybackHook::new(shared.clone());
        let mut scene = crate::scene::SceneContext::new(
            "playback",
            Box::new(crate::scene::FixedStepClock::new(0.05)),
        );

        hook.init_frame();
        // first frame: 0.05s is short of one 0.06s interval
        scene.step_with_hooks(&mut [&mut hook]);
        assert_eq!(shared.borrow().cursor(), Some(0));
        scene.step_with_hooks(&mut [&mut hook]);
        assert_eq!(shared.borrow().cursor(), Some(1));
        assert_eq!(hook.visited(), ["2024-06-01T06:00:00.000Z", "2024-06-01T12:00:00.000Z"]);

        for _ in 0..200 {
            scene.step_with_hooks(&mut [&mut hook]);
        }
        // 10.1s of frames at one step per 60ms, plus the initial key
        assert!((168..=170).contains(&hook.visited().len()), "{}", hook.visited().len());

        let controller = shared.borrow();
        let slot = controller.slot_for(cells[0]).unwrap();
        let record = controller.registry().record(slot).unwrap();
        assert!(record.scale_spring.position >= MIN_SCALE_Y * 0.5);
        assert!(record.scale_spring.position <= MAX_SCALE_Y * 1.5);
        assert_eq!(controller.registry().buffers().revision, 202);
    }
}
