/// Instanced bar registry
///
/// Fixed-capacity pool of per-cell animation state plus the batched
/// transform and color buffers a renderer draws in a single call. Slots are
/// handed out in order and live for the whole session; only the first
/// `len()` slots are integrated or exposed for drawing.

use crate::constants::{
    ANIMATION_TIME_DIVISOR, COLD_COLOR_HEX, COLOR_BOOST, DEFAULT_INSTANCE_COLOR_HEX,
    HOT_COLOR_HEX, INITIAL_COLOR_T, INITIAL_SCALE_Y, linear_rgb_from_hex,
};
use crate::error::{Result, SolarHexError};
use crate::hex_prototype::HexPrototype;
use crate::math_utils::saturate;
use crate::spring::{Spring, SpringPreset};
use glam::{Mat4, Vec3};
use std::rc::Rc;

/// Animation state of one allocated cell
#[derive(Debug, Clone)]
pub struct CellRecord {
    pub slot: usize,
    pub base_position: Vec3,
    pub scale_spring: Spring,
    pub color_spring: Spring,
}

impl CellRecord {
    fn new(slot: usize, preset: SpringPreset) -> Self {
        Self {
            slot,
            base_position: Vec3::ZERO,
            scale_spring: Spring::new(preset, INITIAL_SCALE_Y),
            color_spring: Spring::new(preset, INITIAL_COLOR_T),
        }
    }

    /// Translation to the cell, then vertical stretch of the unit bar
    pub fn transform(&self) -> Mat4 {
        bar_transform(self.base_position, self.scale_spring.position)
    }

    pub fn color(&self, palette: &ColorRamp) -> Vec3 {
        palette.sample(self.color_spring.position)
    }
}

/// Blend from a cold base color to a hot accent color. Both ends are held in
/// linear space and blended there, so buffer colors are linear RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRamp {
    pub cold: Vec3,
    pub hot: Vec3,
}

impl ColorRamp {
    pub fn from_hex(cold: u32, hot: u32) -> Self {
        Self {
            cold: Vec3::from_array(linear_rgb_from_hex(cold)),
            hot: Vec3::from_array(linear_rgb_from_hex(hot)),
        }
    }

    /// Blend factor is clamped to [0, 1]
    pub fn sample(&self, t: f64) -> Vec3 {
        self.cold.lerp(self.hot, saturate(t) as f32)
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        ColorRamp::from_hex(COLD_COLOR_HEX, HOT_COLOR_HEX)
    }
}

/// Render-facing buffers, sized to capacity
#[derive(Debug, Clone)]
pub struct InstanceBuffers {
    pub matrices: Vec<Mat4>,
    pub colors: Vec<Vec3>,
    /// Number of leading entries the renderer should draw
    pub count: usize,
    /// Incremented once for every batch of writes
    pub revision: u64,
    pub matrices_dirty: bool,
    pub colors_dirty: bool,
}

impl InstanceBuffers {
    fn new(capacity: usize) -> Self {
        Self {
            matrices: vec![bar_transform(Vec3::ZERO, INITIAL_SCALE_Y); capacity],
            colors: vec![Vec3::from_array(linear_rgb_from_hex(DEFAULT_INSTANCE_COLOR_HEX)); capacity],
            count: 0,
            revision: 0,
            matrices_dirty: true,
            colors_dirty: true,
        }
    }

    pub fn active_matrices(&self) -> &[Mat4] {
        &self.matrices[..self.count]
    }

    pub fn active_colors(&self) -> &[Vec3] {
        &self.colors[..self.count]
    }

    pub fn needs_update(&self) -> bool {
        self.matrices_dirty || self.colors_dirty
    }
}

pub struct InstanceRegistry {
    prototype: Rc<HexPrototype>,
    records: Vec<CellRecord>,
    buffers: InstanceBuffers,
    ramp: ColorRamp,
    used: usize,
}

impl InstanceRegistry {
    /// Pre-initialize every slot; nothing is drawn until `allocate` is called
    pub fn new(capacity: usize, prototype: Rc<HexPrototype>, preset: SpringPreset) -> Self {
        let records = (0..capacity).map(|slot| CellRecord::new(slot, preset)).collect();
        Self {
            prototype,
            records,
            buffers: InstanceBuffers::new(capacity),
            ramp: ColorRamp::default(),
            used: 0,
        }
    }

    /// Claim the next slot for a cell at `position`
    pub fn allocate(&mut self, position: Vec3) -> Result<usize> {
        let slot = self.used;
        let record = self
            .records
            .get_mut(slot)
            .ok_or(SolarHexError::CapacityExceeded { capacity: self.buffers.matrices.len() })?;

        record.base_position = position;
        record.scale_spring.reset(INITIAL_SCALE_Y);
        record.color_spring.reset(INITIAL_COLOR_T);
        self.buffers.matrices[slot] = bar_transform(position, INITIAL_SCALE_Y);

        self.used += 1;
        self.buffers.count = self.used;
        self.buffers.matrices_dirty = true;
        Ok(slot)
    }

    /// Retarget a slot; geometry follows on the next `advance`
    ///
    /// `intensity` is clamped to [0, 1] and boosted for the color target.
    pub fn set_targets(&mut self, slot: usize, target_scale: f64, intensity: f64) {
        if slot >= self.used {
            log::warn!("Ignoring targets for unallocated slot {} ({} in use)", slot, self.used);
            return;
        }
        let record = &mut self.records[slot];
        let intensity = saturate(intensity);
        record.color_spring.target = (intensity * COLOR_BOOST).min(1.0);
        record.scale_spring.target = target_scale;
    }

    /// Integrate every allocated slot and rewrite its transform and color
    pub fn advance(&mut self, delta_time: f64) {
        let scaled_dt = delta_time / ANIMATION_TIME_DIVISOR;

        for (slot, record) in self.records[..self.used].iter_mut().enumerate() {
            record.scale_spring.update(scaled_dt);
            record.color_spring.update(scaled_dt);

            self.buffers.matrices[slot] = record.transform();
            self.buffers.colors[slot] = record.color(&self.ramp);
        }

        self.buffers.matrices_dirty = true;
        self.buffers.colors_dirty = true;
        self.buffers.revision += 1;
    }

    /// Hand the buffers to a renderer, clearing the dirty flags.
    /// Returns `None` when nothing changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&InstanceBuffers> {
        if !self.buffers.needs_update() {
            return None;
        }
        self.buffers.matrices_dirty = false;
        self.buffers.colors_dirty = false;
        Some(&self.buffers)
    }

    pub fn buffers(&self) -> &InstanceBuffers {
        &self.buffers
    }

    pub fn record(&self, slot: usize) -> Option<&CellRecord> {
        self.records[..self.used].get(slot)
    }

    pub fn records(&self) -> &[CellRecord] {
        &self.records[..self.used]
    }

    pub fn prototype(&self) -> &HexPrototype {
        &self.prototype
    }

    pub fn color_ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// True once every allocated spring is within `tolerance` of its target
    pub fn is_settled(&self, tolerance: f64) -> bool {
        self.records()
            .iter()
            .all(|r| r.scale_spring.is_settled(tolerance) && r.color_spring.is_settled(tolerance))
    }
}

fn bar_transform(position: Vec3, scale_y: f64) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_scale(Vec3::new(1.0, scale_y as f32, 1.0))
}
