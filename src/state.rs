//! The shape parameters: one value per controller, loaded from and saved to
//! JSON presets.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::effects::{Grain, Lighting, Shadow};
use crate::error::{BlobError, Result};
use crate::fill::{FillKind, FillMode, Gradient, Pattern};

pub const MIN_POINTS: u32 = 3;
pub const MAX_POINTS: u32 = 50;
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 3.0;

/// Every user-tunable parameter of a shape.
///
/// Vertex snapshots live in [`Animator`](crate::animation::Animator); this
/// struct only holds what a preset can express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeState {
    pub num_points: u32,
    pub roughness: f64,
    pub random_seed: f64,
    pub animation_speed: f64,
    pub undulation_enabled: bool,

    pub fill_mode: FillKind,
    pub shape_color: Color,
    pub gradient: Gradient,
    pub pattern: Pattern,

    pub lighting: Lighting,
    pub grain: Grain,
    pub shadow: Shadow,

    pub background: Color,
    pub transparent_background: bool,
}

impl Default for ShapeState {
    fn default() -> Self {
        Self {
            num_points: 8,
            roughness: 0.3,
            random_seed: 0.0,
            animation_speed: 1.0,
            undulation_enabled: true,
            fill_mode: FillKind::Gradient,
            shape_color: Color::rgb(0x6c, 0x5c, 0xe7),
            gradient: Gradient::default(),
            pattern: Pattern::default(),
            lighting: Lighting::default(),
            grain: Grain::default(),
            shadow: Shadow::default(),
            background: Color::WHITE,
            transparent_background: false,
        }
    }
}

impl ShapeState {
    /// The active fill strategy.
    pub fn fill(&self) -> FillMode {
        match self.fill_mode {
            FillKind::Solid => FillMode::Solid(self.shape_color),
            FillKind::Gradient => FillMode::Gradient(self.gradient),
            FillKind::Pattern => FillMode::Pattern(self.pattern),
        }
    }

    /// Background to paint, or `None` when transparent.
    pub fn background(&self) -> Option<Color> {
        (!self.transparent_background).then_some(self.background)
    }

    /// Parameters that change the generated geometry.
    pub fn geometry_key(&self) -> (u32, u64, u64) {
        (
            self.num_points,
            self.roughness.to_bits(),
            self.random_seed.to_bits(),
        )
    }

    /// Reject out-of-range or non-finite values.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_POINTS..=MAX_POINTS).contains(&self.num_points) {
            return Err(BlobError::invalid(
                "num_points",
                format!("must be in [{MIN_POINTS}, {MAX_POINTS}], got {}", self.num_points),
            ));
        }
        check_range("roughness", self.roughness, 0.0, 1.0)?;
        check_finite("random_seed", self.random_seed)?;
        check_range("animation_speed", self.animation_speed, MIN_SPEED, MAX_SPEED)?;
        check_finite("gradient.angle", self.gradient.angle)?;
        check_range("gradient.saturation", self.gradient.saturation, 0.0, 200.0)?;
        check_range("pattern.scale", self.pattern.scale, 1.0, 100.0)?;
        check_range("lighting.opacity", self.lighting.opacity, 0.0, 1.0)?;
        check_range("grain.opacity", self.grain.opacity, 0.0, 1.0)?;
        check_range("shadow.blur", self.shadow.blur, 0.0, 100.0)?;
        check_range("shadow.offset_x", self.shadow.offset_x, -100.0, 100.0)?;
        check_range("shadow.offset_y", self.shadow.offset_y, -100.0, 100.0)?;
        Ok(())
    }

    /// Clamp every value into range. Non-finite values fall back to defaults.
    pub fn clamped(mut self) -> Self {
        let d = ShapeState::default();
        self.num_points = self.num_points.clamp(MIN_POINTS, MAX_POINTS);
        self.roughness = clamp_or(self.roughness, 0.0, 1.0, d.roughness);
        self.random_seed = clamp_or(self.random_seed, f64::MIN, f64::MAX, d.random_seed);
        self.animation_speed = clamp_or(self.animation_speed, MIN_SPEED, MAX_SPEED, d.animation_speed);
        self.gradient.angle = clamp_or(self.gradient.angle, f64::MIN, f64::MAX, d.gradient.angle);
        self.gradient.saturation = clamp_or(self.gradient.saturation, 0.0, 200.0, d.gradient.saturation);
        self.pattern.scale = clamp_or(self.pattern.scale, 1.0, 100.0, d.pattern.scale);
        self.lighting.opacity = clamp_or(self.lighting.opacity, 0.0, 1.0, d.lighting.opacity);
        self.grain.opacity = clamp_or(self.grain.opacity, 0.0, 1.0, d.grain.opacity);
        self.shadow.blur = clamp_or(self.shadow.blur, 0.0, 100.0, d.shadow.blur);
        self.shadow.offset_x = clamp_or(self.shadow.offset_x, -100.0, 100.0, d.shadow.offset_x);
        self.shadow.offset_y = clamp_or(self.shadow.offset_y, -100.0, 100.0, d.shadow.offset_y);
        self
    }

    /// Parse and validate a JSON preset. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let state: ShapeState = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a preset file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| BlobError::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).map_err(|e| BlobError::io(path, e))
    }
}

fn check_finite(name: &'static str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(BlobError::invalid(name, format!("must be finite, got {v}")))
    }
}

fn check_range(name: &'static str, v: f64, lo: f64, hi: f64) -> Result<()> {
    check_finite(name, v)?;
    if (lo..=hi).contains(&v) {
        Ok(())
    } else {
        Err(BlobError::invalid(name, format!("must be in [{lo}, {hi}], got {v}")))
    }
}

fn clamp_or(v: f64, lo: f64, hi: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v.clamp(lo, hi)
    } else {
        fallback
    }
}
