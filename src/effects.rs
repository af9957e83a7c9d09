//! Post-fill effect parameters (shadow, lighting, grain) and the grain
//! texture pool.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::random::seeded_random;

/// Number of pre-rendered grain textures cycled by the live loop.
pub const GRAIN_FRAMES: usize = 20;
/// Grain cycling rate.
pub const GRAIN_FPS: f64 = 10.0;
/// Side length of each grain texture, in pixels.
pub const GRAIN_SIZE: u32 = 128;

/// Compositing rule for overlay layers. Names follow CSS `mix-blend-mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    #[serde(alias = "source-over")]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    pub fn css_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color-dodge",
            BlendMode::ColorBurn => "color-burn",
            BlendMode::HardLight => "hard-light",
            BlendMode::SoftLight => "soft-light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shadow {
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub color: Color,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            blur: 20.0,
            offset_x: 0.0,
            offset_y: 10.0,
            color: Color::new(0, 0, 0, 77),
        }
    }
}

impl Shadow {
    pub fn is_visible(&self) -> bool {
        self.color.a > 0
    }
}

/// Directional light gradient composited over the fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub opacity: f64,
    pub blend_mode: BlendMode,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            opacity: 0.3,
            blend_mode: BlendMode::Overlay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grain {
    pub opacity: f64,
    pub blend_mode: BlendMode,
}

impl Default for Grain {
    fn default() -> Self {
        Self {
            opacity: 0.15,
            blend_mode: BlendMode::Overlay,
        }
    }
}

/// Which grain texture is visible at `time_secs`.
pub fn grain_frame(time_secs: f64) -> usize {
    if !time_secs.is_finite() || time_secs <= 0.0 {
        return 0;
    }
    ((time_secs * GRAIN_FPS).floor() as usize) % GRAIN_FRAMES
}

/// Grayscale noise texture, one luminance byte per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainTexture {
    pub size: u32,
    pub luma: Vec<u8>,
}

impl GrainTexture {
    fn generate(frame: usize) -> Self {
        let seed = frame as f64 * 131.7 + 0.5;
        let luma = (0..GRAIN_SIZE * GRAIN_SIZE)
            .map(|i| {
                let x = (i % GRAIN_SIZE) as f64;
                let y = (i / GRAIN_SIZE) as f64;
                (seeded_random(x * 12.9898 + y * 78.233 + seed) * 255.0) as u8
            })
            .collect();
        Self {
            size: GRAIN_SIZE,
            luma,
        }
    }
}

/// The shared pool of [`GRAIN_FRAMES`] textures, generated on first use.
pub fn grain_pool() -> &'static [GrainTexture] {
    static POOL: OnceLock<Vec<GrainTexture>> = OnceLock::new();
    POOL.get_or_init(|| (0..GRAIN_FRAMES).map(GrainTexture::generate).collect())
}
