// Strong typing over strings. Colors, angles, messages, and the persisted panel config.
// Everything here crosses the JS boundary as camelCase JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;

/// Receive time of a message, as delivered by the frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Time {
    pub sec: u32,
    pub nsec: u32,
}

impl Time {
    pub fn new(sec: u32, nsec: u32) -> Self {
        Time { sec, nsec }
    }
}

/// One message of a frame batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub topic: String,
    #[serde(default)]
    pub receive_time: Time,
    pub message: serde_json::Value,
}

impl Message {
    pub fn new(topic: impl Into<String>, receive_time: Time, message: serde_json::Value) -> Self {
        Message {
            topic: topic.into(),
            receive_time,
            message,
        }
    }
}

/// 8-bit sRGB color, `#rrggbb` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Gray used wherever no ramp color is available.
    pub const NEUTRAL: Color = Color::new(0x80, 0x80, 0x80);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Linear RGB blend; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PanelError::InvalidConfig(format!("invalid color {s:?}"));
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Color::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            // #rgb shorthand: each digit is doubled.
            3 => {
                let short = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Color::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = PanelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// A (color, normalized position) pair of a color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: Color,
    pub location: f64,
}

impl ColorStop {
    pub fn new(color: Color, location: f64) -> Self {
        ColorStop { color, location }
    }
}

/// One colored wedge of the ring. Angles in radians, clockwise on screen from 3 o'clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub color: Color,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Segment {
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

/// Named multi-stop ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMapName {
    #[default]
    RedYellowGreen,
    Rainbow,
    Turbo,
}

/// Whether wedges are colored from a named map or a two-color gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Colormap,
    Gradient,
}

/// Persisted panel settings. Missing fields fall back to the stored default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default)]
    pub color_map: ColorMapName,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default = "default_gradient")]
    pub gradient: [Color; 2],
    #[serde(default)]
    pub reverse: bool,
}

fn default_max_value() -> f64 {
    1.0
}

fn default_gradient() -> [Color; 2] {
    [Color::new(0x00, 0x00, 0xff), Color::new(0xff, 0x00, 0xff)]
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            path: String::new(),
            min_value: 0.0,
            max_value: default_max_value(),
            color_map: ColorMapName::default(),
            color_mode: ColorMode::default(),
            gradient: default_gradient(),
            reverse: false,
        }
    }
}

/// Ring shape settings, fixed for the lifetime of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySettings {
    /// Notch reserved at the top of the ring (radians). 0 closes the ring.
    #[serde(default = "default_gap_angle")]
    pub gap_angle: f64,
    #[serde(default = "default_outer_radius")]
    pub outer_radius: f64,
    #[serde(default = "default_inner_radius")]
    pub inner_radius: f64,
    /// Number of stops sampled from the turbo ramp.
    #[serde(default = "default_turbo_samples")]
    pub turbo_samples: usize,
}

fn default_gap_angle() -> f64 {
    std::f64::consts::PI / 16.0
}

fn default_outer_radius() -> f64 {
    1.0
}

fn default_inner_radius() -> f64 {
    0.6
}

fn default_turbo_samples() -> usize {
    20
}

impl Default for GeometrySettings {
    fn default() -> Self {
        GeometrySettings {
            gap_angle: default_gap_angle(),
            outer_radius: default_outer_radius(),
            inner_radius: default_inner_radius(),
            turbo_samples: default_turbo_samples(),
        }
    }
}

impl GeometrySettings {
    pub fn validate(&self) -> Result<(), PanelError> {
        if !(0.0..std::f64::consts::PI).contains(&self.gap_angle) {
            return Err(PanelError::InvalidConfig(format!(
                "gap angle {} outside [0, pi)",
                self.gap_angle
            )));
        }
        if !(self.inner_radius > 0.0 && self.inner_radius < self.outer_radius) {
            return Err(PanelError::InvalidConfig(format!(
                "radii must satisfy 0 < inner ({}) < outer ({})",
                self.inner_radius, self.outer_radius
            )));
        }
        if self.turbo_samples < 2 {
            return Err(PanelError::InvalidConfig(
                "turbo ramp needs at least 2 samples".to_string(),
            ));
        }
        Ok(())
    }
}

/// Panel construction payload passed from JS.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelInit {
    #[serde(default)]
    pub config: PanelConfig,
    #[serde(default)]
    pub geometry: GeometrySettings,
}

/// Point in ring space: origin at the ring center, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn polar(radius: f64, angle: f64) -> Self {
        Point::new(radius * angle.cos(), radius * angle.sin())
    }
}

/// Axis-aligned box in ring space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Render-ready value handed to the host surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    pub segments: Vec<Segment>,
    pub has_data: bool,
    pub error_message: Option<String>,
    /// Last good render kept on screen while an error stands.
    pub stale: bool,
    pub percentages: Vec<f64>,
    /// SVG path data of the ring outline in normalized [0, 1] coordinates.
    pub clip_path: String,
    pub bounds: BoundingBox,
}
