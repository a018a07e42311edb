// Color ramps for the wedges: named maps, two-color gradients, and the reverse transform.
// Pure functions of the panel config; no drawing surface involved.

use crate::types::*;

const RED: Color = Color::new(0xff, 0x00, 0x00);
const YELLOW: Color = Color::new(0xff, 0xff, 0x00);
const GREEN: Color = Color::new(0x00, 0xff, 0x00);
const CYAN: Color = Color::new(0x00, 0xff, 0xff);
const BLUE: Color = Color::new(0x00, 0x00, 0xff);
const MAGENTA: Color = Color::new(0xff, 0x00, 0xff);

const RAINBOW: [Color; 6] = [MAGENTA, BLUE, CYAN, GREEN, YELLOW, RED];

/// Turbo colormap, polynomial approximation. Input is clamped to [0, 1].
pub fn turbo(t: f64) -> Color {
    let x = t.clamp(0.0, 1.0);
    let r = 0.13572138
        + x * (4.61539260 + x * (-42.66032258 + x * (132.13108234 + x * (-152.94239396 + x * 59.28637943))));
    let g = 0.09140261
        + x * (2.19418839 + x * (4.84296658 + x * (-14.18503333 + x * (4.27729857 + x * 2.82956604))));
    let b = 0.10667330
        + x * (12.64194608 + x * (-60.58204836 + x * (110.36276771 + x * (-89.90310912 + x * 27.34824973))));

    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::new(channel(r), channel(g), channel(b))
}

/// Mirror a ramp: every location maps to `1 - location` and the order flips,
/// so interior stops move too.
pub fn reverse_stops(stops: &[ColorStop]) -> Vec<ColorStop> {
    stops
        .iter()
        .rev()
        .map(|stop| ColorStop::new(stop.color, 1.0 - stop.location))
        .collect()
}

/// Color of a stop ramp at position `t`, blending linearly between neighbors.
pub fn sample_stops(stops: &[ColorStop], t: f64) -> Option<Color> {
    let first = stops.first()?;
    let upper = match stops.iter().position(|stop| stop.location >= t) {
        Some(0) => return Some(first.color),
        Some(index) => index,
        None => return stops.last().map(|stop| stop.color),
    };

    let (lo, hi) = (&stops[upper - 1], &stops[upper]);
    let span = hi.location - lo.location;
    if span <= 0.0 {
        return Some(hi.color);
    }
    Some(lo.color.lerp(hi.color, (t - lo.location) / span))
}

/// Resolves color stops and per-wedge colors from the panel config.
#[derive(Debug, Clone, Copy)]
pub struct ColorMapEngine {
    turbo_samples: usize,
}

impl ColorMapEngine {
    pub fn new(turbo_samples: usize) -> Self {
        ColorMapEngine {
            turbo_samples: turbo_samples.max(2),
        }
    }

    /// Location-ascending stops covering [0, 1], reverse already applied.
    pub fn stops(&self, config: &PanelConfig) -> Vec<ColorStop> {
        let stops = match (config.color_mode, config.color_map) {
            (ColorMode::Gradient, _) => vec![
                ColorStop::new(config.gradient[0], 0.0),
                ColorStop::new(config.gradient[1], 1.0),
            ],
            (ColorMode::Colormap, ColorMapName::RedYellowGreen) => vec![
                ColorStop::new(RED, 0.0),
                ColorStop::new(YELLOW, 0.5),
                ColorStop::new(GREEN, 1.0),
            ],
            (ColorMode::Colormap, ColorMapName::Rainbow) => evenly_spaced(&RAINBOW),
            (ColorMode::Colormap, ColorMapName::Turbo) => {
                let last = (self.turbo_samples - 1) as f64;
                (0..self.turbo_samples)
                    .map(|i| {
                        let location = i as f64 / last;
                        ColorStop::new(turbo(location), location)
                    })
                    .collect()
            }
        };

        if config.reverse {
            reverse_stops(&stops)
        } else {
            stops
        }
    }

    /// One color per weight, in weight order.
    ///
    /// With as many weights as stops, weight `i` takes stop `i`. Otherwise each
    /// weight is resampled at `i / (count - 1)`; a single weight gets the stop at 0.
    pub fn colors(&self, config: &PanelConfig, count: usize) -> Vec<Color> {
        let stops = self.stops(config);
        if count == stops.len() {
            return stops.iter().map(|stop| stop.color).collect();
        }

        let continuous_turbo =
            config.color_mode == ColorMode::Colormap && config.color_map == ColorMapName::Turbo;

        (0..count)
            .map(|i| {
                let t = if count > 1 {
                    i as f64 / (count - 1) as f64
                } else {
                    0.0
                };
                if continuous_turbo {
                    // Evaluate the ramp itself so resampled colors stay exact.
                    turbo(if config.reverse { 1.0 - t } else { t })
                } else {
                    sample_stops(&stops, t).unwrap_or(Color::NEUTRAL)
                }
            })
            .collect()
    }
}

fn evenly_spaced(colors: &[Color]) -> Vec<ColorStop> {
    let last = colors.len().saturating_sub(1).max(1) as f64;
    colors
        .iter()
        .enumerate()
        .map(|(i, color)| ColorStop::new(*color, i as f64 / last))
        .collect()
}
