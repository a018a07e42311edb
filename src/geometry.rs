// Wedge geometry for the annulus: weights -> angular segments, bounds, and clip outline.
// Angles are radians in screen space (y down), 0 at 3 o'clock, growing clockwise.
// The sweep runs from -pi/2 + g to 3pi/2 - g, leaving a notch of 2g at the top.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::Write;

use crate::types::*;

/// Share of each weight in percent, in input order.
///
/// Negative and non-finite weights count as zero, so the degenerate case is
/// "no positive weight" rather than a literal zero sum: `[-1, 1]` yields
/// `[0, 100]` instead of dividing by zero, and `[-1, -2]` is degenerate.
/// Returns `None` for an empty or degenerate vector.
pub fn percentages(weights: &[f64]) -> Option<Vec<f64>> {
    let cleaned: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();

    // Scale by the largest weight first so the sum cannot overflow.
    let max = cleaned.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return None;
    }
    let sum: f64 = cleaned.iter().map(|w| w / max).sum();

    Some(cleaned.iter().map(|w| w / max / sum * 100.0).collect())
}

/// Annulus layout for a fixed gap angle and radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WedgeGeometry {
    gap: f64,
    outer_radius: f64,
    inner_radius: f64,
}

impl WedgeGeometry {
    pub fn new(settings: &GeometrySettings) -> Self {
        WedgeGeometry {
            gap: settings.gap_angle,
            outer_radius: settings.outer_radius,
            inner_radius: settings.inner_radius,
        }
    }

    pub fn start_angle(&self) -> f64 {
        -FRAC_PI_2 + self.gap
    }

    pub fn end_angle(&self) -> f64 {
        3.0 * FRAC_PI_2 - self.gap
    }

    /// Total angle available to the wedges, `2pi - 2g`.
    pub fn sweep(&self) -> f64 {
        2.0 * PI - 2.0 * self.gap
    }

    /// Lay out one segment per weight. An empty result means there is nothing to draw.
    ///
    /// `colors[i]` paints weight `i`; if the counts differ the color is picked by
    /// relative position.
    pub fn segments(&self, weights: &[f64], colors: &[Color]) -> Vec<Segment> {
        let Some(shares) = percentages(weights) else {
            return Vec::new();
        };

        let sweep = self.sweep();
        let last = shares.len() - 1;
        let mut angle_start = self.start_angle();

        shares
            .iter()
            .enumerate()
            .map(|(i, share)| {
                // Pin the final edge to the closed-form end so rounding leaves no seam.
                let angle_end = if i == last {
                    self.end_angle()
                } else {
                    angle_start + share / 100.0 * sweep
                };
                let segment = Segment {
                    color: pick_color(colors, i, shares.len()),
                    start_angle: angle_start,
                    end_angle: angle_end,
                };
                angle_start = angle_end;
                segment
            })
            .collect()
    }

    /// Box enclosing both arcs and the radial edges for the current gap.
    pub fn bounds(&self) -> BoundingBox {
        let (start, end) = (self.start_angle(), self.end_angle());

        let mut points = vec![
            Point::polar(self.outer_radius, start),
            Point::polar(self.outer_radius, end),
            Point::polar(self.inner_radius, start),
            Point::polar(self.inner_radius, end),
        ];
        // Axis extremes of the outer arc that fall inside the sweep.
        for k in -1..=3 {
            let angle = k as f64 * FRAC_PI_2;
            if angle >= start - 1e-12 && angle <= end + 1e-12 {
                points.push(Point::polar(self.outer_radius, angle));
            }
        }

        points.iter().fold(
            BoundingBox {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |b, p| BoundingBox {
                min_x: b.min_x.min(p.x),
                min_y: b.min_y.min(p.y),
                max_x: b.max_x.max(p.x),
                max_y: b.max_y.max(p.y),
            },
        )
    }

    /// Map a ring-space point into the [0, 1] box of `bounds()`.
    pub fn normalize(&self, point: Point) -> Point {
        let b = self.bounds();
        Point::new(
            (point.x - b.min_x) / b.width(),
            (point.y - b.min_y) / b.height(),
        )
    }

    /// SVG path data for the annulus outline in normalized coordinates.
    ///
    /// Each arc is split at its midpoint so a closed ring (g = 0) still draws.
    pub fn clip_path(&self) -> String {
        let b = self.bounds();
        let (start, end) = (self.start_angle(), self.end_angle());
        let mid = (start + end) / 2.0;
        let at = |radius: f64, angle: f64| self.normalize(Point::polar(radius, angle));

        let mut d = String::new();
        let p = at(self.outer_radius, start);
        let _ = write!(d, "M {:.4} {:.4}", p.x, p.y);
        self.write_arc(&mut d, &b, self.outer_radius, [mid, end], 1);
        let p = at(self.inner_radius, end);
        let _ = write!(d, " L {:.4} {:.4}", p.x, p.y);
        self.write_arc(&mut d, &b, self.inner_radius, [mid, start], 0);
        d.push_str(" Z");
        d
    }

    fn write_arc(&self, d: &mut String, b: &BoundingBox, radius: f64, through: [f64; 2], sweep: u8) {
        let (rx, ry) = (radius / b.width(), radius / b.height());
        for angle in through {
            let p = self.normalize(Point::polar(radius, angle));
            let _ = write!(
                d,
                " A {:.4} {:.4} 0 0 {} {:.4} {:.4}",
                rx, ry, sweep, p.x, p.y
            );
        }
    }
}

fn pick_color(colors: &[Color], index: usize, count: usize) -> Color {
    if colors.len() == count {
        return colors[index];
    }
    if colors.len() < 2 || count < 2 {
        return colors.first().copied().unwrap_or(Color::NEUTRAL);
    }
    let t = index as f64 / (count - 1) as f64;
    colors[(t * (colors.len() - 1) as f64).round() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn geometry(gap: f64) -> WedgeGeometry {
        WedgeGeometry::new(&GeometrySettings {
            gap_angle: gap,
            ..GeometrySettings::default()
        })
    }

    fn gray(n: usize) -> Vec<Color> {
        vec![Color::NEUTRAL; n]
    }

    // =========================================================================
    // Property-Based Tests
    // =========================================================================

    mod property_tests {
        use super::*;

        proptest! {
            /// Segment widths tile the sweep: they add up to 2pi - 2g.
            #[test]
            fn widths_sum_to_sweep(
                weights in prop::collection::vec(0.0f64..1e6, 1..50),
                gap in 0.0f64..3.0,
            ) {
                prop_assume!(weights.iter().any(|w| *w > 0.0));
                let geometry = geometry(gap);
                let segments = geometry.segments(&weights, &gray(weights.len()));

                let total: f64 = segments.iter().map(Segment::sweep).sum();
                prop_assert!((total - (2.0 * PI - 2.0 * gap)).abs() < 1e-9);
            }

            /// Segments are contiguous, start at the notch, and end exactly at the sweep end.
            #[test]
            fn segments_are_contiguous(
                weights in prop::collection::vec(0.0f64..100.0, 1..30),
                gap in 0.0f64..1.5,
            ) {
                prop_assume!(weights.iter().any(|w| *w > 0.0));
                let geometry = geometry(gap);
                let segments = geometry.segments(&weights, &gray(weights.len()));

                prop_assert_eq!(segments.len(), weights.len());
                prop_assert_eq!(segments[0].start_angle, geometry.start_angle());
                prop_assert_eq!(segments[segments.len() - 1].end_angle, geometry.end_angle());
                for pair in segments.windows(2) {
                    prop_assert_eq!(pair[0].end_angle, pair[1].start_angle);
                    prop_assert!(pair[0].sweep() >= 0.0);
                }
            }

            /// No boundary point of the ring falls outside the bounds.
            #[test]
            fn bounds_enclose_the_ring(gap in 0.0f64..3.1, steps in 8usize..64) {
                let geometry = geometry(gap);
                let b = geometry.bounds();
                let (start, end) = (geometry.start_angle(), geometry.end_angle());

                for i in 0..=steps {
                    let angle = start + (end - start) * i as f64 / steps as f64;
                    for radius in [0.6, 1.0] {
                        let p = Point::polar(radius, angle);
                        prop_assert!(p.x >= b.min_x - 1e-9 && p.x <= b.max_x + 1e-9);
                        prop_assert!(p.y >= b.min_y - 1e-9 && p.y <= b.max_y + 1e-9);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Unit Tests
    // =========================================================================

    #[test]
    fn equal_weights_get_equal_wedges() {
        let gap = PI / 16.0;
        let segments = geometry(gap).segments(&[1.0, 1.0, 1.0, 1.0], &gray(4));
        let expected = (2.0 * PI - 2.0 * gap) / 4.0;

        assert_eq!(segments.len(), 4);
        for segment in &segments {
            assert!((segment.sweep() - expected).abs() < 1e-12);
        }
        assert!((segments[0].start_angle - (-FRAC_PI_2 + gap)).abs() < 1e-15);
    }

    #[test]
    fn empty_and_zero_sum_are_degenerate() {
        let geometry = geometry(0.2);
        assert!(geometry.segments(&[], &[]).is_empty());
        assert!(geometry.segments(&[0.0, 0.0, 0.0], &gray(3)).is_empty());
        assert_eq!(percentages(&[]), None);
        assert_eq!(percentages(&[0.0, -1.0, f64::NAN]), None);
    }

    #[test]
    fn one_positive_weight_takes_the_whole_ring() {
        // Sum is zero, but the positive weight still counts.
        assert_eq!(percentages(&[-1.0, 1.0]), Some(vec![0.0, 100.0]));
        assert_eq!(percentages(&[-1.0, -2.0]), None);
    }

    #[test]
    fn percentages_follow_input_order() {
        let shares = percentages(&[1.0, 3.0, 0.0]).unwrap();
        assert_eq!(shares.len(), 3);
        assert!((shares[0] - 25.0).abs() < 1e-9);
        assert!((shares[1] - 75.0).abs() < 1e-9);
        assert_eq!(shares[2], 0.0);
    }

    #[test]
    fn huge_weights_do_not_overflow() {
        let shares = percentages(&[f64::MAX, f64::MAX]).unwrap();
        assert_eq!(shares, vec![50.0, 50.0]);
    }

    #[test]
    fn negative_weights_count_as_zero() {
        let segments = geometry(0.0).segments(&[-5.0, 2.0], &gray(2));
        assert_eq!(segments[0].sweep(), 0.0);
        assert!((segments[1].sweep() - 2.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn colors_follow_weight_index() {
        let red = Color::new(255, 0, 0);
        let blue = Color::new(0, 0, 255);
        let segments = geometry(0.1).segments(&[3.0, 1.0], &[red, blue]);
        assert_eq!(segments[0].color, red);
        assert_eq!(segments[1].color, blue);
    }

    #[test]
    fn mismatched_colors_resample_by_position() {
        let palette = [
            Color::new(1, 0, 0),
            Color::new(2, 0, 0),
            Color::new(3, 0, 0),
        ];
        let segments = geometry(0.1).segments(&[1.0; 5], &palette);
        let picked: Vec<u8> = segments.iter().map(|s| s.color.r).collect();
        assert_eq!(picked, vec![1, 2, 2, 3, 3]);
    }

    #[test]
    fn closed_ring_bounds_are_square() {
        let b = geometry(0.0).bounds();
        assert!((b.min_x + 1.0).abs() < 1e-12);
        assert!((b.max_x - 1.0).abs() < 1e-12);
        assert!((b.min_y + 1.0).abs() < 1e-12);
        assert!((b.max_y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gap_lowers_the_top_edge() {
        let gap = PI / 4.0;
        let b = geometry(gap).bounds();
        assert!((b.min_y + gap.cos()).abs() < 1e-12);
        assert!((b.max_y - 1.0).abs() < 1e-12);

        let wide = geometry(2.0).bounds();
        // Past a quarter turn the ends sit below the horizontal axis.
        assert!(wide.min_y > 0.0);
        assert!(wide.min_x > -1.0);
    }

    #[test]
    fn normalize_maps_bounds_to_unit_box() {
        let geometry = geometry(0.3);
        let b = geometry.bounds();
        let lo = geometry.normalize(Point::new(b.min_x, b.min_y));
        let hi = geometry.normalize(Point::new(b.max_x, b.max_y));
        assert_eq!(lo, Point::new(0.0, 0.0));
        assert_eq!(hi, Point::new(1.0, 1.0));
    }

    #[test]
    fn clip_path_outlines_two_arcs() {
        for gap in [0.0, PI / 16.0] {
            let d = geometry(gap).clip_path();
            assert!(d.starts_with("M "));
            assert!(d.ends_with(" Z"));
            assert_eq!(d.matches(" A ").count(), 4);
            assert_eq!(d.matches(" L ").count(), 1);
        }
    }
}
