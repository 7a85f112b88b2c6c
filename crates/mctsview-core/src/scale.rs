use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    config::{ColorRamp, RadiusRange},
    tree::{snapshot::EngineSummary, stats::TreeStats},
};

/// 8-bit sRGB color, written as `#rrggbb` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb8 { r, g, b }
    }

    /// Linear interpolation per channel, `t` in `[0, 1]`.
    pub fn lerp(self, other: Rgb8, t: f64) -> Rgb8 {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| {
            let a = f64::from(a);
            (a + (f64::from(b) - a) * t).round() as u8
        };
        Rgb8 {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb8 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("color '{s}' must have six hex digits"));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|err| format!("color '{s}': {err}"))
        };
        Ok(Rgb8 {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb8> for String {
    fn from(color: Rgb8) -> Self {
        color.to_string()
    }
}

/// The extrema the visual scales are fitted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrema {
    pub max_visits: u64,
    pub max_abs_value: f64,
}

impl From<&TreeStats> for Extrema {
    fn from(stats: &TreeStats) -> Self {
        Extrema {
            max_visits: stats.max_visits,
            max_abs_value: stats.max_abs_value,
        }
    }
}

impl EngineSummary {
    /// Full-tree extrema, when the engine reports both.
    pub fn extrema(&self) -> Option<Extrema> {
        Some(Extrema {
            max_visits: self.max_visits?,
            max_abs_value: self.max_abs_value.filter(|v| v.is_finite())?.abs(),
        })
    }
}

/// Visit count to radius, linear over `[1, max_visits]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeScale {
    max_visits: u64,
    range: RadiusRange,
}

impl SizeScale {
    pub fn new(max_visits: u64, range: RadiusRange) -> Self {
        SizeScale { max_visits, range }
    }

    /// Radius for `visits`, always inside the configured range.
    pub fn size_of(&self, visits: u64) -> f64 {
        let RadiusRange { min, max } = self.range;
        if self.max_visits <= 1 {
            return if visits >= 1 { max } else { min };
        }
        let t = (visits.max(1) - 1) as f64 / (self.max_visits - 1) as f64;
        min + (max - min) * t.min(1.0)
    }
}

/// Value to color, diverging around zero over `[-max_abs, 0, max_abs]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    max_abs_value: f64,
    ramp: ColorRamp,
}

impl ColorScale {
    pub fn new(max_abs_value: f64, ramp: ColorRamp) -> Self {
        let max_abs_value = if max_abs_value.is_finite() {
            max_abs_value.abs()
        } else {
            0.0
        };
        ColorScale {
            max_abs_value,
            ramp,
        }
    }

    /// Signed position of `value` on the ramp, clamped to `[-1, 1]`.
    pub fn position(&self, value: f64) -> f64 {
        if self.max_abs_value <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        (value / self.max_abs_value).clamp(-1.0, 1.0)
    }

    pub fn color_of(&self, value: f64) -> Rgb8 {
        let t = self.position(value);
        if t < 0.0 {
            self.ramp.neutral.lerp(self.ramp.negative, -t)
        } else {
            self.ramp.neutral.lerp(self.ramp.positive, t)
        }
    }
}

/// Size and color scales fitted to one set of extrema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualScales {
    pub extrema: Extrema,
    pub size: SizeScale,
    pub color: ColorScale,
}

impl VisualScales {
    pub fn fit(extrema: Extrema, radius: RadiusRange, ramp: ColorRamp) -> Self {
        VisualScales {
            extrema,
            size: SizeScale::new(extrema.max_visits, radius),
            color: ColorScale::new(extrema.max_abs_value, ramp),
        }
    }

    pub fn size_of(&self, visits: u64) -> f64 {
        self.size.size_of(visits)
    }

    pub fn color_of(&self, value: f64) -> Rgb8 {
        self.color.color_of(value)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn radius() -> RadiusRange {
        RadiusRange { min: 10.0, max: 30.0 }
    }

    fn ramp() -> ColorRamp {
        ColorRamp::default()
    }

    fn channel_distance(a: Rgb8, b: Rgb8) -> [i32; 3] {
        [
            (i32::from(a.r) - i32::from(b.r)).abs(),
            (i32::from(a.g) - i32::from(b.g)).abs(),
            (i32::from(a.b) - i32::from(b.b)).abs(),
        ]
    }

    #[test]
    fn hex_colors_parse_and_print() {
        let color: Rgb8 = "#d73027".parse().expect("valid hex");
        assert_eq!(color, Rgb8::new(0xd7, 0x30, 0x27));
        assert_eq!(color.to_string(), "#d73027");
        assert!("d73027".parse::<Rgb8>().is_err());
        assert!("#d7302".parse::<Rgb8>().is_err());
    }

    #[test]
    fn size_hits_both_ends_of_the_range() {
        let scale = SizeScale::new(10, radius());
        assert_eq!(scale.size_of(1), 10.0);
        assert_eq!(scale.size_of(10), 30.0);
        assert_eq!(scale.size_of(0), 10.0);
        assert_eq!(scale.size_of(500), 30.0);
    }

    #[test]
    fn degenerate_visit_domain_stays_in_range() {
        let scale = SizeScale::new(1, radius());
        assert_eq!(scale.size_of(0), 10.0);
        assert_eq!(scale.size_of(1), 30.0);
        let scale = SizeScale::new(0, radius());
        assert_eq!(scale.size_of(7), 30.0);
    }

    #[test]
    fn color_endpoints_and_neutral() {
        let scale = ColorScale::new(0.5, ramp());
        assert_eq!(scale.color_of(0.0), ramp().neutral);
        assert_eq!(scale.color_of(-0.5), ramp().negative);
        assert_eq!(scale.color_of(0.5), ramp().positive);
        assert_eq!(scale.color_of(-3.0), ramp().negative);
        assert_eq!(scale.color_of(f64::NAN), ramp().neutral);
    }

    #[test]
    fn zero_extent_maps_everything_to_neutral() {
        let scale = ColorScale::new(0.0, ramp());
        assert_eq!(scale.color_of(0.7), ramp().neutral);
        assert_eq!(scale.color_of(-0.7), ramp().neutral);
    }

    #[test]
    fn summary_extrema_need_both_fields() {
        let mut summary = EngineSummary {
            total_nodes: 4,
            average_visits: 2.0,
            average_value: 0.1,
            max_visits: Some(9),
            max_abs_value: None,
        };
        assert_eq!(summary.extrema(), None);
        summary.max_abs_value = Some(-0.8);
        assert_eq!(
            summary.extrema(),
            Some(Extrema {
                max_visits: 9,
                max_abs_value: 0.8
            })
        );
    }

    proptest! {
        #[test]
        fn size_is_monotonic_and_bounded(max in 0u64..10_000, a in 0u64..20_000, b in 0u64..20_000) {
            let scale = SizeScale::new(max, radius());
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale.size_of(lo) <= scale.size_of(hi));
            for n in [lo, hi] {
                let r = scale.size_of(n);
                prop_assert!((10.0..=30.0).contains(&r));
            }
        }

        #[test]
        fn color_is_symmetric_around_neutral(max in 0.01f64..10.0, frac in 0.0f64..=1.0) {
            let scale = ColorScale::new(max, ramp());
            let v = max * frac;
            prop_assert_eq!(scale.position(v), -scale.position(-v));

            let r = ramp();
            let up = channel_distance(scale.color_of(v), r.neutral);
            let down = channel_distance(scale.color_of(-v), r.neutral);
            let up_full = channel_distance(r.positive, r.neutral);
            let down_full = channel_distance(r.negative, r.neutral);
            for c in 0..3 {
                // Both halves sit at the same fraction of their span.
                let expected_up = f64::from(up_full[c]) * frac;
                let expected_down = f64::from(down_full[c]) * frac;
                prop_assert!((f64::from(up[c]) - expected_up).abs() <= 1.0);
                prop_assert!((f64::from(down[c]) - expected_down).abs() <= 1.0);
            }
        }

        #[test]
        fn color_is_monotonic_on_each_half(max in 0.01f64..10.0, a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let scale = ColorScale::new(max, ramp());
            let r = ramp();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for (endpoint, sign) in [(r.positive, 1.0), (r.negative, -1.0)] {
                let near = channel_distance(scale.color_of(sign * lo * max), r.neutral);
                let far = channel_distance(scale.color_of(sign * hi * max), r.neutral);
                let span = channel_distance(endpoint, r.neutral);
                for c in 0..3 {
                    prop_assert!(near[c] <= far[c]);
                    prop_assert!(far[c] <= span[c]);
                }
            }
        }
    }
}
