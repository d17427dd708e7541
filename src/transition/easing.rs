//! Easing curves for view transitions.
//!
//! A view's easing is a small string language: named curves like
//! `"power2.inOut"` or `"sine.out"`, or a custom cubic bezier written as
//! an SVG-style path (`"M0,0 C0.3,0 0.7,1 1,1"`). Unparseable strings
//! fall back to the default curve with a warning.

use log::warn;

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EaseDirection {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// gsap-style `powerN`: polynomial of degree N + 1.
    Power(u32, EaseDirection),
    Sine(EaseDirection),
    CubicBezier(CubicBezier),
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Power(2, EaseDirection::InOut)
    }
}

impl Easing {
    /// Parse an easing string, falling back to [`Easing::default`] when
    /// the string is not understood.
    pub fn parse(source: &str) -> Self {
        match Self::try_parse(source) {
            Some(easing) => easing,
            None => {
                warn!("unrecognized easing {source:?}, falling back to power2.inOut");
                Easing::default()
            }
        }
    }

    fn try_parse(source: &str) -> Option<Self> {
        let trimmed = source.trim();
        if trimmed.starts_with('M') || trimmed.starts_with('m') {
            return CubicBezier::parse_path(trimmed).map(Easing::CubicBezier);
        }

        let (name, direction) = match trimmed.split_once('.') {
            Some((name, suffix)) => {
                let direction = match suffix {
                    "in" => EaseDirection::In,
                    "out" => EaseDirection::Out,
                    "inOut" => EaseDirection::InOut,
                    _ => return None,
                };
                (name, direction)
            }
            // Bare names ease out, matching the gsap defaults.
            None => (trimmed, EaseDirection::Out),
        };

        match name {
            "linear" | "none" => Some(Easing::Linear),
            "power0" => Some(Easing::Linear),
            "power1" => Some(Easing::Power(1, direction)),
            "power2" => Some(Easing::Power(2, direction)),
            "power3" => Some(Easing::Power(3, direction)),
            "power4" => Some(Easing::Power(4, direction)),
            "sine" => Some(Easing::Sine(direction)),
            _ => None,
        }
    }

    /// Map linear progress `t` in [0, 1] to eased progress.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::Power(n, direction) => {
                let degree = (n + 1) as i32;
                match direction {
                    EaseDirection::In => t.powi(degree),
                    EaseDirection::Out => 1.0 - (1.0 - t).powi(degree),
                    EaseDirection::InOut => {
                        if t < 0.5 {
                            0.5 * (2.0 * t).powi(degree)
                        } else {
                            1.0 - 0.5 * (2.0 * (1.0 - t)).powi(degree)
                        }
                    }
                }
            }
            Easing::Sine(direction) => {
                use std::f32::consts::{FRAC_PI_2, PI};
                match direction {
                    EaseDirection::In => 1.0 - (t * FRAC_PI_2).cos(),
                    EaseDirection::Out => (t * FRAC_PI_2).sin(),
                    EaseDirection::InOut => -((PI * t).cos() - 1.0) / 2.0,
                }
            }
            Easing::CubicBezier(bezier) => bezier.apply(t),
        }
    }
}

/// Unit cubic bezier with anchors pinned at (0,0) and (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    /// Parse a path of the shape `M0,0 C x1,y1 x2,y2 1,1`. Whitespace is
    /// insignificant; the leading and trailing anchors must be present.
    fn parse_path(path: &str) -> Option<Self> {
        let numbers: Vec<f32> = path
            .split(|c: char| {
                c.is_whitespace() || c == ',' || c == 'M' || c == 'm' || c == 'C' || c == 'c'
            })
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;

        // 0,0 x1,y1 x2,y2 1,1
        if numbers.len() != 8 || numbers[0] != 0.0 || numbers[1] != 0.0 {
            return None;
        }

        let bezier = CubicBezier {
            x1: numbers[2].clamp(0.0, 1.0),
            y1: numbers[3],
            x2: numbers[4].clamp(0.0, 1.0),
            y2: numbers[5],
        };
        (numbers[6] == 1.0 && numbers[7] == 1.0).then_some(bezier)
    }

    fn sample(a: f32, b: f32, t: f32) -> f32 {
        // Coefficients of the unit bezier along one axis.
        let c3 = 1.0 + 3.0 * (a - b);
        let c2 = 3.0 * (b - 2.0 * a);
        let c1 = 3.0 * a;
        ((c3 * t + c2) * t + c1) * t
    }

    fn sample_derivative(a: f32, b: f32, t: f32) -> f32 {
        let c3 = 1.0 + 3.0 * (a - b);
        let c2 = 3.0 * (b - 2.0 * a);
        let c1 = 3.0 * a;
        (3.0 * c3 * t + 2.0 * c2) * t + c1
    }

    /// Solve x(t) = x for the curve parameter, Newton first with a
    /// bisection fallback for flat derivatives.
    fn solve_t_for_x(&self, x: f32) -> f32 {
        let mut t = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = Self::sample(self.x1, self.x2, t) - x;
            if err.abs() < 1e-6 {
                return t;
            }
            let d = Self::sample_derivative(self.x1, self.x2, t);
            if d.abs() < 1e-6 {
                break;
            }
            t -= err / d;
        }

        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        t = x;
        for _ in 0..BISECTION_ITERATIONS {
            let err = Self::sample(self.x1, self.x2, t) - x;
            if err.abs() < 1e-6 {
                break;
            }
            if err > 0.0 {
                hi = t;
            } else {
                lo = t;
            }
            t = (lo + hi) / 2.0;
        }
        t
    }

    pub fn apply(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        Self::sample(self.y1, self.y2, self.solve_t_for_x(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_eases() {
        assert_eq!(Easing::parse("linear"), Easing::Linear);
        assert_eq!(Easing::parse("power2.inOut"), Easing::Power(2, EaseDirection::InOut));
        assert_eq!(Easing::parse("power4.in"), Easing::Power(4, EaseDirection::In));
        assert_eq!(Easing::parse("sine.out"), Easing::Sine(EaseDirection::Out));
        // Bare name defaults to ease-out.
        assert_eq!(Easing::parse("power1"), Easing::Power(1, EaseDirection::Out));
    }

    #[test]
    fn unknown_ease_falls_back_to_default() {
        assert_eq!(Easing::parse("elastic.wobble"), Easing::default());
        assert_eq!(Easing::parse(""), Easing::default());
    }

    #[test]
    fn parses_custom_bezier_path_with_whitespace() {
        let parsed = Easing::parse("M0,0 C 0.3,0 0.7,1 1,1");
        match parsed {
            Easing::CubicBezier(b) => {
                assert_eq!((b.x1, b.y1, b.x2, b.y2), (0.3, 0.0, 0.7, 1.0));
            }
            other => panic!("expected bezier, got {other:?}"),
        }
        // Space-separated coordinate pairs, the usual SVG shape.
        assert_eq!(Easing::parse("M0,0 C0.3,0 0.7,1 1,1"), parsed);
    }

    #[test]
    fn malformed_bezier_path_falls_back() {
        assert_eq!(Easing::parse("M0,0C0.3,0"), Easing::default());
        assert_eq!(Easing::parse("M1,1C0,0,1,1,1,1"), Easing::default());
    }

    #[test]
    fn easing_endpoints_are_exact() {
        for easing in [
            Easing::Linear,
            Easing::Power(2, EaseDirection::InOut),
            Easing::Sine(EaseDirection::In),
            Easing::parse("M0,0C0.25,0.1,0.25,1,1,1"),
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn eased_progress_is_monotonic_for_standard_curves() {
        let easing = Easing::Power(3, EaseDirection::InOut);
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = easing.apply(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn bezier_matches_linear_when_control_points_are_diagonal() {
        let bezier = Easing::parse("M0,0C0.25,0.25,0.75,0.75,1,1");
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((bezier.apply(t) - t).abs() < 1e-3);
        }
    }
}
