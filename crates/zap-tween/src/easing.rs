// easing.rs
//
// Pure easing curves for tween interpolation.
// Every curve follows the same contract: `f(t, b, c, d, params)` where
// t = elapsed time, b = begin value, c = change, d = duration.
// Plain math with no scheduler dependencies.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TweenError;
use crate::rng::Rng;

const TWO_PI: f32 = PI * 2.0;
const HALF_PI: f32 = PI / 2.0;
const DEFAULT_OVERSHOOT: f32 = 1.70158;

/// Optional shape parameters used by the elastic, back and random curves.
/// `None` means "use the curve's own default".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveParams {
    /// Elastic period. Defaults to `0.3 * d` (`0.45 * d` for in-out).
    pub period: Option<f32>,
    /// Elastic amplitude. Anything smaller than `|c|` falls back to `c`.
    pub amplitude: Option<f32>,
    /// Back overshoot. Defaults to 1.70158.
    pub overshoot: Option<f32>,
    /// Inclusive integer range added by `RandomIntBounce`. Defaults to `(0, 1)`.
    pub range: Option<(i32, i32)>,
}

impl CurveParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_period(mut self, period: f32) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = Some(amplitude);
        self
    }

    pub fn with_overshoot(mut self, overshoot: f32) -> Self {
        self.overshoot = Some(overshoot);
        self
    }

    pub fn with_range(mut self, low: i32, high: i32) -> Self {
        self.range = Some((low, high));
        self
    }
}

/// Easing curve catalog.
///
/// Each family comes in four forms: `In` (slow start), `Out` (slow end),
/// `InOut` (slow start and end) and `OutIn` (fast start and end, slow middle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant velocity (no easing).
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    QuadOutIn,
    CubicIn,
    CubicOut,
    CubicInOut,
    CubicOutIn,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuartOutIn,
    QuintIn,
    QuintOut,
    QuintInOut,
    QuintOutIn,
    SineIn,
    SineOut,
    SineInOut,
    SineOutIn,
    /// Exponential easing (dramatic).
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    ExpoOutIn,
    CircIn,
    CircOut,
    CircInOut,
    CircOutIn,
    /// Elastic spring. Shaped by `period` and `amplitude`.
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    ElasticOutIn,
    /// Overshoot then settle. Shaped by `overshoot`.
    BackIn,
    BackOut,
    BackInOut,
    BackOutIn,
    BounceIn,
    BounceOut,
    BounceInOut,
    BounceOutIn,
    /// Jumps to `b + k` for a pseudo-random integer `k` in `range` while running.
    /// Only the boundary values are deterministic.
    RandomIntBounce,
}

#[derive(Debug, Clone, Copy)]
enum Family {
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Elastic,
    Back,
    Bounce,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    In,
    Out,
    InOut,
    OutIn,
}

impl Easing {
    /// Every curve, in catalog order.
    pub const ALL: [Easing; 42] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::QuadOutIn,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::CubicOutIn,
        Easing::QuartIn,
        Easing::QuartOut,
        Easing::QuartInOut,
        Easing::QuartOutIn,
        Easing::QuintIn,
        Easing::QuintOut,
        Easing::QuintInOut,
        Easing::QuintOutIn,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::SineOutIn,
        Easing::ExpoIn,
        Easing::ExpoOut,
        Easing::ExpoInOut,
        Easing::ExpoOutIn,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CircInOut,
        Easing::CircOutIn,
        Easing::ElasticIn,
        Easing::ElasticOut,
        Easing::ElasticInOut,
        Easing::ElasticOutIn,
        Easing::BackIn,
        Easing::BackOut,
        Easing::BackInOut,
        Easing::BackOutIn,
        Easing::BounceIn,
        Easing::BounceOut,
        Easing::BounceInOut,
        Easing::BounceOutIn,
        Easing::RandomIntBounce,
    ];

    /// Evaluate the curve at time `t` for begin `b`, change `c` and duration `d`.
    ///
    /// `t` is clamped to `[0, d]`: the result is exactly `b` at the start and
    /// exactly `b + c` at the end, so chained segments never drift.
    pub fn evaluate(self, t: f32, b: f32, c: f32, d: f32, params: &CurveParams) -> f32 {
        if t <= 0.0 {
            return b;
        }
        if t >= d {
            return b + c;
        }
        match self.shape() {
            Some((family, mode)) => ease_mode(family, mode, t, b, c, d, params),
            None if self == Easing::RandomIntBounce => random_int_bounce(t, b, params),
            None => c * t / d + b,
        }
    }

    /// Apply the curve to a normalized time value `t` in [0, 1].
    /// Returns the eased progress, typically in [0, 1] (Back/Elastic overshoot).
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        self.evaluate(t.clamp(0.0, 1.0), 0.0, 1.0, 1.0, &CurveParams::default())
    }

    /// Stable snake_case name, e.g. `"quad_in_out"`.
    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::QuadIn => "quad_in",
            Easing::QuadOut => "quad_out",
            Easing::QuadInOut => "quad_in_out",
            Easing::QuadOutIn => "quad_out_in",
            Easing::CubicIn => "cubic_in",
            Easing::CubicOut => "cubic_out",
            Easing::CubicInOut => "cubic_in_out",
            Easing::CubicOutIn => "cubic_out_in",
            Easing::QuartIn => "quart_in",
            Easing::QuartOut => "quart_out",
            Easing::QuartInOut => "quart_in_out",
            Easing::QuartOutIn => "quart_out_in",
            Easing::QuintIn => "quint_in",
            Easing::QuintOut => "quint_out",
            Easing::QuintInOut => "quint_in_out",
            Easing::QuintOutIn => "quint_out_in",
            Easing::SineIn => "sine_in",
            Easing::SineOut => "sine_out",
            Easing::SineInOut => "sine_in_out",
            Easing::SineOutIn => "sine_out_in",
            Easing::ExpoIn => "expo_in",
            Easing::ExpoOut => "expo_out",
            Easing::ExpoInOut => "expo_in_out",
            Easing::ExpoOutIn => "expo_out_in",
            Easing::CircIn => "circ_in",
            Easing::CircOut => "circ_out",
            Easing::CircInOut => "circ_in_out",
            Easing::CircOutIn => "circ_out_in",
            Easing::ElasticIn => "elastic_in",
            Easing::ElasticOut => "elastic_out",
            Easing::ElasticInOut => "elastic_in_out",
            Easing::ElasticOutIn => "elastic_out_in",
            Easing::BackIn => "back_in",
            Easing::BackOut => "back_out",
            Easing::BackInOut => "back_in_out",
            Easing::BackOutIn => "back_out_in",
            Easing::BounceIn => "bounce_in",
            Easing::BounceOut => "bounce_out",
            Easing::BounceInOut => "bounce_in_out",
            Easing::BounceOutIn => "bounce_out_in",
            Easing::RandomIntBounce => "random_int_bounce",
        }
    }

    fn shape(self) -> Option<(Family, Mode)> {
        use Family::*;
        use Mode::*;
        let shape = match self {
            Easing::Linear | Easing::RandomIntBounce => return None,
            Easing::QuadIn => (Quad, In),
            Easing::QuadOut => (Quad, Out),
            Easing::QuadInOut => (Quad, InOut),
            Easing::QuadOutIn => (Quad, OutIn),
            Easing::CubicIn => (Cubic, In),
            Easing::CubicOut => (Cubic, Out),
            Easing::CubicInOut => (Cubic, InOut),
            Easing::CubicOutIn => (Cubic, OutIn),
            Easing::QuartIn => (Quart, In),
            Easing::QuartOut => (Quart, Out),
            Easing::QuartInOut => (Quart, InOut),
            Easing::QuartOutIn => (Quart, OutIn),
            Easing::QuintIn => (Quint, In),
            Easing::QuintOut => (Quint, Out),
            Easing::QuintInOut => (Quint, InOut),
            Easing::QuintOutIn => (Quint, OutIn),
            Easing::SineIn => (Sine, In),
            Easing::SineOut => (Sine, Out),
            Easing::SineInOut => (Sine, InOut),
            Easing::SineOutIn => (Sine, OutIn),
            Easing::ExpoIn => (Expo, In),
            Easing::ExpoOut => (Expo, Out),
            Easing::ExpoInOut => (Expo, InOut),
            Easing::ExpoOutIn => (Expo, OutIn),
            Easing::CircIn => (Circ, In),
            Easing::CircOut => (Circ, Out),
            Easing::CircInOut => (Circ, InOut),
            Easing::CircOutIn => (Circ, OutIn),
            Easing::ElasticIn => (Elastic, In),
            Easing::ElasticOut => (Elastic, Out),
            Easing::ElasticInOut => (Elastic, InOut),
            Easing::ElasticOutIn => (Elastic, OutIn),
            Easing::BackIn => (Back, In),
            Easing::BackOut => (Back, Out),
            Easing::BackInOut => (Back, InOut),
            Easing::BackOutIn => (Back, OutIn),
            Easing::BounceIn => (Bounce, In),
            Easing::BounceOut => (Bounce, Out),
            Easing::BounceInOut => (Bounce, InOut),
            Easing::BounceOutIn => (Bounce, OutIn),
        };
        Some(shape)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = TweenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Easing::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| TweenError::UnknownCurve(s.to_string()))
    }
}

// ── Curve math ───────────────────────────────────────────────────────────
//
// The helpers below assume 0 < t < d; `Easing::evaluate` handles the ends.

fn ease_mode(family: Family, mode: Mode, t: f32, b: f32, c: f32, d: f32, p: &CurveParams) -> f32 {
    let half = d / 2.0;
    match mode {
        Mode::In => ease_in(family, t, b, c, d, p),
        Mode::Out => ease_out(family, t, b, c, d, p),
        Mode::InOut => match family {
            Family::Elastic => elastic_in_out(t, b, c, d, p),
            Family::Back => back_in_out(t, b, c, d, p),
            _ if t < half => ease_in(family, t * 2.0, b, c / 2.0, d, p),
            _ => ease_out(family, t * 2.0 - d, b + c / 2.0, c / 2.0, d, p),
        },
        Mode::OutIn => {
            if t < half {
                ease_out(family, t * 2.0, b, c / 2.0, d, p)
            } else {
                ease_in(family, t * 2.0 - d, b + c / 2.0, c / 2.0, d, p)
            }
        }
    }
}

fn ease_in(family: Family, t: f32, b: f32, c: f32, d: f32, p: &CurveParams) -> f32 {
    let u = t / d;
    match family {
        Family::Quad => c * u * u + b,
        Family::Cubic => c * u * u * u + b,
        Family::Quart => c * u.powi(4) + b,
        Family::Quint => c * u.powi(5) + b,
        Family::Sine => -c * (u * HALF_PI).cos() + c + b,
        Family::Expo => {
            if t == 0.0 {
                b
            } else {
                c * 2.0_f32.powf(10.0 * (u - 1.0)) + b
            }
        }
        Family::Circ => -c * ((1.0 - u * u).max(0.0).sqrt() - 1.0) + b,
        Family::Elastic => elastic_in(t, b, c, d, p),
        Family::Back => {
            let s = p.overshoot.unwrap_or(DEFAULT_OVERSHOOT);
            c * u * u * ((s + 1.0) * u - s) + b
        }
        Family::Bounce => c - bounce_out(d - t, 0.0, c, d) + b,
    }
}

fn ease_out(family: Family, t: f32, b: f32, c: f32, d: f32, p: &CurveParams) -> f32 {
    let u = t / d;
    let v = u - 1.0;
    match family {
        Family::Quad => -c * u * (u - 2.0) + b,
        Family::Cubic => c * (v * v * v + 1.0) + b,
        Family::Quart => -c * (v.powi(4) - 1.0) + b,
        Family::Quint => c * (v.powi(5) + 1.0) + b,
        Family::Sine => c * (u * HALF_PI).sin() + b,
        Family::Expo => {
            if t == d {
                b + c
            } else {
                c * (1.0 - 2.0_f32.powf(-10.0 * u)) + b
            }
        }
        Family::Circ => c * (1.0 - v * v).max(0.0).sqrt() + b,
        Family::Elastic => elastic_out(t, b, c, d, p),
        Family::Back => {
            let s = p.overshoot.unwrap_or(DEFAULT_OVERSHOOT);
            c * (v * v * ((s + 1.0) * v + s) + 1.0) + b
        }
        Family::Bounce => bounce_out(t, b, c, d),
    }
}

fn back_in_out(t: f32, b: f32, c: f32, d: f32, p: &CurveParams) -> f32 {
    let s = p.overshoot.unwrap_or(DEFAULT_OVERSHOOT) * 1.525;
    let u = t / (d / 2.0);
    if u < 1.0 {
        c / 2.0 * (u * u * ((s + 1.0) * u - s)) + b
    } else {
        let u = u - 2.0;
        c / 2.0 * (u * u * ((s + 1.0) * u + s) + 2.0) + b
    }
}

/// Effective amplitude and phase shift for an elastic curve.
fn elastic_shape(c: f32, period: f32, amplitude: f32) -> (f32, f32) {
    if amplitude == 0.0 || amplitude < c.abs() {
        (c, period / 4.0)
    } else {
        (amplitude, period / TWO_PI * (c / amplitude).asin())
    }
}

fn elastic_in(t: f32, b: f32, c: f32, d: f32, p: &CurveParams) -> f32 {
    if t == 0.0 {
        return b;
    }
    let u = t / d;
    if u == 1.0 {
        return b + c;
    }
    let period = p.period.unwrap_or(d * 0.3);
    let (a, s) = elastic_shape(c, period, p.amplitude.unwrap_or(0.0));
    let u = u - 1.0;
    -(a * 2.0_f32.powf(10.0 * u) * ((u * d - s) * TWO_PI / period).sin()) + b
}

fn elastic_out(t: f32, b: f32, c: f32, d: f32, p: &CurveParams) -> f32 {
    if t == 0.0 {
        return b;
    }
    let u = t / d;
    if u == 1.0 {
        return b + c;
    }
    let period = p.period.unwrap_or(d * 0.3);
    let (a, s) = elastic_shape(c, period, p.amplitude.unwrap_or(1.0));
    a * 2.0_f32.powf(-10.0 * u) * ((u * d - s) * TWO_PI / period).sin() + c + b
}

fn elastic_in_out(t: f32, b: f32, c: f32, d: f32, p: &CurveParams) -> f32 {
    let period = p.period.unwrap_or(d * 0.3 * 1.5);
    let (a, s) = elastic_shape(c, period, p.amplitude.unwrap_or(0.0));
    let u = t / (d / 2.0) - 1.0;
    let wave = ((u * d - s) * TWO_PI / period).sin();
    if u < 0.0 {
        -0.5 * (a * 2.0_f32.powf(10.0 * u) * wave) + b
    } else {
        a * 2.0_f32.powf(-10.0 * u) * wave * 0.5 + c + b
    }
}

fn bounce_out(t: f32, b: f32, c: f32, d: f32) -> f32 {
    c * bounce_unit(t / d) + b
}

#[inline]
fn bounce_unit(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

fn random_int_bounce(t: f32, b: f32, p: &CurveParams) -> f32 {
    let (low, high) = p.range.unwrap_or((0, 1));
    let mut rng = Rng::from_sample(t);
    b + rng.next_in_range(low, high) as f32
}

// ── Interpolation helpers ────────────────────────────────────────────────

/// Linearly interpolate between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate with easing, `t` normalized to [0, 1].
#[inline]
pub fn ease(a: f32, b: f32, t: f32, easing: Easing) -> f32 {
    lerp(a, b, easing.apply(t))
}
