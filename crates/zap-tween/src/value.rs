//! Values a tween can drive.
//!
//! Scalars go straight through the easing curve; glam vectors are eased
//! component by component with the same curve and parameters.

use std::fmt::Debug;
use std::ops::{Add, Sub};

use glam::{Vec2, Vec3, Vec4};

use crate::easing::{CurveParams, Easing};

/// A numeric or vector attribute value.
///
/// `Add`/`Sub` are needed for delta updates, where only the change since the
/// previous step is added on top of the owner's current value.
pub trait TweenValue: Copy + Debug + Add<Output = Self> + Sub<Output = Self> + 'static {
    /// Evaluate `curve` at `t` for begin `b`, change `c`, duration `d`.
    fn ease(curve: Easing, t: f32, b: Self, c: Self, d: f32, params: &CurveParams) -> Self;
}

impl TweenValue for f32 {
    #[inline]
    fn ease(curve: Easing, t: f32, b: f32, c: f32, d: f32, params: &CurveParams) -> f32 {
        curve.evaluate(t, b, c, d, params)
    }
}

impl TweenValue for Vec2 {
    fn ease(curve: Easing, t: f32, b: Vec2, c: Vec2, d: f32, params: &CurveParams) -> Vec2 {
        Vec2::new(
            curve.evaluate(t, b.x, c.x, d, params),
            curve.evaluate(t, b.y, c.y, d, params),
        )
    }
}

impl TweenValue for Vec3 {
    fn ease(curve: Easing, t: f32, b: Vec3, c: Vec3, d: f32, params: &CurveParams) -> Vec3 {
        Vec3::new(
            curve.evaluate(t, b.x, c.x, d, params),
            curve.evaluate(t, b.y, c.y, d, params),
            curve.evaluate(t, b.z, c.z, d, params),
        )
    }
}

impl TweenValue for Vec4 {
    fn ease(curve: Easing, t: f32, b: Vec4, c: Vec4, d: f32, params: &CurveParams) -> Vec4 {
        Vec4::new(
            curve.evaluate(t, b.x, c.x, d, params),
            curve.evaluate(t, b.y, c.y, d, params),
            curve.evaluate(t, b.z, c.z, d, params),
            curve.evaluate(t, b.w, c.w, d, params),
        )
    }
}
