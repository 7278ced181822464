//! zap-tween: attribute tweening with serial/parallel composition.
//!
//! A [`Tweener`] owns the running tweens and advances them from the game's
//! update loop. Each leaf [`Tween`] drives one attribute of one owner through
//! an easing curve; leaves compose into serial and parallel groups that can be
//! nested and repeated.

// Lifecycle logging through the `log` facade, prefixed with the tweener label
// and silenced when the tweener's config disables logging.
macro_rules! tween_log {
    ($tweener:expr, $level:ident, $($arg:tt)+) => {
        if $tweener.config().logging {
            log::$level!("{}: {}", $tweener.config().label, format_args!($($arg)+));
        }
    };
}

pub mod binding;
pub mod config;
pub mod easing;
pub mod error;
mod group;
pub mod rng;
pub mod tween;
pub mod tweener;
pub mod value;

// Re-export key types at crate root for convenience
pub use binding::{Binding, OwnerKey};
pub use config::TweenerConfig;
pub use easing::{ease, lerp, CurveParams, Easing};
pub use error::{Result, TweenError};
pub use tween::{EndCallback, Tween, TweenOptions, TweenState};
pub use tweener::{Tweener, TweenerId};
pub use value::TweenValue;
