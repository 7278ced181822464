use crate::tween::TweenState;

/// Result alias that carries [`TweenError`].
pub type Result<T> = std::result::Result<T, TweenError>;

/// Everything the tween API can reject.
///
/// Construction and usage errors are raised immediately so a bad composition
/// fails where it is written instead of producing wrong timing later.
#[derive(Debug, thiserror::Error)]
pub enum TweenError {
    /// A leaf tween needs a finite, strictly positive duration.
    #[error("tween duration must be > 0, got {duration}")]
    NonPositiveDuration { duration: f32 },

    /// Groups can only be built from tweens that were never started.
    #[error("tween should be 'created' but is '{state}' (hint: create it with auto_start disabled)")]
    NotCreated { state: TweenState },

    /// The tween was created by a different tweener instance.
    #[error("tween has been created with another tweener")]
    ForeignTweener,

    /// The tween is already a child of another group.
    #[error("tween already belongs to a group")]
    AlreadyGrouped,

    #[error("a group needs at least one tween")]
    EmptyGroup,

    #[error("unknown state '{0}', expected one of: created, active, paused, ended")]
    UnknownState(String),

    #[error("unknown easing curve '{0}'")]
    UnknownCurve(String),

    /// `resume` was called on something that is not paused.
    #[error("tween is not paused (state '{state}')")]
    NotPaused { state: TweenState },

    #[error("delta time must be finite and >= 0, got {dt}")]
    InvalidDelta { dt: f32 },

    #[error("invalid tweener config: {0}")]
    Config(#[from] serde_json::Error),
}
