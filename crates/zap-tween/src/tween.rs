// tween.rs
//
// Tween nodes and the `Tween` handle.
// A node is either a leaf (one attribute interpolation) or a group
// (serial / parallel). Handles are cheap to clone and compare by identity.
//
// Usage:
//   let x = Binding::new(&ball, "x", |b: &Ball| b.x, |b: &mut Ball, v| b.x = v);
//   let tween = tweener.create_tween_to(x, 0.0, 100.0, 0.5, TweenOptions::new())?;
//   tweener.update(dt)?;  // Advances all tweens, writes into `ball`

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use crate::binding::{Binding, OwnerKey, Write};
use crate::easing::{CurveParams, Easing};
use crate::error::{Result, TweenError};
use crate::group::{self, GroupKind, Parallel, Serial};
use crate::tweener::{Tweener, TweenerId};
use crate::value::TweenValue;

/// Lifecycle state of a tween or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenState {
    /// Built but never started. Only created tweens can be grouped.
    Created,
    Active,
    Paused,
    /// Finished naturally or stopped. Can be started again.
    Ended,
}

impl TweenState {
    pub fn name(self) -> &'static str {
        match self {
            TweenState::Created => "created",
            TweenState::Active => "active",
            TweenState::Paused => "paused",
            TweenState::Ended => "ended",
        }
    }

    /// Active or paused.
    pub fn is_running(self) -> bool {
        matches!(self, TweenState::Active | TweenState::Paused)
    }
}

impl fmt::Display for TweenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TweenState {
    type Err = TweenError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "created" => Ok(TweenState::Created),
            "active" => Ok(TweenState::Active),
            "paused" => Ok(TweenState::Paused),
            "ended" => Ok(TweenState::Ended),
            other => Err(TweenError::UnknownState(other.to_string())),
        }
    }
}

/// Callback fired when a tween or group ends naturally (never on `stop`).
/// Receives the tweener, so it can start or chain further tweens.
pub type EndCallback = Box<dyn FnMut(&mut Tweener, &Tween)>;

/// Creation options for a leaf tween.
pub struct TweenOptions {
    /// Easing curve.
    pub curve: Easing,
    /// Curve shape parameters (elastic, back, random).
    pub params: CurveParams,
    /// Seconds to wait before the curve starts advancing.
    pub delay: f32,
    /// Add per-step changes to the current value instead of overwriting it.
    pub delta_mode: bool,
    /// Write the start value as soon as the tween starts, even when delayed.
    pub immediate: bool,
    /// Start right away. Disable to put the tween into a group.
    pub auto_start: bool,
    pub(crate) on_end: Option<EndCallback>,
}

impl Default for TweenOptions {
    fn default() -> Self {
        Self {
            curve: Easing::Linear,
            params: CurveParams::default(),
            delay: 0.0,
            delta_mode: false,
            immediate: true,
            auto_start: true,
            on_end: None,
        }
    }
}

impl TweenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Builder methods --

    pub fn with_curve(mut self, curve: Easing) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_params(mut self, params: CurveParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_delta_mode(mut self, delta_mode: bool) -> Self {
        self.delta_mode = delta_mode;
        self
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Disable to start the tween later or put it into a group.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn with_on_end(mut self, on_end: impl FnMut(&mut Tweener, &Tween) + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }
}

impl fmt::Debug for TweenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenOptions")
            .field("curve", &self.curve)
            .field("params", &self.params)
            .field("delay", &self.delay)
            .field("delta_mode", &self.delta_mode)
            .field("immediate", &self.immediate)
            .field("auto_start", &self.auto_start)
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

// ── Leaf channel ─────────────────────────────────────────────────────────

/// Type-erased attribute writer of a leaf.
pub(crate) trait Channel {
    fn owner(&self) -> OwnerKey;
    fn attribute(&self) -> &'static str;
    /// Forget delta-mode history. Called whenever a run begins.
    fn rewind(&mut self);
    /// Write the curve value at `t`.
    fn apply(&mut self, t: f32, duration: f32) -> Write;
}

struct Track<V: TweenValue> {
    binding: Binding<V>,
    begin: V,
    change: V,
    curve: Easing,
    params: CurveParams,
    delta_mode: bool,
    last_value: V,
}

impl<V: TweenValue> Channel for Track<V> {
    fn owner(&self) -> OwnerKey {
        self.binding.owner()
    }

    fn attribute(&self) -> &'static str {
        self.binding.attribute()
    }

    fn rewind(&mut self) {
        self.last_value = self.begin;
    }

    fn apply(&mut self, t: f32, duration: f32) -> Write {
        let value = V::ease(self.curve, t, self.begin, self.change, duration, &self.params);
        if !self.delta_mode {
            return self.binding.set(value);
        }
        let current = match self.binding.read() {
            Ok(current) => current,
            Err(outcome) => return outcome,
        };
        let outcome = self.binding.set(current + (value - self.last_value));
        // A skipped step keeps its delta for the next one.
        if outcome == Write::Applied {
            self.last_value = value;
        }
        outcome
    }
}

pub(crate) struct Leaf {
    pub(crate) duration: f32,
    pub(crate) delay: f32,
    pub(crate) channel: Box<dyn Channel>,
}

// ── Nodes ────────────────────────────────────────────────────────────────

pub(crate) enum NodeKind {
    Leaf(Leaf),
    Parallel(Parallel),
    Serial(Serial),
}

pub(crate) struct Node {
    pub(crate) tweener: TweenerId,
    pub(crate) state: TweenState,
    /// Local clock. Leaves start at `-delay`.
    pub(crate) elapsed: f32,
    /// Bumped on every (re)start so stale completions can be told apart.
    pub(crate) generation: u32,
    pub(crate) on_end: Option<EndCallback>,
    /// Group this node was composed into.
    pub(crate) parent: Option<Weak<RefCell<Node>>>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(tweener: TweenerId, kind: NodeKind) -> Self {
        Self {
            tweener,
            state: TweenState::Created,
            elapsed: 0.0,
            generation: 0,
            on_end: None,
            parent: None,
            kind,
        }
    }

    fn duration(&self) -> f32 {
        match &self.kind {
            NodeKind::Leaf(leaf) => leaf.duration,
            NodeKind::Parallel(parallel) => parallel.duration(),
            NodeKind::Serial(serial) => serial.duration(),
        }
    }
}

/// Result of advancing one leaf by `dt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Not active, or still inside its delay.
    Idle,
    Running,
    Finished,
    OwnerGone,
}

/// Handle to a tween or group.
///
/// Clones share the same node; equality is identity.
#[derive(Clone)]
pub struct Tween(pub(crate) Rc<RefCell<Node>>);

impl Tween {
    pub(crate) fn from_node(node: Node) -> Self {
        Tween(Rc::new(RefCell::new(node)))
    }

    pub(crate) fn leaf<V: TweenValue>(
        tweener: TweenerId,
        binding: Binding<V>,
        begin: V,
        change: V,
        duration: f32,
        options: TweenOptions,
    ) -> Result<Self> {
        if !(duration > 0.0 && duration.is_finite()) {
            return Err(TweenError::NonPositiveDuration { duration });
        }
        let track = Track {
            binding,
            begin,
            change,
            curve: options.curve,
            params: options.params,
            delta_mode: options.delta_mode,
            last_value: begin,
        };
        let mut node = Node::new(
            tweener,
            NodeKind::Leaf(Leaf {
                duration,
                delay: options.delay,
                channel: Box::new(track),
            }),
        );
        node.elapsed = -options.delay;
        node.on_end = options.on_end;
        Ok(Self::from_node(node))
    }

    pub fn state(&self) -> TweenState {
        self.0.borrow().state
    }

    /// Duration in seconds. Leaves: as created; parallel: longest child;
    /// serial: sum of children; looping serial: infinite.
    pub fn duration(&self) -> f32 {
        self.0.borrow().duration()
    }

    /// Local clock in seconds. Negative while a leaf waits out its delay.
    pub fn elapsed(&self) -> f32 {
        self.0.borrow().elapsed
    }

    /// Start delay of a leaf (groups have none).
    pub fn delay(&self) -> f32 {
        match &self.0.borrow().kind {
            NodeKind::Leaf(leaf) => leaf.delay,
            _ => 0.0,
        }
    }

    /// Number of direct children (1 for a leaf).
    pub fn count(&self) -> usize {
        match &self.0.borrow().kind {
            NodeKind::Leaf(_) => 1,
            NodeKind::Parallel(parallel) => parallel.children.len(),
            NodeKind::Serial(serial) => serial.children.len(),
        }
    }

    pub fn is_group(&self) -> bool {
        !matches!(self.0.borrow().kind, NodeKind::Leaf(_))
    }

    pub fn is_looping(&self) -> bool {
        matches!(&self.0.borrow().kind, NodeKind::Serial(serial) if serial.looping)
    }

    /// Name of the animated attribute (leaves only).
    pub fn attribute(&self) -> Option<&'static str> {
        match &self.0.borrow().kind {
            NodeKind::Leaf(leaf) => Some(leaf.channel.attribute()),
            _ => None,
        }
    }

    /// Owner of the animated attribute (leaves only).
    pub fn owner(&self) -> Option<OwnerKey> {
        match &self.0.borrow().kind {
            NodeKind::Leaf(leaf) => Some(leaf.channel.owner()),
            _ => None,
        }
    }

    pub fn tweener_id(&self) -> TweenerId {
        self.0.borrow().tweener
    }

    pub fn ptr_eq(&self, other: &Tween) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Set the end callback. Needed for groups, which have no creation options.
    pub fn set_on_end(&self, on_end: impl FnMut(&mut Tweener, &Tween) + 'static) {
        self.0.borrow_mut().on_end = Some(Box::new(on_end));
    }

    pub fn clear_on_end(&self) {
        self.0.borrow_mut().on_end = None;
    }

    // -- Composition --

    /// Serial group: this tween, then `others` one after another.
    pub fn next(&self, others: &[Tween]) -> Result<Tween> {
        group::compose(self.tweener_id(), GroupKind::Serial, self.with(others))
    }

    /// Parallel group: this tween together with `others`.
    pub fn parallel(&self, others: &[Tween]) -> Result<Tween> {
        group::compose(self.tweener_id(), GroupKind::Parallel, self.with(others))
    }

    /// Serial group running this tween `count` times; `count < 1` loops forever.
    pub fn repeat(&self, count: i32) -> Result<Tween> {
        if count < 1 {
            return group::compose(self.tweener_id(), GroupKind::Looping, vec![self.clone()]);
        }
        let copies = vec![self.clone(); count as usize];
        group::compose(self.tweener_id(), GroupKind::Serial, copies)
    }

    fn with(&self, others: &[Tween]) -> Vec<Tween> {
        let mut all = Vec::with_capacity(others.len() + 1);
        all.push(self.clone());
        all.extend(others.iter().cloned());
        all
    }

    // -- Crate internals --

    pub(crate) fn set_state(&self, state: TweenState) {
        self.0.borrow_mut().state = state;
    }

    pub(crate) fn generation(&self) -> u32 {
        self.0.borrow().generation
    }

    pub(crate) fn is_leaf(&self) -> bool {
        !self.is_group()
    }

    pub(crate) fn parent(&self) -> Option<Tween> {
        let node = self.0.borrow();
        node.parent.as_ref().and_then(Weak::upgrade).map(Tween)
    }

    /// Outermost group containing this tween (itself when ungrouped).
    pub(crate) fn root(&self) -> Tween {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub(crate) fn children(&self) -> Vec<Tween> {
        match &self.0.borrow().kind {
            NodeKind::Leaf(_) => Vec::new(),
            NodeKind::Parallel(parallel) => parallel.children.clone(),
            NodeKind::Serial(serial) => serial.children.clone(),
        }
    }

    /// Active leaf whose clock has reached its duration.
    pub(crate) fn is_finished(&self) -> bool {
        let node = self.0.borrow();
        match &node.kind {
            NodeKind::Leaf(leaf) => node.state == TweenState::Active && node.elapsed >= leaf.duration,
            _ => false,
        }
    }

    /// Advance a leaf's clock and write the curve value.
    pub(crate) fn advance(&self, dt: f32) -> Step {
        let mut guard = self.0.borrow_mut();
        let node = &mut *guard;
        if node.state != TweenState::Active {
            return Step::Idle;
        }
        let NodeKind::Leaf(leaf) = &mut node.kind else {
            return Step::Idle;
        };
        node.elapsed += dt;
        if node.elapsed < 0.0 {
            return Step::Idle;
        }
        let t = node.elapsed.min(leaf.duration);
        if leaf.channel.apply(t, leaf.duration) == Write::Gone {
            return Step::OwnerGone;
        }
        if node.elapsed >= leaf.duration {
            Step::Finished
        } else {
            Step::Running
        }
    }

    /// Reset a leaf's clock for a new run and optionally write its start value.
    pub(crate) fn rewind_leaf(&self, immediate: bool) -> Write {
        let mut guard = self.0.borrow_mut();
        let node = &mut *guard;
        let NodeKind::Leaf(leaf) = &mut node.kind else {
            return Write::Applied;
        };
        node.elapsed = -leaf.delay;
        leaf.channel.rewind();
        if immediate {
            leaf.channel.apply(0.0, leaf.duration)
        } else {
            Write::Applied
        }
    }

    /// Jump a leaf straight to its end value.
    pub(crate) fn snap_leaf_to_end(&self) -> Write {
        let mut guard = self.0.borrow_mut();
        let node = &mut *guard;
        let NodeKind::Leaf(leaf) = &mut node.kind else {
            return Write::Applied;
        };
        node.elapsed = leaf.duration;
        leaf.channel.rewind();
        leaf.channel.apply(leaf.duration, leaf.duration)
    }
}

impl PartialEq for Tween {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Tween {}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        let kind = match &node.kind {
            NodeKind::Leaf(_) => "Leaf",
            NodeKind::Parallel(_) => "Parallel",
            NodeKind::Serial(_) => "Serial",
        };
        let mut out = f.debug_struct("Tween");
        out.field("kind", &kind).field("state", &node.state);
        if let NodeKind::Leaf(leaf) = &node.kind {
            out.field("attribute", &leaf.channel.attribute());
        }
        out.field("elapsed", &node.elapsed).finish()
    }
}
