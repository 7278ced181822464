// tweener.rs
//
// Tweener: owns the running leaf tweens and advances them by `dt`.
// Groups are driven from leaf completions (see group.rs).
//
// Usage:
//   let mut tweener = Tweener::new();
//   let fade = tweener.create_tween_to(alpha, 1.0, 0.0, 0.3, tweener.options())?;
//   tweener.update(dt)?;  // Once per frame, from the game loop

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::binding::{Binding, OwnerKey, Write};
use crate::config::TweenerConfig;
use crate::error::{Result, TweenError};
use crate::group::{self, GroupKind};
use crate::tween::{Step, Tween, TweenOptions, TweenState};
use crate::value::TweenValue;

static NEXT_TWEENER_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a tweener. Tweens remember which tweener created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenerId(u32);

impl TweenerId {
    fn next() -> Self {
        TweenerId(NEXT_TWEENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Scheduler for all tweens of one game (or one subsystem of it).
#[derive(Debug)]
pub struct Tweener {
    id: TweenerId,
    config: TweenerConfig,
    /// Leaves advanced by `update`, in registration order.
    active: Vec<Tween>,
    paused: Vec<Tween>,
    /// Running top-level groups. Children only link up weakly, so these
    /// keep a started chain alive after the caller drops its handle.
    roots: Vec<Tween>,
}

impl Default for Tweener {
    fn default() -> Self {
        Self::new()
    }
}

impl Tweener {
    pub fn new() -> Self {
        Self::with_config(TweenerConfig::default())
    }

    pub fn with_config(config: TweenerConfig) -> Self {
        Self {
            id: TweenerId::next(),
            config,
            active: Vec::new(),
            paused: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn id(&self) -> TweenerId {
        self.id
    }

    pub fn config(&self) -> &TweenerConfig {
        &self.config
    }

    /// Creation options seeded from this tweener's config defaults.
    pub fn options(&self) -> TweenOptions {
        TweenOptions::new()
            .with_curve(self.config.default_curve)
            .with_immediate(self.config.default_immediate)
    }

    // -- Creation --

    /// Tween the bound attribute from `begin` by `change` over `duration` seconds.
    pub fn create_tween<V: TweenValue>(
        &mut self,
        binding: Binding<V>,
        begin: V,
        change: V,
        duration: f32,
        options: TweenOptions,
    ) -> Result<Tween> {
        let auto_start = options.auto_start;
        let immediate = options.immediate;
        let tween = Tween::leaf(self.id, binding, begin, change, duration, options)?;
        tween_log!(
            self,
            debug,
            "tween created for '{}' over {}s",
            tween.attribute().unwrap_or("?"),
            duration
        );
        if auto_start {
            self.start_node(&tween, immediate, 0.0);
        }
        Ok(tween)
    }

    /// Tween the bound attribute from `begin` to `end`.
    pub fn create_tween_to<V: TweenValue>(
        &mut self,
        binding: Binding<V>,
        begin: V,
        end: V,
        duration: f32,
        options: TweenOptions,
    ) -> Result<Tween> {
        self.create_tween(binding, begin, end - begin, duration, options)
    }

    /// Parallel group of never-started tweens.
    pub fn parallel(&self, tweens: &[Tween]) -> Result<Tween> {
        group::compose(self.id, GroupKind::Parallel, tweens.to_vec())
    }

    /// Serial group of never-started tweens, run in the given order.
    pub fn next(&self, tweens: &[Tween]) -> Result<Tween> {
        group::compose(self.id, GroupKind::Serial, tweens.to_vec())
    }

    // -- Lifecycle --

    /// Start (or restart) a tween or group.
    ///
    /// With `immediate`, leaves write their start value right away even if
    /// they are still waiting out a delay.
    pub fn start(&mut self, tween: &Tween, immediate: bool) -> Result<()> {
        self.check_owned(tween)?;
        self.start_node(tween, immediate, 0.0);
        Ok(())
    }

    /// Pause a running tween. Pausing something that is not active does nothing.
    pub fn pause(&mut self, tween: &Tween) -> Result<()> {
        self.check_owned(tween)?;
        self.pause_node(tween);
        Ok(())
    }

    /// Resume a paused tween.
    pub fn resume(&mut self, tween: &Tween) -> Result<()> {
        self.check_owned(tween)?;
        self.resume_node(tween, true)
    }

    /// Stop a tween without firing its end callback.
    pub fn stop(&mut self, tween: &Tween) -> Result<()> {
        self.check_owned(tween)?;
        self.stop_node(tween);
        Ok(())
    }

    /// Advance every active tween by `dt` seconds.
    ///
    /// Returns how many leaves ended during this step. Callbacks fired here
    /// may create, start or stop tweens; new ones are first advanced on the
    /// next call.
    pub fn update(&mut self, dt: f32) -> Result<usize> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(TweenError::InvalidDelta { dt });
        }

        let snapshot = self.active.clone();
        let mut finished = Vec::new();
        let mut orphaned = Vec::new();
        for tween in &snapshot {
            match tween.advance(dt) {
                Step::Idle | Step::Running => {}
                Step::Finished => finished.push(tween.clone()),
                Step::OwnerGone => orphaned.push(tween.clone()),
            }
        }

        for tween in &orphaned {
            tween_log!(
                self,
                warn,
                "owner of '{}' is gone, stopping its tween",
                tween.attribute().unwrap_or("?")
            );
            let root = tween.root();
            self.stop_node(&root);
        }

        let mut ended = 0;
        for tween in &finished {
            // An earlier callback may have stopped, paused or restarted it.
            if !tween.is_finished() || !self.take_active(tween) {
                continue;
            }
            tween_log!(self, debug, "tween ended for '{}'", tween.attribute().unwrap_or("?"));
            self.complete(tween);
            ended += 1;
        }
        Ok(ended)
    }

    /// Pause every active tween.
    pub fn pause_all(&mut self) {
        let moved: Vec<Tween> = self.active.drain(..).collect();
        for tween in &moved {
            tween.set_state(TweenState::Paused);
            relabel_ancestors(tween, TweenState::Active, TweenState::Paused);
        }
        tween_log!(self, debug, "paused {} tweens", moved.len());
        self.paused.extend(moved);
    }

    /// Resume every paused tween.
    pub fn resume_all(&mut self) {
        let moved: Vec<Tween> = self.paused.drain(..).collect();
        for tween in &moved {
            tween.set_state(TweenState::Active);
            relabel_ancestors(tween, TweenState::Paused, TweenState::Active);
        }
        tween_log!(self, debug, "resumed {} tweens", moved.len());
        self.active.extend(moved);
    }

    /// Stop everything. No end callbacks fire.
    pub fn clear(&mut self) {
        let registered: Vec<Tween> = self.active.drain(..).chain(self.paused.drain(..)).collect();
        for tween in &registered {
            let root = tween.root();
            self.stop_node(&root);
        }
        for root in std::mem::take(&mut self.roots) {
            self.stop_node(&root);
        }
        tween_log!(self, debug, "cleared {} tweens", registered.len());
    }

    // -- Queries --

    /// Running leaves animating an attribute of `owner`, optionally filtered by state.
    pub fn query<T>(&self, owner: &Rc<RefCell<T>>, state: Option<TweenState>) -> Vec<Tween> {
        let key = OwnerKey::of(owner);
        self.all(state)
            .into_iter()
            .filter(|tween| tween.owner() == Some(key))
            .collect()
    }

    /// All running leaves, optionally filtered by state. Only active and paused
    /// leaves are tracked, so other filters yield nothing.
    pub fn all(&self, state: Option<TweenState>) -> Vec<Tween> {
        let mut found = Vec::new();
        if matches!(state, None | Some(TweenState::Active)) {
            found.extend(self.active.iter().cloned());
        }
        if matches!(state, None | Some(TweenState::Paused)) {
            found.extend(self.paused.iter().cloned());
        }
        found
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn paused_count(&self) -> usize {
        self.paused.len()
    }

    /// No active or paused tweens.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty() && self.paused.is_empty()
    }

    // -- Internals --

    fn check_owned(&self, tween: &Tween) -> Result<()> {
        if tween.tweener_id() == self.id {
            Ok(())
        } else {
            Err(TweenError::ForeignTweener)
        }
    }

    /// Start `tween` as if it had already run for `overtime` seconds.
    pub(crate) fn start_node(&mut self, tween: &Tween, immediate: bool, overtime: f32) {
        if tween.state().is_running() {
            self.stop_node(tween);
        }
        {
            let mut node = tween.0.borrow_mut();
            node.generation = node.generation.wrapping_add(1);
        }
        if tween.is_group() {
            if tween.parent().is_none() && !self.roots.iter().any(|t| t.ptr_eq(tween)) {
                self.roots.push(tween.clone());
            }
            self.start_group(tween, immediate, overtime);
            return;
        }

        tween.set_state(TweenState::Active);
        let seeded = tween.rewind_leaf(immediate);
        tween.0.borrow_mut().elapsed += overtime;
        self.active.push(tween.clone());
        if seeded == Write::Gone {
            // Caught and stopped by the next update.
            tween_log!(
                self,
                warn,
                "owner of '{}' is gone at start",
                tween.attribute().unwrap_or("?")
            );
        }
        tween_log!(self, debug, "tween started for '{}'", tween.attribute().unwrap_or("?"));
    }

    pub(crate) fn stop_node(&mut self, tween: &Tween) {
        if tween.is_leaf() && !self.unregister(tween) {
            tween_log!(self, debug, "tween for '{}' is not running", tween.attribute().unwrap_or("?"));
        }
        if tween.is_group() {
            self.roots.retain(|t| !t.ptr_eq(tween));
        }
        if tween.state().is_running() {
            tween.set_state(TweenState::Ended);
        }
        for child in tween.children() {
            self.stop_node(&child);
        }
    }

    fn pause_node(&mut self, tween: &Tween) {
        if tween.is_group() {
            if tween.state() != TweenState::Active {
                tween_log!(self, debug, "group is not active, nothing to pause");
                return;
            }
            tween.set_state(TweenState::Paused);
            for child in tween.children() {
                self.pause_node(&child);
            }
            return;
        }
        match self.active.iter().position(|t| t.ptr_eq(tween)) {
            Some(index) => {
                let tween = self.active.remove(index);
                tween.set_state(TweenState::Paused);
                self.paused.push(tween);
            }
            None => {
                tween_log!(self, debug, "tween for '{}' is not active", tween.attribute().unwrap_or("?"));
            }
        }
    }

    /// Children of a resumed group may legitimately be idle, so only the
    /// outermost call is `strict`.
    fn resume_node(&mut self, tween: &Tween, strict: bool) -> Result<()> {
        if tween.is_group() {
            let state = tween.state();
            if state != TweenState::Paused {
                return if strict { Err(TweenError::NotPaused { state }) } else { Ok(()) };
            }
            tween.set_state(TweenState::Active);
            for child in tween.children() {
                self.resume_node(&child, false)?;
            }
            return Ok(());
        }
        match self.paused.iter().position(|t| t.ptr_eq(tween)) {
            Some(index) => {
                let tween = self.paused.remove(index);
                tween.set_state(TweenState::Active);
                relabel_ancestors(&tween, TweenState::Paused, TweenState::Active);
                self.active.push(tween);
                Ok(())
            }
            None if strict => Err(TweenError::NotPaused { state: tween.state() }),
            None => Ok(()),
        }
    }

    /// Mark `tween` ended, fire its callback and notify its group.
    pub(crate) fn complete(&mut self, tween: &Tween) {
        tween.set_state(TweenState::Ended);
        if tween.is_group() {
            self.roots.retain(|t| !t.ptr_eq(tween));
        }
        self.fire_on_end(tween);
        if let Some(parent) = tween.parent() {
            self.child_completed(&parent, tween);
        }
    }

    pub(crate) fn fire_on_end(&mut self, tween: &Tween) {
        let on_end = tween.0.borrow_mut().on_end.take();
        if let Some(mut on_end) = on_end {
            on_end(self, tween);
            // Keep a replacement installed by the callback itself.
            let mut node = tween.0.borrow_mut();
            if node.on_end.is_none() {
                node.on_end = Some(on_end);
            }
        }
    }

    /// Drop a leaf from both registries. Returns whether it was registered.
    pub(crate) fn unregister(&mut self, tween: &Tween) -> bool {
        let before = self.active.len() + self.paused.len();
        self.active.retain(|t| !t.ptr_eq(tween));
        self.paused.retain(|t| !t.ptr_eq(tween));
        before != self.active.len() + self.paused.len()
    }

    fn take_active(&mut self, tween: &Tween) -> bool {
        match self.active.iter().position(|t| t.ptr_eq(tween)) {
            Some(index) => {
                self.active.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Walk up the groups above `tween`, switching those in state `from` to `to`.
fn relabel_ancestors(tween: &Tween, from: TweenState, to: TweenState) {
    let mut current = tween.parent();
    while let Some(group) = current {
        if group.state() == from {
            group.set_state(to);
        }
        current = group.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    struct Sprite {
        x: f32,
        y: f32,
        pos: Vec2,
    }

    type Shared = Rc<RefCell<Sprite>>;
    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn sprite() -> Shared {
        Rc::new(RefCell::new(Sprite {
            x: 0.0,
            y: 0.0,
            pos: Vec2::ZERO,
        }))
    }

    fn x(s: &Shared) -> Binding<f32> {
        Binding::new(s, "x", |s: &Sprite| s.x, |s: &mut Sprite, v| s.x = v)
    }

    fn y(s: &Shared) -> Binding<f32> {
        Binding::new(s, "y", |s: &Sprite| s.y, |s: &mut Sprite, v| s.y = v)
    }

    fn quiet() -> Tweener {
        Tweener::with_config(TweenerConfig::default().with_logging(false))
    }

    fn unstarted() -> TweenOptions {
        TweenOptions::new().with_auto_start(false)
    }

    fn record(log: &Log, name: &'static str) -> TweenOptions {
        let log = log.clone();
        unstarted().with_on_end(move |_, _| log.borrow_mut().push(name))
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn linear_tween_reaches_midpoint_and_end() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let options = record(&log, "done").with_auto_start(true);
        let tween = tweener.create_tween(x(&s), 0.0, 100.0, 2.0, options).unwrap();

        assert_eq!(tweener.update(1.0).unwrap(), 0);
        assert!(close(s.borrow().x, 50.0));
        assert!(log.borrow().is_empty());
        assert_eq!(tweener.update(1.0).unwrap(), 1);
        assert_eq!(s.borrow().x, 100.0);
        assert_eq!(*log.borrow(), vec!["done"]);
        assert_eq!(tween.state(), TweenState::Ended);
        assert!(tweener.is_idle());
    }

    #[test]
    fn overshooting_step_writes_exact_end() {
        let s = sprite();
        let mut tweener = quiet();
        tweener
            .create_tween_to(x(&s), 10.0, 20.0, 0.3, TweenOptions::new().with_curve(crate::Easing::ElasticOut))
            .unwrap();
        tweener.update(5.0).unwrap();
        assert_eq!(s.borrow().x, 20.0);
    }

    #[test]
    fn rejects_bad_delta() {
        let mut tweener = quiet();
        assert!(matches!(tweener.update(-0.1), Err(TweenError::InvalidDelta { .. })));
        assert!(matches!(tweener.update(f32::NAN), Err(TweenError::InvalidDelta { .. })));
        assert_eq!(tweener.update(0.0).unwrap(), 0);
    }

    #[test]
    fn serial_carries_overtime() {
        let s = sprite();
        let mut tweener = quiet();
        let first = tweener.create_tween(x(&s), 0.0, 10.0, 1.0, unstarted()).unwrap();
        let second = tweener.create_tween(y(&s), 0.0, 10.0, 1.0, unstarted()).unwrap();
        let chain = first.next(&[second.clone()]).unwrap();
        tweener.start(&chain, true).unwrap();

        tweener.update(1.5).unwrap();
        assert_eq!(s.borrow().x, 10.0);
        assert_eq!(first.state(), TweenState::Ended);
        assert_eq!(second.state(), TweenState::Active);
        assert!(close(second.elapsed(), 0.5));

        tweener.update(0.5).unwrap();
        assert_eq!(s.borrow().y, 10.0);
        assert_eq!(chain.state(), TweenState::Ended);
        assert!(close(chain.elapsed(), 2.0));
    }

    #[test]
    fn short_serial_children_finish_in_order_within_one_update() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "a")).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 7.0, 1e-6, record(&log, "b")).unwrap();
        let c = tweener.create_tween(x(&s), 1.0, 1.0, 1.0, record(&log, "c")).unwrap();
        let chain = tweener.next(&[a, b.clone(), c.clone()]).unwrap();
        tweener.start(&chain, true).unwrap();

        tweener.update(1.5).unwrap();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(s.borrow().y, 7.0);
        assert_eq!(b.state(), TweenState::Ended);
        assert_eq!(c.state(), TweenState::Active);
        assert!(close(c.elapsed(), 0.5));
        assert_eq!(tweener.all(None), vec![c]);
    }

    #[test]
    fn overtime_reaches_into_nested_serial() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let first = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "first")).unwrap();
        let short = tweener.create_tween(y(&s), 0.0, 7.0, 0.2, record(&log, "short")).unwrap();
        let long = tweener.create_tween(x(&s), 1.0, 1.0, 2.0, record(&log, "long")).unwrap();
        let inner = tweener.next(&[short.clone(), long.clone()]).unwrap();
        let outer = tweener.next(&[first, inner]).unwrap();
        tweener.start(&outer, true).unwrap();

        tweener.update(1.5).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "short"]);
        assert_eq!(short.state(), TweenState::Ended);
        assert_eq!(s.borrow().y, 7.0);
        assert_eq!(long.state(), TweenState::Active);
        assert!(close(long.elapsed(), 0.5));
        assert_eq!(tweener.all(None), vec![long]);
    }

    #[test]
    fn overtime_reaches_into_nested_parallel() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let first = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "first")).unwrap();
        let short = tweener.create_tween(y(&s), 0.0, 7.0, 0.2, record(&log, "short")).unwrap();
        let long = tweener.create_tween(x(&s), 1.0, 1.0, 2.0, record(&log, "long")).unwrap();
        let inner = tweener.parallel(&[short.clone(), long.clone()]).unwrap();
        let outer = tweener.next(&[first, inner.clone()]).unwrap();
        tweener.start(&outer, true).unwrap();

        tweener.update(1.5).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "short"]);
        assert_eq!(short.state(), TweenState::Ended);
        assert_eq!(s.borrow().y, 7.0);
        assert!(close(long.elapsed(), 0.5));

        // The skipped child already counted towards the group.
        tweener.update(1.5).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "short", "long"]);
        assert_eq!(inner.state(), TweenState::Ended);
        assert_eq!(outer.state(), TweenState::Ended);
    }

    #[test]
    fn skipped_child_writes_end_after_its_callback() {
        let s = sprite();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let owner = s.clone();
        let seen_in_callback = seen.clone();
        let options = unstarted().with_on_end(move |_, _| seen_in_callback.borrow_mut().push(owner.borrow().y));
        let b = tweener.create_tween(y(&s), 0.0, 7.0, 0.2, options).unwrap();
        let c = tweener.create_tween(x(&s), 1.0, 1.0, 1.0, unstarted()).unwrap();
        let chain = tweener.next(&[a, b, c]).unwrap();
        tweener.start(&chain, false).unwrap();

        tweener.update(1.5).unwrap();
        assert_eq!(*seen.borrow(), vec![0.0]);
        assert_eq!(s.borrow().y, 7.0);
    }

    #[test]
    fn started_chain_outlives_its_handle() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "a")).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 10.0, 1.0, record(&log, "b")).unwrap();
        {
            let chain = a.next(&[b.clone()]).unwrap();
            tweener.start(&chain, true).unwrap();
        }

        tweener.update(1.0).unwrap();
        tweener.update(1.0).unwrap();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(b.state(), TweenState::Ended);
        assert_eq!(s.borrow().y, 10.0);
        assert!(tweener.is_idle());
    }

    #[test]
    fn parallel_ends_with_its_longest_child() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "1")).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 2.0, record(&log, "2")).unwrap();
        let pos = Binding::new(&s, "pos", |s: &Sprite| s.pos, |s: &mut Sprite, v| s.pos = v);
        let c = tweener
            .create_tween(pos, Vec2::ZERO, Vec2::ONE, 3.0, record(&log, "3"))
            .unwrap();
        let group = a.parallel(&[b, c]).unwrap();
        let group_log = log.clone();
        group.set_on_end(move |_, _| group_log.borrow_mut().push("group"));
        tweener.start(&group, true).unwrap();

        tweener.update(1.0).unwrap();
        assert_eq!(*log.borrow(), vec!["1"]);
        tweener.update(1.0).unwrap();
        assert_eq!(*log.borrow(), vec!["1", "2"]);
        assert_eq!(group.state(), TweenState::Active);
        tweener.update(1.0).unwrap();
        assert_eq!(*log.borrow(), vec!["1", "2", "3", "group"]);
        assert_eq!(group.state(), TweenState::Ended);
        assert_eq!(s.borrow().pos, Vec2::ONE);
    }

    #[test]
    fn repeat_runs_the_tween_n_times() {
        let s = sprite();
        let runs = Rc::new(RefCell::new(0));
        let mut tweener = quiet();
        let counter = runs.clone();
        let step = tweener
            .create_tween(
                x(&s),
                0.0,
                1.0,
                1.0,
                TweenOptions::new()
                    .with_delta_mode(true)
                    .with_auto_start(false)
                    .with_on_end(move |_, _| *counter.borrow_mut() += 1),
            )
            .unwrap();
        let thrice = step.repeat(3).unwrap();
        let wrapped = Rc::new(RefCell::new(0));
        let wrap_counter = wrapped.clone();
        thrice.set_on_end(move |_, _| *wrap_counter.borrow_mut() += 1);
        tweener.start(&thrice, true).unwrap();

        tweener.update(1.0).unwrap();
        tweener.update(1.0).unwrap();
        assert_eq!(*runs.borrow(), 2);
        assert_eq!(*wrapped.borrow(), 0);
        tweener.update(1.0).unwrap();
        assert_eq!(*runs.borrow(), 3);
        assert_eq!(*wrapped.borrow(), 1);
        assert!(close(s.borrow().x, 3.0));
        assert_eq!(thrice.state(), TweenState::Ended);
        assert!(tweener.is_idle());
    }

    #[test]
    fn delta_mode_adds_on_top_of_external_changes() {
        let s = sprite();
        let mut tweener = quiet();
        s.borrow_mut().x = 5.0;
        tweener
            .create_tween(x(&s), 0.0, 10.0, 1.0, TweenOptions::new().with_delta_mode(true))
            .unwrap();
        assert_eq!(s.borrow().x, 5.0);
        for _ in 0..2 {
            s.borrow_mut().x += 1.0;
            tweener.update(0.5).unwrap();
        }
        assert!(close(s.borrow().x, 5.0 + 2.0 + 10.0));
    }

    #[test]
    fn stop_skips_callback_and_writes() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let options = record(&log, "end").with_auto_start(true);
        let tween = tweener.create_tween(x(&s), 0.0, 10.0, 1.0, options).unwrap();
        tweener.update(0.5).unwrap();
        tweener.stop(&tween).unwrap();
        tweener.update(1.0).unwrap();
        assert!(close(s.borrow().x, 5.0));
        assert!(log.borrow().is_empty());
        assert_eq!(tween.state(), TweenState::Ended);
        // Stopping again is harmless.
        tweener.stop(&tween).unwrap();
    }

    #[test]
    fn immediate_start_writes_begin_during_delay() {
        let s = sprite();
        s.borrow_mut().x = 99.0;
        let mut tweener = quiet();
        tweener
            .create_tween(x(&s), 10.0, 10.0, 1.0, TweenOptions::new().with_delay(0.5))
            .unwrap();
        assert_eq!(s.borrow().x, 10.0);
        tweener.update(0.25).unwrap();
        assert_eq!(s.borrow().x, 10.0);
        tweener.update(0.75).unwrap();
        assert!(close(s.borrow().x, 15.0));
    }

    #[test]
    fn deferred_start_leaves_value_alone_during_delay() {
        let s = sprite();
        s.borrow_mut().x = 99.0;
        let mut tweener = quiet();
        tweener
            .create_tween(x(&s), 10.0, 10.0, 1.0, TweenOptions::new().with_delay(0.5).with_immediate(false))
            .unwrap();
        tweener.update(0.25).unwrap();
        assert_eq!(s.borrow().x, 99.0);
    }

    #[test]
    fn pause_and_resume_freeze_the_clock() {
        let s = sprite();
        let mut tweener = quiet();
        let tween = tweener.create_tween(x(&s), 0.0, 10.0, 1.0, TweenOptions::new()).unwrap();
        tweener.update(0.5).unwrap();
        tweener.pause(&tween).unwrap();
        assert_eq!(tween.state(), TweenState::Paused);
        tweener.update(10.0).unwrap();
        assert!(close(s.borrow().x, 5.0));
        tweener.resume(&tween).unwrap();
        tweener.update(0.25).unwrap();
        assert!(close(s.borrow().x, 7.5));
    }

    #[test]
    fn resume_requires_paused() {
        let s = sprite();
        let mut tweener = quiet();
        let tween = tweener.create_tween(x(&s), 0.0, 10.0, 1.0, TweenOptions::new()).unwrap();
        let err = tweener.resume(&tween).unwrap_err();
        assert!(matches!(err, TweenError::NotPaused { state: TweenState::Active }));
    }

    #[test]
    fn pausing_inactive_tween_is_a_no_op() {
        let s = sprite();
        let mut tweener = quiet();
        let tween = tweener.create_tween(x(&s), 0.0, 10.0, 1.0, unstarted()).unwrap();
        tweener.pause(&tween).unwrap();
        assert_eq!(tween.state(), TweenState::Created);
    }

    #[test]
    fn group_pause_resume_reaches_leaves() {
        let s = sprite();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let group = a.parallel(&[b.clone()]).unwrap();
        tweener.start(&group, true).unwrap();
        tweener.pause(&group).unwrap();
        assert_eq!(group.state(), TweenState::Paused);
        assert_eq!(b.state(), TweenState::Paused);
        assert_eq!(tweener.paused_count(), 2);
        tweener.resume(&group).unwrap();
        assert_eq!(tweener.active_count(), 2);
        assert!(matches!(tweener.resume(&group), Err(TweenError::NotPaused { .. })));
    }

    #[test]
    fn resuming_a_leaf_reactivates_its_group() {
        let s = sprite();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let chain = a.next(&[b.clone()]).unwrap();
        tweener.start(&chain, true).unwrap();
        tweener.pause(&chain).unwrap();
        tweener.resume(&a).unwrap();
        assert_eq!(chain.state(), TweenState::Active);
        tweener.update(1.5).unwrap();
        assert_eq!(b.state(), TweenState::Active);
        assert!(close(b.elapsed(), 0.5));
    }

    #[test]
    fn pause_all_and_resume_all() {
        let s = sprite();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let chain = a.next(&[b]).unwrap();
        tweener.start(&chain, true).unwrap();
        tweener.pause_all();
        assert_eq!(chain.state(), TweenState::Paused);
        assert_eq!(tweener.active_count(), 0);
        tweener.update(5.0).unwrap();
        assert_eq!(s.borrow().x, 0.0);
        tweener.resume_all();
        assert_eq!(chain.state(), TweenState::Active);
        tweener.update(2.0).unwrap();
        assert_eq!(chain.state(), TweenState::Ended);
    }

    #[test]
    fn clear_stops_everything_quietly() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "a")).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 1.0, record(&log, "b")).unwrap();
        let chain = a.next(&[b]).unwrap();
        tweener.start(&chain, true).unwrap();
        tweener.clear();
        assert!(tweener.is_idle());
        assert_eq!(chain.state(), TweenState::Ended);
        tweener.update(5.0).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn query_by_owner_and_state() {
        let s = sprite();
        let other = sprite();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, TweenOptions::new()).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 1.0, TweenOptions::new()).unwrap();
        tweener.create_tween(x(&other), 0.0, 1.0, 1.0, TweenOptions::new()).unwrap();
        tweener.pause(&b).unwrap();

        assert_eq!(tweener.query(&s, None), vec![a.clone(), b.clone()]);
        assert_eq!(tweener.query(&s, Some(TweenState::Active)), vec![a]);
        assert_eq!(tweener.query(&s, Some(TweenState::Paused)), vec![b]);
        assert!(tweener.query(&s, Some(TweenState::Ended)).is_empty());
        assert_eq!(tweener.all(None).len(), 3);
        let state: TweenState = "paused".parse().unwrap();
        assert_eq!(tweener.all(Some(state)).len(), 1);
    }

    #[test]
    fn dropped_owner_stops_the_whole_group() {
        let s = sprite();
        let keep = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "a")).unwrap();
        let b = tweener.create_tween(x(&keep), 0.0, 1.0, 1.0, record(&log, "b")).unwrap();
        let group = a.parallel(&[b.clone()]).unwrap();
        tweener.start(&group, true).unwrap();

        drop(s);
        tweener.update(0.5).unwrap();
        assert_eq!(group.state(), TweenState::Ended);
        assert_eq!(b.state(), TweenState::Ended);
        assert!(tweener.is_idle());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn looping_serial_survives_huge_steps() {
        let s = sprite();
        let laps = Rc::new(RefCell::new(0));
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 0.25, unstarted()).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 0.25, unstarted()).unwrap();
        let forever = a.next(&[b]).unwrap().repeat(-1).unwrap();
        let counter = laps.clone();
        forever.set_on_end(move |_, _| *counter.borrow_mut() += 1);
        tweener.start(&forever, true).unwrap();

        tweener.update(0.5).unwrap();
        assert_eq!(*laps.borrow(), 1);
        tweener.update(1000.0).unwrap();
        assert_eq!(forever.state(), TweenState::Active);
        assert_eq!(tweener.active_count(), 1);
        assert!(*laps.borrow() >= 2);
    }

    #[test]
    fn looping_serial_can_be_stopped_from_its_callback() {
        let s = sprite();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        let forever = a.repeat(0).unwrap();
        forever.set_on_end(|tweener, me| tweener.stop(me).unwrap());
        tweener.start(&forever, true).unwrap();
        tweener.update(1.0).unwrap();
        assert_eq!(forever.state(), TweenState::Ended);
        assert!(tweener.is_idle());
    }

    #[test]
    fn nested_groups_complete_in_order() {
        let s = sprite();
        let log: Log = Rc::default();
        let mut tweener = quiet();
        let a = tweener.create_tween(x(&s), 0.0, 1.0, 1.0, record(&log, "a")).unwrap();
        let b = tweener.create_tween(y(&s), 0.0, 1.0, 0.5, record(&log, "b")).unwrap();
        let c = tweener.create_tween(x(&s), 1.0, 1.0, 1.0, record(&log, "c")).unwrap();
        let both = a.parallel(&[b]).unwrap();
        let chain = both.next(&[c]).unwrap();
        let done = log.clone();
        chain.set_on_end(move |_, _| done.borrow_mut().push("chain"));
        tweener.start(&chain, true).unwrap();

        tweener.update(0.5).unwrap();
        tweener.update(0.75).unwrap();
        assert_eq!(*log.borrow(), vec!["b", "a"]);
        assert_eq!(both.state(), TweenState::Ended);
        tweener.update(1.0).unwrap();
        assert_eq!(*log.borrow(), vec!["b", "a", "c", "chain"]);
        assert!(close(s.borrow().x, 2.0));
    }

    #[test]
    fn callback_can_chain_a_new_tween() {
        let s = sprite();
        let mut tweener = quiet();
        let target = s.clone();
        let opts = TweenOptions::new().with_on_end(move |tweener, _| {
            tweener
                .create_tween(y(&target), 0.0, 4.0, 1.0, TweenOptions::new())
                .unwrap();
        });
        tweener.create_tween(x(&s), 0.0, 1.0, 1.0, opts).unwrap();
        tweener.update(1.0).unwrap();
        assert_eq!(tweener.active_count(), 1);
        tweener.update(0.5).unwrap();
        assert!(close(s.borrow().y, 2.0));
    }

    #[test]
    fn restarting_a_running_tween_resets_it() {
        let s = sprite();
        let mut tweener = quiet();
        let tween = tweener.create_tween(x(&s), 0.0, 10.0, 1.0, TweenOptions::new()).unwrap();
        tweener.update(0.5).unwrap();
        tweener.start(&tween, true).unwrap();
        assert_eq!(s.borrow().x, 0.0);
        assert_eq!(tweener.active_count(), 1);
        assert_eq!(tween.elapsed(), 0.0);
    }

    #[test]
    fn foreign_tween_is_rejected() {
        let s = sprite();
        let mut mine = quiet();
        let mut theirs = quiet();
        let tween = theirs.create_tween(x(&s), 0.0, 1.0, 1.0, unstarted()).unwrap();
        assert!(matches!(mine.start(&tween, true), Err(TweenError::ForeignTweener)));
        assert!(mine.parallel(&[tween]).is_err());
    }

    #[test]
    fn options_follow_config_defaults() {
        let config = TweenerConfig::from_json(r#"{ "default_curve": "quad_out", "default_immediate": false }"#).unwrap();
        let tweener = Tweener::with_config(config);
        let options = tweener.options();
        assert_eq!(options.curve, crate::Easing::QuadOut);
        assert!(!options.immediate);
        assert!(options.auto_start);
    }
}
