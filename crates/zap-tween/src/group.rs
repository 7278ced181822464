// group.rs
//
// Serial and parallel groups.
// Groups are never ticked themselves: only leaves sit in the tweener's
// registry. A group advances when one of its children completes.
//
// Serial time carry: when a child finishes in the middle of a frame, the
// time it ran past its end is handed to the next child, and children too
// short to absorb it are finished on the spot.

use std::rc::Rc;

use crate::binding::Write;
use crate::error::{Result, TweenError};
use crate::tween::{Node, NodeKind, Tween, TweenState};
use crate::tweener::{Tweener, TweenerId};

/// Children that run together. Ends when the last of them ends.
pub(crate) struct Parallel {
    pub(crate) children: Vec<Tween>,
    /// Children still running in the current run.
    pub(crate) pending: usize,
}

impl Parallel {
    pub(crate) fn duration(&self) -> f32 {
        self.children
            .iter()
            .map(Tween::duration)
            .fold(0.0, f32::max)
    }
}

/// Children that run one after another. The same tween may appear more
/// than once (see [`Tween::repeat`]).
pub(crate) struct Serial {
    pub(crate) children: Vec<Tween>,
    /// Index of the running child. `None` before the first one starts.
    pub(crate) current: Option<usize>,
    /// Restart from the first child instead of ending.
    pub(crate) looping: bool,
    /// Start flag handed down to each child as it begins.
    pub(crate) immediate: bool,
}

impl Serial {
    pub(crate) fn duration(&self) -> f32 {
        if self.looping {
            return f32::INFINITY;
        }
        self.children.iter().map(Tween::duration).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupKind {
    Parallel,
    Serial,
    Looping,
}

/// Build a group from never-started tweens of `tweener`.
pub(crate) fn compose(tweener: TweenerId, kind: GroupKind, children: Vec<Tween>) -> Result<Tween> {
    if children.is_empty() {
        return Err(TweenError::EmptyGroup);
    }
    for (i, child) in children.iter().enumerate() {
        if child.tweener_id() != tweener {
            return Err(TweenError::ForeignTweener);
        }
        let state = child.state();
        if state != TweenState::Created {
            return Err(TweenError::NotCreated { state });
        }
        if child.parent().is_some() {
            return Err(TweenError::AlreadyGrouped);
        }
        // Serial groups may list a tween twice; parallel ones would run it against itself.
        if kind == GroupKind::Parallel && children[..i].iter().any(|c| c.ptr_eq(child)) {
            return Err(TweenError::AlreadyGrouped);
        }
    }

    let node_kind = match kind {
        GroupKind::Parallel => NodeKind::Parallel(Parallel {
            children: children.clone(),
            pending: 0,
        }),
        GroupKind::Serial | GroupKind::Looping => NodeKind::Serial(Serial {
            children: children.clone(),
            current: None,
            looping: kind == GroupKind::Looping,
            immediate: true,
        }),
    };
    let group = Tween::from_node(Node::new(tweener, node_kind));
    let link = Rc::downgrade(&group.0);
    for child in &children {
        child.0.borrow_mut().parent = Some(link.clone());
    }
    Ok(group)
}

enum Cue {
    Child(Tween, bool),
    Wrap,
    Exhausted,
}

enum Reaction {
    Finish,
    Advance,
    Wait,
}

impl Tweener {
    /// Start a group `overtime` seconds into its run. Children that fit
    /// entirely into the overtime are finished on the spot.
    pub(crate) fn start_group(&mut self, group: &Tween, immediate: bool, overtime: f32) {
        let parallel_children = {
            let mut guard = group.0.borrow_mut();
            let node = &mut *guard;
            node.state = TweenState::Active;
            node.elapsed = 0.0;
            match &mut node.kind {
                NodeKind::Parallel(parallel) => {
                    parallel.pending = parallel.children.len();
                    Some(parallel.children.clone())
                }
                NodeKind::Serial(serial) => {
                    serial.current = None;
                    serial.immediate = immediate;
                    None
                }
                NodeKind::Leaf(_) => return,
            }
        };
        tween_log!(self, debug, "group started ({} children)", group.count());
        match parallel_children {
            Some(children) => {
                let generation = group.generation();
                for child in &children {
                    if child.duration() <= overtime {
                        self.finish_instantly(child);
                        if let NodeKind::Parallel(parallel) = &mut group.0.borrow_mut().kind {
                            parallel.pending = parallel.pending.saturating_sub(1);
                        }
                    } else {
                        self.start_node(child, immediate, overtime);
                    }
                    if group.generation() != generation {
                        return;
                    }
                }
            }
            None => self.advance_serial(group, overtime),
        }
    }

    /// A child of `group` ended naturally.
    pub(crate) fn child_completed(&mut self, group: &Tween, child: &Tween) {
        if group.state() != TweenState::Active {
            return;
        }
        let child_elapsed = child.elapsed();
        let overtime = (child_elapsed - child.duration()).max(0.0);
        let reaction = {
            let mut guard = group.0.borrow_mut();
            match &mut guard.kind {
                NodeKind::Parallel(parallel) if parallel.pending > 0 => {
                    parallel.pending -= 1;
                    if parallel.pending == 0 {
                        Reaction::Finish
                    } else {
                        Reaction::Wait
                    }
                }
                NodeKind::Serial(serial) => {
                    let current = serial.current.and_then(|i| serial.children.get(i));
                    if current.map_or(false, |c| c.ptr_eq(child)) {
                        Reaction::Advance
                    } else {
                        Reaction::Wait
                    }
                }
                _ => Reaction::Wait,
            }
        };
        match reaction {
            Reaction::Finish => {
                // The last child to end is the longest, so its clock is the group's.
                group.0.borrow_mut().elapsed = child_elapsed;
                self.complete(group);
            }
            Reaction::Advance => self.advance_serial(group, overtime),
            Reaction::Wait => {}
        }
    }

    /// Move a serial group to its next child, carrying `overtime` seconds.
    pub(crate) fn advance_serial(&mut self, serial: &Tween, overtime: f32) {
        let generation = serial.generation();
        let mut overtime = overtime;
        let mut wraps = 0u32;
        loop {
            let cue = {
                let mut guard = serial.0.borrow_mut();
                let NodeKind::Serial(group) = &mut guard.kind else {
                    return;
                };
                let index = group.current.map_or(0, |i| i + 1);
                match group.children.get(index) {
                    Some(child) => {
                        group.current = Some(index);
                        Cue::Child(child.clone(), group.immediate)
                    }
                    None if group.looping => {
                        group.current = None;
                        Cue::Wrap
                    }
                    None => Cue::Exhausted,
                }
            };

            match cue {
                Cue::Child(child, immediate) => {
                    let duration = child.duration();
                    if duration <= overtime {
                        self.finish_instantly(&child);
                        // After a whole pass was skipped the loop must consume the overtime.
                        if wraps > 1 {
                            overtime -= duration;
                        }
                    } else {
                        self.start_node(&child, immediate, overtime);
                        return;
                    }
                }
                Cue::Wrap => {
                    wraps += 1;
                    tween_log!(self, debug, "serial group loops");
                    self.fire_on_end(serial);
                    if wraps > 1 {
                        // A whole pass fit into the overtime. Keep only the
                        // remainder and consume it child by child from now on.
                        let pass: f32 = serial.children().iter().map(Tween::duration).sum();
                        overtime = if wraps > 2 { 0.0 } else { overtime % pass };
                    }
                }
                Cue::Exhausted => {
                    let duration = serial.duration();
                    serial.0.borrow_mut().elapsed = duration + overtime;
                    self.complete(serial);
                    return;
                }
            }

            // A callback stopped or restarted this group.
            if serial.generation() != generation || serial.state() != TweenState::Active {
                return;
            }
        }
    }

    /// End `tween` at once without touching the owning group. Children go
    /// first; a leaf fires its callback and then writes its end value.
    pub(crate) fn finish_instantly(&mut self, tween: &Tween) {
        self.unregister(tween);
        let generation = {
            let mut node = tween.0.borrow_mut();
            node.generation = node.generation.wrapping_add(1);
            node.state = TweenState::Ended;
            node.generation
        };
        if tween.is_leaf() {
            self.fire_on_end(tween);
            // Restarted from its own callback: the new run owns the value.
            if tween.generation() != generation {
                return;
            }
            if tween.snap_leaf_to_end() == Write::Gone {
                tween_log!(
                    self,
                    warn,
                    "owner of '{}' is gone, skipping its end value",
                    tween.attribute().unwrap_or("?")
                );
            }
        } else {
            for child in tween.children() {
                self.finish_instantly(&child);
            }
            let duration = tween.duration();
            tween.0.borrow_mut().elapsed = duration;
            self.fire_on_end(tween);
        }
    }
}
