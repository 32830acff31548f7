// Node animators: tweens with easing curves, plus sequence/parallel groups.
//
// An animator lives in its node's slot and is ticked by Scene::update with
// mutable access to the whole graph, so it may also restructure the tree;
// such changes are staged until the traversal lock is released.

use std::f32::consts::PI;
use std::fmt::Debug;

use glam::Vec2;

use crate::api::types::NodeId;
use crate::core::graph::NodeGraph;

/// Per-node behaviour advanced once per update.
pub trait Animator: Debug {
    /// Advance by `delta` seconds, acting on `node`.
    fn update(&mut self, node: NodeId, graph: &mut NodeGraph, delta: f32);

    /// A finished animator is dropped from its node.
    fn is_done(&self) -> bool {
        false
    }

    /// Seconds for one pass; `None` when unbounded.
    fn length(&self) -> Option<f32> {
        None
    }
}

/// Easing curve applied to normalized time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
    BackIn,
    BackOut,
    BounceOut,
    ElasticOut,
}

impl Easing {
    /// Map `t` in [0, 1] to eased progress. Back and elastic overshoot.
    pub fn apply(self, t: f32) -> f32 {
        const BACK: f32 = 1.70158;
        let t = t.clamp(0.0, 1.0);
        let in_out = |f: fn(f32) -> f32| {
            if t < 0.5 {
                f(2.0 * t) / 2.0
            } else {
                1.0 - f(2.0 - 2.0 * t) / 2.0
            }
        };
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t).powi(2),
            Easing::QuadInOut => in_out(|x| x * x),
            Easing::CubicIn => t.powi(3),
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => in_out(|x| x * x * x),
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => (1.0 - (PI * t).cos()) / 2.0,
            Easing::BackIn => (BACK + 1.0) * t.powi(3) - BACK * t * t,
            Easing::BackOut => 1.0 + (BACK + 1.0) * (t - 1.0).powi(3) + BACK * (t - 1.0).powi(2),
            Easing::BounceOut => bounce_out(t),
            Easing::ElasticOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * (2.0 * PI / 3.0)).sin() + 1.0
                }
            }
        }
    }

    pub fn interpolate(self, from: f32, to: f32, t: f32) -> f32 {
        from + (to - from) * self.apply(t)
    }

    pub fn interpolate_vec2(self, from: Vec2, to: Vec2, t: f32) -> Vec2 {
        from + (to - from) * self.apply(t)
    }
}

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    let (shift, offset) = if t < 1.0 / D {
        (0.0, 0.0)
    } else if t < 2.0 / D {
        (1.5, 0.75)
    } else if t < 2.5 / D {
        (2.25, 0.9375)
    } else {
        (2.625, 0.984375)
    };
    let t = t - shift / D;
    N * t * t + offset
}

/// Node property a tween drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTarget {
    Position { from: Vec2, to: Vec2 },
    Rotation { from: f32, to: f32 },
    Scale { from: Vec2, to: Vec2 },
    Opacity { from: f32, to: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenLoop {
    /// Play once, then finish.
    #[default]
    Once,
    /// Restart from the beginning.
    Loop,
    /// Reverse direction at each end.
    PingPong,
}

#[derive(Debug, Clone)]
pub struct Tween {
    pub target: TweenTarget,
    /// Seconds.
    pub duration: f32,
    pub elapsed: f32,
    pub easing: Easing,
    pub loop_mode: TweenLoop,
    pub playing: bool,
    forward: bool,
    done: bool,
}

impl Tween {
    pub fn new(target: TweenTarget, duration: f32, easing: Easing) -> Self {
        Self {
            target,
            duration,
            elapsed: 0.0,
            easing,
            loop_mode: TweenLoop::Once,
            playing: true,
            forward: true,
            done: false,
        }
    }

    pub fn move_to(from: Vec2, to: Vec2, duration: f32, easing: Easing) -> Self {
        Self::new(TweenTarget::Position { from, to }, duration, easing)
    }

    pub fn rotate(from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        Self::new(TweenTarget::Rotation { from, to }, duration, easing)
    }

    pub fn scale(from: Vec2, to: Vec2, duration: f32, easing: Easing) -> Self {
        Self::new(TweenTarget::Scale { from, to }, duration, easing)
    }

    pub fn fade(from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        Self::new(TweenTarget::Opacity { from, to }, duration, easing)
    }

    pub fn with_loop(mut self, mode: TweenLoop) -> Self {
        self.loop_mode = mode;
        self
    }

    pub fn paused(mut self) -> Self {
        self.playing = false;
        self
    }

    /// Normalized progress in [0, 1], ignoring direction.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    fn apply(&self, node: NodeId, graph: &mut NodeGraph) {
        let progress = self.progress();
        let t = if self.forward { progress } else { 1.0 - progress };
        let Some(node) = graph.node_mut(node) else {
            return;
        };
        match self.target {
            TweenTarget::Position { from, to } => node.set_position(self.easing.interpolate_vec2(from, to, t)),
            TweenTarget::Rotation { from, to } => node.set_rotation(self.easing.interpolate(from, to, t)),
            TweenTarget::Scale { from, to } => node.set_scale(self.easing.interpolate_vec2(from, to, t)),
            TweenTarget::Opacity { from, to } => node.set_opacity(self.easing.interpolate(from, to, t)),
        }
    }
}

impl Animator for Tween {
    fn update(&mut self, node: NodeId, graph: &mut NodeGraph, delta: f32) {
        if !self.playing || self.done {
            return;
        }
        self.elapsed += delta;
        self.apply(node, graph);

        if self.elapsed >= self.duration {
            match self.loop_mode {
                TweenLoop::Once => self.done = true,
                TweenLoop::Loop => self.elapsed = 0.0,
                TweenLoop::PingPong => {
                    self.elapsed = 0.0;
                    self.forward = !self.forward;
                }
            }
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn length(&self) -> Option<f32> {
        (self.loop_mode == TweenLoop::Once).then_some(self.duration)
    }
}

/// Runs animators one after another.
#[derive(Debug, Default)]
pub struct Sequence {
    animators: Vec<Box<dyn Animator>>,
    current: usize,
}

impl Sequence {
    pub fn new(animators: Vec<Box<dyn Animator>>) -> Self {
        Self { animators, current: 0 }
    }

    pub fn then(mut self, animator: impl Animator + 'static) -> Self {
        self.animators.push(Box::new(animator));
        self
    }
}

impl Animator for Sequence {
    fn update(&mut self, node: NodeId, graph: &mut NodeGraph, delta: f32) {
        if let Some(animator) = self.animators.get_mut(self.current) {
            animator.update(node, graph, delta);
            // the next step starts on the following update
            if animator.is_done() {
                self.current += 1;
            }
        }
    }

    fn is_done(&self) -> bool {
        self.current >= self.animators.len()
    }

    fn length(&self) -> Option<f32> {
        self.animators.iter().map(|a| a.length()).sum()
    }
}

/// Runs animators side by side until all of them finish.
#[derive(Debug, Default)]
pub struct Parallel {
    animators: Vec<Box<dyn Animator>>,
}

impl Parallel {
    pub fn new(animators: Vec<Box<dyn Animator>>) -> Self {
        Self { animators }
    }

    pub fn with(mut self, animator: impl Animator + 'static) -> Self {
        self.animators.push(Box::new(animator));
        self
    }
}

impl Animator for Parallel {
    fn update(&mut self, node: NodeId, graph: &mut NodeGraph, delta: f32) {
        for animator in self.animators.iter_mut().filter(|a| !a.is_done()) {
            animator.update(node, graph, delta);
        }
    }

    fn is_done(&self) -> bool {
        self.animators.iter().all(|a| a.is_done())
    }

    fn length(&self) -> Option<f32> {
        self.animators
            .iter()
            .map(|a| a.length())
            .try_fold(0.0_f32, |longest, l| l.map(|l| longest.max(l)))
    }
}
