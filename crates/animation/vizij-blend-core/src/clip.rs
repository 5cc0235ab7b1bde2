//! Playable clip contract consumed by [`ClipState`](crate::state::ClipState), plus a
//! reference [`ClipPlayer`] for hosts without their own playback primitive.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
    PingPong,
}

/// A playable clip action driven by an external clock.
///
/// Blend trees only ever call `play`, `stop`, `set_time` and `set_weight`; time advancement
/// belongs to whatever [`Mixer`](crate::mixer::Mixer) owns the clock.
pub trait ClipAction: Debug {
    fn play(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    /// Clip-local playback time in seconds, within `[0, duration]`.
    fn time(&self) -> f32;
    fn set_time(&mut self, time: f32);
    fn weight(&self) -> f32;
    fn set_weight(&mut self, weight: f32);
    /// Length of the clip in seconds.
    fn duration(&self) -> f32;
    fn loop_mode(&self) -> LoopMode;
    /// Whether a finished one-shot clip holds its final pose.
    fn clamp_when_finished(&self) -> bool {
        false
    }
}

/// Shared handle to a clip; the host's mixer and the owning leaf both hold one.
pub type SharedClip = Rc<RefCell<dyn ClipAction>>;

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let period = 2.0 * span;
    let m = fmod(t, period);
    if m <= span {
        m
    } else {
        period - m
    }
}

/// Reference clip action: tracks playback time under a loop mode and exposes a weight.
#[derive(Debug, Clone)]
pub struct ClipPlayer {
    pub name: String,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    pub clamp_when_finished: bool,
    duration: f32,
    weight: f32,
    /// Unwrapped playback position; local time is derived from it per loop mode.
    elapsed: f32,
    playing: bool,
    finished: bool,
}

impl ClipPlayer {
    pub fn new(name: &str, duration: f32) -> Self {
        Self {
            name: name.to_string(),
            time_scale: 1.0,
            loop_mode: LoopMode::Loop,
            clamp_when_finished: false,
            duration,
            weight: 1.0,
            elapsed: 0.0,
            playing: false,
            finished: false,
        }
    }

    pub fn with_loop_mode(mut self, mode: LoopMode) -> Self {
        self.loop_mode = mode;
        self
    }

    pub fn with_clamp_when_finished(mut self, clamp: bool) -> Self {
        self.clamp_when_finished = clamp;
        self
    }

    /// True once a one-shot clip has run off either end.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Weight as applied to the pose: a finished one-shot clip that does not clamp
    /// contributes nothing.
    pub fn effective_weight(&self) -> f32 {
        if self.finished && !self.clamp_when_finished {
            0.0
        } else {
            self.weight
        }
    }

    /// Advance playback by `dt` seconds of mixer time.
    pub fn advance(&mut self, dt: f32) {
        if !self.playing || self.finished || self.duration <= 0.0 {
            return;
        }
        self.elapsed += dt * self.time_scale;
        if self.loop_mode == LoopMode::Once {
            if self.elapsed >= self.duration {
                self.elapsed = self.duration;
                self.finished = true;
            } else if self.elapsed < 0.0 {
                self.elapsed = 0.0;
                self.finished = true;
            }
        }
    }
}

impl ClipAction for ClipPlayer {
    fn play(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.finished = false;
        self.elapsed = 0.0;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn time(&self) -> f32 {
        match self.loop_mode {
            LoopMode::Once => self.elapsed.clamp(0.0, self.duration),
            LoopMode::Loop => fmod(self.elapsed, self.duration),
            LoopMode::PingPong => ping_pong(self.elapsed, self.duration),
        }
    }

    fn set_time(&mut self, time: f32) {
        self.elapsed = time;
        self.finished = false;
    }

    fn weight(&self) -> f32 {
        self.weight
    }

    fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    fn clamp_when_finished(&self) -> bool {
        self.clamp_when_finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn loop_wraps_local_time() {
        let mut clip = ClipPlayer::new("walk", 1.0);
        clip.play();
        clip.advance(0.75);
        clip.advance(0.5);
        approx(clip.time(), 0.25, 1e-6);
    }

    #[test]
    fn ping_pong_reflects_at_the_end() {
        let mut clip = ClipPlayer::new("wave", 1.0).with_loop_mode(LoopMode::PingPong);
        clip.play();
        clip.advance(1.25);
        approx(clip.time(), 0.75, 1e-6);
        clip.advance(1.0);
        approx(clip.time(), 0.25, 1e-6);
    }

    #[test]
    fn once_clamps_and_finishes() {
        let mut clip = ClipPlayer::new("jump", 1.0).with_loop_mode(LoopMode::Once);
        clip.play();
        clip.advance(2.0);
        assert!(clip.is_finished());
        assert_eq!(clip.time(), 1.0);
        assert_eq!(clip.effective_weight(), 0.0);

        let mut held = ClipPlayer::new("land", 1.0)
            .with_loop_mode(LoopMode::Once)
            .with_clamp_when_finished(true);
        held.play();
        held.advance(2.0);
        assert_eq!(held.effective_weight(), 1.0);
    }

    #[test]
    fn stopped_clip_does_not_advance() {
        let mut clip = ClipPlayer::new("idle", 1.0);
        clip.advance(0.5);
        assert_eq!(clip.time(), 0.0);
        clip.play();
        clip.advance(0.5);
        clip.stop();
        assert_eq!(clip.time(), 0.0);
    }
}
