//! Leaf blend node wrapping one playable clip.

use crate::clip::{LoopMode, SharedClip};
use crate::error::BlendError;
use crate::event::{AnimationEvent, EventEmitter, EventKind};
use crate::ids::NodeId;
use crate::node::AnimationTree;
use crate::numeric::ensure_unit;
use crate::Result;

/// A clip is `Stopped` at influence 0 and `Playing` at any positive influence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipStatus {
    Stopped,
    Playing,
}

#[derive(Debug)]
pub struct ClipState {
    id: NodeId,
    clip: SharedClip,
    influence: f32,
    previous_time: f32,
    /// Set once a completion has been reported, cleared when playback moves on.
    completed: bool,
    emitter: EventEmitter,
}

impl ClipState {
    /// Wrap `clip`, force-stopping it (time 0, weight 0) regardless of its prior state.
    pub fn new(clip: SharedClip) -> Result<Self> {
        {
            let mut action = clip.borrow_mut();
            let duration = action.duration();
            if !(duration.is_finite() && duration > 0.0) {
                return Err(BlendError::InvalidDuration { duration });
            }
            action.stop();
            action.set_time(0.0);
            action.set_weight(0.0);
        }
        Ok(Self {
            id: NodeId::next(),
            clip,
            influence: 0.0,
            previous_time: 0.0,
            completed: false,
            emitter: EventEmitter::new(),
        })
    }

    pub fn clip(&self) -> &SharedClip {
        &self.clip
    }

    pub fn status(&self) -> ClipStatus {
        if self.influence > 0.0 {
            ClipStatus::Playing
        } else {
            ClipStatus::Stopped
        }
    }

    fn emit(&mut self, kind: EventKind) {
        self.emitter.emit(AnimationEvent {
            kind,
            clip: Some(self.id),
            source: self.id,
        });
    }
}

impl AnimationTree for ClipState {
    fn id(&self) -> NodeId {
        self.id
    }

    fn influence(&self) -> f32 {
        self.influence
    }

    fn set_influence(&mut self, influence: f32) -> Result<()> {
        let influence = ensure_unit("influence", influence)?;
        if influence == self.influence {
            return Ok(());
        }
        let was_playing = self.influence > 0.0;
        let playing = influence > 0.0;
        self.influence = influence;

        if !was_playing && playing {
            self.clip.borrow_mut().play();
            self.emit(EventKind::Play);
        } else if was_playing && !playing {
            self.emit(EventKind::Stop);
            let mut action = self.clip.borrow_mut();
            action.stop();
            action.set_time(0.0);
            drop(action);
            self.previous_time = 0.0;
            self.completed = false;
        }
        self.clip.borrow_mut().set_weight(influence);
        Ok(())
    }

    fn on_enter(&mut self) {
        self.emitter.emit(AnimationEvent {
            kind: EventKind::Enter,
            clip: None,
            source: self.id,
        });
    }

    fn on_exit(&mut self) {
        self.emitter.emit(AnimationEvent {
            kind: EventKind::Exit,
            clip: None,
            source: self.id,
        });
    }

    fn tick(&mut self, _dt: f32) {
        let (time, duration, mode) = {
            let action = self.clip.borrow();
            (action.time(), action.duration(), action.loop_mode())
        };
        let completion = match mode {
            LoopMode::Once => (time >= duration).then_some(EventKind::Finish),
            LoopMode::Loop | LoopMode::PingPong => {
                (time < self.previous_time).then_some(EventKind::Iterate)
            }
        };
        match completion {
            Some(kind) if !self.completed => {
                self.completed = true;
                self.emit(kind);
            }
            Some(_) => {}
            None => self.completed = false,
        }
        self.previous_time = time;
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter {
        &mut self.emitter
    }

    fn drain_events(&mut self) -> Vec<AnimationEvent> {
        self.emitter.drain()
    }
}
