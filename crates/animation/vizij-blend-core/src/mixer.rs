//! Clock contract advanced once per frame by the state machine.

use std::cell::RefCell;
use std::rc::Rc;

use crate::clip::{ClipAction, ClipPlayer, SharedClip};

/// Anything that advances clip playback by a frame's elapsed time.
pub trait Mixer {
    fn advance(&mut self, dt: f32);
}

/// Lets several state machines share one clock.
impl<M: Mixer + ?Sized> Mixer for Rc<RefCell<M>> {
    fn advance(&mut self, dt: f32) {
        self.borrow_mut().advance(dt);
    }
}

/// Reference mixer owning a set of [`ClipPlayer`]s.
#[derive(Debug, Default)]
pub struct ClipMixer {
    clips: Vec<Rc<RefCell<ClipPlayer>>>,
    time: f32,
}

impl ClipMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip and return the shared handle a [`ClipState`](crate::state::ClipState) wraps.
    pub fn add(&mut self, clip: ClipPlayer) -> SharedClip {
        let clip = Rc::new(RefCell::new(clip));
        self.clips.push(Rc::clone(&clip));
        clip
    }

    /// Total mixer time advanced so far.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Sum of the weights currently applied by playing clips.
    pub fn total_weight(&self) -> f32 {
        self.clips
            .iter()
            .map(|c| c.borrow())
            .filter(|c| c.is_playing())
            .map(|c| c.effective_weight())
            .sum()
    }
}

impl Mixer for ClipMixer {
    fn advance(&mut self, dt: f32) {
        self.time += dt;
        for clip in &self.clips {
            clip.borrow_mut().advance(dt);
        }
    }
}
