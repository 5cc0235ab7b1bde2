#![allow(dead_code)]

//! vizij-blend-core: engine-agnostic blend trees and a crossfading state machine.
//!
//! Overview
//! - Leaves: [`ClipState`] wraps one playable clip ([`ClipAction`]) and maps influence to
//!   clip weight.
//! - Trees: [`LinearBlendTree`] (1D), [`PolarBlendTree`] (ray/ring grid), and
//!   [`FreeformBlendTree`] (Delaunay triangulation of arbitrary 2D points) compute a
//!   normalized weight per anchor from a blend parameter and scale it by their own influence.
//!   Anchors can be leaves or nested trees.
//! - Machine: [`StateMachine`] holds one current tree and any number of fading trees and
//!   crossfades their influence over time on event, data, or automatic triggers.
//! - Events: every node emits `Play`/`Stop`/`Enter`/`Exit`/`Iterate`/`Finish`; trees relay
//!   their leaves' events so a listener on the root sees all activity.
//!
//! Everything is single-threaded and synchronous. Call [`StateMachine::update`] once per
//! frame with the frame's elapsed time.
//!
//! ```
//! use vizij_blend_core::{
//!     AnimationTree, ClipMixer, ClipPlayer, ClipState, LinearAnchor, LinearBlendTree,
//!     StateMachine,
//! };
//!
//! let mut mixer = ClipMixer::new();
//! let walk = ClipState::new(mixer.add(ClipPlayer::new("walk", 1.0)))?;
//! let run = ClipState::new(mixer.add(ClipPlayer::new("run", 0.8)))?;
//! let locomotion = LinearBlendTree::new(vec![
//!     LinearAnchor::new(walk, 0.0),
//!     LinearAnchor::new(run, 1.0),
//! ])?;
//!
//! let mut machine = StateMachine::new(locomotion, mixer)?;
//! let tree = machine.state_mut(machine.current()).and_then(|n| n.as_linear_mut()).unwrap();
//! tree.set_blend(0.25)?;
//! assert_eq!(tree.anchor_weights(), vec![0.75, 0.25]);
//! machine.update(1.0 / 60.0)?;
//! # Ok::<(), vizij_blend_core::BlendError>(())
//! ```

pub mod clip;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod machine;
pub mod mixer;
pub mod node;
pub mod numeric;
pub mod state;
pub mod tree;
pub mod triangulate;

pub use clip::{ClipAction, ClipPlayer, LoopMode, SharedClip};
pub use config::Config;
pub use error::BlendError;
pub use event::{AnimationEvent, EventEmitter, EventKind, ListenerId};
pub use ids::{NodeId, StateId};
pub use machine::{Condition, StateMachine, TransitionCfg};
pub use mixer::{ClipMixer, Mixer};
pub use node::{AnimationNode, AnimationTree};
pub use numeric::Vec2;
pub use state::{ClipState, ClipStatus};
pub use tree::{
    FreeformAnchor, FreeformBlendTree, LinearAnchor, LinearBlendTree, PolarAnchor,
    PolarBlendTree,
};
pub use triangulate::{BoundaryEdgeMap, Triangulation};

pub type Result<T> = core::result::Result<T, BlendError>;
