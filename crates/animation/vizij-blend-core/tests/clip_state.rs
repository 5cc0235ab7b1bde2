use std::cell::RefCell;
use std::rc::Rc;

use vizij_blend_core::{
    AnimationTree, BlendError, ClipAction, ClipMixer, ClipPlayer, ClipState, ClipStatus,
    EventKind, LoopMode, Mixer, SharedClip,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn kinds(state: &mut ClipState) -> Vec<EventKind> {
    state.drain_events().into_iter().map(|e| e.kind).collect()
}

#[test]
fn rejects_non_positive_duration() {
    for duration in [0.0, -1.0, f32::NAN] {
        let clip: SharedClip = Rc::new(RefCell::new(ClipPlayer::new("bad", duration)));
        assert!(matches!(
            ClipState::new(clip),
            Err(BlendError::InvalidDuration { .. })
        ));
    }
}

#[test]
fn construction_force_stops_the_clip() {
    let clip: SharedClip = Rc::new(RefCell::new(ClipPlayer::new("idle", 2.0)));
    {
        let mut c = clip.borrow_mut();
        c.play();
        c.set_time(1.2);
        c.set_weight(0.8);
    }
    let state = ClipState::new(Rc::clone(&clip)).unwrap();
    let c = clip.borrow();
    assert!(!c.is_playing());
    assert_eq!(c.time(), 0.0);
    assert_eq!(c.weight(), 0.0);
    assert_eq!(state.status(), ClipStatus::Stopped);
    assert_eq!(state.influence(), 0.0);
}

#[test]
fn influence_drives_play_stop_and_weight() {
    let mut mixer = ClipMixer::new();
    let clip = mixer.add(ClipPlayer::new("walk", 1.0));
    let mut state = ClipState::new(Rc::clone(&clip)).unwrap();

    state.set_influence(0.4).unwrap();
    assert!(clip.borrow().is_playing());
    assert_eq!(clip.borrow().weight(), 0.4);
    assert_eq!(state.status(), ClipStatus::Playing);

    // Reweighting a playing clip does not replay it.
    state.set_influence(0.9).unwrap();
    assert_eq!(clip.borrow().weight(), 0.9);

    mixer.advance(0.3);
    state.set_influence(0.0).unwrap();
    {
        let c = clip.borrow();
        assert!(!c.is_playing());
        assert_eq!(c.time(), 0.0);
        assert_eq!(c.weight(), 0.0);
    }
    assert_eq!(kinds(&mut state), vec![EventKind::Play, EventKind::Stop]);
}

#[test]
fn invalid_influence_leaves_state_untouched() {
    let mut mixer = ClipMixer::new();
    let clip = mixer.add(ClipPlayer::new("walk", 1.0));
    let mut state = ClipState::new(Rc::clone(&clip)).unwrap();
    state.set_influence(0.5).unwrap();

    assert!(matches!(
        state.set_influence(1.5),
        Err(BlendError::OutOfUnitRange { .. })
    ));
    assert!(matches!(
        state.set_influence(f32::NAN),
        Err(BlendError::InvalidNumber { .. })
    ));
    assert_eq!(state.influence(), 0.5);
    assert_eq!(clip.borrow().weight(), 0.5);
}

#[test]
fn looping_clip_reports_each_wrap_once() {
    let mut mixer = ClipMixer::new();
    let clip = mixer.add(ClipPlayer::new("run", 1.0));
    let mut state = ClipState::new(clip).unwrap();
    let iterations = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&iterations);
    state.on(EventKind::Iterate, move |_| *counter.borrow_mut() += 1);

    state.set_influence(1.0).unwrap();
    for _ in 0..5 {
        mixer.advance(0.25);
        state.tick(0.25);
    }
    // 1.25s of a 1s loop wraps once, at 1.0s.
    assert_eq!(*iterations.borrow(), 1);

    for _ in 0..5 {
        mixer.advance(0.25);
        state.tick(0.25);
    }
    assert_eq!(*iterations.borrow(), 2);
}

#[test]
fn one_shot_clip_reports_finish_once() {
    let mut mixer = ClipMixer::new();
    let clip = mixer.add(ClipPlayer::new("wave", 0.5).with_loop_mode(LoopMode::Once));
    let mut state = ClipState::new(Rc::clone(&clip)).unwrap();
    state.set_influence(1.0).unwrap();
    kinds(&mut state);

    mixer.advance(0.3);
    state.tick(0.3);
    assert!(kinds(&mut state).is_empty());

    mixer.advance(0.3);
    state.tick(0.3);
    approx(clip.borrow().time(), 0.5, 1e-6);
    assert_eq!(kinds(&mut state), vec![EventKind::Finish]);

    mixer.advance(0.3);
    state.tick(0.3);
    assert!(kinds(&mut state).is_empty());
}

#[test]
fn ping_pong_reports_once_per_period() {
    let mut mixer = ClipMixer::new();
    let clip = mixer.add(ClipPlayer::new("sway", 1.0).with_loop_mode(LoopMode::PingPong));
    let mut state = ClipState::new(clip).unwrap();
    state.set_influence(1.0).unwrap();
    kinds(&mut state);

    let mut bounces = 0;
    for _ in 0..10 {
        mixer.advance(0.25);
        state.tick(0.25);
        bounces += kinds(&mut state)
            .into_iter()
            .filter(|k| *k == EventKind::Iterate)
            .count();
    }
    // Time falls from 1.0s to 2.0s; that whole descent is a single bounce.
    assert_eq!(bounces, 1);
}

#[test]
fn events_are_tagged_with_the_leaf() {
    let mut mixer = ClipMixer::new();
    let mut state = ClipState::new(mixer.add(ClipPlayer::new("walk", 1.0))).unwrap();
    state.set_influence(1.0).unwrap();
    state.on_enter();
    let events = state.drain_events();
    assert_eq!(events[0].kind, EventKind::Play);
    assert_eq!(events[0].clip, Some(state.id()));
    assert_eq!(events[1].kind, EventKind::Enter);
    assert_eq!(events[1].clip, None);
    assert_eq!(events[1].source, state.id());
}
