use vizij_blend_core::{
    AnimationNode, AnimationTree, BlendError, ClipAction, ClipMixer, ClipPlayer, ClipState,
    EventKind, LinearAnchor, LinearBlendTree, SharedClip,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn leaf(mixer: &mut ClipMixer, name: &str) -> (ClipState, SharedClip) {
    let clip = mixer.add(ClipPlayer::new(name, 1.0));
    (ClipState::new(clip.clone()).unwrap(), clip)
}

fn tree_with(values: &[f32]) -> (LinearBlendTree, Vec<SharedClip>) {
    let mut mixer = ClipMixer::new();
    let mut clips = Vec::new();
    let anchors = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let (state, clip) = leaf(&mut mixer, &format!("clip{i}"));
            clips.push(clip);
            LinearAnchor::new(state, v)
        })
        .collect();
    (LinearBlendTree::new(anchors).unwrap(), clips)
}

#[test]
fn blends_between_bracketing_pair() {
    let (mut tree, _) = tree_with(&[0.0, 10.0, 20.0]);
    tree.set_influence(1.0).unwrap();
    tree.set_blend(15.0).unwrap();
    assert_eq!(tree.anchor_weights(), vec![0.0, 0.5, 0.5]);

    tree.set_blend(2.5).unwrap();
    assert_eq!(tree.anchor_weights(), vec![0.75, 0.25, 0.0]);
}

#[test]
fn exact_anchor_values_get_full_weight() {
    let (mut tree, _) = tree_with(&[-1.0, 0.0, 0.3, 4.0]);
    tree.set_influence(1.0).unwrap();
    for (i, v) in [-1.0, 0.0, 0.3, 4.0].into_iter().enumerate() {
        tree.set_blend(v).unwrap();
        let weights = tree.anchor_weights();
        assert_eq!(weights[i], 1.0, "anchor {i} at {v}");
        assert_eq!(weights.iter().sum::<f32>(), 1.0);
    }
}

#[test]
fn weights_sum_to_influence_everywhere() {
    let (mut tree, clips) = tree_with(&[0.0, 0.2, 0.9, 1.0, 3.0]);
    tree.set_influence(0.6).unwrap();
    for step in -10..=40 {
        let x = step as f32 * 0.1;
        tree.set_blend(x).unwrap();
        let sum: f32 = tree.anchor_weights().iter().sum();
        approx(sum, 0.6, 1e-5);
        let clip_sum: f32 = clips.iter().map(|c| c.borrow().weight()).sum();
        approx(clip_sum, 0.6, 1e-5);
    }
}

#[test]
fn blend_value_is_clamped_to_anchor_range() {
    let (mut tree, _) = tree_with(&[1.0, 2.0]);
    tree.set_influence(1.0).unwrap();
    tree.set_blend(-50.0).unwrap();
    assert_eq!(tree.blend(), 1.0);
    assert_eq!(tree.anchor_weights(), vec![1.0, 0.0]);
    tree.set_blend(50.0).unwrap();
    assert_eq!(tree.blend(), 2.0);
    assert_eq!(tree.anchor_weights(), vec![0.0, 1.0]);
}

#[test]
fn anchors_are_sorted_by_value() {
    let (tree, _) = tree_with(&[5.0, -2.0, 1.0]);
    assert_eq!(tree.values(), vec![-2.0, 1.0, 5.0]);
    assert_eq!(tree.len(), 3);
    // Starts at the lowest value with no influence.
    assert_eq!(tree.blend(), -2.0);
    assert_eq!(tree.anchor_weights(), vec![0.0, 0.0, 0.0]);
}

#[test]
fn repeated_blend_is_a_no_op() {
    let (mut tree, clips) = tree_with(&[0.0, 1.0]);
    tree.set_influence(1.0).unwrap();
    tree.set_blend(0.4).unwrap();
    let first = tree.anchor_weights();

    // An external write to the clip survives a repeated call with the same value.
    clips[0].borrow_mut().set_weight(0.123);
    tree.set_blend(0.4).unwrap();
    assert_eq!(tree.anchor_weights(), first);
    assert_eq!(clips[0].borrow().weight(), 0.123);
}

#[test]
fn influence_rescales_without_changing_local_weights() {
    let (mut tree, clips) = tree_with(&[0.0, 1.0]);
    tree.set_blend(0.25).unwrap();
    tree.set_influence(0.5).unwrap();
    assert_eq!(tree.anchor_weights(), vec![0.375, 0.125]);
    assert_eq!(clips[0].borrow().weight(), 0.375);
    assert_eq!(clips[1].borrow().weight(), 0.125);

    tree.set_influence(0.0).unwrap();
    assert!(clips.iter().all(|c| !c.borrow().is_playing()));
}

#[test]
fn construction_errors() {
    let mut mixer = ClipMixer::new();
    let one = vec![LinearAnchor::new(leaf(&mut mixer, "a").0, 0.0)];
    assert_eq!(
        LinearBlendTree::new(one).unwrap_err(),
        BlendError::InsufficientAnchors {
            required: 2,
            actual: 1
        }
    );

    let dup = vec![
        LinearAnchor::new(leaf(&mut mixer, "a").0, 0.5),
        LinearAnchor::new(leaf(&mut mixer, "b").0, 0.5),
    ];
    assert_eq!(
        LinearBlendTree::new(dup).unwrap_err(),
        BlendError::DuplicateValue { value: 0.5 }
    );

    let nan = vec![
        LinearAnchor::new(leaf(&mut mixer, "a").0, 0.0),
        LinearAnchor::new(leaf(&mut mixer, "b").0, f32::NAN),
    ];
    match LinearBlendTree::new(nan) {
        Err(BlendError::InvalidNumber { name, .. }) => assert_eq!(name, "anchor value"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn invalid_blend_keeps_previous_state() {
    let (mut tree, _) = tree_with(&[0.0, 1.0]);
    tree.set_influence(1.0).unwrap();
    tree.set_blend(0.3).unwrap();
    let before = tree.anchor_weights();
    assert!(matches!(
        tree.set_blend(f32::INFINITY),
        Err(BlendError::InvalidNumber { .. })
    ));
    assert_eq!(tree.blend(), 0.3);
    assert_eq!(tree.anchor_weights(), before);
}

#[test]
fn nested_trees_multiply_weights() {
    let mut mixer = ClipMixer::new();
    let (walk, walk_clip) = leaf(&mut mixer, "walk");
    let (jog, jog_clip) = leaf(&mut mixer, "jog");
    let (run, run_clip) = leaf(&mut mixer, "run");
    let inner = LinearBlendTree::new(vec![
        LinearAnchor::new(walk, 0.0),
        LinearAnchor::new(jog, 1.0),
    ])
    .unwrap();
    let mut outer = LinearBlendTree::new(vec![
        LinearAnchor::new(inner, 0.0),
        LinearAnchor::new(run, 1.0),
    ])
    .unwrap();

    outer.set_influence(1.0).unwrap();
    outer.set_blend(0.5).unwrap();
    if let Some(AnimationNode::Linear(inner)) = outer.anchor_mut(0) {
        inner.set_blend(0.5).unwrap();
    } else {
        panic!("first anchor is the inner tree");
    }

    assert_eq!(walk_clip.borrow().weight(), 0.25);
    assert_eq!(jog_clip.borrow().weight(), 0.25);
    assert_eq!(run_clip.borrow().weight(), 0.5);
    let inner_influence = outer.anchor(0).map(|n| n.influence());
    assert_eq!(inner_influence, Some(0.5));
}

#[test]
fn leaf_events_are_relayed_by_the_tree() {
    let mut mixer = ClipMixer::new();
    let (a, _) = leaf(&mut mixer, "a");
    let (b, _) = leaf(&mut mixer, "b");
    let a_id = a.id();
    let mut tree =
        LinearBlendTree::new(vec![LinearAnchor::new(a, 0.0), LinearAnchor::new(b, 1.0)]).unwrap();

    tree.set_influence(1.0).unwrap();
    tree.on_enter();
    let events = tree.drain_events();
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Play, EventKind::Enter]);
    assert_eq!(events[0].clip, Some(a_id));
    assert_eq!(events[0].source, tree.id());

    tree.set_blend(1.0).unwrap();
    let kinds: Vec<EventKind> = tree.drain_events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Stop, EventKind::Play]);
}
