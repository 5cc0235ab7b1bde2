use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vizij_blend_core::{
    ClipMixer, ClipPlayer, ClipState, FreeformAnchor, FreeformBlendTree, LinearAnchor,
    LinearBlendTree, StateMachine, TransitionCfg,
};

fn clip(mixer: &mut ClipMixer, name: &str) -> ClipState {
    ClipState::new(mixer.add(ClipPlayer::new(name, 1.0))).expect("valid clip")
}

fn linear_machine(anchors: usize) -> StateMachine {
    let mut mixer = ClipMixer::new();
    let entries = (0..anchors)
        .map(|i| LinearAnchor::new(clip(&mut mixer, &format!("c{i}")), i as f32))
        .collect();
    let tree = LinearBlendTree::new(entries).expect("tree");
    StateMachine::new(tree, mixer).expect("machine")
}

fn bench_linear(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_set_blend_update");
    for &n in &[2usize, 8, 32] {
        let mut machine = linear_machine(n);
        let current = machine.current();
        let max = (n - 1) as f32;
        let mut x = 0.0_f32;
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                x = (x + 0.37) % max;
                if let Some(tree) = machine.state_mut(current).and_then(|s| s.as_linear_mut()) {
                    tree.set_blend(black_box(x)).expect("blend");
                }
                machine.update(black_box(1.0 / 60.0)).expect("update");
            })
        });
    }
    group.finish();
}

fn bench_freeform(c: &mut Criterion) {
    let mut group = c.benchmark_group("freeform_set_blend");
    for &count in &[4usize, 16, 64] {
        let mut mixer = ClipMixer::new();
        // Sunflower spiral: well spread, no three points collinear.
        let anchors = (0..count)
            .map(|i| {
                let angle = i as f32 * 2.399_963;
                let radius = (i as f32 + 0.5).sqrt();
                let leaf = clip(&mut mixer, "c");
                FreeformAnchor::new(leaf, radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        let mut tree = FreeformBlendTree::new(anchors).expect("tree");
        let span = (count as f32).sqrt();
        let mut t = 0.0_f32;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                t += 0.11;
                let x = (t % (2.0 * span)) - span;
                let y = ((t * 0.7) % (2.0 * span)) - span;
                tree.set_blend(black_box(x), black_box(y)).expect("blend");
            })
        });
    }
    group.finish();
}

fn bench_crossfade(c: &mut Criterion) {
    c.bench_function("crossfade_round_trip", |b| {
        let mut machine = linear_machine(4);
        let first = machine.current();
        let mut mixer_clip = ClipMixer::new();
        let other = LinearBlendTree::new(vec![
            LinearAnchor::new(clip(&mut mixer_clip, "a"), 0.0),
            LinearAnchor::new(clip(&mut mixer_clip, "b"), 1.0),
        ])
        .expect("tree");
        let second = machine.add_state(other);
        machine
            .add_event_transition("go", TransitionCfg::new(second, 0.25).from(first))
            .expect("transition");
        machine
            .add_event_transition("back", TransitionCfg::new(first, 0.25).from(second))
            .expect("transition");
        b.iter(|| {
            machine.handle_event("go", &[]).expect("go");
            for _ in 0..16 {
                machine.update(1.0 / 60.0).expect("update");
            }
            machine.handle_event("back", &[]).expect("back");
            for _ in 0..16 {
                machine.update(1.0 / 60.0).expect("update");
            }
        })
    });
}

criterion_group!(benches, bench_linear, bench_freeform, bench_crossfade);
criterion_main!(benches);
