use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::rc::Rc;
use timeline_undo::timeline::{Keyframe, Properties};
use timeline_undo::undo::{ObjectId, ObjectRegistry};
use timeline_undo::{Timeline, TimelineObserver, UndoableActionLog};

fn session() -> (Rc<UndoableActionLog<Timeline>>, Timeline, ObjectId) {
    let log = Rc::new(UndoableActionLog::new());
    let mut timeline = Timeline::new();
    TimelineObserver::attach(&log, &mut timeline);
    let layer = timeline.add_layer(0);
    (log, timeline, layer)
}

/// Benchmark recording a slider drag (merge path taken on every push)
fn bench_property_drag(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_drag");

    for events in [10u64, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(events), &events, |b, &events| {
            let (log, mut timeline, layer) = session();
            let clip = timeline.add_clip(layer, Properties::new()).unwrap();
            b.iter(|| {
                log.begin("drag").unwrap();
                for value in 0..events {
                    timeline
                        .set_property(clip, "start", black_box(value as i64))
                        .unwrap();
                }
                log.commit("drag").unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark undo/redo of a transaction holding many distinct actions
fn bench_undo_redo(c: &mut Criterion) {
    let mut group = c.benchmark_group("undo_redo");

    for markers in [10u64, 100, 1_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(markers),
            &markers,
            |b, &markers| {
                let (log, mut timeline, _) = session();
                log.begin("add markers").unwrap();
                for position in 0..markers {
                    timeline.add_marker(position * 100, "");
                }
                log.commit("add markers").unwrap();

                b.iter(|| {
                    log.undo(&mut timeline).unwrap();
                    log.redo(&mut timeline).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark effect recreation, which goes through the object registry
fn bench_effect_recreation(c: &mut Criterion) {
    c.bench_function("effect_remove_undo", |b| {
        let (log, mut timeline, layer) = session();
        let clip = timeline.add_clip(layer, Properties::new()).unwrap();
        let effect = timeline.add_effect(clip, "alpha").unwrap();
        timeline
            .set_keyframe(effect, "alpha", 0, 1.0)
            .unwrap();

        log.begin("remove effect").unwrap();
        timeline.remove_effect(effect).unwrap();
        log.commit("remove effect").unwrap();

        b.iter(|| {
            log.undo(&mut timeline).unwrap();
            log.redo(&mut timeline).unwrap();
        });
        black_box(timeline.keyframes(timeline.resolve(effect), "alpha"));
    });
}

/// Benchmark resolving through long supersede chains
fn bench_registry_resolve(c: &mut Criterion) {
    let mut registry = ObjectRegistry::new();
    let original = ObjectId::new();
    let mut current = original;
    for _ in 0..1_000 {
        let next = ObjectId::new();
        registry.supersede(current, next);
        current = next;
    }

    c.bench_function("registry_resolve", |b| {
        b.iter(|| black_box(registry.resolve(black_box(original))));
    });
}

/// Benchmark a keyframe drag merged into a single action
fn bench_keyframe_drag(c: &mut Criterion) {
    c.bench_function("keyframe_drag_100", |b| {
        let (log, mut timeline, layer) = session();
        let clip = timeline.add_clip(layer, Properties::new()).unwrap();
        let effect = timeline.add_effect(clip, "alpha").unwrap();
        timeline.set_keyframe(effect, "alpha", 0, 1.0).unwrap();

        b.iter(|| {
            log.begin("drag").unwrap();
            for step in 1..=100u64 {
                timeline
                    .move_keyframe(effect, "alpha", step - 1, Keyframe::new(step, 1.0))
                    .unwrap();
            }
            for step in (0..100u64).rev() {
                timeline
                    .move_keyframe(effect, "alpha", step + 1, Keyframe::new(step, 1.0))
                    .unwrap();
            }
            log.commit("drag").unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_property_drag,
    bench_undo_redo,
    bench_effect_recreation,
    bench_registry_resolve,
    bench_keyframe_drag
);
criterion_main!(benches);
