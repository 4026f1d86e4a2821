// Quick demonstration of an undoable editing session
// Run with: RUST_LOG=debug cargo run --bin demo_undo_session

use ringbuf::traits::Consumer;
use std::rc::Rc;
use timeline_undo::timeline::{Keyframe, Properties, PropertyValue};
use timeline_undo::undo::{LogEvent, ScenarioRecorder};
use timeline_undo::{
    BeginOptions, CommitTimeline, Timeline, TimelineObserver, UndoLogConfig, UndoableActionLog,
};

fn print_state(timeline: &Timeline, log: &UndoableActionLog<Timeline>) {
    println!(
        "   - Layers: {}, Clips: {}, Effects: {}, Markers: {}",
        timeline.layers().len(),
        timeline.clip_count(),
        timeline.effect_count(),
        timeline.markers().len()
    );
    println!(
        "   - Undo: {} ({:?}) | Redo: {} ({:?}) | Dirty: {}",
        log.undo_count(),
        log.undo_description(),
        log.redo_count(),
        log.redo_description(),
        log.dirty()
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("🎬 Timeline Undo - Editing Session Demo");
    println!("========================================");

    let config = UndoLogConfig::default().with_history_limit(50);
    println!("⚙️  Config:\n{}", config.to_ron_string()?);

    let log = Rc::new(UndoableActionLog::with_config(config));
    let mut timeline = Timeline::new();
    TimelineObserver::attach(&log, &mut timeline);

    let mut events = log.event_channel();
    log.subscribe(Box::new(ScenarioRecorder::new(std::io::stdout())));

    // Build the base project
    log.begin_with("create layer", BeginOptions::new().finalizing(CommitTimeline))?;
    let layer = timeline.add_layer(0);
    log.commit("create layer")?;
    log.checkpoint()?;

    println!("\n✅ Created layer {}", layer);
    print_state(&timeline, &log);

    // Add a clip with an effect in one transaction
    let (clip, effect) = log.started(
        "add clip",
        BeginOptions::new().finalizing(CommitTimeline),
        &mut timeline,
        |timeline| -> Result<_, Box<dyn std::error::Error>> {
            let mut properties = Properties::new();
            properties.insert("start".into(), PropertyValue::Int(0));
            properties.insert("duration".into(), PropertyValue::Int(5_000));
            let clip = timeline.add_clip(layer, properties)?;
            let effect = timeline.add_effect(clip, "alpha")?;
            timeline.set_keyframe(effect, "alpha", 0, 1.0)?;
            Ok((clip, effect))
        },
    )?;

    println!("\n🎞️  Added clip {} with effect {}", clip, effect);
    print_state(&timeline, &log);

    // Drag the keyframe: every motion event merges into one action
    log.begin("drag keyframe")?;
    for step in 1..=5u64 {
        let from = (step - 1) * 100;
        timeline.move_keyframe(effect, "alpha", from, Keyframe::new(step * 100, 1.0))?;
    }
    log.commit("drag keyframe")?;
    println!("\n🖱️  Dragged keyframe: {:?}", log.last_committed_actions());

    // Remove the effect, then bring it back through undo
    log.begin("remove effect")?;
    timeline.remove_effect(effect)?;
    log.commit("remove effect")?;
    println!("\n🗑️  Removed effect");
    print_state(&timeline, &log);

    log.undo(&mut timeline)?;
    let live = timeline.resolve(effect);
    println!("\n↩️  Undo: effect {} now lives as {}", effect, live);
    println!("   - Keyframes: {:?}", timeline.keyframes(live, "alpha"));

    // Undo everything back to the checkpoint
    while log.dirty() && log.can_undo() {
        log.undo(&mut timeline)?;
    }
    println!("\n⏪ Back at checkpoint");
    print_state(&timeline, &log);

    while log.can_redo() {
        log.redo(&mut timeline)?;
    }
    println!("\n⏩ Redone everything");
    print_state(&timeline, &log);
    println!("   - Pipeline commits: {}", timeline.commit_count());

    let mut moves = 0;
    while let Some(event) = events.try_pop() {
        if matches!(event, LogEvent::Move { .. }) {
            moves += 1;
        }
    }
    println!("\n📡 {} undo/redo events received", moves);

    Ok(())
}
