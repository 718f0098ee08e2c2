//! End-to-end behaviour of `Sys`: build, reload, cycling and timer accounting.

use std::fs;
use std::path::Path;

use blinken_core::command::Command;
use blinken_core::config::ConfigModel;
use blinken_core::registry::PluginRegistry;
use blinken_core::response::NoticeLevel;
use blinken_core::tile::TileBody;
use blinken_core::types::config::ConfigDocument;
use blinken_core::Sys;

fn open(path: &Path) -> Sys {
    let model = ConfigModel::open_with_fallbacks(path.to_path_buf(), Vec::new());
    Sys::new(model, PluginRegistry::with_builtins(), 120, 40)
}

fn memory(yaml: &str) -> Sys {
    let doc: ConfigDocument = serde_yaml::from_str(yaml).unwrap();
    Sys::new(ConfigModel::in_memory(&doc), PluginRegistry::with_builtins(), 120, 40)
}

fn assert_timers_match(sys: &Sys) {
    let wm = sys.windows();
    assert_eq!(wm.live_timer_count(), wm.expected_timer_count());
}

const PLAIN: &str = "\
layout: { layout_type: 2x2 }
windows:
  - { id: a, plugins: [{ type: HexScroll }] }
  - { id: b, plugins: [{ type: LogScroll }] }
";

const CYCLING: &str = "\
layout: { layout_type: single }
windows:
  - id: a
    cycle_interval: 1.0
    plugins:
      - { type: HexScroll }
      - { type: MatrixRain }
";

const ROUND_ROBIN: &str = "\
layout: { layout_type: single }
windows:
  - id: a
    cycle_interval: 1.0
    plugins: [{ type: LogScroll }, { type: MatrixRain }, { type: HexScroll }]
";

const SAME_RATE: &str = "\
layout: { layout_type: single }
windows:
  - id: a
    cycle_interval: 1.0
    plugins:
      - { type: HexScroll, config: { refresh_rate: 1.0 } }
      - { type: SystemMonitor, config: { refresh_rate: 1.0 } }
";

#[test]
fn reload_swaps_timers_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blinken.yaml");
    fs::write(&path, PLAIN).unwrap();

    let mut sys = open(&path);
    assert_eq!(sys.views().len(), 4);
    assert_eq!(sys.windows().live_timer_count(), 4);
    assert_timers_match(&sys);

    fs::write(&path, CYCLING).unwrap();
    assert!(sys.execute(Command::ReloadConfig).is_ok());
    assert_eq!(sys.views().len(), 1);
    // One tick timer plus one cycle timer.
    assert_eq!(sys.windows().live_timer_count(), 2);
    assert_timers_match(&sys);

    assert!(sys.execute(Command::ReloadConfig).is_ok());
    assert_eq!(sys.windows().live_timer_count(), 2);
    assert_eq!(sys.snapshot().version, 3);
}

#[test]
fn broken_reload_keeps_previous_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blinken.yaml");
    fs::write(&path, PLAIN).unwrap();
    let mut sys = open(&path);
    let before: Vec<String> = sys.views().into_iter().map(|v| v.id).collect();

    fs::write(&path, "layout: [unclosed").unwrap();
    let resp = sys.execute(Command::ReloadConfig);
    assert!(!resp.is_ok());
    let after: Vec<String> = sys.views().into_iter().map(|v| v.id).collect();
    assert_eq!(before, after);
    assert!(sys.notices().iter().any(|n| n.level == NoticeLevel::Warning));
    assert!(path.exists());
    assert_timers_match(&sys);
}

#[test]
fn missing_file_is_synthesized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("blinken.yaml");
    let sys = open(&path);
    assert!(path.exists());
    let ids: Vec<String> = sys.views().into_iter().map(|v| v.id).collect();
    assert_eq!(ids, ["map", "monitor", "logs", "data"]);
}

#[test]
fn unknown_plugin_is_skipped_not_placeheld() {
    let sys = memory(
        "layout: { layout_type: single }\n\
         windows: [{ id: a, plugins: [{ type: DoesNotExist }, { type: SystemMonitor }] }]",
    );
    let tile = &sys.windows().tiles()[0];
    assert_eq!(tile.plugin_count(), 1);
    assert_eq!(tile.skipped(), ["DoesNotExist"]);
    assert!(!tile.is_placeholder());
    assert!(matches!(sys.views()[0].body, TileBody::Content(_)));
}

#[test]
fn round_robin_visits_every_source_in_order() {
    let mut sys = memory(ROUND_ROBIN);
    let active = |sys: &Sys| sys.windows().tiles()[0].active_type().map(str::to_string);
    assert_eq!(active(&sys).as_deref(), Some("LogScroll"));
    let mut seen = Vec::new();
    for step in 1..=6u64 {
        sys.advance(step * 1000);
        seen.push(active(&sys).unwrap());
        assert_timers_match(&sys);
    }
    assert_eq!(
        seen,
        ["MatrixRain", "HexScroll", "LogScroll", "MatrixRain", "HexScroll", "LogScroll"]
    );
}

#[test]
fn swapped_out_tick_never_fires() {
    let mut sys = memory(SAME_RATE);
    // Tick then cycle: both dispatched.
    assert_eq!(sys.advance(1000), 2);
    // Cycle first: the swap cancels the tick due in the same batch.
    assert_eq!(sys.advance(2000), 1);
    assert_eq!(sys.windows().tiles()[0].active_type(), Some("HexScroll"));
    assert_timers_match(&sys);
}

#[test]
fn layout_switch_then_focus_round_trip() {
    let mut sys = memory(
        "layout: { layout_type: 3x3 }\n\
         windows: [{ id: a }, { id: b }, { id: c }, { id: d }]",
    );
    assert_eq!(sys.views().len(), 9);
    sys.execute(Command::Layout2x2);
    let start = sys.windows().focused_index();
    for _ in 0..4 {
        sys.execute(Command::FocusNext);
    }
    assert_eq!(sys.windows().focused_index(), start);
    for view in sys.views() {
        assert_eq!((view.area.width, view.area.height), (60, 20));
    }
}
