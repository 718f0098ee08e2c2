//! Tile: the owner of one screen region's content sources.
//!
//! A tile resolves its slot's plugin references once, at load. Only the
//! active entry has a live source; the others are kept as constructors and
//! resolved configs. Switching entries always disposes the live source
//! (tick timer cancelled, instance dropped) before building the next one.

use std::time::Duration;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::ConfigSnapshot;
use crate::layout::timer::{Scheduler, TimerId, TimerOwner};
use crate::plugins::{BoxedSource, Frame};
use crate::registry::{PluginEntry, PluginRegistry};
use crate::types::config::WindowSlotSpec;
use crate::types::geometry::Rect;
use crate::types::resolved::ResolvedPluginConfig;

pub const PLACEHOLDER_TEXT: &str = "No plugins configured";


struct LoadedPlugin {
    type_name: String,
    entry: PluginEntry,
    config: ResolvedPluginConfig,
    weight: f64,
}


enum CyclePolicy {
    Off,
    RoundRobin,
    Weighted(WeightedIndex<f64>),
}


/// What a tile shows on the next repaint.
#[derive(Debug, Clone, PartialEq)]
pub enum TileBody {
    Content(Frame),
    Placeholder(&'static str),
    TooSmall { min_width: u16, min_height: u16 },
}


#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub id: String,
    pub title: String,
    pub focused: bool,
    pub area: Rect,
    pub content_area: Rect,
    pub body: TileBody,
}


pub struct Tile {
    index: usize,
    spec: WindowSlotSpec,
    plugins: Vec<LoadedPlugin>,
    skipped: Vec<String>,
    active: usize,
    source: Option<BoxedSource>,
    policy: CyclePolicy,
    focused: bool,
    area: Rect,
    content_area: Rect,
    tick_timer: Option<TimerId>,
    cycle_timer: Option<TimerId>,
    rng: SmallRng,
}


impl Tile {
    /// Resolve every plugin reference of `spec`, skipping unregistered types.
    pub fn load(
        index: usize,
        spec: WindowSlotSpec,
        registry: &PluginRegistry,
        snapshot: &ConfigSnapshot,
    ) -> Tile {
        let mut plugins = Vec::with_capacity(spec.plugins.len());
        let mut skipped = Vec::new();
        for plugin_ref in &spec.plugins {
            match registry.resolve(&plugin_ref.type_name) {
                Ok(entry) => plugins.push(LoadedPlugin {
                    type_name: plugin_ref.type_name.clone(),
                    config: snapshot.resolve_with_preset(
                        &plugin_ref.type_name,
                        entry.preset(),
                        &plugin_ref.overrides,
                    ),
                    entry: entry.clone(),
                    weight: plugin_ref.weight,
                }),
                Err(err) => {
                    tracing::warn!(tile = %spec.id, error = %err, "skipping plugin");
                    skipped.push(plugin_ref.type_name.clone());
                }
            }
        }
        let policy = cycle_policy(&spec, &plugins);
        tracing::debug!(tile = %spec.id, loaded = plugins.len(), skipped = skipped.len(), "tile loaded");
        Tile {
            index,
            spec,
            plugins,
            skipped,
            active: 0,
            source: None,
            policy,
            focused: false,
            area: Rect::default(),
            content_area: Rect::default(),
            tick_timer: None,
            cycle_timer: None,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Make weighted cycling deterministic.
    pub fn seed_cycling(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn spec(&self) -> &WindowSlotSpec {
        &self.spec
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Type names that were not registered at load.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn is_placeholder(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_type(&self) -> Option<&str> {
        self.plugins.get(self.active).map(|p| p.type_name.as_str())
    }

    pub fn has_live_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_cycling(&self) -> bool {
        !matches!(self.policy, CyclePolicy::Off)
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Place the tile. The live source is resized to `content_area`.
    pub fn set_area(&mut self, area: Rect, content_area: Rect) {
        self.area = area;
        let resized = content_area != self.content_area;
        self.content_area = content_area;
        if resized {
            if let Some(source) = self.source.as_mut() {
                source.resize(content_area.width, content_area.height);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Build the active entry's live source and start its timers.
    pub fn activate(&mut self, scheduler: &mut Scheduler, now_ms: u64) {
        self.dispose(scheduler);
        let Some(plugin) = self.plugins.get(self.active) else {
            return;
        };
        let mut source = plugin.entry.construct(&plugin.config);
        source.resize(self.content_area.width, self.content_area.height);
        let interval = duration_ms(source.tick_interval());
        self.tick_timer = Some(scheduler.schedule(TimerOwner::tick(self.index), interval, now_ms));
        tracing::debug!(tile = %self.spec.id, plugin = %plugin.type_name, interval_ms = interval, "source activated");
        self.source = Some(source);

        if self.is_cycling() && self.cycle_timer.is_none() {
            let interval = duration_ms(self.spec.cycle_interval);
            self.cycle_timer = Some(scheduler.schedule(TimerOwner::cycle(self.index), interval, now_ms));
        }
    }

    /// Drop the live source and cancel its tick timer.
    pub fn dispose(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.tick_timer.take() {
            scheduler.cancel(id);
        }
        self.source = None;
    }

    /// Dispose and stop cycling. Safe to call repeatedly.
    pub fn teardown(&mut self, scheduler: &mut Scheduler) {
        self.dispose(scheduler);
        if let Some(id) = self.cycle_timer.take() {
            scheduler.cancel(id);
        }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        if let Some(source) = self.source.as_mut() {
            source.tick(elapsed);
        }
    }

    /// Move to the next entry. A draw that lands on the current entry keeps
    /// the live source untouched. Returns whether the source changed.
    pub fn cycle(&mut self, scheduler: &mut Scheduler, now_ms: u64) -> bool {
        let next = match &self.policy {
            CyclePolicy::Off => return false,
            CyclePolicy::RoundRobin => (self.active + 1) % self.plugins.len(),
            CyclePolicy::Weighted(dist) => dist.sample(&mut self.rng),
        };
        if next == self.active {
            return false;
        }
        self.active = next;
        self.activate(scheduler, now_ms);
        true
    }

    pub fn view(&self) -> TileView {
        let body = if self.plugins.is_empty() {
            TileBody::Placeholder(PLACEHOLDER_TEXT)
        } else if self.content_area.width < self.spec.min_size.0
            || self.content_area.height < self.spec.min_size.1
        {
            TileBody::TooSmall {
                min_width: self.spec.min_size.0,
                min_height: self.spec.min_size.1,
            }
        } else {
            TileBody::Content(self.source.as_ref().map(|s| s.render()).unwrap_or_default())
        };
        let title = match self.active_type() {
            Some(kind) => format!("{} [{}]", self.spec.id, kind),
            None => self.spec.id.clone(),
        };
        TileView {
            id: self.spec.id.clone(),
            title,
            focused: self.focused,
            area: self.area,
            content_area: self.content_area,
            body,
        }
    }
}


fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1)
}


fn cycle_policy(spec: &WindowSlotSpec, plugins: &[LoadedPlugin]) -> CyclePolicy {
    if spec.cycle_interval.is_zero() || plugins.len() < 2 {
        return CyclePolicy::Off;
    }
    let first = plugins[0].weight;
    if plugins.iter().all(|p| p.weight == first) {
        if first <= 0.0 {
            tracing::warn!(tile = %spec.id, weight = first, "non-positive plugin weights, cycling in order");
        }
        return CyclePolicy::RoundRobin;
    }
    match WeightedIndex::new(plugins.iter().map(|p| p.weight)) {
        Ok(dist) => CyclePolicy::Weighted(dist),
        Err(err) => {
            tracing::warn!(tile = %spec.id, error = %err, "invalid plugin weights, cycling in order");
            CyclePolicy::RoundRobin
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigModel;
    use crate::types::config::{ConfigDocument, PluginRef};

    fn snapshot() -> std::sync::Arc<ConfigSnapshot> {
        ConfigModel::in_memory(&ConfigDocument::default()).snapshot()
    }

    fn spec(types: &[(&str, f64)], cycle_secs: u64) -> WindowSlotSpec {
        WindowSlotSpec {
            id: "t".into(),
            plugins: types
                .iter()
                .map(|(name, weight)| PluginRef {
                    weight: *weight,
                    ..PluginRef::named(*name)
                })
                .collect(),
            cycle_interval: Duration::from_secs(cycle_secs),
            min_size: (10, 3),
        }
    }

    fn tile(types: &[(&str, f64)], cycle_secs: u64) -> Tile {
        let registry = PluginRegistry::with_builtins();
        let mut tile = Tile::load(0, spec(types, cycle_secs), &registry, &snapshot());
        tile.set_area(Rect::new(0, 0, 62, 22), Rect::new(1, 1, 60, 20));
        tile
    }

    #[test]
    fn unknown_types_are_skipped() {
        let t = tile(&[("DoesNotExist", 1.0), ("HexScroll", 1.0)], 0);
        assert_eq!(t.plugin_count(), 1);
        assert_eq!(t.skipped(), ["DoesNotExist".to_string()]);
        assert!(!t.is_placeholder());
    }

    #[test]
    fn no_loadable_plugins_is_placeholder() {
        let mut t = tile(&[("Nope", 1.0)], 0);
        let mut s = Scheduler::new();
        t.activate(&mut s, 0);
        assert!(t.is_placeholder());
        assert!(!t.has_live_source());
        assert_eq!(s.live_count(), 0);
        assert_eq!(t.view().body, TileBody::Placeholder(PLACEHOLDER_TEXT));
    }

    #[test]
    fn activation_schedules_tick_and_cycle() {
        let mut t = tile(&[("HexScroll", 1.0), ("LogScroll", 1.0)], 5);
        let mut s = Scheduler::new();
        t.activate(&mut s, 0);
        assert!(t.has_live_source());
        assert_eq!(s.live_count(), 2);
        t.teardown(&mut s);
        t.teardown(&mut s);
        assert_eq!(s.live_count(), 0);
        assert!(!t.has_live_source());
    }

    #[test]
    fn single_plugin_never_cycles() {
        let mut t = tile(&[("HexScroll", 1.0)], 5);
        let mut s = Scheduler::new();
        t.activate(&mut s, 0);
        assert!(!t.is_cycling());
        assert_eq!(s.live_count(), 1);
        assert!(!t.cycle(&mut s, 10));
    }

    #[test]
    fn round_robin_visits_each_once() {
        let mut t = tile(&[("HexScroll", 1.0), ("LogScroll", 1.0), ("MatrixRain", 1.0)], 1);
        let mut s = Scheduler::new();
        t.activate(&mut s, 0);
        let mut seen = vec![t.active_type().unwrap().to_string()];
        for step in 1..3 {
            assert!(t.cycle(&mut s, step * 1000));
            seen.push(t.active_type().unwrap().to_string());
        }
        assert_eq!(seen, ["HexScroll", "LogScroll", "MatrixRain"]);
        t.cycle(&mut s, 3000);
        assert_eq!(t.active_index(), 0);
        assert_eq!(s.live_count(), 2);
    }

    #[test]
    fn swap_replaces_tick_timer() {
        let mut t = tile(&[("HexScroll", 1.0), ("LogScroll", 1.0)], 1);
        let mut s = Scheduler::new();
        t.activate(&mut s, 0);
        let old = s.timer_for(TimerOwner::tick(0)).unwrap();
        t.cycle(&mut s, 1000);
        assert!(!s.is_live(old));
        assert!(s.timer_for(TimerOwner::tick(0)).is_some());
    }

    #[test]
    fn weighted_frequencies_follow_weights() {
        let mut t = tile(&[("HexScroll", 3.0), ("LogScroll", 1.0)], 1);
        t.seed_cycling(42);
        let mut s = Scheduler::new();
        t.activate(&mut s, 0);
        let mut hex = 0;
        let draws = 4000;
        for i in 0..draws {
            t.cycle(&mut s, i);
            if t.active_index() == 0 {
                hex += 1;
            }
        }
        let share = hex as f64 / draws as f64;
        assert!((share - 0.75).abs() < 0.05, "share was {share}");
    }

    #[test]
    fn invalid_weights_fall_back_to_round_robin() {
        let mut t = tile(&[("HexScroll", 0.0), ("LogScroll", -1.0)], 1);
        let mut s = Scheduler::new();
        t.activate(&mut s, 0);
        assert!(t.cycle(&mut s, 1000));
        assert_eq!(t.active_index(), 1);
        assert!(t.cycle(&mut s, 2000));
        assert_eq!(t.active_index(), 0);
    }

    #[test]
    fn small_area_reports_too_small() {
        let mut t = tile(&[("HexScroll", 1.0)], 0);
        t.set_area(Rect::new(0, 0, 8, 4), Rect::new(1, 1, 6, 2));
        assert_eq!(
            t.view().body,
            TileBody::TooSmall {
                min_width: 10,
                min_height: 3
            }
        );
    }

    #[test]
    fn title_names_active_plugin() {
        let t = tile(&[("TacticalMap", 1.0)], 0);
        assert_eq!(t.view().title, "t [TacticalMap]");
    }
}
