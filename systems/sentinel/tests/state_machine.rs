use std::{cell::RefCell, rc::Rc, time::Duration};

use glam::Quat;
use nightwatch_core::{
    DetectionIndicator, Event, GridCoord, ProjectileSpawner, SentinelId, SentinelState,
    SoundEffect, SoundPlayer, TileId, WorldPosition,
};
use nightwatch_system_sentinel::{
    Capabilities, ConfigError, Sentinel, SentinelConfig, SentinelSetup,
};
use nightwatch_world::{CellGeometry, GridMap, TileLayout};

const FLOOR: TileId = TileId::new(1);
const WALL: TileId = TileId::new(2);
const TICK: Duration = Duration::from_millis(50);

#[test]
fn patrol_loops_through_waypoints() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = sentinel(&grid, (0, 0), &[(0, 0), (2, 0)], &recorder);

    let mut indices = Vec::new();
    let mut reached = Vec::new();
    for _ in 0..200 {
        let before = sentinel.patrol_index();
        let events = tick(&mut sentinel, None);
        reached.extend(events.iter().filter_map(|event| match event {
            Event::WaypointReached { cell, .. } => Some(*cell),
            _ => None,
        }));
        if sentinel.patrol_index() != before {
            indices.push(sentinel.patrol_index());
        }
        assert_eq!(sentinel.state(), SentinelState::Patrolling);
    }

    assert!(indices.len() >= 4, "patrol stalled: {indices:?}");
    assert_eq!(&indices[..4], &[1, 0, 1, 0]);
    assert!(reached
        .iter()
        .all(|cell| cell.y() == 0 && (0..=2).contains(&cell.x())));
    assert!(recorder.shots.borrow().is_empty());
}

#[test]
fn dwell_holds_the_sentinel_at_each_waypoint() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = sentinel(&grid, (0, 0), &[(0, 0), (2, 0)], &recorder);

    let events = tick(&mut sentinel, None);
    assert!(events.contains(&Event::WaypointReached {
        sentinel: SentinelId::new(1),
        cell: GridCoord::new(0, 0),
    }));
    assert_eq!(sentinel.patrol_index(), 1);

    for _ in 0..9 {
        let _ = tick(&mut sentinel, None);
        assert!(sentinel.motion().is_none());
        assert!(sentinel.path().is_empty());
    }

    let _ = tick(&mut sentinel, None);
    assert!(sentinel.motion().is_some());
    assert_eq!(sentinel.path().terminal(), Some(GridCoord::new(2, 0)));
}

#[test]
fn alert_abandons_the_waypoint_in_flight() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = patrolling_mid_leg(&grid, &recorder);
    assert_eq!(sentinel.patrol_index(), 1);

    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);

    assert_eq!(sentinel.state(), SentinelState::Alerted);
    assert_eq!(sentinel.indicator(), DetectionIndicator::Alert);
    assert_eq!(sentinel.patrol_index(), 2);
    assert!(sentinel.motion().is_none());
    assert!(sentinel.path().is_empty());
    assert!(sentinel.ranged_enabled());
    assert_eq!(*recorder.sounds.borrow(), vec![SoundEffect::Detection]);
    assert_eq!(
        events,
        vec![
            Event::IndicatorChanged {
                sentinel: SentinelId::new(1),
                indicator: DetectionIndicator::Alert,
            },
            Event::StateChanged {
                sentinel: SentinelId::new(1),
                from: SentinelState::Patrolling,
                to: SentinelState::Alerted,
            },
        ]
    );
}

#[test]
fn repeated_detection_signals_are_ignored() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = patrolling_mid_leg(&grid, &recorder);

    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);
    events.clear();

    sentinel.on_zone_enter(&mut events);
    assert!(events.is_empty());
    assert_eq!(sentinel.patrol_index(), 2);
    assert_eq!(recorder.sounds.borrow().len(), 1);

    let _ = tick(&mut sentinel, Some(WorldPosition::new(2.5, 2.5)));
    assert_eq!(sentinel.state(), SentinelState::Pursuing);

    events.clear();
    sentinel.on_zone_enter(&mut events);
    assert!(events.is_empty());
    let detections = recorder
        .sounds
        .borrow()
        .iter()
        .filter(|effect| **effect == SoundEffect::Detection)
        .count();
    assert_eq!(detections, 1);
}

#[test]
fn exit_while_patrolling_is_ignored() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = sentinel(&grid, (0, 0), &[(0, 0), (2, 0)], &recorder);

    let mut events = Vec::new();
    sentinel.on_zone_exit(&mut events);

    assert!(events.is_empty());
    assert_eq!(sentinel.state(), SentinelState::Patrolling);
    assert_eq!(sentinel.indicator(), DetectionIndicator::Normal);
}

#[test]
fn enter_exit_enter_ends_alerted_with_one_skipped_waypoint() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = patrolling_mid_leg(&grid, &recorder);

    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);
    sentinel.on_zone_exit(&mut events);
    sentinel.on_zone_enter(&mut events);

    assert_eq!(sentinel.state(), SentinelState::Alerted);
    assert_eq!(sentinel.indicator(), DetectionIndicator::Alert);
    assert_eq!(sentinel.patrol_index(), 2);
    assert_eq!(
        transitions(&events),
        vec![
            (SentinelState::Patrolling, SentinelState::Alerted),
            (SentinelState::Alerted, SentinelState::Returning),
            (SentinelState::Returning, SentinelState::Alerted),
        ]
    );
    assert_eq!(
        *recorder.sounds.borrow(),
        vec![SoundEffect::Detection, SoundEffect::Detection]
    );
}

#[test]
fn enter_exit_enter_during_dwell_keeps_the_next_waypoint() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = sentinel(&grid, (0, 0), &[(0, 0), (4, 0), (4, 4)], &recorder);

    let _ = tick(&mut sentinel, None);
    assert_eq!(sentinel.patrol_index(), 1);
    assert!(sentinel.motion().is_none());

    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);
    sentinel.on_zone_exit(&mut events);
    sentinel.on_zone_enter(&mut events);

    assert_eq!(sentinel.state(), SentinelState::Alerted);
    assert_eq!(sentinel.patrol_index(), 1);

    sentinel.on_zone_exit(&mut events);
    let _ = tick(&mut sentinel, None);
    assert_eq!(sentinel.state(), SentinelState::Patrolling);
    assert_eq!(sentinel.path().terminal(), Some(GridCoord::new(4, 0)));
}

#[test]
fn alert_before_the_first_tick_keeps_the_first_waypoint() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = sentinel(&grid, (2, 2), &[(0, 0), (4, 0)], &recorder);

    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);
    sentinel.on_zone_exit(&mut events);
    sentinel.on_zone_enter(&mut events);

    assert_eq!(sentinel.state(), SentinelState::Alerted);
    assert_eq!(sentinel.patrol_index(), 0);
}

#[test]
fn fresh_sentinel_stands_on_its_spawn_cell() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let sentinel = sentinel(&grid, (1, 2), &[(1, 2), (3, 2)], &recorder);

    assert_eq!(sentinel.pose().position, WorldPosition::new(1.5, 2.5));
    assert_eq!(sentinel.heading(), Quat::IDENTITY);
    assert_eq!(sentinel.cell(), Some(GridCoord::new(1, 2)));
    assert_eq!(
        sentinel.patrol().waypoints(),
        &[GridCoord::new(1, 2), GridCoord::new(3, 2)]
    );
    assert_eq!(sentinel.patrol().current(), Some(GridCoord::new(1, 2)));
}

#[test]
fn alerted_sentinel_starts_pursuing_on_the_next_tick() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = sentinel(&grid, (0, 0), &[(0, 0)], &recorder);

    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);
    let events = tick(&mut sentinel, Some(WorldPosition::new(2.5, 0.5)));

    assert_eq!(sentinel.state(), SentinelState::Pursuing);
    assert_eq!(
        transitions(&events),
        vec![(SentinelState::Alerted, SentinelState::Pursuing)]
    );
}

#[test]
fn returning_sentinel_resumes_patrol_on_the_next_tick() {
    let grid = open_grid(5, 5);
    let recorder = Rc::new(Recorder::default());
    let mut sentinel = sentinel(&grid, (0, 0), &[(0, 0), (0, 3)], &recorder);

    let _ = tick(&mut sentinel, None);
    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);
    sentinel.on_zone_exit(&mut events);
    assert_eq!(sentinel.state(), SentinelState::Returning);
    assert_eq!(sentinel.indicator(), DetectionIndicator::Normal);
    assert!(!sentinel.ranged_enabled());

    let events = tick(&mut sentinel, None);
    assert_eq!(
        transitions(&events),
        vec![(SentinelState::Returning, SentinelState::Patrolling)]
    );
    assert_eq!(sentinel.patrol_index(), 1);
    assert_eq!(sentinel.path().terminal(), Some(GridCoord::new(0, 3)));
}

#[test]
fn sentinel_without_grid_stays_idle() {
    let recorder = Rc::new(Recorder::default());
    let setup = SentinelSetup {
        id: SentinelId::new(7),
        grid: None,
        spawn: GridCoord::new(0, 0),
        bearing: 0.0,
        patrol: vec![GridCoord::new(0, 0)],
        config: SentinelConfig::default(),
    };
    let mut sentinel = Sentinel::new(setup, capabilities(&recorder));

    assert_eq!(sentinel.fault(), Some(&ConfigError::MissingGrid));
    assert!(sentinel.is_inert());
    assert_eq!(sentinel.cell(), None);

    let mut events = Vec::new();
    sentinel.on_zone_enter(&mut events);
    sentinel.tick(TICK, Some(WorldPosition::new(0.5, 0.5)), &mut events);
    assert!(!sentinel.attempt_attack(WorldPosition::new(0.5, 0.5), &mut events));

    assert!(events.is_empty());
    assert_eq!(sentinel.state(), SentinelState::Patrolling);
    assert!(recorder.sounds.borrow().is_empty());
    assert!(recorder.shots.borrow().is_empty());
}

#[test]
fn misconfigured_patrols_are_reported() {
    let grid = Rc::new(GridMap::build(
        Some(
            &TileLayout::from_ascii("..#\n...", &[('.', FLOOR), ('#', WALL)])
                .expect("layout parses"),
        ),
        FLOOR,
        CellGeometry::default(),
    ));
    let recorder = Rc::new(Recorder::default());

    let empty = sentinel(&grid, (0, 0), &[], &recorder);
    assert_eq!(empty.fault(), Some(&ConfigError::EmptyPatrolRoute));

    let walled = sentinel(&grid, (0, 0), &[(0, 0), (2, 0)], &recorder);
    assert_eq!(
        walled.fault(),
        Some(&ConfigError::UnwalkableWaypoint {
            index: 1,
            cell: GridCoord::new(2, 0),
        })
    );

    let outside = sentinel(&grid, (0, 0), &[(9, 9)], &recorder);
    assert!(matches!(
        outside.fault(),
        Some(ConfigError::UnwalkableWaypoint { index: 0, .. })
    ));

    let setup = SentinelSetup::new(
        SentinelId::new(2),
        Rc::clone(&grid),
        GridCoord::new(0, 0),
        vec![GridCoord::new(0, 0)],
    )
    .with_config(SentinelConfig {
        move_speed: -1.0,
        ..SentinelConfig::default()
    });
    let slow = Sentinel::new(setup, capabilities(&recorder));
    assert!(matches!(
        slow.fault(),
        Some(ConfigError::InvalidParameter {
            name: "move_speed",
            ..
        })
    ));
}

#[derive(Default)]
struct Recorder {
    shots: RefCell<Vec<(WorldPosition, f32)>>,
    sounds: RefCell<Vec<SoundEffect>>,
}

impl ProjectileSpawner for Recorder {
    fn spawn_projectile(&self, origin: WorldPosition, bearing: f32) {
        self.shots.borrow_mut().push((origin, bearing));
    }
}

impl SoundPlayer for Recorder {
    fn play(&self, effect: SoundEffect) {
        self.sounds.borrow_mut().push(effect);
    }
}

fn capabilities(recorder: &Rc<Recorder>) -> Capabilities {
    Capabilities::new(recorder.clone(), recorder.clone())
}

fn open_grid(columns: u32, rows: u32) -> Rc<GridMap> {
    let layout = TileLayout::filled(columns, rows, Some(FLOOR)).expect("layout fits");
    Rc::new(GridMap::build(Some(&layout), FLOOR, CellGeometry::default()))
}

fn sentinel(
    grid: &Rc<GridMap>,
    spawn: (i32, i32),
    patrol: &[(i32, i32)],
    recorder: &Rc<Recorder>,
) -> Sentinel {
    let setup = SentinelSetup::new(
        SentinelId::new(1),
        Rc::clone(grid),
        GridCoord::from(spawn),
        patrol.iter().copied().map(GridCoord::from).collect(),
    );
    Sentinel::new(setup, capabilities(recorder))
}

/// Sentinel that has finished dwelling at waypoint 0 and is walking toward waypoint 1.
fn patrolling_mid_leg(grid: &Rc<GridMap>, recorder: &Rc<Recorder>) -> Sentinel {
    let mut sentinel = sentinel(grid, (0, 0), &[(0, 0), (4, 0), (4, 4)], recorder);
    for _ in 0..11 {
        let _ = tick(&mut sentinel, None);
    }
    assert!(sentinel.motion().is_some());
    sentinel
}

fn tick(sentinel: &mut Sentinel, intruder: Option<WorldPosition>) -> Vec<Event> {
    let mut events = Vec::new();
    sentinel.tick(TICK, intruder, &mut events);
    events
}

fn transitions(events: &[Event]) -> Vec<(SentinelState, SentinelState)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::StateChanged { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}
