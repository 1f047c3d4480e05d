#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for the Myriapod engine.
//!
//! The world owns the destructible grid, the tick-scoped occupancy frame,
//! and every live segment. Adapters and systems mutate it exclusively through
//! [`apply`], which executes one [`Command`] and broadcasts [`Event`] values,
//! and read it exclusively through the [`query`] module. Keeping all shared
//! state behind one owner makes independent simulation instances cheap,
//! which the replay tests lean on.

use myriapod_core::{CellCoord, Command, Direction, Event, SegmentId, SpeedClass, WorldPoint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

mod grid;
mod locomotion;
mod occupancy;

use grid::Grid;
use locomotion::SegmentState;
use occupancy::OccupancyFrame;

/// Seed used when the caller does not provide one.
const OBSTACLE_SEED: u64 = 0x51ab_c03a_9e17_44d1;

/// Segments in a wave before the length bonus kicks in.
const BASE_WAVE_SEGMENTS: u32 = 8;

/// Waves needed to grow the chain by two segments.
const WAVE_GROWTH_INTERVAL: u32 = 4;

/// Health of a pristine segment; 1 marks the damaged state.
const SEGMENT_FULL_HEALTH: i32 = 2;

/// Score awarded per projectile hit on a segment.
const SEGMENT_HIT_SCORE: i32 = 10;

/// Score awarded when a segment is destroyed outright.
const SEGMENT_KILL_SCORE: i32 = 100;

/// Chance that a destroyed segment leaves an obstacle behind.
const OBSTACLE_DROP_CHANCE: f64 = 0.2;

/// Chance that a dropped obstacle is raised as a totem.
const TOTEM_CHANCE: f64 = 0.2;

/// Represents the authoritative Myriapod world state.
#[derive(Debug)]
pub struct World {
    tick: u64,
    grid: Grid,
    occupancy: OccupancyFrame,
    segments: Vec<SegmentState>,
    next_segment_id: u32,
    player: Option<WorldPoint>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a new world using the default obstacle seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(OBSTACLE_SEED)
    }

    /// Creates a new world whose obstacle draws derive from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            tick: 0,
            grid: Grid::new(),
            occupancy: OccupancyFrame::new(),
            segments: Vec::new(),
            next_segment_id: 0,
            player: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn spawn_wave(&mut self, wave: u32, out_events: &mut Vec<Event>) {
        let count = BASE_WAVE_SEGMENTS + 2 * (wave / WAVE_GROWTH_INTERVAL);
        let speed = if wave % 2 == 1 {
            SpeedClass::Fast
        } else {
            SpeedClass::Normal
        };

        for index in 0..count {
            let id = SegmentId::new(self.next_segment_id);
            self.next_segment_id += 1;
            self.segments.push(SegmentState {
                id,
                cell: CellCoord::new(-1 - index as i32, 0),
                health: SEGMENT_FULL_HEALTH,
                speed,
                is_head: index == 0,
                in_edge: Direction::Left,
                out_edge: Direction::Right,
                disallowed: None,
                previous_horizontal: Direction::Right,
            });
        }

        out_events.push(Event::WaveStarted {
            wave,
            segments: count,
        });
    }

    fn hit_segment(&mut self, segment: SegmentId, out_events: &mut Vec<Event>) {
        let Some(index) = self.segments.iter().position(|state| state.id == segment) else {
            return;
        };

        out_events.push(Event::ScoreDelta {
            amount: SEGMENT_HIT_SCORE,
        });

        self.segments[index].health -= 1;
        if self.segments[index].health > 0 {
            return;
        }

        let removed = self.segments.remove(index);
        out_events.push(Event::SegmentDestroyed {
            segment: removed.id,
        });
        out_events.push(Event::ScoreDelta {
            amount: SEGMENT_KILL_SCORE,
        });

        if !self.rng.gen_bool(OBSTACLE_DROP_CHANCE) {
            return;
        }

        let cell = removed.cell;
        let unobstructed = cell.in_bounds() && self.grid.obstacle_at(cell).is_none();
        let player_clear = self.player.map_or(true, |position| {
            self.grid.allows_player_at(position) && !Grid::blocks_player(cell, position)
        });
        if unobstructed && player_clear {
            let totem = self.rng.gen_bool(TOTEM_CHANCE);
            self.grid.place(cell, totem, &mut self.rng, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick = world.tick.wrapping_add(1);
            out_events.push(Event::TimeAdvanced { tick: world.tick });

            world.occupancy.reset();
            world.grid.tick(out_events);

            let tick = world.tick;
            let player_present = world.player.is_some();
            for segment in world.segments.iter_mut() {
                locomotion::step_segment(
                    segment,
                    tick,
                    &mut world.grid,
                    &mut world.occupancy,
                    player_present,
                    out_events,
                );
            }
        }
        Command::SpawnWave { wave } => {
            world.spawn_wave(wave, out_events);
        }
        Command::DamageCell {
            cell,
            amount,
            from_projectile,
        } => {
            let _ = world.grid.damage(cell, amount, from_projectile, out_events);
        }
        Command::HitSegment { segment } => {
            world.hit_segment(segment, out_events);
        }
        Command::PlaceObstacle { cell, totem } => {
            world.grid.place(cell, totem, &mut world.rng, out_events);
        }
        Command::SetPlayer { position } => {
            world.player = position;
        }
        Command::ClearRespawnArea { position } => {
            world.grid.clear_area(position, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use myriapod_core::{CellCoord, Direction, SegmentId, SpeedClass, WorldPoint};

    use super::{locomotion, OccupancyFrame, World};

    /// Current tick index of the simulation clock.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.tick
    }

    /// Position of the tracked player marker, if one exists.
    #[must_use]
    pub fn player(world: &World) -> Option<WorldPoint> {
        world.player
    }

    /// Reports whether the player could sit at `position` given the current
    /// terrain; used by the out-of-scope movement glue.
    #[must_use]
    pub fn allows_player_at(world: &World, position: WorldPoint) -> bool {
        world.grid.allows_player_at(position)
    }

    /// Captures a read-only view of every live obstacle.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView {
        let snapshots = world
            .grid
            .iter()
            .map(|(cell, obstacle)| ObstacleSnapshot {
                cell,
                health: obstacle.health,
                displayed_health: obstacle.displayed_health,
                variant: obstacle.variant,
                is_totem: obstacle.is_totem,
            })
            .collect();
        GridView { snapshots }
    }

    /// Captures a read-only view of every live segment.
    #[must_use]
    pub fn segment_view(world: &World) -> SegmentView {
        let snapshots = world
            .segments
            .iter()
            .map(|state| SegmentSnapshot {
                id: state.id,
                cell: state.cell,
                health: state.health,
                speed: state.speed,
                is_head: state.is_head,
                in_edge: state.in_edge,
                out_edge: state.out_edge,
                disallowed: state.disallowed,
                previous_horizontal: state.previous_horizontal,
                position: locomotion::world_position(state, world.tick),
                facing: locomotion::facing(state, world.tick),
                animation_frame: locomotion::animation_frame(state.speed, world.tick),
            })
            .collect();
        SegmentView { snapshots }
    }

    /// Exposes a read-only view of the tick-scoped occupancy frame.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView {
            frame: &world.occupancy,
        }
    }

    /// Immutable representation of a single obstacle used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ObstacleSnapshot {
        /// Cell the obstacle occupies.
        pub cell: CellCoord,
        /// Remaining health.
        pub health: i32,
        /// Health currently shown by the presentation layer.
        pub displayed_health: i32,
        /// Sprite variant chosen at placement.
        pub variant: u8,
        /// Whether the obstacle was raised as a totem.
        pub is_totem: bool,
    }

    /// Read-only snapshot describing all obstacles on the grid.
    #[derive(Clone, Debug, Default)]
    pub struct GridView {
        snapshots: Vec<ObstacleSnapshot>,
    }

    impl GridView {
        /// Iterator over obstacle snapshots in row-major order.
        pub fn iter(&self) -> impl Iterator<Item = &ObstacleSnapshot> {
            self.snapshots.iter()
        }

        /// Obstacle snapshot at the provided cell, if any.
        #[must_use]
        pub fn obstacle_at(&self, cell: CellCoord) -> Option<&ObstacleSnapshot> {
            self.snapshots
                .binary_search_by_key(&cell_key(cell), |snapshot| cell_key(snapshot.cell))
                .ok()
                .map(|index| &self.snapshots[index])
        }

        /// Number of live obstacles.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether the grid holds no obstacles.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ObstacleSnapshot> {
            self.snapshots
        }
    }

    fn cell_key(cell: CellCoord) -> (i32, i32) {
        (cell.row(), cell.column())
    }

    /// Immutable representation of a single segment used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct SegmentSnapshot {
        /// Identifier allocated by the world.
        pub id: SegmentId,
        /// Logical cell the segment currently occupies.
        pub cell: CellCoord,
        /// Remaining health: 2 pristine, 1 damaged.
        pub health: i32,
        /// Animation cadence class assigned at wave start.
        pub speed: SpeedClass,
        /// Whether the segment leads its chain.
        pub is_head: bool,
        /// Edge the segment entered its current cell through.
        pub in_edge: Direction,
        /// Edge the segment committed to exit through.
        pub out_edge: Direction,
        /// Direction barred near the boundary rows, if any.
        pub disallowed: Option<Direction>,
        /// Most recent horizontal exit.
        pub previous_horizontal: Direction,
        /// Interpolated world position for this tick.
        pub position: WorldPoint,
        /// Direction the segment visually faces this tick.
        pub facing: Direction,
        /// Animation frame exposed to the presentation layer.
        pub animation_frame: u8,
    }

    /// Read-only snapshot describing all segments in the simulation.
    #[derive(Clone, Debug, Default)]
    pub struct SegmentView {
        snapshots: Vec<SegmentSnapshot>,
    }

    impl SegmentView {
        /// Iterator over segment snapshots in update order.
        pub fn iter(&self) -> impl Iterator<Item = &SegmentSnapshot> {
            self.snapshots.iter()
        }

        /// Number of live segments.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no segments remain.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<SegmentSnapshot> {
            self.snapshots
        }
    }

    /// Read-only view of the occupancy claims recorded this tick.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        frame: &'a OccupancyFrame,
    }

    impl OccupancyView<'_> {
        /// Reports whether a segment claimed the cell this tick.
        #[must_use]
        pub fn is_cell_claimed(&self, cell: CellCoord) -> bool {
            self.frame.is_cell_claimed(cell)
        }

        /// Reports whether a segment claimed the directed edge this tick.
        #[must_use]
        pub fn is_edge_claimed(&self, cell: CellCoord, exit: Direction) -> bool {
            self.frame.is_edge_claimed(cell, exit)
        }

        /// Number of destination cells claimed this tick.
        #[must_use]
        pub fn claimed_cell_count(&self) -> usize {
            self.frame.claimed_cell_count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_the_clock_and_emits_time() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::Tick, &mut events);

        assert_eq!(query::tick(&world), 1);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { tick: 1 })));
    }

    #[test]
    fn spawn_wave_marches_in_from_off_grid() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::SpawnWave { wave: 0 }, &mut events);

        let segments = query::segment_view(&world).into_vec();
        assert_eq!(segments.len(), BASE_WAVE_SEGMENTS as usize);
        assert!(segments[0].is_head);
        assert!(segments.iter().skip(1).all(|segment| !segment.is_head));
        for (index, segment) in segments.iter().enumerate() {
            assert_eq!(segment.cell, CellCoord::new(-1 - index as i32, 0));
            assert_eq!(segment.health, SEGMENT_FULL_HEALTH);
            assert_eq!(segment.speed, SpeedClass::Normal);
            assert_eq!(segment.in_edge, Direction::Left);
            assert_eq!(segment.out_edge, Direction::Right);
        }
        assert!(events.iter().any(|event| matches!(
            event,
            Event::WaveStarted {
                wave: 0,
                segments: BASE_WAVE_SEGMENTS
            }
        )));
    }

    #[test]
    fn later_waves_grow_longer_and_faster() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::SpawnWave { wave: 5 }, &mut events);

        let segments = query::segment_view(&world).into_vec();
        assert_eq!(segments.len(), (BASE_WAVE_SEGMENTS + 2) as usize);
        assert!(segments
            .iter()
            .all(|segment| segment.speed == SpeedClass::Fast));
    }

    #[test]
    fn every_committed_segment_claims_exactly_one_cell() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::SpawnWave { wave: 0 }, &mut events);

        for _ in 0..4 {
            apply(&mut world, Command::Tick, &mut events);
        }

        assert_eq!(query::tick(&world) % 16, 4);
        assert_eq!(
            query::occupancy_view(&world).claimed_cell_count(),
            query::segment_view(&world).len()
        );
    }

    #[test]
    fn hit_segment_damages_then_destroys() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::SpawnWave { wave: 0 }, &mut events);
        let target = query::segment_view(&world).into_vec()[2].id;

        events.clear();
        apply(&mut world, Command::HitSegment { segment: target }, &mut events);
        assert_eq!(query::segment_view(&world).len(), 8);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ScoreDelta { amount: SEGMENT_HIT_SCORE })));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::SegmentDestroyed { .. })));

        apply(&mut world, Command::HitSegment { segment: target }, &mut events);
        assert_eq!(query::segment_view(&world).len(), 7);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::SegmentDestroyed { segment } if *segment == target)));

        // Hitting a removed segment is a silent no-op.
        events.clear();
        apply(&mut world, Command::HitSegment { segment: target }, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn destroyed_segments_only_drop_obstacles_on_free_cells() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::SpawnWave { wave: 0 }, &mut events);

        // March the chain onto the grid so deaths happen on real cells.
        for _ in 0..160 {
            apply(&mut world, Command::Tick, &mut events);
        }

        let segments = query::segment_view(&world).into_vec();
        events.clear();
        for segment in &segments {
            apply(
                &mut world,
                Command::HitSegment {
                    segment: segment.id,
                },
                &mut events,
            );
            apply(
                &mut world,
                Command::HitSegment {
                    segment: segment.id,
                },
                &mut events,
            );
        }

        assert!(query::segment_view(&world).is_empty());
        let placements = events
            .iter()
            .filter(|event| matches!(event, Event::ObstaclePlaced { .. }))
            .count();
        assert_eq!(placements, query::grid_view(&world).len());
        for snapshot in query::grid_view(&world).iter() {
            assert!(snapshot.cell.in_bounds());
        }
    }

    #[test]
    fn set_player_updates_the_marker() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetPlayer {
                position: Some(WorldPoint::new(240.0, 768.0)),
            },
            &mut events,
        );
        assert_eq!(query::player(&world), Some(WorldPoint::new(240.0, 768.0)));

        apply(&mut world, Command::SetPlayer { position: None }, &mut events);
        assert_eq!(query::player(&world), None);
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let script = |world: &mut World| {
            let mut events = Vec::new();
            apply(world, Command::SpawnWave { wave: 0 }, &mut events);
            for _ in 0..200 {
                apply(world, Command::Tick, &mut events);
            }
            let ids: Vec<_> = query::segment_view(world)
                .into_vec()
                .iter()
                .map(|segment| segment.id)
                .collect();
            for id in ids {
                apply(world, Command::HitSegment { segment: id }, &mut events);
                apply(world, Command::HitSegment { segment: id }, &mut events);
            }
            events
        };

        let mut first = World::with_seed(99);
        let mut second = World::with_seed(99);
        let first_events = script(&mut first);
        let second_events = script(&mut second);

        assert_eq!(first_events, second_events);
        assert_eq!(
            query::grid_view(&first).into_vec(),
            query::grid_view(&second).into_vec()
        );
    }
}
