#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Myriapod simulation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for out-of-core
//! consumers (audio, scoring, visual effects) to react to deterministically.
//! Systems consume event streams, query immutable snapshots, and respond
//! exclusively with new command batches.

use serde::{Deserialize, Serialize};

/// Number of columns in the playfield grid.
pub const GRID_COLUMNS: i32 = 14;

/// Number of rows in the playfield grid.
pub const GRID_ROWS: i32 = 25;

/// Side length of a single grid cell expressed in world units.
pub const CELL_LENGTH: i32 = 32;

/// Cardinal directions a segment can enter or exit a cell through.
///
/// The enumeration order doubles as the tie-break order during direction
/// ranking: when two candidates rank equally, the earlier variant wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
}

impl Direction {
    /// Every direction in ranking order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Numeric index of the direction within [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// Direction stored at the provided index, wrapping modulo four.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// Column and row deltas applied by one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Opposite cardinal direction.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Reports whether the direction runs along the horizontal axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed: freshly spawned segments march in from cells with
/// negative columns on row zero before they reach the playfield proper.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Cell reached by one step in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            column: self.column + dx,
            row: self.row + dy,
        }
    }

    /// Reports whether the cell lies inside the playfield grid.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.column >= 0 && self.column < GRID_COLUMNS && self.row >= 0 && self.row < GRID_ROWS
    }

    /// Centre of the cell in world units, shifted by the provided offsets.
    #[must_use]
    pub fn to_world(self, x_offset: f32, y_offset: f32) -> WorldPoint {
        WorldPoint::new(
            (self.column * CELL_LENGTH + CELL_LENGTH) as f32 + x_offset,
            (self.row * CELL_LENGTH + CELL_LENGTH / 2) as f32 + y_offset,
        )
    }

    /// Cell containing the provided world-space point.
    #[must_use]
    pub fn from_world(point: WorldPoint) -> Self {
        let half = (CELL_LENGTH / 2) as f32;
        let length = CELL_LENGTH as f32;
        Self {
            column: ((point.x() - half) / length).floor() as i32,
            row: (point.y() / length).floor() as i32,
        }
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the point.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component of the point.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Unique identifier assigned to a segment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SegmentId(u32);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Cadence class assigned to a whole chain at wave start.
///
/// The class feeds the facing and animation-frame derivation consumed by the
/// presentation layer; cell cadence itself rides the shared 16-tick phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedClass {
    /// Standard animation cadence.
    Normal,
    /// Doubled animation cadence used on later waves.
    Fast,
}

/// Visual-effect family attached to a damage event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Impact on an ordinary rock obstacle.
    Rock,
    /// Impact on a totem obstacle.
    Totem,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one discrete tick.
    Tick,
    /// Requests that a fresh chain of segments march in from off-grid.
    SpawnWave {
        /// Zero-based wave number controlling chain length and speed class.
        wave: u32,
    },
    /// Applies damage to the obstacle occupying a cell, if any.
    DamageCell {
        /// Cell targeted by the damage.
        cell: CellCoord,
        /// Health removed from the obstacle.
        amount: i32,
        /// Whether a projectile caused the damage, enabling the totem bonus.
        from_projectile: bool,
    },
    /// Registers a projectile hit against a segment.
    HitSegment {
        /// Identifier of the segment that was struck.
        segment: SegmentId,
    },
    /// Requests creation of an obstacle on an empty cell.
    PlaceObstacle {
        /// Cell the obstacle should occupy.
        cell: CellCoord,
        /// Whether the obstacle is a high-health totem.
        totem: bool,
    },
    /// Updates the tracked player marker used by gating checks.
    SetPlayer {
        /// Player position, or `None` when no player entity exists.
        position: Option<WorldPoint>,
    },
    /// Damages every obstacle overlapping the respawn clearance box.
    ClearRespawnArea {
        /// Centre of the clearance box in world units.
        position: WorldPoint,
    },
}

/// Events broadcast by the world after processing commands.
///
/// These are one-way notifications; the simulation never depends on their
/// consumption succeeding.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Tick index after the advance.
        tick: u64,
    },
    /// Requests a damage visual effect at a world position.
    DamageEffect {
        /// Position of the struck obstacle in world units.
        position: WorldPoint,
        /// Effect family derived from the obstacle's totem flag.
        kind: EffectKind,
    },
    /// Reports a non-lethal impact on an obstacle.
    ObstacleHit {
        /// Cell of the obstacle that absorbed the hit.
        cell: CellCoord,
    },
    /// Reports a lethal impact, or a totem demoted by projectile fire.
    ObstacleDestroyed {
        /// Cell of the obstacle that was destroyed or demoted.
        cell: CellCoord,
        /// Whether the totem variant of the signal fired.
        totem: bool,
    },
    /// Confirms that an obstacle was created on a previously empty cell.
    ObstaclePlaced {
        /// Cell the obstacle now occupies.
        cell: CellCoord,
        /// Whether the new obstacle is a totem.
        totem: bool,
    },
    /// Reports that a segment's health reached zero and it was removed.
    SegmentDestroyed {
        /// Identifier of the removed segment.
        segment: SegmentId,
    },
    /// Carries a score adjustment for the out-of-scope bookkeeping layer.
    ScoreDelta {
        /// Signed score change.
        amount: i32,
    },
    /// Announces that a new chain began marching onto the grid.
    WaveStarted {
        /// Zero-based wave number.
        wave: u32,
        /// Number of segments spawned for the wave.
        segments: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction, SegmentId, SpeedClass, WorldPoint};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn inverse_round_trips_for_all_directions() {
        for direction in Direction::ALL {
            assert_eq!(direction.inverse().inverse(), direction);
        }
    }

    #[test]
    fn direction_indices_match_ranking_order() {
        for (expected, direction) in Direction::ALL.into_iter().enumerate() {
            assert_eq!(direction.index(), expected);
            assert_eq!(Direction::from_index(expected), direction);
        }
    }

    #[test]
    fn step_applies_cardinal_deltas() {
        let origin = CellCoord::new(3, 7);
        assert_eq!(origin.step(Direction::Up), CellCoord::new(3, 6));
        assert_eq!(origin.step(Direction::Right), CellCoord::new(4, 7));
        assert_eq!(origin.step(Direction::Down), CellCoord::new(3, 8));
        assert_eq!(origin.step(Direction::Left), CellCoord::new(2, 7));
    }

    #[test]
    fn bounds_reject_the_spawn_march_cells() {
        assert!(CellCoord::new(0, 0).in_bounds());
        assert!(CellCoord::new(13, 24).in_bounds());
        assert!(!CellCoord::new(-1, 0).in_bounds());
        assert!(!CellCoord::new(14, 0).in_bounds());
        assert!(!CellCoord::new(0, 25).in_bounds());
    }

    #[test]
    fn cell_and_world_coordinates_round_trip() {
        let cell = CellCoord::new(5, 11);
        let centre = cell.to_world(0.0, 0.0);
        assert_eq!(CellCoord::from_world(centre), cell);
    }

    #[test]
    fn world_conversion_matches_reference_layout() {
        let origin = CellCoord::new(0, 0).to_world(0.0, 0.0);
        assert_eq!(origin, WorldPoint::new(32.0, 16.0));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn segment_id_round_trips_through_bincode() {
        assert_round_trip(&SegmentId::new(42));
    }

    #[test]
    fn direction_round_trips_through_bincode() {
        for direction in Direction::ALL {
            assert_round_trip(&direction);
        }
    }

    #[test]
    fn speed_class_round_trips_through_bincode() {
        assert_round_trip(&SpeedClass::Fast);
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        assert_round_trip(&CellCoord::new(-3, 0));
    }
}
