//! Segment locomotion: ranked exit selection and sub-cell interpolation.
//!
//! Every segment traverses one cell per 16-tick phase window shared across
//! the whole simulation. Phase 0 advances the logical cell, phase 4 commits
//! the next exit direction through a seven-criterion ranking, and every tick
//! derives a continuous world position from the phase, the entry edge, and
//! the committed exit edge.

use myriapod_core::{
    CellCoord, Direction, Event, SegmentId, SpeedClass, WorldPoint, CELL_LENGTH, GRID_COLUMNS,
    GRID_ROWS,
};

use crate::grid::Grid;
use crate::occupancy::OccupancyFrame;

/// Ticks a segment spends crossing a single cell.
pub(crate) const PHASE_TICKS: u64 = 16;

/// Phase at which the logical cell position advances.
const CELL_ADVANCE_PHASE: u64 = 0;

/// Phase at which the next exit direction is ranked and committed.
const EXIT_COMMIT_PHASE: u64 = 4;

/// Row segments may not climb above while a player is in the simulation.
const PLAYER_CEILING_ROW: i32 = 18;

/// Damage a segment applies to the obstacle on its committed destination.
const BULLDOZE_DAMAGE: i32 = 5;

/// Sideways speed per phase while turning, in half-step units.
const SECONDARY_AXIS_SPEED: [i32; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1];

/// Cumulative sideways progress per phase, prefix sums of the speed table.
const SECONDARY_AXIS_POSITIONS: [i32; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7];

/// Rotation from the segment's local frame into world space, keyed on the
/// entry edge. Row layout is `[xx, xy, yx, yy]`.
const ROTATIONS: [[i32; 4]; 4] = [
    [0, -1, 1, 0],
    [-1, 0, 0, -1],
    [0, 1, -1, 0],
    [1, 0, 0, 1],
];

/// Mutable locomotion state of a single segment.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SegmentState {
    /// Identifier allocated by the world.
    pub(crate) id: SegmentId,
    /// Logical cell occupied before the next phase-0 advance.
    pub(crate) cell: CellCoord,
    /// Remaining health: 2 is pristine, 1 is damaged.
    pub(crate) health: i32,
    /// Animation cadence class assigned at wave start.
    pub(crate) speed: SpeedClass,
    /// Whether the segment leads its chain.
    pub(crate) is_head: bool,
    /// Edge the segment entered its current cell through.
    pub(crate) in_edge: Direction,
    /// Edge the segment committed to exit through.
    pub(crate) out_edge: Direction,
    /// Direction barred near the grid's boundary rows.
    pub(crate) disallowed: Option<Direction>,
    /// Most recent horizontal exit, biasing continued drift.
    pub(crate) previous_horizontal: Direction,
}

/// Immutable snapshot of everything the exit ranking reads.
///
/// Ranking stays free of side effects: the world hands this snapshot to
/// [`select_exit`] and applies the winner afterwards.
pub(crate) struct RankContext<'a> {
    pub(crate) cell: CellCoord,
    pub(crate) in_edge: Direction,
    pub(crate) disallowed: Option<Direction>,
    pub(crate) previous_horizontal: Direction,
    pub(crate) grid: &'a Grid,
    pub(crate) occupancy: &'a OccupancyFrame,
}

/// Penalty tuple ranked lexicographically; earlier criteria dominate and
/// `true` always reads as worse.
type Penalties = (bool, bool, bool, bool, bool, bool, bool);

/// Ranks one candidate exit direction against the seven penalty criteria.
pub(crate) fn rank_exit(context: &RankContext<'_>, proposed: Direction) -> Penalties {
    let destination = context.cell.step(proposed);

    let out_of_bounds = !destination.in_bounds();
    let reverses_entry = proposed == context.in_edge;
    let direction_disallowed = context.disallowed == Some(proposed);
    let destination_claimed = context.occupancy.is_cell_claimed(destination)
        || context
            .occupancy
            .is_edge_claimed(destination, proposed.inverse());
    let obstacle_present = context.grid.obstacle_at(destination).is_some();
    let axis_blocked = if obstacle_present {
        proposed.is_horizontal()
    } else {
        !proposed.is_horizontal()
    };
    let breaks_drift = proposed != context.previous_horizontal;

    (
        out_of_bounds,
        reverses_entry,
        direction_disallowed,
        destination_claimed,
        obstacle_present,
        axis_blocked,
        breaks_drift,
    )
}

/// Selects the exit with the smallest penalty tuple.
///
/// Ties resolve to the earliest direction in enumeration order, and a
/// minimum always exists, so selection terminates even when every candidate
/// carries penalties.
pub(crate) fn select_exit(context: &RankContext<'_>) -> Direction {
    let mut best = Direction::Up;
    let mut best_penalties = rank_exit(context, best);

    for candidate in [Direction::Right, Direction::Down, Direction::Left] {
        let penalties = rank_exit(context, candidate);
        if penalties < best_penalties {
            best = candidate;
            best_penalties = penalties;
        }
    }

    best
}

/// Advances one segment by one tick.
///
/// Claims recorded here are immediately visible to segments stepped later in
/// the same tick, so the caller must iterate segments in a stable order.
pub(crate) fn step_segment(
    segment: &mut SegmentState,
    tick: u64,
    grid: &mut Grid,
    occupancy: &mut OccupancyFrame,
    player_present: bool,
    out_events: &mut Vec<Event>,
) {
    let phase = tick % PHASE_TICKS;

    if phase == CELL_ADVANCE_PHASE {
        segment.cell = segment.cell.step(segment.out_edge);
        segment.in_edge = segment.out_edge.inverse();

        let ceiling = if player_present { PLAYER_CEILING_ROW } else { 0 };
        if segment.cell.row() == ceiling {
            segment.disallowed = Some(Direction::Up);
        }
        if segment.cell.row() == GRID_ROWS - 1 {
            segment.disallowed = Some(Direction::Down);
        }
    } else if phase == EXIT_COMMIT_PHASE {
        let exit = {
            let context = RankContext {
                cell: segment.cell,
                in_edge: segment.in_edge,
                disallowed: segment.disallowed,
                previous_horizontal: segment.previous_horizontal,
                grid,
                occupancy,
            };
            select_exit(&context)
        };

        segment.out_edge = exit;
        if exit.is_horizontal() {
            segment.previous_horizontal = exit;
        }

        let destination = segment.cell.step(exit);
        if destination.column() >= 0 && destination.column() < GRID_COLUMNS {
            let _ = grid.damage(destination, BULLDOZE_DAMAGE, false, out_events);
        }
        occupancy.claim(segment.cell, exit);
    }
}

/// Quarter-turns from the entry heading to the committed exit: 0 straight,
/// 1 right turn, 3 left turn. 2 would be a reversal, which ranking excludes.
pub(crate) fn turn_index(in_edge: Direction, out_edge: Direction) -> usize {
    (out_edge.index() + 4 - in_edge.inverse().index()) % 4
}

/// Continuous world position of a segment at the provided tick.
///
/// Offsets are built in a local frame whose x-axis follows the entry heading
/// and whose y-axis points a quarter-turn clockwise, then rotated into world
/// space by the entry-edge matrix and added to the cell's base position.
pub(crate) fn world_position(segment: &SegmentState, tick: u64) -> WorldPoint {
    let phase = (tick % PHASE_TICKS) as i32;
    let half = CELL_LENGTH / 2;
    let along = -half + 2 * phase;

    let (local_x, local_y) = match turn_index(segment.in_edge, segment.out_edge) {
        0 => (along, 0),
        1 => (along.min(0), 2 * SECONDARY_AXIS_POSITIONS[phase as usize]),
        3 => (along.min(0), -2 * SECONDARY_AXIS_POSITIONS[phase as usize]),
        _ => (along.min(0), 0),
    };

    let rotation = ROTATIONS[segment.in_edge.index()];
    let world_x = rotation[0] * local_x + rotation[1] * local_y;
    let world_y = rotation[2] * local_x + rotation[3] * local_y;
    segment.cell.to_world(world_x as f32, world_y as f32)
}

/// Direction the segment visually faces at the provided tick.
///
/// Straight runs face the entry heading throughout; turns swing toward the
/// committed exit once the sideways half of the traversal begins.
pub(crate) fn facing(segment: &SegmentState, tick: u64) -> Direction {
    let phase = (tick % PHASE_TICKS) as usize;
    let turning = turn_index(segment.in_edge, segment.out_edge) != 0;
    if turning && SECONDARY_AXIS_SPEED[phase] != 0 {
        segment.out_edge
    } else {
        segment.in_edge.inverse()
    }
}

/// Animation frame exposed to the presentation layer.
pub(crate) fn animation_frame(speed: SpeedClass, tick: u64) -> u8 {
    let rate = match speed {
        SpeedClass::Normal => 1,
        SpeedClass::Fast => 2,
    };
    ((tick * rate / 4) % 4) as u8
}
