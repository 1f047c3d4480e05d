#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves projectile overlaps into damage commands.
//!
//! The projectile entities themselves live in the adapter layer; this system
//! only maps their positions onto the world's terrain and segments, emitting
//! one command per resolved collision and reporting which projectiles were
//! consumed. Obstacle checks run before segment checks, and exactly one
//! collision resolves per projectile per call.

use myriapod_core::{CellCoord, Command, SegmentId, WorldPoint, CELL_LENGTH};
use myriapod_world::query::{GridView, SegmentView};

/// Health removed from an obstacle or segment by one projectile.
const PROJECTILE_DAMAGE: i32 = 1;

/// Half extent of a segment's square collision box, in world units.
const SEGMENT_HALF_EXTENT: f32 = (CELL_LENGTH / 2) as f32;

/// Position of one projectile at resolution time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// World-space position of the projectile.
    pub position: WorldPoint,
}

/// What a projectile struck, if anything.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImpactTarget {
    /// The projectile's cell held an obstacle.
    Obstacle {
        /// Cell of the struck obstacle.
        cell: CellCoord,
        /// Whether this hit removes the obstacle from the grid.
        destroyed: bool,
    },
    /// The projectile overlapped a segment's collision box.
    Segment {
        /// Identifier of the struck segment.
        segment: SegmentId,
    },
}

/// Resolution record for one projectile, indexed into the input slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    /// Index of the projectile within the slice passed to `handle`.
    pub projectile: usize,
    /// Whether the projectile should be despawned by its owner.
    pub consumed: bool,
    /// What the projectile struck.
    pub target: ImpactTarget,
}

/// Collision resolver that queues damage commands for overlapping projectiles.
#[derive(Debug, Default)]
pub struct Combat {
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a new combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every projectile against the provided views.
    ///
    /// A projectile whose cell holds an obstacle damages it and is consumed
    /// only when the hit destroys it; otherwise the first segment whose box
    /// contains the projectile point is hit and the projectile is always
    /// consumed. Scanning stops at the first match.
    pub fn handle(
        &mut self,
        projectiles: &[ProjectileSnapshot],
        grid_view: &GridView,
        segment_view: &SegmentView,
        out: &mut Vec<Command>,
        out_impacts: &mut Vec<Impact>,
    ) {
        self.scratch.clear();

        for (index, projectile) in projectiles.iter().enumerate() {
            let cell = CellCoord::from_world(projectile.position);

            if let Some(obstacle) = grid_view.obstacle_at(cell) {
                self.scratch.push(Command::DamageCell {
                    cell,
                    amount: PROJECTILE_DAMAGE,
                    from_projectile: true,
                });
                out_impacts.push(Impact {
                    projectile: index,
                    consumed: obstacle.health <= PROJECTILE_DAMAGE,
                    target: ImpactTarget::Obstacle {
                        cell,
                        destroyed: obstacle.health <= PROJECTILE_DAMAGE,
                    },
                });
                continue;
            }

            if let Some(segment) = segment_view
                .iter()
                .find(|segment| contains(segment.position, projectile.position))
            {
                self.scratch.push(Command::HitSegment {
                    segment: segment.id,
                });
                out_impacts.push(Impact {
                    projectile: index,
                    consumed: true,
                    target: ImpactTarget::Segment {
                        segment: segment.id,
                    },
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn contains(centre: WorldPoint, point: WorldPoint) -> bool {
    (point.x() - centre.x()).abs() <= SEGMENT_HALF_EXTENT
        && (point.y() - centre.y()).abs() <= SEGMENT_HALF_EXTENT
}
