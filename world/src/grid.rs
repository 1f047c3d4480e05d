//! Destructible terrain state owned by the world.

use myriapod_core::{CellCoord, EffectKind, Event, WorldPoint, GRID_COLUMNS, GRID_ROWS};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Health assigned to a freshly raised totem; also the threshold that gates
/// the projectile demotion bonus.
pub(crate) const TOTEM_HEALTH: i32 = 5;

/// Score awarded when a projectile demotes a full-health totem.
pub(crate) const TOTEM_BONUS: i32 = 100;

/// Ticks an undamaged totem survives before it starts decaying.
const TOTEM_DECAY_AGE: u32 = 200;

/// Playfield margin the player may move within, in world units.
const PLAYFIELD_MIN_X: f32 = 40.0;
const PLAYFIELD_MAX_X: f32 = 440.0;
const PLAYFIELD_MIN_Y: f32 = 592.0;
const PLAYFIELD_MAX_Y: f32 = 784.0;

/// Half extents of the player's collision box, in world units.
const PLAYER_HALF_WIDTH: f32 = 18.0;
const PLAYER_HALF_HEIGHT: f32 = 10.0;

/// Half extents of the box cleared around a respawn position.
const CLEARANCE_HALF_WIDTH: f32 = 64.0;
const CLEARANCE_HALF_HEIGHT: f32 = 80.0;

/// Damage applied to each obstacle inside a respawn clearance box.
const CLEARANCE_DAMAGE: i32 = 5;

/// Destructible obstacle occupying a single grid cell.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Obstacle {
    /// Remaining health, 1..=5.
    pub(crate) health: i32,
    /// Health shown to the presentation layer; trails the true value while a
    /// freshly placed rock grows, and is clamped down on damage.
    pub(crate) displayed_health: i32,
    /// Sprite variant drawn at placement time.
    pub(crate) variant: u8,
    /// Whether the obstacle was raised as a totem.
    pub(crate) is_totem: bool,
    /// Ticks since the obstacle was placed.
    pub(crate) age: u32,
}

/// Fixed-size playfield of optional obstacles.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    cells: Vec<Option<Obstacle>>,
}

impl Grid {
    /// Creates an empty grid covering the whole playfield.
    pub(crate) fn new() -> Self {
        Self {
            cells: vec![None; (GRID_COLUMNS * GRID_ROWS) as usize],
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.in_bounds() {
            Some((cell.row() * GRID_COLUMNS + cell.column()) as usize)
        } else {
            None
        }
    }

    /// Obstacle at the provided cell, if any.
    ///
    /// Out-of-range cells read as empty, which lets the ranking logic probe
    /// the off-grid spawn march on row zero without a special case.
    pub(crate) fn obstacle_at(&self, cell: CellCoord) -> Option<&Obstacle> {
        self.index(cell).and_then(|index| self.cells[index].as_ref())
    }

    /// Iterates every live obstacle together with its cell.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellCoord, &Obstacle)> {
        self.cells.iter().enumerate().filter_map(|(index, slot)| {
            let index = index as i32;
            let cell = CellCoord::new(index % GRID_COLUMNS, index / GRID_COLUMNS);
            slot.as_ref().map(|obstacle| (cell, obstacle))
        })
    }

    /// Applies damage to the obstacle at `cell`, if one exists.
    ///
    /// Returns true when the obstacle was destroyed and removed. Signals are
    /// pushed for the out-of-scope audio/score/visual layers: a projectile
    /// striking a full-health totem demotes it for a bonus, damage meeting or
    /// exceeding the remaining health reads as a destruction, and anything
    /// else reads as a plain hit.
    pub(crate) fn damage(
        &mut self,
        cell: CellCoord,
        amount: i32,
        from_projectile: bool,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        let Some(obstacle) = self.cells[index].as_mut() else {
            return false;
        };

        if from_projectile && obstacle.health == TOTEM_HEALTH {
            out_events.push(Event::ObstacleDestroyed { cell, totem: true });
            out_events.push(Event::ScoreDelta {
                amount: TOTEM_BONUS,
            });
        } else if amount > obstacle.health - 1 {
            out_events.push(Event::ObstacleDestroyed { cell, totem: false });
        } else {
            out_events.push(Event::ObstacleHit { cell });
        }

        let kind = if obstacle.is_totem {
            EffectKind::Totem
        } else {
            EffectKind::Rock
        };
        out_events.push(Event::DamageEffect {
            position: cell.to_world(0.0, 0.0),
            kind,
        });

        obstacle.health -= amount;
        obstacle.displayed_health = obstacle.displayed_health.min(obstacle.health);

        if obstacle.health < 1 {
            self.cells[index] = None;
            true
        } else {
            false
        }
    }

    /// Places a new obstacle on an empty in-range cell.
    ///
    /// Placing on an occupied or out-of-range cell is a silent no-op, so the
    /// call is idempotent. Totems start at full health and full display;
    /// rocks draw their health from {3, 4} and grow their display from one.
    pub(crate) fn place(
        &mut self,
        cell: CellCoord,
        totem: bool,
        rng: &mut ChaCha8Rng,
        out_events: &mut Vec<Event>,
    ) {
        let Some(index) = self.index(cell) else {
            return;
        };
        if self.cells[index].is_some() {
            return;
        }

        let (health, displayed_health) = if totem {
            (TOTEM_HEALTH, TOTEM_HEALTH)
        } else {
            (rng.gen_range(3..=4), 1)
        };
        self.cells[index] = Some(Obstacle {
            health,
            displayed_health,
            variant: rng.gen_range(0..4),
            is_totem: totem,
            age: 0,
        });
        out_events.push(Event::ObstaclePlaced { cell, totem });
    }

    /// Advances obstacle timers: display catch-up and totem decay.
    pub(crate) fn tick(&mut self, out_events: &mut Vec<Event>) {
        let mut decaying = Vec::new();
        for (index, slot) in self.cells.iter_mut().enumerate() {
            let Some(obstacle) = slot.as_mut() else {
                continue;
            };
            obstacle.age += 1;
            if obstacle.age % 2 == 1 && obstacle.displayed_health < obstacle.health {
                obstacle.displayed_health += 1;
            }
            if obstacle.health == TOTEM_HEALTH && obstacle.age > TOTEM_DECAY_AGE {
                let index = index as i32;
                decaying.push(CellCoord::new(index % GRID_COLUMNS, index / GRID_COLUMNS));
            }
        }
        for cell in decaying {
            let _ = self.damage(cell, 1, false, out_events);
        }
    }

    /// Reports whether the player could sit at `position` without leaving the
    /// playfield margin or overlapping an obstacle.
    pub(crate) fn allows_player_at(&self, position: WorldPoint) -> bool {
        if position.x() < PLAYFIELD_MIN_X
            || position.x() > PLAYFIELD_MAX_X
            || position.y() < PLAYFIELD_MIN_Y
            || position.y() > PLAYFIELD_MAX_Y
        {
            return false;
        }

        !self.overlaps_box(position, PLAYER_HALF_WIDTH, PLAYER_HALF_HEIGHT)
    }

    /// Reports whether the cell lies inside the player's collision box.
    pub(crate) fn blocks_player(cell: CellCoord, position: WorldPoint) -> bool {
        let (low, high) = box_cells(position, PLAYER_HALF_WIDTH, PLAYER_HALF_HEIGHT);
        cell.column() >= low.column()
            && cell.column() <= high.column()
            && cell.row() >= low.row()
            && cell.row() <= high.row()
    }

    /// Damages every obstacle overlapping the respawn clearance box.
    pub(crate) fn clear_area(&mut self, position: WorldPoint, out_events: &mut Vec<Event>) {
        let (low, high) = box_cells(position, CLEARANCE_HALF_WIDTH, CLEARANCE_HALF_HEIGHT);
        for row in low.row()..=high.row() {
            for column in low.column()..=high.column() {
                let _ = self.damage(
                    CellCoord::new(column, row),
                    CLEARANCE_DAMAGE,
                    false,
                    out_events,
                );
            }
        }
    }

    fn overlaps_box(&self, position: WorldPoint, half_width: f32, half_height: f32) -> bool {
        let (low, high) = box_cells(position, half_width, half_height);
        for row in low.row()..=high.row() {
            for column in low.column()..=high.column() {
                if self.obstacle_at(CellCoord::new(column, row)).is_some() {
                    return true;
                }
            }
        }
        false
    }
}

fn box_cells(position: WorldPoint, half_width: f32, half_height: f32) -> (CellCoord, CellCoord) {
    let low = CellCoord::from_world(WorldPoint::new(
        position.x() - half_width,
        position.y() - half_height,
    ));
    let high = CellCoord::from_world(WorldPoint::new(
        position.x() + half_width,
        position.y() + half_height,
    ));
    (low, high)
}
