#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that starts a fresh wave once the previous chain is gone.
//!
//! Wave starts are aligned with phase zero of the 16-tick traversal window so
//! that arriving segments pick up the shared cadence cleanly. Chain
//! composition itself (length, head flag, speed class, entry edges) is
//! resolved by the world when it applies the emitted `SpawnWave` command.

use myriapod_core::{Command, Event};
use myriapod_world::query::SegmentView;

/// Ticks per cell traversal; wave starts align with this cadence.
const PHASE_TICKS: u64 = 16;

/// Coordinator that emits `SpawnWave` commands between chains.
#[derive(Debug, Default)]
pub struct ChainCoordinator {
    next_wave: u32,
}

impl ChainCoordinator {
    /// Creates a coordinator that will start counting from wave zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wave number the coordinator will request next.
    #[must_use]
    pub const fn next_wave(&self) -> u32 {
        self.next_wave
    }

    /// Consumes events and the segment view to emit spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        segment_view: &SegmentView,
        out: &mut Vec<Command>,
    ) {
        if !segment_view.is_empty() {
            return;
        }

        for event in events {
            if let Event::TimeAdvanced { tick } = event {
                if tick % PHASE_TICKS == 0 {
                    out.push(Command::SpawnWave {
                        wave: self.next_wave,
                    });
                    self.next_wave += 1;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myriapod_world::{self as world, query, World};

    fn run_tick(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(world, Command::Tick, &mut events);
        events
    }

    #[test]
    fn first_wave_starts_on_a_phase_boundary() {
        let mut world = World::new();
        let mut coordinator = ChainCoordinator::new();

        for expected_tick in 1..=16u64 {
            let events = run_tick(&mut world);
            let mut commands = Vec::new();
            coordinator.handle(&events, &query::segment_view(&world), &mut commands);

            if expected_tick % 16 == 0 {
                assert_eq!(commands, vec![Command::SpawnWave { wave: 0 }]);
            } else {
                assert!(commands.is_empty(), "spawned off-cadence at {expected_tick}");
            }
        }

        assert_eq!(coordinator.next_wave(), 1);
    }

    #[test]
    fn no_spawn_while_a_chain_is_alive() {
        let mut world = World::new();
        let mut coordinator = ChainCoordinator::new();
        let mut events = Vec::new();
        world::apply(&mut world, Command::SpawnWave { wave: 0 }, &mut events);

        for _ in 0..64 {
            let events = run_tick(&mut world);
            let mut commands = Vec::new();
            coordinator.handle(&events, &query::segment_view(&world), &mut commands);
            assert!(commands.is_empty());
        }
    }

    #[test]
    fn waves_are_numbered_consecutively() {
        let mut world = World::new();
        let mut coordinator = ChainCoordinator::new();

        // Drive two full wave cycles, exterminating each chain by hand.
        for expected_wave in 0..2u32 {
            let mut spawned = false;
            for _ in 0..32 {
                let events = run_tick(&mut world);
                let mut commands = Vec::new();
                coordinator.handle(&events, &query::segment_view(&world), &mut commands);
                for command in commands {
                    assert_eq!(
                        command,
                        Command::SpawnWave {
                            wave: expected_wave
                        }
                    );
                    let mut spawn_events = Vec::new();
                    world::apply(&mut world, command, &mut spawn_events);
                    spawned = true;
                }
                if spawned {
                    break;
                }
            }
            assert!(spawned, "wave {expected_wave} never started");

            let ids: Vec<_> = query::segment_view(&world)
                .iter()
                .map(|segment| segment.id)
                .collect();
            let mut events = Vec::new();
            for id in ids {
                world::apply(&mut world, Command::HitSegment { segment: id }, &mut events);
                world::apply(&mut world, Command::HitSegment { segment: id }, &mut events);
            }
            assert!(query::segment_view(&world).is_empty());
        }

        assert_eq!(coordinator.next_wave(), 2);
    }
}
