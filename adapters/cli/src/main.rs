#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Myriapod simulation headless.
//!
//! The adapter owns everything the core treats as external glue: the tick
//! loop, the chain coordinator, projectile flight, and a running digest of
//! the event stream. Given the same seed and flags, two runs print the same
//! digest.

use anyhow::{ensure, Result};
use clap::Parser;
use myriapod_core::{Command, Event, WorldPoint};
use myriapod_system_chain::ChainCoordinator;
use myriapod_system_combat::{Combat, ProjectileSnapshot};
use myriapod_world::{self as world, query, World};

/// Respawn anchor of the player marker, matching the playfield centre-bottom.
const PLAYER_SPAWN: WorldPoint = WorldPoint::new(240.0, 768.0);

/// World units a projectile climbs per tick.
const PROJECTILE_SPEED: f32 = 24.0;

/// Ticks between probe shots while the player marker is active.
const FIRE_INTERVAL: u64 = 10;

#[derive(Debug, Parser)]
#[command(name = "myriapod", about = "Headless Myriapod simulation runner")]
struct Args {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 960)]
    ticks: u64,

    /// Seed for the obstacle draws.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Track a player marker and fire probe projectiles from it.
    #[arg(long)]
    player: bool,
}

#[derive(Clone, Copy, Debug)]
struct Projectile {
    position: WorldPoint,
}

#[derive(Debug, Default)]
struct EventTally {
    waves: u32,
    score: i64,
    obstacles_placed: u32,
    obstacles_destroyed: u32,
    segments_destroyed: u32,
}

impl EventTally {
    fn absorb(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WaveStarted { .. } => self.waves += 1,
                Event::ScoreDelta { amount } => self.score += i64::from(*amount),
                Event::ObstaclePlaced { .. } => self.obstacles_placed += 1,
                Event::ObstacleDestroyed { .. } => self.obstacles_destroyed += 1,
                Event::SegmentDestroyed { .. } => self.segments_destroyed += 1,
                _ => {}
            }
        }
    }
}

/// Entry point for the Myriapod command-line runner.
fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.ticks > 0, "tick count must be positive");

    let mut world = World::with_seed(args.seed);
    let mut chain = ChainCoordinator::new();
    let mut combat = Combat::new();
    let mut projectiles: Vec<Projectile> = Vec::new();
    let mut tally = EventTally::default();

    if args.player {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::SetPlayer {
                position: Some(PLAYER_SPAWN),
            },
            &mut events,
        );
    }

    for _ in 0..args.ticks {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick, &mut events);

        let mut commands = Vec::new();
        chain.handle(&events, &query::segment_view(&world), &mut commands);

        if args.player {
            advance_projectiles(&mut projectiles);
            if query::tick(&world) % FIRE_INTERVAL == 0 {
                projectiles.push(Projectile {
                    position: WorldPoint::new(PLAYER_SPAWN.x(), PLAYER_SPAWN.y() - 8.0),
                });
            }

            let snapshots: Vec<ProjectileSnapshot> = projectiles
                .iter()
                .map(|projectile| ProjectileSnapshot {
                    position: projectile.position,
                })
                .collect();
            let mut impacts = Vec::new();
            combat.handle(
                &snapshots,
                &query::grid_view(&world),
                &query::segment_view(&world),
                &mut commands,
                &mut impacts,
            );
            for impact in impacts.iter().rev() {
                if impact.consumed {
                    let _ = projectiles.remove(impact.projectile);
                }
            }
        }

        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        tally.absorb(&events);
    }

    println!("ticks simulated:     {}", query::tick(&world));
    println!("waves started:       {}", tally.waves);
    println!("segments destroyed:  {}", tally.segments_destroyed);
    println!("obstacles placed:    {}", tally.obstacles_placed);
    println!("obstacles destroyed: {}", tally.obstacles_destroyed);
    println!("score:               {}", tally.score);
    println!("segments alive:      {}", query::segment_view(&world).len());
    println!("obstacles alive:     {}", query::grid_view(&world).len());

    Ok(())
}

fn advance_projectiles(projectiles: &mut Vec<Projectile>) {
    for projectile in projectiles.iter_mut() {
        projectile.position = WorldPoint::new(
            projectile.position.x(),
            projectile.position.y() - PROJECTILE_SPEED,
        );
    }
    projectiles.retain(|projectile| projectile.position.y() > 0.0);
}
