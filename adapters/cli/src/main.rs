#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a headless Lane Rush session.
//!
//! Stands in for the game engine: it owns the tick loop, integrates a toy
//! straight-line motion model for active vehicles, and synthesizes boundary
//! sensor reports when a vehicle travels past the configured exit distance.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rand::Rng;

use lane_rush_core::{
    Command, Event, GameFlow, PoolTemplateConfig, RoundPlan, SensorId, SensorReport, TemplateId,
    VehicleId,
};
use lane_rush_system_assignment::{Assignment, Config as AssignmentConfig};
use lane_rush_system_gateway::{Config as GatewayConfig, Gateway, NonMemberPolicy};
use lane_rush_system_scheduling::{Config as SchedulingConfig, Scheduler};
use lane_rush_world::{self as world, query, World};

const EXIT_SENSOR: SensorId = SensorId::new(0);

#[derive(Debug, Parser)]
#[command(name = "lane-rush", about = "Headless Lane Rush session driver")]
struct Args {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Seed for lane and vehicle-type resolution. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Spawn continuously instead of running the round plans.
    #[arg(long)]
    continuous: bool,

    /// Wrap back to the first round after the last one completes.
    #[arg(long)]
    loop_rounds: bool,

    /// Watchdog deadline in seconds while waiting for returns.
    #[arg(long, default_value_t = 60)]
    watchdog_secs: u64,

    /// Travel distance at which a vehicle trips the exit sensor.
    #[arg(long, default_value_t = 40.0)]
    exit_distance: f32,
}

struct SessionFlow {
    finished: bool,
}

impl GameFlow for SessionFlow {
    fn all_rounds_completed(&mut self) {
        self.finished = true;
        log::info!("all rounds completed");
    }
}

/// Entry point for the Lane Rush command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    log::info!("session seed {seed}");

    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigurePool {
            templates: vec![
                PoolTemplateConfig {
                    template: TemplateId::new(0),
                    initial_size: 4,
                    expandable: true,
                    cruise_speed: 10.0,
                },
                PoolTemplateConfig {
                    template: TemplateId::new(1),
                    initial_size: 2,
                    expandable: true,
                    cruise_speed: 16.0,
                },
                PoolTemplateConfig {
                    template: TemplateId::new(2),
                    initial_size: 2,
                    expandable: false,
                    cruise_speed: 6.0,
                },
            ],
        },
        &mut events,
    );
    world::apply(&mut world, Command::RegisterScenery, &mut events);
    events.clear();

    let scheduling = SchedulingConfig::default()
        .with_looping(args.loop_rounds)
        .with_watchdog_timeout(Duration::from_secs(args.watchdog_secs))
        .with_inter_round_delay(Duration::from_secs(2));
    let assignment = Assignment::new(AssignmentConfig::new(seed));
    let mut scheduler = if args.continuous {
        Scheduler::continuous(assignment, scheduling)
    } else {
        Scheduler::rounds(&demo_plans(), assignment, scheduling)
    };
    if scheduler.is_round_mode() {
        log::info!(
            "level carries {} vehicles across {} rounds",
            scheduler.total_vehicles_for_level(),
            demo_plans().len()
        );
    }

    let mut gateway = Gateway::new(GatewayConfig::new(NonMemberPolicy::Ignore));
    let mut flow = SessionFlow { finished: false };
    let mut positions: HashMap<VehicleId, (f32, f32)> = HashMap::new();

    let dt = Duration::from_millis(args.tick_ms);
    for tick in 0..args.ticks {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        pump(&mut world, &mut scheduler, &mut flow, events);

        let reports = integrate_motion(&world, &mut positions, dt, args.exit_distance);
        if !reports.is_empty() {
            let mut commands = Vec::new();
            gateway.handle(&reports, query::body_index(&world), &mut commands);
            let mut events = Vec::new();
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
            for event in &events {
                if let Event::VehicleReturned { vehicle, .. } = event {
                    let _ = positions.remove(vehicle);
                }
            }
            pump(&mut world, &mut scheduler, &mut flow, events);
        }

        if tick % 10 == 9 {
            if let Some(info) = scheduler.current_round_info() {
                log::info!(
                    "round {}/{}: spawned {}, awaiting {} returns, {} active",
                    info.index + 1,
                    info.total,
                    info.spawned_in_round,
                    info.pending_returns,
                    query::pool_view(&world).active_total(),
                );
            }
        }

        if flow.finished {
            break;
        }
    }

    let pool = query::pool_view(&world);
    println!(
        "session over: {} vehicles still out, {} pool growth events",
        pool.active_total(),
        pool.growth_events()
    );
    Ok(())
}

fn demo_plans() -> Vec<RoundPlan> {
    vec![
        RoundPlan::new("warmup", 4, Duration::from_secs(2)),
        RoundPlan::new("rush", 8, Duration::from_secs(1)),
        RoundPlan::new("finale", 6, Duration::from_millis(1500)),
    ]
}

/// Feeds events through the scheduler and applies the commands it answers
/// with, repeating until the exchange quiesces.
fn pump(world: &mut World, scheduler: &mut Scheduler, flow: &mut SessionFlow, events: Vec<Event>) {
    let mut events = events;
    loop {
        if events.is_empty() {
            break;
        }
        let pool = query::pool_view(world);
        let mut commands = Vec::new();
        scheduler.handle(&events, &pool, flow, &mut commands);
        if commands.is_empty() {
            break;
        }
        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}

/// Advances every active vehicle along its commanded direction from the
/// origin and reports the ones past the exit distance on either axis.
fn integrate_motion(
    world: &World,
    positions: &mut HashMap<VehicleId, (f32, f32)>,
    dt: Duration,
    exit_distance: f32,
) -> Vec<SensorReport> {
    let mut reports = Vec::new();
    for snapshot in query::vehicle_view(world).iter() {
        if !snapshot.active || !snapshot.enabled {
            continue;
        }
        let (x, y) = positions.entry(snapshot.id).or_insert((0.0, 0.0));
        let step = snapshot.speed * dt.as_secs_f32();
        *x += snapshot.direction.x() * step;
        *y += snapshot.direction.y() * step;
        if x.abs().max(y.abs()) >= exit_distance {
            reports.push(SensorReport {
                sensor: EXIT_SENSOR,
                body: snapshot.root_body,
            });
        }
    }
    reports
}
