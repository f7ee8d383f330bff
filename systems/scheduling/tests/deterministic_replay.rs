use std::time::Duration;

use lane_rush_core::{
    Command, Event, GameFlow, KindAssignment, LaneAssignment, PoolTemplateConfig, RoundPlan,
    TemplateId, VehicleId,
};
use lane_rush_system_assignment::{Assignment, Config as AssignmentConfig};
use lane_rush_system_scheduling::{Config, Scheduler};
use lane_rush_world::{self as world, query, World};

struct SilentFlow;

impl GameFlow for SilentFlow {
    fn all_rounds_completed(&mut self) {}
}

fn pump(world: &mut World, scheduler: &mut Scheduler, events: Vec<Event>, log: &mut Vec<Command>) {
    let mut flow = SilentFlow;
    let mut events = events;
    loop {
        if events.is_empty() {
            break;
        }
        let pool = query::pool_view(world);
        let mut commands = Vec::new();
        scheduler.handle(&events, &pool, &mut flow, &mut commands);
        if commands.is_empty() {
            break;
        }
        events.clear();
        for command in commands {
            log.push(command.clone());
            world::apply(world, command, &mut events);
        }
    }
}

fn lowest_active(world: &World) -> Option<VehicleId> {
    query::vehicle_view(world)
        .iter()
        .filter(|snapshot| snapshot.active)
        .map(|snapshot| snapshot.id)
        .min()
}

/// Drives a scripted session with randomized assignments and returns every
/// command the scheduler emitted plus the final vehicle occupancy.
fn replay(seed: u64) -> (Vec<Command>, Vec<(u32, bool)>) {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigurePool {
            templates: vec![
                PoolTemplateConfig {
                    template: TemplateId::new(0),
                    initial_size: 2,
                    expandable: true,
                    cruise_speed: 8.0,
                },
                PoolTemplateConfig {
                    template: TemplateId::new(1),
                    initial_size: 2,
                    expandable: true,
                    cruise_speed: 14.0,
                },
            ],
        },
        &mut events,
    );

    let plans = vec![
        RoundPlan::new("mixed", 4, Duration::from_secs(1))
            .with_lanes(vec![LaneAssignment::Random])
            .with_kinds(vec![KindAssignment::Random]),
        RoundPlan::new("tail", 2, Duration::from_secs(2))
            .with_kinds(vec![KindAssignment::Fixed(TemplateId::new(0))]),
    ];
    let mut scheduler = Scheduler::rounds(
        &plans,
        Assignment::new(AssignmentConfig::new(seed)),
        Config::default().with_inter_round_delay(Duration::from_secs(1)),
    );

    let mut log = Vec::new();
    for step in 0..24 {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut events,
        );
        pump(&mut world, &mut scheduler, events, &mut log);

        // Return the oldest active vehicle every third step.
        if step % 3 == 2 {
            if let Some(vehicle) = lowest_active(&world) {
                let mut events = Vec::new();
                world::apply(&mut world, Command::ReleaseVehicle { vehicle }, &mut events);
                pump(&mut world, &mut scheduler, events, &mut log);
            }
        }
    }

    let occupancy = query::vehicle_view(&world)
        .iter()
        .map(|snapshot| (snapshot.id.get(), snapshot.active))
        .collect();
    (log, occupancy)
}

#[test]
fn identical_seeds_replay_identically() {
    let first = replay(0xfeed_f00d);
    let second = replay(0xfeed_f00d);
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert!(
        !first.0.is_empty(),
        "the scripted session must actually spawn"
    );
}

#[test]
fn different_seeds_share_the_command_shape() {
    let (first, _) = replay(1);
    let (second, _) = replay(2);
    // Randomized assignments may pick different lanes and templates, but the
    // number of spawn requests is fixed by the round plans and the script.
    let spawns = |log: &[Command]| {
        log.iter()
            .filter(|command| matches!(command, Command::SpawnVehicle { .. }))
            .count()
    };
    assert_eq!(spawns(&first), spawns(&second));
}
