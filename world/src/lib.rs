#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Lane Rush.
//!
//! The world owns the vehicle pool, the body index used to resolve sensor
//! contacts, and the scenery registry. All mutation flows through [`apply`];
//! all inspection flows through the [`query`] module.

use std::collections::{BTreeMap, HashMap};

use lane_rush_core::{BodyId, Command, Event, ReturnCause, VehicleId};

mod pool;

use pool::{BodyIdAllocator, VehiclePool};

/// Represents the authoritative Lane Rush world state.
#[derive(Debug, Default)]
pub struct World {
    pool: VehiclePool,
    attachments: HashMap<BodyId, VehicleId>,
    scenery: BTreeMap<BodyId, bool>,
    bodies: BodyIdAllocator,
    tick_index: u64,
}

impl World {
    /// Creates a new Lane Rush world with an empty pool, ready for
    /// configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::ConfigurePool { templates } => {
            world.pool.configure(&templates, &mut world.bodies);
            world.attachments.clear();
        }
        Command::RegisterScenery => {
            let body = world.bodies.allocate();
            let _ = world.scenery.insert(body, true);
            out_events.push(Event::SceneryRegistered { body });
        }
        Command::AttachPart { vehicle } => {
            if world.pool.is_member(vehicle) {
                let part = world.bodies.allocate();
                let _ = world.attachments.insert(part, vehicle);
                out_events.push(Event::PartAttached { vehicle, part });
            }
        }
        Command::SpawnVehicle { template, lane } => {
            match world.pool.acquire(template, &mut world.bodies) {
                Some(outcome) => {
                    if let Some(capacity) = outcome.grew_to {
                        out_events.push(Event::PoolGrew { template, capacity });
                    }
                    world.pool.launch(outcome.vehicle, lane);
                    out_events.push(Event::VehicleSpawned {
                        vehicle: outcome.vehicle,
                        template,
                        lane,
                    });
                }
                None => out_events.push(Event::SpawnSkipped { template }),
            }
        }
        Command::ReleaseVehicle { vehicle } => {
            if world.pool.release(vehicle) {
                out_events.push(Event::VehicleReturned {
                    vehicle,
                    cause: ReturnCause::Exit,
                });
            }
        }
        Command::ReclaimActive => {
            for vehicle in world.pool.reclaim_active() {
                out_events.push(Event::VehicleReturned {
                    vehicle,
                    cause: ReturnCause::Reclaimed,
                });
            }
        }
        Command::DeactivateBody { body } => {
            if let Some(enabled) = world.scenery.get_mut(&body) {
                *enabled = false;
                out_events.push(Event::BodyDeactivated { body });
            }
        }
        Command::DespawnBody { body } => {
            if world.scenery.remove(&body).is_some() {
                out_events.push(Event::BodyDespawned { body });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use lane_rush_core::{BodyId, Lane, TemplateId, Vec2, VehicleId};

    use super::World;

    /// Captures a read-only view of all pooled vehicles.
    #[must_use]
    pub fn vehicle_view(world: &World) -> VehicleView {
        let mut snapshots: Vec<VehicleSnapshot> = world
            .pool
            .vehicles()
            .map(|vehicle| VehicleSnapshot {
                id: vehicle.id,
                template: vehicle.template,
                root_body: vehicle.root_body,
                lane: vehicle.lane,
                active: vehicle.active,
                direction: vehicle.motor.direction(),
                speed: vehicle.motor.speed(),
                enabled: vehicle.motor.enabled(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        VehicleView { snapshots }
    }

    /// Captures per-bucket occupancy counters for the vehicle pool.
    #[must_use]
    pub fn pool_view(world: &World) -> PoolView {
        let buckets = world
            .pool
            .buckets()
            .iter()
            .map(|bucket| PoolBucketSnapshot {
                template: bucket.template,
                capacity: bucket.vehicles.len() as u32,
                active: bucket.vehicles.iter().filter(|entry| entry.active).count() as u32,
                expandable: bucket.expandable,
            })
            .collect();
        PoolView {
            buckets,
            growth_events: world.pool.growth_events(),
        }
    }

    /// Exposes the body index used to resolve sensor contacts.
    #[must_use]
    pub fn body_index(world: &World) -> BodyIndexView<'_> {
        BodyIndexView { world }
    }

    /// Number of growth events recorded by the pool since configuration.
    /// Uncontrolled growth indicates a leak upstream.
    #[must_use]
    pub fn growth_events(world: &World) -> u64 {
        world.pool.growth_events()
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_count(world: &World) -> u64 {
        world.tick_index
    }

    /// Read-only snapshot describing all pooled vehicles.
    #[derive(Clone, Debug)]
    pub struct VehicleView {
        snapshots: Vec<VehicleSnapshot>,
    }

    impl VehicleView {
        /// Iterator over the captured snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &VehicleSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<VehicleSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single pooled vehicle.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct VehicleSnapshot {
        /// Unique identifier assigned to the vehicle.
        pub id: VehicleId,
        /// Template the vehicle was built from.
        pub template: TemplateId,
        /// Root body the vehicle occupies in the physics world.
        pub root_body: BodyId,
        /// Lane the vehicle currently travels in, if active.
        pub lane: Option<Lane>,
        /// Whether the vehicle is currently out in the world.
        pub active: bool,
        /// Travel direction last commanded through the motor interface.
        pub direction: Vec2,
        /// Travel speed last commanded through the motor interface.
        pub speed: f32,
        /// Whether the vehicle's movement behaviour is enabled.
        pub enabled: bool,
    }

    /// Read-only occupancy counters for the vehicle pool.
    #[derive(Clone, Debug)]
    pub struct PoolView {
        buckets: Vec<PoolBucketSnapshot>,
        growth_events: u64,
    }

    impl PoolView {
        /// Iterator over the captured bucket snapshots.
        pub fn iter(&self) -> impl Iterator<Item = &PoolBucketSnapshot> {
            self.buckets.iter()
        }

        /// Templates the pool currently serves, in bucket order.
        #[must_use]
        pub fn templates(&self) -> Vec<TemplateId> {
            self.buckets.iter().map(|bucket| bucket.template).collect()
        }

        /// Total number of vehicles currently out in the world.
        #[must_use]
        pub fn active_total(&self) -> u32 {
            self.buckets.iter().map(|bucket| bucket.active).sum()
        }

        /// Number of growth events recorded since configuration.
        #[must_use]
        pub const fn growth_events(&self) -> u64 {
            self.growth_events
        }
    }

    /// Occupancy counters for a single pool bucket.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PoolBucketSnapshot {
        /// Template the bucket serves.
        pub template: TemplateId,
        /// Number of vehicle instances owned by the bucket.
        pub capacity: u32,
        /// Number of instances currently out in the world.
        pub active: u32,
        /// Whether the bucket may grow past its capacity.
        pub expandable: bool,
    }

    /// Read-only index resolving bodies to owning pooled vehicles.
    #[derive(Clone, Copy, Debug)]
    pub struct BodyIndexView<'a> {
        world: &'a World,
    }

    impl BodyIndexView<'_> {
        /// Resolves a contacted body, possibly a child part, to the pooled
        /// vehicle that owns it.
        #[must_use]
        pub fn resolve_root(&self, body: BodyId) -> Option<VehicleId> {
            if let Some(vehicle) = self.world.attachments.get(&body) {
                return Some(*vehicle);
            }
            self.world.pool.member_by_root(body)
        }

        /// Reports whether the vehicle belongs to the pool.
        #[must_use]
        pub fn is_member(&self, vehicle: VehicleId) -> bool {
            self.world.pool.is_member(vehicle)
        }

        /// Reports whether a registered scenery body is currently enabled.
        /// `None` means the body is unknown or already despawned.
        #[must_use]
        pub fn scenery_enabled(&self, body: BodyId) -> Option<bool> {
            self.world.scenery.get(&body).copied()
        }
    }
}
