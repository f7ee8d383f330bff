//! Reusable vehicle pool avoiding repeated allocation and destruction.

use lane_rush_core::{BodyId, Lane, Motor, PoolTemplateConfig, TemplateId, Vec2, VehicleId};

/// Movement state of a pooled vehicle, driven through the [`Motor`] trait.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MotorState {
    direction: Vec2,
    speed: f32,
    enabled: bool,
}

impl MotorState {
    /// Canonical inert configuration applied to freshly created and
    /// released vehicles.
    pub(crate) const fn inert() -> Self {
        Self {
            direction: Vec2::ZERO,
            speed: 0.0,
            enabled: false,
        }
    }

    pub(crate) const fn direction(&self) -> Vec2 {
        self.direction
    }

    pub(crate) const fn speed(&self) -> f32 {
        self.speed
    }

    pub(crate) const fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Motor for MotorState {
    fn set_direction(&mut self, direction: Vec2) {
        self.direction = direction;
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn reset_to_default(&mut self) {
        *self = Self::inert();
    }
}

/// Allocates world-unique body identifiers for vehicle roots, attached
/// parts, and scenery objects.
#[derive(Debug, Default)]
pub(crate) struct BodyIdAllocator {
    next: u32,
}

impl BodyIdAllocator {
    pub(crate) fn allocate(&mut self) -> BodyId {
        let body = BodyId::new(self.next);
        self.next = self.next.wrapping_add(1);
        body
    }
}

#[derive(Debug)]
pub(crate) struct Vehicle {
    pub(crate) id: VehicleId,
    pub(crate) template: TemplateId,
    pub(crate) root_body: BodyId,
    pub(crate) lane: Option<Lane>,
    pub(crate) active: bool,
    pub(crate) motor: MotorState,
}

impl Vehicle {
    fn new(id: VehicleId, template: TemplateId, root_body: BodyId) -> Self {
        Self {
            id,
            template,
            root_body,
            lane: None,
            active: false,
            motor: MotorState::inert(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Bucket {
    pub(crate) template: TemplateId,
    pub(crate) expandable: bool,
    pub(crate) cruise_speed: f32,
    pub(crate) vehicles: Vec<Vehicle>,
}

/// Result of a successful [`VehiclePool::acquire`] call.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AcquireOutcome {
    pub(crate) vehicle: VehicleId,
    /// New bucket capacity when the acquisition required growth.
    pub(crate) grew_to: Option<u32>,
}

/// Growable collection of pooled vehicles keyed by template.
#[derive(Debug, Default)]
pub(crate) struct VehiclePool {
    buckets: Vec<Bucket>,
    next_vehicle: u32,
    growth_events: u64,
}

impl VehiclePool {
    /// Rebuilds the pool from the provided bucket configurations,
    /// pre-populating each bucket with inactive vehicles.
    pub(crate) fn configure(
        &mut self,
        configs: &[PoolTemplateConfig],
        bodies: &mut BodyIdAllocator,
    ) {
        self.buckets.clear();
        for config in configs {
            let mut bucket = Bucket {
                template: config.template,
                expandable: config.expandable,
                cruise_speed: config.cruise_speed,
                vehicles: Vec::with_capacity(config.initial_size as usize),
            };
            for _ in 0..config.initial_size {
                let vehicle = self.create_vehicle(config.template, bodies);
                bucket.vehicles.push(vehicle);
            }
            self.buckets.push(bucket);
        }
    }

    fn create_vehicle(&mut self, template: TemplateId, bodies: &mut BodyIdAllocator) -> Vehicle {
        let id = VehicleId::new(self.next_vehicle);
        self.next_vehicle = self.next_vehicle.wrapping_add(1);
        Vehicle::new(id, template, bodies.allocate())
    }

    /// Hands out the first inactive vehicle of the bucket, growing the
    /// bucket when permitted. `None` means the spawn must be skipped.
    pub(crate) fn acquire(
        &mut self,
        template: TemplateId,
        bodies: &mut BodyIdAllocator,
    ) -> Option<AcquireOutcome> {
        let bucket_index = self
            .buckets
            .iter()
            .position(|bucket| bucket.template == template)?;

        if let Some(vehicle) = self.buckets[bucket_index]
            .vehicles
            .iter_mut()
            .find(|vehicle| !vehicle.active)
        {
            vehicle.active = true;
            return Some(AcquireOutcome {
                vehicle: vehicle.id,
                grew_to: None,
            });
        }

        if !self.buckets[bucket_index].expandable {
            return None;
        }

        let mut vehicle = self.create_vehicle(template, bodies);
        vehicle.active = true;
        let id = vehicle.id;
        self.buckets[bucket_index].vehicles.push(vehicle);
        self.growth_events = self.growth_events.saturating_add(1);
        let capacity = self.buckets[bucket_index].vehicles.len() as u32;
        log::debug!("pool bucket {template:?} grew to capacity {capacity}");
        Some(AcquireOutcome {
            vehicle: id,
            grew_to: Some(capacity),
        })
    }

    /// Applies the lane, travel direction, and cruise speed to a freshly
    /// acquired vehicle.
    pub(crate) fn launch(&mut self, vehicle: VehicleId, lane: Lane) {
        for bucket in &mut self.buckets {
            let cruise_speed = bucket.cruise_speed;
            if let Some(found) = bucket.vehicles.iter_mut().find(|entry| entry.id == vehicle) {
                found.lane = Some(lane);
                found.motor.set_direction(lane.travel_direction());
                found.motor.set_speed(cruise_speed);
                found.motor.enable();
                return;
            }
        }
    }

    /// Returns the vehicle to the inert inactive state. Idempotent: the
    /// first call per activation returns `true`, repeats return `false`.
    pub(crate) fn release(&mut self, vehicle: VehicleId) -> bool {
        for bucket in &mut self.buckets {
            if let Some(found) = bucket.vehicles.iter_mut().find(|entry| entry.id == vehicle) {
                if !found.active {
                    return false;
                }
                found.active = false;
                found.lane = None;
                found.motor.reset_to_default();
                return true;
            }
        }
        false
    }

    /// Forcibly releases every active vehicle, in identifier order, and
    /// reports which vehicles were reclaimed.
    pub(crate) fn reclaim_active(&mut self) -> Vec<VehicleId> {
        let mut reclaimed: Vec<VehicleId> = self
            .vehicles()
            .filter(|vehicle| vehicle.active)
            .map(|vehicle| vehicle.id)
            .collect();
        reclaimed.sort();
        for vehicle in &reclaimed {
            let _ = self.release(*vehicle);
        }
        reclaimed
    }

    pub(crate) fn is_member(&self, vehicle: VehicleId) -> bool {
        self.vehicles().any(|entry| entry.id == vehicle)
    }

    /// Resolves a root body to its owning pooled vehicle.
    pub(crate) fn member_by_root(&self, body: BodyId) -> Option<VehicleId> {
        self.vehicles()
            .find(|vehicle| vehicle.root_body == body)
            .map(|vehicle| vehicle.id)
    }

    pub(crate) fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.buckets.iter().flat_map(|bucket| bucket.vehicles.iter())
    }

    pub(crate) fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub(crate) const fn growth_events(&self) -> u64 {
        self.growth_events
    }
}
