#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Rush engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! Round configuration enters the engine as raw [`RoundPlan`] records and is
//! validated into immutable [`RoundDefinition`] values before use.

use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Watchdog deadline applied when a scheduler configuration does not
/// override it.
pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_secs(60);

/// Unique identifier assigned to a pooled vehicle instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(u32);

impl VehicleId {
    /// Creates a new vehicle identifier with the provided numeric value.
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

/// Identity of the prefab/template a pooled vehicle was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Creates a new template identifier with the provided numeric value.
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

/// Identity of a physical body known to the world, either a vehicle root,
/// an attached child part, or a registered scenery object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    /// Creates a new body identifier with the provided numeric value.
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

/// Identity of a boundary sensor region at the edge of the play area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorId(u32);

impl SensorId {
    /// Creates a new sensor identifier with the provided numeric value.
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

/// Discrete spatial track a vehicle spawns into and travels along.
///
/// The two lanes form a complement pair used by the alternation heuristic:
/// a "random" lane resolves to the opposite of the last concrete lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// Lane whose traffic travels toward increasing x.
    Left,
    /// Lane whose traffic travels toward decreasing x.
    Right,
}

impl Lane {
    /// Returns the complementary lane.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit travel direction for vehicles spawned into this lane.
    #[must_use]
    pub const fn travel_direction(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(1.0, 0.0),
            Self::Right => Vec2::new(-1.0, 0.0),
        }
    }
}

/// Minimal two-component vector used by the movement command surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    x: f32,
    y: f32,
}

impl Vec2 {
    /// The zero vector, the canonical inert movement direction.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new vector from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Narrow command interface onto a vehicle's own movement collaborator.
///
/// The engine only issues these commands on spawn and release; it never
/// reads back or simulates physics itself.
pub trait Motor {
    /// Points the vehicle along the provided direction.
    fn set_direction(&mut self, direction: Vec2);

    /// Sets the vehicle's travel speed in world units per second.
    fn set_speed(&mut self, speed: f32);

    /// Enables the vehicle's movement and collision behaviour.
    fn enable(&mut self);

    /// Disables the vehicle's movement and collision behaviour.
    fn disable(&mut self);

    /// Restores the canonical inert configuration: zero motion, default
    /// spatial transform, disabled.
    fn reset_to_default(&mut self);
}

/// Surrounding game-state collaborator notified about round progression.
pub trait GameFlow {
    /// Fired exactly once when the last non-looping round finishes.
    fn all_rounds_completed(&mut self);
}

/// Per-index lane selection inside a round definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneAssignment {
    /// Spawn into the given lane.
    Fixed(Lane),
    /// Resolve the lane at spawn time via the alternation heuristic.
    Random,
}

/// Per-index vehicle-type selection inside a round definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindAssignment {
    /// Spawn the given template.
    Fixed(TemplateId),
    /// Resolve the template at spawn time by uniform selection.
    Random,
}

/// Raw, unvalidated round configuration supplied by the level.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundPlan {
    name: String,
    count: u32,
    interval: Duration,
    lane_mode: Option<LaneAssignment>,
    lanes: Vec<LaneAssignment>,
    kinds: Vec<KindAssignment>,
}

impl RoundPlan {
    /// Creates a plan with the provided spawn count and cadence and no
    /// per-index assignments.
    #[must_use]
    pub fn new(name: impl Into<String>, count: u32, interval: Duration) -> Self {
        Self {
            name: name.into(),
            count,
            interval,
            lane_mode: None,
            lanes: Vec::new(),
            kinds: Vec::new(),
        }
    }

    /// Supplies a round-level lane mode that wins over the per-index lane
    /// assignments for every spawn of the round.
    #[must_use]
    pub fn with_lane_mode(mut self, mode: LaneAssignment) -> Self {
        self.lane_mode = Some(mode);
        self
    }

    /// Supplies per-index lane assignments for the plan.
    #[must_use]
    pub fn with_lanes(mut self, lanes: Vec<LaneAssignment>) -> Self {
        self.lanes = lanes;
        self
    }

    /// Supplies per-index vehicle-type assignments for the plan.
    #[must_use]
    pub fn with_kinds(mut self, kinds: Vec<KindAssignment>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Display name of the round.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested spawn count, not yet validated.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Requested spawn cadence, not yet validated.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Round-level lane mode override, when one was supplied.
    #[must_use]
    pub const fn lane_mode(&self) -> Option<LaneAssignment> {
        self.lane_mode
    }
}

/// Reasons a list of round plans is rejected at scheduler construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RoundConfigError {
    /// The plan list was empty.
    #[error("round plan list is empty")]
    EmptyPlanList,
    /// A round requested zero spawns.
    #[error("round {index} requests zero spawns")]
    ZeroCount {
        /// Position of the offending plan in the supplied list.
        index: usize,
    },
    /// A round requested a zero spawn interval.
    #[error("round {index} requests a zero spawn interval")]
    ZeroInterval {
        /// Position of the offending plan in the supplied list.
        index: usize,
    },
}

/// Immutable, validated per-level round configuration.
///
/// Assignment arrays are normalized to the spawn count before use: longer
/// arrays are truncated, shorter ones are extended by cycling the configured
/// prefix (or filled with `Random` when no prefix was supplied). A
/// round-level lane mode, when present, wins over the per-index entries.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundDefinition {
    name: String,
    count: NonZeroU32,
    interval: Duration,
    lane_mode: Option<LaneAssignment>,
    lanes: Vec<LaneAssignment>,
    kinds: Vec<KindAssignment>,
}

impl RoundDefinition {
    /// Validates and normalizes an ordered list of raw plans.
    pub fn from_plans(plans: &[RoundPlan]) -> Result<Vec<Self>, RoundConfigError> {
        if plans.is_empty() {
            return Err(RoundConfigError::EmptyPlanList);
        }

        let mut definitions = Vec::with_capacity(plans.len());
        for (index, plan) in plans.iter().enumerate() {
            let count =
                NonZeroU32::new(plan.count()).ok_or(RoundConfigError::ZeroCount { index })?;
            if plan.interval().is_zero() {
                return Err(RoundConfigError::ZeroInterval { index });
            }

            let entries = count.get() as usize;
            definitions.push(Self {
                name: plan.name().to_owned(),
                count,
                interval: plan.interval(),
                lane_mode: plan.lane_mode(),
                lanes: normalize(&plan.lanes, entries, LaneAssignment::Random),
                kinds: normalize(&plan.kinds, entries, KindAssignment::Random),
            });
        }

        Ok(definitions)
    }

    /// Display name of the round.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of vehicles the round spawns.
    #[must_use]
    pub const fn count(&self) -> NonZeroU32 {
        self.count
    }

    /// Simulated time between successive spawns within the round.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Lane assignment for the provided spawn index. The round-level lane
    /// mode, when present, wins over the per-index entry.
    #[must_use]
    pub fn lane_assignment(&self, index: u32) -> LaneAssignment {
        match self.lane_mode {
            Some(mode) => mode,
            None => self.lanes[index as usize % self.lanes.len()],
        }
    }

    /// Vehicle-type assignment for the provided spawn index.
    #[must_use]
    pub fn kind_assignment(&self, index: u32) -> KindAssignment {
        self.kinds[index as usize % self.kinds.len()]
    }
}

fn normalize<T: Copy>(configured: &[T], count: usize, fallback: T) -> Vec<T> {
    let mut normalized = Vec::with_capacity(count);
    for index in 0..count {
        let entry = if configured.is_empty() {
            fallback
        } else {
            configured[index % configured.len()]
        };
        normalized.push(entry);
    }
    normalized
}

/// Sizing and behaviour of one template bucket inside the vehicle pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoolTemplateConfig {
    /// Template the bucket serves.
    pub template: TemplateId,
    /// Number of inactive vehicles pre-populated at initialization.
    pub initial_size: u32,
    /// Whether the bucket may grow past its initial size on demand.
    pub expandable: bool,
    /// Travel speed applied to vehicles spawned from this bucket.
    pub cruise_speed: f32,
}

/// Distinguishes why a vehicle returned to the pool.
///
/// Round accounting and win/loss accounting are independent consumers of the
/// same return-event stream; the cause lets each apply its own rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReturnCause {
    /// The vehicle left the play area through a boundary sensor.
    Exit,
    /// The vehicle was forcibly reclaimed by the watchdog recovery path.
    Reclaimed,
}

/// Boundary sensor observation delivered by the physics adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SensorReport {
    /// Sensor region that registered the contact.
    pub sensor: SensorId,
    /// Body that entered the region, possibly a child part of a vehicle.
    pub body: BodyId,
}

/// Read-only round progression status for UI and telemetry collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundInfo {
    /// Zero-based index of the active round.
    pub index: u32,
    /// Total number of configured rounds.
    pub total: u32,
    /// Vehicles spawned so far in the active round.
    pub spawned_in_round: u32,
    /// Spawned-but-not-yet-returned vehicles for the active round.
    pub pending_returns: u32,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the vehicle pool with buckets built from the provided
    /// template configurations.
    ConfigurePool {
        /// Bucket configuration per template.
        templates: Vec<PoolTemplateConfig>,
    },
    /// Registers a non-pool scenery body so the world can enforce the
    /// gateway's non-member policy against it.
    RegisterScenery,
    /// Attaches a child part body to a pooled vehicle so sensor contacts
    /// against the part resolve to the owning vehicle.
    AttachPart {
        /// Vehicle that owns the part.
        vehicle: VehicleId,
    },
    /// Requests that one vehicle be acquired from the pool and launched.
    SpawnVehicle {
        /// Template to acquire the vehicle from.
        template: TemplateId,
        /// Lane the vehicle spawns into.
        lane: Lane,
    },
    /// Returns a vehicle to the pool, resetting it to the inert state.
    ReleaseVehicle {
        /// Vehicle credited with the return.
        vehicle: VehicleId,
    },
    /// Forcibly returns every active vehicle to the pool. Stall recovery.
    ReclaimActive,
    /// Disables a registered scenery body.
    DeactivateBody {
        /// Body targeted for deactivation.
        body: BodyId,
    },
    /// Removes a registered scenery body from the world.
    DespawnBody {
        /// Body targeted for removal.
        body: BodyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a vehicle was acquired and launched into the world.
    VehicleSpawned {
        /// Vehicle that became active.
        vehicle: VehicleId,
        /// Template the vehicle was acquired from.
        template: TemplateId,
        /// Lane the vehicle spawned into.
        lane: Lane,
    },
    /// Reports that a spawn request found no free instance and the bucket
    /// could not grow. The request is dropped, not retried.
    SpawnSkipped {
        /// Template whose bucket was exhausted.
        template: TemplateId,
    },
    /// Reports that an expandable bucket grew to satisfy a spawn request.
    PoolGrew {
        /// Template whose bucket grew.
        template: TemplateId,
        /// New capacity of the bucket.
        capacity: u32,
    },
    /// Confirms that a vehicle returned to the pool.
    VehicleReturned {
        /// Vehicle that became inactive.
        vehicle: VehicleId,
        /// Why the vehicle returned.
        cause: ReturnCause,
    },
    /// Confirms that a scenery body was registered, reporting the identity
    /// the world allocated for it.
    SceneryRegistered {
        /// Body allocated to the scenery object.
        body: BodyId,
    },
    /// Confirms that a child part was attached to a vehicle.
    PartAttached {
        /// Vehicle that owns the part.
        vehicle: VehicleId,
        /// Body allocated to the part.
        part: BodyId,
    },
    /// Confirms that a scenery body was disabled.
    BodyDeactivated {
        /// Body that was disabled.
        body: BodyId,
    },
    /// Confirms that a scenery body was removed.
    BodyDespawned {
        /// Body that was removed.
        body: BodyId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn vehicle_id_round_trips_through_bincode() {
        assert_round_trip(&VehicleId::new(42));
    }

    #[test]
    fn template_id_round_trips_through_bincode() {
        assert_round_trip(&TemplateId::new(7));
    }

    #[test]
    fn body_id_round_trips_through_bincode() {
        assert_round_trip(&BodyId::new(1_000));
    }

    #[test]
    fn lane_round_trips_through_bincode() {
        assert_round_trip(&Lane::Right);
    }

    #[test]
    fn lane_opposites_form_a_complement_pair() {
        assert_eq!(Lane::Left.opposite(), Lane::Right);
        assert_eq!(Lane::Right.opposite(), Lane::Left);
        assert_eq!(Lane::Left.opposite().opposite(), Lane::Left);
    }

    #[test]
    fn from_plans_rejects_empty_list() {
        assert_eq!(
            RoundDefinition::from_plans(&[]),
            Err(RoundConfigError::EmptyPlanList)
        );
    }

    #[test]
    fn from_plans_rejects_zero_count() {
        let plans = vec![
            RoundPlan::new("first", 2, Duration::from_secs(1)),
            RoundPlan::new("second", 0, Duration::from_secs(1)),
        ];
        assert_eq!(
            RoundDefinition::from_plans(&plans),
            Err(RoundConfigError::ZeroCount { index: 1 })
        );
    }

    #[test]
    fn from_plans_rejects_zero_interval() {
        let plans = vec![RoundPlan::new("first", 2, Duration::ZERO)];
        assert_eq!(
            RoundDefinition::from_plans(&plans),
            Err(RoundConfigError::ZeroInterval { index: 0 })
        );
    }

    #[test]
    fn normalization_truncates_longer_arrays() {
        let plans = vec![RoundPlan::new("round", 2, Duration::from_secs(1)).with_lanes(vec![
            LaneAssignment::Fixed(Lane::Left),
            LaneAssignment::Fixed(Lane::Right),
            LaneAssignment::Fixed(Lane::Left),
        ])];
        let definitions = RoundDefinition::from_plans(&plans).expect("valid plans");
        assert_eq!(
            definitions[0].lane_assignment(0),
            LaneAssignment::Fixed(Lane::Left)
        );
        assert_eq!(
            definitions[0].lane_assignment(1),
            LaneAssignment::Fixed(Lane::Right)
        );
    }

    #[test]
    fn normalization_extends_by_cycling_the_prefix() {
        let plans = vec![RoundPlan::new("round", 5, Duration::from_secs(1)).with_kinds(vec![
            KindAssignment::Fixed(TemplateId::new(0)),
            KindAssignment::Fixed(TemplateId::new(1)),
        ])];
        let definitions = RoundDefinition::from_plans(&plans).expect("valid plans");
        let definition = &definitions[0];
        assert_eq!(
            definition.kind_assignment(2),
            KindAssignment::Fixed(TemplateId::new(0))
        );
        assert_eq!(
            definition.kind_assignment(3),
            KindAssignment::Fixed(TemplateId::new(1))
        );
        assert_eq!(
            definition.kind_assignment(4),
            KindAssignment::Fixed(TemplateId::new(0))
        );
    }

    #[test]
    fn normalization_fills_empty_arrays_with_random() {
        let plans = vec![RoundPlan::new("round", 3, Duration::from_secs(1))];
        let definitions = RoundDefinition::from_plans(&plans).expect("valid plans");
        for index in 0..3 {
            assert_eq!(
                definitions[0].lane_assignment(index),
                LaneAssignment::Random
            );
            assert_eq!(
                definitions[0].kind_assignment(index),
                KindAssignment::Random
            );
        }
    }

    #[test]
    fn round_level_lane_mode_wins_over_per_index_entries() {
        let plans = vec![RoundPlan::new("round", 3, Duration::from_secs(1))
            .with_lane_mode(LaneAssignment::Fixed(Lane::Right))
            .with_lanes(vec![
                LaneAssignment::Fixed(Lane::Left),
                LaneAssignment::Random,
            ])];
        let definitions = RoundDefinition::from_plans(&plans).expect("valid plans");
        for index in 0..3 {
            assert_eq!(
                definitions[0].lane_assignment(index),
                LaneAssignment::Fixed(Lane::Right)
            );
        }
    }

    #[test]
    fn plans_and_definitions_report_their_configuration() {
        let plan = RoundPlan::new("finale", 6, Duration::from_millis(1500));
        assert_eq!(plan.name(), "finale");
        assert_eq!(plan.count(), 6);
        assert_eq!(plan.interval(), Duration::from_millis(1500));
        assert_eq!(plan.lane_mode(), None);

        let definitions = RoundDefinition::from_plans(&[plan]).expect("valid plan");
        assert_eq!(definitions[0].name(), "finale");
        assert_eq!(definitions[0].count().get(), 6);
        assert_eq!(definitions[0].interval(), Duration::from_millis(1500));
    }

    #[test]
    fn travel_directions_are_opposed_unit_vectors() {
        assert_eq!(Lane::Left.travel_direction().x(), 1.0);
        assert_eq!(Lane::Right.travel_direction().x(), -1.0);
        assert_eq!(Lane::Left.travel_direction().y(), 0.0);
        assert_eq!(Lane::Right.travel_direction().y(), 0.0);
    }
}
