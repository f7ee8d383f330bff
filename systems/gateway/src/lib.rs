#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boundary-sensor gateway crediting returned vehicles back to the pool.
//!
//! The physics adapter delivers raw sensor reports; the gateway resolves
//! each tripping body to its owning vehicle and emits a release command for
//! members. Bodies the pool does not own are handled by a configurable
//! policy with an allowlist for bodies that legitimately cross the boundary.

use std::collections::HashSet;

use lane_rush_core::{BodyId, Command, SensorReport};
use lane_rush_world::query::BodyIndexView;

/// What to do with a sensor trip whose body is not a pooled vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonMemberPolicy {
    /// Leave the body alone.
    Ignore,
    /// Disable the body in place.
    Deactivate,
    /// Remove the body from the world.
    Despawn,
}

/// Configuration parameters required to construct the gateway.
#[derive(Clone, Debug)]
pub struct Config {
    policy: NonMemberPolicy,
    protected: Vec<BodyId>,
}

impl Config {
    /// Creates a configuration with the provided non-member policy and no
    /// protected bodies.
    #[must_use]
    pub const fn new(policy: NonMemberPolicy) -> Self {
        Self {
            policy,
            protected: Vec::new(),
        }
    }

    /// Marks bodies the non-member policy must never touch.
    #[must_use]
    pub fn with_protected(mut self, protected: Vec<BodyId>) -> Self {
        self.protected = protected;
        self
    }
}

/// Translates boundary sensor reports into release and cleanup commands.
#[derive(Debug)]
pub struct Gateway {
    policy: NonMemberPolicy,
    protected: HashSet<BodyId>,
}

impl Gateway {
    /// Creates a new gateway using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            policy: config.policy,
            protected: config.protected.into_iter().collect(),
        }
    }

    /// Consumes a batch of sensor reports against the current body index.
    ///
    /// A body that resolves to a pooled vehicle, whether it is the root or
    /// an attached child part, yields a release command. Duplicate trips of
    /// the same vehicle yield duplicate commands; the pool's idempotent
    /// release collapses them to a single return. Unresolved bodies fall to
    /// the non-member policy unless protected.
    pub fn handle(
        &mut self,
        reports: &[SensorReport],
        bodies: BodyIndexView<'_>,
        out: &mut Vec<Command>,
    ) {
        for report in reports {
            if let Some(vehicle) = bodies.resolve_root(report.body) {
                out.push(Command::ReleaseVehicle { vehicle });
                continue;
            }

            if self.protected.contains(&report.body) {
                log::debug!(
                    "sensor {} tripped by protected body {}",
                    report.sensor.get(),
                    report.body.get()
                );
                continue;
            }

            match self.policy {
                NonMemberPolicy::Ignore => {}
                NonMemberPolicy::Deactivate => {
                    out.push(Command::DeactivateBody { body: report.body });
                }
                NonMemberPolicy::Despawn => {
                    out.push(Command::DespawnBody { body: report.body });
                }
            }
        }
    }
}
