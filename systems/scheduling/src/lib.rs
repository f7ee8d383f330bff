#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timer-driven spawn scheduling with round sequencing and watchdog
//! stall recovery.
//!
//! The scheduler is a pure system in the engine's sense: it consumes world
//! events plus immutable views and responds with spawn and reclaim commands.
//! Engine time only advances through `TimeAdvanced` events, so every wait
//! (spawn interval, inter-round delay, watchdog deadline) is an accumulator
//! over simulated time rather than a wall clock.

use std::time::Duration;

use lane_rush_core::{
    Command, Event, GameFlow, KindAssignment, Lane, RoundDefinition, RoundInfo, RoundPlan,
    TemplateId, DEFAULT_WATCHDOG_TIMEOUT,
};
use lane_rush_system_assignment::Assignment;
use lane_rush_world::query::PoolView;

mod sequencer;

pub use sequencer::RoundState;

use sequencer::Sequencer;

const DEFAULT_CONTINUOUS_INTERVAL: Duration = Duration::from_secs(2);

/// Global flags governing scheduling and round progression.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    looping: bool,
    watchdog_timeout: Duration,
    inter_round_delay: Duration,
    continuous_interval: Duration,
}

impl Config {
    /// Enables wrapping back to round zero after the final round.
    #[must_use]
    pub const fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Overrides the watchdog deadline applied while waiting for returns.
    #[must_use]
    pub const fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    /// Overrides the delay observed before each round starts spawning.
    #[must_use]
    pub const fn with_inter_round_delay(mut self, delay: Duration) -> Self {
        self.inter_round_delay = delay;
        self
    }

    /// Overrides the spawn cadence used by continuous mode.
    #[must_use]
    pub const fn with_continuous_interval(mut self, interval: Duration) -> Self {
        self.continuous_interval = interval;
        self
    }

    /// Whether the sequencer wraps back to round zero after the final round.
    #[must_use]
    pub const fn looping(&self) -> bool {
        self.looping
    }

    /// Maximum simulated time spent waiting for returns before the stall
    /// recovery path force-advances the round.
    #[must_use]
    pub const fn watchdog_timeout(&self) -> Duration {
        self.watchdog_timeout
    }

    /// Delay observed before each round starts spawning. May be zero.
    #[must_use]
    pub const fn inter_round_delay(&self) -> Duration {
        self.inter_round_delay
    }

    /// Spawn cadence used by continuous mode.
    #[must_use]
    pub const fn continuous_interval(&self) -> Duration {
        self.continuous_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            looping: false,
            watchdog_timeout: DEFAULT_WATCHDOG_TIMEOUT,
            inter_round_delay: Duration::ZERO,
            continuous_interval: DEFAULT_CONTINUOUS_INTERVAL,
        }
    }
}

#[derive(Debug)]
enum Mode {
    Continuous(ContinuousState),
    Rounds(Sequencer),
    Stopped,
}

#[derive(Debug)]
struct ContinuousState {
    accumulator: Duration,
    next_side: Lane,
}

impl ContinuousState {
    const fn new() -> Self {
        Self {
            accumulator: Duration::ZERO,
            next_side: Lane::Left,
        }
    }
}

/// Top-level spawn scheduler driving either continuous or round mode.
///
/// The mode is fixed at construction; switching requires [`Scheduler::stop`]
/// followed by reconstruction, or [`Scheduler::restart`] to reset the same
/// mode from scratch.
#[derive(Debug)]
pub struct Scheduler {
    config: Config,
    assignment: Assignment,
    definitions: Vec<RoundDefinition>,
    mode: Mode,
}

impl Scheduler {
    /// Creates a scheduler that spawns one vehicle per interval forever,
    /// alternating spawn sides.
    #[must_use]
    pub fn continuous(assignment: Assignment, config: Config) -> Self {
        Self {
            config,
            assignment,
            definitions: Vec::new(),
            mode: Mode::Continuous(ContinuousState::new()),
        }
    }

    /// Creates a scheduler gated by the provided round plans.
    ///
    /// An invalid plan list is rejected here and the scheduler falls back to
    /// continuous mode rather than failing outright.
    #[must_use]
    pub fn rounds(plans: &[RoundPlan], assignment: Assignment, config: Config) -> Self {
        match RoundDefinition::from_plans(plans) {
            Ok(definitions) => Self {
                config,
                assignment,
                definitions,
                mode: Mode::Rounds(Sequencer::new()),
            },
            Err(error) => {
                log::warn!("invalid round configuration ({error}); falling back to continuous");
                Self::continuous(assignment, config)
            }
        }
    }

    /// Consumes world events and immutable views to emit spawn and reclaim
    /// commands. `flow` is notified exactly once when the final non-looping
    /// round completes.
    pub fn handle(
        &mut self,
        events: &[Event],
        pool: &PoolView,
        flow: &mut dyn GameFlow,
        out: &mut Vec<Command>,
    ) {
        let Self {
            config,
            assignment,
            definitions,
            mode,
        } = self;

        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::VehicleSpawned { .. } => {
                    if let Mode::Rounds(sequencer) = &mut *mode {
                        sequencer.note_spawned(definitions);
                    }
                }
                Event::SpawnSkipped { .. } => {
                    if let Mode::Rounds(sequencer) = &mut *mode {
                        sequencer.note_skipped();
                    }
                }
                Event::VehicleReturned { .. } => {
                    if let Mode::Rounds(sequencer) = &mut *mode {
                        sequencer.note_returned(definitions, config, flow);
                    }
                }
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        let templates = pool.templates();
        match mode {
            Mode::Continuous(state) => {
                advance_continuous(state, elapsed, config, assignment, &templates, out);
            }
            Mode::Rounds(sequencer) => {
                sequencer.advance(
                    elapsed,
                    definitions,
                    config,
                    assignment,
                    &templates,
                    flow,
                    out,
                );
            }
            Mode::Stopped => {}
        }
    }

    /// Cancels the scheduler outright, discarding accumulated waits and any
    /// in-flight spawn accounting.
    pub fn stop(&mut self) {
        self.mode = Mode::Stopped;
    }

    /// Reinitializes the scheduler's mode from its configuration with all
    /// counters at zero.
    pub fn restart(&mut self) {
        self.assignment.begin_round();
        self.mode = if self.definitions.is_empty() {
            Mode::Continuous(ContinuousState::new())
        } else {
            Mode::Rounds(Sequencer::new())
        };
    }

    /// Whether the scheduler is gated by round definitions.
    #[must_use]
    pub fn is_round_mode(&self) -> bool {
        matches!(self.mode, Mode::Rounds(_))
    }

    /// Observable phase of the round state machine, when in round mode.
    #[must_use]
    pub fn round_state(&self) -> Option<RoundState> {
        match &self.mode {
            Mode::Rounds(sequencer) => Some(sequencer.state()),
            _ => None,
        }
    }

    /// Read-only round progression status, when in round mode.
    #[must_use]
    pub fn current_round_info(&self) -> Option<RoundInfo> {
        match &self.mode {
            Mode::Rounds(sequencer) => Some(sequencer.info(self.definitions.len() as u32)),
            _ => None,
        }
    }

    /// Sum of all configured rounds' spawn counts. Zero in continuous mode.
    #[must_use]
    pub fn total_vehicles_for_level(&self) -> u32 {
        self.definitions
            .iter()
            .map(|definition| definition.count().get())
            .sum()
    }
}

fn advance_continuous(
    state: &mut ContinuousState,
    elapsed: Duration,
    config: &Config,
    assignment: &mut Assignment,
    templates: &[TemplateId],
    out: &mut Vec<Command>,
) {
    let interval = config.continuous_interval();
    if interval.is_zero() {
        return;
    }

    state.accumulator = state.accumulator.saturating_add(elapsed);
    while state.accumulator >= interval {
        state.accumulator -= interval;
        let Some(template) = assignment.resolve_kind(KindAssignment::Random, templates) else {
            continue;
        };
        let lane = state.next_side;
        state.next_side = lane.opposite();
        out.push(Command::SpawnVehicle { template, lane });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_rush_system_assignment::Config as AssignmentConfig;

    struct FlowProbe {
        completions: u32,
    }

    impl GameFlow for FlowProbe {
        fn all_rounds_completed(&mut self) {
            self.completions += 1;
        }
    }

    #[test]
    fn invalid_plans_fall_back_to_continuous_mode() {
        let plans = vec![RoundPlan::new("broken", 0, Duration::from_secs(1))];
        let scheduler = Scheduler::rounds(
            &plans,
            Assignment::new(AssignmentConfig::new(1)),
            Config::default(),
        );
        assert!(!scheduler.is_round_mode());
        assert_eq!(scheduler.total_vehicles_for_level(), 0);
    }

    #[test]
    fn empty_plan_list_falls_back_to_continuous_mode() {
        let scheduler = Scheduler::rounds(
            &[],
            Assignment::new(AssignmentConfig::new(1)),
            Config::default(),
        );
        assert!(!scheduler.is_round_mode());
        assert!(scheduler.current_round_info().is_none());
    }

    #[test]
    fn total_vehicles_sums_every_round() {
        let plans = vec![
            RoundPlan::new("first", 3, Duration::from_secs(1)),
            RoundPlan::new("second", 5, Duration::from_secs(1)),
        ];
        let scheduler = Scheduler::rounds(
            &plans,
            Assignment::new(AssignmentConfig::new(1)),
            Config::default(),
        );
        assert_eq!(scheduler.total_vehicles_for_level(), 8);
    }

    #[test]
    fn stopped_scheduler_ignores_time() {
        let mut scheduler = Scheduler::continuous(
            Assignment::new(AssignmentConfig::new(1)),
            Config::default().with_continuous_interval(Duration::from_secs(1)),
        );
        scheduler.stop();

        let pool = empty_pool_view();
        let mut flow = FlowProbe { completions: 0 };
        let mut commands = Vec::new();
        scheduler.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs(10),
            }],
            &pool,
            &mut flow,
            &mut commands,
        );
        assert!(commands.is_empty());
    }

    fn empty_pool_view() -> PoolView {
        lane_rush_world::query::pool_view(&lane_rush_world::World::new())
    }
}
