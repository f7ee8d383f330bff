//! Round-to-round progression state machine.

use std::time::Duration;

use lane_rush_core::{Command, GameFlow, RoundDefinition, RoundInfo, TemplateId};
use lane_rush_system_assignment::Assignment;

use crate::Config;

/// Observable phase of the round state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    /// Waiting out the inter-round delay before spawning begins.
    WaitingToStartRound,
    /// Actively emitting spawn requests for the current round.
    SpawningInRound,
    /// All spawns emitted; waiting for returns or the watchdog deadline.
    WaitingForRoundEnd,
    /// Every round finished with looping disabled. Terminal.
    Completed,
}

/// Mutable sequencing state for one scheduler instance.
///
/// Spawn accounting is event-confirmed: a spawn request is tracked as
/// in-flight until the world answers with a spawned or skipped event, so
/// `spawned_in_round` can never pass the configured count even when the
/// pool rejects requests.
#[derive(Debug)]
pub(crate) struct Sequencer {
    round_index: u32,
    state: RoundState,
    spawned_in_round: u32,
    in_flight: u32,
    pending_returns: u32,
    delay_accumulator: Duration,
    spawn_accumulator: Duration,
    wait_accumulator: Duration,
    completion_notified: bool,
}

impl Sequencer {
    pub(crate) const fn new() -> Self {
        Self {
            round_index: 0,
            state: RoundState::WaitingToStartRound,
            spawned_in_round: 0,
            in_flight: 0,
            pending_returns: 0,
            delay_accumulator: Duration::ZERO,
            spawn_accumulator: Duration::ZERO,
            wait_accumulator: Duration::ZERO,
            completion_notified: false,
        }
    }

    pub(crate) const fn state(&self) -> RoundState {
        self.state
    }

    pub(crate) fn info(&self, total: u32) -> RoundInfo {
        RoundInfo {
            index: self.round_index,
            total,
            spawned_in_round: self.spawned_in_round,
            pending_returns: self.pending_returns,
        }
    }

    /// Records a confirmed spawn for the active round.
    pub(crate) fn note_spawned(&mut self, definitions: &[RoundDefinition]) {
        if self.state != RoundState::SpawningInRound {
            return;
        }

        self.in_flight = self.in_flight.saturating_sub(1);
        self.spawned_in_round = self.spawned_in_round.saturating_add(1);
        self.pending_returns = self.pending_returns.saturating_add(1);

        let count = definitions[self.round_index as usize].count().get();
        if self.spawned_in_round >= count {
            self.state = RoundState::WaitingForRoundEnd;
            self.wait_accumulator = Duration::ZERO;
        }
    }

    /// Records that a spawn request was dropped by an exhausted pool. The
    /// slot is freed so the next elapsed interval retries.
    pub(crate) fn note_skipped(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Records a return notification. Decrements are guarded at zero so a
    /// duplicate or late notification is a no-op; reaching zero while
    /// waiting for the round end advances immediately rather than waiting
    /// for the next watchdog poll.
    pub(crate) fn note_returned(
        &mut self,
        definitions: &[RoundDefinition],
        config: &Config,
        flow: &mut dyn GameFlow,
    ) {
        if self.pending_returns == 0 {
            return;
        }

        self.pending_returns -= 1;
        if self.pending_returns == 0 && self.state == RoundState::WaitingForRoundEnd {
            self.advance_round(definitions, config, flow);
        }
    }

    /// Consumes elapsed simulated time, emitting spawn requests and driving
    /// delay and watchdog deadlines.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        definitions: &[RoundDefinition],
        config: &Config,
        assignment: &mut Assignment,
        templates: &[TemplateId],
        flow: &mut dyn GameFlow,
        out: &mut Vec<Command>,
    ) {
        let mut remaining = dt;
        loop {
            match self.state {
                RoundState::WaitingToStartRound => {
                    let needed = config
                        .inter_round_delay()
                        .saturating_sub(self.delay_accumulator);
                    if remaining < needed {
                        self.delay_accumulator = self.delay_accumulator.saturating_add(remaining);
                        return;
                    }
                    remaining = remaining.saturating_sub(needed);
                    self.state = RoundState::SpawningInRound;
                    self.spawn_accumulator = Duration::ZERO;
                    assignment.begin_round();
                    log::info!(
                        "round {} \"{}\" spawning",
                        self.round_index,
                        definitions[self.round_index as usize].name()
                    );
                }
                RoundState::SpawningInRound => {
                    self.spawn_accumulator = self.spawn_accumulator.saturating_add(remaining);
                    self.emit_spawn_requests(
                        &definitions[self.round_index as usize],
                        assignment,
                        templates,
                        out,
                    );
                    return;
                }
                RoundState::WaitingForRoundEnd => {
                    self.wait_accumulator = self.wait_accumulator.saturating_add(remaining);
                    if self.wait_accumulator < config.watchdog_timeout() {
                        return;
                    }

                    // Stall recovery: zero the counter before the reclaim so
                    // the resulting return events are absorbed by the guard.
                    log::warn!(
                        "round {} stalled for {:?}; reclaiming active vehicles",
                        self.round_index,
                        config.watchdog_timeout()
                    );
                    let excess = self
                        .wait_accumulator
                        .saturating_sub(config.watchdog_timeout());
                    self.pending_returns = 0;
                    out.push(Command::ReclaimActive);
                    self.advance_round(definitions, config, flow);
                    remaining = excess;
                }
                RoundState::Completed => return,
            }
        }
    }

    fn emit_spawn_requests(
        &mut self,
        definition: &RoundDefinition,
        assignment: &mut Assignment,
        templates: &[TemplateId],
        out: &mut Vec<Command>,
    ) {
        let interval = definition.interval();
        let count = definition.count().get();

        while self.spawn_accumulator >= interval
            && self.spawned_in_round.saturating_add(self.in_flight) < count
        {
            self.spawn_accumulator -= interval;
            let index = self.spawned_in_round.saturating_add(self.in_flight);
            // Resolve the kind before the lane: a dropped attempt must not
            // consume the lane alternation marker.
            let Some(template) =
                assignment.resolve_kind(definition.kind_assignment(index), templates)
            else {
                continue;
            };
            let lane = assignment.resolve_lane(definition.lane_assignment(index));
            self.in_flight = self.in_flight.saturating_add(1);
            out.push(Command::SpawnVehicle { template, lane });
        }
    }

    fn advance_round(
        &mut self,
        definitions: &[RoundDefinition],
        config: &Config,
        flow: &mut dyn GameFlow,
    ) {
        self.spawned_in_round = 0;
        self.in_flight = 0;
        self.pending_returns = 0;
        self.delay_accumulator = Duration::ZERO;
        self.spawn_accumulator = Duration::ZERO;
        self.wait_accumulator = Duration::ZERO;

        let next = self.round_index as usize + 1;
        if next < definitions.len() {
            self.round_index = next as u32;
            self.state = RoundState::WaitingToStartRound;
        } else if config.looping() {
            self.round_index = 0;
            self.state = RoundState::WaitingToStartRound;
        } else {
            self.state = RoundState::Completed;
            if !self.completion_notified {
                self.completion_notified = true;
                flow.all_rounds_completed();
            }
        }
    }
}
