#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic lane and vehicle-type resolution for spawn indices.

use lane_rush_core::{KindAssignment, Lane, LaneAssignment, TemplateId};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to construct the resolver.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Resolves per-index lane and type assignments at spawn time.
///
/// "Random" lanes use an alternation heuristic: the resolved lane is the
/// complement of the last concretely resolved lane for the round, which
/// reduces same-lane clustering without true randomness guarantees.
#[derive(Debug)]
pub struct Assignment {
    rng_state: u64,
    last_lane: Option<Lane>,
}

impl Assignment {
    /// Creates a new resolver using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng_state: config.rng_seed,
            last_lane: None,
        }
    }

    /// Clears the alternation marker at the start of a round.
    pub fn begin_round(&mut self) {
        self.last_lane = None;
    }

    /// Resolves the lane for the current spawn index.
    pub fn resolve_lane(&mut self, assignment: LaneAssignment) -> Lane {
        let lane = match assignment {
            LaneAssignment::Fixed(lane) => lane,
            LaneAssignment::Random => match self.last_lane {
                Some(last) => last.opposite(),
                None => {
                    if self.advance_rng() % 2 == 0 {
                        Lane::Left
                    } else {
                        Lane::Right
                    }
                }
            },
        };
        self.last_lane = Some(lane);
        lane
    }

    /// Resolves the vehicle type for the current spawn index. `None` means
    /// no concrete template is available and the spawn must be skipped.
    pub fn resolve_kind(
        &mut self,
        assignment: KindAssignment,
        templates: &[TemplateId],
    ) -> Option<TemplateId> {
        match assignment {
            KindAssignment::Fixed(template) => Some(template),
            KindAssignment::Random => {
                if templates.is_empty() {
                    return None;
                }
                let value = self.advance_rng();
                let index = (value % templates.len() as u64) as usize;
                Some(templates[index])
            }
        }
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_random_lanes_alternate() {
        let mut assignment = Assignment::new(Config::new(0x1234_5678));
        let first = assignment.resolve_lane(LaneAssignment::Random);
        let second = assignment.resolve_lane(LaneAssignment::Random);
        let third = assignment.resolve_lane(LaneAssignment::Random);
        assert_eq!(second, first.opposite());
        assert_eq!(third, first);
    }

    #[test]
    fn random_lane_complements_the_last_fixed_lane() {
        let mut assignment = Assignment::new(Config::new(1));
        assert_eq!(
            assignment.resolve_lane(LaneAssignment::Fixed(Lane::Left)),
            Lane::Left
        );
        assert_eq!(assignment.resolve_lane(LaneAssignment::Random), Lane::Right);
    }

    #[test]
    fn begin_round_clears_the_alternation_marker() {
        let mut assignment = Assignment::new(Config::new(7));
        let _ = assignment.resolve_lane(LaneAssignment::Fixed(Lane::Right));
        assignment.begin_round();
        let mut reseeded = Assignment::new(Config::new(7));
        let _ = reseeded.resolve_lane(LaneAssignment::Fixed(Lane::Left));
        reseeded.begin_round();
        assert_eq!(
            assignment.resolve_lane(LaneAssignment::Random),
            reseeded.resolve_lane(LaneAssignment::Random)
        );
    }

    #[test]
    fn fixed_kind_passes_through() {
        let mut assignment = Assignment::new(Config::new(3));
        assert_eq!(
            assignment.resolve_kind(KindAssignment::Fixed(TemplateId::new(5)), &[]),
            Some(TemplateId::new(5))
        );
    }

    #[test]
    fn random_kind_requires_known_templates() {
        let mut assignment = Assignment::new(Config::new(3));
        assert_eq!(assignment.resolve_kind(KindAssignment::Random, &[]), None);
    }

    #[test]
    fn random_kind_selection_is_deterministic_per_seed() {
        let templates = [TemplateId::new(0), TemplateId::new(1), TemplateId::new(2)];
        let mut first = Assignment::new(Config::new(0xdead_beef));
        let mut second = Assignment::new(Config::new(0xdead_beef));
        for _ in 0..16 {
            assert_eq!(
                first.resolve_kind(KindAssignment::Random, &templates),
                second.resolve_kind(KindAssignment::Random, &templates)
            );
        }
    }

    #[test]
    fn random_kind_stays_within_known_templates() {
        let templates = [TemplateId::new(4), TemplateId::new(9)];
        let mut assignment = Assignment::new(Config::new(42));
        for _ in 0..32 {
            let resolved = assignment
                .resolve_kind(KindAssignment::Random, &templates)
                .expect("templates available");
            assert!(templates.contains(&resolved));
        }
    }
}
