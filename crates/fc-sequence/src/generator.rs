//! Sequence generator

use fc_core::{Action, ActionCatalog, Sequence, SequenceStep};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use tracing::{debug, trace};

use crate::error::{GenError, GenResult};
use crate::policy::{AdjacencyRule, GenerationPolicy};
use crate::weights::Weights;

/// Recorded actions required before generating, unless configured otherwise
pub const DEFAULT_MIN_ACTIONS: usize = 5;

/// Generates sequences from the recorded actions of a catalog
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    policy: GenerationPolicy,
    min_actions: usize,
}

impl SequenceGenerator {
    /// Weighted-draw generator requiring [`DEFAULT_MIN_ACTIONS`] recordings
    pub fn new() -> Self {
        Self {
            policy: GenerationPolicy::default(),
            min_actions: DEFAULT_MIN_ACTIONS,
        }
    }

    /// Use a different generation policy
    pub fn with_policy(mut self, policy: GenerationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Require at least `min_actions` distinct recorded actions
    pub fn with_min_actions(mut self, min_actions: usize) -> Self {
        self.min_actions = min_actions;
        self
    }

    pub fn policy(&self) -> &GenerationPolicy {
        &self.policy
    }

    /// Generate a sequence of exactly `length` steps using the thread RNG
    pub fn generate(
        &self,
        catalog: &ActionCatalog,
        weights: &Weights,
        length: usize,
    ) -> GenResult<Sequence> {
        self.generate_with_rng(catalog, weights, length, &mut rand::thread_rng())
    }

    /// Generate a sequence of exactly `length` steps from the given RNG
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        catalog: &ActionCatalog,
        weights: &Weights,
        length: usize,
        rng: &mut R,
    ) -> GenResult<Sequence> {
        let present: Vec<&Action> = catalog.present().collect();
        if present.len() < self.min_actions {
            return Err(GenError::InsufficientActions {
                required: self.min_actions,
                present: present.len(),
            });
        }

        let candidates: Vec<(&Action, u32)> = present
            .into_iter()
            .map(|action| (action, weights.get(&action.name)))
            .filter(|(_, weight)| *weight > 0)
            .collect();
        if candidates.is_empty() {
            return Err(GenError::InvalidWeights);
        }

        debug!(
            length,
            candidates = candidates.len(),
            policy = ?self.policy,
            "Generating sequence"
        );

        let steps = match &self.policy {
            GenerationPolicy::WeightedDraw => weighted_draw(&candidates, length, rng)?,
            GenerationPolicy::QuotaPool(rule) => {
                quota_pool(&candidates, catalog, rule, length, rng)?
            }
        };

        Ok(steps.into_iter().map(SequenceStep::for_action).collect())
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn weighted_draw<'a, R: Rng + ?Sized>(
    candidates: &[(&'a Action, u32)],
    length: usize,
    rng: &mut R,
) -> GenResult<Vec<&'a Action>> {
    // Summed in u64 so large configured weights cannot overflow
    let dist = WeightedIndex::new(candidates.iter().map(|(_, weight)| u64::from(*weight)))
        .map_err(|_| GenError::InvalidWeights)?;

    Ok((0..length).map(|_| candidates[dist.sample(rng)].0).collect())
}

fn quota_pool<'a, R: Rng + ?Sized>(
    candidates: &[(&'a Action, u32)],
    catalog: &'a ActionCatalog,
    rule: &AdjacencyRule,
    length: usize,
    rng: &mut R,
) -> GenResult<Vec<&'a Action>> {
    rule.validate()?;

    let fillers: Vec<&Action> = rule
        .fillers
        .iter()
        .filter_map(|name| catalog.get(name))
        .collect();
    let no_filler = || GenError::NoFiller {
        fillers: rule.fillers.clone(),
    };

    let total: u64 = candidates.iter().map(|(_, weight)| u64::from(*weight)).sum();
    let mut pool: Vec<&Action> = Vec::with_capacity(length);
    for (action, weight) in candidates {
        let quota = (f64::from(*weight) / total as f64 * length as f64).round() as usize;
        trace!(action = %action.name, quota, "Quota");
        pool.extend(std::iter::repeat(*action).take(quota));
    }
    pool.shuffle(rng);
    let mut pool: VecDeque<&Action> = pool.into();

    let mut steps: Vec<&Action> = Vec::with_capacity(length);
    let mut next_filler = 0;
    while steps.len() < length {
        let Some(front) = pool.front() else { break };
        let prev = steps.last().map(|a| a.name.as_str());

        if rule.violates(prev, &front.name) {
            match pool.iter().position(|a| !rule.violates(prev, &a.name)) {
                Some(pos) => pool.swap(0, pos),
                None => {
                    let filler = fillers
                        .get(next_filler % fillers.len().max(1))
                        .copied()
                        .ok_or_else(no_filler)?;
                    next_filler += 1;
                    steps.push(filler);
                    continue;
                }
            }
        }

        if let Some(action) = pool.pop_front() {
            steps.push(action);
        }
    }

    if steps.len() < length {
        debug!(missing = length - steps.len(), "Padding sequence with fillers");
    }
    while steps.len() < length {
        let filler = fillers.choose(rng).copied().ok_or_else(no_filler)?;
        steps.push(filler);
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::RECORDABLE_CLICKS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn full_catalog() -> ActionCatalog {
        let mut catalog = ActionCatalog::new();
        for (i, name) in RECORDABLE_CLICKS.iter().enumerate() {
            catalog.record_click(name, 100 * i as i32, 500).unwrap();
        }
        catalog
            .set("swipe_up", Action::scroll("swipe_up", -200000))
            .unwrap();
        catalog
            .set("swipe_down", Action::scroll("swipe_down", 200000))
            .unwrap();
        catalog
    }

    #[test]
    fn test_insufficient_actions() {
        let mut catalog = full_catalog();
        catalog.remove("follow");

        let err = SequenceGenerator::new()
            .generate(&catalog, &Weights::reference(), 100)
            .unwrap_err();
        assert_eq!(
            err,
            GenError::InsufficientActions {
                required: 5,
                present: 4
            }
        );
    }

    #[test]
    fn test_min_actions_is_configurable() {
        let mut catalog = full_catalog();
        catalog.remove("follow");
        let seq = SequenceGenerator::new()
            .with_min_actions(4)
            .generate(&catalog, &Weights::reference(), 20)
            .unwrap();
        assert_eq!(seq.len(), 20);
        assert_eq!(seq.count_of("follow"), 0);
    }

    #[test]
    fn test_all_zero_weights() {
        let weights: Weights = full_catalog()
            .present()
            .map(|a| (a.name.clone(), 0))
            .collect();
        let err = SequenceGenerator::new()
            .generate(&full_catalog(), &weights, 10)
            .unwrap_err();
        assert_eq!(err, GenError::InvalidWeights);
    }

    #[test]
    fn test_zero_weight_excludes_action() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = Weights::reference().with("like", 0);
        let seq = SequenceGenerator::new()
            .generate_with_rng(&full_catalog(), &weights, 500, &mut rng)
            .unwrap();
        assert_eq!(seq.count_of("like"), 0);
    }

    #[test]
    fn test_max_weights_do_not_overflow() {
        let mut rng = StdRng::seed_from_u64(3);
        let weights = Weights::new()
            .with("swipe_up", u32::MAX)
            .with("swipe_down", u32::MAX)
            .with("like", 0)
            .with("bookmark", 0)
            .with("follow", 0);

        for policy in [
            GenerationPolicy::WeightedDraw,
            GenerationPolicy::QuotaPool(AdjacencyRule::reference()),
        ] {
            let seq = SequenceGenerator::new()
                .with_policy(policy)
                .generate_with_rng(&full_catalog(), &weights, 10, &mut rng)
                .unwrap();
            assert_eq!(seq.len(), 10);
            assert_eq!(seq.count_of("swipe_up") + seq.count_of("swipe_down"), 10);
        }
    }

    #[test]
    fn test_steps_carry_resolved_kind() {
        let catalog = full_catalog();
        let seq = SequenceGenerator::new()
            .generate(&catalog, &Weights::new(), 50)
            .unwrap();
        for step in &seq {
            assert_eq!(Some(step.kind), catalog.get(&step.name).map(Action::kind));
        }
    }

    #[test]
    fn test_zero_length() {
        let seq = SequenceGenerator::new()
            .generate(&full_catalog(), &Weights::reference(), 0)
            .unwrap();
        assert!(seq.is_empty());
    }

    #[test]
    fn test_quota_pool_follows_quotas() {
        let mut rng = StdRng::seed_from_u64(1);
        let generator =
            SequenceGenerator::new().with_policy(GenerationPolicy::QuotaPool(AdjacencyRule::new()));
        let seq = generator
            .generate_with_rng(&full_catalog(), &Weights::reference(), 100, &mut rng)
            .unwrap();

        assert_eq!(seq.count_of("swipe_up"), 80);
        assert_eq!(seq.count_of("swipe_down"), 10);
        assert_eq!(seq.count_of("like"), 5);
        assert_eq!(seq.count_of("bookmark"), 3);
        assert_eq!(seq.count_of("follow"), 2);
    }

    #[test]
    fn test_quota_pool_inserts_filler_when_pool_is_all_constrained() {
        let mut catalog = ActionCatalog::new();
        catalog.record_click("like", 1, 1).unwrap();
        catalog
            .set("swipe_up", Action::scroll("swipe_up", -1))
            .unwrap();
        let generator = SequenceGenerator::new()
            .with_min_actions(1)
            .with_policy(GenerationPolicy::QuotaPool(
                AdjacencyRule::new().no_consecutive("like").fillers(["swipe_up"]),
            ));
        let weights = Weights::new().with("swipe_up", 0);

        let seq = generator.generate(&catalog, &weights, 9).unwrap();
        let names: Vec<_> = seq.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["like", "swipe_up", "like", "swipe_up", "like", "swipe_up", "like", "swipe_up", "like"]
        );
    }

    #[test]
    fn test_quota_pool_without_recorded_filler() {
        let mut catalog = ActionCatalog::new();
        catalog.record_click("like", 1, 1).unwrap();
        let generator = SequenceGenerator::new()
            .with_min_actions(1)
            .with_policy(GenerationPolicy::QuotaPool(AdjacencyRule::reference()));

        let err = generator
            .generate(&catalog, &Weights::new(), 3)
            .unwrap_err();
        assert!(matches!(err, GenError::NoFiller { .. }));
    }

    #[test]
    fn test_quota_pool_pads_short_pool() {
        let mut catalog = ActionCatalog::new();
        catalog.record_click("like", 1, 1).unwrap();
        catalog.record_click("follow", 2, 2).unwrap();
        catalog
            .set("swipe_down", Action::scroll("swipe_down", 5))
            .unwrap();
        let generator = SequenceGenerator::new()
            .with_min_actions(3)
            .with_policy(GenerationPolicy::QuotaPool(
                AdjacencyRule::new().fillers(["swipe_down"]),
            ));
        // 1/3 of 4 rounds to 1 each: a pool of 3 for 4 slots
        let seq = generator.generate(&catalog, &Weights::new(), 4).unwrap();

        assert_eq!(seq.len(), 4);
        assert_eq!(seq.steps()[3].name, "swipe_down");
    }
}
