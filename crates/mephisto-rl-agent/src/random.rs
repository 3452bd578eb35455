//! Random policy for baseline comparisons

use rand::rngs::StdRng;
use rand::SeedableRng;

use mephisto_rl_core::{Action, ActionSet, ActionValueTable, Policy, Result, State};

/// Selects actions uniformly at random and ignores the value table
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Create a random policy, seeded for reproducible runs when a seed is given
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl Policy for RandomPolicy {
    fn select(
        &mut self,
        _state: &State,
        _table: &dyn ActionValueTable,
        actions: &ActionSet,
    ) -> Result<Action> {
        Ok(actions.sample(&mut self.rng))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::LazyTable;

    #[test]
    fn test_uniform_frequencies() {
        let actions = ActionSet::extended();
        let k = actions.len();
        let table = LazyTable::new(k);
        let state = State::Pixel { x: 0, y: 0 };
        let mut policy = RandomPolicy::new(Some(7));

        let n = 90_000;
        let mut counts = vec![0usize; k];
        for _ in 0..n {
            let action = policy.select(&state, &table, &actions).unwrap();
            counts[actions.index_of(action).unwrap()] += 1;
        }

        // Each count is Binomial(n, 1/k); allow five standard deviations.
        #[allow(clippy::cast_precision_loss)]
        let (n, k) = (n as f64, k as f64);
        let expected = n / k;
        let sigma = (n * (1.0 / k) * (1.0 - 1.0 / k)).sqrt();
        for count in counts {
            #[allow(clippy::cast_precision_loss)]
            let count = count as f64;
            assert!(
                (count - expected).abs() < 5.0 * sigma,
                "count {count} outside {expected} ± {}",
                5.0 * sigma
            );
        }
    }

    #[test]
    fn test_seed_reproducible() {
        let actions = ActionSet::basic();
        let table = LazyTable::new(actions.len());
        let state = State::Pixel { x: 0, y: 0 };
        let mut a = RandomPolicy::new(Some(42));
        let mut b = RandomPolicy::new(Some(42));
        for _ in 0..50 {
            assert_eq!(
                a.select(&state, &table, &actions).unwrap(),
                b.select(&state, &table, &actions).unwrap()
            );
        }
    }

    #[test]
    fn test_ignores_table() {
        // The state has no row anywhere; the random policy never looks.
        let actions = ActionSet::basic();
        let table = LazyTable::new(actions.len());
        let mut policy = RandomPolicy::new(None);
        assert!(policy
            .select(&State::Tiled { x: -64, y: 0 }, &table, &actions)
            .is_ok());
    }
}
