//! The action-value table interface

use crate::{RLError, State};

/// Mapping from state to one estimated return per configured action.
///
/// Rows are indexed by position in the agent's [`crate::ActionSet`]. Every row
/// is created all-zero before anything reads or writes it.
pub trait ActionValueTable: Send + Sync {
    /// Number of actions per row
    fn num_actions(&self) -> usize;

    /// Number of states with a row
    fn len(&self) -> usize;

    /// Whether no state has a row yet
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether rows are created on first sight rather than up front
    fn is_lazy(&self) -> bool;

    /// Make sure `state` has a row.
    ///
    /// Lazy tables insert a zero row if it is absent. Eager tables never grow,
    /// so an absent state is reported as [`RLError::StateOutOfBounds`].
    fn ensure(&mut self, state: &State) -> crate::Result<()>;

    /// Estimates for every action in `state`
    fn row(&self, state: &State) -> crate::Result<&[f64]>;

    /// Mutable estimates for every action in `state`
    fn row_mut(&mut self, state: &State) -> crate::Result<&mut [f64]>;

    /// Every state with its row, in a backend-defined but stable order
    fn entries(&self) -> Box<dyn Iterator<Item = (State, &[f64])> + '_>;

    /// Estimate for one action
    fn value(&self, state: &State, action: usize) -> crate::Result<f64> {
        let row = self.row(state)?;
        row.get(action).copied().ok_or_else(|| {
            RLError::InvalidAction(format!("action index {action} out of {} actions", row.len()))
        })
    }

    /// Largest estimate in `state`
    fn max_value(&self, state: &State) -> crate::Result<f64> {
        Ok(self
            .row(state)?
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max))
    }

    /// Index of the largest estimate in `state`; ties go to the lowest index
    fn best_action(&self, state: &State) -> crate::Result<usize> {
        let row = self.row(state)?;
        let mut best = 0;
        for (i, value) in row.iter().enumerate().skip(1) {
            if *value > row[best] {
                best = i;
            }
        }
        Ok(best)
    }
}
