//! Policy abstraction for action selection

use crate::{Action, ActionSet, ActionValueTable, State};

/// Core policy trait for selecting actions
pub trait Policy: Send + Sync {
    /// Select an action for `state`
    fn select(
        &mut self,
        state: &State,
        table: &dyn ActionValueTable,
        actions: &ActionSet,
    ) -> crate::Result<Action>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
