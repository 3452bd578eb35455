//! Discrete actions and the ordered action set

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RLError;

/// One discrete control choice available to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Walk left
    Left,
    /// Walk right
    Right,
    /// Jump straight up
    Jump,
    /// Jump while walking left
    JumpLeft,
    /// Jump while walking right
    JumpRight,
    /// Dash without a direction
    Dash,
    /// Dash to the left
    DashLeft,
    /// Dash to the right
    DashRight,
    /// Dash upwards
    DashUp,
}

impl Action {
    /// Every action, in declaration order
    pub const ALL: [Action; 9] = [
        Action::Left,
        Action::Right,
        Action::Jump,
        Action::JumpLeft,
        Action::JumpRight,
        Action::Dash,
        Action::DashLeft,
        Action::DashRight,
        Action::DashUp,
    ];

    /// Canonical upper-snake name, used in configuration and persistence
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Jump => "JUMP",
            Self::JumpLeft => "JUMP_LEFT",
            Self::JumpRight => "JUMP_RIGHT",
            Self::Dash => "DASH",
            Self::DashLeft => "DASH_LEFT",
            Self::DashRight => "DASH_RIGHT",
            Self::DashUp => "DASH_UP",
        }
    }

    /// Key states the host presses to perform this action
    #[must_use]
    pub fn controls(self) -> ControlInput {
        let (left, right, up, dash) = match self {
            Self::Left => (true, false, false, false),
            Self::Right => (false, true, false, false),
            Self::Jump => (false, false, true, false),
            Self::JumpLeft => (true, false, true, false),
            Self::JumpRight => (false, true, true, false),
            Self::Dash => (false, false, false, true),
            Self::DashLeft => (true, false, false, true),
            Self::DashRight => (false, true, false, true),
            Self::DashUp => (false, false, true, true),
        };
        ControlInput { left, right, up, dash }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| RLError::InvalidAction(format!("unknown action name: {s}")))
    }
}

/// Held-key snapshot translated from an [`Action`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInput {
    /// Left key held
    pub left: bool,
    /// Right key held
    pub right: bool,
    /// Up/jump key held
    pub up: bool,
    /// Dash key held
    pub dash: bool,
}

impl ControlInput {
    /// Horizontal direction implied by the held keys: -1, 0 or 1
    #[must_use]
    pub fn horizontal(&self) -> i8 {
        i8::from(self.right) - i8::from(self.left)
    }
}

/// Fixed, ordered enumeration of the actions available to the agent.
///
/// The order is the tie-break authority for greedy selection and is never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionSet {
    actions: Vec<Action>,
}

impl ActionSet {
    /// Create an action set, rejecting empty or duplicated enumerations
    pub fn new(actions: Vec<Action>) -> crate::Result<Self> {
        if actions.is_empty() {
            return Err(RLError::InvalidConfiguration(
                "action set must not be empty".to_string(),
            ));
        }
        for (i, action) in actions.iter().enumerate() {
            if actions[..i].contains(action) {
                return Err(RLError::InvalidConfiguration(format!(
                    "action {action} listed more than once"
                )));
            }
        }
        Ok(Self { actions })
    }

    /// `LEFT, RIGHT, JUMP_LEFT, JUMP_RIGHT`
    #[must_use]
    pub fn basic() -> Self {
        Self {
            actions: vec![Action::Left, Action::Right, Action::JumpLeft, Action::JumpRight],
        }
    }

    /// The larger set including jump and dash variants
    #[must_use]
    pub fn extended() -> Self {
        Self {
            actions: Action::ALL.to_vec(),
        }
    }

    /// Number of actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Always false; kept for API symmetry with collections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Action at a position in the fixed ordering
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Action> {
        self.actions.get(index).copied()
    }

    /// Position of an action in the fixed ordering
    #[must_use]
    pub fn index_of(&self, action: Action) -> Option<usize> {
        self.actions.iter().position(|a| *a == action)
    }

    /// Position of an action, or `InvalidAction` if it is not configured
    pub fn require_index(&self, action: Action) -> crate::Result<usize> {
        self.index_of(action).ok_or_else(|| {
            RLError::InvalidAction(format!("{action} is not in the configured action set"))
        })
    }

    /// Iterate in the fixed ordering
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.actions.iter().copied()
    }

    /// Canonical names in the fixed ordering
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.name().to_string()).collect()
    }

    /// Uniformly sample one action
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        self.actions[rng.gen_range(0..self.actions.len())]
    }
}

impl Default for ActionSet {
    fn default() -> Self {
        Self::basic()
    }
}

impl TryFrom<Vec<Action>> for ActionSet {
    type Error = RLError;

    fn try_from(actions: Vec<Action>) -> Result<Self, Self::Error> {
        Self::new(actions)
    }
}

impl From<ActionSet> for Vec<Action> {
    fn from(set: ActionSet) -> Self {
        set.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>().unwrap(), action);
        }
        assert!("SIDESTEP".parse::<Action>().is_err());
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = ActionSet::new(Vec::new()).unwrap_err();
        assert!(matches!(err, RLError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let err = ActionSet::new(vec![Action::Left, Action::Right, Action::Left]).unwrap_err();
        assert!(matches!(err, RLError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_ordering_preserved() {
        let set = ActionSet::new(vec![Action::JumpRight, Action::Left]).unwrap();
        assert_eq!(set.get(0), Some(Action::JumpRight));
        assert_eq!(set.index_of(Action::Left), Some(1));
        assert_eq!(set.index_of(Action::Dash), None);
        assert!(set.require_index(Action::Dash).is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&ActionSet::basic()).unwrap();
        assert_eq!(json, r#"["LEFT","RIGHT","JUMP_LEFT","JUMP_RIGHT"]"#);

        let parsed: ActionSet = serde_json::from_str(r#"["DASH_UP","JUMP"]"#).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(serde_json::from_str::<ActionSet>("[]").is_err());
    }

    #[test]
    fn test_controls() {
        let jump_left = Action::JumpLeft.controls();
        assert!(jump_left.left && jump_left.up && !jump_left.right && !jump_left.dash);
        assert_eq!(jump_left.horizontal(), -1);
        assert_eq!(Action::DashUp.controls().horizontal(), 0);
        assert!(Action::DashRight.controls().dash);
    }
}
