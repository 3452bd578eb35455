//! Episode bookkeeping and score history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use uuid::Uuid;

use mephisto_rl_core::{Reward, State, Terminal};

/// One run from the start position to a terminal event
#[derive(Debug, Clone)]
pub struct Episode {
    id: Uuid,
    start_state: State,
    current_state: State,
    score: f64,
    steps: usize,
    started_at: DateTime<Utc>,
}

impl Episode {
    /// Begin an episode at `start_state`
    #[must_use]
    pub fn new(start_state: State) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_state,
            current_state: start_state,
            score: 0.0,
            steps: 0,
            started_at: Utc::now(),
        }
    }

    /// Account for one tick
    pub fn record(&mut self, reward: Reward, next_state: State) {
        self.score += reward.value();
        self.current_state = next_state;
        self.steps += 1;
    }

    /// Close this episode and start over from `start_state`.
    ///
    /// Returns the summary of the episode that just ended.
    pub fn restart(&mut self, start_state: State, reason: Terminal) -> EpisodeSummary {
        let summary = EpisodeSummary {
            id: self.id,
            score: self.score,
            steps: self.steps,
            reason,
            started_at: self.started_at,
            ended_at: Utc::now(),
        };
        *self = Self::new(start_state);
        summary
    }

    /// Episode identifier
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// State the episode started in
    #[must_use]
    pub fn start_state(&self) -> State {
        self.start_state
    }

    /// Latest state
    #[must_use]
    pub fn state(&self) -> State {
        self.current_state
    }

    /// Sum of rewards since the episode started
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Ticks since the episode started
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Terminal record of a finished episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Episode identifier
    pub id: Uuid,
    /// Terminal score
    pub score: f64,
    /// Ticks taken
    pub steps: usize,
    /// What ended it
    pub reason: Terminal,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub ended_at: DateTime<Utc>,
}

/// Terminal scores across episodes, kept for inspection and plotting only
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreHistory {
    episodes: Vec<EpisodeSummary>,
}

impl ScoreHistory {
    /// Create an empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished episode
    pub fn push(&mut self, summary: EpisodeSummary) {
        self.episodes.push(summary);
    }

    /// Number of finished episodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Whether no episode finished yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Most recent summary
    #[must_use]
    pub fn last(&self) -> Option<&EpisodeSummary> {
        self.episodes.last()
    }

    /// Summaries in completion order
    pub fn iter(&self) -> impl Iterator<Item = &EpisodeSummary> {
        self.episodes.iter()
    }

    /// Terminal scores in completion order
    #[must_use]
    pub fn scores(&self) -> Vec<f64> {
        self.episodes.iter().map(|e| e.score).collect()
    }

    /// Mean terminal score
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.scores().mean())
    }

    /// Sample standard deviation of terminal scores
    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        Some(self.scores().std_dev())
    }

    /// Highest terminal score
    #[must_use]
    pub fn best(&self) -> Option<f64> {
        self.episodes.iter().map(|e| e.score).reduce(f64::max)
    }

    /// Number of episodes that ended at the goal
    #[must_use]
    pub fn goals(&self) -> usize {
        self.episodes
            .iter()
            .filter(|e| e.reason == Terminal::Goal)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_record_accumulates() {
        let start = State::Tiled { x: 64, y: 64 };
        let mut episode = Episode::new(start);
        episode.record(Reward(-1.0), State::Tiled { x: 128, y: 64 });
        episode.record(Reward(-1000.0), start);
        assert_eq!(episode.score(), -1001.0);
        assert_eq!(episode.steps(), 2);
        assert_eq!(episode.state(), start);
    }

    #[test]
    fn test_restart_resets_score_and_state() {
        let start = State::Pixel { x: 10, y: 10 };
        let mut episode = Episode::new(start);
        episode.record(Reward(-5.0), State::Pixel { x: 11, y: 10 });
        let old_id = episode.id();

        let summary = episode.restart(start, Terminal::Death);
        assert_eq!(summary.score, -5.0);
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.id, old_id);
        assert_eq!(episode.score(), 0.0);
        assert_eq!(episode.steps(), 0);
        assert_eq!(episode.state(), start);
        assert_ne!(episode.id(), old_id);
    }

    #[test]
    fn test_history_statistics() {
        let mut history = ScoreHistory::new();
        assert_eq!(history.mean(), None);

        let mut episode = Episode::new(State::Pixel { x: 0, y: 0 });
        let outcomes = [
            (-10.0, Terminal::Death),
            (990.0, Terminal::Goal),
            (-20.0, Terminal::TimeLimit),
        ];
        for (score, reason) in outcomes {
            episode.record(Reward(score), State::Pixel { x: 0, y: 0 });
            history.push(episode.restart(State::Pixel { x: 0, y: 0 }, reason));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.scores(), vec![-10.0, 990.0, -20.0]);
        assert_relative_eq!(history.mean().unwrap(), 320.0);
        assert_relative_eq!(history.std_dev().unwrap(), 580.258563, epsilon = 1e-3);
        assert_eq!(history.best(), Some(990.0));
        assert_eq!(history.goals(), 1);
        assert_eq!(history.last().map(|e| e.reason), Some(Terminal::TimeLimit));
    }
}
