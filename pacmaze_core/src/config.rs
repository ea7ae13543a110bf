//! Numeric knobs for the agent, the reward model and the training loop.
//!
//! Everything here is a plain value object injected at construction time;
//! the core components carry no built-in constants.

use serde::{Deserialize, Serialize};

/// Q-learning hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Learning rate (alpha), in (0, 1].
    pub alpha: f64,
    /// Discount factor for future rewards (gamma), in [0, 1].
    pub gamma: f64,
    /// Initial exploration rate.
    pub epsilon_start: f64,
    /// Floor the exploration rate never decays below.
    pub epsilon_min: f64,
    /// Multiplier applied to epsilon once per completed episode.
    pub epsilon_decay: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            alpha: 0.1,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.9995,
        }
    }
}

/// Reward magnitudes used by the environment's step function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Per-move penalty, applied when nothing else happens.
    pub step: f64,
    /// Reward for eating a pellet.
    pub pellet: f64,
    /// Penalty when the adversary catches the agent.
    pub capture: f64,
    /// Bonus for clearing the last pellet; overrides the pellet reward.
    pub win: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            step: -1.0,
            pellet: 10.0,
            capture: -300.0,
            win: 500.0,
        }
    }
}

/// Settings for the outer training loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of episodes to play.
    pub episodes: usize,
    /// Step cap after which an episode is truncated.
    pub max_steps: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: 3000,
            max_steps: 10_000,
        }
    }
}
