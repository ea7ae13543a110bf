use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    config::AgentConfig,
    environment::{Action, State},
};

/// Represents errors saving or loading a Q-table snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Q-table I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Q-table encoding failed: {0}")]
    Codec(#[from] bincode::Error),
}

/// The learned value table: a plain `(state, action) -> f64` mapping.
///
/// Missing keys implicitly hold 0.0; lookups never insert, so read-only
/// traffic cannot grow the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    entries: HashMap<(State, Action), f64>,
}

impl QTable {
    pub fn get(&self, state: State, action: Action) -> f64 {
        self.entries.get(&(state, action)).copied().unwrap_or(0.0)
    }

    fn set(&mut self, state: State, action: Action, value: f64) {
        self.entries.insert((state, action), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A tabular Q-learning agent with an epsilon-greedy policy.
///
/// Off-policy one-step temporal difference learning: no eligibility
/// traces, no batching, no function approximation.
pub struct QLearningAgent {
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    epsilon_min: f64,
    epsilon_decay: f64,
    table: QTable,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(config: &AgentConfig, seed: u64) -> Self {
        QLearningAgent {
            alpha: config.alpha,
            gamma: config.gamma,
            epsilon: config.epsilon_start,
            epsilon_min: config.epsilon_min,
            epsilon_decay: config.epsilon_decay,
            table: QTable::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Current Q-value estimate; 0.0 for pairs never learned. Pure lookup.
    pub fn value(&self, state: State, action: Action) -> f64 {
        self.table.get(state, action)
    }

    /// Picks an action epsilon-greedily.
    ///
    /// With probability epsilon the action is uniformly random.
    /// Otherwise all actions tied for the maximum value are collected and
    /// one is sampled uniformly among them; early in training every value
    /// is 0.0 and the tie covers the whole set. Always picking the first
    /// maximum would bias early behavior, so the random tie-break is
    /// deliberate.
    pub fn choose_action(&mut self, state: State) -> Action {
        if self.rng.random::<f64>() < self.epsilon {
            return Action::ALL[self.rng.random_range(0..Action::ALL.len())];
        }

        let values = Action::ALL.map(|a| self.table.get(state, a));
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let best: Vec<Action> = Action::ALL
            .into_iter()
            .zip(values)
            .filter(|&(_, q)| q == max)
            .map(|(a, _)| a)
            .collect();
        best[self.rng.random_range(0..best.len())]
    }

    /// Applies the one-step Bellman backup for an observed transition:
    /// `Q(s, a) += alpha * (r + gamma * max_a' Q(s', a') - Q(s, a))`.
    pub fn learn(&mut self, state: State, action: Action, reward: f64, next_state: State) {
        let old_q = self.table.get(state, action);
        let max_future_q = Action::ALL
            .iter()
            .map(|&a| self.table.get(next_state, a))
            .fold(f64::NEG_INFINITY, f64::max);
        let target = reward + self.gamma * max_future_q;
        self.table.set(state, action, old_q + self.alpha * (target - old_q));
    }

    /// Decays the exploration rate, clamped to its floor. Called once per
    /// completed episode, not per step.
    pub fn update_epsilon(&mut self) {
        self.epsilon = self.epsilon_min.max(self.epsilon * self.epsilon_decay);
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Forces a fixed exploration rate, e.g. 0.0 for greedy evaluation.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Writes a snapshot of the table to a binary file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &self.table)?;
        Ok(())
    }

    /// Reads a previously saved table back, replacing the current one.
    ///
    /// A missing file is not an error: the table is left empty and
    /// `Ok(false)` is returned so callers can report a fresh start.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<bool, PersistError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(false);
        }
        let reader = BufReader::new(File::open(path)?);
        self.table = bincode::deserialize_from(reader)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    fn state(ax: usize, ay: usize, gx: usize, gy: usize) -> State {
        State {
            agent: Position::new(ax, ay),
            adversary: Position::new(gx, gy),
        }
    }

    fn agent_with_epsilon(epsilon: f64, seed: u64) -> QLearningAgent {
        let config = AgentConfig {
            epsilon_start: epsilon,
            ..AgentConfig::default()
        };
        QLearningAgent::new(&config, seed)
    }

    #[test]
    fn unseen_pairs_are_exactly_zero() {
        let agent = QLearningAgent::new(&AgentConfig::default(), 0);
        for action in Action::ALL {
            assert_eq!(agent.value(state(1, 1, 3, 3), action), 0.0);
        }
    }

    #[test]
    fn first_update_from_empty_table_stores_alpha_times_reward() {
        let config = AgentConfig::default();
        let mut agent = QLearningAgent::new(&config, 0);
        let (s, s2) = (state(1, 1, 3, 3), state(2, 1, 3, 2));

        agent.learn(s, Action::Right, 10.0, s2);

        // oldQ and maxFutureQ are both 0.0, so the update reduces to
        // alpha * reward.
        assert_eq!(agent.value(s, Action::Right), config.alpha * 10.0);
        assert_eq!(agent.value(s, Action::Left), 0.0);
    }

    #[test]
    fn repeated_updates_converge_without_overshoot() {
        let mut agent = QLearningAgent::new(&AgentConfig::default(), 0);
        let (s, s2) = (state(1, 1, 3, 3), state(2, 1, 3, 2));
        let reward = 5.0;

        // s2 is never learned, so its future value stays 0.0 and the
        // fixed point of the update is the raw reward.
        let mut previous = 0.0;
        for _ in 0..200 {
            agent.learn(s, Action::Up, reward, s2);
            let q = agent.value(s, Action::Up);
            assert!(q >= previous, "value regressed: {q} < {previous}");
            assert!(q <= reward, "value overshot the target: {q}");
            previous = q;
        }
        assert!((reward - previous).abs() < 1e-6);
    }

    #[test]
    fn greedy_choice_with_unique_maximum_is_deterministic() {
        let mut agent = agent_with_epsilon(0.0, 42);
        let (s, s2) = (state(1, 1, 3, 3), state(2, 1, 3, 2));
        agent.learn(s, Action::Down, 10.0, s2);

        for _ in 0..100 {
            assert_eq!(agent.choose_action(s), Action::Down);
        }
    }

    #[test]
    fn greedy_ties_are_broken_at_random() {
        // All values are 0.0, so the whole action set ties; every action
        // must eventually be chosen even with exploration disabled.
        let mut agent = agent_with_epsilon(0.0, 7);
        let s = state(1, 1, 3, 3);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..400 {
            seen.insert(agent.choose_action(s));
        }
        assert_eq!(seen.len(), Action::ALL.len());
    }

    #[test]
    fn full_exploration_is_roughly_uniform() {
        let mut agent = agent_with_epsilon(1.0, 13);
        let s = state(1, 1, 3, 3);

        let mut counts: HashMap<Action, usize> = HashMap::new();
        for _ in 0..4000 {
            *counts.entry(agent.choose_action(s)).or_insert(0) += 1;
        }
        for action in Action::ALL {
            let n = counts.get(&action).copied().unwrap_or(0);
            assert!(n > 800, "{action:?} drawn only {n} times out of 4000");
        }
    }

    #[test]
    fn epsilon_decays_once_per_call_down_to_the_floor() {
        let config = AgentConfig {
            epsilon_start: 0.5,
            epsilon_min: 0.4,
            epsilon_decay: 0.5,
            ..AgentConfig::default()
        };
        let mut agent = QLearningAgent::new(&config, 0);

        agent.update_epsilon();
        assert_eq!(agent.epsilon(), 0.4);
        agent.update_epsilon();
        assert_eq!(agent.epsilon(), 0.4);
    }

    #[test]
    fn save_and_load_round_trip_the_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("q_table.bin");

        let mut trained = QLearningAgent::new(&AgentConfig::default(), 0);
        let (s, s2) = (state(1, 1, 3, 3), state(2, 1, 3, 2));
        trained.learn(s, Action::Right, 10.0, s2);
        trained.learn(s2, Action::Left, -1.0, s);
        trained.save(&path).unwrap();

        let mut restored = QLearningAgent::new(&AgentConfig::default(), 1);
        assert!(restored.load(&path).unwrap());

        for st in [s, s2] {
            for action in Action::ALL {
                assert_eq!(restored.value(st, action), trained.value(st, action));
            }
        }
        // Keys absent from the snapshot still default to 0.0.
        assert_eq!(restored.value(state(9, 9, 1, 1), Action::Up), 0.0);
    }

    #[test]
    fn loading_a_missing_file_starts_from_an_empty_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut agent = QLearningAgent::new(&AgentConfig::default(), 0);

        let loaded = agent.load(dir.path().join("absent.bin")).unwrap();
        assert!(!loaded);
        assert!(agent.table().is_empty());
    }
}
