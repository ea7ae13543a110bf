use std::collections::HashSet;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{Position, config::RewardConfig, maze::Maze};

/// Represents the moves an agent can decide to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// The complete, fixed action set shared by agent and adversary.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Unit displacement vector for this action.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Up => (0, -1),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }
}

/// The learning state: where the agent and the adversary stand.
///
/// Equal position pairs compare and hash equal, which makes this usable
/// as a Q-table key component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    pub agent: Position,
    pub adversary: Position,
}

/// The outcome of a single environment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: State,
    pub reward: f64,
    pub done: bool,
}

/// Manages the pursuit game: maze geometry, the remaining pellets and
/// both positions. One `step` performs exactly one agent move and one
/// adversary move, turn-based and synchronous.
pub struct Environment {
    maze: Maze,
    rewards: RewardConfig,
    pellets: HashSet<Position>,
    agent_pos: Position,
    adversary_pos: Position,
    score: f64,
    rng: StdRng,
}

impl Environment {
    pub fn new(maze: Maze, rewards: RewardConfig, seed: u64) -> Self {
        let agent_pos = maze.agent_start();
        let adversary_pos = maze.adversary_start();
        let pellets = maze.pellets().clone();
        Environment {
            maze,
            rewards,
            pellets,
            agent_pos,
            adversary_pos,
            score: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restores the start-of-episode state: both entities back at their
    /// start cells, the full pellet set, score zeroed. Callable any
    /// number of times.
    pub fn reset(&mut self) -> State {
        self.agent_pos = self.maze.agent_start();
        self.adversary_pos = self.maze.adversary_start();
        self.pellets = self.maze.pellets().clone();
        self.score = 0.0;
        self.state()
    }

    /// Advances the game by one turn.
    ///
    /// The agent attempts `action`; moves into walls (or off the grid)
    /// leave it in place. The adversary then attempts a uniformly random
    /// action under the same blocking rule; it has no pursuit logic by
    /// design. Capture takes precedence over pellets, and clearing the
    /// last pellet pays the win bonus instead of the pellet reward.
    pub fn step(&mut self, action: Action) -> Transition {
        self.agent_pos = self.resolve_move(self.agent_pos, action);

        let adversary_action = Action::ALL[self.rng.random_range(0..Action::ALL.len())];
        self.adversary_pos = self.resolve_move(self.adversary_pos, adversary_action);

        let mut reward = self.rewards.step;
        let mut done = false;

        if self.agent_pos == self.adversary_pos {
            reward = self.rewards.capture;
            done = true;
        } else if self.pellets.remove(&self.agent_pos) {
            reward = self.rewards.pellet;
            if self.pellets.is_empty() {
                reward = self.rewards.win;
                done = true;
            }
        }

        self.score += reward;
        Transition {
            state: self.state(),
            reward,
            done,
        }
    }

    /// Target cell for a move, or the current cell when blocked.
    fn resolve_move(&self, from: Position, action: Action) -> Position {
        let (dx, dy) = action.delta();
        match from.offset(dx, dy) {
            Some(target) if !self.maze.is_blocked(target) => target,
            _ => from,
        }
    }

    pub fn state(&self) -> State {
        State {
            agent: self.agent_pos,
            adversary: self.adversary_pos,
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    /// The pellets still on the board this episode.
    pub fn pellets(&self) -> &HashSet<Position> {
        &self.pellets
    }

    pub fn agent_position(&self) -> Position {
        self.agent_pos
    }

    pub fn adversary_position(&self) -> Position {
        self.adversary_pos
    }

    /// Reward accumulated since the last reset.
    pub fn score(&self) -> f64 {
        self.score
    }
}
