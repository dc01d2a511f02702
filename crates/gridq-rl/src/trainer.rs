//! Training loop - runs episodes and reports progress to an observer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use gridq_core::{Action, Cell, Config, ConfigError, InvalidGoalAssignment, RunId};

use crate::agent::{Learner, QLearningAgent};
use crate::environment::GridEnvironment;
use crate::experience::{EpisodeTrace, Experience};
use crate::q_table::ValueFunction;
use crate::report::{EpisodeOutcome, EpisodeSummary, TrainingReport};

/// Offsets the goal RNG seed from the agent's so the two streams differ
const GOAL_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Emitted after every completed step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepEvent {
    pub episode: usize,
    /// 1-based step index within the episode
    pub step: usize,
    pub state: Cell,
    pub action: Action,
    pub next_state: Cell,
    pub reward: f64,
    pub cumulative_reward: f64,
    pub epsilon: f64,
    pub goal: Cell,
}

/// Hooks for rendering or reporting. Nothing here feeds back into training.
pub trait TrainingObserver {
    fn on_episode_start(&mut self, _episode: usize, _goal: Cell) {}

    fn on_step(&mut self, _event: &StepEvent) {}

    fn on_goal_rejected(&mut self, _rejection: &InvalidGoalAssignment) {}

    fn on_episode_end(&mut self, _summary: &EpisodeSummary, _trace: &EpisodeTrace) {}

    fn on_training_complete(&mut self, _values: &ValueFunction) {}
}

/// Observer that ignores everything, for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TrainingObserver for NoopObserver {}

/// Stops training between steps when raised
#[derive(Debug, Clone, Default)]
pub struct HaltHandle(Arc<AtomicBool>);

impl HaltHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn halt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Episode driver: start, step until done or out of budget, decay, repeat
pub struct TrainingLoop<L: Learner = QLearningAgent> {
    config: Config,
    env: GridEnvironment,
    learner: L,
    rng: StdRng,
    goal_input: Option<Receiver<(i64, i64)>>,
    halt: HaltHandle,
    trace: EpisodeTrace,
}

impl TrainingLoop<QLearningAgent> {
    /// Validate the config and build a Q-learning run
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let env = GridEnvironment::from_config(&config)?;
        let agent = QLearningAgent::from_config(&config);
        Self::assemble(config, env, agent)
    }
}

impl<L: Learner> TrainingLoop<L> {
    /// Run with a custom learner, whose table must cover the configured grid
    pub fn with_learner(config: Config, learner: L) -> Result<Self, ConfigError> {
        let env = GridEnvironment::from_config(&config)?;
        Self::assemble(config, env, learner)
    }

    fn assemble(config: Config, env: GridEnvironment, learner: L) -> Result<Self, ConfigError> {
        let table_size = learner.q_table().size();
        if table_size != env.size() {
            return Err(ConfigError::SizeMismatch {
                what: "learner q_table",
                expected: env.size(),
                actual: table_size,
            });
        }

        let rng = match config.training.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ GOAL_SEED_SALT),
            None => StdRng::from_entropy(),
        };
        let trace = EpisodeTrace::with_capacity(config.training.max_steps);

        Ok(Self {
            config,
            env,
            learner,
            rng,
            goal_input: None,
            halt: HaltHandle::new(),
            trace,
        })
    }

    /// Accept `(x, y)` goal requests, applied between steps
    pub fn with_goal_input(mut self, input: Receiver<(i64, i64)>) -> Self {
        self.goal_input = Some(input);
        self
    }

    /// Handle that stops the run from another thread
    pub fn halt_handle(&self) -> HaltHandle {
        self.halt.clone()
    }

    pub fn env(&self) -> &GridEnvironment {
        &self.env
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every configured episode (or until halted) and build the report
    pub fn run<O: TrainingObserver + ?Sized>(&mut self, observer: &mut O) -> TrainingReport {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let num_episodes = self.config.training.num_episodes;
        let interval = self.config.training.report_interval;

        info!(
            %run_id,
            learner = self.learner.name(),
            episodes = num_episodes,
            max_steps = self.config.training.max_steps,
            goal_mode = %self.env.goals().mode(),
            "Training started"
        );

        let mut episodes = Vec::with_capacity(num_episodes);
        let mut completed = true;

        for episode in 1..=num_episodes {
            if self.halt.is_halted() {
                completed = false;
                break;
            }

            let summary = self.run_episode(episode, observer);

            if episode == 1 || episode % interval == 0 {
                info!(
                    episode,
                    goal = %summary.goal,
                    reward = summary.total_reward,
                    steps = summary.steps,
                    epsilon = summary.epsilon,
                    "Episode finished"
                );
            }

            let halted = summary.outcome == EpisodeOutcome::Halted;
            episodes.push(summary);
            if halted {
                completed = false;
                break;
            }
        }

        let q_table = self.learner.q_table().clone();
        let values = q_table.value_function();
        observer.on_training_complete(&values);

        let report = TrainingReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            learner: self.learner.name().to_string(),
            params: self.learner.params(),
            config: self.config.clone(),
            episodes,
            final_epsilon: self.learner.epsilon(),
            completed,
            q_table,
            values,
        };

        info!(
            %run_id,
            episodes = report.episodes.len(),
            completed,
            success_rate = report.success_rate(),
            "Training finished"
        );

        report
    }

    fn run_episode<O: TrainingObserver + ?Sized>(
        &mut self,
        episode: usize,
        observer: &mut O,
    ) -> EpisodeSummary {
        // Requests queued between episodes count toward this episode's goal
        let mut rejected_goals = self.drain_goal_input(observer);
        let mut state = self.env.start();
        let goal = self.env.goals_mut().begin_episode(&mut self.rng);
        self.trace.clear();
        observer.on_episode_start(episode, goal);

        let mut total_reward = 0.0;
        let mut outcome = EpisodeOutcome::StepBudgetExhausted;

        for step in 1..=self.config.training.max_steps {
            rejected_goals += self.drain_goal_input(observer);
            if self.halt.is_halted() {
                outcome = EpisodeOutcome::Halted;
                break;
            }

            let action = self.learner.choose_action(state);
            let result = self.env.step(state, action);
            let experience = Experience::from_outcome(state, action, result);
            self.learner.update(&experience);
            self.trace.push(experience);
            total_reward += result.reward;

            let event = StepEvent {
                episode,
                step,
                state,
                action,
                next_state: result.next_state,
                reward: result.reward,
                cumulative_reward: total_reward,
                epsilon: self.learner.epsilon(),
                goal: self.env.goal(),
            };
            trace!(episode, step, %state, %action, next = %result.next_state, "Step");
            observer.on_step(&event);

            state = result.next_state;
            if result.done {
                debug!(episode, goal = %self.env.goal(), steps = step, "Goal reached");
                outcome = EpisodeOutcome::ReachedGoal;
                break;
            }
        }

        // A halted episode is not a completed one
        if outcome != EpisodeOutcome::Halted {
            self.learner.decay_epsilon();
        }

        let summary = EpisodeSummary {
            episode,
            goal,
            final_goal: self.env.goal(),
            total_reward,
            steps: self.trace.len(),
            outcome,
            epsilon: self.learner.epsilon(),
            rejected_goals,
        };
        observer.on_episode_end(&summary, &self.trace);
        summary
    }

    /// Apply pending goal requests in arrival order; returns how many were rejected
    fn drain_goal_input<O: TrainingObserver + ?Sized>(&mut self, observer: &mut O) -> usize {
        let Some(input) = &self.goal_input else {
            return 0;
        };

        let mut rejected = 0;
        let mut disconnected = false;
        loop {
            match input.try_recv() {
                Ok((x, y)) => {
                    if let Err(rejection) = self.env.goals_mut().assign_point(x, y) {
                        warn!(%rejection, "Goal assignment rejected");
                        observer.on_goal_rejected(&rejection);
                        rejected += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if disconnected {
            debug!("Goal input closed");
            self.goal_input = None;
        }
        rejected
    }
}
