//! Terminal rendering of the grid, the learned values, and the greedy policy

use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::Duration;

use gridq_core::{Cell, InvalidGoalAssignment};
use gridq_rl::{
    EpisodeOutcome, EpisodeSummary, EpisodeTrace, GridEnvironment, QTable, StepEvent,
    TrainingObserver, TrainingReport, ValueFunction,
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Static layout of the grid, copied out of the environment
#[derive(Debug, Clone)]
pub struct Layout {
    pub size: usize,
    pub start: Cell,
    pub obstacles: HashSet<Cell>,
}

impl Layout {
    pub fn from_env(env: &GridEnvironment) -> Self {
        Self {
            size: env.size(),
            start: env.start(),
            obstacles: env.obstacles().into_iter().collect(),
        }
    }

    /// Rows top to bottom; `up` increases `y`, so the highest row prints first
    fn rows(&self) -> impl Iterator<Item = usize> {
        (0..self.size).rev()
    }

    /// Draw the grid: `A` agent, `G` goal, `S` start, `#` obstacle
    pub fn draw(&self, goal: Cell, agent: Option<Cell>) -> String {
        let mut out = String::new();
        for y in self.rows() {
            for x in 0..self.size {
                let cell = Cell::new(x, y);
                let glyph = if agent == Some(cell) {
                    'A'
                } else if cell == goal {
                    'G'
                } else if self.obstacles.contains(&cell) {
                    '#'
                } else if cell == self.start {
                    'S'
                } else {
                    '.'
                };
                out.push(glyph);
                if x + 1 < self.size {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }

    /// Value of every cell, obstacles shown as `#`
    pub fn draw_values(&self, values: &ValueFunction) -> String {
        let mut out = String::new();
        for y in self.rows() {
            for x in 0..self.size {
                let cell = Cell::new(x, y);
                if self.obstacles.contains(&cell) {
                    let _ = write!(out, "{:>7}", "#");
                } else {
                    let _ = write!(out, "{:>7.1}", values.get(cell));
                }
            }
            out.push('\n');
        }
        out
    }

    /// Greedy action of every cell as an arrow
    pub fn draw_policy(&self, q_table: &QTable, goal: Cell) -> String {
        let mut out = String::new();
        for y in self.rows() {
            for x in 0..self.size {
                let cell = Cell::new(x, y);
                let glyph = if cell == goal {
                    'G'
                } else if self.obstacles.contains(&cell) {
                    '#'
                } else {
                    q_table.best_action(cell).arrow()
                };
                out.push(glyph);
                if x + 1 < self.size {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Observer that redraws the grid after every step
pub struct TerminalRenderer {
    layout: Layout,
    delay: Duration,
}

impl TerminalRenderer {
    pub fn new(env: &GridEnvironment, delay: Duration) -> Self {
        Self {
            layout: Layout::from_env(env),
            delay,
        }
    }
}

impl TrainingObserver for TerminalRenderer {
    fn on_step(&mut self, event: &StepEvent) {
        let grid = self.layout.draw(event.goal, Some(event.next_state));
        print!("{CLEAR_SCREEN}{grid}");
        println!(
            "Episode {} | Step {} | Goal = {} | Reward = {:+.1} | epsilon = {:.3}",
            event.episode, event.step, event.goal, event.cumulative_reward, event.epsilon
        );
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }

    fn on_goal_rejected(&mut self, rejection: &InvalidGoalAssignment) {
        println!("Rejected: {rejection}");
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary, trace: &EpisodeTrace) {
        if summary.outcome == EpisodeOutcome::ReachedGoal {
            println!(
                "Goal {} reached in {} steps (episode {})",
                summary.final_goal, summary.steps, summary.episode
            );
        }
        println!("Path: {}", describe_path(self.layout.start, trace));
    }
}

/// The route an episode took from `start`, with its return
pub fn describe_path(start: Cell, trace: &EpisodeTrace) -> String {
    let route: Vec<String> = std::iter::once(start)
        .chain(trace.path())
        .map(|cell| cell.to_string())
        .collect();
    let ending = if trace.reached_terminal() {
        "goal"
    } else {
        "no goal"
    };
    format!(
        "{} [{:+.1}, {ending}]",
        route.join(" -> "),
        trace.total_reward()
    )
}

/// Parse a goal request such as `3 4`, `3,4` or `(3, 4)`
pub fn parse_goal_line(line: &str) -> Option<(i64, i64)> {
    let cleaned: String = line
        .chars()
        .map(|c| if c == ',' || c == '(' || c == ')' { ' ' } else { c })
        .collect();
    let mut parts = cleaned.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((x, y))
}

/// Print the run summary, learned values, and greedy policy
pub fn print_report(report: &TrainingReport) {
    println!("Run {}", report.run_id);
    println!("=========================================");
    println!("Learner:       {}", report.learner);
    println!(
        "Episodes:      {}{}",
        report.episodes.len(),
        if report.completed { "" } else { " (halted)" }
    );
    println!("Total steps:   {}", report.total_steps());
    println!("Success rate:  {:.1}%", report.success_rate() * 100.0);
    println!("Mean reward:   {:+.2}", report.mean_reward());
    println!("Final epsilon: {:.3}", report.final_epsilon);
    println!(
        "Duration:      {} ms",
        (report.finished_at - report.started_at).num_milliseconds()
    );

    let goal = report.final_goal();
    match report.environment() {
        Ok(env) => {
            let layout = Layout::from_env(&env);
            println!("\nState values (goal {goal}):");
            print!("{}", layout.draw_values(&report.values));
            println!("\nGreedy policy:");
            print!("{}", layout.draw_policy(&report.q_table, goal));
        }
        Err(e) => println!("\nCannot rebuild environment: {e}"),
    }

    match report.greedy_path() {
        Ok(rollout) => {
            let path: Vec<String> = rollout.path.iter().map(ToString::to_string).collect();
            let verdict = if rollout.reached_goal {
                "reaches the goal"
            } else {
                "does not reach the goal"
            };
            println!("\nGreedy path {verdict}: {}", path.join(" -> "));
        }
        Err(e) => println!("\nGreedy path unavailable: {e}"),
    }
}
