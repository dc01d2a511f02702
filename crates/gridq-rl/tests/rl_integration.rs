//! Integration tests for the training loop
//!
//! These tests run full training sessions headlessly and check what the
//! learned table and report look like afterwards.

#![allow(clippy::float_cmp)]

use std::sync::mpsc;

use gridq_core::{Cell, Config, ConfigError, GoalMode, GridQError};
use gridq_rl::{
    EpisodeOutcome, GridEnvironment, Learner, NoopObserver, TrainingLoop, TrainingReport,
};

fn create_test_config(episodes: usize, seed: u64) -> Config {
    let mut config = Config::default();
    config.training.num_episodes = episodes;
    config.training.seed = Some(seed);
    config
}

/// 5x5 grid, obstacle at (2,2), goal at (4,4): the greedy policy must find the goal
#[tokio::test]
async fn test_learns_path_around_obstacle() {
    let config = create_test_config(1000, 42);
    let mut trainer = TrainingLoop::new(config).unwrap();
    let report = trainer.run(&mut NoopObserver);

    assert!(report.completed);
    assert_eq!(report.episodes.len(), 1000);

    let rollout = trainer.learner().greedy_path(trainer.env(), 25);
    assert!(rollout.reached_goal, "greedy path: {:?}", rollout.path);
    assert_eq!(rollout.path.first(), Some(&Cell::new(0, 0)));
    assert_eq!(rollout.path.last(), Some(&Cell::new(4, 4)));
    assert!(!rollout.path.contains(&Cell::new(2, 2)));

    // The terminal cell is never a state the agent acts from
    assert_eq!(report.values.get(Cell::new(4, 4)), 0.0);
    assert_eq!(report.values.get(Cell::new(2, 2)), 0.0);

    // Next to the goal the value approaches the goal reward
    assert!(report.values.get(Cell::new(4, 3)) > 5.0);
    assert!(report.values.get(Cell::new(3, 4)) > 5.0);
}

#[tokio::test]
async fn test_epsilon_schedule_over_run() {
    let config = create_test_config(30, 1);
    let mut trainer = TrainingLoop::new(config).unwrap();
    let report = trainer.run(&mut NoopObserver);

    let mut previous = 0.9;
    for summary in &report.episodes {
        assert!(summary.epsilon <= previous);
        assert!(summary.epsilon >= 0.01);
        previous = summary.epsilon;
    }

    let expected = 0.9 * 0.995_f64.powi(30);
    assert!((report.final_epsilon - expected).abs() < 1e-9);
    assert_eq!(trainer.learner().epsilon(), report.final_epsilon);
}

#[tokio::test]
async fn test_random_goal_per_episode() {
    let mut config = create_test_config(200, 9);
    config.goal.mode = GoalMode::RandomPerEpisode;

    let mut trainer = TrainingLoop::new(config).unwrap();
    let report = trainer.run(&mut NoopObserver);

    let mut goals = std::collections::HashSet::new();
    for summary in &report.episodes {
        assert_ne!(summary.goal, Cell::new(0, 0));
        assert_ne!(summary.goal, Cell::new(2, 2));
        assert_eq!(summary.goal, summary.final_goal);
        goals.insert(summary.goal);
    }
    assert!(goals.len() > 5, "goals should vary: {goals:?}");
}

#[tokio::test]
async fn test_seeded_runs_are_reproducible() {
    let mut first = TrainingLoop::new(create_test_config(50, 5)).unwrap();
    let mut second = TrainingLoop::new(create_test_config(50, 5)).unwrap();

    let a = first.run(&mut NoopObserver);
    let b = second.run(&mut NoopObserver);

    assert_eq!(a.q_table, b.q_table);
    assert_eq!(a.episodes, b.episodes);
    assert_ne!(a.run_id, b.run_id);
}

#[tokio::test]
async fn test_manual_goal_from_another_thread() {
    let mut config = create_test_config(20, 3);
    config.goal.mode = GoalMode::Manual;

    let (tx, rx) = mpsc::channel();
    let sender = std::thread::spawn(move || {
        tx.send((1, 4)).unwrap();
        tx.send((-3, 0)).unwrap();
    });
    sender.join().unwrap();

    let mut trainer = TrainingLoop::new(config).unwrap().with_goal_input(rx);
    let report = trainer.run(&mut NoopObserver);

    let first = &report.episodes[0];
    assert_eq!(first.goal, Cell::new(1, 4));
    assert_eq!(first.final_goal, Cell::new(1, 4));
    assert_eq!(first.rejected_goals, 1);
    assert!(report.episodes[1..].iter().all(|e| e.goal == Cell::new(1, 4)));
    assert_eq!(report.final_goal(), Cell::new(1, 4));
}

#[tokio::test]
async fn test_report_json_roundtrip() {
    let mut trainer = TrainingLoop::new(create_test_config(40, 11)).unwrap();
    let report = trainer.run(&mut NoopObserver);

    let json = report.to_json().unwrap();
    let parsed = TrainingReport::from_json(&json).unwrap();

    assert_eq!(parsed.run_id, report.run_id);
    assert_eq!(parsed.q_table, report.q_table);
    assert_eq!(parsed.values, report.values);
    assert_eq!(parsed.episodes, report.episodes);
    assert_eq!(parsed.config, report.config);
    assert_eq!(parsed.learner, "q_learning");
}

#[tokio::test]
async fn test_report_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    let mut trainer = TrainingLoop::new(create_test_config(10, 2)).unwrap();
    let report = trainer.run(&mut NoopObserver);
    report.save(&path).unwrap();

    let loaded = TrainingReport::load(&path).unwrap();
    assert_eq!(loaded.q_table, report.q_table);
    assert!(loaded.greedy_path().is_ok());

    assert!(TrainingReport::load(&dir.path().join("missing.json")).is_err());
}

#[tokio::test]
async fn test_malformed_report_rejected() {
    let mut trainer = TrainingLoop::new(create_test_config(1, 2)).unwrap();
    let report = trainer.run(&mut NoopObserver);

    let mut value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    value["q_table"]["size"] = serde_json::json!(6);

    assert!(TrainingReport::from_json(&value.to_string()).is_err());
}

#[tokio::test]
async fn test_report_with_mismatched_grid_rejected() {
    let mut trainer = TrainingLoop::new(create_test_config(1, 2)).unwrap();
    let report = trainer.run(&mut NoopObserver);

    // Tables stay 5x5 while the config claims a 7x7 grid
    let mut value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    value["config"]["grid"]["size"] = serde_json::json!(7);
    value["config"]["goal"]["fixed_goal"] = serde_json::json!([6, 6]);

    let err = TrainingReport::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(
        err,
        GridQError::Config(ConfigError::SizeMismatch {
            expected: 7,
            actual: 5,
            ..
        })
    ));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    std::fs::write(&path, value.to_string()).unwrap();
    assert!(TrainingReport::load(&path).is_err());
}

#[tokio::test]
async fn test_summary_outcomes_are_consistent() {
    let mut trainer = TrainingLoop::new(create_test_config(100, 8)).unwrap();
    let report = trainer.run(&mut NoopObserver);

    for summary in &report.episodes {
        match summary.outcome {
            EpisodeOutcome::ReachedGoal => assert!(summary.steps <= 100),
            EpisodeOutcome::StepBudgetExhausted => assert_eq!(summary.steps, 100),
            EpisodeOutcome::Halted => panic!("nothing halted this run"),
        }
    }
    assert_eq!(
        report.total_steps(),
        report.episodes.iter().map(|e| e.steps).sum::<usize>()
    );
}

#[test]
fn test_environment_matches_report_config() {
    let config = create_test_config(1, 0);
    let env = GridEnvironment::from_config(&config).unwrap();
    assert_eq!(env.size(), 5);
    assert_eq!(env.obstacles(), vec![Cell::new(2, 2)]);
    assert_eq!(env.cells().count(), 25);
}
