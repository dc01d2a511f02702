//! Configuration parsing and validation tests

use gridq_core::{Cell, Config, ConfigError, GoalMode};

#[test]
fn test_empty_toml_yields_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_toml_overrides_only_named_fields() {
    let raw = r#"
        [grid]
        size = 7
        obstacles = [[3, 3], [3, 4]]

        [learning]
        alpha = 0.5

        [goal]
        mode = "random_per_episode"
    "#;

    let config: Config = toml::from_str(raw).unwrap();

    assert_eq!(config.grid.size, 7);
    assert_eq!(config.grid.start, Cell::new(0, 0));
    assert_eq!(config.grid.obstacles, vec![Cell::new(3, 3), Cell::new(3, 4)]);
    assert_eq!(config.learning.alpha, 0.5);
    assert_eq!(config.learning.gamma, 0.95);
    assert_eq!(config.goal.mode, GoalMode::RandomPerEpisode);
    assert!(config.validate().is_ok());
}

#[test]
fn test_toml_roundtrip() {
    let mut config = Config::default();
    config.training.seed = Some(7);
    config.goal.mode = GoalMode::Manual;

    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();

    assert_eq!(parsed, config);
}

#[test]
fn test_unknown_goal_mode_fails_to_parse() {
    let raw = r#"
        [goal]
        mode = "teleport"
    "#;
    assert!(toml::from_str::<Config>(raw).is_err());
}

#[test]
fn test_obstacle_outside_grid_rejected() {
    let raw = r#"
        [grid]
        size = 3
        obstacles = [[3, 0]]

        [goal]
        fixed_goal = [2, 2]
    "#;

    let config: Config = toml::from_str(raw).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OutOfBounds { what: "obstacle", .. })
    ));
}

#[test]
fn test_fully_blocked_grid_rejected() {
    let raw = r#"
        [grid]
        size = 2
        obstacles = [[1, 0], [0, 1], [1, 1]]
    "#;

    let config: Config = toml::from_str(raw).unwrap();
    assert_eq!(config.validate(), Err(ConfigError::NoGoalCells));
}

#[test]
fn test_error_messages_name_the_field() {
    let mut config = Config::default();
    config.learning.gamma = -0.1;

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("gamma"));
}
