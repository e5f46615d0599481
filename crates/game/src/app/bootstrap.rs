use isle_engine::{
    resolve_app_paths, AppPaths, LevelData, LoopConfig, SceneConfig, StartupError, TeamColor,
    UnitClass,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::level_file::{load_level, LevelError};

const LEVEL_ENV_VAR: &str = "ISLE_LEVEL";
const HERO_ENV_VAR: &str = "ISLE_HERO";
const DEFAULT_LEVEL: &str = "island";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: SceneConfig,
    pub(crate) level: LevelData,
    pub(crate) paths: AppPaths,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Isle Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        sprite_root = %paths.sprite_root.display(),
        level_dir = %paths.level_dir.display(),
        "startup"
    );

    let level_name = std::env::var(LEVEL_ENV_VAR).unwrap_or_else(|_| DEFAULT_LEVEL.to_string());
    let level = load_level(&paths.level_dir, level_name.trim())?;

    let (hero, team) = std::env::var(HERO_ENV_VAR)
        .ok()
        .map(|raw| parse_hero_selection(&raw))
        .unwrap_or_default();
    let scene = SceneConfig {
        hero,
        team,
        ..SceneConfig::default()
    };

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene,
        level,
        paths,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// `class` or `class:team`, e.g. `lancer:red`. Unknown parts fall back to
/// the defaults with a warning.
fn parse_hero_selection(raw: &str) -> (UnitClass, TeamColor) {
    let (class_part, team_part) = match raw.split_once(':') {
        Some((class, team)) => (class, Some(team)),
        None => (raw, None),
    };

    let hero = UnitClass::from_name(class_part).unwrap_or_else(|| {
        warn!(
            env_var = HERO_ENV_VAR,
            value = raw,
            "unknown hero class; falling back to default"
        );
        UnitClass::default()
    });
    let team = match team_part {
        Some(team) => parse_team(team).unwrap_or_else(|| {
            warn!(
                env_var = HERO_ENV_VAR,
                value = raw,
                "unknown team colour; falling back to default"
            );
            TeamColor::default()
        }),
        None => TeamColor::default(),
    };
    (hero, team)
}

fn parse_team(name: &str) -> Option<TeamColor> {
    TeamColor::ALL
        .into_iter()
        .find(|team| team.name().eq_ignore_ascii_case(name.trim()))
}
