use std::fs;
use std::path::{Path, PathBuf};

use isle_engine::LevelData;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("level name '{name}' must be non-empty and use only [a-z0-9_-]")]
    InvalidName { name: String },
    #[error("failed to read level {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level {path} at {at}: {source}")]
    Parse {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn level_path(level_dir: &Path, name: &str) -> Result<PathBuf, LevelError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-'));
    if !valid {
        return Err(LevelError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(level_dir.join(format!("{name}.json")))
}

pub(crate) fn load_level(level_dir: &Path, name: &str) -> Result<LevelData, LevelError> {
    let path = level_path(level_dir, name)?;
    let raw = fs::read_to_string(&path).map_err(|source| LevelError::Read {
        path: path.clone(),
        source,
    })?;
    parse_level_json(&path, &raw)
}

fn parse_level_json(path: &Path, raw: &str) -> Result<LevelData, LevelError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, LevelData>(&mut deserializer).map_err(|error| {
        let at = error.path().to_string();
        LevelError::Parse {
            path: path.to_path_buf(),
            at: if at.is_empty() { ".".to_string() } else { at },
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use isle_engine::{GridService, TileGrid, TilePosition};
    use tempfile::TempDir;

    const MINIMAL: &str = r#"{
        "name": "pond",
        "grid": { "width": 2, "height": 2, "terrain": ["~.", ".."] },
        "player_start": { "x": 1, "y": 1 }
    }"#;

    #[test]
    fn loads_level_from_level_dir() {
        let temp = TempDir::new().expect("temp");
        fs::write(temp.path().join("pond.json"), MINIMAL).expect("write level");

        let level = load_level(temp.path(), "pond").expect("level");
        assert_eq!(level.name, "pond");
        assert_eq!(level.player_start, TilePosition::new(1, 1));
        assert!(level.props.is_empty());
        assert!(level.zoom_triggers.is_empty());
    }

    #[test]
    fn bundled_island_level_is_valid() {
        let raw = include_str!("../../../../assets/levels/island.json");
        let level = parse_level_json(Path::new("island.json"), raw).expect("island level");
        let grid = TileGrid::from_data(&level.grid).expect("island grid");

        assert_eq!(level.player_start, TilePosition::new(17, 4));
        assert_eq!(level.zoom_triggers, vec![TilePosition::new(16, 15)]);
        assert!(grid.can_move_to(TilePosition::new(17, 4), TilePosition::new(17, 5)));
        assert!(grid.can_move_to(TilePosition::new(16, 14), TilePosition::new(16, 15)));
    }

    #[test]
    fn rejects_names_that_escape_level_dir() {
        for name in ["", "../pond", "a/b", "Pond", "pond.json"] {
            assert!(
                matches!(
                    level_path(Path::new("levels"), name),
                    Err(LevelError::InvalidName { .. })
                ),
                "name={name}"
            );
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let temp = TempDir::new().expect("temp");
        let error = load_level(temp.path(), "nowhere").expect_err("missing level");
        assert!(matches!(error, LevelError::Read { .. }));
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{
            "name": "pond",
            "grid": { "width": 2, "height": 2, "terrain": ["~.", ".."] },
            "player_start": { "x": 1, "y": 1 },
            "props": [
                { "kind": "tree", "variant": 1, "x": 1.0, "y": 1.0 },
                { "kind": "unit", "class": "wizard", "x": 1.0, "y": 1.0 }
            ]
        }"#;
        let error = parse_level_json(Path::new("pond.json"), raw).expect_err("bad class");
        let LevelError::Parse { at, .. } = error else {
            panic!("expected parse error, got {error:?}");
        };
        assert!(at.starts_with("props[1]"), "at={at}");
    }
}
