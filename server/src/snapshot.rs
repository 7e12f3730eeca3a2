//! Whole-registry persistence: save the live game to a file so a restart
//! can resume from it, per §4.6. The file is serde_json, matching the
//! rest of the crate's wire formats; its on-disk shape is otherwise
//! opaque to callers.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::registry::RegistrySnapshot;
use crate::session::SessionSnapshot;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    sessions: Vec<SessionSnapshot>,
}

/// Atomically writes `snapshot` to `path`: write to a sibling temp file,
/// then rename over the destination. A crash mid-write leaves the
/// previous snapshot (or nothing) intact, never a half-written file.
pub fn save(path: &Path, snapshot: &RegistrySnapshot) -> io::Result<()> {
    let file = SnapshotFile {
        sessions: snapshot.sessions.clone(),
    };
    let body = serde_json::to_vec_pretty(&file)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let tmp_path = dir.join(format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("state")
    ));

    std::fs::write(&tmp_path, body)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Loads a previously saved snapshot. A missing file is not an error —
/// it means this is the first run — and is reported as `Ok(None)`.
/// A present-but-malformed file is reported as `Err` so the caller can
/// treat it as the fatal startup condition §4.6 calls for.
pub fn load(path: &Path) -> io::Result<Option<RegistrySnapshot>> {
    let body = match std::fs::read(path) {
        Ok(body) => body,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let file: SnapshotFile = serde_json::from_slice(&body)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("malformed snapshot file: {e}")))?;

    Ok(Some(RegistrySnapshot {
        sessions: file.sessions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::map::Point;
    use crate::model::player::{Direction, Player};
    use crate::model::token::PlayerToken;

    #[test]
    fn save_then_load_round_trips_a_registry_snapshot() {
        let dir = tempfile_dir();
        let path = dir.join("state.json");

        let mut player = Player::new(0, PlayerToken::from_parts(1, 2), "ana".into(), Point::new(1.0, 0.0));
        player.set_direction(Direction::East, 3.0);

        let snapshot = RegistrySnapshot {
            sessions: vec![SessionSnapshot {
                map_id: "map1".into(),
                next_loot_id: 0,
                next_player_id: 1,
                players: vec![player],
                loot: vec![],
            }],
        };

        save(&path, &snapshot).unwrap();
        let restored = load(&path).unwrap().unwrap();
        assert_eq!(restored.sessions.len(), 1);
        assert_eq!(restored.sessions[0].players[0].name, "ana");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile_dir();
        let path = dir.join("does-not-exist.json");
        assert!(load(&path).unwrap().is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn malformed_file_is_a_load_error() {
        let dir = tempfile_dir();
        let path = dir.join("bad.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("session-snapshot-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
