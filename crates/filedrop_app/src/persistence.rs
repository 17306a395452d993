use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use filedrop_core::{AppViewModel, ItemResult, Origin};
use filedrop_logging::{filedrop_error, filedrop_info, filedrop_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

const HISTORY_FILENAME: &str = "filedrop_history.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Outcome {
    Link(String),
    Error(String),
    /// Still in flight when the session ended.
    Unfinished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HistoryEntry {
    pub name: String,
    pub remote: bool,
    pub size: Option<u64>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Session {
    pub finished_utc: String,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryFile {
    sessions: Vec<Session>,
}

#[derive(Debug, Error)]
pub(crate) enum HistoryError {
    #[error("cannot read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("{path:?} is not a history file: {message}")]
    Corrupt { path: PathBuf, message: String },
    #[error("cannot serialize history: {0}")]
    Serialize(String),
    #[error("cannot write history in {dir:?}: {source}")]
    Write { dir: PathBuf, source: io::Error },
}

/// The history file of one directory.
///
/// Existing sessions are never dropped: a file that does not parse is renamed
/// to a timestamped `.bak` before a fresh one is written, and a file that
/// cannot be read at all blocks the write.
pub(crate) struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILENAME)
    }

    /// A missing file is an empty history.
    pub(crate) fn load(&self) -> Result<Vec<Session>, HistoryError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(HistoryError::Read { path, source }),
        };
        ron::from_str::<HistoryFile>(&content)
            .map(|history| history.sessions)
            .map_err(|err| HistoryError::Corrupt {
                path,
                message: err.to_string(),
            })
    }

    pub(crate) fn append(&self, session: Session) -> Result<PathBuf, HistoryError> {
        let mut sessions = match self.load() {
            Ok(sessions) => sessions,
            Err(HistoryError::Corrupt { path, message }) => {
                let backup = self.set_aside(&path)?;
                filedrop_warn!(
                    "History {:?} does not parse ({}); moved to {:?}",
                    path,
                    message,
                    backup
                );
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        sessions.push(session);

        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&HistoryFile { sessions }, pretty)
            .map_err(|err| HistoryError::Serialize(err.to_string()))?;
        self.replace(&content)
    }

    fn set_aside(&self, path: &Path) -> Result<PathBuf, HistoryError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let backup = self.dir.join(format!("{HISTORY_FILENAME}.{stamp}.bak"));
        fs::rename(path, &backup).map_err(|source| self.write_error(source))?;
        Ok(backup)
    }

    /// Temp file in the same directory, then rename over the target.
    fn replace(&self, content: &str) -> Result<PathBuf, HistoryError> {
        fs::create_dir_all(&self.dir).map_err(|source| self.write_error(source))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|source| self.write_error(source))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| self.write_error(source))?;
        let target = self.path();
        tmp.persist(&target)
            .map_err(|err| self.write_error(err.error))?;
        Ok(target)
    }

    fn write_error(&self, source: io::Error) -> HistoryError {
        HistoryError::Write {
            dir: self.dir.clone(),
            source,
        }
    }
}

/// Appends this session's items to the history file in `dir`.
pub(crate) fn save_history(dir: &Path, view: &AppViewModel) -> Option<PathBuf> {
    if view.items.is_empty() {
        return None;
    }

    let session = Session {
        finished_utc: Utc::now().to_rfc3339(),
        entries: view
            .items
            .iter()
            .map(|row| HistoryEntry {
                name: row.name.clone(),
                remote: row.origin == Origin::Remote,
                size: row.size_bytes,
                outcome: match &row.result {
                    Some(ItemResult::Link(link)) => Outcome::Link(link.clone()),
                    Some(ItemResult::Error(error)) => Outcome::Error(error.clone()),
                    None => Outcome::Unfinished,
                },
            })
            .collect(),
    };

    match HistoryStore::new(dir).append(session) {
        Ok(path) => {
            filedrop_info!("Saved session history to {:?}", path);
            Some(path)
        }
        Err(err) => {
            filedrop_error!("History not saved: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedrop_core::{update, AppState, LocalFile, Msg};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn finished_session() -> AppViewModel {
        let (state, _) = update(
            AppState::new(),
            Msg::FilesSubmitted(vec![
                LocalFile::new("/d/a.txt", "a.txt", 3),
                LocalFile::new("/d/b.txt", "b.txt", 4),
            ]),
        );
        let (state, _) = update(
            state,
            Msg::UploadDone {
                item_id: 0,
                result: Ok("https://host/x.txt".to_string()),
            },
        );
        state.view()
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "bak"))
            .collect()
    }

    #[test]
    fn sessions_accumulate_across_saves() {
        let temp = TempDir::new().unwrap();
        let view = finished_session();

        save_history(temp.path(), &view).expect("first save");
        save_history(temp.path(), &view).expect("second save");

        let sessions = HistoryStore::new(temp.path()).load().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(
            sessions[0].entries[0],
            HistoryEntry {
                name: "a.txt".to_string(),
                remote: false,
                size: Some(3),
                outcome: Outcome::Link("https://host/x.txt".to_string()),
            }
        );
        assert_eq!(sessions[0].entries[1].outcome, Outcome::Unfinished);
        assert!(backups(temp.path()).is_empty());
    }

    #[test]
    fn empty_session_writes_nothing() {
        let temp = TempDir::new().unwrap();
        assert!(save_history(temp.path(), &AppState::new().view()).is_none());
        assert!(HistoryStore::new(temp.path()).load().unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_created() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("history").join("today");

        let path = save_history(&nested, &finished_session()).expect("save");

        assert_eq!(path, nested.join(HISTORY_FILENAME));
        assert_eq!(HistoryStore::new(&nested).load().unwrap().len(), 1);
    }

    #[test]
    fn damaged_history_is_moved_aside_not_lost() {
        let temp = TempDir::new().unwrap();
        let truncated = r#"(sessions: [(finished_utc: "old", entries: ["#;
        fs::write(temp.path().join(HISTORY_FILENAME), truncated).unwrap();
        assert!(matches!(
            HistoryStore::new(temp.path()).load(),
            Err(HistoryError::Corrupt { .. })
        ));

        save_history(temp.path(), &finished_session()).expect("save");

        let backups = backups(temp.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), truncated);
        assert_eq!(HistoryStore::new(temp.path()).load().unwrap().len(), 1);
    }

    #[test]
    fn unreadable_history_blocks_the_write() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join(HISTORY_FILENAME);
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "old").unwrap();

        assert!(save_history(temp.path(), &finished_session()).is_none());

        assert!(blocker.is_dir());
        assert_eq!(fs::read_to_string(blocker.join("keep")).unwrap(), "old");
        assert!(backups(temp.path()).is_empty());
    }
}
