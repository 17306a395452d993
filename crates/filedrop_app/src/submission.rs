//! Turns command-line and stdin input into queue messages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filedrop_core::{LocalFile, Msg};
use filedrop_logging::filedrop_warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    File(PathBuf),
    Url(String),
}

/// Classifies one input line. Blank lines yield `None`.
pub fn classify(line: &str) -> Option<Submission> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.contains("://") || line.starts_with("magnet:") {
        Some(Submission::Url(line.to_string()))
    } else {
        Some(Submission::File(PathBuf::from(line)))
    }
}

/// Reads the metadata needed to enqueue a local file.
pub fn local_file(path: &Path) -> io::Result<LocalFile> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(LocalFile::new(path, name, meta.len()))
}

/// Consecutive files form one batch, like a multi-file pick; each URL is its
/// own submission. Unreadable files are reported and skipped.
pub fn into_messages(submissions: Vec<Submission>) -> Vec<Msg> {
    let mut messages = Vec::new();
    let mut batch = Vec::new();

    for submission in submissions {
        match submission {
            Submission::File(path) => match local_file(&path) {
                Ok(file) => batch.push(file),
                Err(err) => {
                    filedrop_warn!("Skipping {}: {}", path.display(), err);
                }
            },
            Submission::Url(url) => {
                if !batch.is_empty() {
                    messages.push(Msg::FilesSubmitted(std::mem::take(&mut batch)));
                }
                messages.push(Msg::UrlSubmitted(url));
            }
        }
    }
    if !batch.is_empty() {
        messages.push(Msg::FilesSubmitted(batch));
    }
    messages
}
