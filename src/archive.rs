//! Zip archive codec for project import and export.
//!
//! An archive is flat: one entry per file, named by the file's path, holding
//! its text verbatim. History and project settings are not included. Every
//! entry is read as UTF-8; binary entries are decoded lossily and will not
//! survive a round trip.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::VaultResult;
use crate::models::{normalize_path, Framework};

/// Name used when an archive's file name yields nothing usable.
pub const DEFAULT_IMPORT_NAME: &str = "Imported project";

/// Entry points probed, in order, when importing.
const ENTRY_CANDIDATES: &[&str] = &[
    "src/main.jsx",
    "src/main.tsx",
    "src/index.jsx",
    "src/index.tsx",
    "src/App.jsx",
    "index.html",
    "index.js",
    "main.js",
];

/// Zip bytes plus the file name they were loaded from or should be saved as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A decoded archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub path: String,
    pub content: String,
}

/// Write `(path, content)` pairs into a deflated zip.
pub fn encode<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> VaultResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (path, content) in entries {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(path, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Read every file entry of a zip, sorted by path.
///
/// Directory entries are skipped and paths are normalized like file paths in
/// the store; entries whose path cannot be normalized are skipped. If a path
/// appears twice the later entry wins.
pub fn decode(bytes: &[u8]) -> VaultResult<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = BTreeMap::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let path = match normalize_path(&name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping archive entry {:?}: {}", name, e);
                continue;
            }
        };

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        entries.insert(path, String::from_utf8_lossy(&buf).into_owned());
    }

    Ok(entries
        .into_iter()
        .map(|(path, content)| ArchiveEntry { path, content })
        .collect())
}

/// `React` if any entry mentions react or is a JSX/TSX file, otherwise `Vanilla`.
pub fn detect_framework(entries: &[ArchiveEntry]) -> Framework {
    let is_react = entries.iter().any(|e| {
        let path = e.path.to_ascii_lowercase();
        path.ends_with(".jsx") || path.ends_with(".tsx") || react_pattern().is_match(&e.content)
    });

    if is_react {
        Framework::React
    } else {
        Framework::Vanilla
    }
}

/// Pick the file a preview should start from.
pub fn detect_entry_file(entries: &[ArchiveEntry]) -> String {
    ENTRY_CANDIDATES
        .iter()
        .find(|candidate| entries.iter().any(|e| e.path == **candidate))
        .map(|candidate| candidate.to_string())
        .or_else(|| entries.iter().map(|e| e.path.clone()).min())
        .unwrap_or_else(|| "index.html".to_string())
}

/// Project name for an archive: the file name without directories or extension.
pub fn project_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };
    let stem = stem.trim();

    if stem.is_empty() {
        DEFAULT_IMPORT_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// File name used when exporting a project.
pub fn export_file_name(project_name: &str) -> String {
    let safe: String = project_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect();
    if safe.is_empty() {
        "project.zip".to_string()
    } else {
        format!("{safe}.zip")
    }
}

fn react_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)react").expect("valid react pattern"))
}
