//! JSON snapshot files: manual save/load of the whole canvas.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

use crate::ai::ChatMessage;
use crate::mindmap::model::{Edge, Level, LevelNo, Node, NodeId, Viewport};
use crate::store::error::AppError;

pub const SNAPSHOT_VERSION: &str = "1.0";
pub const MAX_SNAPSHOT_BYTES: u64 = 10 * 1024 * 1024;
const REQUIRED_FIELDS: [&str; 3] = ["version", "nodes", "levels"];
// Id-bearing keys per array; all of them must hold UUID strings
const ID_FIELDS: [(&str, &[&str]); 2] = [("nodes", &["id", "parentId"]), ("edges", &["id", "source", "target"])];

fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    pub version: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default = "now_utc", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default = "now_utc", with = "time::serde::rfc3339")]
    pub exported_at: OffsetDateTime,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub viewport: Viewport,
    pub levels: Vec<Level>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selected_path: BTreeMap<LevelNo, NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat: Vec<ChatMessage>,
}

#[derive(Debug)]
pub enum SnapshotError {
    NotJson(String),
    NotAnObject,
    MissingField(&'static str),
    BadId { field: &'static str, id: String },
    Invalid(String),
    BadExtension(PathBuf),
    TooLarge { bytes: u64, max: u64 },
    Io(std::io::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(msg) => write!(f, "file is not valid JSON: {msg}"),
            Self::NotAnObject => f.write_str("snapshot must be a JSON object"),
            Self::MissingField(field) => write!(f, "snapshot is missing the required '{field}' field"),
            Self::BadId { field, id } => write!(f, "{field} contains id '{id}', which is not a UUID"),
            Self::Invalid(msg) => write!(f, "snapshot has an invalid structure: {msg}"),
            Self::BadExtension(path) => write!(f, "{} is not a .json file", path.display()),
            Self::TooLarge { bytes, max } => write!(f, "file is {bytes} bytes; the limit is {max} bytes"),
            Self::Io(e) => write!(f, "could not read snapshot: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// Only a failed read is a storage problem; anything wrong with the file
// itself is a validation error
impl From<&SnapshotError> for AppError {
    fn from(e: &SnapshotError) -> Self {
        let message = format!("Import failed: {e}");
        match e {
            SnapshotError::Io(_) => AppError::storage(message),
            _ => AppError::validation(message),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportWarning {
    VersionMismatch { found: String, expected: &'static str },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionMismatch { found, expected } => {
                write!(f, "snapshot version {found} differs from {expected}; loading anyway")
            }
        }
    }
}

pub fn to_json(snapshot: &SnapshotFile) -> anyhow::Result<String> {
    let mut s = serde_json::to_string_pretty(snapshot)?;
    s.push('\n');
    Ok(s)
}

/// Validate and decode snapshot text. Nothing is applied here; callers hand
/// the result to the store only once this returns Ok.
pub fn parse_snapshot(text: &str) -> Result<(SnapshotFile, Vec<ImportWarning>), SnapshotError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| SnapshotError::NotJson(e.to_string()))?;
    let obj = value.as_object().ok_or(SnapshotError::NotAnObject)?;
    for field in REQUIRED_FIELDS {
        if obj.get(field).is_none_or(|v| v.is_null()) {
            return Err(SnapshotError::MissingField(field));
        }
    }
    check_ids(obj)?;
    let mut warnings = Vec::new();
    let found = obj.get("version").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    if found != SNAPSHOT_VERSION {
        let w = ImportWarning::VersionMismatch { found, expected: SNAPSHOT_VERSION };
        log::warn!("{}", w);
        warnings.push(w);
    }
    let snapshot: SnapshotFile = serde_json::from_value(value).map_err(|e| SnapshotError::Invalid(e.to_string()))?;
    Ok((snapshot, warnings))
}

fn check_ids(obj: &serde_json::Map<String, serde_json::Value>) -> Result<(), SnapshotError> {
    for (field, keys) in ID_FIELDS {
        let Some(items) = obj.get(field).and_then(|v| v.as_array()) else { continue };
        for item in items {
            for key in keys {
                if let Some(id) = item.get(*key).and_then(|v| v.as_str()) {
                    if Uuid::parse_str(id).is_err() {
                        return Err(SnapshotError::BadId { field, id: id.to_string() });
                    }
                }
            }
        }
    }
    Ok(())
}

// Extension and size gate, checked before the file is read
pub fn check_file(path: &Path) -> Result<u64, SnapshotError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(SnapshotError::BadExtension(path.to_path_buf()));
    }
    let bytes = fs::metadata(path)?.len();
    if bytes > MAX_SNAPSHOT_BYTES {
        return Err(SnapshotError::TooLarge { bytes, max: MAX_SNAPSHOT_BYTES });
    }
    Ok(bytes)
}

pub fn read_snapshot(path: &Path) -> Result<(SnapshotFile, Vec<ImportWarning>), SnapshotError> {
    check_file(path)?;
    let text = fs::read_to_string(path)?;
    // JSON-like content sniff
    if !text.trim_start().starts_with('{') {
        return Err(SnapshotError::NotAnObject);
    }
    parse_snapshot(&text)
}

// Keep letters, digits, '-' and '_' so the name is portable
fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    let cleaned: String = cleaned.chars().take(48).collect();
    if cleaned.is_empty() { "anyplan".to_string() } else { cleaned }
}

/// `<title>_<YYYY-MM-DD>_<unix millis>.json`
pub fn export_file_name(title: &str, at: OffsetDateTime) -> String {
    let date_fmt = format_description!("[year]-[month]-[day]");
    let date = at.format(date_fmt).unwrap_or_else(|_| "unknown".to_string());
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("{}_{}_{}.json", sanitize_title(title), date, millis)
}

pub fn write_snapshot(dir: &Path, snapshot: &SnapshotFile) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(&snapshot.title, snapshot.exported_at));
    fs::write(&path, to_json(snapshot)?)?;
    log::info!("snapshot written to {}", path.display());
    Ok(path)
}
