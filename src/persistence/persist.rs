use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ron::ser::PrettyConfig;
use time::OffsetDateTime;
use time::macros::format_description;

use super::snapshot::SnapshotFile;

// Autosave of the running session. The active file is overwritten on every
// save; versioned files are kept side by side for manual restore.

pub fn active_state_path(dir: &Path) -> PathBuf {
    dir.join("state.ron")
}

pub fn versioned_state_path_now(dir: &Path) -> PathBuf {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
    dir.join(format!("state_{}.ron", stamp))
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("ron.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

fn to_ron(state: &SnapshotFile) -> anyhow::Result<String> {
    let pretty = PrettyConfig::new().separate_tuple_members(true);
    Ok(ron::ser::to_string_pretty(state, pretty)?)
}

pub fn save_active(dir: &Path, state: &SnapshotFile) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = active_state_path(dir);
    atomic_write(&path, to_ron(state)?.as_bytes())?;
    log::debug!("autosaved {} nodes to {}", state.nodes.len(), path.display());
    Ok(path)
}

pub fn save_versioned(dir: &Path, state: &SnapshotFile) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = versioned_state_path_now(dir);
    atomic_write(&path, to_ron(state)?.as_bytes())?;
    log::info!("saved version {}", path.display());
    Ok(path)
}

pub fn load_active(dir: &Path) -> anyhow::Result<Option<SnapshotFile>> {
    let path = active_state_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    load_from_path(&path).map(Some)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<SnapshotFile> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let state: SnapshotFile = ron::from_str(&buf)?;
    Ok(state)
}

pub fn list_versions(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = Vec::new();
    if dir.exists() {
        for e in fs::read_dir(dir)? {
            let p = e?.path();
            if let Some(name) = p.file_name().and_then(|s| s.to_str())
                && name.starts_with("state_") && name.ends_with(".ron")
            {
                entries.push(p);
            }
        }
    }
    // sort descending by filename (timestamp)
    entries.sort();
    entries.reverse();
    Ok(entries)
}
