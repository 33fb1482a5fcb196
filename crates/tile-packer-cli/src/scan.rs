use std::path::{Component, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tile_packer_core::{OutputFormat, ProjectConfig, SourceEntry, tileset_file_name};
use tracing::{debug, warn};
use walkdir::WalkDir;

fn build_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(rel: &str, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    if let Some(ex) = exclude {
        if ex.is_match(rel) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(rel) {
            return true;
        }
    }
    false
}

/// Project-relative, `/`-separated form of `path`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Project-relative key of `out_dir`, empty for the project root itself.
fn output_key(root: &Path, out_dir: &Path) -> Option<String> {
    let rel = out_dir.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// True for `<index>.<ext>` files directly inside the output directory.
fn is_written_tileset(rel: &str, out_key: &str, format: OutputFormat) -> bool {
    let (parent, name) = rel.rsplit_once('/').unwrap_or(("", rel));
    if parent != out_key {
        return false;
    }
    name.split_once('.')
        .and_then(|(stem, _)| stem.parse::<usize>().ok())
        .is_some_and(|index| tileset_file_name(index, format) == name)
}

/// Finds source files of `format` below `root`, skipping `out_dir`.
///
/// When `out_dir` is the project root (or any directory that also holds
/// sources), only the tileset files written there are skipped.
/// Include/exclude globs are matched against the project-relative path.
/// The result is sorted.
pub fn discover_sources(
    root: &Path,
    out_dir: &Path,
    format: OutputFormat,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<String>> {
    let inc_set = build_set(include)?;
    let exc_set = build_set(exclude)?;
    let out_key = output_key(root, out_dir);
    let mut list = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && e.path() == out_dir));
    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = relative_key(root, entry.path()) else {
            continue;
        };
        if !format.matches_path(&rel) || should_skip(&rel, inc_set.as_ref(), exc_set.as_ref()) {
            continue;
        }
        if out_key.as_deref().is_some_and(|k| is_written_tileset(&rel, k, format)) {
            debug!(path = %rel, "skipping written tileset");
            continue;
        }
        list.push(rel);
    }
    list.sort();
    Ok(list)
}

/// Drops entries whose source file is gone. Returns how many were removed.
pub fn prune_missing(project: &mut ProjectConfig, root: &Path) -> usize {
    let before = project.entries.len();
    project.entries.retain(|e| {
        let keep = root.join(&e.path).is_file();
        if !keep {
            warn!(path = %e.path, records = e.placement.len(), "source removed; dropping entry");
        }
        keep
    });
    before - project.entries.len()
}

/// Appends an entry for every path not yet in the project. Returns how many were added.
pub fn add_new_entries(project: &mut ProjectConfig, found: Vec<String>) -> usize {
    let mut added = 0;
    for path in found {
        if project.contains_path(&path) {
            continue;
        }
        debug!(%path, "new source");
        project.entries.push(SourceEntry::new(path));
        added += 1;
    }
    added
}
