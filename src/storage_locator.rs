//! Storage Locator: maps a project path to the on-disk directory where all
//! of that project's session state lives, detecting parent/child nesting.
//!
//! Follows the teacher's `planning_paths.rs` shape: small `Result`-returning
//! functions, eager `fs::create_dir_all`, `anyhow::Context` on every
//! fallible filesystem call. Unlike `planning_paths::working_dir_hash`
//! (an opaque SHA-256 cache key), `projectId` here must stay a readable,
//! reversible-enough slug since ancestor directories are compared by path,
//! not by hash.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// Where a project's session state is persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLocation {
    pub project_id: String,
    pub parent_project_id: Option<String>,
    pub relative_from_parent: String,
    pub state_root: PathBuf,
}

/// Process-wide cache: normalized project path -> resolved location.
/// Module-level with a locked map (spec §9 "singleton state"), not
/// thread-local, so `clear_cache` is meaningful across the whole process.
static CACHE: OnceLock<Mutex<HashMap<PathBuf, ProjectLocation>>> = OnceLock::new();

fn cache() -> &'static Mutex<HashMap<PathBuf, ProjectLocation>> {
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Clears the process-wide locator cache. Exposed for tests and for callers
/// that know the on-disk layout changed underneath them.
pub fn clear_cache() {
    cache().lock().unwrap().clear();
}

/// Normalizes a path: resolves relative paths against the cwd, strips
/// trailing separators, canonicalizes when possible, and lower-cases on
/// case-insensitive filesystems.
fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to resolve current directory for relative project path")?
            .join(path)
    };

    let resolved = std::fs::canonicalize(&absolute).unwrap_or(absolute);

    Ok(if cfg!(any(target_os = "windows", target_os = "macos")) {
        PathBuf::from(resolved.to_string_lossy().to_lowercase())
    } else {
        resolved
    })
}

/// Replaces path separators and a drive-letter colon with `--`, preserving
/// every other character verbatim (spec §4.1 step 2).
fn project_id_for(normalized: &Path) -> String {
    let s = normalized.to_string_lossy();
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            other => other,
        })
        .collect::<String>()
        // collapse the doubled `--` produced by a literal "C:\" colon+sep pair
        // back down isn't required by the spec, but avoid pathological runs
        // of separators from an absolute path's leading slash.
        .trim_start_matches('-')
        .to_string()
        .split('-')
        .filter(|seg| !seg.is_empty())
        .collect::<Vec<_>>()
        .join("--")
}

fn forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Locates (and, on first lookup, migrates) the state root for `project_path`.
///
/// Pure with respect to filesystem reads on the fast (cached) path; performs
/// at most one best-effort migration the first time a given path resolves to
/// a nested location whose flat predecessor still exists on disk.
pub fn locate(global_root: &Path, project_path: &Path) -> Result<ProjectLocation> {
    let normalized = normalize(project_path)?;

    if let Some(hit) = cache().lock().unwrap().get(&normalized) {
        return Ok(hit.clone());
    }

    let projects_dir = global_root.join("projects");
    let project_id = project_id_for(&normalized);

    let mut parent_project_id = None;
    let mut relative_from_parent = String::new();

    // Walk ancestors, deepest first, looking for the first one with an
    // existing project directory of its own.
    for ancestor in normalized.ancestors().skip(1) {
        let ancestor_id = project_id_for(ancestor);
        let ancestor_project_dir = projects_dir.join(&ancestor_id);
        if ancestor_project_dir.is_dir() {
            let rel = normalized
                .strip_prefix(ancestor)
                .unwrap_or_else(|_| Path::new(""));
            parent_project_id = Some(ancestor_id);
            relative_from_parent = forward_slash(rel);
            break;
        }
    }

    let state_root = match &parent_project_id {
        None => projects_dir.join(&project_id),
        Some(parent_id) => {
            let mut root = projects_dir.join(parent_id);
            if !relative_from_parent.is_empty() {
                root = root.join(&relative_from_parent);
            }
            root
        }
    };

    if let Some(_parent_id) = &parent_project_id {
        let flat = projects_dir.join(&project_id);
        if flat.is_dir() && !state_root.is_dir() {
            if let Err(e) = migrate_flat_to_hierarchical(&flat, &state_root) {
                tracing::warn!(
                    "one-shot migration of {} into {} failed (non-fatal): {:#}",
                    flat.display(),
                    state_root.display(),
                    e
                );
            }
        }
    }

    let location = ProjectLocation {
        project_id,
        parent_project_id,
        relative_from_parent,
        state_root,
    };

    cache()
        .lock()
        .unwrap()
        .insert(normalized, location.clone());

    Ok(location)
}

/// Moves a flat project tree into its newly-discovered hierarchical home.
/// Failures here must be non-fatal to the caller of `locate` (spec §4.1 step 5).
fn migrate_flat_to_hierarchical(flat: &Path, hierarchical: &Path) -> Result<()> {
    if let Some(parent) = hierarchical.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir {}", parent.display()))?;
    }
    std::fs::rename(flat, hierarchical).with_context(|| {
        format!(
            "failed to move {} to {}",
            flat.display(),
            hierarchical.display()
        )
    })?;
    tracing::info!(
        "migrated flat project state {} -> {}",
        flat.display(),
        hierarchical.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn flat_when_no_ancestor_has_a_project_dir() {
        clear_cache();
        let global = tempdir().unwrap();
        let project = tempdir().unwrap();

        let loc = locate(global.path(), project.path()).unwrap();
        assert!(loc.parent_project_id.is_none());
        assert_eq!(loc.relative_from_parent, "");
        assert_eq!(
            loc.state_root,
            global.path().join("projects").join(&loc.project_id)
        );
    }

    #[test]
    #[serial]
    fn nests_under_deepest_existing_ancestor() {
        clear_cache();
        let global = tempdir().unwrap();
        let parent = tempdir().unwrap();
        let child = parent.path().join("services").join("api");
        std::fs::create_dir_all(&child).unwrap();

        let parent_loc = locate(global.path(), parent.path()).unwrap();
        std::fs::create_dir_all(global.path().join("projects").join(&parent_loc.project_id))
            .unwrap();
        clear_cache();

        let child_loc = locate(global.path(), &child).unwrap();
        assert_eq!(child_loc.parent_project_id.as_deref(), Some(parent_loc.project_id.as_str()));
        assert_eq!(child_loc.relative_from_parent, "services/api");
        assert_eq!(
            child_loc.state_root,
            global
                .path()
                .join("projects")
                .join(&parent_loc.project_id)
                .join("services")
                .join("api")
        );
    }

    #[test]
    #[serial]
    fn migrates_flat_tree_into_hierarchical_location() {
        clear_cache();
        let global = tempdir().unwrap();
        let parent = tempdir().unwrap();
        let child = parent.path().join("nested");
        std::fs::create_dir_all(&child).unwrap();

        let parent_loc = locate(global.path(), parent.path()).unwrap();
        let parent_project_dir = global.path().join("projects").join(&parent_loc.project_id);
        std::fs::create_dir_all(&parent_project_dir).unwrap();
        clear_cache();

        // Pre-create the flat tree for `child` as if it had been located
        // before `parent` got its own project directory.
        let child_project_id = project_id_for(&normalize(&child).unwrap());
        let flat_dir = global.path().join("projects").join(&child_project_id);
        std::fs::create_dir_all(&flat_dir).unwrap();
        std::fs::write(flat_dir.join("marker.txt"), b"hello").unwrap();

        let child_loc = locate(global.path(), &child).unwrap();
        assert!(!flat_dir.exists(), "flat tree should have been moved away");
        assert!(child_loc.state_root.join("marker.txt").is_file());
    }

    #[test]
    #[serial]
    fn cache_hit_avoids_recompute_and_clear_cache_resets_it() {
        clear_cache();
        let global = tempdir().unwrap();
        let project = tempdir().unwrap();

        let first = locate(global.path(), project.path()).unwrap();
        let second = locate(global.path(), project.path()).unwrap();
        assert_eq!(first, second);

        clear_cache();
        assert!(cache().lock().unwrap().is_empty());
    }

    #[test]
    fn project_id_replaces_separators_and_collapses_runs() {
        let id = project_id_for(Path::new("/home/dev/my project"));
        assert!(!id.contains('/'));
        assert!(id.contains("home--dev--my project"));
    }
}
