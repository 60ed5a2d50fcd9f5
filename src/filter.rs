//! Path filtering core
//!
//! Given the flat recursive tree listing of a repository, this module decides
//! exactly which blob paths get downloaded: glob matching, include/exclude
//! precedence, folder narrowing, and the remote-to-local path mapping.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use path_clean::PathClean;
use tracing::{debug, warn};

use crate::github::{EntryKind, TreeEntry};

/// A single remote blob resolved to the local path it will be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub remote_path: String,
    pub local_path: PathBuf,
}

/// Check a path against one glob pattern.
///
/// Matching is case-sensitive and runs against the full path, not just the
/// basename. The pattern may anchor at any `/` boundary, so `subfolder/*`
/// matches `docs/subfolder/readme.md` but not `mysubfolder/readme.md`.
/// An empty or unparseable pattern matches nothing.
pub fn matches(path: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let compiled = match Pattern::new(pattern) {
        Ok(compiled) => compiled,
        Err(_) => return false,
    };

    if compiled.matches(path) {
        return true;
    }

    // Retry against every suffix that starts on a segment boundary.
    let mut rest = path;
    while let Some(slash) = rest.find('/') {
        rest = &rest[slash + 1..];
        if compiled.matches(rest) {
            return true;
        }
    }

    false
}

/// Narrow a tree listing to the blob paths that survive include/exclude
/// filtering, preserving listing order.
///
/// An empty include set selects every blob; any exclude match removes the
/// entry no matter what the includes said. Directory entries are structural
/// only and never appear in the result.
pub fn filter_paths(
    entries: &[TreeEntry],
    includes: &[String],
    excludes: &[String],
) -> Vec<String> {
    warn_invalid_patterns(includes);
    warn_invalid_patterns(excludes);

    let mut selected = Vec::new();

    for entry in entries {
        match entry.kind {
            EntryKind::Tree => {
                debug!("skipping directory entry: {}", entry.path);
                continue;
            }
            EntryKind::Other => {
                debug!("skipping non-blob entry: {}", entry.path);
                continue;
            }
            EntryKind::Blob => {}
        }

        let included =
            includes.is_empty() || includes.iter().any(|pattern| matches(&entry.path, pattern));
        if !included {
            continue;
        }

        if excludes.iter().any(|pattern| matches(&entry.path, pattern)) {
            debug!("excluded by pattern: {}", entry.path);
            continue;
        }

        selected.push(entry.path.clone());
    }

    selected
}

/// Keep only entries at or below `folder`. An empty folder keeps the whole
/// tree.
pub fn narrow_to_folder(entries: Vec<TreeEntry>, folder: &str) -> Vec<TreeEntry> {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        return entries;
    }

    let prefix = format!("{}/", folder);
    entries
        .into_iter()
        .filter(|entry| entry.path == folder || entry.path.starts_with(&prefix))
        .collect()
}

/// Map surviving remote paths to local destinations by substituting the
/// remote folder prefix with `dest`, preserving subdirectory structure.
///
/// Remote paths that would land outside `dest` (absolute paths or parent-dir
/// components) are dropped with a warning rather than written.
pub fn plan_targets(paths: Vec<String>, folder: &str, dest: &Path) -> Vec<DownloadTarget> {
    let folder = folder.trim_matches('/');
    let mut targets = Vec::new();

    for remote_path in paths {
        let relative = match strip_folder_prefix(&remote_path, folder) {
            Some(relative) => relative,
            None => continue,
        };

        if !is_safe_relative(relative) {
            warn!(
                "refusing remote path that escapes the destination: {}",
                remote_path
            );
            continue;
        }

        let local_path = dest.join(relative).clean();
        targets.push(DownloadTarget {
            remote_path,
            local_path,
        });
    }

    targets
}

/// One-shot validation pass so a bad pattern is reported per invocation, not
/// per path. `matches` itself stays silent.
fn warn_invalid_patterns(patterns: &[String]) {
    for pattern in patterns {
        if pattern.is_empty() {
            continue;
        }
        if let Err(e) = Pattern::new(pattern) {
            warn!("ignoring invalid glob pattern '{}': {}", pattern, e);
        }
    }
}

fn strip_folder_prefix<'a>(path: &'a str, folder: &str) -> Option<&'a str> {
    if folder.is_empty() {
        return Some(path);
    }
    if path == folder {
        // The folder argument named a blob directly; keep its basename.
        return path.rsplit('/').next();
    }
    path.strip_prefix(folder)?.strip_prefix('/')
}

fn is_safe_relative(relative: &str) -> bool {
    !relative.is_empty()
        && Path::new(relative)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: EntryKind::Blob,
        }
    }

    fn dir(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: EntryKind::Tree,
        }
    }

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matches_full_path() {
        assert!(matches("folder/file1.txt", "*.txt"));
        assert!(matches("folder/sub/deep/file.txt", "*.txt"));
        assert!(!matches("folder/file2.py", "*.txt"));
    }

    #[test]
    fn test_matches_at_segment_boundary() {
        assert!(matches("folder/subfolder/file3.txt", "subfolder/*"));
        assert!(matches("subfolder/file.txt", "subfolder/*"));
        assert!(!matches("folder/mysubfolder/file.txt", "subfolder/*"));
    }

    #[test]
    fn test_matches_is_case_sensitive() {
        assert!(matches("README.md", "README*"));
        assert!(!matches("readme.md", "README*"));
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        assert!(!matches("folder/file.txt", ""));
        assert!(!matches("", ""));
    }

    #[test]
    fn test_star_pattern_matches_everything() {
        assert!(matches("folder/file.txt", "*"));
        assert!(matches("a", "*"));
        assert!(matches("deeply/nested/path/file.bin", "*"));
    }

    #[test]
    fn test_invalid_pattern_matches_nothing() {
        assert!(!matches("folder/file.txt", "[unclosed"));
    }

    #[test]
    fn test_question_mark_and_character_class() {
        assert!(matches("src/lib.rs", "lib.r?"));
        assert!(matches("data/a1.csv", "a[0-9].csv"));
        assert!(!matches("data/ax.csv", "a[0-9].csv"));
    }

    #[test]
    fn test_empty_includes_select_every_blob() {
        let entries = vec![blob("a.txt"), blob("b/c.py"), blob("d.bin")];
        let result = filter_paths(&entries, &[], &[]);
        assert_eq!(result, vec!["a.txt", "b/c.py", "d.bin"]);
    }

    #[test]
    fn test_exclude_dominates_include() {
        let entries = vec![blob("keep.txt"), blob("drop.txt")];
        let result = filter_paths(&entries, &patterns(&["*.txt"]), &patterns(&["drop.txt"]));
        assert_eq!(result, vec!["keep.txt"]);
    }

    #[test]
    fn test_exclude_applies_without_includes() {
        let entries = vec![blob("a.txt"), blob("b.txt")];
        let result = filter_paths(&entries, &[], &patterns(&["b.txt"]));
        assert_eq!(result, vec!["a.txt"]);
    }

    #[test]
    fn test_directories_never_downloaded() {
        let entries = vec![dir("folder"), blob("folder/file.txt"), dir("folder/sub")];
        let result = filter_paths(&entries, &[], &[]);
        assert_eq!(result, vec!["folder/file.txt"]);
    }

    #[test]
    fn test_submodule_entries_skipped() {
        let entries = vec![
            blob("file.txt"),
            TreeEntry {
                path: "vendored".to_string(),
                kind: EntryKind::Other,
            },
        ];
        let result = filter_paths(&entries, &[], &[]);
        assert_eq!(result, vec!["file.txt"]);
    }

    #[test]
    fn test_order_preserved() {
        let entries = vec![
            blob("z.txt"),
            blob("skip.py"),
            blob("a.txt"),
            blob("m.txt"),
        ];
        let result = filter_paths(&entries, &patterns(&["*.txt"]), &[]);
        assert_eq!(result, vec!["z.txt", "a.txt", "m.txt"]);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let entries = vec![blob("folder/a.txt"), blob("folder/b.py"), blob("c.txt")];
        let includes = patterns(&["*.txt"]);
        let excludes = patterns(&["c.*"]);

        let first = filter_paths(&entries, &includes, &excludes);
        let refiltered: Vec<TreeEntry> = first.iter().map(|p| blob(p)).collect();
        let second = filter_paths(&refiltered, &includes, &excludes);

        assert_eq!(first, second);
    }

    #[test]
    fn test_txt_includes_with_subfolder_exclude() {
        let entries = vec![
            blob("folder/file1.txt"),
            blob("folder/file2.py"),
            blob("folder/subfolder/file3.txt"),
        ];
        let result = filter_paths(&entries, &patterns(&["*.txt"]), &patterns(&["subfolder/*"]));
        assert_eq!(result, vec!["folder/file1.txt"]);
    }

    #[test]
    fn test_no_matches_yields_empty_result() {
        let entries = vec![blob("a.py"), blob("b.py")];
        let result = filter_paths(&entries, &patterns(&["*.txt"]), &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_narrow_to_folder() {
        let entries = vec![
            blob("folder/a.txt"),
            blob("folder/sub/b.txt"),
            blob("other/c.txt"),
            blob("folderish/d.txt"),
        ];
        let narrowed = narrow_to_folder(entries, "folder");
        let paths: Vec<&str> = narrowed.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["folder/a.txt", "folder/sub/b.txt"]);
    }

    #[test]
    fn test_narrow_with_empty_folder_keeps_everything() {
        let entries = vec![blob("a.txt"), blob("b/c.txt")];
        assert_eq!(narrow_to_folder(entries.clone(), "").len(), 2);
        assert_eq!(narrow_to_folder(entries, "/").len(), 2);
    }

    #[test]
    fn test_narrow_trims_slashes() {
        let entries = vec![blob("folder/a.txt"), blob("other/b.txt")];
        let narrowed = narrow_to_folder(entries, "/folder/");
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].path, "folder/a.txt");
    }

    #[test]
    fn test_plan_targets_substitutes_prefix() {
        let paths = vec![
            "folder/a.txt".to_string(),
            "folder/sub/b.txt".to_string(),
        ];
        let targets = plan_targets(paths, "folder", Path::new("/tmp/out"));

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].remote_path, "folder/a.txt");
        assert_eq!(targets[0].local_path, PathBuf::from("/tmp/out/a.txt"));
        assert_eq!(targets[1].local_path, PathBuf::from("/tmp/out/sub/b.txt"));
    }

    #[test]
    fn test_plan_targets_whole_tree() {
        let paths = vec!["a.txt".to_string(), "sub/b.txt".to_string()];
        let targets = plan_targets(paths, "", Path::new("out"));

        assert_eq!(targets[0].local_path, PathBuf::from("out/a.txt"));
        assert_eq!(targets[1].local_path, PathBuf::from("out/sub/b.txt"));
    }

    #[test]
    fn test_plan_targets_rejects_escaping_paths() {
        let paths = vec!["folder/../../etc/passwd".to_string()];
        let targets = plan_targets(paths, "folder", Path::new("/tmp/out"));
        assert!(targets.is_empty());
    }

    #[test]
    fn test_plan_targets_folder_naming_a_blob() {
        let paths = vec!["docs/README.md".to_string()];
        let targets = plan_targets(paths, "docs/README.md", Path::new("out"));
        assert_eq!(targets[0].local_path, PathBuf::from("out/README.md"));
    }
}
