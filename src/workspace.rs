//! Workspace directory preparation.
use crate::config::WorkspacePaths;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Prepare the workspace directories for a run.
///
/// `clean_input` wipes and recreates the input tree. `keep_intermediate`
/// preserves earlier Arnoldi intermediates; otherwise they are discarded.
/// Work and output directories are only created, never emptied.
pub fn prepare(paths: &WorkspacePaths, clean_input: bool, keep_intermediate: bool) -> Result<()> {
    paths.check_layout()?;
    if clean_input {
        remove_dir_if_present(paths.input_dir())?;
        tracing::info!(dir = %paths.input_dir().display(), "cleaned input directory");
    }
    ensure_dir(paths.input_dir())?;
    ensure_dir(paths.work_dir())?;
    ensure_dir(paths.output_dir())?;

    let intermediate = paths.intermediate_dir();
    if !keep_intermediate {
        remove_dir_if_present(&intermediate)?;
    }
    ensure_dir(&intermediate)?;
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))
}

fn remove_dir_if_present(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("remove {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn workspace(root: &Path) -> WorkspacePaths {
        WorkspacePaths::new(
            root.to_path_buf(),
            root.join("input"),
            root.join("work"),
            root.join("output"),
        )
    }

    fn touch(path: PathBuf) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, b"state").expect("write file");
        path
    }

    #[test]
    fn creates_all_directories_on_fresh_root() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = workspace(dir.path());
        prepare(&paths, false, false).expect("prepare");
        assert!(paths.input_dir().is_dir());
        assert!(paths.work_dir().is_dir());
        assert!(paths.output_dir().is_dir());
        assert!(paths.intermediate_dir().is_dir());
    }

    #[test]
    fn clean_input_removes_stale_states() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = workspace(dir.path());
        let stale = touch(paths.input_dir().join("old").join("state.grib2"));
        prepare(&paths, true, false).expect("prepare");
        assert!(!stale.exists());
        assert!(paths.input_dir().is_dir());
    }

    #[test]
    fn input_is_untouched_without_clean() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = workspace(dir.path());
        let state = touch(paths.input_dir().join("state.nc"));
        prepare(&paths, false, false).expect("prepare");
        assert_eq!(fs::read(&state).expect("read state"), b"state");
    }

    #[test]
    fn intermediates_follow_keep_flag() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = workspace(dir.path());
        let q = touch(paths.intermediate_dir().join("q_0.npy"));

        prepare(&paths, false, true).expect("prepare keeping intermediates");
        assert!(q.exists());

        prepare(&paths, false, false).expect("prepare discarding intermediates");
        assert!(!q.exists());
        assert!(paths.intermediate_dir().is_dir());
    }

    #[test]
    fn output_and_work_files_survive() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = workspace(dir.path());
        let member = touch(paths.member_path("sv_pert_", 0));
        let history = touch(paths.history_path());
        prepare(&paths, true, false).expect("prepare");
        prepare(&paths, true, false).expect("prepare twice");
        assert!(member.exists());
        assert!(history.exists());
    }

    #[test]
    fn nested_layout_is_refused_before_cleaning() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path();
        let paths = WorkspacePaths::new(
            root.to_path_buf(),
            root.join("iodir"),
            root.join("iodir").join("work"),
            root.join("iodir").join("output"),
        );
        let history = touch(paths.history_path());
        let member = touch(paths.member_path("sv_pert_", 0));

        let err = prepare(&paths, true, false).expect_err("overlapping layout");
        assert!(err.to_string().contains("must not overlap"), "{err}");
        assert!(history.exists());
        assert!(member.exists());
    }
}
