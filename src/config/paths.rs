//! Typed paths into a run workspace.
//!
//! Every artifact location is derived here so stages never assemble paths on
//! their own.
use super::AsvConfig;
use anyhow::{anyhow, Result};
use std::path::{Component, Path, PathBuf};

/// File extension of array artifacts.
pub const ARRAY_EXT: &str = "npy";

/// Resolved input, work and output directories for one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    root: PathBuf,
    input_dir: PathBuf,
    work_dir: PathBuf,
    output_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf, input_dir: PathBuf, work_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            root,
            input_dir,
            work_dir,
            output_dir,
        }
    }

    /// Resolve the configured directories, anchoring relative ones at `base`.
    pub fn from_config(config: &AsvConfig, base: &Path) -> Self {
        let anchor = |dir: &Path| normalize_lexically(&base.join(dir));
        Self::new(
            base.to_path_buf(),
            anchor(&config.input_dir),
            anchor(&config.work_dir),
            anchor(&config.output_dir),
        )
    }

    /// Reject layouts where cleaning the input directory would remove other
    /// workspace contents.
    pub fn check_layout(&self) -> Result<()> {
        let input = normalize_lexically(&self.input_dir);
        if normalize_lexically(&self.root).starts_with(&input) {
            return Err(anyhow!(
                "input_dir {} must not contain the workspace root {}",
                self.input_dir.display(),
                self.root.display()
            ));
        }
        check_disjoint_dirs([
            ("input_dir", self.input_dir.as_path()),
            ("work_dir", self.work_dir.as_path()),
            ("output_dir", self.output_dir.as_path()),
        ])
    }

    /// Return the workspace root; external tools run with it as working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Return the intermediate directory (Arnoldi projections, partial results).
    pub fn intermediate_dir(&self) -> PathBuf {
        self.work_dir.join("intermediate")
    }

    /// Return the reference array path for a role such as `begin`.
    pub fn reference_path(&self, role: &str) -> PathBuf {
        self.work_dir.join(format!("ref_{role}.{ARRAY_EXT}"))
    }

    /// Return the generator parameter file path.
    pub fn generator_params_path(&self) -> PathBuf {
        self.work_dir.join("generator_params.json")
    }

    /// Return the forecast request file path.
    pub fn forecast_request_path(&self) -> PathBuf {
        self.work_dir.join("forecast_request.json")
    }

    /// Return the latest run report path.
    pub fn report_path(&self) -> PathBuf {
        self.work_dir.join("report.json")
    }

    /// Return the append-only run history path.
    pub fn history_path(&self) -> PathBuf {
        self.work_dir.join("history.jsonl")
    }

    /// Return the output path of one perturbation member.
    pub fn member_path(&self, template: &str, index: u32) -> PathBuf {
        self.output_dir
            .join(format!("{template}{index}.{ARRAY_EXT}"))
    }
}

/// Drop `.` components and fold `..` into the preceding component.
///
/// Purely lexical: symlinks are not resolved.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Require the named directories to be non-empty and pairwise disjoint:
/// no directory may equal or contain another one.
pub fn check_disjoint_dirs(dirs: [(&str, &Path); 3]) -> Result<()> {
    let normalized = dirs.map(|(label, dir)| (label, normalize_lexically(dir)));
    for (idx, (label, dir)) in normalized.iter().enumerate() {
        if dir.as_os_str().is_empty() {
            return Err(anyhow!(
                "{label} must name a directory below the workspace root (got {:?})",
                dirs[idx].1
            ));
        }
        for (other_label, other) in normalized.iter().skip(idx + 1) {
            if dir.starts_with(other) || other.starts_with(dir) {
                return Err(anyhow!(
                    "{label} and {other_label} must not overlap ({} vs {})",
                    dir.display(),
                    other.display()
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    #[test]
    fn relative_dirs_are_anchored_at_base() {
        let config = default_config();
        let paths = WorkspacePaths::from_config(&config, Path::new("/srv/asv"));
        assert_eq!(paths.input_dir(), Path::new("/srv/asv/iodir/input"));
        assert_eq!(paths.output_dir(), Path::new("/srv/asv/iodir/output"));
    }

    #[test]
    fn absolute_dirs_are_kept() {
        let mut config = default_config();
        config.output_dir = PathBuf::from("/scratch/out");
        let paths = WorkspacePaths::from_config(&config, Path::new("/srv/asv"));
        assert_eq!(paths.output_dir(), Path::new("/scratch/out"));
    }

    #[test]
    fn member_path_follows_template() {
        let paths = WorkspacePaths::new(".".into(), "in".into(), "work".into(), "out".into());
        assert_eq!(
            paths.member_path("sv_pert_", 5),
            PathBuf::from("out/sv_pert_5.npy")
        );
        assert_eq!(paths.reference_path("begin"), PathBuf::from("work/ref_begin.npy"));
    }

    #[test]
    fn normalization_drops_cur_dir_and_folds_parent() {
        assert_eq!(
            normalize_lexically(Path::new("./iodir/./input")),
            PathBuf::from("iodir/input")
        );
        assert_eq!(
            normalize_lexically(Path::new("iodir/work/../input")),
            PathBuf::from("iodir/input")
        );
        assert_eq!(normalize_lexically(Path::new("../shared")), PathBuf::from("../shared"));
        assert_eq!(normalize_lexically(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn anchored_dirs_are_normalized() {
        let mut config = default_config();
        config.work_dir = PathBuf::from("./iodir/./work");
        let paths = WorkspacePaths::from_config(&config, Path::new("/srv/asv"));
        assert_eq!(paths.work_dir(), Path::new("/srv/asv/iodir/work"));
    }

    #[test]
    fn nested_and_aliased_layouts_overlap() {
        let base = Path::new("/srv/asv");
        let mut nested = default_config();
        nested.input_dir = PathBuf::from("iodir");
        let err = WorkspacePaths::from_config(&nested, base)
            .check_layout()
            .expect_err("input contains work");
        assert!(err.to_string().contains("input_dir and work_dir"), "{err}");

        let mut aliased = default_config();
        aliased.output_dir = PathBuf::from("./iodir/input");
        let err = WorkspacePaths::from_config(&aliased, base)
            .check_layout()
            .expect_err("output aliases input");
        assert!(err.to_string().contains("input_dir and output_dir"), "{err}");
    }

    #[test]
    fn input_dir_may_not_contain_root() {
        let mut config = default_config();
        config.input_dir = PathBuf::from("..");
        let err = WorkspacePaths::from_config(&config, Path::new("/srv/asv"))
            .check_layout()
            .expect_err("input is above root");
        assert!(err.to_string().contains("workspace root"), "{err}");
    }

    #[test]
    fn sibling_prefixes_do_not_overlap() {
        let paths = WorkspacePaths::new(
            "/srv".into(),
            "/srv/in".into(),
            "/srv/input".into(),
            "/srv/inputs".into(),
        );
        paths.check_layout().expect("component-wise prefixes only");
    }
}
