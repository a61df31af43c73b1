//! Path mapping between scan roots and the mirrored quarantine tree,
//! plus shared path normalization utilities.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{FqhError, Result};

/// Derive the quarantine destination for an absolute source path.
///
/// The source's leading root component is stripped and the remainder is
/// appended under `quarantine_root`, preserving every intermediate directory
/// name byte-for-byte. The mapping is injective (distinct sources never
/// collide) and idempotent to re-derive.
pub fn quarantine_destination(source: &Path, quarantine_root: &Path) -> Result<PathBuf> {
    if !source.is_absolute() {
        return Err(FqhError::PathOutsideScan {
            path: source.to_path_buf(),
        });
    }
    let relative: PathBuf = source
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    Ok(quarantine_root.join(relative))
}

/// Reverse the quarantine mapping: recover the original absolute path from a
/// destination under `quarantine_root`.
///
/// Returns `None` when `dest` does not live under the quarantine root.
#[must_use]
pub fn original_path_for(dest: &Path, quarantine_root: &Path) -> Option<PathBuf> {
    let relative = dest.strip_prefix(quarantine_root).ok()?;
    Some(Path::new("/").join(relative))
}

/// Component-wise check that `candidate` is `root` or a descendant of it.
///
/// Used at startup to enforce the quarantine-root/scan-root disjointness
/// invariant; paths are normalized before comparison so trailing slashes and
/// `..` segments cannot hide a nesting.
#[must_use]
pub fn is_within(candidate: &Path, root: &Path) -> bool {
    resolve_absolute_path(candidate).starts_with(resolve_absolute_path(root))
}

/// Resolve a path to an absolute, normalized path.
///
/// If `fs::canonicalize` succeeds (path exists), it is used to resolve
/// symlinks and normalize components. If it fails (e.g. path does not
/// exist), the path is made absolute relative to CWD and `..`/`.`
/// components are resolved syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn destination_mirrors_source_hierarchy() {
        let dest =
            quarantine_destination(Path::new("/var/data/exports/a.sql"), Path::new("/quarantine"))
                .unwrap();
        assert_eq!(dest, Path::new("/quarantine/var/data/exports/a.sql"));
    }

    #[test]
    fn destination_derivation_is_idempotent() {
        let src = Path::new("/data/reports/q3/summary.bak");
        let root = Path::new("/var/quarantine");
        let d1 = quarantine_destination(src, root).unwrap();
        let d2 = quarantine_destination(src, root).unwrap();
        assert_eq!(d1, d2);
    }

    #[test]
    fn relative_source_is_rejected() {
        let err =
            quarantine_destination(Path::new("data/a.sql"), Path::new("/quarantine")).unwrap_err();
        assert_eq!(err.code(), "FQH-2001");
    }

    #[test]
    fn original_path_round_trips() {
        let src = Path::new("/var/data/exports/a.sql");
        let root = Path::new("/quarantine");
        let dest = quarantine_destination(src, root).unwrap();
        assert_eq!(original_path_for(&dest, root).unwrap(), src);
    }

    #[test]
    fn original_path_outside_quarantine_is_none() {
        assert!(original_path_for(Path::new("/elsewhere/a.sql"), Path::new("/quarantine")).is_none());
    }

    #[test]
    fn is_within_detects_nesting() {
        assert!(is_within(Path::new("/data/quarantine"), Path::new("/data")));
        assert!(is_within(Path::new("/data"), Path::new("/data")));
        assert!(!is_within(Path::new("/data2"), Path::new("/data")));
        assert!(!is_within(Path::new("/data"), Path::new("/data/quarantine")));
    }

    #[test]
    fn is_within_normalizes_dot_segments() {
        assert!(is_within(
            Path::new("/data/exports/../quarantine"),
            Path::new("/data")
        ));
    }

    #[test]
    fn resolves_existing_path_canonically() {
        let cwd = env::current_dir().unwrap();
        let resolved = resolve_absolute_path(Path::new("."));
        assert_eq!(resolved, std::fs::canonicalize(&cwd).unwrap());
    }

    #[test]
    fn normalizes_nonexistent_path_syntactically() {
        let input = Path::new("/nonexistent/foo/../bar");
        assert!(std::fs::canonicalize(input).is_err());
        assert_eq!(resolve_absolute_path(input), Path::new("/nonexistent/bar"));
    }

    proptest! {
        #[test]
        fn destination_mapping_is_injective(
            a in proptest::collection::vec("[a-z]{1,8}", 1..5),
            b in proptest::collection::vec("[a-z]{1,8}", 1..5),
        ) {
            let mut pa = PathBuf::from("/");
            for seg in &a {
                pa.push(seg);
            }
            let mut pb = PathBuf::from("/");
            for seg in &b {
                pb.push(seg);
            }
            let root = Path::new("/var/quarantine");
            let da = quarantine_destination(&pa, root).unwrap();
            let db = quarantine_destination(&pb, root).unwrap();
            prop_assert_eq!(pa == pb, da == db);
        }
    }
}
