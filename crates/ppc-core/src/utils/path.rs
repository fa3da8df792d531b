//! Path utilities for include resolution.
//!
//! Include directives name files relative to the directory of the including
//! document; these helpers turn such references into normalized paths.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Normalize a path by resolving . and .. components lexically
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut components: Vec<Utf8Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {
                // Skip current directory
            },
            Utf8Component::ParentDir => match components.last() {
                Some(Utf8Component::Normal(_)) => {
                    components.pop();
                },
                // `/..` is `/`
                Some(Utf8Component::RootDir) | Some(Utf8Component::Prefix(_)) => {},
                _ => components.push(component),
            },
            other => {
                components.push(other);
            },
        }
    }

    components.iter().map(|c| c.as_str()).collect()
}

/// Resolve an include target against the directory of the including document
pub fn resolve_include_path(base_dir: &Utf8Path, target: &str) -> Utf8PathBuf {
    let target = Utf8Path::new(target);
    if target.is_absolute() {
        normalize_path(target)
    } else {
        normalize_path(&base_dir.join(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Utf8Path::new("./conf/../shared/./db.ppc");
        assert_eq!(normalize_path(path), Utf8Path::new("shared/db.ppc"));

        let path = Utf8Path::new("/etc/app/../ppc/base.ppc");
        assert_eq!(normalize_path(path), Utf8Path::new("/etc/ppc/base.ppc"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent_dirs() {
        let path = Utf8Path::new("../../shared.ppc");
        assert_eq!(normalize_path(path), Utf8Path::new("../../shared.ppc"));

        let path = Utf8Path::new("/../shared.ppc");
        assert_eq!(normalize_path(path), Utf8Path::new("/shared.ppc"));
    }

    #[test]
    fn test_resolve_include_path() {
        let base = Utf8Path::new("/srv/app/config");

        assert_eq!(
            resolve_include_path(base, "db.ppc"),
            Utf8Path::new("/srv/app/config/db.ppc")
        );
        assert_eq!(
            resolve_include_path(base, "../shared/log.ppc"),
            Utf8Path::new("/srv/app/shared/log.ppc")
        );
        assert_eq!(
            resolve_include_path(base, "/opt/ppc/global.ppc"),
            Utf8Path::new("/opt/ppc/global.ppc")
        );
    }
}
