//! Source file path to Rust module path.
//!
//! | file (relative to `src/`) | module path       |
//! |---------------------------|-------------------|
//! | `lib.rs`, `main.rs`       | `<crate>`         |
//! | `a.rs`, `a/mod.rs`        | `<crate>::a`      |
//! | `a/b.rs`                  | `<crate>::a::b`   |
//! | `bin/x.rs`, `bin/x/main.rs` | `x`             |
//! | `bin/x/util.rs`           | `x::util`         |

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use metjo_probe::PATH_SEPARATOR;

/// Module path of the `.rs` file at `relative` (relative to the source
/// root), or `None` for files that are not Rust sources.
#[must_use]
pub fn module_path_for(relative: &Path, crate_name: &str) -> Option<String> {
    if relative.extension() != Some(OsStr::new("rs")) {
        return None;
    }

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let file = segments.pop()?;
    let stem = file.strip_suffix(".rs").unwrap_or(&file).to_string();

    if segments.first().is_some_and(|s| s == "bin") {
        segments.remove(0);
        // `bin/x.rs` and `bin/x/main.rs` are the roots of binary `x`.
        let leaf = (segments.is_empty() || stem != "main").then_some(stem.as_str());
        return Some(join(&[], &segments, leaf));
    }

    let leaf = match stem.as_str() {
        "lib" | "main" if segments.is_empty() => None,
        "mod" => None,
        other => Some(other),
    };
    Some(join(&[crate_identifier(crate_name)], &segments, leaf))
}

/// Path of `file` relative to its source root: `src_root` when given,
/// otherwise everything after the last `src` component, otherwise the bare
/// file name.
#[must_use]
pub fn relative_to_source_root(file: &Path, src_root: Option<&Path>) -> PathBuf {
    if let Some(root) = src_root {
        if let Ok(relative) = file.strip_prefix(root) {
            return relative.to_path_buf();
        }
        if let (Ok(file), Ok(root)) = (file.canonicalize(), root.canonicalize()) {
            if let Ok(relative) = file.strip_prefix(&root) {
                return relative.to_path_buf();
            }
        }
    }

    let components: Vec<Component> = file.components().collect();
    if let Some(pos) = components.iter().rposition(|c| c.as_os_str() == "src") {
        return components[pos + 1..].iter().collect();
    }
    file.file_name().map_or_else(|| file.to_path_buf(), PathBuf::from)
}

fn join(root: &[String], segments: &[String], leaf: Option<&str>) -> String {
    root.iter()
        .map(String::as_str)
        .chain(segments.iter().map(String::as_str))
        .chain(leaf)
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// Crate names may contain `-`; paths use `_`.
fn crate_identifier(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(relative: &str) -> Option<String> {
        module_path_for(Path::new(relative), "acme")
    }

    #[test]
    fn test_crate_roots() {
        assert_eq!(path("lib.rs").as_deref(), Some("acme"));
        assert_eq!(path("main.rs").as_deref(), Some("acme"));
    }

    #[test]
    fn test_nested_modules() {
        assert_eq!(path("service.rs").as_deref(), Some("acme::service"));
        assert_eq!(path("service/mod.rs").as_deref(), Some("acme::service"));
        assert_eq!(path("service/orders.rs").as_deref(), Some("acme::service::orders"));
        assert_eq!(path("service/lib.rs").as_deref(), Some("acme::service::lib"));
    }

    #[test]
    fn test_binaries() {
        assert_eq!(path("bin/tool.rs").as_deref(), Some("tool"));
        assert_eq!(path("bin/tool/main.rs").as_deref(), Some("tool"));
        assert_eq!(path("bin/tool/util.rs").as_deref(), Some("tool::util"));
    }

    #[test]
    fn test_non_rust_files() {
        assert_eq!(path("README.md"), None);
        assert_eq!(path("data/schema"), None);
    }

    #[test]
    fn test_relative_to_source_root() {
        let nested = Path::new("shop/src/orders/cart.rs");
        assert_eq!(relative_to_source_root(nested, None), Path::new("orders/cart.rs"));
        assert_eq!(
            relative_to_source_root(Path::new("shop/src/orders/mod.rs"), None),
            Path::new("orders/mod.rs")
        );
        assert_eq!(
            relative_to_source_root(nested, Some(Path::new("shop/src/orders"))),
            Path::new("cart.rs")
        );
        assert_eq!(relative_to_source_root(Path::new("scratch/util.rs"), None), Path::new("util.rs"));
    }

    #[test]
    fn test_nested_file_matches_tree_naming() {
        let module = |file: &str| {
            module_path_for(&relative_to_source_root(Path::new(file), None), "shop")
        };
        assert_eq!(module("src/orders/cart.rs").as_deref(), Some("shop::orders::cart"));
        assert_eq!(module("src/orders/mod.rs").as_deref(), Some("shop::orders"));
        assert_eq!(module("src/lib.rs").as_deref(), Some("shop"));
        assert_eq!(module("src/bin/tool.rs").as_deref(), Some("tool"));
    }

    #[test]
    fn test_hyphenated_crate_name() {
        assert_eq!(module_path_for(Path::new("a.rs"), "my-app").as_deref(), Some("my_app::a"));
    }
}
