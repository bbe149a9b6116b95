//! Code injection: rewriting selected functions and the files that hold them.

pub mod injector;
pub mod module_path;
pub mod transformer;
pub mod tree;

pub use injector::{CodeInjector, GUARD_IDENT};
pub use module_path::{module_path_for, relative_to_source_root};
pub use transformer::{Transformed, Transformer};
pub use tree::{instrument_tree, TreeSummary};
