//! Local using directive classification

use crate::workspace::syntax::{SyntaxTree, UsingNode};

/// A directive is local when it has no alias and is neither `static` nor `global`
pub fn is_local(using: &UsingNode) -> bool {
    !using.has_alias && !using.is_static && !using.is_global
}

/// Local top-level using directives of a compilation unit, in document order
pub fn local_usings(tree: &SyntaxTree) -> Vec<UsingNode> {
    tree.usings().into_iter().filter(is_local).collect()
}
