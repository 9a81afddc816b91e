//! Using directive occurrence counting

use super::result::UsingCountResult;
use super::{classifier, compilation_for, contains, eligible_tree};
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::workspace::syntax::SyntaxTree;
use crate::workspace::Project;

/// Count the local top-level using directives of a project.
///
/// With an empty `usings` filter every local directive is counted and names
/// appear in first-encountered order. Otherwise exactly the requested names
/// are reported, in request order, each starting at zero.
pub fn count<S: AsRef<str>>(
    project: &Project,
    usings: &[S],
    cancel: &CancellationToken,
) -> Result<UsingCountResult> {
    let compilation = compilation_for(project)?;

    let mut result = UsingCountResult::new(project.name());
    result.add_range(usings);

    if compilation.is_generated() {
        return Ok(result);
    }

    for document in project.documents() {
        let Some(tree) = eligible_tree(document, cancel)? else {
            continue;
        };
        aggregate_usings(&mut result, &tree, usings);
    }

    Ok(result)
}

fn aggregate_usings<S: AsRef<str>>(result: &mut UsingCountResult, tree: &SyntaxTree, usings: &[S]) {
    for using in classifier::local_usings(tree) {
        if usings.is_empty() {
            result.increment_or_add(&using.name);
        } else if contains(usings, &using.name) {
            result.increment(&using.name);
        }
    }
}
