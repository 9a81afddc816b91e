//! C# syntax trees using tree-sitter
//!
//! A [`SyntaxTree`] pairs the source text of a document with its parsed
//! tree. Trees are never edited in place: every edit primitive returns the
//! new source text, which the caller turns into a new document snapshot.
//!
//! Conditional compilation blocks (`#if`/`#elif`/`#else`) are resolved
//! against the preprocessor symbols the tree was parsed with: only
//! directives in the active branch are visible.

use std::ops::Range;
use std::sync::Arc;
use tree_sitter::{Node, Parser, Tree};

/// Symbols the SDK defines for a Debug build
pub const DEFAULT_PREPROCESSOR_SYMBOLS: &[&str] = &["DEBUG", "TRACE"];

/// A parsed C# compilation unit
#[derive(Debug)]
pub struct SyntaxTree {
    text: Arc<str>,
    tree: Tree,
    symbols: Vec<String>,
}

/// A top-level using directive of a compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingNode {
    /// Namespace or type name as written, e.g. `System.Collections.Generic`
    pub name: String,
    pub has_alias: bool,
    pub is_static: bool,
    pub is_global: bool,
    /// Byte range of the directive, from the first keyword to the semicolon
    pub range: Range<usize>,
}

impl UsingNode {
    fn from_node(node: Node, source: &[u8]) -> Option<Self> {
        let mut has_alias = false;
        let mut is_static = false;
        let mut is_global = false;
        let mut name_node = None;

        for child in node.children(&mut node.walk()) {
            match child.kind() {
                "global" => is_global = true,
                "static" => is_static = true,
                "=" | "name_equals" => has_alias = true,
                "comment" => {}
                _ if child.is_named() => name_node = Some(child),
                _ => {}
            }
        }
        if node.child_by_field_name("alias").is_some() {
            has_alias = true;
        }

        let name = name_node?.utf8_text(source).ok()?.to_string();
        Some(Self {
            name,
            has_alias,
            is_static,
            is_global,
            range: node.byte_range(),
        })
    }
}

impl SyntaxTree {
    /// Parse C# source text with [`DEFAULT_PREPROCESSOR_SYMBOLS`].
    /// Returns `None` when tree-sitter cannot produce a tree.
    pub fn parse(text: impl Into<Arc<str>>) -> Option<Self> {
        Self::parse_with_symbols(text, DEFAULT_PREPROCESSOR_SYMBOLS)
    }

    /// Parse C# source text with the given defined preprocessor symbols
    pub fn parse_with_symbols<S: AsRef<str>>(
        text: impl Into<Arc<str>>,
        symbols: &[S],
    ) -> Option<Self> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .ok()?;
        let tree = parser.parse(text.as_bytes(), None)?;

        let mut tree = Self {
            text,
            tree,
            symbols: symbols.iter().map(|s| s.as_ref().to_string()).collect(),
        };
        tree.apply_file_defines();
        Some(tree)
    }

    /// `#define` and `#undef` at the top of the file
    fn apply_file_defines(&mut self) {
        let root = self.tree.root_node();
        let source = self.text.as_bytes();
        let mut defines = Vec::new();
        for child in root.children(&mut root.walk()) {
            let define = match child.kind() {
                "preproc_define" => true,
                "preproc_undef" => false,
                _ => continue,
            };
            let symbol = child
                .named_child(0)
                .and_then(|arg| arg.utf8_text(source).ok())
                .map(|text| text.trim().to_string());
            if let Some(symbol) = symbol {
                defines.push((define, symbol));
            }
        }
        for (define, symbol) in defines {
            self.symbols.retain(|s| *s != symbol);
            if define {
                self.symbols.push(symbol);
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the tree contains ERROR or MISSING nodes
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// 1-based line and column of the first syntax error, if any
    pub fn first_error(&self) -> Option<(usize, usize)> {
        fn find(node: Node) -> Option<Node> {
            if node.is_error() || node.is_missing() {
                return Some(node);
            }
            if !node.has_error() {
                return None;
            }
            for child in node.children(&mut node.walk()) {
                if let Some(found) = find(child) {
                    return Some(found);
                }
            }
            // The flag is set but no descendant carries it: report the node itself
            Some(node)
        }

        let node = find(self.tree.root_node())?;
        let position = node.start_position();
        Some((position.row + 1, position.column + 1))
    }

    /// Top-level using directives in document order, with all qualifiers.
    ///
    /// Directives nested in namespaces, or following a file-scoped namespace
    /// declaration, belong to that namespace and are not returned. Inside
    /// `#if` blocks only the active branch is visited.
    pub fn usings(&self) -> Vec<UsingNode> {
        let mut usings = Vec::new();
        self.collect_usings(self.tree.root_node(), &mut usings);
        usings
    }

    /// Returns `true` once a file-scoped namespace ends the directive section
    fn collect_usings(&self, parent: Node, usings: &mut Vec<UsingNode>) -> bool {
        let source = self.text.as_bytes();
        let skipped: Vec<usize> = ["condition", "alternative"]
            .iter()
            .filter_map(|field| parent.child_by_field_name(field))
            .map(|node| node.id())
            .collect();

        for child in parent.children(&mut parent.walk()) {
            if skipped.contains(&child.id()) {
                continue;
            }
            let done = match child.kind() {
                "using_directive" => {
                    if let Some(using) = UsingNode::from_node(child, source) {
                        usings.push(using);
                    }
                    false
                }
                "file_scoped_namespace_declaration" => true,
                "preproc_if" => self
                    .active_branch(child)
                    .is_some_and(|branch| self.collect_usings(branch, usings)),
                _ => false,
            };
            if done {
                return true;
            }
        }
        false
    }

    /// The `#if`, `#elif` or `#else` node whose content is compiled
    fn active_branch<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let mut current = node;
        loop {
            if current.kind() == "preproc_else" {
                return Some(current);
            }
            let condition = current.child_by_field_name("condition")?;
            if self.evaluate(condition) {
                return Some(current);
            }
            current = current.child_by_field_name("alternative")?;
        }
    }

    fn evaluate(&self, condition: Node) -> bool {
        let source = self.text.as_bytes();
        let text = |node: Node| node.utf8_text(source).unwrap_or_default().trim().to_string();
        match condition.kind() {
            "identifier" => {
                let symbol = text(condition);
                self.symbols.iter().any(|s| *s == symbol)
            }
            "boolean_literal" => text(condition) == "true",
            "parenthesized_expression" => condition
                .named_child(0)
                .is_some_and(|inner| self.evaluate(inner)),
            "unary_expression" => !condition
                .child_by_field_name("argument")
                .is_some_and(|argument| self.evaluate(argument)),
            "binary_expression" => {
                let (Some(left), Some(right)) = (
                    condition.child_by_field_name("left"),
                    condition.child_by_field_name("right"),
                ) else {
                    return false;
                };
                let operator = condition
                    .child_by_field_name("operator")
                    .map(text)
                    .unwrap_or_default();
                match operator.as_str() {
                    "||" => self.evaluate(left) || self.evaluate(right),
                    "&&" => self.evaluate(left) && self.evaluate(right),
                    "==" => self.evaluate(left) == self.evaluate(right),
                    "!=" => self.evaluate(left) != self.evaluate(right),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Text of the comments that precede the first token of the file
    pub fn leading_comments(&self) -> Vec<&str> {
        let root = self.tree.root_node();
        let source = self.text.as_bytes();
        let mut comments = Vec::new();

        for child in root.children(&mut root.walk()) {
            if child.kind() == "comment" {
                if let Ok(text) = child.utf8_text(source) {
                    comments.push(text);
                }
            } else if !child.kind().starts_with("preproc") {
                break;
            }
        }

        comments
    }

    /// Line terminator used by this document
    pub fn newline(&self) -> &'static str {
        if self.text.contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Remove the given directive ranges, keeping their leading trivia.
    ///
    /// Comments and blank lines before a directive survive. The directive's
    /// own indentation, a trailing `//` comment and the line terminator are
    /// removed with it.
    pub fn remove_usings(&self, ranges: &[Range<usize>]) -> String {
        let text: &str = &self.text;
        let mut spans: Vec<Range<usize>> = ranges
            .iter()
            .map(|range| removal_span(text, range))
            .collect();
        spans.sort_by_key(|span| span.start);

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in spans {
            if span.start < cursor {
                continue;
            }
            output.push_str(&text[cursor..span.start]);
            cursor = span.end;
        }
        output.push_str(&text[cursor..]);
        output
    }

    /// Append `global using` directives after the existing top-level directives.
    ///
    /// Without any directive, they go after the extern alias directives, or at
    /// the start of the file.
    pub fn append_global_usings<S: AsRef<str>>(&self, names: &[S], newline: &str) -> String {
        let text: &str = &self.text;
        let lines = global_using_lines(names, newline);

        let anchor = self
            .last_unconditional_end("using_directive")
            .or_else(|| self.last_unconditional_end("extern_alias_directive"));

        let Some(anchor) = anchor else {
            return format!("{}{}", lines, text);
        };

        let mut output = String::with_capacity(text.len() + lines.len());
        match text[anchor..].find('\n') {
            Some(offset) => {
                let split = anchor + offset + 1;
                output.push_str(&text[..split]);
                output.push_str(&lines);
                output.push_str(&text[split..]);
            }
            None => {
                output.push_str(text);
                output.push_str(newline);
                output.push_str(&lines);
            }
        }
        output
    }

    /// End of the last directive of `kind` outside any `#if` block
    fn last_unconditional_end(&self, kind: &str) -> Option<usize> {
        let root = self.tree.root_node();
        let mut end = None;
        for child in root.children(&mut root.walk()) {
            match child.kind() {
                "file_scoped_namespace_declaration" => break,
                k if k == kind => end = Some(child.end_byte()),
                _ => {}
            }
        }
        end
    }
}

/// Source text of a new compilation unit holding only global using directives
pub fn global_usings_root<S: AsRef<str>>(names: &[S], newline: &str) -> String {
    global_using_lines(names, newline)
}

fn global_using_lines<S: AsRef<str>>(names: &[S], newline: &str) -> String {
    names
        .iter()
        .map(|name| format!("global using {};{}", name.as_ref(), newline))
        .collect()
}

fn is_horizontal_space(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Byte span removed for a directive: own-line indentation, the directive,
/// a trailing `//` comment on the same line and the line terminator.
fn removal_span(text: &str, range: &Range<usize>) -> Range<usize> {
    let bytes = text.as_bytes();

    let mut start = range.start;
    while start > 0 && is_horizontal_space(bytes[start - 1]) {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] != b'\n' {
        // Something else precedes the directive on its line
        start = range.start;
    }

    let mut end = range.end;
    while end < bytes.len() && is_horizontal_space(bytes[end]) {
        end += 1;
    }
    if bytes[end..].starts_with(b"//") {
        end = text[end..]
            .find(['\r', '\n'])
            .map_or(bytes.len(), |offset| end + offset);
    }
    if bytes[end..].starts_with(b"\r\n") {
        end += 2;
    } else if bytes[end..].starts_with(b"\n") {
        end += 1;
    }

    start..end
}
