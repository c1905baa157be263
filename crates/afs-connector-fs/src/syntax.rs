// syntax.rs — Parse-only syntax check for Python sources.
//
// tree-sitter builds a concrete syntax tree without executing anything.
// Invalid input still yields a tree, with ERROR nodes where the parser had to
// skip tokens and MISSING nodes where it had to invent one. The grammar also
// accepts the Python 2 `print` and `exec` statements without any error, so
// those node kinds are rejected explicitly. The first offending node in
// source order becomes the diagnostic.

use tree_sitter::{Node, Parser, Tree};

/// Checks source text before it is written.
pub trait SyntaxChecker: Send + Sync {
    /// `Ok(())` for valid source, otherwise a diagnostic suitable for users.
    fn check(&self, source: &str) -> Result<(), String>;
}

/// Python syntax check backed by `tree-sitter-python`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonSyntax;

impl SyntaxChecker for PythonSyntax {
    fn check(&self, source: &str) -> Result<(), String> {
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| format!("python parser unavailable: {}", e))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| "python parser produced no tree".to_string())?;

        match first_offending(&tree) {
            Some(node) => Err(describe(node, source)),
            None => Ok(()),
        }
    }
}

/// Statement kinds the grammar parses cleanly but Python 3 rejects.
const LEGACY_STATEMENTS: [&str; 2] = ["print_statement", "exec_statement"];

fn is_offending(node: Node<'_>) -> bool {
    node.is_error() || node.is_missing() || LEGACY_STATEMENTS.contains(&node.kind())
}

/// Pre-order walk for the first ERROR, MISSING or legacy statement node.
///
/// Iterative so that deeply nested input cannot exhaust the stack.
fn first_offending(tree: &Tree) -> Option<Node<'_>> {
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if is_offending(node) {
            return Some(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn describe(node: Node<'_>, source: &str) -> String {
    let pos = node.start_position();
    let (line, column) = (pos.row + 1, pos.column + 1);

    if node.is_missing() {
        return format!("line {}, column {}: missing '{}'", line, column, node.kind());
    }
    match node.kind() {
        "print_statement" => {
            return format!(
                "line {}, column {}: Python 2 print statement is not valid Python 3",
                line, column
            )
        }
        "exec_statement" => {
            return format!(
                "line {}, column {}: Python 2 exec statement is not valid Python 3",
                line, column
            )
        }
        _ => {}
    }

    let text = node.utf8_text(source.as_bytes()).unwrap_or("").trim();
    let first_line = text.lines().next().unwrap_or("");
    let snippet: String = first_line.chars().take(40).collect();
    if snippet.is_empty() {
        format!("line {}, column {}: invalid syntax", line, column)
    } else {
        format!("line {}, column {}: invalid syntax near '{}'", line, column, snippet)
    }
}
