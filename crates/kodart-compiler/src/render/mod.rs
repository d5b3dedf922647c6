//! Target source rendering
//!
//! Prints a [`DartCompilationUnit`] as source text. Output is deterministic
//! and already laid out (two-space indentation, one declaration per block),
//! so running the external formatter is optional.
//!
//! Parentheses are never stored for precedence. Each operand is rendered
//! inside a [`ParentScope`] that records the enclosing operator, and the
//! operand parenthesizes itself when it binds more loosely than that
//! operator allows.
//!
//! # Structure
//!
//! - `declarations` - Directives, classes, members, extensions
//! - `statements` - Statements and function bodies
//! - `expressions` - Expressions, literals, argument lists
//! - `types` - Type annotations and formal parameter lists

mod declarations;
mod expressions;
mod statements;
mod types;

use crate::dart::operators::{precedence, Precedence};
use crate::dart::DartCompilationUnit;
use std::ops::{Deref, DerefMut};

const INDENT: &str = "  ";

/// How a child list is separated and enclosed.
#[derive(Debug, Clone, Copy)]
struct Delimiters<'a> {
    separator: &'a str,
    prefix: &'a str,
    suffix: &'a str,
    /// Written alone when the list is empty
    empty: &'a str,
}

impl Delimiters<'static> {
    /// Comma-separated, nothing around it.
    const COMMA: Self = Self::enclosed("", "");

    /// `<A, B>`, or nothing at all when empty.
    const ANGLE: Self = Self::enclosed("<", ">");
}

impl<'a> Delimiters<'a> {
    const fn enclosed(prefix: &'a str, suffix: &'a str) -> Self {
        Self {
            separator: ", ",
            prefix,
            suffix,
            empty: "",
        }
    }

    const fn or_empty(self, empty: &'a str) -> Self {
        Self { empty, ..self }
    }
}

/// Render one compilation unit.
pub fn render(unit: &DartCompilationUnit) -> String {
    let mut renderer = DartRenderer::new();
    renderer.compilation_unit(unit);
    renderer.finish()
}

/// Where an operand sits relative to its parent operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Left operand of a binary operator
    Left,
    /// Right operand of a binary operator
    Right,
    /// Operand of a prefix operator
    PrefixOperand,
    /// Any other operand slot
    Operand,
}

#[derive(Debug, Clone, Copy)]
struct Parent {
    precedence: Precedence,
    position: Position,
}

pub struct DartRenderer {
    out: String,
    indent: usize,
    at_line_start: bool,
    parents: Vec<Parent>,
}

impl Default for DartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DartRenderer {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            at_line_start: true,
            parents: Vec::new(),
        }
    }

    /// The rendered text, ending in exactly one newline.
    pub fn finish(self) -> String {
        let mut out = self.out;
        let trimmed = out.trim_end_matches('\n').len();
        out.truncate(trimmed);
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent {
                self.out.push_str(INDENT);
            }
            self.at_line_start = false;
        }
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    /// Start a new line unless already at one, then leave one empty line.
    fn blank_line(&mut self) {
        if !self.at_line_start {
            self.newline();
        }
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.newline();
        }
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn join<T>(&mut self, items: &[T], delimiters: Delimiters<'_>, mut render: impl FnMut(&mut Self, &T)) {
        if items.is_empty() {
            self.write(delimiters.empty);
            return;
        }
        self.write(delimiters.prefix);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write(delimiters.separator);
            }
            render(self, item);
        }
        self.write(delimiters.suffix);
    }

    /// Render operands of an operator with the given precedence.
    fn with_parent(&mut self, precedence: Precedence, position: Position) -> ParentScope<'_> {
        self.parents.push(Parent { precedence, position });
        ParentScope { renderer: self }
    }

    /// Render in a context that needs no parentheses at all, e.g. an
    /// argument or a statement.
    fn top_level(&mut self) -> ParentScope<'_> {
        self.with_parent(precedence::NONE, Position::Operand)
    }
}

/// Scope of one parent operator; pops it when dropped.
struct ParentScope<'r> {
    renderer: &'r mut DartRenderer,
}

impl Deref for ParentScope<'_> {
    type Target = DartRenderer;

    fn deref(&self) -> &DartRenderer {
        self.renderer
    }
}

impl DerefMut for ParentScope<'_> {
    fn deref_mut(&mut self) -> &mut DartRenderer {
        self.renderer
    }
}

impl Drop for ParentScope<'_> {
    fn drop(&mut self) {
        self.renderer.parents.pop();
    }
}
