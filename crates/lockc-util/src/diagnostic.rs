//! Diagnostic accumulation for the accumulate-then-fail phases (lexer,
//! parser, semantic analyzer). The interpreter/compiler/assembler/VM never
//! touch this — they return a single [`crate::error::LocksError`] directly.

use crate::error::LocksError;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub error: LocksError,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(error: LocksError) -> Self {
        Self { level: Level::Error, error, span: None }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn render(&self) -> String {
        self.error.render()
    }
}

/// Accumulates diagnostics across a single phase and reports whether that
/// phase failed, matching the original's `hadError` flag on each phase
/// object.
#[derive(Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn report(&mut self, error: LocksError) {
        self.emit(Diagnostic::error(error));
    }

    pub fn had_error(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Print every accumulated diagnostic to stderr, one per line.
    pub fn emit_to_stderr(&self) {
        for diag in &self.diagnostics {
            eprintln!("{}", diag.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn had_error_reflects_emitted_errors() {
        let mut h = Handler::new();
        assert!(!h.had_error());
        h.report(LocksError::name("x is not defined", 3));
        assert!(h.had_error());
        assert_eq!(h.diagnostics().len(), 1);
    }
}
