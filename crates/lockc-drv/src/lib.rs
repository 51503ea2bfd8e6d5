//! Orchestrates a single Locks source file through the whole pipeline:
//! lex, parse, semantic analysis, then either the tree-walking interpreter
//! or compile/assemble/run on the bytecode VM.
//!
//! A driver invocation that hits a lex/parse/analyze error reports every
//! diagnostic the accumulating phases collected and stops before running
//! anything; the interpreter and VM are fail-fast and stop at the first
//! runtime error, matching `spec.md` §7.

use anyhow::{anyhow, Context, Result};
use lockc_asm::CodeObject;
use lockc_interp::Interpreter;
use lockc_par::ast::Program;
use lockc_util::{FileId, Handler, LocksError, SourceMap};
use std::path::Path;
use tracing::debug;

/// Which back-end runs the program once it's been analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    TreeWalk,
    Vm,
}

/// Everything read and recorded while driving one source file through the
/// pipeline, kept around so callers can print diagnostics against the
/// original source text.
pub struct Session {
    pub sources: SourceMap,
    pub handler: Handler,
    file: FileId,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut sources = SourceMap::new();
        let file = sources.add_file(path.display().to_string(), content);
        Ok(Session { sources, handler: Handler::new(), file })
    }

    pub fn from_source(name: &str, content: impl Into<String>) -> Self {
        let mut sources = SourceMap::new();
        let file = sources.add_file(name, content);
        Session { sources, handler: Handler::new(), file }
    }

    /// Runs lexing, parsing and semantic analysis. Returns the AST on
    /// success; on failure every accumulated diagnostic has already been
    /// pushed into `self.handler` for the caller to render.
    pub fn analyze(&mut self) -> Result<Program> {
        let source = self
            .sources
            .source(self.file)
            .map_err(|e| anyhow!("{e}"))?
            .to_string();

        debug!(phase = "lex", "tokenizing {} bytes", source.len());
        let tokens = lockc_lex::Lexer::new(&source, self.file, &mut self.handler).tokenize();

        debug!(phase = "parse", "parsing {} tokens", tokens.len());
        let program = lockc_par::Parser::new(tokens, &mut self.handler).parse_program();

        debug!(phase = "analyze", "checking {} top-level statements", program.len());
        lockc_sem::SemanticAnalyzer::new(&mut self.handler).analyze(&program);

        if self.handler.had_error() {
            return Err(anyhow!("{} error(s) found in {}", self.handler.diagnostics().len(), self.file_name()));
        }

        Ok(program)
    }

    pub fn file_name(&self) -> &str {
        self.sources.file_name(self.file).unwrap_or("<unknown>")
    }

    pub fn report_diagnostics(&self) {
        self.handler.emit_to_stderr();
    }
}

/// Lex, parse, analyze, then run on the requested back-end. Exit-code
/// mapping (`0`/`1`/`-1`) is the CLI's job, not the driver's — this
/// returns the pipeline's own `LocksError` on a runtime failure so the
/// caller can decide how to report it.
pub fn run(session: &mut Session, backend: Backend) -> Result<std::result::Result<(), LocksError>> {
    let program = session.analyze()?;
    match backend {
        Backend::TreeWalk => {
            debug!(phase = "interpret", "running on the tree-walking interpreter");
            Ok(Interpreter::new().run(&program))
        }
        Backend::Vm => {
            let code = build_code_object(&program);
            debug!(phase = "vm_run", "running on the bytecode VM");
            Ok(lockc_vm::Vm::new(code).run())
        }
    }
}

/// Lex, parse, analyze, then compile and assemble without running
/// anything. Used by `lockst build` and by the VM back-end of `run`.
pub fn build(session: &mut Session) -> Result<Vec<u8>> {
    let program = session.analyze()?;
    let code = lockc_compile::compile(&program);
    debug!(phase = "assemble", "assembling {} function(s)", code.functions.len());
    lockc_asm::assemble(&code).map_err(|e| anyhow!("{}", e.render()))
}

fn build_code_object(program: &Program) -> CodeObject {
    let ir = lockc_compile::compile(program);
    let bytes = lockc_asm::assemble(&ir).expect("a semantically analyzed program always assembles");
    lockc_asm::load(&bytes).expect("the assembler always produces a loadable image")
}

/// Loads a previously built binary image and prints its disassembly.
pub fn disassemble(bytes: &[u8]) -> Result<String> {
    let code = lockc_asm::load(bytes).map_err(|e| anyhow!("{}", e.render()))?;
    Ok(lockc_asm::disassemble(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_walk_backend_runs_a_simple_program() {
        let mut session = Session::from_source("t.lk", "var x = 1 + 2; println(x);");
        let result = run(&mut session, Backend::TreeWalk).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn vm_backend_agrees_with_tree_walk_backend() {
        let mut tree = Session::from_source("t.lk", "fun sq(n) { return n * n; } var r = sq(6); if (r != 36) { return; }");
        let mut vm = Session::from_source("t.lk", "fun sq(n) { return n * n; } var r = sq(6); if (r != 36) { return; }");
        assert!(run(&mut tree, Backend::TreeWalk).unwrap().is_ok());
        assert!(run(&mut vm, Backend::Vm).unwrap().is_ok());
    }

    #[test]
    fn analyze_reports_undefined_names() {
        let mut session = Session::from_source("t.lk", "println(missing);");
        assert!(session.analyze().is_err());
        assert!(session.handler.had_error());
    }

    #[test]
    fn build_then_disassemble_round_trips() {
        let mut session = Session::from_source("t.lk", "var x = 5; println(x);");
        let bytes = build(&mut session).unwrap();
        let text = disassemble(&bytes).unwrap();
        assert!(text.contains("STORE_GLOBAL") || text.contains("main"));
    }

    #[test]
    fn load_reads_a_session_from_an_actual_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".lk").unwrap();
        use std::io::Write;
        write!(file, "println(1+1);").unwrap();

        let mut session = Session::load(file.path()).unwrap();
        let result = run(&mut session, Backend::TreeWalk).unwrap();
        assert!(result.is_ok());
    }
}
