//! The seam to the external compiler.
//!
//! The parser, type checker, and code generator live outside this
//! repository; the engine only needs something that turns source files into
//! an [`Executable`] or a list of error lines.

use ember_vm::Executable;

/// One source file handed to the compiler.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Compiles source files into an executable. Errors are reported as one
/// message per line, joined into the engine's `COMPILATION_ERROR` result.
pub trait Compiler {
    fn compile(&self, sources: &[SourceFile]) -> Result<Executable, Vec<String>>;
}
