pub mod codegen;
pub mod error;
pub mod lexer;
pub mod symtab;

use codegen::Codegen;
use error::CompileError;
use lexer::Lexer;

/// Compiles one Jack class into newline-terminated VM instruction lines.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = Lexer::tokenize(source)?;

    let codegen = Codegen::new(tokens);
    codegen.generate()
}
