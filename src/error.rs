use std::fmt;

use crate::lexer::TokenKind;

/// Everything that can abort the compilation of one class. Compilation
/// stops at the first error; there is no recovery or partial output.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    UnterminatedString,
    UnterminatedComment,
    UnexpectedCharacter(char),
    IntegerOutOfRange(String),
    DuplicateSymbol(String),
    UnknownIdentifier(String),
    UnexpectedToken { expected: String, found: TokenKind },
    UnexpectedEof { expected: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnterminatedString => write!(f, "unterminated string constant"),
            CompileError::UnterminatedComment => write!(f, "unterminated block comment"),
            CompileError::UnexpectedCharacter(c) => write!(f, "unexpected character {:?}", c),
            CompileError::IntegerOutOfRange(text) => {
                write!(f, "integer constant {} is outside 0..=32767", text)
            }
            CompileError::DuplicateSymbol(name) => {
                write!(f, "{} is already declared in this scope", name)
            }
            CompileError::UnknownIdentifier(name) => write!(f, "unknown identifier {}", name),
            CompileError::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found {:?}", expected, found)
            }
            CompileError::UnexpectedEof { expected } => {
                write!(f, "expected {}, reached end of input", expected)
            }
        }
    }
}

impl std::error::Error for CompileError {}
