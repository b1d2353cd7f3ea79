use crate::error::CompileError;

use super::{Token, TokenKind, KEYWORDS, SYMBOLS};

#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            tokens: vec![],
        }
    }

    pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
        let mut lexer = Lexer::new(source);
        lexer.scan()?;
        Ok(lexer.tokens)
    }

    fn new_token(&mut self, kind: TokenKind) {
        self.tokens.push(Token { kind });
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn scan(&mut self) -> Result<(), CompileError> {
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() {
                self.index += 1;
            } else if c == '/' && self.peek(1) == Some('/') {
                self.skip_line_comment();
            } else if c == '/' && self.peek(1) == Some('*') {
                self.skip_block_comment()?;
            } else if c == '"' {
                self.scan_string()?;
            } else if c.is_ascii_digit() {
                self.scan_number()?;
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.scan_identifier();
            } else if SYMBOLS.contains(&c) {
                self.new_token(TokenKind::Symbol(c));
                self.index += 1;
            } else {
                return Err(CompileError::UnexpectedCharacter(c));
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !matches!(self.peek(0), Some('\n') | None) {
            self.index += 1;
        }
    }

    /// Skips `/* ... */` and `/** ... */` up to the first closing `*/`.
    fn skip_block_comment(&mut self) -> Result<(), CompileError> {
        self.index += 2;
        while self.peek(0).is_some() {
            if self.peek(0) == Some('*') && self.peek(1) == Some('/') {
                self.index += 2;
                return Ok(());
            }
            self.index += 1;
        }
        Err(CompileError::UnterminatedComment)
    }

    /// A string constant runs to the closing quote on the same line.
    fn scan_string(&mut self) -> Result<(), CompileError> {
        self.index += 1;
        let mut text = String::new();
        loop {
            match self.peek(0) {
                Some('"') => break,
                Some('\n') | None => return Err(CompileError::UnterminatedString),
                Some(c) => {
                    text.push(c);
                    self.index += 1;
                }
            }
        }
        self.index += 1;
        self.new_token(TokenKind::StrConst(text));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<(), CompileError> {
        let text: String = self.chars[self.index..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        self.index += text.len();

        let value = text
            .parse::<u32>()
            .ok()
            .filter(|&v| v <= 32767)
            .ok_or_else(|| CompileError::IntegerOutOfRange(text.clone()))?;
        self.new_token(TokenKind::IntConst(value as u16));
        Ok(())
    }

    fn scan_identifier(&mut self) {
        let text: String = self.chars[self.index..]
            .iter()
            .take_while(|&&c| c.is_ascii_alphanumeric() || c == '_')
            .collect();
        self.index += text.len();

        if let Some(&keyword) = KEYWORDS.get(&text) {
            self.new_token(TokenKind::Keyword(keyword));
        } else {
            self.new_token(TokenKind::Ident(text));
        }
    }
}
