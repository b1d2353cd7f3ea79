use crate::{
    error::CompileError,
    lexer::{Keyword, Token, TokenKind},
    symtab::{ClassTable, SubroutineKind, SubroutineTable, SymbolKind},
};

/// Single-pass recursive-descent compiler over the token sequence. Each
/// production consumes a token prefix and appends VM instruction lines to
/// the output buffer; no syntax tree is built.
#[derive(Debug)]
pub struct Codegen {
    tokens: Vec<Token>,
    index: usize,
    output: Vec<String>,
}

fn binary_op(kind: &TokenKind) -> Option<&'static str> {
    let TokenKind::Symbol(c) = kind else {
        return None;
    };
    match *c {
        '+' => Some("add"),
        '-' => Some("sub"),
        '*' => Some("call Math.multiply 2"),
        '/' => Some("call Math.divide 2"),
        '&' => Some("and"),
        '|' => Some("or"),
        '<' => Some("lt"),
        '>' => Some("gt"),
        '=' => Some("eq"),
        _ => None,
    }
}

impl Codegen {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            output: vec![],
        }
    }

    /// Compiles one class and returns the newline-terminated instruction
    /// lines.
    pub fn generate(mut self) -> Result<String, CompileError> {
        self.gen_class()?;
        let mut out = self.output.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        Ok(out)
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    fn is_eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn advance(&mut self, expected: &str) -> Result<Token, CompileError> {
        let token = self
            .tokens
            .get(self.index)
            .cloned()
            .ok_or_else(|| CompileError::UnexpectedEof {
                expected: expected.to_string(),
            })?;
        self.index += 1;
        Ok(token)
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        match self.tokens.get(self.index) {
            Some(token) => CompileError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.clone(),
            },
            None => CompileError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    fn consume_symbol(&mut self, symbol: char) -> bool {
        if matches!(self.peek_kind(), Some(TokenKind::Symbol(c)) if *c == symbol) {
            self.index += 1;
            return true;
        }
        false
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), CompileError> {
        if self.consume_symbol(symbol) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", symbol)))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_kind() == Some(&TokenKind::Keyword(keyword)) {
            self.index += 1;
            return true;
        }
        false
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{:?}", keyword)))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Ident(name)) => {
                self.index += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// type = "int" | "char" | "boolean" | class_name
    fn expect_type(&mut self) -> Result<String, CompileError> {
        let token = self.advance("a type")?;
        match token.kind {
            TokenKind::Keyword(Keyword::Int) => Ok("int".to_string()),
            TokenKind::Keyword(Keyword::Char) => Ok("char".to_string()),
            TokenKind::Keyword(Keyword::Boolean) => Ok("boolean".to_string()),
            TokenKind::Ident(name) => Ok(name),
            found => Err(CompileError::UnexpectedToken {
                expected: "a type".to_string(),
                found,
            }),
        }
    }

    fn expect_return_type(&mut self) -> Result<String, CompileError> {
        if self.consume_keyword(Keyword::Void) {
            Ok("void".to_string())
        } else {
            self.expect_type()
        }
    }

    /// class = "class" class_name "{" class_var_dec* subroutine_dec* "}"
    fn gen_class(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Class)?;
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;

        // The class scope exists before any member is compiled, so fields
        // declared below a method still resolve inside it.
        let mut class = ClassTable::new(name);
        while !self.consume_symbol('}') {
            match self.peek_kind() {
                Some(TokenKind::Keyword(Keyword::Static | Keyword::Field)) => {
                    self.gen_class_var_dec(&mut class)?;
                }
                Some(TokenKind::Keyword(
                    Keyword::Constructor | Keyword::Function | Keyword::Method,
                )) => {
                    self.gen_subroutine_dec(&mut class)?;
                }
                _ => return Err(self.unexpected("a class member declaration")),
            }
        }
        if !self.is_eof() {
            return Err(self.unexpected("end of input"));
        }
        Ok(())
    }

    /// class_var_dec = ("static" | "field") type var_name ("," var_name)* ";"
    fn gen_class_var_dec(&mut self, class: &mut ClassTable) -> Result<(), CompileError> {
        let kind = if self.consume_keyword(Keyword::Static) {
            SymbolKind::Static
        } else {
            self.expect_keyword(Keyword::Field)?;
            SymbolKind::Field
        };
        let ty = self.expect_type()?;
        loop {
            let name = self.expect_ident()?;
            class.declare(&name, &ty, kind)?;
            if !self.consume_symbol(',') {
                break;
            }
        }
        self.expect_symbol(';')
    }

    /// subroutine_dec = ("constructor" | "function" | "method")
    ///                  ("void" | type) subroutine_name "(" parameter_list ")"
    ///                  subroutine_body
    fn gen_subroutine_dec(&mut self, class: &mut ClassTable) -> Result<(), CompileError> {
        let kind = if self.consume_keyword(Keyword::Constructor) {
            SubroutineKind::Constructor
        } else if self.consume_keyword(Keyword::Function) {
            SubroutineKind::Function
        } else {
            self.expect_keyword(Keyword::Method)?;
            SubroutineKind::Method
        };
        let return_type = self.expect_return_type()?;
        let name = self.expect_ident()?;

        let mut sub = SubroutineTable::new(name, kind, return_type == "void");
        if kind == SubroutineKind::Method {
            // The receiver occupies argument 0, ahead of declared parameters.
            sub.declare("this", &class.class_name, SymbolKind::Argument)?;
        }

        self.expect_symbol('(')?;
        if !self.consume_symbol(')') {
            loop {
                let ty = self.expect_type()?;
                let param = self.expect_ident()?;
                sub.declare(&param, &ty, SymbolKind::Argument)?;
                if !self.consume_symbol(',') {
                    break;
                }
            }
            self.expect_symbol(')')?;
        }

        self.gen_subroutine_body(class, sub)
    }

    /// subroutine_body = "{" var_dec* statement* "}"
    ///
    /// The function header carries the final local count, so it is emitted
    /// only after every `var` declaration has been processed.
    fn gen_subroutine_body(
        &mut self,
        class: &mut ClassTable,
        mut sub: SubroutineTable,
    ) -> Result<(), CompileError> {
        self.expect_symbol('{')?;
        while self.peek_kind() == Some(&TokenKind::Keyword(Keyword::Var)) {
            self.gen_var_dec(&mut sub)?;
        }

        self.emit(format!(
            "function {}.{} {}",
            class.class_name,
            sub.name,
            sub.var_count()
        ));
        match sub.kind {
            SubroutineKind::Method => {
                self.emit("push argument 0");
                self.emit("pop pointer 0");
            }
            SubroutineKind::Constructor => {
                self.emit(format!("push constant {}", class.field_count()));
                self.emit("call Memory.alloc 1");
                self.emit("pop pointer 0");
            }
            SubroutineKind::Function => (),
        }

        while !self.consume_symbol('}') {
            self.gen_statement(class, &sub)?;
        }
        Ok(())
    }

    /// var_dec = "var" type var_name ("," var_name)* ";"
    fn gen_var_dec(&mut self, sub: &mut SubroutineTable) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Var)?;
        let ty = self.expect_type()?;
        loop {
            let name = self.expect_ident()?;
            sub.declare(&name, &ty, SymbolKind::Local)?;
            if !self.consume_symbol(',') {
                break;
            }
        }
        self.expect_symbol(';')
    }

    /// statement = let_statement | if_statement | while_statement
    ///           | do_statement | return_statement
    fn gen_statement(
        &mut self,
        class: &mut ClassTable,
        sub: &SubroutineTable,
    ) -> Result<(), CompileError> {
        if self.consume_keyword(Keyword::Let) {
            self.gen_let(class, sub)
        } else if self.consume_keyword(Keyword::If) {
            self.gen_if(class, sub)
        } else if self.consume_keyword(Keyword::While) {
            self.gen_while(class, sub)
        } else if self.consume_keyword(Keyword::Do) {
            self.gen_do(class, sub)
        } else if self.consume_keyword(Keyword::Return) {
            self.gen_return(class, sub)
        } else {
            Err(self.unexpected("a statement"))
        }
    }

    /// let_statement = "let" var_name ("[" expression "]")? "=" expression ";"
    fn gen_let(&mut self, class: &mut ClassTable, sub: &SubroutineTable) -> Result<(), CompileError> {
        let name = self.expect_ident()?;
        let location = sub
            .get(class, &name)
            .map(|s| s.location())
            .ok_or(CompileError::UnknownIdentifier(name))?;

        if self.consume_symbol('[') {
            // The target address is computed first and stashed in temp 0
            // after the right-hand side runs, so an array read on the right
            // cannot clobber the pointer register mid-assignment.
            self.emit(format!("push {}", location));
            self.gen_expression(class, sub)?;
            self.expect_symbol(']')?;
            self.emit("add");
            self.expect_symbol('=')?;
            self.gen_expression(class, sub)?;
            self.expect_symbol(';')?;
            self.emit("pop temp 0");
            self.emit("pop pointer 1");
            self.emit("push temp 0");
            self.emit("pop that 0");
        } else {
            self.expect_symbol('=')?;
            self.gen_expression(class, sub)?;
            self.expect_symbol(';')?;
            self.emit(format!("pop {}", location));
        }
        Ok(())
    }

    /// if_statement = "if" "(" expression ")" "{" statement* "}"
    ///                ("else" "{" statement* "}")?
    ///
    /// Both labels are emitted even without an else branch, collapsing to
    /// adjacent no-op labels.
    fn gen_if(&mut self, class: &mut ClassTable, sub: &SubroutineTable) -> Result<(), CompileError> {
        let else_label = class.next_label();
        let end_label = class.next_label();

        self.expect_symbol('(')?;
        self.gen_expression(class, sub)?;
        self.expect_symbol(')')?;
        self.emit("not");
        self.emit(format!("if-goto {}", else_label));

        self.gen_block(class, sub)?;
        self.emit(format!("goto {}", end_label));
        self.emit(format!("label {}", else_label));
        if self.consume_keyword(Keyword::Else) {
            self.gen_block(class, sub)?;
        }
        self.emit(format!("label {}", end_label));
        Ok(())
    }

    /// while_statement = "while" "(" expression ")" "{" statement* "}"
    fn gen_while(
        &mut self,
        class: &mut ClassTable,
        sub: &SubroutineTable,
    ) -> Result<(), CompileError> {
        let loop_label = class.next_label();
        let end_label = class.next_label();

        self.emit(format!("label {}", loop_label));
        self.expect_symbol('(')?;
        self.gen_expression(class, sub)?;
        self.expect_symbol(')')?;
        self.emit("not");
        self.emit(format!("if-goto {}", end_label));

        self.gen_block(class, sub)?;
        self.emit(format!("goto {}", loop_label));
        self.emit(format!("label {}", end_label));
        Ok(())
    }

    fn gen_block(
        &mut self,
        class: &mut ClassTable,
        sub: &SubroutineTable,
    ) -> Result<(), CompileError> {
        self.expect_symbol('{')?;
        while !self.consume_symbol('}') {
            self.gen_statement(class, sub)?;
        }
        Ok(())
    }

    /// do_statement = "do" subroutine_call ";"
    fn gen_do(&mut self, class: &mut ClassTable, sub: &SubroutineTable) -> Result<(), CompileError> {
        let name = self.expect_ident()?;
        self.gen_subroutine_call(class, sub, name)?;
        self.expect_symbol(';')?;
        // Every call leaves a value on the stack; a do statement discards it.
        self.emit("pop temp 0");
        Ok(())
    }

    /// return_statement = "return" expression? ";"
    fn gen_return(
        &mut self,
        class: &mut ClassTable,
        sub: &SubroutineTable,
    ) -> Result<(), CompileError> {
        if !self.consume_symbol(';') {
            self.gen_expression(class, sub)?;
            self.expect_symbol(';')?;
        }
        if sub.is_void {
            // The calling convention requires every call to leave a value.
            self.emit("push constant 0");
        }
        self.emit("return");
        Ok(())
    }

    /// expression = term (op term)*
    ///
    /// The grammar is flat: operator chains associate strictly to the left,
    /// so each operator is emitted as soon as its right operand is compiled.
    fn gen_expression(
        &mut self,
        class: &ClassTable,
        sub: &SubroutineTable,
    ) -> Result<(), CompileError> {
        self.gen_term(class, sub)?;
        while let Some(instruction) = self.peek_kind().and_then(binary_op) {
            self.index += 1;
            self.gen_term(class, sub)?;
            self.emit(instruction);
        }
        Ok(())
    }

    /// term = integer_constant | string_constant | keyword_constant
    ///      | var_name | var_name "[" expression "]" | subroutine_call
    ///      | "(" expression ")" | ("-" | "~") term
    fn gen_term(&mut self, class: &ClassTable, sub: &SubroutineTable) -> Result<(), CompileError> {
        let token = self.advance("a term")?;
        match token.kind {
            TokenKind::IntConst(value) => {
                self.emit(format!("push constant {}", value));
            }
            TokenKind::StrConst(text) => {
                self.emit(format!("push constant {}", text.chars().count()));
                self.emit("call String.new 1");
                for c in text.chars() {
                    self.emit(format!("push constant {}", c as u32));
                    self.emit("call String.appendChar 2");
                }
            }
            TokenKind::Keyword(Keyword::True) => {
                self.emit("push constant 1");
                self.emit("neg");
            }
            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.emit("push constant 0");
            }
            TokenKind::Keyword(Keyword::This) => {
                self.emit_receiver(class, sub);
            }
            TokenKind::Ident(name) => {
                if matches!(
                    self.peek_kind(),
                    Some(TokenKind::Symbol('.')) | Some(TokenKind::Symbol('('))
                ) {
                    self.gen_subroutine_call(class, sub, name)?;
                } else if self.consume_symbol('[') {
                    let location = sub
                        .get(class, &name)
                        .map(|s| s.location())
                        .ok_or(CompileError::UnknownIdentifier(name))?;
                    self.emit(format!("push {}", location));
                    self.gen_expression(class, sub)?;
                    self.expect_symbol(']')?;
                    self.emit("add");
                    self.emit("pop pointer 1");
                    self.emit("push that 0");
                } else {
                    let location = sub
                        .get(class, &name)
                        .map(|s| s.location())
                        .ok_or(CompileError::UnknownIdentifier(name))?;
                    self.emit(format!("push {}", location));
                }
            }
            TokenKind::Symbol('(') => {
                self.gen_expression(class, sub)?;
                self.expect_symbol(')')?;
            }
            TokenKind::Symbol('-') => {
                self.gen_term(class, sub)?;
                self.emit("neg");
            }
            TokenKind::Symbol('~') => {
                self.gen_term(class, sub)?;
                self.emit("not");
            }
            found => {
                return Err(CompileError::UnexpectedToken {
                    expected: "a term".to_string(),
                    found,
                })
            }
        }
        Ok(())
    }

    /// subroutine_call = subroutine_name "(" expression_list ")"
    ///                 | (class_name | var_name) "." subroutine_name
    ///                   "(" expression_list ")"
    ///
    /// An unqualified name is a method call on the implicit receiver. A
    /// qualifier that resolves to a variable is a method call on that
    /// object; otherwise the qualifier is taken as a class name and no
    /// receiver is pushed.
    fn gen_subroutine_call(
        &mut self,
        class: &ClassTable,
        sub: &SubroutineTable,
        name: String,
    ) -> Result<(), CompileError> {
        let mut n_args = 0;
        let target = if self.consume_symbol('.') {
            let method = self.expect_ident()?;
            if let Some(symbol) = sub.get(class, &name) {
                let receiver = symbol.location();
                let ty = symbol.ty.clone();
                self.emit(format!("push {}", receiver));
                n_args += 1;
                format!("{}.{}", ty, method)
            } else {
                format!("{}.{}", name, method)
            }
        } else {
            self.emit_receiver(class, sub);
            n_args += 1;
            format!("{}.{}", class.class_name, name)
        };

        self.expect_symbol('(')?;
        if !self.consume_symbol(')') {
            loop {
                self.gen_expression(class, sub)?;
                n_args += 1;
                if !self.consume_symbol(',') {
                    break;
                }
            }
            self.expect_symbol(')')?;
        }
        self.emit(format!("call {} {}", target, n_args));
        Ok(())
    }

    /// Pushes the current object reference: the `this` symbol where one is
    /// registered (methods), otherwise the object pointer itself
    /// (constructors, which bind it through Memory.alloc).
    fn emit_receiver(&mut self, class: &ClassTable, sub: &SubroutineTable) {
        match sub.get(class, "this") {
            Some(symbol) => {
                let location = symbol.location();
                self.emit(format!("push {}", location));
            }
            None => self.emit("push pointer 0"),
        }
    }
}
