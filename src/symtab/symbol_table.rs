use std::collections::HashMap;

use crate::error::CompileError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
}

impl SymbolKind {
    /// The VM memory segment backing this kind of symbol. Fields live behind
    /// the object pointer and locals behind the frame, so the declaration
    /// keywords do not map onto segment names one-to-one.
    pub fn segment(self) -> &'static str {
        match self {
            SymbolKind::Static => "static",
            SymbolKind::Field => "this",
            SymbolKind::Argument => "argument",
            SymbolKind::Local => "local",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: String,
    pub kind: SymbolKind,
    pub index: usize,
}

impl Symbol {
    pub fn location(&self) -> String {
        format!("{} {}", self.kind.segment(), self.index)
    }
}

/// Static and field symbols of one class, plus the label counter shared by
/// every statement compiled within that class.
#[derive(Debug)]
pub struct ClassTable {
    pub class_name: String,
    table: HashMap<String, Symbol>,
    counts: HashMap<SymbolKind, usize>,
    label_count: usize,
}

impl ClassTable {
    pub fn new(class_name: String) -> Self {
        Self {
            class_name,
            table: HashMap::new(),
            counts: HashMap::new(),
            label_count: 0,
        }
    }

    pub fn declare(&mut self, name: &str, ty: &str, kind: SymbolKind) -> Result<(), CompileError> {
        if self.table.contains_key(name) {
            return Err(CompileError::DuplicateSymbol(name.to_string()));
        }
        let count = self.counts.entry(kind).or_insert(0);
        let symbol = Symbol {
            name: name.to_string(),
            ty: ty.to_string(),
            kind,
            index: *count,
        };
        *count += 1;
        self.table.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.table.get(name)
    }

    /// Number of words a constructor must allocate for one instance.
    pub fn field_count(&self) -> usize {
        self.counts.get(&SymbolKind::Field).copied().unwrap_or(0)
    }

    pub fn next_label(&mut self) -> String {
        let label = format!("L{}", self.label_count);
        self.label_count += 1;
        label
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Argument and local symbols of one subroutine. The enclosing class table
/// is not owned here; lookups take it as an explicit parameter.
#[derive(Debug)]
pub struct SubroutineTable {
    pub name: String,
    pub kind: SubroutineKind,
    pub is_void: bool,
    table: HashMap<String, Symbol>,
    counts: HashMap<SymbolKind, usize>,
}

impl SubroutineTable {
    pub fn new(name: String, kind: SubroutineKind, is_void: bool) -> Self {
        Self {
            name,
            kind,
            is_void,
            table: HashMap::new(),
            counts: HashMap::new(),
        }
    }

    /// Shadowing a class-scope name is allowed; redeclaring within the
    /// subroutine scope is not.
    pub fn declare(&mut self, name: &str, ty: &str, kind: SymbolKind) -> Result<(), CompileError> {
        if self.table.contains_key(name) {
            return Err(CompileError::DuplicateSymbol(name.to_string()));
        }
        let count = self.counts.entry(kind).or_insert(0);
        let symbol = Symbol {
            name: name.to_string(),
            ty: ty.to_string(),
            kind,
            index: *count,
        };
        *count += 1;
        self.table.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Resolves subroutine scope first, then class scope.
    pub fn get<'a>(&'a self, class: &'a ClassTable, name: &str) -> Option<&'a Symbol> {
        self.table.get(name).or_else(|| class.get(name))
    }

    /// Local count for the `function` header, valid once all `var`
    /// declarations have been processed.
    pub fn var_count(&self) -> usize {
        self.counts.get(&SymbolKind::Local).copied().unwrap_or(0)
    }
}
