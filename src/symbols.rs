//! Variable table for a single compilation.
//!
//! Built on [`indexmap::IndexMap`] so that symbols keep their declaration
//! order, which is the order unused-variable warnings are reported in.

use crate::value::{Kind, Literal};
use indexmap::IndexMap;
use thiserror::Error;

/// Reasons a table operation can be refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SymbolError {
    #[error("variable '{0}' is already declared")]
    AlreadyDeclared(String),

    #[error("undefined variable '{0}'")]
    Undefined(String),

    #[error("cannot assign {found} value to '{name}' of kind {expected}")]
    KindMismatch {
        name: String,
        expected: Kind,
        found: Kind,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: Kind,
    pub value: Literal,
    pub used: bool,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Adds a new variable. Names are unique; a second declaration of the
    /// same name is refused and leaves the table untouched.
    pub fn declare(&mut self, name: &str, kind: Kind, value: Literal) -> Result<(), SymbolError> {
        if self.symbols.contains_key(name) {
            return Err(SymbolError::AlreadyDeclared(name.to_string()));
        }
        if value.kind() != kind {
            return Err(SymbolError::KindMismatch {
                name: name.to_string(),
                expected: kind,
                found: value.kind(),
            });
        }

        log::debug!("declare {} {} = {}", kind, name, value);
        self.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind,
                value,
                used: false,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Overwrites the value of an existing variable of the same kind.
    pub fn assign(&mut self, name: &str, value: Literal) -> Result<(), SymbolError> {
        let symbol = self
            .symbols
            .get_mut(name)
            .ok_or_else(|| SymbolError::Undefined(name.to_string()))?;

        if symbol.kind != value.kind() {
            return Err(SymbolError::KindMismatch {
                name: name.to_string(),
                expected: symbol.kind,
                found: value.kind(),
            });
        }

        log::debug!("assign {} = {}", name, value);
        symbol.value = value;
        Ok(())
    }

    /// Flags a variable as read. Returns false when the name is unknown.
    pub fn mark_used(&mut self, name: &str) -> bool {
        match self.symbols.get_mut(name) {
            Some(symbol) => {
                symbol.used = true;
                true
            }
            None => false,
        }
    }

    /// Variables that were never read, in declaration order.
    pub fn unused(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(|symbol| !symbol.used)
    }
}
