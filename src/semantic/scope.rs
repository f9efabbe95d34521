//! Symbols and lexical scopes
//!
//! Symbols live in a [`SymbolTable`] arena and are referred to by [`SymbolId`].
//! A symbol records the id of its declaring node rather than a reference to
//! it, so the AST and the table never point into each other.
//!
//! [`ScopeStack`] maps names to symbols while the resolver walks the tree.
//! Scopes are only needed during resolution; once every use is bound the
//! stack is dropped and the arena is all that remains.

use crate::parser::ast::{NodeId, SourceLocation, Type};
use crate::semantic::intrinsics::Intrinsic;
use rustc_hash::FxHashMap;

/// Index of a [`Symbol`] in its [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

/// Where a symbol's value lives, or what it calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// Slot in the global store
    Global { index: usize },
    /// Frame slot; parameters take the lowest slots in order
    Param { slot: usize },
    /// Frame slot after the parameters
    Local { slot: usize },
    /// User function, `index` into the program's function list
    Function { index: usize, params: Vec<Type> },
    Intrinsic(Intrinsic),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Variable type, or return type for callables
    pub ty: Type,
    pub kind: SymbolKind,
    /// Declaring node; `None` for intrinsics
    pub decl: Option<NodeId>,
    pub location: Option<SourceLocation>,
}

impl Symbol {
    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Function { .. } | SymbolKind::Intrinsic(_)
        )
    }

    /// Call signature, for functions and intrinsics
    pub fn signature(&self) -> Option<Signature> {
        let params = match &self.kind {
            SymbolKind::Function { params, .. } => params.clone(),
            SymbolKind::Intrinsic(intrinsic) => intrinsic.params().to_vec(),
            _ => return None,
        };
        Some(Signature {
            name: self.name.clone(),
            params,
            ret: self.ty,
        })
    }
}

/// Parameter and return types of a callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
}

/// Arena of every symbol in a program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    /// Look up a symbol by id.
    ///
    /// Ids are only handed out by [`SymbolTable::add`], so every id obtained
    /// from this table is in range.
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| (SymbolId(i), symbol))
    }
}

/// Stack of name → symbol maps, innermost last
#[derive(Debug, Default)]
pub struct ScopeStack {
    global: FxHashMap<String, SymbolId>,
    inner: Vec<FxHashMap<String, SymbolId>>,
}

impl ScopeStack {
    /// A stack holding only the (empty) global scope
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.inner.push(FxHashMap::default());
    }

    /// Leave the innermost scope. The global scope is never popped.
    pub fn pop(&mut self) {
        self.inner.pop();
    }

    pub fn depth(&self) -> usize {
        self.inner.len() + 1
    }

    /// Bind `name` in the innermost scope.
    ///
    /// Fails with the symbol already bound to `name` in that scope; outer
    /// bindings are shadowed, not reported.
    pub fn declare(&mut self, name: &str, id: SymbolId) -> Result<(), SymbolId> {
        let scope = self.inner.last_mut().unwrap_or(&mut self.global);
        if let Some(existing) = scope.get(name) {
            return Err(*existing);
        }
        scope.insert(name.to_string(), id);
        Ok(())
    }

    /// Innermost binding of `name`
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.inner
            .iter()
            .rev()
            .chain(std::iter::once(&self.global))
            .find_map(|scope| scope.get(name).copied())
    }
}
