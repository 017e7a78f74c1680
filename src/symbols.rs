//! Symbols, the layered scope stack, and string interning.
//!
//! The layered lookup map is a stack of hash maps: a scope push installs
//! a new empty top layer, a pop discards only the top layer, and lookups
//! walk from the innermost layer outward. Sequence numbers are assigned
//! once, at insertion, and are never renumbered by a later pop.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    GlobalVar,
    GlobalArray,
    Function,
    Parameter,
    LocalVar,
}

impl SymbolKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::GlobalVar => "GlobalVar",
            SymbolKind::GlobalArray => "GlobalArray",
            SymbolKind::Function => "Function",
            SymbolKind::Parameter => "Parameter",
            SymbolKind::LocalVar => "LocalVar",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub seq: usize,
    /// Declared length, for `GlobalArray` symbols only.
    pub array_len: Option<i64>,
    /// Declared parameter count, for `Function` symbols only.
    pub param_count: Option<usize>,
}

impl Symbol {
    fn new(name: impl Into<String>, kind: SymbolKind, seq: usize) -> Self {
        Symbol {
            name: name.into(),
            kind,
            seq,
            array_len: None,
            param_count: None,
        }
    }
}

/// An insertion-ordered collection of symbols with a layered name lookup.
///
/// `symbols` holds every symbol ever inserted, indexed by sequence
/// number; popping a scope never removes an entry from it. `layers` is
/// the stack of name -> sequence-number maps used for lookup.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    layers: Vec<HashMap<String, usize>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: Vec::new(),
            layers: vec![HashMap::new()],
        }
    }

    /// Creates a function-local table whose outermost layer backs onto
    /// the caller's current layer set, so lookups that miss every local
    /// layer fall through to globals. The function table's own sequence
    /// numbers start at 0 independent of the global table.
    pub fn new_function_scope(global: &SymbolTable) -> Self {
        let mut layers = global.layers.clone();
        layers.push(HashMap::new());
        SymbolTable {
            symbols: Vec::new(),
            layers,
        }
    }

    pub fn push_scope(&mut self) {
        self.layers.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.layers.pop();
        if self.layers.is_empty() {
            self.layers.push(HashMap::new());
        }
    }

    /// Inserts a symbol into the top layer. Returns an error if `name`
    /// is already declared in that same layer (shadowing across layers
    /// is fine; redeclaration within one layer is not).
    pub fn declare(&mut self, name: &str, kind: SymbolKind) -> Result<usize, String> {
        if let Some(top) = self.layers.last() {
            if top.contains_key(name) {
                return Err(format!("'{name}' is already declared in this scope"));
            }
        }
        let seq = self.symbols.len();
        self.symbols.push(Symbol::new(name, kind, seq));
        self.layers
            .last_mut()
            .expect("layer stack is never empty")
            .insert(name.to_string(), seq);
        Ok(seq)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        for layer in self.layers.iter().rev() {
            if let Some(&seq) = layer.get(name) {
                return Some(&self.symbols[seq]);
            }
        }
        None
    }

    pub fn get_mut(&mut self, seq: usize) -> &mut Symbol {
        &mut self.symbols[seq]
    }

    pub fn get(&self, seq: usize) -> &Symbol {
        &self.symbols[seq]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Count of symbols of the given kind, used by CodeGen to know how
    /// many locals to zero-push in a function's prologue.
    pub fn count_kind(&self, kind: SymbolKind) -> usize {
        self.symbols.iter().filter(|s| s.kind == kind).count()
    }
}

/// First-come, never-reused interning of string literals.
#[derive(Debug, Default)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, usize>,
}

impl StringTable {
    pub fn new() -> Self {
        StringTable::default()
    }

    /// Interns `lexeme` (which still carries its surrounding quotes) and
    /// returns its dense index. Returns the existing index if this exact
    /// lexeme was already interned.
    pub fn intern(&mut self, lexeme: &str) -> usize {
        if let Some(&i) = self.index.get(lexeme) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(lexeme.to_string());
        self.index.insert(lexeme.to_string(), i);
        i
    }

    pub fn get(&self, index: usize) -> &str {
        &self.strings[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_pop_restores_outer_view() {
        let mut t = SymbolTable::new();
        t.declare("x", SymbolKind::GlobalVar).unwrap();
        t.push_scope();
        t.declare("y", SymbolKind::LocalVar).unwrap();
        assert!(t.lookup("y").is_some());
        t.pop_scope();
        assert!(t.lookup("y").is_none());
        assert!(t.lookup("x").is_some());
    }

    #[test]
    fn duplicate_in_same_layer_errors() {
        let mut t = SymbolTable::new();
        t.declare("x", SymbolKind::GlobalVar).unwrap();
        assert!(t.declare("x", SymbolKind::GlobalVar).is_err());
    }

    #[test]
    fn shadowing_across_layers_is_allowed() {
        let mut t = SymbolTable::new();
        t.declare("x", SymbolKind::GlobalVar).unwrap();
        t.push_scope();
        assert!(t.declare("x", SymbolKind::LocalVar).is_ok());
    }

    #[test]
    fn function_scope_sees_globals() {
        let mut g = SymbolTable::new();
        g.declare("x", SymbolKind::GlobalVar).unwrap();
        let mut f = SymbolTable::new_function_scope(&g);
        assert!(f.lookup("x").is_some());
        f.declare("a", SymbolKind::Parameter).unwrap();
        assert_eq!(f.lookup("a").unwrap().seq, 0);
    }

    #[test]
    fn string_interning_is_first_come_and_stable() {
        let mut s = StringTable::new();
        let a = s.intern("\"hi\"");
        let b = s.intern("\"bye\"");
        let a2 = s.intern("\"hi\"");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(s.get(a), "\"hi\"");
    }
}
