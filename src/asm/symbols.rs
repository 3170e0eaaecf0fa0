//! The symbol table.

use indexmap::map::Entry;
use indexmap::IndexMap;

/// A named value: a label or an EQU name.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Symbol {
    value: Option<u16>,
    duplicate: bool,
    site: usize,
}
impl Symbol {
    /// The symbol's value, or `None` if its definition failed to assemble.
    pub fn value(&self) -> Option<u16> {
        self.value
    }

    /// Whether the symbol has a value.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the symbol was defined more than once.
    ///
    /// Only the first definition counts. Later ones are errors.
    pub fn is_duplicate(&self) -> bool {
        self.duplicate
    }

    /// The index of the statement which defined the symbol.
    pub fn site(&self) -> usize {
        self.site
    }
}

/// The symbol table, mapping names to [`Symbol`]s.
///
/// Symbols iterate in the order they were first defined.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SymbolTable {
    map: IndexMap<String, Symbol>,
}
impl SymbolTable {
    /// Creates an empty symbol table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a symbol by name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.map.get(name)
    }

    /// Looks up the value of a symbol by name.
    ///
    /// This is `None` for unknown symbols and for symbols without a value.
    pub fn value_of(&self, name: &str) -> Option<u16> {
        self.get(name)?.value
    }

    /// Defines a symbol, which was introduced by the statement at index `site`.
    ///
    /// If the name is already taken, the original symbol is left as is
    /// (besides being marked duplicate) and this returns `false`.
    pub(crate) fn define(&mut self, name: &str, value: u16, site: usize) -> bool {
        self.insert(name, Some(value), site)
    }

    /// Defines a symbol without a value.
    ///
    /// This is for names whose definition failed to assemble,
    /// so that their uses do not resolve to something arbitrary.
    pub(crate) fn declare(&mut self, name: &str, site: usize) -> bool {
        self.insert(name, None, site)
    }

    fn insert(&mut self, name: &str, value: Option<u16>, site: usize) -> bool {
        match self.map.entry(name.to_string()) {
            Entry::Occupied(mut e) => {
                e.get_mut().duplicate = true;
                false
            },
            Entry::Vacant(e) => {
                e.insert(Symbol { value, duplicate: false, site });
                true
            },
        }
    }

    /// Updates the value of an already defined symbol (used by EQU).
    pub(crate) fn rebind(&mut self, name: &str, value: u16) {
        if let Some(sym) = self.map.get_mut(name) {
            sym.value = Some(value);
        }
    }

    /// Iterates over all symbols, in definition order.
    pub fn iter(&self) -> impl Iterator<Item=(&str, &Symbol)> + '_ {
        self.map.iter()
            .map(|(name, sym)| (name.as_str(), sym))
    }

    /// The number of symbols.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no symbols.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::SymbolTable;

    #[test]
    fn test_define_and_lookup() {
        let mut syms = SymbolTable::new();
        assert!(syms.is_empty());
        assert!(syms.define("START", 0x0100, 0));
        assert!(syms.define("COUNT", 0x10, 3));

        assert_eq!(syms.value_of("START"), Some(0x0100));
        assert_eq!(syms.value_of("COUNT"), Some(0x10));
        assert_eq!(syms.value_of("MISSING"), None);
        assert_eq!(syms.get("COUNT").map(|s| s.site()), Some(3));
        assert_eq!(syms.len(), 2);
    }

    #[test]
    fn test_duplicates() {
        let mut syms = SymbolTable::new();
        assert!(syms.define("LOOP", 0x0010, 1));
        assert!(!syms.define("LOOP", 0x0020, 5));

        // the first definition stays
        let sym = syms.get("LOOP").unwrap();
        assert_eq!(sym.value(), Some(0x0010));
        assert_eq!(sym.site(), 1);
        assert!(sym.is_duplicate());

        // and duplicate doesn't get unset
        syms.rebind("LOOP", 0x0030);
        assert!(syms.get("LOOP").unwrap().is_duplicate());
    }

    #[test]
    fn test_declare() {
        let mut syms = SymbolTable::new();
        assert!(syms.declare("BROKEN", 0));
        assert!(!syms.get("BROKEN").unwrap().has_value());
        assert_eq!(syms.value_of("BROKEN"), None);

        syms.rebind("BROKEN", 7);
        assert_eq!(syms.value_of("BROKEN"), Some(7));
        // rebinding never creates a symbol
        syms.rebind("OTHER", 7);
        assert!(syms.get("OTHER").is_none());
    }

    #[test]
    fn test_insertion_order() {
        let mut syms = SymbolTable::new();
        for (i, name) in ["ZETA", "ALPHA", "MID"].into_iter().enumerate() {
            syms.define(name, i as u16, i);
        }
        syms.define("ALPHA", 9, 9);

        let names: Vec<_> = syms.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["ZETA", "ALPHA", "MID"]);
    }
}
