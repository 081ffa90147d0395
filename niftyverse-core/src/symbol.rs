//! Exchange-qualified ticker symbols and order-preserving symbol lists.

use std::collections::HashSet;
use std::fmt;

/// Suffix the market-data provider expects on NSE tickers.
pub const EXCHANGE_SUFFIX: &str = ".NS";

/// Normalized ticker: trimmed, uppercase, ending in `EXCHANGE_SUFFIX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize a raw cell value. Returns `None` when nothing is left after
    /// trimming. Idempotent on its own output.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut symbol = trimmed.to_uppercase();
        if !symbol.ends_with(EXCHANGE_SUFFIX) {
            symbol.push_str(EXCHANGE_SUFFIX);
        }
        Some(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, duplicate-free list of symbols. First occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolList {
    symbols: Vec<Symbol>,
    seen: HashSet<Symbol>,
}

impl SymbolList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `symbol` unless already present. Returns whether it was added.
    pub fn push(&mut self, symbol: Symbol) -> bool {
        if self.seen.contains(&symbol) {
            return false;
        }
        self.seen.insert(symbol.clone());
        self.symbols.push(symbol);
        true
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.seen.contains(symbol)
    }

    /// Symbols of `self` not in `other`, in `self`'s order.
    pub fn difference(&self, other: &SymbolList) -> SymbolList {
        self.symbols
            .iter()
            .filter(|s| !other.contains(s))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Plain strings, for export and assertions.
    pub fn to_strings(&self) -> Vec<String> {
        self.symbols.iter().map(|s| s.0.clone()).collect()
    }
}

impl Extend<Symbol> for SymbolList {
    fn extend<I: IntoIterator<Item = Symbol>>(&mut self, iter: I) {
        for symbol in iter {
            self.push(symbol);
        }
    }
}

impl FromIterator<Symbol> for SymbolList {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a SymbolList {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

impl From<SymbolList> for Vec<Symbol> {
    fn from(list: SymbolList) -> Self {
        list.symbols
    }
}
