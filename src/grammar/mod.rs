/*
    This module stores a compiled grammar for the parsing engine
*/

pub mod symbols;

use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::error_handling::Location;
pub use symbols::{Nonterminal, NonterminalId, SymbolTable, Terminal, TerminalId};

// The base unit of a production
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(TerminalId),
    Nonterminal(NonterminalId),
}

impl Symbol {
    pub fn is_terminal(self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_nonterminal(self) -> Option<NonterminalId> {
        match self {
            Symbol::Nonterminal(id) => Some(id),
            Symbol::Terminal(_) => None,
        }
    }
}

/// Sequence number of a production within one build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionId(pub(crate) usize);

impl ProductionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One alternative right-hand side. Two productions are equal only if they
/// are the same production, whatever their symbols.
#[derive(Debug, Clone)]
pub struct Production {
    id: ProductionId,
    symbols: Vec<Symbol>,
    location: Location,
}

impl Production {
    pub(crate) fn new(id: ProductionId, symbols: Vec<Symbol>, location: Location) -> Self {
        Production { id, symbols, location }
    }

    pub fn id(&self) -> ProductionId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn is_epsilon(&self) -> bool {
        self.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.symbols.get(index).copied()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl Index<usize> for Production {
    type Output = Symbol;

    fn index(&self, index: usize) -> &Symbol {
        &self.symbols[index]
    }
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Production {}

impl Hash for Production {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A token handed over by the tokenizer, compared against terminals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: String,
    pub text: String,
}

impl Token {
    pub fn new(kind: &str, text: &str) -> Self {
        Token {
            kind: kind.to_string(),
            text: text.to_string(),
        }
    }

    pub fn matches(&self, terminal: &Terminal) -> bool {
        terminal.matches(&self.kind, &self.text)
    }
}

/// A loaded grammar: every nonterminal mapped to its alternatives, plus the
/// symbol tables the handles point into. Rules keep the order in which their
/// heads were first declared.
#[derive(Debug, Clone)]
pub struct Grammar {
    symbols: SymbolTable,
    rules: IndexMap<NonterminalId, Vec<Production>>,
    root: NonterminalId,
    file: Option<PathBuf>,
    production_count: usize,
}

impl Grammar {
    pub(crate) fn new(
        symbols: SymbolTable,
        rules: IndexMap<NonterminalId, Vec<Production>>,
        root: NonterminalId,
        file: Option<PathBuf>,
    ) -> Self {
        let production_count = rules.values().map(Vec::len).sum();
        Grammar {
            symbols,
            rules,
            root,
            file,
            production_count,
        }
    }

    /// The start symbol: the nonterminal of the first rule head
    pub fn root(&self) -> NonterminalId {
        self.root
    }

    /// The alternatives of `nonterminal`, in the order they were written
    pub fn productions_of(&self, nonterminal: NonterminalId) -> &[Production] {
        self.rules
            .get(&nonterminal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn rules(&self) -> impl Iterator<Item = (NonterminalId, &[Production])> {
        self.rules
            .iter()
            .map(|(nonterminal, productions)| (*nonterminal, productions.as_slice()))
    }

    pub fn has_rule(&self, nonterminal: NonterminalId) -> bool {
        self.rules.contains_key(&nonterminal)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn nonterminal(&self, id: NonterminalId) -> &Nonterminal {
        self.symbols.nonterminal(id)
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        self.symbols.terminal(id)
    }

    pub fn nonterminal_named(&self, name: &str) -> Option<NonterminalId> {
        self.symbols.lookup_nonterminal(name)
    }

    pub fn terminal_named(&self, name: &str) -> Option<TerminalId> {
        self.symbols.lookup_terminal(name)
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(id) => self.terminal(id).name(),
            Symbol::Nonterminal(id) => self.nonterminal(id).name(),
        }
    }

    /// The file the grammar was read from, if any
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn production_count(&self) -> usize {
        self.production_count
    }

    fn production_text(&self, production: &Production) -> String {
        if production.is_epsilon() {
            return "0".to_string();
        }
        production
            .symbols()
            .iter()
            .map(|symbol| self.symbol_name(*symbol))
            .join(" ")
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (nonterminal, productions) in self.rules() {
            writeln!(
                f,
                "{} → {}",
                self.nonterminal(nonterminal).name(),
                productions
                    .iter()
                    .map(|production| self.production_text(production))
                    .join(" | ")
            )?;
        }
        Ok(())
    }
}
