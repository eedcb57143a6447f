/*
    Interned terminals and nonterminals for a single grammar build
*/

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::error_handling::Location;

/// Handle of a terminal inside the [`SymbolTable`] that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(pub(crate) usize);

/// Handle of a nonterminal inside the [`SymbolTable`] that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalId(pub(crate) usize);

impl TerminalId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl NonterminalId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A grammar symbol matched directly against an input token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    // Matches on the token kind only
    Named(String),
    // Matches on the exact token text. `quoted` keeps the quotes and is the
    // key in the table, `text` is what gets compared.
    Literal { quoted: String, text: String },
}

impl Terminal {
    pub fn name(&self) -> &str {
        match self {
            Terminal::Named(name) => name,
            Terminal::Literal { quoted, .. } => quoted,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Terminal::Literal { .. })
    }

    /// Does a token with the given kind and text match this terminal?
    pub fn matches(&self, token_kind: &str, token_text: &str) -> bool {
        match self {
            Terminal::Named(name) => name == token_kind,
            Terminal::Literal { text, .. } => text == token_text,
        }
    }
}

/// A named symbol with one or more alternative expansions.
///
/// Equality and hashing look at the name only.
#[derive(Debug, Clone)]
pub struct Nonterminal {
    name: String,
    location: Location,
    referenced: bool,
    defined: bool,
    synthetic: bool,
}

impl Nonterminal {
    fn new(name: &str, location: Location) -> Self {
        Nonterminal {
            name: name.to_string(),
            location,
            referenced: false,
            defined: false,
            synthetic: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rule head site once defined, otherwise the site where it was first seen
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_referenced(&self) -> bool {
        self.referenced
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }

    /// Created by expanding a `*`, `+` or `?` repeat operator
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

impl PartialEq for Nonterminal {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Nonterminal {}

impl Hash for Nonterminal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Name to handle tables for one build session. Handles are insertion
/// indices, so iteration order is the order symbols were first seen.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    terminals: IndexMap<String, Terminal>,
    nonterminals: IndexMap<String, Nonterminal>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_terminal(&mut self, name: &str) -> TerminalId {
        if let Some(index) = self.terminals.get_index_of(name) {
            return TerminalId(index);
        }
        let (index, _) = self
            .terminals
            .insert_full(name.to_string(), Terminal::Named(name.to_string()));
        TerminalId(index)
    }

    /// Interns a quoted literal such as `'+'` or `"if"`. The caller has
    /// already checked that the text opens and closes with the same quote.
    pub fn intern_literal(&mut self, quoted: &str) -> TerminalId {
        if let Some(index) = self.terminals.get_index_of(quoted) {
            return TerminalId(index);
        }
        let text = quoted[1..quoted.len() - 1].to_string();
        let (index, _) = self.terminals.insert_full(
            quoted.to_string(),
            Terminal::Literal {
                quoted: quoted.to_string(),
                text,
            },
        );
        TerminalId(index)
    }

    /// Returns the existing handle, or registers a new nonterminal first seen
    /// at `location`.
    pub fn intern_nonterminal(&mut self, name: &str, location: Location) -> NonterminalId {
        if let Some(index) = self.nonterminals.get_index_of(name) {
            return NonterminalId(index);
        }
        let (index, _) = self
            .nonterminals
            .insert_full(name.to_string(), Nonterminal::new(name, location));
        NonterminalId(index)
    }

    /// Registers a repeat-operator nonterminal. It is born defined and
    /// referenced since the expansion both declares and uses it.
    pub(crate) fn insert_synthetic(&mut self, name: &str, location: Location) -> NonterminalId {
        let mut nonterminal = Nonterminal::new(name, location);
        nonterminal.referenced = true;
        nonterminal.defined = true;
        nonterminal.synthetic = true;
        let (index, _) = self.nonterminals.insert_full(name.to_string(), nonterminal);
        NonterminalId(index)
    }

    /// Records a rule head for `id`. The first head moves the definition
    /// site there, even if the name was referenced earlier.
    pub(crate) fn define(&mut self, id: NonterminalId, location: Location) {
        let nonterminal = &mut self.nonterminals[id.0];
        if !nonterminal.defined {
            nonterminal.defined = true;
            nonterminal.location = location;
        }
    }

    pub(crate) fn mark_referenced(&mut self, id: NonterminalId) {
        self.nonterminals[id.0].referenced = true;
    }

    pub fn lookup_terminal(&self, name: &str) -> Option<TerminalId> {
        self.terminals.get_index_of(name).map(TerminalId)
    }

    pub fn lookup_nonterminal(&self, name: &str) -> Option<NonterminalId> {
        self.nonterminals.get_index_of(name).map(NonterminalId)
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.0]
    }

    pub fn nonterminal(&self, id: NonterminalId) -> &Nonterminal {
        &self.nonterminals[id.0]
    }

    pub fn terminals(&self) -> impl Iterator<Item = (TerminalId, &Terminal)> {
        self.terminals
            .values()
            .enumerate()
            .map(|(index, terminal)| (TerminalId(index), terminal))
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalId, &Nonterminal)> {
        self.nonterminals
            .values()
            .enumerate()
            .map(|(index, nonterminal)| (NonterminalId(index), nonterminal))
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }
}
