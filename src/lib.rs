/*
    Compiles line-oriented context-free grammar files into a validated
    Grammar for a parsing engine
*/

pub mod error_handling;
pub mod grammar;
pub mod parser;
pub mod shared;

pub use error_handling::Location;
pub use grammar::{Grammar, Nonterminal, NonterminalId, Production, Symbol, Terminal, TerminalId, Token};
pub use parser::{load_file, load_reader, load_str, verify_grammar, GrammarError, GrammarErrorKind, GrammarResult};
pub use shared::SharedGrammar;
