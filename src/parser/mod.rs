/*
    This module reads grammar files into a validated Grammar
*/

mod lexer;
mod production;
mod verifier;

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};

use crate::error_handling::*;
use crate::grammar::*;
pub use verifier::verify_grammar;

/// An I/O error that compares equal to any other error of the same kind
#[derive(Debug)]
pub struct IoFailure(pub std::io::Error);

impl PartialEq for IoFailure {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl Display for IoFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GrammarErrorKind {
    #[error("Unable to open or read grammar file: {0}")]
    FileError(IoFailure),

    // An alternative line came before any rule head
    #[error("Missing nonterminal: `|` alternative without a preceding rule")]
    MissingNonterminal,

    #[error("Invalid nonterminal name '{0}' in grammar")]
    InvalidNonterminalName(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Unmatched quote in literal {0}")]
    UnmatchedQuote(String),

    #[error("Empty (epsilon) rule must be of the form NT -> 0")]
    EpsilonNotAlone,

    #[error("Nonterminal {0} deriving itself")]
    DerivesItself(String),

    // A `*`, `+` or `?` expansion would reuse the name of a declared rule
    #[error("Repeat nonterminal {0} clashes with a declared nonterminal")]
    SyntheticNameClash(String),

    #[error("Grammar contains no rules")]
    EmptyGrammar,

    #[error("Nonterminal {0} is never referenced in a production")]
    Unreferenced(String),

    #[error("Nonterminal {0} is referenced but never defined")]
    UndefinedNonterminal(String),

    #[error("Nonterminal {0} has no productions")]
    NoProductions(String),

    #[error("Nonterminals {} do not derive terminal strings", .0.join(", "))]
    NonDerivable(Vec<String>),

    #[error("Nonterminals {} are unreachable from the root", .0.join(", "))]
    Unreachable(Vec<String>),
}

impl GrammarErrorKind {
    pub fn is_file_error(&self) -> bool {
        matches!(self, GrammarErrorKind::FileError(_))
    }

    /// Raised while reading lines, before any validation pass runs
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            GrammarErrorKind::MissingNonterminal
                | GrammarErrorKind::InvalidNonterminalName(_)
                | GrammarErrorKind::InvalidIdentifier(_)
                | GrammarErrorKind::UnmatchedQuote(_)
                | GrammarErrorKind::EpsilonNotAlone
                | GrammarErrorKind::DerivesItself(_)
                | GrammarErrorKind::SyntheticNameClash(_)
        )
    }
}

impl ErrorType for GrammarErrorKind {}

pub type GrammarError = Error<GrammarErrorKind>;
pub type GrammarResult<T> = std::result::Result<T, GrammarError>;

pub(crate) type Result<T> = std::result::Result<T, GrammarErrorKind>;

fn io_error(error: std::io::Error, file: Option<&Path>) -> GrammarError {
    GrammarError::new(
        GrammarErrorKind::FileError(IoFailure(error)),
        Location::new(file, 0),
    )
}

/// Line-by-line builder state for one grammar source. Owns everything it
/// builds until `finish` hands it over as a `Grammar`.
pub(crate) struct Loader<'a> {
    file: Option<&'a Path>,
    symbols: SymbolTable,
    rules: IndexMap<NonterminalId, Vec<Production>>,
    root: Option<NonterminalId>,
    // The most recent rule head, which `|` lines add alternatives to
    current: Option<NonterminalId>,
    next_production: usize,
    line: usize,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(file: Option<&'a Path>) -> Self {
        Loader {
            file,
            symbols: SymbolTable::new(),
            rules: IndexMap::new(),
            root: None,
            current: None,
            next_production: 0,
            line: 0,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.file, self.line)
    }

    fn error(&self, error: GrammarErrorKind) -> GrammarError {
        GrammarError::new(error, self.location())
    }

    pub(crate) fn read_line(&mut self, number: usize, text: &str) -> GrammarResult<()> {
        self.line = number;

        let line = lexer::strip_comment(text);
        if line.is_empty() {
            return Ok(());
        }

        if let Some(rhs) = line.strip_prefix('|') {
            let current = self
                .current
                .ok_or_else(|| self.error(GrammarErrorKind::MissingNonterminal))?;
            return self.parse_rhs(current, rhs);
        }

        let (head, rhs) = lexer::split_rule_head(line);
        if !lexer::is_identifier(head) {
            return Err(self.error(GrammarErrorKind::InvalidNonterminalName(head.to_string())));
        }
        let nonterminal = self.declare(head)?;

        match rhs {
            Some(rhs) => self.parse_rhs(nonterminal, rhs),
            None => Ok(()),
        }
    }

    // Handles a rule head: the nonterminal becomes current, and the very
    // first head becomes the root.
    fn declare(&mut self, name: &str) -> GrammarResult<NonterminalId> {
        let location = self.location();
        let nonterminal = self.symbols.intern_nonterminal(name, location.clone());
        if self.symbols.nonterminal(nonterminal).is_synthetic() {
            return Err(self.error(GrammarErrorKind::SyntheticNameClash(name.to_string())));
        }
        self.symbols.define(nonterminal, location);
        debug!("rule head {} at line {}", name, self.line);

        if self.root.is_none() {
            // Nothing has to refer to the root
            self.root = Some(nonterminal);
            self.symbols.mark_referenced(nonterminal);
        }
        self.current = Some(nonterminal);
        self.rules.entry(nonterminal).or_default();

        Ok(nonterminal)
    }

    /// Hands the assembled rules over, unvalidated
    pub(crate) fn finish(self) -> GrammarResult<Grammar> {
        let root = self.root.ok_or_else(|| {
            GrammarError::new(GrammarErrorKind::EmptyGrammar, Location::new(self.file, 0))
        })?;

        Ok(Grammar::new(
            self.symbols,
            self.rules,
            root,
            self.file.map(Path::to_path_buf),
        ))
    }
}

/// Reads a grammar without running the validation passes
pub(crate) fn read_grammar<R: BufRead>(reader: R, file: Option<&Path>) -> GrammarResult<Grammar> {
    let mut loader = Loader::new(file);

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| io_error(e, file))?;
        loader.read_line(index + 1, &line)?;
    }

    loader.finish()
}

/// Reads and validates a grammar from any buffered reader. `file` only
/// labels error locations.
pub fn load_reader<R: BufRead>(reader: R, file: Option<&Path>) -> GrammarResult<Grammar> {
    let grammar = read_grammar(reader, file)?;
    verify_grammar(&grammar)?;

    info!(
        "loaded grammar{}: {} nonterminals, {} terminals, {} productions",
        file.map(|f| format!(" {}", f.display())).unwrap_or_default(),
        grammar.symbols().nonterminal_count(),
        grammar.symbols().terminal_count(),
        grammar.production_count()
    );

    Ok(grammar)
}

pub fn load_str(text: &str, file: Option<&Path>) -> GrammarResult<Grammar> {
    load_reader(text.as_bytes(), file)
}

pub fn load_file<P: AsRef<Path>>(path: P) -> GrammarResult<Grammar> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error(e, Some(path)))?;

    load_reader(BufReader::new(file), Some(path))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn names(grammar: &Grammar, production: &Production) -> Vec<String> {
        production
            .symbols()
            .iter()
            .map(|symbol| grammar.symbol_name(*symbol).to_string())
            .collect()
    }

    fn alternatives(grammar: &Grammar, nonterminal: &str) -> Vec<Vec<String>> {
        let id = grammar.nonterminal_named(nonterminal).unwrap();
        grammar
            .productions_of(id)
            .iter()
            .map(|production| names(grammar, production))
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn load_err(text: &str) -> GrammarError {
        load_str(text, None).unwrap_err()
    }

    #[test]
    fn load_simple_grammar() {
        let grammar = load_str("A -> a B\nB -> b | 0\n", None).unwrap();

        assert_eq!(grammar.nonterminal(grammar.root()).name(), "A");
        assert_eq!(alternatives(&grammar, "A"), vec![strings(&["a", "B"])]);
        assert_eq!(alternatives(&grammar, "B"), vec![strings(&["b"]), vec![]]);
    }

    #[test]
    fn root_is_first_rule_head() {
        let text = "# leading comment\n\nStart → Other x\n| y\nOther -> z\n";
        let grammar = load_str(text, None).unwrap();

        assert_eq!(grammar.nonterminal(grammar.root()).name(), "Start");
        assert_eq!(alternatives(&grammar, "Start"), vec![strings(&["Other", "x"]), strings(&["y"])]);
    }

    #[test]
    fn rule_head_without_alternatives_on_same_line() {
        let text = "Query →\n    | Greeting\n    | Question\nGreeting -> 'hi'\nQuestion\n| 'why' '?'\n";
        let grammar = load_str(text, None).unwrap();

        assert_eq!(alternatives(&grammar, "Query"), vec![strings(&["Greeting"]), strings(&["Question"])]);
        assert_eq!(alternatives(&grammar, "Question"), vec![strings(&["'why'", "'?'"])]);
    }

    #[test]
    fn star_expansion() {
        let grammar = load_str("A -> b*\n", None).unwrap();

        assert_eq!(alternatives(&grammar, "A"), vec![strings(&["b*"])]);
        assert_eq!(alternatives(&grammar, "b*"), vec![strings(&["b*", "b"]), vec![]]);

        let synthetic = grammar.nonterminal_named("b*").unwrap();
        assert!(grammar.nonterminal(synthetic).is_synthetic());
        assert!(grammar.nonterminal(synthetic).is_referenced());
    }

    #[test]
    fn plus_and_optional_expansion() {
        let grammar = load_str("A -> Item+ 'end'?\nItem -> x\n", None).unwrap();

        assert_eq!(alternatives(&grammar, "A"), vec![strings(&["Item+", "'end'?"])]);
        assert_eq!(alternatives(&grammar, "Item+"), vec![strings(&["Item+", "Item"]), strings(&["Item"])]);
        assert_eq!(alternatives(&grammar, "'end'?"), vec![strings(&["'end'"]), vec![]]);
    }

    #[test]
    fn repeat_nonterminals_are_shared() {
        let text = "A -> B x* | x* y\nB -> x* | z x+\n";
        let grammar = load_str(text, None).unwrap();

        let star = grammar.nonterminal_named("x*").unwrap();
        let uses = grammar
            .rules()
            .flat_map(|(_, productions)| productions.iter())
            .flat_map(|production| production.symbols().iter())
            .filter(|symbol| symbol.as_nonterminal() == Some(star))
            .count();

        // Three uses in A and B, one self reference in its own rule
        assert_eq!(uses, 4);
        assert_eq!(grammar.productions_of(star).len(), 2);
        assert_eq!(
            grammar.rules().filter(|(id, _)| grammar.nonterminal(*id).is_synthetic()).count(),
            2
        );
    }

    #[test]
    fn epsilon_is_deduplicated() {
        let grammar = load_str("A -> B x\nB -> y\n| 0\n| 0\n", None).unwrap();
        let b = grammar.nonterminal_named("B").unwrap();

        let epsilons = grammar
            .productions_of(b)
            .iter()
            .filter(|production| production.is_epsilon())
            .count();
        assert_eq!(epsilons, 1);
        assert_eq!(grammar.productions_of(b).len(), 2);
    }

    #[test]
    fn production_ids_are_unique() {
        let grammar = load_str("A -> b | c | B*\nB -> d\n", None).unwrap();
        let mut ids: Vec<_> = grammar
            .rules()
            .flat_map(|(_, productions)| productions.iter().map(Production::id))
            .collect();
        let count = ids.len();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), count);
        assert_eq!(grammar.production_count(), count);
    }

    #[test]
    fn epsilon_with_other_symbols() {
        let error = load_err("A -> b 0\n");

        assert_eq!(error.error, GrammarErrorKind::EpsilonNotAlone);
        assert_eq!(error.location.line, 1);
        assert!(error.error.is_syntax_error());
    }

    #[test]
    fn stray_alternative() {
        let error = load_err("# nothing yet\n| a\nA -> a\n");

        assert_eq!(error.error, GrammarErrorKind::MissingNonterminal);
        assert_eq!(error.location.line, 2);
    }

    #[test]
    fn malformed_heads_and_symbols() {
        assert_eq!(
            load_err("A b -> c\n").error,
            GrammarErrorKind::InvalidNonterminalName("A b".to_string())
        );
        assert_eq!(
            load_err("-> c\n").error,
            GrammarErrorKind::InvalidNonterminalName("".to_string())
        );
        assert_eq!(
            load_err("A -> b\n| c-d\n").error,
            GrammarErrorKind::InvalidIdentifier("c-d".to_string())
        );
        assert_eq!(
            load_err("A -> 'open\n").error,
            GrammarErrorKind::UnmatchedQuote("'open".to_string())
        );
    }

    #[test]
    fn immediate_self_derivation() {
        let error = load_err("A -> b\n| A\n");

        assert_eq!(error.error, GrammarErrorKind::DerivesItself("A".to_string()));
        assert_eq!(error.location.line, 2);
    }

    #[test]
    fn longer_self_reference_is_allowed() {
        let grammar = load_str("A -> A b | b\n", None).unwrap();

        assert_eq!(alternatives(&grammar, "A"), vec![strings(&["A", "b"]), strings(&["b"])]);
    }

    #[test]
    fn empty_source() {
        assert_eq!(load_err("").error, GrammarErrorKind::EmptyGrammar);
        assert_eq!(load_err("# only a comment\n\n").error, GrammarErrorKind::EmptyGrammar);
    }

    #[test]
    fn unreferenced_nonterminal() {
        let error = load_err("A -> a\nB -> b\n");

        assert_eq!(error.error, GrammarErrorKind::Unreferenced("B".to_string()));
        assert_eq!(error.location.line, 2);
    }

    #[test]
    fn mutual_recursion_without_escape() {
        let error = load_err("A -> a\nB -> C\nC -> B\n");

        assert_eq!(
            error.error,
            GrammarErrorKind::NonDerivable(strings(&["B", "C"]))
        );
        assert_eq!(error.location.line, 0);
    }

    #[test]
    fn error_messages_carry_file_and_line() {
        let path = PathBuf::from("rules.grammar");
        let error = load_str("A -> a\n\nB -> b\n", Some(&path)).unwrap_err();

        assert_eq!(
            error.to_string(),
            "rules.grammar:3: Nonterminal B is never referenced in a production"
        );

        let error = load_str("A -> B\nB -> C\nC -> B\n", Some(&path)).unwrap_err();
        assert_eq!(
            error.to_string(),
            "rules.grammar: Nonterminals A, B, C do not derive terminal strings"
        );
    }

    #[test]
    fn load_normal_file() {
        let grammar = load_file("example_data/arithmetic.grammar").unwrap();

        assert_eq!(grammar.nonterminal(grammar.root()).name(), "Expression");
        assert_eq!(
            alternatives(&grammar, "Expression"),
            vec![strings(&["Term", "AddOp*"])]
        );
        assert_eq!(
            alternatives(&grammar, "AddOp*"),
            vec![strings(&["AddOp*", "AddOp"]), vec![]]
        );
        assert_eq!(
            alternatives(&grammar, "Factor"),
            vec![
                strings(&["number"]),
                strings(&["'('", "Expression", "')'"]),
                strings(&["'-'", "Factor"]),
            ]
        );
        assert!(grammar.terminal_named("'('").unwrap() != grammar.terminal_named("number").unwrap());
        assert_eq!(grammar.file(), Some(Path::new("example_data/arithmetic.grammar")));
    }

    #[test]
    fn load_file_with_repeats_and_continuations() {
        let grammar = load_file("example_data/schedule.grammar").unwrap();

        assert_eq!(grammar.nonterminal(grammar.root()).name(), "Query");
        assert_eq!(
            alternatives(&grammar, "Query"),
            vec![strings(&["ScheduleQuery", "'?'?"]), strings(&["Greeting"])]
        );
        assert_eq!(alternatives(&grammar, "'?'?"), vec![strings(&["'?'"]), vec![]]);
        assert_eq!(
            alternatives(&grammar, "Event"),
            vec![strings(&["word+"]), strings(&["\"the\"", "word+"])]
        );
        assert_eq!(alternatives(&grammar, "Day*"), vec![strings(&["Day*", "Day"]), vec![]]);
    }

    #[test]
    fn load_malformed_file() {
        let path = PathBuf::from("example_data/malformed.grammar");
        let error = load_file(&path).unwrap_err();

        assert_eq!(
            error,
            GrammarError {
                location: Location {
                    file: Some(path),
                    line: 4
                },
                error: GrammarErrorKind::EpsilonNotAlone
            }
        );
    }

    #[test]
    fn load_missing_file() {
        let path = PathBuf::from("example_data/does_not_exist.grammar");
        let error = load_file(&path).unwrap_err();

        assert!(error.error.is_file_error());
        assert_eq!(error.location, Location { file: Some(path), line: 0 });
    }
}
