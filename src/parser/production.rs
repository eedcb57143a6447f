/*
    Turns right-hand sides into productions, expanding repeat operators
*/

use log::debug;

use super::lexer::{self, Item, Repeat};
use super::{GrammarErrorKind, GrammarResult, Loader};
use crate::grammar::{NonterminalId, Production, ProductionId, Symbol};

impl<'a> Loader<'a> {
    /// Adds every `|`-separated alternative in `text` to `nonterminal`
    pub(crate) fn parse_rhs(&mut self, nonterminal: NonterminalId, text: &str) -> GrammarResult<()> {
        for words in lexer::split_alternatives(text) {
            self.parse_alternative(nonterminal, &words)?;
        }
        Ok(())
    }

    fn parse_alternative(&mut self, nonterminal: NonterminalId, words: &[&str]) -> GrammarResult<()> {
        let tokens = lexer::lex_alternative(words).map_err(|e| self.error(e))?;

        let mut symbols = Vec::with_capacity(tokens.len());
        for token in tokens {
            let base = self.resolve(token.item);
            let symbol = match token.repeat {
                Some(repeat) => Symbol::Nonterminal(self.expand_repeat(base, repeat)?),
                None => base,
            };
            symbols.push(symbol);
        }

        if symbols == [Symbol::Nonterminal(nonterminal)] {
            let name = self.symbols.nonterminal(nonterminal).name().to_string();
            return Err(self.error(GrammarErrorKind::DerivesItself(name)));
        }

        self.add_alternative(nonterminal, symbols);
        Ok(())
    }

    fn resolve(&mut self, item: Item) -> Symbol {
        match item {
            Item::Literal(quoted) => Symbol::Terminal(self.symbols.intern_literal(quoted)),
            Item::Terminal(name) => Symbol::Terminal(self.symbols.intern_terminal(name)),
            Item::Nonterminal(name) => {
                let location = self.location();
                let id = self.symbols.intern_nonterminal(name, location);
                self.symbols.mark_referenced(id);
                Symbol::Nonterminal(id)
            }
        }
    }

    fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(id) => self.symbols.terminal(id).name(),
            Symbol::Nonterminal(id) => self.symbols.nonterminal(id).name(),
        }
    }

    // Replaces `base` followed by a repeat operator with a shared helper
    // nonterminal named after both, creating it on first use:
    //
    //   X* -> X* X | 0
    //   X+ -> X* X | X
    //   X? -> X | 0
    fn expand_repeat(&mut self, base: Symbol, repeat: Repeat) -> GrammarResult<NonterminalId> {
        let name = format!("{}{}", self.symbol_name(base), repeat.as_char());

        if let Some(existing) = self.symbols.lookup_nonterminal(&name) {
            if self.symbols.nonterminal(existing).is_synthetic() {
                return Ok(existing);
            }
            return Err(self.error(GrammarErrorKind::SyntheticNameClash(name)));
        }

        let location = self.location();
        let helper = self.symbols.insert_synthetic(&name, location);
        debug!("expanding repeat {} at line {}", name, self.line);

        let (first, second) = match repeat {
            Repeat::ZeroOrMore => (vec![Symbol::Nonterminal(helper), base], vec![]),
            Repeat::OneOrMore => (vec![Symbol::Nonterminal(helper), base], vec![base]),
            Repeat::Optional => (vec![base], vec![]),
        };
        self.add_alternative(helper, first);
        self.add_alternative(helper, second);

        Ok(helper)
    }

    /// Appends a production, dropping a second epsilon for the same
    /// nonterminal.
    pub(crate) fn add_alternative(&mut self, nonterminal: NonterminalId, symbols: Vec<Symbol>) {
        let location = self.location();
        let alternatives = self.rules.entry(nonterminal).or_default();

        if symbols.is_empty() && alternatives.iter().any(Production::is_epsilon) {
            return;
        }

        let id = ProductionId(self.next_production);
        self.next_production += 1;
        alternatives.push(Production::new(id, symbols, location));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::Location;
    use crate::parser::read_grammar;

    fn read(text: &str) -> GrammarResult<crate::grammar::Grammar> {
        read_grammar(text.as_bytes(), None)
    }

    #[test]
    fn repeat_of_literal_and_nonterminal() {
        let grammar = read("A -> '.'+ B?\nB -> b\n").unwrap();

        let dots = grammar.nonterminal_named("'.'+").unwrap();
        let dot = grammar.terminal_named("'.'").unwrap();
        let productions = grammar.productions_of(dots);
        assert_eq!(
            productions[0].symbols(),
            &[Symbol::Nonterminal(dots), Symbol::Terminal(dot)]
        );
        assert_eq!(productions[1].symbols(), &[Symbol::Terminal(dot)]);

        let b = grammar.nonterminal_named("B").unwrap();
        let maybe_b = grammar.nonterminal_named("B?").unwrap();
        assert_eq!(grammar.productions_of(maybe_b)[0].symbols(), &[Symbol::Nonterminal(b)]);
        assert!(grammar.productions_of(maybe_b)[1].is_epsilon());
        assert!(grammar.nonterminal(b).is_referenced());
    }

    #[test]
    fn same_base_with_different_operators() {
        let grammar = read("A -> x* x+ x? x*\n").unwrap();

        for name in ["x*", "x+", "x?"] {
            let id = grammar.nonterminal_named(name).unwrap();
            assert_eq!(grammar.productions_of(id).len(), 2, "{name}");
        }
        let a = grammar.productions_of(grammar.root());
        assert_eq!(a[0][0], a[0][3]);
    }

    #[test]
    fn synthetic_nonterminal_keeps_first_site() {
        let grammar = read("A -> B\n| x*\nB -> x* y\n").unwrap();
        let star = grammar.nonterminal_named("x*").unwrap();

        assert_eq!(grammar.nonterminal(star).location().line, 2);
        assert_eq!(grammar.productions_of(star)[0].location().line, 2);
    }

    #[test]
    fn synthetic_name_taken_by_declared_nonterminal() {
        let mut loader = Loader::new(None);
        let declared = loader.symbols.intern_nonterminal("x*", Location::default());
        loader.symbols.define(declared, Location::default());

        loader.read_line(1, "A -> x").unwrap();
        let error = loader.read_line(2, "| x*").unwrap_err();

        assert_eq!(error.error, GrammarErrorKind::SyntheticNameClash("x*".to_string()));
        assert_eq!(error.location.line, 2);
    }

    #[test]
    fn rule_head_cannot_redeclare_synthetic() {
        let mut loader = Loader::new(None);
        loader.symbols.insert_synthetic("Item", Location::default());

        let error = loader.read_line(1, "Item -> x").unwrap_err();
        assert_eq!(error.error, GrammarErrorKind::SyntheticNameClash("Item".to_string()));
    }

    #[test]
    fn unit_alternative_of_other_nonterminal_is_fine() {
        let grammar = read("A -> B\nB -> b\n").unwrap();
        assert_eq!(grammar.productions_of(grammar.root()).len(), 1);
    }

    #[test]
    fn epsilon_dedup_keeps_first() {
        let mut loader = Loader::new(None);
        loader.read_line(1, "A -> 0").unwrap();
        loader.read_line(2, "| a").unwrap();
        loader.read_line(3, "| 0 ").unwrap();
        let grammar = loader.finish().unwrap();

        let productions = grammar.productions_of(grammar.root());
        assert_eq!(productions.len(), 2);
        assert!(productions[0].is_epsilon());
        assert_eq!(productions[0].location().line, 1);
    }
}
