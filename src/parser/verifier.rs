use std::collections::HashSet;

use log::debug;

use super::{GrammarError, GrammarErrorKind, GrammarResult};
use crate::error_handling::Location;
use crate::grammar::{Grammar, NonterminalId, Production, Symbol};

/// Runs the soundness passes in order and stops at the first failure:
/// every nonterminal is referenced, has alternatives, derives a terminal
/// string, and is reachable from the root.
pub fn verify_grammar(grammar: &Grammar) -> GrammarResult<()> {
    check_references(grammar)?;
    check_rule_lists(grammar)?;
    check_derivability(grammar)?;
    check_reachability(grammar)?;
    Ok(())
}

// Errors about the grammar as a whole point at the file only
fn grammar_error(grammar: &Grammar, error: GrammarErrorKind) -> GrammarError {
    GrammarError::new(error, Location::new(grammar.file(), 0))
}

fn names(grammar: &Grammar, nonterminals: impl Iterator<Item = NonterminalId>) -> Vec<String> {
    nonterminals
        .map(|id| grammar.nonterminal(id).name().to_string())
        .collect()
}

fn check_references(grammar: &Grammar) -> GrammarResult<()> {
    debug!("checking that nonterminals are referenced");

    match grammar
        .symbols()
        .nonterminals()
        .find(|(_, nonterminal)| !nonterminal.is_referenced())
    {
        Some((_, nonterminal)) => Err(GrammarError::new(
            GrammarErrorKind::Unreferenced(nonterminal.name().to_string()),
            nonterminal.location().clone(),
        )),
        None => Ok(()),
    }
}

fn check_rule_lists(grammar: &Grammar) -> GrammarResult<()> {
    debug!("checking that nonterminals have productions");

    for (id, nonterminal) in grammar.symbols().nonterminals() {
        let name = nonterminal.name().to_string();
        let error = if !nonterminal.is_defined() {
            GrammarErrorKind::UndefinedNonterminal(name)
        } else if grammar.productions_of(id).is_empty() {
            GrammarErrorKind::NoProductions(name)
        } else {
            continue;
        };
        return Err(GrammarError::new(error, nonterminal.location().clone()));
    }
    Ok(())
}

fn derives_terminals(production: &Production, derivable: &HashSet<NonterminalId>) -> bool {
    production.symbols().iter().all(|symbol| match symbol {
        Symbol::Terminal(_) => true,
        Symbol::Nonterminal(id) => derivable.contains(id),
    })
}

// Fixpoint: keep sweeping the agenda, moving out every nonterminal with an
// alternative made only of terminals and already derivable nonterminals.
fn check_derivability(grammar: &Grammar) -> GrammarResult<()> {
    debug!("checking that nonterminals derive terminal strings");

    let mut derivable = HashSet::new();
    let mut agenda: Vec<NonterminalId> = grammar.symbols().nonterminals().map(|(id, _)| id).collect();

    loop {
        let before = agenda.len();
        agenda.retain(|id| {
            let derives = grammar
                .productions_of(*id)
                .iter()
                .any(|production| derives_terminals(production, &derivable));
            if derives {
                derivable.insert(*id);
            }
            !derives
        });
        if agenda.is_empty() || agenda.len() == before {
            break;
        }
    }

    if agenda.is_empty() {
        Ok(())
    } else {
        Err(grammar_error(
            grammar,
            GrammarErrorKind::NonDerivable(names(grammar, agenda.into_iter())),
        ))
    }
}

fn check_reachability(grammar: &Grammar) -> GrammarResult<()> {
    debug!("checking that nonterminals are reachable from the root");

    let mut reached = vec![false; grammar.symbols().nonterminal_count()];
    let mut stack = vec![grammar.root()];
    reached[grammar.root().index()] = true;

    while let Some(id) = stack.pop() {
        for production in grammar.productions_of(id) {
            for next in production.symbols().iter().filter_map(|symbol| symbol.as_nonterminal()) {
                if !reached[next.index()] {
                    reached[next.index()] = true;
                    stack.push(next);
                }
            }
        }
    }

    let unreachable: Vec<NonterminalId> = grammar
        .symbols()
        .nonterminals()
        .map(|(id, _)| id)
        .filter(|id| !reached[id.index()])
        .collect();

    if unreachable.is_empty() {
        Ok(())
    } else {
        Err(grammar_error(
            grammar,
            GrammarErrorKind::Unreachable(names(grammar, unreachable.into_iter())),
        ))
    }
}
