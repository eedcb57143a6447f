use super::{GrammarErrorKind, Result};

const ARROW: &str = "→";
const ASCII_ARROW: &str = "->";

/// Postfix repeat operator on a right-hand-side symbol
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    // `*`
    ZeroOrMore,
    // `+`
    OneOrMore,
    // `?`
    Optional,
}

impl Repeat {
    pub fn from_char(c: char) -> Option<Repeat> {
        match c {
            '*' => Some(Repeat::ZeroOrMore),
            '+' => Some(Repeat::OneOrMore),
            '?' => Some(Repeat::Optional),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Repeat::ZeroOrMore => '*',
            Repeat::OneOrMore => '+',
            Repeat::Optional => '?',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Item<'a> {
    // Quotes included
    Literal(&'a str),
    Terminal(&'a str),
    Nonterminal(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RhsToken<'a> {
    pub item: Item<'a>,
    pub repeat: Option<Repeat>,
}

/// Drops everything from the first `#` on and trims what is left
pub fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(index) => line[..index].trim(),
        None => line.trim(),
    }
}

/// Splits a rule head line on its first arrow. The Unicode arrow wins if the
/// line has one.
pub fn split_rule_head(line: &str) -> (&str, Option<&str>) {
    let arrow = if line.contains(ARROW) { ARROW } else { ASCII_ARROW };
    match line.split_once(arrow) {
        Some((head, rhs)) => (head.trim(), Some(rhs)),
        None => (line.trim(), None),
    }
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

pub fn lex_rhs_token(token: &str) -> Result<RhsToken> {
    let (text, repeat) = match token.chars().last().and_then(Repeat::from_char) {
        Some(repeat) => (&token[..token.len() - 1], Some(repeat)),
        None => (token, None),
    };

    let item = match text.chars().next() {
        Some(quote) if is_quote(quote) => {
            // Both quote characters are one byte long
            if text.len() < 2 || !text.ends_with(quote) {
                return Err(GrammarErrorKind::UnmatchedQuote(text.to_string()));
            }
            Item::Literal(text)
        }
        Some(first) if is_identifier(text) => {
            if first.is_uppercase() {
                Item::Nonterminal(text)
            } else {
                Item::Terminal(text)
            }
        }
        _ => return Err(GrammarErrorKind::InvalidIdentifier(text.to_string())),
    };

    Ok(RhsToken { item, repeat })
}

/// Splits a right-hand side into its alternatives on standalone `|` words.
/// Empty alternatives are dropped.
pub fn split_alternatives(text: &str) -> Vec<Vec<&str>> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .split(|word| *word == "|")
        .filter(|alternative| !alternative.is_empty())
        .map(<[&str]>::to_vec)
        .collect()
}

/// Lexes the words of one alternative. A lone `0` is the epsilon production
/// and lexes to no tokens at all.
pub fn lex_alternative<'a>(words: &[&'a str]) -> Result<Vec<RhsToken<'a>>> {
    if words.contains(&"0") {
        if words.len() != 1 {
            return Err(GrammarErrorKind::EpsilonNotAlone);
        }
        return Ok(Vec::new());
    }

    words.iter().copied().map(lex_rhs_token).collect()
}
