use std::io::BufRead;

use thiserror::Error;
use tracing::{debug, warn};

use crate::automaton::{MalformedAutomatonError, StateId, DFA};

/// Represents the ways in which a definition file can fail to parse. Structural problems that
/// only become visible once all parts are assembled, like a ragged transition row, surface as
/// the nested [`MalformedAutomatonError`].
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// Reading from the underlying source failed.
    #[error("failed to read the definition")]
    Io(#[from] std::io::Error),
    /// The definition ends before one of the three header lines.
    #[error("definition ends before the {0} line")]
    Missing(&'static str),
    /// A line that should hold a bracketed list does not.
    #[error("line {line}: expected a bracketed list")]
    ExpectedList {
        /// The 1-based line number.
        line: usize,
    },
    /// A list item that should be a single symbol is not one.
    #[error("line {line}: {token:?} is not a single symbol")]
    InvalidSymbol {
        /// The 1-based line number.
        line: usize,
        /// The offending item, as written.
        token: String,
    },
    /// A token that should be a state index is not a non-negative integer.
    #[error("line {line}: {token:?} is not a state index")]
    InvalidInteger {
        /// The 1-based line number.
        line: usize,
        /// The offending token, as written.
        token: String,
    },
    /// The parts parsed individually but do not form a valid automaton.
    #[error(transparent)]
    Automaton(#[from] MalformedAutomatonError),
}

/// Reads an automaton definition from `reader` and builds the [`DFA`] it describes.
///
/// Every literal is checked against the expected schema; there is no dynamic evaluation of the
/// file contents. The declared state count on line 2 is informational: the transition rows are
/// authoritative, and a mismatch between the two is logged as a warning rather than treated as
/// an error.
pub fn parse_definition<R: BufRead>(reader: R) -> Result<DFA, DefinitionError> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    // tolerate whitespace-only lines at the end of the file
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let symbols = parse_symbol_list(
        lines.first().ok_or(DefinitionError::Missing("alphabet"))?,
        1,
    )?;
    let declared = parse_index(
        lines
            .get(1)
            .ok_or(DefinitionError::Missing("state count"))?
            .trim(),
        2,
    )?;
    let accepting = parse_index_list(
        lines
            .get(2)
            .ok_or(DefinitionError::Missing("accepting states"))?,
        3,
    )?;

    let mut table = Vec::with_capacity(lines.len().saturating_sub(3));
    for (index, line) in lines.iter().enumerate().skip(3) {
        table.push(parse_index_list(line, index + 1)?);
    }

    if declared != table.len() {
        warn!(
            "definition declares {declared} states but provides {} transition rows, trusting the rows",
            table.len()
        );
    }
    debug!(
        "parsed definition with {} transition rows over {} symbols",
        table.len(),
        symbols.len()
    );

    Ok(DFA::build(symbols, table, accepting)?)
}

/// Reads one test string per line from `reader`, stripping leading and trailing whitespace.
/// Blank lines are kept as empty-string test cases.
pub fn read_test_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    reader
        .lines()
        .map(|line| line.map(|line| line.trim().to_string()))
        .collect()
}

fn bracketed_items(line: &str, lineno: usize) -> Result<Vec<&str>, DefinitionError> {
    let inner = line
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(DefinitionError::ExpectedList { line: lineno })?
        .trim();
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(',').map(str::trim).collect())
}

fn parse_symbol_list(line: &str, lineno: usize) -> Result<Vec<char>, DefinitionError> {
    bracketed_items(line, lineno)?
        .into_iter()
        .map(|token| parse_symbol(token, lineno))
        .collect()
}

fn parse_symbol(token: &str, lineno: usize) -> Result<char, DefinitionError> {
    let unquoted = token
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .or_else(|| {
            token
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
        })
        .unwrap_or(token);
    let mut chars = unquoted.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ => Err(DefinitionError::InvalidSymbol {
            line: lineno,
            token: token.to_string(),
        }),
    }
}

fn parse_index_list(line: &str, lineno: usize) -> Result<Vec<StateId>, DefinitionError> {
    bracketed_items(line, lineno)?
        .into_iter()
        .map(|token| parse_index(token, lineno))
        .collect()
}

fn parse_index(token: &str, lineno: usize) -> Result<StateId, DefinitionError> {
    token.parse().map_err(|_| DefinitionError::InvalidInteger {
        line: lineno,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_definition, read_test_lines, DefinitionError};
    use crate::automaton::{MalformedAutomatonError, Verdict};

    const EXAMPLE: &str = "['a', 'b']\n5\n[2, 4]\n[1, 3]\n[1, 2]\n[1, 2]\n[4, 3]\n[4, 3]\n";

    #[test]
    fn parses_the_documented_format() {
        let dfa = parse_definition(EXAMPLE.as_bytes()).unwrap();
        assert_eq!(dfa.states(), 5);
        assert_eq!(dfa.alphabet().symbols(), &['a', 'b']);
        assert_eq!(dfa.classify("bbb"), Ok(Verdict::Accepted));
        assert_eq!(dfa.classify("ab"), Ok(Verdict::Accepted));
        assert_eq!(dfa.classify("b"), Ok(Verdict::Rejected));
    }

    #[test]
    fn accepts_bare_and_double_quoted_symbols() {
        let bare = parse_definition("[a, b]\n1\n[]\n[0, 0]\n".as_bytes()).unwrap();
        assert!(bare.alphabet().contains('a'));
        let quoted = parse_definition("[\"a\", \"b\"]\n1\n[0]\n[0, 0]\n".as_bytes()).unwrap();
        assert!(quoted.alphabet().contains('b'));
    }

    #[test]
    fn missing_header_lines_are_reported() {
        assert!(matches!(
            parse_definition("".as_bytes()),
            Err(DefinitionError::Missing("alphabet"))
        ));
        assert!(matches!(
            parse_definition("['a']\n".as_bytes()),
            Err(DefinitionError::Missing("state count"))
        ));
        assert!(matches!(
            parse_definition("['a']\n1\n".as_bytes()),
            Err(DefinitionError::Missing("accepting states"))
        ));
    }

    #[test]
    fn malformed_literals_name_the_line() {
        assert!(matches!(
            parse_definition("'a', 'b'\n1\n[0]\n[0]\n".as_bytes()),
            Err(DefinitionError::ExpectedList { line: 1 })
        ));
        assert!(matches!(
            parse_definition("['ab']\n1\n[0]\n[0]\n".as_bytes()),
            Err(DefinitionError::InvalidSymbol { line: 1, .. })
        ));
        assert!(matches!(
            parse_definition("['a']\n1\n[x]\n[0]\n".as_bytes()),
            Err(DefinitionError::InvalidInteger { line: 3, .. })
        ));
        assert!(matches!(
            parse_definition("['a']\n2\n[0]\n[0]\n[-1]\n".as_bytes()),
            Err(DefinitionError::InvalidInteger { line: 5, .. })
        ));
    }

    #[test]
    fn structural_problems_surface_as_automaton_errors() {
        assert!(matches!(
            parse_definition("['a', 'b']\n1\n[0]\n[0]\n".as_bytes()),
            Err(DefinitionError::Automaton(
                MalformedAutomatonError::RowWidthMismatch { state: 0, .. }
            ))
        ));
    }

    #[test_log::test]
    fn declared_state_count_is_informational() {
        // declares 7 states but provides 1 row, which must win
        let dfa = parse_definition("['a']\n7\n[0]\n[0]\n".as_bytes()).unwrap();
        assert_eq!(dfa.states(), 1);
    }

    #[test]
    fn test_lines_are_trimmed_but_kept() {
        let lines = read_test_lines("ab\n  ba \n\nbb\r\n".as_bytes()).unwrap();
        assert_eq!(lines, vec!["ab", "ba", "", "bb"]);
    }
}
