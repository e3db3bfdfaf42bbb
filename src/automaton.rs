use bit_set::BitSet;
use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use crate::alphabet::Alphabet;

/// The type used to index states. States are not independently constructed objects, they are
/// row indices into the transition table of a [`DFA`].
pub type StateId = usize;

/// The outcome of classifying one input string.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Verdict {
    /// The run ended in an accepting state.
    Accepted,
    /// The run ended in a non-accepting state.
    Rejected,
}

impl Verdict {
    /// Returns true if the verdict is [`Verdict::Accepted`].
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl From<bool> for Verdict {
    fn from(accepting: bool) -> Self {
        if accepting {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        }
    }
}

/// Represents the ways in which the parts of an automaton definition can fail to fit together.
/// All of these are caught when a [`DFA`] is built; once construction succeeds, a run can never
/// index outside the table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedAutomatonError {
    /// A symbol occurs in more than one column of the alphabet.
    #[error("symbol {symbol:?} occurs twice in the alphabet, in columns {first} and {second}")]
    DuplicateSymbol {
        /// The repeated symbol.
        symbol: char,
        /// Column of the first occurrence.
        first: usize,
        /// Column of the repeated occurrence.
        second: usize,
    },
    /// The transition table has no rows, so the start state does not exist.
    #[error("transition table has no rows, the start state 0 does not exist")]
    NoStates,
    /// A transition row does not have exactly one entry per alphabet symbol.
    #[error("transition row for state {state} has {found} entries, expected {expected}")]
    RowWidthMismatch {
        /// The state whose row is ragged.
        state: StateId,
        /// The alphabet size.
        expected: usize,
        /// The actual row width.
        found: usize,
    },
    /// A transition targets a state that does not exist.
    #[error(
        "transition from state {state} on {symbol:?} targets state {target}, but there are only {states} states"
    )]
    TargetOutOfRange {
        /// The source state of the transition.
        state: StateId,
        /// The symbol labelling the offending column.
        symbol: char,
        /// The out-of-range target.
        target: StateId,
        /// The number of states in the table.
        states: usize,
    },
    /// An accepting state index is not a state of the automaton.
    #[error("accepting state {state} is out of range, there are only {states} states")]
    AcceptingOutOfRange {
        /// The out-of-range accepting state.
        state: StateId,
        /// The number of states in the table.
        states: usize,
    },
}

/// Raised when classification encounters an input symbol that is not part of the alphabet.
///
/// This is a deliberate policy decision: a symbol without a column must fail the run, it is
/// never treated as a no-op transition that leaves the current state unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("symbol {symbol:?} at position {position} is not part of the alphabet")]
pub struct UnknownSymbolError {
    /// The symbol that has no column in the alphabet.
    pub symbol: char,
    /// The 0-based char offset of the symbol within the input string.
    pub position: usize,
}

/// A deterministic finite automaton over an [`Alphabet`] of chars, given by an explicit
/// transition table. It accepts a finite word if consuming the word symbol by symbol from
/// [`DFA::START`] ends in an accepting state.
///
/// The table has one row per state and one column per alphabet symbol, in alphabet order, and
/// the accepting states are kept in a bit set indexed by state. The automaton is immutable
/// after construction; classification borrows it shared, so a batch of inputs can be evaluated
/// against the same instance without any cross-input state.
#[derive(Clone, PartialEq, Eq)]
pub struct DFA {
    alphabet: Alphabet,
    table: Vec<Vec<StateId>>,
    accepting: BitSet,
}

impl DFA {
    /// The start state. Runs always begin in state 0.
    pub const START: StateId = 0;

    /// Builds a [`DFA`] from its parts, validating every structural constraint up front.
    ///
    /// `symbols` become the alphabet, in column order. `table` must have one row per state and
    /// one entry per symbol in every row, every entry must be an existing state, and every
    /// element of `accepting` must be an existing state. The first violated constraint aborts
    /// the build with the corresponding [`MalformedAutomatonError`]; there is no partial
    /// construction.
    pub fn build<S, A>(
        symbols: S,
        table: Vec<Vec<StateId>>,
        accepting: A,
    ) -> Result<Self, MalformedAutomatonError>
    where
        S: IntoIterator<Item = char>,
        A: IntoIterator<Item = StateId>,
    {
        let alphabet = Alphabet::new(symbols)?;
        let states = table.len();
        if states == 0 {
            return Err(MalformedAutomatonError::NoStates);
        }

        for (state, row) in table.iter().enumerate() {
            if row.len() != alphabet.size() {
                return Err(MalformedAutomatonError::RowWidthMismatch {
                    state,
                    expected: alphabet.size(),
                    found: row.len(),
                });
            }
            for (column, &target) in row.iter().enumerate() {
                if target >= states {
                    return Err(MalformedAutomatonError::TargetOutOfRange {
                        state,
                        symbol: alphabet[column],
                        target,
                        states,
                    });
                }
            }
        }

        let mut accepting_states = BitSet::with_capacity(states);
        for state in accepting {
            if state >= states {
                return Err(MalformedAutomatonError::AcceptingOutOfRange { state, states });
            }
            accepting_states.insert(state);
        }

        Ok(Self {
            alphabet,
            table,
            accepting: accepting_states,
        })
    }

    /// Returns the alphabet of the automaton.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Returns the number of states of the automaton.
    pub fn states(&self) -> usize {
        self.table.len()
    }

    /// Returns true if `state` is an accepting state.
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(state)
    }

    /// Runs the automaton on `input` and returns the state reached after consuming the whole
    /// word. For the empty word this is [`DFA::START`].
    ///
    /// Fails with [`UnknownSymbolError`] on the first symbol that has no column in the
    /// alphabet, identifying the symbol and its position.
    pub fn reached<W: AsRef<str>>(&self, input: W) -> Result<StateId, UnknownSymbolError> {
        let mut current = Self::START;
        for (position, symbol) in input.as_ref().chars().enumerate() {
            let column = self
                .alphabet
                .column(symbol)
                .ok_or(UnknownSymbolError { symbol, position })?;
            current = self.table[current][column];
        }
        Ok(current)
    }

    /// Classifies `input` by running the automaton on it and checking whether the state reached
    /// at the end is accepting.
    ///
    /// Classification is deterministic and side-effect free; calling it twice with the same
    /// input yields the same verdict.
    pub fn classify<W: AsRef<str>>(&self, input: W) -> Result<Verdict, UnknownSymbolError> {
        let input = input.as_ref();
        let reached = self.reached(input)?;
        trace!(
            "run of {:?} ended in state {reached}, which is {}accepting",
            input,
            if self.is_accepting(reached) { "" } else { "not " }
        );
        Ok(Verdict::from(self.is_accepting(reached)))
    }

    /// Classifies every input of the batch, preserving order. The verdicts are independent of
    /// each other, no state carries over between inputs.
    ///
    /// Fails fast with the first [`UnknownSymbolError`]; callers that want to attribute the
    /// failure to a specific input should iterate [`DFA::classify`] themselves.
    pub fn classify_all<I>(&self, inputs: I) -> Result<Vec<Verdict>, UnknownSymbolError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        inputs
            .into_iter()
            .map(|input| self.classify(input))
            .collect()
    }

    /// Returns a string representation of the transition table, one row per state and one
    /// column per alphabet symbol. Accepting states are marked with `*`, the start state with
    /// `->`. This is mainly used for debugging purposes.
    pub fn build_transition_table(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("state".to_string())
                .chain(self.alphabet.universe().map(|s| format!("{:?}", s))),
        );
        for (state, row) in self.table.iter().enumerate() {
            let mut record = vec![format!(
                "{}{}{}",
                if state == Self::START { "->" } else { "" },
                state,
                if self.is_accepting(state) { "*" } else { "" }
            )];
            record.extend(row.iter().map(|target| target.to_string()));
            builder.push_record(record);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl std::fmt::Debug for DFA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DFA with {} states over {:?}, accepting {{{}}}",
            self.states(),
            self.alphabet,
            self.accepting.iter().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{MalformedAutomatonError, UnknownSymbolError, Verdict, DFA};

    fn example() -> DFA {
        DFA::build(
            ['a', 'b'],
            vec![vec![1, 3], vec![1, 2], vec![1, 2], vec![4, 3], vec![4, 3]],
            [2, 4],
        )
        .unwrap()
    }

    #[test]
    fn classification_follows_the_table() {
        let dfa = example();
        assert_eq!(dfa.classify(""), Ok(Verdict::Rejected));
        assert_eq!(dfa.classify("b"), Ok(Verdict::Rejected));
        assert_eq!(dfa.classify("bb"), Ok(Verdict::Rejected));
        assert_eq!(dfa.classify("bbb"), Ok(Verdict::Accepted));
        assert_eq!(dfa.classify("ab"), Ok(Verdict::Accepted));
    }

    #[test]
    fn empty_word_verdict_is_start_state_acceptance() {
        let dfa = example();
        assert_eq!(
            dfa.classify("").unwrap().is_accepted(),
            dfa.is_accepting(DFA::START)
        );

        let accepts_empty = DFA::build(['a'], vec![vec![0]], [0]).unwrap();
        assert_eq!(accepts_empty.classify(""), Ok(Verdict::Accepted));
    }

    #[test]
    fn unknown_symbols_are_not_a_no_op() {
        let dfa = example();
        assert_eq!(
            dfa.classify("c"),
            Err(UnknownSymbolError {
                symbol: 'c',
                position: 0
            })
        );
        assert_eq!(
            dfa.classify("abxb"),
            Err(UnknownSymbolError {
                symbol: 'x',
                position: 2
            })
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let dfa = example();
        assert_eq!(dfa.classify("bbb"), dfa.classify("bbb"));
    }

    #[test]
    fn batch_verdicts_are_order_preserving_and_independent() {
        let dfa = example();
        let batch = dfa.classify_all(["bbb", "b", "ab"]).unwrap();
        assert_eq!(
            batch,
            vec![Verdict::Accepted, Verdict::Rejected, Verdict::Accepted]
        );
        assert_eq!(batch[0], dfa.classify("bbb").unwrap());
        assert_eq!(batch[1], dfa.classify("b").unwrap());
        assert_eq!(batch[2], dfa.classify("ab").unwrap());
    }

    #[test]
    fn build_rejects_ragged_rows() {
        assert_eq!(
            DFA::build(['a', 'b'], vec![vec![0, 0], vec![0]], []),
            Err(MalformedAutomatonError::RowWidthMismatch {
                state: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn build_rejects_out_of_range_targets() {
        assert_eq!(
            DFA::build(['a'], vec![vec![1]], []),
            Err(MalformedAutomatonError::TargetOutOfRange {
                state: 0,
                symbol: 'a',
                target: 1,
                states: 1
            })
        );
    }

    #[test]
    fn build_rejects_out_of_range_accepting_states() {
        assert_eq!(
            DFA::build(['a'], vec![vec![0]], [1]),
            Err(MalformedAutomatonError::AcceptingOutOfRange { state: 1, states: 1 })
        );
    }

    #[test]
    fn build_rejects_an_empty_table() {
        assert_eq!(
            DFA::build(['a'], vec![], []),
            Err(MalformedAutomatonError::NoStates)
        );
    }

    #[test]
    fn runs_never_leave_the_table() {
        let dfa = example();
        for input in ["", "a", "ab", "ba", "abab", "bbbb", "aabba"] {
            assert!(dfa.reached(input).unwrap() < dfa.states());
        }
    }
}
