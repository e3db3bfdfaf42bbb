//! Library for evaluating strings against table-driven deterministic finite automata.
//!
//! A [`DFA`](automaton::DFA) here is an explicit transition table: one row per state, one column
//! per symbol of an ordered [`Alphabet`](alphabet::Alphabet), together with a set of accepting
//! states. State `0` is the start state by convention. Classifying an input string means
//! consuming it symbol by symbol, looking up each symbol's column and following the table, then
//! checking whether the state reached at the end is accepting. The two possible outcomes are
//! captured by [`Verdict`](automaton::Verdict).
//!
//! All structural validation happens once, at construction time: [`DFA::build`](automaton::DFA::build)
//! rejects duplicate alphabet symbols, ragged rows, out-of-range transition targets and
//! out-of-range accepting states. This is what makes the evaluation loop itself free of bounds
//! checking concerns; a successfully built automaton can never step outside its own table. The
//! one failure mode that remains at evaluation time is an input symbol that is not part of the
//! alphabet, which surfaces as a typed [`UnknownSymbolError`](automaton::UnknownSymbolError)
//! instead of being silently skipped.
//!
//! Around the core sit the pieces needed to run whole files of tests: the [`format`] module
//! parses automaton definitions from their literal text encoding and serializes verdicts as
//! one-letter lines, while the [`driver`] module pairs definition files with test files and
//! processes them in batch. The `dfarun` binary is a thin CLI over the driver.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use dfarun::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::Alphabet,
        automaton::{MalformedAutomatonError, StateId, UnknownSymbolError, Verdict, DFA},
        driver::{
            evaluate, run_all, run_pair, scan_pairs, BatchSummary, DriverError, PairReport,
            TestPair,
        },
        format::{
            input::{parse_definition, read_test_lines, DefinitionError},
            output::{output_path, verdict_token, write_verdicts},
        },
        math,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the
/// crate and do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets.
pub mod alphabet;

/// Defines the automaton representation and the classification of input strings.
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;

/// Reading automaton definitions and test strings, writing verdicts.
pub mod format;

/// Batch processing of definition/test file pairs.
pub mod driver;
