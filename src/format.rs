//! The text encoding of automaton definitions, test batches and verdicts.
//!
//! A definition file consists of a literal list of alphabet symbols on the first line, the
//! declared state count on the second, a literal list of accepting states on the third and one
//! literal transition row per state on the remaining lines:
//!
//! ```text
//! ['a', 'b']
//! 5
//! [2, 4]
//! [1, 3]
//! [1, 2]
//! [1, 2]
//! [4, 3]
//! [4, 3]
//! ```
//!
//! A test file holds one input string per line. The corresponding verdict file holds one line
//! per input, the single letter `A` for an accepted string and `R` for a rejected one.

/// Parsing automaton definitions and reading test strings.
pub mod input;

/// Serializing verdicts and naming verdict files.
pub mod output;
