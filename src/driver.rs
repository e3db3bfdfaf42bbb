use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::automaton::UnknownSymbolError;
use crate::format::input::{parse_definition, read_test_lines, DefinitionError};
use crate::format::output::{output_path, write_verdicts};
use crate::math;

/// One unit of batch work: an automaton definition file together with the test file whose lines
/// are to be classified against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestPair {
    /// Path of the definition file.
    pub definition: PathBuf,
    /// Path of the test file.
    pub tests: PathBuf,
}

/// Represents the ways in which evaluating one [`TestPair`] can fail.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A file could not be read or written.
    #[error("could not access {}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The definition file does not describe a usable automaton.
    #[error("definition {} is unusable", path.display())]
    Definition {
        /// The definition file.
        path: PathBuf,
        /// What went wrong while parsing it.
        #[source]
        source: DefinitionError,
    },
    /// A test line contains a symbol the automaton's alphabet does not have.
    #[error("test line {line} cannot be classified")]
    UnknownSymbol {
        /// The 1-based line number within the test file.
        line: usize,
        /// The offending symbol and its position within the line.
        #[source]
        source: UnknownSymbolError,
    },
}

/// What came out of successfully evaluating one [`TestPair`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairReport {
    /// Where the verdicts were written.
    pub output: PathBuf,
    /// How many test lines were classified.
    pub total: usize,
    /// How many of them were accepted.
    pub accepted: usize,
}

/// Aggregated outcome of [`run_all`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of pairs that were evaluated and written.
    pub succeeded: usize,
    /// Number of pairs that failed.
    pub failed: usize,
}

impl BatchSummary {
    /// Returns true if no pair failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

fn open(path: &Path) -> Result<BufReader<File>, DriverError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Evaluates the lines of `tests` against the automaton described by `definition` and writes
/// the verdicts to `output`.
///
/// All lines are classified before anything is written, so a failing line never leaves a
/// partial verdict file behind. An unknown symbol aborts the pair with the 1-based line number
/// it occurred on.
pub fn evaluate(definition: &Path, tests: &Path, output: &Path) -> Result<PairReport, DriverError> {
    info!(
        "evaluating {} against {}",
        tests.display(),
        definition.display()
    );
    let dfa = parse_definition(open(definition)?).map_err(|source| DriverError::Definition {
        path: definition.to_path_buf(),
        source,
    })?;
    debug!("loaded automaton\n{}", dfa.build_transition_table());

    let lines = read_test_lines(open(tests)?).map_err(|source| DriverError::Io {
        path: tests.to_path_buf(),
        source,
    })?;

    let mut verdicts = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let verdict = dfa
            .classify(line)
            .map_err(|source| DriverError::UnknownSymbol {
                line: index + 1,
                source,
            })?;
        verdicts.push(verdict);
    }

    let file = File::create(output).map_err(|source| DriverError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    write_verdicts(file, &verdicts).map_err(|source| DriverError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    let accepted = verdicts.iter().filter(|verdict| verdict.is_accepted()).count();
    info!(
        "wrote {} verdicts ({accepted} accepted) to {}",
        verdicts.len(),
        output.display()
    );
    Ok(PairReport {
        output: output.to_path_buf(),
        total: verdicts.len(),
        accepted,
    })
}

/// Evaluates one [`TestPair`], writing the verdicts to the default
/// [`output_path`] next to the test file.
pub fn run_pair(pair: &TestPair) -> Result<PairReport, DriverError> {
    evaluate(&pair.definition, &pair.tests, &output_path(&pair.tests))
}

/// Evaluates every pair of the batch. Failures are isolated: a pair that cannot be evaluated is
/// logged and counted, the remaining pairs still run.
pub fn run_all(pairs: &[TestPair]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for pair in pairs {
        match run_pair(pair) {
            Ok(report) => {
                summary.succeeded += 1;
                info!(
                    "{}: {}/{} accepted",
                    report.output.display(),
                    report.accepted,
                    report.total
                );
            }
            Err(error) => {
                summary.failed += 1;
                error!("evaluation of {} failed: {error}", pair.tests.display());
                let mut source = std::error::Error::source(&error);
                while let Some(inner) = source {
                    error!("  caused by: {inner}");
                    source = inner.source();
                }
            }
        }
    }
    summary
}

/// Discovers definition/test pairs in `dir`: a file named `dfa-<stem>` is paired with the file
/// named `test-<stem>` next to it. Files matching only one side are logged and skipped, as are
/// previously generated verdict files. The result is sorted by definition path, so a scan of
/// the same directory always yields the same batch in the same order.
pub fn scan_pairs(dir: &Path) -> Result<Vec<TestPair>, DriverError> {
    let io_error = |source| DriverError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut definitions: math::Map<String, PathBuf> = math::Map::default();
    let mut tests: math::Map<String, PathBuf> = math::Map::default();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.contains("-output") {
            // generated verdict files are not inputs
            continue;
        }
        if let Some(stem) = name.strip_prefix("dfa-") {
            definitions.insert(stem.to_string(), path);
        } else if let Some(stem) = name.strip_prefix("test-") {
            tests.insert(stem.to_string(), path);
        } else {
            debug!("ignoring {}", path.display());
        }
    }

    let stems: math::Set<&String> = definitions.keys().chain(tests.keys()).collect();
    let mut pairs = Vec::new();
    for stem in stems.into_iter().sorted() {
        match (definitions.get(stem), tests.get(stem)) {
            (Some(definition), Some(test_file)) => pairs.push(TestPair {
                definition: definition.clone(),
                tests: test_file.clone(),
            }),
            (Some(definition), None) => warn!(
                "definition {} has no matching test file, skipping",
                definition.display()
            ),
            (None, Some(test_file)) => warn!(
                "test file {} has no matching definition, skipping",
                test_file.display()
            ),
            (None, None) => unreachable!(),
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::{run_all, run_pair, scan_pairs, DriverError, TestPair};
    use std::fs;
    use std::path::Path;

    const DEFINITION: &str = "['a', 'b']\n5\n[2, 4]\n[1, 3]\n[1, 2]\n[1, 2]\n[4, 3]\n[4, 3]\n";

    fn write_pair(dir: &Path, stem: &str, tests: &str) -> TestPair {
        let definition = dir.join(format!("dfa-{stem}.txt"));
        let test_file = dir.join(format!("test-{stem}.txt"));
        fs::write(&definition, DEFINITION).unwrap();
        fs::write(&test_file, tests).unwrap();
        TestPair {
            definition,
            tests: test_file,
        }
    }

    #[test_log::test]
    fn pair_round_trip_writes_verdict_lines() {
        let dir = tempfile::tempdir().unwrap();
        let pair = write_pair(dir.path(), "01", "\nb\nbb\nbbb\nab\n");

        let report = run_pair(&pair).unwrap();
        assert_eq!(report.total, 5);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.output, dir.path().join("test-01-output.txt"));
        assert_eq!(
            fs::read_to_string(report.output).unwrap(),
            "R\nR\nR\nA\nA\n"
        );
    }

    #[test]
    fn unknown_symbols_abort_the_pair_with_a_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let pair = write_pair(dir.path(), "01", "ab\nac\n");

        let error = run_pair(&pair).unwrap_err();
        assert!(matches!(
            error,
            DriverError::UnknownSymbol { line: 2, source } if source.symbol == 'c' && source.position == 1
        ));
        assert!(!dir.path().join("test-01-output.txt").exists());
    }

    #[test]
    fn batch_isolates_failing_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_pair(dir.path(), "01", "ab\n");
        let bad = write_pair(dir.path(), "02", "zz\n");

        let summary = run_all(&[bad, good]);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert!(dir.path().join("test-01-output.txt").exists());
    }

    #[test]
    fn scan_finds_sorted_pairs_and_skips_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let second = write_pair(dir.path(), "02", "a\n");
        let first = write_pair(dir.path(), "01", "b\n");
        fs::write(dir.path().join("dfa-03.txt"), DEFINITION).unwrap();
        fs::write(dir.path().join("test-04.txt"), "a\n").unwrap();
        fs::write(dir.path().join("test-01-output.txt"), "R\n").unwrap();
        fs::write(dir.path().join("notes.md"), "unrelated").unwrap();

        let pairs = scan_pairs(dir.path()).unwrap();
        assert_eq!(pairs, vec![first, second]);
    }
}
