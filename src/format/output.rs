use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::automaton::Verdict;

/// Returns the one-letter token a verdict is written as, `A` for accepted and `R` for rejected.
pub fn verdict_token(verdict: Verdict) -> char {
    match verdict {
        Verdict::Accepted => 'A',
        Verdict::Rejected => 'R',
    }
}

/// Writes one verdict token per line to `writer`, buffered so that a batch results in a single
/// flush at the end.
pub fn write_verdicts<W: Write>(writer: W, verdicts: &[Verdict]) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for &verdict in verdicts {
        writeln!(writer, "{}", verdict_token(verdict))?;
    }
    writer.flush()?;
    trace!("wrote {} verdicts", verdicts.len());
    Ok(())
}

/// Derives the verdict file name for a test file by suffixing the stem with `-output` and
/// keeping the extension, so `test-01.txt` becomes `test-01-output.txt` and an extensionless
/// `tests` becomes `tests-output`.
pub fn output_path(tests: &Path) -> PathBuf {
    let stem = tests
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match tests.extension() {
        Some(extension) => format!("{stem}-output.{}", extension.to_string_lossy()),
        None => format!("{stem}-output"),
    };
    tests.with_file_name(name)
}
