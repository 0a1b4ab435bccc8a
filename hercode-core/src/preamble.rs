//! Splitting a foreign C preamble off the top of a HerCode file.
//!
//! A source file may start with C code (includes, helpers) followed by a
//! marker line `---`. Everything above the marker goes into the generated
//! C verbatim; HerCode source starts on the line after it.

/// Marker line separating the C preamble from the HerCode source.
pub const PREAMBLE_MARKER: &str = "---";

/// Returns `(preamble, hercode_source)`. Without a marker line the whole
/// input is HerCode and the preamble is `None`.
pub fn split_preamble(source: &str) -> (Option<&str>, &str) {
    let mut line_start = 0;
    for line in source.split_inclusive('\n') {
        let line_end = line_start + line.len();
        if line.trim_end() == PREAMBLE_MARKER {
            return (Some(&source[..line_start]), &source[line_end..]);
        }
        line_start = line_end;
    }
    (None, source)
}

/// Number of lines in front of the HerCode part returned by
/// [`split_preamble`] (the preamble plus the marker line).
pub fn hercode_line_offset(source: &str, hercode: &str) -> usize {
    let start = source.len().saturating_sub(hercode.len());
    source[..start].matches('\n').count()
}
