//! Byte-level scanning helpers shared by the OBJ and MTL walkers.

/// Iterate over lines of a raw buffer, yielding the byte offset of each
/// line start. Splits on LF and CRLF; runs of newline bytes are consumed
/// together, so interior blank lines are never yielded.
pub(crate) fn lines(buffer: &[u8]) -> Lines<'_> {
    Lines { buffer, pos: 0 }
}

pub(crate) struct Lines<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buffer.len() {
            return None;
        }
        let start = self.pos;
        let mut end = self.pos;
        while end < self.buffer.len() && self.buffer[end] != b'\n' && self.buffer[end] != b'\r' {
            end += 1;
        }
        self.pos = end;
        while self.pos < self.buffer.len()
            && (self.buffer[self.pos] == b'\n' || self.buffer[self.pos] == b'\r')
        {
            self.pos += 1;
        }
        Some((start, &self.buffer[start..end]))
    }
}

/// Advance past spaces/tabs and return the next whitespace-delimited token,
/// or `None` at end of line.
pub(crate) fn next_token<'a>(line: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    while *pos < line.len() && (line[*pos] == b' ' || line[*pos] == b'\t') {
        *pos += 1;
    }
    if *pos >= line.len() {
        return None;
    }
    let start = *pos;
    while *pos < line.len() && line[*pos] != b' ' && line[*pos] != b'\t' {
        *pos += 1;
    }
    Some(&line[start..*pos])
}

/// Parse a token as a C-locale float (decimal or exponent form).
pub(crate) fn parse_float(token: &[u8]) -> Option<f32> {
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Parse a token as a non-negative decimal integer.
pub(crate) fn parse_index(token: &[u8]) -> Option<u32> {
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Lossily decode a token into an owned string.
pub(crate) fn token_string(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_lf_and_crlf() {
        let collected: Vec<_> = lines(b"one\r\ntwo\nthree").collect();
        assert_eq!(
            collected,
            vec![
                (0, b"one".as_slice()),
                (5, b"two".as_slice()),
                (9, b"three".as_slice()),
            ]
        );
    }

    #[test]
    fn test_lines_skips_blank_runs() {
        let collected: Vec<_> = lines(b"a\n\n\nb\n").collect();
        assert_eq!(collected, vec![(0, b"a".as_slice()), (4, b"b".as_slice())]);
    }

    #[test]
    fn test_next_token_handles_tabs() {
        let line = b"  \tmap_Kd \trock.png ";
        let mut pos = 0;
        assert_eq!(next_token(line, &mut pos), Some(b"map_Kd".as_slice()));
        assert_eq!(next_token(line, &mut pos), Some(b"rock.png".as_slice()));
        assert_eq!(next_token(line, &mut pos), None);
    }

    #[test]
    fn test_parse_float_forms() {
        assert_eq!(parse_float(b"1.5"), Some(1.5));
        assert_eq!(parse_float(b"-2"), Some(-2.0));
        assert_eq!(parse_float(b"1e-3"), Some(0.001));
        assert_eq!(parse_float(b"nope"), None);
    }

    #[test]
    fn test_parse_index_rejects_negatives() {
        assert_eq!(parse_index(b"12"), Some(12));
        assert_eq!(parse_index(b"-1"), None);
        assert_eq!(parse_index(b""), None);
    }
}
