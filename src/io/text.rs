//! Small line and token cursors shared by the text readers.

use crate::mesh_error::WakeMeshError;
use std::str::{Lines, SplitWhitespace};

/// Forward-only cursor over the lines of a text stream.
pub(crate) struct LineCursor<'a> {
    lines: Lines<'a>,
    line_no: usize,
}

impl<'a> LineCursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        LineCursor {
            lines: text.lines(),
            line_no: 0,
        }
    }

    /// Number of lines consumed so far.
    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }

    pub(crate) fn next_line(&mut self, what: &'static str) -> Result<&'a str, WakeMeshError> {
        let line = self.lines.next().ok_or(WakeMeshError::UnexpectedEof(what))?;
        self.line_no += 1;
        Ok(line)
    }

    /// Skip lines until one starting with `keyword`; `None` at end of input.
    pub(crate) fn find(&mut self, keyword: &str) -> Option<&'a str> {
        self.next_section(&[keyword])
    }

    /// Like [`find`](Self::find), but the section is mandatory.
    pub(crate) fn require(
        &mut self,
        keyword: &str,
        what: &'static str,
    ) -> Result<&'a str, WakeMeshError> {
        self.find(keyword).ok_or(WakeMeshError::UnexpectedEof(what))
    }

    /// Skip lines until one starting with any of `keywords`.
    pub(crate) fn next_section(&mut self, keywords: &[&str]) -> Option<&'a str> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let trimmed = line.trim_start();
            if keywords.iter().any(|k| trimmed.starts_with(k)) {
                return Some(line);
            }
        }
        None
    }
}

/// Comma-separated fields of a line, trimmed.
pub(crate) fn comma_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(str::trim)
}

/// Parse the first `count` comma-separated fields of `line` as floats.
/// Trailing fields are ignored.
pub(crate) fn parse_floats(
    line: &str,
    count: usize,
    what: &'static str,
) -> Result<Vec<f64>, WakeMeshError> {
    let values: Vec<f64> = comma_fields(line)
        .take(count)
        .map(|raw| parse_f64(raw, what))
        .collect::<Result<_, _>>()?;
    if values.len() < count {
        return Err(WakeMeshError::Format(format!(
            "{what}: expected {count} values, found {} in `{}`",
            values.len(),
            line.trim()
        )));
    }
    Ok(values)
}

pub(crate) fn parse_f64(raw: &str, what: &'static str) -> Result<f64, WakeMeshError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| WakeMeshError::Format(format!("{what}: invalid number `{raw}`")))
}

pub(crate) fn parse_usize(raw: &str, what: &'static str) -> Result<usize, WakeMeshError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| WakeMeshError::Format(format!("{what}: invalid count `{raw}`")))
}

/// Parse a `KEYWORD,<NumI>,<NumJ>` section header.
pub(crate) fn parse_dims(line: &str, what: &'static str) -> Result<(usize, usize), WakeMeshError> {
    let mut fields = comma_fields(line).skip(1);
    let ni = fields
        .next()
        .ok_or_else(|| WakeMeshError::Format(format!("{what}: missing NumI")))?;
    let nj = fields
        .next()
        .ok_or_else(|| WakeMeshError::Format(format!("{what}: missing NumJ")))?;
    Ok((parse_usize(ni, what)?, parse_usize(nj, what)?))
}

/// Whitespace token cursor for the triangulation formats.
pub(crate) struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Tokens {
            iter: text.split_whitespace(),
        }
    }

    pub(crate) fn next_raw(&mut self, what: &'static str) -> Result<&'a str, WakeMeshError> {
        self.iter.next().ok_or(WakeMeshError::UnexpectedEof(what))
    }

    pub(crate) fn next_f64(&mut self, what: &'static str) -> Result<f64, WakeMeshError> {
        parse_f64(self.next_raw(what)?, what)
    }

    pub(crate) fn next_usize(&mut self, what: &'static str) -> Result<usize, WakeMeshError> {
        parse_usize(self.next_raw(what)?, what)
    }

    pub(crate) fn next_i64(&mut self, what: &'static str) -> Result<i64, WakeMeshError> {
        let raw = self.next_raw(what)?;
        raw.parse::<i64>()
            .map_err(|_| WakeMeshError::Format(format!("{what}: invalid id `{raw}`")))
    }

    /// Whether any token remains.
    pub(crate) fn is_exhausted(&mut self) -> bool {
        self.iter.clone().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_and_floats() {
        assert_eq!(parse_dims("SURFACE_NODE,5, 9", "hdr").unwrap(), (5, 9));
        let v = parse_floats("1.0, 2.5,-3, extra", 3, "row").unwrap();
        assert_eq!(v, vec![1.0, 2.5, -3.0]);
        let err = parse_floats("1.0, 2.0", 3, "row").unwrap_err();
        assert!(matches!(err, WakeMeshError::Format(_)));
        let err = parse_floats("1.0, abc, 2.0", 3, "row").unwrap_err();
        assert!(matches!(err, WakeMeshError::Format(msg) if msg.contains("abc")));
    }

    #[test]
    fn cursor_finds_sections() {
        let text = "junk\nPLATE,2,3\n# header\nSTICK_NODE\n";
        let mut cur = LineCursor::new(text);
        assert_eq!(cur.find("PLATE"), Some("PLATE,2,3"));
        assert_eq!(cur.next_line("header").unwrap(), "# header");
        assert_eq!(cur.next_section(&["POINT", "STICK_NODE"]), Some("STICK_NODE"));
        assert_eq!(cur.line_no(), 4);
        assert!(matches!(
            cur.next_line("tail"),
            Err(WakeMeshError::UnexpectedEof("tail"))
        ));
    }

    #[test]
    fn tokens_parse_mixed_whitespace() {
        let mut t = Tokens::new(" 3\t2\n1.5 -7 ");
        assert_eq!(t.next_usize("n").unwrap(), 3);
        assert_eq!(t.next_usize("m").unwrap(), 2);
        assert_eq!(t.next_f64("x").unwrap(), 1.5);
        assert_eq!(t.next_i64("id").unwrap(), -7);
        assert!(t.is_exhausted());
    }
}
