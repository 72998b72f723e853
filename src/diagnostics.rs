//! User-facing diagnostics: progress symbols on stdout, warnings through
//! tracing, and a uniform prefix for fatal error messages.

use std::fmt::Display;
use std::io::{self, Write};

/// Prefix fatal error messages with the tool name.
pub fn error_message(msg: impl Display) -> String {
    format!("buildops-viz: {}", msg)
}

pub fn warn(msg: impl Display) {
    tracing::warn!("{}", msg);
}

/// Writes one symbol per processed line.
pub struct Progress<W: Write> {
    out: Option<W>,
    written: bool,
}

impl<W: Write> Progress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Some(out),
            written: false,
        }
    }

    pub fn disabled() -> Self {
        Self {
            out: None,
            written: false,
        }
    }

    /// Write errors are ignored: a closed stdout does not abort ingestion.
    pub fn symbol(&mut self, ch: char) {
        if let Some(out) = self.out.as_mut() {
            let _ = write!(out, "{}", ch);
            self.written = true;
        }
    }

    /// End the symbol line, if any symbol was written.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(out) = self.out.as_mut() {
            if self.written {
                writeln!(out)?;
            }
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn progress_line_is_terminated() {
        let mut buf = Vec::new();
        let mut p = Progress::new(&mut buf);
        for ch in ['<', '<', '>', 'x', '.'] {
            p.symbol(ch);
        }
        p.finish().unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "<<>x.\n");
    }

    #[test]
    fn nothing_written_means_no_newline() {
        let mut buf = Vec::new();
        Progress::new(&mut buf).finish().unwrap();
        assert!(buf.is_empty());
    }
}
