//! Streaming JSON writer used by the converter.
//!
//! Nothing is buffered beyond the underlying writer: members are written as
//! soon as they are classified, and the separator in front of each member is
//! decided from the kind of member written before it in the same block.

use std::io::{self, Write};

use serde_json::Value;
use tracing::warn;

use super::Dialect;

const COMMENT_KEY: &str = "_comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Member {
    Comment,
    Field,
    Block,
}

/// One open JSON object. Tracks the last member written so the next one
/// knows whether it needs a separator.
#[derive(Debug, Default)]
struct Frame {
    last: Option<Member>,
}

pub struct Emitter<W: Write> {
    out: W,
    dialect: Dialect,
    frames: Vec<Frame>,
    /// Stray closes seen at top level (legacy output only); each one
    /// shifts later members one indent to the left.
    underflow: usize,
}

impl<W: Write> Emitter<W> {
    /// Writes the opening brace of the top-level object.
    pub fn begin(mut out: W, dialect: Dialect) -> io::Result<Self> {
        out.write_all(b"{\n")?;
        Ok(Self {
            out,
            dialect,
            frames: vec![Frame::default()],
            underflow: 0,
        })
    }

    /// Current nesting level; the top-level object is level 1.
    pub fn level(&self) -> usize {
        self.frames.len()
    }

    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        self.separate(Member::Comment)?;
        let indent = self.indent();
        let value = self.quote(text);
        write!(self.out, "{}\"{}\":\n{}", indent, COMMENT_KEY, value)
    }

    pub fn field(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.separate(Member::Field)?;
        let indent = self.indent();
        let key = self.quote(name);
        write!(self.out, "{}{}:\t\t{}", indent, key, value)
    }

    pub fn open_block(&mut self, name: &str) -> io::Result<()> {
        self.separate(Member::Block)?;
        let indent = self.indent();
        let key = self.quote(name);
        write!(self.out, "{}{}:\n{}{{\n", indent, key, indent)?;
        self.frames.push(Frame::default());
        Ok(())
    }

    /// Closes the innermost block. Returns false when no block was open.
    pub fn close_block(&mut self) -> io::Result<bool> {
        if self.frames.len() > 1 {
            self.frames.pop();
            let indent = self.indent();
            write!(self.out, "\n{}}}", indent)?;
            return Ok(true);
        }
        if self.dialect == Dialect::Legacy {
            // emitted as found, like the old converter did
            self.underflow += 1;
            let indent = self.indent();
            write!(self.out, "\n{}}}", indent)?;
        }
        Ok(false)
    }

    /// Closes any blocks still open (strict output only), writes the final
    /// brace and flushes.
    pub fn finish(mut self) -> io::Result<W> {
        if self.dialect == Dialect::Strict {
            let unclosed = self.frames.len() - 1;
            if unclosed > 0 {
                warn!("{} block(s) left open at end of input, closing them", unclosed);
            }
            for _ in 0..unclosed {
                self.close_block()?;
            }
        }
        self.out.write_all(b"\n\n}")?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn separate(&mut self, next: Member) -> io::Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        let Some(previous) = frame.last.replace(next) else {
            return Ok(());
        };
        let separator = if next == Member::Field && previous != Member::Comment {
            ",\n"
        } else {
            ",\n\n"
        };
        self.out.write_all(separator.as_bytes())
    }

    fn quote(&self, text: &str) -> String {
        match self.dialect {
            Dialect::Strict => Value::from(text).to_string(),
            Dialect::Legacy => format!("\"{}\"", text),
        }
    }

    fn indent(&self) -> String {
        "\t".repeat(self.frames.len().saturating_sub(self.underflow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(dialect: Dialect, steps: impl FnOnce(&mut Emitter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut emitter = Emitter::begin(Vec::new(), dialect).unwrap();
        steps(&mut emitter).unwrap();
        String::from_utf8(emitter.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(emit(Dialect::Strict, |_| Ok(())), "{\n\n\n}");
    }

    #[test]
    fn test_fields_are_comma_separated() {
        let out = emit(Dialect::Strict, |e| {
            e.field("nx", "10")?;
            e.field("ny", "20")
        });
        assert_eq!(out, "{\n\t\"nx\":\t\t10,\n\t\"ny\":\t\t20\n\n}");
    }

    #[test]
    fn test_first_child_block_has_no_separator() {
        let out = emit(Dialect::Strict, |e| {
            e.open_block("Outer")?;
            e.open_block("Inner")?;
            e.field("x", "1")?;
            e.close_block()?;
            e.close_block()?;
            Ok(())
        });
        assert_eq!(
            out,
            "{\n\t\"Outer\":\n\t{\n\t\t\"Inner\":\n\t\t{\n\t\t\t\"x\":\t\t1\n\t\t}\n\t}\n\n}"
        );
        assert!(serde_json::from_str::<Value>(&out).is_ok());
    }

    #[test]
    fn test_comment_only_block_is_valid_json() {
        let out = emit(Dialect::Strict, |e| {
            e.open_block("Empty")?;
            e.comment("# nothing here")?;
            e.close_block()?;
            Ok(())
        });
        let json: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["Empty"]["_comment"], "# nothing here");
    }

    #[test]
    fn test_separator_widths() {
        let out = emit(Dialect::Legacy, |e| {
            e.comment("# c")?;
            e.field("a", "1")?;
            e.open_block("B")?;
            e.close_block()?;
            e.field("c", "2")
        });
        assert_eq!(
            out,
            "{\n\t\"_comment\":\n\"# c\",\n\n\t\"a\":\t\t1,\n\n\t\"B\":\n\t{\n\n\t},\n\t\"c\":\t\t2\n\n}"
        );
    }

    #[test]
    fn test_stray_close_at_top_level() {
        let strict = emit(Dialect::Strict, |e| {
            assert!(!e.close_block()?);
            Ok(())
        });
        assert_eq!(strict, "{\n\n\n}");

        let legacy = emit(Dialect::Legacy, |e| {
            assert!(!e.close_block()?);
            Ok(())
        });
        assert_eq!(legacy, "{\n\n}\n\n}");
    }

    #[test]
    fn test_members_after_stray_close_lose_an_indent() {
        let out = emit(Dialect::Legacy, |e| {
            e.close_block()?;
            e.field("x", "1")?;
            e.open_block("B")?;
            e.field("y", "2")?;
            e.close_block()?;
            Ok(())
        });
        assert_eq!(
            out,
            "{\n\n}\"x\":\t\t1,\n\n\"B\":\n{\n\t\"y\":\t\t2\n}\n\n}"
        );
    }

    #[test]
    fn test_unclosed_blocks_are_closed_in_strict_output() {
        let out = emit(Dialect::Strict, |e| {
            e.open_block("A")?;
            e.open_block("B")
        });
        assert_eq!(out.matches('{').count(), out.matches('}').count());
        assert!(serde_json::from_str::<Value>(&out).is_ok());
    }
}
