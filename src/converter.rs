//! Line-by-line conversion of `.param` files into JSON.
//!
//! A param file is a sequence of lines:
//!
//! ```text
//! # header comment
//! Domain {            # inline comments are dropped
//!     nx = 10
//!     origin = 0.0 0.0 0.0
//!     label = free
//! }
//! ```
//!
//! Each line is classified on its own and its JSON is written straight to the
//! output, so no document tree is ever built. Runs of `#` lines are kept as
//! `_comment` members of the block that follows them; comments at the top of
//! the file belong to the top-level object.
//!
//! Classification is by substring (`{` before `=` before `}`), so a value that
//! itself contains `{` or `=` is misread. Param files in the wild never quote
//! values, so the old behaviour is kept.

use std::io::{BufRead, Write};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::errors::{ConvertError, Result};

mod emitter;
mod value;

use emitter::Emitter;
pub use value::ParamValue;

/// How the JSON text is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Always valid JSON: strings and comments escaped, braces balanced
    #[default]
    Strict,
    /// Byte-compatible with files produced by the old ParamToJSON script
    Legacy,
}

/// A field rename tied to the location of the source file.
struct FieldRename {
    path_marker: &'static str,
    from: &'static str,
    to: &'static str,
}

/// Poisson solver params used `InitialCond` for what the JSON readers call
/// `RefineSteps`.
const FIELD_RENAMES: &[FieldRename] = &[FieldRename {
    path_marker: "poisson",
    from: "InitialCond",
    to: "RefineSteps",
}];

/// Counts collected while converting one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub lines: usize,
    pub blocks: usize,
    pub fields: usize,
    pub comments: usize,
    pub renamed: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    OpenBlock(&'a str),
    Field(&'a str, &'a str),
    CloseBlock,
    Ignored,
}

impl<'a> Line<'a> {
    /// Classifies a line that has already had its inline comment removed.
    fn classify(content: &'a str) -> Self {
        if let Some((name, _)) = content.split_once('{') {
            Line::OpenBlock(name.trim())
        } else if let Some((name, raw)) = content.split_once('=') {
            Line::Field(name.trim(), raw)
        } else if content.contains('}') {
            Line::CloseBlock
        } else {
            Line::Ignored
        }
    }
}

/// Converter state for a single file. Build a new one for every file.
pub struct Converter<W: Write> {
    emitter: Emitter<W>,
    dialect: Dialect,
    renames: Vec<&'static FieldRename>,
    pending_comment: String,
    collecting_leading_comments: bool,
    stats: ConvertStats,
}

impl<W: Write> Converter<W> {
    /// Starts a document on `out`. `source_name` is the base path of the file
    /// being converted and selects the field renames that apply.
    pub fn new(out: W, source_name: &str, dialect: Dialect) -> Result<Self> {
        let emitter = Emitter::begin(out, dialect).map_err(ConvertError::Write)?;
        let renames = FIELD_RENAMES
            .iter()
            .filter(|rename| source_name.contains(rename.path_marker))
            .collect();

        Ok(Self {
            emitter,
            dialect,
            renames,
            pending_comment: String::new(),
            collecting_leading_comments: true,
            stats: ConvertStats::default(),
        })
    }

    /// Converts every line of `input`, finishes the document and hands the
    /// writer back.
    pub fn convert<R: BufRead>(mut self, input: R) -> Result<(W, ConvertStats)> {
        for line in input.split(b'\n') {
            let mut bytes = line.map_err(ConvertError::Read)?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            self.process_line(&String::from_utf8_lossy(&bytes))?;
        }
        self.finish()
    }

    /// Feeds one line (without its line terminator).
    pub fn process_line(&mut self, line: &str) -> Result<()> {
        self.stats.lines += 1;

        if self.collecting_leading_comments {
            if line.starts_with('#') {
                self.push_comment(line);
                return Ok(());
            }
            if line.trim().is_empty() {
                return Ok(());
            }
            self.collecting_leading_comments = false;
            self.flush_comment()?;
        }

        if line.starts_with('#') {
            trace!("COMMENT: {}", line);
            self.push_comment(line);
            return Ok(());
        }

        let content = strip_inline_comment(line.trim_start());
        match Line::classify(content) {
            Line::OpenBlock(name) => {
                trace!("NEW LEVEL: {}", name);
                self.emitter.open_block(name).map_err(ConvertError::Write)?;
                self.stats.blocks += 1;
                self.flush_comment()?;
            }
            Line::Field(name, raw) => {
                trace!("VARIABLE: {}", content);
                let value = ParamValue::infer(raw, self.dialect);
                let name = self.rename(name);
                self.emitter
                    .field(name, &value.render(self.dialect))
                    .map_err(ConvertError::Write)?;
                self.stats.fields += 1;
            }
            Line::CloseBlock => {
                trace!("CLOSED LEVEL: {}", content);
                if !self.emitter.close_block().map_err(ConvertError::Write)? {
                    warn!("line {}: '}}' without an open block", self.stats.lines);
                }
            }
            Line::Ignored => {}
        }
        Ok(())
    }

    /// Current nesting level; the top-level object is level 1.
    pub fn level(&self) -> usize {
        self.emitter.level()
    }

    /// Writes the closing brace and flushes.
    pub fn finish(self) -> Result<(W, ConvertStats)> {
        if !self.pending_comment.is_empty() {
            debug!(
                "dropping comment with no block after it: {:?}",
                self.pending_comment.trim_end()
            );
        }
        let out = self.emitter.finish().map_err(ConvertError::Write)?;
        Ok((out, self.stats))
    }

    fn push_comment(&mut self, line: &str) {
        self.pending_comment.push_str(line);
        self.pending_comment.push('\n');
    }

    /// Attaches the pending comment run to the current block.
    fn flush_comment(&mut self) -> Result<()> {
        if self.pending_comment.is_empty() {
            return Ok(());
        }
        let text = self.pending_comment.replace('"', "'");
        self.emitter
            .comment(text.trim_end())
            .map_err(ConvertError::Write)?;
        self.pending_comment.clear();
        self.stats.comments += 1;
        Ok(())
    }

    fn rename<'n>(&mut self, name: &'n str) -> &'n str {
        match self.renames.iter().find(|rename| rename.from == name) {
            Some(rename) => {
                debug!("renaming {} to {}", rename.from, rename.to);
                self.stats.renamed += 1;
                rename.to
            }
            None => name,
        }
    }
}

fn strip_inline_comment(line: &str) -> &str {
    match line.split_once('#') {
        Some((content, _)) => content,
        None => line,
    }
}

/// Converts a whole param document held in memory.
pub fn convert_str(input: &str, source_name: &str, dialect: Dialect) -> Result<String> {
    let converter = Converter::new(Vec::new(), source_name, dialect)?;
    let (out, _) = converter.convert(input.as_bytes())?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
