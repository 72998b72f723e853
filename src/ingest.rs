//! Ingestion loop: JSON lines in, hierarchy mutations out.
//!
//! Every line is classified and applied before the next is read. Bad lines are
//! logged and counted but never stop the run; only I/O errors on the input are
//! fatal.

use crate::Result;
use crate::event::{self, Event};
use crate::hierarchy::{Hierarchy, HierarchyError};

use anyhow::Context;
use std::io::BufRead;
use tracing::{debug, warn};

/// Outcome of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    BeginApplied,
    EndApplied,
    /// Not a JSON object, or a required field is missing.
    Malformed,
    /// Well-formed JSON object of an unknown shape.
    Unrecognized,
    /// Classified but refused by the hierarchy.
    Rejected,
}

impl LineStatus {
    pub fn symbol(self) -> char {
        match self {
            LineStatus::BeginApplied => '<',
            LineStatus::EndApplied => '>',
            LineStatus::Malformed | LineStatus::Rejected => 'x',
            LineStatus::Unrecognized => '.',
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub lines: usize,
    pub begins: usize,
    pub ends: usize,
    pub malformed: usize,
    pub unrecognized: usize,
    pub rejected: usize,
}

impl IngestSummary {
    fn count(&mut self, status: LineStatus) {
        self.lines += 1;
        match status {
            LineStatus::BeginApplied => self.begins += 1,
            LineStatus::EndApplied => self.ends += 1,
            LineStatus::Malformed => self.malformed += 1,
            LineStatus::Unrecognized => self.unrecognized += 1,
            LineStatus::Rejected => self.rejected += 1,
        }
    }
}

/// Read `input` to exhaustion, applying every event to `hierarchy`.
/// `on_line` receives the status of each line as it is processed.
pub fn ingest<R: BufRead>(
    input: R,
    hierarchy: &mut Hierarchy,
    mut on_line: impl FnMut(LineStatus),
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();

    for (lineno, line) in input.split(b'\n').enumerate() {
        let lno = lineno + 1;
        let bytes = line.with_context(|| format!("read input line {}", lno))?;
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(&bytes);

        let status = match std::str::from_utf8(bytes) {
            Ok(text) => apply_line(text, lno, hierarchy),
            Err(e) => {
                warn!(line = lno, "skipping line: {}", e);
                LineStatus::Malformed
            }
        };

        summary.count(status);
        on_line(status);
    }

    let orphans = hierarchy.orphans();
    if !orphans.is_empty() {
        warn!(
            count = orphans.len(),
            "operations reference a parent that was never begun and will not be shown: {:?}",
            orphans
        );
    }

    debug!(?summary, operations = hierarchy.len(), "ingestion finished");
    Ok(summary)
}

fn apply_line(text: &str, lno: usize, hierarchy: &mut Hierarchy) -> LineStatus {
    let event = match event::classify(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(line = lno, "skipping line: {}", e);
            return LineStatus::Malformed;
        }
    };

    match event {
        Event::Begin {
            id,
            display_name,
            start_time,
            parent_id,
        } => match hierarchy.begin(id, display_name, start_time, parent_id) {
            Ok(()) => LineStatus::BeginApplied,
            Err(e) => rejected(lno, e),
        },
        Event::End { id, end_time } => match hierarchy.end(id, end_time) {
            Ok(op) => {
                if end_time < op.start_time {
                    warn!(
                        line = lno,
                        id, "operation ends at {} before its start {}", end_time, op.start_time
                    );
                }
                LineStatus::EndApplied
            }
            Err(e) => rejected(lno, e),
        },
        Event::Unrecognized => {
            debug!(line = lno, "ignoring unrecognized object");
            LineStatus::Unrecognized
        }
    }
}

fn rejected(lno: usize, e: HierarchyError) -> LineStatus {
    warn!(line = lno, "discarding event: {}", e);
    LineStatus::Rejected
}
