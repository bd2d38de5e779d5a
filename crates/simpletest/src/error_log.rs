//! ErrorLog - Fixed-capacity storage for failure messages
//!
//! Each fixture owns one log. The log is an index-based arena: a single
//! text buffer whose capacity is reserved once, plus a list of record
//! boundaries that is also sized up front. Appending never reallocates.
//!
//! Space is accounted as if every record carried a link header of
//! [`ENTRY_HEADER`] bytes in front of its text, with the next record
//! starting on an [`ENTRY_ALIGN`] boundary. Once a record would leave less
//! than [`SAFETY_MARGIN`] bytes for a successor, the log closes: the
//! cursor jumps to the end and later messages are dropped.
//!
//! Records are stored as end offsets into the text buffer, one word each.
//! Because every record but the last advances the cursor by at least one
//! header, a log of `C` bytes reserves at most `C + ENTRY_HEADER` bytes of
//! offsets, so a fixture's footprint is roughly twice its message space.

use std::fmt::{self, Write};

use tracing::debug;

use crate::format::floor_char_boundary;

/// Default message space reserved per fixture.
pub const DEFAULT_MESSAGE_SPACE: usize = 10 * 1024;

/// Bytes accounted for the link in front of every record.
pub const ENTRY_HEADER: usize = std::mem::size_of::<usize>();

/// Alignment of record starts.
pub const ENTRY_ALIGN: usize = std::mem::align_of::<usize>();

/// Minimum room that must remain for a following record.
pub const SAFETY_MARGIN: usize = 64;

/// What happened to a message handed to [`ErrorLog::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Stored; the log accepts further messages.
    Recorded,
    /// Stored, but the log is now closed for the rest of the run.
    RecordedAndFull,
    /// The log was already full; the message was discarded.
    Dropped,
}

impl AppendOutcome {
    /// Returns true if the message text was kept.
    pub fn is_recorded(&self) -> bool {
        !matches!(self, AppendOutcome::Dropped)
    }
}

/// Bounded, append-only log of formatted failure messages.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    capacity: usize,
    cursor: usize,
    text: String,
    records: Vec<usize>,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_SPACE)
    }
}

impl ErrorLog {
    /// Creates a log with `capacity` bytes of message space.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cursor: 0,
            text: String::with_capacity(capacity),
            // Every record but the last advances the cursor by at least one header.
            records: Vec::with_capacity(capacity / ENTRY_HEADER + 1),
        }
    }

    /// Total message space in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current write offset within the message space.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no message has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true once the log accepts no further messages.
    pub fn is_full(&self) -> bool {
        self.cursor >= self.capacity
    }

    /// Discards all records and rewinds the cursor.
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.text.clear();
        self.records.clear();
    }

    /// Formats `args` into the remaining space.
    ///
    /// Text that does not fit is truncated on a character boundary; the
    /// buffer is never written past its capacity.
    pub fn append(&mut self, args: fmt::Arguments<'_>) -> AppendOutcome {
        let space_left = self.capacity - self.cursor;
        if space_left == 0 {
            return AppendOutcome::Dropped;
        }
        if space_left < ENTRY_HEADER {
            self.close();
            return AppendOutcome::Dropped;
        }

        let text_space = space_left - ENTRY_HEADER;
        let start = self.text.len();
        let mut writer = BoundedWriter {
            text: &mut self.text,
            remaining: text_space,
        };
        let _ = writer.write_fmt(args);
        let written = self.text.len() - start;
        self.records.push(self.text.len());

        if written < text_space.saturating_sub(ENTRY_HEADER + SAFETY_MARGIN) {
            self.cursor = align_up(self.cursor + ENTRY_HEADER + written, ENTRY_ALIGN);
            AppendOutcome::Recorded
        } else {
            self.close();
            AppendOutcome::RecordedAndFull
        }
    }

    /// Iterates recorded messages, oldest first.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            log: self,
            index: 0,
        }
    }

    fn close(&mut self) {
        self.cursor = self.capacity;
        debug!(
            capacity = self.capacity,
            entries = self.records.len(),
            "error log full; further failure messages are dropped"
        );
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a str;
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

/// Iterator over the messages of an [`ErrorLog`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    log: &'a ErrorLog,
    index: usize,
}

impl<'a> Iterator for Entries<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let end = *self.log.records.get(self.index)?;
        let start = match self.index {
            0 => 0,
            index => self.log.records[index - 1],
        };
        self.index += 1;
        Some(&self.log.text[start..end])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.log.records.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}

/// Appends to a `String` without exceeding a byte budget.
struct BoundedWriter<'a> {
    text: &'a mut String,
    remaining: usize,
}

impl Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let take = floor_char_boundary(s, self.remaining);
        self.text.push_str(&s[..take]);
        self.remaining -= take;
        // Keep consuming so formatting finishes; excess is discarded.
        Ok(())
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}
