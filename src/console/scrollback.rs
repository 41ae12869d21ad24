use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::style::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub at: DateTime<Local>,
    pub since_previous: Duration,
}

impl Stamp {
    /// `2024-05-01T12:00:03, 0.4 | `
    pub fn display_prefix(&self) -> String {
        format!(
            "{}, {:3.1} | ",
            self.at.format("%Y-%m-%dT%H:%M:%S"),
            self.since_previous.as_secs_f64()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputLine {
    pub text: String,
    pub received_at: Option<Stamp>,
    pub style: Style,
}

impl OutputLine {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            received_at: None,
            style,
        }
    }

    pub fn with_stamp(mut self, stamp: Stamp) -> Self {
        self.received_at = Some(stamp);
        self
    }
}

pub type SharedScrollback = Arc<Mutex<ScrollbackBuffer>>;

pub fn shared(buffer: ScrollbackBuffer) -> SharedScrollback {
    Arc::new(Mutex::new(buffer))
}

/// A panic on the other side of the lock cannot leave the buffer half-written:
/// every mutation below completes before returning, so the data stays usable.
pub fn lock(buffer: &SharedScrollback) -> MutexGuard<'_, ScrollbackBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Received lines plus a view offset counted from the newest line.
///
/// `view_offset == 0` pins the view to the newest line. The offset is clamped
/// to `[0, len - 1]` after every mutation.
#[derive(Debug, Clone, Default)]
pub struct ScrollbackBuffer {
    lines: VecDeque<OutputLine>,
    limit: Option<usize>,
    view_offset: usize,
    total_received: usize,
    dirty: bool,
}

impl ScrollbackBuffer {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            lines: VecDeque::new(),
            limit: limit.filter(|limit| *limit > 0),
            view_offset: 0,
            total_received: 0,
            dirty: true,
        }
    }

    pub fn append(&mut self, line: OutputLine) {
        self.lines.push_back(line);
        self.total_received = self.total_received.saturating_add(1);
        if let Some(limit) = self.limit {
            while self.lines.len() > limit {
                self.lines.pop_front();
            }
        }
        self.clamp();
        self.dirty = true;
    }

    /// Positive deltas move toward older lines.
    pub fn scroll_by(&mut self, delta: isize) {
        let target = if delta >= 0 {
            self.view_offset.saturating_add(delta.unsigned_abs())
        } else {
            self.view_offset.saturating_sub(delta.unsigned_abs())
        };
        let before = self.view_offset;
        self.view_offset = target;
        self.clamp();
        if self.view_offset != before {
            self.dirty = true;
        }
    }

    pub fn scroll_to_end(&mut self) {
        if self.view_offset != 0 {
            self.view_offset = 0;
            self.dirty = true;
        }
    }

    pub fn scroll_to_start(&mut self) {
        let oldest = self.max_offset();
        if self.view_offset != oldest {
            self.view_offset = oldest;
            self.dirty = true;
        }
    }

    /// The `height` lines ending `view_offset` lines above the newest one,
    /// oldest first. Shorter than `height` when the buffer is.
    pub fn visible_slice(&self, height: usize) -> Vec<OutputLine> {
        let end = self.lines.len().saturating_sub(self.view_offset);
        let start = end.saturating_sub(height);
        self.lines.range(start..end).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn view_offset(&self) -> usize {
        self.view_offset
    }

    pub fn is_following(&self) -> bool {
        self.view_offset == 0
    }

    pub fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    /// Lines appended over the session, including evicted ones.
    pub fn total_received(&self) -> usize {
        self.total_received
    }

    #[cfg(test)]
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn clamp(&mut self) {
        self.view_offset = self.view_offset.min(self.max_offset());
    }
}

#[cfg(test)]
#[path = "../tests/scrollback_tests.rs"]
mod tests;
