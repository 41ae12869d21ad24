use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::logging::OutputLog;
use crate::transport::{decode_line, TransportError, TransportReader};

use super::scrollback::{lock, OutputLine, SharedScrollback, Stamp};
use super::style::PatternMatcher;

/// Notifications from the reader thread to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    LineAppended,
    /// The link closed, locally or by the peer. Always the last event.
    Closed,
    /// The link failed. Always the last event.
    Failed(String),
}

/// Turns raw received lines into styled scrollback entries and feeds the
/// output log on the way.
pub struct LineSink {
    scrollback: SharedScrollback,
    matcher: Arc<PatternMatcher>,
    log: Option<OutputLog>,
    show_timestamp: bool,
    previous: Option<DateTime<Local>>,
}

impl LineSink {
    pub fn new(
        scrollback: SharedScrollback,
        matcher: Arc<PatternMatcher>,
        log: Option<OutputLog>,
        show_timestamp: bool,
    ) -> Self {
        Self {
            scrollback,
            matcher,
            log,
            show_timestamp,
            previous: None,
        }
    }

    pub fn accept(&mut self, raw: &[u8]) {
        let text = decode_line(raw);
        let now = Local::now();
        self.write_log(&text, now);

        let style = self.matcher.resolve_style(&text);
        let mut line = OutputLine::new(text, style);
        if self.show_timestamp {
            let since_previous = self
                .previous
                .and_then(|previous| (now - previous).to_std().ok())
                .unwrap_or_default();
            line = line.with_stamp(Stamp {
                at: now,
                since_previous,
            });
            self.previous = Some(now);
        }
        lock(&self.scrollback).append(line);
    }

    fn write_log(&mut self, text: &str, now: DateTime<Local>) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let at = self.show_timestamp.then_some(now);
        if let Err(error) = log.write_line(text, at) {
            tracing::error!(
                path = %log.path().display(),
                %error,
                "output log disabled after write failure"
            );
            self.log = None;
        }
    }
}

/// Reads lines until the link closes or fails, in arrival order, and reports
/// how it ended.
pub fn pump_lines(
    source: &mut dyn TransportReader,
    sink: &mut LineSink,
    events: &Sender<ReaderEvent>,
) -> ReaderEvent {
    loop {
        match source.read_line() {
            Ok(raw) => {
                sink.accept(&raw);
                if events.send(ReaderEvent::LineAppended).is_err() {
                    return ReaderEvent::Closed;
                }
            }
            Err(TransportError::Closed) => {
                tracing::info!("reader saw link close");
                return ReaderEvent::Closed;
            }
            Err(error) => {
                tracing::error!(%error, "transport read failed");
                return ReaderEvent::Failed(error.to_string());
            }
        }
    }
}

pub struct ReaderHandle {
    handle: Option<JoinHandle<()>>,
    events_rx: Receiver<ReaderEvent>,
    finished: bool,
}

impl ReaderHandle {
    pub fn spawn(
        mut source: Box<dyn TransportReader>,
        mut sink: LineSink,
    ) -> Result<Self, std::io::Error> {
        let (events_tx, events_rx) = mpsc::channel::<ReaderEvent>();
        let handle = thread::Builder::new()
            .name("serial-reader".to_owned())
            .spawn(move || {
                let outcome = pump_lines(source.as_mut(), &mut sink, &events_tx);
                let _ = events_tx.send(outcome);
            })?;
        Ok(Self {
            handle: Some(handle),
            events_rx,
            finished: false,
        })
    }

    /// A thread that vanished without a final event is reported as a failure
    /// once.
    pub fn next_event_timeout(&mut self, timeout: Duration) -> Option<ReaderEvent> {
        if self.finished {
            return None;
        }
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                if !matches!(event, ReaderEvent::LineAppended) {
                    self.finished = true;
                }
                Some(event)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.finished = true;
                Some(ReaderEvent::Failed("reader thread stopped".to_owned()))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .is_none_or(|handle| handle.is_finished())
    }

    /// Waits up to `timeout` for the thread to exit. Returns false if it is
    /// still blocked; the thread is then left detached.
    pub fn join_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!("reader thread did not stop in time");
                return false;
            }
            thread::sleep(Duration::from_millis(20));
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("reader thread panicked");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::scrollback::{shared, ScrollbackBuffer};
    use crate::console::style::{Matcher, PatternRule};
    use ratatui::style::{Color, Style};
    use std::collections::VecDeque;

    struct ScriptedReader {
        script: VecDeque<Result<Vec<u8>, TransportError>>,
    }

    impl TransportReader for ScriptedReader {
        fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
            self.script.pop_front().unwrap_or(Err(TransportError::Closed))
        }
    }

    fn scripted(lines: &[&[u8]]) -> ScriptedReader {
        ScriptedReader {
            script: lines.iter().map(|line| Ok(line.to_vec())).collect(),
        }
    }

    fn error_matcher() -> Arc<PatternMatcher> {
        Arc::new(PatternMatcher::new(vec![PatternRule::new(
            "error",
            Matcher::literal("error", true),
            Style::default().fg(Color::Red),
        )]))
    }

    #[test]
    fn lines_arrive_in_order_and_styled() {
        let scrollback = shared(ScrollbackBuffer::new(None));
        let mut sink = LineSink::new(scrollback.clone(), error_matcher(), None, false);
        let (tx, rx) = mpsc::channel();
        let mut source = scripted(&[b"boot\r", b"ERROR: disk", b"\0ready"]);

        let outcome = pump_lines(&mut source, &mut sink, &tx);

        assert_eq!(outcome, ReaderEvent::Closed);
        assert_eq!(rx.try_iter().count(), 3);
        let buffer = lock(&scrollback);
        let lines = buffer.visible_slice(10);
        let texts = lines.iter().map(|line| line.text.as_str()).collect::<Vec<&str>>();
        assert_eq!(texts, vec!["boot", "ERROR: disk", "ready"]);
        assert_eq!(lines[1].style.fg, Some(Color::Red));
        assert_eq!(lines[0].style, Style::default());
        assert!(lines.iter().all(|line| line.received_at.is_none()));
    }

    #[test]
    fn read_failure_ends_the_pump_with_failed() {
        let scrollback = shared(ScrollbackBuffer::new(None));
        let mut sink = LineSink::new(scrollback.clone(), error_matcher(), None, false);
        let (tx, _rx) = mpsc::channel();
        let mut source = ScriptedReader {
            script: VecDeque::from([
                Ok(b"last words".to_vec()),
                Err(TransportError::Io(std::io::Error::other("device unplugged"))),
            ]),
        };

        let outcome = pump_lines(&mut source, &mut sink, &tx);

        assert_eq!(
            outcome,
            ReaderEvent::Failed("device unplugged".to_owned())
        );
        assert_eq!(lock(&scrollback).len(), 1);
    }

    #[test]
    fn timestamps_are_attached_when_enabled() {
        let scrollback = shared(ScrollbackBuffer::new(None));
        let mut sink = LineSink::new(scrollback.clone(), error_matcher(), None, true);
        sink.accept(b"first");
        sink.accept(b"second");
        let buffer = lock(&scrollback);
        let lines = buffer.visible_slice(2);
        let first = lines[0].received_at.expect("first stamp");
        let second = lines[1].received_at.expect("second stamp");
        assert_eq!(first.since_previous, Duration::ZERO);
        assert!(second.at >= first.at);
    }

    #[test]
    fn sink_writes_output_log() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let log = OutputLog::open(file.path(), "").expect("open log");
        let scrollback = shared(ScrollbackBuffer::new(None));
        let mut sink = LineSink::new(scrollback, error_matcher(), Some(log), false);
        sink.accept(b"temp: 21C\r");
        sink.accept(b"temp: 22C");
        let contents = std::fs::read_to_string(file.path()).expect("read log");
        assert_eq!(contents, "temp: 21C\ntemp: 22C\n");
    }

    #[test]
    fn spawned_reader_reports_lines_then_close() {
        let scrollback = shared(ScrollbackBuffer::new(None));
        let sink = LineSink::new(scrollback.clone(), error_matcher(), None, false);
        let mut reader =
            ReaderHandle::spawn(Box::new(scripted(&[b"a", b"b"])), sink).expect("spawn reader");

        let mut events = Vec::new();
        while let Some(event) = reader.next_event_timeout(Duration::from_secs(2)) {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ReaderEvent::LineAppended,
                ReaderEvent::LineAppended,
                ReaderEvent::Closed
            ]
        );
        assert!(reader.join_timeout(Duration::from_secs(2)));
        assert_eq!(lock(&scrollback).len(), 2);
    }
}
