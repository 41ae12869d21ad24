use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{TransportError, TransportReader};

const READ_CHUNK: usize = 4096;

/// Splits a byte stream on `\n`, keeping any partial tail for the next push.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Next complete line without its `\n`.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|byte| *byte == b'\n')?;
        let mut line = self.pending.drain(..=end).collect::<Vec<u8>>();
        line.pop();
        Some(line)
    }

    /// Whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Text of a received line: NUL bytes dropped, invalid UTF-8 replaced, line
/// terminators removed.
pub fn decode_line(raw: &[u8]) -> String {
    let filtered = raw
        .iter()
        .copied()
        .filter(|byte| *byte != 0)
        .collect::<Vec<u8>>();
    String::from_utf8_lossy(&filtered)
        .trim_end_matches(['\r', '\n'])
        .to_owned()
}

/// Shared flag the writer half raises to make a blocked reader give up.
#[derive(Debug, Clone, Default)]
pub struct CloseSignal(Arc<AtomicBool>);

impl CloseSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Line-oriented reader over any byte source whose reads return periodically
/// (a read timeout or a readiness wait) so the close signal is observed
/// promptly. An idle source must report `TimedOut` or `WouldBlock`; a
/// zero-length read is end of stream.
pub struct FramedReader<R> {
    inner: R,
    decoder: LineDecoder,
    signal: CloseSignal,
    ended: bool,
}

impl<R: Read> FramedReader<R> {
    pub fn new(inner: R, signal: CloseSignal) -> Self {
        Self {
            inner,
            decoder: LineDecoder::new(),
            signal,
            ended: false,
        }
    }

    fn end_of_stream(&mut self) -> Result<Vec<u8>, TransportError> {
        self.ended = true;
        self.decoder.finish().ok_or(TransportError::Closed)
    }
}

impl<R: Read + Send> TransportReader for FramedReader<R> {
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.decoder.next_line() {
                return Ok(line);
            }
            if self.ended || self.signal.is_closed() {
                return Err(TransportError::Closed);
            }
            match self.inner.read(&mut chunk) {
                Ok(0) => return self.end_of_stream(),
                Ok(read) => self.decoder.push(&chunk[..read]),
                Err(error)
                    if matches!(
                        error.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(_) if self.signal.is_closed() => return Err(TransportError::Closed),
                Err(error) => return Err(TransportError::Io(error)),
            }
        }
    }
}
