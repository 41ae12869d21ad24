use std::path::PathBuf;
use std::time::Duration;

mod framing;
#[cfg(unix)]
mod serial;
mod tcp;

pub use framing::{decode_line, CloseSignal, FramedReader, LineDecoder};

/// How long a blocked read waits before it re-checks the close signal.
pub(crate) const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB1";
pub const DEFAULT_BAUD: u32 = 1_000_000;
pub const DEFAULT_TCP_PORT: u16 = 5001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSpec {
    Serial { device: PathBuf, baud: u32 },
    Tcp { host: String, port: u16 },
}

impl TransportSpec {
    /// Shown as the output pane title.
    pub fn describe(&self) -> String {
        match self {
            TransportSpec::Serial { device, baud } => {
                format!("Port: {} Speed: {baud} bit/s", device.display())
            }
            TransportSpec::Tcp { host, port } => format!("Host: {host} Port: {port}"),
        }
    }
}

#[derive(Debug)]
pub enum TransportError {
    /// The link was closed locally or by the peer. Not a failure for the reader.
    Closed,
    Open {
        target: String,
        error: std::io::Error,
    },
    Io(std::io::Error),
    UnsupportedBaud(u32),
    #[cfg(unix)]
    Termios(nix::Error),
    Unsupported(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Closed => write!(f, "connection closed"),
            TransportError::Open { target, error } => {
                write!(f, "could not open `{target}`: {error}")
            }
            TransportError::Io(error) => write!(f, "{error}"),
            TransportError::UnsupportedBaud(baud) => {
                write!(f, "unsupported baud rate {baud}")
            }
            #[cfg(unix)]
            TransportError::Termios(error) => write!(f, "serial line setup failed: {error}"),
            TransportError::Unsupported(what) => write!(f, "{what} is not supported here"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(unix)]
impl From<nix::Error> for TransportError {
    fn from(value: nix::Error) -> Self {
        Self::Termios(value)
    }
}

/// Read half of a link. Used only by the reader thread.
pub trait TransportReader: Send {
    /// Next complete line, without its terminator. `TransportError::Closed`
    /// ends the stream normally.
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// Write half of a link. Used only by the UI thread.
pub trait TransportWriter: Send {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Flushes pending output and closes the link, which makes a blocked
    /// reader return `TransportError::Closed`. Calling it twice is harmless.
    fn close(&mut self);
}

pub struct Transport {
    pub reader: Box<dyn TransportReader>,
    pub writer: Box<dyn TransportWriter>,
    pub description: String,
}

impl Transport {
    pub fn new(
        reader: Box<dyn TransportReader>,
        writer: Box<dyn TransportWriter>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            writer,
            description: description.into(),
        }
    }
}

pub fn open(spec: &TransportSpec) -> Result<Transport, TransportError> {
    tracing::info!(target_link = %spec.describe(), "opening transport");
    match spec {
        TransportSpec::Serial { device, baud } => open_serial(device, *baud, spec.describe()),
        TransportSpec::Tcp { host, port } => tcp::connect(host, *port, spec.describe()),
    }
}

#[cfg(unix)]
fn open_serial(
    device: &std::path::Path,
    baud: u32,
    description: String,
) -> Result<Transport, TransportError> {
    serial::open(device, baud, description)
}

#[cfg(not(unix))]
fn open_serial(
    _device: &std::path::Path,
    _baud: u32,
    _description: String,
) -> Result<Transport, TransportError> {
    Err(TransportError::Unsupported(
        "serial devices on this platform".to_owned(),
    ))
}
