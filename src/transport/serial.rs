use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{self, BaudRate, ControlFlags, SetArg, SpecialCharacterIndices};

use super::framing::{CloseSignal, FramedReader};
use super::{Transport, TransportError, TransportWriter, READ_POLL_INTERVAL};

pub(super) fn open(
    device: &Path,
    baud: u32,
    description: String,
) -> Result<Transport, TransportError> {
    let rate = baud_rate(baud)?;
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(OFlag::O_NOCTTY.bits())
        .open(device)
        .map_err(|error| TransportError::Open {
            target: device.display().to_string(),
            error,
        })?;
    configure_line(&file, rate)?;

    let signal = CloseSignal::new();
    let reader = FramedReader::new(
        PolledSource::new(file.try_clone()?, READ_POLL_INTERVAL),
        signal.clone(),
    );
    let writer = SerialWriter { file, signal };
    tracing::debug!(device = %device.display(), baud, "serial line configured");
    Ok(Transport::new(Box::new(reader), Box::new(writer), description))
}

/// Raw 8N1 at `rate`. Reads never block: `PolledSource` waits for readiness
/// first, so an empty read after a readable poll means the device went away.
fn configure_line(file: &File, rate: BaudRate) -> Result<(), TransportError> {
    let mut settings = termios::tcgetattr(file)?;
    termios::cfmakeraw(&mut settings);
    termios::cfsetspeed(&mut settings, rate)?;
    settings.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
    settings.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    settings.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::tcsetattr(file, SetArg::TCSANOW, &settings)?;
    Ok(())
}

/// Byte source that waits up to `wait` for the descriptor to become
/// readable. An idle wait reports `TimedOut`. A hangup, or a readable
/// descriptor that yields no bytes, reports the device as disconnected.
pub(super) struct PolledSource<F> {
    inner: F,
    wait: PollTimeout,
}

impl<F: Read + AsFd> PolledSource<F> {
    pub(super) fn new(inner: F, wait: Duration) -> Self {
        let millis = u16::try_from(wait.as_millis()).unwrap_or(u16::MAX);
        Self {
            inner,
            wait: PollTimeout::from(millis),
        }
    }

    fn wait_readable(&self) -> io::Result<PollFlags> {
        let mut fds = [PollFd::new(self.inner.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, self.wait) {
            Ok(0) => Err(ErrorKind::TimedOut.into()),
            Ok(_) => Ok(fds[0].revents().unwrap_or_else(PollFlags::empty)),
            Err(Errno::EINTR) => Err(ErrorKind::Interrupted.into()),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}

fn disconnected() -> io::Error {
    io::Error::new(ErrorKind::UnexpectedEof, "device disconnected")
}

impl<F: Read + AsFd> Read for PolledSource<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let ready = self.wait_readable()?;
        if ready.contains(PollFlags::POLLIN) {
            return match self.inner.read(buf)? {
                0 if !buf.is_empty() => Err(disconnected()),
                read => Ok(read),
            };
        }
        if ready.intersects(PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL) {
            return Err(disconnected());
        }
        Err(ErrorKind::TimedOut.into())
    }
}

fn baud_rate(baud: u32) -> Result<BaudRate, TransportError> {
    let rate = match baud {
        1200 => BaudRate::B1200,
        2400 => BaudRate::B2400,
        4800 => BaudRate::B4800,
        9600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        460_800 => BaudRate::B460800,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        500_000 => BaudRate::B500000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        921_600 => BaudRate::B921600,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        1_000_000 => BaudRate::B1000000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        1_500_000 => BaudRate::B1500000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        2_000_000 => BaudRate::B2000000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        3_000_000 => BaudRate::B3000000,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        4_000_000 => BaudRate::B4000000,
        other => return Err(TransportError::UnsupportedBaud(other)),
    };
    Ok(rate)
}

struct SerialWriter {
    file: File,
    signal: CloseSignal,
}

impl TransportWriter for SerialWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.signal.is_closed() {
            return Err(TransportError::Closed);
        }
        self.file.write_all(bytes)?;
        self.file.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if self.signal.is_closed() {
            return;
        }
        let _ = self.file.flush();
        if let Err(error) = termios::tcdrain(&self.file) {
            tracing::debug!(%error, "tcdrain failed while closing serial line");
        }
        self.signal.close();
    }
}
