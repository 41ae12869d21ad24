use std::io::Write;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use super::framing::{CloseSignal, FramedReader};
use super::{Transport, TransportError, TransportWriter, READ_POLL_INTERVAL};

pub(super) fn connect(
    host: &str,
    port: u16,
    description: String,
) -> Result<Transport, TransportError> {
    let target = format!("{host}:{port}");
    let open_error = |error: std::io::Error| TransportError::Open {
        target: target.clone(),
        error,
    };
    let addrs = (host, port).to_socket_addrs().map_err(open_error)?;

    let mut last_error = None;
    let mut stream = None;
    for addr in addrs {
        match TcpStream::connect(addr) {
            Ok(connected) => {
                stream = Some(connected);
                break;
            }
            Err(error) => last_error = Some(error),
        }
    }
    let stream = stream.ok_or_else(|| {
        open_error(last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "host resolved to no addresses")
        }))
    })?;

    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(READ_POLL_INTERVAL))?;
    let signal = CloseSignal::new();
    let reader = FramedReader::new(stream.try_clone()?, signal.clone());
    let writer = TcpWriter { stream, signal };
    tracing::debug!(%target, "tcp link connected");
    Ok(Transport::new(Box::new(reader), Box::new(writer), description))
}

struct TcpWriter {
    stream: TcpStream,
    signal: CloseSignal,
}

impl TransportWriter for TcpWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.signal.is_closed() {
            return Err(TransportError::Closed);
        }
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if self.signal.is_closed() {
            return;
        }
        let _ = self.stream.flush();
        self.signal.close();
        if let Err(error) = self.stream.shutdown(Shutdown::Both) {
            tracing::debug!(%error, "tcp shutdown failed");
        }
    }
}
