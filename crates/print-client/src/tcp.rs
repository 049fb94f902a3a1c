//! TCP transport for ZPL printers (port 9100 / JetDirect / RAW).

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::addr::resolve_printer_addr;
use crate::{PrintError, PrintTimeouts, Printer};

/// A synchronous TCP connection to a ZPL printer.
///
/// The lifecycle is request-scoped: connect, send one or more labels, drop.
/// Dropping shuts the stream down; there is no pooling or reconnection.
#[derive(Debug)]
pub struct TcpPrinter {
    stream: TcpStream,
    addr: SocketAddr,
}

impl TcpPrinter {
    /// Connect to a printer at the given target.
    ///
    /// The target can be any form accepted by [`resolve_printer_addr`]:
    /// `IP`, `IP:PORT`, `hostname`, `hostname:PORT`. Port defaults to 9100.
    pub fn connect(target: &str, timeouts: PrintTimeouts) -> Result<Self, PrintError> {
        let addr = resolve_printer_addr(target)?;

        let stream = TcpStream::connect_timeout(&addr, timeouts.connect).map_err(|e| {
            match e.kind() {
                io::ErrorKind::ConnectionRefused => PrintError::ConnectionRefused {
                    addr: addr.to_string(),
                    source: e,
                },
                io::ErrorKind::TimedOut => PrintError::ConnectionTimeout {
                    addr: addr.to_string(),
                    timeout: timeouts.connect,
                    source: e,
                },
                _ => PrintError::ConnectionFailed {
                    addr: addr.to_string(),
                    source: e,
                },
            }
        })?;

        // Low-latency sends; a label is one small burst.
        stream
            .set_nodelay(true)
            .map_err(|e| PrintError::ConnectionFailed {
                addr: addr.to_string(),
                source: e,
            })?;
        stream
            .set_write_timeout(Some(timeouts.write))
            .map_err(|e| PrintError::ConnectionFailed {
                addr: addr.to_string(),
                source: e,
            })?;

        tracing::debug!(%addr, "printer connected");
        Ok(Self { stream, addr })
    }

    /// Return the resolved socket address this printer is connected to.
    pub fn remote_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Printer for TcpPrinter {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError> {
        self.stream
            .write_all(data)
            .map_err(PrintError::WriteFailed)?;
        self.stream.flush().map_err(PrintError::WriteFailed)?;
        tracing::debug!(addr = %self.addr, bytes = data.len(), "label sent");
        Ok(())
    }
}

impl Drop for TcpPrinter {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn sends_bytes_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            conn.read_to_end(&mut received).unwrap();
            received
        });

        let mut printer =
            TcpPrinter::connect(&addr.to_string(), PrintTimeouts::default()).unwrap();
        printer.send_zpl("^XA^FO0,0^FDhi^FS^XZ").unwrap();
        drop(printer); // Closes the stream so the server's read ends.

        assert_eq!(server.join().unwrap(), b"^XA^FO0,0^FDhi^FS^XZ");
    }

    #[test]
    fn refused_connection_is_classified() {
        // Bind then drop to get a port that nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = TcpPrinter::connect(&addr.to_string(), PrintTimeouts::default()).unwrap_err();
        assert!(
            matches!(
                err,
                PrintError::ConnectionRefused { .. } | PrintError::ConnectionFailed { .. }
            ),
            "{err}"
        );
    }
}
