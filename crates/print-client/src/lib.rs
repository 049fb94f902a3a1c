//! zplgrid print client — send compiled ZPL to network label printers.
//!
//! A deliberately small synchronous transport: resolve, connect, send,
//! close. Each print job owns its connection ([`TcpPrinter`] shuts the
//! stream down on drop); cancellation is the caller's timeout firing. The
//! API is synchronous (`std::net`), no async runtime required.

#![warn(missing_docs)]

mod addr;
mod config;
mod error;
mod tcp;

pub use addr::{DEFAULT_PORT, resolve_printer_addr};
pub use config::PrintTimeouts;
pub use error::PrintError;
pub use tcp::TcpPrinter;

/// Send data to a printer. Mockable seam for the print path.
pub trait Printer {
    /// Send raw bytes to the printer.
    fn send_raw(&mut self, data: &[u8]) -> Result<(), PrintError>;

    /// Send a ZPL program (convenience wrapper over `send_raw`).
    fn send_zpl(&mut self, zpl: &str) -> Result<(), PrintError> {
        self.send_raw(zpl.as_bytes())
    }
}
