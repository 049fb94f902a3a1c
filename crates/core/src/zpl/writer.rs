//! ZPL II field command building.

/// Start-of-format marker.
pub const START_FORMAT: &str = "^XA";

/// End-of-format marker.
pub const END_FORMAT: &str = "^XZ";

/// UTF-8 encoding directive.
pub const ENCODING_UTF8: &str = "^CI28";

/// The ZPL line-break control used inside field blocks.
pub const NEWLINE_CONTROL: &str = "\\&";

/// Replace internal newlines with the ZPL line-break control.
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', NEWLINE_CONTROL)
}

/// Builder for a single ZPL field: origin, body commands, data, separator.
///
/// Every field starts at an absolute dot position and ends with `^FS`; the
/// builder enforces that shape by construction.
#[derive(Debug)]
pub struct FieldBuf {
    buf: String,
}

impl FieldBuf {
    /// Start a field at the given absolute dot position (`^FO`).
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            buf: format!("^FO{x},{y}"),
        }
    }

    /// Scalable font with explicit cell height and width (`^A0N`).
    #[must_use]
    pub fn font(mut self, height: i32, width: i32) -> Self {
        self.buf.push_str(&format!("^A0N,{height},{width}"));
        self
    }

    /// Field block for wrapping: width, max lines, extra line spacing, and
    /// justification (`^FB`).
    #[must_use]
    pub fn block(mut self, width: i32, max_lines: u32, line_spacing: i32, justify: char) -> Self {
        self.buf
            .push_str(&format!("^FB{width},{max_lines},{line_spacing},{justify}"));
        self
    }

    /// QR code field, model 2 (`^BQ`).
    #[must_use]
    pub fn qr(mut self, magnification: i32) -> Self {
        self.buf.push_str(&format!("^BQN,2,{magnification}"));
        self
    }

    /// DataMatrix field, ECC 200 (`^BX`). `columns`/`rows` of `None` leave
    /// the printer to auto-size the symbol.
    #[must_use]
    pub fn datamatrix(
        mut self,
        module_height: i32,
        columns: Option<u32>,
        rows: Option<u32>,
        format_id: u32,
        escape_char: char,
    ) -> Self {
        let cols = columns.map(|c| c.to_string()).unwrap_or_default();
        let rows = rows.map(|r| r.to_string()).unwrap_or_default();
        self.buf.push_str(&format!(
            "^BXN,{module_height},200,{cols},{rows},{format_id},{escape_char}"
        ));
        self
    }

    /// Graphic box (`^GB`). A border thickness equal to the smaller extent
    /// renders as a filled bar; thickness 1 renders as a thin frame.
    #[must_use]
    pub fn graphic_box(mut self, width: i32, height: i32, thickness: i32) -> Self {
        self.buf
            .push_str(&format!("^GB{width},{height},{thickness}"));
        self
    }

    /// Field data (`^FD`). The content is emitted verbatim; newline mapping
    /// is the caller's responsibility (see [`escape_newlines`]).
    #[must_use]
    pub fn data(mut self, content: &str) -> Self {
        self.buf.push_str("^FD");
        self.buf.push_str(content);
        self
    }

    /// Terminate the field with `^FS` and return the command string.
    pub fn finish(mut self) -> String {
        self.buf.push_str("^FS");
        self.buf
    }
}
