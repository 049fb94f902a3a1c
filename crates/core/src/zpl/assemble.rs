//! ZPL program assembly.
//!
//! Wraps compiled fields in the format markers, inserts the encoding
//! directive, and renders debug overlays before content so user fields
//! overlay the guides.

use crate::layout::units::Rect;
use crate::zpl::writer::{ENCODING_UTF8, END_FORMAT, FieldBuf, START_FORMAT};

/// A one-dot frame around `rect`, offset by the target origin.
pub(crate) fn frame(rect: Rect, origin: (i32, i32)) -> String {
    FieldBuf::at(rect.x + origin.0, rect.y + origin.1)
        .graphic_box(rect.w.max(1), rect.h.max(1), 1)
        .finish()
}

/// A filled bar covering `rect`, offset by the target origin.
pub(crate) fn filled_bar(rect: Rect, origin: (i32, i32)) -> String {
    FieldBuf::at(rect.x + origin.0, rect.y + origin.1)
        .graphic_box(rect.w.max(1), rect.h.max(1), rect.w.min(rect.h).max(1))
        .finish()
}

/// Assemble the final program: `^XA`, optional `^CI28`, overlays, fields,
/// `^XZ`. One field per line; the output ends exactly with the end marker.
pub(crate) fn assemble(overlays: &[String], fields: &[String], emit_ci28: bool) -> String {
    let mut out = String::new();
    out.push_str(START_FORMAT);
    out.push('\n');
    if emit_ci28 {
        out.push_str(ENCODING_UTF8);
        out.push('\n');
    }
    for field in overlays.iter().chain(fields) {
        out.push_str(field);
        out.push('\n');
    }
    out.push_str(END_FORMAT);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_is_bracketed_by_format_markers() {
        let zpl = assemble(&[], &["^FO0,0^FDx^FS".to_owned()], true);
        assert!(zpl.starts_with("^XA\n"));
        assert!(zpl.ends_with("^XZ"));
        assert!(zpl.contains("^CI28\n"));
    }

    #[test]
    fn ci28_toggle_only_affects_directive() {
        let fields = vec!["^FO0,0^FDx^FS".to_owned()];
        let with = assemble(&[], &fields, true);
        let without = assemble(&[], &fields, false);
        assert!(with.contains("^CI28"));
        assert!(!without.contains("^CI28"));
        assert_eq!(with.replace("^CI28\n", ""), without);
    }

    #[test]
    fn overlays_render_before_fields() {
        let zpl = assemble(
            &["^FO0,0^GB10,10,1^FS".to_owned()],
            &["^FO0,0^FDx^FS".to_owned()],
            false,
        );
        let guide = zpl.find("^GB10,10,1").unwrap();
        let field = zpl.find("^FDx").unwrap();
        assert!(guide < field);
    }

    #[test]
    fn frame_and_bar_apply_origin() {
        let r = Rect::new(10, 20, 100, 2);
        assert_eq!(frame(r, (5, 5)), "^FO15,25^GB100,2,1^FS");
        assert_eq!(filled_bar(r, (5, 5)), "^FO15,25^GB100,2,2^FS");
    }
}
