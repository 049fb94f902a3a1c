//! DataMatrix element compilation.
//!
//! Quality is pinned to ECC 200. In `fixed` mode the module height comes
//! straight from `module_size_mm` and the printer auto-sizes the symbol
//! unless explicit columns/rows are given. In `max` mode (which requires
//! explicit columns and rows) the module size is computed so the whole
//! symbol fits the quiet-zone-inset box.

use zplgrid_diagnostics::{CompileError, NodePath};

use crate::compile::{EmitCtx, align_offset};
use crate::layout::units::{Rect, mm_to_dots};
use crate::template::model::{AlignV, DataMatrixElement, SizeMode};
use crate::zpl::writer::FieldBuf;

/// Compile a DataMatrix element into its field command string.
pub(crate) fn compile_datamatrix(
    element: &DataMatrixElement,
    box_rect: Rect,
    ctx: &EmitCtx<'_>,
    path: &NodePath,
) -> Result<String, CompileError> {
    let quiet = mm_to_dots(element.quiet_zone_mm(), ctx.dpi);
    let inner = box_rect.inset([quiet; 4]);
    if !inner.is_drawable() {
        return Err(CompileError::layout(
            path.clone(),
            format!(
                "quiet zone leaves no room for the DataMatrix symbol \
                 ({} x {} dots)",
                inner.w, inner.h
            ),
        ));
    }

    let columns = element.columns();
    let rows = element.rows();

    let module = match element.size_mode() {
        SizeMode::Fixed => mm_to_dots(element.module_size_mm(), ctx.dpi).max(1),
        SizeMode::Max => {
            // Invariant checking guarantees explicit dims for `max`.
            if columns == 0 || rows == 0 {
                return Err(CompileError::invariant(
                    path.clone(),
                    "DataMatrix size_mode `max` requires explicit columns and rows",
                ));
            }
            let module = (inner.w / columns as i32).min(inner.h / rows as i32);
            if module < 1 {
                return Err(CompileError::layout(
                    path.clone(),
                    format!(
                        "a {columns}x{rows} DataMatrix does not fit in \
                         {} x {} dots",
                        inner.w, inner.h
                    ),
                ));
            }
            module
        }
    };

    // With explicit dims the symbol size is known and alignment applies;
    // with printer auto-sizing it is unknowable at compile time, so the
    // symbol anchors at the quiet-zone-inset top-left corner.
    let (x, y) = if columns > 0 && rows > 0 {
        let symbol_w = columns as i32 * module;
        let symbol_h = rows as i32 * module;
        (
            inner.x + align_offset(element.align_h(), inner.w, symbol_w),
            inner.y
                + match element.align_v() {
                    AlignV::Top => 0,
                    AlignV::Center => (inner.h - symbol_h) / 2,
                    AlignV::Bottom => inner.h - symbol_h,
                },
        )
    } else {
        (inner.x, inner.y)
    };

    let dims = (columns > 0 && rows > 0).then_some((columns, rows));
    Ok(FieldBuf::at(x + ctx.origin.0, y + ctx.origin.1)
        .datamatrix(
            module,
            dims.map(|d| d.0),
            dims.map(|d| d.1),
            element.format_id(),
            element.escape_char(),
        )
        .data(&element.data)
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::measure::GlyphMeasurer;
    use crate::template::model::{AlignH, ElementCommon};
    use zplgrid_diagnostics::ErrorKind;

    fn ctx() -> EmitCtx<'static> {
        EmitCtx {
            dpi: 203,
            origin: (0, 0),
            measurer: &GlyphMeasurer,
        }
    }

    fn dm(data: &str) -> DataMatrixElement {
        DataMatrixElement {
            common: ElementCommon::default(),
            data: data.into(),
            module_size_mm: None,
            size_mode: None,
            columns: None,
            rows: None,
            format_id: None,
            escape_char: None,
            quiet_zone_mm: None,
            align_h: None,
            align_v: None,
        }
    }

    fn path() -> NodePath {
        NodePath::new("layout").join("elements").index(0)
    }

    #[test]
    fn fixed_auto_emits_module_height_only() {
        let field = compile_datamatrix(&dm("S-1"), Rect::new(0, 0, 100, 100), &ctx(), &path())
            .unwrap();
        // 0.5mm at 203dpi = 4 dots; auto dims leave the params empty.
        assert!(field.contains("^BXN,4,200,,,6,_"), "{field}");
        // Auto-sized symbols anchor at the box corner.
        assert!(field.starts_with("^FO0,0"), "{field}");
        assert!(field.contains("^FDS-1^FS"), "{field}");
    }

    #[test]
    fn fixed_with_explicit_dims_centres() {
        let mut el = dm("S-1");
        el.columns = Some(10);
        el.rows = Some(10);
        let field =
            compile_datamatrix(&el, Rect::new(0, 0, 100, 100), &ctx(), &path()).unwrap();
        // symbol 40x40 in 100x100 → (100-40)/2 = 30
        assert!(field.starts_with("^FO30,30"), "{field}");
        assert!(field.contains("^BXN,4,200,10,10,6,_"), "{field}");
    }

    #[test]
    fn max_mode_computes_module_from_box() {
        let mut el = dm("S-1");
        el.size_mode = Some(SizeMode::Max);
        el.columns = Some(16);
        el.rows = Some(16);
        // inner 100x80 → min(100/16, 80/16) = min(6, 5) = 5
        let field = compile_datamatrix(&el, Rect::new(0, 0, 100, 80), &ctx(), &path()).unwrap();
        assert!(field.contains("^BXN,5,200,16,16,6,_"), "{field}");
    }

    #[test]
    fn max_mode_that_cannot_fit_is_layout_error() {
        let mut el = dm("S-1");
        el.size_mode = Some(SizeMode::Max);
        el.columns = Some(48);
        el.rows = Some(48);
        let err = compile_datamatrix(&el, Rect::new(0, 0, 20, 20), &ctx(), &path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Layout);
    }

    #[test]
    fn custom_escape_and_format_id() {
        let mut el = dm("S_1");
        el.escape_char = Some('~');
        el.format_id = Some(2);
        let field =
            compile_datamatrix(&el, Rect::new(0, 0, 100, 100), &ctx(), &path()).unwrap();
        assert!(field.contains("^BXN,4,200,,,2,~"), "{field}");
    }

    #[test]
    fn alignment_with_dims() {
        let mut el = dm("S-1");
        el.columns = Some(10);
        el.rows = Some(10);
        el.align_h = Some(AlignH::Right);
        el.align_v = Some(AlignV::Top);
        let field =
            compile_datamatrix(&el, Rect::new(0, 0, 100, 100), &ctx(), &path()).unwrap();
        assert!(field.starts_with("^FO60,0"), "{field}");
    }

    #[test]
    fn quiet_zone_offsets_auto_anchor() {
        let mut el = dm("S-1");
        el.quiet_zone_mm = Some(1.0); // 8 dots
        let field =
            compile_datamatrix(&el, Rect::new(0, 0, 100, 100), &ctx(), &path()).unwrap();
        assert!(field.starts_with("^FO8,8"), "{field}");
    }
}
