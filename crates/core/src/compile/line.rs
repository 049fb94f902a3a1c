//! Line element compilation.
//!
//! A line is a filled graphic box spanning its box on the orientation axis,
//! positioned by `align` on the perpendicular axis.

use zplgrid_diagnostics::{CompileError, NodePath};

use crate::compile::EmitCtx;
use crate::layout::units::{Rect, mm_to_dots};
use crate::template::model::{LineAlign, LineElement, LineOrientation};
use crate::zpl::writer::FieldBuf;

/// Compile a line element into its field command string.
pub(crate) fn compile_line(
    element: &LineElement,
    box_rect: Rect,
    ctx: &EmitCtx<'_>,
    _path: &NodePath,
) -> Result<String, CompileError> {
    let thickness = mm_to_dots(element.thickness_mm, ctx.dpi).max(1);

    let (x, y, w, h) = match element.orientation {
        LineOrientation::H => {
            let y = box_rect.y + perpendicular_offset(element.align(), box_rect.h, thickness);
            (box_rect.x, y, box_rect.w, thickness)
        }
        LineOrientation::V => {
            let x = box_rect.x + perpendicular_offset(element.align(), box_rect.w, thickness);
            (x, box_rect.y, thickness, box_rect.h)
        }
    };

    Ok(FieldBuf::at(x + ctx.origin.0, y + ctx.origin.1)
        .graphic_box(w, h, thickness)
        .finish())
}

fn perpendicular_offset(align: LineAlign, extent: i32, thickness: i32) -> i32 {
    match align {
        LineAlign::Start => 0,
        LineAlign::Center => (extent - thickness) / 2,
        LineAlign::End => extent - thickness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::measure::GlyphMeasurer;
    use crate::template::model::ElementCommon;

    fn ctx() -> EmitCtx<'static> {
        EmitCtx {
            dpi: 203,
            origin: (0, 0),
            measurer: &GlyphMeasurer,
        }
    }

    fn line(orientation: LineOrientation, align: Option<LineAlign>) -> LineElement {
        LineElement {
            common: ElementCommon::default(),
            orientation,
            thickness_mm: 0.5, // 4 dots
            align,
        }
    }

    fn path() -> NodePath {
        NodePath::new("layout").join("elements").index(0)
    }

    #[test]
    fn horizontal_line_spans_width() {
        let field = compile_line(
            &line(LineOrientation::H, Some(LineAlign::Start)),
            Rect::new(10, 20, 200, 100),
            &ctx(),
            &path(),
        )
        .unwrap();
        assert_eq!(field, "^FO10,20^GB200,4,4^FS");
    }

    #[test]
    fn vertical_line_spans_height() {
        let field = compile_line(
            &line(LineOrientation::V, Some(LineAlign::Start)),
            Rect::new(10, 20, 200, 100),
            &ctx(),
            &path(),
        )
        .unwrap();
        assert_eq!(field, "^FO10,20^GB4,100,4^FS");
    }

    #[test]
    fn default_alignment_centres() {
        let field = compile_line(
            &line(LineOrientation::H, None),
            Rect::new(0, 0, 200, 100),
            &ctx(),
            &path(),
        )
        .unwrap();
        // (100 - 4) / 2 = 48
        assert_eq!(field, "^FO0,48^GB200,4,4^FS");
    }

    #[test]
    fn end_alignment_hugs_far_edge() {
        let field = compile_line(
            &line(LineOrientation::V, Some(LineAlign::End)),
            Rect::new(0, 0, 200, 100),
            &ctx(),
            &path(),
        )
        .unwrap();
        // 200 - 4 = 196
        assert_eq!(field, "^FO196,0^GB4,100,4^FS");
    }

    #[test]
    fn hairline_thickness_clamps_to_one_dot() {
        let mut el = line(LineOrientation::H, Some(LineAlign::Start));
        el.thickness_mm = 0.05; // rounds to 0
        let field = compile_line(&el, Rect::new(0, 0, 200, 100), &ctx(), &path()).unwrap();
        assert_eq!(field, "^FO0,0^GB200,1,1^FS");
    }
}
