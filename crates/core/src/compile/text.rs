//! Text element compilation.
//!
//! Translates a bound text element into a `^A0N` text field, optionally
//! wrapped by a `^FB` field block. The fit policies differ only in how the
//! content and font size are prepared before emission:
//!
//! - `overflow`: no block, no wrapping; the printer renders past the box.
//! - `wrap`: block at the box width; lines past `max_lines` printer-clip.
//! - `truncate`: content is cut to `max_lines` before emission.
//! - `shrink_to_fit`: the font shrinks (× 0.9, floored) until the wrapped
//!   estimate fits the box height or the font reaches one dot.

use zplgrid_diagnostics::{CompileError, NodePath};

use crate::compile::EmitCtx;
use crate::compile::measure::{GlyphMeasurer, TextMetrics};
use crate::layout::units::{Rect, mm_to_dots};
use crate::template::model::{AlignH, AlignV, FitMode, TextElement, WrapMode};
use crate::zpl::writer::{FieldBuf, escape_newlines};

/// Compile a text element into its field command string.
pub(crate) fn compile_text(
    element: &TextElement,
    box_rect: Rect,
    ctx: &EmitCtx<'_>,
    path: &NodePath,
) -> Result<String, CompileError> {
    let font_height_mm = element.style.font_height_mm.ok_or_else(|| {
        CompileError::schema(path.clone(), "text element has no font_height_mm")
    })?;
    let font_width_mm = element.font_width_mm().unwrap_or(font_height_mm);

    let mut font_h = mm_to_dots(font_height_mm, ctx.dpi).max(1);
    let mut font_w = mm_to_dots(font_width_mm, ctx.dpi).max(1);

    // The two-character `\n` escape and raw newlines both mean a line break.
    let text = element.text.replace("\\n", "\n");

    let wrap = element.wrap();
    let max_lines = element.max_lines();
    let justify = match element.align_h() {
        AlignH::Left => 'L',
        AlignH::Center => 'C',
        AlignH::Right => 'R',
    };

    match element.fit() {
        FitMode::Overflow => {
            let metrics = ctx.measurer.measure(font_w, font_h, &text, box_rect.w, WrapMode::None);
            let x = box_rect.x + h_offset(element.align_h(), box_rect.w, metrics.max_width(font_w));
            let y = box_rect.y + v_offset(element.align_v(), box_rect.h, metrics.height());
            Ok(FieldBuf::at(x + ctx.origin.0, y + ctx.origin.1)
                .font(font_h, font_w)
                .data(&escape_newlines(&text))
                .finish())
        }

        FitMode::Wrap => {
            let metrics = ctx.measurer.measure(font_w, font_h, &text, box_rect.w, wrap);
            let y = box_rect.y
                + v_offset(element.align_v(), box_rect.h, metrics.height_clamped(max_lines));
            Ok(emit_block(
                box_rect, y, font_h, font_w, max_lines, justify, &text, ctx,
            ))
        }

        FitMode::Truncate => {
            let truncated = truncate_content(&text, box_rect.w, font_w, font_h, wrap, max_lines, ctx);
            let height = truncated.len() as i32 * font_h;
            let y = box_rect.y + v_offset(element.align_v(), box_rect.h, height);
            let content = truncated.join("\n");
            Ok(emit_block(
                box_rect, y, font_h, font_w, max_lines, justify, &content, ctx,
            ))
        }

        FitMode::ShrinkToFit => {
            // Shrink until the full wrapped estimate fits or the font
            // bottoms out at one dot. Each step strictly decreases the
            // height, so the loop terminates.
            let mut metrics: TextMetrics;
            loop {
                metrics = ctx.measurer.measure(font_w, font_h, &text, box_rect.w, wrap);
                if metrics.height() <= box_rect.h || font_h <= 1 {
                    break;
                }
                font_h = ((f64::from(font_h) * 0.9).floor() as i32).max(1);
                font_w = ((f64::from(font_w) * 0.9).floor() as i32).max(1);
            }
            let y = box_rect.y
                + v_offset(element.align_v(), box_rect.h, metrics.height_clamped(max_lines));
            Ok(emit_block(
                box_rect, y, font_h, font_w, max_lines, justify, &text, ctx,
            ))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_block(
    box_rect: Rect,
    y: i32,
    font_h: i32,
    font_w: i32,
    max_lines: u32,
    justify: char,
    content: &str,
    ctx: &EmitCtx<'_>,
) -> String {
    FieldBuf::at(box_rect.x + ctx.origin.0, y + ctx.origin.1)
        .font(font_h, font_w)
        .block(box_rect.w, max_lines, 0, justify)
        .data(&escape_newlines(content))
        .finish()
}

/// Cut content down to `max_lines` lines for `fit = truncate`.
///
/// With wrapping enabled the measurer's broken lines are kept up to the
/// limit. Without wrapping the first `max_lines` logical lines are kept,
/// each cut at the estimated characters-per-line of the box width.
fn truncate_content(
    text: &str,
    box_w: i32,
    font_w: i32,
    font_h: i32,
    wrap: WrapMode,
    max_lines: u32,
    ctx: &EmitCtx<'_>,
) -> Vec<String> {
    match wrap {
        WrapMode::None => {
            let cpl = GlyphMeasurer::chars_per_line(font_w, box_w);
            text.split('\n')
                .take(max_lines as usize)
                .map(|line| line.chars().take(cpl).collect())
                .collect()
        }
        WrapMode::Word | WrapMode::Char => {
            let metrics = ctx.measurer.measure(font_w, font_h, text, box_w, wrap);
            metrics
                .lines
                .into_iter()
                .take(max_lines as usize)
                .collect()
        }
    }
}

fn h_offset(align: AlignH, box_w: i32, content_w: i32) -> i32 {
    match align {
        AlignH::Left => 0,
        AlignH::Center => (box_w - content_w) / 2,
        AlignH::Right => box_w - content_w,
    }
}

fn v_offset(align: AlignV, box_h: i32, content_h: i32) -> i32 {
    match align {
        AlignV::Top => 0,
        AlignV::Center => (box_h - content_h) / 2,
        AlignV::Bottom => box_h - content_h,
    }
}
