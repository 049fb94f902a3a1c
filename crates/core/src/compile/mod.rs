//! The compile pipeline.
//!
//! `(template, target, variables) → zpl_string`, staged as: invariants →
//! defaults resolution → variable binding → layout solving → per-element
//! field emission → program assembly. Each stage produces a new derived
//! model; the caller's inputs are never mutated.

/// Text measurement capability.
pub mod measure;

mod datamatrix;
mod line;
mod qr;
mod text;

use std::collections::BTreeMap;

use zplgrid_diagnostics::{CompileError, NodePath};

use crate::layout::solver::{self, LayoutDetail, LayoutNode, LayoutTree};
use crate::layout::units::{Rect, padding_to_dots};
use crate::target::RenderTarget;
use crate::template::model::{
    AlignH, Element, MissingVarPolicy, Node, TemplateDocument,
};
use crate::template::{defaults, invariants, schema};
use crate::vars::{self, macros::MacroContext};
use crate::zpl::assemble::{assemble, filled_bar, frame};
use self::measure::{GlyphMeasurer, TextMeasurer};

// ── Options ─────────────────────────────────────────────────────────────

/// Per-call compile options.
pub struct CompileOptions<'a> {
    /// Force both debug guide overlays on, regardless of template defaults.
    pub debug: bool,
    /// Boundary override for the template's missing-variable policy.
    pub missing_variables_override: Option<MissingVarPolicy>,
    /// Macro resolution context: clock, context ids, counter source.
    pub macros: MacroContext<'a>,
    /// Substitute text measurer; the default estimates a glyph per font
    /// cell width.
    pub measurer: Option<&'a dyn TextMeasurer>,
}

impl Default for CompileOptions<'_> {
    fn default() -> Self {
        Self {
            debug: false,
            missing_variables_override: None,
            macros: MacroContext::local_now(),
            measurer: None,
        }
    }
}

// ── Entry points ────────────────────────────────────────────────────────

/// Compile a parsed template against a render target.
///
/// The document is expected to have passed schema validation (or to have
/// been constructed programmatically); structural invariants are enforced
/// here in either case.
pub fn compile(
    doc: &TemplateDocument,
    target: &RenderTarget,
    variables: &BTreeMap<String, String>,
    options: &CompileOptions<'_>,
) -> Result<String, CompileError> {
    invariants::check(doc)?;
    let resolved = defaults::resolve(doc)?;

    let policy = options
        .missing_variables_override
        .unwrap_or(resolved.defaults.render.missing_variables);
    let bound = vars::bind(&resolved, variables, &options.macros, policy)?;

    let layout = solver::solve(&bound.layout, target)?;

    let default_measurer = GlyphMeasurer;
    let ctx = EmitCtx {
        dpi: target.dpi,
        origin: target.origin_dots(),
        measurer: options.measurer.unwrap_or(&default_measurer),
    };

    let render = &bound.defaults.render;
    let flags = OverlayFlags {
        padding_guides: render.debug_padding_guides || options.debug,
        gutter_guides: render.debug_gutter_guides || options.debug,
    };

    let mut overlays = Vec::new();
    let mut fields = Vec::new();
    emit_node(
        &bound.layout,
        &layout.root,
        &ctx,
        &flags,
        &mut overlays,
        &mut fields,
    )?;

    Ok(assemble(&overlays, &fields, render.emit_ci28))
}

/// Parse a JSON template and compile it in one call.
pub fn compile_str(
    template_json: &str,
    target: &RenderTarget,
    variables: &BTreeMap<String, String>,
    options: &CompileOptions<'_>,
) -> Result<String, CompileError> {
    let doc = schema::parse_document_str(template_json)?;
    compile(&doc, target, variables, options)
}

/// Parse, validate, and solve a template without emitting ZPL. Backs the
/// layout inspection surface.
pub fn solve_str(template_json: &str, target: &RenderTarget) -> Result<LayoutTree, CompileError> {
    let doc = schema::parse_document_str(template_json)?;
    invariants::check(&doc)?;
    let resolved = defaults::resolve(&doc)?;
    solver::solve(&resolved.layout, target)
}

// ── Field emission ──────────────────────────────────────────────────────

/// Shared emission context handed to the per-element compilers.
pub(crate) struct EmitCtx<'a> {
    /// Target resolution.
    pub(crate) dpi: u32,
    /// Target origin offset in dots.
    pub(crate) origin: (i32, i32),
    /// Text measurement capability.
    pub(crate) measurer: &'a dyn TextMeasurer,
}

struct OverlayFlags {
    padding_guides: bool,
    gutter_guides: bool,
}

/// Walk the bound template tree and the solved layout tree in lockstep,
/// emitting overlay and content fields.
fn emit_node(
    node: &Node,
    layout: &LayoutNode,
    ctx: &EmitCtx<'_>,
    flags: &OverlayFlags,
    overlays: &mut Vec<String>,
    fields: &mut Vec<String>,
) -> Result<(), CompileError> {
    match (node, &layout.detail) {
        (Node::Split(split), LayoutDetail::Split { gutter, divider, children }) => {
            if flags.gutter_guides
                && let Some(gutter_rect) = gutter
            {
                overlays.push(frame(*gutter_rect, ctx.origin));
            }
            if let Some(divider_rect) = divider {
                fields.push(filled_bar(*divider_rect, ctx.origin));
            }
            for (child, child_layout) in split.children.iter().zip(children) {
                emit_node(child, child_layout, ctx, flags, overlays, fields)?;
            }
            Ok(())
        }
        (Node::Leaf(leaf), LayoutDetail::Leaf { content }) => {
            if flags.padding_guides || leaf.debug_border {
                overlays.push(frame(*content, ctx.origin));
            }
            let element_path = layout.path.join("elements").index(0);
            let element = leaf.elements.first().ok_or_else(|| {
                CompileError::invariant(layout.path.clone(), "leaf has no element")
            })?;
            fields.push(compile_element(element, *content, ctx, &element_path)?);
            Ok(())
        }
        // The layout tree is derived from this very template tree, so the
        // variants cannot disagree.
        _ => Err(CompileError::layout(
            layout.path.clone(),
            "layout tree does not match template tree",
        )),
    }
}

fn compile_element(
    element: &Element,
    content: Rect,
    ctx: &EmitCtx<'_>,
    path: &NodePath,
) -> Result<String, CompileError> {
    let box_rect = element_box(element, content, ctx.dpi, path)?;
    match element {
        Element::Text(e) => text::compile_text(e, box_rect, ctx, path),
        Element::Qr(e) => qr::compile_qr(e, box_rect, ctx, path),
        Element::Datamatrix(e) => datamatrix::compile_datamatrix(e, box_rect, ctx, path),
        Element::Line(e) => line::compile_line(e, box_rect, ctx, path),
        Element::Image(_) => Err(CompileError::unsupported(
            path.clone(),
            "image elements are not supported in v1",
        )),
    }
}

/// Compute the element box: content rect minus element padding, with
/// min/max size enforcement.
fn element_box(
    element: &Element,
    content: Rect,
    dpi: u32,
    path: &NodePath,
) -> Result<Rect, CompileError> {
    let common = element.common();
    let mut box_rect = content.inset(padding_to_dots(common.padding_mm, dpi));
    if !box_rect.is_valid() {
        return Err(CompileError::layout(
            path.clone(),
            format!(
                "element padding leaves a negative box ({} x {} dots)",
                box_rect.w, box_rect.h
            ),
        ));
    }

    if let Some([min_w_mm, min_h_mm]) = common.min_size_mm {
        let min_w = crate::layout::units::mm_to_dots(min_w_mm, dpi);
        let min_h = crate::layout::units::mm_to_dots(min_h_mm, dpi);
        if box_rect.w < min_w || box_rect.h < min_h {
            return Err(CompileError::layout(
                path.clone(),
                format!(
                    "element box ({} x {} dots) is smaller than min_size \
                     ({min_w} x {min_h} dots)",
                    box_rect.w, box_rect.h
                ),
            ));
        }
    }

    if let Some([max_w_mm, max_h_mm]) = common.max_size_mm {
        let max_w = crate::layout::units::mm_to_dots(max_w_mm, dpi);
        let max_h = crate::layout::units::mm_to_dots(max_h_mm, dpi);
        if box_rect.w > max_w {
            box_rect.x += (box_rect.w - max_w) / 2;
            box_rect.w = max_w;
        }
        if box_rect.h > max_h {
            box_rect.y += (box_rect.h - max_h) / 2;
            box_rect.h = max_h;
        }
    }

    if !box_rect.is_drawable() {
        return Err(CompileError::layout(
            path.clone(),
            format!(
                "element box is not drawable ({} x {} dots)",
                box_rect.w, box_rect.h
            ),
        ));
    }
    Ok(box_rect)
}

/// Horizontal offset of `content` inside a container per `align`.
pub(crate) fn align_offset(align: AlignH, container: i32, content: i32) -> i32 {
    match align {
        AlignH::Left => 0,
        AlignH::Center => (container - content) / 2,
        AlignH::Right => container - content,
    }
}
