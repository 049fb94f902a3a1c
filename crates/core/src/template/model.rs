//! The typed template tree.
//!
//! Mergeable element fields are `Option` so the defaults resolver can tell
//! "explicitly set" apart from "inherit". Accessor methods return the
//! effective value with the documented v1 fallback, so downstream stages
//! never re-dispatch on unspecified fields.

use serde::Serialize;

/// The template schema version this crate implements.
pub const SCHEMA_VERSION: u32 = 1;

/// DataMatrix symbol quality. v1 supports ECC 200 only.
pub const DATAMATRIX_QUALITY: u32 = 200;

// ── Document ────────────────────────────────────────────────────────────

/// A parsed label template: a named layout tree plus document defaults.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TemplateDocument {
    /// Schema version; must equal [`SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Identifier only; not rendered.
    pub name: Option<String>,
    /// Document-level defaults folded into the tree by the resolver.
    pub defaults: Defaults,
    /// Root of the layout tree.
    pub layout: Node,
}

// ── Nodes ───────────────────────────────────────────────────────────────

/// A node in the layout tree, discriminated by `kind` in the JSON form.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// A binary split of the parent rectangle.
    Split(SplitNode),
    /// A leaf holding exactly one element.
    Leaf(LeafNode),
}

impl Node {
    /// The node's optional alias, regardless of variant.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Node::Split(s) => s.alias.as_deref(),
            Node::Leaf(l) => l.alias.as_deref(),
        }
    }
}

/// Split axis. `v` cuts the parent vertically (children side by side),
/// `h` cuts horizontally (children stacked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Vertical cut: children are left and right.
    V,
    /// Horizontal cut: children are top and bottom.
    H,
}

/// Optional visible line centred inside a split's gutter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Divider {
    /// Whether the divider is drawn.
    pub visible: bool,
    /// Line thickness in millimetres; must be > 0.
    pub thickness_mm: f64,
}

/// A binary split node.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SplitNode {
    /// Split axis.
    pub direction: Direction,
    /// Share of the available length given to the first child; open (0, 1).
    pub ratio: f64,
    /// Spacing between the two children in millimetres.
    pub gutter_mm: f64,
    /// Optional divider drawn inside the gutter.
    pub divider: Option<Divider>,
    /// Optional unique alias for this node.
    pub alias: Option<String>,
    /// Exactly two children.
    pub children: Vec<Node>,
}

/// A leaf node holding one element.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeafNode {
    /// Padding in millimetres as `[top, right, bottom, left]`. `None` until
    /// the defaults resolver runs; resolved leaves always carry a value.
    pub padding_mm: Option<[f64; 4]>,
    /// Emit a one-dot frame around the leaf content rect.
    pub debug_border: bool,
    /// Optional unique alias for this node.
    pub alias: Option<String>,
    /// The leaf's elements. Structurally validated to hold exactly one.
    pub elements: Vec<Element>,
}

impl LeafNode {
    /// Effective padding; zero until resolved.
    pub fn padding(&self) -> [f64; 4] {
        self.padding_mm.unwrap_or([0.0; 4])
    }
}

// ── Elements ────────────────────────────────────────────────────────────

/// Fields shared by every element variant.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ElementCommon {
    /// Optional caller-chosen identifier; not rendered.
    pub id: Option<String>,
    /// Element padding in millimetres as `[top, right, bottom, left]`.
    pub padding_mm: [f64; 4],
    /// Minimum element box size `[w, h]` in millimetres; compilation fails
    /// if the computed box is smaller in either dimension.
    pub min_size_mm: Option<[f64; 2]>,
    /// Maximum element box size `[w, h]` in millimetres; the box is shrunk
    /// to fit and centred inside its pre-shrink rect.
    pub max_size_mm: Option<[f64; 2]>,
    /// Opaque extension mapping, preserved but ignored.
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

/// A leaf element, discriminated by `type` in the JSON form.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// A text field.
    Text(TextElement),
    /// A QR code (model 2).
    Qr(QrElement),
    /// A DataMatrix symbol (ECC 200).
    Datamatrix(DataMatrixElement),
    /// A straight line.
    Line(LineElement),
    /// An image reference. Recognised by the schema but rejected by the
    /// compiler: v1 emits no image command.
    Image(ImageElement),
}

impl Element {
    /// The shared fields of any variant.
    pub fn common(&self) -> &ElementCommon {
        match self {
            Element::Text(e) => &e.common,
            Element::Qr(e) => &e.common,
            Element::Datamatrix(e) => &e.common,
            Element::Line(e) => &e.common,
            Element::Image(e) => &e.common,
        }
    }

    /// The JSON discriminator value for this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Element::Text(_) => "text",
            Element::Qr(_) => "qr",
            Element::Datamatrix(_) => "datamatrix",
            Element::Line(_) => "line",
            Element::Image(_) => "image",
        }
    }
}

// ── Shared element enums ────────────────────────────────────────────────

/// Horizontal alignment of content inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignH {
    /// Flush left.
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
}

/// Vertical alignment of content inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignV {
    /// Flush top.
    Top,
    /// Centred.
    Center,
    /// Flush bottom.
    Bottom,
}

/// Sizing policy for 2-D codes: `fixed` uses the configured size, `max`
/// grows the symbol to the largest size that fits the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Use the configured magnification / module size.
    Fixed,
    /// Grow to the largest size that fits.
    Max,
}

// ── Text ────────────────────────────────────────────────────────────────

/// Line wrapping mode for text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// No wrapping; only explicit line breaks.
    None,
    /// Greedy word wrapping at the box width.
    Word,
    /// Hard character wrapping at the box width.
    Char,
}

/// Overflow policy for text that exceeds its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Emit without a field block; the printer renders past the box.
    Overflow,
    /// Emit with a field block; overflow past `max_lines` is printer-clipped.
    Wrap,
    /// Iteratively shrink the font until the wrapped text fits the box.
    ShrinkToFit,
    /// Truncate the content to `max_lines` before emission.
    Truncate,
}

/// Mergeable text styling: present on text elements and in `defaults.text`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TextStyle {
    /// Font cell height in millimetres; required after defaults resolution.
    pub font_height_mm: Option<f64>,
    /// Font cell width in millimetres; defaults to the height.
    pub font_width_mm: Option<f64>,
    /// Wrapping mode. v1 default: `none`.
    pub wrap: Option<WrapMode>,
    /// Fit policy. v1 default: `overflow`.
    pub fit: Option<FitMode>,
    /// Maximum rendered lines, ≥ 1. v1 default: 1.
    pub max_lines: Option<u32>,
    /// Horizontal alignment. v1 default: `left`.
    pub align_h: Option<AlignH>,
    /// Vertical alignment. v1 default: `top`.
    pub align_v: Option<AlignV>,
}

impl TextStyle {
    /// Merge another style underneath this one (`self` wins on conflict).
    pub fn merge_under(&mut self, base: &TextStyle) {
        self.font_height_mm = self.font_height_mm.or(base.font_height_mm);
        self.font_width_mm = self.font_width_mm.or(base.font_width_mm);
        self.wrap = self.wrap.or(base.wrap);
        self.fit = self.fit.or(base.fit);
        self.max_lines = self.max_lines.or(base.max_lines);
        self.align_h = self.align_h.or(base.align_h);
        self.align_v = self.align_v.or(base.align_v);
    }
}

/// A text element.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TextElement {
    /// Shared element fields.
    #[serde(flatten)]
    pub common: ElementCommon,
    /// The text content, with `{placeholder}` substitution and `\n` line
    /// breaks mapping to the ZPL newline control.
    pub text: String,
    /// Styling, merged with `defaults.text` by the resolver.
    #[serde(flatten)]
    pub style: TextStyle,
}

impl TextElement {
    /// Effective wrap mode.
    pub fn wrap(&self) -> WrapMode {
        self.style.wrap.unwrap_or(WrapMode::None)
    }

    /// Effective fit policy.
    pub fn fit(&self) -> FitMode {
        self.style.fit.unwrap_or(FitMode::Overflow)
    }

    /// Effective maximum line count.
    pub fn max_lines(&self) -> u32 {
        self.style.max_lines.unwrap_or(1).max(1)
    }

    /// Effective horizontal alignment.
    pub fn align_h(&self) -> AlignH {
        self.style.align_h.unwrap_or(AlignH::Left)
    }

    /// Effective vertical alignment.
    pub fn align_v(&self) -> AlignV {
        self.style.align_v.unwrap_or(AlignV::Top)
    }

    /// Effective font width in millimetres; falls back to the height.
    pub fn font_width_mm(&self) -> Option<f64> {
        self.style.font_width_mm.or(self.style.font_height_mm)
    }
}

// ── QR ──────────────────────────────────────────────────────────────────

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EcLevel {
    /// ~7% recovery.
    L,
    /// ~15% recovery (v1 default).
    M,
    /// ~25% recovery.
    Q,
    /// ~30% recovery.
    H,
}

impl EcLevel {
    /// The single-letter ZPL code for this level.
    pub fn code(&self) -> char {
        match self {
            EcLevel::L => 'L',
            EcLevel::M => 'M',
            EcLevel::Q => 'Q',
            EcLevel::H => 'H',
        }
    }
}

/// QR data input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QrInputMode {
    /// Automatic: the printer picks the densest encoding.
    A,
    /// Manual: the character mode is stated explicitly.
    M,
}

/// QR character mode, required when the input mode is manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QrCharacterMode {
    /// Numeric data only.
    N,
    /// Alphanumeric data.
    A,
}

impl QrCharacterMode {
    /// The single-letter ZPL code for this mode.
    pub fn code(&self) -> char {
        match self {
            QrCharacterMode::N => 'N',
            QrCharacterMode::A => 'A',
        }
    }
}

/// A QR code element. Model is fixed to 2.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QrElement {
    /// Shared element fields.
    #[serde(flatten)]
    pub common: ElementCommon,
    /// The encoded data, with `{placeholder}` substitution.
    pub data: String,
    /// Explicit magnification in [1, 10]; absent means auto by DPI.
    pub magnification: Option<u32>,
    /// Sizing policy, merged with `defaults.code2d`.
    pub size_mode: Option<SizeMode>,
    /// Error correction level; default `M`.
    pub error_correction: Option<EcLevel>,
    /// Input mode; default automatic.
    pub input_mode: Option<QrInputMode>,
    /// Character mode; required iff the input mode is manual.
    pub character_mode: Option<QrCharacterMode>,
    /// Quiet zone in millimetres, merged with `defaults.code2d`.
    pub quiet_zone_mm: Option<f64>,
    /// Horizontal alignment inside the box; default centred.
    pub align_h: Option<AlignH>,
    /// Vertical alignment inside the box; default centred.
    pub align_v: Option<AlignV>,
}

impl QrElement {
    /// Effective sizing policy.
    pub fn size_mode(&self) -> SizeMode {
        self.size_mode.unwrap_or(SizeMode::Fixed)
    }

    /// Effective error correction level.
    pub fn error_correction(&self) -> EcLevel {
        self.error_correction.unwrap_or(EcLevel::M)
    }

    /// Effective input mode.
    pub fn input_mode(&self) -> QrInputMode {
        self.input_mode.unwrap_or(QrInputMode::A)
    }

    /// Effective quiet zone in millimetres.
    pub fn quiet_zone_mm(&self) -> f64 {
        self.quiet_zone_mm.unwrap_or(0.0)
    }

    /// Effective horizontal alignment.
    pub fn align_h(&self) -> AlignH {
        self.align_h.unwrap_or(AlignH::Center)
    }

    /// Effective vertical alignment.
    pub fn align_v(&self) -> AlignV {
        self.align_v.unwrap_or(AlignV::Center)
    }
}

// ── DataMatrix ──────────────────────────────────────────────────────────

/// A DataMatrix element. Quality is fixed to ECC 200.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataMatrixElement {
    /// Shared element fields.
    #[serde(flatten)]
    pub common: ElementCommon,
    /// The encoded data, with `{placeholder}` substitution.
    pub data: String,
    /// Module edge length in millimetres; default 0.5.
    pub module_size_mm: Option<f64>,
    /// Sizing policy, merged with `defaults.code2d`. `max` requires
    /// explicit `columns` and `rows`.
    pub size_mode: Option<SizeMode>,
    /// Symbol columns in [0, 49]; 0 means printer auto-sizing.
    pub columns: Option<u32>,
    /// Symbol rows in [0, 49]; 0 means printer auto-sizing.
    pub rows: Option<u32>,
    /// Format id in [0, 6]; default 6.
    pub format_id: Option<u32>,
    /// Escape character for control sequences in the data; default `_`.
    pub escape_char: Option<char>,
    /// Quiet zone in millimetres, merged with `defaults.code2d`.
    pub quiet_zone_mm: Option<f64>,
    /// Horizontal alignment inside the box; default centred.
    pub align_h: Option<AlignH>,
    /// Vertical alignment inside the box; default centred.
    pub align_v: Option<AlignV>,
}

impl DataMatrixElement {
    /// Effective module size in millimetres.
    pub fn module_size_mm(&self) -> f64 {
        self.module_size_mm.unwrap_or(0.5)
    }

    /// Effective sizing policy.
    pub fn size_mode(&self) -> SizeMode {
        self.size_mode.unwrap_or(SizeMode::Fixed)
    }

    /// Effective column count; 0 means auto.
    pub fn columns(&self) -> u32 {
        self.columns.unwrap_or(0)
    }

    /// Effective row count; 0 means auto.
    pub fn rows(&self) -> u32 {
        self.rows.unwrap_or(0)
    }

    /// Effective format id.
    pub fn format_id(&self) -> u32 {
        self.format_id.unwrap_or(6)
    }

    /// Effective escape character.
    pub fn escape_char(&self) -> char {
        self.escape_char.unwrap_or('_')
    }

    /// Effective quiet zone in millimetres.
    pub fn quiet_zone_mm(&self) -> f64 {
        self.quiet_zone_mm.unwrap_or(0.0)
    }

    /// Effective horizontal alignment.
    pub fn align_h(&self) -> AlignH {
        self.align_h.unwrap_or(AlignH::Center)
    }

    /// Effective vertical alignment.
    pub fn align_v(&self) -> AlignV {
        self.align_v.unwrap_or(AlignV::Center)
    }
}

// ── Line ────────────────────────────────────────────────────────────────

/// Orientation of a line element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOrientation {
    /// Spans the box width.
    H,
    /// Spans the box height.
    V,
}

/// Position of a line along the axis perpendicular to its orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAlign {
    /// Top (horizontal) or left (vertical) edge.
    Start,
    /// Centred.
    Center,
    /// Bottom (horizontal) or right (vertical) edge.
    End,
}

/// A straight-line element, emitted as a filled graphic box.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LineElement {
    /// Shared element fields.
    #[serde(flatten)]
    pub common: ElementCommon,
    /// Line orientation.
    pub orientation: LineOrientation,
    /// Line thickness in millimetres; must be > 0.
    pub thickness_mm: f64,
    /// Position perpendicular to the orientation; default centred.
    pub align: Option<LineAlign>,
}

impl LineElement {
    /// Effective alignment.
    pub fn align(&self) -> LineAlign {
        self.align.unwrap_or(LineAlign::Center)
    }
}

// ── Image ───────────────────────────────────────────────────────────────

/// Source descriptor of an image element.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageSource {
    /// Source data reference, with `{placeholder}` substitution.
    pub data: String,
    /// Optional source format hint.
    pub format: Option<String>,
}

/// An image element. Parsed and bound but rejected at compile time: v1
/// emits no image command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageElement {
    /// Shared element fields.
    #[serde(flatten)]
    pub common: ElementCommon,
    /// Image source descriptor.
    pub source: ImageSource,
}

// ── Defaults ────────────────────────────────────────────────────────────

/// Policy for placeholders that resolve to no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingVarPolicy {
    /// Fail the compile with a missing-variable error.
    #[default]
    Error,
    /// Substitute the empty string.
    Empty,
}

/// Defaults merged into QR and DataMatrix elements.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Code2dDefaults {
    /// Default quiet zone in millimetres.
    pub quiet_zone_mm: Option<f64>,
    /// Default sizing policy.
    pub size_mode: Option<SizeMode>,
    /// Default horizontal alignment.
    pub align_h: Option<AlignH>,
    /// Default vertical alignment.
    pub align_v: Option<AlignV>,
    /// Accepted for forward compatibility; no v1 element consumes it.
    pub render_mode: Option<String>,
}

/// Render-stage policy defaults.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderDefaults {
    /// Missing-variable policy; default `error`.
    pub missing_variables: MissingVarPolicy,
    /// Emit the `^CI28` UTF-8 directive; default true.
    pub emit_ci28: bool,
    /// Emit thin frames around every leaf content rect.
    pub debug_padding_guides: bool,
    /// Emit thin frames over every split gutter.
    pub debug_gutter_guides: bool,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            missing_variables: MissingVarPolicy::Error,
            emit_ci28: true,
            debug_padding_guides: false,
            debug_gutter_guides: false,
        }
    }
}

/// Document-level defaults.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Defaults {
    /// Padding inherited by leaves that declare none.
    pub leaf_padding_mm: Option<[f64; 4]>,
    /// Defaults merged into every text element.
    pub text: TextStyle,
    /// Defaults merged into QR and DataMatrix elements.
    pub code2d: Code2dDefaults,
    /// Defaults for image elements; accepted opaquely, unused in v1.
    pub image: serde_json::Map<String, serde_json::Value>,
    /// Render-stage policies.
    pub render: RenderDefaults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_style_merge_element_wins() {
        let mut style = TextStyle {
            font_height_mm: Some(4.0),
            align_h: Some(AlignH::Right),
            ..TextStyle::default()
        };
        let base = TextStyle {
            font_height_mm: Some(2.0),
            font_width_mm: Some(1.8),
            wrap: Some(WrapMode::Word),
            ..TextStyle::default()
        };
        style.merge_under(&base);
        assert_eq!(style.font_height_mm, Some(4.0));
        assert_eq!(style.font_width_mm, Some(1.8));
        assert_eq!(style.wrap, Some(WrapMode::Word));
        assert_eq!(style.align_h, Some(AlignH::Right));
    }

    #[test]
    fn text_font_width_falls_back_to_height() {
        let el = TextElement {
            common: ElementCommon::default(),
            text: String::new(),
            style: TextStyle {
                font_height_mm: Some(3.0),
                ..TextStyle::default()
            },
        };
        assert_eq!(el.font_width_mm(), Some(3.0));
    }

    #[test]
    fn render_defaults_match_v1_policy() {
        let d = RenderDefaults::default();
        assert_eq!(d.missing_variables, MissingVarPolicy::Error);
        assert!(d.emit_ci28);
        assert!(!d.debug_padding_guides);
        assert!(!d.debug_gutter_guides);
    }

    #[test]
    fn datamatrix_effective_defaults() {
        let el = DataMatrixElement {
            common: ElementCommon::default(),
            data: String::new(),
            module_size_mm: None,
            size_mode: None,
            columns: None,
            rows: None,
            format_id: None,
            escape_char: None,
            quiet_zone_mm: None,
            align_h: None,
            align_v: None,
        };
        assert_eq!(el.module_size_mm(), 0.5);
        assert_eq!(el.size_mode(), SizeMode::Fixed);
        assert_eq!(el.columns(), 0);
        assert_eq!(el.rows(), 0);
        assert_eq!(el.format_id(), 6);
        assert_eq!(el.escape_char(), '_');
    }
}
