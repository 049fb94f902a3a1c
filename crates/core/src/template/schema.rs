//! Phase A validation: structural shape against the v1 template schema.
//!
//! The walk over raw [`serde_json::Value`] is hand-rolled so every failure
//! is path-qualified (`layout/children/1/ratio: …`) and unknown keys are
//! rejected everywhere except inside `extensions`. The walk constructs the
//! typed model directly; phase B ([`super::invariants`]) then enforces the
//! cross-field rules the schema cannot express.

use serde_json::{Map, Value};
use zplgrid_diagnostics::{CompileError, NodePath};

use super::model::{
    AlignH, AlignV, Code2dDefaults, DATAMATRIX_QUALITY, DataMatrixElement, Defaults, Direction,
    Divider, EcLevel, Element, ElementCommon, FitMode, ImageElement, ImageSource, LeafNode,
    LineAlign, LineElement, LineOrientation, MissingVarPolicy, Node, QrCharacterMode, QrElement,
    QrInputMode, RenderDefaults, SCHEMA_VERSION, SizeMode, SplitNode, TemplateDocument,
    TextElement, TextStyle, WrapMode,
};

type Result<T> = std::result::Result<T, CompileError>;

// ── Entry points ────────────────────────────────────────────────────────

/// Parse and shape-validate a template document from JSON text.
pub fn parse_document_str(input: &str) -> Result<TemplateDocument> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| CompileError::schema(NodePath::root(), format!("invalid JSON: {e}")))?;
    parse_document(&value)
}

/// Parse and shape-validate a template document from a parsed JSON value.
pub fn parse_document(value: &Value) -> Result<TemplateDocument> {
    let path = NodePath::root();
    let map = as_object(value, &path)?;
    check_keys(map, &["schema_version", "name", "defaults", "layout"], &path)?;

    let version = req_u32(map, "schema_version", &path)?;
    if version != SCHEMA_VERSION {
        return Err(CompileError::schema(
            path.join("schema_version"),
            format!("unsupported schema version {version}, expected {SCHEMA_VERSION}"),
        ));
    }

    let name = opt_string(map, "name", &path)?;

    let defaults = match map.get("defaults") {
        Some(v) => parse_defaults(v, &path.join("defaults"))?,
        None => Defaults::default(),
    };

    let layout_value = map.get("layout").ok_or_else(|| {
        CompileError::schema(path.clone(), "missing required field `layout`")
    })?;
    let layout = parse_node(layout_value, &NodePath::new("layout"))?;

    Ok(TemplateDocument {
        schema_version: version,
        name,
        defaults,
        layout,
    })
}

// ── Nodes ───────────────────────────────────────────────────────────────

fn parse_node(value: &Value, path: &NodePath) -> Result<Node> {
    let map = as_object(value, path)?;
    let kind = req_string(map, "kind", path)?;
    match kind.as_str() {
        "split" => parse_split(map, path).map(Node::Split),
        "leaf" => parse_leaf(map, path).map(Node::Leaf),
        other => Err(CompileError::schema(
            path.join("kind"),
            format!("unknown node kind `{other}`, expected `split` or `leaf`"),
        )),
    }
}

fn parse_split(map: &Map<String, Value>, path: &NodePath) -> Result<SplitNode> {
    check_keys(
        map,
        &[
            "kind",
            "direction",
            "ratio",
            "gutter_mm",
            "divider",
            "children",
            "alias",
        ],
        path,
    )?;

    let direction = req_enum(
        map,
        "direction",
        path,
        &[("v", Direction::V), ("h", Direction::H)],
    )?;

    let ratio = req_f64(map, "ratio", path)?;
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(CompileError::schema(
            path.join("ratio"),
            format!("ratio must be in the open interval (0, 1), got {ratio}"),
        ));
    }

    let gutter_mm = opt_f64(map, "gutter_mm", path)?.unwrap_or(0.0);
    if gutter_mm < 0.0 {
        return Err(CompileError::schema(
            path.join("gutter_mm"),
            format!("gutter_mm must be >= 0, got {gutter_mm}"),
        ));
    }

    let divider = match map.get("divider") {
        Some(v) => Some(parse_divider(v, &path.join("divider"))?),
        None => None,
    };

    let children_value = map
        .get("children")
        .ok_or_else(|| CompileError::schema(path.clone(), "missing required field `children`"))?;
    let children_path = path.join("children");
    let Value::Array(items) = children_value else {
        return Err(CompileError::schema(children_path, "expected an array"));
    };
    if items.len() != 2 {
        return Err(CompileError::schema(
            children_path,
            format!("split must have exactly 2 children, got {}", items.len()),
        ));
    }
    let children = items
        .iter()
        .enumerate()
        .map(|(i, v)| parse_node(v, &children_path.index(i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(SplitNode {
        direction,
        ratio,
        gutter_mm,
        divider,
        alias: opt_string(map, "alias", path)?,
        children,
    })
}

fn parse_divider(value: &Value, path: &NodePath) -> Result<Divider> {
    let map = as_object(value, path)?;
    check_keys(map, &["visible", "thickness_mm"], path)?;
    let visible = req_bool(map, "visible", path)?;
    let thickness_mm = req_f64(map, "thickness_mm", path)?;
    if thickness_mm <= 0.0 {
        return Err(CompileError::schema(
            path.join("thickness_mm"),
            format!("thickness_mm must be > 0, got {thickness_mm}"),
        ));
    }
    Ok(Divider {
        visible,
        thickness_mm,
    })
}

fn parse_leaf(map: &Map<String, Value>, path: &NodePath) -> Result<LeafNode> {
    check_keys(
        map,
        &["kind", "padding_mm", "debug_border", "elements", "alias"],
        path,
    )?;

    let padding_mm = opt_mm4(map, "padding_mm", path)?;
    let debug_border = opt_bool(map, "debug_border", path)?.unwrap_or(false);

    let elements_value = map
        .get("elements")
        .ok_or_else(|| CompileError::schema(path.clone(), "missing required field `elements`"))?;
    let elements_path = path.join("elements");
    let Value::Array(items) = elements_value else {
        return Err(CompileError::schema(elements_path, "expected an array"));
    };
    let elements = items
        .iter()
        .enumerate()
        .map(|(i, v)| parse_element(v, &elements_path.index(i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(LeafNode {
        padding_mm,
        debug_border,
        alias: opt_string(map, "alias", path)?,
        elements,
    })
}

// ── Elements ────────────────────────────────────────────────────────────

const COMMON_KEYS: &[&str] = &["id", "padding_mm", "min_size_mm", "max_size_mm", "extensions"];

fn parse_element(value: &Value, path: &NodePath) -> Result<Element> {
    let map = as_object(value, path)?;
    let ty = req_string(map, "type", path)?;
    match ty.as_str() {
        "text" => parse_text(map, path).map(Element::Text),
        "qr" => parse_qr(map, path).map(Element::Qr),
        "datamatrix" => parse_datamatrix(map, path).map(Element::Datamatrix),
        "line" => parse_line(map, path).map(Element::Line),
        "image" => parse_image(map, path).map(Element::Image),
        other => Err(CompileError::schema(
            path.join("type"),
            format!(
                "unknown element type `{other}`, expected one of \
                 `text`, `qr`, `datamatrix`, `line`, `image`"
            ),
        )),
    }
}

fn parse_common(map: &Map<String, Value>, path: &NodePath) -> Result<ElementCommon> {
    let extensions = match map.get("extensions") {
        Some(Value::Object(ext)) => ext.clone(),
        Some(_) => {
            return Err(CompileError::schema(
                path.join("extensions"),
                "expected an object",
            ));
        }
        None => Map::new(),
    };
    Ok(ElementCommon {
        id: opt_string(map, "id", path)?,
        padding_mm: opt_mm4(map, "padding_mm", path)?.unwrap_or([0.0; 4]),
        min_size_mm: opt_mm2(map, "min_size_mm", path)?,
        max_size_mm: opt_mm2(map, "max_size_mm", path)?,
        extensions,
    })
}

fn allowed_with_common(extra: &[&'static str]) -> Vec<&'static str> {
    let mut keys = vec!["type"];
    keys.extend_from_slice(COMMON_KEYS);
    keys.extend_from_slice(extra);
    keys
}

fn parse_text(map: &Map<String, Value>, path: &NodePath) -> Result<TextElement> {
    check_keys(
        map,
        &allowed_with_common(&[
            "text",
            "font_height_mm",
            "font_width_mm",
            "wrap",
            "fit",
            "max_lines",
            "align_h",
            "align_v",
        ]),
        path,
    )?;
    Ok(TextElement {
        common: parse_common(map, path)?,
        text: req_string(map, "text", path)?,
        style: parse_text_style(map, path)?,
    })
}

fn parse_text_style(map: &Map<String, Value>, path: &NodePath) -> Result<TextStyle> {
    let font_height_mm = opt_f64(map, "font_height_mm", path)?;
    if let Some(h) = font_height_mm
        && h <= 0.0
    {
        return Err(CompileError::schema(
            path.join("font_height_mm"),
            format!("font_height_mm must be > 0, got {h}"),
        ));
    }
    let font_width_mm = opt_f64(map, "font_width_mm", path)?;
    if let Some(w) = font_width_mm
        && w <= 0.0
    {
        return Err(CompileError::schema(
            path.join("font_width_mm"),
            format!("font_width_mm must be > 0, got {w}"),
        ));
    }
    let max_lines = opt_u32(map, "max_lines", path)?;
    if let Some(n) = max_lines
        && n < 1
    {
        return Err(CompileError::schema(
            path.join("max_lines"),
            "max_lines must be >= 1",
        ));
    }
    Ok(TextStyle {
        font_height_mm,
        font_width_mm,
        wrap: opt_enum(
            map,
            "wrap",
            path,
            &[
                ("none", WrapMode::None),
                ("word", WrapMode::Word),
                ("char", WrapMode::Char),
            ],
        )?,
        fit: opt_enum(
            map,
            "fit",
            path,
            &[
                ("overflow", FitMode::Overflow),
                ("wrap", FitMode::Wrap),
                ("shrink_to_fit", FitMode::ShrinkToFit),
                ("truncate", FitMode::Truncate),
            ],
        )?,
        max_lines,
        align_h: opt_align_h(map, path)?,
        align_v: opt_align_v(map, path)?,
    })
}

fn parse_qr(map: &Map<String, Value>, path: &NodePath) -> Result<QrElement> {
    check_keys(
        map,
        &allowed_with_common(&[
            "data",
            "magnification",
            "size_mode",
            "error_correction",
            "input_mode",
            "character_mode",
            "quiet_zone_mm",
            "align_h",
            "align_v",
        ]),
        path,
    )?;

    let magnification = opt_u32(map, "magnification", path)?;
    if let Some(m) = magnification
        && !(1..=10).contains(&m)
    {
        return Err(CompileError::schema(
            path.join("magnification"),
            format!("magnification must be in [1, 10], got {m}"),
        ));
    }

    Ok(QrElement {
        common: parse_common(map, path)?,
        data: req_string(map, "data", path)?,
        magnification,
        size_mode: opt_size_mode(map, path)?,
        error_correction: opt_enum(
            map,
            "error_correction",
            path,
            &[
                ("L", EcLevel::L),
                ("M", EcLevel::M),
                ("Q", EcLevel::Q),
                ("H", EcLevel::H),
            ],
        )?,
        input_mode: opt_enum(
            map,
            "input_mode",
            path,
            &[("A", QrInputMode::A), ("M", QrInputMode::M)],
        )?,
        character_mode: opt_enum(
            map,
            "character_mode",
            path,
            &[("N", QrCharacterMode::N), ("A", QrCharacterMode::A)],
        )?,
        quiet_zone_mm: opt_quiet_zone(map, path)?,
        align_h: opt_align_h(map, path)?,
        align_v: opt_align_v(map, path)?,
    })
}

fn parse_datamatrix(map: &Map<String, Value>, path: &NodePath) -> Result<DataMatrixElement> {
    check_keys(
        map,
        &allowed_with_common(&[
            "data",
            "module_size_mm",
            "size_mode",
            "columns",
            "rows",
            "quality",
            "format_id",
            "escape_char",
            "quiet_zone_mm",
            "align_h",
            "align_v",
        ]),
        path,
    )?;

    let module_size_mm = opt_f64(map, "module_size_mm", path)?;
    if let Some(m) = module_size_mm
        && m <= 0.0
    {
        return Err(CompileError::schema(
            path.join("module_size_mm"),
            format!("module_size_mm must be > 0, got {m}"),
        ));
    }

    let columns = opt_u32(map, "columns", path)?;
    if let Some(c) = columns
        && c > 49
    {
        return Err(CompileError::schema(
            path.join("columns"),
            format!("columns must be in [0, 49], got {c}"),
        ));
    }
    let rows = opt_u32(map, "rows", path)?;
    if let Some(r) = rows
        && r > 49
    {
        return Err(CompileError::schema(
            path.join("rows"),
            format!("rows must be in [0, 49], got {r}"),
        ));
    }

    // `quality` is accepted but pinned: v1 is ECC 200 only.
    if let Some(q) = opt_u32(map, "quality", path)?
        && q != DATAMATRIX_QUALITY
    {
        return Err(CompileError::schema(
            path.join("quality"),
            format!("quality must be {DATAMATRIX_QUALITY} (ECC 200), got {q}"),
        ));
    }

    let format_id = opt_u32(map, "format_id", path)?;
    if let Some(f) = format_id
        && f > 6
    {
        return Err(CompileError::schema(
            path.join("format_id"),
            format!("format_id must be in [0, 6], got {f}"),
        ));
    }

    let escape_char = match opt_string(map, "escape_char", path)? {
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => {
                    return Err(CompileError::schema(
                        path.join("escape_char"),
                        format!("escape_char must be exactly one character, got `{s}`"),
                    ));
                }
            }
        }
        None => None,
    };

    Ok(DataMatrixElement {
        common: parse_common(map, path)?,
        data: req_string(map, "data", path)?,
        module_size_mm,
        size_mode: opt_size_mode(map, path)?,
        columns,
        rows,
        format_id,
        escape_char,
        quiet_zone_mm: opt_quiet_zone(map, path)?,
        align_h: opt_align_h(map, path)?,
        align_v: opt_align_v(map, path)?,
    })
}

fn parse_line(map: &Map<String, Value>, path: &NodePath) -> Result<LineElement> {
    check_keys(
        map,
        &allowed_with_common(&["orientation", "thickness_mm", "align"]),
        path,
    )?;
    let thickness_mm = req_f64(map, "thickness_mm", path)?;
    if thickness_mm <= 0.0 {
        return Err(CompileError::schema(
            path.join("thickness_mm"),
            format!("thickness_mm must be > 0, got {thickness_mm}"),
        ));
    }
    Ok(LineElement {
        common: parse_common(map, path)?,
        orientation: req_enum(
            map,
            "orientation",
            path,
            &[("h", LineOrientation::H), ("v", LineOrientation::V)],
        )?,
        thickness_mm,
        align: opt_enum(
            map,
            "align",
            path,
            &[
                ("start", LineAlign::Start),
                ("center", LineAlign::Center),
                ("end", LineAlign::End),
            ],
        )?,
    })
}

fn parse_image(map: &Map<String, Value>, path: &NodePath) -> Result<ImageElement> {
    check_keys(map, &allowed_with_common(&["source"]), path)?;
    let source_value = map
        .get("source")
        .ok_or_else(|| CompileError::schema(path.clone(), "missing required field `source`"))?;
    let source_path = path.join("source");
    let source_map = as_object(source_value, &source_path)?;
    check_keys(source_map, &["data", "format"], &source_path)?;
    Ok(ImageElement {
        common: parse_common(map, path)?,
        source: ImageSource {
            data: req_string(source_map, "data", &source_path)?,
            format: opt_string(source_map, "format", &source_path)?,
        },
    })
}

// ── Defaults ────────────────────────────────────────────────────────────

fn parse_defaults(value: &Value, path: &NodePath) -> Result<Defaults> {
    let map = as_object(value, path)?;
    check_keys(
        map,
        &["leaf_padding_mm", "text", "code2d", "image", "render"],
        path,
    )?;

    let text = match map.get("text") {
        Some(v) => {
            let text_path = path.join("text");
            let text_map = as_object(v, &text_path)?;
            check_keys(
                text_map,
                &[
                    "font_height_mm",
                    "font_width_mm",
                    "wrap",
                    "fit",
                    "max_lines",
                    "align_h",
                    "align_v",
                ],
                &text_path,
            )?;
            parse_text_style(text_map, &text_path)?
        }
        None => TextStyle::default(),
    };

    let code2d = match map.get("code2d") {
        Some(v) => {
            let c_path = path.join("code2d");
            let c_map = as_object(v, &c_path)?;
            check_keys(
                c_map,
                &["quiet_zone_mm", "size_mode", "align_h", "align_v", "render_mode"],
                &c_path,
            )?;
            Code2dDefaults {
                quiet_zone_mm: opt_quiet_zone(c_map, &c_path)?,
                size_mode: opt_size_mode(c_map, &c_path)?,
                align_h: opt_align_h(c_map, &c_path)?,
                align_v: opt_align_v(c_map, &c_path)?,
                render_mode: opt_string(c_map, "render_mode", &c_path)?,
            }
        }
        None => Code2dDefaults::default(),
    };

    // `defaults.image` is accepted opaquely: v1 compiles no image elements,
    // so there is nothing to merge its content into yet.
    let image = match map.get("image") {
        Some(Value::Object(m)) => m.clone(),
        Some(_) => {
            return Err(CompileError::schema(path.join("image"), "expected an object"));
        }
        None => Map::new(),
    };

    let render = match map.get("render") {
        Some(v) => {
            let r_path = path.join("render");
            let r_map = as_object(v, &r_path)?;
            check_keys(
                r_map,
                &[
                    "missing_variables",
                    "emit_ci28",
                    "debug_padding_guides",
                    "debug_gutter_guides",
                ],
                &r_path,
            )?;
            let base = RenderDefaults::default();
            RenderDefaults {
                missing_variables: opt_enum(
                    r_map,
                    "missing_variables",
                    &r_path,
                    &[
                        ("error", MissingVarPolicy::Error),
                        ("empty", MissingVarPolicy::Empty),
                    ],
                )?
                .unwrap_or(base.missing_variables),
                emit_ci28: opt_bool(r_map, "emit_ci28", &r_path)?.unwrap_or(base.emit_ci28),
                debug_padding_guides: opt_bool(r_map, "debug_padding_guides", &r_path)?
                    .unwrap_or(base.debug_padding_guides),
                debug_gutter_guides: opt_bool(r_map, "debug_gutter_guides", &r_path)?
                    .unwrap_or(base.debug_gutter_guides),
            }
        }
        None => RenderDefaults::default(),
    };

    Ok(Defaults {
        leaf_padding_mm: opt_mm4(map, "leaf_padding_mm", path)?,
        text,
        code2d,
        image,
        render,
    })
}

// ── Shared field parsers ────────────────────────────────────────────────

fn opt_align_h(map: &Map<String, Value>, path: &NodePath) -> Result<Option<AlignH>> {
    opt_enum(
        map,
        "align_h",
        path,
        &[
            ("left", AlignH::Left),
            ("center", AlignH::Center),
            ("right", AlignH::Right),
        ],
    )
}

fn opt_align_v(map: &Map<String, Value>, path: &NodePath) -> Result<Option<AlignV>> {
    opt_enum(
        map,
        "align_v",
        path,
        &[
            ("top", AlignV::Top),
            ("center", AlignV::Center),
            ("bottom", AlignV::Bottom),
        ],
    )
}

fn opt_size_mode(map: &Map<String, Value>, path: &NodePath) -> Result<Option<SizeMode>> {
    opt_enum(
        map,
        "size_mode",
        path,
        &[("fixed", SizeMode::Fixed), ("max", SizeMode::Max)],
    )
}

fn opt_quiet_zone(map: &Map<String, Value>, path: &NodePath) -> Result<Option<f64>> {
    let q = opt_f64(map, "quiet_zone_mm", path)?;
    if let Some(v) = q
        && v < 0.0
    {
        return Err(CompileError::schema(
            path.join("quiet_zone_mm"),
            format!("quiet_zone_mm must be >= 0, got {v}"),
        ));
    }
    Ok(q)
}

// ── Primitive helpers ───────────────────────────────────────────────────

fn as_object<'a>(value: &'a Value, path: &NodePath) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CompileError::schema(path.clone(), "expected an object"))
}

/// Reject keys outside `allowed`. `extensions` content is never inspected,
/// so unknown keys inside it pass through by construction.
fn check_keys(map: &Map<String, Value>, allowed: &[&str], path: &NodePath) -> Result<()> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(CompileError::schema(
                path.clone(),
                format!("unknown field `{key}`"),
            ));
        }
    }
    Ok(())
}

fn req_value<'a>(map: &'a Map<String, Value>, key: &'static str, path: &NodePath) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| CompileError::schema(path.clone(), format!("missing required field `{key}`")))
}

fn req_string(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<String> {
    let v = req_value(map, key, path)?;
    v.as_str()
        .map(str::to_owned)
        .ok_or_else(|| CompileError::schema(path.join(key), "expected a string"))
}

fn opt_string(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<Option<String>> {
    match map.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_owned()))
            .ok_or_else(|| CompileError::schema(path.join(key), "expected a string")),
    }
}

fn req_f64(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<f64> {
    let v = req_value(map, key, path)?;
    v.as_f64()
        .ok_or_else(|| CompileError::schema(path.join(key), "expected a number"))
}

fn opt_f64(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<Option<f64>> {
    match map.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| CompileError::schema(path.join(key), "expected a number")),
    }
}

fn req_u32(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<u32> {
    let v = req_value(map, key, path)?;
    parse_u32(v, &path.join(key))
}

fn opt_u32(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<Option<u32>> {
    match map.get(key) {
        None => Ok(None),
        Some(v) => parse_u32(v, &path.join(key)).map(Some),
    }
}

fn parse_u32(value: &Value, path: &NodePath) -> Result<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| CompileError::schema(path.clone(), "expected a non-negative integer"))
}

fn req_bool(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<bool> {
    let v = req_value(map, key, path)?;
    v.as_bool()
        .ok_or_else(|| CompileError::schema(path.join(key), "expected a boolean"))
}

fn opt_bool(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<Option<bool>> {
    match map.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| CompileError::schema(path.join(key), "expected a boolean")),
    }
}

fn opt_mm4(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<Option<[f64; 4]>> {
    match map.get(key) {
        None => Ok(None),
        Some(v) => parse_mm_array::<4>(v, &path.join(key)).map(Some),
    }
}

fn opt_mm2(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Result<Option<[f64; 2]>> {
    match map.get(key) {
        None => Ok(None),
        Some(v) => parse_mm_array::<2>(v, &path.join(key)).map(Some),
    }
}

fn parse_mm_array<const N: usize>(value: &Value, path: &NodePath) -> Result<[f64; N]> {
    let Value::Array(items) = value else {
        return Err(CompileError::schema(
            path.clone(),
            format!("expected an array of {N} numbers"),
        ));
    };
    if items.len() != N {
        return Err(CompileError::schema(
            path.clone(),
            format!("expected exactly {N} numbers, got {}", items.len()),
        ));
    }
    let mut out = [0.0; N];
    for (i, item) in items.iter().enumerate() {
        let n = item
            .as_f64()
            .ok_or_else(|| CompileError::schema(path.index(i), "expected a number"))?;
        if n < 0.0 {
            return Err(CompileError::schema(
                path.index(i),
                format!("must be >= 0, got {n}"),
            ));
        }
        out[i] = n;
    }
    Ok(out)
}

fn req_enum<T: Copy>(
    map: &Map<String, Value>,
    key: &'static str,
    path: &NodePath,
    table: &[(&str, T)],
) -> Result<T> {
    match opt_enum(map, key, path, table)? {
        Some(v) => Ok(v),
        None => Err(CompileError::schema(
            path.clone(),
            format!("missing required field `{key}`"),
        )),
    }
}

fn opt_enum<T: Copy>(
    map: &Map<String, Value>,
    key: &'static str,
    path: &NodePath,
    table: &[(&str, T)],
) -> Result<Option<T>> {
    let Some(value) = map.get(key) else {
        return Ok(None);
    };
    let field_path = path.join(key);
    let s = value
        .as_str()
        .ok_or_else(|| CompileError::schema(field_path.clone(), "expected a string"))?;
    for (keyword, v) in table {
        if *keyword == s {
            return Ok(Some(*v));
        }
    }
    let allowed: Vec<&str> = table.iter().map(|(k, _)| *k).collect();
    Err(CompileError::schema(
        field_path,
        format!("unknown value `{s}`, expected one of: {}", allowed.join(", ")),
    ))
}
