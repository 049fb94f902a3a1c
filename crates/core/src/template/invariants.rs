//! Phase B validation: cross-field structural invariants.
//!
//! Runs on the typed model, after shape validation and before defaults
//! resolution. Fails fast on the first violation with a path-qualified
//! [`CompileError`]. The checks here are exactly the rules a field-local
//! schema cannot express, plus the numeric ranges that must hold even for
//! programmatically constructed documents that never passed the schema.

use std::collections::HashMap;

use zplgrid_diagnostics::{CompileError, NodePath};

use super::model::{Element, Node, QrInputMode, SizeMode, TemplateDocument};

/// Validate every structural invariant of the document.
pub fn check(doc: &TemplateDocument) -> Result<(), CompileError> {
    let mut aliases: HashMap<&str, NodePath> = HashMap::new();
    check_node(&doc.layout, &NodePath::new("layout"), &mut aliases)
}

fn check_node<'a>(
    node: &'a Node,
    path: &NodePath,
    aliases: &mut HashMap<&'a str, NodePath>,
) -> Result<(), CompileError> {
    if let Some(alias) = node.alias() {
        if let Some(first) = aliases.get(alias) {
            return Err(CompileError::invariant(
                path.clone(),
                format!("alias `{alias}` already used at {first}"),
            ));
        }
        aliases.insert(alias, path.clone());
    }

    match node {
        Node::Split(split) => {
            if !(split.ratio > 0.0 && split.ratio < 1.0) {
                return Err(CompileError::invariant(
                    path.clone(),
                    format!("ratio must be in (0, 1), got {}", split.ratio),
                ));
            }
            if let Some(divider) = &split.divider
                && divider.visible
                && split.gutter_mm < divider.thickness_mm
            {
                return Err(CompileError::invariant(
                    path.clone(),
                    format!(
                        "visible divider ({} mm) does not fit in gutter ({} mm)",
                        divider.thickness_mm, split.gutter_mm
                    ),
                ));
            }
            if split.children.len() != 2 {
                return Err(CompileError::invariant(
                    path.clone(),
                    format!("split must have exactly 2 children, got {}", split.children.len()),
                ));
            }
            let children_path = path.join("children");
            for (i, child) in split.children.iter().enumerate() {
                check_node(child, &children_path.index(i), aliases)?;
            }
            Ok(())
        }
        Node::Leaf(leaf) => {
            if leaf.elements.len() != 1 {
                return Err(CompileError::invariant(
                    path.clone(),
                    format!(
                        "leaf must contain exactly one element, got {}",
                        leaf.elements.len()
                    ),
                ));
            }
            let element_path = path.join("elements").index(0);
            check_element(&leaf.elements[0], &element_path)
        }
    }
}

fn check_element(element: &Element, path: &NodePath) -> Result<(), CompileError> {
    match element {
        Element::Qr(qr) => {
            if qr.input_mode() == QrInputMode::M && qr.character_mode.is_none() {
                return Err(CompileError::invariant(
                    path.clone(),
                    "QR input_mode `M` requires character_mode",
                ));
            }
            Ok(())
        }
        Element::Datamatrix(dm) => {
            if dm.size_mode() == SizeMode::Max && (dm.columns() == 0 || dm.rows() == 0) {
                return Err(CompileError::invariant(
                    path.clone(),
                    "DataMatrix size_mode `max` requires explicit columns and rows",
                ));
            }
            Ok(())
        }
        Element::Text(_) | Element::Line(_) | Element::Image(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::model::{
        DataMatrixElement, Divider, Direction, ElementCommon, LeafNode, QrElement, SplitNode,
        TextElement, TextStyle,
    };
    use crate::template::model::{Defaults, SCHEMA_VERSION};
    use zplgrid_diagnostics::ErrorKind;

    fn text_leaf(alias: Option<&str>) -> Node {
        Node::Leaf(LeafNode {
            padding_mm: None,
            debug_border: false,
            alias: alias.map(str::to_owned),
            elements: vec![Element::Text(TextElement {
                common: ElementCommon::default(),
                text: "x".into(),
                style: TextStyle {
                    font_height_mm: Some(3.0),
                    ..TextStyle::default()
                },
            })],
        })
    }

    fn doc_with(layout: Node) -> TemplateDocument {
        TemplateDocument {
            schema_version: SCHEMA_VERSION,
            name: None,
            defaults: Defaults::default(),
            layout,
        }
    }

    fn split(gutter_mm: f64, divider: Option<Divider>, children: Vec<Node>) -> Node {
        Node::Split(SplitNode {
            direction: Direction::V,
            ratio: 0.5,
            gutter_mm,
            divider,
            alias: None,
            children,
        })
    }

    #[test]
    fn accepts_well_formed_tree() {
        let doc = doc_with(split(
            1.0,
            Some(Divider {
                visible: true,
                thickness_mm: 0.4,
            }),
            vec![text_leaf(Some("left")), text_leaf(Some("right"))],
        ));
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn divider_thicker_than_gutter_is_rejected() {
        let doc = doc_with(split(
            0.1,
            Some(Divider {
                visible: true,
                thickness_mm: 0.3,
            }),
            vec![text_leaf(None), text_leaf(None)],
        ));
        let err = check(&doc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invariant);
        assert_eq!(err.path.to_string(), "layout");
    }

    #[test]
    fn invisible_divider_ignores_gutter_rule() {
        let doc = doc_with(split(
            0.1,
            Some(Divider {
                visible: false,
                thickness_mm: 0.3,
            }),
            vec![text_leaf(None), text_leaf(None)],
        ));
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn leaf_with_two_elements_is_rejected() {
        let mut leaf = LeafNode {
            padding_mm: None,
            debug_border: false,
            alias: None,
            elements: vec![],
        };
        let Node::Leaf(proto) = text_leaf(None) else {
            unreachable!()
        };
        leaf.elements = vec![proto.elements[0].clone(), proto.elements[0].clone()];
        let doc = doc_with(split(0.0, None, vec![Node::Leaf(leaf), text_leaf(None)]));
        let err = check(&doc).unwrap_err();
        assert_eq!(err.path.to_string(), "layout/children/0");
        assert!(err.message.contains("exactly one element"), "{err}");
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let doc = doc_with(split(
            0.0,
            None,
            vec![text_leaf(Some("dup")), text_leaf(Some("dup"))],
        ));
        let err = check(&doc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invariant);
        assert_eq!(err.path.to_string(), "layout/children/1");
        assert!(err.message.contains("dup"), "{err}");
    }

    #[test]
    fn alias_may_repeat_across_variants_only_if_distinct() {
        let inner = split(0.0, None, vec![text_leaf(Some("a")), text_leaf(Some("b"))]);
        let doc = doc_with(split(0.0, None, vec![inner, text_leaf(Some("c"))]));
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn qr_manual_without_character_mode_is_rejected() {
        let qr = Element::Qr(QrElement {
            common: ElementCommon::default(),
            data: "x".into(),
            magnification: None,
            size_mode: None,
            error_correction: None,
            input_mode: Some(QrInputMode::M),
            character_mode: None,
            quiet_zone_mm: None,
            align_h: None,
            align_v: None,
        });
        let doc = doc_with(Node::Leaf(LeafNode {
            padding_mm: None,
            debug_border: false,
            alias: None,
            elements: vec![qr],
        }));
        let err = check(&doc).unwrap_err();
        assert_eq!(err.path.to_string(), "layout/elements/0");
        assert!(err.message.contains("character_mode"), "{err}");
    }

    #[test]
    fn datamatrix_max_without_dims_is_rejected() {
        let dm = Element::Datamatrix(DataMatrixElement {
            common: ElementCommon::default(),
            data: "x".into(),
            module_size_mm: None,
            size_mode: Some(SizeMode::Max),
            columns: Some(0),
            rows: Some(10),
            format_id: None,
            escape_char: None,
            quiet_zone_mm: None,
            align_h: None,
            align_v: None,
        });
        let doc = doc_with(Node::Leaf(LeafNode {
            padding_mm: None,
            debug_border: false,
            alias: None,
            elements: vec![dm],
        }));
        let err = check(&doc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invariant);
        assert!(err.message.contains("columns and rows"), "{err}");
    }

    #[test]
    fn ratio_out_of_range_for_programmatic_doc() {
        let doc = doc_with(Node::Split(SplitNode {
            direction: Direction::H,
            ratio: 1.0,
            gutter_mm: 0.0,
            divider: None,
            alias: None,
            children: vec![text_leaf(None), text_leaf(None)],
        }));
        let err = check(&doc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invariant);
    }
}
