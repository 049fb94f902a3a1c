//! Defaults resolution.
//!
//! A top-down walk that folds the document-level `defaults` block into each
//! leaf and element, producing a fully resolved tree. Element values win on
//! conflict. After this stage no consumer needs to look at `defaults` again
//! (the render policy block is read directly by the compile entry point).

use zplgrid_diagnostics::{CompileError, NodePath};

use super::model::{Defaults, Element, Node, TemplateDocument};

/// Fold defaults into every leaf and element, returning a resolved copy.
///
/// Fails if a text element still lacks `font_height_mm` after the merge,
/// since no later stage can size the font.
pub fn resolve(doc: &TemplateDocument) -> Result<TemplateDocument, CompileError> {
    let mut resolved = doc.clone();
    resolve_node(&mut resolved.layout, &doc.defaults, &NodePath::new("layout"))?;
    Ok(resolved)
}

fn resolve_node(
    node: &mut Node,
    defaults: &Defaults,
    path: &NodePath,
) -> Result<(), CompileError> {
    match node {
        Node::Split(split) => {
            let children_path = path.join("children");
            for (i, child) in split.children.iter_mut().enumerate() {
                resolve_node(child, defaults, &children_path.index(i))?;
            }
            Ok(())
        }
        Node::Leaf(leaf) => {
            if leaf.padding_mm.is_none() {
                leaf.padding_mm = Some(defaults.leaf_padding_mm.unwrap_or([0.0; 4]));
            }
            let elements_path = path.join("elements");
            for (i, element) in leaf.elements.iter_mut().enumerate() {
                resolve_element(element, defaults, &elements_path.index(i))?;
            }
            Ok(())
        }
    }
}

fn resolve_element(
    element: &mut Element,
    defaults: &Defaults,
    path: &NodePath,
) -> Result<(), CompileError> {
    match element {
        Element::Text(text) => {
            text.style.merge_under(&defaults.text);
            if text.style.font_height_mm.is_none() {
                return Err(CompileError::schema(
                    path.clone(),
                    "text element has no font_height_mm (set it on the element or in defaults.text)",
                ));
            }
            Ok(())
        }
        Element::Qr(qr) => {
            let c = &defaults.code2d;
            qr.quiet_zone_mm = qr.quiet_zone_mm.or(c.quiet_zone_mm);
            qr.size_mode = qr.size_mode.or(c.size_mode);
            qr.align_h = qr.align_h.or(c.align_h);
            qr.align_v = qr.align_v.or(c.align_v);
            Ok(())
        }
        Element::Datamatrix(dm) => {
            let c = &defaults.code2d;
            dm.quiet_zone_mm = dm.quiet_zone_mm.or(c.quiet_zone_mm);
            dm.size_mode = dm.size_mode.or(c.size_mode);
            dm.align_h = dm.align_h.or(c.align_h);
            dm.align_v = dm.align_v.or(c.align_v);
            Ok(())
        }
        // Image defaults are accepted opaquely; nothing to merge in v1.
        Element::Line(_) | Element::Image(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::model::{
        AlignH, Code2dDefaults, ElementCommon, LeafNode, QrElement, SCHEMA_VERSION, SizeMode,
        TextElement, TextStyle, WrapMode,
    };

    fn doc(defaults: Defaults, layout: Node) -> TemplateDocument {
        TemplateDocument {
            schema_version: SCHEMA_VERSION,
            name: None,
            defaults,
            layout,
        }
    }

    fn bare_text_leaf() -> Node {
        Node::Leaf(LeafNode {
            padding_mm: None,
            debug_border: false,
            alias: None,
            elements: vec![Element::Text(TextElement {
                common: ElementCommon::default(),
                text: "x".into(),
                style: TextStyle::default(),
            })],
        })
    }

    #[test]
    fn leaf_inherits_default_padding() {
        let defaults = Defaults {
            leaf_padding_mm: Some([1.0, 2.0, 3.0, 4.0]),
            text: TextStyle {
                font_height_mm: Some(3.0),
                ..TextStyle::default()
            },
            ..Defaults::default()
        };
        let resolved = resolve(&doc(defaults, bare_text_leaf())).unwrap();
        let Node::Leaf(leaf) = &resolved.layout else {
            panic!()
        };
        assert_eq!(leaf.padding_mm, Some([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn explicit_leaf_padding_wins() {
        let defaults = Defaults {
            leaf_padding_mm: Some([9.0; 4]),
            text: TextStyle {
                font_height_mm: Some(3.0),
                ..TextStyle::default()
            },
            ..Defaults::default()
        };
        let layout = Node::Leaf(LeafNode {
            padding_mm: Some([1.0; 4]),
            debug_border: false,
            alias: None,
            elements: vec![Element::Text(TextElement {
                common: ElementCommon::default(),
                text: "x".into(),
                style: TextStyle::default(),
            })],
        });
        let resolved = resolve(&doc(defaults, layout)).unwrap();
        let Node::Leaf(leaf) = &resolved.layout else {
            panic!()
        };
        assert_eq!(leaf.padding_mm, Some([1.0; 4]));
    }

    #[test]
    fn text_style_merges_from_defaults() {
        let defaults = Defaults {
            text: TextStyle {
                font_height_mm: Some(2.5),
                wrap: Some(WrapMode::Word),
                ..TextStyle::default()
            },
            ..Defaults::default()
        };
        let resolved = resolve(&doc(defaults, bare_text_leaf())).unwrap();
        let Node::Leaf(leaf) = &resolved.layout else {
            panic!()
        };
        let Element::Text(t) = &leaf.elements[0] else {
            panic!()
        };
        assert_eq!(t.style.font_height_mm, Some(2.5));
        assert_eq!(t.wrap(), WrapMode::Word);
    }

    #[test]
    fn text_without_any_font_height_fails() {
        let err = resolve(&doc(Defaults::default(), bare_text_leaf())).unwrap_err();
        assert_eq!(err.path.to_string(), "layout/elements/0");
        assert!(err.message.contains("font_height_mm"), "{err}");
    }

    #[test]
    fn code2d_defaults_merge_into_qr() {
        let defaults = Defaults {
            code2d: Code2dDefaults {
                quiet_zone_mm: Some(1.5),
                size_mode: Some(SizeMode::Max),
                align_h: Some(AlignH::Left),
                ..Code2dDefaults::default()
            },
            ..Defaults::default()
        };
        let layout = Node::Leaf(LeafNode {
            padding_mm: None,
            debug_border: false,
            alias: None,
            elements: vec![Element::Qr(QrElement {
                common: ElementCommon::default(),
                data: "x".into(),
                magnification: None,
                size_mode: Some(SizeMode::Fixed), // element wins
                error_correction: None,
                input_mode: None,
                character_mode: None,
                quiet_zone_mm: None,
                align_h: None,
                align_v: None,
            })],
        });
        let resolved = resolve(&doc(defaults, layout)).unwrap();
        let Node::Leaf(leaf) = &resolved.layout else {
            panic!()
        };
        let Element::Qr(qr) = &leaf.elements[0] else {
            panic!()
        };
        assert_eq!(qr.quiet_zone_mm, Some(1.5));
        assert_eq!(qr.size_mode(), SizeMode::Fixed);
        assert_eq!(qr.align_h(), AlignH::Left);
    }
}
