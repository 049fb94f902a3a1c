//! Recursive binary-split layout solving.
//!
//! Depth-first descent over the resolved template tree. Each split divides
//! its parent length `L` into `child0 = floor(available * ratio)` and
//! `child1 = available - child0` where `available = L - gutter`, so the
//! three pieces always sum exactly to `L`. The full rect tree is retained
//! for debug overlays and the `inspect` surface.

use serde::Serialize;
use zplgrid_diagnostics::{CompileError, NodePath};

use crate::layout::units::{Rect, mm_to_dots, padding_to_dots};
use crate::target::RenderTarget;
use crate::template::model::{Direction, Node};

/// A solved node: its canonical id, template path, outer rect, and
/// variant-specific geometry.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutNode {
    /// Canonical structural id (`r`, `r/0`, …).
    pub id: String,
    /// Template path (`layout/children/0`, …), used in error reporting.
    pub path: NodePath,
    /// The node's outer rectangle.
    pub rect: Rect,
    /// Variant-specific geometry.
    #[serde(flatten)]
    pub detail: LayoutDetail,
}

/// Variant-specific solved geometry.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutDetail {
    /// A solved split.
    Split {
        /// The gutter strip between the children; `None` when zero dots.
        gutter: Option<Rect>,
        /// The divider rect centred in the gutter, when visible.
        divider: Option<Rect>,
        /// The two solved children.
        children: Vec<LayoutNode>,
    },
    /// A solved leaf.
    Leaf {
        /// The leaf rect minus padding.
        content: Rect,
    },
}

/// The solved layout for one compile: the rect tree plus the label rect.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutTree {
    /// The whole label in dots, at origin (0, 0).
    pub label: Rect,
    /// The solved root node.
    pub root: LayoutNode,
}

impl LayoutTree {
    /// Iterate all solved leaves, depth-first.
    pub fn leaves(&self) -> Vec<&LayoutNode> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &mut out);
        out
    }
}

fn collect_leaves<'a>(node: &'a LayoutNode, out: &mut Vec<&'a LayoutNode>) {
    match &node.detail {
        LayoutDetail::Leaf { .. } => out.push(node),
        LayoutDetail::Split { children, .. } => {
            for child in children {
                collect_leaves(child, out);
            }
        }
    }
}

/// Solve the resolved tree against a render target.
///
/// Leaf padding must already be resolved (the defaults resolver guarantees
/// this); unresolved leaves fall back to zero padding.
pub fn solve(root: &Node, target: &RenderTarget) -> Result<LayoutTree, CompileError> {
    let label = Rect::new(0, 0, target.width_dots(), target.height_dots());
    if !label.is_drawable() {
        return Err(CompileError::layout(
            NodePath::root(),
            format!(
                "render target resolves to a non-positive label ({} x {} dots)",
                label.w, label.h
            ),
        ));
    }
    let root = solve_node(
        root,
        label,
        "r".to_owned(),
        NodePath::new("layout"),
        target.dpi,
    )?;
    Ok(LayoutTree { label, root })
}

fn solve_node(
    node: &Node,
    rect: Rect,
    id: String,
    path: NodePath,
    dpi: u32,
) -> Result<LayoutNode, CompileError> {
    match node {
        Node::Split(split) => {
            let axis_len = match split.direction {
                Direction::V => rect.w,
                Direction::H => rect.h,
            };
            let gutter_dots = mm_to_dots(split.gutter_mm, dpi);
            let available = axis_len - gutter_dots;
            if available < 0 {
                return Err(CompileError::layout(
                    path,
                    format!(
                        "gutter ({gutter_dots} dots) exceeds the parent length ({axis_len} dots)"
                    ),
                ));
            }

            let child0_len = (f64::from(available) * split.ratio).floor() as i32;
            let child1_len = available - child0_len;

            let (rect0, rect1, gutter_rect) = match split.direction {
                Direction::V => (
                    Rect::new(rect.x, rect.y, child0_len, rect.h),
                    Rect::new(rect.x + child0_len + gutter_dots, rect.y, child1_len, rect.h),
                    Rect::new(rect.x + child0_len, rect.y, gutter_dots, rect.h),
                ),
                Direction::H => (
                    Rect::new(rect.x, rect.y, rect.w, child0_len),
                    Rect::new(rect.x, rect.y + child0_len + gutter_dots, rect.w, child1_len),
                    Rect::new(rect.x, rect.y + child0_len, rect.w, gutter_dots),
                ),
            };

            let divider = divider_rect(split, &gutter_rect, gutter_dots, dpi);

            let children_path = path.join("children");
            let children = vec![
                solve_node(
                    &split.children[0],
                    rect0,
                    format!("{id}/0"),
                    children_path.index(0),
                    dpi,
                )?,
                solve_node(
                    &split.children[1],
                    rect1,
                    format!("{id}/1"),
                    children_path.index(1),
                    dpi,
                )?,
            ];

            Ok(LayoutNode {
                id,
                path,
                rect,
                detail: LayoutDetail::Split {
                    gutter: (gutter_dots > 0).then_some(gutter_rect),
                    divider,
                    children,
                },
            })
        }
        Node::Leaf(leaf) => {
            let content = rect.inset(padding_to_dots(leaf.padding(), dpi));
            if !content.is_valid() {
                return Err(CompileError::layout(
                    path,
                    format!(
                        "padding leaves a negative content rect ({} x {} dots)",
                        content.w, content.h
                    ),
                ));
            }
            Ok(LayoutNode {
                id,
                path,
                rect,
                detail: LayoutDetail::Leaf { content },
            })
        }
    }
}

/// Divider rect centred inside the gutter strip, when visible.
fn divider_rect(
    split: &crate::template::model::SplitNode,
    gutter_rect: &Rect,
    gutter_dots: i32,
    dpi: u32,
) -> Option<Rect> {
    let divider = split.divider.as_ref()?;
    if !divider.visible {
        return None;
    }
    let thickness = mm_to_dots(divider.thickness_mm, dpi).max(1);
    let slack = (gutter_dots - thickness).max(0);
    Some(match split.direction {
        Direction::V => Rect::new(
            gutter_rect.x + slack / 2,
            gutter_rect.y,
            thickness,
            gutter_rect.h,
        ),
        Direction::H => Rect::new(
            gutter_rect.x,
            gutter_rect.y + slack / 2,
            gutter_rect.w,
            thickness,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::model::{
        Direction, Divider, Element, ElementCommon, LeafNode, LineElement, LineOrientation,
        SplitNode,
    };
    use zplgrid_diagnostics::ErrorKind;

    fn leaf(padding_mm: Option<[f64; 4]>) -> Node {
        Node::Leaf(LeafNode {
            padding_mm,
            debug_border: false,
            alias: None,
            elements: vec![Element::Line(LineElement {
                common: ElementCommon::default(),
                orientation: LineOrientation::H,
                thickness_mm: 0.3,
                align: None,
            })],
        })
    }

    fn vsplit(ratio: f64, gutter_mm: f64, divider: Option<Divider>) -> Node {
        Node::Split(SplitNode {
            direction: Direction::V,
            ratio,
            gutter_mm,
            divider,
            alias: None,
            children: vec![leaf(None), leaf(None)],
        })
    }

    fn children(tree: &LayoutTree) -> (&LayoutNode, &LayoutNode) {
        let LayoutDetail::Split { children, .. } = &tree.root.detail else {
            panic!("expected split root");
        };
        (&children[0], &children[1])
    }

    #[test]
    fn dot_accounting_matches_reference_case() {
        // Parent width 591 dots, gutter 8 dots, ratio 0.3:
        // available = 583, child0 = floor(174.9) = 174, child1 = 409.
        let target = RenderTarget::new(74.0, 26.0, 203); // 591 x 208 dots
        let tree = solve(&vsplit(0.3, 1.0, None), &target).unwrap();
        let (c0, c1) = children(&tree);
        assert_eq!(c0.rect, Rect::new(0, 0, 174, 208));
        assert_eq!(c1.rect, Rect::new(174 + 8, 0, 409, 208));
        assert_eq!(c0.rect.w + 8 + c1.rect.w, 591);
    }

    #[test]
    fn split_sum_invariant_holds_across_ratios() {
        let target = RenderTarget::new(74.0, 26.0, 203);
        for ratio in [0.001, 0.1, 0.25, 0.333, 0.5, 0.77, 0.999] {
            for gutter in [0.0, 0.5, 1.0, 3.3] {
                let tree = solve(&vsplit(ratio, gutter, None), &target).unwrap();
                let (c0, c1) = children(&tree);
                let g = mm_to_dots(gutter, 203);
                assert_eq!(
                    c0.rect.w + g + c1.rect.w,
                    591,
                    "ratio {ratio} gutter {gutter}"
                );
                assert!(c0.rect.w >= 0 && c1.rect.w >= 0);
            }
        }
    }

    #[test]
    fn horizontal_split_divides_height() {
        let target = RenderTarget::new(50.0, 30.0, 203); // 400 x 240 dots
        let node = Node::Split(SplitNode {
            direction: Direction::H,
            ratio: 0.5,
            gutter_mm: 0.0,
            divider: None,
            alias: None,
            children: vec![leaf(None), leaf(None)],
        });
        let tree = solve(&node, &target).unwrap();
        let (c0, c1) = children(&tree);
        assert_eq!(c0.rect, Rect::new(0, 0, 400, 120));
        assert_eq!(c1.rect, Rect::new(0, 120, 400, 120));
    }

    #[test]
    fn divider_is_centred_in_gutter() {
        let target = RenderTarget::new(74.0, 26.0, 203);
        let tree = solve(
            &vsplit(
                0.3,
                1.0, // 8 dots
                Some(Divider {
                    visible: true,
                    thickness_mm: 0.3, // 2 dots
                }),
            ),
            &target,
        )
        .unwrap();
        let LayoutDetail::Split { divider, gutter, .. } = &tree.root.detail else {
            panic!()
        };
        let gutter = gutter.expect("gutter rect");
        let divider = divider.expect("divider rect");
        assert_eq!(gutter, Rect::new(174, 0, 8, 208));
        assert_eq!(divider, Rect::new(174 + 3, 0, 2, 208));
    }

    #[test]
    fn invisible_divider_produces_no_rect() {
        let target = RenderTarget::new(74.0, 26.0, 203);
        let tree = solve(
            &vsplit(
                0.5,
                1.0,
                Some(Divider {
                    visible: false,
                    thickness_mm: 0.3,
                }),
            ),
            &target,
        )
        .unwrap();
        let LayoutDetail::Split { divider, .. } = &tree.root.detail else {
            panic!()
        };
        assert!(divider.is_none());
    }

    #[test]
    fn gutter_exceeding_parent_is_layout_error() {
        let target = RenderTarget::new(10.0, 10.0, 203); // 79 dots wide
        let err = solve(&vsplit(0.5, 12.0, None), &target).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Layout);
        assert_eq!(err.path.to_string(), "layout");
    }

    #[test]
    fn leaf_content_is_rect_minus_padding() {
        let target = RenderTarget::new(50.0, 30.0, 203);
        let tree = solve(&leaf(Some([1.0, 2.0, 1.0, 2.0])), &target).unwrap();
        let LayoutDetail::Leaf { content } = &tree.root.detail else {
            panic!()
        };
        // 1mm = 8 dots, 2mm = 16 dots at 203dpi
        assert_eq!(*content, Rect::new(16, 8, 400 - 32, 240 - 16));
    }

    #[test]
    fn excessive_padding_is_layout_error() {
        let target = RenderTarget::new(5.0, 5.0, 203); // 39 x 39 dots
        let err = solve(&leaf(Some([10.0, 10.0, 10.0, 10.0])), &target).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Layout);
    }

    #[test]
    fn canonical_ids_and_paths_line_up() {
        let target = RenderTarget::new(74.0, 26.0, 203);
        let nested = Node::Split(SplitNode {
            direction: Direction::V,
            ratio: 0.4,
            gutter_mm: 0.0,
            divider: None,
            alias: None,
            children: vec![leaf(None), vsplit(0.5, 0.0, None)],
        });
        let tree = solve(&nested, &target).unwrap();
        assert_eq!(tree.root.id, "r");
        assert_eq!(tree.root.path.to_string(), "layout");
        let (c0, c1) = children(&tree);
        assert_eq!(c0.id, "r/0");
        assert_eq!(c0.path.to_string(), "layout/children/0");
        assert_eq!(c1.id, "r/1");
        let LayoutDetail::Split { children: inner, .. } = &c1.detail else {
            panic!()
        };
        assert_eq!(inner[0].id, "r/1/0");
        assert_eq!(inner[0].path.to_string(), "layout/children/1/children/0");
    }

    #[test]
    fn leaves_iterates_depth_first() {
        let target = RenderTarget::new(74.0, 26.0, 203);
        let nested = Node::Split(SplitNode {
            direction: Direction::V,
            ratio: 0.4,
            gutter_mm: 0.0,
            divider: None,
            alias: None,
            children: vec![vsplit(0.5, 0.0, None), leaf(None)],
        });
        let tree = solve(&nested, &target).unwrap();
        let ids: Vec<&str> = tree.leaves().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["r/0/0", "r/0/1", "r/1"]);
    }

    #[test]
    fn zero_dpi_label_is_rejected() {
        let target = RenderTarget::new(74.0, 26.0, 0);
        let err = solve(&leaf(None), &target).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Layout);
    }
}
