//! Variable binding.
//!
//! Builds the effective variable map (user variables plus the built-in
//! macros the user map does not override), then rewrites every element
//! string field that supports substitution. Binding runs before layout so
//! text measurement sees the final strings.

/// Brace placeholder substitution.
pub mod subst;

/// Built-in macros and their resolution context.
pub mod macros;

use std::collections::BTreeMap;

use zplgrid_diagnostics::{CompileError, NodePath};

use crate::template::model::{Element, MissingVarPolicy, Node, TemplateDocument};
use self::macros::MacroContext;
use self::subst::substitute;

/// Substitute variables and macros throughout the document, returning a
/// bound copy. The input is never mutated.
///
/// `user_vars` wins over built-in macros of the same name. Missing names
/// are handled per `policy`.
pub fn bind(
    doc: &TemplateDocument,
    user_vars: &BTreeMap<String, String>,
    ctx: &MacroContext<'_>,
    policy: MissingVarPolicy,
) -> Result<TemplateDocument, CompileError> {
    let mut effective = macros::builtin_macros(ctx);
    for (k, v) in user_vars {
        effective.insert(k.clone(), v.clone());
    }

    let mut bound = doc.clone();
    bind_node(&mut bound.layout, &effective, policy, &NodePath::new("layout"))?;
    Ok(bound)
}

fn bind_node(
    node: &mut Node,
    vars: &BTreeMap<String, String>,
    policy: MissingVarPolicy,
    path: &NodePath,
) -> Result<(), CompileError> {
    match node {
        Node::Split(split) => {
            let children_path = path.join("children");
            for (i, child) in split.children.iter_mut().enumerate() {
                bind_node(child, vars, policy, &children_path.index(i))?;
            }
            Ok(())
        }
        Node::Leaf(leaf) => {
            let elements_path = path.join("elements");
            for (i, element) in leaf.elements.iter_mut().enumerate() {
                bind_element(element, vars, policy, &elements_path.index(i))?;
            }
            Ok(())
        }
    }
}

fn bind_element(
    element: &mut Element,
    vars: &BTreeMap<String, String>,
    policy: MissingVarPolicy,
    path: &NodePath,
) -> Result<(), CompileError> {
    match element {
        Element::Text(text) => {
            text.text = substitute(&text.text, vars, policy, &path.join("text"))?;
        }
        Element::Qr(qr) => {
            qr.data = substitute(&qr.data, vars, policy, &path.join("data"))?;
        }
        Element::Datamatrix(dm) => {
            dm.data = substitute(&dm.data, vars, policy, &path.join("data"))?;
        }
        Element::Image(img) => {
            img.source.data = substitute(
                &img.source.data,
                vars,
                policy,
                &path.join("source").join("data"),
            )?;
        }
        Element::Line(_) => {}
    }
    Ok(())
}
