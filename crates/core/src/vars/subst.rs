//! Brace placeholder substitution.
//!
//! Substitution is defined here explicitly rather than inherited from any
//! formatter: a single left-to-right scan where `{{` and `}}` are literal
//! braces, `{name}` expands to the variable's value, and `{name:spec}`
//! applies a minimal fill/align/width format spec. Anything else is a
//! [`FormatError`](zplgrid_diagnostics::ErrorKind::Format).

use std::collections::BTreeMap;

use zplgrid_diagnostics::{CompileError, NodePath};

use crate::template::model::MissingVarPolicy;

/// Substitute `{name}` placeholders in `input` against `vars`.
pub fn substitute(
    input: &str,
    vars: &BTreeMap<String, String>,
    policy: MissingVarPolicy,
    path: &NodePath,
) -> Result<String, CompileError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                // Collect the placeholder body up to the closing brace.
                let mut body = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    body.push(c);
                }
                if !closed {
                    return Err(CompileError::format(
                        path.clone(),
                        format!("unbalanced `{{` in `{input}`"),
                    ));
                }
                out.push_str(&expand(&body, vars, policy, path, input)?);
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(CompileError::format(
                        path.clone(),
                        format!("unbalanced `}}` in `{input}`"),
                    ));
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

fn expand(
    body: &str,
    vars: &BTreeMap<String, String>,
    policy: MissingVarPolicy,
    path: &NodePath,
    input: &str,
) -> Result<String, CompileError> {
    let (name, spec) = match body.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (body, None),
    };

    if name.is_empty() {
        return Err(CompileError::format(
            path.clone(),
            format!("empty placeholder name in `{input}`"),
        ));
    }

    let value = match vars.get(name) {
        Some(v) => v.clone(),
        None => match policy {
            MissingVarPolicy::Error => {
                return Err(CompileError::missing_variable(path.clone(), name));
            }
            MissingVarPolicy::Empty => String::new(),
        },
    };

    match spec {
        None => Ok(value),
        Some(spec) => apply_spec(&value, spec, path),
    }
}

// ── Format specs ────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq)]
enum SpecAlign {
    Left,
    Center,
    Right,
}

/// Apply a minimal `[[fill]align][width]` format spec: `<` / `^` / `>`
/// alignment with an optional fill character and a pad-to width. Anything
/// beyond that grammar is rejected.
fn apply_spec(value: &str, spec: &str, path: &NodePath) -> Result<String, CompileError> {
    let bad = |detail: &str| {
        CompileError::format(path.clone(), format!("invalid format spec `{spec}`: {detail}"))
    };

    if spec.is_empty() {
        return Err(bad("empty spec"));
    }

    let chars: Vec<char> = spec.chars().collect();
    let align_of = |c: char| match c {
        '<' => Some(SpecAlign::Left),
        '^' => Some(SpecAlign::Center),
        '>' => Some(SpecAlign::Right),
        _ => None,
    };

    let (fill, align, rest) = if chars.len() >= 2
        && let Some(a) = align_of(chars[1])
    {
        (chars[0], a, &chars[2..])
    } else if let Some(a) = align_of(chars[0]) {
        (' ', a, &chars[1..])
    } else {
        (' ', SpecAlign::Left, &chars[..])
    };

    if rest.is_empty() {
        return Err(bad("missing width"));
    }
    if !rest.iter().all(|c| c.is_ascii_digit()) {
        return Err(bad("width must be an unsigned integer"));
    }
    let width: usize = rest
        .iter()
        .collect::<String>()
        .parse()
        .map_err(|_| bad("width out of range"))?;

    let len = value.chars().count();
    if len >= width {
        return Ok(value.to_owned());
    }

    let pad = width - len;
    let mut out = String::with_capacity(width);
    match align {
        SpecAlign::Left => {
            out.push_str(value);
            out.extend(std::iter::repeat_n(fill, pad));
        }
        SpecAlign::Right => {
            out.extend(std::iter::repeat_n(fill, pad));
            out.push_str(value);
        }
        SpecAlign::Center => {
            let left = pad / 2;
            out.extend(std::iter::repeat_n(fill, left));
            out.push_str(value);
            out.extend(std::iter::repeat_n(fill, pad - left));
        }
    }
    Ok(out)
}
