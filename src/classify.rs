//! Reduces a declared type to the closed [`TypeTag`] vocabulary.
//!
//! Rules apply in a fixed order and the first match wins: enums, then
//! literal unions, then single literals, then the `string`/`number`/`boolean`
//! primitives. Anything else is `"any"`. Classification never fails.

use crate::model::{Literal, SymbolTable, TypeExpr};

/// `"string"`, `"number"`, `"boolean"`, a rendered literal or literal union,
/// an enum symbol name, `"enum"`, or `"any"`.
pub type TypeTag = String;

pub const ANY: &str = "any";
pub const UNRESOLVED_ENUM: &str = "enum";

const PRIMITIVES: [&str; 3] = ["string", "number", "boolean"];
const MAX_ALIAS_DEPTH: usize = 32;

/// Classifies an optional annotation; a missing annotation is `"any"`.
pub fn classify_annotation(ty: Option<&TypeExpr>, symbols: &SymbolTable) -> TypeTag {
    match ty {
        Some(ty) => classify(ty, symbols),
        None => ANY.to_string(),
    }
}

pub fn classify(ty: &TypeExpr, symbols: &SymbolTable) -> TypeTag {
    match resolve_alias(ty, symbols, 0) {
        Some(resolved) => classify_resolved(resolved, symbols),
        None => ANY.to_string(),
    }
}

fn classify_resolved(ty: &TypeExpr, symbols: &SymbolTable) -> TypeTag {
    if let Some(tag) = enum_tag(ty, symbols) {
        return tag;
    }

    match ty {
        TypeExpr::Union(members) => classify_union(members, symbols),
        TypeExpr::Literal(literal) => render_literal(literal),
        TypeExpr::Keyword(name) if PRIMITIVES.contains(&name.as_str()) => name.clone(),
        _ => ANY.to_string(),
    }
}

fn classify_union(members: &[TypeExpr], symbols: &SymbolTable) -> TypeTag {
    let mut flat = Vec::new();
    if !flatten_union(members, symbols, 0, &mut flat) {
        return ANY.to_string();
    }
    let members = normalize_union(flat);

    match members.as_slice() {
        [] => ANY.to_string(),
        [single] => classify_resolved(single, symbols),
        _ => {
            let mut rendered = Vec::with_capacity(members.len());
            for member in &members {
                match member {
                    TypeExpr::Literal(literal) => rendered.push(render_literal(literal)),
                    _ => return ANY.to_string(),
                }
            }
            format!("({})", rendered.join(" | "))
        }
    }
}

/// Follows non-generic alias references until reaching a non-alias type.
///
/// Returns `None` when the chain is deeper than [`MAX_ALIAS_DEPTH`], which is
/// how alias cycles surface.
fn resolve_alias<'a>(
    ty: &'a TypeExpr,
    symbols: &'a SymbolTable,
    depth: usize,
) -> Option<&'a TypeExpr> {
    if depth > MAX_ALIAS_DEPTH {
        return None;
    }

    let TypeExpr::Reference {
        path,
        has_type_arguments: false,
    } = ty
    else {
        return Some(ty);
    };
    let [name] = path.as_slice() else {
        return Some(ty);
    };
    if symbols.enum_decl(name).is_some() {
        return Some(ty);
    }

    match symbols.alias(name) {
        Some(alias) if !alias.is_generic => resolve_alias(&alias.ty, symbols, depth + 1),
        _ => Some(ty),
    }
}

fn flatten_union<'a>(
    members: &'a [TypeExpr],
    symbols: &'a SymbolTable,
    depth: usize,
    out: &mut Vec<&'a TypeExpr>,
) -> bool {
    if depth > MAX_ALIAS_DEPTH {
        return false;
    }

    for member in members {
        let Some(resolved) = resolve_alias(member, symbols, depth) else {
            return false;
        };
        match resolved {
            TypeExpr::Union(inner) => {
                if !flatten_union(inner, symbols, depth + 1, out) {
                    return false;
                }
            }
            other => out.push(other),
        }
    }

    true
}

/// Applies the reductions the host type model performs on unions without
/// strict null checks: `null` and `undefined` are erased next to other
/// members, duplicates collapse, `true | false` becomes `boolean`, and
/// literals are absorbed by their own primitive.
fn normalize_union(members: Vec<&TypeExpr>) -> Vec<TypeExpr> {
    let mut out = dedupe(members.into_iter().cloned());
    if out.iter().any(|m| !is_nullish(m)) {
        out.retain(|m| !is_nullish(m));
    }

    let true_at = out
        .iter()
        .position(|m| *m == TypeExpr::Literal(Literal::Boolean(true)));
    let false_at = out
        .iter()
        .position(|m| *m == TypeExpr::Literal(Literal::Boolean(false)));
    if let (Some(t), Some(f)) = (true_at, false_at) {
        let (first, second) = (t.min(f), t.max(f));
        out.remove(second);
        out[first] = TypeExpr::keyword("boolean");
        out = dedupe(out);
    }

    let present: Vec<String> = out
        .iter()
        .filter_map(|m| match m {
            TypeExpr::Keyword(name) if PRIMITIVES.contains(&name.as_str()) => Some(name.clone()),
            _ => None,
        })
        .collect();
    out.retain(|m| match m {
        TypeExpr::Literal(literal) => !present.iter().any(|p| p == literal_primitive(literal)),
        _ => true,
    });
    out
}

fn is_nullish(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Keyword(name) if name == "null" || name == "undefined")
}

fn dedupe(members: impl IntoIterator<Item = TypeExpr>) -> Vec<TypeExpr> {
    let mut out: Vec<TypeExpr> = Vec::new();
    for member in members {
        if !out.contains(&member) {
            out.push(member);
        }
    }
    out
}

fn enum_tag(ty: &TypeExpr, symbols: &SymbolTable) -> Option<TypeTag> {
    let TypeExpr::Reference {
        path,
        has_type_arguments: false,
    } = ty
    else {
        return None;
    };

    match path.as_slice() {
        [] => None,
        [name] => symbols.enum_decl(name).map(|e| e.name.clone()),
        [.., owner, last] => {
            if let Some(decl) = symbols.enum_decl(owner) {
                if decl.members.iter().any(|m| m == last) {
                    return Some(last.clone());
                }
                if symbols.enum_decl(last).is_none() {
                    return Some(UNRESOLVED_ENUM.to_string());
                }
            }
            symbols.enum_decl(last).map(|e| e.name.clone())
        }
    }
}

fn literal_primitive(literal: &Literal) -> &'static str {
    match literal {
        Literal::String(_) => "string",
        Literal::Number(_) => "number",
        Literal::BigInt(_) => "bigint",
        Literal::Boolean(_) => "boolean",
    }
}

/// Strings are single-quoted; every other literal uses its textual form.
pub fn render_literal(literal: &Literal) -> String {
    match literal {
        Literal::String(value) => format!("'{value}'"),
        Literal::Number(text) => render_number(text),
        Literal::BigInt(text) => text.clone(),
        Literal::Boolean(value) => value.to_string(),
    }
}

/// Renders a numeric literal the way the host language prints the value:
/// radix prefixes and separators are folded away (`0x10` is `16`).
fn render_number(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = digits.replace('_', "");
    let lower = digits.to_ascii_lowercase();

    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| lower.strip_prefix(prefix).map(|rest| (rest, radix)));
    if let Some((rest, radix)) = radix {
        return match u64::from_str_radix(rest, radix) {
            Ok(value) => format!("{sign}{value}"),
            Err(_) => text.to_string(),
        };
    }

    match lower.parse::<f64>() {
        Ok(value) if value == 0.0 => "0".to_string(),
        Ok(value) if value.is_finite() => format!("{sign}{}", format_magnitude(value)),
        _ => text.to_string(),
    }
}

/// Number-to-string for a positive finite value: plain digits between
/// `1e-6` and `1e21`, exponent form (`1e-7`, `1e+21`) outside that range.
fn format_magnitude(value: f64) -> String {
    if !(1e-6..1e21).contains(&value) {
        let exp = format!("{value:e}");
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        };
    }
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
