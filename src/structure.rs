use anyhow::{Context, Result};
use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::model::{
    AliasDecl, ClassDecl, DeclarationFile, EnumDecl, ExtendsClause, InterfaceDecl, Literal,
    MethodDecl, Parameter, PropertySignature, TypeExpr,
};

/// Parses one declaration file and lowers its top-level declarations.
///
/// Syntax errors do not fail the parse: tree-sitter recovers, and whatever
/// declarations survive recovery are kept.
pub fn parse_declaration_file(path: &Path, source: &str) -> Result<DeclarationFile> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        .context("Failed to load the TypeScript grammar")?;
    let tree = parser
        .parse(source, None)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let root = tree.root_node();
    if root.has_error() {
        log::debug!("{} contains syntax errors, keeping recovered nodes", path.display());
    }

    let bytes = source.as_bytes();
    let mut file = DeclarationFile {
        path: path.to_path_buf(),
        ..Default::default()
    };

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        let Some(decl) = unwrap_declaration(child) else {
            continue;
        };
        match decl.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(class) = extract_class(&decl, bytes) {
                    file.classes.push(class);
                }
            }
            "interface_declaration" => {
                if let Some(interface) = extract_interface(&decl, bytes) {
                    file.interfaces.push(interface);
                }
            }
            "enum_declaration" => {
                if let Some(enum_decl) = extract_enum(&decl, bytes) {
                    file.enums.push(enum_decl);
                }
            }
            "type_alias_declaration" => {
                if let Some(alias) = extract_alias(&decl, bytes) {
                    file.aliases.push(alias);
                }
            }
            _ => {}
        }
    }

    Ok(file)
}

/// Peels `export` and `declare` wrappers off a top-level statement.
fn unwrap_declaration(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "export_statement" => node
            .child_by_field_name("declaration")
            .and_then(unwrap_declaration),
        "ambient_declaration" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .find(|c| c.kind().ends_with("_declaration"));
            inner.and_then(unwrap_declaration)
        }
        _ => Some(node),
    }
}

fn extract_class(node: &Node, source: &[u8]) -> Option<ClassDecl> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();

    let mut heritage = None;
    let mut extends = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "class_heritage" {
            continue;
        }
        let mut inner = child.walk();
        let clause = child
            .named_children(&mut inner)
            .find(|c| c.kind() == "extends_clause");
        if let Some(clause) = clause {
            heritage = Some(normalize_whitespace(node_text(&clause, source)));
            extends = extract_extends(&clause, source);
        }
    }

    let methods = node
        .child_by_field_name("body")
        .map(|body| extract_methods(&body, source))
        .unwrap_or_default();

    Some(ClassDecl {
        name,
        heritage,
        extends,
        methods,
    })
}

fn extract_extends(clause: &Node, source: &[u8]) -> Option<ExtendsClause> {
    let base = clause.child_by_field_name("value")?;
    Some(ExtendsClause {
        base: node_text(&base, source).to_string(),
        has_type_arguments: clause.child_by_field_name("type_arguments").is_some(),
    })
}

fn extract_methods(body: &Node, source: &[u8]) -> Vec<MethodDecl> {
    let mut methods = Vec::new();

    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "method_signature" | "method_definition" | "abstract_method_signature" => {
                if is_accessor(&child) {
                    continue;
                }
                if let Some(method) = extract_method(&child, source) {
                    methods.push(method);
                }
            }
            _ => {}
        }
    }

    methods
}

fn extract_method(node: &Node, source: &[u8]) -> Option<MethodDecl> {
    let name = property_name(&node.child_by_field_name("name")?, source);
    let is_static = has_token(node, "static");
    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| extract_parameters(&params, source))
        .unwrap_or_default();

    Some(MethodDecl {
        name,
        is_static,
        parameters,
    })
}

fn extract_parameters(node: &Node, source: &[u8]) -> Vec<Parameter> {
    let mut parameters = Vec::new();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if !matches!(child.kind(), "required_parameter" | "optional_parameter") {
            continue;
        }
        let Some(pattern) = child.child_by_field_name("pattern") else {
            continue;
        };
        if pattern.kind() == "this" {
            continue;
        }
        let name = node_text(&pattern, source)
            .trim_start_matches("...")
            .to_string();
        let ty = child
            .child_by_field_name("type")
            .and_then(|annotation| annotated_type(&annotation, source));
        parameters.push(Parameter { name, ty });
    }

    parameters
}

fn extract_interface(node: &Node, source: &[u8]) -> Option<InterfaceDecl> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let mut properties = Vec::new();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() != "property_signature" {
                continue;
            }
            let Some(name_node) = member.child_by_field_name("name") else {
                continue;
            };
            let ty = member
                .child_by_field_name("type")
                .and_then(|annotation| annotated_type(&annotation, source));
            properties.push(PropertySignature {
                name: property_name(&name_node, source),
                ty,
            });
        }
    }

    Some(InterfaceDecl { name, properties })
}

fn extract_enum(node: &Node, source: &[u8]) -> Option<EnumDecl> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let mut members = Vec::new();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            let name_node = match member.kind() {
                "enum_assignment" => member.child_by_field_name("name"),
                "property_identifier" | "string" | "number" => Some(member),
                _ => None,
            };
            if let Some(n) = name_node {
                members.push(property_name(&n, source));
            }
        }
    }

    Some(EnumDecl { name, members })
}

fn extract_alias(node: &Node, source: &[u8]) -> Option<AliasDecl> {
    let name = node_text(&node.child_by_field_name("name")?, source).to_string();
    let value = node.child_by_field_name("value")?;
    Some(AliasDecl {
        name,
        is_generic: node.child_by_field_name("type_parameters").is_some(),
        ty: lower_type(&value, source),
    })
}

/// Lowers the type inside a `: T` annotation node.
fn annotated_type(annotation: &Node, source: &[u8]) -> Option<TypeExpr> {
    if annotation.kind() != "type_annotation" {
        return Some(lower_type(annotation, source));
    }
    let mut cursor = annotation.walk();
    let inner = annotation.named_children(&mut cursor).next()?;
    Some(lower_type(&inner, source))
}

pub(crate) fn lower_type(node: &Node, source: &[u8]) -> TypeExpr {
    match node.kind() {
        "predefined_type" => TypeExpr::Keyword(node_text(node, source).to_string()),
        "literal_type" => lower_literal(node, source),
        "type_identifier" if matches!(node_text(node, source), "undefined" | "null") => {
            TypeExpr::Keyword(node_text(node, source).to_string())
        }
        "type_identifier" | "nested_type_identifier" | "identifier" => TypeExpr::Reference {
            path: split_path(node_text(node, source)),
            has_type_arguments: false,
        },
        "generic_type" => match node.child_by_field_name("name") {
            Some(name) => TypeExpr::Reference {
                path: split_path(node_text(&name, source)),
                has_type_arguments: true,
            },
            None => TypeExpr::Other(normalize_whitespace(node_text(node, source))),
        },
        "union_type" => {
            let mut members = Vec::new();
            collect_union(node, source, &mut members);
            TypeExpr::Union(members)
        }
        "parenthesized_type" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next();
            match inner {
                Some(inner) => lower_type(&inner, source),
                None => TypeExpr::Other(String::new()),
            }
        }
        _ => TypeExpr::Other(normalize_whitespace(node_text(node, source))),
    }
}

fn collect_union(node: &Node, source: &[u8], members: &mut Vec<TypeExpr>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match lower_type(&child, source) {
            TypeExpr::Union(inner) => members.extend(inner),
            other => members.push(other),
        }
    }
}

fn lower_literal(node: &Node, source: &[u8]) -> TypeExpr {
    let mut cursor = node.walk();
    let Some(inner) = node.named_children(&mut cursor).next() else {
        return TypeExpr::Other(node_text(node, source).to_string());
    };
    let text = node_text(&inner, source);

    match inner.kind() {
        "string" => TypeExpr::Literal(Literal::String(unquote(text).to_string())),
        "true" => TypeExpr::Literal(Literal::Boolean(true)),
        "false" => TypeExpr::Literal(Literal::Boolean(false)),
        "number" | "unary_expression" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            if compact.ends_with('n') {
                TypeExpr::Literal(Literal::BigInt(compact))
            } else {
                TypeExpr::Literal(Literal::Number(compact))
            }
        }
        // `null` and `undefined` parse as literal types but are not literals
        // in the classification sense.
        "null" | "undefined" => TypeExpr::Keyword(text.to_string()),
        _ => TypeExpr::Other(text.to_string()),
    }
}

fn is_accessor(node: &Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| !c.is_named() && matches!(c.kind(), "get" | "set"))
}

fn has_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token)
}

fn property_name(node: &Node, source: &[u8]) -> String {
    let text = node_text(node, source);
    match node.kind() {
        "string" => unquote(text).to_string(),
        _ => text.to_string(),
    }
}

fn split_path(text: &str) -> Vec<String> {
    text.split('.')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['\'', '"', '`'] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
