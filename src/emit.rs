use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::registry::Registry;

pub const REGISTRY_CONST: &str = "NAMESPACE_REGISTRY";

const TYPE_DECLARATIONS: &str = "\
export interface PropertyInfo {
  name: string;
  type: string;
}

export interface MethodInfo {
  name: string;
  parameters: PropertyInfo[];
}

export interface NamespaceInfo {
  gettableProperties: PropertyInfo[];
  settableProperties: PropertyInfo[];
  methods: MethodInfo[];
}
";

/// Renders the registry as a TypeScript module exporting one typed constant.
///
/// `source_label` names what was scanned and goes into the header; it must
/// not vary between runs or the output stops being reproducible.
pub fn render_typescript(registry: &Registry, source_label: &str) -> Result<String> {
    let body = serde_json::to_string_pretty(registry)?;

    let mut out = String::new();
    out.push_str("// AUTO-GENERATED FILE - DO NOT EDIT.\n");
    out.push_str(&format!("// Generated by namespace-registry from {source_label}.\n"));
    out.push_str("// Regenerate instead of modifying this file by hand.\n\n");
    out.push_str(TYPE_DECLARATIONS);
    out.push('\n');
    out.push_str(&format!(
        "export const {REGISTRY_CONST}: Record<string, NamespaceInfo> = {body};\n"
    ));
    Ok(out)
}

pub fn render_json(registry: &Registry) -> Result<String> {
    let mut out = serde_json::to_string_pretty(registry)?;
    out.push('\n');
    Ok(out)
}

pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ClassRecord, MethodDescriptor, PropertyDescriptor};

    fn song() -> ClassRecord {
        ClassRecord {
            name: "Song".to_string(),
            gettable: vec![PropertyDescriptor {
                name: "tempo".to_string(),
                ty: "number".to_string(),
            }],
            settable: Vec::new(),
            methods: vec![MethodDescriptor {
                name: "createMidiTrack".to_string(),
                parameters: vec![PropertyDescriptor {
                    name: "index".to_string(),
                    ty: "number".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn typescript_module_has_marker_and_typed_constant() {
        let registry: Registry = vec![song()].into_iter().collect();
        let module = render_typescript(&registry, "ableton-js").unwrap();

        assert!(module.starts_with("// AUTO-GENERATED FILE - DO NOT EDIT.\n"));
        assert!(module.contains("from ableton-js."));
        assert!(module.contains(
            "export const NAMESPACE_REGISTRY: Record<string, NamespaceInfo> = {\n  \"Song\": {"
        ));
        assert!(module.contains("\"gettableProperties\": [\n      {\n        \"name\": \"tempo\","));
        assert!(module.ends_with("};\n"));
    }

    #[test]
    fn empty_registry_renders_empty_object() {
        let registry = Registry::new();
        assert_eq!(render_json(&registry).unwrap(), "{}\n");
        assert!(
            render_typescript(&registry, "x")
                .unwrap()
                .ends_with("Record<string, NamespaceInfo> = {};\n")
        );
    }

    #[test]
    fn rendering_is_stable() {
        let registry: Registry = vec![song()].into_iter().collect();
        let a = render_typescript(&registry, "pkg").unwrap();
        let b = render_typescript(&registry, "pkg").unwrap();
        assert_eq!(hash_content(&a), hash_content(&b));
        assert_eq!(hash_content("").len(), 64);
    }
}
