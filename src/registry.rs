use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::HashMap;

use crate::extract::{ClassRecord, Eligibility, extract_class_record};
use crate::model::DeclarationSet;

/// Class name → record, in first-seen order.
///
/// Re-inserting a name replaces the record but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: Vec<ClassRecord>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ClassRecord) {
        match self.index.get(&record.name) {
            Some(&pos) => {
                log::debug!("{} declared more than once, keeping the later record", record.name);
                self.records[pos] = record;
            }
            None => {
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClassRecord> {
        self.index.get(name).map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> &[ClassRecord] {
        &self.records
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ClassRecord> for Registry {
    fn from_iter<I: IntoIterator<Item = ClassRecord>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for record in iter {
            registry.insert(record);
        }
        registry
    }
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.name, record)?;
        }
        map.end()
    }
}

/// Walks every file in order and folds each eligible class into a registry.
pub fn build_registry(set: &DeclarationSet, eligibility: &Eligibility) -> Registry {
    let mut registry = Registry::new();

    for file in &set.files {
        for class in &file.classes {
            if !eligibility.is_eligible(class) {
                log::debug!("{}: {} is not a namespace class", file.path.display(), class.name);
                continue;
            }
            registry.insert(extract_class_record(class, file, &set.symbols));
        }
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{MethodDescriptor, PropertyDescriptor};
    use crate::structure::parse_declaration_file;
    use std::path::{Path, PathBuf};

    fn record(name: &str, method: &str) -> ClassRecord {
        ClassRecord {
            name: name.to_string(),
            gettable: Vec::new(),
            settable: Vec::new(),
            methods: vec![MethodDescriptor {
                name: method.to_string(),
                parameters: Vec::new(),
            }],
        }
    }

    #[test]
    fn insert_keeps_first_position_and_last_value() {
        let registry: Registry = vec![
            record("Song", "a"),
            record("Track", "b"),
            record("Song", "c"),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Song", "Track"]);
        assert_eq!(registry.get("Song").unwrap().methods[0].name, "c");
    }

    #[test]
    fn serializes_in_insertion_order() {
        let mut registry = Registry::new();
        registry.insert(record("Zeta", "z"));
        registry.insert(ClassRecord {
            name: "Alpha".to_string(),
            gettable: vec![
                PropertyDescriptor {
                    name: "b".to_string(),
                    ty: "number".to_string(),
                },
                PropertyDescriptor {
                    name: "a".to_string(),
                    ty: "string".to_string(),
                },
            ],
            settable: Vec::new(),
            methods: Vec::new(),
        });

        let json = serde_json::to_string(&registry).unwrap();
        let zeta = json.find("\"Zeta\"").unwrap();
        let alpha = json.find("\"Alpha\"").unwrap();
        assert!(zeta < alpha);
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
    }

    #[test]
    fn build_registry_skips_ineligible_classes() {
        let file = parse_declaration_file(
            Path::new("mixed.d.ts"),
            r#"
export declare class Helper {}
export declare class Cue extends Namespace<RawCue> { jump(): Promise<void>; }
export declare class Device extends Namespace<RawDevice> {}
"#,
        )
        .unwrap();
        let set = DeclarationSet::new(PathBuf::from("."), vec![file]);

        let registry = build_registry(&set, &Eligibility::default());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Cue", "Device"]);
        assert!(registry.get("Helper").is_none());
    }
}
