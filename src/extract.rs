use serde::Serialize;

use crate::classify::{TypeTag, classify_annotation};
use crate::model::{ClassDecl, DeclarationFile, InterfaceDecl, SymbolTable};

pub const GETTABLE_INTERFACE: &str = "GettableProperties";
pub const SETTABLE_INTERFACE: &str = "SettableProperties";

/// Protocol-level methods every namespace inherits; never exposed as tools.
pub const METHOD_DENYLIST: [&str; 5] = ["constructor", "get", "set", "addListener", "sendCommand"];

pub const DEFAULT_MARKER: &str = "Namespace";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub parameters: Vec<PropertyDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRecord {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "gettableProperties")]
    pub gettable: Vec<PropertyDescriptor>,
    #[serde(rename = "settableProperties")]
    pub settable: Vec<PropertyDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

/// How a class's heritage is tested against the capability marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeritageMatch {
    /// `<marker><` anywhere in the `extends` clause source text. Also matches
    /// the marker inside unrelated type arguments, e.g. `extends Base<Namespace<X>>`.
    /// `implements` clauses are never consulted.
    #[default]
    Substring,
    /// The `extends` base is the marker itself (optionally namespace-qualified)
    /// and carries type arguments.
    Structural,
}

#[derive(Debug, Clone)]
pub struct Eligibility {
    marker: String,
    mode: HeritageMatch,
}

impl Default for Eligibility {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER, HeritageMatch::Substring)
    }
}

impl Eligibility {
    pub fn new(marker: &str, mode: HeritageMatch) -> Self {
        Self {
            marker: marker.to_string(),
            mode,
        }
    }

    pub fn is_eligible(&self, class: &ClassDecl) -> bool {
        match self.mode {
            HeritageMatch::Substring => {
                let pattern = format!("{}<", self.marker);
                class
                    .heritage
                    .as_deref()
                    .is_some_and(|text| text.contains(&pattern))
            }
            HeritageMatch::Structural => class.extends.as_ref().is_some_and(|ext| {
                let base = ext.base.rsplit('.').next().unwrap_or(&ext.base).trim();
                ext.has_type_arguments && base == self.marker
            }),
        }
    }
}

/// Builds the record for one eligible class from its enclosing file.
pub fn extract_class_record(
    class: &ClassDecl,
    file: &DeclarationFile,
    symbols: &SymbolTable,
) -> ClassRecord {
    ClassRecord {
        name: class.name.clone(),
        gettable: extract_properties(file.interface(GETTABLE_INTERFACE), symbols),
        settable: extract_properties(file.interface(SETTABLE_INTERFACE), symbols),
        methods: extract_methods(class, symbols),
    }
}

fn extract_properties(
    interface: Option<&InterfaceDecl>,
    symbols: &SymbolTable,
) -> Vec<PropertyDescriptor> {
    let Some(interface) = interface else {
        return Vec::new();
    };

    interface
        .properties
        .iter()
        .map(|p| PropertyDescriptor {
            name: p.name.clone(),
            ty: classify_annotation(p.ty.as_ref(), symbols),
        })
        .collect()
}

fn extract_methods(class: &ClassDecl, symbols: &SymbolTable) -> Vec<MethodDescriptor> {
    let mut methods: Vec<MethodDescriptor> = Vec::new();

    for method in &class.methods {
        if method.is_static || METHOD_DENYLIST.contains(&method.name.as_str()) {
            continue;
        }
        // Overloads: the first signature stands for the method.
        if methods.iter().any(|m| m.name == method.name) {
            log::debug!("{}.{}: skipping overload signature", class.name, method.name);
            continue;
        }

        let parameters = method
            .parameters
            .iter()
            .map(|p| PropertyDescriptor {
                name: p.name.clone(),
                ty: classify_annotation(p.ty.as_ref(), symbols),
            })
            .collect();
        methods.push(MethodDescriptor {
            name: method.name.clone(),
            parameters,
        });
    }

    methods
}
