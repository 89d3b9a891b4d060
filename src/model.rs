use std::collections::HashMap;
use std::path::PathBuf;

/// Owned lowering of a syntactic type annotation.
///
/// Only the shapes the classifier distinguishes are kept apart; everything
/// else (arrays, functions, object literals, tuples, ...) collapses into
/// [`TypeExpr::Other`] carrying its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Predefined keyword type such as `string`, `void` or `undefined`.
    Keyword(String),
    Literal(Literal),
    /// `Foo`, `Foo<T>` or `Ns.Foo`, split on dots.
    Reference {
        path: Vec<String>,
        has_type_arguments: bool,
    },
    /// Members in source order, nested unions already flattened.
    Union(Vec<TypeExpr>),
    Other(String),
}

impl TypeExpr {
    pub fn keyword(name: &str) -> Self {
        TypeExpr::Keyword(name.to_string())
    }

    pub fn reference(name: &str) -> Self {
        TypeExpr::Reference {
            path: name.split('.').map(str::to_string).collect(),
            has_type_arguments: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Unquoted string value.
    String(String),
    /// Numeric literal in its source form, sign included.
    Number(String),
    BigInt(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub is_static: bool,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendsClause {
    /// Source text of the base expression, e.g. `Namespace` or `ns.Namespace`.
    pub base: String,
    pub has_type_arguments: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    /// Source text of the `extends` clause alone, if any; `implements` is excluded.
    pub heritage: Option<String>,
    pub extends: Option<ExtendsClause>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySignature {
    pub name: String,
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: String,
    /// Property signatures only; method, index and call signatures are dropped.
    pub properties: Vec<PropertySignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDecl {
    pub name: String,
    /// `type Box<T> = ...` aliases are recorded but never expanded.
    pub is_generic: bool,
    pub ty: TypeExpr,
}

/// Top-level declarations of one `.d.ts` file, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationFile {
    pub path: PathBuf,
    pub classes: Vec<ClassDecl>,
    pub interfaces: Vec<InterfaceDecl>,
    pub enums: Vec<EnumDecl>,
    pub aliases: Vec<AliasDecl>,
}

impl DeclarationFile {
    /// First interface with this exact name; later duplicates are ignored.
    pub fn interface(&self, name: &str) -> Option<&InterfaceDecl> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// Enums and type aliases visible across the whole declaration set.
///
/// Names are global: the first declaration seen (in file order) wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    enums: HashMap<String, EnumDecl>,
    aliases: HashMap<String, AliasDecl>,
}

impl SymbolTable {
    pub fn from_files(files: &[DeclarationFile]) -> Self {
        let mut table = Self::default();
        for file in files {
            for decl in &file.enums {
                table.add_enum(decl.clone());
            }
            for decl in &file.aliases {
                table.add_alias(decl.clone());
            }
        }
        table
    }

    pub fn add_enum(&mut self, decl: EnumDecl) {
        self.enums.entry(decl.name.clone()).or_insert(decl);
    }

    pub fn add_alias(&mut self, decl: AliasDecl) {
        self.aliases.entry(decl.name.clone()).or_insert(decl);
    }

    pub fn enum_decl(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.get(name)
    }

    pub fn alias(&self, name: &str) -> Option<&AliasDecl> {
        self.aliases.get(name)
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

/// Every declaration file loaded for one run, plus the shared symbol table.
#[derive(Debug, Clone)]
pub struct DeclarationSet {
    pub root: PathBuf,
    pub files: Vec<DeclarationFile>,
    pub symbols: SymbolTable,
}

impl DeclarationSet {
    pub fn new(root: PathBuf, files: Vec<DeclarationFile>) -> Self {
        let symbols = SymbolTable::from_files(&files);
        Self {
            root,
            files,
            symbols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_table_keeps_first_declaration() {
        let first = DeclarationFile {
            path: PathBuf::from("a.d.ts"),
            enums: vec![EnumDecl {
                name: "Mode".to_string(),
                members: vec!["A".to_string()],
            }],
            ..Default::default()
        };
        let second = DeclarationFile {
            path: PathBuf::from("b.d.ts"),
            enums: vec![EnumDecl {
                name: "Mode".to_string(),
                members: vec!["B".to_string()],
            }],
            ..Default::default()
        };

        let table = SymbolTable::from_files(&[first, second]);
        assert_eq!(table.enum_count(), 1);
        assert_eq!(table.enum_decl("Mode").unwrap().members, vec!["A"]);
    }

    #[test]
    fn interface_lookup_returns_first_match() {
        let file = DeclarationFile {
            interfaces: vec![
                InterfaceDecl {
                    name: "GettableProperties".to_string(),
                    properties: vec![PropertySignature {
                        name: "tempo".to_string(),
                        ty: None,
                    }],
                },
                InterfaceDecl {
                    name: "GettableProperties".to_string(),
                    properties: Vec::new(),
                },
            ],
            ..Default::default()
        };

        let found = file.interface("GettableProperties").unwrap();
        assert_eq!(found.properties.len(), 1);
        assert!(file.interface("SettableProperties").is_none());
    }
}
