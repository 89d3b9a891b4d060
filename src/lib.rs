//! # namespace-registry
//!
//! Scans TypeScript declaration files for classes built on the `Namespace`
//! capability and generates a registry of their gettable properties,
//! settable properties and methods, with every typed position reduced to a
//! small descriptor vocabulary.
//!
//! ## Architecture
//!
//! - **scan**: `*.d.ts` discovery and bulk loading into a [`model::DeclarationSet`]
//! - **structure**: tree-sitter parsing and lowering of one declaration file
//! - **model**: owned declaration and type model, cross-file symbol table
//! - **classify**: type → descriptor classification
//! - **extract**: eligibility test and per-class member extraction
//! - **registry**: ordered class registry assembly
//! - **emit**: TypeScript / JSON rendering and output digests
//! - **cli** / **config**: command line and path resolution

pub mod classify;
pub mod cli;
pub mod config;
pub mod emit;
pub mod extract;
pub mod model;
pub mod registry;
pub mod scan;
pub mod structure;
