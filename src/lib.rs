//! Production chain resolver
//!
//! Turns "produce amount A of product P" into a fully quantified production
//! tree: which process makes each intermediate product, how much of every
//! input and byproduct is involved, and which distinct products and
//! processes the chain touches.

pub mod catalog;
pub mod chain;
pub mod db;
pub mod error;
pub mod import;
pub mod key;
pub mod models;
pub mod overrides;
pub mod resolver;
pub mod sample;
pub mod stoichiometry;
pub mod summary;

pub use catalog::CatalogIndex;
pub use chain::{ResolveOptions, configure_production_chain};
pub use error::{ChainError, ChainResult};
pub use key::{PositionKey, build_key};
pub use models::{
    Catalog, ChainProcessNode, ChainProductNode, EndProduct, Process, ProcessEntry, Product,
    ProductRef, Report, UnitsPerRun,
};
pub use overrides::SelectionOverrides;
pub use resolver::{Accumulator, Resolver};
