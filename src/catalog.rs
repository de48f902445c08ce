//! Read-only lookup over a loaded catalog

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ChainError, ChainResult};
use crate::models::{Catalog, Process, Product};

/// Characters allowed in product and process ids. Position keys join ids with
/// `/` and `@`, so neither may appear here.
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("id pattern is a valid regex")
});

pub fn is_valid_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}

/// Immutable index over a [`Catalog`].
///
/// Producers of a product are kept in catalog order; the first one is the
/// default choice during resolution.
#[derive(Debug)]
pub struct CatalogIndex {
    catalog: Catalog,
    products: HashMap<String, usize>,
    processes: HashMap<String, usize>,
    producers: HashMap<String, Vec<usize>>,
}

impl CatalogIndex {
    /// Validate and index a catalog.
    pub fn new(catalog: Catalog) -> ChainResult<Self> {
        let mut products = HashMap::with_capacity(catalog.products.len());
        for (pos, product) in catalog.products.iter().enumerate() {
            if !is_valid_id(&product.id) {
                return Err(ChainError::invalid_catalog(format!(
                    "product id {:?} contains characters outside [A-Za-z0-9_.-]",
                    product.id
                )));
            }
            if products.insert(product.id.clone(), pos).is_some() {
                return Err(ChainError::invalid_catalog(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
        }

        let mut processes = HashMap::with_capacity(catalog.processes.len());
        let mut producers: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, process) in catalog.processes.iter().enumerate() {
            if !is_valid_id(&process.id) {
                return Err(ChainError::invalid_catalog(format!(
                    "process id {:?} contains characters outside [A-Za-z0-9_.-]",
                    process.id
                )));
            }
            if processes.insert(process.id.clone(), pos).is_some() {
                return Err(ChainError::invalid_catalog(format!(
                    "duplicate process id {}",
                    process.id
                )));
            }

            for entry in process.inputs.iter().chain(process.outputs.iter()) {
                if !products.contains_key(&entry.product_id) {
                    return Err(ChainError::invalid_catalog(format!(
                        "process {} references unknown product {}",
                        process.id, entry.product_id
                    )));
                }
            }

            // A process listing the same output twice still counts once
            let mut seen = HashSet::new();
            for output in &process.outputs {
                if seen.insert(output.product_id.as_str()) {
                    producers
                        .entry(output.product_id.clone())
                        .or_default()
                        .push(pos);
                }
            }
        }

        tracing::debug!(
            products = products.len(),
            processes = processes.len(),
            "Indexed catalog"
        );

        Ok(Self {
            catalog,
            products,
            processes,
            producers,
        })
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id).map(|&pos| &self.catalog.products[pos])
    }

    pub fn product_name(&self, id: &str) -> Option<&str> {
        self.product(id).map(|p| p.name.as_str())
    }

    pub fn process_by_id(&self, id: &str) -> Option<&Process> {
        self.processes.get(id).map(|&pos| &self.catalog.processes[pos])
    }

    /// All processes whose outputs include `product_id`, in catalog order.
    pub fn processes_producing(&self, product_id: &str) -> Vec<&Process> {
        self.producers
            .get(product_id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| &self.catalog.processes[pos])
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessEntry;

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn process(id: &str, inputs: &[(&str, &str)], outputs: &[(&str, &str)]) -> Process {
        Process {
            id: id.to_string(),
            name: format!("Process {}", id),
            building_id: "b".to_string(),
            inputs: inputs.iter().map(|(p, r)| ProcessEntry::new(p, r)).collect(),
            outputs: outputs.iter().map(|(p, r)| ProcessEntry::new(p, r)).collect(),
        }
    }

    #[test]
    fn producers_keep_catalog_order() {
        let catalog = Catalog {
            products: vec![product("a", "A"), product("b", "B")],
            processes: vec![
                process("p2", &[("a", "1")], &[("b", "1")]),
                process("p1", &[], &[("b", "2"), ("a", "1")]),
                process("p3", &[], &[("b", "3")]),
            ],
        };
        let index = CatalogIndex::new(catalog).unwrap();

        let ids: Vec<_> = index
            .processes_producing("b")
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, ["p2", "p1", "p3"]);
        assert_eq!(index.processes_producing("a").len(), 1);
        assert!(index.processes_producing("missing").is_empty());
        assert_eq!(index.product_name("b"), Some("B"));
        assert_eq!(index.product_name("zzz"), None);
        assert_eq!(index.process_by_id("p3").map(|p| p.outputs.len()), Some(1));
    }

    #[test]
    fn rejects_ids_with_key_separators() {
        let catalog = Catalog {
            products: vec![product("a/b", "Bad")],
            processes: vec![],
        };
        assert!(matches!(
            CatalogIndex::new(catalog),
            Err(ChainError::InvalidCatalog { .. })
        ));

        let catalog = Catalog {
            products: vec![product("a", "A")],
            processes: vec![process("p@1", &[], &[("a", "1")])],
        };
        assert!(matches!(
            CatalogIndex::new(catalog),
            Err(ChainError::InvalidCatalog { .. })
        ));
    }

    #[test]
    fn rejects_duplicates_and_unknown_references() {
        let dup = Catalog {
            products: vec![product("a", "A"), product("a", "A again")],
            processes: vec![],
        };
        assert!(CatalogIndex::new(dup).is_err());

        let unknown = Catalog {
            products: vec![product("a", "A")],
            processes: vec![process("p", &[("ghost", "1")], &[("a", "1")])],
        };
        let err = CatalogIndex::new(unknown).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn id_alphabet() {
        assert!(is_valid_id("44"));
        assert!(is_valid_id("iron-ore_2.v1"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("a b"));
        assert!(!is_valid_id("a/b"));
        assert!(!is_valid_id("a@b"));
    }
}
