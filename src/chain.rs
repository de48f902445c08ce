//! Top-level chain assembly: resolve, validate, and package a report

use crate::catalog::CatalogIndex;
use crate::error::{ChainError, ChainResult};
use crate::models::{EndProduct, Process, Product, Report};
use crate::overrides::SelectionOverrides;
use crate::resolver::{Accumulator, DEFAULT_MAX_DEPTH, Resolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub max_depth: u32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Resolve the full production chain for `amount` units of `product_id`.
///
/// Returns the quantified tree together with every distinct product and
/// process it touches, or an error; never a partial tree.
pub fn configure_production_chain(
    catalog: &CatalogIndex,
    product_id: &str,
    amount: f64,
    overrides: &SelectionOverrides,
    options: ResolveOptions,
) -> ChainResult<Report> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ChainError::invalid_request(format!(
            "amount must be a finite positive number, got {amount}"
        )));
    }
    let end_name = catalog
        .product_name(product_id)
        .ok_or_else(|| ChainError::invalid_request(format!("unknown product {product_id}")))?
        .to_string();

    let mut acc = Accumulator::default();
    let root = Resolver::new(catalog, overrides)
        .with_max_depth(options.max_depth)
        .resolve(product_id, amount, 0, None, &mut acc)?;

    let Some(tree) = root.producer else {
        return Err(ChainError::NoProcessConfigured {
            product_id: product_id.to_string(),
        });
    };

    let products = resolve_products(catalog, &acc)?;
    let processes = resolve_processes(catalog, &acc)?;

    tracing::info!(
        product = product_id,
        amount,
        products = products.len(),
        processes = processes.len(),
        "Resolved production chain"
    );

    Ok(Report {
        end_product: EndProduct {
            id: product_id.to_string(),
            name: end_name,
            amount,
        },
        products,
        processes,
        tree: *tree,
    })
}

fn resolve_products(catalog: &CatalogIndex, acc: &Accumulator) -> ChainResult<Vec<Product>> {
    acc.products
        .iter()
        .map(|id| {
            catalog.product(id).cloned().ok_or_else(|| ChainError::DanglingReference {
                kind: "product",
                id: id.clone(),
            })
        })
        .collect()
}

fn resolve_processes(catalog: &CatalogIndex, acc: &Accumulator) -> ChainResult<Vec<Process>> {
    acc.processes
        .iter()
        .map(|id| {
            catalog.process_by_id(id).cloned().ok_or_else(|| ChainError::DanglingReference {
                kind: "process",
                id: id.clone(),
            })
        })
        .collect()
}
