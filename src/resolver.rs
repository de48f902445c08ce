//! Recursive production chain resolver
//!
//! Depth-first: pick a producing process for the requested product, scale its
//! inputs and byproducts, then recurse into each input. Distinct products and
//! processes touched along the way are collected into an [`Accumulator`].

use std::collections::BTreeSet;

use crate::catalog::CatalogIndex;
use crate::error::{ChainError, ChainResult};
use crate::key::PositionKey;
use crate::models::{ChainProcessNode, ChainProductNode, Process, ProductRef, UnitsPerRun};
use crate::overrides::SelectionOverrides;
use crate::stoichiometry;

pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// Ids touched by one resolution. Built fresh per call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    pub products: BTreeSet<String>,
    pub processes: BTreeSet<String>,
}

/// One choice on the current ancestor path
struct PathStep {
    product_id: String,
    process_id: String,
    overridden: bool,
}

pub struct Resolver<'a> {
    catalog: &'a CatalogIndex,
    overrides: &'a SelectionOverrides,
    max_depth: u32,
    path: Vec<PathStep>,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a CatalogIndex, overrides: &'a SelectionOverrides) -> Self {
        Self {
            catalog,
            overrides,
            max_depth: DEFAULT_MAX_DEPTH,
            path: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve `amount` of `product_id` at the slot `(product_id, depth, parent)`.
    pub fn resolve(
        &mut self,
        product_id: &str,
        amount: f64,
        depth: u32,
        parent: Option<&PositionKey>,
        acc: &mut Accumulator,
    ) -> ChainResult<ChainProductNode> {
        if depth > self.max_depth {
            return Err(ChainError::CycleOrDepthExceeded {
                product_id: product_id.to_string(),
                depth,
                reason: format!("maximum depth {} exceeded", self.max_depth),
            });
        }

        let product = self.product_ref(product_id)?;
        let key = PositionKey::new(product_id, depth, parent)?;

        let candidates = self.catalog.processes_producing(product_id);
        if candidates.is_empty() {
            tracing::trace!(key = %key, product = product_id, amount, "Raw input");
            acc.products.insert(product_id.to_string());
            return Ok(ChainProductNode {
                product,
                amount,
                key: Some(key.into()),
                producer: None,
            });
        }

        let (process, overridden) = self.select(&key, &candidates);
        acc.processes.insert(process.id.clone());
        self.check_cycle(product_id, process, overridden, &key, depth)?;

        let primary =
            process
                .output_for(product_id)
                .ok_or_else(|| ChainError::InvalidProcessData {
                    process_id: process.id.clone(),
                    reason: format!("listed as producer of {product_id} but has no matching output"),
                })?;
        let primary_applicable = primary.units_per_run != UnitsPerRun::NotApplicable;
        let runs = stoichiometry::primary_runs(process, amount, product_id)?;

        // Byproducts without a usable ratio on either side are listed, not quantified
        let mut byproducts = Vec::new();
        let mut unquantified_byproducts = Vec::new();
        for output in process.outputs.iter().filter(|o| o.product_id != product_id) {
            let product = self.product_ref(&output.product_id)?;
            if !primary_applicable || output.units_per_run == UnitsPerRun::NotApplicable {
                tracing::debug!(
                    key = %key,
                    byproduct = %output.product_id,
                    "Byproduct amount not applicable"
                );
                unquantified_byproducts.push(product);
                continue;
            }
            let byproduct_amount =
                stoichiometry::output_amount(process, amount, &output.product_id, product_id)?;
            byproducts.push(ChainProductNode {
                product,
                amount: byproduct_amount,
                key: None,
                producer: None,
            });
        }

        self.path.push(PathStep {
            product_id: product_id.to_string(),
            process_id: process.id.clone(),
            overridden,
        });
        let mut inputs = Vec::with_capacity(process.inputs.len());
        for input in &process.inputs {
            acc.products.insert(input.product_id.clone());
            if !primary_applicable || input.units_per_run == UnitsPerRun::NotApplicable {
                return Err(ChainError::InvalidProcessData {
                    process_id: process.id.clone(),
                    reason: format!(
                        "amount of input {} cannot be derived without per-run ratios",
                        input.product_id
                    ),
                });
            }
            let input_amount =
                stoichiometry::input_amount(process, amount, &input.product_id, product_id)?;
            let node = self.resolve(&input.product_id, input_amount, depth + 1, Some(&key), acc)?;
            inputs.push(node);
        }
        self.path.pop();

        let primary_output = ChainProductNode {
            product: product.clone(),
            amount,
            key: Some(key.to_string()),
            producer: None,
        };

        Ok(ChainProductNode {
            product,
            amount,
            key: Some(key.into()),
            producer: Some(Box::new(ChainProcessNode {
                id: process.id.clone(),
                name: process.name.clone(),
                building_id: process.building_id.clone(),
                runs,
                inputs,
                primary_output: vec![primary_output],
                byproducts,
                unquantified_byproducts,
            })),
        })
    }

    /// The override for this exact position if it names a candidate,
    /// otherwise the first candidate in catalog order. The flag is true when
    /// an override decided the choice.
    fn select<'c>(&self, key: &PositionKey, candidates: &[&'c Process]) -> (&'c Process, bool) {
        let default = candidates[0];
        let Some(wanted) = self.overrides.get(key.as_str()) else {
            tracing::debug!(key = %key, process = %default.id, "Selected default process");
            return (default, false);
        };

        match candidates.iter().copied().find(|p| p.id == wanted) {
            Some(chosen) => {
                tracing::debug!(key = %key, process = %chosen.id, "Selected overridden process");
                (chosen, true)
            }
            None => {
                tracing::warn!(
                    key = %key,
                    requested = wanted,
                    fallback = %default.id,
                    "Override names a process that does not produce this product; using default"
                );
                (default, false)
            }
        }
    }

    /// Fail if this choice repeats one on the ancestor path and every choice
    /// from that earlier occurrence down to here, and every choice beneath
    /// here, is a default. Defaults do not depend on position, so the same
    /// loop would then repeat forever. Anything else is left to `max_depth`.
    fn check_cycle(
        &self,
        product_id: &str,
        process: &Process,
        overridden: bool,
        key: &PositionKey,
        depth: u32,
    ) -> ChainResult<()> {
        let Some(start) = self
            .path
            .iter()
            .position(|step| step.product_id == product_id && step.process_id == process.id)
        else {
            return Ok(());
        };
        let segment = &self.path[start..];
        if overridden
            || segment.iter().any(|step| step.overridden)
            || self.overrides.has_descendant_of(key)
        {
            return Ok(());
        }

        let cycle: Vec<String> = segment
            .iter()
            .map(|step| format!("{} via {}", step.product_id, step.process_id))
            .chain(std::iter::once(format!("{product_id} via {}", process.id)))
            .collect();
        Err(ChainError::CycleOrDepthExceeded {
            product_id: product_id.to_string(),
            depth,
            reason: format!("production cycle: {}", cycle.join(" -> ")),
        })
    }

    fn product_ref(&self, product_id: &str) -> ChainResult<ProductRef> {
        let name = self
            .catalog
            .product_name(product_id)
            .ok_or_else(|| ChainError::DanglingReference {
                kind: "product",
                id: product_id.to_string(),
            })?;
        Ok(ProductRef {
            id: product_id.to_string(),
            name: name.to_string(),
        })
    }
}
