//! Tree formatting and aggregate summaries of a resolved report

use std::collections::HashMap;

use crate::models::{ChainProcessNode, ChainProductNode, Report};

/// Format a production tree as an indented listing, keys included so they
/// can be fed back as overrides.
pub fn format_tree(report: &Report) -> String {
    let mut output = String::new();
    let end = &report.end_product;
    output.push_str(&format!("{} ({}) x {:.3}\n", end.name, end.id, end.amount));
    format_process(&report.tree, 1, &mut output);
    output
}

fn format_process(process: &ChainProcessNode, indent: usize, output: &mut String) {
    let prefix = "  ".repeat(indent);
    let runs = match process.runs {
        Some(runs) => format!("{:.3} runs", runs),
        None => "extraction".to_string(),
    };
    output.push_str(&format!(
        "{}via {} [{}] @ {} ({})\n",
        prefix, process.name, process.id, process.building_id, runs
    ));

    for byproduct in &process.byproducts {
        output.push_str(&format!(
            "{}  + {} {:.3} (byproduct)\n",
            prefix, byproduct.product.name, byproduct.amount
        ));
    }
    for byproduct in &process.unquantified_byproducts {
        output.push_str(&format!(
            "{}  + {} (byproduct, amount n/a)\n",
            prefix, byproduct.name
        ));
    }
    for input in &process.inputs {
        format_product(input, indent + 1, output);
    }
}

fn format_product(node: &ChainProductNode, indent: usize, output: &mut String) {
    let prefix = "  ".repeat(indent);
    let key = node.key.as_deref().unwrap_or("-");
    match &node.producer {
        Some(producer) => {
            output.push_str(&format!(
                "{}needs {} {:.3}  [{}]\n",
                prefix, node.product.name, node.amount, key
            ));
            format_process(producer, indent + 1, output);
        }
        None => {
            output.push_str(&format!(
                "{}needs {} {:.3} (raw input)  [{}]\n",
                prefix, node.product.name, node.amount, key
            ));
        }
    }
}

/// Summary of a production chain
#[derive(Debug)]
pub struct ChainSummary {
    pub end_product: String,
    pub amount: f64,
    /// (process name, total standard runs); extraction processes count 0
    pub process_runs: Vec<(String, f64)>,
    pub raw_inputs: Vec<(String, f64)>,
    pub byproducts: Vec<(String, f64)>,
}

/// Aggregate a report over the whole tree
pub fn summarize(report: &Report) -> ChainSummary {
    let mut runs: HashMap<String, f64> = HashMap::new();
    let mut raw_inputs: HashMap<String, f64> = HashMap::new();
    let mut byproducts: HashMap<String, f64> = HashMap::new();

    collect_summary(&report.tree, &mut runs, &mut raw_inputs, &mut byproducts);

    ChainSummary {
        end_product: report.end_product.name.clone(),
        amount: report.end_product.amount,
        process_runs: sorted(runs),
        raw_inputs: sorted(raw_inputs),
        byproducts: sorted(byproducts),
    }
}

fn sorted(map: HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut list: Vec<_> = map.into_iter().collect();
    list.sort_by(|a, b| a.0.cmp(&b.0));
    list
}

fn collect_summary(
    process: &ChainProcessNode,
    runs: &mut HashMap<String, f64>,
    raw_inputs: &mut HashMap<String, f64>,
    byproducts: &mut HashMap<String, f64>,
) {
    *runs.entry(process.name.clone()).or_default() += process.runs.unwrap_or(0.0);

    for byproduct in &process.byproducts {
        *byproducts.entry(byproduct.product.name.clone()).or_default() += byproduct.amount;
    }

    for input in &process.inputs {
        match &input.producer {
            Some(upstream) => collect_summary(upstream, runs, raw_inputs, byproducts),
            None => {
                *raw_inputs.entry(input.product.name.clone()).or_default() += input.amount;
            }
        }
    }
}

impl std::fmt::Display for ChainSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        writeln!(f, "Target: {} x {:.3}", self.end_product, self.amount)?;
        writeln!(f)?;

        writeln!(f, "Processes:")?;
        for (name, runs) in &self.process_runs {
            writeln!(f, "  {:.3} runs  {}", runs, name)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs:")?;
        if self.raw_inputs.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (name, amount) in &self.raw_inputs {
            writeln!(f, "  {} x {:.3}", name, amount)?;
        }
        writeln!(f)?;

        writeln!(f, "Byproducts:")?;
        if self.byproducts.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (name, amount) in &self.byproducts {
            writeln!(f, "  {} x {:.3}", name, amount)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogIndex;
    use crate::chain::{ResolveOptions, configure_production_chain};
    use crate::overrides::SelectionOverrides;
    use crate::sample;
    use approx::assert_relative_eq;

    fn cement_report(overrides: &SelectionOverrides) -> Report {
        let catalog = CatalogIndex::new(sample::catalog()).unwrap();
        configure_production_chain(&catalog, "44", 700.0, overrides, ResolveOptions::default()).unwrap()
    }

    #[test]
    fn summary_totals() {
        let summary = summarize(&cement_report(&SelectionOverrides::new()));

        assert_eq!(summary.end_product, "Cement");
        let names: Vec<_> = summary.process_runs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            ["Calcination", "Calcite Mining", "Cement Mixing", "Water Extraction"]
        );
        assert_relative_eq!(summary.process_runs[0].1, 300.0 / 56.0, max_relative = 1e-12);
        assert_relative_eq!(summary.process_runs[2].1, 100.0);
        assert!(summary.raw_inputs.is_empty());
        assert_eq!(summary.byproducts.len(), 1);
        assert_relative_eq!(summary.byproducts[0].1, 300.0 * 44.0 / 56.0, max_relative = 1e-12);
    }

    #[test]
    fn raw_inputs_collected_from_terminal_nodes() {
        let mut overrides = SelectionOverrides::new();
        overrides.insert_assignment("44@0/32@1=30").unwrap();
        let summary = summarize(&cement_report(&overrides));

        assert_eq!(summary.raw_inputs.len(), 1);
        assert_eq!(summary.raw_inputs[0].0, "Limestone");
        assert_relative_eq!(summary.raw_inputs[0].1, 300.0 * 120.0 / 56.0, max_relative = 1e-12);
    }

    #[test]
    fn tree_listing_shows_keys() {
        let text = format_tree(&cement_report(&SelectionOverrides::new()));
        assert!(text.starts_with("Cement (44) x 700.000\n"));
        assert!(text.contains("via Cement Mixing [38] @ mixer (100.000 runs)"));
        assert!(text.contains("needs Quicklime 300.000  [44@0/32@1]"));
        assert!(text.contains("via Water Extraction [1] @ water-pump (extraction)"));
        assert!(text.contains("+ Carbon Dioxide 235.714 (byproduct)"));

        let summary = summarize(&cement_report(&SelectionOverrides::new())).to_string();
        assert!(summary.contains("Raw inputs:\n  (none)"));
    }
}
