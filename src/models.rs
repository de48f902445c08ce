//! Data models for catalog entities and resolved production chains

use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
}

/// Per-run quantity of one product in a process, as given by the catalog.
///
/// The catalog carries this as decimal text. Empty text means the ratio does
/// not apply (raw extraction); anything else that is not a finite positive
/// number is kept verbatim so the stoichiometry step can report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnitsPerRun {
    PerRun(f64),
    NotApplicable,
    Malformed(String),
}

impl UnitsPerRun {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return UnitsPerRun::NotApplicable;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => UnitsPerRun::PerRun(value),
            _ => UnitsPerRun::Malformed(text.to_string()),
        }
    }

    /// The ratio value, if it is usable in a computation.
    pub fn value(&self) -> Option<f64> {
        match self {
            UnitsPerRun::PerRun(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<String> for UnitsPerRun {
    fn from(text: String) -> Self {
        UnitsPerRun::parse(&text)
    }
}

impl From<UnitsPerRun> for String {
    fn from(units: UnitsPerRun) -> Self {
        units.to_string()
    }
}

impl fmt::Display for UnitsPerRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitsPerRun::PerRun(value) => write!(f, "{}", value),
            UnitsPerRun::NotApplicable => Ok(()),
            UnitsPerRun::Malformed(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEntry {
    pub product_id: String,
    #[serde(rename = "unitsPerStandardRun")]
    pub units_per_run: UnitsPerRun,
}

impl ProcessEntry {
    pub fn new(product_id: &str, units_per_run: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            units_per_run: UnitsPerRun::parse(units_per_run),
        }
    }
}

/// Catalog process: consumes `inputs` and emits `outputs` per standard run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: String,
    pub name: String,
    pub building_id: String,
    #[serde(default)]
    pub inputs: Vec<ProcessEntry>,
    #[serde(default)]
    pub outputs: Vec<ProcessEntry>,
}

impl Process {
    pub fn output_for(&self, product_id: &str) -> Option<&ProcessEntry> {
        self.outputs.iter().find(|o| o.product_id == product_id)
    }

    pub fn input_for(&self, product_id: &str) -> Option<&ProcessEntry> {
        self.inputs.iter().find(|i| i.product_id == product_id)
    }

    pub fn produces(&self, product_id: &str) -> bool {
        self.output_for(product_id).is_some()
    }
}

/// The static dataset: products and processes in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub processes: Vec<Process>,
}

impl Catalog {
    /// Append another catalog fragment, keeping order.
    pub fn extend(&mut self, other: Catalog) {
        self.products.extend(other.products);
        self.processes.extend(other.processes);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
}

/// A quantity of a product needed at one tree position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainProductNode {
    pub product: ProductRef,
    pub amount: f64,
    /// Position key of the slot this node was resolved at. Byproducts have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub producer: Option<Box<ChainProcessNode>>,
}

impl ChainProductNode {
    pub fn is_terminal(&self) -> bool {
        self.producer.is_none()
    }
}

/// The process chosen to make one product node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainProcessNode {
    pub id: String,
    pub name: String,
    pub building_id: String,
    /// Standard runs needed; `None` when the primary output has no per-run ratio.
    pub runs: Option<f64>,
    pub inputs: Vec<ChainProductNode>,
    pub primary_output: Vec<ChainProductNode>,
    pub byproducts: Vec<ChainProductNode>,
    /// Byproducts whose amount cannot be derived because a ratio is not applicable
    #[serde(default)]
    pub unquantified_byproducts: Vec<ProductRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndProduct {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

/// Final result of one chain resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub end_product: EndProduct,
    pub products: Vec<Product>,
    pub processes: Vec<Process>,
    pub tree: ChainProcessNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_text_parses_into_explicit_states() {
        assert_eq!(UnitsPerRun::parse("5"), UnitsPerRun::PerRun(5.0));
        assert_eq!(UnitsPerRun::parse(" 0.25 "), UnitsPerRun::PerRun(0.25));
        assert_eq!(UnitsPerRun::parse(""), UnitsPerRun::NotApplicable);
        assert_eq!(UnitsPerRun::parse("   "), UnitsPerRun::NotApplicable);
        assert_eq!(
            UnitsPerRun::parse("abc"),
            UnitsPerRun::Malformed("abc".to_string())
        );
        assert_eq!(UnitsPerRun::parse("0"), UnitsPerRun::Malformed("0".to_string()));
        assert_eq!(UnitsPerRun::parse("-3"), UnitsPerRun::Malformed("-3".to_string()));
        assert_eq!(UnitsPerRun::parse("NaN"), UnitsPerRun::Malformed("NaN".to_string()));
        assert_eq!(UnitsPerRun::parse("inf"), UnitsPerRun::Malformed("inf".to_string()));
    }

    #[test]
    fn process_json_uses_catalog_field_names() {
        let json = r#"{
            "id": "29",
            "name": "Calcination",
            "buildingId": "kiln",
            "inputs": [{"productId": "11", "unitsPerStandardRun": "100"}],
            "outputs": [
                {"productId": "32", "unitsPerStandardRun": "56"},
                {"productId": "42", "unitsPerStandardRun": ""}
            ]
        }"#;
        let process: Process = serde_json::from_str(json).unwrap();
        assert_eq!(process.building_id, "kiln");
        assert_eq!(process.inputs[0].units_per_run, UnitsPerRun::PerRun(100.0));
        assert_eq!(process.outputs[1].units_per_run, UnitsPerRun::NotApplicable);
        assert!(process.produces("32"));
        assert!(!process.produces("11"));

        let back = serde_json::to_value(&process).unwrap();
        assert_eq!(back["outputs"][0]["unitsPerStandardRun"], "56");
        assert_eq!(back["outputs"][1]["unitsPerStandardRun"], "");
    }
}
