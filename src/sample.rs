//! Built-in sample catalog for trying the resolver without an imported dataset

use crate::models::{Catalog, Process, ProcessEntry, Product};

fn product(id: &str, name: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn process(
    id: &str,
    name: &str,
    building_id: &str,
    inputs: &[(&str, &str)],
    outputs: &[(&str, &str)],
) -> Process {
    Process {
        id: id.to_string(),
        name: name.to_string(),
        building_id: building_id.to_string(),
        inputs: inputs.iter().map(|(p, r)| ProcessEntry::new(p, r)).collect(),
        outputs: outputs.iter().map(|(p, r)| ProcessEntry::new(p, r)).collect(),
    }
}

/// Cement, quicklime and water chains, plus electrolysis.
pub fn catalog() -> Catalog {
    Catalog {
        products: vec![
            product("1", "Water"),
            product("3", "Oxygen"),
            product("4", "Hydrogen"),
            product("11", "Calcite"),
            product("12", "Limestone"),
            product("32", "Quicklime"),
            product("42", "Carbon Dioxide"),
            product("44", "Cement"),
        ],
        processes: vec![
            // Extraction: nothing consumed, so no per-run ratio
            process("1", "Water Extraction", "water-pump", &[], &[("1", "")]),
            process("11", "Calcite Mining", "quarry", &[], &[("11", "")]),
            // 2 H2O -> 2 H2 + O2, by mass
            process(
                "2",
                "Electrolysis",
                "electrolyzer",
                &[("1", "36")],
                &[("3", "32"), ("4", "4")],
            ),
            // CaCO3 -> CaO + CO2
            process(
                "29",
                "Calcination",
                "kiln",
                &[("11", "100")],
                &[("32", "56"), ("42", "44")],
            ),
            process(
                "30",
                "Limestone Calcination",
                "kiln",
                &[("12", "120")],
                &[("32", "56"), ("42", "44")],
            ),
            process(
                "38",
                "Cement Mixing",
                "mixer",
                &[("1", "5"), ("32", "3")],
                &[("44", "7")],
            ),
        ],
    }
}
