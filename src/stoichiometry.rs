//! Amount conversion between the entries of one process
//!
//! All conversions go through the primary output's per-run ratio:
//! `amount = requested * (entry ratio / primary output ratio)`.

use crate::error::{ChainError, ChainResult};
use crate::models::{Process, ProcessEntry, UnitsPerRun};

/// Amount of `input_product_id` consumed when `process` makes `requested`
/// units of `primary_output_id`.
pub fn input_amount(
    process: &Process,
    requested: f64,
    input_product_id: &str,
    primary_output_id: &str,
) -> ChainResult<f64> {
    let input = process.input_for(input_product_id).ok_or_else(|| {
        ChainError::invalid_process(&process.id, format!("no input entry for product {input_product_id}"))
    })?;
    scaled_amount(process, requested, input, primary_output_id)
}

/// Amount of byproduct `other_output_id` emitted when `process` makes
/// `requested` units of `primary_output_id`.
pub fn output_amount(
    process: &Process,
    requested: f64,
    other_output_id: &str,
    primary_output_id: &str,
) -> ChainResult<f64> {
    let other = process.output_for(other_output_id).ok_or_else(|| {
        ChainError::invalid_process(&process.id, format!("no output entry for product {other_output_id}"))
    })?;
    scaled_amount(process, requested, other, primary_output_id)
}

/// Standard runs of `process` needed for `requested` units of the primary
/// output, or `None` if the primary output carries no per-run ratio.
pub fn primary_runs(process: &Process, requested: f64, primary_output_id: &str) -> ChainResult<Option<f64>> {
    let primary = primary_entry(process, primary_output_id)?;
    match &primary.units_per_run {
        UnitsPerRun::PerRun(per_run) => Ok(Some(requested / per_run)),
        UnitsPerRun::NotApplicable => Ok(None),
        UnitsPerRun::Malformed(text) => Err(malformed(process, primary_output_id, text)),
    }
}

fn scaled_amount(
    process: &Process,
    requested: f64,
    entry: &ProcessEntry,
    primary_output_id: &str,
) -> ChainResult<f64> {
    let primary = primary_entry(process, primary_output_id)?;
    let entry_ratio = ratio(process, entry)?;
    let primary_ratio = ratio(process, primary)?;
    Ok(requested * (entry_ratio / primary_ratio))
}

fn primary_entry<'a>(process: &'a Process, primary_output_id: &str) -> ChainResult<&'a ProcessEntry> {
    process.output_for(primary_output_id).ok_or_else(|| {
        ChainError::invalid_process(
            &process.id,
            format!("no output entry for primary product {primary_output_id}"),
        )
    })
}

fn ratio(process: &Process, entry: &ProcessEntry) -> ChainResult<f64> {
    match &entry.units_per_run {
        UnitsPerRun::PerRun(value) => Ok(*value),
        UnitsPerRun::NotApplicable => Err(ChainError::invalid_process(
            &process.id,
            format!("ratio for product {} is not applicable", entry.product_id),
        )),
        UnitsPerRun::Malformed(text) => Err(malformed(process, &entry.product_id, text)),
    }
}

fn malformed(process: &Process, product_id: &str, text: &str) -> ChainError {
    ChainError::invalid_process(
        &process.id,
        format!("ratio {text:?} for product {product_id} is not a finite positive number"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn calcination() -> Process {
        Process {
            id: "29".to_string(),
            name: "Calcination".to_string(),
            building_id: "kiln".to_string(),
            inputs: vec![ProcessEntry::new("11", "100")],
            outputs: vec![ProcessEntry::new("32", "56"), ProcessEntry::new("42", "44")],
        }
    }

    #[test]
    fn input_and_byproduct_scale_with_primary_ratio() {
        let process = calcination();
        assert_relative_eq!(
            input_amount(&process, 56.0, "11", "32").unwrap(),
            100.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            output_amount(&process, 56.0, "42", "32").unwrap(),
            44.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(primary_runs(&process, 112.0, "32").unwrap().unwrap(), 2.0);
    }

    #[test]
    fn missing_entries_are_invalid_process_data() {
        let process = calcination();
        for result in [
            input_amount(&process, 1.0, "99", "32"),
            input_amount(&process, 1.0, "11", "99"),
            output_amount(&process, 1.0, "99", "32"),
        ] {
            assert!(matches!(result, Err(ChainError::InvalidProcessData { .. })));
        }
    }

    #[test]
    fn not_applicable_ratio_never_becomes_nan() {
        let mut process = calcination();
        process.outputs[0] = ProcessEntry::new("32", "");
        let err = input_amount(&process, 10.0, "11", "32").unwrap_err();
        assert!(err.to_string().contains("not applicable"));
        assert_eq!(primary_runs(&process, 10.0, "32").unwrap(), None);

        let mut process = calcination();
        process.inputs[0] = ProcessEntry::new("11", "lots");
        assert!(matches!(
            input_amount(&process, 10.0, "11", "32"),
            Err(ChainError::InvalidProcessData { .. })
        ));
    }

    proptest! {
        #[test]
        fn input_amount_is_linear(k in 1e-6f64..1e9) {
            let process = calcination();
            let single = input_amount(&process, k, "11", "32").unwrap();
            let double = input_amount(&process, 2.0 * k, "11", "32").unwrap();
            prop_assert!((double - 2.0 * single).abs() <= 1e-9 * double.abs());
        }
    }
}
