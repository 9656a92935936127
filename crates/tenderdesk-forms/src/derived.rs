//! Derived fields
//!
//! Schema-specific business logic (like the tender bid-total calculator)
//! plugs into the engine as a derived-field hook instead of hard-coded
//! checkpoint ids: whenever any input answer changes, the hook recomputes
//! and the result lands in the target checkpoint.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::answer::AnswerValue;

type ComputeFn = dyn Fn(&BTreeMap<u32, AnswerValue>) -> String + Send + Sync;

/// A read-only field computed from other answers.
#[derive(Clone)]
pub struct DerivedField {
    pub target: u32,
    pub inputs: Vec<u32>,
    compute: Arc<ComputeFn>,
}

impl DerivedField {
    pub fn new<F>(target: u32, inputs: Vec<u32>, compute: F) -> Self
    where
        F: Fn(&BTreeMap<u32, AnswerValue>) -> String + Send + Sync + 'static,
    {
        Self {
            target,
            inputs,
            compute: Arc::new(compute),
        }
    }

    pub fn compute(&self, answers: &BTreeMap<u32, AnswerValue>) -> String {
        (self.compute)(answers)
    }

    /// Bid-total calculator: `total = Σ quantity × rate` over the given
    /// (quantity, rate) checkpoint pairs, formatted to two decimals.
    /// Unanswered or unparseable inputs read as zero.
    pub fn bid_total(pairs: &[(u32, u32)], target: u32) -> Self {
        let pairs = pairs.to_vec();
        let inputs = pairs.iter().flat_map(|&(q, r)| [q, r]).collect();
        Self::new(target, inputs, move |answers| {
            let total: f64 = pairs
                .iter()
                .map(|(quantity, rate)| number(answers, *quantity) * number(answers, *rate))
                .sum();
            format!("{total:.2}")
        })
    }
}

impl fmt::Debug for DerivedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedField")
            .field("target", &self.target)
            .field("inputs", &self.inputs)
            .finish()
    }
}

fn number(answers: &BTreeMap<u32, AnswerValue>, id: u32) -> f64 {
    answers.get(&id).map_or(0.0, AnswerValue::as_number)
}

/// Format a decimal amount as grouped INR currency for display,
/// e.g. `1234567.5` → `₹12,34,567.50` (Indian digit grouping: the last
/// three digits, then groups of two).
pub fn format_inr(value: &str) -> String {
    let amount: f64 = value.trim().parse().unwrap_or(0.0);
    let negative = amount < 0.0;
    let cents = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, ch) in digits.iter().enumerate() {
        let remaining = digits.len() - i;
        if i > 0 && (remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0)) {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}₹{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(entries: &[(u32, &str)]) -> BTreeMap<u32, AnswerValue> {
        entries
            .iter()
            .map(|&(id, v)| (id, AnswerValue::Text(v.into())))
            .collect()
    }

    #[test]
    fn test_bid_total() {
        let field = DerivedField::bid_total(&[(61, 62), (63, 64), (65, 66), (69, 70)], 72);
        let answers = answers(&[
            (61, "2"),
            (62, "10.5"),
            (63, "0"),
            (64, "0"),
            (65, "0"),
            (66, "0"),
            (69, "0"),
            (70, "0"),
        ]);
        assert_eq!(field.compute(&answers), "21.00");
    }

    #[test]
    fn test_bid_total_missing_inputs_read_as_zero() {
        let field = DerivedField::bid_total(&[(61, 62)], 72);
        assert_eq!(field.compute(&answers(&[(61, "3")])), "0.00");
        assert_eq!(field.compute(&answers(&[(61, "3"), (62, "abc")])), "0.00");
    }

    #[test]
    fn test_inr_formatting() {
        assert_eq!(format_inr("0"), "₹0.00");
        assert_eq!(format_inr("21"), "₹21.00");
        assert_eq!(format_inr("1234"), "₹1,234.00");
        assert_eq!(format_inr("1234567.5"), "₹12,34,567.50");
        assert_eq!(format_inr("not a number"), "₹0.00");
    }
}
