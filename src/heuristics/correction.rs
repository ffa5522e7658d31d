// src/heuristics/correction.rs

use super::ReceiptLineItem;
use super::category::CategoryTable;
use super::normalize::round2;
use crate::error::{Error, Result};
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Names the OCR step is known to misread.
const BUILTIN_CORRECTIONS: &[(&str, &str)] = &[
    ("Too Yunim", "Too Yumm"),
    ("Bhagyalakshmi Chali", "Bhagyalakshmi Chakki"),
    ("Kpn Fresh", "KPN Fresh"),
];

/// One literal replacement, as written in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRule {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct Corrector {
    replacements: Vec<(Regex, String)>,
}

impl Corrector {
    pub fn new(rules: Vec<CorrectionRule>) -> Result<Self> {
        let replacements = rules
            .into_iter()
            .filter(|r| !r.from.is_empty())
            .map(|r| {
                let re = RegexBuilder::new(&regex::escape(&r.from))
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| Error::Pattern {
                        table: "correction",
                        pattern: r.from.clone(),
                        source,
                    })?;
                Ok((re, r.to))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Corrector { replacements })
    }

    pub fn builtin_rules() -> Vec<CorrectionRule> {
        BUILTIN_CORRECTIONS
            .iter()
            .map(|(from, to)| CorrectionRule {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect()
    }

    /// Fix misread names and misplaced decimal points, then re-categorize.
    pub fn apply(
        &self,
        items: Vec<ReceiptLineItem>,
        categories: &CategoryTable,
    ) -> Vec<ReceiptLineItem> {
        items
            .into_iter()
            .map(|mut item| {
                for (re, to) in &self.replacements {
                    if re.is_match(&item.name) {
                        item.name = re.replace_all(&item.name, NoExpand(to.as_str())).into_owned();
                    }
                }

                if let Some(fixed) = fix_decimal_shift(item.unit_price) {
                    debug!(
                        name = %item.name,
                        from = item.unit_price,
                        to = fixed,
                        "Decimal point restored"
                    );
                    item.unit_price = fixed;
                    item.total_price = round2(fixed * item.quantity);
                }

                item.category = categories.categorize(&item.name);
                item
            })
            .collect()
    }
}

impl Default for Corrector {
    fn default() -> Self {
        Corrector::new(Self::builtin_rules()).expect("builtin corrections are valid")
    }
}

/// A whole number in 1000..=9999 is read as a price that lost its decimal
/// point: 9850 -> 98.50. Genuine four-digit rupee prices are misread too.
fn fix_decimal_shift(unit_price: f64) -> Option<f64> {
    let is_four_digit_whole = unit_price.fract() == 0.0 && (1000.0..=9999.0).contains(&unit_price);
    if unit_price > 100.0 && is_four_digit_whole {
        Some(round2(unit_price / 100.0))
    } else {
        None
    }
}
