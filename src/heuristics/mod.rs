// src/heuristics/mod.rs

pub mod catalogue;
pub mod category;
pub mod correction;
pub mod header;
pub mod normalize;
pub mod review;
pub mod table;

use crate::config::Config;
use crate::error::{Error, Result};
use catalogue::{Catalogue, ItemSource, arbitrate};
use category::{Category, CategoryTable};
use correction::Corrector;
use header::{TotalsPolicy, VendorDetector};
use normalize::round2;
use regex::{Regex, RegexBuilder};
use review::ReviewIssue;
use serde::{Deserialize, Serialize};
use table::TableExtractor;
use tracing::{debug, info, info_span};

/// A single purchased line on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLineItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub category: Category,
}

/// Everything extracted from one receipt. Every field is always populated;
/// undetected values carry their documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReceipt {
    pub vendor: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub total: f64,
    pub items: Vec<ReceiptLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl ParsedReceipt {
    pub fn review(&self) -> Vec<ReviewIssue> {
        review::review(self)
    }
}

/// Keep the printed total; derive it from the items when none was printed.
pub fn reconcile(printed_total: f64, items: &[ReceiptLineItem]) -> f64 {
    if printed_total == 0.0 && !items.is_empty() {
        round2(items.iter().map(|i| i.total_price).sum())
    } else {
        printed_total
    }
}

pub(crate) fn compile_pattern(table: &'static str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::Pattern {
            table,
            pattern: pattern.to_string(),
            source,
        })
}

/// The rule-based receipt extraction engine.
///
/// Holds the compiled lookup tables; extraction itself is a pure function of
/// the input text, so one extractor can serve any number of threads.
#[derive(Debug, Clone)]
pub struct ReceiptExtractor {
    categories: CategoryTable,
    vendors: VendorDetector,
    catalogue: Catalogue,
    corrector: Corrector,
    totals: TotalsPolicy,
    price_lookahead: usize,
    keep_raw_text: bool,
}

impl ReceiptExtractor {
    pub fn new(
        categories: CategoryTable,
        vendors: VendorDetector,
        catalogue: Catalogue,
        corrector: Corrector,
    ) -> Self {
        ReceiptExtractor {
            categories,
            vendors,
            catalogue,
            corrector,
            totals: TotalsPolicy::default(),
            price_lookahead: 3,
            keep_raw_text: true,
        }
    }

    /// Compile the tables named in the config, falling back to the built-in
    /// table for every section the config leaves out.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let ext = &cfg.extraction;

        let categories = CategoryTable::new(
            cfg.categories
                .clone()
                .unwrap_or_else(CategoryTable::builtin_rules),
        );
        let vendors = VendorDetector::new(
            cfg.vendors
                .clone()
                .unwrap_or_else(VendorDetector::builtin_rules),
            ext.vendor_scan_lines,
        )?;
        let catalogue = Catalogue::new(
            cfg.catalogue
                .clone()
                .unwrap_or_else(Catalogue::builtin_entries),
        )?;
        let corrector = Corrector::new(
            cfg.corrections
                .clone()
                .unwrap_or_else(Corrector::builtin_rules),
        )?;

        Ok(ReceiptExtractor::new(categories, vendors, catalogue, corrector)
            .with_totals_policy(ext.totals)
            .with_price_lookahead(ext.price_lookahead)
            .with_raw_text(ext.keep_raw_text))
    }

    pub fn with_totals_policy(mut self, totals: TotalsPolicy) -> Self {
        self.totals = totals;
        self
    }

    pub fn with_price_lookahead(mut self, lines: usize) -> Self {
        self.price_lookahead = lines;
        self
    }

    pub fn with_raw_text(mut self, keep: bool) -> Self {
        self.keep_raw_text = keep;
        self
    }

    /// Turn raw OCR text into a structurally complete receipt. Never fails.
    pub fn extract(&self, text: &str) -> ParsedReceipt {
        self.extract_with_source(text).0
    }

    /// Same as [`extract`](Self::extract), also reporting which extractor won.
    pub fn extract_with_source(&self, text: &str) -> (ParsedReceipt, ItemSource) {
        let _span = info_span!("receipt", bytes = text.len()).entered();

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let vendor = self.vendors.detect(&lines);
        let date = header::detect_date(&lines).unwrap_or_else(normalize::today_iso);
        let printed_total = header::detect_total(&lines, self.totals);

        // Both extractors always run; arbitration picks one list.
        let table_items =
            TableExtractor::new(&self.categories, self.price_lookahead).extract(&lines);
        let catalogue_items = self.catalogue.extract(text, &self.categories);
        debug!(
            table = table_items.len(),
            catalogue = catalogue_items.len(),
            "Item candidates"
        );
        let (chosen, source) = arbitrate(table_items, catalogue_items);

        let items = self.corrector.apply(chosen, &self.categories);
        let total = reconcile(printed_total, &items);

        info!(
            vendor = %vendor,
            date = %date,
            total,
            printed_total = printed_total > 0.0,
            items = items.len(),
            source = ?source,
            "Receipt extracted"
        );

        let receipt = ParsedReceipt {
            vendor,
            date,
            total,
            items,
            raw_text: self.keep_raw_text.then(|| text.to_string()),
        };
        (receipt, source)
    }
}

impl Default for ReceiptExtractor {
    fn default() -> Self {
        ReceiptExtractor::new(
            CategoryTable::default(),
            VendorDetector::default(),
            Catalogue::default(),
            Corrector::default(),
        )
    }
}
