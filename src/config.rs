// src/config.rs

use crate::error::{Error, Result};
use crate::heuristics::catalogue::CatalogueEntry;
use crate::heuristics::category::CategoryRule;
use crate::heuristics::correction::CorrectionRule;
use crate::heuristics::header::{TotalsPolicy, VendorRule};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Top-level TOML config. Every section is optional; a lookup table given
/// here replaces the built-in one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub extraction: ExtractionSection,
    #[serde(default)]
    pub vendors: Option<Vec<VendorRule>>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryRule>>,
    #[serde(default)]
    pub catalogue: Option<Vec<CatalogueEntry>>,
    #[serde(default)]
    pub corrections: Option<Vec<CorrectionRule>>,
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSection {
    #[serde(default)]
    pub totals: TotalsPolicy,
    #[serde(default = "default_vendor_scan_lines")]
    pub vendor_scan_lines: usize,
    #[serde(default = "default_price_lookahead")]
    pub price_lookahead: usize,
    #[serde(default = "default_keep_raw_text")]
    pub keep_raw_text: bool,
}

fn default_vendor_scan_lines() -> usize {
    10
}

fn default_price_lookahead() -> usize {
    3
}

fn default_keep_raw_text() -> bool {
    true
}

impl Default for ExtractionSection {
    fn default() -> Self {
        ExtractionSection {
            totals: TotalsPolicy::default(),
            vendor_scan_lines: default_vendor_scan_lines(),
            price_lookahead: default_price_lookahead(),
            keep_raw_text: default_keep_raw_text(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: default_log_filter(),
            extraction: ExtractionSection::default(),
            vendors: None,
            categories: None,
            catalogue: None,
            corrections: None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::ReceiptExtractor;
    use crate::heuristics::category::Category;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.extraction.totals, TotalsPolicy::Lenient);
        assert_eq!(cfg.extraction.vendor_scan_lines, 10);
        assert_eq!(cfg.extraction.price_lookahead, 3);
        assert!(cfg.extraction.keep_raw_text);
        assert!(cfg.vendors.is_none());
        assert!(cfg.catalogue.is_none());
    }

    #[test]
    fn test_sections_override_builtins() {
        let file = write_config(
            r#"
log_filter = "receipt_parse=debug"

[extraction]
totals = "strict"
keep_raw_text = false

[[vendors]]
pattern = "corner\\s*shop"
name = "Corner Shop"

[[categories]]
label = "Snacks"
keywords = ["samosa"]

[[catalogue]]
pattern = "samosa"
name = "Samosa"
quantity = 4.0
unit_price = 12.5

[[corrections]]
from = "Samosaa"
to = "Samosa"
"#,
        );
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.log_filter, "receipt_parse=debug");
        assert_eq!(cfg.extraction.totals, TotalsPolicy::Strict);
        assert_eq!(cfg.extraction.price_lookahead, 3);

        let extractor = ReceiptExtractor::from_config(&cfg).unwrap();
        let r = extractor.extract("Corner Shop\nSamosa x4\nAmul Butter");
        assert_eq!(r.vendor, "Corner Shop");
        assert_eq!(r.raw_text, None);
        assert_eq!(r.items.len(), 1);
        assert_eq!(r.items[0].name, "Samosa");
        assert_eq!(r.items[0].quantity, 4.0);
        assert_eq!(r.items[0].total_price, 50.0);
        assert_eq!(r.items[0].category, Category::Snacks);
        assert_eq!(r.total, 50.0);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/receipt-parse.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[extraction\ntotals = ");
        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_totals_policy() {
        let file = write_config("[extraction]\ntotals = \"fuzzy\"\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_bad_pattern_rejected_at_build() {
        let file = write_config("[[catalogue]]\npattern = \"(unclosed\"\nname = \"X\"\n");
        let cfg = Config::load(file.path()).unwrap();
        let err = ReceiptExtractor::from_config(&cfg).unwrap_err();
        assert!(matches!(err, Error::Pattern { table: "catalogue", .. }));
    }
}
