// src/heuristics/header.rs

use super::compile_pattern;
use super::normalize::{parse_currency, parse_date, round2};
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_VENDOR: &str = "Unknown Store";

/// Known retail chains and the OCR misspellings seen for them.
const BUILTIN_VENDORS: &[(&str, &str)] = &[
    (r"kpn\s*farm\s*fresh", "KPN Farm Fresh"),
    (r"kpn\s*fresh", "KPN Fresh"),
    (r"big\s*bazaa?r", "Big Bazaar"),
    (r"reliance\s*fresh", "Reliance Fresh"),
    (r"d[-\s]*mart", "DMart"),
    (r"avenue\s*super\s*marts?", "DMart"),
    (r"spencer", "Spencer's"),
    (r"more\s*retail", "More"),
];

static BILL_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:bill\s+no.*?date|bill\s+date|invoice\s+date)\s*[:.]?\s*(\d{1,2}[-/]\d{1,2}[-/]\d{2,4})",
    )
    .unwrap()
});

// "Sub Total 339 50": rupees and paise split by OCR.
static SUB_TOTAL_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)sub\s*total\s+(\d+)\s+(\d{2})\b").unwrap());

static TOTAL_COLON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)total\s*:\s*((?:₹|rs\.?|inr)?\s*\d[\d,]*(?:\.\d+)?)").unwrap()
});

static TOTAL_ANY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)total.*?((?:₹|rs\.?|inr)?\s*\d[\d,]*(?:\.\d+)?)").unwrap()
});

/// How far the printed-total search may reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalsPolicy {
    /// Anchored rules plus the generic "total ... number" fallback.
    #[default]
    Lenient,
    /// Only the "sub total" and "total:" anchored rules.
    Strict,
}

/// One vendor signature, as written in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorRule {
    pub pattern: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct VendorDetector {
    signatures: Vec<(Regex, String)>,
    scan_lines: usize,
}

impl VendorDetector {
    pub fn new(rules: Vec<VendorRule>, scan_lines: usize) -> Result<Self> {
        let signatures = rules
            .into_iter()
            .map(|r| Ok((compile_pattern("vendor", &r.pattern)?, r.name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(VendorDetector {
            signatures,
            scan_lines,
        })
    }

    pub fn builtin_rules() -> Vec<VendorRule> {
        BUILTIN_VENDORS
            .iter()
            .map(|(pattern, name)| VendorRule {
                pattern: pattern.to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    /// Canonical vendor name from the leading lines, or the sentinel.
    ///
    /// Lines are tried in order; within a line the first signature wins.
    pub fn detect(&self, lines: &[&str]) -> String {
        lines
            .iter()
            .take(self.scan_lines)
            .find_map(|line| {
                self.signatures
                    .iter()
                    .find(|(re, _)| re.is_match(line))
                    .map(|(_, name)| name.clone())
            })
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string())
    }
}

impl Default for VendorDetector {
    fn default() -> Self {
        VendorDetector::new(Self::builtin_rules(), 10).expect("builtin vendor patterns are valid")
    }
}

/// First labelled bill/invoice date that parses, if any.
pub fn detect_date(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        BILL_DATE
            .captures(line)
            .and_then(|c| parse_date(&c[1]))
    })
}

/// Printed total, or 0 when the receipt shows none.
///
/// Rules run in priority order over all lines; the first rule that yields a
/// positive amount wins.
pub fn detect_total(lines: &[&str], policy: TotalsPolicy) -> f64 {
    if let Some(total) = lines.iter().find_map(|line| sub_total_split(line)) {
        return total;
    }
    if let Some(total) = lines.iter().find_map(|line| amount_after(&TOTAL_COLON, line)) {
        return total;
    }
    if policy == TotalsPolicy::Lenient {
        if let Some(total) = lines.iter().find_map(|line| amount_after(&TOTAL_ANY, line)) {
            return total;
        }
    }
    0.0
}

fn sub_total_split(line: &str) -> Option<f64> {
    let caps = SUB_TOTAL_SPLIT.captures(line)?;
    let whole: u64 = caps[1].parse().ok()?;
    let paise: u64 = caps[2].parse().ok()?;
    Some(round2(whole as f64 + paise as f64 / 100.0))
}

fn amount_after(re: &Regex, line: &str) -> Option<f64> {
    let caps = re.captures(line)?;
    Some(parse_currency(&caps[1])).filter(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> VendorDetector {
        VendorDetector::new(VendorDetector::builtin_rules(), 10).unwrap()
    }

    #[test]
    fn test_vendor_detection() {
        let d = detector();
        assert_eq!(d.detect(&["TAX INVOICE", "KPN FARM FRESH PVT LTD"]), "KPN Farm Fresh");
        assert_eq!(d.detect(&["Kpn Fresh", "Avenue Supermarts"]), "KPN Fresh");
        assert_eq!(d.detect(&["AVENUE SUPERMARTS LTD"]), "DMart");
        assert_eq!(d.detect(&["D-Mart Ready"]), "DMart");
        assert_eq!(d.detect(&["corner shop"]), UNKNOWN_VENDOR);
        assert_eq!(d.detect(&[]), UNKNOWN_VENDOR);
    }

    #[test]
    fn test_vendor_only_in_leading_lines() {
        let d = detector();
        let mut lines = vec!["header"; 10];
        lines.push("Big Bazaar");
        assert_eq!(d.detect(&lines), UNKNOWN_VENDOR);
        lines.remove(0);
        assert_eq!(d.detect(&lines), "Big Bazaar");
    }

    #[test]
    fn test_invalid_vendor_pattern_is_rejected() {
        let rules = vec![VendorRule {
            pattern: "kpn(".to_string(),
            name: "KPN".to_string(),
        }];
        assert!(VendorDetector::new(rules, 10).is_err());
    }

    #[test]
    fn test_bill_date() {
        let lines = ["Date 01-01-22", "Bill No: 1234 Date 24-07-23", "Invoice Date: 02/08/2023"];
        assert_eq!(detect_date(&lines).as_deref(), Some("2023-07-24"));
        assert_eq!(detect_date(&["Invoice Date: 02/08/2023"]).as_deref(), Some("2023-08-02"));
        assert_eq!(detect_date(&["Bill No 9 Date 45-07-23"]), None);
        assert_eq!(detect_date(&["no dates here"]), None);
    }

    #[test]
    fn test_sub_total_split_wins() {
        let lines = ["Total Items 3", "Sub Total 339 50", "TOTAL: 400.00"];
        assert_eq!(detect_total(&lines, TotalsPolicy::Lenient), 339.50);
    }

    #[test]
    fn test_total_colon() {
        let lines = ["Items 12", "TOTAL: ₹885.16"];
        assert_eq!(detect_total(&lines, TotalsPolicy::Strict), 885.16);
        assert_eq!(detect_total(&["Total : Rs. 1,234.00"], TotalsPolicy::Strict), 1234.00);
    }

    #[test]
    fn test_generic_total_only_when_lenient() {
        let lines = ["Grand Total Rs 512.40"];
        assert_eq!(detect_total(&lines, TotalsPolicy::Lenient), 512.40);
        assert_eq!(detect_total(&lines, TotalsPolicy::Strict), 0.0);
    }

    #[test]
    fn test_no_total() {
        assert_eq!(detect_total(&["Thank you", "Visit again"], TotalsPolicy::Lenient), 0.0);
        assert_eq!(detect_total(&[], TotalsPolicy::Lenient), 0.0);
    }
}
