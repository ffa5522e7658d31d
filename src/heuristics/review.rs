// src/heuristics/review.rs

use super::ParsedReceipt;
use super::header::UNKNOWN_VENDOR;
use super::normalize::round2;
use serde::Serialize;
use std::fmt;

const TOLERANCE: f64 = 0.01;

/// Something a human should look at before the receipt is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewIssue {
    UnknownVendor,
    NoItems,
    NonPositiveAmount { index: usize },
    ItemPriceMismatch { index: usize },
    TotalMismatch { printed: f64, computed: f64 },
}

impl fmt::Display for ReviewIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewIssue::UnknownVendor => write!(f, "vendor not recognised"),
            ReviewIssue::NoItems => write!(f, "no line items found"),
            ReviewIssue::NonPositiveAmount { index } => {
                write!(f, "item {index} has a zero or negative quantity or amount")
            }
            ReviewIssue::ItemPriceMismatch { index } => {
                write!(f, "item {index}: unit price x quantity does not match its total")
            }
            ReviewIssue::TotalMismatch { printed, computed } => {
                write!(f, "printed total {printed:.2} differs from item sum {computed:.2}")
            }
        }
    }
}

pub fn review(receipt: &ParsedReceipt) -> Vec<ReviewIssue> {
    let mut issues = Vec::new();

    if receipt.vendor == UNKNOWN_VENDOR {
        issues.push(ReviewIssue::UnknownVendor);
    }
    if receipt.items.is_empty() {
        issues.push(ReviewIssue::NoItems);
        return issues;
    }

    for (index, item) in receipt.items.iter().enumerate() {
        if item.quantity <= 0.0 || item.total_price <= 0.0 {
            issues.push(ReviewIssue::NonPositiveAmount { index });
            continue;
        }
        let expected = item.unit_price * item.quantity;
        if (expected - item.total_price).abs() > TOLERANCE * item.quantity.max(1.0) {
            issues.push(ReviewIssue::ItemPriceMismatch { index });
        }
    }

    let computed = round2(receipt.items.iter().map(|i| i.total_price).sum());
    if (receipt.total - computed).abs() > TOLERANCE {
        issues.push(ReviewIssue::TotalMismatch {
            printed: receipt.total,
            computed,
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::ReceiptLineItem;
    use crate::heuristics::category::Category;

    fn receipt(vendor: &str, total: f64, items: Vec<ReceiptLineItem>) -> ParsedReceipt {
        ParsedReceipt {
            vendor: vendor.to_string(),
            date: "2023-07-24".to_string(),
            total,
            items,
            raw_text: None,
        }
    }

    fn item(quantity: f64, unit_price: f64, total_price: f64) -> ReceiptLineItem {
        ReceiptLineItem {
            name: "Curd".to_string(),
            quantity,
            unit_price,
            total_price,
            category: Category::Dairy,
        }
    }

    #[test]
    fn test_clean_receipt() {
        let r = receipt("KPN Fresh", 78.0, vec![item(2.0, 26.0, 52.0), item(1.0, 26.0, 26.0)]);
        assert!(review(&r).is_empty());
    }

    #[test]
    fn test_empty_receipt() {
        let r = receipt(UNKNOWN_VENDOR, 0.0, Vec::new());
        assert_eq!(review(&r), [ReviewIssue::UnknownVendor, ReviewIssue::NoItems]);
    }

    #[test]
    fn test_mismatches() {
        let r = receipt("DMart", 100.0, vec![item(2.0, 26.0, 50.0), item(1.0, 0.0, 0.0)]);
        assert_eq!(
            review(&r),
            [
                ReviewIssue::ItemPriceMismatch { index: 0 },
                ReviewIssue::NonPositiveAmount { index: 1 },
                ReviewIssue::TotalMismatch {
                    printed: 100.0,
                    computed: 50.0
                },
            ]
        );
    }

    #[test]
    fn test_display() {
        let issue = ReviewIssue::TotalMismatch {
            printed: 339.5,
            computed: 279.0,
        };
        assert_eq!(issue.to_string(), "printed total 339.50 differs from item sum 279.00");
    }
}
