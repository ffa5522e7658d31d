// src/heuristics/category.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of product categories an item can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Dairy,
    Produce,
    Meat,
    Bakery,
    Grains,
    Beverages,
    Spices,
    Snacks,
    Household,
    Oil,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Dairy => "Dairy",
            Category::Produce => "Produce",
            Category::Meat => "Meat",
            Category::Bakery => "Bakery",
            Category::Grains => "Grains",
            Category::Beverages => "Beverages",
            Category::Spices => "Spices",
            Category::Snacks => "Snacks",
            Category::Household => "Household",
            Category::Oil => "Oil",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declaration order matters: the first category with a matching keyword wins.
const BUILTIN_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Dairy,
        &["milk", "cheese", "yogurt", "butter", "cream", "paneer", "curd", "ghee", "amul"],
    ),
    (
        Category::Produce,
        &[
            "banana", "apple", "orange", "spinach", "lettuce", "tomato", "onion", "carrot",
            "potato", "mango",
        ],
    ),
    (Category::Meat, &["chicken", "mutton", "fish", "prawns", "eggs"]),
    (
        Category::Bakery,
        &["bread", "pav", "bun", "rusk", "cake", "biscuit", "britannia"],
    ),
    (
        Category::Grains,
        &["rice", "wheat", "atta", "flour", "dal", "basmati", "aashirvaad"],
    ),
    (
        Category::Beverages,
        &["tea", "coffee", "juice", "water", "cola", "tata", "nescafe"],
    ),
    (
        Category::Spices,
        &["turmeric", "chili", "coriander", "cumin", "garam", "masala", "mdh", "everest"],
    ),
    (
        Category::Snacks,
        &["chips", "namkeen", "biscuits", "maggi", "noodles", "kurkure"],
    ),
    (
        Category::Household,
        &["soap", "detergent", "shampoo", "surf", "vim", "lizol"],
    ),
    (
        Category::Oil,
        &["oil", "sunflower", "coconut", "mustard", "fortune", "saffola"],
    ),
];

/// One row of the keyword table, as written in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: Category,
    pub keywords: Vec<String>,
}

/// Ordered keyword table mapping item names to categories.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<(Category, Vec<String>)>,
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| {
                let keywords = r
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (r.label, keywords)
            })
            .collect();
        CategoryTable { rules }
    }

    pub fn builtin_rules() -> Vec<CategoryRule> {
        BUILTIN_KEYWORDS
            .iter()
            .map(|(label, keywords)| CategoryRule {
                label: *label,
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect()
    }

    /// Case-insensitive substring match; `Other` when nothing hits.
    pub fn categorize(&self, name: &str) -> Category {
        let lower = name.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|(label, _)| *label)
            .unwrap_or(Category::Other)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        CategoryTable::new(Self::builtin_rules())
    }
}
