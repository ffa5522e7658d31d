// src/heuristics/table.rs

use super::ReceiptLineItem;
use super::category::CategoryTable;
use super::normalize::{parse_number, round2};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Column-header rows that open the item table, tolerant of OCR misreads
/// ("Item" -> "lem", "Rate" -> "Rale", "Qty" -> "Qly").
static TABLE_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)s\.?\s*no\.?.*(?:item|ltem|lem).*mrp.*ra[tl]e.*q[tl]y.*amt",
        r"(?i)sr\.?\s*no\.?.*description.*qty.*rate.*amount",
        r"(?i)particulars.*qty.*rate.*value",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TABLE_FOOTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)sub\s*total|total\s*items|gross\s*amount").unwrap());

static ITEM_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(.+)$").unwrap());

// MRP RATE QTY AMOUNT, optionally preceded by name text and followed by a
// digit-free OCR tail ("T", "|", "*").
static PRICE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(.*?)\s+)?(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)(?:\s*[^\d\s.][^\d]*)?$",
    )
    .unwrap()
});

// name MRP RATE QTY AMOUNT, with nothing after the amount.
static INLINE_PRICE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(.+?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s*$",
    )
    .unwrap()
});

// name QTY RATE AMOUNT
static INLINE_QTY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s+(\d+)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s*$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Searching,
    InTable,
    Done,
}

/// Numbers lifted from a price row or an inline tail.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Prices {
    quantity: f64,
    unit_price: f64,
    total_price: f64,
}

impl Prices {
    /// Unparseable cells fall back to qty 1, rate 0, amount 0.
    fn from_cells(qty: &str, rate: &str, amount: &str) -> Self {
        Prices {
            quantity: parse_number(qty).filter(|q| *q > 0.0).unwrap_or(1.0),
            unit_price: parse_number(rate).unwrap_or(0.0),
            total_price: parse_number(amount).unwrap_or(0.0),
        }
    }
}

/// An item whose name has been read but whose prices have not.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItem {
    pub seq: u32,
    pub name: String,
}

/// Line-driven state machine over the item table of a receipt.
pub struct TableExtractor<'a> {
    categories: &'a CategoryTable,
    lookahead: usize,
    state: TableState,
    pending: Option<PendingItem>,
    items: Vec<ReceiptLineItem>,
}

impl<'a> TableExtractor<'a> {
    pub fn new(categories: &'a CategoryTable, lookahead: usize) -> Self {
        TableExtractor {
            categories,
            lookahead,
            state: TableState::Searching,
            pending: None,
            items: Vec::new(),
        }
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingItem> {
        self.pending.as_ref()
    }

    pub fn items(&self) -> &[ReceiptLineItem] {
        &self.items
    }

    /// Run the machine over every line and hand back the committed items.
    pub fn extract(mut self, lines: &[&str]) -> Vec<ReceiptLineItem> {
        let mut i = 0;
        while i < lines.len() && self.state != TableState::Done {
            let consumed = self.step(lines[i], &lines[i + 1..]);
            i += 1 + consumed;
        }
        if let Some(p) = &self.pending {
            debug!(seq = p.seq, name = %p.name, "Dropping item without prices");
        }
        self.items
    }

    /// Feed one line. `rest` is the text that follows it, used for
    /// look-ahead. Returns how many lines of `rest` were consumed.
    pub fn step(&mut self, line: &str, rest: &[&str]) -> usize {
        let line = line.trim();
        if line.is_empty() {
            return 0;
        }

        match self.state {
            TableState::Done => 0,
            TableState::Searching => {
                if is_header(line) {
                    debug!(line, "Item table header");
                    self.state = TableState::InTable;
                }
                0
            }
            TableState::InTable => self.step_in_table(line, rest),
        }
    }

    fn step_in_table(&mut self, line: &str, rest: &[&str]) -> usize {
        if is_footer(line) {
            debug!(line, items = self.items.len(), "Item table footer");
            self.state = TableState::Done;
            return 0;
        }
        if is_header(line) {
            return 0;
        }

        if let Some((seq, text)) = item_start(line) {
            if let Some(dropped) = self.pending.take() {
                debug!(seq = dropped.seq, name = %dropped.name, "Item superseded before prices");
            }
            return self.start_item(seq, text, rest);
        }

        let Some(mut pending) = self.pending.take() else {
            return 0;
        };
        match price_row(line) {
            Some((prefix, prices)) => {
                if let Some(prefix) = prefix {
                    append_name(&mut pending.name, prefix);
                }
                self.commit(pending, prices);
            }
            None => {
                append_name(&mut pending.name, line);
                debug!(seq = pending.seq, name = %pending.name, "Extended item name");
                self.pending = Some(pending);
            }
        }
        0
    }

    fn start_item(&mut self, seq: u32, text: &str, rest: &[&str]) -> usize {
        let mut pending = PendingItem {
            seq,
            name: clean_name(text),
        };

        // Look ahead for a separate price row; stop at the next item or the footer.
        let mut wrapped: Vec<&str> = Vec::new();
        for (k, next) in rest.iter().take(self.lookahead).enumerate() {
            let next = next.trim();
            if next.is_empty() {
                continue;
            }
            if is_footer(next) || item_start(next).is_some() {
                break;
            }
            if let Some((prefix, prices)) = price_row(next) {
                for w in wrapped {
                    append_name(&mut pending.name, w);
                }
                if let Some(prefix) = prefix {
                    append_name(&mut pending.name, prefix);
                }
                self.commit(pending, prices);
                return k + 1;
            }
            wrapped.push(next);
        }

        // Inline variants: "name MRP RATE QTY AMOUNT", then "name QTY RATE AMOUNT".
        if let Some(caps) = INLINE_PRICE_ROW.captures(text) {
            pending.name = clean_name(&caps[1]);
            let prices = Prices::from_cells(&caps[4], &caps[3], &caps[5]);
            self.commit(pending, prices);
            return 0;
        }
        if let Some(caps) = INLINE_QTY_FIRST.captures(text) {
            pending.name = clean_name(&caps[1]);
            let prices = Prices::from_cells(&caps[2], &caps[3], &caps[4]);
            self.commit(pending, prices);
            return 0;
        }

        self.pending = Some(pending);
        0
    }

    fn commit(&mut self, pending: PendingItem, prices: Prices) {
        let category = self.categories.categorize(&pending.name);
        let item = ReceiptLineItem {
            name: pending.name,
            quantity: prices.quantity,
            unit_price: round2(prices.unit_price),
            total_price: round2(prices.total_price),
            category,
        };
        debug!(
            seq = pending.seq,
            name = %item.name,
            qty = item.quantity,
            unit_price = item.unit_price,
            total_price = item.total_price,
            "Table item"
        );
        self.items.push(item);
    }
}

fn is_header(line: &str) -> bool {
    TABLE_HEADERS.iter().any(|re| re.is_match(line))
}

fn is_footer(line: &str) -> bool {
    TABLE_FOOTER.is_match(line)
}

/// `"3 Kurkure Green"` -> `(3, "Kurkure Green")`. Bare price rows such as
/// `"50 25 1 25"` are not item starts.
fn item_start(line: &str) -> Option<(u32, &str)> {
    let caps = ITEM_START.captures(line)?;
    if matches!(price_row(line), Some((None, _))) {
        return None;
    }
    let seq = caps[1].parse().ok()?;
    let text = caps.get(2)?.as_str().trim();
    Some((seq, text))
}

/// Split a `[text] MRP RATE QTY AMOUNT [noise]` line; MRP is discarded.
fn price_row(line: &str) -> Option<(Option<&str>, Prices)> {
    let caps = PRICE_ROW.captures(line.trim())?;
    let prefix = caps
        .get(1)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty());
    let prices = Prices::from_cells(&caps[4], &caps[3], &caps[5]);
    Some((prefix, prices))
}

fn append_name(name: &mut String, more: &str) {
    let more = clean_name(more);
    if more.is_empty() {
        return;
    }
    if !name.is_empty() {
        name.push(' ');
    }
    name.push_str(&more);
}

fn clean_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
