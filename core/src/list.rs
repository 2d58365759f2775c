//! Stateless rendering of the item collection.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Item, ItemId};

pub const EMPTY_MESSAGE: &str = "No items yet. Create your first item to get started.";

const HEADERS: [&str; 6] = ["#", "Name", "Description", "Quantity", "Price", "Updated"];

/// `7.5` renders as `$7.50`.
pub fn format_price(price: Decimal) -> String {
    let mut cents = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    cents.rescale(2);
    format!("${cents}")
}

pub fn format_timestamp<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    ts.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub quantity: String,
    pub price: String,
    pub updated: String,
}

/// What a row action resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    Edit(Item),
    Delete(ItemId),
}

/// A read-only view over the items, in the order the server returned them.
#[derive(Debug, Clone, Copy)]
pub struct ItemList<'a> {
    items: &'a [Item],
    disabled: bool,
}

impl<'a> ItemList<'a> {
    pub fn new(items: &'a [Item], disabled: bool) -> Self {
        Self { items, disabled }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn rows_in<Tz>(&self, tz: &Tz) -> Vec<ItemRow>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.items
            .iter()
            .map(|item| ItemRow {
                id: item.id.clone(),
                name: item.name.clone(),
                description: item.description.clone(),
                quantity: item.quantity.to_string(),
                price: format_price(item.price),
                updated: format_timestamp(&item.updated_at, tz),
            })
            .collect()
    }

    /// Rows with timestamps in the viewer's local time zone.
    pub fn rows(&self) -> Vec<ItemRow> {
        self.rows_in(&chrono::Local)
    }

    /// The Edit action of row `index`; `None` when disabled or out of range.
    pub fn edit(&self, index: usize) -> Option<ListAction> {
        self.action(index, |item| ListAction::Edit(item.clone()))
    }

    /// The Delete action of row `index`; `None` when disabled or out of range.
    pub fn delete(&self, index: usize) -> Option<ListAction> {
        self.action(index, |item| ListAction::Delete(item.id.clone()))
    }

    fn action(&self, index: usize, f: impl FnOnce(&Item) -> ListAction) -> Option<ListAction> {
        if self.disabled {
            return None;
        }
        self.items.get(index).map(f)
    }

    /// Plain-text table for a terminal, numbered from 1.
    pub fn render_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if self.is_empty() {
            return EMPTY_MESSAGE.to_string();
        }
        let rows: Vec<[String; 6]> = self
            .rows_in(tz)
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                [
                    (i + 1).to_string(),
                    row.name,
                    row.description,
                    row.quantity,
                    row.price,
                    row.updated,
                ]
            })
            .collect();

        let mut widths = HEADERS.map(|h| h.chars().count());
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(widths)
                .map(|(cell, w)| format!("{cell:<w$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = Vec::with_capacity(rows.len() + 2);
        out.push(line(&HEADERS.map(String::from)));
        out.push(line(&widths.map(|w| "-".repeat(w))));
        out.extend(rows.iter().map(|row| line(row)));
        out.join("\n")
    }
}

impl fmt::Display for ItemList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_in(&chrono::Local))
    }
}
