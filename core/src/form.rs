//! Create/edit form state.
//!
//! Raw text is kept per field so the view can echo exactly what was typed.
//! Numeric fields are parsed on every change; a value that does not parse is
//! recorded as a `FieldError` and blocks `submit` rather than being coerced.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Draft, Item};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Description,
    Quantity,
    Price,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Description, Field::Quantity, Field::Price];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Description => "Description",
            Field::Quantity => "Quantity",
            Field::Price => "Price",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("is required")]
    Required,
    #[error("must be a whole number")]
    NotAnInteger,
    #[error("must be a number")]
    NotANumber,
    #[error("must not be negative")]
    Negative,
    #[error("must have at most two decimal places")]
    TooPrecise,
    #[error("must have at most eight digits before the decimal point")]
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("form is disabled while a request is in flight")]
    Disabled,
    #[error("form has invalid fields")]
    Invalid(BTreeMap<Field, FieldError>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum FormMode {
    #[default]
    Create,
    Edit(Item),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    mode: FormMode,
    name: String,
    description: String,
    quantity: String,
    price: String,
    errors: BTreeMap<Field, FieldError>,
    disabled: bool,
}

impl Default for ItemForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemForm {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            name: String::new(),
            description: String::new(),
            quantity: "0".to_string(),
            price: "0".to_string(),
            errors: BTreeMap::new(),
            disabled: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Follow the controller's selection.
    ///
    /// Re-seeds only when the selection actually changed, so calling this on
    /// every render keeps in-progress edits.
    pub fn sync_selection(&mut self, selected: Option<&Item>) {
        let unchanged = match (&self.mode, selected) {
            (FormMode::Create, None) => true,
            (FormMode::Edit(current), Some(item)) => current == item,
            _ => false,
        };
        if !unchanged {
            self.reset_to(selected);
        }
    }

    /// Discard the current draft and return to create mode.
    pub fn reset(&mut self) {
        self.reset_to(None);
    }

    fn reset_to(&mut self, selected: Option<&Item>) {
        let disabled = self.disabled;
        *self = match selected {
            None => Self::new(),
            Some(item) => Self {
                mode: FormMode::Edit(item.clone()),
                name: item.name.clone(),
                description: item.description.clone(),
                quantity: item.quantity.to_string(),
                price: item.price.to_string(),
                errors: BTreeMap::new(),
                disabled,
            },
        };
        self.disabled = disabled;
    }

    /// Leave edit mode. Returns `false` when disabled or already creating.
    pub fn cancel(&mut self) -> bool {
        if self.disabled || !self.is_editing() {
            return false;
        }
        self.reset();
        true
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Description => &self.description,
            Field::Quantity => &self.quantity,
            Field::Price => &self.price,
        }
    }

    pub fn error(&self, field: Field) -> Option<&FieldError> {
        self.errors.get(&field)
    }

    /// Replace one field's text. Ignored while disabled.
    pub fn set_field(&mut self, field: Field, value: &str) {
        if self.disabled {
            return;
        }
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Description => &mut self.description,
            Field::Quantity => &mut self.quantity,
            Field::Price => &mut self.price,
        };
        *slot = value.to_string();

        let outcome = match field {
            Field::Quantity => parse_quantity(value).err(),
            Field::Price => parse_price(value).err(),
            Field::Name | Field::Description => None,
        };
        match outcome {
            Some(err) => {
                self.errors.insert(field, err);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    /// Produce the draft to hand to the controller.
    pub fn submit(&self) -> Result<Draft, SubmitError> {
        if self.disabled {
            return Err(SubmitError::Disabled);
        }
        let mut errors = BTreeMap::new();
        if self.name.trim().is_empty() {
            errors.insert(Field::Name, FieldError::Required);
        }
        let quantity = parse_quantity(&self.quantity).map_err(|e| errors.insert(Field::Quantity, e));
        let price = parse_price(&self.price).map_err(|e| errors.insert(Field::Price, e));

        match (quantity, price) {
            (Ok(quantity), Ok(price)) if errors.is_empty() => Ok(Draft {
                name: self.name.clone(),
                description: self.description.clone(),
                quantity,
                price,
            }),
            _ => Err(SubmitError::Invalid(errors)),
        }
    }

    pub fn title(&self) -> &'static str {
        if self.is_editing() {
            "Update Item"
        } else {
            "Add New Item"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match (self.is_editing(), self.disabled) {
            (false, false) => "Create Item",
            (false, true) => "Creating...",
            (true, false) => "Save Changes",
            (true, true) => "Saving...",
        }
    }

    pub fn can_cancel(&self) -> bool {
        self.is_editing() && !self.disabled
    }
}

pub fn parse_quantity(raw: &str) -> Result<u32, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Required);
    }
    match raw.parse::<u32>() {
        Ok(n) => Ok(n),
        Err(_) if raw.parse::<i64>().is_ok_and(|n| n < 0) => Err(FieldError::Negative),
        Err(_) => Err(FieldError::NotAnInteger),
    }
}

/// Digits allowed before the decimal point of a price.
pub const PRICE_WHOLE_DIGITS: usize = 8;
/// Digits allowed after the decimal point of a price.
pub const PRICE_DECIMAL_PLACES: usize = 2;

/// Parse a non-negative price of the form `digits[.digits]`.
///
/// Only ASCII digits and one `.` are accepted, so separators and exponents
/// are rejected. Leading zeros and trailing fractional zeros do not count
/// towards the digit limits.
pub fn parse_price(raw: &str) -> Result<Decimal, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Required);
    }
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if whole.len() + fraction.len() == 0 || !all_digits(whole) || !all_digits(fraction) {
        return Err(FieldError::NotANumber);
    }

    let whole = whole.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    if negative && !(whole.is_empty() && fraction.is_empty()) {
        return Err(FieldError::Negative);
    }
    if fraction.len() > PRICE_DECIMAL_PLACES {
        return Err(FieldError::TooPrecise);
    }
    if whole.len() > PRICE_WHOLE_DIGITS {
        return Err(FieldError::TooLarge);
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let canonical = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };
    Decimal::from_str(&canonical).map_err(|_| FieldError::NotANumber)
}
