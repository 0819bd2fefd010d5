//! The order aggregate and its pricing.
//!
//! An order's `total_amount` is never taken from the client. Each line is
//! priced from the stored menu item price plus its add-ons, multiplied by the
//! quantity, and the order total is the sum of the lines. The store calls
//! [`Order::recompute_total`] before every write so the invariant survives any
//! later edit of the lines.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::addons::is_known_add_on;
use crate::constants::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS, MAX_SPECIAL_INSTRUCTIONS_LEN};
use crate::error::TransitionError;
use crate::money::Money;
use crate::status::OrderStatus;
use crate::validation::{is_valid_phone, non_blank, ValidationErrors};

// ---------------------------------------------------------------------------
// Payment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Online Payment")]
    OnlinePayment,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::OnlinePayment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::OnlinePayment => "Online Payment",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            "Failed" => Ok(PaymentStatus::Failed),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub name: String,
    pub price: Money,
}

/// One line of an order. `unit_price` is the menu item price resolved on the
/// server when the line was priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(rename = "menuItem")]
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub add_ons: Vec<AddOn>,
}

impl OrderLine {
    pub fn add_ons_total(&self) -> Option<Money> {
        Money::checked_sum(self.add_ons.iter().map(|a| a.price))
    }

    /// `(unit price + add-on prices) * quantity`, or `None` on overflow.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price
            .checked_add(self.add_ons_total()?)?
            .checked_mul(self.quantity)
    }
}

/// Sum of all line subtotals, or `None` on overflow. An empty line set totals
/// zero.
pub fn order_total(lines: &[OrderLine]) -> Option<Money> {
    lines
        .iter()
        .try_fold(Money::ZERO, |acc, line| acc.checked_add(line.subtotal()?))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub restaurant_id: Uuid,
    #[serde(rename = "orderItems")]
    pub items: Vec<OrderLine>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub special_instructions: Option<String>,
    pub delivery_address: Option<String>,
    pub contact_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new `Pending` order from a validated draft and its priced lines.
    pub fn place(
        draft: OrderDraft,
        customer_id: Option<Uuid>,
        items: Vec<OrderLine>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationErrors> {
        let mut order = Self {
            id: Uuid::new_v4(),
            customer_id,
            restaurant_id: draft.restaurant_id,
            items,
            total_amount: Money::ZERO,
            status: OrderStatus::Pending,
            payment_method: draft.payment_method,
            payment_status: PaymentStatus::Pending,
            special_instructions: draft.special_instructions,
            delivery_address: draft.delivery_address,
            contact_number: draft.contact_number,
            created_at: now,
            updated_at: now,
        };
        order.recompute_total()?;
        Ok(order)
    }

    /// Overwrite `total_amount` from the current lines and return it. A total
    /// that does not fit leaves the order untouched.
    pub fn recompute_total(&mut self) -> Result<Money, ValidationErrors> {
        let total = order_total(&self.items)
            .ok_or_else(|| ValidationErrors::single("totalAmount", "Order total is too large"))?;
        self.total_amount = total;
        Ok(total)
    }

    /// Sum of line quantities. Derived, never stored.
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Move to `target` following the lifecycle rules.
    pub fn apply_status(&mut self, target: OrderStatus) -> Result<(), TransitionError> {
        self.status = self.status.transition(target)?;
        Ok(())
    }

    /// Soft delete: the record stays, only the status changes.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.apply_status(OrderStatus::Cancelled)
    }

    /// Model-level rules checked before every persistence.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (i, line) in self.items.iter().enumerate() {
            if line.quantity < 1 {
                errors.push(
                    format!("orderItems[{i}].quantity"),
                    "Quantity must be at least 1",
                );
            }
            if line.quantity > MAX_LINE_QUANTITY {
                errors.push(
                    format!("orderItems[{i}].quantity"),
                    format!("Quantity cannot exceed {MAX_LINE_QUANTITY}"),
                );
            }
            if line.unit_price.is_negative() {
                errors.push(
                    format!("orderItems[{i}].price"),
                    "Price must be a positive number",
                );
            }
            for (j, add_on) in line.add_ons.iter().enumerate() {
                check_add_on(&mut errors, i, j, &add_on.name, add_on.price);
            }
        }

        if self.total_amount.is_negative() {
            errors.push("totalAmount", "Total amount must be a positive number");
        }
        if let Some(text) = &self.special_instructions {
            check_special_instructions(&mut errors, text);
        }
        if let Some(number) = &self.contact_number {
            check_contact_number(&mut errors, number);
        }
        if self.status.requires_delivery_address()
            && non_blank(self.delivery_address.as_deref()).is_none()
        {
            errors.push(
                "deliveryAddress",
                format!("Delivery address is required once an order is {}", self.status),
            );
        }

        errors.into_result(())
    }
}

fn check_add_on(errors: &mut ValidationErrors, line: usize, idx: usize, name: &str, price: Money) {
    let field = format!("orderItems[{line}].addOns[{idx}]");
    if !is_known_add_on(name) {
        errors.push(format!("{field}.name"), format!("{name} is not a valid add-on"));
    }
    if price.is_negative() {
        errors.push(format!("{field}.price"), "Add-on price must be a positive number");
    } else if price.cents() > MAX_PRICE_CENTS {
        errors.push(format!("{field}.price"), "Add-on price is too large");
    }
}

fn check_special_instructions(errors: &mut ValidationErrors, text: &str) {
    if text.chars().count() > MAX_SPECIAL_INSTRUCTIONS_LEN {
        errors.push(
            "specialInstructions",
            format!("Special instructions cannot exceed {MAX_SPECIAL_INSTRUCTIONS_LEN} characters"),
        );
    }
}

fn check_contact_number(errors: &mut ValidationErrors, number: &str) {
    if !is_valid_phone(number) {
        errors.push("contactNumber", format!("{number} is not a valid phone number!"));
    }
}

// ---------------------------------------------------------------------------
// Order requests
// ---------------------------------------------------------------------------

/// Order body as sent by the client. Extra fields such as a client-side
/// `price` or `totalAmount` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub restaurant: Option<String>,
    #[serde(default)]
    pub order_items: Vec<LineInput>,
    pub payment_method: Option<String>,
    pub special_instructions: Option<String>,
    pub delivery_address: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInput {
    pub menu_item: Option<String>,
    pub quantity: Option<i64>,
    #[serde(default)]
    pub add_ons: Vec<AddOnInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddOnInput {
    pub name: Option<String>,
    pub price: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    pub menu_item_id: Uuid,
    pub quantity: u32,
    pub add_ons: Vec<AddOn>,
}

/// A syntactically valid order that still needs server-side pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub restaurant_id: Uuid,
    pub lines: Vec<LineDraft>,
    pub payment_method: Option<PaymentMethod>,
    pub special_instructions: Option<String>,
    pub delivery_address: Option<String>,
    pub contact_number: Option<String>,
}

pub fn validate_order_input(input: &OrderInput) -> Result<OrderDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let restaurant_id = match non_blank(input.restaurant.as_deref()) {
        None => {
            errors.push("restaurant", "Restaurant is required for the order");
            None
        }
        Some(raw) => Uuid::parse_str(&raw).ok().or_else(|| {
            errors.push("restaurant", "Invalid restaurant id");
            None
        }),
    };

    if input.order_items.is_empty() {
        errors.push("orderItems", "An order needs at least one item");
    }

    let mut lines = Vec::with_capacity(input.order_items.len());
    for (i, line) in input.order_items.iter().enumerate() {
        let menu_item_id = match non_blank(line.menu_item.as_deref()) {
            None => {
                errors.push(format!("orderItems[{i}].menuItem"), "Menu item is required");
                None
            }
            Some(raw) => Uuid::parse_str(&raw).ok().or_else(|| {
                errors.push(format!("orderItems[{i}].menuItem"), "Invalid menu item id");
                None
            }),
        };

        let quantity = match line.quantity {
            None => {
                errors.push(format!("orderItems[{i}].quantity"), "Quantity is required");
                None
            }
            Some(q) if q < 1 => {
                errors.push(format!("orderItems[{i}].quantity"), "Quantity must be at least 1");
                None
            }
            Some(q) if q > i64::from(MAX_LINE_QUANTITY) => {
                errors.push(
                    format!("orderItems[{i}].quantity"),
                    format!("Quantity cannot exceed {MAX_LINE_QUANTITY}"),
                );
                None
            }
            Some(q) => u32::try_from(q).ok().or_else(|| {
                errors.push(format!("orderItems[{i}].quantity"), "Quantity is too large");
                None
            }),
        };

        let mut add_ons = Vec::with_capacity(line.add_ons.len());
        for (j, add_on) in line.add_ons.iter().enumerate() {
            let name = non_blank(add_on.name.as_deref()).unwrap_or_default();
            let price = add_on.price.unwrap_or(Money::ZERO);
            check_add_on(&mut errors, i, j, &name, price);
            add_ons.push(AddOn { name, price });
        }

        if let (Some(menu_item_id), Some(quantity)) = (menu_item_id, quantity) {
            lines.push(LineDraft {
                menu_item_id,
                quantity,
                add_ons,
            });
        }
    }

    let payment_method = match non_blank(input.payment_method.as_deref()) {
        None => None,
        Some(raw) => raw.parse::<PaymentMethod>().ok().or_else(|| {
            errors.push("paymentMethod", format!("{raw} is not a valid payment method"));
            None
        }),
    };

    let special_instructions = non_blank(input.special_instructions.as_deref());
    if let Some(text) = &special_instructions {
        check_special_instructions(&mut errors, text);
    }

    let contact_number = non_blank(input.contact_number.as_deref());
    if let Some(number) = &contact_number {
        check_contact_number(&mut errors, number);
    }

    match restaurant_id {
        Some(restaurant_id) if errors.is_empty() => Ok(OrderDraft {
            restaurant_id,
            lines,
            payment_method,
            special_instructions,
            delivery_address: non_blank(input.delivery_address.as_deref()),
            contact_number,
        }),
        _ => Err(errors),
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// The stored facts about a menu item that pricing relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedMenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: Money,
    pub is_available: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Menu item not found: {0}")]
    UnknownMenuItem(Uuid),

    #[error("{0}")]
    Invalid(ValidationErrors),
}

/// Resolve each draft line against the stored menu and produce priced lines.
///
/// Every referenced item must exist, belong to `restaurant_id`, and be
/// available.
pub fn price_lines(
    restaurant_id: Uuid,
    lines: &[LineDraft],
    menu: &HashMap<Uuid, PricedMenuItem>,
) -> Result<Vec<OrderLine>, PricingError> {
    let mut errors = ValidationErrors::new();
    let mut priced = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let item = menu
            .get(&line.menu_item_id)
            .ok_or(PricingError::UnknownMenuItem(line.menu_item_id))?;

        if item.restaurant_id != restaurant_id {
            errors.push(
                format!("orderItems[{i}].menuItem"),
                format!("{} is not on this restaurant's menu", item.name),
            );
            continue;
        }
        if !item.is_available {
            errors.push(
                format!("orderItems[{i}].menuItem"),
                format!("{} is currently unavailable", item.name),
            );
            continue;
        }

        priced.push(OrderLine {
            menu_item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity: line.quantity,
            add_ons: line.add_ons.clone(),
        });
    }

    errors.into_result(priced).map_err(PricingError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, quantity: u32, add_ons: &[(&str, i64)]) -> OrderLine {
        OrderLine {
            menu_item_id: Uuid::new_v4(),
            name: "Item".into(),
            unit_price: Money::from_cents(price_cents),
            quantity,
            add_ons: add_ons
                .iter()
                .map(|(n, p)| AddOn {
                    name: n.to_string(),
                    price: Money::from_cents(*p),
                })
                .collect(),
        }
    }

    fn order_with(items: Vec<OrderLine>) -> Order {
        let draft = OrderDraft {
            restaurant_id: Uuid::new_v4(),
            lines: Vec::new(),
            payment_method: None,
            special_instructions: None,
            delivery_address: None,
            contact_number: None,
        };
        Order::place(draft, None, items, Utc::now()).unwrap()
    }

    #[test]
    fn test_line_subtotal_includes_add_ons() {
        let l = line(1000, 2, &[("Extra Cheese", 150)]);
        assert_eq!(l.subtotal(), Some(Money::from_cents(2300)));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let order = order_with(vec![
            line(1000, 2, &[("Extra Cheese", 150)]),
            line(999, 3, &[]),
            line(450, 1, &[("Soy Milk", 50), ("Vanilla Syrup", 75)]),
        ]);
        assert_eq!(order.total_amount, Money::from_cents(2300 + 2997 + 575));
        assert_eq!(order.total_items(), 6);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut order = order_with(vec![line(1234, 3, &[("Bacon", 99)])]);
        let first = order.recompute_total().unwrap();
        let second = order.recompute_total().unwrap();
        assert_eq!(first, second);
        assert_eq!(order.total_amount, first);
    }

    #[test]
    fn test_recompute_overwrites_stale_total() {
        let mut order = order_with(vec![line(500, 1, &[])]);
        order.total_amount = Money::from_cents(1);
        order.items.push(line(250, 2, &[]));
        assert_eq!(order.recompute_total(), Ok(Money::from_cents(1000)));
    }

    #[test]
    fn test_empty_lines_total_zero() {
        assert_eq!(order_total(&[]), Some(Money::ZERO));
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let mut order = order_with(vec![line(1000, 1, &[])]);
        order.items.push(line(i64::MAX / 2, 3, &[]));
        let err = order.recompute_total().unwrap_err();
        assert!(err.has_field("totalAmount"));
        assert_eq!(order.total_amount, Money::from_cents(1000));

        let draft = OrderDraft {
            restaurant_id: Uuid::new_v4(),
            lines: Vec::new(),
            payment_method: None,
            special_instructions: None,
            delivery_address: None,
            contact_number: None,
        };
        let wrapped = vec![line(1000, 2, &[("Pepperoni", 5_000_000_000_000_000_000)])];
        assert!(Order::place(draft, None, wrapped, Utc::now()).is_err());
    }

    #[test]
    fn test_delivery_address_required_late_in_lifecycle() {
        let mut order = order_with(vec![line(500, 1, &[])]);
        order.status = OrderStatus::OutForDelivery;
        assert!(order.validate().unwrap_err().has_field("deliveryAddress"));

        order.delivery_address = Some("12 Elm St".into());
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_cancel_keeps_payment_status() {
        let mut order = order_with(vec![line(500, 1, &[])]);
        order.payment_status = PaymentStatus::Paid;
        order.cancel().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert!(order.cancel().is_err());
    }

    fn input_for(menu_item: Uuid, quantity: i64) -> OrderInput {
        OrderInput {
            restaurant: Some(Uuid::new_v4().to_string()),
            order_items: vec![LineInput {
                menu_item: Some(menu_item.to_string()),
                quantity: Some(quantity),
                add_ons: vec![AddOnInput {
                    name: Some("Pepperoni".into()),
                    price: Some(Money::from_cents(100)),
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_order_input() {
        let draft = validate_order_input(&input_for(Uuid::new_v4(), 2)).unwrap();
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].quantity, 2);
        assert_eq!(draft.lines[0].add_ons[0].price, Money::from_cents(100));
    }

    #[test]
    fn test_order_input_rejections() {
        let err = validate_order_input(&input_for(Uuid::new_v4(), 0)).unwrap_err();
        assert!(err.has_field("orderItems[0].quantity"));

        let mut unknown = input_for(Uuid::new_v4(), 1);
        unknown.order_items[0].add_ons[0].name = Some("Gold Leaf".into());
        unknown.order_items[0].add_ons[0].price = Some(Money::from_cents(-5));
        let err = validate_order_input(&unknown).unwrap_err();
        assert!(err.has_field("orderItems[0].addOns[0].name"));
        assert!(err.has_field("orderItems[0].addOns[0].price"));

        let err = validate_order_input(&input_for(Uuid::new_v4(), 1_000_000)).unwrap_err();
        assert!(err.has_field("orderItems[0].quantity"));

        let mut pricey: OrderInput = serde_json::from_value(serde_json::json!({
            "restaurant": Uuid::new_v4().to_string(),
            "orderItems": [{
                "menuItem": Uuid::new_v4().to_string(),
                "quantity": 2,
                "addOns": [{ "name": "Pepperoni", "price": 5.0e16 }],
            }],
        }))
        .unwrap();
        let err = validate_order_input(&pricey).unwrap_err();
        assert!(err.has_field("orderItems[0].addOns[0].price"));
        pricey.order_items[0].add_ons[0].price = Some(Money::from_cents(MAX_PRICE_CENTS));
        assert!(validate_order_input(&pricey).is_ok());

        let mut empty = input_for(Uuid::new_v4(), 1);
        empty.order_items.clear();
        empty.contact_number = Some("nope".into());
        empty.payment_method = Some("Barter".into());
        let err = validate_order_input(&empty).unwrap_err();
        assert!(err.has_field("orderItems"));
        assert!(err.has_field("contactNumber"));
        assert!(err.has_field("paymentMethod"));
    }

    #[test]
    fn test_price_lines_uses_stored_price() {
        let restaurant_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let menu = HashMap::from([(
            item_id,
            PricedMenuItem {
                id: item_id,
                restaurant_id,
                name: "Margherita".into(),
                price: Money::from_cents(1000),
                is_available: true,
            },
        )]);
        let drafts = vec![LineDraft {
            menu_item_id: item_id,
            quantity: 2,
            add_ons: vec![AddOn {
                name: "Extra Cheese".into(),
                price: Money::from_cents(150),
            }],
        }];

        let lines = price_lines(restaurant_id, &drafts, &menu).unwrap();
        assert_eq!(lines[0].unit_price, Money::from_cents(1000));
        assert_eq!(order_total(&lines), Some(Money::from_cents(2300)));

        let other_restaurant = price_lines(Uuid::new_v4(), &drafts, &menu);
        assert!(matches!(other_restaurant, Err(PricingError::Invalid(_))));

        let missing = vec![LineDraft {
            menu_item_id: Uuid::new_v4(),
            quantity: 1,
            add_ons: Vec::new(),
        }];
        assert!(matches!(
            price_lines(restaurant_id, &missing, &menu),
            Err(PricingError::UnknownMenuItem(_))
        ));
    }
}
