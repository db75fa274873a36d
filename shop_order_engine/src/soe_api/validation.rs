//! Request validation. Everything here runs before the store is touched, so a rejected request has no side effects.
use crate::{db_types::NewOrder, traits::OrderFlowError};

pub const MAX_LINES_PER_ORDER: usize = 100;
pub const MAX_LINE_QUANTITY: i64 = 1_000;
pub const MAX_PAYMENT_METHOD_LEN: usize = 50;
pub const MAX_NOTES_LEN: usize = 1_000;
pub const MAX_LINE_ATTRIBUTE_LEN: usize = 100;
pub const MAX_TRACKING_NUMBER_LEN: usize = 100;

fn invalid<S: Into<String>>(msg: S) -> OrderFlowError {
    OrderFlowError::ValidationFailed(msg.into())
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), OrderFlowError> {
    match value {
        Some(v) if v.chars().count() > max => Err(invalid(format!("{field} may not be longer than {max} characters"))),
        _ => Ok(()),
    }
}

pub fn validate_new_order(order: &NewOrder) -> Result<(), OrderFlowError> {
    if order.items.is_empty() {
        return Err(invalid("An order must contain at least one item"));
    }
    if order.items.len() > MAX_LINES_PER_ORDER {
        return Err(invalid(format!("An order may not contain more than {MAX_LINES_PER_ORDER} items")));
    }
    let method_len = order.payment_method.trim().chars().count();
    if method_len == 0 || method_len > MAX_PAYMENT_METHOD_LEN {
        return Err(invalid(format!("The payment method must be between 1 and {MAX_PAYMENT_METHOD_LEN} characters")));
    }
    check_len("Order notes", order.notes.as_deref(), MAX_NOTES_LEN)?;
    for (i, item) in order.items.iter().enumerate() {
        if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) {
            return Err(invalid(format!(
                "Item {} (product {}) has quantity {}. Quantities must be between 1 and {MAX_LINE_QUANTITY}",
                i + 1,
                item.product_id,
                item.quantity
            )));
        }
        check_len("Color", item.color.as_deref(), MAX_LINE_ATTRIBUTE_LEN)?;
        check_len("Size", item.size.as_deref(), MAX_LINE_ATTRIBUTE_LEN)?;
        check_len("Item note", item.note.as_deref(), MAX_LINE_ATTRIBUTE_LEN)?;
    }
    Ok(())
}

/// Trims the tracking number, treating a blank one as absent.
pub fn normalize_tracking_number(tracking: Option<String>) -> Result<Option<String>, OrderFlowError> {
    let tracking = tracking.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    check_len("The tracking number", tracking.as_deref(), MAX_TRACKING_NUMBER_LEN)?;
    Ok(tracking)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::NewOrderItem;

    fn order() -> NewOrder {
        NewOrder::new(1, 1, "card").with_item(NewOrderItem::new(1, 3))
    }

    #[test]
    fn accepts_a_reasonable_order() {
        let order = order().with_notes("Leave at the door").with_item(NewOrderItem::new(2, 1).with_size("XL"));
        assert!(validate_new_order(&order).is_ok());
    }

    #[test]
    fn rejects_empty_orders() {
        let order = NewOrder::new(1, 1, "card");
        assert!(matches!(validate_new_order(&order), Err(OrderFlowError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_bad_quantities() {
        for q in [0, -1, MAX_LINE_QUANTITY + 1] {
            let order = NewOrder::new(1, 1, "card").with_item(NewOrderItem::new(1, q));
            assert!(validate_new_order(&order).is_err(), "quantity {q} should be rejected");
        }
        let order = NewOrder::new(1, 1, "card").with_item(NewOrderItem::new(1, MAX_LINE_QUANTITY));
        assert!(validate_new_order(&order).is_ok());
    }

    #[test]
    fn rejects_too_many_lines() {
        let mut order = NewOrder::new(1, 1, "card");
        order.items = (0..=MAX_LINES_PER_ORDER as i64).map(|i| NewOrderItem::new(i + 1, 1)).collect();
        assert!(validate_new_order(&order).is_err());
        order.items.pop();
        assert!(validate_new_order(&order).is_ok());
    }

    #[test]
    fn rejects_oversized_text() {
        let mut o = order();
        o.payment_method = "  ".into();
        assert!(validate_new_order(&o).is_err());
        o.payment_method = "x".repeat(MAX_PAYMENT_METHOD_LEN + 1);
        assert!(validate_new_order(&o).is_err());
        let o = order().with_notes("n".repeat(MAX_NOTES_LEN + 1));
        assert!(validate_new_order(&o).is_err());
        let o = NewOrder::new(1, 1, "card").with_item(NewOrderItem::new(1, 1).with_color("c".repeat(101)));
        assert!(validate_new_order(&o).is_err());
    }

    #[test]
    fn blank_tracking_numbers_are_dropped() {
        assert_eq!(normalize_tracking_number(Some("  ".into())).unwrap(), None);
        assert_eq!(normalize_tracking_number(Some(" TRK-1 ".into())).unwrap(), Some("TRK-1".to_string()));
        assert!(normalize_tracking_number(Some("t".repeat(101))).is_err());
    }
}
