//! Order status transitions and their side effects.
//!
//! | From \ To  | Processing | Shipped | Delivered | Cancelled | Refunded |
//! |------------|------------|---------|-----------|-----------|----------|
//! | Pending    | A          | A       | A         | C, A (R)  | A (R)    |
//! | Processing | Err        | A       | A         | Err       | A (R)    |
//! | Shipped    | Err        | Err     | A         | Err       | A (R\*)  |
//! | Terminal   | Err        | Err     | Err       | Err       | Err      |
//!
//! `C` = customer may request it, `A` = admin may request it, `R` = stock is credited back to the ledger,
//! `R*` = stock is credited back only when [`RestockPolicy::restock_shipped_refunds`] is set. `Delivered`,
//! `Cancelled` and `Refunded` are terminal. Nobody can move an order back to `Pending`, and a transition to the
//! current status is rejected rather than treated as a no-op, so a repeated cancel can never credit stock twice.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderStatusType, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionActor {
    Customer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("An order cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockPolicy {
    /// Credit stock back when an order that has already shipped is refunded. Off by default, since shipped goods
    /// are restocked manually once they are returned.
    pub restock_shipped_refunds: bool,
}

/// What has to happen, atomically, when an order changes status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    /// Credit every line's quantity back to the ledger in the same transaction as the status change.
    pub restock: bool,
    /// Publish a shipment notification after the change commits.
    pub notify_shipment: bool,
    /// The payment status to record alongside the status change, if any.
    pub payment_status: Option<PaymentStatus>,
}

pub fn plan_transition(
    from: OrderStatusType,
    to: OrderStatusType,
    actor: TransitionActor,
    current_payment: PaymentStatus,
    policy: &RestockPolicy,
) -> Result<TransitionPlan, InvalidTransition> {
    use OrderStatusType::*;
    let err = InvalidTransition { from, to };
    if from == to || from.is_terminal() {
        return Err(err);
    }
    let allowed = match (actor, from, to) {
        (TransitionActor::Customer, Pending, Cancelled) => true,
        (TransitionActor::Customer, _, _) => false,
        (TransitionActor::Admin, Pending, Processing | Shipped | Delivered | Cancelled | Refunded) => true,
        (TransitionActor::Admin, Processing, Shipped | Delivered | Refunded) => true,
        (TransitionActor::Admin, Shipped, Delivered | Refunded) => true,
        (TransitionActor::Admin, _, _) => false,
    };
    if !allowed {
        return Err(err);
    }
    let restock = match (from, to) {
        (Pending, Cancelled) => true,
        (Pending | Processing, Refunded) => true,
        (Shipped, Refunded) => policy.restock_shipped_refunds,
        _ => false,
    };
    let payment_status = match (to, current_payment) {
        (Refunded, PaymentStatus::Paid) => Some(PaymentStatus::Refunded),
        _ => None,
    };
    Ok(TransitionPlan { from, to, restock, notify_shipment: to == Shipped, payment_status })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::OrderStatusType::*;

    const ALL: [OrderStatusType; 6] = [Pending, Processing, Shipped, Delivered, Cancelled, Refunded];

    fn admin(from: OrderStatusType, to: OrderStatusType) -> Result<TransitionPlan, InvalidTransition> {
        plan_transition(from, to, TransitionActor::Admin, PaymentStatus::Pending, &RestockPolicy::default())
    }

    fn customer(from: OrderStatusType, to: OrderStatusType) -> Result<TransitionPlan, InvalidTransition> {
        plan_transition(from, to, TransitionActor::Customer, PaymentStatus::Pending, &RestockPolicy::default())
    }

    #[test]
    fn customers_can_only_cancel_pending_orders() {
        let plan = customer(Pending, Cancelled).unwrap();
        assert!(plan.restock);
        assert!(!plan.notify_shipment);
        for from in ALL {
            for to in ALL {
                if (from, to) != (Pending, Cancelled) {
                    assert_eq!(customer(from, to), Err(InvalidTransition { from, to }));
                }
            }
        }
    }

    #[test]
    fn cancelling_twice_is_rejected() {
        assert!(customer(Cancelled, Cancelled).is_err());
        assert!(admin(Cancelled, Cancelled).is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [Delivered, Cancelled, Refunded] {
            for to in ALL {
                assert!(admin(from, to).is_err(), "{from} -> {to} should be rejected");
            }
        }
    }

    #[test]
    fn nothing_returns_to_pending() {
        for from in ALL {
            assert!(admin(from, Pending).is_err());
        }
    }

    #[test]
    fn admin_forward_moves() {
        assert!(admin(Pending, Processing).is_ok());
        assert!(admin(Pending, Delivered).is_ok());
        assert!(admin(Processing, Delivered).is_ok());
        assert!(admin(Shipped, Delivered).is_ok());
        assert!(admin(Processing, Cancelled).is_err());
        assert!(admin(Shipped, Processing).is_err());
    }

    #[test]
    fn shipping_notifies() {
        let plan = admin(Pending, Shipped).unwrap();
        assert!(plan.notify_shipment);
        assert!(!plan.restock);
        assert!(admin(Processing, Shipped).unwrap().notify_shipment);
        assert!(!admin(Shipped, Delivered).unwrap().notify_shipment);
    }

    #[test]
    fn restock_policy() {
        assert!(admin(Pending, Cancelled).unwrap().restock);
        assert!(admin(Pending, Refunded).unwrap().restock);
        assert!(admin(Processing, Refunded).unwrap().restock);
        assert!(!admin(Shipped, Refunded).unwrap().restock);
        assert!(!admin(Processing, Shipped).unwrap().restock);
        let generous = RestockPolicy { restock_shipped_refunds: true };
        let plan =
            plan_transition(Shipped, Refunded, TransitionActor::Admin, PaymentStatus::Pending, &generous).unwrap();
        assert!(plan.restock);
    }

    #[test]
    fn refunds_mark_paid_orders_refunded() {
        let policy = RestockPolicy::default();
        let plan = plan_transition(Shipped, Refunded, TransitionActor::Admin, PaymentStatus::Paid, &policy).unwrap();
        assert_eq!(plan.payment_status, Some(PaymentStatus::Refunded));
        let plan = plan_transition(Pending, Refunded, TransitionActor::Admin, PaymentStatus::Failed, &policy).unwrap();
        assert_eq!(plan.payment_status, None);
    }
}
