use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::OrderNumber;

pub const ORDER_NUMBER_PREFIX: &str = "ORD";
const SUFFIX_LEN: usize = 6;

/// Generates a new order number of the form `ORD-<yyyymmddHHMMSS>-<6 random uppercase alphanumerics>`.
///
/// Uniqueness is not guaranteed here. The store has a UNIQUE index on order numbers and the caller generates a fresh
/// number when an insert collides.
pub fn generate_order_number(now: DateTime<Utc>) -> OrderNumber {
    let suffix = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect::<String>();
    OrderNumber(format!("{ORDER_NUMBER_PREFIX}-{}-{suffix}", now.format("%Y%m%d%H%M%S")))
}
