mod order_number;

pub use order_number::{generate_order_number, ORDER_NUMBER_PREFIX};
