use std::str::FromStr;

use cucumber::{then, when};
use shop_order_engine::{
    db_types::{NewOrder, NewOrderItem, OrderStatusType, PaymentStatus},
    events::EventProducers,
    order_objects::OrderQueryFilter,
    soe_api::status_machine::RestockPolicy,
    traits::PageRequest,
    AdminApi,
    CartManagement,
    InventoryLedger,
    OrderFlowError,
    OrderManagement,
};

use crate::cucumber::{shop_world::parse_money, ShopWorld};

fn error_kind(e: &OrderFlowError) -> &'static str {
    match e {
        OrderFlowError::DatabaseError(_) => "DatabaseError",
        OrderFlowError::ValidationFailed(_) => "ValidationFailed",
        OrderFlowError::AddressNotFound(_) => "AddressNotFound",
        OrderFlowError::ProductNotFound(_) => "ProductNotFound",
        OrderFlowError::InsufficientStock { .. } => "InsufficientStock",
        OrderFlowError::OrderNotFound(_) => "OrderNotFound",
        OrderFlowError::InvalidTransition(_) => "InvalidTransition",
        OrderFlowError::Forbidden => "Forbidden",
        OrderFlowError::OrderNumberExhausted(_) => "OrderNumberExhausted",
        OrderFlowError::PaymentStatusConflict { .. } => "PaymentStatusConflict",
        OrderFlowError::PricingError(_) => "PricingError",
    }
}

/// Parses "3 x Widget, 1 x Gadget" into order lines.
fn parse_lines(world: &ShopWorld, lines: &str) -> Vec<NewOrderItem> {
    lines
        .split(',')
        .map(|line| {
            let (qty, name) = line.split_once(" x ").unwrap_or_else(|| panic!("Invalid order line: {line}"));
            let qty = qty.trim().parse::<i64>().expect("Invalid quantity");
            NewOrderItem::new(world.system().product(name.trim()), qty)
        })
        .collect()
}

async fn place_order(world: &mut ShopWorld, user: &str, address_id: i64, lines: &str) {
    let (user_id, _) = world.system().user(user);
    let mut order = NewOrder::new(user_id, address_id, "card");
    for item in parse_lines(world, lines) {
        order = order.with_item(item);
    }
    let result = world.system().orders.create_order(order).await;
    world.record_order(result);
}

#[when(expr = "{string} orders {string}")]
async fn order(world: &mut ShopWorld, user: String, lines: String) {
    let (_, address_id) = world.system().user(&user);
    place_order(world, &user, address_id, &lines).await;
}

#[when(expr = "{string} orders {string} to the address of {string}")]
async fn order_to_other_address(world: &mut ShopWorld, user: String, lines: String, other: String) {
    let (_, address_id) = world.system().user(&other);
    place_order(world, &user, address_id, &lines).await;
}

#[when(expr = "{string} cancels the order")]
async fn cancel_order(world: &mut ShopWorld, user: String) {
    let (user_id, _) = world.system().user(&user);
    let order_id = world.last_order().order.id;
    let result = world.system().orders.cancel_order(user_id, order_id).await;
    world.record_update(result);
}

#[when(expr = "{string} marks the order as {word}")]
async fn update_status(world: &mut ShopWorld, user: String, status: String) {
    update_status_with_tracking(world, user, status, None).await;
}

#[when(expr = "{string} marks the order as {word} with tracking number {string}")]
async fn update_status_tracked(world: &mut ShopWorld, user: String, status: String, tracking: String) {
    update_status_with_tracking(world, user, status, Some(tracking)).await;
}

async fn update_status_with_tracking(world: &mut ShopWorld, user: String, status: String, tracking: Option<String>) {
    let (user_id, _) = world.system().user(&user);
    let order_id = world.last_order().order.id;
    let status = OrderStatusType::from_str(&status).expect("Invalid order status");
    let result = world.system().admin.update_order_status(user_id, order_id, status, tracking).await;
    world.record_update(result);
}

#[when(expr = "{string} records the payment as {word}")]
async fn record_payment(world: &mut ShopWorld, user: String, outcome: String) {
    let (user_id, _) = world.system().user(&user);
    let order_id = world.last_order().order.id;
    let outcome = PaymentStatus::from_str(&outcome).expect("Invalid payment status");
    let result = world.system().admin.record_payment_outcome(user_id, order_id, outcome).await;
    world.record_update(result);
}

#[when("refunds of shipped orders are restocked")]
async fn restock_shipped_refunds(world: &mut ShopWorld) {
    let system = world.system_mut();
    let policy = RestockPolicy { restock_shipped_refunds: true };
    system.admin = AdminApi::new(system.db.clone(), EventProducers::default()).with_restock_policy(policy);
}

#[when(expr = "{string} lists page {int} of the orders with {int} orders per page")]
async fn list_orders(world: &mut ShopWorld, user: String, page: u32, page_size: u32) {
    list_orders_with_filter(world, &user, OrderQueryFilter::default(), page, page_size).await;
}

#[when(expr = "{string} lists page {int} of the {word} orders with {int} orders per page")]
async fn list_orders_by_status(world: &mut ShopWorld, user: String, page: u32, status: String, page_size: u32) {
    let status = OrderStatusType::from_str(&status).expect("Invalid order status");
    let filter = OrderQueryFilter::default().with_status(status);
    list_orders_with_filter(world, &user, filter, page, page_size).await;
}

async fn list_orders_with_filter(
    world: &mut ShopWorld,
    user: &str,
    filter: OrderQueryFilter,
    page: u32,
    page_size: u32,
) {
    let (user_id, _) = world.system().user(user);
    let result = world.system().admin.list_orders(user_id, filter, PageRequest::new(page, page_size)).await;
    match result {
        Ok(page) => {
            world.last_page = Some(page);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[then(expr = "the order totals are subtotal {word}, tax {word}, shipping {word} and total {word}")]
async fn check_totals(world: &mut ShopWorld, subtotal: String, tax: String, shipping: String, total: String) {
    let order = &world.last_order().order;
    assert_eq!(order.subtotal, parse_money(&subtotal), "subtotal");
    assert_eq!(order.tax, parse_money(&tax), "tax");
    assert_eq!(order.shipping, parse_money(&shipping), "shipping");
    assert_eq!(order.total, parse_money(&total), "total");
}

#[then(expr = "the order has {int} line(s)")]
async fn check_line_count(world: &mut ShopWorld, count: usize) {
    assert_eq!(world.last_order().items.len(), count);
}

#[then(expr = "the order line for {string} has quantity {int} at {word} each")]
async fn check_line(world: &mut ShopWorld, product: String, quantity: i64, price: String) {
    let product_id = world.system().product(&product);
    let line = world
        .last_order()
        .items
        .iter()
        .find(|i| i.product_id == product_id)
        .unwrap_or_else(|| panic!("No order line for {product}"));
    assert_eq!(line.product_name, product);
    assert_eq!(line.quantity, quantity);
    assert_eq!(line.price, parse_money(&price));
}

#[then(expr = "the order is {word}")]
async fn check_status(world: &mut ShopWorld, status: String) {
    let status = OrderStatusType::from_str(&status).expect("Invalid order status");
    let order_id = world.last_order().order.id;
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(order.status, status);
}

#[then(expr = "the payment status is {word}")]
async fn check_payment_status(world: &mut ShopWorld, status: String) {
    let status = PaymentStatus::from_str(&status).expect("Invalid payment status");
    let order_id = world.last_order().order.id;
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(order.payment_status, status);
}

#[then(expr = "the tracking number is {string}")]
async fn check_tracking(world: &mut ShopWorld, tracking: String) {
    let order_id = world.last_order().order.id;
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(order.tracking_number.as_deref(), Some(tracking.as_str()));
}

#[then(expr = "the operation fails with {word}")]
async fn check_failure(world: &mut ShopWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The operation succeeded, but an error was expected");
    assert_eq!(error_kind(err), kind, "Unexpected error: {err}");
}

#[then(expr = "the operation fails with {word} for {string}")]
async fn check_failure_for_product(world: &mut ShopWorld, kind: String, product: String) {
    let expected = world.system().product(&product);
    let err = world.last_error.as_ref().expect("The operation succeeded, but an error was expected");
    assert_eq!(error_kind(err), kind, "Unexpected error: {err}");
    let reported = match err {
        OrderFlowError::ProductNotFound(id) => *id,
        OrderFlowError::InsufficientStock { product_id, .. } => *product_id,
        _ => panic!("{err} does not name a product"),
    };
    assert_eq!(reported, expected, "The error names the wrong product: {err}");
}

#[then("the operation succeeds")]
async fn check_success(world: &mut ShopWorld) {
    if let Some(err) = &world.last_error {
        panic!("The operation failed with {err}");
    }
}

#[then(expr = "{string} has {int} in stock and {int} sold")]
async fn check_stock(world: &mut ShopWorld, product: String, stock: i64, sold: i64) {
    let system = world.system();
    let product =
        system.db.fetch_product(system.product(&product)).await.expect("Error fetching product").expect("No product");
    assert_eq!(product.stock, stock, "stock of {}", product.name);
    assert_eq!(product.sold_count, sold, "sold count of {}", product.name);
}

#[then(expr = "{string} has {int} order(s)")]
async fn check_order_count(world: &mut ShopWorld, user: String, count: usize) {
    let (user_id, _) = world.system().user(&user);
    let orders = world.system().orders.orders_for_user(user_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the cart of {string} is empty")]
async fn check_cart_empty(world: &mut ShopWorld, user: String) {
    let (user_id, _) = world.system().user(&user);
    let cart = world.system().db.fetch_cart(user_id).await.expect("Error fetching cart");
    assert!(cart.is_empty(), "Cart is not empty: {cart:?}");
}

#[then(expr = "the cart of {string} holds {int} of {string}")]
async fn check_cart_item(world: &mut ShopWorld, user: String, quantity: i64, product: String) {
    let (user_id, _) = world.system().user(&user);
    let product_id = world.system().product(&product);
    let cart = world.system().db.fetch_cart(user_id).await.expect("Error fetching cart");
    let item = cart.iter().find(|i| i.product_id == product_id).unwrap_or_else(|| panic!("{product} is not in the cart"));
    assert_eq!(item.quantity, quantity);
}

#[then(expr = "the page holds {int} order(s) out of {int} in {int} page(s)")]
async fn check_page(world: &mut ShopWorld, count: usize, total: i64, pages: i64) {
    let page = world.last_page.as_ref().expect("No orders have been listed");
    assert_eq!(page.orders.len(), count);
    assert_eq!(page.pagination.total_items, total);
    assert_eq!(page.pagination.total_pages, pages);
}
