use cucumber::given;
use shop_order_engine::{db_types::Role, InventoryLedger};

use crate::cucumber::{
    shop_world::{parse_money, ShopSystem},
    ShopWorld,
};

/// Scenario databases never hold this many products, so nothing has this id.
const MISSING_PRODUCT_ID: i64 = 999_999;

#[given("a fresh install")]
async fn fresh_database(world: &mut ShopWorld) {
    let system = ShopSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a customer named {string} with an address")]
async fn customer(world: &mut ShopWorld, name: String) {
    world.system_mut().add_user(&name, Role::Customer).await;
}

#[given(expr = "an admin named {string}")]
async fn admin(world: &mut ShopWorld, name: String) {
    world.system_mut().add_user(&name, Role::Admin).await;
}

#[given(expr = "a product {string} priced at {word} with {int} in stock")]
async fn product(world: &mut ShopWorld, name: String, price: String, stock: i64) {
    world.system_mut().add_product(&name, parse_money(&price), stock).await;
}

#[given(expr = "the product {string} is no longer for sale")]
async fn deactivate_product(world: &mut ShopWorld, name: String) {
    let system = world.system();
    system.db.set_product_active(system.product(&name), false).await.expect("Error deactivating product");
}

#[given(expr = "{string} has {int} of {string} in their cart")]
async fn cart_item(world: &mut ShopWorld, user: String, quantity: i64, product: String) {
    let system = world.system();
    let (user_id, _) = system.user(&user);
    system.carts.add_to_cart(user_id, system.product(&product), quantity).await.expect("Error adding to cart");
}

#[given(expr = "a product {string} that is not in the catalogue")]
async fn missing_product(world: &mut ShopWorld, name: String) {
    world.system_mut().products.insert(name, MISSING_PRODUCT_ID);
}
