use std::collections::HashMap;

use cucumber::World;
use log::*;
use shop_order_engine::{
    db_types::{Cents, FullOrder, NewAddress, NewProduct, NewUser, Order, Role},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::OrderPage,
    AdminApi,
    AuthManagement,
    CartApi,
    InventoryLedger,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct ShopWorld {
    pub system: Option<ShopSystem>,
    /// The most recently placed or modified order
    pub last_order: Option<FullOrder>,
    /// The error returned by the most recent operation, if it failed
    pub last_error: Option<OrderFlowError>,
    pub last_page: Option<OrderPage>,
}

#[derive(Debug)]
pub struct ShopSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub admin: AdminApi<SqliteDatabase>,
    pub carts: CartApi<SqliteDatabase>,
    /// user name -> (user id, address id)
    pub users: HashMap<String, (i64, i64)>,
    /// product name -> product id
    pub products: HashMap<String, i64>,
}

impl ShopSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {url}");
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        let admin = AdminApi::new(db.clone(), EventProducers::default());
        let carts = CartApi::new(db.clone());
        Self { db_path: url, db, orders, admin, carts, users: HashMap::new(), products: HashMap::new() }
    }

    pub async fn add_user(&mut self, name: &str, role: Role) -> (i64, i64) {
        let user = self
            .db
            .insert_user(NewUser::new(format!("{name}@example.com"), name.to_string()))
            .await
            .expect("Error creating user");
        self.db.assign_roles(user.id, &[role]).await.expect("Error assigning role");
        let address = NewAddress::new(user.id, name, "1 Main Road", "Cape Town", "8001", "ZA");
        let address = self.db.insert_address(address).await.expect("Error creating address");
        self.users.insert(name.to_string(), (user.id, address.id));
        (user.id, address.id)
    }

    pub async fn add_product(&mut self, name: &str, price: Cents, stock: i64) -> i64 {
        let product = self.db.insert_product(NewProduct::new(name, price, stock)).await.expect("Error adding product");
        self.products.insert(name.to_string(), product.id);
        product.id
    }

    pub fn user(&self, name: &str) -> (i64, i64) {
        *self.users.get(name).unwrap_or_else(|| panic!("User {name} does not exist"))
    }

    pub fn product(&self, name: &str) -> i64 {
        *self.products.get(name).unwrap_or_else(|| panic!("Product {name} does not exist"))
    }
}

impl ShopWorld {
    pub fn system(&self) -> &ShopSystem {
        self.system.as_ref().expect("Shop system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut ShopSystem {
        self.system.as_mut().expect("Shop system not initialised")
    }

    pub fn last_order(&self) -> &FullOrder {
        self.last_order.as_ref().expect("No order has been placed yet")
    }

    pub fn record_order(&mut self, result: Result<FullOrder, OrderFlowError>) {
        match result {
            Ok(order) => {
                self.last_order = Some(order);
                self.last_error = None;
            },
            Err(e) => {
                debug!("🚀️ Operation failed: {e}");
                self.last_error = Some(e);
            },
        }
    }

    pub fn record_update(&mut self, result: Result<Order, OrderFlowError>) {
        match result {
            Ok(order) => {
                if let Some(last) = self.last_order.as_mut() {
                    last.order = order;
                }
                self.last_error = None;
            },
            Err(e) => {
                debug!("🚀️ Operation failed: {e}");
                self.last_error = Some(e);
            },
        }
    }
}

/// Parses "20.00" or "20" into minor units.
pub fn parse_money(s: &str) -> Cents {
    let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
    let major = major.parse::<i64>().expect("Invalid amount");
    let minor = format!("{minor:0<2}")[..2].parse::<i64>().expect("Invalid amount");
    Cents::new(major * 100 + minor)
}
