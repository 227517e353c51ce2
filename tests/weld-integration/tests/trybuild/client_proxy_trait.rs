use weld_core::{ClientProxy, Reference};
use weld_macros::client_proxy;

#[client_proxy]
pub trait Inventory {
    fn count(&self, sku: &str) -> usize;
    fn names(&self, _: u8) -> Vec<String>;
    fn label(&self) -> &'static str;
}

struct Warehouse;

impl Inventory for Warehouse {
    fn count(&self, sku: &str) -> usize {
        sku.len()
    }

    fn names(&self, limit: u8) -> Vec<String> {
        (0..limit).map(|n| n.to_string()).collect()
    }

    fn label(&self) -> &'static str {
        "warehouse"
    }
}

fn assert_inventory<I: Inventory>() {}

fn main() {
    assert_inventory::<ClientProxy<Warehouse>>();
    assert_inventory::<Reference<Warehouse>>();
}
