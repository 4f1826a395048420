//! Catalog read models
//!
//! Packages and activities are authored outside this system and priced in
//! minor units. They are read-only here: intake resolves the submitted ids
//! against the catalog and snapshots the matching entries onto the order,
//! so later price changes never alter an existing order.

use core_kernel::Money;
use serde::{Deserialize, Serialize};

/// A fixed-price party package from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Externally authored identifier, e.g. `superhero-deluxe`
    pub id: String,
    pub name: String,
    pub price: Money,
}

/// An individually priced add-on activity from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Externally authored identifier, e.g. `face-painting`
    pub id: String,
    pub name: String,
    pub price: Money,
}

/// Which catalog collection an order line was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderItemKind {
    Package,
    Activity,
}

/// A priced line captured on an order at intake time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub item_id: String,
    pub name: String,
    pub price: Money,
    pub kind: OrderItemKind,
}

impl From<&Package> for OrderItem {
    fn from(package: &Package) -> Self {
        Self {
            item_id: package.id.clone(),
            name: package.name.clone(),
            price: package.price,
            kind: OrderItemKind::Package,
        }
    }
}

impl From<&Activity> for OrderItem {
    fn from(activity: &Activity) -> Self {
        Self {
            item_id: activity.id.clone(),
            name: activity.name.clone(),
            price: activity.price,
            kind: OrderItemKind::Activity,
        }
    }
}
