use crate::error::{OrderError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Unique, immutable identifier of an order.
pub type OrderId = i64;

pub const FIELD_ORDER_ID: &str = "orderid";
pub const FIELD_PRODUCT: &str = "product";
pub const FIELD_QUANTITY: &str = "quantity";
pub const FIELD_CUSTOMER_NAME: &str = "customerName";
pub const FIELD_SHIPPING_ADDRESS: &str = "shippingAddress";

/// A single attribute in the store-native representation.
///
/// Numbers travel as strings (`N`) so the store never rounds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    N(String),
    S(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> &str {
        match self {
            Self::N(s) | Self::S(s) => s,
        }
    }
}

/// A record as the store holds it: attribute name to attribute value.
pub type Item = BTreeMap<String, AttributeValue>;

/// The mutable order record.
///
/// Every field but `orderid` may be overwritten by an update. Fields other than
/// the identifier default when absent, which is how the consumer tolerates
/// sparse payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "orderid")]
    pub order_id: OrderId,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub shipping_address: String,
}

impl Order {
    /// Converts the order to its store-native item.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(
            FIELD_ORDER_ID.to_string(),
            AttributeValue::N(self.order_id.to_string()),
        );
        item.insert(
            FIELD_PRODUCT.to_string(),
            AttributeValue::S(self.product.clone()),
        );
        item.insert(
            FIELD_QUANTITY.to_string(),
            AttributeValue::N(self.quantity.normalize().to_string()),
        );
        item.insert(
            FIELD_CUSTOMER_NAME.to_string(),
            AttributeValue::S(self.customer_name.clone()),
        );
        item.insert(
            FIELD_SHIPPING_ADDRESS.to_string(),
            AttributeValue::S(self.shipping_address.clone()),
        );
        item
    }

    /// Rebuilds an order from a stored item, defaulting absent fields.
    pub fn from_item(item: &Item) -> Result<Self> {
        let order_id = item
            .get(FIELD_ORDER_ID)
            .ok_or_else(|| OrderError::store("stored item has no orderid"))?
            .as_str()
            .parse::<OrderId>()
            .map_err(|e| OrderError::store(format!("stored orderid is not numeric: {e}")))?;

        let quantity = match item.get(FIELD_QUANTITY) {
            Some(value) => Decimal::from_str(value.as_str())
                .map_err(|e| OrderError::store(format!("stored quantity is not numeric: {e}")))?,
            None => Decimal::ZERO,
        };

        let text = |field: &str| {
            item.get(field)
                .map(|v| v.as_str().to_string())
                .unwrap_or_default()
        };

        Ok(Self {
            order_id,
            product: text(FIELD_PRODUCT),
            quantity,
            customer_name: text(FIELD_CUSTOMER_NAME),
            shipping_address: text(FIELD_SHIPPING_ADDRESS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Order {
        Order {
            order_id: 7,
            product: "Widget".to_string(),
            quantity: dec!(2.50),
            customer_name: "Ada".to_string(),
            shipping_address: "1 Loop Rd".to_string(),
        }
    }

    #[test]
    fn test_item_uses_numeric_strings() {
        let item = sample().to_item();
        assert_eq!(item[FIELD_ORDER_ID], AttributeValue::N("7".into()));
        assert_eq!(item[FIELD_QUANTITY], AttributeValue::N("2.5".into()));
        assert_eq!(item[FIELD_PRODUCT], AttributeValue::S("Widget".into()));
    }

    #[test]
    fn test_item_conversion_preserves_order() {
        let order = sample();
        let restored = Order::from_item(&order.to_item()).unwrap();
        assert_eq!(restored.order_id, 7);
        assert_eq!(restored.quantity, dec!(2.5));
        assert_eq!(restored.shipping_address, order.shipping_address);
    }

    #[test]
    fn test_from_item_defaults_missing_fields() {
        let mut item = Item::new();
        item.insert(FIELD_ORDER_ID.into(), AttributeValue::N("3".into()));

        let order = Order::from_item(&item).unwrap();
        assert_eq!(order.order_id, 3);
        assert_eq!(order.product, "");
        assert_eq!(order.quantity, Decimal::ZERO);
    }

    #[test]
    fn test_from_item_requires_id() {
        let item = Item::new();
        assert!(matches!(Order::from_item(&item), Err(OrderError::Store(_))));
    }

    #[test]
    fn test_attribute_value_wire_format() {
        let json = serde_json::to_string(&AttributeValue::N("1".into())).unwrap();
        assert_eq!(json, r#"{"N":"1"}"#);
    }

    #[test]
    fn test_sparse_payload_deserialization() {
        let order: Order = serde_json::from_str(r#"{"orderid": 4, "quantity": 3}"#).unwrap();
        assert_eq!(order.order_id, 4);
        assert_eq!(order.quantity, dec!(3));
        assert_eq!(order.customer_name, "");
    }
}
