//! Schema checks for incoming mutation payloads.
//!
//! Fields are checked in a fixed order and the first failure wins, so a caller
//! only ever sees one [`SchemaViolation`] per request.

use super::order::{
    FIELD_CUSTOMER_NAME, FIELD_ORDER_ID, FIELD_PRODUCT, FIELD_QUANTITY, FIELD_SHIPPING_ADDRESS,
    Order, OrderId,
};
use crate::error::{Result, SchemaViolation};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::str::FromStr;

const EXPECT_INTEGER: &str = "Number";
const EXPECT_NUMBER: &str = "number";
const EXPECT_STRING: &str = "string";

/// Validates a decoded payload and returns the typed order.
pub fn validate_order(payload: &Value) -> Result<Order> {
    let fields = payload
        .as_object()
        .ok_or_else(|| SchemaViolation::wrong_type("message", "object"))?;

    let order_id = order_id_field(fields)?;
    let product = string_field(fields, FIELD_PRODUCT)?;
    let quantity = number_field(fields, FIELD_QUANTITY)?;
    let customer_name = string_field(fields, FIELD_CUSTOMER_NAME)?;
    let shipping_address = string_field(fields, FIELD_SHIPPING_ADDRESS)?;

    Ok(Order {
        order_id,
        product,
        quantity,
        customer_name,
        shipping_address,
    })
}

/// Parses an identifier that arrived as text, e.g. from a query string.
pub fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.trim()
        .parse::<OrderId>()
        .map_err(|_| SchemaViolation::wrong_type(FIELD_ORDER_ID, EXPECT_INTEGER).into())
}

fn order_id_field(fields: &Map<String, Value>) -> Result<OrderId> {
    match fields.get(FIELD_ORDER_ID) {
        None => Err(SchemaViolation::missing(FIELD_ORDER_ID, EXPECT_INTEGER).into()),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| SchemaViolation::wrong_type(FIELD_ORDER_ID, EXPECT_INTEGER).into()),
        Some(_) => Err(SchemaViolation::wrong_type(FIELD_ORDER_ID, EXPECT_INTEGER).into()),
    }
}

fn string_field(fields: &Map<String, Value>, field: &'static str) -> Result<String> {
    match fields.get(field) {
        None => Err(SchemaViolation::missing(field, EXPECT_STRING).into()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SchemaViolation::wrong_type(field, EXPECT_STRING).into()),
    }
}

fn number_field(fields: &Map<String, Value>, field: &'static str) -> Result<Decimal> {
    match fields.get(field) {
        None => Err(SchemaViolation::missing(field, EXPECT_NUMBER).into()),
        Some(Value::Number(n)) => {
            to_decimal(n).ok_or_else(|| SchemaViolation::wrong_type(field, EXPECT_NUMBER).into())
        }
        Some(_) => Err(SchemaViolation::wrong_type(field, EXPECT_NUMBER).into()),
    }
}

fn to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Decimal::from(u));
    }
    // Floats go through their shortest textual form to avoid binary noise.
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OrderError, ViolationKind};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "orderid": 1,
            "product": "A",
            "quantity": 2,
            "customerName": "X",
            "shippingAddress": "Y"
        })
    }

    fn violation(result: Result<Order>) -> SchemaViolation {
        match result {
            Err(OrderError::Schema(v)) => v,
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_payload() {
        let order = validate_order(&valid()).unwrap();
        assert_eq!(order.order_id, 1);
        assert_eq!(order.product, "A");
        assert_eq!(order.quantity, dec!(2));
    }

    #[test]
    fn test_float_quantity_is_accepted() {
        let mut payload = valid();
        payload["quantity"] = json!(2.75);
        assert_eq!(validate_order(&payload).unwrap().quantity, dec!(2.75));
    }

    #[test]
    fn test_quantity_as_string_is_rejected() {
        let mut payload = valid();
        payload["quantity"] = json!("two");
        let v = violation(validate_order(&payload));
        assert_eq!(v.field, "quantity");
        assert_eq!(v.kind, ViolationKind::WrongType);
    }

    #[test]
    fn test_non_integer_order_id_is_rejected() {
        for bad in [json!(1.5), json!("1"), json!(true), json!(null)] {
            let mut payload = valid();
            payload["orderid"] = bad;
            assert_eq!(violation(validate_order(&payload)).field, "orderid");
        }
    }

    #[test]
    fn test_missing_field_is_reported() {
        let mut payload = valid();
        payload.as_object_mut().unwrap().remove("customerName");
        let v = violation(validate_order(&payload));
        assert_eq!(v.field, "customerName");
        assert_eq!(v.kind, ViolationKind::Missing);
    }

    #[test]
    fn test_first_failure_wins() {
        // product and shippingAddress are both wrong; product is checked first.
        let mut payload = valid();
        payload["product"] = json!(5);
        payload["shippingAddress"] = json!(false);
        assert_eq!(violation(validate_order(&payload)).field, "product");
    }

    #[test]
    fn test_non_object_payload() {
        assert_eq!(violation(validate_order(&json!([1, 2]))).field, "message");
    }

    #[test]
    fn test_parse_order_id() {
        assert_eq!(parse_order_id(" 42 ").unwrap(), 42);
        assert!(matches!(parse_order_id("4x"), Err(OrderError::Schema(_))));
    }
}
