use crate::domain::order::Order;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct OrderRow<'a> {
    orderid: i64,
    product: &'a str,
    quantity: String,
    #[serde(rename = "customerName")]
    customer_name: &'a str,
    #[serde(rename = "shippingAddress")]
    shipping_address: &'a str,
}

/// Writes orders as CSV, sorted by identifier.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders(&mut self, mut orders: Vec<Order>) -> Result<()> {
        orders.sort_by_key(|o| o.order_id);
        if orders.is_empty() {
            // Keep the header even for an empty store.
            self.writer.write_record([
                "orderid",
                "product",
                "quantity",
                "customerName",
                "shippingAddress",
            ])?;
        }
        for order in &orders {
            self.writer.serialize(OrderRow {
                orderid: order.order_id,
                product: &order.product,
                quantity: order.quantity.normalize().to_string(),
                customer_name: &order.customer_name,
                shipping_address: &order.shipping_address,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
