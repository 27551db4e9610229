//! Order placement, cancellation, and history queries

use super::helpers::{expect_field, expect_list, map_list, parse_item};
use super::{RestClient, Result, Surface};
use crate::models::{
    AdvancedFill, AdvancedOrder, CancelResult, CreateOrderArgs, CreateOrderResponse, Order,
    OrderAck, RawCancelResult, Trade,
};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

impl RestClient {
    /// Get historical orders, optionally scoped to one product
    pub async fn list_orders(&self, product_id: Option<&str>) -> Result<Vec<Order>> {
        let path = match product_id {
            Some(id) => format!("orders/historical/batch?product_id={}", id),
            None => "orders/historical/batch".to_string(),
        };
        let value = self
            .request(Method::GET, &path, None, Surface::Advanced)
            .await?;

        let orders: Vec<Order> = map_list::<AdvancedOrder, _>(expect_list(value, "orders")?)?;
        debug!("Fetched {} orders", orders.len());
        Ok(orders)
    }

    /// Get a single order by id
    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        let path = format!("orders/historical/{}", order_id);
        let value = self
            .request(Method::GET, &path, None, Surface::Advanced)
            .await?;

        let raw: AdvancedOrder = parse_item(expect_field(value, "order")?)?;
        Ok(Order::from(raw))
    }

    /// Get fills, optionally scoped to one order
    pub async fn list_fills(&self, order_id: Option<&str>) -> Result<Vec<Trade>> {
        let path = match order_id {
            Some(id) => format!("orders/historical/fills?order_id={}", id),
            None => "orders/historical/fills".to_string(),
        };
        let value = self
            .request(Method::GET, &path, None, Surface::Advanced)
            .await?;

        map_list::<AdvancedFill, _>(expect_list(value, "fills")?)
    }

    /// Place an order
    ///
    /// A 2xx response with `success: false` still resolves Ok; the ack
    /// carries the upstream failure reason.
    pub async fn create_order(&self, args: &CreateOrderArgs) -> Result<OrderAck> {
        info!(
            "Placing {} {:?} order for {}",
            args.order_configuration.type_name(),
            args.side,
            args.product_id
        );

        let body = serde_json::to_value(args)
            .map_err(|e| super::RestError::MalformedResponse(e.to_string()))?;
        let value = self
            .request(Method::POST, "orders", Some(body), Surface::Advanced)
            .await?;

        let raw: CreateOrderResponse = parse_item(value)?;
        let ack = OrderAck::from(raw);
        if ack.success {
            info!("Order accepted: {}", ack.order_id);
        } else {
            warn!("Order rejected: {}", ack.failure_reason);
        }
        Ok(ack)
    }

    /// Cancel a batch of orders
    pub async fn cancel_orders(&self, order_ids: &[String]) -> Result<Vec<CancelResult>> {
        let body = json!({ "order_ids": order_ids });
        let value = self
            .request(
                Method::POST,
                "orders/batch_cancel",
                Some(body),
                Surface::Advanced,
            )
            .await?;

        map_list::<RawCancelResult, _>(expect_list(value, "results")?)
    }
}
