//! Market data queries
//!
//! All of these hit the public surface and need no credential.

use super::helpers::{expect_list, map_list, parse_item};
use super::{RestClient, Result, Surface};
use crate::models::{
    AdvancedCandle, AdvancedMarketTrade, AdvancedProduct, Candle, Product, Trade,
};
use reqwest::Method;
use tracing::debug;

impl RestClient {
    /// Get all tradeable products
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let value = self
            .request(Method::GET, "market/products", None, Surface::Public)
            .await?;

        let products: Vec<Product> = map_list::<AdvancedProduct, _>(expect_list(value, "products")?)?;
        debug!("Fetched {} products", products.len());
        Ok(products)
    }

    /// Get a single product by id
    pub async fn get_product(&self, product_id: &str) -> Result<Product> {
        let path = format!("market/products/{}", product_id);
        let value = self
            .request(Method::GET, &path, None, Surface::Public)
            .await?;

        let raw: AdvancedProduct = parse_item(value)?;
        Ok(Product::from(raw))
    }

    /// Get OHLCV candles for a product over a unix-seconds window
    pub async fn get_candles(
        &self,
        product_id: &str,
        start: i64,
        end: i64,
        granularity: &str,
    ) -> Result<Vec<Candle>> {
        let path = format!(
            "market/products/{}/candles?start={}&end={}&granularity={}",
            product_id, start, end, granularity
        );
        let value = self
            .request(Method::GET, &path, None, Surface::Public)
            .await?;

        map_list::<AdvancedCandle, _>(expect_list(value, "candles")?)
    }

    /// Get recent public trades for a product
    pub async fn get_market_trades(&self, product_id: &str, limit: u32) -> Result<Vec<Trade>> {
        let path = format!("market/products/{}/ticker?limit={}", product_id, limit);
        let value = self
            .request(Method::GET, &path, None, Surface::Public)
            .await?;

        map_list::<AdvancedMarketTrade, _>(expect_list(value, "trades")?)
    }
}
