//! Domain models and per-surface payload mapping
//!
//! Every upstream surface returns its own JSON shape; each shape gets a raw
//! deserialization struct here and maps explicitly into one canonical model
//! with defaults for every optional field. Unrecognized shapes are rejected
//! during deserialization, never coerced.

use serde::{Deserialize, Serialize};

/// Parse an upstream decimal string, defaulting absent/invalid values
fn parse_num(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

// =============================================================================
// Canonical models
// =============================================================================

/// A tradeable product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub price: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub status: String,
    pub is_disabled: bool,
}

/// A funding account balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub balance: f64,
    pub available: f64,
    pub hold: f64,
}

/// An order as reported by the exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub product_id: String,
    pub side: String,
    pub order_type: String,
    pub status: String,
    pub price: f64,
    pub size: f64,
    pub filled_size: f64,
    pub created_at: String,
}

/// A fill or public market trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub order_id: String,
    pub product_id: String,
    pub side: String,
    pub price: f64,
    pub size: f64,
    pub time: String,
}

/// One OHLCV bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub start: i64,
    pub low: f64,
    pub high: f64,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
}

/// Order side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// Result of an order placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub success: bool,
    pub order_id: String,
    pub failure_reason: String,
}

/// Result of one cancellation inside a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResult {
    pub order_id: String,
    pub success: bool,
    pub failure_reason: String,
}

// =============================================================================
// Order placement request
// =============================================================================

/// Order creation request for the primary surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderArgs {
    pub client_order_id: String,
    pub product_id: String,
    pub side: Side,
    pub order_configuration: OrderConfiguration,
}

/// Order configuration, externally tagged the way the upstream API shapes it
///
/// An unrecognized configuration key fails deserialization outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderConfiguration {
    #[serde(rename = "market_market_ioc")]
    MarketIoc {
        #[serde(default)]
        quote_size: String,
        #[serde(default)]
        base_size: String,
    },

    #[serde(rename = "limit_limit_gtc")]
    LimitGtc {
        #[serde(default)]
        base_size: String,
        #[serde(default)]
        limit_price: String,
        #[serde(default)]
        post_only: bool,
    },

    #[serde(rename = "limit_limit_gtd")]
    LimitGtd {
        #[serde(default)]
        base_size: String,
        #[serde(default)]
        limit_price: String,
        #[serde(default)]
        end_time: String,
        #[serde(default)]
        post_only: bool,
    },
}

impl OrderConfiguration {
    pub fn type_name(&self) -> &'static str {
        match self {
            OrderConfiguration::MarketIoc { .. } => "MARKET",
            OrderConfiguration::LimitGtc { .. } => "LIMIT",
            OrderConfiguration::LimitGtd { .. } => "LIMIT",
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            OrderConfiguration::MarketIoc { .. } => 0.0,
            OrderConfiguration::LimitGtc { limit_price, .. } => parse_num(limit_price),
            OrderConfiguration::LimitGtd { limit_price, .. } => parse_num(limit_price),
        }
    }

    pub fn size(&self) -> f64 {
        match self {
            OrderConfiguration::MarketIoc {
                quote_size,
                base_size,
            } => {
                if base_size.is_empty() {
                    parse_num(quote_size)
                } else {
                    parse_num(base_size)
                }
            }
            OrderConfiguration::LimitGtc { base_size, .. } => parse_num(base_size),
            OrderConfiguration::LimitGtd { base_size, .. } => parse_num(base_size),
        }
    }
}

// =============================================================================
// Primary surface payloads
// =============================================================================

/// Product as returned by the primary surface
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedProduct {
    pub product_id: String,

    #[serde(default)]
    pub base_currency_id: String,

    #[serde(default)]
    pub quote_currency_id: String,

    #[serde(default)]
    pub price: String,

    #[serde(default)]
    pub price_percentage_change_24h: String,

    #[serde(default)]
    pub volume_24h: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub is_disabled: bool,
}

impl From<AdvancedProduct> for Product {
    fn from(raw: AdvancedProduct) -> Self {
        Self {
            product_id: raw.product_id,
            base_currency: raw.base_currency_id,
            quote_currency: raw.quote_currency_id,
            price: parse_num(&raw.price),
            price_change_24h: parse_num(&raw.price_percentage_change_24h),
            volume_24h: parse_num(&raw.volume_24h),
            status: raw.status,
            is_disabled: raw.is_disabled,
        }
    }
}

/// Nested balance object used by the primary surface
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceValue {
    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub currency: String,
}

/// Account as returned by the primary surface
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedAccount {
    pub uuid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub currency: String,

    #[serde(default)]
    pub available_balance: BalanceValue,

    #[serde(default)]
    pub hold: BalanceValue,
}

impl From<AdvancedAccount> for Account {
    fn from(raw: AdvancedAccount) -> Self {
        let available = parse_num(&raw.available_balance.value);
        let hold = parse_num(&raw.hold.value);
        Self {
            id: raw.uuid,
            name: raw.name,
            currency: raw.currency,
            balance: available + hold,
            available,
            hold,
        }
    }
}

/// Order as returned by the primary surface
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedOrder {
    pub order_id: String,

    #[serde(default)]
    pub product_id: String,

    #[serde(default)]
    pub side: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub order_configuration: Option<OrderConfiguration>,

    #[serde(default)]
    pub filled_size: String,

    #[serde(default)]
    pub average_filled_price: String,

    #[serde(default)]
    pub created_time: String,
}

impl From<AdvancedOrder> for Order {
    fn from(raw: AdvancedOrder) -> Self {
        let (order_type, price, size) = match &raw.order_configuration {
            Some(config) => {
                let configured_price = config.price();
                // Filled average beats the configured price when present
                let price = if raw.average_filled_price.is_empty() {
                    configured_price
                } else {
                    parse_num(&raw.average_filled_price)
                };
                (config.type_name().to_string(), price, config.size())
            }
            None => (
                "UNKNOWN".to_string(),
                parse_num(&raw.average_filled_price),
                0.0,
            ),
        };

        Self {
            order_id: raw.order_id,
            product_id: raw.product_id,
            side: raw.side,
            order_type,
            status: raw.status,
            price,
            size,
            filled_size: parse_num(&raw.filled_size),
            created_at: raw.created_time,
        }
    }
}

/// Fill as returned by the primary surface
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedFill {
    #[serde(default)]
    pub trade_id: String,

    #[serde(default)]
    pub order_id: String,

    #[serde(default)]
    pub product_id: String,

    #[serde(default)]
    pub side: String,

    #[serde(default)]
    pub price: String,

    #[serde(default)]
    pub size: String,

    #[serde(default)]
    pub trade_time: String,
}

impl From<AdvancedFill> for Trade {
    fn from(raw: AdvancedFill) -> Self {
        Self {
            trade_id: raw.trade_id,
            order_id: raw.order_id,
            product_id: raw.product_id,
            side: raw.side,
            price: parse_num(&raw.price),
            size: parse_num(&raw.size),
            time: raw.trade_time,
        }
    }
}

/// Public market trade as returned by the primary surface
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedMarketTrade {
    #[serde(default)]
    pub trade_id: String,

    #[serde(default)]
    pub product_id: String,

    #[serde(default)]
    pub side: String,

    #[serde(default)]
    pub price: String,

    #[serde(default)]
    pub size: String,

    #[serde(default)]
    pub time: String,
}

impl From<AdvancedMarketTrade> for Trade {
    fn from(raw: AdvancedMarketTrade) -> Self {
        Self {
            trade_id: raw.trade_id,
            order_id: String::new(),
            product_id: raw.product_id,
            side: raw.side,
            price: parse_num(&raw.price),
            size: parse_num(&raw.size),
            time: raw.time,
        }
    }
}

/// Candle as returned by the primary surface, all fields decimal strings
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedCandle {
    #[serde(default)]
    pub start: String,

    #[serde(default)]
    pub low: String,

    #[serde(default)]
    pub high: String,

    #[serde(default)]
    pub open: String,

    #[serde(default)]
    pub close: String,

    #[serde(default)]
    pub volume: String,
}

impl From<AdvancedCandle> for Candle {
    fn from(raw: AdvancedCandle) -> Self {
        Self {
            start: raw.start.parse().unwrap_or(0),
            low: parse_num(&raw.low),
            high: parse_num(&raw.high),
            open: parse_num(&raw.open),
            close: parse_num(&raw.close),
            volume: parse_num(&raw.volume),
        }
    }
}

/// Order placement response from the primary surface
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub success_response: Option<OrderSuccessResponse>,

    #[serde(default)]
    pub error_response: Option<OrderErrorResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSuccessResponse {
    #[serde(default)]
    pub order_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderErrorResponse {
    #[serde(default)]
    pub error: String,

    #[serde(default)]
    pub message: String,
}

impl From<CreateOrderResponse> for OrderAck {
    fn from(raw: CreateOrderResponse) -> Self {
        let order_id = raw
            .success_response
            .map(|r| r.order_id)
            .unwrap_or_default();
        let failure_reason = raw
            .error_response
            .map(|r| if r.message.is_empty() { r.error } else { r.message })
            .unwrap_or_default();
        Self {
            success: raw.success,
            order_id,
            failure_reason,
        }
    }
}

/// Cancellation result item from the primary surface
#[derive(Debug, Clone, Deserialize)]
pub struct RawCancelResult {
    #[serde(default)]
    pub order_id: String,

    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub failure_reason: String,
}

impl From<RawCancelResult> for CancelResult {
    fn from(raw: RawCancelResult) -> Self {
        Self {
            order_id: raw.order_id,
            success: raw.success,
            failure_reason: raw.failure_reason,
        }
    }
}

// =============================================================================
// Legacy surface payloads
// =============================================================================

/// Account as returned by the legacy surface, decimal strings throughout
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeAccount {
    pub id: String,

    #[serde(default)]
    pub currency: String,

    #[serde(default)]
    pub balance: String,

    #[serde(default)]
    pub available: String,

    #[serde(default)]
    pub hold: String,
}

impl From<ExchangeAccount> for Account {
    fn from(raw: ExchangeAccount) -> Self {
        Self {
            id: raw.id,
            // The legacy surface has no display name; the currency stands in
            name: raw.currency.clone(),
            currency: raw.currency,
            balance: parse_num(&raw.balance),
            available: parse_num(&raw.available),
            hold: parse_num(&raw.hold),
        }
    }
}

// =============================================================================
// OAuth surface payloads
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct V2Currency {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct V2Balance {
    #[serde(default)]
    pub amount: String,
}

/// Account as returned by the OAuth surface
#[derive(Debug, Clone, Deserialize)]
pub struct V2Account {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub currency: V2Currency,

    #[serde(default)]
    pub balance: V2Balance,
}

impl From<V2Account> for Account {
    fn from(raw: V2Account) -> Self {
        let balance = parse_num(&raw.balance.amount);
        Self {
            id: raw.id,
            name: raw.name,
            currency: raw.currency.code,
            balance,
            // The OAuth surface reports a single figure with no hold split
            available: balance,
            hold: 0.0,
        }
    }
}
