//! Account queries across surfaces
//!
//! The same canonical Account comes back regardless of which upstream
//! surface served the request.

use super::helpers::{expect_array, expect_field, expect_list, map_list, parse_item};
use super::{RestClient, Result, Surface};
use crate::models::{Account, AdvancedAccount, ExchangeAccount, V2Account};
use reqwest::Method;
use tracing::debug;

impl RestClient {
    /// Get funding accounts from the primary surface
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let value = self
            .request(Method::GET, "accounts", None, Surface::Advanced)
            .await?;

        let accounts: Vec<Account> = map_list::<AdvancedAccount, _>(expect_list(value, "accounts")?)?;
        debug!("Fetched {} accounts", accounts.len());
        Ok(accounts)
    }

    /// Get a single funding account by uuid
    pub async fn get_account(&self, account_id: &str) -> Result<Account> {
        let path = format!("accounts/{}", account_id);
        let value = self
            .request(Method::GET, &path, None, Surface::Advanced)
            .await?;

        let raw: AdvancedAccount = parse_item(expect_field(value, "account")?)?;
        Ok(Account::from(raw))
    }

    /// Get trading accounts from the legacy surface
    ///
    /// The legacy surface returns a bare array rather than an envelope.
    pub async fn list_exchange_accounts(&self) -> Result<Vec<Account>> {
        let value = self
            .request(Method::GET, "accounts", None, Surface::Exchange)
            .await?;

        map_list::<ExchangeAccount, _>(expect_array(value)?)
    }

    /// Get wallet accounts from the OAuth surface
    pub async fn list_oauth_accounts(&self) -> Result<Vec<Account>> {
        let value = self
            .request(Method::GET, "accounts", None, Surface::OAuth)
            .await?;

        map_list::<V2Account, _>(expect_list(value, "data")?)
    }
}
