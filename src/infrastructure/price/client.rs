//! Price oracle client backed by the DefiLlama coins API.
//!
//! Symbols are resolved through the configured CoinGecko id mapping; a
//! symbol without a mapping quotes as `Unavailable` without a network call.
//! Current quotes go through a short-lived in-memory cache so dashboard
//! reads do not hammer the oracle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::PriceConfig;
use crate::infrastructure::price::error::PriceError;

/// Result of a price lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceQuote {
    /// USD price
    Price(f64),
    /// The oracle has no quote for this token
    Unavailable,
}

#[derive(Debug, Deserialize)]
struct CoinsEnvelope {
    #[serde(default)]
    coins: HashMap<String, CoinPrice>,
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    price: f64,
}

#[derive(Debug, Default)]
struct CurrentCache {
    fetched_at: Option<Instant>,
    prices: HashMap<String, f64>,
}

/// Client for current and historical token prices
#[derive(Clone)]
pub struct PriceClient {
    client: Client,
    base_url: String,
    /// Token symbol to CoinGecko id mapping
    ids: HashMap<String, String>,
    cache_ttl: Duration,
    cache: Arc<RwLock<CurrentCache>>,
}

impl PriceClient {
    /// Create a new price client from configuration
    pub fn new(
        config: &PriceConfig,
        ids: HashMap<String, String>,
    ) -> Result<Self, PriceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PriceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            ids,
            cache_ttl: Duration::from_secs(config.cache_secs),
            cache: Arc::new(RwLock::new(CurrentCache::default())),
        })
    }

    /// Current USD prices for the given symbols.
    ///
    /// Symbols without a configured id are absent from the result. Served
    /// from the cache while it is fresh and covers every requested symbol.
    pub async fn current_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, f64>, PriceError> {
        let known: Vec<&String> = symbols.iter().filter(|s| self.ids.contains_key(*s)).collect();
        if known.is_empty() {
            return Ok(HashMap::new());
        }

        {
            let cache = self.cache.read().await;
            if let Some(fetched_at) = cache.fetched_at {
                if fetched_at.elapsed() < self.cache_ttl
                    && known.iter().all(|s| cache.prices.contains_key(*s))
                {
                    return Ok(known
                        .iter()
                        .map(|s| ((*s).clone(), cache.prices[*s]))
                        .collect());
                }
            }
        }

        let keys: Vec<String> = known
            .iter()
            .map(|s| format!("coingecko:{}", self.ids[*s]))
            .collect();
        let url = format!(
            "{}/prices/current/{}?searchWidth=4h",
            self.base_url,
            keys.join(",")
        );
        let body = self.get_text(&url).await?;
        let by_key = Self::parse_coins(&body)?;

        let mut result = HashMap::new();
        for symbol in &known {
            let key = format!("coingecko:{}", self.ids[*symbol]);
            if let Some(price) = by_key.get(&key) {
                result.insert((*symbol).clone(), *price);
            }
        }

        let mut cache = self.cache.write().await;
        cache.prices.extend(result.clone());
        cache.fetched_at = Some(Instant::now());

        Ok(result)
    }

    /// Current USD price for one symbol
    pub async fn current_price(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        if !self.ids.contains_key(symbol) {
            return Ok(PriceQuote::Unavailable);
        }
        let prices = self.current_prices(&[symbol.to_string()]).await?;
        Ok(prices
            .get(symbol)
            .map(|p| PriceQuote::Price(*p))
            .unwrap_or(PriceQuote::Unavailable))
    }

    /// Historical USD price for a symbol on a UTC calendar day, quoted at
    /// noon with a 12h search window
    pub async fn historical_price(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<PriceQuote, PriceError> {
        let Some(id) = self.ids.get(symbol) else {
            return Ok(PriceQuote::Unavailable);
        };
        let Some(noon) = date.and_hms_opt(12, 0, 0) else {
            return Ok(PriceQuote::Unavailable);
        };
        let key = format!("coingecko:{}", id);
        let url = format!(
            "{}/prices/historical/{}/{}?searchWidth=12h",
            self.base_url,
            noon.and_utc().timestamp(),
            key
        );
        let body = self.get_text(&url).await?;
        let by_key = Self::parse_coins(&body)?;
        Ok(by_key
            .get(&key)
            .filter(|p| **p > 0.0)
            .map(|p| PriceQuote::Price(*p))
            .unwrap_or(PriceQuote::Unavailable))
    }

    async fn get_text(&self, url: &str) -> Result<String, PriceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PriceError::Network(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| PriceError::Network(e.to_string()))
    }

    fn parse_coins(body: &str) -> Result<HashMap<String, f64>, PriceError> {
        let envelope: CoinsEnvelope =
            serde_json::from_str(body).map_err(|e| PriceError::Parse(e.to_string()))?;
        Ok(envelope
            .coins
            .into_iter()
            .map(|(key, coin)| (key, coin.price))
            .collect())
    }
}
