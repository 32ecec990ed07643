//! Yahoo Finance provider

use async_trait::async_trait;
use chrono::Utc;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use super::crumb::CrumbSession;
use super::payload;
use crate::config::{MarketConfig, YahooEndpoints};
use crate::error::{MarketError, Result};
use crate::models::{InfoMap, PriceBar, RecommendationRow, StatementKind, StatementTable};
use crate::provider::MarketDataProvider;
use crate::retry::RetryPolicy;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Start of the fundamentals window (2016-12-31 UTC)
const FUNDAMENTALS_START: i64 = 1_483_142_400;
const NEWS_COUNT: u32 = 10;

/// Yahoo Finance implementation of [`MarketDataProvider`]
pub struct YahooProvider {
    http: reqwest::Client,
    connector: yahoo::YahooConnector,
    endpoints: YahooEndpoints,
    session: CrumbSession,
    rate_limiter: SharedRateLimiter,
    retry: RetryPolicy,
}

impl YahooProvider {
    /// Create a provider from configuration
    pub fn new(config: &MarketConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .build()?;
        let connector = yahoo::YahooConnector::builder()
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .build()?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            http,
            connector,
            endpoints: config.endpoints.clone(),
            session: CrumbSession::new(config.crumb_ttl()),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Issue an authenticated request, retrying transient failures
    async fn request_json(
        &self,
        endpoint: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        self.retry
            .execute(endpoint, || {
                self.request_with_session(endpoint, method.clone(), url, query, body)
            })
            .await
    }

    /// One request, renegotiating the crumb once if Yahoo rejects it
    async fn request_with_session(
        &self,
        endpoint: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        match self.send(endpoint, method.clone(), url, query, body).await {
            Err(e) if e.is_auth_failure() => {
                warn!("{} rejected the session ({}), refreshing crumb", endpoint, e);
                self.session.invalidate().await;
                self.send(endpoint, method, url, query, body).await
            }
            other => other,
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let crumb = self.session.crumb(&self.http, &self.endpoints).await?;
        self.rate_limiter.until_ready().await;

        debug!("{} {} ({})", method, url, endpoint);
        let mut request = self
            .http
            .request(method, url)
            .query(query)
            .query(&[("crumb", crumb)]);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Self::decode(endpoint, status, &text)
    }

    fn decode(endpoint: &str, status: StatusCode, text: &str) -> Result<Value> {
        let parsed: Option<Value> = serde_json::from_str(text).ok();

        if status.is_success() {
            return match parsed {
                Some(value) => Ok(value),
                None => Err(MarketError::UnexpectedResponse(format!(
                    "{endpoint} returned a non-JSON body"
                ))),
            };
        }

        // Auth failures are reported by status so the caller can refresh
        if matches!(status.as_u16(), 401 | 403 | 429) {
            return Err(MarketError::http_status(status.as_u16(), endpoint));
        }

        match parsed.as_ref().and_then(payload::error_description) {
            Some(description) => Err(MarketError::Provider(description)),
            None => Err(MarketError::http_status(status.as_u16(), endpoint)),
        }
    }

    fn quote_summary_url(&self, symbol: &str) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{}",
            self.endpoints.query2,
            urlencoding::encode(symbol)
        )
    }

    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Value> {
        let url = self.quote_summary_url(symbol);
        let query = [
            ("modules", modules.to_string()),
            ("formatted", "false".to_string()),
            ("corsDomain", "finance.yahoo.com".to_string()),
        ];
        self.request_json("quoteSummary", Method::GET, &url, &query, None)
            .await
    }

    async fn chart(&self, symbol: &str, period: &str, interval: &str) -> Result<Value> {
        self.rate_limiter.until_ready().await;
        debug!("chart {} range={} interval={}", symbol, period, interval);
        chart_payload(
            self.connector
                .get_quote_range(symbol, interval, period)
                .await,
        )
    }

    async fn news_stream(&self, symbol: &str) -> Result<Vec<Value>> {
        let url = format!("{}/xhr/ncp", self.endpoints.finance);
        let query = [
            ("queryRef", "latestNews".to_string()),
            ("serviceKey", "ncp_fin".to_string()),
        ];
        let body = json!({
            "serviceConfig": { "snippetCount": NEWS_COUNT, "s": [symbol] }
        });
        let response = self
            .request_json("news", Method::POST, &url, &query, Some(&body))
            .await?;
        payload::parse_news_stream(&response)
    }

    async fn news_search(&self, symbol: &str) -> Result<Vec<Value>> {
        let url = format!("{}/v1/finance/search", self.endpoints.query2);
        let query = [
            ("q", symbol.to_string()),
            ("quotesCount", "0".to_string()),
            ("newsCount", NEWS_COUNT.to_string()),
            ("enableFuzzyQuery", "false".to_string()),
        ];
        let response = self
            .request_json("search", Method::GET, &url, &query, None)
            .await?;
        Ok(payload::parse_search_news(&response))
    }
}

/// Raw chart document, `Null` when Yahoo has no rows for the range
fn chart_payload(
    response: std::result::Result<yahoo::YResponse, yahoo::YahooError>,
) -> Result<Value> {
    match response {
        Ok(chart) => Ok(serde_json::to_value(&chart)?),
        Err(yahoo::YahooError::NoResult | yahoo::YahooError::NoQuotes) => Ok(Value::Null),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn info(&self, symbol: &str) -> Result<InfoMap> {
        let symbol = symbol.to_uppercase();
        let body = self
            .quote_summary(&symbol, &payload::INFO_MODULES.join(","))
            .await?;
        payload::parse_info(&body)
    }

    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Result<Vec<PriceBar>> {
        let symbol = symbol.to_uppercase();
        let chart = self
            .retry
            .execute("chart", || self.chart(&symbol, period, interval))
            .await?;
        Ok(payload::parse_chart(
            &chart,
            payload::is_daily_interval(interval),
        ))
    }

    async fn news(&self, symbol: &str) -> Result<Vec<Value>> {
        let symbol = symbol.to_uppercase();
        match self.news_stream(&symbol).await {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!("News stream failed for {}: {}; falling back to search", symbol, e);
                self.news_search(&symbol).await
            }
        }
    }

    async fn financial_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<StatementTable> {
        let symbol = symbol.to_uppercase();
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.endpoints.query2,
            urlencoding::encode(&symbol)
        );
        let query = [
            ("symbol", symbol.clone()),
            ("type", payload::timeseries_types(kind)),
            ("period1", FUNDAMENTALS_START.to_string()),
            ("period2", Utc::now().timestamp().to_string()),
        ];
        let body = self
            .request_json("timeseries", Method::GET, &url, &query, None)
            .await?;
        payload::parse_timeseries(&body, kind)
    }

    async fn recommendations(&self, symbol: &str) -> Result<Vec<RecommendationRow>> {
        let symbol = symbol.to_uppercase();
        let body = self.quote_summary(&symbol, "recommendationTrend").await?;
        payload::parse_recommendation_trend(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn session_routes() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route("/v1/test/getcrumb", get(|| async { "testcrumb" }))
    }

    fn provider_for(base: String) -> YahooProvider {
        let config = MarketConfig::builder()
            .endpoints(YahooEndpoints::single_host(base))
            .request_timeout_secs(5)
            .requests_per_minute(6000)
            .build()
            .unwrap();
        YahooProvider::new(&config)
            .unwrap()
            .with_retry_policy(RetryPolicy::fast())
    }

    #[test]
    fn test_decode_statuses() {
        let ok = YahooProvider::decode("x", StatusCode::OK, "{\"a\":1}").unwrap();
        assert_eq!(ok["a"], 1);

        let err = YahooProvider::decode(
            "quoteSummary",
            StatusCode::NOT_FOUND,
            r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found for symbol: ZZZZ"}}}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Quote not found for symbol: ZZZZ");

        let err = YahooProvider::decode("x", StatusCode::UNAUTHORIZED, "{}").unwrap_err();
        assert!(err.is_auth_failure());

        let err = YahooProvider::decode("x", StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_info_sends_crumb_and_merges_modules() {
        let router = session_routes().route(
            "/v10/finance/quoteSummary/:symbol",
            get(
                |Path(symbol): Path<String>, Query(query): Query<HashMap<String, String>>| async move {
                    assert_eq!(query.get("crumb").map(String::as_str), Some("testcrumb"));
                    assert_eq!(query.get("formatted").map(String::as_str), Some("false"));
                    Json(json!({
                        "quoteSummary": {
                            "result": [{
                                "price": {"symbol": symbol, "regularMarketPrice": {"raw": 10.5}},
                                "summaryProfile": {"sector": "Energy"}
                            }],
                            "error": null
                        }
                    }))
                },
            ),
        );
        let provider = provider_for(serve(router).await);

        let info = provider.info("xom").await.unwrap();
        assert_eq!(info.string("symbol").as_deref(), Some("XOM"));
        assert_eq!(info.string("sector").as_deref(), Some("Energy"));
    }

    #[tokio::test]
    async fn test_crumb_refresh_after_unauthorized() {
        let crumb_hits = Arc::new(AtomicU32::new(0));
        let crumb_counter = crumb_hits.clone();

        let router = Router::new()
            .route("/", get(|| async { "ok" }))
            .route(
                "/v1/test/getcrumb",
                get(move || {
                    let counter = crumb_counter.clone();
                    async move { format!("crumb{}", counter.fetch_add(1, Ordering::SeqCst)) }
                }),
            )
            .route(
                "/v10/finance/quoteSummary/:symbol",
                get(|Query(query): Query<HashMap<String, String>>| async move {
                    if query.get("crumb").map(String::as_str) == Some("crumb0") {
                        return (HttpStatus::UNAUTHORIZED, Json(json!({})));
                    }
                    (
                        HttpStatus::OK,
                        Json(json!({
                            "quoteSummary": {
                                "result": [{"recommendationTrend": {"trend": [
                                    {"period": "0m", "strongBuy": 1, "buy": 2, "hold": 3, "sell": 0, "strongSell": 0}
                                ]}}],
                                "error": null
                            }
                        })),
                    )
                }),
            );
        let provider = provider_for(serve(router).await);

        let rows = provider.recommendations("AAPL").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hold, Some(3));
        assert_eq!(crumb_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();

        let router = session_routes().route(
            "/ws/fundamentals-timeseries/v1/finance/timeseries/:symbol",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        return (HttpStatus::SERVICE_UNAVAILABLE, Json(json!({})));
                    }
                    (
                        HttpStatus::OK,
                        Json(json!({"timeseries": {"result": [
                            {
                                "meta": {"type": ["annualTotalAssets"]},
                                "annualTotalAssets": [{"asOfDate": "2024-09-30", "reportedValue": {"raw": 1.0}}]
                            }
                        ], "error": null}})),
                    )
                }
            }),
        );
        let provider = provider_for(serve(router).await);

        let table = provider
            .financial_statement("AAPL", StatementKind::Balance)
            .await
            .unwrap();
        assert_eq!(table.columns, vec!["2024-09-30"]);
        assert_eq!(table.rows[0].label, "TotalAssets");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_news_falls_back_to_search() {
        let router = session_routes()
            .route(
                "/xhr/ncp",
                post(|| async { (HttpStatus::BAD_REQUEST, Json(json!({}))) }),
            )
            .route(
                "/v1/finance/search",
                get(|| async {
                    Json(json!({"news": [
                        {"title": "Legacy headline", "publisher": "AP", "link": "https://example.com"}
                    ]}))
                }),
            );
        let provider = provider_for(serve(router).await);

        let items = provider.news("AAPL").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Legacy headline");
    }

    #[tokio::test]
    async fn test_news_stream_primary_source() {
        let router = session_routes().route(
            "/xhr/ncp",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["serviceConfig"]["s"][0], "AAPL");
                Json(json!({"data": {"tickerStream": {"stream": [
                    {"id": "1", "content": {"title": "Modern headline"}}
                ]}}}))
            }),
        );
        let provider = provider_for(serve(router).await);

        let items = provider.news("aapl").await.unwrap();
        assert_eq!(items[0]["content"]["title"], "Modern headline");
    }

    fn quote_block(meta_offset: i32, timestamps: Vec<i64>, indicators: Value) -> yahoo::YResponse {
        yahoo::YResponse {
            chart: yahoo::YChart {
                result: Some(vec![yahoo::YQuoteBlock {
                    meta: yahoo::YMetaData {
                        symbol: "AAPL".to_string(),
                        gmtoffset: meta_offset,
                        ..Default::default()
                    },
                    timestamp: Some(timestamps),
                    events: None,
                    indicators: serde_json::from_value(indicators).unwrap(),
                }]),
                error: None,
            },
        }
    }

    #[test]
    fn test_empty_chart_has_no_bars() {
        for err in [yahoo::YahooError::NoResult, yahoo::YahooError::NoQuotes] {
            let chart = chart_payload(Err(err)).unwrap();
            assert!(payload::parse_chart(&chart, true).is_empty());
        }

        let empty = quote_block(-18_000, vec![], json!({"quote": [{}]}));
        let chart = chart_payload(Ok(empty)).unwrap();
        assert!(payload::parse_chart(&chart, true).is_empty());
    }

    #[test]
    fn test_intraday_chart_keeps_missing_values() {
        // Intraday charts carry no adjclose block
        let response = quote_block(
            -18_000,
            vec![1_704_205_800, 1_704_206_100],
            json!({"quote": [{
                "open": [null, 185.2],
                "high": [186.0, 186.1],
                "low": [184.0, 184.5],
                "close": [185.5, 185.9],
                "volume": [1200, 900]
            }]}),
        );
        let chart = chart_payload(Ok(response)).unwrap();
        let bars = payload::parse_chart(&chart, payload::is_daily_interval("5m"));

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, None);
        assert_eq!(bars[0].adj_close, None);
        assert_eq!(bars[0].timestamp.to_rfc3339(), "2024-01-02T09:30:00-05:00");
        assert_eq!(bars[1].open, Some(185.2));
        assert_eq!(bars[1].adj_close, None);
    }

    #[test]
    fn test_chart_failure_is_reported() {
        let err = chart_payload(Err(yahoo::YahooError::DataInconsistency)).unwrap_err();
        assert!(matches!(err, MarketError::YahooFinance(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_connector_uses_configured_client() {
        let config = MarketConfig::builder()
            .request_timeout_secs(3)
            .user_agent("yfmcp-test/1.0")
            .build()
            .unwrap();
        assert!(YahooProvider::new(&config).is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires network access to Yahoo Finance
    async fn test_live_history() {
        let provider = YahooProvider::new(&MarketConfig::default()).unwrap();
        let bars = provider.history("AAPL", "5d", "1d").await.unwrap();
        assert!(!bars.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access to Yahoo Finance
    async fn test_live_info() {
        let provider = YahooProvider::new(&MarketConfig::default()).unwrap();
        let info = provider.info("AAPL").await.unwrap();
        assert!(info.get("longName").is_some());
    }
}
