//! Data shapes exchanged between the provider and the lookup tools

use chrono::{DateTime, FixedOffset};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

/// Maximum length of the business summary in a quote
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Unwrap a provider value to its plain form
///
/// Yahoo sends numbers either bare or as `{"raw": 1.0, "fmt": "1.00"}`, and
/// uses `{}` for "no value". Null and `{}` both map to `None`.
pub fn unwrap_raw(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => match map.get("raw") {
            Some(Value::Null) => None,
            Some(raw) => Some(raw),
            None if map.is_empty() => None,
            None => Some(value),
        },
        other => Some(other),
    }
}

/// Flat field map merged from the provider's per-module payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfoMap(Map<String, Value>);

impl InfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, keeping any earlier value for the same key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if unwrap_raw(&value).is_some() && !self.0.contains_key(&key) {
            self.0.insert(key, value);
        }
    }

    /// Merge every field of one provider module
    pub fn merge_module(&mut self, module: &Map<String, Value>) {
        for (key, value) in module {
            self.insert(key.as_str(), value.clone());
        }
    }

    /// Field value with provider wrapping removed
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).and_then(unwrap_raw)
    }

    pub fn number(&self, key: &str) -> Option<Number> {
        match self.get(key)? {
            Value::Number(n) => Some(n.clone()),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key)?.as_str().map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for InfoMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Quote summary returned by `get_stock_info`
///
/// Field order is the key order of the emitted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<Number>,
    pub currency: Option<String>,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<Number>,
    #[serde(rename = "peRatio")]
    pub pe_ratio: Option<Number>,
    #[serde(rename = "52WeekHigh")]
    pub fifty_two_week_high: Option<Number>,
    #[serde(rename = "52WeekLow")]
    pub fifty_two_week_low: Option<Number>,
    pub volume: Option<Number>,
    #[serde(rename = "avgVolume")]
    pub avg_volume: Option<Number>,
    #[serde(rename = "dividendYield")]
    pub dividend_yield: Option<Number>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub summary: String,
}

impl QuoteInfo {
    /// Select the quote fields from a provider info map
    pub fn from_info(symbol: &str, info: &InfoMap) -> Self {
        let current = info
            .number("currentPrice")
            .filter(|n| n.as_f64().is_some_and(|v| v != 0.0));

        Self {
            symbol: symbol.to_uppercase(),
            name: info.string("longName"),
            price: current.or_else(|| info.number("regularMarketPrice")),
            currency: info.string("currency"),
            market_cap: info.number("marketCap"),
            pe_ratio: info.number("trailingPE"),
            fifty_two_week_high: info.number("fiftyTwoWeekHigh"),
            fifty_two_week_low: info.number("fiftyTwoWeekLow"),
            volume: info.number("volume"),
            avg_volume: info.number("averageVolume"),
            dividend_yield: info.number("dividendYield"),
            sector: info.string("sector"),
            industry: info.string("industry"),
            summary: info
                .string("longBusinessSummary")
                .map(|s| s.chars().take(SUMMARY_MAX_CHARS).collect())
                .unwrap_or_default(),
        }
    }
}

/// One OHLCV bar of a price series, stamped in the exchange's offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<u64>,
}

/// News headline returned by `get_stock_news`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: String,
    pub link: String,
}

impl NewsItem {
    /// Extract a headline from either provider item shape
    ///
    /// Modern items nest everything under `content`; legacy items are flat.
    /// Missing fields fall back to placeholders so every field is a string.
    pub fn from_provider(item: &Value) -> Self {
        let text = |pointer: &str| {
            item.pointer(pointer)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        // A present title wins even when blank
        let title = ["/content/title", "/title"]
            .iter()
            .find_map(|pointer| item.pointer(pointer).and_then(Value::as_str))
            .map_or_else(|| "No title".to_string(), str::to_string);

        Self {
            title,
            publisher: text("/content/provider/displayName")
                .or_else(|| text("/publisher"))
                .unwrap_or_else(|| "Unknown".to_string()),
            link: text("/content/canonicalUrl/url")
                .or_else(|| text("/content/clickThroughUrl/url"))
                .or_else(|| text("/link"))
                .unwrap_or_default(),
        }
    }
}

/// Annual financial statement kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Income,
    Balance,
    Cashflow,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Balance => "balance",
            Self::Cashflow => "cashflow",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "balance" => Ok(Self::Balance),
            "cashflow" => Ok(Self::Cashflow),
            other => Err(other.to_string()),
        }
    }
}

/// One line item of a statement, aligned with the table's columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Financial statement: line items by period end-date, newest period first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    pub columns: Vec<String>,
    pub rows: Vec<StatementRow>,
}

impl StatementTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Keep the first `n` line items
    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// View serializing as `{row: {date: value}}` in table order
    pub fn indexed(&self) -> IndexedStatement<'_> {
        IndexedStatement(self)
    }
}

/// Row-label keyed rendering of a [`StatementTable`]
pub struct IndexedStatement<'a>(&'a StatementTable);

struct IndexedRow<'a> {
    columns: &'a [String],
    values: &'a [Option<f64>],
}

impl Serialize for IndexedStatement<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.0;
        let mut map = serializer.serialize_map(Some(table.rows.len()))?;
        for row in &table.rows {
            map.serialize_entry(
                &row.label,
                &IndexedRow {
                    columns: &table.columns,
                    values: &row.values,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for IndexedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (i, column) in self.columns.iter().enumerate() {
            let value = self.values.get(i).copied().flatten();
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}

/// Analyst recommendation counts for one period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRow {
    pub period: Option<String>,
    pub strong_buy: Option<i64>,
    pub buy: Option<i64>,
    pub hold: Option<i64>,
    pub sell: Option<i64>,
    pub strong_sell: Option<i64>,
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_raw_shapes() {
        assert_eq!(unwrap_raw(&json!(12.5)), Some(&json!(12.5)));
        assert_eq!(unwrap_raw(&json!({"raw": 3, "fmt": "3"})), Some(&json!(3)));
        assert_eq!(unwrap_raw(&json!({})), None);
        assert_eq!(unwrap_raw(&Value::Null), None);
        assert_eq!(unwrap_raw(&json!({"raw": null})), None);
        assert_eq!(unwrap_raw(&json!({"name": "x"})), Some(&json!({"name": "x"})));
    }

    #[test]
    fn test_info_map_first_writer_wins() {
        let mut info = InfoMap::new();
        info.merge_module(json!({"currency": "USD", "volume": {}}).as_object().unwrap());
        info.merge_module(json!({"currency": "EUR", "volume": {"raw": 10}}).as_object().unwrap());

        assert_eq!(info.string("currency").as_deref(), Some("USD"));
        assert_eq!(info.number("volume"), Some(Number::from(10)));
        assert_eq!(info.len(), 2);
    }

    #[test]
    fn test_quote_info_price_fallback() {
        let info: InfoMap = [
            ("currentPrice", json!(0)),
            ("regularMarketPrice", json!({"raw": 187.5})),
        ]
        .into_iter()
        .collect();
        let quote = QuoteInfo::from_info("aapl", &info);
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price.and_then(|n| n.as_f64()), Some(187.5));
        assert_eq!(quote.summary, "");
        assert!(quote.name.is_none());
    }

    #[test]
    fn test_quote_info_key_order_and_truncation() {
        let info: InfoMap = [
            ("longName", json!("Apple Inc.")),
            ("currentPrice", json!(190.1)),
            ("marketCap", json!(3_000_000_000_000_i64)),
            ("longBusinessSummary", json!("x".repeat(800))),
        ]
        .into_iter()
        .collect();
        let quote = QuoteInfo::from_info("AAPL", &info);
        assert_eq!(quote.summary.chars().count(), SUMMARY_MAX_CHARS);

        let rendered = serde_json::to_string(&quote).unwrap();
        let keys = [
            "\"symbol\"",
            "\"name\"",
            "\"price\"",
            "\"currency\"",
            "\"marketCap\"",
            "\"peRatio\"",
            "\"52WeekHigh\"",
            "\"52WeekLow\"",
            "\"volume\"",
            "\"avgVolume\"",
            "\"dividendYield\"",
            "\"sector\"",
            "\"industry\"",
            "\"summary\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| rendered.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(rendered.contains("\"marketCap\":3000000000000"));
    }

    #[test]
    fn test_news_item_modern_shape() {
        let item = NewsItem::from_provider(&json!({
            "id": "1",
            "content": {
                "title": "Apple beats estimates",
                "provider": {"displayName": "Reuters"},
                "canonicalUrl": {"url": "https://example.com/a"},
                "clickThroughUrl": {"url": "https://example.com/b"}
            }
        }));
        assert_eq!(item.title, "Apple beats estimates");
        assert_eq!(item.publisher, "Reuters");
        assert_eq!(item.link, "https://example.com/a");
    }

    #[test]
    fn test_news_item_click_through_and_legacy() {
        let item = NewsItem::from_provider(&json!({
            "content": {"title": "T", "canonicalUrl": null, "clickThroughUrl": {"url": "https://c"}}
        }));
        assert_eq!(item.link, "https://c");
        assert_eq!(item.publisher, "Unknown");

        let legacy = NewsItem::from_provider(&json!({
            "title": "Old", "publisher": "AP", "link": "https://old"
        }));
        assert_eq!(
            legacy,
            NewsItem {
                title: "Old".to_string(),
                publisher: "AP".to_string(),
                link: "https://old".to_string(),
            }
        );
    }

    #[test]
    fn test_news_item_placeholders() {
        let item = NewsItem::from_provider(&json!({}));
        assert_eq!(item.title, "No title");
        assert_eq!(item.publisher, "Unknown");
        assert_eq!(item.link, "");
    }

    #[test]
    fn test_news_item_blank_title_is_kept() {
        let item = NewsItem::from_provider(&json!({
            "content": {"title": "", "provider": {"displayName": ""}}
        }));
        assert_eq!(item.title, "");
        assert_eq!(item.publisher, "Unknown");

        let legacy = NewsItem::from_provider(&json!({"title": ""}));
        assert_eq!(legacy.title, "");
    }

    #[test]
    fn test_statement_kind_parsing() {
        assert_eq!("income".parse::<StatementKind>(), Ok(StatementKind::Income));
        assert_eq!("cashflow".parse::<StatementKind>(), Ok(StatementKind::Cashflow));
        assert!("Income".parse::<StatementKind>().is_err());
        assert!("equity".parse::<StatementKind>().is_err());
        assert_eq!(StatementKind::Balance.to_string(), "balance");
    }

    #[test]
    fn test_indexed_statement_preserves_order() {
        let table = StatementTable {
            columns: vec!["2024-09-30".to_string(), "2023-09-30".to_string()],
            rows: vec![
                StatementRow {
                    label: "TotalRevenue".to_string(),
                    values: vec![Some(391_035_000_000.0), Some(383_285_000_000.0)],
                },
                StatementRow {
                    label: "CostOfRevenue".to_string(),
                    values: vec![Some(210_352_000_000.0), None],
                },
            ],
        };

        let rendered = serde_json::to_string(&table.indexed()).unwrap();
        assert_eq!(
            rendered,
            "{\"TotalRevenue\":{\"2024-09-30\":391035000000.0,\"2023-09-30\":383285000000.0},\
             \"CostOfRevenue\":{\"2024-09-30\":210352000000.0,\"2023-09-30\":null}}"
        );
        assert_eq!(table.head(1).rows.len(), 1);
    }
}
