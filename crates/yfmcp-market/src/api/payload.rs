//! Parsers for Yahoo JSON payloads

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

use crate::error::{MarketError, Result};
use crate::models::{
    InfoMap, PriceBar, RecommendationRow, StatementKind, StatementRow, StatementTable, unwrap_raw,
};

/// quoteSummary modules merged into the info map, in precedence order
pub const INFO_MODULES: &[&str] = &[
    "price",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
    "assetProfile",
    "summaryProfile",
    "quoteType",
];

const INCOME_KEYS: &[&str] = &[
    "TotalRevenue",
    "CostOfRevenue",
    "GrossProfit",
    "OperatingExpense",
    "OperatingIncome",
    "NetNonOperatingInterestIncomeExpense",
    "OtherIncomeExpense",
    "PretaxIncome",
    "TaxProvision",
    "NetIncomeCommonStockholders",
    "NetIncome",
    "DilutedEPS",
    "BasicEPS",
    "DilutedAverageShares",
    "BasicAverageShares",
    "EBIT",
    "EBITDA",
    "TotalExpenses",
    "InterestExpense",
    "ResearchAndDevelopment",
    "SellingGeneralAndAdministration",
];

const BALANCE_KEYS: &[&str] = &[
    "TotalAssets",
    "TotalLiabilitiesNetMinorityInterest",
    "TotalEquityGrossMinorityInterest",
    "StockholdersEquity",
    "TotalCapitalization",
    "CommonStockEquity",
    "NetTangibleAssets",
    "WorkingCapital",
    "InvestedCapital",
    "TangibleBookValue",
    "TotalDebt",
    "NetDebt",
    "ShareIssued",
    "OrdinarySharesNumber",
    "CashAndCashEquivalents",
    "CurrentAssets",
    "CurrentLiabilities",
    "Inventory",
    "AccountsReceivable",
    "AccountsPayable",
    "LongTermDebt",
    "RetainedEarnings",
];

const CASHFLOW_KEYS: &[&str] = &[
    "OperatingCashFlow",
    "InvestingCashFlow",
    "FinancingCashFlow",
    "EndCashPosition",
    "CapitalExpenditure",
    "IssuanceOfDebt",
    "RepaymentOfDebt",
    "RepurchaseOfCapitalStock",
    "FreeCashFlow",
    "ChangesInCash",
    "BeginningCashPosition",
    "CashDividendsPaid",
    "DepreciationAndAmortization",
    "StockBasedCompensation",
    "ChangeInWorkingCapital",
    "NetIncomeFromContinuingOperations",
];

const ANNUAL_PREFIX: &str = "annual";

/// Line items requested for a statement kind, in row order
pub fn statement_keys(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::Income => INCOME_KEYS,
        StatementKind::Balance => BALANCE_KEYS,
        StatementKind::Cashflow => CASHFLOW_KEYS,
    }
}

/// Comma-separated `type` parameter for the timeseries endpoint
pub fn timeseries_types(kind: StatementKind) -> String {
    statement_keys(kind)
        .iter()
        .map(|key| format!("{ANNUAL_PREFIX}{key}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Description from a Yahoo error envelope such as
/// `{"quoteSummary": {"result": null, "error": {"code", "description"}}}`
pub fn error_description(body: &Value) -> Option<String> {
    body.as_object()?.values().find_map(|envelope| {
        let error = envelope.get("error").filter(|e| !e.is_null())?;
        error
            .get("description")
            .or_else(|| error.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

/// First result object of a quoteSummary response
pub fn quote_summary_result(body: &Value) -> Result<&Map<String, Value>> {
    if let Some(description) = error_description(body) {
        return Err(MarketError::Provider(description));
    }

    body.pointer("/quoteSummary/result/0")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            MarketError::UnexpectedResponse("quoteSummary response has no result".to_string())
        })
}

/// Merge the info modules of a quoteSummary response into one map
pub fn parse_info(body: &Value) -> Result<InfoMap> {
    let result = quote_summary_result(body)?;
    let mut info = InfoMap::new();
    for module in INFO_MODULES {
        if let Some(fields) = result.get(*module).and_then(Value::as_object) {
            info.merge_module(fields);
        }
    }
    Ok(info)
}

/// Recommendation trend rows in provider order
pub fn parse_recommendation_trend(body: &Value) -> Result<Vec<RecommendationRow>> {
    let result = quote_summary_result(body)?;
    let Some(trend) = result
        .get("recommendationTrend")
        .and_then(|m| m.get("trend"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    let count = |entry: &Value, key: &str| entry.get(key).and_then(unwrap_raw)?.as_i64();

    Ok(trend
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| RecommendationRow {
            period: entry
                .get("period")
                .and_then(Value::as_str)
                .map(str::to_string),
            strong_buy: count(entry, "strongBuy"),
            buy: count(entry, "buy"),
            hold: count(entry, "hold"),
            sell: count(entry, "sell"),
            strong_sell: count(entry, "strongSell"),
            date: None,
        })
        .collect())
}

/// Build a statement table from a fundamentals-timeseries response
pub fn parse_timeseries(body: &Value, kind: StatementKind) -> Result<StatementTable> {
    if let Some(description) = error_description(body) {
        return Err(MarketError::Provider(description));
    }

    let Some(results) = body.pointer("/timeseries/result").and_then(Value::as_array) else {
        return Ok(StatementTable::default());
    };

    let mut series: HashMap<&str, Vec<(&str, Option<f64>)>> = HashMap::new();
    for entry in results {
        let Some(type_name) = entry.pointer("/meta/type/0").and_then(Value::as_str) else {
            continue;
        };
        let Some(points) = entry.get(type_name).and_then(Value::as_array) else {
            continue;
        };
        let values = points
            .iter()
            .filter_map(|point| {
                let date = point.get("asOfDate")?.as_str()?;
                let value = point
                    .get("reportedValue")
                    .and_then(unwrap_raw)
                    .and_then(Value::as_f64);
                Some((date, value))
            })
            .collect();
        series.insert(type_name, values);
    }

    let keyed: Vec<(&str, &Vec<(&str, Option<f64>)>)> = statement_keys(kind)
        .iter()
        .filter_map(|key| {
            let points = series.get(format!("{ANNUAL_PREFIX}{key}").as_str())?;
            points
                .iter()
                .any(|(_, value)| value.is_some())
                .then_some((*key, points))
        })
        .collect();

    // ISO dates sort lexically; newest first
    let dates: BTreeSet<&str> = keyed
        .iter()
        .flat_map(|(_, points)| points.iter().map(|(date, _)| *date))
        .collect();
    let columns: Vec<String> = dates.iter().rev().map(|d| (*d).to_string()).collect();

    let rows = keyed
        .into_iter()
        .map(|(key, points)| StatementRow {
            label: key.to_string(),
            values: columns
                .iter()
                .map(|column| {
                    points
                        .iter()
                        .find(|(date, _)| *date == column.as_str())
                        .and_then(|(_, value)| *value)
                })
                .collect(),
        })
        .collect();

    Ok(StatementTable { columns, rows })
}

fn is_sponsored(item: &Value) -> bool {
    match item.get("ad") {
        None | Some(Value::Null) => false,
        Some(Value::Array(entries)) => !entries.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
        Some(Value::Bool(flag)) => *flag,
        Some(_) => true,
    }
}

/// News items from the finance site's `ncp` stream
pub fn parse_news_stream(body: &Value) -> Result<Vec<Value>> {
    let stream = body
        .pointer("/data/tickerStream/stream")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MarketError::UnexpectedResponse("news stream response has no items".to_string())
        })?;

    Ok(stream
        .iter()
        .filter(|item| !is_sponsored(item))
        .cloned()
        .collect())
}

/// News items from the search endpoint
pub fn parse_search_news(body: &Value) -> Vec<Value> {
    body.get("news")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter(|item| !is_sponsored(item)).cloned().collect())
        .unwrap_or_default()
}

/// Bar sizes Yahoo stamps at the session open rather than the bar start
const DAILY_INTERVALS: &[&str] = &["1d", "5d", "1wk", "1mo", "3mo"];

pub fn is_daily_interval(interval: &str) -> bool {
    DAILY_INTERVALS.contains(&interval)
}

fn chart_column<'a>(quote: Option<&'a Value>, name: &str) -> Option<&'a Vec<Value>> {
    quote.and_then(|q| q.get(name)).and_then(Value::as_array)
}

fn number_at(series: Option<&Vec<Value>>, index: usize) -> Option<f64> {
    series.and_then(|s| s.get(index)).and_then(Value::as_f64)
}

fn exchange_time(secs: i64, offset: FixedOffset, daily: bool) -> Option<DateTime<FixedOffset>> {
    let local = DateTime::from_timestamp(secs, 0)?.with_timezone(&offset);
    if !daily {
        return Some(local);
    }
    local
        .date_naive()
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(offset)
        .single()
}

/// Build price bars from a chart payload
///
/// Timestamps carry the exchange offset from `meta.gmtoffset`; daily and
/// longer bars sit at local midnight. Bars without a close are skipped and
/// any other missing value stays `None`, including the whole adjusted-close
/// column on intraday charts.
pub fn parse_chart(body: &Value, daily: bool) -> Vec<PriceBar> {
    let Some(result) = body.pointer("/chart/result/0") else {
        return Vec::new();
    };
    let Some(timestamps) = result.get("timestamp").and_then(Value::as_array) else {
        return Vec::new();
    };

    let offset = result
        .pointer("/meta/gmtoffset")
        .and_then(Value::as_i64)
        .and_then(|secs| i32::try_from(secs).ok())
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    let quote = result.pointer("/indicators/quote/0");
    let open = chart_column(quote, "open");
    let high = chart_column(quote, "high");
    let low = chart_column(quote, "low");
    let close = chart_column(quote, "close");
    let volume = chart_column(quote, "volume");
    let adj_close = result
        .pointer("/indicators/adjclose/0/adjclose")
        .and_then(Value::as_array);

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let close = number_at(close, i)?;
            Some(PriceBar {
                timestamp: exchange_time(ts.as_i64()?, offset, daily)?,
                open: number_at(open, i),
                high: number_at(high, i),
                low: number_at(low, i),
                close: Some(close),
                adj_close: number_at(adj_close, i),
                volume: volume.and_then(|s| s.get(i)).and_then(Value::as_u64),
            })
        })
        .collect()
}
