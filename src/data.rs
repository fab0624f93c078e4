//! Data loading and per-customer order preparation using Polars

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

use crate::error::{Result, RfmError};

/// One customer row as read from the CSV, before any parsing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOrderRecord {
    pub customer_id: Option<String>,
    pub order_channel: Option<String>,
    pub last_order_channel: Option<String>,
    pub first_order_date: Option<String>,
    pub last_order_date: Option<String>,
    pub last_order_date_online: Option<String>,
    pub last_order_date_offline: Option<String>,
    pub order_count_online: Option<String>,
    pub order_count_offline: Option<String>,
    pub spend_online: Option<String>,
    pub spend_offline: Option<String>,
    pub interested_categories: Option<String>,
}

/// Parsed customer order history
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerOrder {
    pub customer_id: String,
    pub order_channel: Option<String>,
    pub last_order_channel: Option<String>,
    pub first_order_date: NaiveDateTime,
    pub last_order_date: NaiveDateTime,
    pub last_order_date_online: Option<NaiveDateTime>,
    pub last_order_date_offline: Option<NaiveDateTime>,
    pub order_count_online: u32,
    pub order_count_offline: u32,
    pub spend_online: f64,
    pub spend_offline: f64,
    pub interested_categories: String,
}

/// Customer order history with cross-channel totals
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecord {
    pub order: CustomerOrder,
    pub order_count_total: u32,
    pub spend_total: f64,
}

impl PreparedRecord {
    pub fn customer_id(&self) -> &str {
        &self.order.customer_id
    }
}

// Accepted header names per field, preferred first.
const CUSTOMER_ID: &[&str] = &["master_id", "customer_id"];
const ORDER_CHANNEL: &[&str] = &["order_channel"];
const LAST_ORDER_CHANNEL: &[&str] = &["last_order_channel"];
const FIRST_ORDER_DATE: &[&str] = &["first_order_date"];
const LAST_ORDER_DATE: &[&str] = &["last_order_date"];
const LAST_ORDER_DATE_ONLINE: &[&str] = &["last_order_date_online"];
const LAST_ORDER_DATE_OFFLINE: &[&str] = &["last_order_date_offline"];
const ORDER_COUNT_ONLINE: &[&str] = &["order_num_total_ever_online", "order_count_online"];
const ORDER_COUNT_OFFLINE: &[&str] = &["order_num_total_ever_offline", "order_count_offline"];
const SPEND_ONLINE: &[&str] = &["customer_value_total_ever_online", "spend_online"];
const SPEND_OFFLINE: &[&str] = &["customer_value_total_ever_offline", "spend_offline"];
const INTERESTED_CATEGORIES: &[&str] = &["interested_in_categories_12", "interested_categories"];

/// Load customer order rows from a CSV file
///
/// # Arguments
/// * `file_path` - Path to the CSV file
///
/// # Returns
/// * One `RawOrderRecord` per data row, in file order
pub fn load_orders(file_path: &Path) -> Result<Vec<RawOrderRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()?;

    debug!(rows = df.height(), path = %file_path.display(), "read order csv");
    records_from_frame(&df)
}

/// Load customer order rows from CSV text already in memory
pub fn read_orders(csv: &str) -> Result<Vec<RawOrderRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(csv.as_bytes().to_vec()))
        .finish()?;

    records_from_frame(&df)
}

/// Map a string-typed frame onto raw records
fn records_from_frame(df: &DataFrame) -> Result<Vec<RawOrderRecord>> {
    let customer_id = required_column(df, CUSTOMER_ID)?;
    let first_order_date = required_column(df, FIRST_ORDER_DATE)?;
    let last_order_date = required_column(df, LAST_ORDER_DATE)?;
    let order_count_online = required_column(df, ORDER_COUNT_ONLINE)?;
    let order_count_offline = required_column(df, ORDER_COUNT_OFFLINE)?;
    let spend_online = required_column(df, SPEND_ONLINE)?;
    let spend_offline = required_column(df, SPEND_OFFLINE)?;

    let height = df.height();
    let order_channel = optional_column(df, ORDER_CHANNEL, height)?;
    let last_order_channel = optional_column(df, LAST_ORDER_CHANNEL, height)?;
    let last_order_date_online = optional_column(df, LAST_ORDER_DATE_ONLINE, height)?;
    let last_order_date_offline = optional_column(df, LAST_ORDER_DATE_OFFLINE, height)?;
    let interested_categories = optional_column(df, INTERESTED_CATEGORIES, height)?;

    let records = (0..height)
        .map(|i| RawOrderRecord {
            customer_id: customer_id[i].clone(),
            order_channel: order_channel[i].clone(),
            last_order_channel: last_order_channel[i].clone(),
            first_order_date: first_order_date[i].clone(),
            last_order_date: last_order_date[i].clone(),
            last_order_date_online: last_order_date_online[i].clone(),
            last_order_date_offline: last_order_date_offline[i].clone(),
            order_count_online: order_count_online[i].clone(),
            order_count_offline: order_count_offline[i].clone(),
            spend_online: spend_online[i].clone(),
            spend_offline: spend_offline[i].clone(),
            interested_categories: interested_categories[i].clone(),
        })
        .collect();

    Ok(records)
}

fn find_column<'a>(df: &'a DataFrame, names: &[&'static str]) -> Option<&'a Column> {
    names.iter().find_map(|name| df.column(name).ok())
}

fn column_values(column: &Column) -> Result<Vec<Option<String>>> {
    let values = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        })
        .collect();
    Ok(values)
}

fn required_column(df: &DataFrame, names: &[&'static str]) -> Result<Vec<Option<String>>> {
    let column = find_column(df, names).ok_or(RfmError::MissingColumn(names[0]))?;
    column_values(column)
}

fn optional_column(
    df: &DataFrame,
    names: &[&'static str],
    height: usize,
) -> Result<Vec<Option<String>>> {
    match find_column(df, names) {
        Some(column) => column_values(column),
        None => Ok(vec![None; height]),
    }
}

/// Parse a date or timestamp as written in order exports
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and the `T`-separated form,
/// with optional fractional seconds. Dates without a time map to midnight.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn required_date(value: &Option<String>, row: usize, field: &'static str) -> Result<NaiveDateTime> {
    let text = value
        .as_deref()
        .ok_or_else(|| RfmError::data_format(row, field, "missing date"))?;
    parse_datetime(text)
        .ok_or_else(|| RfmError::data_format(row, field, format!("malformed date {text:?}")))
}

fn optional_date(
    value: &Option<String>,
    row: usize,
    field: &'static str,
) -> Result<Option<NaiveDateTime>> {
    match value.as_deref() {
        Some(text) => parse_datetime(text)
            .map(Some)
            .ok_or_else(|| RfmError::data_format(row, field, format!("malformed date {text:?}"))),
        None => Ok(None),
    }
}

/// Order counts may be written as `4` or `4.0`; missing means no orders.
fn order_count(value: &Option<String>, row: usize, field: &'static str) -> Result<u32> {
    let Some(text) = value.as_deref() else {
        return Ok(0);
    };
    let count: f64 = text
        .parse()
        .map_err(|_| RfmError::data_format(row, field, format!("not a number: {text:?}")))?;
    if !count.is_finite() || count < 0.0 || count.fract() != 0.0 || count > f64::from(u32::MAX) {
        return Err(RfmError::data_format(
            row,
            field,
            format!("expected a non-negative whole number, got {text:?}"),
        ));
    }
    Ok(count as u32)
}

fn amount(value: &Option<String>, row: usize, field: &'static str) -> Result<f64> {
    let Some(text) = value.as_deref() else {
        return Ok(0.0);
    };
    let amount: f64 = text
        .parse()
        .map_err(|_| RfmError::data_format(row, field, format!("not a number: {text:?}")))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(RfmError::data_format(
            row,
            field,
            format!("expected a non-negative amount, got {text:?}"),
        ));
    }
    Ok(amount)
}

/// Parse one raw row. `row` is the 1-based data row used in errors.
pub fn parse_order(raw: &RawOrderRecord, row: usize) -> Result<CustomerOrder> {
    let customer_id = raw
        .customer_id
        .clone()
        .ok_or_else(|| RfmError::data_format(row, "customer_id", "missing customer identifier"))?;

    let first_order_date = required_date(&raw.first_order_date, row, "first_order_date")?;
    let last_order_date = required_date(&raw.last_order_date, row, "last_order_date")?;
    if last_order_date < first_order_date {
        return Err(RfmError::data_format(
            row,
            "last_order_date",
            format!("{last_order_date} precedes first_order_date {first_order_date}"),
        ));
    }

    Ok(CustomerOrder {
        customer_id,
        order_channel: raw.order_channel.clone(),
        last_order_channel: raw.last_order_channel.clone(),
        first_order_date,
        last_order_date,
        last_order_date_online: optional_date(
            &raw.last_order_date_online,
            row,
            "last_order_date_online",
        )?,
        last_order_date_offline: optional_date(
            &raw.last_order_date_offline,
            row,
            "last_order_date_offline",
        )?,
        order_count_online: order_count(&raw.order_count_online, row, "order_count_online")?,
        order_count_offline: order_count(&raw.order_count_offline, row, "order_count_offline")?,
        spend_online: amount(&raw.spend_online, row, "spend_online")?,
        spend_offline: amount(&raw.spend_offline, row, "spend_offline")?,
        interested_categories: raw.interested_categories.clone().unwrap_or_default(),
    })
}

/// Parse raw rows and add cross-channel order and spend totals
///
/// # Arguments
/// * `raw` - Rows in input order
///
/// # Returns
/// * One `PreparedRecord` per row, in input order
pub fn prepare(raw: &[RawOrderRecord]) -> Result<Vec<PreparedRecord>> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut prepared = Vec::with_capacity(raw.len());

    for (index, record) in raw.iter().enumerate() {
        let row = index + 1;
        let order = parse_order(record, row)?;

        if !seen.insert(order.customer_id.clone()) {
            return Err(RfmError::data_format(
                row,
                "customer_id",
                format!("duplicate customer {:?}", order.customer_id),
            ));
        }

        let order_count_total = order
            .order_count_online
            .checked_add(order.order_count_offline)
            .ok_or_else(|| {
                RfmError::data_format(row, "order_count_offline", "order count overflow")
            })?;
        if order_count_total == 0 {
            return Err(RfmError::data_format(
                row,
                "order_count_online",
                "customer has no orders on either channel",
            ));
        }
        let spend_total = order.spend_online + order.spend_offline;

        prepared.push(PreparedRecord {
            order,
            order_count_total,
            spend_total,
        });
    }

    debug!(customers = prepared.len(), "prepared order records");
    Ok(prepared)
}
