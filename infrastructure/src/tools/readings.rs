//! Compressor air blower readings tool
//!
//! Serves `readLatest` from an in-memory [`ReadingLog`]: filter by status and
//! time range, order by any measured column, and summarize what was
//! selected as plain text for the model.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chatloop_domain::{ToolError, ToolHandler, ToolOutput};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const READINGS_TOOL_NAME: &str = "readLatest";

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 50;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE_WIDTH: usize = 50;

/// Operating state derived from the measured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Normal,
    Warning,
    Critical,
}

impl ReadingStatus {
    pub fn classify(temperature: f64, pressure: f64, vibration: f64) -> Self {
        if temperature > 83.0 || pressure > 108.0 || vibration > 0.68 {
            ReadingStatus::Critical
        } else if temperature > 80.0 || pressure > 105.0 || vibration > 0.65 {
            ReadingStatus::Warning
        } else {
            ReadingStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Normal => "normal",
            ReadingStatus::Warning => "warning",
            ReadingStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: u64,
    pub flow: f64,
    /// °C
    pub temperature: f64,
    /// PSI
    pub pressure: f64,
    pub vibration: f64,
    pub status: ReadingStatus,
    pub created_at: NaiveDateTime,
}

impl Reading {
    /// Build a reading whose status follows from its values.
    pub fn measured(
        id: u64,
        created_at: NaiveDateTime,
        flow: f64,
        temperature: f64,
        pressure: f64,
        vibration: f64,
    ) -> Self {
        Self {
            id,
            flow,
            temperature,
            pressure,
            vibration,
            status: ReadingStatus::classify(temperature, pressure, vibration),
            created_at,
        }
    }
}

/// Append-only sensor log.
#[derive(Debug, Clone, Default)]
pub struct ReadingLog {
    readings: Vec<Reading>,
}

impl ReadingLog {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    /// A month of plausible readings ending at `end`, evenly spaced.
    ///
    /// The same `(count, end)` always yields the same log.
    pub fn sample(count: usize, end: NaiveDateTime) -> Self {
        let span = Duration::days(30).num_seconds();
        let intervals = (count as i64 - 1).max(1);
        let start = end - Duration::seconds(span);
        let mut rng = SplitMix64(0x5EED_CAFE);

        let readings = (0..count)
            .map(|i| {
                Reading::measured(
                    i as u64 + 1,
                    start + Duration::seconds(span * i as i64 / intervals),
                    rng.between(130.0, 170.0),
                    rng.between(65.0, 85.0),
                    rng.between(85.0, 110.0),
                    rng.between(0.3, 0.7),
                )
            })
            .collect();
        Self { readings }
    }

    /// The default log served by the built-in server.
    pub fn recent() -> Self {
        Self::sample(5000, Local::now().naive_local())
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn query(&self, query: &ReadingQuery) -> Vec<&Reading> {
        let mut selected: Vec<&Reading> = self
            .readings
            .iter()
            .filter(|r| query.status.as_deref().is_none_or(|s| r.status.as_str() == s))
            .filter(|r| query.from.is_none_or(|from| r.created_at >= from))
            .filter(|r| query.to.is_none_or(|to| r.created_at <= to))
            .collect();

        selected.sort_by(|a, b| {
            let ordering = query.order_by.compare(a, b);
            if query.descending { ordering.reverse() } else { ordering }
        });
        selected.truncate(query.limit as usize);
        selected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAt,
    Flow,
    Temperature,
    Pressure,
    Vibration,
}

impl OrderBy {
    const VALID: [&'static str; 5] = ["created_at", "flow", "temperature", "pressure", "vibration"];

    fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(OrderBy::CreatedAt),
            "flow" => Some(OrderBy::Flow),
            "temperature" => Some(OrderBy::Temperature),
            "pressure" => Some(OrderBy::Pressure),
            "vibration" => Some(OrderBy::Vibration),
            _ => None,
        }
    }

    fn compare(&self, a: &Reading, b: &Reading) -> Ordering {
        match self {
            OrderBy::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderBy::Flow => a.flow.total_cmp(&b.flow),
            OrderBy::Temperature => a.temperature.total_cmp(&b.temperature),
            OrderBy::Pressure => a.pressure.total_cmp(&b.pressure),
            OrderBy::Vibration => a.vibration.total_cmp(&b.vibration),
        }
    }
}

/// Parsed `readLatest` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingQuery {
    pub status: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub order_by: OrderBy,
    pub descending: bool,
    pub limit: u64,
}

impl Default for ReadingQuery {
    fn default() -> Self {
        Self {
            status: None,
            from: None,
            to: None,
            order_by: OrderBy::CreatedAt,
            descending: true,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ReadingQuery {
    pub fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, ToolError> {
        let mut query = Self::default();

        if let Some(status) = optional_str(arguments, "status")? {
            query.status = Some(status.to_string());
        }
        if let Some(from) = optional_str(arguments, "from_date")? {
            query.from = Some(parse_timestamp("from_date", from)?);
        }
        if let Some(to) = optional_str(arguments, "to_date")? {
            query.to = Some(parse_timestamp("to_date", to)?);
        }
        if let Some(order_by) = optional_str(arguments, "order_by")? {
            query.order_by = OrderBy::parse(order_by).ok_or_else(|| {
                ToolError::invalid_argument(format!(
                    "order_by must be one of {}, got '{}'",
                    OrderBy::VALID.join(", "),
                    order_by
                ))
            })?;
        }
        if let Some(direction) = optional_str(arguments, "order_direction")? {
            query.descending = match direction.to_ascii_lowercase().as_str() {
                "asc" => false,
                "desc" => true,
                _ => {
                    return Err(ToolError::invalid_argument(format!(
                        "order_direction must be asc or desc, got '{}'",
                        direction
                    )));
                }
            };
        }
        if let Some(limit) = arguments.get("limit").filter(|v| !v.is_null()) {
            let limit = limit
                .as_u64()
                .or_else(|| limit.as_str().and_then(|s| s.trim().parse().ok()))
                .filter(|n| *n >= 1)
                .ok_or_else(|| ToolError::invalid_argument("limit must be a positive integer"))?;
            query.limit = limit.min(MAX_LIMIT);
        }

        Ok(query)
    }
}

fn optional_str<'a>(arguments: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, ToolError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim())),
        Some(_) => Err(ToolError::invalid_argument(format!("{} must be a string", key))),
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or a bare date (midnight).
fn parse_timestamp(field: &str, value: &str) -> Result<NaiveDateTime, ToolError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(Default::default())))
        .map_err(|_| {
            ToolError::invalid_argument(format!(
                "{} must look like YYYY-MM-DD HH:MM:SS, got '{}'",
                field, value
            ))
        })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render the selection the way the model expects to read it.
pub fn render(readings: &[&Reading]) -> String {
    if readings.is_empty() {
        return "No readings found matching the criteria.".to_string();
    }

    let count = readings.len() as f64;
    let avg = |f: fn(&Reading) -> f64| round2(readings.iter().map(|r| f(r)).sum::<f64>() / count);
    let max = |f: fn(&Reading) -> f64| round2(readings.iter().map(|r| f(r)).fold(f64::MIN, f64::max));

    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();
    out.push_str("Compressor Air Blower Readings\n");
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    out.push_str("Statistics:\n");
    out.push_str(&format!("  Total Readings: {}\n", readings.len()));
    out.push_str(&format!("  Average Flow: {}\n", avg(|r| r.flow)));
    out.push_str(&format!("  Average Temperature: {}°C\n", avg(|r| r.temperature)));
    out.push_str(&format!("  Average Pressure: {} PSI\n", avg(|r| r.pressure)));
    out.push_str(&format!("  Average Vibration: {}\n", avg(|r| r.vibration)));
    out.push_str(&format!("  Max Temperature: {}°C\n", max(|r| r.temperature)));
    out.push_str(&format!("  Max Pressure: {} PSI\n", max(|r| r.pressure)));
    out.push_str(&format!("  Max Vibration: {}\n\n", max(|r| r.vibration)));

    out.push_str("Recent Readings:\n");
    out.push_str(&rule);
    out.push('\n');
    for r in readings {
        out.push_str(&format!(
            "ID: {} | Time: {}\n",
            r.id,
            r.created_at.format(TIMESTAMP_FORMAT)
        ));
        out.push_str(&format!("  Flow: {} | Temp: {}°C\n", r.flow, r.temperature));
        out.push_str(&format!("  Pressure: {} PSI | Vibration: {}\n", r.pressure, r.vibration));
        out.push_str(&format!("  Status: {}\n", r.status.as_str()));
        out.push_str(&rule);
        out.push('\n');
    }
    out
}

/// `readLatest` handler.
pub struct ReadingsTool {
    log: Arc<ReadingLog>,
}

impl ReadingsTool {
    pub fn new(log: ReadingLog) -> Self {
        Self { log: Arc::new(log) }
    }

    pub fn shared(log: Arc<ReadingLog>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl ToolHandler for ReadingsTool {
    fn name(&self) -> &str {
        READINGS_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Retrieve readings from the compressor air blower sensors. \
         Returns flow, temperature, pressure, vibration, and status data. \
         Supports filtering by status, date range, and limiting results."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "description": "Filter by status (e.g., normal, warning, critical)"
                },
                "from_date": {
                    "type": "string",
                    "description": "Filter readings from this date (YYYY-MM-DD HH:MM:SS)"
                },
                "to_date": {
                    "type": "string",
                    "description": "Filter readings to this date (YYYY-MM-DD HH:MM:SS)"
                },
                "order_by": {
                    "type": "string",
                    "enum": OrderBy::VALID,
                    "description": "Field to order by (default: created_at)"
                },
                "order_direction": {
                    "type": "string",
                    "enum": ["asc", "desc"],
                    "description": "Order direction (default: desc)"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_LIMIT,
                    "description": "Maximum number of readings to return (default: 20, max: 50)"
                }
            }
        })
    }

    async fn handle(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let query = ReadingQuery::from_arguments(arguments)?;
        let selected = self.log.query(&query);
        tracing::debug!(
            matched = selected.len(),
            limit = query.limit,
            status = ?query.status,
            "Readings query"
        );
        Ok(ToolOutput::text(render(&selected)))
    }
}

/// Small deterministic generator for the sample log.
struct SplitMix64(u64);

impl SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[lo, hi]`, two decimals.
    fn between(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        round2(lo + unit * (hi - lo))
    }
}
