use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Span field shown in the batch column of the pretty output.
const BATCH_FIELD: &str = "batch_index";

const DEFAULT_DIRECTIVES: &str = "usage_submitter=info,submitter_ethereum_chain_client=info";

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[90m";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[92m";
const WHITE: &str = "\x1b[97m";

/// Span fields, stored in the span's extensions so the formatters can read them back.
#[derive(Debug, Clone, Default)]
pub struct SpanFields(BTreeMap<&'static str, String>);

impl Visit for SpanFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name(), format!("{value:?}").trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name(), value.to_string());
    }
}

/// Keeps `SpanFields` up to date for every span, including fields recorded after creation.
pub struct SpanFieldsLayer;

impl<S> Layer<S> for SpanFieldsLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = SpanFields::default();
        attrs.record(&mut fields);
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        let mut fields = extensions.remove::<SpanFields>().unwrap_or_default();
        values.record(&mut fields);
        extensions.insert(fields);
    }
}

/// Fields of every span around the event, innermost value winning.
fn scope_fields<S, N>(ctx: &FmtContext<'_, S, N>) -> BTreeMap<&'static str, String>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let mut merged = BTreeMap::new();
    let Some(scope) = ctx.event_scope() else {
        return merged;
    };
    for span in scope {
        if let Some(fields) = span.extensions().get::<SpanFields>() {
            for (name, value) in &fields.0 {
                merged.entry(*name).or_insert_with(|| value.clone());
            }
        }
    }
    merged
}

/// Message and fields of a single event.
#[derive(Default)]
struct EventFields {
    message: String,
    fields: Map<String, Value>,
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let value = format!("{value:?}").trim_matches('"').to_string();
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored single-line output for a terminal.
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT`; anything other than `json` means pretty output.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(value) if value.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

impl<S, N> FormatEvent<S, N> for LogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        let spans = scope_fields(ctx);

        let line = match self {
            LogFormat::Pretty => pretty_line(event.metadata().level(), event.metadata().target(), &spans, fields),
            LogFormat::Json => json_line(event, ctx, spans, fields)?,
        };
        writeln!(writer, "{line}")
    }
}

/// `timestamp | LEVEL | BATCH n | SERVICE | message (fields)`
fn pretty_line(level: &Level, target: &str, spans: &BTreeMap<&'static str, String>, event: EventFields) -> String {
    let level_color = match *level {
        Level::TRACE => "\x1b[90m",
        Level::DEBUG => "\x1b[34m",
        Level::INFO => "\x1b[32m",
        Level::WARN => "\x1b[33m",
        Level::ERROR => "\x1b[31m",
    };
    let now = Utc::now().format("%y-%m-%d %H:%M:%S");
    let batch = batch_column(spans.get(BATCH_FIELD).map(String::as_str));

    let mut line = format!(
        "{CYAN}{now}{RESET} {DIM}|{RESET} {level_color}{level:<5}{RESET} {DIM}|{RESET} {GREEN}{batch:<10}{RESET} \
         {DIM}|{RESET} {GREEN}{service:<12}{RESET} {DIM}|{RESET} {WHITE}{message}{RESET}",
        service = extract_service_name(target),
        message = event.message,
    );

    let extra: Vec<String> = event
        .fields
        .iter()
        .filter(|(name, _)| name.as_str() != BATCH_FIELD)
        .map(|(name, value)| match value {
            Value::String(text) => format!("{DIM}{name}={text}{RESET}"),
            other => format!("{DIM}{name}={other}{RESET}"),
        })
        .collect();
    if !extra.is_empty() {
        let _ = write!(line, " ({})", extra.join(", "));
    }
    line
}

fn json_line<S, N>(
    event: &Event<'_>,
    ctx: &FmtContext<'_, S, N>,
    spans: BTreeMap<&'static str, String>,
    fields: EventFields,
) -> Result<String, std::fmt::Error>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let meta = event.metadata();
    let mut root = Map::new();
    root.insert("timestamp".into(), Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true).into());
    root.insert("level".into(), meta.level().to_string().into());
    root.insert("target".into(), meta.target().into());
    root.insert("service".into(), extract_service_name(meta.target()).into());
    if let Some(file) = meta.file() {
        root.insert("filename".into(), file.into());
    }
    if let Some(line) = meta.line() {
        root.insert("line_number".into(), line.into());
    }
    if let Some(span) = ctx.lookup_current() {
        root.insert("span_name".into(), span.metadata().name().into());
    }
    root.insert("message".into(), fields.message.into());

    // Event fields win over span fields of the same name.
    let mut all_fields = fields.fields;
    for (name, value) in spans {
        all_fields.entry(name.to_string()).or_insert(Value::String(value));
    }
    if !all_fields.is_empty() {
        root.insert("fields".into(), Value::Object(all_fields));
    }

    serde_json::to_string(&Value::Object(root)).map_err(|_| std::fmt::Error)
}

/// Installs color_eyre and the global subscriber.
///
/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() {
    color_eyre::install().expect("Unable to install color_eyre");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .parse(DEFAULT_DIRECTIVES)
            .expect("Invalid filter directive and Logger control")
    });

    let fmt_layer = fmt::layer().event_format(LogFormat::from_env());

    let subscriber =
        Registry::default().with(env_filter).with(SpanFieldsLayer).with(fmt_layer).with(ErrorLayer::default());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global default subscriber");
}

/// Maps crate names to short display names for the service column
fn extract_service_name(target: &str) -> &'static str {
    if target.starts_with("submitter_ethereum_chain_client") {
        "ETHEREUM"
    } else if target.starts_with("submitter_chain_client_interface") {
        "CHAIN_IFACE"
    } else if target.starts_with("usage_submitter::core::client") {
        "CLIENTS"
    } else if target.starts_with("usage_submitter") {
        "-"
    } else {
        "EXTERNAL"
    }
}

fn batch_column(batch_index: Option<&str>) -> String {
    match batch_index {
        Some(index) => format!("BATCH {index}"),
        None => "-".to_string(),
    }
}
