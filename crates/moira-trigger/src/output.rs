use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::manager::{OperationError, Outcome};

/// Message of every failure document.
pub const FAILURE_MESSAGE: &str = "Unable to define trigger state";

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultDocument {
    pub changed: bool,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureDetails {
    pub method: String,
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureDocument {
    pub failed: FailureDetails,
    pub msg: String,
}

impl From<&OperationError> for FailureDocument {
    fn from(err: &OperationError) -> Self {
        Self {
            failed: FailureDetails {
                method: err.method.to_string(),
                error: err.source.kind().to_string(),
                details: err.source.to_string(),
                response: err.source.response_body().map(str::to_string),
            },
            msg: FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Everything one invocation reports.
#[derive(Debug, Clone)]
pub enum Report {
    Success(ResultDocument),
    Failure(FailureDocument),
}

impl Report {
    pub fn from_outcome(outcome: Result<Outcome, OperationError>, changed: bool) -> Self {
        match outcome {
            Ok(outcome) => Self::Success(ResultDocument {
                changed,
                result: outcome.to_result(),
            }),
            Err(err) => Self::Failure(FailureDocument::from(&err)),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            Self::Success(doc) => serde_json::to_value(doc),
            Self::Failure(doc) => serde_json::to_value(doc),
        }
    }
}

pub fn render(value: &Value, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value),
        OutputFormat::Yaml => Ok(format_yaml(value)),
        OutputFormat::Table => Ok(format_table(value)),
    }
}

pub fn print_success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn format_table(value: &Value) -> String {
    let mut rows = Vec::new();
    flatten(value, String::new(), &mut rows);
    if rows.is_empty() {
        return "Nothing to report.".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(["Key", "Value"]);
    for (key, val) in rows {
        builder.push_record([key, val]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn flatten(value: &Value, prefix: String, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(obj) => {
            for (k, v) in obj {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(v, key, rows);
            }
        }
        Value::String(s) => rows.push((prefix, s.clone())),
        other => rows.push((prefix, other.to_string())),
    }
}

fn format_yaml(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) if !map.is_empty() => write_mapping(&mut out, map, 0),
        Value::Array(items) if !items.is_empty() => write_sequence(&mut out, items, 0),
        scalar => out.push_str(&yaml_scalar(scalar, 0)),
    }
    out.trim_end_matches('\n').to_string()
}

fn write_mapping(out: &mut String, map: &serde_json::Map<String, Value>, indent: usize) {
    for (key, value) in map {
        out.push_str(&" ".repeat(indent));
        out.push_str(key);
        out.push(':');
        write_nested(out, value, indent);
    }
}

fn write_sequence(out: &mut String, items: &[Value], indent: usize) {
    for item in items {
        out.push_str(&" ".repeat(indent));
        out.push('-');
        write_nested(out, item, indent);
    }
}

/// Writes what follows a `key:` or `-` marker, nesting blocks two columns deeper.
fn write_nested(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            out.push('\n');
            write_mapping(out, map, indent + 2);
        }
        Value::Array(items) if !items.is_empty() => {
            out.push('\n');
            write_sequence(out, items, indent + 2);
        }
        scalar => {
            out.push(' ');
            out.push_str(&yaml_scalar(scalar, indent + 2));
            out.push('\n');
        }
    }
}

fn yaml_scalar(value: &Value, indent: usize) -> String {
    match value {
        Value::String(s) if s.contains('\n') => {
            let pad = " ".repeat(indent);
            let lines: Vec<String> = s.lines().map(|line| format!("{pad}{line}")).collect();
            format!("|\n{}", lines.join("\n"))
        }
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
        // JSON scalars are valid YAML flow scalars.
        other => other.to_string(),
    }
}
