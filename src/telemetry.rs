//! Telemetry settings bound from the environment.
//!
//! Only the settings live here. Installing a subscriber, a metrics endpoint
//! or a span exporter from them is up to the application.
//!
//! | Variable          | Default   |
//! |-------------------|-----------|
//! | `LOG_LEVEL`       | `INFO`    |
//! | `PRETTY_LOGS`     | `false`   |
//! | `SERVICE_NAME`    | `_`       |
//! | `ENVIRONMENT`     | `dev`     |
//! | `METRICS_PORT`    | `8000`    |
//! | `TRACES_ENABLED`  | `true`    |
//! | `TRACES_EXPORTER` | `CONSOLE` |

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::error::{BoxError, EnvError};
use crate::options::Options;
use crate::tags;
use crate::value::{Bindable, EnvStruct, parse_text};
use crate::walk::Walker;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("{0:?} is not a valid log level")]
    BadLogLevel(String),
}

/// Log level. `FATAL` and `PANIC` are accepted as aliases of `ERROR`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" | "FATAL" | "PANIC" => Ok(LogLevel::Error),
            _ => Err(TelemetryError::BadLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl Bindable for LogLevel {
    fn text_unmarshaler() -> Option<fn(&str) -> Result<Self, BoxError>> {
        Some(parse_text::<Self>)
    }
}

/// Span exporter. Anything other than `CONSOLE` disables export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceExporter {
    /// Pretty-printed spans on stdout.
    #[default]
    Console,
    None,
}

impl FromStr for TraceExporter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CONSOLE" => Ok(TraceExporter::Console),
            _ => Ok(TraceExporter::None),
        }
    }
}

impl Bindable for TraceExporter {
    fn text_unmarshaler() -> Option<fn(&str) -> Result<Self, BoxError>> {
        Some(parse_text::<Self>)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Logs {
    pub level: LogLevel,
    pub pretty: bool,
    pub service_name: String,
    pub environment: String,
}

impl EnvStruct for Logs {
    fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
        w.field("level", tags!(env = "LOG_LEVEL", envDefault = "INFO"), &mut self.level)?;
        w.field("pretty", tags!(env = "PRETTY_LOGS", envDefault = "false"), &mut self.pretty)?;
        w.field(
            "service_name",
            tags!(env = "SERVICE_NAME", envDefault = "_"),
            &mut self.service_name,
        )?;
        w.field(
            "environment",
            tags!(env = "ENVIRONMENT", envDefault = "dev"),
            &mut self.environment,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    pub port: u16,
}

impl EnvStruct for Metrics {
    fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
        w.field("port", tags!(env = "METRICS_PORT", envDefault = "8000"), &mut self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traces {
    pub enabled: bool,
    pub exporter: TraceExporter,
}

impl EnvStruct for Traces {
    fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
        w.field(
            "enabled",
            tags!(env = "TRACES_ENABLED", envDefault = "true"),
            &mut self.enabled,
        )?;
        w.field(
            "exporter",
            tags!(env = "TRACES_EXPORTER", envDefault = "CONSOLE"),
            &mut self.exporter,
        )
    }
}

/// Logging, metrics and tracing settings, all at the top level of the
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub logs: Logs,
    pub metrics: Metrics,
    pub traces: Traces,
}

impl EnvStruct for Config {
    fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
        w.embed(tags!(), &mut self.logs)?;
        w.embed(tags!(), &mut self.metrics)?;
        w.embed(tags!(), &mut self.traces)
    }
}

impl Config {
    /// Bind from the process environment.
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_options(Options::new())
    }

    pub fn from_options(opts: Options) -> Result<Self, EnvError> {
        opts.parse_as()
    }
}
