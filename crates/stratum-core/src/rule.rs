//! Rule severities, opaque rule options, and resolved rule entries

use crate::error::StratumError;
use crate::registry::RuleIdentifier;
use crate::result::Result;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Rule severity levels
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Disable the rule
    Off,
    /// Warning (doesn't fail the run)
    Warn,
    /// Error (fails the run)
    Error,
}

impl Severity {
    /// Parse a severity from its configuration form.
    ///
    /// Accepts `"off"`, `"warn"`, `"error"` (case-insensitive) and the numeric
    /// aliases `0`, `1`, `2`. Everything else is rejected.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            // JSON5 documents may carry integral numbers as floats
            Value::Number(n) => match n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))?
            {
                0 => Some(Severity::Off),
                1 => Some(Severity::Warn),
                2 => Some(Severity::Error),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the rule should run at all
    pub fn is_enabled(self) -> bool {
        self != Severity::Off
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Severity::Off),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form rule options.
///
/// The resolution engine never interprets options; each rule evaluator
/// validates its own payload when it runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuleOptions {
    Unvalidated(Vec<Value>),
}

impl Default for RuleOptions {
    fn default() -> Self {
        RuleOptions::Unvalidated(Vec::new())
    }
}

impl RuleOptions {
    /// The raw option values in declaration order
    pub fn values(&self) -> &[Value] {
        match self {
            RuleOptions::Unvalidated(values) => values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Deserialize the whole option list into an evaluator-defined type
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Array(self.values().to_vec()))
    }

    /// Deserialize the first option, the common single-object form
    pub fn parse_first<T: DeserializeOwned>(&self) -> serde_json::Result<Option<T>> {
        self.values()
            .first()
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }
}

/// A fully resolved rule entry: identifier, severity and options
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    id: RuleIdentifier,
    severity: Severity,
    options: RuleOptions,
}

impl RuleSpec {
    pub fn new(id: RuleIdentifier, severity: Severity, options: RuleOptions) -> Self {
        Self {
            id,
            severity,
            options,
        }
    }

    /// Build a spec from a raw `rules` entry.
    ///
    /// The entry is either a bare severity or `[severity, ...options]`. Options
    /// that accompany `off` are kept.
    pub fn from_entry(id: RuleIdentifier, raw: &Value, layer: &str) -> Result<Self> {
        let invalid = || StratumError::invalid_severity(id.to_string(), raw.to_string(), layer);

        let (severity, options) = match raw {
            Value::Array(items) => {
                let (first, rest) = items.split_first().ok_or_else(invalid)?;
                (Severity::from_value(first).ok_or_else(invalid)?, rest.to_vec())
            }
            other => (Severity::from_value(other).ok_or_else(invalid)?, Vec::new()),
        };

        Ok(Self::new(id, severity, RuleOptions::Unvalidated(options)))
    }

    pub fn id(&self) -> &RuleIdentifier {
        &self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.severity.is_enabled()
    }
}

/// Serialized in the configuration's own array form: `[severity, ...options]`
impl Serialize for RuleSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let options = self.options.values();
        let mut seq = serializer.serialize_seq(Some(options.len() + 1))?;
        seq.serialize_element(&self.severity)?;
        for option in options {
            seq.serialize_element(option)?;
        }
        seq.end()
    }
}
