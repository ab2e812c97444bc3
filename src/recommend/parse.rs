//! Recommendation parsing: untrusted model text in, vetted candidates out.
//!
//! The model is asked for YAML but sometimes answers in JSON, wraps its
//! answer in a code fence, or produces noise. Parsing never fails: the
//! result either carries a (possibly empty) validated list, or says the
//! text could not be interpreted, alongside the original text.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::{Category, DEFAULT_NAME, DEFAULT_PRIORITY, Recommendation};

/// The outcome of interpreting model output.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendations {
    /// The text decoded to a mapping. The list may be empty when the
    /// model suggested nothing usable.
    Parsed {
        raw: String,
        recommendations: Vec<Recommendation>,
    },

    /// The text could not be interpreted.
    ///
    /// `decoded` holds the value when the text decoded to something other
    /// than a mapping, for diagnostics.
    Unparsed { raw: String, decoded: Option<Value> },
}

impl Recommendations {
    /// The original model text, unchanged.
    pub fn raw(&self) -> &str {
        match self {
            Self::Parsed { raw, .. } | Self::Unparsed { raw, .. } => raw,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            Self::Parsed {
                recommendations, ..
            } => recommendations,
            Self::Unparsed { .. } => &[],
        }
    }
}

/// Interpret raw model output as a priority-ordered candidate list.
///
/// Entries without a non-blank string `command` are dropped. Missing
/// fields get defaults. The surviving list is sorted by priority,
/// keeping the model's order on ties.
pub fn parse_recommendations(raw: &str) -> Recommendations {
    let Some(document) = decode(strip_code_fence(raw)) else {
        warn!(
            bytes = raw.len(),
            "model output could not be decoded as YAML or JSON"
        );
        return Recommendations::Unparsed {
            raw: raw.to_string(),
            decoded: None,
        };
    };

    let Value::Object(document) = document else {
        debug!("model output decoded to a non-mapping value");
        return Recommendations::Unparsed {
            raw: raw.to_string(),
            decoded: Some(document),
        };
    };

    let mut recommendations: Vec<Recommendation> = match document.get("recommendations") {
        Some(Value::Array(entries)) => entries.iter().filter_map(candidate).collect(),
        _ => Vec::new(),
    };
    recommendations.sort_by_key(|r| r.priority);

    debug!(count = recommendations.len(), "parsed model recommendations");
    Recommendations::Parsed {
        raw: raw.to_string(),
        recommendations,
    }
}

/// YAML first, then JSON.
fn decode(text: &str) -> Option<Value> {
    match serde_yaml::from_str::<Value>(text) {
        Ok(value) => return Some(value),
        Err(e) => debug!("model output is not YAML: {e}"),
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("model output is not JSON: {e}");
            None
        }
    }
}

/// Unwrap a response wrapped in a single Markdown code fence
/// (```` ``` ````, ```` ```yaml ````, ...). Anything else is returned as-is.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return raw;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return raw;
    };
    // Drop the info string (`yaml`, `json`, ...) on the opening line.
    match body.split_once('\n') {
        Some((_info, inner)) => inner,
        None => raw,
    }
}

/// Validate one entry of the `recommendations` sequence.
fn candidate(entry: &Value) -> Option<Recommendation> {
    let Value::Object(entry) = entry else {
        return None;
    };

    let command = entry
        .get("command")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())?;

    Some(Recommendation {
        name: text_field(entry, "name").unwrap_or_else(|| DEFAULT_NAME.to_string()),
        command: command.to_string(),
        category: text_field(entry, "category").map_or(Category::Generic, Category::from),
        priority: priority_field(entry.get("priority")),
        rationale: text_field(entry, "rationale").unwrap_or_default(),
        notes: text_field(entry, "notes").unwrap_or_default(),
    })
}

/// A scalar field rendered as text. Strings pass through; numbers and
/// booleans are rendered. Anything else counts as missing.
fn text_field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a priority to an integer. Fractions truncate toward zero;
/// anything that isn't a number gets [`DEFAULT_PRIORITY`].
fn priority_field(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(truncate))
            .unwrap_or(DEFAULT_PRIORITY),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_PRIORITY),
        _ => DEFAULT_PRIORITY,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(f: f64) -> Option<i64> {
    (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
}
