use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::comparers::builtins::{compare_object, compare_simple, compare_with_type};
use crate::comparers::{Comparer, Registry};
use crate::errors::{CompareError, Result};
use crate::matchers::{invalid_pair, Matcher};
use crate::value::Value;

/// Names of the options the engine and the built-in comparers read.
pub mod keys {
    pub const STRICT: &str = "strict";
    pub const IGNORE_EQ: &str = "ignore_eq";
    pub const RECURSIVE: &str = "recursive";
    pub const BLANKLINES: &str = "blanklines";
    pub const TRAILING_WHITESPACE: &str = "trailing_whitespace";
    pub const SHOW_WHITESPACE: &str = "show_whitespace";
    pub const PRECISION: &str = "precision";
    pub const MAX_DEPTH: &str = "max_depth";
}

pub const DEFAULT_PRECISION: i64 = 2;
pub const DEFAULT_MAX_DEPTH: i64 = 256;

/// Option set for one top-level comparison, resolved once and passed down
/// unchanged. Unknown names are kept and simply go unused unless a custom
/// comparer asks for them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompareOptions {
    values: BTreeMap<String, JsonValue>,
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an option set from a JSON object.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Later values win.
    pub fn merge(&mut self, other: CompareOptions) {
        self.values.extend(other.values);
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    pub fn bool(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(JsonValue::as_bool).unwrap_or(default)
    }

    pub fn i64(&self, name: &str, default: i64) -> i64 {
        self.get(name).and_then(JsonValue::as_i64).unwrap_or(default)
    }
}

/// One step in the path to a nested value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Attr(String),
    Index(usize),
    /// Rendered key literal.
    Key(String),
}

impl PathSegment {
    pub fn attr(name: impl Into<String>) -> Self {
        PathSegment::Attr(name.into())
    }

    pub fn index(i: usize) -> Self {
        PathSegment::Index(i)
    }

    pub fn key(key: &Value) -> Self {
        PathSegment::Key(key.repr())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Attr(name) => write!(f, ".{name}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Key(key) => write!(f, "[{key}]"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// State threaded through one top-level comparison: the path to the values
/// currently being compared, the options, the registry view and the nested
/// report text gathered so far.
pub struct CompareContext<'a> {
    registry: &'a Registry,
    options: &'a CompareOptions,
    labels: Option<(&'a str, &'a str)>,
    path: Vec<PathSegment>,
    message: String,
    strict: bool,
    ignore_eq: bool,
    recursive: bool,
    max_depth: usize,
}

impl<'a> CompareContext<'a> {
    pub fn new(
        registry: &'a Registry,
        options: &'a CompareOptions,
        labels: Option<(&'a str, &'a str)>,
    ) -> Self {
        let max_depth = options.i64(keys::MAX_DEPTH, DEFAULT_MAX_DEPTH).max(0);
        Self {
            registry,
            options,
            labels,
            path: Vec::new(),
            message: String::new(),
            strict: options.bool(keys::STRICT, false),
            ignore_eq: options.bool(keys::IGNORE_EQ, false),
            recursive: options.bool(keys::RECURSIVE, true),
            max_depth: usize::try_from(max_depth).unwrap_or(usize::MAX),
        }
    }

    pub fn get_option(&self, name: &str, default: JsonValue) -> JsonValue {
        self.options.get(name).cloned().unwrap_or(default)
    }

    pub fn option_bool(&self, name: &str, default: bool) -> bool {
        self.options.bool(name, default)
    }

    pub fn option_i64(&self, name: &str, default: i64) -> i64 {
        self.options.i64(name, default)
    }

    pub fn x_label(&self) -> &str {
        self.labels.map_or("first", |(x, _)| x)
    }

    pub fn y_label(&self) -> &str {
        self.labels.map_or("second", |(_, y)| y)
    }

    /// Tag a rendered value with its side's label when labels are in use.
    pub fn label(&self, side: Side, text: &str) -> String {
        match (self.labels, side) {
            (Some((x, _)), Side::First) => format!("{text} ({x})"),
            (Some((_, y)), Side::Second) => format!("{text} ({y})"),
            (None, _) => text.to_string(),
        }
    }

    pub fn path(&self) -> String {
        self.path.iter().map(ToString::to_string).collect()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Container levels left before `max_depth` is reached.
    pub fn remaining_depth(&self) -> usize {
        self.max_depth.saturating_sub(self.path.len())
    }

    /// Native equality of two sub-values, bounded by the remaining depth.
    pub fn equal(&self, first: &Value, second: &Value) -> Result<bool> {
        first
            .eq_within(second, self.remaining_depth())
            .ok_or_else(|| self.too_deep())
    }

    fn too_deep(&self) -> CompareError {
        CompareError::TooDeep {
            depth: self.max_depth,
            path: self.path(),
        }
    }

    /// Compare a pair of sub-values reached through `segment`.
    ///
    /// Returns the pair's own description, if they differ. When the pair was
    /// handled by a structural comparer, its report is also queued as a
    /// `While comparing <path>:` block after the caller's report.
    pub fn different(
        &mut self,
        first: &Value,
        second: &Value,
        segment: PathSegment,
    ) -> Result<Option<String>> {
        self.path.push(segment);
        let result = self.dispatch(first, second, true);
        self.path.pop();
        result
    }

    /// Entry point for the outermost pair; returns the full report.
    pub(crate) fn compare_root(&mut self, first: &Value, second: &Value) -> Result<Option<String>> {
        let result = self.dispatch(first, second, false)?;
        Ok(result.map(|_| std::mem::take(&mut self.message)))
    }

    fn dispatch(&mut self, first: &Value, second: &Value, recursed: bool) -> Result<Option<String>> {
        if self.path.len() > self.max_depth {
            return Err(self.too_deep());
        }
        if matches!(first, Value::Generator(_)) || matches!(second, Value::Generator(_)) {
            let (first, second) = (materialized(first), materialized(second));
            return self.dispatch(&first, &second, recursed);
        }

        let existing = std::mem::take(&mut self.message);
        let (result, structural) = match self.evaluate(first, second) {
            Ok(found) => found,
            Err(e) => {
                self.message = existing;
                return Err(e);
            }
        };

        let mut current = String::new();
        if let Some(description) = &result {
            if structural && recursed {
                current = format!("\n\nWhile comparing {}: ", self.path());
            }
            if structural || !recursed {
                current.push_str(description);
                if self.recursive {
                    current.push_str(&self.message);
                }
            }
        }
        self.message = existing + &current;
        Ok(result)
    }

    /// Decide one pair. The flag says whether the description came from
    /// something other than the simple fallback.
    fn evaluate(&mut self, first: &Value, second: &Value) -> Result<(Option<String>, bool)> {
        match (first, second) {
            (Value::Matcher(a), Value::Matcher(b)) => {
                return Ok((Some(invalid_pair(a, b)), true));
            }
            (Value::Matcher(m), other) => return self.evaluate_matcher(m, other, Side::First),
            (other, Value::Matcher(m)) => return self.evaluate_matcher(m, other, Side::Second),
            _ => {}
        }

        // `None` means the pair nests past the depth budget; the structural
        // comparers below then run into the limit with a proper path.
        let native = first.eq_within(second, self.remaining_depth());
        if self.strict && first.type_key() != second.type_key() && native == Some(true) {
            return Ok((compare_with_type(first, second, self)?, true));
        }
        if !(self.strict || self.ignore_eq) && native == Some(true) {
            return Ok((None, false));
        }

        match self.lookup(first, second) {
            Some(comparer) => {
                trace!(path = %self.path(), kind = %first.type_key(), "structural comparison");
                Ok((comparer.compare(first, second, self)?, true))
            }
            None => {
                trace!(path = %self.path(), "simple comparison");
                Ok((compare_simple(first, second, self)?, false))
            }
        }
    }

    fn evaluate_matcher(
        &mut self,
        matcher: &Matcher,
        other: &Value,
        side: Side,
    ) -> Result<(Option<String>, bool)> {
        let outcome = matcher.evaluate(other)?;
        if outcome.matched {
            return Ok((None, false));
        }
        let rendered = matcher.render(&outcome);
        let description = match side {
            Side::First => format!(
                "{} != {}",
                self.label(Side::First, &rendered),
                self.label(Side::Second, &other.repr())
            ),
            Side::Second => format!(
                "{} != {}",
                self.label(Side::First, &other.repr()),
                self.label(Side::Second, &rendered)
            ),
        };
        Ok((Some(description), true))
    }

    fn lookup(&self, first: &Value, second: &Value) -> Option<Arc<dyn Comparer>> {
        let key = first.type_key();
        if key == second.type_key() {
            return self.registry.lookup(&key);
        }
        match (first, second) {
            (Value::Object { .. }, Value::Object { .. }) => Some(Arc::new(compare_object)),
            _ => None,
        }
    }
}

fn materialized(value: &Value) -> Value {
    match value {
        Value::Generator(g) => Value::List(g.materialize().as_ref().clone()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn path_segments_render_by_kind() {
        let registry = Registry::with_builtins();
        let options = CompareOptions::new();
        let mut ctx = CompareContext::new(&registry, &options, None);
        ctx.path.push(PathSegment::index(1));
        ctx.path.push(PathSegment::key(&Value::text("text")));
        ctx.path.push(PathSegment::attr("name"));
        assert_eq!(ctx.path(), "[1]['text'].name");
    }

    #[test]
    fn options_fall_back_on_wrong_kind() {
        let options = CompareOptions::from_json(r#"{"precision": "high", "strict": true}"#).unwrap();
        assert_eq!(options.i64(keys::PRECISION, DEFAULT_PRECISION), 2);
        assert!(options.bool(keys::STRICT, false));
        let registry = Registry::new();
        let ctx = CompareContext::new(&registry, &options, Some(("expected", "actual")));
        assert_eq!(ctx.get_option("missing", json!(7)), json!(7));
        assert_eq!(ctx.label(Side::First, "1"), "1 (expected)");
        assert_eq!(ctx.x_label(), "expected");
    }

    #[test]
    fn depth_limit_is_an_error() {
        let mut deep = Value::Int(1);
        let mut other = Value::Int(2);
        for _ in 0..10 {
            deep = Value::list([deep]);
            other = Value::list([other]);
        }
        let registry = Registry::with_builtins();
        let options = CompareOptions::new().with(keys::MAX_DEPTH, 5);
        let mut ctx = CompareContext::new(&registry, &options, None);
        let err = ctx.compare_root(&deep, &other).unwrap_err();
        assert!(matches!(err, CompareError::TooDeep { depth: 5, .. }));
    }
}
