use serde_json::Value as JsonValue;
use tracing::debug;

use crate::comparers::{self, Comparer, Registry};
use crate::context::{keys, CompareContext, CompareOptions};
use crate::errors::{CompareError, Result};
use crate::value::{TypeKey, Value};

// =========================
// Public API (Compare)
// =========================

/// One configured comparison: options, per-call comparers, message
/// decoration and, optionally, the expected/actual operands.
///
/// ```
/// use deepcompare::{Compare, Value};
///
/// let err = Compare::new()
///     .prefix("config")
///     .run(&Value::list([1, 2, 3]), &Value::list([1, 2, 4]))
///     .unwrap_err();
/// assert!(err.to_string().starts_with("config: sequence not as expected:"));
/// ```
#[derive(Clone, Default)]
pub struct Compare {
    options: CompareOptions,
    overlay: Registry,
    prefix: Option<String>,
    suffix: Option<String>,
    labels: Option<(String, String)>,
    expected: Option<Value>,
    actual: Option<Value>,
}

impl Compare {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.options.set(name, value);
        self
    }

    pub fn options(mut self, options: CompareOptions) -> Self {
        self.options.merge(options);
        self
    }

    /// Values of different types are never equal, and their type names
    /// are reported.
    pub fn strict(self, strict: bool) -> Self {
        self.option(keys::STRICT, strict)
    }

    /// Skip the values' own equality and always compare structurally.
    pub fn ignore_eq(self, ignore_eq: bool) -> Self {
        self.option(keys::IGNORE_EQ, ignore_eq)
    }

    /// Include the reports of nested differences.
    pub fn recursive(self, recursive: bool) -> Self {
        self.option(keys::RECURSIVE, recursive)
    }

    pub fn blanklines(self, keep: bool) -> Self {
        self.option(keys::BLANKLINES, keep)
    }

    pub fn trailing_whitespace(self, keep: bool) -> Self {
        self.option(keys::TRAILING_WHITESPACE, keep)
    }

    pub fn show_whitespace(self, show: bool) -> Self {
        self.option(keys::SHOW_WHITESPACE, show)
    }

    pub fn precision(self, places: i64) -> Self {
        self.option(keys::PRECISION, places)
    }

    /// Use `comparer` for `key` in this comparison only.
    pub fn comparer<C: Comparer + 'static>(mut self, key: TypeKey, comparer: C) -> Self {
        self.overlay.register(key, comparer);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Name the two sides in reports instead of `first`/`second`.
    pub fn labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.labels = Some((x.into(), y.into()));
        self
    }

    pub fn expected(mut self, value: impl Into<Value>) -> Self {
        self.expected = Some(value.into());
        self
    }

    pub fn actual(mut self, value: impl Into<Value>) -> Self {
        self.actual = Some(value.into());
        self
    }

    /// Compare two values; `Err(CompareError::NotEqual)` carries the report.
    pub fn run(&self, first: &Value, second: &Value) -> Result<()> {
        match self.describe(first, second)? {
            None => Ok(()),
            Some(message) => Err(CompareError::NotEqual { message }),
        }
    }

    /// Compare two values and hand back the report instead of failing.
    pub fn describe(&self, first: &Value, second: &Value) -> Result<Option<String>> {
        if self.expected.is_some() || self.actual.is_some() {
            return Err(CompareError::InvalidArguments(
                "expected/actual cannot be combined with positional operands".into(),
            ));
        }
        let labels = self.labels.as_ref().map(|(x, y)| (x.as_str(), y.as_str()));
        self.execute(first, second, labels)
    }

    /// Compare the values given through [`Compare::expected`] and
    /// [`Compare::actual`], labelling the sides accordingly.
    pub fn check(&self) -> Result<()> {
        let (Some(expected), Some(actual)) = (&self.expected, &self.actual) else {
            return Err(CompareError::InvalidArguments(
                "both expected and actual must be supplied".into(),
            ));
        };
        match self.execute(expected, actual, Some(("expected", "actual")))? {
            None => Ok(()),
            Some(message) => Err(CompareError::NotEqual { message }),
        }
    }

    fn execute(
        &self,
        first: &Value,
        second: &Value,
        labels: Option<(&str, &str)>,
    ) -> Result<Option<String>> {
        let registry = comparers::global().overlaid(&self.overlay);
        let mut ctx = CompareContext::new(&registry, &self.options, labels);
        debug!(
            first = %first.type_key(),
            second = %second.type_key(),
            overlay = self.overlay.len(),
            "comparing"
        );
        let found = ctx.compare_root(first, second)?;
        debug!(equal = found.is_none(), "comparison finished");
        Ok(found.map(|message| self.decorate(message)))
    }

    fn decorate(&self, message: String) -> String {
        let mut out = match &self.prefix {
            Some(prefix) => format!("{prefix}: {message}"),
            None => message,
        };
        if let Some(suffix) = &self.suffix {
            out.push('\n');
            out.push_str(suffix);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn describe(a: JsonValue, b: JsonValue) -> Option<String> {
        Compare::new()
            .describe(&Value::from(a), &Value::from(b))
            .unwrap()
    }

    #[test]
    fn equal_values_produce_nothing() {
        assert_eq!(describe(json!({"a": [1, 2]}), json!({"a": [1, 2]})), None);
    }

    #[test]
    fn top_level_simple_values() {
        assert_eq!(describe(json!(1), json!(2)).unwrap(), "1 != 2");
        assert_eq!(describe(json!(null), json!(false)).unwrap(), "null != false");
    }

    #[test]
    fn prefix_and_suffix_wrap_the_report() {
        let message = Compare::new()
            .prefix("wrong")
            .suffix("see docs")
            .describe(&Value::Int(1), &Value::Int(2))
            .unwrap()
            .unwrap();
        assert_eq!(message, "wrong: 1 != 2\nsee docs");
    }

    #[test]
    fn expected_actual_labels_the_sides() {
        let err = Compare::new().expected(1).actual(2).check().unwrap_err();
        assert_eq!(err.to_string(), "1 (expected) != 2 (actual)");
        assert!(Compare::new().expected(1).actual(1).check().is_ok());
    }

    #[test]
    fn mixing_operand_styles_is_rejected() {
        let err = Compare::new()
            .expected(1)
            .run(&Value::Int(1), &Value::Int(1))
            .unwrap_err();
        assert!(matches!(err, CompareError::InvalidArguments(_)));
        let err = Compare::new().actual(1).check().unwrap_err();
        assert!(matches!(err, CompareError::InvalidArguments(_)));
    }

    #[test]
    fn strict_reports_type_names() {
        let out = Compare::new()
            .strict(true)
            .describe(&Value::Int(1), &Value::Float(1.0))
            .unwrap()
            .unwrap();
        assert_eq!(out, "1 (int) != 1.0 (float)");
        assert!(Compare::new().run(&Value::Int(1), &Value::Float(1.0)).is_ok());
    }
}
