//! Declarative matchers: values whose equality is defined by a
//! description (type and attributes, rounding, range, pattern) rather than
//! by structure.
//!
//! A matcher may sit on either side of a comparison, or anywhere inside a
//! container. Evaluation returns a [`MatchOutcome`]; the matcher itself is
//! never mutated, and the failure text is rendered from the outcome.

use std::fmt;

use regex::Regex;

use crate::comparison::cmp_values;
use crate::errors::{CompareError, Result};
use crate::value::{quote_text, TypeKey, Value};

#[derive(Clone, Debug)]
pub enum Matcher {
    Comparison(Comparison),
    Round(RoundComparison),
    Range(RangeComparison),
    Pattern(StringComparison),
}

/// Why a matcher rejected a value.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchFailure {
    WrongType {
        expected: String,
        actual: String,
    },
    Attributes {
        missing: Vec<(String, Value)>,
        extra: Vec<(String, Value)>,
        differ: Vec<(String, Value, Value)>,
    },
    Rounding,
    OutOfRange,
    NoMatch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub matched: bool,
    pub detail: Option<MatchFailure>,
}

impl MatchOutcome {
    fn pass() -> Self {
        Self { matched: true, detail: None }
    }

    fn fail(detail: MatchFailure) -> Self {
        Self { matched: false, detail: Some(detail) }
    }
}

impl Matcher {
    pub fn evaluate(&self, other: &Value) -> Result<MatchOutcome> {
        match self {
            Matcher::Comparison(c) => Ok(c.evaluate(other)),
            Matcher::Round(r) => r.evaluate(other),
            Matcher::Range(r) => r.evaluate(other),
            Matcher::Pattern(s) => Ok(s.evaluate(other)),
        }
    }

    /// Boolean view used by `Value`'s `==`; evaluation errors count as a
    /// mismatch here and only surface through the engine.
    pub fn matches(&self, other: &Value) -> bool {
        self.evaluate(other).map(|o| o.matched).unwrap_or(false)
    }

    /// Render the matcher in light of an outcome: the plain form when it
    /// passed, the failure detail otherwise.
    pub fn render(&self, outcome: &MatchOutcome) -> String {
        match (self, &outcome.detail) {
            (Matcher::Comparison(c), Some(detail)) if !outcome.matched => c.render_failure(detail),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Comparison(c) => fmt::Display::fmt(c, f),
            Matcher::Round(r) => fmt::Display::fmt(r, f),
            Matcher::Range(r) => fmt::Display::fmt(r, f),
            Matcher::Pattern(s) => fmt::Display::fmt(s, f),
        }
    }
}

/// Description for two matchers compared with each other.
pub(crate) fn invalid_pair(first: &Matcher, second: &Matcher) -> String {
    format!("{first} and {second} cannot be compared: not a valid comparison")
}

#[derive(Clone, Debug)]
enum Target {
    Type(TypeKey),
    /// Dotted name, resolved when the comparison runs.
    Named(String),
}

impl Target {
    fn name(&self) -> &str {
        match self {
            Target::Type(key) => key.name(),
            Target::Named(name) => name,
        }
    }

    fn accepts(&self, key: &TypeKey) -> bool {
        match self {
            Target::Type(expected) => expected == key,
            Target::Named(name) => match TypeKey::builtin(name) {
                Some(builtin) => builtin == *key,
                None => matches!(key, TypeKey::Record(n) | TypeKey::Object(n) if n == name),
            },
        }
    }
}

/// Matches any value of a type whose attributes equal the ones given.
#[derive(Clone, Debug)]
pub struct Comparison {
    target: Target,
    attrs: Option<Vec<(String, Value)>>,
    partial: bool,
}

impl Comparison {
    pub fn of(key: TypeKey) -> Self {
        Self { target: Target::Type(key), attrs: None, partial: false }
    }

    pub fn named(dotted: impl Into<String>) -> Self {
        Self { target: Target::Named(dotted.into()), attrs: None, partial: false }
    }

    /// Expect the type and attributes of an existing value.
    pub fn like(value: &Value) -> Self {
        Self {
            target: Target::Type(value.type_key()),
            attrs: value.attributes().map(<[_]>::to_vec),
            partial: false,
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let (name, value) = (name.into(), value.into());
        let attrs = self.attrs.get_or_insert_with(Vec::new);
        match attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => attrs.push((name, value)),
        }
        self
    }

    /// Only check the attributes named; extra ones on the value are fine.
    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn evaluate(&self, other: &Value) -> MatchOutcome {
        let key = other.type_key();
        if !self.target.accepts(&key) {
            return MatchOutcome::fail(MatchFailure::WrongType {
                expected: self.target.name().to_string(),
                actual: key.name().to_string(),
            });
        }
        let Some(expected) = &self.attrs else {
            return MatchOutcome::pass();
        };
        let actual = other.attributes().unwrap_or(&[]);

        let mut missing = Vec::new();
        let mut differ = Vec::new();
        for (name, want) in expected {
            match actual.iter().find(|(k, _)| k == name) {
                None => missing.push((name.clone(), want.clone())),
                Some((_, got)) if want != got => {
                    differ.push((name.clone(), want.clone(), got.clone()))
                }
                Some(_) => {}
            }
        }
        let extra: Vec<_> = if self.partial {
            Vec::new()
        } else {
            actual
                .iter()
                .filter(|(k, _)| !expected.iter().any(|(name, _)| name == k))
                .cloned()
                .collect()
        };

        if missing.is_empty() && extra.is_empty() && differ.is_empty() {
            MatchOutcome::pass()
        } else {
            MatchOutcome::fail(MatchFailure::Attributes { missing, extra, differ })
        }
    }

    fn header(&self, failed: bool) -> String {
        let mut flags = Vec::new();
        if self.partial {
            flags.push("partial");
        }
        if failed {
            flags.push("failed");
        }
        if flags.is_empty() {
            format!("<C:{}", self.target.name())
        } else {
            format!("<C:{}({})", self.target.name(), flags.join(","))
        }
    }

    fn render_failure(&self, detail: &MatchFailure) -> String {
        let mut lines = vec![format!("{}>", self.header(true))];
        match detail {
            MatchFailure::WrongType { expected, actual } => {
                lines.push(format!("wrong type: expected {expected}, got {actual}"));
            }
            MatchFailure::Attributes { missing, extra, differ } => {
                if !missing.is_empty() {
                    lines.push("attributes in Comparison but not actual:".to_string());
                    lines.extend(
                        missing
                            .iter()
                            .map(|(k, v)| format!("{}: {}", quote_text(k), v.repr())),
                    );
                }
                if !extra.is_empty() {
                    lines.push("attributes in actual but not Comparison:".to_string());
                    lines.extend(
                        extra
                            .iter()
                            .map(|(k, v)| format!("{}: {}", quote_text(k), v.repr())),
                    );
                }
                if !differ.is_empty() {
                    lines.push("attributes differ:".to_string());
                    lines.extend(differ.iter().map(|(k, want, got)| {
                        format!(
                            "{}: {} (Comparison) != {} (actual)",
                            quote_text(k),
                            want.repr(),
                            got.repr()
                        )
                    }));
                }
            }
            _ => {}
        }
        lines.push("</C>".to_string());
        lines.join("\n")
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header(false))?;
        if let Some(attrs) = &self.attrs {
            for (i, (k, v)) in attrs.iter().enumerate() {
                let sep = if i == 0 { " " } else { ", " };
                write!(f, "{sep}{k}={}", v.repr())?;
            }
        }
        f.write_str(">")
    }
}

/// Matches values of the same runtime type that agree once both are
/// rounded to `precision` decimal places.
#[derive(Clone, Debug)]
pub struct RoundComparison {
    value: Value,
    precision: u32,
}

/// Round a float to `precision` places using its exact binary value.
pub fn round_f64(x: f64, precision: u32) -> f64 {
    format!("{:.*}", precision as usize, x).parse().unwrap_or(x)
}

impl RoundComparison {
    pub fn new(value: impl Into<Value>, precision: u32) -> Self {
        Self { value: value.into(), precision }
    }

    fn rounded(&self, v: &Value) -> Option<Value> {
        match v {
            Value::Float(f) => Some(Value::Float(round_f64(*f, self.precision))),
            Value::Decimal(d) => Some(Value::Decimal(d.round_dp(self.precision))),
            Value::Int(i) => Some(Value::Int(*i)),
            _ => None,
        }
    }

    fn rendered(&self, v: &Value) -> String {
        match v {
            Value::Float(f) => format!("{:.*}", self.precision as usize, f),
            Value::Decimal(d) => d.round_dp(self.precision).to_string(),
            other => other.repr(),
        }
    }

    pub fn evaluate(&self, other: &Value) -> Result<MatchOutcome> {
        let (want, got) = (self.value.type_key(), other.type_key());
        let mismatch = || CompareError::MatcherType {
            matcher: self.to_string(),
            expected: want.name().to_string(),
            actual: got.name().to_string(),
        };
        if want != got {
            return Err(mismatch());
        }
        let (Some(a), Some(b)) = (self.rounded(&self.value), self.rounded(other)) else {
            return Err(mismatch());
        };
        if a == b {
            Ok(MatchOutcome::pass())
        } else {
            Ok(MatchOutcome::fail(MatchFailure::Rounding))
        }
    }
}

impl fmt::Display for RoundComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<R:{} to {} digits>", self.rendered(&self.value), self.precision)
    }
}

/// Matches values between `low` and `high`, both ends inclusive.
#[derive(Clone, Debug)]
pub struct RangeComparison {
    low: Value,
    high: Value,
}

impl RangeComparison {
    pub fn new(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self { low: low.into(), high: high.into() }
    }

    pub fn evaluate(&self, other: &Value) -> Result<MatchOutcome> {
        let (Some(lo), Some(hi)) = (cmp_values(&self.low, other), cmp_values(other, &self.high))
        else {
            return Err(CompareError::MatcherType {
                matcher: self.to_string(),
                expected: format!("a value orderable against {}", self.low.type_key()),
                actual: other.type_key().name().to_string(),
            });
        };
        if lo.is_le() && hi.is_le() {
            Ok(MatchOutcome::pass())
        } else {
            Ok(MatchOutcome::fail(MatchFailure::OutOfRange))
        }
    }
}

impl fmt::Display for RangeComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Range: [{}, {}]>", self.low.repr(), self.high.repr())
    }
}

/// Matches text that the pattern matches in full.
#[derive(Clone, Debug)]
pub struct StringComparison {
    pattern: String,
    regex: Regex,
}

impl StringComparison {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { pattern, regex })
    }

    pub fn evaluate(&self, other: &Value) -> MatchOutcome {
        match other {
            Value::Text(s) if self.regex.is_match(s) => MatchOutcome::pass(),
            _ => MatchOutcome::fail(MatchFailure::NoMatch),
        }
    }
}

impl fmt::Display for StringComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<S:{}>", self.pattern)
    }
}

impl From<Comparison> for Value {
    fn from(c: Comparison) -> Self {
        Value::from(Matcher::Comparison(c))
    }
}

impl From<RoundComparison> for Value {
    fn from(r: RoundComparison) -> Self {
        Value::from(Matcher::Round(r))
    }
}

impl From<RangeComparison> for Value {
    fn from(r: RangeComparison) -> Self {
        Value::from(Matcher::Range(r))
    }
}

impl From<StringComparison> for Value {
    fn from(s: StringComparison) -> Self {
        Value::from(Matcher::Pattern(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point(x: i64, y: i64) -> Value {
        Value::object("Point", [("x", x), ("y", y)])
    }

    #[test]
    fn comparison_checks_type_and_attributes() {
        let c = Comparison::of(TypeKey::object("Point")).attr("x", 1).attr("y", 2);
        assert!(c.evaluate(&point(1, 2)).matched);
        assert!(!c.evaluate(&point(1, 3)).matched);
        assert!(!c.evaluate(&Value::Int(1)).matched);
    }

    #[test]
    fn partial_ignores_extra_attributes() {
        let strict = Comparison::of(TypeKey::object("Point")).attr("x", 1);
        let outcome = strict.evaluate(&point(1, 2));
        assert_eq!(
            outcome.detail,
            Some(MatchFailure::Attributes {
                missing: vec![],
                extra: vec![("y".to_string(), Value::Int(2))],
                differ: vec![],
            })
        );
        assert!(strict.partial(true).evaluate(&point(1, 2)).matched);
    }

    #[test]
    fn failure_rendering_lists_every_problem() {
        let m = Matcher::Comparison(
            Comparison::named("Point").attr("x", 1).attr("z", 3),
        );
        let outcome = m.evaluate(&point(2, 2)).unwrap();
        assert_eq!(
            m.render(&outcome),
            "<C:Point(failed)>\n\
             attributes in Comparison but not actual:\n\
             'z': 3\n\
             attributes in actual but not Comparison:\n\
             'y': 2\n\
             attributes differ:\n\
             'x': 1 (Comparison) != 2 (actual)\n\
             </C>"
        );
        assert_eq!(m.to_string(), "<C:Point x=1, z=3>");
    }

    #[test]
    fn like_copies_type_and_attributes() {
        let c = Comparison::like(&point(1, 2));
        assert!(c.evaluate(&point(1, 2)).matched);
        assert!(!c.evaluate(&point(2, 2)).matched);
    }

    #[test]
    fn dotted_names_resolve_builtins_and_user_types() {
        assert!(Comparison::named("int").evaluate(&Value::Int(3)).matched);
        assert!(Comparison::named("pkg.Thing")
            .evaluate(&Value::object("pkg.Thing", Vec::<(String, Value)>::new()))
            .matched);
        assert!(!Comparison::named("pkg.Thing").evaluate(&Value::Int(3)).matched);
    }

    #[test]
    fn round_comparison_rounds_both_sides() {
        let r = RoundComparison::new(1234.5678, 2);
        assert!(r.evaluate(&Value::Float(1234.5681)).unwrap().matched);
        assert_eq!(
            r.evaluate(&Value::Float(1234.5)).unwrap().detail,
            Some(MatchFailure::Rounding)
        );
        assert_eq!(r.to_string(), "<R:1234.57 to 2 digits>");
    }

    #[test]
    fn round_comparison_rejects_other_types() {
        let r = RoundComparison::new(1234.5678, 2);
        let err = r.evaluate(&Value::Int(1234)).unwrap_err();
        assert!(matches!(err, CompareError::MatcherType { .. }));
        assert!(!Matcher::Round(r).matches(&Value::Int(1234)));
    }

    #[test]
    fn range_is_inclusive() {
        let r = RangeComparison::new(1, 5);
        for (v, expected) in [(0, false), (1, true), (3, true), (5, true), (6, false)] {
            assert_eq!(r.evaluate(&Value::Int(v)).unwrap().matched, expected, "{v}");
        }
        assert!(r.evaluate(&Value::Float(4.5)).unwrap().matched);
        assert!(r.evaluate(&Value::text("3")).is_err());
    }

    #[test]
    fn string_comparison_needs_full_match() {
        let s = StringComparison::new(r"\d+").unwrap();
        assert!(s.evaluate(&Value::text("123")).matched);
        assert!(!s.evaluate(&Value::text("123a")).matched);
        assert!(!s.evaluate(&Value::Int(123)).matched);
        assert!(StringComparison::new("(").is_err());
    }
}
