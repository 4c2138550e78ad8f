use std::fmt;

use itertools::Itertools;

use crate::comparison::cmp_numbers;
use crate::decimal::Decimal;
use crate::generator::Generator;
use crate::matchers::Matcher;

/// Exact runtime type of a [`Value`]. The registry is keyed on this.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKey {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Text,
    Bytes,
    List,
    Tuple,
    Set,
    Map,
    Record(String),
    Object(String),
    Generator,
    Matcher,
}

impl TypeKey {
    pub fn record(name: impl Into<String>) -> Self {
        TypeKey::Record(name.into())
    }

    pub fn object(name: impl Into<String>) -> Self {
        TypeKey::Object(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            TypeKey::Null => "null",
            TypeKey::Bool => "bool",
            TypeKey::Int => "int",
            TypeKey::Float => "float",
            TypeKey::Decimal => "decimal",
            TypeKey::Text => "text",
            TypeKey::Bytes => "bytes",
            TypeKey::List => "list",
            TypeKey::Tuple => "tuple",
            TypeKey::Set => "set",
            TypeKey::Map => "map",
            TypeKey::Record(name) | TypeKey::Object(name) => name,
            TypeKey::Generator => "generator",
            TypeKey::Matcher => "matcher",
        }
    }

    /// Resolve a type name to a built-in key. User types cannot be told apart
    /// by name alone, so callers match `Record`/`Object` names separately.
    pub fn builtin(name: &str) -> Option<TypeKey> {
        Some(match name {
            "null" | "None" | "NoneType" => TypeKey::Null,
            "bool" => TypeKey::Bool,
            "int" => TypeKey::Int,
            "float" => TypeKey::Float,
            "decimal" | "Decimal" => TypeKey::Decimal,
            "text" | "str" => TypeKey::Text,
            "bytes" => TypeKey::Bytes,
            "list" => TypeKey::List,
            "tuple" => TypeKey::Tuple,
            "set" => TypeKey::Set,
            "map" | "dict" => TypeKey::Map,
            "generator" => TypeKey::Generator,
            _ => return None,
        })
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed value the engine can compare and describe.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Distinct members in insertion order.
    Set(Vec<Value>),
    /// Unique keys in insertion order.
    Map(Vec<(Value, Value)>),
    /// Fixed named-field tuple.
    Record { name: String, fields: Vec<(String, Value)> },
    /// Attribute bag.
    Object { name: String, attrs: Vec<(String, Value)> },
    Generator(Generator),
    Matcher(Box<Matcher>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn list<I: IntoIterator<Item = V>, V: Into<Value>>(items: I) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn tuple<I: IntoIterator<Item = V>, V: Into<Value>>(items: I) -> Self {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a set; duplicates (by equality) are dropped.
    pub fn set<I: IntoIterator<Item = V>, V: Into<Value>>(items: I) -> Self {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Value::Set(out)
    }

    /// Build a map; a repeated key replaces the earlier value in place.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (k, v) in entries {
            let (k, v) = (k.into(), v.into());
            match out.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => out.push((k, v)),
            }
        }
        Value::Map(out)
    }

    pub fn record<I, K, V>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Record {
            name: name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn object<I, K, V>(name: impl Into<String>, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object {
            name: name.into(),
            attrs: attrs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn generator<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Value::Generator(Generator::new(iter))
    }

    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Null => TypeKey::Null,
            Value::Bool(_) => TypeKey::Bool,
            Value::Int(_) => TypeKey::Int,
            Value::Float(_) => TypeKey::Float,
            Value::Decimal(_) => TypeKey::Decimal,
            Value::Text(_) => TypeKey::Text,
            Value::Bytes(_) => TypeKey::Bytes,
            Value::List(_) => TypeKey::List,
            Value::Tuple(_) => TypeKey::Tuple,
            Value::Set(_) => TypeKey::Set,
            Value::Map(_) => TypeKey::Map,
            Value::Record { name, .. } => TypeKey::Record(name.clone()),
            Value::Object { name, .. } => TypeKey::Object(name.clone()),
            Value::Generator(_) => TypeKey::Generator,
            Value::Matcher(_) => TypeKey::Matcher,
        }
    }

    /// Named fields of a record or attributes of an object.
    pub fn attributes(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Record { fields, .. } => Some(fields),
            Value::Object { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes()?
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Look up a map entry by key equality.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Structural equality that descends at most `budget` container levels.
    /// `None` when the values nest deeper than that before a difference is
    /// found.
    pub fn eq_within(&self, other: &Value, budget: usize) -> Option<bool> {
        match (self, other) {
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                let inner = budget.checked_sub(1)?;
                if a.len() != b.len() {
                    return Some(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.eq_within(y, inner)? {
                        return Some(false);
                    }
                }
                Some(true)
            }
            (Value::Set(a), Value::Set(b)) => {
                let inner = budget.checked_sub(1)?;
                if a.len() != b.len() {
                    return Some(false);
                }
                for (x, y) in [(a, b), (b, a)] {
                    for item in x.iter() {
                        if !contains_within(y, item, inner)? {
                            return Some(false);
                        }
                    }
                }
                Some(true)
            }
            (Value::Map(a), Value::Map(b)) => entries_within(a, b, budget),
            (
                Value::Record { name: n1, fields: f1 },
                Value::Record { name: n2, fields: f2 },
            ) => {
                if n1 != n2 || f1.len() != f2.len() {
                    return Some(false);
                }
                let inner = budget.checked_sub(1)?;
                for ((k1, x), (k2, y)) in f1.iter().zip(f2) {
                    if k1 != k2 || !x.eq_within(y, inner)? {
                        return Some(false);
                    }
                }
                Some(true)
            }
            (
                Value::Object { name: n1, attrs: a1 },
                Value::Object { name: n2, attrs: a2 },
            ) => {
                if n1 != n2 {
                    return Some(false);
                }
                entries_within(a1, a2, budget)
            }
            _ => Some(self == other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Single-line literal rendering used throughout the reports.
    pub fn repr(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{f:?}"),
            Value::Decimal(d) => format!("Decimal('{d}')"),
            Value::Text(s) => quote_text(s),
            Value::Bytes(b) => quote_bytes(b),
            Value::List(items) => format!("[{}]", join_reprs(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_reprs(items)),
            Value::Set(items) if items.is_empty() => "set()".to_string(),
            Value::Set(items) => format!("{{{}}}", join_reprs(items)),
            Value::Map(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .join(", ")
            ),
            Value::Record { name, fields } => format!(
                "{name}({})",
                fields
                    .iter()
                    .map(|(k, v)| format!("{k}={}", v.repr()))
                    .join(", ")
            ),
            Value::Object { name, attrs } => {
                let mut out = format!("<{name}");
                for (k, v) in attrs {
                    out.push_str(&format!(" {k}={}", v.repr()));
                }
                out.push('>');
                out
            }
            Value::Generator(_) => "<generator>".to_string(),
            Value::Matcher(m) => m.to_string(),
        }
    }

    /// Like [`Value::repr`], but containers wider than 80 columns are broken
    /// one element per line.
    pub fn pformat(&self) -> String {
        self.pformat_at(0)
    }

    fn pformat_at(&self, indent: usize) -> String {
        let flat = self.repr();
        if flat.len() + indent <= 80 {
            return flat;
        }
        let inner = indent + 1;
        let sep = format!(",\n{}", " ".repeat(inner));
        match self {
            Value::List(items) => format!("[{}]", pformat_items(items, inner, &sep)),
            Value::Tuple(items) if items.len() > 1 => {
                format!("({})", pformat_items(items, inner, &sep))
            }
            Value::Set(items) if !items.is_empty() => {
                format!("{{{}}}", pformat_items(items, inner, &sep))
            }
            Value::Map(entries) if !entries.is_empty() => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| {
                        let key = k.repr();
                        let value = v.pformat_at(inner + key.len() + 2);
                        format!("{key}: {value}")
                    })
                    .join(&sep)
            ),
            _ => flat,
        }
    }
}

fn join_reprs(items: &[Value]) -> String {
    items.iter().map(Value::repr).join(", ")
}

fn pformat_items(items: &[Value], indent: usize, sep: &str) -> String {
    items
        .iter()
        .map(|v| v.pformat_at(indent))
        .join(sep)
}

/// Quote text the way a literal would be written, making control
/// characters visible.
pub fn quote_text(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

fn contains_within(items: &[Value], wanted: &Value, budget: usize) -> Option<bool> {
    for item in items {
        if item.eq_within(wanted, budget)? {
            return Some(true);
        }
    }
    Some(false)
}

fn entries_within<K: PartialEq>(
    a: &[(K, Value)],
    b: &[(K, Value)],
    budget: usize,
) -> Option<bool> {
    if a.len() != b.len() {
        return Some(false);
    }
    let inner = budget.checked_sub(1)?;
    for (k, v) in a {
        let Some((_, w)) = b.iter().find(|(other, _)| other == k) else {
            return Some(false);
        };
        if !v.eq_within(w, inner)? {
            return Some(false);
        }
    }
    Some(true)
}

fn same_members(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
}

fn same_entries<K: PartialEq>(a: &[(K, Value)], b: &[(K, Value)]) -> bool {
    a.len() == b.len()
        && a.iter().all(|(k, v)| {
            b.iter()
                .find(|(other, _)| other == k)
                .is_some_and(|(_, w)| v == w)
        })
}

/// Structural equality. Matchers on either side are evaluated against the
/// other operand, so `==` is symmetric for them; two matchers never match.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Matcher(_), Value::Matcher(_)) => false,
            (Value::Matcher(m), v) | (v, Value::Matcher(m)) => m.matches(v),
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (
                Value::Int(_) | Value::Float(_) | Value::Decimal(_),
                Value::Int(_) | Value::Float(_) | Value::Decimal(_),
            ) => cmp_numbers(self, other) == Some(std::cmp::Ordering::Equal),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => same_members(a, b),
            (Value::Map(a), Value::Map(b)) => same_entries(a, b),
            (
                Value::Record { name: n1, fields: f1 },
                Value::Record { name: n2, fields: f2 },
            ) => n1 == n2 && f1 == f2,
            (
                Value::Object { name: n1, attrs: a1 },
                Value::Object { name: n2, attrs: a2 },
            ) => n1 == n2 && same_entries(a1, a2),
            (Value::Generator(a), Value::Generator(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<Matcher> for Value {
    fn from(m: Matcher) -> Self {
        Value::Matcher(Box::new(m))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => Value::map(map),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn repr_uses_literal_style() {
        assert_eq!(Value::text("it's").repr(), "\"it's\"");
        assert_eq!(Value::text("a\tb\n").repr(), "'a\\tb\\n'");
        assert_eq!(Value::tuple([1]).repr(), "(1,)");
        assert_eq!(Value::set(Vec::<Value>::new()).repr(), "set()");
        assert_eq!(Value::Float(1.0).repr(), "1.0");
        assert_eq!(
            Value::record("Point", [("x", 1), ("y", 2)]).repr(),
            "Point(x=1, y=2)"
        );
        assert_eq!(Value::object("Thing", [("a", "b")]).repr(), "<Thing a='b'>");
        assert_eq!(Value::Bytes(b"a\x00".to_vec()).repr(), "b'a\\x00'");
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let v = Value::from(json!({"x": [1, 2.5, null], "y": "z"}));
        assert_eq!(
            v.repr(),
            "{'x': [1, 2.5, null], 'y': 'z'}"
        );
    }

    #[test]
    fn maps_and_sets_ignore_order() {
        assert_eq!(Value::set([1, 2, 2]), Value::set([2, 1]));
        assert_eq!(Value::map([("a", 1), ("b", 2)]), Value::map([("b", 2), ("a", 1)]));
        assert_ne!(Value::list([1, 2]), Value::tuple([1, 2]));
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn pformat_breaks_wide_containers() {
        let wide = Value::list((0..30).map(|i| format!("item{i}")));
        let text = wide.pformat();
        assert!(text.starts_with("['item0',\n 'item1',"));
        assert!(text.ends_with("'item29']"));
        assert_eq!(Value::list([1, 2]).pformat(), "[1, 2]");
    }
}
