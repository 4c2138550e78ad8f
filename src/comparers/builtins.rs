//! Comparers registered at start-up, plus the fallbacks the dispatcher uses
//! when no comparer is registered.

use crate::comparison::sorted_if_orderable;
use crate::context::{keys, CompareContext, PathSegment, Side, DEFAULT_PRECISION};
use crate::errors::Result;
use crate::matchers::round_f64;
use crate::report::{Finding, Headings};
use crate::text::{describe_text, TextOptions};
use crate::value::{quote_text, Value};

/// Fallback for values with no structure to descend into.
pub fn compare_simple(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    if ctx.equal(first, second)? {
        return Ok(None);
    }
    let (x, y) = (first.repr(), second.repr());
    if x == y {
        if first.type_key() != second.type_key() {
            return compare_with_type(first, second, ctx);
        }
        return Ok(Some(format!(
            "Both {} and {} appear as {x}, but are not equal!",
            ctx.x_label(),
            ctx.y_label()
        )));
    }
    Ok(Some(format!(
        "{} != {}",
        ctx.label(Side::First, &x),
        ctx.label(Side::Second, &y)
    )))
}

/// Report both values together with their type names.
pub fn compare_with_type(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    Ok(Some(format!(
        "{} ({}) != {} ({})",
        ctx.label(Side::First, &first.repr()),
        first.type_key(),
        ctx.label(Side::Second, &second.repr()),
        second.type_key()
    )))
}

pub fn compare_set(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    let (Value::Set(a), Value::Set(b)) = (first, second) else {
        return compare_simple(first, second, ctx);
    };
    let only_first = missing_from(a, b, ctx)?;
    let only_second = missing_from(b, a, ctx)?;
    if only_first.is_empty() && only_second.is_empty() {
        return Ok(None);
    }

    let mut sections = Vec::new();
    if !only_first.is_empty() {
        sections.push((
            format!("in {} but not {}", ctx.x_label(), ctx.y_label()),
            Value::List(sorted_if_orderable(&only_first)).pformat(),
        ));
    }
    if !only_second.is_empty() {
        sections.push((
            format!("in {} but not {}", ctx.y_label(), ctx.x_label()),
            Value::List(sorted_if_orderable(&only_second)).pformat(),
        ));
    }
    Ok(Some(crate::report::render("set", &sections)))
}

/// Members of `items` with no equal member in `other`.
fn missing_from<'v>(
    items: &'v [Value],
    other: &[Value],
    ctx: &CompareContext<'_>,
) -> Result<Vec<&'v Value>> {
    let mut missing = Vec::new();
    for item in items {
        let mut found = false;
        for candidate in other {
            if ctx.equal(item, candidate)? {
                found = true;
                break;
            }
        }
        if !found {
            missing.push(item);
        }
    }
    Ok(missing)
}

pub fn compare_mapping(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    let (Value::Map(a), Value::Map(b)) = (first, second) else {
        return compare_simple(first, second, ctx);
    };
    let keys_first: Vec<&Value> = a.iter().map(|(k, _)| k).collect();
    let keys_second: Vec<&Value> = b.iter().map(|(k, _)| k).collect();

    let mut finding = Finding::default();
    for key in sorted_if_orderable(&keys_first) {
        let label = key.repr();
        let x = first.get(&key).unwrap_or(&Value::Null);
        match second.get(&key) {
            None => finding.only_first.push((label, x.clone())),
            Some(y) => {
                if ctx.different(x, y, PathSegment::key(&key))?.is_some() {
                    finding.changed.push((label, x.clone(), y.clone()));
                } else {
                    finding.same.push(key.clone());
                }
            }
        }
    }
    for key in sorted_if_orderable(&keys_second) {
        if first.get(&key).is_none() {
            let y = second.get(&key).unwrap_or(&Value::Null);
            finding.only_second.push((key.repr(), y.clone()));
        }
    }
    Ok(finding.render(ctx, &Headings::values("map")))
}

/// Longest common prefix, then each side's remainder shown whole.
pub fn compare_sequence(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    let (a, b) = match (first, second) {
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => (a, b),
        _ => return compare_simple(first, second, ctx),
    };
    let mut i = 0;
    while i < a.len() && i < b.len() {
        if ctx.different(&a[i], &b[i], PathSegment::index(i))?.is_some() {
            break;
        }
        i += 1;
    }
    if a.len() == b.len() && i == a.len() {
        return Ok(None);
    }

    let rebuild = |items: &[Value]| match first {
        Value::Tuple(_) => Value::Tuple(items.to_vec()),
        _ => Value::List(items.to_vec()),
    };
    let sections = vec![
        ("same".to_string(), rebuild(&a[..i]).pformat()),
        (ctx.x_label().to_string(), rebuild(&a[i..]).pformat()),
        (ctx.y_label().to_string(), rebuild(&b[i..]).pformat()),
    ];
    Ok(Some(crate::report::render("sequence", &sections)))
}

/// Named-field tuples of the same type, compared field by field.
pub fn compare_record(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    let (
        Value::Record { name, fields: a },
        Value::Record { name: other, fields: b },
    ) = (first, second)
    else {
        return compare_simple(first, second, ctx);
    };
    let same_fields = name == other
        && a.len() == b.len()
        && a.iter().zip(b).all(|((x, _), (y, _))| x == y);
    if !same_fields {
        return compare_simple(first, second, ctx);
    }

    let mut finding = Finding::default();
    for ((field, x), (_, y)) in a.iter().zip(b) {
        if ctx.different(x, y, PathSegment::attr(field))?.is_some() {
            finding.changed.push((quote_text(field), x.clone(), y.clone()));
        } else {
            finding.same.push(Value::text(field));
        }
    }
    Ok(finding.render(ctx, &Headings::values(name)))
}

/// Attribute bags of the same type: attributes on one side only, and
/// attributes whose values differ.
pub fn compare_object(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    let (
        Value::Object { name, attrs: a },
        Value::Object { name: other, attrs: b },
    ) = (first, second)
    else {
        return compare_simple(first, second, ctx);
    };
    if name != other {
        return compare_simple(first, second, ctx);
    }

    let mut finding = Finding::default();
    let mut names_first: Vec<&String> = a.iter().map(|(k, _)| k).collect();
    names_first.sort();
    for attr in names_first {
        let x = first.attribute(attr).unwrap_or(&Value::Null);
        match second.attribute(attr) {
            None => finding.only_first.push((quote_text(attr), x.clone())),
            Some(y) => {
                if ctx.different(x, y, PathSegment::attr(attr))?.is_some() {
                    finding.changed.push((quote_text(attr), x.clone(), y.clone()));
                } else {
                    finding.same.push(Value::text(attr));
                }
            }
        }
    }
    let mut names_second: Vec<&String> = b.iter().map(|(k, _)| k).collect();
    names_second.sort();
    for attr in names_second {
        if first.attribute(attr).is_none() {
            let y = second.attribute(attr).unwrap_or(&Value::Null);
            finding.only_second.push((quote_text(attr), y.clone()));
        }
    }
    Ok(finding.render(ctx, &Headings::attributes(name)))
}

pub fn compare_text(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    let (Value::Text(a), Value::Text(b)) = (first, second) else {
        return compare_simple(first, second, ctx);
    };
    let options = TextOptions {
        blanklines: ctx.option_bool(keys::BLANKLINES, true),
        trailing_whitespace: ctx.option_bool(keys::TRAILING_WHITESPACE, true),
        show_whitespace: ctx.option_bool(keys::SHOW_WHITESPACE, false),
    };
    Ok(describe_text(a, b, &options, ctx))
}

/// Opt-in comparer for floats and decimals that treats values as equal
/// when they agree to `precision` decimal places.
pub fn compare_rounded(
    first: &Value,
    second: &Value,
    ctx: &mut CompareContext<'_>,
) -> Result<Option<String>> {
    let precision = ctx.option_i64(keys::PRECISION, DEFAULT_PRECISION).clamp(0, 28) as u32;
    let equal = match (first, second) {
        (Value::Float(x), Value::Float(y)) => round_f64(*x, precision) == round_f64(*y, precision),
        (Value::Decimal(x), Value::Decimal(y)) => x.round_dp(precision) == y.round_dp(precision),
        _ => return compare_simple(first, second, ctx),
    };
    if equal {
        return Ok(None);
    }
    Ok(Some(format!(
        "{} != {} when rounded to {precision} decimal places",
        ctx.label(Side::First, &first.repr()),
        ctx.label(Side::Second, &second.repr())
    )))
}
