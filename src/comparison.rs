use std::cmp::Ordering;

use itertools::Itertools;

use crate::decimal::Decimal;
use crate::value::Value;

/// Order two numeric values across `Int`, `Float` and `Decimal`.
/// `None` when either side is not a number or the pair is unordered (NaN).
///
/// `Int` and `Decimal` compare exactly. Any pair involving a `Float` goes
/// through `f64`, so `Decimal("0.1")` equals `0.1`.
pub fn cmp_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Decimal(x), Value::Decimal(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Decimal(y)) => Some(Decimal::new(*x as i128, 0).cmp(y)),
        (Value::Decimal(x), Value::Int(y)) => Some(x.cmp(&Decimal::new(*y as i128, 0))),
        _ => {
            let da = as_f64(a)?;
            let db = as_f64(b)?;
            da.partial_cmp(&db)
        }
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Decimal(d) => Some(d.to_f64()),
        _ => None,
    }
}

/// Total-ish ordering used for ranges and for sorting report output.
///
/// Numbers order numerically, text and bytes lexically, sequences
/// element-wise. Anything else is unorderable.
pub fn cmp_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            for (l, r) in x.iter().zip(y) {
                match cmp_values(l, r)? {
                    Ordering::Equal => continue,
                    ord => return Some(ord),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        _ => cmp_numbers(a, b),
    }
}

/// Sort a copy of `items` when every pair is orderable; otherwise keep
/// the source order.
///
/// Mixed numeric kinds need not form a total order, so this is a stable
/// insertion sort rather than `sort_by`, which may panic on one.
pub fn sorted_if_orderable(items: &[&Value]) -> Vec<Value> {
    let orderable = items
        .iter()
        .tuple_combinations()
        .all(|(a, b)| cmp_values(a, b).is_some());
    if !orderable {
        return items.iter().map(|v| (*v).clone()).collect();
    }
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        let at = out
            .iter()
            .position(|placed| cmp_values(item, placed) == Some(Ordering::Less))
            .unwrap_or(out.len());
        out.insert(at, (*item).clone());
    }
    out
}
