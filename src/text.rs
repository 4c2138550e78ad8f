//! Line-oriented text handling: normalisation before comparison and
//! unified-diff rendering.

use itertools::Itertools;
use similar::TextDiff;

use crate::context::{CompareContext, Side};
use crate::value::quote_text;

/// Normalisations applied identically to both texts before comparing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextOptions {
    /// Keep blank and whitespace-only lines.
    pub blanklines: bool,
    /// Keep whitespace at the end of lines.
    pub trailing_whitespace: bool,
    /// Escape whitespace so it is visible in diffs.
    pub show_whitespace: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            blanklines: true,
            trailing_whitespace: true,
            show_whitespace: false,
        }
    }
}

pub fn normalize(text: &str, options: &TextOptions) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if !options.trailing_whitespace {
        lines = lines.into_iter().map(str::trim_end).collect();
    }
    if !options.blanklines {
        lines.retain(|line| !line.trim().is_empty());
    }
    lines.join("\n")
}

/// Render each line as a quoted literal, newline included, so tabs,
/// carriage returns and trailing spaces show up in a diff.
pub fn split_repr(text: &str) -> String {
    let parts: Vec<&str> = text.split('\n').collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == last {
                quote_text(part)
            } else {
                quote_text(&format!("{part}\n"))
            }
        })
        .join("\n")
}

/// Unified diff of two texts, three lines of context, labelled
/// `first`/`second`. Empty when the texts are identical.
pub fn diff(first: &str, second: &str) -> String {
    diff_labelled(first, second, "first", "second")
}

pub fn diff_labelled(first: &str, second: &str, x_label: &str, y_label: &str) -> String {
    let old: Vec<&str> = first.split('\n').collect();
    let new: Vec<&str> = second.split('\n').collect();
    TextDiff::from_slices(old.as_slice(), new.as_slice())
        .unified_diff()
        .context_radius(3)
        .missing_newline_hint(false)
        .header(x_label, y_label)
        .to_string()
        .trim_end_matches('\n')
        .to_string()
}

/// Description of how two texts differ after normalisation, if they do.
pub(crate) fn describe_text(
    first: &str,
    second: &str,
    options: &TextOptions,
    ctx: &CompareContext<'_>,
) -> Option<String> {
    let x = normalize(first, options);
    let y = normalize(second, options);
    if x == y {
        return None;
    }
    let quoted_x = ctx.label(Side::First, &quote_text(&x));
    let quoted_y = ctx.label(Side::Second, &quote_text(&y));
    if x.chars().count() <= 10 && y.chars().count() <= 10 {
        return Some(format!("{quoted_x} != {quoted_y}"));
    }
    if !x.contains('\n') && !y.contains('\n') {
        return Some(format!("\n{quoted_x}\n!=\n{quoted_y}"));
    }
    let (x, y) = if options.show_whitespace {
        (split_repr(&x), split_repr(&y))
    } else {
        (x, y)
    };
    Some(format!("\n{}", diff_labelled(&x, &y, ctx.x_label(), ctx.y_label())))
}
