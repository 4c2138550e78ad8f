use itertools::Itertools;

use crate::context::{CompareContext, Side};
use crate::value::Value;

/// What a keyed comparison found, before it is turned into text.
/// Keys are already rendered for display.
#[derive(Debug, Default)]
pub(crate) struct Finding {
    pub same: Vec<Value>,
    pub only_first: Vec<(String, Value)>,
    pub only_second: Vec<(String, Value)>,
    pub changed: Vec<(String, Value, Value)>,
}

pub(crate) struct Headings<'n> {
    kind: &'n str,
    prefix: &'static str,
    differ: &'static str,
}

impl<'n> Headings<'n> {
    pub fn values(kind: &'n str) -> Self {
        Self { kind, prefix: "", differ: "values differ" }
    }

    pub fn attributes(kind: &'n str) -> Self {
        Self { kind, prefix: "attributes ", differ: "attributes differ" }
    }
}

impl Finding {
    pub fn is_equal(&self) -> bool {
        self.only_first.is_empty() && self.only_second.is_empty() && self.changed.is_empty()
    }

    /// Sections in fixed order: same, only in first, only in second, differ.
    /// Empty sections are left out.
    pub fn render(&self, ctx: &CompareContext<'_>, headings: &Headings<'_>) -> Option<String> {
        if self.is_equal() {
            return None;
        }
        let prefix = headings.prefix;
        let (x, y) = (ctx.x_label(), ctx.y_label());
        let entries = |items: &[(String, Value)]| {
            items
                .iter()
                .map(|(k, v)| format!("{k}: {}", v.pformat()))
                .join("\n")
        };

        let mut sections = Vec::new();
        if !self.same.is_empty() {
            sections.push((format!("{prefix}same"), Value::List(self.same.clone()).pformat()));
        }
        if !self.only_first.is_empty() {
            sections.push((format!("{prefix}in {x} but not {y}"), entries(&self.only_first)));
        }
        if !self.only_second.is_empty() {
            sections.push((format!("{prefix}in {y} but not {x}"), entries(&self.only_second)));
        }
        if !self.changed.is_empty() {
            let lines = self
                .changed
                .iter()
                .map(|(k, a, b)| {
                    format!(
                        "{k}: {} != {}",
                        ctx.label(Side::First, &a.pformat()),
                        ctx.label(Side::Second, &b.pformat())
                    )
                })
                .join("\n");
            sections.push((headings.differ.to_string(), lines));
        }
        Some(render(headings.kind, &sections))
    }
}

/// `<kind> not as expected:` followed by blank-line separated sections.
pub(crate) fn render(kind: &str, sections: &[(String, String)]) -> String {
    let mut out = format!("{kind} not as expected:");
    for (heading, body) in sections {
        out.push_str(&format!("\n\n{heading}:\n{body}"));
    }
    out
}
