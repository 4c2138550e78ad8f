pub mod errors;
pub mod context;
pub mod engine;     // top-level Compare builder and entry points
pub mod comparers;  // registry and built-in comparers
pub mod matchers;
pub mod value;
pub mod decimal;
pub mod generator;
pub mod text;
mod comparison;
mod report;

pub use comparers::{register, Comparer, Registry};
pub use context::{CompareContext, CompareOptions, PathSegment, Side};
pub use decimal::Decimal;
pub use engine::Compare;
pub use errors::{CompareError, Result};
pub use matchers::{Comparison, RangeComparison, RoundComparison, StringComparison};
pub use text::{diff, diff_labelled};
pub use value::{TypeKey, Value};

/// Compare two values with default options.
/// Returns `Err(CompareError::NotEqual)` with the report when they differ.
pub fn compare(first: impl Into<Value>, second: impl Into<Value>) -> Result<()> {
    Compare::new().run(&first.into(), &second.into())
}

/// Compare two values under an explicit option set.
pub fn compare_with(
    first: impl Into<Value>,
    second: impl Into<Value>,
    options: CompareOptions,
) -> Result<()> {
    Compare::new().options(options).run(&first.into(), &second.into())
}

/// Report for two values, or `None` when they are equal.
pub fn describe(first: impl Into<Value>, second: impl Into<Value>) -> Result<Option<String>> {
    Compare::new().describe(&first.into(), &second.into())
}
