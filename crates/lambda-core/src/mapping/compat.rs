//! Cross-type attribute compatibility.
//!
//! A returned value of a function attribute may only be stored in a task
//! attribute when the directed pair of input types allows it. The pairs are
//! listed explicitly in [`RULES`]; there is no type hierarchy.
use lambda_model::InputType;

/// What a value must satisfy for a given `(function, task)` type pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Never,
    Always,
    /// Non-empty and made of digits only.
    Numeric,
    /// Literally `true` or `false`.
    Boolean,
    /// No whitespace inside.
    SingleToken,
}

use Rule::{Always, Boolean, Never, Numeric, SingleToken};

// Rows: function type. Columns: task type. Order follows `index`.
const RULES: [[Rule; 5]; 5] = [
    //            number   checkbox  select       radio        text
    /* number   */ [Numeric, Never, Numeric, Numeric, Numeric],
    /* checkbox */ [Never, Boolean, Never, Never, Never],
    /* select   */ [Never, Never, Always, Always, Always],
    /* radio    */ [Never, Never, Always, Always, Always],
    /* text     */ [Never, Never, SingleToken, SingleToken, Always],
];

fn index(t: InputType) -> usize {
    match t {
        InputType::Number => 0,
        InputType::Checkbox => 1,
        InputType::Select => 2,
        InputType::Radio => 3,
        InputType::Text => 4,
    }
}

/// Whether `value`, declared by the function as `from`, may be stored as `to`.
pub fn is_compatible(value: &str, from: InputType, to: InputType) -> bool {
    match RULES[index(from)][index(to)] {
        Never => false,
        Always => true,
        Numeric => !value.is_empty() && value.chars().all(char::is_numeric),
        Boolean => value == "true" || value == "false",
        SingleToken => !value.chars().any(char::is_whitespace),
    }
}
