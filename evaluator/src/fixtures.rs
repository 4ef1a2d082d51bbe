//! Static expression fixtures shared by calculator harness suites.
//!
//! The lists are fixed for the life of the process: every call returns the
//! same expressions in the same order.

/// Well-formed expressions paired with the value a correct calculator
/// returns for them. The first four mirror the mock's built-in table.
const VALID_CASES: &[(&str, f64)] = &[
    ("2 + 3", 5.0),
    ("10 - 4", 6.0),
    ("3 * 4", 12.0),
    ("15 / 3", 5.0),
    ("7 + 0", 7.0),
    ("100 - 58", 42.0),
];

/// Expressions a calculator must reject.
const INVALID_EXPRESSIONS: &[&str] = &["10 / 0", "2 +", "abc", "", "1 ** 2"];

/// Expressions exercising precedence and grouping.
const COMPLEX_EXPRESSIONS: &[&str] = &[
    "(2 + 3) * 4",
    "10 / (5 - 3)",
    "2 + 3 * 4 - 1",
    "((1 + 2) * (3 + 4))",
];

pub fn valid_expressions() -> Vec<&'static str> {
    VALID_CASES.iter().map(|(expression, _)| *expression).collect()
}

/// Valid expressions with their expected values, for programming mocks
/// mechanically.
pub fn valid_cases() -> &'static [(&'static str, f64)] {
    VALID_CASES
}

pub fn invalid_expressions() -> Vec<&'static str> {
    INVALID_EXPRESSIONS.to_vec()
}

pub fn complex_expressions() -> Vec<&'static str> {
    COMPLEX_EXPRESSIONS.to_vec()
}
