//! Threshold rule deciding whether a reading's measurements are outside the
//! accepted clinical ranges.

const CHOLESTEROL_MIN: f64 = 125.0;
const CHOLESTEROL_MAX: f64 = 200.0;
const SUGAR_MIN: f64 = 70.0;
const SUGAR_MAX: f64 = 140.0;
const FEVER_MIN: f64 = 36.0;
const FEVER_MAX: f64 = 37.5;

/// Returns `true` when any of the three measurements falls outside its
/// accepted range.
///
/// Comparisons are strict: a value exactly at a range boundary is in range.
pub fn evaluate(cholesterol: f64, sugar: f64, fever: f64) -> bool {
    cholesterol < CHOLESTEROL_MIN
        || cholesterol > CHOLESTEROL_MAX
        || sugar < SUGAR_MIN
        || sugar > SUGAR_MAX
        || fever < FEVER_MIN
        || fever > FEVER_MAX
}
