//! Conversion of numeric results into serialisable optional values.
//!
//! Undefined indicator values and non-finite floats become `None`, which the
//! report writers render as JSON `null` or an empty CSV cell.

use super::indicator::IndicatorValue;

pub fn sanitize(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn sanitize_value(value: IndicatorValue) -> Option<f64> {
    value.value().and_then(sanitize)
}
