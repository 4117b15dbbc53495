//! Temperature unit conversion.
//!
//! Accessories always store and report degrees Celsius. Controllers configured
//! for Fahrenheit are converted once, when a status snapshot is applied.

/// Convert degrees Fahrenheit to degrees Celsius.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) / 1.8
}

/// Convert degrees Celsius to degrees Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Normalize a raw controller reading to Celsius.
///
/// `is_celsius` is the unit flag from the controller config.
pub fn normalize(raw: f64, is_celsius: bool) -> f64 {
    if is_celsius {
        raw
    } else {
        fahrenheit_to_celsius(raw)
    }
}
