//! Linear normalization of raw sensor units into `[0, 1]`.
//!
//! The full-scale constants define the service's output contract and
//! must not drift: clients compare values across nodes.

/// Illuminance mapped to 1.0.
pub const LIGHT_FULL_SCALE_LUX: f64 = 1000.0;
/// Temperature mapped to 1.0 (0 °C maps to 0.0).
pub const TEMPERATURE_FULL_SCALE_C: f64 = 40.0;
/// Acceleration magnitude mapped to 1.0 (about 2 g).
pub const ACCELERATION_FULL_SCALE_MS2: f64 = 20.0;

/// Normalizes illuminance in lux.
pub fn light(lux: f64) -> f64 {
    (lux / LIGHT_FULL_SCALE_LUX).min(1.0).max(0.0)
}

/// Normalizes temperature in degrees Celsius.
pub fn temperature(celsius: f64) -> f64 {
    (celsius / TEMPERATURE_FULL_SCALE_C).clamp(0.0, 1.0)
}

/// Normalizes the magnitude of an acceleration vector in m/s².
pub fn acceleration(axes: [f64; 3]) -> f64 {
    (magnitude(axes) / ACCELERATION_FULL_SCALE_MS2).clamp(0.0, 1.0)
}

/// Euclidean norm of a three-axis vector.
#[inline]
pub fn magnitude([x, y, z]: [f64; 3]) -> f64 {
    (x * x + y * y + z * z).sqrt()
}
