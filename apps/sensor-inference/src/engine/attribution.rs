use super::types::FlaggedSensor;
use crate::registry::SensorRegistry;

/// Flags every sensor whose standardized value lies more than `threshold`
/// standard deviations from the fitted mean, in registry order. Independent
/// of the classifier verdict.
pub fn attribute(
    registry: &SensorRegistry,
    standardized: &[f64],
    reading: &[f64],
    threshold: f64,
) -> Vec<FlaggedSensor> {
    registry
        .sensors()
        .iter()
        .zip(standardized.iter().zip(reading))
        .filter(|(_, (z, _))| z.abs() > threshold)
        .map(|(sensor, (_, value))| FlaggedSensor {
            sensor: sensor.clone(),
            value: *value,
        })
        .collect()
}
