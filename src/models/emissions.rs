// Emissions value objects: activity quantities in, CO2e estimate out.
// All request-scoped; nothing here has identity beyond one calculation.

use serde::{Deserialize, Serialize};

/// Aggregated quantities of each tracked emission-causing activity.
///
/// All quantities are non-negative and default to zero; the aggregator only
/// ever adds to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityVector {
    /// Coal burned, tonnes.
    #[serde(default)]
    pub coal: f64,
    /// Diesel burned, litres.
    #[serde(default)]
    pub diesel: f64,
    /// Grid electricity consumed, kWh.
    #[serde(default)]
    pub electricity: f64,
    /// Clinker produced (limestone calcination process emission), tonnes.
    #[serde(default)]
    pub clinker: f64,
    /// Freight moved, tonnes. Only meaningful together with the distance.
    #[serde(default)]
    pub transport_tonnes: f64,
    /// Freight haul distance, km.
    #[serde(default)]
    pub transport_distance_km: f64,
}

/// One line of the per-source breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionEntry {
    pub source: String,
    pub quantity: f64,
    pub unit: String,
    pub co2_kg: f64,
}

/// Result of one calculator run. `total_co2_kg` is always the exact sum of
/// the breakdown entries; no rounding happens before presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionResult {
    #[serde(rename = "totalCO2_kg")]
    pub total_co2_kg: f64,
    #[serde(rename = "totalCO2_ton")]
    pub total_co2_ton: f64,
    pub breakdown: Vec<EmissionEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_vector_defaults_to_zero() {
        let vector: ActivityVector = serde_json::from_str("{}").unwrap();
        assert_eq!(vector, ActivityVector::default());
        assert_eq!(vector.coal, 0.0);
        assert_eq!(vector.transport_distance_km, 0.0);
    }

    #[test]
    fn result_uses_legacy_total_keys() {
        let result = EmissionResult {
            total_co2_kg: 1000.0,
            total_co2_ton: 1.0,
            breakdown: vec![],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["totalCO2_kg"], 1000.0);
        assert_eq!(value["totalCO2_ton"], 1.0);
    }
}
