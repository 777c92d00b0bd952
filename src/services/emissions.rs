// Emissions Calculator
// Pure arithmetic over an activity vector: quantity x fixed emission factor,
// with a per-source breakdown. The factor table is injected configuration,
// never inline literals inside the calculation.

use serde_json::Value;

use crate::models::{ActivityVector, EmissionEntry, EmissionResult};
use crate::services::erp::RawRecord;

// ============================================================================
// Emission Factor Table
// ============================================================================

/// Fixed emission factors (CPCB reference values for Indian cement plants).
///
/// Immutable after startup; `from_env` allows a deployment to pin updated
/// factors without a code change.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactors {
    /// kg CO2 per tonne of coal burned.
    pub coal_kg_per_tonne: f64,
    /// kg CO2 per litre of diesel burned.
    pub diesel_kg_per_litre: f64,
    /// kg CO2 per kWh of grid electricity.
    pub electricity_kg_per_kwh: f64,
    /// kg CO2 per tonne of clinker (limestone calcination process emission).
    pub calcination_kg_per_tonne: f64,
    /// kg CO2 per tonne-km of road freight.
    pub transport_kg_per_tonne_km: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            coal_kg_per_tonne: 2460.0,
            diesel_kg_per_litre: 2.68,
            electricity_kg_per_kwh: 0.82,
            calcination_kg_per_tonne: 440.0,
            transport_kg_per_tonne_km: 0.10,
        }
    }
}

impl EmissionFactors {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            coal_kg_per_tonne: env_factor("EF_COAL_KG_PER_TONNE", defaults.coal_kg_per_tonne),
            diesel_kg_per_litre: env_factor("EF_DIESEL_KG_PER_LITRE", defaults.diesel_kg_per_litre),
            electricity_kg_per_kwh: env_factor(
                "EF_ELECTRICITY_KG_PER_KWH",
                defaults.electricity_kg_per_kwh,
            ),
            calcination_kg_per_tonne: env_factor(
                "EF_CALCINATION_KG_PER_TONNE",
                defaults.calcination_kg_per_tonne,
            ),
            transport_kg_per_tonne_km: env_factor(
                "EF_TRANSPORT_KG_PER_TONNE_KM",
                defaults.transport_kg_per_tonne_km,
            ),
        }
    }
}

fn env_factor(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Activity Keyword Matching
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityCategory {
    Coal,
    Diesel,
    Electricity,
    Clinker,
}

#[derive(Debug, Clone)]
struct KeywordRule {
    category: ActivityCategory,
    keywords: Vec<String>,
}

/// Maps purchase-line product labels onto activity categories.
///
/// Best-effort heuristic, not authoritative accounting: case-insensitive
/// substring match, first matching rule wins, one category per record. No
/// synonym or language handling. The rule table is pluggable so deployments
/// can extend it without touching the calculator.
#[derive(Debug, Clone)]
pub struct ActivityMatcher {
    rules: Vec<KeywordRule>,
}

impl Default for ActivityMatcher {
    fn default() -> Self {
        Self::new(vec![
            (ActivityCategory::Coal, vec!["coal".to_string()]),
            (ActivityCategory::Diesel, vec!["diesel".to_string()]),
            (ActivityCategory::Electricity, vec!["electric".to_string()]),
            (ActivityCategory::Clinker, vec!["clinker".to_string()]),
        ])
    }
}

impl ActivityMatcher {
    pub fn new(rules: Vec<(ActivityCategory, Vec<String>)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(category, keywords)| KeywordRule {
                    category,
                    keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
                })
                .collect(),
        }
    }

    pub fn classify(&self, product_label: &str) -> Option<ActivityCategory> {
        let label = product_label.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| label.contains(k.as_str())))
            .map(|rule| rule.category)
    }
}

// ============================================================================
// Emissions Service
// ============================================================================

#[derive(Debug, Clone)]
pub struct EmissionsService {
    factors: EmissionFactors,
    matcher: ActivityMatcher,
}

impl EmissionsService {
    pub fn new(factors: EmissionFactors) -> Self {
        Self {
            factors,
            matcher: ActivityMatcher::default(),
        }
    }

    pub fn with_matcher(factors: EmissionFactors, matcher: ActivityMatcher) -> Self {
        Self { factors, matcher }
    }

    /// Deterministic, side-effect-free CO2e estimate.
    ///
    /// Categories with zero quantity are omitted from the breakdown rather
    /// than reported as zero lines. Transport needs both tonnage and
    /// distance; missing either produces no transport entry.
    pub fn calculate(&self, activity: &ActivityVector) -> EmissionResult {
        let mut breakdown = Vec::new();

        if activity.coal > 0.0 {
            breakdown.push(entry(
                "Coal",
                activity.coal,
                "t",
                activity.coal * self.factors.coal_kg_per_tonne,
            ));
        }

        if activity.diesel > 0.0 {
            breakdown.push(entry(
                "Diesel",
                activity.diesel,
                "L",
                activity.diesel * self.factors.diesel_kg_per_litre,
            ));
        }

        if activity.electricity > 0.0 {
            breakdown.push(entry(
                "Electricity",
                activity.electricity,
                "kWh",
                activity.electricity * self.factors.electricity_kg_per_kwh,
            ));
        }

        if activity.clinker > 0.0 {
            breakdown.push(entry(
                "Calcination",
                activity.clinker,
                "t clinker",
                activity.clinker * self.factors.calcination_kg_per_tonne,
            ));
        }

        if activity.transport_tonnes > 0.0 && activity.transport_distance_km > 0.0 {
            let tonne_km = activity.transport_tonnes * activity.transport_distance_km;
            breakdown.push(entry(
                "Transport",
                tonne_km,
                "tonne·km",
                tonne_km * self.factors.transport_kg_per_tonne_km,
            ));
        }

        let total_co2_kg: f64 = breakdown.iter().map(|e| e.co2_kg).sum();

        EmissionResult {
            total_co2_kg,
            total_co2_ton: total_co2_kg / 1000.0,
            breakdown,
        }
    }

    /// Aggregate raw purchase-line records into an activity vector by
    /// keyword-matching the product label.
    ///
    /// Tolerates any record shape: records without a recognizable product
    /// label or quantity simply contribute nothing.
    pub fn aggregate_purchases(&self, records: &[RawRecord]) -> ActivityVector {
        let mut activity = ActivityVector::default();

        for record in records {
            let Some(label) = product_label(&record.payload) else {
                continue;
            };
            let qty = quantity(&record.payload);
            if qty <= 0.0 {
                continue;
            }

            match self.matcher.classify(&label) {
                Some(ActivityCategory::Coal) => activity.coal += qty,
                Some(ActivityCategory::Diesel) => activity.diesel += qty,
                Some(ActivityCategory::Electricity) => activity.electricity += qty,
                Some(ActivityCategory::Clinker) => activity.clinker += qty,
                None => {}
            }
        }

        activity
    }
}

fn entry(source: &str, quantity: f64, unit: &str, co2_kg: f64) -> EmissionEntry {
    EmissionEntry {
        source: source.to_string(),
        quantity,
        unit: unit.to_string(),
        co2_kg,
    }
}

/// Product label from either backend shape: Odoo returns `product_id` as a
/// `[id, display_name]` pair, ERPNext flattens to `item_name`.
fn product_label(payload: &Value) -> Option<String> {
    if let Some(pair) = payload.get("product_id").and_then(|v| v.as_array()) {
        if let Some(name) = pair.get(1).and_then(|v| v.as_str()) {
            return Some(name.to_string());
        }
    }
    payload
        .get("item_name")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn quantity(payload: &Value) -> f64 {
    for key in ["product_uom_qty", "product_qty", "qty"] {
        if let Some(q) = payload.get(key).and_then(|v| v.as_f64()) {
            return q;
        }
    }
    0.0
}

// ============================================================================
// Tests
// ============================================================================
