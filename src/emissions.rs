//! Default tailpipe+upstream emission factors (kg CO2e per km) used when a
//! vehicle states a fuel type but no explicit factor.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EmissionFactors {
    defaults: HashMap<String, f64>,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert("diesel".to_string(), 0.27);
        defaults.insert("petrol".to_string(), 0.25);
        defaults.insert("cng".to_string(), 0.20);
        defaults.insert("ev".to_string(), 0.05);
        defaults.insert("unknown".to_string(), 0.25);
        EmissionFactors { defaults }
    }
}

impl EmissionFactors {
    /// Factor for a fuel type; an explicit fallback always wins.
    pub fn factor_for(&self, fuel: Option<&str>, fallback: Option<f64>) -> f64 {
        if let Some(explicit) = fallback {
            return explicit;
        }
        let key = fuel.unwrap_or("unknown").to_lowercase();
        self.defaults
            .get(&key)
            .copied()
            .unwrap_or(self.defaults["unknown"])
    }
}

/// kg CO2e over a distance.
pub fn estimate_kg(distance_km: f64, factor_kg_per_km: f64) -> f64 {
    distance_km * factor_kg_per_km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_factor_wins_over_fuel_lookup() {
        let factors = EmissionFactors::default();
        assert_eq!(factors.factor_for(Some("diesel"), Some(0.31)), 0.31);
        assert_eq!(factors.factor_for(Some("diesel"), None), 0.27);
        assert_eq!(factors.factor_for(Some("EV"), None), 0.05);
        assert_eq!(factors.factor_for(None, None), 0.25);
        assert_eq!(factors.factor_for(Some("hydrogen"), None), 0.25);
    }

    #[test]
    fn estimate_scales_linearly() {
        assert_eq!(estimate_kg(100.0, 0.27), 27.0);
        assert_eq!(estimate_kg(0.0, 0.27), 0.0);
    }
}
