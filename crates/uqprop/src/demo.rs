//! Coffee cup cooling demo model.
//!
//! Newton's law of cooling, `dT/dt = kappa (T - u_env)`, solved in closed form
//! on a fixed time grid.

use uqprop_core::{
    FeatureSet, FeatureValue, FnFeature, Model, ModelError, ModelOutput, Parameter, ParameterVector,
};

pub const INITIAL_TEMPERATURE: f64 = 95.0;
pub const END_TIME: f64 = 200.0;
pub const TIME_STEPS: usize = 150;
/// Temperature below which the coffee is drinkable.
pub const DRINKABLE: f64 = 60.0;

pub struct CoffeeCup {
    time: Vec<f64>,
}

impl CoffeeCup {
    pub fn new() -> Self {
        let dt = END_TIME / (TIME_STEPS - 1) as f64;
        Self {
            time: (0..TIME_STEPS).map(|i| i as f64 * dt).collect(),
        }
    }

    /// Nominal parameters with no distributions.
    pub fn parameters() -> Vec<Parameter> {
        vec![Parameter::new("kappa", -0.01), Parameter::new("u_env", 20.0)]
    }

    pub fn features() -> FeatureSet {
        FeatureSet::new()
            .with(FnFeature::new("final_temperature", final_temperature))
            .with(FnFeature::new("time_to_drinkable", time_to_drinkable))
    }
}

impl Default for CoffeeCup {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for CoffeeCup {
    fn name(&self) -> &str {
        "coffee_cup"
    }

    fn run(&self, parameters: &ParameterVector) -> Result<ModelOutput, ModelError> {
        let kappa = parameters
            .get("kappa")
            .ok_or_else(|| ModelError::failed("missing parameter kappa"))?;
        let u_env = parameters
            .get("u_env")
            .ok_or_else(|| ModelError::failed("missing parameter u_env"))?;

        let values = self
            .time
            .iter()
            .map(|t| u_env + (INITIAL_TEMPERATURE - u_env) * (kappa * t).exp())
            .collect();
        Ok(ModelOutput::new(self.time.clone(), values))
    }
}

fn final_temperature(output: &ModelOutput) -> Result<FeatureValue, ModelError> {
    output
        .values
        .last()
        .copied()
        .map(FeatureValue::Scalar)
        .ok_or_else(|| ModelError::Feature {
            feature: "final_temperature".to_string(),
            reason: "empty output".to_string(),
        })
}

fn time_to_drinkable(output: &ModelOutput) -> Result<FeatureValue, ModelError> {
    let time = output.time.as_deref().unwrap_or_default();
    output
        .values
        .iter()
        .zip(time)
        .find(|(temperature, _)| **temperature <= DRINKABLE)
        .map(|(_, &t)| FeatureValue::Scalar(t))
        .ok_or_else(|| ModelError::Feature {
            feature: "time_to_drinkable".to_string(),
            reason: format!("never cools below {DRINKABLE}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(kappa: f64, u_env: f64) -> ModelOutput {
        let params = ParameterVector::new(vec!["kappa".into(), "u_env".into()], vec![kappa, u_env]);
        CoffeeCup::new().run(&params).unwrap()
    }

    #[test]
    fn test_cooling_curve() {
        let output = run(-0.01, 20.0);
        assert_eq!(output.values.len(), TIME_STEPS);
        assert_eq!(output.values[0], INITIAL_TEMPERATURE);
        let expected_final = 20.0 + 75.0 * (-2.0f64).exp();
        assert!((output.values[TIME_STEPS - 1] - expected_final).abs() < 1e-10);
    }

    #[test]
    fn test_features() {
        let output = run(-0.01, 20.0);
        let FeatureValue::Scalar(t) = time_to_drinkable(&output).unwrap() else {
            panic!("expected scalar");
        };
        // Crosses 60 degrees at ln(40 / 75) / -0.01 ~ 62.9
        assert!(t > 62.0 && t < 64.5, "t = {t}");

        let warm = run(-0.001, 20.0);
        assert!(time_to_drinkable(&warm).is_err());
        assert!(final_temperature(&warm).is_ok());
    }
}
