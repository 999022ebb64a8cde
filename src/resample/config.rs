// navrs-transect/src/resample/config.rs

use super::errors::{ResampleConfigBuilderError, ResampleError};
use crate::field::DEFAULT_FILL_VALUE;
use std::str::FromStr;

pub const DEFAULT_NEIGHBOURS: usize = 10;
pub const DEFAULT_RADIUS_OF_INFLUENCE: f64 = 500_000.0;
pub const DEFAULT_NPROCS: usize = 4;

/// How source samples are weighted when resampling onto a target point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResampleMethod {
    /// Weights `1 / r^power`.
    InverseDistance { power: f64 },
    /// Weights `exp(-r^2 / sigma^2)`; sigma defaults to half the radius of influence.
    Gaussian { sigma: Option<f64> },
    /// The closest valid source sample.
    Nearest,
}

impl Default for ResampleMethod {
    fn default() -> Self {
        ResampleMethod::InverseDistance { power: 2.0 }
    }
}

impl FromStr for ResampleMethod {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inverse" => Ok(ResampleMethod::InverseDistance { power: 2.0 }),
            "bilinear" => Ok(ResampleMethod::InverseDistance { power: 1.0 }),
            "gaussian" => Ok(ResampleMethod::Gaussian { sigma: None }),
            "nearest" => Ok(ResampleMethod::Nearest),
            _ => Err(ResampleError::InvalidConfiguration(s.to_string())),
        }
    }
}

impl ResampleMethod {
    /// Weight of a source sample `distance` meters away.
    pub fn weight(&self, distance: f64, radius_of_influence: f64) -> f64 {
        let r = distance.max(f64::EPSILON);
        match self {
            ResampleMethod::InverseDistance { power } => 1.0 / r.powf(*power),
            ResampleMethod::Gaussian { sigma } => {
                let sigma = sigma.unwrap_or(radius_of_influence / 2.0);
                (-(r * r) / (sigma * sigma)).exp()
            }
            ResampleMethod::Nearest => 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResampleConfig {
    pub method: ResampleMethod,
    pub neighbours: usize,
    /// Meters.
    pub radius_of_influence: f64,
    pub nprocs: usize,
    pub fill_value: f64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            method: ResampleMethod::default(),
            neighbours: DEFAULT_NEIGHBOURS,
            radius_of_influence: DEFAULT_RADIUS_OF_INFLUENCE,
            nprocs: DEFAULT_NPROCS,
            fill_value: DEFAULT_FILL_VALUE,
        }
    }
}

#[derive(Default)]
pub struct ResampleConfigBuilder {
    method: Option<ResampleMethod>,
    neighbours: Option<usize>,
    radius_of_influence: Option<f64>,
    nprocs: Option<usize>,
    fill_value: Option<f64>,
}

impl ResampleConfigBuilder {
    pub fn build(&self) -> Result<ResampleConfig, ResampleConfigBuilderError> {
        let defaults = ResampleConfig::default();
        let method = self.method.unwrap_or(defaults.method);
        Self::validate_method(&method)?;
        let neighbours = self.neighbours.unwrap_or(defaults.neighbours);
        Self::validate_neighbours(&neighbours)?;
        let radius_of_influence = self
            .radius_of_influence
            .unwrap_or(defaults.radius_of_influence);
        Self::validate_radius(&radius_of_influence)?;
        let nprocs = self.nprocs.unwrap_or(defaults.nprocs);
        Self::validate_nprocs(&nprocs)?;
        Ok(ResampleConfig {
            method,
            neighbours,
            radius_of_influence,
            nprocs,
            fill_value: self.fill_value.unwrap_or(defaults.fill_value),
        })
    }

    fn validate_method(method: &ResampleMethod) -> Result<(), ResampleConfigBuilderError> {
        match *method {
            ResampleMethod::InverseDistance { power } if !(power.is_finite() && power > 0.) => {
                Err(ResampleConfigBuilderError::InvalidPower(power))
            }
            ResampleMethod::Gaussian { sigma: Some(sigma) } if !(sigma.is_finite() && sigma > 0.) => {
                Err(ResampleConfigBuilderError::InvalidSigma(sigma))
            }
            _ => Ok(()),
        }
    }

    fn validate_neighbours(neighbours: &usize) -> Result<(), ResampleConfigBuilderError> {
        if *neighbours < 1 {
            return Err(ResampleConfigBuilderError::InvalidNeighbours(*neighbours));
        }
        Ok(())
    }

    fn validate_radius(radius: &f64) -> Result<(), ResampleConfigBuilderError> {
        if !(radius.is_finite() && *radius > 0.) {
            return Err(ResampleConfigBuilderError::InvalidRadius(*radius));
        }
        Ok(())
    }

    fn validate_nprocs(nprocs: &usize) -> Result<(), ResampleConfigBuilderError> {
        if *nprocs < 1 {
            return Err(ResampleConfigBuilderError::InvalidNprocs(*nprocs));
        }
        Ok(())
    }

    pub fn method(&mut self, method: ResampleMethod) -> &mut Self {
        self.method = Some(method);
        self
    }
    pub fn neighbours(&mut self, neighbours: usize) -> &mut Self {
        self.neighbours = Some(neighbours);
        self
    }
    pub fn radius_of_influence(&mut self, radius: f64) -> &mut Self {
        self.radius_of_influence = Some(radius);
        self
    }
    pub fn nprocs(&mut self, nprocs: usize) -> &mut Self {
        self.nprocs = Some(nprocs);
        self
    }
    pub fn fill_value(&mut self, fill_value: f64) -> &mut Self {
        self.fill_value = Some(fill_value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(
            "inverse".parse::<ResampleMethod>().unwrap(),
            ResampleMethod::InverseDistance { power: 2.0 }
        );
        assert_eq!(
            "bilinear".parse::<ResampleMethod>().unwrap(),
            ResampleMethod::InverseDistance { power: 1.0 }
        );
        assert_eq!(
            "Gaussian".parse::<ResampleMethod>().unwrap(),
            ResampleMethod::Gaussian { sigma: None }
        );
        assert_eq!(
            "nearest".parse::<ResampleMethod>().unwrap(),
            ResampleMethod::Nearest
        );
    }

    #[test]
    fn test_unknown_method_is_invalid_configuration() {
        let result = "fake_method".parse::<ResampleMethod>();
        assert!(matches!(result, Err(ResampleError::InvalidConfiguration(ref name)) if name == "fake_method"));
    }

    #[test]
    fn test_weights() {
        let inverse = ResampleMethod::InverseDistance { power: 2.0 };
        assert!((inverse.weight(10.0, 500.0) - 0.01).abs() < 1e-12);
        assert!(inverse.weight(0.0, 500.0).is_finite());
        let gaussian = ResampleMethod::Gaussian { sigma: None };
        assert!((gaussian.weight(250.0, 500.0) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_builder_defaults() {
        let config = ResampleConfigBuilder::default().build().unwrap();
        assert_eq!(config, ResampleConfig::default());
        assert_eq!(config.neighbours, 10);
        assert_eq!(config.radius_of_influence, 500_000.0);
        assert_eq!(config.nprocs, 4);
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(
            ResampleConfigBuilder::default().neighbours(0).build(),
            Err(ResampleConfigBuilderError::InvalidNeighbours(0))
        ));
        assert!(matches!(
            ResampleConfigBuilder::default().radius_of_influence(-1.0).build(),
            Err(ResampleConfigBuilderError::InvalidRadius(_))
        ));
        assert!(matches!(
            ResampleConfigBuilder::default().nprocs(0).build(),
            Err(ResampleConfigBuilderError::InvalidNprocs(0))
        ));
        assert!(matches!(
            ResampleConfigBuilder::default()
                .method(ResampleMethod::InverseDistance { power: 0.0 })
                .build(),
            Err(ResampleConfigBuilderError::InvalidPower(_))
        ));
    }
}
