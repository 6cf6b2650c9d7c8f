use glam::DVec3;
use thiserror::Error;

/// Invalid construction input for a simulation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("body {index} has non-positive mass {mass}")]
    NonPositiveMass { index: usize, mass: f64 },
    #[error("{what} is not finite")]
    NonFiniteValue { what: String },
    #[error("softening constant must be >= 0, got {0}")]
    NegativeSoftening(f64),
}

/// A point mass in the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub label: Option<String>,
    pub mass: f64,
    pub pos: DVec3,
    pub vel: DVec3,
    /// Result of the last acceleration pass. Stale right after a position update.
    pub acc: DVec3,
}

impl Body {
    /// Create an unlabeled body with zero acceleration
    pub fn new(mass: f64, pos: DVec3, vel: DVec3) -> Self {
        Self {
            label: None,
            mass,
            pos,
            vel,
            acc: DVec3::ZERO,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check the construction invariants for the body at `index`
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let name = self
            .label
            .clone()
            .unwrap_or_else(|| format!("#{}", index));

        if !self.mass.is_finite() {
            return Err(ConfigError::NonFiniteValue {
                what: format!("mass of body {}", name),
            });
        }
        if self.mass <= 0.0 {
            return Err(ConfigError::NonPositiveMass {
                index,
                mass: self.mass,
            });
        }
        for (field, v) in [
            ("position", self.pos),
            ("velocity", self.vel),
            ("acceleration", self.acc),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    what: format!("{} of body {}", field, name),
                });
            }
        }
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.vel.length()
    }
}

/// Scalar configuration, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub gravitational_constant: f64,
    pub timestep: f64,
    pub softening_constant: f64,
}

impl Params {
    pub fn new(
        gravitational_constant: f64,
        timestep: f64,
        softening_constant: f64,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            gravitational_constant,
            timestep,
            softening_constant,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (what, v) in [
            ("gravitational constant", self.gravitational_constant),
            ("timestep", self.timestep),
            ("softening constant", self.softening_constant),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    what: what.to_string(),
                });
            }
        }
        if self.softening_constant < 0.0 {
            return Err(ConfigError::NegativeSoftening(self.softening_constant));
        }
        Ok(())
    }
}

impl Default for Params {
    /// AU / year / solar-mass units
    fn default() -> Self {
        Self {
            gravitational_constant: 39.5,
            timestep: 0.008,
            softening_constant: 0.15,
        }
    }
}
