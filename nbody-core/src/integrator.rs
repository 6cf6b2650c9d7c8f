use crate::engine::{Body, ConfigError, Params};
use glam::DVec3;
use thiserror::Error;

/// Reported by [`Integrator::check_finite`] once the state has blown up
#[derive(Debug, Error, Clone, PartialEq)]
#[error("integrator diverged: {field} of body {index} is {value:?}")]
pub struct DivergenceError {
    pub index: usize,
    pub field: &'static str,
    pub value: DVec3,
}

/// Fixed-timestep softened-gravity integrator
///
/// Owns the live body collection and a copy of the bodies it was built from,
/// which [`Integrator::reset`] restores.
#[derive(Debug, Clone)]
pub struct Integrator {
    params: Params,
    initial: Vec<Body>,
    bodies: Vec<Body>,
}

impl Integrator {
    pub fn new(params: Params, bodies: &[Body]) -> Result<Self, ConfigError> {
        params.validate()?;
        validate_bodies(bodies)?;

        Ok(Self {
            params,
            initial: bodies.to_vec(),
            bodies: bodies.to_vec(),
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn initial_bodies(&self) -> &[Body] {
        &self.initial
    }

    /// Advance the system by exactly one timestep.
    ///
    /// The order is load-bearing: accelerations must see the new positions and
    /// velocities must see the new accelerations (semi-implicit Euler).
    pub fn step(&mut self) {
        self.advance_positions();
        self.recompute_accelerations();
        self.advance_velocities();
    }

    /// `pos += vel * dt` for every body
    pub fn advance_positions(&mut self) {
        let dt = self.params.timestep;
        for body in &mut self.bodies {
            body.pos += body.vel * dt;
        }
    }

    /// Overwrite every body's acceleration with the pairwise sum from all
    /// other bodies at their current positions.
    ///
    /// Softening only enters under the square root:
    /// `f = G * m_j / (r2 * sqrt(r2 + softening))`.
    pub fn recompute_accelerations(&mut self) {
        let g = self.params.gravitational_constant;
        let softening = self.params.softening_constant;
        let n = self.bodies.len();

        for i in 0..n {
            let pos_i = self.bodies[i].pos;
            let mut acc = DVec3::ZERO;

            for j in 0..n {
                if j == i {
                    continue;
                }
                let other = &self.bodies[j];
                let dx = other.pos.x - pos_i.x;
                let dy = other.pos.y - pos_i.y;
                let dz = other.pos.z - pos_i.z;
                let dist_sq = dx * dx + dy * dy + dz * dz;
                let f = g * other.mass / (dist_sq * (dist_sq + softening).sqrt());

                acc.x += dx * f;
                acc.y += dy * f;
                acc.z += dz * f;
            }

            self.bodies[i].acc = acc;
        }
    }

    /// `vel += acc * dt` for every body
    pub fn advance_velocities(&mut self) {
        let dt = self.params.timestep;
        for body in &mut self.bodies {
            body.vel += body.acc * dt;
        }
    }

    /// Optional post-step diagnostic. Never modifies state.
    pub fn check_finite(&self) -> Result<(), DivergenceError> {
        for (index, body) in self.bodies.iter().enumerate() {
            for (field, value) in [
                ("position", body.pos),
                ("velocity", body.vel),
                ("acceleration", body.acc),
            ] {
                if !value.is_finite() {
                    return Err(DivergenceError { index, field, value });
                }
            }
        }
        Ok(())
    }

    /// Discard all live state and start over from the retained initial bodies
    pub fn reset(&mut self) {
        self.bodies = self.initial.clone();
    }

    /// Replace the initial bodies and reset to them
    pub fn reset_with(&mut self, bodies: &[Body]) -> Result<(), ConfigError> {
        validate_bodies(bodies)?;
        self.initial = bodies.to_vec();
        self.reset();
        Ok(())
    }
}

fn validate_bodies(bodies: &[Body]) -> Result<(), ConfigError> {
    bodies
        .iter()
        .enumerate()
        .try_for_each(|(i, body)| body.validate(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(g: f64, dt: f64, softening: f64) -> Params {
        Params::new(g, dt, softening).unwrap()
    }

    #[test]
    fn single_body_has_zero_acceleration() {
        for softening in [0.0, 0.15, 10.0] {
            let body = Body::new(1.0, DVec3::new(1.0, 2.0, 3.0), DVec3::X);
            let mut integrator = Integrator::new(params(39.5, 0.01, softening), &[body]).unwrap();
            integrator.recompute_accelerations();
            assert_eq!(integrator.bodies()[0].acc, DVec3::ZERO);
        }
    }

    #[test]
    fn accelerations_are_overwritten_not_accumulated() {
        let a = Body::new(1.0, DVec3::ZERO, DVec3::ZERO);
        let b = Body::new(1.0, DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO);
        let mut integrator = Integrator::new(params(1.0, 0.01, 0.0), &[a, b]).unwrap();

        integrator.recompute_accelerations();
        let first = integrator.bodies()[0].acc;
        integrator.recompute_accelerations();
        assert_eq!(integrator.bodies()[0].acc, first);
    }

    #[test]
    fn softening_only_enters_under_the_root() {
        let a = Body::new(1.0, DVec3::ZERO, DVec3::ZERO);
        let b = Body::new(2.0, DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO);
        let mut integrator = Integrator::new(params(1.0, 0.01, 0.5), &[a, b]).unwrap();
        integrator.recompute_accelerations();

        // f = 1 * 2 / (4 * sqrt(4.5)), acc = 2 * f
        let expected = 2.0 * (2.0 / (4.0 * 4.5_f64.sqrt()));
        assert_eq!(integrator.bodies()[0].acc, DVec3::new(expected, 0.0, 0.0));
    }

    #[test]
    fn positions_use_velocity_from_before_the_step() {
        let a = Body::new(1.0, DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        let b = Body::new(1.0, DVec3::new(5.0, 0.0, 0.0), DVec3::ZERO);
        let mut integrator = Integrator::new(params(1.0, 0.1, 0.0), &[a, b]).unwrap();
        integrator.step();
        assert_eq!(integrator.bodies()[0].pos.x, 0.1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let a = Body::new(1.0, DVec3::ZERO, DVec3::Y);
        let b = Body::new(1e-3, DVec3::X, DVec3::ZERO);
        let mut integrator = Integrator::new(params(39.5, 0.008, 0.15), &[a, b]).unwrap();
        let before = integrator.bodies().to_vec();

        for _ in 0..50 {
            integrator.step();
        }
        assert_ne!(integrator.bodies(), before.as_slice());

        integrator.reset();
        assert_eq!(integrator.bodies(), before.as_slice());
    }

    #[test]
    fn reset_with_rejects_invalid_bodies_and_keeps_state() {
        let a = Body::new(1.0, DVec3::ZERO, DVec3::ZERO);
        let mut integrator = Integrator::new(params(1.0, 0.01, 0.0), &[a.clone()]).unwrap();

        let bad = Body::new(-1.0, DVec3::ZERO, DVec3::ZERO);
        assert!(integrator.reset_with(&[bad]).is_err());
        assert_eq!(integrator.initial_bodies(), &[a]);
    }

    #[test]
    fn check_finite_reports_first_bad_body() {
        // Coincident bodies with no softening divide by zero
        let a = Body::new(1.0, DVec3::ZERO, DVec3::ZERO);
        let b = Body::new(1.0, DVec3::ZERO, DVec3::ZERO);
        let mut integrator = Integrator::new(params(1.0, 0.01, 0.0), &[a, b]).unwrap();
        assert!(integrator.check_finite().is_ok());

        integrator.step();
        let err = integrator.check_finite().unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.field, "velocity");
    }
}
