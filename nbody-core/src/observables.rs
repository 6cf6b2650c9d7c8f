//! Read-only physical quantities derived from a body collection
//!
//! The potential uses the same softening placement as the force law,
//! `-G m_i m_j / sqrt(r^2 + softening)`, so energy checks stay consistent with
//! what the integrator actually computes.

use crate::engine::{Body, Params};
use glam::DVec3;

pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies
        .iter()
        .map(|b| 0.5 * b.mass * b.vel.length_squared())
        .sum()
}

pub fn potential_energy(bodies: &[Body], params: &Params) -> f64 {
    let g = params.gravitational_constant;
    let mut energy = 0.0;
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            let dist_sq = (b.pos - a.pos).length_squared();
            energy -= g * a.mass * b.mass / (dist_sq + params.softening_constant).sqrt();
        }
    }
    energy
}

pub fn total_energy(bodies: &[Body], params: &Params) -> f64 {
    kinetic_energy(bodies) + potential_energy(bodies, params)
}

pub fn total_momentum(bodies: &[Body]) -> DVec3 {
    bodies.iter().map(|b| b.vel * b.mass).sum()
}

/// Mass-weighted mean position, or the origin for an empty slice
pub fn center_of_mass(bodies: &[Body]) -> DVec3 {
    let total_mass: f64 = bodies.iter().map(|b| b.mass).sum();
    if total_mass == 0.0 {
        return DVec3::ZERO;
    }
    bodies.iter().map(|b| b.pos * b.mass).sum::<DVec3>() / total_mass
}
