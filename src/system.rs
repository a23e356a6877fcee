//! The simulated particle and the system that owns it.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;

use crate::error::{MdError, Result};
use crate::potential::{EnergyModel, Evaluation};
use crate::units;

/// A point mass on a 1-D coordinate.
#[derive(Debug, Clone)]
pub struct Particle {
    pub atomic_number: u32,
    mass: f64,
    pub x: f64,
    pub p: f64,
}

impl Particle {
    /// Created at the origin, at rest. The mass must be finite and positive.
    pub fn new(atomic_number: u32, mass: f64) -> Result<Particle> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(MdError::InvalidParameter(format!(
                "mass must be finite and positive, got {}",
                mass
            )));
        }
        Ok(Particle {
            atomic_number,
            mass,
            x: 0.0,
            p: 0.0,
        })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Kinetic energy: p²/2m.
    pub fn kinetic_energy(&self) -> f64 {
        self.p * self.p / (2.0 * self.mass)
    }

    /// Element symbol for trajectory output.
    pub fn element(&self) -> &'static str {
        match self.atomic_number {
            1 => "H",
            2 => "He",
            6 => "C",
            7 => "N",
            8 => "O",
            _ => "X",
        }
    }
}

/// One particle bound to one active energy model.
///
/// Scans, minimization and dynamics all mutate the system through this
/// interface; the system lives for the whole run.
pub struct ParticleSystem {
    particle: Particle,
    model: Box<dyn EnergyModel>,
}

impl ParticleSystem {
    pub fn new(particle: Particle, model: Box<dyn EnergyModel>) -> ParticleSystem {
        ParticleSystem { particle, model }
    }

    pub fn particle(&self) -> &Particle {
        &self.particle
    }

    pub fn model(&self) -> &dyn EnergyModel {
        &*self.model
    }

    /// Replace the active energy model.
    pub fn set_model(&mut self, model: Box<dyn EnergyModel>) {
        self.model = model;
    }

    pub fn position(&self) -> f64 {
        self.particle.x
    }

    pub fn set_position(&mut self, x: f64) {
        self.particle.x = x;
    }

    pub fn momentum(&self) -> f64 {
        self.particle.p
    }

    pub fn set_momentum(&mut self, p: f64) {
        self.particle.p = p;
    }

    pub fn mass(&self) -> f64 {
        self.particle.mass()
    }

    /// Draw the momentum from the Maxwell–Boltzmann distribution at
    /// temperature `temp`, using a PRNG seeded with `seed`.
    pub fn set_thermal_momentum(&mut self, temp: f64, seed: u64) -> Result<()> {
        if !temp.is_finite() || temp <= 0.0 {
            return Err(MdError::InvalidParameter(format!(
                "temperature must be finite and positive, got {}",
                temp
            )));
        }
        let sigma = (self.particle.mass() * units::BOLTZMANN * temp).sqrt();
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| MdError::InvalidParameter(format!("thermal momentum: {}", e)))?;
        let mut rng = Pcg64::seed_from_u64(seed);
        self.particle.p = normal.sample(&mut rng);
        Ok(())
    }

    /// Evaluate the active model at the current coordinate.
    pub fn evaluate(&self) -> Evaluation {
        self.model.evaluate(self.particle.x)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.particle.kinetic_energy()
    }

    pub fn total_energy(&self) -> f64 {
        self.evaluate().potential_energy + self.kinetic_energy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potential::HarmonicOscillator;

    fn system(k: f64, mass: f64) -> ParticleSystem {
        let particle = Particle::new(1, mass).unwrap();
        let model = HarmonicOscillator::new(k).unwrap();
        ParticleSystem::new(particle, Box::new(model))
    }

    #[test]
    fn rejects_bad_mass() {
        assert!(Particle::new(1, 0.0).is_err());
        assert!(Particle::new(1, -2.0).is_err());
        assert!(Particle::new(1, f64::NAN).is_err());
    }

    #[test]
    fn kinetic_energy() {
        let mut sys = system(1.0, 2.0);
        sys.set_momentum(2.0);
        assert!((sys.kinetic_energy() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn position_round_trips_exactly() {
        let mut sys = system(1.0, 1.0);
        let x = 0.1 + 0.2;
        sys.set_position(x);
        assert_eq!(sys.position(), x);
    }

    #[test]
    fn total_energy_is_pe_plus_ke() {
        let mut sys = system(2.0, 1.0);
        sys.set_position(1.0);
        sys.set_momentum(1.0);
        // PE = 0.5*2*1 = 1.0, KE = 1/2 = 0.5
        assert!((sys.total_energy() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn thermal_momentum_is_deterministic_for_a_seed() {
        let mut a = system(1.0, 1.0);
        let mut b = system(1.0, 1.0);
        a.set_thermal_momentum(0.5, 42).unwrap();
        b.set_thermal_momentum(0.5, 42).unwrap();
        assert_eq!(a.momentum(), b.momentum());

        let mut c = system(1.0, 1.0);
        c.set_thermal_momentum(0.5, 43).unwrap();
        assert_ne!(a.momentum(), c.momentum());
    }

    #[test]
    fn thermal_momentum_rejects_bad_temperature() {
        let mut sys = system(1.0, 1.0);
        assert!(sys.set_thermal_momentum(0.0, 0).is_err());
        assert!(sys.set_thermal_momentum(-1.0, 0).is_err());
    }

    #[test]
    fn element_symbols() {
        assert_eq!(Particle::new(1, 1.0).unwrap().element(), "H");
        assert_eq!(Particle::new(8, 16.0).unwrap().element(), "O");
        assert_eq!(Particle::new(99, 1.0).unwrap().element(), "X");
    }
}
