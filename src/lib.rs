//! Harmonic-oscillator molecular dynamics.
//!
//! A single particle bound to a 1-D harmonic potential, with three
//! operations over it: an energy/force scan across a coordinate range,
//! a steepest-descent geometry minimization, and velocity-Verlet
//! Newtonian dynamics. Every operation records its path as an ordered,
//! append-only trajectory of frames for later plotting or inspection.

pub mod config;
pub mod error;
pub mod integrate;
pub mod minimize;
pub mod potential;
pub mod scan;
pub mod system;
pub mod trajectory;
pub mod units;

pub use error::{MdError, Result};
pub use integrate::{run_dynamics, DynamicsRun, Integrator, VelocityVerlet};
pub use minimize::{GradientDescent, MinimizationResult};
pub use potential::{EnergyModel, Evaluation, HarmonicOscillator};
pub use scan::{scan_points, scan_step};
pub use system::{Particle, ParticleSystem};
pub use trajectory::{Frame, KahanAdder, Trajectory};
