//! Newtonian time integration.

use crate::error::{MdError, Result};
use crate::system::ParticleSystem;
use crate::trajectory::Trajectory;

/// A time-stepping scheme advancing the system by one step of size `dt`.
pub trait Integrator {
    fn step(&self, system: &mut ParticleSystem, dt: f64);

    fn name(&self) -> &'static str;
}

/// Velocity-Verlet in momentum form: half-kick, drift, force recompute,
/// half-kick. Symplectic and time-reversible; total energy drifts by
/// O(dt²) per step.
pub struct VelocityVerlet;

impl Integrator for VelocityVerlet {
    fn step(&self, system: &mut ParticleSystem, dt: f64) {
        let mass = system.mass();

        let f0 = system.evaluate().force;
        let p_half = system.momentum() + 0.5 * f0 * dt;
        system.set_position(system.position() + p_half / mass * dt);

        let f1 = system.evaluate().force;
        system.set_momentum(p_half + 0.5 * f1 * dt);
    }

    fn name(&self) -> &'static str {
        "velocity verlet"
    }
}

/// Parameters of one dynamics run.
pub struct DynamicsRun {
    pub dt: f64,
    pub duration: f64,
    /// Record a frame every this many steps.
    pub write_step: usize,
    /// Print the step counter every this many steps, if set.
    pub stdout_step: Option<usize>,
}

/// Advance the system for `duration` simulated time from its current
/// state, recording a frame at t = 0 and every `write_step` steps. The
/// final state is always recorded.
pub fn run_dynamics<I: Integrator>(
    system: &mut ParticleSystem,
    integrator: &I,
    run: &DynamicsRun,
) -> Result<Trajectory> {
    if !run.dt.is_finite() || run.dt <= 0.0 {
        return Err(MdError::InvalidParameter(format!(
            "timestep must be finite and positive, got {}",
            run.dt
        )));
    }
    if !run.duration.is_finite() || run.duration <= 0.0 {
        return Err(MdError::InvalidParameter(format!(
            "duration must be finite and positive, got {}",
            run.duration
        )));
    }
    if run.write_step == 0 {
        return Err(MdError::InvalidParameter(
            "write step must be at least 1".to_string(),
        ));
    }

    let step_max = ((run.duration / run.dt).round() as usize).max(1);

    let mut traj = Trajectory::new();
    traj.new_frame(system, 0, 0.0);

    for step in 1..=step_max {
        // run MD step
        integrator.step(system, run.dt);

        // write data to the trajectory
        if step % run.write_step == 0 {
            traj.new_frame(system, step, run.dt * step as f64);
        }

        // print to terminal
        if let Some(stdout_step) = run.stdout_step {
            if step % stdout_step == 0 {
                println!("{}", step);
            }
        }
    }

    if step_max % run.write_step != 0 {
        traj.new_frame(system, step_max, run.dt * step_max as f64);
    }

    Ok(traj)
}
