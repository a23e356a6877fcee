//! Steepest-descent geometry minimization.

use crate::error::{MdError, Result};
use crate::system::ParticleSystem;
use crate::trajectory::Trajectory;

// line search gives up once the trial step underflows this
const GAMMA_FLOOR: f64 = 1e-16;

/// Gradient descent along the force with a backtracking line search.
pub struct GradientDescent {
    step_size: f64,
    force_tolerance: f64,
    max_steps: usize,
    write_step: usize,
}

/// Outcome of a minimization run. Non-convergence is reported here,
/// never as an error.
pub struct MinimizationResult {
    pub trajectory: Trajectory,
    pub converged: bool,
    pub steps: usize,
    pub final_force: f64,
    pub final_energy: f64,
}

impl GradientDescent {
    pub fn new(
        step_size: f64,
        force_tolerance: f64,
        max_steps: usize,
        write_step: usize,
    ) -> Result<GradientDescent> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(MdError::InvalidParameter(format!(
                "descent step size must be finite and positive, got {}",
                step_size
            )));
        }
        if !force_tolerance.is_finite() || force_tolerance <= 0.0 {
            return Err(MdError::InvalidParameter(format!(
                "force tolerance must be finite and positive, got {}",
                force_tolerance
            )));
        }
        if max_steps == 0 {
            return Err(MdError::InvalidParameter(
                "max steps must be at least 1".to_string(),
            ));
        }
        if write_step == 0 {
            return Err(MdError::InvalidParameter(
                "write step must be at least 1".to_string(),
            ));
        }
        Ok(GradientDescent {
            step_size,
            force_tolerance,
            max_steps,
            write_step,
        })
    }

    /// Drive the system toward the potential minimum. The initial and
    /// final states are always recorded; intermediate states every
    /// `write_step` accepted steps.
    pub fn minimize(&self, system: &mut ParticleSystem) -> MinimizationResult {
        let mut traj = Trajectory::new();
        traj.new_frame(system, 0, 0.0);

        let mut ev = system.evaluate();
        let mut gamma = self.step_size;
        let mut steps = 0;
        let mut converged = ev.force.abs() < self.force_tolerance;

        while !converged && steps < self.max_steps {
            let x = system.position();
            let e = ev.potential_energy;

            // step downhill along the force, halving until the energy drops
            let mut accepted = false;
            while gamma > GAMMA_FLOOR {
                system.set_position(x + gamma * ev.force);
                let trial = system.evaluate();
                if trial.potential_energy <= e {
                    ev = trial;
                    accepted = true;
                    break;
                }
                system.set_position(x);
                gamma *= 0.5;
            }
            if !accepted {
                // line search stalled; report what we have
                break;
            }

            steps += 1;
            if steps % self.write_step == 0 {
                traj.new_frame(system, steps, 0.0);
            }

            gamma = (2.0 * gamma).min(self.step_size);
            converged = ev.force.abs() < self.force_tolerance;
        }

        if traj.last().map(|f| f.step) != Some(steps) {
            traj.new_frame(system, steps, 0.0);
        }

        MinimizationResult {
            trajectory: traj,
            converged,
            steps,
            final_force: ev.force.abs(),
            final_energy: ev.potential_energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potential::HarmonicOscillator;
    use crate::system::Particle;

    fn system(k: f64) -> ParticleSystem {
        let particle = Particle::new(1, 1.0).unwrap();
        let model = HarmonicOscillator::new(k).unwrap();
        ParticleSystem::new(particle, Box::new(model))
    }

    #[test]
    fn converges_from_a_displaced_start() {
        let mut sys = system(1.0);
        sys.set_position(4.0);
        let gd = GradientDescent::new(0.1, 1e-6, 500, 10).unwrap();
        let result = gd.minimize(&mut sys);

        assert!(result.converged);
        assert!(result.steps <= 500);
        assert!(sys.position().abs() < 1e-6);
        assert!(result.final_force < 1e-6);
        assert!(result.final_energy < 1e-12);
    }

    #[test]
    fn backtracks_past_an_overshooting_step() {
        // gamma > 2/k diverges without the line search
        let mut sys = system(1.0);
        sys.set_position(4.0);
        let gd = GradientDescent::new(5.0, 1e-6, 500, 10).unwrap();
        let result = gd.minimize(&mut sys);
        assert!(result.converged);
        assert!(sys.position().abs() < 1e-6);
    }

    #[test]
    fn reports_nonconvergence_without_failing() {
        let mut sys = system(1.0);
        sys.set_position(4.0);
        let gd = GradientDescent::new(0.1, 1e-6, 3, 1).unwrap();
        let result = gd.minimize(&mut sys);

        assert!(!result.converged);
        assert_eq!(result.steps, 3);
        assert!(result.final_force > 1e-6);
    }

    #[test]
    fn records_first_and_final_states() {
        let mut sys = system(1.0);
        sys.set_position(4.0);
        let gd = GradientDescent::new(0.1, 1e-6, 500, 25).unwrap();
        let result = gd.minimize(&mut sys);

        let frames = result.trajectory.frames();
        assert_eq!(frames[0].position, 4.0);
        assert_eq!(frames[0].step, 0);
        let last = result.trajectory.last().unwrap();
        assert_eq!(last.step, result.steps);
        assert_eq!(last.position, sys.position());
        // energy decreases monotonically along the recorded path
        let energies = result.trajectory.potential_energies();
        for pair in energies.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn already_minimized_system_converges_immediately() {
        let mut sys = system(1.0);
        let gd = GradientDescent::new(0.1, 1e-6, 500, 10).unwrap();
        let result = gd.minimize(&mut sys);
        assert!(result.converged);
        assert_eq!(result.steps, 0);
        assert_eq!(result.trajectory.len(), 1);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(GradientDescent::new(0.0, 1e-6, 500, 10).is_err());
        assert!(GradientDescent::new(0.1, 0.0, 500, 10).is_err());
        assert!(GradientDescent::new(0.1, 1e-6, 0, 10).is_err());
        assert!(GradientDescent::new(0.1, 1e-6, 500, 0).is_err());
    }
}
