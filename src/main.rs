use std::fs::OpenOptions;
use std::io::BufWriter;

use md_ho::config::{Config, ProgramMode, APP_NAME};
use md_ho::error::Result;
use md_ho::integrate::{run_dynamics, DynamicsRun, VelocityVerlet};
use md_ho::minimize::GradientDescent;
use md_ho::potential::HarmonicOscillator;
use md_ho::scan::{scan_points, scan_step};
use md_ho::system::{Particle, ParticleSystem};

fn main() {
    if let Err(e) = run() {
        eprintln!("md-ho: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // parse command line options
    let config = Config::new()?;

    if config.save_config {
        confy::store(APP_NAME, &config.sim)?;
    }

    // initialize the system
    let model = HarmonicOscillator::new(config.sim.spring)?;
    let particle = Particle::new(config.sim.atomic_number, config.sim.mass)?;
    let mut sys = ParticleSystem::new(particle, Box::new(model));

    let suffix = config.format_file_suffix();

    match &config.mode {
        ProgramMode::Scan { from, to, dx, points } => {
            let traj = match points {
                Some(n) => scan_points(&mut sys, *from, *to, *n)?,
                None => scan_step(&mut sys, *from, *to, *dx)?,
            };

            let mut file = output_file(&format!("scan_{}.csv", suffix))?;
            traj.dump_csv(&mut file)?;

            match points {
                Some(_) => println!("scanned {} samples over [{}, {}]", traj.len(), from, to),
                None => println!("scanned {} samples over [{}, {})", traj.len(), from, to),
            }
        }
        ProgramMode::Minimize { x0, gamma, ftol, max_steps } => {
            sys.set_position(*x0);

            let descent = GradientDescent::new(*gamma, *ftol, *max_steps, config.sim.write_step)?;
            let result = descent.minimize(&mut sys);

            let mut file = output_file(&format!("min_{}.csv", suffix))?;
            result.trajectory.dump_csv(&mut file)?;

            if result.converged {
                println!(
                    "converged in {} steps: x = {:e}, |f| = {:e}, E = {:e}",
                    result.steps,
                    sys.position(),
                    result.final_force,
                    result.final_energy
                );
            } else {
                println!(
                    "did not converge within {} steps: |f| = {:e}, E = {:e}",
                    result.steps, result.final_force, result.final_energy
                );
            }
        }
        ProgramMode::Run { x0, p0, temp, dt, duration } => {
            sys.set_position(*x0);
            match temp {
                Some(t) => sys.set_thermal_momentum(*t, config.sim.seed)?,
                None => sys.set_momentum(*p0),
            }

            let params = DynamicsRun {
                dt: *dt,
                duration: *duration,
                write_step: config.sim.write_step,
                stdout_step: config.sim.stdout_step,
            };
            let traj = run_dynamics(&mut sys, &VelocityVerlet, &params)?;

            // write data to file
            let mut xyz = output_file(&format!("traj_{}.xyz", suffix))?;
            traj.dump_xyz(&mut xyz, sys.particle().element())?;

            let mut csv = output_file(&format!("energy_{}.csv", suffix))?;
            traj.dump_csv(&mut csv)?;

            let mut json = output_file(&format!("frames_{}.json", suffix))?;
            traj.dump_json(&mut json)?;

            println!(
                "{} frames, mean E = {:.6}, energy drift = {:e}",
                traj.len(),
                traj.mean_total_energy(),
                traj.energy_drift()
            );
        }
    }

    Ok(())
}

fn output_file(name: &str) -> Result<BufWriter<std::fs::File>> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(name)?;
    Ok(BufWriter::new(file))
}
