//! Command-line and file configuration.

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{MdError, Result};

/// Name confy files the configuration under.
pub const APP_NAME: &str = "md-ho";

/// Shared physical and output parameters, persistable through confy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub spring: f64,
    pub mass: f64,
    pub atomic_number: u32,
    pub write_step: usize,
    pub stdout_step: Option<usize>,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            spring: 1.0,
            mass: 1.0,
            atomic_number: 1,
            write_step: 10,
            stdout_step: None,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProgramMode {
    Scan {
        from: f64,
        to: f64,
        dx: f64,
        points: Option<usize>,
    },
    Minimize {
        x0: f64,
        gamma: f64,
        ftol: f64,
        max_steps: usize,
    },
    Run {
        x0: f64,
        p0: f64,
        temp: Option<f64>,
        dt: f64,
        duration: f64,
    },
}

impl ProgramMode {
    fn tag(&self) -> &'static str {
        match self {
            ProgramMode::Scan { .. } => "scan",
            ProgramMode::Minimize { .. } => "min",
            ProgramMode::Run { .. } => "run",
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub sim: SimConfig,
    pub mode: ProgramMode,
    pub save_config: bool,
}

impl Config {
    // initialize configuration from command line arguments
    pub fn new() -> Result<Config> {
        Config::from_matches(&build_app().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Result<Config> {
        // stored config supplies defaults when requested; explicit
        // command-line values always win
        let stored: SimConfig = if matches.is_present("LOADCFG") {
            confy::load(APP_NAME)?
        } else {
            SimConfig::default()
        };

        let sim = SimConfig {
            spring: resolve(matches, "SPRING", stored.spring)?,
            mass: resolve(matches, "MASS", stored.mass)?,
            atomic_number: resolve(matches, "ATOM", stored.atomic_number)?,
            write_step: resolve(matches, "OUT", stored.write_step)?,
            stdout_step: if matches.occurrences_of("IO") > 0 {
                Some(conv_match(matches, "IO")?)
            } else {
                stored.stdout_step
            },
            seed: resolve(matches, "SEED", stored.seed)?,
        };

        if sim.write_step == 0 {
            return Err(MdError::InvalidParameter(
                "outstep must be at least 1".to_string(),
            ));
        }
        if sim.stdout_step == Some(0) {
            return Err(MdError::InvalidParameter(
                "iostep must be at least 1".to_string(),
            ));
        }

        let mode = match matches.subcommand() {
            ("scan", Some(sub)) => ProgramMode::Scan {
                from: conv_match(sub, "FROM")?,
                to: conv_match(sub, "TO")?,
                dx: conv_match(sub, "DX")?,
                points: conv_match_opt(sub, "POINTS")?,
            },
            ("minimize", Some(sub)) => ProgramMode::Minimize {
                x0: conv_match(sub, "X0")?,
                gamma: conv_match(sub, "GAMMA")?,
                ftol: conv_match(sub, "FTOL")?,
                max_steps: conv_match(sub, "MAXSTEPS")?,
            },
            ("run", Some(sub)) => ProgramMode::Run {
                x0: conv_match(sub, "X0")?,
                p0: conv_match(sub, "P0")?,
                temp: conv_match_opt(sub, "TEMP")?,
                dt: conv_match(sub, "DT")?,
                duration: conv_match(sub, "DURATION")?,
            },
            _ => {
                return Err(MdError::InvalidParameter(
                    "no mode given, expected scan, minimize or run".to_string(),
                ))
            }
        };

        Ok(Config {
            sim,
            mode,
            save_config: matches.is_present("SAVECFG"),
        })
    }

    // format output file suffix with configuration data
    pub fn format_file_suffix(&self) -> String {
        let head = format!("k{}_m{}_{}", self.sim.spring, self.sim.mass, self.mode.tag());
        match &self.mode {
            ProgramMode::Scan { from, to, dx, points } => match points {
                Some(n) => format!("{}_{}_{}_n{}", head, from, to, n),
                None => format!("{}_{}_{}_dx{}", head, from, to, dx),
            },
            ProgramMode::Minimize { x0, gamma, .. } => {
                format!("{}_x{}_g{}", head, x0, gamma)
            }
            ProgramMode::Run { x0, dt, duration, temp, .. } => match temp {
                Some(t) => format!(
                    "{}_x{}_dt{}_T{}_temp{}_seed{}",
                    head, x0, dt, duration, t, self.sim.seed
                ),
                None => format!("{}_x{}_dt{}_T{}", head, x0, dt, duration),
            },
        }
    }
}

fn build_app<'a, 'b>() -> App<'a, 'b> {
    App::new("Harmonic oscillator dynamics")
        .version("0.1.0")
        .about(
            "Configures a harmonic potential around a single particle and \
             scans it, minimizes on it, or integrates Newtonian dynamics \
             over it with velocity Verlet.",
        )
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("SPRING")
                .short("k")
                .long("spring")
                .help("Spring constant of the harmonic potential")
                .takes_value(true)
                .default_value("1.0"),
        )
        .arg(
            Arg::with_name("MASS")
                .short("m")
                .long("mass")
                .help("Mass of the particle")
                .takes_value(true)
                .default_value("1.0"),
        )
        .arg(
            Arg::with_name("ATOM")
                .long("atomic-number")
                .help("Atomic number of the particle")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("OUT")
                .short("o")
                .long("outstep")
                .help("Number of steps between frames recorded to the trajectory")
                .takes_value(true)
                .default_value("10"),
        )
        .arg(
            Arg::with_name("IO")
                .short("i")
                .long("iostep")
                .help("Number of steps between messages to stdout")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("SEED")
                .long("seed")
                .help("Random seed for thermal initial conditions")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::with_name("LOADCFG")
                .long("load-config")
                .help("Use the stored configuration for any flag not given"),
        )
        .arg(
            Arg::with_name("SAVECFG")
                .long("save-config")
                .help("Store the resolved shared configuration"),
        )
        .subcommand(
            SubCommand::with_name("scan")
                .about("Sweep the coordinate and record energy and force")
                .arg(
                    Arg::with_name("FROM")
                        .long("from")
                        .help("Lower bound of the sweep (included)")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .default_value("-2.0"),
                )
                .arg(
                    Arg::with_name("TO")
                        .long("to")
                        .help("Upper bound of the sweep (excluded)")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .default_value("2.0"),
                )
                .arg(
                    Arg::with_name("DX")
                        .long("dx")
                        .help("Spacing between samples")
                        .takes_value(true)
                        .default_value("0.05"),
                )
                .arg(
                    Arg::with_name("POINTS")
                        .long("points")
                        .help("Sample count, endpoints included (replaces --dx)")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("minimize")
                .about("Drive a displaced particle to the potential minimum")
                .arg(
                    Arg::with_name("X0")
                        .long("x0")
                        .help("Starting coordinate")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .default_value("4.0"),
                )
                .arg(
                    Arg::with_name("GAMMA")
                        .long("gamma")
                        .help("Initial descent step size")
                        .takes_value(true)
                        .default_value("0.1"),
                )
                .arg(
                    Arg::with_name("FTOL")
                        .long("ftol")
                        .help("Force magnitude below which the system is converged")
                        .takes_value(true)
                        .default_value("1e-6"),
                )
                .arg(
                    Arg::with_name("MAXSTEPS")
                        .long("max-steps")
                        .help("Maximum number of descent steps")
                        .takes_value(true)
                        .default_value("500"),
                ),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Integrate Newtonian dynamics with velocity Verlet")
                .arg(
                    Arg::with_name("X0")
                        .long("x0")
                        .help("Initial coordinate")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .default_value("1.0"),
                )
                .arg(
                    Arg::with_name("P0")
                        .long("p0")
                        .help("Initial momentum")
                        .takes_value(true)
                        .allow_hyphen_values(true)
                        .default_value("0.0"),
                )
                .arg(
                    Arg::with_name("TEMP")
                        .short("t")
                        .long("temp")
                        .help("Draw the initial momentum thermally at this temperature (replaces --p0)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("DT")
                        .long("dt")
                        .help("Size of the system timestep")
                        .takes_value(true)
                        .default_value("1e-3"),
                )
                .arg(
                    Arg::with_name("DURATION")
                        .long("duration")
                        .help("Total simulated time")
                        .takes_value(true)
                        .default_value("10.0"),
                ),
        )
}

// convert matches to corresponding generic types
fn conv_match<T>(matches: &ArgMatches, tag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches
        .value_of(tag)
        .ok_or_else(|| MdError::InvalidParameter(format!("missing value for {}", tag)))?;
    raw.parse()
        .map_err(|e| MdError::InvalidParameter(format!("{} ({:?}): {}", tag, raw, e)))
}

fn conv_match_opt<T>(matches: &ArgMatches, tag: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match matches.value_of(tag) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| MdError::InvalidParameter(format!("{} ({:?}): {}", tag, raw, e))),
    }
}

// command-line value if given explicitly, stored value otherwise
fn resolve<T>(matches: &ArgMatches, tag: &str, stored: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if matches.occurrences_of(tag) > 0 {
        conv_match(matches, tag)
    } else {
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        let matches = build_app()
            .get_matches_from_safe(args.iter().copied())
            .expect("arguments should parse");
        Config::from_matches(&matches)
    }

    #[test]
    fn scan_defaults() {
        let config = parse(&["md-ho", "scan"]).unwrap();
        assert_eq!(config.sim.spring, 1.0);
        assert_eq!(config.sim.write_step, 10);
        match config.mode {
            ProgramMode::Scan { from, to, dx, points } => {
                assert_eq!(from, -2.0);
                assert_eq!(to, 2.0);
                assert_eq!(dx, 0.05);
                assert!(points.is_none());
            }
            _ => panic!("expected scan mode"),
        }
    }

    #[test]
    fn run_flags_override_defaults() {
        let config = parse(&[
            "md-ho", "-k", "2.5", "-m", "0.5", "run", "--x0", "-1.5", "--dt", "1e-2",
            "--duration", "5.0",
        ])
        .unwrap();
        assert_eq!(config.sim.spring, 2.5);
        assert_eq!(config.sim.mass, 0.5);
        match config.mode {
            ProgramMode::Run { x0, p0, dt, duration, temp } => {
                assert_eq!(x0, -1.5);
                assert_eq!(p0, 0.0);
                assert_eq!(dt, 1e-2);
                assert_eq!(duration, 5.0);
                assert!(temp.is_none());
            }
            _ => panic!("expected run mode"),
        }
    }

    #[test]
    fn minimize_flags() {
        let config = parse(&["md-ho", "minimize", "--gamma", "0.2", "--max-steps", "100"]).unwrap();
        match config.mode {
            ProgramMode::Minimize { x0, gamma, ftol, max_steps } => {
                assert_eq!(x0, 4.0);
                assert_eq!(gamma, 0.2);
                assert_eq!(ftol, 1e-6);
                assert_eq!(max_steps, 100);
            }
            _ => panic!("expected minimize mode"),
        }
    }

    #[test]
    fn unparseable_values_are_descriptive_errors() {
        let err = parse(&["md-ho", "-k", "stiff", "scan"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SPRING"));
        assert!(message.contains("stiff"));
    }

    #[test]
    fn zero_outstep_is_rejected() {
        assert!(parse(&["md-ho", "-o", "0", "scan"]).is_err());
        assert!(parse(&["md-ho", "-i", "0", "scan"]).is_err());
    }

    #[test]
    fn file_suffix_carries_the_mode() {
        let scan = parse(&["md-ho", "scan"]).unwrap();
        assert_eq!(scan.format_file_suffix(), "k1_m1_scan_-2_2_dx0.05");

        let run = parse(&["md-ho", "run"]).unwrap();
        assert_eq!(run.format_file_suffix(), "k1_m1_run_x1_dt0.001_T10");
    }

    #[test]
    fn defaults_match_the_stored_config_defaults() {
        // clap defaults and SimConfig::default must agree, otherwise
        // --load-config resolution silently changes unrelated flags
        let config = parse(&["md-ho", "scan"]).unwrap();
        let stored = SimConfig::default();
        assert_eq!(config.sim.spring, stored.spring);
        assert_eq!(config.sim.mass, stored.mass);
        assert_eq!(config.sim.atomic_number, stored.atomic_number);
        assert_eq!(config.sim.write_step, stored.write_step);
        assert_eq!(config.sim.stdout_step, stored.stdout_step);
        assert_eq!(config.sim.seed, stored.seed);
    }
}
