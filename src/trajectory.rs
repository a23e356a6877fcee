//! Append-only recording of per-frame simulation state.

use std::io::Write;
use std::ops::AddAssign;

use serde::Serialize;

use crate::error::Result;
use crate::system::ParticleSystem;

/// An immutable snapshot of the system at one recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub step: usize,
    pub time: f64,
    pub position: f64,
    pub momentum: f64,
    pub potential_energy: f64,
    pub kinetic_energy: f64,
}

impl Frame {
    pub fn total_energy(&self) -> f64 {
        self.potential_energy + self.kinetic_energy
    }
}

/// An ordered sequence of frames. Frames are only ever appended;
/// insertion order is the physical or algorithmic time axis.
#[derive(Debug, Default)]
pub struct Trajectory {
    frames: Vec<Frame>,
}

impl Trajectory {
    pub fn new() -> Trajectory {
        Trajectory { frames: Vec::new() }
    }

    /// Capture the current system state and append it.
    pub fn new_frame(&mut self, system: &ParticleSystem, step: usize, time: f64) {
        let ev = system.evaluate();
        self.frames.push(Frame {
            step,
            time,
            position: system.position(),
            momentum: system.momentum(),
            potential_energy: ev.potential_energy,
            kinetic_energy: system.kinetic_energy(),
        });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.time).collect()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.position).collect()
    }

    pub fn momenta(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.momentum).collect()
    }

    pub fn potential_energies(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.potential_energy).collect()
    }

    pub fn kinetic_energies(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.kinetic_energy).collect()
    }

    pub fn total_energies(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.total_energy()).collect()
    }

    /// Mean total energy over all frames, Kahan-compensated.
    pub fn mean_total_energy(&self) -> f64 {
        if self.frames.is_empty() {
            return 0.0;
        }
        let mut adder = KahanAdder::new();
        for frame in &self.frames {
            adder += frame.total_energy();
        }
        adder.result() / (self.frames.len() as f64)
    }

    /// Largest deviation of the total energy from its value in frame 0.
    pub fn energy_drift(&self) -> f64 {
        let e0 = match self.frames.first() {
            Some(f) => f.total_energy(),
            None => return 0.0,
        };
        self.frames
            .iter()
            .map(|f| (f.total_energy() - e0).abs())
            .fold(0.0, f64::max)
    }

    // dump recorded positions as an xyz trajectory
    pub fn dump_xyz<W: Write>(&self, w: &mut W, element: &str) -> Result<()> {
        for frame in &self.frames {
            writeln!(w, "1\n")?;
            writeln!(w, "{} {} 0 0", element, frame.position)?;
        }
        Ok(())
    }

    // dump frame columns as csv for plotting
    pub fn dump_csv<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(w, "step,time,position,momentum,potential_energy,kinetic_energy")?;
        for f in &self.frames {
            writeln!(
                w,
                "{},{},{},{},{},{}",
                f.step, f.time, f.position, f.momentum, f.potential_energy, f.kinetic_energy
            )?;
        }
        Ok(())
    }

    pub fn dump_json<W: Write>(&self, w: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(w, &self.frames)?;
        Ok(())
    }
}

/// Compensated summation for long energy accumulations.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct KahanAdder {
    accum: f64,
    comp: f64,
}

impl KahanAdder {
    pub fn new() -> Self {
        KahanAdder {
            accum: 0.0,
            comp: 0.0,
        }
    }

    fn add(&mut self, num: f64) {
        let y = num - self.comp;
        let t = self.accum + y;
        self.comp = (t - self.accum) - y;
        self.accum = t;
    }

    pub fn result(&self) -> f64 {
        self.accum
    }
}

impl AddAssign<f64> for KahanAdder {
    fn add_assign(&mut self, other: f64) {
        self.add(other);
    }
}
