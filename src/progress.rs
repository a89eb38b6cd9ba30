//! Progress reporting and cancellation for long-running convolutions.
//!
//! Reporters are purely observational: the driver's output never depends on
//! whether, or how often, a reporter is called.

use std::{
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

const CURSOR_UP_ONE: &str = "\x1b[1A";
const ERASE_LINE: &str = "\x1b[2K";

/// Receives the fraction of voxels processed so far, in `[0, 1]`.
pub trait ProgressReporter: Send {
    fn report(&mut self, fraction: f64);
}

impl<F> ProgressReporter for F
where
    F: FnMut(f64) + Send,
{
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// A one-line ANSI progress bar, redrawn in place:
///
/// ```text
/// [#########################-------------------------]  50%
/// ```
pub struct ProgressBar<W: Write> {
    out: W,
    width: usize,
    drawn: bool,
}

impl ProgressBar<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ProgressBar<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: 50,
            drawn: false,
        }
    }

    /// Sets the number of characters between the brackets.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, fraction: f64) -> io::Result<()> {
        let fraction = fraction.clamp(0.0, 1.0);
        if self.drawn {
            write!(self.out, "{CURSOR_UP_ONE}{ERASE_LINE}")?;
        }

        let done = (fraction * self.width as f64) as usize;
        let percent = (fraction * 100.0) as usize;
        writeln!(
            self.out,
            "[{}{}] {:3}%",
            "#".repeat(done),
            "-".repeat(self.width - done),
            percent
        )?;
        self.out.flush()?;
        self.drawn = true;
        Ok(())
    }
}

impl<W: Write + Send> ProgressReporter for ProgressBar<W> {
    fn report(&mut self, fraction: f64) {
        if let Err(e) = self.draw(fraction) {
            tracing::debug!("progress bar write failed: {e}");
        }
    }
}

/// Latest reported fraction, readable from other threads.
///
/// Clones share the same value.
#[derive(Clone, Debug, Default)]
pub struct SharedProgress(Arc<AtomicU64>);

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fraction(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn is_done(&self) -> bool {
        self.fraction() >= 1.0
    }
}

impl ProgressReporter for SharedProgress {
    fn report(&mut self, fraction: f64) {
        self.0.store(fraction.to_bits(), Ordering::Relaxed);
    }
}

/// Cooperative cancellation switch, checked between voxels.
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
