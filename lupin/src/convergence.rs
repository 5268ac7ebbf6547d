use crate::common::*;
use matrix_util::common_io::open_buf_writer;
use std::io::Write;

/// Outcome of one convergence check.
///
/// The three terminal states are handled alike by the fit loop (stop
/// and save); they differ only in what gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    Continue,
    /// relative improvement fell below the threshold
    Converged,
    IterationCap,
    /// the likelihood decreased on consecutive checks
    Diverged,
}

impl FitStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FitStatus::Continue)
    }
}

/// Tracks the held-out log-likelihood across iterations and decides
/// when to stop. Optionally appends every check to a `log.dat`
/// style table:
///
/// ```text
/// iteration	likelihood	change
/// 1	-1234.5	0.25
/// ```
pub struct ConvergenceMonitor {
    threshold: f64,
    max_iter: usize,
    max_decreases: usize,
    decreasing_count: usize,
    likelihood: f64,
    log: Option<Box<dyn Write>>,
}

impl ConvergenceMonitor {
    pub fn new(threshold: f64, max_iter: usize) -> Self {
        Self {
            threshold,
            max_iter,
            max_decreases: MAX_CONSECUTIVE_DECREASES,
            decreasing_count: 0,
            likelihood: f64::MIN,
            log: None,
        }
    }

    /// Write the trace to `log_file` (created or truncated at
    /// iteration 0)
    pub fn with_log_file(mut self, log_file: &str) -> anyhow::Result<Self> {
        self.log = Some(open_buf_writer(log_file)?);
        Ok(self)
    }

    /// Most recent likelihood
    pub fn likelihood(&self) -> f64 {
        self.likelihood
    }

    pub fn decreasing_count(&self) -> usize {
        self.decreasing_count
    }

    fn write_log(&mut self, line: &str) -> anyhow::Result<()> {
        if let Some(log) = self.log.as_mut() {
            writeln!(log, "{}", line)?;
            log.flush()?;
        }
        Ok(())
    }

    /// Record `likelihood` at `iteration` and decide whether to stop.
    ///
    /// Iteration 0 only writes the header and takes `likelihood` as
    /// the baseline. Afterwards, with `delta = (new - old) / |old|`:
    /// a negative delta counts as a decrease and stops the fit once
    /// [`MAX_CONSECUTIVE_DECREASES`] happen in a row; a non-negative
    /// delta resets the count and stops the fit if it is below the
    /// threshold.
    pub fn check(&mut self, iteration: usize, likelihood: f64) -> anyhow::Result<FitStatus> {
        if iteration == 0 {
            self.likelihood = likelihood;
            self.decreasing_count = 0;
            self.write_log("iteration\tlikelihood\tchange")?;
            return Ok(FitStatus::Continue);
        }

        let old = self.likelihood;
        self.likelihood = likelihood;
        let delta = (likelihood - old) / old.abs();

        let line = format!("{}\t{}\t{}", iteration, likelihood, delta);
        self.write_log(&line)?;
        info!("{}", line);

        if delta < 0.0 {
            self.decreasing_count += 1;
            warn!(
                "likelihood decreasing ({} in a row)",
                self.decreasing_count
            );
            if self.decreasing_count >= self.max_decreases {
                info!(
                    "STOP: {} consecutive iterations of decreasing likelihood",
                    self.decreasing_count
                );
                return Ok(FitStatus::Diverged);
            }
        } else {
            self.decreasing_count = 0;
            if delta < self.threshold {
                info!("STOP: model converged");
                return Ok(FitStatus::Converged);
            }
        }

        if iteration >= self.max_iter {
            info!("STOP: iteration cap reached");
            return Ok(FitStatus::IterationCap);
        }

        Ok(FitStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(monitor: &mut ConvergenceMonitor, trace: &[f64]) -> Vec<FitStatus> {
        trace
            .iter()
            .enumerate()
            .map(|(i, &x)| monitor.check(i, x).unwrap())
            .collect()
    }

    #[test]
    fn test_three_decreases_stop() {
        for thresh in [1e-6, 1e-3, 0.1] {
            let mut monitor = ConvergenceMonitor::new(thresh, 1000);
            let status = run(&mut monitor, &[-100., -50., -80., -95., -110.]);
            assert_eq!(
                status,
                vec![
                    FitStatus::Continue,
                    FitStatus::Continue,
                    FitStatus::Continue,
                    FitStatus::Continue,
                    FitStatus::Diverged
                ]
            );
            assert_eq!(monitor.decreasing_count(), 3);
            assert_eq!(monitor.likelihood(), -110.);
        }
    }

    #[test]
    fn test_increase_resets_count() {
        let mut monitor = ConvergenceMonitor::new(1e-3, 1000);
        let status = run(&mut monitor, &[-100., -110., -120., -60., -70., -80.]);
        assert!(status.iter().all(|s| !s.is_terminal()));
        assert_eq!(monitor.decreasing_count(), 2);
    }

    #[test]
    fn test_converged() {
        let mut monitor = ConvergenceMonitor::new(1e-3, 1000);
        let status = run(&mut monitor, &[f64::MIN, -100., -50., -49.99]);
        assert_eq!(status[1], FitStatus::Continue);
        assert_eq!(status[2], FitStatus::Continue);
        assert_eq!(status[3], FitStatus::Converged);
    }

    #[test]
    fn test_iteration_cap() {
        let mut monitor = ConvergenceMonitor::new(1e-3, 2);
        let status = run(&mut monitor, &[-1000., -500., -100.]);
        assert_eq!(status[1], FitStatus::Continue);
        assert_eq!(status[2], FitStatus::IterationCap);
    }

    #[test]
    fn test_log_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let log_file = dir.path().join("log.dat");
        let log_file = log_file.to_str().unwrap();

        let mut monitor = ConvergenceMonitor::new(1e-3, 10).with_log_file(log_file)?;
        run(&mut monitor, &[f64::MIN, -100., -50.]);

        let lines = matrix_util::common_io::read_lines(log_file)?;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].as_ref(), "iteration\tlikelihood\tchange");
        let fields: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(fields[0], "2");
        assert_eq!(fields[1].parse::<f64>()?, -50.);
        assert_eq!(fields[2].parse::<f64>()?, 0.5);
        Ok(())
    }
}
