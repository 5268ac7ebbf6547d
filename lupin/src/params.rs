use crate::common::*;
use matrix_util::common_io::write_lines;

/// Fixed hyperparameters of one fit.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Output directory for settings, log and checkpoints
    pub outdir: Box<str>,
    /// Number of documents drawn per iteration. Default: 1024
    pub batch_size: usize,
    /// Monte Carlo samples per document. Default: 64
    pub num_samples: usize,
    /// Checkpoint every this many iterations. Default: 10
    pub save_freq: usize,
    /// Relative likelihood change below which the fit stops. Default: 1e-3
    pub convergence_thresh: f64,
    /// Iteration cap. Default: 1000
    pub max_iter: usize,
    /// Delay of the Robbins-Monro schedule. Default: 1024
    pub tau: f64,
    /// Forgetting rate of the Robbins-Monro schedule. Default: 0.7
    pub kappa: f64,
    /// Gamma prior shape of the entity rates. Default: 0.3
    pub a_entity: f64,
    /// Gamma prior rate of the entity rates. Default: 0.3
    pub b_entity: f64,
    /// Gamma prior shape of the event rates. Default: 0.3
    pub a_events: f64,
    /// Gamma prior rate of the event rates. Default: 0.3
    pub b_events: f64,
    /// Rate (and shape scale) of the document likelihood. Default: 0.3
    pub b_docs: f64,
    /// Number of days an event stays relevant. Default: 7
    pub event_duration: i64,
    /// Draw a progress bar during the fit. Default: false
    pub progress: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            outdir: "out".into(),
            batch_size: 1024,
            num_samples: 64,
            save_freq: 10,
            convergence_thresh: 1e-3,
            max_iter: 1000,
            tau: 1024.,
            kappa: 0.7,
            a_entity: 0.3,
            b_entity: 0.3,
            a_events: 0.3,
            b_events: 0.3,
            b_docs: 0.3,
            event_duration: 7,
            progress: false,
        }
    }
}

impl Parameters {
    /// Reject settings the fitting loop cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch size must be positive");
        }
        if self.num_samples == 0 {
            anyhow::bail!("number of samples must be positive");
        }
        if self.save_freq == 0 {
            anyhow::bail!("save frequency must be positive");
        }
        if self.event_duration <= 0 {
            anyhow::bail!("event duration must be positive: {}", self.event_duration);
        }
        if !(self.tau > 0.0) {
            anyhow::bail!("tau must be positive: {}", self.tau);
        }

        let hyper = [
            ("a_entity", self.a_entity),
            ("b_entity", self.b_entity),
            ("a_events", self.a_events),
            ("b_events", self.b_events),
            ("b_docs", self.b_docs),
        ];
        for (name, x) in hyper {
            if !(x > 0.0 && x.is_finite()) {
                anyhow::bail!("{} must be positive and finite: {}", name, x);
            }
        }

        if !(self.kappa > 0.5 && self.kappa <= 1.0) {
            warn!(
                "kappa = {} is outside (0.5, 1]; the step sizes may not converge",
                self.kappa
            );
        }
        Ok(())
    }

    /// Decay kernel: influence of an event on day `a` on a document
    /// of day `c`
    ///
    /// ```text
    /// f(a, c) = 1 - (c - a) / d   if a <= c < a + d
    ///         = 0                 otherwise
    /// ```
    pub fn decay(&self, a: i64, c: i64) -> f64 {
        let d = self.event_duration;
        if a > c || c >= a + d {
            0.
        } else {
            1. - ((c - a) as f64) / (d as f64)
        }
    }

    /// [`Self::decay`] of every event day against one document day
    pub fn decay_weights(&self, days: &[i64], doc_day: i64) -> DVec {
        days.iter().map(|&a| self.decay(a, doc_day)).collect()
    }

    /// Robbins-Monro step size `(iteration + tau)^(-kappa)`
    pub fn step_size(&self, iteration: usize) -> f64 {
        (iteration as f64 + self.tau).powf(-self.kappa)
    }

    pub fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.outdir, name)
    }

    /// Record the seed and every hyperparameter in `settings.dat`
    pub fn save(&self, seed: u64) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = vec![
            format!("random seed:\t{}", seed),
            format!("batch size:\t{}", self.batch_size),
            format!("number of samples:\t{}", self.num_samples),
            format!("save frequency:\t{}", self.save_freq),
            format!("convergence threshold:\t{}", self.convergence_thresh),
            format!("max # of iterations:\t{}", self.max_iter),
            format!("tau:\t{}", self.tau),
            format!("kappa:\t{}", self.kappa),
            format!("a_entity:\t{}", self.a_entity),
            format!("b_entity:\t{}", self.b_entity),
            format!("a_events:\t{}", self.a_events),
            format!("b_events:\t{}", self.b_events),
            format!("b_docs:\t{}", self.b_docs),
            format!("event duration:\t{}", self.event_duration),
        ]
        .into_iter()
        .map(|x| x.into_boxed_str())
        .collect();

        write_lines(&lines, &self.output_file("settings.dat"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params_with_duration(d: i64) -> Parameters {
        Parameters {
            event_duration: d,
            ..Default::default()
        }
    }

    #[test]
    fn test_decay_example() {
        let params = params_with_duration(7);
        assert_eq!(params.decay(10, 10), 1.0);
        assert_abs_diff_eq!(params.decay(10, 13), 1.0 - 3.0 / 7.0, epsilon = 1e-12);
        assert_eq!(params.decay(10, 17), 0.0);
        assert_eq!(params.decay(10, 9), 0.0);
    }

    #[test]
    fn test_decay_window_and_monotone() {
        for d in 1..=10 {
            let params = params_with_duration(d);
            for a in -5..5_i64 {
                assert_eq!(params.decay(a, a), 1.0);
                for c in (a - 20)..a {
                    assert_eq!(params.decay(a, c), 0.0);
                }
                for c in (a + d)..(a + d + 20) {
                    assert_eq!(params.decay(a, c), 0.0);
                }
                for c in a..(a + d - 1) {
                    assert!(params.decay(a, c) > params.decay(a, c + 1));
                    assert!(params.decay(a, c + 1) > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_decay_weights() {
        let params = params_with_duration(3);
        let days = [0, 1, 2, 5];
        let w = params.decay_weights(&days, 2);
        assert_abs_diff_eq!(w, array![1. / 3., 2. / 3., 1., 0.], epsilon = 1e-12);
    }

    #[test]
    fn test_step_size() {
        let params = Parameters {
            tau: 1.0,
            kappa: 1.0,
            ..Default::default()
        };
        assert_abs_diff_eq!(params.step_size(1), 0.5, epsilon = 1e-12);
        assert!(params.step_size(10) < params.step_size(9));
    }

    #[test]
    fn test_validate() {
        assert!(Parameters::default().validate().is_ok());

        let bad = [
            Parameters {
                batch_size: 0,
                ..Default::default()
            },
            Parameters {
                event_duration: 0,
                ..Default::default()
            },
            Parameters {
                b_docs: -1.0,
                ..Default::default()
            },
            Parameters {
                tau: 0.0,
                ..Default::default()
            },
        ];
        for p in bad {
            assert!(p.validate().is_err());
        }
    }
}
