//! Variational state and the stochastic variational inference loop.
//!
//! # Gradient estimate
//!
//! For a minibatch of documents and `S` draws `(entity, events) ~ q`
//! per document:
//!
//! ```text
//! w         = ln p(x) + N * ln p(doc | x) - ln q(x)
//! lambda_a += d/da ln q(x) * w
//! lambda_b += d/db ln q(x) * w
//! ```
//!
//! averaged over the `B * S` draws. Event days with zero decay weight
//! for the drawn document contribute nothing. Each step moves the
//! variational parameters by `rho = (t + tau)^(-kappa)` times the
//! average, then clips them back to positive values.

use crate::common::*;
use crate::convergence::{ConvergenceMonitor, FitStatus};
use crate::corpus::{Corpus, Document};
use crate::params::Parameters;
use indicatif::{ProgressBar, ProgressDrawTarget};
use matrix_param::ndarray_gamma::GammaMatrix;
use matrix_param::special_fn::gamma_log_pdf;
use matrix_util::traits::IoOps;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// What a finished fit reports
#[derive(Debug, Clone, Copy)]
pub struct FitSummary {
    pub status: FitStatus,
    pub iterations: usize,
    /// held-out log-likelihood at the last check
    pub likelihood: f64,
}

/// Elementwise Gamma log-density of a document's features with shape
/// `b_docs * rate` and rate `b_docs`
pub fn doc_log_density(rep: &DVec, rate: &DVec, b_docs: f64) -> DVec {
    let mut ret = DVec::zeros(rep.len());
    ndarray::Zip::from(&mut ret)
        .and(rep)
        .and(rate)
        .for_each(|p, &x, &r| *p = gamma_log_pdf(x, b_docs * r, b_docs));
    ret
}

/// Gradient accumulators shaped like the four variational arrays
struct GradientStat {
    a_entity: Mat,
    b_entity: Mat,
    a_events: Mat,
    b_events: Mat,
}

impl GradientStat {
    fn zeros(num_days: usize, dim: usize) -> Self {
        Self {
            a_entity: Mat::zeros((1, dim)),
            b_entity: Mat::zeros((1, dim)),
            a_events: Mat::zeros((num_days, dim)),
            b_events: Mat::zeros((num_days, dim)),
        }
    }

    fn add_assign(&mut self, other: &Self) {
        self.a_entity += &other.a_entity;
        self.b_entity += &other.b_entity;
        self.a_events += &other.a_events;
        self.b_events += &other.b_events;
    }

    fn scale(&mut self, factor: f64) {
        self.a_entity *= factor;
        self.b_entity *= factor;
        self.a_events *= factor;
        self.b_events *= factor;
    }
}

pub struct Model<'a> {
    corpus: &'a Corpus,
    params: &'a Parameters,
    entity: GammaMatrix,
    events: GammaMatrix,
}

impl<'a> Model<'a> {
    /// Variational parameters start at the priors
    pub fn new(corpus: &'a Corpus, params: &'a Parameters) -> Self {
        let dim = corpus.dim();
        let num_days = corpus.day_count();

        let entity = GammaMatrix::new((1, dim), params.a_entity, params.b_entity)
            .with_clip_floor(ENTITY_PARAM_FLOOR);
        let events = GammaMatrix::new((num_days, dim), params.a_events, params.b_events)
            .with_clip_floor(EVENT_PARAM_FLOOR);

        Self {
            corpus,
            params,
            entity,
            events,
        }
    }

    /// Reset the variational parameters to the priors
    pub fn init(&mut self) {
        self.entity.reset_stat();
        self.events.reset_stat();
    }

    /// Posterior mean of the entity rates (1 x D)
    pub fn entity(&self) -> &Mat {
        self.entity.posterior_mean()
    }

    /// Posterior mean of the event rates (#days x D)
    pub fn events(&self) -> &Mat {
        self.events.posterior_mean()
    }

    pub fn entity_param(&self) -> &GammaMatrix {
        &self.entity
    }

    pub fn events_param(&self) -> &GammaMatrix {
        &self.events
    }

    /// Overwrite the variational shapes and rates
    pub fn set_variational(
        &mut self,
        a_entity: &Mat,
        b_entity: &Mat,
        a_events: &Mat,
        b_events: &Mat,
    ) -> anyhow::Result<()> {
        if a_entity.dim() != self.entity.shape_stat().dim()
            || b_entity.dim() != self.entity.rate_stat().dim()
            || a_events.dim() != self.events.shape_stat().dim()
            || b_events.dim() != self.events.rate_stat().dim()
        {
            anyhow::bail!("variational parameter dimensions do not match the corpus");
        }
        self.entity.update_stat(a_entity, b_entity);
        self.events.update_stat(a_events, b_events);
        Ok(())
    }

    /// Expected rate of a document given entity and event rates
    ///
    /// `entity[0,] + sum_day weights[day] * events[day,]`
    fn doc_rate(entity: &Mat, events: &Mat, weights: &DVec) -> DVec {
        &entity.row(0) + &weights.dot(events)
    }

    /// Held-out log-likelihood with the posterior means plugged in
    pub fn compute_likelihood(&self) -> f64 {
        let days = self.corpus.days();
        let b_docs = self.params.b_docs;
        let entity = self.entity();
        let events = self.events();

        let docs: Vec<&Document> = self.corpus.validation().collect();

        let llik: Vec<f64> = docs
            .par_iter()
            .map(|doc| {
                let weights = self.params.decay_weights(days, doc.day());
                let rate = Self::doc_rate(entity, events, &weights);
                doc_log_density(doc.rep(), &rate, b_docs).sum()
            })
            .collect();

        llik.iter().sum()
    }

    /// Score-function gradient summed over `num_samples` draws for one
    /// document
    fn gradient_draw(&self, doc: &Document, seed: u64) -> anyhow::Result<GradientStat> {
        let mut rng = StdRng::seed_from_u64(seed);

        let num_docs = self.corpus.num_docs() as f64;
        let b_docs = self.params.b_docs;
        let weights = self.params.decay_weights(self.corpus.days(), doc.day());

        let mut stat = GradientStat::zeros(self.corpus.day_count(), self.corpus.dim());

        for _ in 0..self.params.num_samples {
            let entity = self.entity.sample(&mut rng)?;
            let events = self.events.sample(&mut rng)?;

            let rate = Self::doc_rate(&entity, &events, &weights);
            let mut p_doc = doc_log_density(doc.rep(), &rate, b_docs);
            p_doc.mapv_inplace(|x| if x.is_infinite() { f64::MIN } else { x });
            let p_doc = p_doc * num_docs;

            // entity
            let (g_a, g_b) = self.entity.score(&entity);
            let w = self.entity.log_prior(&entity) + &p_doc - self.entity.log_variational(&entity);
            stat.a_entity += &(&g_a * &w);
            stat.b_entity += &(&g_b * &w);

            // events, skipping days that cannot reach this document
            let (g_a, g_b) = self.events.score(&events);
            let w = self.events.log_prior(&events) + &p_doc - self.events.log_variational(&events);

            for (day, &f) in weights.iter().enumerate() {
                if f == 0.0 {
                    continue;
                }
                let w_day = w.row(day);
                stat.a_events
                    .row_mut(day)
                    .zip_mut_with(&(&g_a.row(day) * &w_day), |s, &x| *s += x);
                stat.b_events
                    .row_mut(day)
                    .zip_mut_with(&(&g_b.row(day) * &w_day), |s, &x| *s += x);
            }
        }

        Ok(stat)
    }

    /// One stochastic natural-gradient step
    ///
    /// Document choices and per-document seeds come from `rng` in a
    /// fixed order before the parallel map, so a given seed always
    /// gives the same result.
    pub fn update<R: Rng + ?Sized>(&mut self, iteration: usize, rng: &mut R) -> anyhow::Result<()> {
        let batch_size = self.params.batch_size;

        let draws: Vec<(usize, u64)> = (0..batch_size)
            .map(|_| {
                let doc = self.corpus.random_doc(rng).id();
                (doc, rng.random::<u64>())
            })
            .collect();

        let partial = draws
            .par_iter()
            .map(|&(doc, seed)| self.gradient_draw(self.corpus.doc(doc), seed))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut lambda = GradientStat::zeros(self.corpus.day_count(), self.corpus.dim());
        for stat in partial.iter() {
            lambda.add_assign(stat);
        }
        lambda.scale(1.0 / (batch_size * self.params.num_samples) as f64);

        let rho = self.params.step_size(iteration);
        debug!("iteration {}: rho = {}", iteration, rho);

        self.entity
            .stochastic_update(rho, &lambda.a_entity, &lambda.b_entity);
        self.events
            .stochastic_update(rho, &lambda.a_events, &lambda.b_events);

        Ok(())
    }

    /// Fit from the priors until the held-out likelihood converges,
    /// decreases three times in a row, or the iteration cap is hit.
    /// Writes `log.dat`, periodic checkpoints and the `final` one.
    pub fn fit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<FitSummary> {
        self.params.validate()?;
        self.init();

        let params = self.params;
        let mut monitor = ConvergenceMonitor::new(params.convergence_thresh, params.max_iter)
            .with_log_file(&params.output_file("log.dat"))?;

        let pb = ProgressBar::new(params.max_iter as u64);
        if !params.progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        info!(
            "fitting: {} documents x {} samples per iteration",
            params.batch_size, params.num_samples
        );

        let mut iteration = 0;
        // nothing evaluated yet
        let mut status = monitor.check(iteration, f64::MIN)?;

        while !status.is_terminal() {
            iteration += 1;
            self.update(iteration, rng)?;

            if iteration % params.save_freq == 0 {
                self.save(&iteration_tag(iteration))?;
            }

            status = monitor.check(iteration, self.compute_likelihood())?;
            pb.inc(1);
        }
        pb.finish_and_clear();

        self.save(FINAL_TAG)?;

        info!(
            "finished after {} iterations ({:?}), likelihood {}",
            iteration,
            status,
            monitor.likelihood()
        );

        Ok(FitSummary {
            status,
            iterations: iteration,
            likelihood: monitor.likelihood(),
        })
    }

    /// Write the posterior means to `entities_{tag}.tsv` and
    /// `events_{tag}.tsv`
    pub fn save(&self, tag: &str) -> anyhow::Result<()> {
        self.entity()
            .to_tsv(&self.params.output_file(&format!("entities_{}.tsv", tag)))?;
        self.events()
            .to_tsv(&self.params.output_file(&format!("events_{}.tsv", tag)))?;
        Ok(())
    }
}
