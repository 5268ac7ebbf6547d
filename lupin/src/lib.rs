//! Event detection in a time-stamped document collection.
//!
//! Each document is a non-negative feature vector observed on a day.
//! Its features are Gamma distributed around a rate made of a
//! persistent baseline ("entity") plus the events of the preceding
//! days, each weighted by a linear decay over a window of `d` days:
//!
//! ```text
//! rate(doc) = entity + sum_a f(a, day(doc)) * events[a]
//! x[doc,k] ~ Gamma(b_docs * rate[k], b_docs)
//! entity[k] ~ Gamma(a_entity, b_entity)
//! events[a,k] ~ Gamma(a_events, b_events)
//! ```
//!
//! The Gamma variational posteriors of `entity` and `events` are
//! fitted by stochastic variational inference with the score-function
//! gradient estimator.

/// shared constants and re-exports
pub mod common;

/// documents, days and the held-out validation set
pub mod corpus;

/// hyperparameters and the event decay kernel
pub mod params;

/// stopping rule on the held-out log-likelihood
pub mod convergence;

/// variational state and the fitting loop
pub mod model;

/// per-day eventness score from a saved fit
pub mod eventness;
