use crate::common::*;
use crate::params::Parameters;
use matrix_util::common_io::read_lines_of_types;
use matrix_util::traits::IoOps;
use std::collections::BTreeMap;

/// How much of a day's expected rate comes from events
#[derive(Debug, Clone, PartialEq)]
pub struct DayEventness {
    pub day: i64,
    /// `event_mass / (baseline_mass + event_mass)`
    pub eventness: f64,
    /// `sum_a f(a, day) * sum_k events[a, k]`
    pub event_mass: f64,
    pub num_docs: usize,
}

impl std::fmt::Display for DayEventness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.day, self.eventness, self.event_mass, self.num_docs
        )
    }
}

/// Turn `final` or an iteration number into a checkpoint tag
pub fn parse_tag(tag: &str) -> anyhow::Result<String> {
    if tag == FINAL_TAG {
        return Ok(FINAL_TAG.to_string());
    }
    let iteration = tag
        .parse::<usize>()
        .map_err(|_| anyhow::anyhow!("tag should be `final` or an iteration number: {}", tag))?;
    Ok(iteration_tag(iteration))
}

/// Read `entities_{tag}.tsv` and `events_{tag}.tsv` from a fit
/// directory
pub fn load_fit(fit_dir: &str, tag: &str) -> anyhow::Result<(Mat, Mat)> {
    let entity = Mat::from_tsv(&format!("{}/entities_{}.tsv", fit_dir, tag))?;
    let events = Mat::from_tsv(&format!("{}/events_{}.tsv", fit_dir, tag))?;

    if entity.nrows() != 1 {
        anyhow::bail!("entity estimate should have one row: {}", entity.nrows());
    }
    if entity.ncols() != events.ncols() {
        anyhow::bail!(
            "entity has {} features but events have {}",
            entity.ncols(),
            events.ncols()
        );
    }
    Ok((entity, events))
}

/// One day per line, as in the corpus time file
pub fn read_doc_days(time_file: &str) -> anyhow::Result<Vec<i64>> {
    read_lines_of_types::<i64>(time_file, '\t')?
        .into_iter()
        .enumerate()
        .map(|(i, x)| match x.as_slice() {
            [t] => Ok(*t),
            _ => Err(anyhow::anyhow!("{}: bad record {}", time_file, i + 1)),
        })
        .collect()
}

/// Eventness of every observed day
///
/// * `params` - provides the decay kernel
/// * `doc_days` - day of every document; the sorted distinct values
///   index the rows of `events`
/// * `entity` - posterior mean of the entity rates (1 x D)
/// * `events` - posterior mean of the event rates (#days x D)
pub fn eventness_by_day(
    params: &Parameters,
    doc_days: &[i64],
    entity: &Mat,
    events: &Mat,
) -> anyhow::Result<Vec<DayEventness>> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &day in doc_days {
        *counts.entry(day).or_default() += 1;
    }
    let days: Vec<i64> = counts.keys().copied().collect();

    if days.len() != events.nrows() {
        anyhow::bail!(
            "{} distinct days, but the fit has {} event rows",
            days.len(),
            events.nrows()
        );
    }

    let baseline_mass = entity.sum();
    let event_mass_per_day = events.sum_axis(Axis(1));

    Ok(counts
        .iter()
        .map(|(&day, &num_docs)| {
            let weights = params.decay_weights(&days, day);
            let event_mass = weights.dot(&event_mass_per_day);
            let total = baseline_mass + event_mass;
            let eventness = if total > 0.0 { event_mass / total } else { 0.0 };
            DayEventness {
                day,
                eventness,
                event_mass,
                num_docs,
            }
        })
        .collect())
}
