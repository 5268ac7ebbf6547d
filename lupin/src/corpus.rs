use crate::common::*;
use matrix_param::special_fn::floor_zeros_inplace;
use matrix_util::common_io::read_lines_of_types;
use rand::Rng;
use std::collections::BTreeSet;

/// A document: a dense non-negative feature vector observed on a day
#[derive(Debug, Clone)]
pub struct Document {
    id: usize,
    day: i64,
    rep: DVec,
}

impl Document {
    /// Exact zeros in `rep` are replaced with [`MIN_POSITIVE`] so that
    /// `ln(rep)` stays finite
    pub fn new(id: usize, day: i64, mut rep: DVec) -> Self {
        floor_zeros_inplace(&mut rep);
        Self { id, day, rep }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn day(&self) -> i64 {
        self.day
    }

    pub fn rep(&self) -> &DVec {
        &self.rep
    }
}

/// Documents in load order, the sorted distinct days, and the
/// held-out validation documents
pub struct Corpus {
    docs: Vec<Document>,
    days: Vec<i64>,
    dimension: usize,
    validation: BTreeSet<usize>,
}

impl Corpus {
    /// Read a corpus from two aligned files
    ///
    /// * `content_file` - one document per line, tab-separated
    ///   non-negative values, the same number of fields on every line
    /// * `time_file` - one integer day per line, in the same order
    /// * `rng` - draws the validation set
    pub fn from_files<R: Rng + ?Sized>(
        content_file: &str,
        time_file: &str,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        let reps = read_lines_of_types::<f64>(content_file, '\t')?;

        let times = read_lines_of_types::<i64>(time_file, '\t')?
            .into_iter()
            .enumerate()
            .map(|(i, x)| match x.as_slice() {
                [t] => Ok(*t),
                _ => Err(anyhow::anyhow!(
                    "{}: record {} should have one integer, found {} fields",
                    time_file,
                    i + 1,
                    x.len()
                )),
            })
            .collect::<anyhow::Result<Vec<i64>>>()?;

        if reps.len() != times.len() {
            anyhow::bail!(
                "{} has {} documents but {} has {} times",
                content_file,
                reps.len(),
                time_file,
                times.len()
            );
        }

        Self::from_documents(reps, times, rng)
    }

    /// Build a corpus from in-memory feature vectors and days
    pub fn from_documents<R: Rng + ?Sized>(
        reps: Vec<Vec<f64>>,
        times: Vec<i64>,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        if reps.is_empty() {
            anyhow::bail!("no documents");
        }

        if reps.len() != times.len() {
            anyhow::bail!("{} documents but {} times", reps.len(), times.len());
        }

        let dimension = reps[0].len();
        if dimension == 0 {
            anyhow::bail!("documents have no features");
        }

        let mut docs = Vec::with_capacity(reps.len());
        for (id, (rep, day)) in reps.into_iter().zip(times).enumerate() {
            if rep.len() != dimension {
                anyhow::bail!(
                    "Data malformed; document {} has {} features, expected {}",
                    id + 1,
                    rep.len(),
                    dimension
                );
            }
            if let Some(x) = rep.iter().find(|x| !(**x >= 0.0 && x.is_finite())) {
                anyhow::bail!("Data malformed; document {} has a feature {}", id + 1, x);
            }
            docs.push(Document::new(id, day, DVec::from(rep)));
        }

        let days = docs
            .iter()
            .map(|x| x.day)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let mut ret = Corpus {
            docs,
            days,
            dimension,
            validation: BTreeSet::new(),
        };

        ret.sample_validation(rng);

        info!(
            "{} documents, {} features, {} days, {} held out",
            ret.num_docs(),
            ret.dim(),
            ret.day_count(),
            ret.validation.len()
        );

        Ok(ret)
    }

    /// Sample documents with replacement until the set of held-out
    /// identities reaches [`VALIDATION_FRACTION`] of the corpus
    fn sample_validation<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let target = VALIDATION_FRACTION * self.num_docs() as f64;
        self.validation.clear();
        while (self.validation.len() as f64) < target {
            let id = self.random_doc(rng).id;
            self.validation.insert(id);
        }
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn dim(&self) -> usize {
        self.dimension
    }

    /// Sorted distinct days
    pub fn days(&self) -> &[i64] {
        &self.days
    }

    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    pub fn doc(&self, id: usize) -> &Document {
        &self.docs[id]
    }

    pub fn validation_ids(&self) -> &BTreeSet<usize> {
        &self.validation
    }

    pub fn validation(&self) -> impl Iterator<Item = &Document> + '_ {
        self.validation.iter().map(|&i| &self.docs[i])
    }

    /// A uniformly random document
    pub fn random_doc<R: Rng + ?Sized>(&self, rng: &mut R) -> &Document {
        &self.docs[rng.random_range(0..self.docs.len())]
    }
}
