use crate::common_io::Delimiter;

/// Operations to sample random matrices with a caller-provided
/// generator, so that a single seeded stream controls every draw
pub trait SampleOps {
    type Mat;
    type Scalar;

    /// Sample a matrix from a uniform distribution `U(0,1)`
    fn runif_with<R: rand::Rng + ?Sized>(dd: usize, nn: usize, rng: &mut R) -> Self::Mat;

    /// Sample a matrix from a gamma distribution, element by element,
    /// with the shape `α[i,j]` and rate `β[i,j]`
    ///
    /// $$f(x|\alpha,\beta) = \frac{\beta^{\alpha}}{\Gamma(\alpha)} x^{\alpha - 1} e^{-\beta x}$$
    ///
    /// Note: `scale = 1/rate` or $\theta = 1/\beta$
    fn rgamma_with<R: rand::Rng + ?Sized>(
        shape: &Self::Mat,
        rate: &Self::Mat,
        rng: &mut R,
    ) -> anyhow::Result<Self::Mat>;
}

/// Read and write matrices from and to files
pub trait IoOps {
    type Scalar;
    type Mat;

    fn read_file_delim(file: &str, delim: impl Into<Delimiter>) -> anyhow::Result<Self::Mat>;

    fn from_tsv(tsv_file: &str) -> anyhow::Result<Self::Mat> {
        Self::read_file_delim(tsv_file, "\t")
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }
}
