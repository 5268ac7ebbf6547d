pub trait Inference {
    type Mat;

    fn posterior_mean(&self) -> &Self::Mat;

    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
}

/// A parameter matrix with two types of statistics
/// with hyper parameters a0 and b0
pub trait TwoStatParam {
    type Mat;
    type Scalar;

    fn new(dims: (usize, usize), a0: Self::Scalar, b0: Self::Scalar) -> Self;
    fn update_stat(&mut self, update_a: &Self::Mat, update_b: &Self::Mat);
    fn reset_stat(&mut self);

    fn shape_stat(&self) -> &Self::Mat;
    fn rate_stat(&self) -> &Self::Mat;

    fn calibrate(&mut self);
}

/// Black-box variational inference with the score-function
/// (REINFORCE) estimator
///
/// ```text
/// grad ELBO = E_q[ grad ln q(x) * (ln p(x) - ln q(x)) ]
/// ```
pub trait ScoreFunctionParam {
    type Mat;
    type Scalar;

    /// Draw a sample from the current variational distribution
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> anyhow::Result<Self::Mat>;

    /// Elementwise log-density of `x` under the fixed prior
    fn log_prior(&self, x: &Self::Mat) -> Self::Mat;

    /// Elementwise log-density of `x` under the current variational
    /// distribution
    fn log_variational(&self, x: &Self::Mat) -> Self::Mat;

    /// Gradients of `ln q(x)` with respect to the variational
    /// parameters, evaluated at `x`
    fn score(&self, x: &Self::Mat) -> (Self::Mat, Self::Mat);

    /// `param += rho * grad`, followed by clipping and calibration
    fn stochastic_update(&mut self, rho: Self::Scalar, grad_a: &Self::Mat, grad_b: &Self::Mat);
}
