use crate::special_fn::*;
use crate::traits::*;
use matrix_util::traits::SampleOps;
use ndarray::prelude::*;
use ndarray::Zip;

pub struct GammaMatrix {
    num_rows: usize,
    num_columns: usize,
    //////////////////////
    // hyper parameters //
    //////////////////////
    a0: f64,
    b0: f64,
    // shape and rate are clipped back to this after each update
    clip_floor: f64,
    ///////////////////////////
    // variational parameter //
    ///////////////////////////
    a_stat: Array2<f64>,
    b_stat: Array2<f64>,
    //////////////////////////
    // estimated parameters //
    //////////////////////////
    estimated_mean: Array2<f64>,
}

impl GammaMatrix {
    /// Floor applied to any non-positive shape or rate after
    /// [`ScoreFunctionParam::stochastic_update`]
    pub fn with_clip_floor(mut self, clip_floor: f64) -> Self {
        self.clip_floor = clip_floor;
        self
    }
}

impl TwoStatParam for GammaMatrix {
    type Mat = Array2<f64>;
    type Scalar = f64;

    /// New Gamma variational parameter matrix
    ///
    /// x[i,j] ~ Gamma(a0, b0)       (prior)
    /// q(x[i,j]) = Gamma(a[i,j], b[i,j])
    ///
    /// The variational parameters start at the prior.
    ///
    /// #Arguments
    /// * `dims` - dimensions of the matrix (num of rows, num of columns)
    /// * `a` - hyper parameter a0 (shape)
    /// * `b` - hyper parameter b0 (rate)
    ///
    fn new(dims: (usize, usize), a: Self::Scalar, b: Self::Scalar) -> Self {
        let mut ret = Self {
            num_rows: dims.0,
            num_columns: dims.1,
            a0: a,
            b0: b,
            clip_floor: MIN_POSITIVE,
            a_stat: Self::Mat::zeros(dims),
            b_stat: Self::Mat::zeros(dims),
            estimated_mean: Self::Mat::zeros(dims),
        };
        ret.reset_stat();
        ret
    }

    fn update_stat(&mut self, update_a: &Self::Mat, update_b: &Self::Mat) {
        self.a_stat.assign(update_a);
        self.b_stat.assign(update_b);
        self.calibrate();
    }

    fn reset_stat(&mut self) {
        self.a_stat.fill(self.a0);
        self.b_stat.fill(self.b0);
        self.calibrate();
    }

    fn shape_stat(&self) -> &Self::Mat {
        &self.a_stat
    }

    fn rate_stat(&self) -> &Self::Mat {
        &self.b_stat
    }

    fn calibrate(&mut self) {
        self.estimated_mean = &self.a_stat / &self.b_stat;
    }
}

impl Inference for GammaMatrix {
    type Mat = Array2<f64>;

    fn posterior_mean(&self) -> &Self::Mat {
        &self.estimated_mean
    }

    fn nrows(&self) -> usize {
        self.num_rows
    }

    fn ncols(&self) -> usize {
        self.num_columns
    }
}

impl ScoreFunctionParam for GammaMatrix {
    type Mat = Array2<f64>;
    type Scalar = f64;

    /// x[i,j] ~ Gamma(a[i,j], 1/b[i,j]); exact zeros are floored
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> anyhow::Result<Self::Mat> {
        let mut x = Self::Mat::rgamma_with(&self.a_stat, &self.b_stat, rng)?;
        floor_zeros_inplace(&mut x);
        Ok(x)
    }

    fn log_prior(&self, x: &Self::Mat) -> Self::Mat {
        let (a0, b0) = (self.a0, self.b0);
        x.mapv(|x| gamma_log_pdf(x, a0, b0))
    }

    fn log_variational(&self, x: &Self::Mat) -> Self::Mat {
        let mut ret = Self::Mat::zeros(x.dim());
        Zip::from(&mut ret)
            .and(x)
            .and(&self.a_stat)
            .and(&self.b_stat)
            .for_each(|q, &x, &a, &b| *q = gamma_log_pdf(x, a, b));
        ret
    }

    /// ```text
    /// d/da ln q(x) = ln(b) - digamma(a) + ln(x)
    /// d/db ln q(x) = a/b - x
    /// ```
    fn score(&self, x: &Self::Mat) -> (Self::Mat, Self::Mat) {
        let mut g_a = Self::Mat::zeros(x.dim());
        let mut g_b = Self::Mat::zeros(x.dim());
        Zip::from(&mut g_a)
            .and(&mut g_b)
            .and(x)
            .and(&self.a_stat)
            .and(&self.b_stat)
            .for_each(|g_a, g_b, &x, &a, &b| {
                *g_a = b.ln() - digamma(a) + x.ln();
                *g_b = a / b - x;
            });
        (g_a, g_b)
    }

    fn stochastic_update(&mut self, rho: Self::Scalar, grad_a: &Self::Mat, grad_b: &Self::Mat) {
        let floor = self.clip_floor;

        // NaN counts as non-positive
        let clip = |x: &mut f64| {
            if !(*x > 0.0) {
                *x = floor;
            }
        };

        self.a_stat.scaled_add(rho, grad_a);
        self.b_stat.scaled_add(rho, grad_b);
        self.a_stat.map_inplace(clip);
        self.b_stat.map_inplace(clip);

        self.calibrate();
    }
}
