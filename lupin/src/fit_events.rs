use clap::Args;
use log::{info, warn};
use lupin::corpus::Corpus;
use lupin::model::Model;
use lupin::params::Parameters;
use matrix_util::common_io::recreate_dir;
use rand::SeedableRng;

#[derive(Args, Debug)]
pub struct FitArgs {
    #[arg(
        required = true,
        help = "Document content file",
        long_help = "Document content file (`.gz` is fine).\n\
		     One document per line, tab-separated non-negative values,\n\
		     e.g., topic proportions. Every line needs the same number of fields."
    )]
    content_file: Box<str>,

    #[arg(
        required = true,
        help = "Document time file",
        long_help = "Document time file (`.gz` is fine).\n\
		     One integer day per line, in the same order as the content file."
    )]
    time_file: Box<str>,

    #[arg(
        long,
        short,
        default_value = "out",
        help = "Output directory",
        long_help = "Output directory. An existing directory is removed first.\n\
		     Generated files:\n\
		     - {out}/settings.dat\n\
		     - {out}/log.dat\n\
		     - {out}/entities_{iter|final}.tsv\n\
		     - {out}/events_{iter|final}.tsv\n"
    )]
    out: Box<str>,

    #[arg(
        long = "batch",
        short = 'b',
        default_value_t = 1024,
        help = "Number of documents per batch"
    )]
    batch_size: usize,

    #[arg(
        long = "samples",
        short = 's',
        default_value_t = 64,
        help = "Number of Monte Carlo samples per document"
    )]
    num_samples: usize,

    #[arg(
        long,
        default_value_t = 10,
        help = "Save the estimates every this many iterations"
    )]
    save_freq: usize,

    #[arg(
        long,
        default_value_t = 1e-3,
        help = "Likelihood threshold for convergence",
        long_help = "Stop once the relative change of the held-out\n\
		     log-likelihood is non-negative and below this value."
    )]
    convergence_thresh: f64,

    #[arg(long, default_value_t = 1000, help = "Maximum number of iterations")]
    max_iter: usize,

    #[arg(
        long,
        help = "Random seed",
        long_help = "Random seed. Taken from the clock if not given;\n\
		     the seed in use is recorded in settings.dat."
    )]
    seed: Option<u64>,

    #[arg(
        long,
        default_value_t = 1024.,
        help = "Delay of the learning rate",
        long_help = "Positive delay that downweights early iterations:\n\
		     rho = (iteration + tau)^(-kappa)"
    )]
    tau: f64,

    #[arg(
        long,
        default_value_t = 0.7,
        help = "Forgetting rate of the learning rate",
        long_help = "Forgetting rate in rho = (iteration + tau)^(-kappa).\n\
		     Should be in (0.5, 1.0] to guarantee asymptotic convergence."
    )]
    kappa: f64,

    #[arg(long, default_value_t = 0.3, help = "Shape prior on entities")]
    a_entities: f64,

    #[arg(long, default_value_t = 0.3, help = "Rate prior on entities")]
    b_entities: f64,

    #[arg(long, default_value_t = 0.3, help = "Shape prior on events")]
    a_events: f64,

    #[arg(long, default_value_t = 0.3, help = "Rate prior on events")]
    b_events: f64,

    #[arg(
        long,
        default_value_t = 0.3,
        help = "Rate prior (and partial shape prior) on documents"
    )]
    b_docs: f64,

    #[arg(
        long = "event-dur",
        short = 'd',
        default_value_t = 7,
        help = "Number of days an event stays relevant"
    )]
    event_duration: i64,

    #[arg(
        long,
        help = "Number of worker threads",
        long_help = "Number of worker threads for the minibatch gradients.\n\
		     Defaults to the number of CPUs. Results do not depend on it."
    )]
    threads: Option<usize>,

    #[arg(
        long,
        short,
        help = "Verbosity",
        long_help = "Enable verbose output.\n\
		     Prints the likelihood trace during the fit."
    )]
    verbose: bool,
}

impl FitArgs {
    fn to_params(&self) -> Parameters {
        Parameters {
            outdir: self.out.clone(),
            batch_size: self.batch_size,
            num_samples: self.num_samples,
            save_freq: self.save_freq,
            convergence_thresh: self.convergence_thresh,
            max_iter: self.max_iter,
            tau: self.tau,
            kappa: self.kappa,
            a_entity: self.a_entities,
            b_entity: self.b_entities,
            a_events: self.a_events,
            b_events: self.b_events,
            b_docs: self.b_docs,
            event_duration: self.event_duration,
            progress: !self.verbose,
        }
    }
}

fn seed_from_clock() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

pub fn fit_events(args: &FitArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let params = args.to_params();
    params.validate()?;

    let num_threads = args.threads.unwrap_or_else(num_cpus::get).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let seed = args.seed.unwrap_or_else(seed_from_clock);
    info!("random seed: {}", seed);
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    // 1. read the data
    let corpus = Corpus::from_files(&args.content_file, &args.time_file, &mut rng)?;

    // 2. clean output directory
    if recreate_dir(&params.outdir)? {
        warn!(
            "Output directory {} already existed; removed it to have a clean output directory",
            params.outdir
        );
    }
    params.save(seed)?;

    // 3. fit
    let mut model = Model::new(&corpus, &params);
    let summary = model.fit(&mut rng)?;

    info!(
        "{:?} after {} iterations: held-out log-likelihood {}",
        summary.status, summary.iterations, summary.likelihood
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct FitCli {
        #[command(flatten)]
        args: FitArgs,
    }

    #[test]
    fn progress_bar_gives_way_to_verbose_logging() {
        let quiet = FitCli::parse_from(["lupin", "content.tsv", "times.txt"]).args;
        assert!(quiet.to_params().progress);

        let verbose = FitCli::parse_from(["lupin", "content.tsv", "times.txt", "-v"]).args;
        assert!(!verbose.to_params().progress);
    }

    #[test]
    fn defaults_match_parameters() {
        let params = FitCli::parse_from(["lupin", "c.tsv", "t.txt", "-d", "3"])
            .args
            .to_params();
        let defaults = Parameters::default();
        assert_eq!(params.batch_size, defaults.batch_size);
        assert_eq!(params.num_samples, defaults.num_samples);
        assert_eq!(params.tau, defaults.tau);
        assert_eq!(params.kappa, defaults.kappa);
        assert_eq!(params.event_duration, 3);
    }
}
