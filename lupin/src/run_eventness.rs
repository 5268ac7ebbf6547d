use clap::Args;
use log::info;
use lupin::eventness::*;
use lupin::params::Parameters;
use matrix_util::common_io::write_types;

#[derive(Args, Debug)]
pub struct EventnessArgs {
    #[arg(
        required = true,
        help = "Document time file used for the fit",
        long_help = "Document time file used for the fit.\n\
		     One integer day per line."
    )]
    time_file: Box<str>,

    #[arg(required = true, help = "Output directory of `lupin fit`")]
    fit_dir: Box<str>,

    #[arg(
        long,
        short,
        default_value = "final",
        help = "Checkpoint to read: `final` or an iteration number"
    )]
    tag: Box<str>,

    #[arg(
        long = "event-dur",
        short = 'd',
        default_value_t = 7,
        help = "Number of days an event stays relevant (as in the fit)"
    )]
    event_duration: i64,

    #[arg(
        long,
        short,
        default_value = "stdout",
        help = "Output file",
        long_help = "Output file, or `stdout`.\n\
		     One line per day: day, eventness, event mass, number of documents."
    )]
    out: Box<str>,

    #[arg(long, short, help = "Verbosity")]
    verbose: bool,
}

pub fn run_eventness(args: &EventnessArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let params = Parameters {
        event_duration: args.event_duration,
        ..Default::default()
    };
    params.validate()?;

    let tag = parse_tag(&args.tag)?;
    info!("Reading {} estimates from {}", tag, args.fit_dir);

    let (entity, events) = load_fit(&args.fit_dir, &tag)?;
    let doc_days = read_doc_days(&args.time_file)?;

    let scores = eventness_by_day(&params, &doc_days, &entity, &events)?;
    write_types(&scores, &args.out)?;

    info!("Scored {} days", scores.len());
    Ok(())
}
