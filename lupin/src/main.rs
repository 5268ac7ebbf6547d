mod fit_events;
mod run_eventness;

use clap::{Parser, Subcommand};
use fit_events::*;
use log::info;
use run_eventness::*;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LUPIN",
    long_about = "Latent Unfolding of Persistent entities and INtermittent events\n\
		  Fit a baseline + decaying-event Gamma intensity model\n\
		  to a time-stamped collection of document feature vectors."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Fit entity and event rates by stochastic variational inference",
        long_about = "Fit the entity (baseline) and event rates in three stages:\n\
		      (1) Read document features and days, hold out a validation set\n\
		      (2) Update the Gamma variational posteriors with score-function gradients\n\
		      (3) Stop on convergence, three likelihood decreases, or the iteration cap.\n"
    )]
    Fit(FitArgs),

    #[command(
        about = "Score each day by the share of its rate explained by events",
        long_about = "Read the entity and event estimates of a saved fit and report,\n\
		      for every observed day, event_mass / (baseline_mass + event_mass).\n"
    )]
    Eventness(EventnessArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Fit(args) => {
            fit_events(args)?;
        }
        Commands::Eventness(args) => {
            run_eventness(args)?;
        }
    }

    info!("Done");
    Ok(())
}
