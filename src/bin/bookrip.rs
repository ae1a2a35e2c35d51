//! bookrip command-line interface.
//!
//! Three entry points: `rip` captures a document's pages into a working
//! directory, `merge` assembles previously captured pages into one PDF, and
//! `rip-and-merge` chains the two. Credentials not given on the command line
//! are prompted interactively; password input is not echoed.

use anyhow::Context;
use bookrip::browser::{DriverConfig, Session};
use bookrip::merge::Assembler;
use bookrip::rip::{RipOutcome, Ripper};
use bookrip::site::{Credentials, EpubPortal};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bookrip",
    version,
    about = "Rip an authenticated web reader's document into a single PDF"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rip every page of a document to HTML files in the working directory
    Rip(RipArgs),

    /// Convert and concatenate previously ripped pages into one PDF
    Merge(MergeArgs),

    /// Rip a document and merge the result in one invocation
    RipAndMerge {
        #[command(flatten)]
        rip: RipArgs,

        /// Merged output file
        #[arg(long, default_value = "output.pdf")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RipArgs {
    /// Course page URL hosting the reader link
    site: String,

    /// Title of the document to rip
    title: String,

    /// Browser driver (chrome or firefox)
    #[arg(long, default_value = "chrome")]
    driver: String,

    /// Working directory for per-page output
    #[arg(long, default_value = ".")]
    directory: PathBuf,

    /// Run the browser without a visible window (default)
    #[arg(long, overrides_with = "not_headless")]
    headless: bool,

    /// Run with a visible browser window
    #[arg(long = "not-headless")]
    not_headless: bool,

    /// Portal username (prompted when omitted)
    #[arg(long)]
    username: Option<String>,

    /// Portal password (prompted without echo when omitted)
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args)]
struct MergeArgs {
    /// Directory holding the ripped pages
    #[arg(long, default_value = ".")]
    directory: PathBuf,

    /// Merged output file
    #[arg(long, default_value = "output.pdf")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Rip(args) => {
            let outcome = run_rip(&args)?;
            report(&outcome)
        }
        Command::Merge(args) => {
            let summary = Assembler::new(DriverConfig::default())
                .run(&args.directory, &args.output)?;
            eprintln!("merged {} chapters ({} pages)", summary.documents, summary.pages);
            Ok(())
        }
        Command::RipAndMerge { rip, output } => {
            let outcome = run_rip(&rip)?;
            // The assembler only ever sees a complete output set.
            report(&outcome)?;
            let summary =
                Assembler::new(DriverConfig::default()).run(&rip.directory, &output)?;
            eprintln!("merged {} chapters ({} pages)", summary.documents, summary.pages);
            Ok(())
        }
    }
}

fn run_rip(args: &RipArgs) -> anyhow::Result<RipOutcome> {
    let headless = args.headless || !args.not_headless;
    let config = DriverConfig::new(&args.driver, headless)?;
    let credentials = resolve_credentials(args)?;

    std::fs::create_dir_all(&args.directory)
        .with_context(|| format!("cannot create {}", args.directory.display()))?;

    let session = Session::launch(&config)?;
    let site = EpubPortal::new(args.site.clone(), args.title.clone());
    let outcome = Ripper::new(session, site, credentials).run(&args.directory)?;
    Ok(outcome)
}

fn report(outcome: &RipOutcome) -> anyhow::Result<()> {
    match outcome {
        RipOutcome::Done { items } => {
            eprintln!("ripped {items} items");
            Ok(())
        }
        RipOutcome::Aborted { ripped, retries, last_error } => anyhow::bail!(
            "aborted after ripping {ripped} items ({retries} consecutive failures); \
             last failure: {last_error}"
        ),
    }
}

fn resolve_credentials(args: &RipArgs) -> anyhow::Result<Credentials> {
    let username = match &args.username {
        Some(username) => username.clone(),
        None => {
            eprint!("Username? ");
            std::io::stderr().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).context("failed to read username")?;
            line.trim().to_string()
        }
    };

    let password = match &args.password {
        Some(password) => password.clone(),
        None => rpassword::prompt_password("Password? ").context("failed to read password")?,
    };

    Ok(Credentials { username, password })
}
