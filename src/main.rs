//! Main entry point for ctfetch CLI

use anyhow::{bail, Context};
use clap::Parser;
use ctfetch::cli::args::VerbosityLevel;
use ctfetch::cli::output::{OutputFormatter, OutputSink, ReportingSink};
use ctfetch::cli::Args;
use ctfetch::{LinkExtractor, ShareReference};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    init_logging(args.verbosity_level());
    debug!("Starting ctfetch with args: {:?}", args);

    let mut formatter = OutputFormatter::new(args.verbosity_level());
    if let Err(e) = run(&args, &mut formatter).await {
        formatter.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(args: &Args, formatter: &mut OutputFormatter) -> anyhow::Result<()> {
    let share = ShareReference::parse(&args.url).context("invalid share URL")?;
    let extractor = LinkExtractor::from_options(&args.extract_options())?;

    // Opened before any request so a bad path fails fast
    let mut sink = OutputSink::open(args.output.as_deref()).with_context(|| match &args.output {
        Some(path) => format!("cannot open {}", path.display()),
        None => "cannot open stdout".to_string(),
    })?;

    formatter.print_start(share.as_str(), extractor.agent_count());
    formatter.create_progress_bar(extractor.agent_count() as u64);

    let outcome = {
        let mut reporting = ReportingSink::new(&mut sink, formatter);
        extractor.run(&share, &mut reporting).await
    };
    formatter.finish_progress();

    let result = outcome.context("link extraction failed")?;
    sink.finish().context("cannot flush output")?;

    info!("Run finished with {} link(s)", result.links().len());
    formatter.print_summary(&result);

    if result.all_failed() {
        bail!("every user agent failed at the transport level");
    }
    Ok(())
}

/// Initialize logging system
fn init_logging(verbosity: VerbosityLevel) {
    // RUST_LOG wins over -v/-q
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter()));

    // Logs go to stderr; stdout may be the link sink
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
