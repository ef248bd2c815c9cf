use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use coderag_cli::config::settings_help;
use coderag_cli::{run, AnalysisMode, Config};
use std::path::PathBuf;
use std::process;

/// Analyze a source file with a hosted LLM, optionally augmented with
/// context retrieved from a PDF corpus.
#[derive(Parser, Debug)]
#[command(name = "coderag", version, about)]
struct Args {
    /// Source file to analyze
    input_file: PathBuf,

    /// Use retrieval-augmented analysis (default)
    #[arg(long, overrides_with = "no_rag")]
    rag: bool,

    /// Skip retrieval and query the model directly
    #[arg(long, overrides_with = "rag")]
    no_rag: bool,

    /// Use PDFs from the custom corpus folder
    #[arg(long, overrides_with = "default_pdf")]
    custom_pdf: bool,

    /// Use the bundled default PDFs (default)
    #[arg(long, overrides_with = "custom_pdf")]
    default_pdf: bool,
}

/// Parse arguments, exiting 0 for help/version and 1 for usage errors.
fn parse_args() -> Args {
    let parsed = Args::command()
        .after_help(settings_help())
        .try_get_matches()
        .and_then(|matches| Args::from_arg_matches(&matches));
    match parsed {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = parse_args();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    let mode = if args.no_rag {
        AnalysisMode::Direct
    } else {
        AnalysisMode::Rag
    };

    if let Err(e) = run(&config, &args.input_file, mode, args.custom_pdf).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
