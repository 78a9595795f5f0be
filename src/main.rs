use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mwb::{BuildOptions, WebsiteBuilder};

#[derive(Parser)]
#[command(name = "mwb", version, about = "Theme-aware static website builder")]
struct Args {
    /// Website source directory.
    srcdir: PathBuf,

    /// Output directory, cleared and recreated on every build.
    #[arg(default_value = "./public")]
    dstdir: PathBuf,

    /// Print the per-page compilation log.
    #[arg(long)]
    verbose: bool,

    /// Suppress all non-fatal output.
    #[arg(long, conflicts_with = "verbose")]
    silent: bool,

    /// Skip HTML minification.
    #[arg(long)]
    no_minify: bool,

    /// Compile pages one at a time instead of in parallel.
    #[arg(long)]
    sequential: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let options = BuildOptions {
        verbose: args.verbose,
        silent: args.silent,
        minify: !args.no_minify,
        prettify: None,
        sequential: args.sequential,
    };

    let result = WebsiteBuilder::new(args.srcdir, options)
        .and_then(|builder| builder.build(&args.dstdir));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            let mut source = std::error::Error::source(&error);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }

            ExitCode::FAILURE
        }
    }
}
