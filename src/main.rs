use clap::Parser;
use screen_fusion::cli::commands::{cmd_align, cmd_apply, cmd_fuse};
use screen_fusion::cli::config::{Cli, Commands, load_config};
use screen_fusion::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    screen_fusion::init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let tracer = match cli.trace.as_deref() {
        Some(path) => TraceLogger::open(path),
        None => TraceLogger::disabled(),
    };
    if tracer.is_enabled() {
        tracing::debug!(path = ?cli.trace, "trace logging enabled");
    }

    match cli.command {
        Commands::Apply {
            raw,
            plan,
            output,
            source,
            pretty,
        } => {
            cmd_apply(
                &raw,
                plan.as_deref(),
                output.as_deref(),
                source.as_deref(),
                pretty,
                &config,
                &tracer,
            )?;
        }
        Commands::Fuse {
            image,
            raw,
            output,
            endpoint,
            model,
            pretty,
        } => {
            cmd_fuse(
                &image,
                &raw,
                output.as_deref(),
                endpoint.as_deref(),
                model.as_deref(),
                pretty,
                &config,
                &tracer,
            )?;
        }
        Commands::Align {
            final_doc,
            raw,
            output,
            pretty,
        } => {
            cmd_align(&final_doc, &raw, output.as_deref(), pretty, &config)?;
        }
    }

    Ok(())
}
