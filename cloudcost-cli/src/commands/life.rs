//! Life command - report long-running machines.

use anyhow::Result;
use cloudcost_engine::LifetimeRun;
use tracing::info;

use super::cost::FilterArgs;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{app, Cli, ExitCode, OutputFormat};

/// Runs the life command.
pub async fn run(args: &FilterArgs, cli: &Cli) -> Result<ExitCode> {
    let config = app::load_config(cli)?;
    let ctx = app::fetch_context(&config);
    let engine = app::engine(&config, ctx.clone())?;

    let mut run = LifetimeRun::new(engine).dry(cli.dry);
    if !cli.dry {
        if let Some(pipeline) = app::delivery(&config, &ctx)? {
            run = run.with_delivery(pipeline);
        }
    }

    info!(dry = cli.dry, "Running lifetime check");
    let summary = run.execute(&args.filter()).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            print!("{}", formatter.format_lifetime_run(&summary));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_lifetime_run(&summary)?);
        }
    }

    let delivered = summary.delivery.as_ref().is_none_or(cloudcost_engine::DeliveryReport::is_ok);
    Ok(if delivered {
        ExitCode::Success
    } else {
        ExitCode::DeliveryFailed
    })
}
