//! Cost command - aggregate, export and deliver.

use anyhow::Result;
use clap::Args;
use cloudcost_engine::CostRun;
use cloudcost_store::AccountFilter;
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{app, Cli, ExitCode, OutputFormat};

/// Account selection shared by `cost` and `life`.
#[derive(Args, Default)]
pub struct FilterArgs {
    /// Provider id to include. Repeat for several.
    #[arg(long, short)]
    pub provider: Vec<String>,

    /// Single account name to include.
    #[arg(long, short)]
    pub account: Option<String>,
}

impl FilterArgs {
    /// Converts to a store filter.
    pub fn filter(&self) -> AccountFilter {
        AccountFilter {
            providers: self.provider.clone(),
            account: self.account.clone(),
        }
    }
}

/// Runs the cost command.
pub async fn run(args: &FilterArgs, cli: &Cli) -> Result<ExitCode> {
    let config = app::load_config(cli)?;
    let ctx = app::fetch_context(&config);
    let engine = app::engine(&config, ctx.clone())?;

    let mut run = CostRun::new(engine, config.export_dir()).dry(cli.dry);
    if !cli.dry {
        if let Some(pipeline) = app::delivery(&config, &ctx)? {
            run = run.with_delivery(pipeline);
        }
    }

    info!(dry = cli.dry, "Running cost check");
    let summary = run.execute(&args.filter()).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            print!("{}", formatter.format_cost_run(&summary));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_cost_run(&summary)?);
        }
    }

    let delivered = summary.delivery.as_ref().is_none_or(cloudcost_engine::DeliveryReport::is_ok);
    Ok(if delivered {
        ExitCode::Success
    } else {
        ExitCode::DeliveryFailed
    })
}
