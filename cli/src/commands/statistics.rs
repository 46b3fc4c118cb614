//! Statistics command implementation

use super::ConnectArgs;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use warden_gateway::server::proto::StatInterval;
use warden_shared::StatSnapshot;

#[derive(Args, Debug)]
pub struct StatisticsArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Seconds between snapshots
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(i64).range(1..))]
    pub interval: i64,
}

pub async fn run(args: StatisticsArgs) -> Result<()> {
    let mut client = args.connect.admin_client().await?;
    let request = StatInterval {
        interval_seconds: args.interval,
    };
    let mut stream = client
        .statistics(args.connect.request(request)?)
        .await
        .context("Statistics request rejected")?
        .into_inner();

    while let Some(stat) = stream.message().await.context("Statistics stream failed")? {
        let snapshot = StatSnapshot::from(stat);
        if args.connect.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!("{}", output::format_snapshot(&snapshot));
        }
    }

    tracing::info!("gateway closed the statistics stream");
    Ok(())
}
