//! Logging command implementation

use super::ConnectArgs;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use warden_gateway::server::proto::Nothing;
use warden_shared::AuditEvent;

#[derive(Args, Debug)]
pub struct LoggingArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

pub async fn run(args: LoggingArgs) -> Result<()> {
    let mut client = args.connect.admin_client().await?;
    let mut stream = client
        .logging(args.connect.request(Nothing::default())?)
        .await
        .context("Logging request rejected")?
        .into_inner();

    while let Some(event) = stream.message().await.context("Logging stream failed")? {
        let event = AuditEvent::from(event);
        if args.connect.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{}", output::format_event(&event));
        }
    }

    tracing::info!("gateway closed the logging stream");
    Ok(())
}
