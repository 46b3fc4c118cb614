//! Subcommand implementations

pub mod logging;
pub mod statistics;

use anyhow::{Context, Result};
use clap::Args;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::Channel;
use tonic::Request;
use warden_gateway::server::intercept::CONSUMER_HEADER;
use warden_gateway::server::proto::admin_client::AdminClient;

/// Connection options shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Gateway gRPC endpoint
    #[arg(short, long, env = "WARDEN_ENDPOINT", default_value = "http://127.0.0.1:50051")]
    pub endpoint: String,

    /// Consumer identity sent with every call
    #[arg(short, long, env = "WARDEN_CONSUMER")]
    pub consumer: String,

    /// Print one JSON object per line instead of text
    #[arg(long)]
    pub json: bool,
}

impl ConnectArgs {
    pub async fn admin_client(&self) -> Result<AdminClient<Channel>> {
        AdminClient::connect(self.endpoint.clone())
            .await
            .with_context(|| format!("Failed to connect to gateway at {}", self.endpoint))
    }

    /// Wrap `message` with the consumer metadata.
    pub fn request<T>(&self, message: T) -> Result<Request<T>> {
        let value: MetadataValue<Ascii> = self
            .consumer
            .parse()
            .context("Consumer must be printable ASCII")?;
        let mut req = Request::new(message);
        req.metadata_mut().insert(CONSUMER_HEADER, value);
        Ok(req)
    }
}
