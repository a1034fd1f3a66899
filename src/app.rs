//! Process bootstrap: configuration plus the wiring from config to a
//! ready-to-use [`SearchService`].

use std::path::PathBuf;
use std::sync::Arc;

use crate::bridge::{BrokerBridge, DirectBridge, ReplyBridge, ReplyChannelAllocator};
use crate::broker::{self, BrokerPool};
use crate::cli::{Cli, OutputFormat};
use crate::config::{BridgeMode, Config};
use crate::error::Result;
use crate::search::SearchService;
use crate::upstream::{PlosClient, UpstreamSource};

/// Everything a command needs, built once from the CLI flags.
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let output_format = cli.output_format();
        Ok(Self {
            config,
            config_path: cli.config.clone(),
            output_format,
            robot_mode: output_format.is_machine_readable(),
            verbosity: cli.verbose,
        })
    }

    /// Search service for one deployment context. Only the broker that
    /// context needs is connected.
    pub fn search_service(&self, in_cloud: bool) -> Result<SearchService> {
        Ok(SearchService::new(build_bridge(&self.config, in_cloud)?))
    }
}

/// Build the configured bridge, connecting the broker for `in_cloud`.
pub fn build_bridge(config: &Config, in_cloud: bool) -> Result<Arc<dyn ReplyBridge>> {
    let source: Arc<dyn UpstreamSource> = Arc::new(PlosClient::from_config(&config.upstream)?);

    match config.broker.mode {
        BridgeMode::Direct => {
            tracing::debug!("broker disabled; results are returned in-process");
            Ok(Arc::new(DirectBridge::new(source)))
        }
        BridgeMode::Broker => {
            let url = config.broker.url_for(in_cloud);
            let client = broker::connect(url, config.broker.connect_timeout())?;
            tracing::debug!(broker = url, in_cloud, "broker connected");

            let pool = if in_cloud {
                BrokerPool::new().with_cloud(client)
            } else {
                BrokerPool::new().with_local(client)
            };
            Ok(Arc::new(BrokerBridge::new(
                pool,
                source,
                ReplyChannelAllocator::new(config.broker.inbox_prefix.clone()),
                config.broker.reply_timeout(),
            )))
        }
    }
}
