//! Run configuration parsed from the command line and environment.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

use crate::orchestrator::{OrchestratorConfig, DEFAULT_BATCH_SIZE};
use crate::schema::NGINX_COLLECTION;
use log_indexer_repository::ConnectionConfig;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default source file.
const DEFAULT_SOURCE_PATH: &str = "nginx.json";

/// Indexes NGINX request/response data to a given OpenSearch cluster/index name.
///
/// Every option can also be set through the environment (or a `.env` file).
#[derive(Clone, Parser)]
#[command(name = "log-indexer", version, about)]
pub struct IndexerConfig {
    /// OpenSearch API URL
    #[arg(short = 'c', long, env = "OPENSEARCH_URL", default_value = DEFAULT_OPENSEARCH_URL)]
    pub cluster: String,

    /// The index name; must be a registered collection
    #[arg(short = 'i', long, env = "INDEX_NAME", default_value = NGINX_COLLECTION)]
    pub index: String,

    /// API username
    #[arg(short = 'u', long, env = "OPENSEARCH_USERNAME")]
    pub username: Option<String>,

    /// API password
    #[arg(short = 'p', long, env = "OPENSEARCH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Path to the line-delimited JSON file to index
    #[arg(short = 'f', long = "file", env = "SOURCE_PATH", default_value = DEFAULT_SOURCE_PATH)]
    pub file: PathBuf,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Abort on the first failed bulk request
    #[arg(short = 'e', long = "exit-on-error", visible_alias = "error")]
    pub exit_on_error: bool,

    /// Documents per bulk request, also the number of lines read per chunk
    #[arg(long, env = "BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: NonZeroUsize,
}

impl IndexerConfig {
    /// Connection settings for the search provider.
    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(&self.cluster);
        config.username = self.username.clone();
        config.password = self.password.clone();
        config
    }

    /// Settings for the orchestrator.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            index: self.index.clone(),
            batch_size: self.batch_size,
            fail_fast: self.exit_on_error,
            verbose: self.verbose,
        }
    }
}

impl fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerConfig")
            .field("cluster", &self.cluster)
            .field("index", &self.index)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("file", &self.file)
            .field("verbose", &self.verbose)
            .field("exit_on_error", &self.exit_on_error)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
