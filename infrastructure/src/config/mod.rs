//! Configuration file loading for chatloop
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CHATLOOP_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./chatloop.toml` or `./.chatloop.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/chatloop/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_SERVER_ID, FileAgentConfig, FileCacheConfig, FileConfig, FileErrorHandlingConfig,
    FileJanConfig, FileLoggingConfig, FileQueueConfig, FileServerConfig, FileSessionConfig,
    catalog_policy, default_servers, expand_home,
};
pub use loader::ConfigLoader;
