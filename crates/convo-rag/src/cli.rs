//! Command-line arguments for the chat server
//!
//! Priority: flags > environment > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use crate::config::RagConfig;

/// convo-rag server: conversational question answering over a vector index
#[derive(Parser, Debug)]
#[command(name = "convo-rag-server", version, about)]
pub struct ServerArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", env = "CONVO_RAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

impl ServerArgs {
    /// Overlay flag values on a loaded configuration
    pub fn apply(&self, config: &mut RagConfig) {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_config_flag() {
        let args = ServerArgs::try_parse_from(["convo-rag-server", "--config", "dsa.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("dsa.toml")));
    }

    #[test]
    fn test_config_flag_requires_path() {
        let err = ServerArgs::try_parse_from(["convo-rag-server", "--config"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = ServerArgs::try_parse_from(["convo-rag-server", "--verbose"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_is_not_a_run() {
        let err = ServerArgs::try_parse_from(["convo-rag-server", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_flags_override_config() {
        let args =
            ServerArgs::try_parse_from(["convo-rag-server", "--host", "127.0.0.1", "-p", "8088"])
                .unwrap();
        let mut config = RagConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8088);
    }
}
