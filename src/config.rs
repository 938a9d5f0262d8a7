//! Command-line configuration.
//!
//! ```bash
//! flatfile_server 8080 --directory /srv/files
//! FLATFILE_HOST=0.0.0.0 flatfile_server 8080
//! ```

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::server::listener::ListenerConfig;

/// Serves GET and PUT for the files in a single flat directory
#[derive(Debug, Clone, Parser)]
#[command(name = "flatfile_server")]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "FLATFILE_HOST")]
    pub host: IpAddr,

    /// Directory that request targets are resolved in
    #[arg(long, default_value = ".", env = "FLATFILE_DIR")]
    pub directory: PathBuf,
}

impl Config {
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            root: self.directory.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn parse_port_only() {
        let config =
            Config::try_parse_from(["flatfile_server", "8080"]).expect("A bare port should parse");
        assert_eq!(8080, config.port);
        assert_eq!(IpAddr::V4(Ipv4Addr::LOCALHOST), config.host);
        assert_eq!(PathBuf::from("."), config.listener_config().root);
    }

    #[test]
    fn parse_all_options() {
        let config = Config::try_parse_from([
            "flatfile_server",
            "65535",
            "--host",
            "0.0.0.0",
            "--directory",
            "/srv/files",
        ])
        .expect("All options should parse");
        assert_eq!(65535, config.port);
        assert_eq!(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.host);
        assert_eq!(PathBuf::from("/srv/files"), config.directory);
    }

    #[test]
    fn parse_rejects_invalid_ports() {
        for port in ["0", "65536", "-1", "http"] {
            Config::try_parse_from(["flatfile_server", port])
                .expect_err(&format!("Port {port} should be rejected"));
        }
    }

    #[test]
    fn parse_requires_port() {
        Config::try_parse_from(["flatfile_server"]).expect_err("The port is required");
    }

    #[test]
    fn parse_rejects_extra_arguments() {
        Config::try_parse_from(["flatfile_server", "8080", "9090"])
            .expect_err("Only one port may be given");
    }
}
