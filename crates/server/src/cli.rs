//! Command-line and environment settings for the server process
//!
//! Storage credentials are not read here; see `fsg_core::StorageConfig`.

use std::net::{IpAddr, SocketAddr};

use clap::Parser;

/// fsgd - HTTP facade for S3-compatible file storage
#[derive(Parser, Debug)]
#[command(name = "fsgd")]
#[command(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Address to bind to (IPv4 or IPv6)
    #[arg(long, default_value = "0.0.0.0", env = "FSG_HOST")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "FSG_PORT")]
    pub port: u16,

    /// Serve the OpenAPI document and Swagger UI
    #[arg(long, env = "FSG_OPENAPI")]
    pub openapi: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FSG_LOG_LEVEL")]
    pub log_level: String,
}

impl ServerArgs {
    /// Socket address the server listens on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Filter used when RUST_LOG is not set
    pub fn default_log_filter(&self) -> String {
        format!(
            "filestore_gateway={0},fsg_s3={0},fsg_core={0},tower_http=info",
            self.log_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = ServerArgs::parse_from(["fsgd"]);
        assert_eq!(args.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(args.port, 8080);
        assert_eq!(args.log_level, "info");
        assert!(!args.openapi);
        assert_eq!(args.listen_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = ServerArgs::parse_from(["fsgd", "--host", "127.0.0.1", "-p", "9000"]);
        assert_eq!(args.listen_addr().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_ipv6_host() {
        let args = ServerArgs::parse_from(["fsgd", "--host", "::"]);
        assert!(args.listen_addr().is_ipv6());
        assert_eq!(args.listen_addr().to_string(), "[::]:8080");

        let args = ServerArgs::parse_from(["fsgd", "--host", "::1", "--port", "9000"]);
        assert_eq!(args.listen_addr().to_string(), "[::1]:9000");
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(ServerArgs::try_parse_from(["fsgd", "--host", "localhost:80"]).is_err());
    }

    #[test]
    fn test_openapi_flag() {
        let args = ServerArgs::parse_from(["fsgd", "--openapi"]);
        assert!(args.openapi);
    }

    #[test]
    fn test_default_log_filter() {
        let args = ServerArgs::parse_from(["fsgd", "--log-level", "debug"]);
        let filter = args.default_log_filter();
        assert!(filter.contains("filestore_gateway=debug"));
        assert!(filter.contains("fsg_s3=debug"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(ServerArgs::try_parse_from(["fsgd", "--port", "http"]).is_err());
    }
}
