//! Process configuration from flags and environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::{Parser, ValueEnum};

use crate::catalog::RecommendationPolicy;
use crate::fault::ErrorInjector;
use crate::telemetry::TelemetryConfig;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Accounts subgraph settings
///
/// Every flag falls back to an environment variable, which may come from a
/// `.env` file loaded before parsing.
#[derive(Debug, Clone, Parser)]
#[command(name = "accounts-subgraph", version, about)]
pub struct Settings {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 4001)]
    pub port: u16,

    /// Percentage (0-100) of root field calls that fail with an injected error
    #[arg(long, env = "ACCOUNTS_SUBGRAPH_ERROR_RATE", default_value_t = 0.0)]
    pub error_rate: f64,

    /// How recommended products are chosen: catalog-order or shuffled
    #[arg(long, env = "ACCOUNTS_RECOMMENDATIONS", default_value_t = RecommendationPolicy::CatalogOrder)]
    pub recommendations: RecommendationPolicy,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint for span export; export is off when unset
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// `service.name` resource attribute on exported spans
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "accounts-subgraph")]
    pub service_name: String,

    /// Print the federation SDL and exit
    #[arg(long)]
    pub print_sdl: bool,
}

impl Settings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn error_injector(&self) -> ErrorInjector {
        ErrorInjector::new(self.error_rate)
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_format: self.log_format,
            otlp_endpoint: self.otlp_endpoint.clone().filter(|e| !e.is_empty()),
            service_name: self.service_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let settings = Settings::try_parse_from([
            "accounts-subgraph",
            "--host",
            "127.0.0.1",
            "--port",
            "5001",
            "--error-rate",
            "150",
            "--recommendations",
            "shuffled",
            "--log-format",
            "json",
            "--otlp-endpoint",
            "http://collector:4317",
            "--service-name",
            "accounts",
            "--print-sdl",
        ])
        .unwrap();

        assert_eq!(settings.socket_addr(), "127.0.0.1:5001".parse().unwrap());
        assert_eq!(settings.error_injector().rate(), 100.0);
        assert_eq!(settings.recommendations, RecommendationPolicy::Shuffled);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(settings.print_sdl);

        let telemetry = settings.telemetry();
        assert_eq!(telemetry.log_format, LogFormat::Json);
        assert_eq!(telemetry.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        assert_eq!(telemetry.service_name, "accounts");
    }

    #[test]
    fn test_empty_otlp_endpoint_disables_export() {
        let settings =
            Settings::try_parse_from(["accounts-subgraph", "--otlp-endpoint", ""]).unwrap();
        assert_eq!(settings.telemetry().otlp_endpoint, None);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let result =
            Settings::try_parse_from(["accounts-subgraph", "--recommendations", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Settings::command().debug_assert();
    }
}
