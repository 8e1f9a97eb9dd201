//! Tracing/logging initialization with optional OpenTelemetry export
//!
//! Logs always go to stderr so stdout stays clean for `--print-sdl`. When an
//! OTLP endpoint is configured, spans are also exported over gRPC and W3C
//! `traceparent` headers from the gateway become the parent of request spans.

use axum::http::HeaderMap;
use opentelemetry::{
    propagation::Extractor,
    trace::{TraceError, TracerProvider as _},
    KeyValue,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogFormat;

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_format: LogFormat,
    /// OTLP gRPC endpoint; export is disabled when unset
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            otlp_endpoint: None,
            service_name: "accounts-subgraph".to_string(),
        }
    }
}

/// Handle returned by [`init`]; flushes exported spans on shutdown
#[derive(Debug)]
pub struct Telemetry {
    otlp_enabled: bool,
}

impl Telemetry {
    pub fn otlp_enabled(&self) -> bool {
        self.otlp_enabled
    }

    /// Flush pending spans and stop the exporter
    pub fn shutdown(self) {
        if self.otlp_enabled {
            opentelemetry::global::shutdown_tracer_provider();
            tracing::info!("Tracing shutdown complete");
        }
    }
}

/// Initialize tracing for the process, filtered by `RUST_LOG` (default `info`)
///
/// Safe to call multiple times; subsequent calls leave the first subscriber
/// in place.
pub fn init(config: &TelemetryConfig) -> Telemetry {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (provider, otel_error) = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => match init_otel_tracing(endpoint, &config.service_name) {
            Ok(provider) => (Some(provider), None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init();

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already set; keeping existing one");
        return Telemetry {
            otlp_enabled: false,
        };
    }

    if let Some(e) = otel_error {
        tracing::warn!("Failed to initialize OpenTelemetry: {}. Export disabled.", e);
    }

    let otlp_enabled = match provider {
        Some(provider) => {
            opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
            opentelemetry::global::set_tracer_provider(provider);
            tracing::info!(
                "Tracing initialized with OpenTelemetry export to {}",
                config.otlp_endpoint.as_deref().unwrap_or_default()
            );
            true
        }
        None => false,
    };

    Telemetry { otlp_enabled }
}

fn init_otel_tracing(endpoint: &str, service_name: &str) -> Result<TracerProvider, TraceError> {
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        service_name.to_string(),
    )]);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .with_batch_exporter(exporter, runtime::Tokio)
        .build();

    Ok(provider)
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Parent `span` on the trace context carried by incoming `traceparent` headers
///
/// A no-op unless OTLP export is enabled.
pub fn set_remote_parent(span: &tracing::Span, headers: &HeaderMap) {
    let parent = opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(headers))
    });
    span.set_parent(parent);
}
