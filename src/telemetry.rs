//! Tracing setup: env filter, pretty or JSON console output and optional
//! OTLP span export.

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::LoggingConfig;

/// Flushes pending spans when dropped
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shut down trace exporter: {e}");
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},tower_http=info", config.level)))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match config.format.as_str() {
        "json" => fmt::layer().json().with_target(true).boxed(),
        _ => fmt::layer().pretty().with_target(true).boxed(),
    });

    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build()
                .with_context(|| format!("Failed to create OTLP exporter for {endpoint}"))?;
            let provider = SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_resource(Resource::builder().with_service_name("newsmap").build())
                .build();
            layers.push(
                tracing_opentelemetry::layer()
                    .with_tracer(provider.tracer("newsmap"))
                    .boxed(),
            );
            Some(provider)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .with_context(|| "Failed to install tracing subscriber")?;

    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::info!("Exporting traces to {}", endpoint);
    }
    Ok(TelemetryGuard { provider })
}
