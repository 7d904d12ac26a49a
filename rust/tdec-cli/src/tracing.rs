// rust/tdec-cli/src/tracing.rs
// Tracing initialization for OpenTelemetry integration

#[cfg(feature = "otel")]
pub fn init_tracing() -> Result<(), String> {
    use opentelemetry::global;
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};
    use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Check for TDEC_TRACE environment variable (default to "info")
    let trace_level = std::env::var("TDEC_TRACE").unwrap_or_else(|_| "info".to_string()).to_lowercase();

    // Map TDEC_TRACE values to tracing levels
    let filter = match trace_level.as_str() {
        "error" => EnvFilter::new("error"),
        "warn" => EnvFilter::new("warn"),
        "info" => EnvFilter::new("info"),
        "debug" => EnvFilter::new("debug"),
        "trace" => EnvFilter::new("trace"),
        "1" | "true" | "yes" => EnvFilter::new("debug"),
        "0" | "false" | "no" => EnvFilter::new("error"),
        _ => EnvFilter::new("info"),
    };

    // Check if OTLP export is enabled
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let service_name = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "tdec-cli".to_string());

    let resource = Resource::builder().with_service_name(service_name).build();

    let tracer_provider = if let Some(endpoint) = otlp_endpoint {
        let exporter = SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| format!("Failed to initialize OTLP exporter: {}", e))?;
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(exporter)
            .build()
    } else {
        SdkTracerProvider::builder().with_resource(resource).build()
    };

    global::set_tracer_provider(tracer_provider.clone());
    let tracer = opentelemetry::trace::TracerProvider::tracer(&tracer_provider, "tdec-cli");
    let otel_layer = OpenTelemetryLayer::new(tracer);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .with(otel_layer)
        .init();

    Ok(())
}

#[cfg(not(feature = "otel"))]
pub fn init_tracing() -> Result<(), String> {
    let trace_level = std::env::var("TDEC_TRACE").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(trace_level).try_init().map_err(|e| e.to_string())
}
