use std::time::Duration;

use tycostream_core::SourceDefinition;

/// Log output format for `tracing-subscriber` (§10.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, for local development.
    #[default]
    Pretty,
    /// Newline-delimited JSON, for production log aggregation.
    Json,
}

/// Fully resolved server configuration: where to listen, where the upstream
/// streaming database lives, and the source catalog to serve.
#[derive(Debug, Clone)]
pub struct TycostreamSettings {
    listen_addr: String,
    upstream_dsn: String,
    connect_timeout: Duration,
    log_format: LogFormat,
    sources: Vec<SourceDefinition>,
}

impl TycostreamSettings {
    /// Start a settings builder with the required `upstream_dsn` and `sources`;
    /// everything else defaults (`0.0.0.0:4000`, a 10s connect timeout, pretty logs).
    #[must_use]
    pub fn new(upstream_dsn: impl Into<String>, sources: Vec<SourceDefinition>) -> Self {
        Self {
            listen_addr: "0.0.0.0:4000".to_string(),
            upstream_dsn: upstream_dsn.into(),
            connect_timeout: Duration::from_secs(10),
            log_format: LogFormat::default(),
            sources,
        }
    }

    /// Override the GraphQL listen address.
    #[must_use]
    pub fn with_listen_addr(mut self, listen_addr: impl Into<String>) -> Self {
        self.listen_addr = listen_addr.into();
        self
    }

    /// Override the upstream connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the log output format.
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Address the GraphQL/webhook-trigger server should bind.
    #[must_use]
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Connection string for the upstream streaming database.
    #[must_use]
    pub fn upstream_dsn(&self) -> &str {
        &self.upstream_dsn
    }

    /// Bounded connect timeout for the upstream connection (§5).
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Configured log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// The loaded, validated source catalog.
    #[must_use]
    pub fn sources(&self) -> &[SourceDefinition] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = TycostreamSettings::new("postgres://localhost:6875/materialize", vec![]);
        assert_eq!(settings.listen_addr(), "0.0.0.0:4000");
        assert_eq!(settings.connect_timeout(), Duration::from_secs(10));
        assert_eq!(settings.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let settings = TycostreamSettings::new("postgres://localhost:6875/materialize", vec![])
            .with_listen_addr("127.0.0.1:9000")
            .with_connect_timeout(Duration::from_secs(5))
            .with_log_format(LogFormat::Json);

        assert_eq!(settings.listen_addr(), "127.0.0.1:9000");
        assert_eq!(settings.connect_timeout(), Duration::from_secs(5));
        assert_eq!(settings.log_format(), LogFormat::Json);
    }
}
