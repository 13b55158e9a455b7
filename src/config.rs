use crate::error::ConfigError;
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Command line overrides for [`DnsConfig`].
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Minimal DNS responder", long_about = None)]
pub struct CliArgs {
    /// Address to listen on
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Upstream resolver to forward questions to (e.g. 8.8.8.8:53)
    #[arg(short, long)]
    pub resolver: Option<SocketAddr>,

    /// Upstream timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// TTL of synthetic answers
    #[arg(long)]
    pub ttl: Option<u32>,

    /// Address returned in synthetic answers
    #[arg(short, long)]
    pub address: Option<Ipv4Addr>,

    /// Log filter used when RUST_LOG is not set
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DnsConfig {
    /// Address to bind the UDP listener to
    pub bind_addr: SocketAddr,

    /// Upstream resolver; synthetic answers are served when unset
    pub resolver: Option<SocketAddr>,

    /// Timeout for one upstream exchange
    pub upstream_timeout: Duration,

    /// TTL of synthetic answers
    pub answer_ttl: u32,

    /// Address carried by synthetic answers
    pub answer_address: Ipv4Addr,

    /// Default tracing filter
    pub log_level: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 2053)),
            resolver: None,
            upstream_timeout: Duration::from_secs(5),
            answer_ttl: 60,
            answer_address: Ipv4Addr::new(8, 8, 8, 8),
            log_level: "info".to_string(),
        }
    }
}

impl DnsConfig {
    /// Create a DnsConfig from `BIFROST_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from a variable lookup, starting from the defaults
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind_addr) = lookup("BIFROST_BIND_ADDR") {
            config.bind_addr = bind_addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddress(bind_addr))?;
        }

        if let Some(resolver) = lookup("BIFROST_RESOLVER") {
            let resolver = resolver.trim();
            if !resolver.is_empty() {
                config.resolver = Some(
                    resolver
                        .parse()
                        .map_err(|_| ConfigError::InvalidResolver(resolver.to_string()))?,
                );
            }
        }

        if let Some(timeout_str) = lookup("BIFROST_UPSTREAM_TIMEOUT") {
            let timeout_secs = timeout_str
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(timeout_str.clone()))?;
            config.upstream_timeout = Duration::from_secs(timeout_secs);
        }

        if let Some(ttl) = lookup("BIFROST_ANSWER_TTL") {
            config.answer_ttl = ttl
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidTtl(ttl.clone()))?;
        }

        if let Some(address) = lookup("BIFROST_ANSWER_ADDRESS") {
            config.answer_address = address
                .parse()
                .map_err(|_| ConfigError::InvalidAnswerAddress(address))?;
        }

        if let Some(log_level) = lookup("BIFROST_LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply command line overrides on top of this config
    pub fn with_args(mut self, args: &CliArgs) -> Result<Self, ConfigError> {
        if let Some(bind) = args.bind {
            self.bind_addr = bind;
        }
        if let Some(resolver) = args.resolver {
            self.resolver = Some(resolver);
        }
        if let Some(timeout) = args.timeout {
            self.upstream_timeout = Duration::from_secs(timeout);
        }
        if let Some(ttl) = args.ttl {
            self.answer_ttl = ttl;
        }
        if let Some(address) = args.address {
            self.answer_address = address;
        }
        if let Some(log_level) = &args.log_level {
            self.log_level = log_level.clone();
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.upstream_timeout.as_secs() > 300 {
            return Err(ConfigError::InvalidTimeout(
                "Timeout too large (max 300 seconds)".to_string(),
            ));
        }

        // Forwarding to ourselves would answer every query with a timeout
        if self.resolver == Some(self.bind_addr) {
            return Err(ConfigError::InvalidResolver(format!(
                "{} is the listen address",
                self.bind_addr
            )));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            return Err(ConfigError::ParseError(format!(
                "Invalid log level: {}",
                self.log_level
            )));
        }

        Ok(())
    }
}
