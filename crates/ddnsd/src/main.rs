// # ddnsd - single-record DDNS updater
//
// Thin integration layer: all decision logic lives in ddns-core.
//
// The ddnsd binary is responsible for:
// 1. Parsing the action (`setup`, `update`, `run`, `cleanup`)
// 2. Reading configuration from environment variables
// 3. Initializing logging and the runtime
// 4. Wiring the address source, Cloudflare registrar and config store
// 5. Mapping the outcome to an exit code
//
// ## Configuration
//
// All configuration is done via environment variables. Secrets may also be
// given as files through the `_FILE` variants.
//
// ### Record
// - `ZONE` / `ZONE_FILE`: Zone name (required)
// - `SUBDOMAIN` / `SUBDOMAIN_FILE`: Subdomain, empty for the zone apex
// - `RRTYPE`: `A` (default) or `AAAA`
// - `PROXIED`: `true` to proxy the record through Cloudflare
//
// ### Credentials
// - `API_KEY` / `API_KEY_FILE`: API token, or global key when `EMAIL` is set
// - `EMAIL` / `EMAIL_FILE`: Account email for global key auth
// - `CF_API`: API base URL
//
// ### Address detection (first match wins)
// - `CUSTOM_LOOKUP_CMD`: Shell command printing the address
// - `INTERFACE`: Local interface to read the address from
// - `DNS_SERVER`: Resolver for the IPv4 who-am-I lookup (public detection)
//
// ### Lifecycle
// - `DELETE_ON_STOP`: `true` lets `cleanup` delete the record
// - `UPDATE_INTERVAL_SECS`: Period of the `run` loop (default 300)
// - `STATE_FILE`: Location of the managed record (default `/config/cloudflare.conf`)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export API_KEY=your_token
// export ZONE=example.com
// export SUBDOMAIN=home
//
// ddnsd setup
// ddnsd update   # from cron, or:
// ddnsd run
// ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use ddns_core::traits::AddressSource;
use ddns_core::{
    AddressStrategy, AppConfig, DetectionChain, FileConfigStore, Reconciler, UpdateOutcome,
};
use ddns_ip_local::{CommandSource, InterfaceSource};
use ddns_provider_cloudflare::CloudflareRegistrar;
use std::future::Future;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Success (including soft update/cleanup failures)
/// - 1: Configuration error or fatal setup failure
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Action completed; soft failures were logged
    Success = 0,
    /// Configuration error or fatal setup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep one Cloudflare A/AAAA record pointed at this host
#[derive(Debug, Parser)]
#[command(name = "ddnsd", version, about)]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Action {
    /// Create or adopt the record and persist its identity
    Setup,
    /// Patch the record if the current address differs
    Update,
    /// Setup, then update every interval until SIGTERM/SIGINT, then cleanup
    Run,
    /// Delete the record if DELETE_ON_STOP is true
    Cleanup,
}

impl Action {
    /// Whether the action runs setup, whose failures are fatal
    fn requires_setup(self) -> bool {
        matches!(self, Action::Setup | Action::Run)
    }
}

fn parse_log_level(raw: &str) -> Option<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let raw_level = std::env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let Some(log_level) = parse_log_level(&raw_level) else {
        eprintln!(
            "DDNS_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            raw_level
        );
        return DdnsExitCode::ConfigError.into();
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Single-threaded: one cycle at a time, no shared mutable state
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match execute(cli.action, &config).await {
            Ok(code) => code,
            Err(e) => {
                error!("{}", e);
                DdnsExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Wire the collaborators and run one action
async fn execute(action: Action, config: &AppConfig) -> Result<DdnsExitCode> {
    let Some(credentials) = config.credentials.clone() else {
        return Ok(unusable_credentials(action, "API_KEY is not set"));
    };

    let registrar = match CloudflareRegistrar::new(&config.api_base, credentials) {
        Ok(registrar) => registrar,
        Err(e) if e.is_fatal() => return Ok(unusable_credentials(action, &e.to_string())),
        Err(e) => return Err(e.into()),
    };

    let reconciler = Reconciler::new(
        config,
        build_source(config)?,
        Box::new(registrar),
        Box::new(FileConfigStore::new(&config.state_path)),
    );

    let code = match action {
        Action::Setup => match reconciler.setup().await {
            Ok(record) => {
                info!("Setup complete: {} ({})", record.fqdn, record.record_id);
                DdnsExitCode::Success
            }
            Err(e) => {
                error!("{}", e);
                DdnsExitCode::ConfigError
            }
        },
        Action::Update => {
            if let UpdateOutcome::UpdateFailed { error } = reconciler.update().await {
                info!("Update will be retried on the next run: {}", error);
            }
            DdnsExitCode::Success
        }
        Action::Cleanup => {
            reconciler.cleanup().await;
            DdnsExitCode::Success
        }
        Action::Run => {
            let shutdown = shutdown_signal()?;
            match reconciler.run(shutdown).await {
                Ok(()) => {
                    info!("Shutting down");
                    DdnsExitCode::Success
                }
                Err(e) => {
                    error!("{}", e);
                    DdnsExitCode::ConfigError
                }
            }
        }
    };

    Ok(code)
}

/// Map a missing or invalid credential set to an exit code
///
/// Only `setup` (and `run`, which starts with setup) treats this as fatal;
/// `update` and `cleanup` log it and exit cleanly.
fn unusable_credentials(action: Action, reason: &str) -> DdnsExitCode {
    if action.requires_setup() {
        error!("{}", reason);
        DdnsExitCode::ConfigError
    } else {
        warn!("Skipping {:?}: {}", action, reason);
        DdnsExitCode::Success
    }
}

/// Build the single address strategy selected by configuration
fn build_source(config: &AppConfig) -> Result<Box<dyn AddressSource>> {
    let source: Box<dyn AddressSource> = match config.address_strategy() {
        AddressStrategy::CustomCommand(command) => {
            info!("Address source: custom command");
            Box::new(CommandSource::new(command))
        }
        AddressStrategy::Interface(interface) => {
            info!("Address source: interface {}", interface);
            Box::new(InterfaceSource::new(interface))
        }
        AddressStrategy::PublicDetection => {
            info!("Address source: public detection via {}", config.dns_server);
            let client = ddns_ip_http::client()?;

            let mut ipv4 = ddns_ip_dns::ipv4_detectors(&config.dns_server);
            ipv4.extend(ddns_ip_http::ipv4_services(&client));

            let mut ipv6 = ddns_ip_dns::ipv6_detectors();
            ipv6.extend(ddns_ip_http::ipv6_services(&client));

            Box::new(DetectionChain::new(ipv4, ipv6))
        }
    };
    Ok(source)
}

/// Resolve on the first SIGTERM or SIGINT
///
/// Handlers are installed before the loop starts so an early signal is not
/// lost.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Resolve on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal: SIGINT");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ddns_core::{Credentials, Target, RecordType};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_actions_parse() {
        for (arg, action) in [
            ("setup", Action::Setup),
            ("update", Action::Update),
            ("run", Action::Run),
            ("cleanup", Action::Cleanup),
        ] {
            let cli = Cli::try_parse_from(["ddnsd", arg]).unwrap();
            assert_eq!(cli.action, action);
        }

        assert!(Cli::try_parse_from(["ddnsd"]).is_err());
        assert!(Cli::try_parse_from(["ddnsd", "watch"]).is_err());
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(parse_log_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_log_level("warn"), Some(Level::WARN));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DdnsExitCode::Success as u8, 0);
        assert_eq!(DdnsExitCode::ConfigError as u8, 1);
        assert_eq!(DdnsExitCode::RuntimeError as u8, 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_only_fatal_for_setup() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            target: Target::new("example.com", RecordType::A),
            state_path: dir.path().join("cloudflare.conf"),
            ..AppConfig::default()
        };

        for (action, expected) in [
            (Action::Update, DdnsExitCode::Success),
            (Action::Cleanup, DdnsExitCode::Success),
            (Action::Setup, DdnsExitCode::ConfigError),
            (Action::Run, DdnsExitCode::ConfigError),
        ] {
            let code = execute(action, &config).await.unwrap();
            assert_eq!(code, expected, "{:?}", action);
        }
    }

    #[tokio::test]
    async fn test_empty_token_only_fatal_for_setup() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            credentials: Some(Credentials::Token(String::new())),
            target: Target::new("example.com", RecordType::A),
            state_path: dir.path().join("cloudflare.conf"),
            ..AppConfig::default()
        };

        assert_eq!(
            execute(Action::Update, &config).await.unwrap(),
            DdnsExitCode::Success
        );
        assert_eq!(
            execute(Action::Setup, &config).await.unwrap(),
            DdnsExitCode::ConfigError
        );
    }

    #[tokio::test]
    async fn test_update_without_state_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            credentials: Some(Credentials::Token("test-token".to_string())),
            target: Target::new("example.com", RecordType::A),
            custom_lookup_cmd: Some("echo 203.0.113.5".to_string()),
            state_path: dir.path().join("cloudflare.conf"),
            ..AppConfig::default()
        };
        let code = execute(Action::Update, &config).await.unwrap();
        assert_eq!(code, DdnsExitCode::Success);
    }

    #[test]
    fn test_strategy_wiring() {
        let config = AppConfig {
            interface: Some("eth0".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(build_source(&config).unwrap().name(), "eth0");

        let config = AppConfig {
            custom_lookup_cmd: Some("echo 203.0.113.5".to_string()),
            ..config
        };
        assert_eq!(build_source(&config).unwrap().name(), "custom command");
    }
}
