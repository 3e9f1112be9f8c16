//! Configuration for the two faces of the crate.
//!
//! [`GatewayConfig`] drives the `swift-gateway` binary and combines
//! environment variables with CLI arguments. [`HarnessConfig`] drives the
//! functional scenarios and is environment-only, since Cargo tests take
//! no arguments.

use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf};

/// Which HTTP front end serves the gateway under test. The manifest
/// scenario is skipped under `apache2`, which buffers zero-length PUT
/// bodies differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontEnd {
    Integral,
    Apache2,
}

/// Configuration consumed by the functional scenarios.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Auth endpoint of an external gateway. `None` means each scenario
    /// spins up its own in-process fixture.
    pub auth_url: Option<String>,
    /// `account:user` credential pair.
    pub username: String,
    pub key: String,
    pub account: String,
    /// Root of the backing mount; the per-account directory underneath is
    /// derived from the storage URL.
    pub mount_root: Option<PathBuf>,
    /// BCP-47 tag used for every listing-order comparison.
    pub locale: String,
    pub front_end: FrontEnd,
}

impl HarnessConfig {
    /// Read `SWIFT_TEST_*` from the environment, with fixture-friendly
    /// defaults.
    pub fn from_env() -> Result<Self> {
        let front_end = match env::var("SWIFT_TEST_FRONT_END") {
            Ok(value) if value == "apache2" => FrontEnd::Apache2,
            Ok(value) if value == "integral" => FrontEnd::Integral,
            Ok(value) => anyhow::bail!("unknown SWIFT_TEST_FRONT_END value `{}`", value),
            Err(_) => FrontEnd::Integral,
        };

        Ok(Self {
            auth_url: env::var("SWIFT_TEST_AUTH_URL").ok(),
            username: env::var("SWIFT_TEST_USER").unwrap_or_else(|_| "test:tester".into()),
            key: env::var("SWIFT_TEST_KEY").unwrap_or_else(|_| "testing".into()),
            account: env::var("SWIFT_TEST_ACCOUNT").unwrap_or_else(|_| "test".into()),
            mount_root: env::var("SWIFT_TEST_MOUNT_ROOT").ok().map(PathBuf::from),
            locale: env::var("SWIFT_TEST_LOCALE").unwrap_or_else(|_| "en".into()),
            front_end,
        })
    }
}

/// Centralized gateway configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Directory tree doubling as the mount the probe reads.
    pub root: PathBuf,
    pub account: String,
    pub user: String,
    pub key: String,
    pub locale: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Swift-compatible object storage gateway fixture")]
pub struct Args {
    /// Host to bind to (overrides SWIFT_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides SWIFT_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where the object tree is stored (overrides SWIFT_GATEWAY_ROOT)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Account name (overrides SWIFT_GATEWAY_ACCOUNT)
    #[arg(long)]
    pub account: Option<String>,

    /// User name within the account (overrides SWIFT_GATEWAY_USER)
    #[arg(long)]
    pub user: Option<String>,

    /// Auth key (overrides SWIFT_GATEWAY_KEY)
    #[arg(long)]
    pub key: Option<String>,

    /// BCP-47 locale tag for listing order (overrides SWIFT_GATEWAY_LOCALE)
    #[arg(long)]
    pub locale: Option<String>,
}

impl GatewayConfig {
    /// Parse environment variables + CLI args into a GatewayConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        let env_host = env::var("SWIFT_GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("SWIFT_GATEWAY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing SWIFT_GATEWAY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading SWIFT_GATEWAY_PORT"),
        };
        let env_root = env::var("SWIFT_GATEWAY_ROOT").unwrap_or_else(|_| "./data/objects".into());
        let env_account = env::var("SWIFT_GATEWAY_ACCOUNT").unwrap_or_else(|_| "test".into());
        let env_user = env::var("SWIFT_GATEWAY_USER").unwrap_or_else(|_| "tester".into());
        let env_key = env::var("SWIFT_GATEWAY_KEY").unwrap_or_else(|_| "testing".into());
        let env_locale = env::var("SWIFT_GATEWAY_LOCALE").unwrap_or_else(|_| "en".into());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            root: args.root.unwrap_or_else(|| PathBuf::from(env_root)),
            account: args.account.unwrap_or(env_account),
            user: args.user.unwrap_or(env_user),
            key: args.key.unwrap_or(env_key),
            locale: args.locale.unwrap_or(env_locale),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
