//! Freedom Family Hub vault CLI
//!
//! Keeps a session refresh token sealed on this machine. The wrapping key
//! comes from a software platform authenticator whose credential secrets
//! live in the OS keychain; every authenticator use asks for confirmation
//! on the terminal unless `--yes` is given.

mod verifier;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vault_core::settings::default_data_dir;
use vault_core::{
    BiometricVault, FileStore, KeyValueStore, KeychainStore, SettingsManager,
    SoftwareAuthenticator, StorageBackend, VaultError, VaultState,
};

use crate::verifier::TerminalVerifier;

/// Keychain service holding the authenticator's credential secrets
const AUTHENTICATOR_SERVICE: &str = "freedom-family-hub.authenticator";

/// Freedom Family Hub biometric vault
#[derive(Parser, Debug)]
#[command(name = "hub-vault")]
#[command(version)]
#[command(about = "Seal a session refresh token behind a platform authenticator")]
struct Args {
    /// Directory holding settings.json and the file store
    #[arg(long, env = "HUB_VAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Relying-party id (the application's host domain)
    #[arg(long, env = "HUB_VAULT_RP_ID")]
    rp_id: Option<String>,

    /// Record backend: file or keychain
    #[arg(long, env = "HUB_VAULT_BACKEND")]
    backend: Option<StorageBackend>,

    /// Persist --rp-id / --backend into settings.json
    #[arg(long)]
    save_settings: bool,

    /// Approve authenticator prompts without asking
    #[arg(long, short = 'y')]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show availability and whether a secret is stored
    Status,
    /// Seal a secret, replacing any stored one
    Enable {
        /// Secret to seal; prompted for when absent
        #[arg(long, env = "HUB_VAULT_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// Print the sealed secret
    Unlock,
    /// Erase the stored secret
    Disable,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so `unlock` output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let data_dir = match args.data_dir.clone() {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    let mut manager = SettingsManager::new(&data_dir)?;
    let mut settings = manager.get().clone();
    if let Some(rp_id) = args.rp_id.clone() {
        settings.rp_id = rp_id;
    }
    if let Some(backend) = args.backend {
        settings.backend = backend;
    }
    if args.save_settings {
        manager.update(settings.clone()).await?;
        info!("Saved settings in {:?}", data_dir);
    }

    let record_store: Arc<dyn KeyValueStore> = match settings.backend {
        StorageBackend::File => Arc::new(FileStore::open(&data_dir).await?),
        StorageBackend::Keychain => Arc::new(KeychainStore::new(None)),
    };

    let authenticator = Arc::new(SoftwareAuthenticator::new(
        credential_store(&data_dir).await?,
        Arc::new(TerminalVerifier::new(args.yes)),
    ));
    let vault = BiometricVault::new(authenticator, record_store, settings);

    match args.command {
        Command::Status => status(&vault).await?,
        Command::Enable { secret } => {
            let secret = match secret {
                Some(secret) => secret,
                None => rpassword::prompt_password("Secret to seal: ")
                    .context("Failed to read secret")?,
            };
            vault.enable(&secret).await.map_err(explain)?;
            info!("Secret sealed");
        }
        Command::Unlock => {
            let secret = vault.unlock().await.map_err(explain)?;
            println!("{}", secret.expose());
        }
        Command::Disable => {
            vault.disable().await?;
            info!("Secret erased");
        }
    }

    Ok(())
}

/// `RUST_LOG` when set, `info` otherwise
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Credential secrets go to the OS keychain, or to a file store in the data
/// directory when no keychain is reachable
async fn credential_store(data_dir: &std::path::Path) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let keychain = KeychainStore::new(Some(AUTHENTICATOR_SERVICE));
    if keychain.is_available() {
        return Ok(Arc::new(keychain));
    }

    warn!("OS keychain unavailable - keeping authenticator credentials in the data directory");
    Ok(Arc::new(FileStore::open(data_dir.join("authenticator")).await?))
}

async fn status(vault: &BiometricVault) -> anyhow::Result<()> {
    let state = match vault.state().await? {
        VaultState::Configured => "configured",
        VaultState::Unconfigured => "not configured",
    };

    println!("relying party: {}", vault.settings().rp_id);
    println!("available:     {}", vault.is_available());
    println!("backend:       {}", vault.backend_name());
    println!("vault:         {}", state);
    Ok(())
}

/// Attach the recovery hint for failures the user has to act on
fn explain(err: VaultError) -> anyhow::Error {
    match err {
        VaultError::NotConfigured => anyhow::anyhow!("{} (run `hub-vault enable`)", err),
        VaultError::DecryptionFailed | VaultError::Corrupted(_) => anyhow::anyhow!(
            "{} (run `hub-vault disable` then `hub-vault enable` to reset)",
            err
        ),
        VaultError::Unavailable => {
            anyhow::anyhow!("{} - sign in with your password instead", err)
        }
        other if other.is_retryable() => anyhow::anyhow!("{} - try again", other),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "hub-vault",
            "--rp-id",
            "hub.example.org",
            "--backend",
            "keychain",
            "-y",
            "enable",
            "--secret",
            "token",
        ])
        .unwrap();

        assert_eq!(args.rp_id.as_deref(), Some("hub.example.org"));
        assert_eq!(args.backend, Some(StorageBackend::Keychain));
        assert!(args.yes);
        assert!(matches!(args.command, Command::Enable { secret: Some(ref s) } if s == "token"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = Args::try_parse_from(["hub-vault", "--backend", "cloud", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_explain_adds_recovery_hint() {
        let message = explain(VaultError::DecryptionFailed).to_string();
        assert!(message.contains("disable"));

        let message = explain(VaultError::UserCancelled).to_string();
        assert!(message.contains("try again"));
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(
                log_filter().max_level_hint(),
                Some(tracing::level_filters::LevelFilter::INFO)
            );
        }
    }
}
