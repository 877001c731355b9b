//! # SnapBuy POS Terminal
//!
//! Command-line entry point for a cashier station.
//!
//! ## Commands
//! ```text
//! pos-terminal [status]                              shift, drawer, catalog size
//! pos-terminal sign-in <token> <tenant> <user> <role>
//! pos-terminal sign-out
//! pos-terminal open-shift <initial cash>
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Initialize Logging                                                  │
//! │     • tracing-subscriber with env filter (RUST_LOG)                     │
//! │     • Default: info,snapbuy=debug,reqwest=warn                          │
//! │                                                                         │
//! │  2. Load Configuration                                                  │
//! │     • defaults < pos.toml < SNAPBUY_* environment                       │
//! │                                                                         │
//! │  3. Open Credential Store                                               │
//! │     • <data dir>/credentials.json                                       │
//! │                                                                         │
//! │  4. Build Session + ApiClient                                           │
//! │                                                                         │
//! │  5. Apply the shift gate for the stored role                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use snapbuy_client::{
    ApiClient, ClientConfig, FileStore, PosBackend, Session, TenantStore, TokenStore,
    UserIdentity,
};
use snapbuy_core::money::{format_signed, format_vnd, parse_amount};
use snapbuy_core::{Money, Role};
use snapbuy_pos::{check_pos_access, AccessDecision, PosError, ShiftManager, UserFacingError};

#[derive(Debug)]
enum Command {
    Status,
    SignIn {
        token: String,
        tenant: String,
        user_id: String,
        role: Role,
    },
    SignOut,
    OpenShift {
        initial_cash: Money,
    },
}

const USAGE: &str = "usage: pos-terminal [status | sign-in <token> <tenant> <user-id> <role> | sign-out | open-shift <initial cash>]";

fn parse_args(args: &[String]) -> Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["status"] => Ok(Command::Status),
        ["sign-in", token, tenant, user_id, role] => Ok(Command::SignIn {
            token: token.to_string(),
            tenant: tenant.to_string(),
            user_id: user_id.to_string(),
            role: role.parse()?,
        }),
        ["sign-out"] => Ok(Command::SignOut),
        ["open-shift", amount] => {
            let initial_cash =
                parse_amount(amount).ok_or_else(|| anyhow!("'{}' is not an amount", amount))?;
            Ok(Command::OpenShift { initial_cash })
        }
        _ => bail!(USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;
    debug!(?command, "Parsed command");

    let config = ClientConfig::load(None).context("Failed to load configuration")?;
    let data_dir = config
        .data_dir()
        .context("No data directory available; set SNAPBUY_DATA_DIR")?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let store = Arc::new(FileStore::open(&data_dir)?);
    let session = Arc::new(Session::from_file_store(Arc::clone(&store)));
    info!(api = %config.api.base_url, data_dir = %data_dir.display(), "SnapBuy POS terminal starting");

    match command {
        Command::SignIn {
            token,
            tenant,
            user_id,
            role,
        } => {
            session.sign_in(&token, &tenant)?;
            store.set_identity(Some(UserIdentity {
                user_id: user_id.clone(),
                role,
            }))?;
            println!("Signed in as {} ({:?}) for tenant {}", user_id, role, tenant);
            Ok(())
        }
        Command::SignOut => {
            store.clear_token()?;
            store.clear_tenant()?;
            println!("Signed out");
            Ok(())
        }
        Command::Status => status(&config, &store, session).await,
        Command::OpenShift { initial_cash } => {
            let identity = signed_in_identity(&store)?;
            let backend = backend(&config, session)?;
            let mut shifts = ShiftManager::new(backend, Some(identity.user_id)).with_config(&config);
            let shift = shifts.open_shift(initial_cash).await.map_err(user_error)?;
            println!(
                "Shift {} opened with {} in the drawer",
                shift.id,
                format_vnd(shift.initial_cash)
            );
            Ok(())
        }
    }
}

async fn status(config: &ClientConfig, store: &FileStore, session: Arc<Session>) -> Result<()> {
    let identity = signed_in_identity(store)?;
    let backend = backend(config, session)?;
    let mut shifts =
        ShiftManager::new(Arc::clone(&backend), Some(identity.user_id.clone())).with_config(config);

    let decision = check_pos_access(identity.role, &mut shifts)
        .await
        .map_err(user_error)?;
    if decision == AccessDecision::RedirectToOpenShift {
        println!("No open shift. Open one with: pos-terminal open-shift <initial cash>");
        return Ok(());
    }

    match shifts.current_shift().await.map_err(user_error)? {
        Some(shift) => {
            let expected = shifts
                .compute_expected_drawer(&shift)
                .await
                .map_err(user_error)?;
            println!("Shift:           {}", shift.id);
            println!("Opened at:       {}", shift.opened_at.format("%Y-%m-%d %H:%M"));
            println!("Initial cash:    {}", format_vnd(shift.initial_cash));
            println!("Expected drawer: {}", format_vnd(expected));
            println!("Sales in cash:   {}", format_signed(expected - shift.initial_cash));
        }
        None => println!("Shift:           none ({:?} does not need one)", identity.role),
    }

    let products = backend
        .list_products()
        .await
        .map_err(|e| user_error(e.into()))?;
    println!("Catalog:         {} products", products.len());
    Ok(())
}

fn signed_in_identity(store: &FileStore) -> Result<UserIdentity> {
    match (store.token(), store.identity()) {
        (Some(_), Some(identity)) => Ok(identity),
        _ => bail!("Not signed in. Run: pos-terminal sign-in <token> <tenant> <user-id> <role>"),
    }
}

fn backend(config: &ClientConfig, session: Arc<Session>) -> Result<Arc<dyn PosBackend>> {
    let client = ApiClient::new(config, session)?;
    Ok(Arc::new(client))
}

/// Renders a flow error the way the POS screens would show it.
fn user_error(err: PosError) -> anyhow::Error {
    let ui = UserFacingError::from(&err);
    anyhow!("{:?}: {}", ui.code, ui.message)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=snapbuy_pos=trace` - Trace the checkout flows only
/// - Default: info, debug for snapbuy crates, warn for reqwest
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,snapbuy=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_command_is_status() {
        assert!(matches!(parse_args(&[]).unwrap(), Command::Status));
    }

    #[test]
    fn test_sign_in_parses_role() {
        match parse_args(&args(&["sign-in", "tok", "shop1", "u-1", "salesman"])).unwrap() {
            Command::SignIn { role, tenant, .. } => {
                assert_eq!(role, Role::Salesman);
                assert_eq!(tenant, "shop1");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_args(&args(&["sign-in", "tok", "shop1", "u-1", "cook"])).is_err());
    }

    #[test]
    fn test_open_shift_amount() {
        match parse_args(&args(&["open-shift", "500.000"])).unwrap() {
            Command::OpenShift { initial_cash } => assert_eq!(initial_cash.vnd(), 500_000),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_args(&args(&["open-shift", "abc"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }
}
