//! kinfolk server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `KINFOLK_*` environment variables, opens an in-process SQLite store, and
//! serves the people API over HTTP.
//!
//! Nested keys use `__` in the environment, e.g.
//! `KINFOLK_DISCOVERY__TIMEOUT_SECS=10`.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```
//! cargo run -p kinfolk-server --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use kinfolk_core::store::IdentityStore;
use kinfolk_server::{AppState, ServerConfig, auth, webfinger::WebfingerClient};
use kinfolk_store_sqlite::{NewPerson, SqliteStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Kinfolk people server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let hash = auth::hash_password(&password)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("KINFOLK")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  ensure_local_account(&store, &server_cfg).await?;

  let client = WebfingerClient::new(&server_cfg.discovery.scheme, server_cfg.discovery.timeout())
    .context("failed to build webfinger client")?;

  let state = AppState::new(Arc::new(store), Arc::new(client), &server_cfg);
  let app = kinfolk_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Create the person record for the configured account on first start.
async fn ensure_local_account(store: &SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  let existing = store
    .find_by_username(&cfg.auth_username)
    .await
    .context("failed to look up local account")?;
  if existing.is_none() {
    let person = store
      .add_person(NewPerson::local(&cfg.auth_username, &cfg.domain))
      .await
      .context("failed to create local account")?;
    tracing::info!(handle = %person.handle, "created local account");
  }
  Ok(())
}

/// Read a password line from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
