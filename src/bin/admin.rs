//! CLI administration tool for linkdrop.
//!
//! Manages API keys, purges expired aliases, and inspects the database
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Issue a new API key
//! cargo run --bin admin -- key create --name "Partner site"
//!
//! # List all keys
//! cargo run --bin admin -- key list
//!
//! # Revoke a key by name or id
//! cargo run --bin admin -- key revoke "Partner site"
//!
//! # Delete every expired alias now
//! cargo run --bin admin -- sweep
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components: PostgreSQL connection
//! - `API_KEY_SECRET`: HMAC secret; must match the server's value

use linkdrop::application::services::{AliasService, AllocationPolicy, AuthService};
use linkdrop::config::{Config, mask_connection_string};
use linkdrop::infrastructure::cache::NullCache;
use linkdrop::infrastructure::persistence::{PgAliasRepository, PgApiKeyRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing linkdrop.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage API keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Delete all expired aliases
    Sweep {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// API key management subcommands.
#[derive(Subcommand)]
enum KeyAction {
    /// Issue a new API key
    Create {
        /// Key name (e.g., "Partner site")
        #[arg(short, long)]
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all keys
    List,

    /// Revoke a key
    Revoke {
        /// Key name or ID to revoke
        name_or_id: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info and alias counts
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url()?;

    let pool = PgPool::connect(&database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database at {}",
                mask_connection_string(&database_url)
            )
        })?;

    match cli.command {
        Commands::Key { action } => handle_key_action(action, &pool).await?,
        Commands::Sweep { yes } => handle_sweep(&pool, yes).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches API key commands.
async fn handle_key_action(action: KeyAction, pool: &PgPool) -> Result<()> {
    let secret = std::env::var("API_KEY_SECRET").context("API_KEY_SECRET must be set")?;
    if secret.is_empty() {
        anyhow::bail!("API_KEY_SECRET must not be empty");
    }

    let repo = Arc::new(PgApiKeyRepository::new(Arc::new(pool.clone())));
    let auth = AuthService::new(repo.clone(), secret);

    match action {
        KeyAction::Create { name, yes } => create_key(&auth, name, yes).await?,
        KeyAction::List => list_keys(&auth).await?,
        KeyAction::Revoke { name_or_id } => revoke_key(&auth, &repo, name_or_id).await?,
    }

    Ok(())
}

/// Issues a new API key with interactive prompts.
///
/// # Security
///
/// - Only the HMAC-SHA256 hash is stored in the database
/// - The raw key is displayed once and cannot be retrieved later
async fn create_key(auth: &AuthService, name: Option<String>, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔑 Create API Key".bright_blue().bold());
    println!();

    let key_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Key name")
            .with_initial_text("Partner site")
            .interact_text()?,
    };

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Issue key '{key_name}'?"))
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let (key, raw_key) = auth
        .issue_key(&key_name)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create key: {}", e))?;

    println!();
    println!("{}", "✅ Key created successfully!".green().bold());
    println!();
    println!("  ID:    {}", key.id.to_string().bright_black());
    println!("  Name:  {}", key.name.cyan());
    println!("  Owner: {}", key.owner_id().bright_black());
    println!("  Key:   {}", raw_key.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this key now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -X POST -H \"x-api-key: {}\" -H \"content-type: application/json\" \\\n       -d '{{\"url\":\"https://example.com\"}}' http://localhost:3000/shorten",
        raw_key.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists all API keys with status indicators.
async fn list_keys(auth: &AuthService) -> Result<()> {
    println!("{}", "📋 API Keys".bright_blue().bold());
    println!();

    let keys = auth
        .list_keys()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list keys: {}", e))?;

    if keys.is_empty() {
        println!("{}", "  No keys found".yellow());
        println!();
        println!(
            "  Create one with: {} admin key create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<28} {:<17} {:<17} {:<8}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for key in &keys {
        let status = if key.is_revoked() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };

        let last_used = key
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<4} {:<28} {:<17} {:<17} {}",
            key.id.to_string().bright_black(),
            key.name.cyan(),
            key.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            last_used.bright_black(),
            status
        );
    }

    println!();
    println!("  Total: {}", keys.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Revokes a key by name or ID with confirmation prompt.
///
/// Numeric input is looked up by ID, anything else by exact name.
async fn revoke_key(
    auth: &AuthService,
    repo: &PgApiKeyRepository,
    name_or_id: String,
) -> Result<()> {
    use linkdrop::domain::repositories::ApiKeyRepository;

    println!("{}", "🔒 Revoke API Key".bright_blue().bold());
    println!();

    let key = match name_or_id.parse::<i64>() {
        Ok(id) => repo.find_by_id(id).await,
        Err(_) => repo.find_by_name(&name_or_id).await,
    }
    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
    .context("Key not found")?;

    if key.is_revoked() {
        println!("{}", "⚠️  This key is already revoked".yellow());
        return Ok(());
    }

    println!("  Key: {}", key.name.cyan());
    println!("  ID:  {}", key.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this key?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    auth.revoke_key(key.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke key: {}", e))?;

    println!();
    println!("{}", "✅ Key revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Deletes every expired alias in the database.
async fn handle_sweep(pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Sweep expired aliases".bright_blue().bold());
    println!();

    let expired: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM aliases WHERE expires_at <= NOW()")
            .fetch_one(pool)
            .await?;

    if expired == 0 {
        println!("{}", "  Nothing to delete".green());
        return Ok(());
    }

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {expired} expired alias(es)?"))
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let repo = Arc::new(PgAliasRepository::new(Arc::new(pool.clone())));
    let service = AliasService::new(repo, Arc::new(NullCache::new()), AllocationPolicy::default());

    let deleted = service
        .sweep_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!(
        "{} {}",
        "✅ Deleted".green().bold(),
        deleted.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let (total, expired, owners): (i64, i64, i64) = sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE expires_at <= NOW()),
                       COUNT(DISTINCT owner_id)
                FROM aliases
                "#,
            )
            .fetch_one(pool)
            .await?;

            let active_keys: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM api_keys WHERE revoked_at IS NULL")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL:      {}", version.bright_white());
            println!(
                "  Aliases:         {}",
                total.to_string().bright_green().bold()
            );
            println!(
                "  Expired:         {}",
                expired.to_string().bright_yellow().bold()
            );
            println!(
                "  Owners:          {}",
                owners.to_string().bright_green().bold()
            );
            println!(
                "  Active API keys: {}",
                active_keys.to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}
