//! Clinic storefront CLI.
//!
//! # Usage
//!
//! ```bash
//! # Print the route table
//! clinicshop routes
//!
//! # Render a path headlessly (paths or hash URLs)
//! clinicshop render /products/serum-30ml
//! clinicshop render 'https://clinic.example/#/contact'
//!
//! # Render a guarded page after logging in
//! clinicshop render /admin/dashboard --email admin@example.com --password '...'
//!
//! # Hash a password for STOREFRONT_ADMIN_PASSWORD_HASH
//! clinicshop admin hash-password '...'
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use clinicshop_storefront::ShellConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "clinicshop")]
#[command(author, version, about = "Clinic storefront shell tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table
    Routes,
    /// Render a path to HTML
    Render {
        /// Path (`/cart`) or hash URL (`https://host/#/cart`)
        target: String,

        /// Log in as this admin before rendering
        #[arg(short, long, requires = "password")]
        email: Option<String>,

        /// Admin password
        #[arg(short, long, requires = "email")]
        password: Option<String>,
    },
    /// Manage the admin account
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Print an argon2 hash for `STOREFRONT_ADMIN_PASSWORD_HASH`
    HashPassword {
        /// Password to hash
        password: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: Option<&ShellConfig>) -> Option<sentry::ClientInitGuard> {
    let dsn = config?.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Configuration errors are reported by the commands that need it
    let config = ShellConfig::from_env().ok();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(config.as_ref());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clinicshop_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Routes => commands::routes::print()?,
        Commands::Render {
            target,
            email,
            password,
        } => {
            let login = email.zip(password);
            commands::render::render(&target, login).await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => commands::admin::hash_password(&password)?,
        },
    }
    Ok(())
}
