//! Account Registration API
//!
//! User sign-up with double opt-in activation:
//! - Ordered field validation with a fixed message catalog
//! - Argon2 password hashing and random activation tokens
//! - Create-and-notify transactions rolled back on delivery failure
//! - Single-use activation tokens
//! - In-memory or PostgreSQL account storage, log or SMTP notifications

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::{AppState, RegistrationServiceTrait};
use config::{NotifierBackend, NotifierConfig, StorageBackend};
use domain::account::AccountRepository;
use infrastructure::{
    account::{
        ActivationTokenGenerator, Argon2Hasher, InMemoryAccountRepository,
        PostgresAccountRepository, RegistrationService,
    },
    notification::{LogNotifier, SmtpConfig, SmtpNotifier},
    storage::{connect, run_account_migrations, PostgresConfig},
};
use tracing::info;

/// Create the application state with the default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let hasher = Arc::new(Argon2Hasher::with_params(
        config.security.argon2_memory_kib,
        config.security.argon2_iterations,
        config.security.argon2_parallelism,
    )?);
    let tokens = ActivationTokenGenerator::new(config.security.activation_token_length);

    info!("Storage backend: {:?}", config.storage.backend);
    info!("Notifier backend: {:?}", config.notifier.backend);

    let service = match config.storage.backend {
        StorageBackend::Memory => {
            let repository = Arc::new(InMemoryAccountRepository::new());
            build_service(repository, hasher, tokens, &config.notifier)?
        }
        StorageBackend::Postgres => {
            let pg_config = PostgresConfig::new(&config.storage.database_url)
                .with_max_connections(config.storage.max_connections)
                .with_connect_timeout(config.storage.connect_timeout_secs);

            info!("Connecting to PostgreSQL...");
            let pool = connect(&pg_config).await?;
            info!("PostgreSQL connection established");

            if config.storage.run_migrations {
                run_account_migrations(&pool).await?;
            }

            let repository = Arc::new(PostgresAccountRepository::new(pool));
            build_service(repository, hasher, tokens, &config.notifier)?
        }
    };

    Ok(AppState::new(service))
}

fn build_service<R>(
    repository: Arc<R>,
    hasher: Arc<Argon2Hasher>,
    tokens: ActivationTokenGenerator,
    config: &NotifierConfig,
) -> anyhow::Result<Arc<dyn RegistrationServiceTrait>>
where
    R: AccountRepository + 'static,
{
    let service: Arc<dyn RegistrationServiceTrait> = match config.backend {
        NotifierBackend::Log => {
            let notifier = Arc::new(LogNotifier::new(&config.activation_url));
            Arc::new(
                RegistrationService::new(repository, hasher, notifier).with_token_generator(tokens),
            )
        }
        NotifierBackend::Smtp => {
            let notifier = Arc::new(SmtpNotifier::new(smtp_config(config))?);
            Arc::new(
                RegistrationService::new(repository, hasher, notifier).with_token_generator(tokens),
            )
        }
    };

    Ok(service)
}

fn smtp_config(config: &NotifierConfig) -> SmtpConfig {
    SmtpConfig {
        host: config.smtp_host.clone(),
        port: config.smtp_port,
        username: config.smtp_username.clone(),
        password: config.smtp_password.clone(),
        from_email: config.from_email.clone(),
        from_name: config.from_name.clone(),
        use_tls: config.smtp_use_tls,
        activation_url: config.activation_url.clone(),
    }
}
