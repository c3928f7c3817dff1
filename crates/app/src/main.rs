use std::{error::Error, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use telegram_bot::RestrictionPolicy;

mod settings;

type BoxError = Box<dyn Error + Send + Sync>;

const RESTART_DELAY: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "dresscode")]
#[command(about = "Telegram bot managing group owners, managers and new member restrictions")]
struct Cli {
    /// Settings file; TOML, YAML or JSON by extension.
    #[arg(short, long, env = "DRESSCODE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Database(DatabaseArgs),
    Telegram(TelegramArgs),
}

#[derive(Args, Debug)]
struct DatabaseArgs {
    #[command(subcommand)]
    command: DatabaseCommand,
}

#[derive(Subcommand, Debug)]
enum DatabaseCommand {
    /// Apply pending migrations.
    Migrate,
    /// Roll back the last applied migration.
    Rollback,
    /// Drop every table and apply all migrations again.
    Fresh,
    /// List applied and pending migrations.
    Status,
}

#[derive(Args, Debug)]
struct TelegramArgs {
    #[command(subcommand)]
    command: TelegramCommand,
}

#[derive(Subcommand, Debug)]
enum TelegramCommand {
    /// Migrate, then long poll until ctrl-c.
    Run,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "dresscode={level},telegram_bot={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    match cli.command {
        Command::Database(DatabaseArgs { command }) => database(&settings.database, command).await?,
        Command::Telegram(TelegramArgs {
            command: TelegramCommand::Run,
        }) => run_telegram(&settings).await?,
    }

    Ok(())
}

async fn database(
    config: &settings::Database,
    command: DatabaseCommand,
) -> Result<(), BoxError> {
    match command {
        DatabaseCommand::Migrate => {
            connect(config).await?;
            tracing::info!("Database is up to date");
        }
        DatabaseCommand::Rollback => {
            let database = sea_orm::Database::connect(&config.url).await?;
            Migrator::down(&database, Some(1)).await?;
            tracing::info!("Rolled back the last migration");
        }
        DatabaseCommand::Fresh => {
            let database = sea_orm::Database::connect(&config.url).await?;
            Migrator::fresh(&database).await?;
            tracing::info!("Database recreated");
        }
        DatabaseCommand::Status => {
            let database = sea_orm::Database::connect(&config.url).await?;
            Migrator::status(&database).await?;
        }
    }
    Ok(())
}

async fn connect(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let database = sea_orm::Database::connect(&config.url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

/// Keeps the bot alive: any failure is logged and the bot restarted. Returns
/// once the bot stops on its own.
async fn run_telegram(settings: &settings::Settings) -> Result<(), BoxError> {
    let telegram = settings
        .telegram
        .as_ref()
        .ok_or("missing [telegram] settings")?;
    tracing::info!("Found telegram settings...");

    let restriction = &settings.restriction;
    let permissions = telegram_bot::parse_permissions(restriction.permissions.as_slice())?;
    let policy = RestrictionPolicy::new(
        restriction.mode,
        restriction.whitelist.iter().copied(),
        permissions,
    );

    let db = connect(&settings.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    let bot = telegram_bot::Bot::builder()
        .token(&telegram.token)
        .engine(engine)
        .policy(policy)
        .polling_timeout(telegram.polling.timeout())
        .build()?;

    loop {
        match bot.run().await {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::error!("telegram bot stopped: {err}");
                tokio::time::sleep(RESTART_DELAY).await;
            }
        }
    }
}
