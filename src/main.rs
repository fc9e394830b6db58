use chrono::Duration;
use clap::{Arg, ArgAction, Command, ValueHint};
use const_format::formatcp;
use filecask::{config::AppConfig, db, logger, services, sweeper::StagingFileSweeper};
use std::path::Path;
use thiserror::Error;

fn cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(formatcp!(
            "{} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("COMMIT_HASH"),
            env!("COMMIT_DATE")
        ))
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("config")
                .help("Path to the config file")
                .short('c')
                .long("config")
                .value_name("PATH")
                .value_hint(ValueHint::FilePath)
                .required(false)
                .allow_hyphen_values(true)
                .num_args(1),
        )
        .subcommand(
            Command::new("generate-config")
                .about("Generate a new config file")
                .long_about("Generate a new config file with the default values.")
                .arg(
                    Arg::new("config")
                        .help("Path to the config file")
                        .short('c')
                        .long("config")
                        .value_name("PATH")
                        .value_hint(ValueHint::FilePath)
                        .required(true)
                        .allow_hyphen_values(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("overwrite")
                        .help("Overwrite the file if it already exists")
                        .long("overwrite")
                        .action(ArgAction::SetTrue)
                ),
        )
        .subcommand(
            Command::new("test-config")
                .about("Print the config")
                .long_about("Print the config from the given file. This is useful for testing the config file.")
                .arg(
                    Arg::new("config")
                        .help("Path to the config file")
                        .short('c')
                        .long("config")
                        .value_name("PATH")
                        .value_hint(ValueHint::FilePath)
                        .required(false)
                        .allow_hyphen_values(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("sweep")
                .about("Run the expired staging file sweeper")
                .long_about(
                    "Apply pending migrations, then periodically remove expired staging files until interrupted.",
                )
                .arg(
                    Arg::new("config")
                        .help("Path to the config file")
                        .short('c')
                        .long("config")
                        .value_name("PATH")
                        .value_hint(ValueHint::FilePath)
                        .required(false)
                        .allow_hyphen_values(true)
                        .num_args(1),
                ),
        )
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    DBError(#[from] db::DBError),
    #[error("{0}")]
    FigmentError(#[from] figment::Error),
}

#[tokio::main]
async fn main() {
    let cli_matches = cli().get_matches();

    let result = match cli_matches.subcommand() {
        Some(("generate-config", sub_matches)) => {
            let config_path = sub_matches.get_one::<String>("config").unwrap();
            let overwrite = sub_matches.get_flag("overwrite");
            generate_config(config_path, overwrite)
        }
        Some(("test-config", sub_matches)) => {
            let config_path = sub_matches.get_one::<String>("config");
            test_config(config_path)
        }
        Some(("sweep", sub_matches)) => {
            let config_path = sub_matches.get_one::<String>("config");
            run_sweeper(config_path).await
        }
        _ => {
            let config_path = cli_matches.get_one::<String>("config");
            run_migrate(config_path).await
        }
    };

    // Humanize the message if it's an error.
    if let Err(err) = result {
        let mut err = err.to_string();

        if let Some(first) = err.chars().next() {
            if first.is_ascii_lowercase() {
                err = first.to_uppercase().to_string() + &err[1..];
            }
        }

        if let Some(last) = err.chars().last() {
            match last {
                '.' | '!' | '?' => {}
                _ => err.push('.'),
            }
        }

        eprintln!("Command failed.");
        eprintln!("{}", err);
    }
}

fn generate_config(config_path: impl AsRef<Path>, overwrite: bool) -> Result<(), AppError> {
    let config_path = config_path.as_ref();

    if config_path.exists() {
        if !overwrite {
            eprintln!("The file already exists. Use the `--overwrite` flag to overwrite it.");
            eprintln!("Configuration is not generated.");
            return Ok(());
        }

        println!("The file already exists. Overwriting it.");
    }

    const JSON_CONFIG: &str = include_str!("./config/default.json");
    const TOML_CONFIG: &str = include_str!("./config/default.toml");
    const YAML_CONFIG: &str = include_str!("./config/default.yaml");

    let (file_type, file_content) = match config_path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("json") => ("JSON", JSON_CONFIG),
        Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
            ("YAML", YAML_CONFIG)
        }
        _ => ("TOML", TOML_CONFIG),
    };

    std::fs::write(config_path, file_content)?;

    let full_config_path = config_path.canonicalize()?;
    println!(
        "{} configuration has been generated at `{}`.",
        file_type,
        full_config_path.display()
    );

    Ok(())
}

fn test_config(config_path: Option<impl AsRef<Path> + Clone>) -> Result<(), AppError> {
    let app_config = AppConfig::load(config_path.clone())?;

    if let Some(config_path) = &config_path {
        let config_path = config_path.as_ref().canonicalize()?;
        println!(
            "Configuration path has been set: `{}`",
            config_path.display()
        );
    }

    println!("Configuration has been loaded successfully.");

    println!("[Loaded Configuration]");
    println!("- database_url_base: {}", app_config.database_url_base);
    println!("- database_name: {}", app_config.database_name);
    println!(
        "- expired_staging_file_removal_period: {}",
        app_config.expired_staging_file_removal_period
    );
    println!(
        "- expired_staging_file_expiration: {}",
        app_config.expired_staging_file_expiration
    );

    Ok(())
}

/// The default action: apply pending migrations to the configured database.
async fn run_migrate(config_path: Option<impl AsRef<Path> + Clone>) -> Result<(), AppError> {
    logger::setup_logger();

    let app_config = load_config(config_path)?;

    let database_url_base = &app_config.database_url_base;
    let database_name = &app_config.database_name;

    log::info!(target: "db", database_url_base, database_name; "Running database migrations.");
    let applied = db::run_migrations(database_url_base, database_name)?;
    log::info!(target: "db", database_url_base, database_name, applied:?; "Database migrations complete.");

    Ok(())
}

/// Applies pending migrations, then sweeps expired staging files on a period
/// until the process is interrupted.
async fn run_sweeper(config_path: Option<impl AsRef<Path> + Clone>) -> Result<(), AppError> {
    logger::setup_logger();

    let app_config = load_config(config_path)?;

    let database_url_base = &app_config.database_url_base;
    let database_name = &app_config.database_name;

    log::info!(target: "db", database_url_base, database_name; "Running database migrations.");
    db::run_migrations(database_url_base, database_name)?;

    log::info!(target: "db", database_url_base, database_name; "Creating database connection pool.");
    let db_pool = db::create_database_connection_pool(database_url_base, database_name);
    let db_pool = match db_pool {
        Ok(db_pool) => db_pool,
        Err(err) => {
            log::error!(target: "db", database_url_base, database_name, err:err; "Failed to create database connection pool.");
            return Err(err.into());
        }
    };

    let services = services::create_services(db_pool);

    let sweeper = StagingFileSweeper::new(
        Duration::new(app_config.expired_staging_file_removal_period as i64, 0).unwrap(),
        Duration::new(app_config.expired_staging_file_expiration as i64, 0).unwrap(),
        services.staging_file_service.clone(),
    );

    sweeper.start();
    tokio::signal::ctrl_c().await?;
    sweeper.stop().await;

    Ok(())
}

fn load_config(config_path: Option<impl AsRef<Path> + Clone>) -> Result<AppConfig, AppError> {
    let app_config = AppConfig::load(config_path.clone())?;

    if let Some(config_path) = &config_path {
        let config_path = config_path.as_ref().canonicalize()?;
        let config_path = config_path.display().to_string();
        log::info!(target: "init", config_path; "Configuration path has been set.");
    }

    log::info!(target: "init", app_config:serde; "Configuration has been loaded.");

    Ok(app_config)
}
