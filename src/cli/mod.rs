use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use schemaprobe::api::{self, CheckOptions, IntrospectOptions};
use schemaprobe::config;
use schemaprobe::filter::TableFilter;
use schemaprobe::introspect::Provider;
use schemaprobe::logging::init_logging;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "schemaprobe.toml";

#[derive(Parser)]
#[command(name = "schemaprobe")]
#[command(about = "Check a live database schema against a declared model", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the declared model with the database and report drift
    Check {
        /// Model source, e.g. json:model.json or toml:model/ (repeatable)
        #[arg(long = "model", short = 'm')]
        models: Vec<String>,
        /// Database connection URL
        #[arg(long, short = 'd', env = "SCHEMAPROBE_DATABASE_URL")]
        database: Option<String>,
        #[arg(long, env = "SCHEMAPROBE_PROVIDER")]
        provider: Option<Provider>,
        /// Schema to introspect (repeatable)
        #[arg(long = "schema", short = 's')]
        schemas: Vec<String>,
        /// Actual tables never reported as extra (glob, repeatable)
        #[arg(long = "ignore-table")]
        ignore_tables: Vec<String>,
        /// Config file; schemaprobe.toml in the working directory when present
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Also list constructs that match
        #[arg(long)]
        show_ok: bool,
        #[arg(long)]
        timeout_seconds: Option<u64>,
    },

    /// Print the database schema in the model file format
    Introspect {
        #[arg(long, short = 'd', env = "SCHEMAPROBE_DATABASE_URL")]
        database: String,
        #[arg(long, env = "SCHEMAPROBE_PROVIDER")]
        provider: Option<Provider>,
        #[arg(long = "schema", short = 's')]
        schemas: Vec<String>,
        /// Tables to include (glob, repeatable)
        #[arg(long)]
        include: Vec<String>,
        /// Tables to leave out (glob, repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },
}

pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            models,
            database,
            provider,
            schemas,
            ignore_tables,
            config,
            format,
            show_ok,
            timeout_seconds,
        } => {
            let mut options = CheckOptions::new(models, database.unwrap_or_default())
                .with_target_schemas(schemas)
                .with_ignore_tables(ignore_tables);
            if let Some(provider) = provider {
                options = options.with_provider(provider);
            }
            if let Some(seconds) = timeout_seconds {
                options = options.with_connect_timeout(Duration::from_secs(seconds));
            }

            let config_path = config.or_else(|| {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                default.is_file().then(|| default.to_path_buf())
            });
            if let Some(path) = config_path {
                let file = config::load_from_file(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                options = file.apply_to(options);
            }

            if options.model_sources.is_empty() {
                anyhow::bail!("No model sources given; pass --model or set `model` in the config file");
            }
            if options.database_url.is_empty() {
                anyhow::bail!(
                    "No database given; pass --database, set SCHEMAPROBE_DATABASE_URL or set `database_url` in the config file"
                );
            }

            let result = api::check(options).await?;
            match format {
                OutputFormat::Text => print!("{}", result.report.render_text(show_ok)),
                OutputFormat::Json => println!("{}", result.report.render_json()?),
            }

            Ok(if result.has_errors {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Introspect {
            database,
            provider,
            schemas,
            include,
            exclude,
        } => {
            let filter = TableFilter::new(&include, &exclude).context("Invalid table pattern")?;
            let mut options = IntrospectOptions::new(database)
                .with_target_schemas(schemas)
                .with_filter(filter);
            if let Some(provider) = provider {
                options = options.with_provider(provider);
            }

            let result = api::introspect(options).await?;
            println!("{}", result.to_json()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_accepts_repeated_flags() {
        let cli = Cli::try_parse_from([
            "schemaprobe",
            "-v",
            "check",
            "--model",
            "json:a.json",
            "--model",
            "toml:b.toml",
            "--database",
            "sqlite://app.db",
            "--ignore-table",
            "_sqlx_*",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Check {
                models,
                database,
                ignore_tables,
                format,
                ..
            } => {
                assert_eq!(models, vec!["json:a.json", "toml:b.toml"]);
                assert_eq!(database.as_deref(), Some("sqlite://app.db"));
                assert_eq!(ignore_tables, vec!["_sqlx_*"]);
                assert_eq!(format, OutputFormat::Json);
            }
            Commands::Introspect { .. } => panic!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn provider_flag_parses_aliases() {
        let cli = Cli::try_parse_from([
            "schemaprobe",
            "introspect",
            "--database",
            "app.db",
            "--provider",
            "sqlite3",
        ])
        .unwrap();

        match cli.command {
            Commands::Introspect { provider, .. } => assert_eq!(provider, Some(Provider::Sqlite)),
            Commands::Check { .. } => panic!("parsed the wrong subcommand"),
        }
    }
}
