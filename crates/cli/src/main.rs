//! Command line interface over the warehouse query builder.

mod demo;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use query_engine_translation::translation::helpers::Env;
use warehouse_sql_configuration as configuration;

/// Build SQL statements for the warehouse from typed expressions.
#[derive(Parser)]
#[command(name = "warehouse-sql", version, about)]
struct Cli {
    /// The most verbose log level to print.
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the initial configuration and its JSON schema to a directory.
    Initialize {
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
    /// Check that a configuration directory parses and its metadata is consistent.
    Validate {
        #[arg(long, value_name = "DIR")]
        configuration: PathBuf,
    },
    /// Print the schema-qualified name of a registered table.
    Resolve {
        #[arg(long, value_name = "DIR")]
        configuration: PathBuf,
        table: String,
        schema: String,
    },
    /// Print the statement built by the demonstration query.
    Demo {
        #[arg(long, value_name = "DIR")]
        configuration: PathBuf,
        /// The timestamp folded into the filter, as `yyyy-MM-dd HH:mm:ss`.
        #[arg(long, default_value = "2024-01-01 00:00:00")]
        now: String,
        /// Format the statement over several lines.
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Initialize { out_dir } => {
            configuration::write_parsed_configuration(
                configuration::ParsedConfiguration::initial(),
                &out_dir,
            )
            .await?;
            tracing::info!(dir = %out_dir.display(), "wrote initial configuration");
        }
        Command::Validate { configuration } => {
            let configuration = load(&configuration).await?;
            println!(
                "configuration is valid: {} entities, {} tables",
                configuration.metadata.entities.0.len(),
                configuration.metadata.tables.0.len()
            );
        }
        Command::Resolve {
            configuration,
            table,
            schema,
        } => {
            let configuration = load(&configuration).await?;
            let env = Env::new(&configuration.metadata);
            println!("{}", env.resolve_qualified_name(&table, &schema)?);
        }
        Command::Demo {
            configuration,
            now,
            pretty,
        } => {
            let configuration = load(&configuration).await?;
            let statement = demo::build_statement(&configuration.metadata, &now)?;
            if pretty {
                println!(
                    "{}",
                    sqlformat::format(
                        &statement,
                        &sqlformat::QueryParams::None,
                        sqlformat::FormatOptions::default(),
                    )
                );
            } else {
                println!("{statement}");
            }
        }
    }

    Ok(())
}

async fn load(dir: &std::path::Path) -> anyhow::Result<configuration::Configuration> {
    let parsed = configuration::parse_configuration(dir).await?;
    Ok(configuration::make_runtime_configuration(parsed)?)
}
