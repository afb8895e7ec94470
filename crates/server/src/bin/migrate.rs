use clap::Parser;
use server::db;
use shared::{configure_tracing, load_dotenv};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[clap(name = "workout planner migrate")]
struct Cli {
    #[clap(long, env, default_value = "planner.sqlite")]
    sqlite_connection_string: String,

    /// Deletes the database before running migrations, for debug purposes
    #[arg(long, env, default_value = "false")]
    debug_delete_database: bool,
}

fn main() -> Result<(), anyhow::Error> {
    load_dotenv()?;
    configure_tracing();

    let args = Cli::parse();
    debug!(?args);

    if args.debug_delete_database {
        match std::fs::remove_file(&args.sqlite_connection_string) {
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {}
            r => {
                r?;
                info!("Deleted database {}", args.sqlite_connection_string);
            }
        }
    }

    let ran = db::run_migrations(&args.sqlite_connection_string)?;
    info!("Ran {ran} db migrations");

    Ok(())
}
