//! Command-line entry point for the BoxBook inventory.
//!
//! # Responsibility
//! - Parse commands and map each one to a single `InventoryApi` call.
//! - Print the response envelope as JSON on stdout.
//!
//! # Invariants
//! - Exit code is 0 for 2xx, 1 for 4xx, 2 for 5xx and bootstrap failures.

use boxbook_api::{ApiConfig, ApiResponse, InventoryApi};
use boxbook_core::{BookPatch, InventoryService, NewBook, SqliteInventoryRepository};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use serde_json::json;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "boxbook", version, about = "Box and book inventory")]
struct Cli {
    /// SQLite database path, or `:memory:` for a throwaway database.
    #[arg(long, global = true, env = "BOXBOOK_DB_PATH")]
    db: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "BOXBOOK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true, env = "BOXBOOK_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a health check and the core version.
    Ping,

    /// Manage boxes.
    #[command(name = "box")]
    Boxes {
        #[command(subcommand)]
        command: BoxCommand,
    },

    /// Manage books.
    #[command(name = "book")]
    Books {
        #[command(subcommand)]
        command: BookCommand,
    },
}

#[derive(Subcommand, Debug)]
enum BoxCommand {
    Create { name: String },
    List,
    Get { id: String },
    Update { id: String, name: String },
    /// Delete an empty box.
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum BookCommand {
    /// Create a book, optionally storing it in a box right away.
    Create {
        #[command(flatten)]
        fields: BookFields,
        #[arg(long = "box")]
        box_id: Option<String>,
    },
    List,
    Get { id: String },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        /// Fields as a JSON object, e.g. `{"price": 12.5}`.
        #[arg(long, conflicts_with_all = ["title", "description", "author", "price"])]
        json: Option<String>,
    },
    /// Delete a book that is not stored in any box.
    Delete { id: String },
    /// Store an existing book in a box.
    Add { box_id: String, book_id: String },
    /// Take a book out of its box.
    Remove { box_id: String, book_id: String },
    /// Print the id of the box storing a book.
    Locate { id: String },
}

#[derive(Args, Debug)]
struct BookFields {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    author: String,
    #[arg(long, default_value_t = 0.0)]
    price: f64,
}

impl From<BookFields> for NewBook {
    fn from(fields: BookFields) -> Self {
        NewBook {
            title: fields.title,
            description: fields.description,
            author: fields.author,
            price: fields.price,
        }
    }
}

/// Inventory command resolved after the database is available.
enum Target {
    Box(BoxCommand),
    Book(BookCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ApiConfig::from_env().with_overrides(cli.db, cli.log_level, cli.log_dir);

    if let Err(err) = config.init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let target = match cli.command {
        Command::Ping => {
            let pong = json!({
                "status": 200,
                "message": boxbook_core::ping(),
                "version": boxbook_core::core_version(),
            });
            return if print_json(&pong) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            };
        }
        Command::Boxes { command } => Target::Box(command),
        Command::Books { command } => Target::Book(command),
    };

    let conn = match config.open_connection() {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=cli_start module=cli status=error error_code=db_open_failed error={err}");
            eprintln!("failed to open database: {err}");
            return ExitCode::from(2);
        }
    };
    let repo = match SqliteInventoryRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => {
            error!(
                "event=cli_start module=cli status=error error_code=repo_init_failed error={err}"
            );
            eprintln!("failed to prepare inventory storage: {err}");
            return ExitCode::from(2);
        }
    };
    info!("event=cli_start module=cli status=ok");

    let api = InventoryApi::new(InventoryService::new(repo));
    let response = match target {
        Target::Box(command) => run_box(&api, command),
        Target::Book(command) => run_book(&api, command),
    };
    if !print_json(&response.to_json()) {
        return ExitCode::from(2);
    }
    exit_code_for(&response)
}

type SqliteApi<'conn> = InventoryApi<SqliteInventoryRepository<'conn>>;

fn run_box(api: &SqliteApi<'_>, command: BoxCommand) -> ApiResponse {
    match command {
        BoxCommand::Create { name } => api.create_box(&name),
        BoxCommand::List => api.list_boxes(),
        BoxCommand::Get { id } => api.get_box(&id),
        BoxCommand::Update { id, name } => api.update_box(&id, &name),
        BoxCommand::Delete { id } => api.delete_box(&id),
    }
}

fn run_book(api: &SqliteApi<'_>, command: BookCommand) -> ApiResponse {
    match command {
        BookCommand::Create {
            fields,
            box_id: Some(box_id),
        } => api.create_book_in_box(&box_id, fields.into()),
        BookCommand::Create {
            fields,
            box_id: None,
        } => api.create_book(fields.into()),
        BookCommand::List => api.list_books(),
        BookCommand::Get { id } => api.get_book(&id),
        BookCommand::Update {
            id, json: Some(raw), ..
        } => api.update_book_json(&id, &raw),
        BookCommand::Update {
            id,
            title,
            description,
            author,
            price,
            json: None,
        } => {
            let patch = BookPatch {
                title,
                description,
                author,
                price,
            };
            api.update_book(&id, &patch)
        }
        BookCommand::Delete { id } => api.delete_book(&id),
        BookCommand::Add { box_id, book_id } => api.add_book_to_box(&box_id, &book_id),
        BookCommand::Remove { box_id, book_id } => api.remove_book_from_box(&box_id, &book_id),
        BookCommand::Locate { id } => api.locate_book(&id),
    }
}

fn exit_code_for(response: &ApiResponse) -> ExitCode {
    match response.status {
        200..=299 => ExitCode::SUCCESS,
        400..=499 => ExitCode::from(1),
        _ => ExitCode::from(2),
    }
}

fn print_json(value: &serde_json::Value) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            true
        }
        Err(err) => {
            eprintln!("failed to render response: {err}");
            false
        }
    }
}
