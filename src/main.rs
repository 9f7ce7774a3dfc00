use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use comikrat::api::{ApiConfig, ComicsApi, HttpComicsApi};
use comikrat::event_source::KeyboardEventSource;
use comikrat::library::{self, LibraryFilter, LibrarySort, StatusFilter};
use comikrat::panic_handler::initialize_panic_handler;
use comikrat::reader::{DocumentSource, PdfDocumentLoader};
use comikrat::reader::progress_sync::DEFAULT_DEBOUNCE;
use comikrat::settings::{LocalStorage, SettingsStore};
use comikrat::system_command::RealSystemCommandExecutor;
use comikrat::{ReaderConfig, ReaderServices, ReaderSession, run_reader_with_event_source};

#[derive(Parser, Debug)]
#[command(name = "comikrat", version, about = "Read comics from your library in the terminal")]
struct Cli {
    /// Base URL of the comics backend
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    api_url: String,

    /// CSRF token sent with state-changing requests
    #[arg(long, global = true)]
    csrf_token: Option<String>,

    /// Session cookie, e.g. "laravel_session=..."
    #[arg(long, global = true)]
    session_cookie: Option<String>,

    /// Where reader settings are stored
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[arg(long, global = true, default_value = "comikrat.log")]
    log_file: PathBuf,

    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a comic in the reader
    Read(ReadArgs),
    /// List the comics in your library
    Library(LibraryArgs),
}

#[derive(Args, Debug)]
struct ReadArgs {
    /// Comic slug, as used by the API
    slug: String,

    /// Local path or URL of the comic PDF
    document: String,

    /// Title shown in the toolbar
    #[arg(long)]
    title: Option<String>,

    /// Milliseconds to wait for more page turns before syncing progress
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
    sync_debounce_ms: u64,
}

#[derive(Args, Debug)]
struct LibraryArgs {
    /// Case-insensitive match on title or author
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    genre: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    status: StatusFilter,

    #[arg(long, value_enum, default_value_t)]
    sort: LibrarySort,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?,
    )?;

    let mut api_config = ApiConfig::new(&cli.api_url);
    if let Some(token) = &cli.csrf_token {
        api_config = api_config.with_csrf_token(token);
    }
    if let Some(cookie) = &cli.session_cookie {
        api_config = api_config.with_session_cookie(cookie);
    }
    let api = Arc::new(HttpComicsApi::new(api_config)?);

    match cli.command {
        Command::Library(args) => print_library(api.as_ref(), &args),
        Command::Read(args) => {
            let settings_store = match &cli.storage {
                Some(path) => SettingsStore::new(LocalStorage::open(path)),
                None => SettingsStore::open_default(),
            };
            let loader = Arc::new(PdfDocumentLoader::new(api.config())?);
            let mut config = ReaderConfig::new(args.slug, DocumentSource::parse(&args.document))
                .with_sync_debounce(Duration::from_millis(args.sync_debounce_ms));
            if let Some(title) = args.title {
                config = config.with_title(title);
            }
            let services = ReaderServices {
                api,
                loader,
                settings_store,
                system_executor: Box::new(RealSystemCommandExecutor),
            };
            run_terminal_reader(config, services)
        }
    }
}

fn run_terminal_reader(config: ReaderConfig, services: ReaderServices) -> Result<()> {
    info!("Starting comikrat for {}", config.slug);
    initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut session = ReaderSession::open(config, services, Instant::now());
    let res = run_reader_with_event_source(&mut terminal, &mut session, &mut KeyboardEventSource);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Flushing progress may wait on the network; the terminal is already back
    session.close();

    if let Err(err) = &res {
        error!("Application error: {err:?}");
    }
    info!("Shutting down comikrat");
    res
}

fn print_library(api: &dyn ComicsApi, args: &LibraryArgs) -> Result<()> {
    let entries = api.library().context("failed to fetch library")?;
    let filter = LibraryFilter {
        search: args.search.clone(),
        genre: args.genre.clone(),
        status: args.status,
    };
    let shown = library::apply(&entries, &filter, args.sort);

    if shown.is_empty() {
        println!("No comics match.");
        return Ok(());
    }
    for entry in shown {
        println!(
            "{:<32} {:<20} {:>4}/{:<4} {:>5.1}%  {}",
            entry.title,
            entry.author.as_deref().unwrap_or("-"),
            entry.current_page,
            entry.total_pages,
            entry.progress_percentage(),
            entry.status().as_str()
        );
    }
    println!();
    println!("Genres: {}", library::genres(&entries).join(", "));
    Ok(())
}
