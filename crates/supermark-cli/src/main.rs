use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use supermark_editor_core::{
    ContentStore, DroppedFile, EditorConfig, EditorController, FileStore, Instant, StoreAdapter,
    ingest, splice,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "SuperMark - live markdown editor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding saved content
    #[arg(long, global = true, env = "SUPERMARK_STORE")]
    store: Option<PathBuf>,

    /// KDL config file
    #[arg(long, global = true, env = "SUPERMARK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to an HTML fragment
    Render {
        /// Markdown file
        file: PathBuf,
    },
    /// Write a self-contained snapshot page
    Export {
        /// Markdown file (defaults to the saved document)
        file: Option<PathBuf>,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the markdown held by a snapshot page
    Import {
        /// Page produced by `export`
        page: PathBuf,
    },
    /// Embed an image into markdown as a data URL
    Embed {
        /// Markdown file
        markdown: PathBuf,

        /// Image file
        image: PathBuf,

        /// Character offset to insert at (defaults to the end)
        #[arg(long)]
        at: Option<usize>,
    },
    /// Line-based editing session with live preview and autosave
    Edit,
    /// Delete the persisted document from the store directory
    Clean,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    init_tracing();

    let cli = Cli::parse();
    let store_dir = cli.store.unwrap_or_else(default_store_dir);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render { file } => {
            let text = read_text(&file)?;
            print!("{}", supermark_renderer::render_html(&text));
        }
        Commands::Export { file, output } => {
            let page = match file {
                Some(file) => supermark_renderer::export_snapshot(&read_text(&file)?),
                None => EditorController::new(FileStore::new(&store_dir), config).export_snapshot(),
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, page).into_diagnostic()?;
                    println!("✓ Exported to {}", path.display());
                }
                None => print!("{page}"),
            }
        }
        Commands::Import { page } => {
            let html = read_text(&page)?;
            let text = supermark_renderer::import_snapshot(&html).ok_or_else(|| {
                miette::miette!("{} is not a SuperMark snapshot", page.display())
            })?;
            print!("{text}");
        }
        Commands::Embed {
            markdown,
            image,
            at,
        } => {
            let text = read_text(&markdown)?;
            let file = DroppedFile::from_path(&image)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading {}", image.display()))?;
            let reference = ingest(&file)?;
            let position = at.unwrap_or_else(|| text.chars().count());
            print!(
                "{}",
                splice(&text, &reference.markdown(&config.image_alt), position)
            );
        }
        Commands::Edit => edit_session(FileStore::new(&store_dir), config).await?,
        Commands::Clean => {
            let adapter = StoreAdapter::new(FileStore::new(&store_dir), config.storage_key);
            if !adapter.clear() {
                return Err(miette::miette!(
                    "could not remove saved content in {}",
                    store_dir.display()
                ));
            }
            println!("✓ Cleared saved content in {}", store_dir.display());
        }
    }

    Ok(())
}

/// Each stdin line is appended to the document; lines starting with `:` are
/// commands. The preview is printed after every change.
async fn edit_session<S: ContentStore>(store: S, config: EditorConfig) -> Result<()> {
    let mut editor = EditorController::new(store, config);
    println!("{}", editor.html());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.into_diagnostic()? else {
                    break;
                };
                if !handle_line(&mut editor, &line)? {
                    break;
                }
            }
            _ = save_deadline(editor.next_save_at()) => {
                editor.flush_due(Instant::now());
            }
        }
    }

    if editor.flush_now() {
        tracing::info!("saved pending changes");
    }
    Ok(())
}

/// Resolves once the pending autosave is due; never, if none is pending.
async fn save_deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at.into()).await,
        None => std::future::pending().await,
    }
}

/// Returns false when the session should end.
fn handle_line<S: ContentStore>(editor: &mut EditorController<S>, line: &str) -> Result<bool> {
    let now = Instant::now();
    let (command, arg) = match line.strip_prefix(':') {
        Some(rest) => rest.split_once(' ').unwrap_or((rest, "")),
        None => {
            editor.insert_at(editor.len_chars(), &format!("{line}\n"), now);
            println!("{}", editor.html());
            return Ok(true);
        }
    };

    match command {
        "quit" | "q" => return Ok(false),
        "clear" => {
            editor.on_input("", now);
        }
        "reset" => editor.reset(),
        "show" => {
            print!("{}", editor.text());
            return Ok(true);
        }
        "drop" => {
            let path = Path::new(arg.trim());
            editor.on_drag_enter();
            match DroppedFile::from_path(path) {
                Ok(file) => {
                    let end = editor.len_chars();
                    if let Err(err) = editor.on_drop(&file, end, now) {
                        eprintln!("⚠ {err}");
                    }
                }
                Err(err) => {
                    editor.on_drag_leave();
                    eprintln!("⚠ could not read {}: {err}", path.display());
                }
            }
        }
        "export" => {
            let path = Path::new(arg.trim());
            std::fs::write(path, editor.export_snapshot()).into_diagnostic()?;
            println!("✓ Exported to {}", path.display());
            return Ok(true);
        }
        other => {
            eprintln!("⚠ unknown command :{other}");
            return Ok(true);
        }
    }
    println!("{}", editor.html());
    Ok(true)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match dirs::config_dir() {
            Some(dir) => dir.join("supermark").join("config.kdl"),
            None => return Ok(EditorConfig::default()),
        },
    };
    Ok(EditorConfig::load(&path)?)
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("supermark"))
        .unwrap_or_else(|| PathBuf::from(".supermark"))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn init_miette() {
    let hook = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(3)
                .break_words(true)
                .build(),
        )
    }));
    if hook.is_err() {
        tracing::debug!("miette hook already installed");
    }
    miette::set_panic_hook();
}
