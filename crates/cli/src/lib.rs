use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use folio_pdf_engine::{default_provider, DocumentProvider, LopdfProvider, OpenSource, PageSource};
use folio_viewer::{BookViewer, SurfaceSide};
use folio_viewer_core::{ViewerConfig, ViewportSize};
use futures::executor::block_on;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(about = "Two-page PDF book viewer")]
pub struct Cli {
    /// Read viewer settings from a `key = value` file instead of the environment.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Open a book and print the spread the viewer settles on.
    Spread {
        #[command(flatten)]
        book: BookArgs,
        /// Forward moves to apply after loading.
        #[arg(long, default_value_t = 0)]
        next: u32,
        /// Backward moves to apply after the forward ones.
        #[arg(long, default_value_t = 0)]
        prev: u32,
    },
    /// Render the spread showing a page into PNG files.
    Render {
        #[command(flatten)]
        book: BookArgs,
        /// 1-based page that must be on screen.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_name = "DIR")]
        output: PathBuf,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Args)]
struct BookArgs {
    /// Startup query string, e.g. `?file=book.pdf&title=Atlas&first`.
    #[arg(long)]
    query: String,
    #[arg(long, default_value_t = 800.0)]
    width: f32,
    #[arg(long, default_value_t = 600.0)]
    height: f32,
}

#[derive(Debug, Serialize)]
struct DocumentInfo {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSize>,
}

#[derive(Debug, Serialize)]
struct PageSize {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct SpreadOutput {
    title: String,
    download: String,
    page_index: u32,
    pair_with_next: bool,
    label: Option<String>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing();
    tracing::debug!(command = ?cli.command, "starting");

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Spread { book, next, prev } => {
            let config = load_config(cli.config.as_deref())?;
            run_spread(&book, config, next, prev)
        }
        Commands::Render { book, page, output } => {
            let config = load_config(cli.config.as_deref())?;
            run_render(&book, config, page, &output)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // a subscriber may already be installed when run() is called in-process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => ViewerConfig::from_env().context("invalid FOLIO_* environment"),
    }
}

fn run_info(file: &Path) -> Result<()> {
    let source = OpenSource::from(file);
    let document = block_on(default_provider().open(&source, &mut |_| {}))
        .context("failed to open PDF")?;

    // open() rejects documents without pages
    let first = block_on(document.page_geometry(0))?;
    let info = DocumentInfo {
        path: file.display().to_string(),
        page_count: document.page_count(),
        first_page_size_pt: Some(PageSize {
            width: first.width,
            height: first.height,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&info)?);

    Ok(())
}

fn open_book(book: &BookArgs, config: ViewerConfig) -> Result<BookViewer<LopdfProvider>> {
    let viewport = ViewportSize::new(book.width, book.height);
    if viewport.is_empty() {
        anyhow::bail!("--width and --height must be positive");
    }

    let config = config.with_initial_viewport(viewport);
    let viewer = BookViewer::from_query(default_provider(), &book.query, config)
        .context("invalid --query")?;

    block_on(viewer.open()).context("failed to open PDF")?;
    Ok(viewer)
}

fn run_spread(book: &BookArgs, config: ViewerConfig, next: u32, prev: u32) -> Result<()> {
    let viewer = open_book(book, config)?;

    for _ in 0..next {
        block_on(viewer.next_page())?;
    }
    for _ in 0..prev {
        block_on(viewer.previous_page())?;
    }

    let status = viewer.status();
    let state = status.navigation.unwrap_or_default();
    let payload = SpreadOutput {
        title: status.title,
        download: status.download,
        page_index: state.page_index,
        pair_with_next: state.pair_with_next,
        label: status.label,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}

fn run_render(book: &BookArgs, config: ViewerConfig, page: u32, output: &Path) -> Result<()> {
    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let viewer = open_book(book, config)?;
    let page_count = viewer.load_state().page_count().unwrap_or(0);
    if page > page_count {
        anyhow::bail!("--page {page} is past the last page ({page_count})");
    }

    let target = page - 1;
    while let Some(state) = viewer.navigation() {
        if state.page_index + state.visible_pages() > target {
            break;
        }
        block_on(viewer.next_page())?;
        if viewer.navigation() == Some(state) {
            break;
        }
    }

    fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let surfaces = [
        (SurfaceSide::Left, "left.png"),
        (SurfaceSide::Right, "right.png"),
    ];
    for (side, name) in surfaces {
        let path = output.join(name);
        let written = viewer.with_surface(side, |surface| match &surface.pixels {
            Some(pixels) if surface.visible => pixels.save(&path).map(|()| true),
            _ => Ok(false),
        });

        if written.with_context(|| format!("failed to write image to {}", path.display()))? {
            println!("{}", path.display());
        }
    }

    Ok(())
}
