// Interactive terminal front end for the search session controller.
//
// Reads commands from stdin and prints results to stdout. Logs go to stderr
// and are controlled with RUST_LOG.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kodegen_tools_search_session::filters::AppliedFilters;
use kodegen_tools_search_session::utils::FALLBACK_PAGE_SIZE;
use kodegen_tools_search_session::{
    ClientConfig, FilterCategory, HighlightMarker, Highlighter, HttpBackend, LoadingPhase,
    PageRequest, Presenter, RenderedItem, SearchSessionController, UserCommand,
};

#[derive(Parser, Debug)]
#[command(
    name = "kodegen-search-session",
    about = "Stream two-phase search results from a search backend",
    version
)]
struct Args {
    /// Backend origin
    #[arg(long, env = "SEARCH_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Page size used when the backend does not report one
    #[arg(long, default_value_t = FALLBACK_PAGE_SIZE)]
    fallback_page_size: u32,

    /// Run a single query against the one-shot endpoint and exit
    #[arg(long, value_name = "QUERY")]
    once: Option<String>,

    /// Page to fetch with --once (zero-based)
    #[arg(long, default_value_t = 0, requires = "once")]
    page: u32,

    /// Print highlights as plain brackets instead of terminal bold
    #[arg(long)]
    plain: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

const HELP: &str = "\
commands:
  <text>                 search
  :more                  load the next page
  :drop <Category>=<v>   hide a filter value (Autor, Ano, Tipo, Número)
  :cancel                cancel the running search
  :quit                  exit";

/// Parse one input line. Blank lines yield `None`.
fn parse_command(line: &str) -> Result<Option<UserCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(UserCommand::Submit(line.to_string())));
    };

    let (name, argument) = rest.split_once(' ').unwrap_or((rest, ""));
    let command = match name {
        "more" | "next" => UserCommand::NextPage,
        "cancel" => UserCommand::Cancel,
        "quit" | "q" => UserCommand::Quit,
        "drop" => {
            let Some((category, value)) = argument.split_once('=') else {
                bail!("usage: :drop <Category>=<value>");
            };
            let category: FilterCategory = category.parse()?;
            let value = value.trim();
            if value.is_empty() {
                bail!("usage: :drop <Category>=<value>");
            }
            UserCommand::RemoveFilter {
                category,
                value: value.to_string(),
            }
        }
        other => bail!("unknown command ':{other}'\n{HELP}"),
    };
    Ok(Some(command))
}

/// Prints everything the controller pushes
#[derive(Debug, Default)]
struct TerminalPresenter {
    shown: usize,
}

impl Presenter for TerminalPresenter {
    fn truncate_results(&mut self, keep: usize) {
        if keep < self.shown {
            if keep == 0 {
                println!("\n=== new results ===");
            } else {
                println!("\n=== results after #{keep} refreshed ===");
            }
        }
        self.shown = keep;
    }

    fn render_results(&mut self, items: &[RenderedItem]) {
        for item in items {
            println!("\n{}", item.heading);
            println!("   Autor(es): {}", item.author);
            if !item.summary.is_empty() {
                println!("   {}", item.summary);
            }
            if !item.keywords.is_empty() {
                println!("   [{}]", item.keywords.join("] ["));
            }
            for link in [&item.pdf_link, &item.portal_link, &item.legislative_link]
                .into_iter()
                .flatten()
            {
                println!("   -> {link}");
            }
        }
        self.shown += items.len();
    }

    fn render_filters(&mut self, filters: &AppliedFilters) {
        if filters.is_empty() {
            return;
        }
        println!("\nfilters:");
        for group in filters.groups() {
            if !group.values.is_empty() {
                println!("  {}: {}", group.category, group.values.join(" ou "));
            }
        }
    }

    fn set_loading(&mut self, phase: Option<LoadingPhase>) {
        if let Some(phase) = phase {
            println!("... {}", phase.label());
        }
    }

    fn show_error(&mut self, message: &str) {
        println!("! {message}");
    }

    fn hide_error(&mut self) {}

    fn set_load_more(&mut self, enabled: bool) {
        if enabled {
            println!("(:more for the next page)");
        }
    }

    fn set_end_of_results(&mut self, visible: bool) {
        if visible {
            println!("-- end of results --");
        }
    }

    fn show_summary(&mut self, shown: usize, total: Option<u64>) {
        match total {
            Some(total) => println!("{shown} of {total} results"),
            None => println!("{shown} results"),
        }
    }
}

async fn read_commands(commands: mpsc::Sender<UserCommand>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_command(&line) {
            Ok(Some(command)) => {
                let quit = command == UserCommand::Quit;
                if commands.send(command).await.is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
    debug!("Command input closed");
    Ok(())
}

async fn run_once(backend: &HttpBackend, query: &str, page: u32) -> Result<()> {
    let page_size = match backend.fetch_remote_config().await {
        Ok(remote) => remote
            .default_page_size
            .filter(|size| *size > 0)
            .unwrap_or(backend.config().fallback_page_size()),
        Err(e) => {
            warn!(error = %e, "Remote configuration unavailable, using fallback page size");
            backend.config().fallback_page_size()
        }
    };

    let request = PageRequest::new(query.trim(), page, page_size);
    let batch = backend
        .search_once(&request)
        .await
        .context("One-shot search failed")?;

    let highlighter = Highlighter::for_batch(
        batch.highlight_terms(),
        &request.query,
        backend.config().highlight_marker().clone(),
    );
    let first = page as usize * page_size as usize;
    let items: Vec<RenderedItem> = batch
        .items
        .iter()
        .enumerate()
        .map(|(offset, item)| RenderedItem::project(item, first + offset + 1, &highlighter))
        .collect();

    let mut presenter = TerminalPresenter::default();
    if let Some(filters) = &batch.applied_filters {
        presenter.render_filters(filters);
    }
    presenter.render_results(&items);
    presenter.show_summary(items.len(), batch.total_elements);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone());
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let marker = if args.plain {
        HighlightMarker::new("[", "]")
    } else {
        HighlightMarker::new("\x1b[1;33m", "\x1b[0m")
    };
    let config = ClientConfig::builder()
        .base_url(&args.base_url)
        .fallback_page_size(args.fallback_page_size)
        .highlight_marker(marker)
        .build()?;
    let backend = HttpBackend::new(config.clone())?;

    if let Some(query) = &args.once {
        return run_once(&backend, query, args.page).await;
    }

    println!("{HELP}");
    let (commands_tx, commands_rx) = mpsc::channel(32);
    let reader = tokio::spawn(read_commands(commands_tx));

    let controller = SearchSessionController::new(Arc::new(backend), TerminalPresenter::default())
        .with_highlight_marker(config.highlight_marker().clone())
        .with_fallback_page_size(config.fallback_page_size());
    controller.run(commands_rx).await;

    reader.abort();
    Ok(())
}
