mod console;
mod effects;
mod settings;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use engine_logging::{engine_info, engine_warn, LogDestination};
use log::LevelFilter;
use waterfall_core::{AspectRatio, GenerationParams, ItemId, Msg, Preset, Resolution, VideoLength};
use waterfall_engine::{
    ClientSettings, EventSink, FileStorage, ItemPersistence, ItemStore, PersistSettings,
    PromptHandle, ReqwestDownloader, ReqwestGenerationClient, StaticCredentialProvider,
    StopOutcome, WaterfallEngine,
};

use crate::console::ConsoleEventSink;
use crate::effects::EffectRunner;
use crate::settings::{AppSettings, DEFAULT_SETTINGS_FILE};

#[derive(Debug, Parser)]
#[command(
    name = "waterfall",
    version,
    about = "Continuous video generation into a persisted gallery"
)]
struct Cli {
    /// Settings file (RON).
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,
    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate continuously until Ctrl-C (twice aborts in-flight requests).
    Run(RunArgs),
    /// Generate a single item and print it (Ctrl-C aborts).
    Once(RunArgs),
    /// Print the gallery, newest first.
    List,
    /// Show one finished item with its position among the playable items.
    Show { id: String },
    /// Delete items by id.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Download finished items by id, or every finished item with `--all`.
    Download {
        ids: Vec<String>,
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },
    /// Remove every item.
    Clear,
    /// Write the default settings file.
    InitSettings,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, env = "WATERFALL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Parallel workers; defaults to the settings value.
    #[arg(long)]
    concurrency: Option<usize>,
    #[arg(long, default_value = "3:2")]
    ratio: AspectRatio,
    /// Seconds: 6, 10 or 15.
    #[arg(long, default_value = "6")]
    length: VideoLength,
    #[arg(long, default_value = "480p")]
    resolution: Resolution,
    #[arg(long, default_value = "custom")]
    preset: Preset,
    /// Ask for a single response document instead of a stream.
    #[arg(long)]
    no_stream: bool,
    /// Save every finished video into the download directory.
    #[arg(long)]
    auto_download: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("waterfall error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = AppSettings::load_or_default(&cli.settings);
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        settings.level()
    };
    engine_logging::initialize(LogDestination::File(settings.log_file.clone()), level);
    engine_info!("waterfall starting: {:?}", cli.command);

    if let Command::InitSettings = cli.command {
        let path = settings.save(&cli.settings)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let sink: Arc<dyn EventSink> = Arc::new(ConsoleEventSink::default());
    let store = open_store(&settings, sink.clone());

    match cli.command {
        Command::Run(args) => run_pool(settings, store, sink, args).await,
        Command::Once(args) => run_once(settings, store, sink, args).await,
        Command::List => {
            print_gallery(&store);
            Ok(())
        }
        Command::Show { id } => show_item(&store, id),
        Command::Delete { ids } => {
            select(&store, &ids)?;
            store.dispatch(Msg::DeleteSelectedClicked);
            Ok(())
        }
        Command::Download { ids, all } => {
            if all {
                store.dispatch(Msg::SelectAllClicked);
            } else {
                select(&store, &ids)?;
            }
            let effects = store.dispatch(Msg::DownloadSelectedClicked);
            let runner = EffectRunner::new(Arc::new(downloader(&settings)?));
            for path in runner.run(effects).await {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Clear => {
            store.clear();
            Ok(())
        }
        Command::InitSettings => Ok(()),
    }
}

fn open_store(settings: &AppSettings, sink: Arc<dyn EventSink>) -> ItemStore {
    let storage = Arc::new(FileStorage::new(
        settings.data_dir.clone(),
        settings.storage_quota_bytes,
    ));
    let store = ItemStore::new(
        ItemPersistence::new(storage, PersistSettings::default()),
        sink,
    );
    let loaded = store.load();
    engine_info!("Opened gallery with {} items", loaded);
    store
}

fn downloader(settings: &AppSettings) -> Result<ReqwestDownloader> {
    let config = settings.engine_config();
    Ok(ReqwestDownloader::new(
        settings.download_dir.clone(),
        config.connect_timeout,
    )?)
}

fn build_engine(
    settings: &AppSettings,
    store: ItemStore,
    sink: Arc<dyn EventSink>,
    args: RunArgs,
) -> Result<WaterfallEngine> {
    let mut config = settings.engine_config();
    if args.no_stream {
        config.streaming = false;
    }
    if args.auto_download {
        config.auto_download = true;
    }
    let params = GenerationParams {
        aspect_ratio: args.ratio,
        video_length: args.length,
        resolution: args.resolution,
        preset: args.preset,
    };

    let client = ReqwestGenerationClient::new(ClientSettings::from(&config))
        .context("building the generation client")?;
    let credentials = StaticCredentialProvider::new(args.api_key);
    let mut builder = WaterfallEngine::builder(store, Arc::new(client), Arc::new(credentials))
        .prompt(PromptHandle::new(args.prompt, params))
        .sink(sink);
    if config.auto_download {
        builder = builder.downloader(Arc::new(downloader(settings)?));
    }
    Ok(builder.config(config).build())
}

async fn run_pool(
    settings: AppSettings,
    store: ItemStore,
    sink: Arc<dyn EventSink>,
    args: RunArgs,
) -> Result<()> {
    let concurrency = args.concurrency.unwrap_or(settings.concurrency);
    let engine = build_engine(&settings, store, sink, args)?;
    let params = engine
        .prompt()
        .current()
        .map(|(_, params)| params)
        .unwrap_or_default();

    let interrupt = tokio::spawn(watch_interrupts(engine.clone()));
    println!("Generating with {concurrency} workers ({params}); Ctrl-C to stop");
    let result = engine.start(concurrency).await;
    interrupt.abort();

    let report = result?;
    for (worker, exit) in &report.exits {
        engine_info!("Worker {} exit: {:?}", worker, exit);
    }
    let view = engine.store().view();
    println!(
        "{} items in gallery, {} generating",
        view.items.len(),
        view.generating_count
    );
    Ok(())
}

async fn run_once(
    settings: AppSettings,
    store: ItemStore,
    sink: Arc<dyn EventSink>,
    args: RunArgs,
) -> Result<()> {
    let engine = build_engine(&settings, store, sink, args)?;
    let interrupt = tokio::spawn({
        let engine = engine.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                engine.abort();
            }
        }
    });
    let result = engine.generate_once().await;
    interrupt.abort();

    match result? {
        Some(item) => {
            println!("{}  {}", item.id, item.status.as_str());
            if let Some(url) = item.media_url() {
                println!("{url}");
            }
        }
        None => println!("Item was removed before it finished"),
    }
    Ok(())
}

/// First Ctrl-C drains gracefully; the second cancels in-flight requests.
async fn watch_interrupts(engine: WaterfallEngine) {
    if tokio::signal::ctrl_c().await.is_err() {
        engine_warn!("Ctrl-C handler unavailable");
        return;
    }
    match engine.stop() {
        StopOutcome::Draining { generating } => {
            println!("Stopping after {generating} in-flight items; Ctrl-C again to abort");
        }
        outcome => engine_info!("Stop requested: {:?}", outcome),
    }
    if tokio::signal::ctrl_c().await.is_ok() {
        engine.abort();
    }
}

/// Select each named item once; repeating an id does not deselect it.
fn select(store: &ItemStore, ids: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for raw in ids {
        if !seen.insert(raw.as_str()) {
            continue;
        }
        let id = ItemId::new(raw.as_str());
        if store.get(&id).is_none() {
            bail!("no item with id {raw}");
        }
        store.dispatch(Msg::SelectionToggled(id));
    }
    Ok(())
}

fn print_gallery(store: &ItemStore) {
    let view = store.view();
    if view.items.is_empty() {
        println!("Gallery is empty");
        return;
    }
    for card in &view.items {
        println!(
            "{}  {:<10} {}  {}",
            card.id,
            card.status.as_str(),
            card.tags,
            card.prompt
        );
        if let Some(url) = &card.media_url {
            println!("    {url}");
        }
    }
}

fn show_item(store: &ItemStore, id: String) -> Result<()> {
    store.dispatch(Msg::LightboxOpened(ItemId::new(id.as_str())));
    let Some(lightbox) = store.view().lightbox else {
        bail!("item {id} has no playable video");
    };
    println!("[{}] {}", lightbox.counter(), lightbox.prompt);
    println!("{}", lightbox.media_url);
    store.dispatch(Msg::LightboxClosed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterfall_core::{GenerationItem, ItemOutcome};
    use waterfall_engine::{MemoryStorage, NullEventSink};

    fn store_with(ids: &[&str]) -> ItemStore {
        let persistence =
            ItemPersistence::new(Arc::new(MemoryStorage::new()), PersistSettings::default());
        let store = ItemStore::new(persistence, Arc::new(NullEventSink));
        for id in ids {
            let id = ItemId::new(*id);
            store.append(GenerationItem::generating(
                id.clone(),
                "river",
                GenerationParams::default(),
                0,
            ));
            store.update(
                &id,
                ItemOutcome::Completed {
                    content: format!("https://cdn.example/{id}.mp4"),
                    elapsed_ms: 1,
                },
            );
        }
        store
    }

    #[test]
    fn repeated_ids_are_selected_once() {
        let store = store_with(&["a", "b"]);
        select(&store, &["a".to_string(), "a".to_string()]).unwrap();
        store.dispatch(Msg::DeleteSelectedClicked);

        assert!(store.get(&ItemId::new("a")).is_none());
        assert!(store.get(&ItemId::new("b")).is_some());
    }

    #[test]
    fn unknown_id_is_an_error() {
        let store = store_with(&["a"]);
        assert!(select(&store, &["missing".to_string()]).is_err());
    }
}
