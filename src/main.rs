use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use pkgdoc::config::{self, Config, LATEST_VERSION, SourceKind, UNKNOWN_MODULE_PATH};
use pkgdoc::datasource::{DataSource, IndexDataSource, ProxyDataSource};
use pkgdoc::error::Error;
use pkgdoc::frontend::{directory_url, fetch_directory_details, resolve_licenses, resolve_path_info};
use pkgdoc::latest::{LatestAnnotator, RenderedPage, SourceLatest, serve_page};
use pkgdoc::logging;
use pkgdoc::module::{LicenseMetadata, Module};
use pkgdoc::module::version::link_version;
use pkgdoc::proxy::ProxyClient;

#[derive(Parser)]
#[command(name = "pkgdoc")]
#[command(
    version,
    about = "Resolve paths, licenses and directory listings for a package documentation site"
)]
struct Cli {
    /// Configuration file (defaults to <data dir>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data source to query, overriding the configuration file
    #[arg(long, global = true, value_enum)]
    source: Option<SourceKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a path to its module and version
    Resolve {
        path: String,
        #[arg(long, default_value = UNKNOWN_MODULE_PATH)]
        module: String,
        #[arg(long, default_value = LATEST_VERSION)]
        version: String,
    },
    /// List the licenses covering a path
    Licenses {
        path: String,
        #[arg(long)]
        module: String,
        #[arg(long, default_value = LATEST_VERSION)]
        version: String,
    },
    /// List the packages at or beneath a directory
    Directory {
        path: String,
        #[arg(long)]
        module: String,
        #[arg(long, default_value = LATEST_VERSION)]
        version: String,
        /// Include the package at the directory itself (module roots only)
        #[arg(long)]
        include_self: bool,
    },
    /// Print the canonical URL of a directory or package
    Url {
        path: String,
        #[arg(long)]
        module: String,
        #[arg(long, default_value = LATEST_VERSION)]
        version: String,
    },
    /// Fill latest-version badges in a rendered page (stdin when no file is given)
    Annotate { file: Option<PathBuf> },
    /// Manage the local module index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Add or replace a module version from a JSON manifest
    Add { manifest: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(source) = cli.source {
        config.source = source;
    }
    let _guard = logging::init(&config.logging, &config::log_dir())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let timeout = config.request.timeout();
    match command {
        Command::Resolve {
            path,
            module,
            version,
        } => {
            let ds = open_source(&config)?;
            let info =
                with_deadline(timeout, resolve_path_info(ds.as_ref(), &path, &module, &version))
                    .await?;
            print_json(&info)
        }
        Command::Licenses {
            path,
            module,
            version,
        } => {
            let ds = open_source(&config)?;
            let licenses =
                with_deadline(timeout, resolve_licenses(ds.as_ref(), &path, &module, &version))
                    .await?;
            print_json(&licenses)
        }
        Command::Directory {
            path,
            module,
            version,
            include_self,
        } => {
            let ds = open_source(&config)?;
            with_deadline(timeout, directory(ds.as_ref(), &path, &module, &version, include_self))
                .await
        }
        Command::Url {
            path,
            module,
            version,
        } => {
            let url = directory_url(&path, &module, &link_version(&version, &module))?;
            println!("{}", url);
            Ok(())
        }
        Command::Annotate { file } => annotate(&config, file.as_deref()).await,
        Command::Index {
            action: IndexAction::Add { manifest },
        } => index_add(&config, &manifest),
    }
}

fn open_source(config: &Config) -> anyhow::Result<Arc<dyn DataSource>> {
    let ds: Arc<dyn DataSource> = match config.source {
        SourceKind::Proxy => Arc::new(ProxyDataSource::new(ProxyClient::new(
            &config.proxy.url,
            config.proxy.timeout(),
        )?)),
        SourceKind::Index => Arc::new(open_index(config)?),
    };
    Ok(ds)
}

fn open_index(config: &Config) -> anyhow::Result<IndexDataSource> {
    let db_path = config.index.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    IndexDataSource::new(&db_path)
        .with_context(|| format!("failed to open index at {}", db_path.display()))
}

async fn with_deadline<T, E, F>(timeout: Duration, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(Error::Timeout(timeout).into()),
    }
}

async fn directory(
    ds: &dyn DataSource,
    path: &str,
    module: &str,
    version: &str,
    include_self: bool,
) -> anyhow::Result<()> {
    let mi = ds.get_module_info(module, version).await?;
    let scoped = resolve_licenses(ds, path, &mi.module_path, &mi.version).await;
    let licenses: Vec<LicenseMetadata> = match scoped {
        Ok(licenses) => licenses.into_iter().map(|l| l.metadata).collect(),
        Err(e) if e.is_not_found() => {
            warn!("{}", e);
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let latest_requested = version == LATEST_VERSION;
    match fetch_directory_details(ds, path, &mi, &licenses, include_self, latest_requested).await {
        Ok(dir) => print_json(&dir),
        Err(e) if e.is_unsupported() => {
            eprintln!("Directory listings are not available from this data source: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn annotate(config: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let body = match file {
        Some(file) => tokio::fs::read(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?,
        None => {
            let mut body = Vec::new();
            tokio::io::stdin().read_to_end(&mut body).await?;
            body
        }
    };

    let ds = open_source(config)?;
    let annotator = LatestAnnotator::new(Arc::new(SourceLatest::new(ds)));
    let mut stdout = tokio::io::stdout();
    serve_page(
        || async { Ok(RenderedPage::new(body)) },
        &annotator,
        &mut stdout,
        config.request.timeout(),
    )
    .await?;
    Ok(())
}

fn index_add(config: &Config, manifest: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(manifest)
        .with_context(|| format!("failed to read {}", manifest.display()))?;
    let module: Module = serde_json::from_str(&content)
        .with_context(|| format!("invalid manifest {}", manifest.display()))?;

    let index = open_index(config)?;
    index.insert_module(&module)?;
    info!(
        "Indexed {}@{} from {}",
        module.info.module_path,
        module.info.version,
        manifest.display()
    );
    println!("{}@{}", module.info.module_path, module.info.version);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
