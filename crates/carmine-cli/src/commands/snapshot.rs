//! The `snapshot` command: cpanfile in, cpanfile.snapshot out.

use anyhow::Context as _;
use carmine_downloader::Downloader;
use carmine_extractor::MetaExtractor;
use carmine_index::{HistoricalIndex, PrimaryIndex, DEFAULT_API_URL};
use carmine_resolver::Resolver;
use clap::Args;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

#[derive(Args, Clone, Debug)]
pub struct SnapshotArgs {
    /// Input cpanfile path.
    #[arg(short = 'f', long, default_value = "./cpanfile")]
    cpanfile: PathBuf,

    /// Output snapshot path.
    #[arg(short, long, default_value = "./cpanfile.snapshot")]
    snapshot: PathBuf,

    /// Parallel download workers.
    #[arg(short, long, default_value_t = 5)]
    workers: usize,

    /// Primary mirror URL.
    #[arg(short, long, default_value = "https://cpan.metacpan.org")]
    mirror: String,

    /// Historical query API URL.
    #[arg(long, default_value = DEFAULT_API_URL)]
    historical_api: String,

    /// Directory for historical tarball downloads.
    #[arg(long, default_value = "./historical-modules")]
    historical_dir: PathBuf,

    /// Cache directory; defaults to ~/.carmine/cache.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Run configure scripts inside this container image.
    #[arg(long)]
    container_image: Option<String>,
}

pub async fn run(args: SnapshotArgs) -> anyhow::Result<()> {
    debug!(path = %args.cpanfile.display(), "parsing cpanfile");
    let cpanfile = carmine_cpanfile::load(&args.cpanfile).context("parsing cpanfile")?;
    for (phase, reqs) in &cpanfile.requirements {
        debug!(phase = %phase, count = reqs.len(), "manifest requirements");
    }

    let requirements = cpanfile.all_requirements();
    anyhow::ensure!(
        !requirements.is_empty(),
        "no requirements found in {}",
        args.cpanfile.display()
    );

    let cache_dir = args.cache_dir.clone().unwrap_or_else(default_cache_dir);

    info!(mirror = %args.mirror, "loading primary index");
    let mut primary = PrimaryIndex::new(&args.mirror, &cache_dir);
    primary.load().await.context("loading primary index")?;

    let api_url = Url::parse(&args.historical_api).context("parsing historical API URL")?;
    let historical = HistoricalIndex::with_api_url(api_url, &args.historical_dir);
    historical
        .ensure_dir()
        .await
        .context("creating historical downloads directory")?;

    let downloader = Downloader::new(args.workers, &cache_dir);
    let extractor = match &args.container_image {
        Some(image) => MetaExtractor::with_container(image),
        None => MetaExtractor::new(),
    };

    info!("resolving dependencies");
    let mut resolver = Resolver::new(primary, historical, downloader, extractor);
    let dists = resolver
        .resolve(&requirements)
        .await
        .context("resolving dependencies")?;

    let unique: HashSet<&str> = dists.iter().map(|d| d.pathname.as_str()).collect();
    info!(distributions = unique.len(), "resolution complete");

    let mut file = std::fs::File::create(&args.snapshot)
        .with_context(|| format!("creating {}", args.snapshot.display()))?;
    carmine_snapshot::emit(&mut file, &dists)
        .with_context(|| format!("writing {}", args.snapshot.display()))?;

    println!(
        "Generated {} with {} distributions",
        args.snapshot.display(),
        unique.len()
    );
    Ok(())
}

/// Default cache directory under the user's home.
fn default_cache_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".carmine/cache"),
        |d| d.home_dir().join(".carmine").join("cache"),
    )
}
