//! Command execution

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Instant;
use tracing::{info, warn};

use super::output::Output;
use super::{Cli, CliError, Commands, ForgeArgs, GenerateArgs, MintArgs, SeriesArg, SliceArgs};
use crate::client::{Client, SeriesClient};
use crate::generator::{AsyncGenerator, SlugStream};
use crate::metrics;
use crate::shutdown::SharedShutdown;

impl Commands {
    /// Run the command against the API configured in `cli`
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let client = Client::new(cli.client_config()?)?;

        match self {
            Commands::Ping => {
                let started = Instant::now();
                client.ping().await?;
                info!(
                    "Ping successful in {:.2} seconds",
                    started.elapsed().as_secs_f64()
                );
                Ok(())
            }
            Commands::KeyInfo => {
                let key = client.key_info().await?;
                single_record(cli, &key)
            }
            Commands::Limits => {
                let limits = client.limits().await?;
                single_record(cli, &limits)
            }
            Commands::PatternInfo { pattern } | Commands::Validate { pattern } => {
                let info = client.forge()?.pattern_info(pattern).await?;
                single_record(cli, &info)
            }
            Commands::Forge(args) => forge(cli, &client, args).await,
            Commands::Mint(args) => mint(cli, &client, args, shutdown).await,
            Commands::Slice(args) => slice(cli, &client, args, shutdown).await,
            Commands::Stats(series) => {
                let items = series_client(&client, series)?.stats().await?;
                let mut out = Output::open(None, cli.output_format)?;
                out.records(&items)?;
                out.finish()?;
                Ok(())
            }
            Commands::SeriesInfo(series) => {
                let info = series_client(&client, series)?.info().await?;
                single_record(cli, &info)
            }
            Commands::SeriesList => {
                let list = client.series()?.list().await?;
                let mut out = Output::open(None, cli.output_format)?;
                if out.is_json() {
                    out.json(&list)?;
                } else {
                    for (slug, name) in &list {
                        out.line(format_args!("{slug}\t{name}"))?;
                    }
                }
                out.finish()?;
                Ok(())
            }
            Commands::SeriesCreate { name, pattern } => {
                let info = client.series()?.create(name, pattern).await?;
                info!(series = %info.slug, "Series created");
                single_record(cli, &info)
            }
            Commands::SeriesUpdate {
                name,
                pattern,
                series,
            } => {
                let info = series_client(&client, series)?
                    .update(name, pattern)
                    .await?;
                info!(series = %info.slug, "Series updated");
                single_record(cli, &info)
            }
            Commands::SeriesDelete(series) => {
                series_client(&client, series)?.delete().await?;
                info!(series = ?series.series, "Series deleted");
                Ok(())
            }
            Commands::Reset(series) => {
                warn!(series = ?series.series, "Resetting series counter");
                series_client(&client, series)?.reset().await?;
                info!("Series counter reset");
                Ok(())
            }
            Commands::DictionaryInfo => {
                let dictionaries = client.forge()?.dictionary_info().await?;
                let mut out = Output::open(None, cli.output_format)?;
                out.records(&dictionaries)?;
                out.finish()?;
                Ok(())
            }
            Commands::DictionaryTags {
                kind,
                limit,
                offset,
            } => {
                let page = client
                    .forge()?
                    .dictionary_tags_page(kind, *limit, *offset)
                    .await?;
                let mut out = Output::open(None, cli.output_format)?;
                if out.is_json() {
                    out.json(&page)?;
                } else {
                    out.records(&page.data)?;
                    out.line(format_args!(
                        "Showing {}-{} of {}{}",
                        page.offset,
                        u64::from(page.offset) + page.data.len() as u64,
                        page.total,
                        if page.has_more { " (more available)" } else { "" }
                    ))?;
                }
                out.finish()?;
                Ok(())
            }
        }
    }
}

fn single_record<T>(cli: &Cli, record: &T) -> Result<(), CliError>
where
    T: super::TextRecord + serde::Serialize,
{
    let mut out = Output::open(None, cli.output_format)?;
    out.record(record)?;
    out.finish()?;
    Ok(())
}

fn series_client(client: &Client, series: &SeriesArg) -> Result<SeriesClient, CliError> {
    let scoped = client.series()?;
    Ok(match &series.series {
        Some(slug) => scoped.named(slug.as_str()),
        None => scoped,
    })
}

fn random_seed() -> String {
    format!("{:032x}", rand::random::<u128>())
}

async fn forge(cli: &Cli, client: &Client, args: &ForgeArgs) -> Result<(), CliError> {
    if args.count == 0 {
        return Err(CliError::InvalidArgument(
            "count must be at least 1".to_string(),
        ));
    }
    let seed = args.seed.clone().unwrap_or_else(random_seed);
    info!(pattern = %args.pattern, seed = %seed, count = args.count, "Forging identifiers");

    let ids = client
        .forge()?
        .forge(&args.pattern, Some(&seed), args.sequence, args.count)
        .await?;
    metrics::record_identifiers(crate::transport::Endpoint::Forge, ids.len() as u64);

    let mut out = Output::open(args.output.as_deref(), cli.output_format)?;
    out.identifiers(&ids)?;
    out.finish()?;
    Ok(())
}

async fn mint(
    cli: &Cli,
    client: &Client,
    args: &MintArgs,
    shutdown: SharedShutdown,
) -> Result<(), CliError> {
    let generator = series_client(client, &args.generate.series)?.mint();
    info!(count = args.count, "Minting identifiers");
    generate(cli, generator, args.count, &args.generate, shutdown).await
}

async fn slice(
    cli: &Cli,
    client: &Client,
    args: &SliceArgs,
    shutdown: SharedShutdown,
) -> Result<(), CliError> {
    let generator = series_client(client, &args.generate.series)?
        .slice()
        .starting_from(args.sequence);
    info!(
        sequence = args.sequence,
        count = args.count,
        "Previewing identifiers"
    );
    generate(cli, generator, args.count, &args.generate, shutdown).await
}

async fn generate(
    cli: &Cli,
    generator: AsyncGenerator,
    count: u64,
    args: &GenerateArgs,
    shutdown: SharedShutdown,
) -> Result<(), CliError> {
    if count == 0 {
        return Err(CliError::InvalidArgument(
            "count must be at least 1".to_string(),
        ));
    }
    let endpoint = generator.config().endpoint();
    let mut out = Output::open(args.output.as_deref(), cli.output_format)?;

    if count == 1 {
        let ids = generator.generate(1).await?;
        metrics::record_identifiers(endpoint, ids.len() as u64);
        out.identifiers(&ids)?;
        out.finish()?;
        return Ok(());
    }

    let stream = generator
        .with_limit(count)
        .with_batch_size(args.batch_size)
        .stream();
    let progress = args.progress.then(|| create_progress_bar(count));
    let result = drain(stream, &mut out, progress.as_ref(), &shutdown).await;
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    let produced = match result {
        Ok(produced) => produced,
        Err(err) => {
            let _ = out.finish();
            return Err(err);
        }
    };
    metrics::record_identifiers(endpoint, produced);
    out.finish()?;

    if produced < count && !shutdown.is_shutdown_requested() {
        warn!(
            requested = count,
            produced = produced,
            "Series ran out of identifiers"
        );
    }
    Ok(())
}

/// Pull identifiers until the stream ends, fails or shutdown is requested
///
/// Text output is written as identifiers arrive; JSON output is collected
/// and written as one array at the end. Identifiers received before a
/// failure are written in both formats, since a mint may already have
/// consumed them.
async fn drain<W: Write>(
    mut stream: SlugStream,
    out: &mut Output<W>,
    progress: Option<&ProgressBar>,
    shutdown: &SharedShutdown,
) -> Result<u64, CliError> {
    let mut collected = Vec::new();
    let mut produced = 0u64;
    let mut failure = None;

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.wait_for_shutdown() => None,
            item = stream.next() => item,
        };
        let id = match next {
            Some(Ok(id)) => id,
            Some(Err(err)) => {
                failure = Some(err);
                break;
            }
            None => break,
        };

        produced += 1;
        if out.is_json() {
            collected.push(id);
        } else {
            out.line(&id)?;
        }
        if let Some(bar) = progress {
            bar.inc(1);
        }
    }

    if shutdown.is_shutdown_requested() {
        warn!(produced = produced, "Interrupted, stopped generating");
    }
    if out.is_json() {
        out.json(&collected)?;
    }
    match failure {
        Some(err) => {
            warn!(produced = produced, "Generation failed part-way");
            Err(err.into())
        }
        None => Ok(produced),
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message("Generating");
    pb
}
