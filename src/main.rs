//! COVID tracker - daily COVID-19 counts per country
//!
//! Loads today's measurements from the local snapshot cache, or downloads
//! them country by country with a progress gauge, then prints the countries
//! with the most confirmed cases.

use std::io::{self, Stdout};
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use ratatui::{backend::CrosstermBackend, Terminal, TerminalOptions, Viewport};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use covid_tracker::cache::SnapshotStore;
use covid_tracker::cli::{Cli, StartupConfig};
use covid_tracker::data::{
    ApiCountryProvider, CountryProvider, HttpTransport, ReqwestTransport, SeriesClient,
    StaticCountries,
};
use covid_tracker::progress::LoadEvent;
use covid_tracker::ui::summary_table;
use covid_tracker::{stats, ui, LoadError, LoadHandle, LoadReport, MeasurementLoader};

type InlineTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Sets up logging to stderr, quieter while the gauge is on screen
fn init_tracing(show_progress: bool) {
    let default_level = if show_progress { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("covid_tracker={default_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Creates a terminal that draws `height` lines below the cursor
fn inline_terminal(height: u16) -> io::Result<InlineTerminal> {
    Terminal::with_options(
        CrosstermBackend::new(io::stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(height),
        },
    )
}

/// Prints the days that have a complete set of snapshots
fn print_status(store: &SnapshotStore) -> io::Result<()> {
    let dates = store.snapshot_dates()?;
    if dates.is_empty() {
        println!("No cached snapshots in {}", store.cache_dir().display());
        return Ok(());
    }

    let today = Local::now().date_naive();
    println!("Cached snapshots in {}:", store.cache_dir().display());
    for date in dates {
        let marker = if date == today { " (fresh)" } else { "" };
        println!("  {date}{marker}");
    }
    Ok(())
}

/// Drives the background load, drawing progress and handling Ctrl-C
async fn run_load(
    mut handle: LoadHandle,
    show_progress: bool,
) -> Result<LoadReport, Box<dyn std::error::Error>> {
    let mut gauge: Option<InlineTerminal> = None;
    let cancel = handle.cancel_flag();

    loop {
        tokio::select! {
            event = handle.events.recv() => match event {
                Some(LoadEvent::Progress(progress)) if show_progress => {
                    if gauge.is_none() {
                        gauge = Some(inline_terminal(3)?);
                    }
                    if let Some(terminal) = gauge.as_mut() {
                        terminal.draw(|frame| {
                            let area = frame.area();
                            ui::render_progress(frame, area, &progress);
                        })?;
                    }
                }
                Some(LoadEvent::Progress(_)) | Some(LoadEvent::Hidden) => {}
                Some(LoadEvent::Finished(_)) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping after the current country");
                cancel.cancel();
            }
        }
    }

    if gauge.is_some() {
        println!();
    }

    Ok(handle.join().await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };

    init_tracing(config.show_progress);

    let store = SnapshotStore::with_dir(&config.cache_dir);
    if config.status_only {
        print_status(&store)?;
        return Ok(());
    }

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
    let countries: Arc<dyn CountryProvider> = if config.countries.is_empty() {
        Arc::new(ApiCountryProvider::with_base_url(
            Arc::clone(&transport),
            config.api_url.clone(),
        ))
    } else {
        Arc::new(StaticCountries::from_slugs(config.countries.clone()))
    };
    let series = SeriesClient::with_base_url(transport, config.api_url.clone());
    let loader = Arc::new(MeasurementLoader::new(countries, series, store));

    let handle = LoadHandle::spawn(Arc::clone(&loader));
    let report = match run_load(handle, config.show_progress).await {
        Ok(report) => report,
        Err(e) => {
            match e.downcast_ref::<LoadError>() {
                Some(LoadError::Cache(cache_err)) => {
                    eprintln!("Cached data could not be read: {cache_err}");
                    eprintln!("Remove or repair the snapshot files to download again.");
                }
                Some(LoadError::Cancelled { .. }) => {
                    eprintln!("{e}; nothing was cached");
                    std::process::exit(130);
                }
                _ => eprintln!("error: {e}"),
            }
            std::process::exit(1);
        }
    };

    info!(
        records = report.records,
        skipped = report.skipped.len(),
        "Load finished"
    );
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.slug, skipped.reason);
    }
    for failure in &report.cache_write_failures {
        eprintln!("not cached ({}): {}", failure.category, failure.reason);
    }

    let totals = stats::latest_totals(&loader.current());
    let top = &totals[..config.top.min(totals.len())];

    if config.show_progress {
        let mut terminal = inline_terminal(summary_table::height_for(top.len()))?;
        let title = format!("Top {} countries on {}", top.len(), report.date);
        terminal.draw(|frame| {
            let area = frame.area();
            ui::render_summary(frame, area, &title, top);
        })?;
        println!();
    } else {
        println!(
            "{} records per category from {:?} ({} of {} countries skipped)",
            report.records,
            report.source,
            report.skipped.len(),
            report.countries_total
        );
        for t in top {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                t.country,
                t.as_of.format("%Y-%m-%d"),
                t.confirmed,
                t.deaths,
                t.recovered
            );
        }
    }

    Ok(())
}
