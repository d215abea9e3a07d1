use anyhow::Context;
use log::{error, info, warn};
use ratequeue::{
    config::{Config, EventFormat},
    dispatcher::{DispatchError, Dispatcher},
    generator::RandomRequests,
    provider::{EventStream, ProcessedEvent},
};

fn print_event(event: &ProcessedEvent, format: EventFormat) {
    match format {
        EventFormat::Text => println!("{}", event),
        EventFormat::Json => match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(err) => error!("Error serializing event {:?}", err),
        },
    }
}

async fn print_events(mut events: EventStream, format: EventFormat) -> u64 {
    let mut printed = 0;
    while let Some(event) = events.recv().await {
        print_event(&event, format);
        printed += 1;
    }
    printed
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to read configuration")?;
    info!("Providers: {}", config.describe_providers());

    let (dispatcher, events) =
        Dispatcher::start(&config.providers).context("Failed to start providers")?;
    let printer = tokio::spawn(print_events(events, config.event_format));

    let requests = match config.seed {
        Some(seed) => RandomRequests::seeded(config.request_count, seed),
        None => RandomRequests::new(config.request_count),
    };
    let submitted = dispatcher.submit_all(requests);
    info!("Submitted {} requests", submitted);

    match dispatcher.drain(config.drain_timeout).await {
        Ok(()) => info!("All requests processed"),
        Err(DispatchError::DrainTimeout { outstanding }) => {
            warn!("Stopping with {} requests never processed", outstanding)
        }
        Err(err) => return Err(err.into()),
    }

    let reports = dispatcher.shutdown().await?;
    for report in reports.iter() {
        info!("{} processed {} requests", report.name, report.processed);
    }
    let printed = printer.await?;
    info!("Done, {} events", printed);
    Ok(())
}

#[tokio::main]
async fn main() {
    better_panic::install();
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}
