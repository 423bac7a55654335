mod api;
mod app;
mod util;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the topic discovery backend.
    #[arg(long, default_value = "http://localhost:5000")]
    api_url: String,

    /// Interval between discovery status polls.
    #[arg(long, default_value_t = 2000)]
    poll_interval_ms: u64,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let poll_interval = Duration::from_millis(args.poll_interval_ms);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "topic-atlas",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::TopicAtlasApp::new(
                cc,
                args.api_url.clone(),
                poll_interval,
            )))
        }),
    )
}
