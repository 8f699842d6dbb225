use anyhow::Result;
use digitserve::config::Settings;
use digitserve::server;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: ./digitserve [config file]";

fn get_args() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    args.get(1).cloned()
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config_file = get_args();
    let settings = Settings::load(config_file.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("starting with {settings:?}");

    // Load before binding so a bad model never serves a request
    let classifier = server::load_classifier(&settings)?;
    server::run(settings, classifier).await
}
