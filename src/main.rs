use anyhow::Result;
use chrono::Local;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use whcscraper::{fetch, pipeline, process::OUTPUT_DIR};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,whcscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) fixed inputs ─────────────────────────────────────────────
    let client = fetch::build_client()?;
    let url = fetch::whc_list_url()?;
    let out_dir = Path::new(OUTPUT_DIR);
    let today = Local::now().date_naive();

    // ─── 3) fetch → parse → write ────────────────────────────────────
    match pipeline::snapshot(&client, &url, out_dir, today).await {
        Ok(path) => {
            info!("all done: {}", path.display());
            Ok(())
        }
        Err(err) => {
            error!("snapshot failed: {:#}", err);
            Err(err)
        }
    }
}
