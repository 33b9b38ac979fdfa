mod app;
mod io;
mod model;

use anyhow::Context;
use app::ViewerApp;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "thermal_inspect=info".into()),
        )
        .init();

    let runtime = tokio::runtime::Runtime::new().context("start async runtime")?;
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Thermal Inspect Viewer",
        options,
        Box::new(move |_cc| Box::new(ViewerApp::new(runtime))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
