use clap::Parser;
use finledger::{
    config::{CliArgs, Command, Config},
    forms::FilterQuery,
    open_storage,
    report::{LedgerReport, Summary},
    web::{self, AppState},
};
use metrics_exporter_prometheus::PrometheusBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    config.logging.init();

    let storage = open_storage(&config.database)?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Summary { category, start_date, end_date } => {
            let filter = FilterQuery { category, start_date, end_date }.to_filter()?;
            let entries = storage.list_entries(&filter)?;
            let summary = Summary::from_entries(&entries)?;
            println!("{}", LedgerReport::new(&entries, &summary));
            Ok(())
        }
        Command::Serve => {
            let mut state = AppState::new(storage, &config.charts.plotly_url);
            match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => state = state.with_metrics(handle),
                Err(e) => tracing::warn!(error = %e, "Metrics exporter not installed"),
            }

            let addr = config.listen_addr()?;
            tracing::info!(%addr, "Ledger listening");

            axum::Server::bind(&addr)
                .serve(web::router(state).into_make_service())
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                    tracing::info!("Shutting down");
                })
                .await?;
            Ok(())
        }
    }
}
