use gems_data::configuration::get_configuration;
use gems_data::startup::Application;
use gems_data::utils::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("gems_data".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let configuration = get_configuration()?;
    let application = Application::build(configuration)?;
    let summary = application.run().await?;

    tracing::info!(
        rows = summary.rows,
        files = summary.files.len(),
        "Finished collecting GEMS data for {}",
        summary.start
    );
    Ok(())
}
