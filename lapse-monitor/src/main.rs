use lapse_monitor::application::Application;
use lapse_shared::{
    settings::get_settings,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("lapse-monitor".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let settings = get_settings()?;
    let application = Application::build(&settings.monitor)?;

    application.run_until_stopped().await;

    Ok(())
}
