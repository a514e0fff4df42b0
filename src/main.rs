use lapse::application::Application;

use lapse_shared::{
    settings::get_settings,
    telemetry::{get_subscriber, init_subscriber},
};

#[cfg(not(tarpaulin))]
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("lapse".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let settings = get_settings()?;
    let application = Application::build(settings).await?;

    tracing::info!(port = application.port(), "Panel is listening");

    application.run_until_stopped().await?;

    Ok(())
}

#[cfg(tarpaulin)]
fn main() {}
