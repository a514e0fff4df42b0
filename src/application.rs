use std::{net::TcpListener, sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{dev::Server, web, web::Data, App, HttpServer};
use anyhow::Context;
use lapse_db::{PgServerStore, ServerStore, MIGRATOR};
use lapse_shared::settings::{get_db_pool, Settings};
use tracing_actix_web::TracingLogger;

use crate::{
    daemon::{Daemon, DaemonClient},
    enforcer::ExpirationEnforcer,
    routes::{expirations, health_check, servers},
    suspension::SuspensionToggle,
};

pub struct Application {
    server: Server,
    port: u16,
    schedule: Option<(Arc<ExpirationEnforcer>, Duration)>,
}

impl Application {
    ///
    /// Build the panel against the configured Postgres database.
    ///
    /// Pending migrations are applied before the server starts listening.
    ///
    pub async fn build(settings: Settings) -> Result<Self, anyhow::Error> {
        let db_pool = get_db_pool(&settings.database)
            .await
            .context("Could not connect to database")?;

        MIGRATOR
            .run(&db_pool)
            .await
            .context("Failed to migrate the database")?;

        Self::build_with_store(settings, Arc::new(PgServerStore::new(db_pool))).await
    }

    ///
    /// Build the panel on top of an arbitrary [`ServerStore`].
    ///
    pub async fn build_with_store(
        settings: Settings,
        store: Arc<dyn ServerStore>,
    ) -> Result<Self, anyhow::Error> {
        let daemon: Arc<dyn Daemon> = Arc::new(
            DaemonClient::from_settings(&settings.daemon)
                .context("Failed to build daemon client")?,
        );

        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );

        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let toggle = Arc::new(SuspensionToggle::new(store.clone(), daemon.clone()));
        let enforcer = Arc::new(ExpirationEnforcer::new(store.clone(), toggle.clone()));

        let schedule = if settings.enforcer.enabled {
            Some((enforcer.clone(), settings.enforcer.interval()))
        } else {
            tracing::info!("Scheduled expiration checks are disabled");
            None
        };

        let server = run(listener, store, daemon, toggle, enforcer)?;

        Ok(Self {
            server,
            port,
            schedule,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    ///
    /// Serve requests until the server stops.
    ///
    /// The scheduled expiration checks run alongside and end with the server.
    ///
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        let schedule = self
            .schedule
            .map(|(enforcer, interval)| enforcer.spawn_schedule(interval));

        let result = self.server.await;

        if let Some(schedule) = schedule {
            schedule.abort();
        }

        result
    }
}

fn run(
    listener: TcpListener,
    store: Arc<dyn ServerStore>,
    daemon: Arc<dyn Daemon>,
    toggle: Arc<SuspensionToggle>,
    enforcer: Arc<ExpirationEnforcer>,
) -> Result<Server, std::io::Error> {
    let store: Data<dyn ServerStore> = Data::from(store);
    let daemon: Data<dyn Daemon> = Data::from(daemon);
    let toggle = Data::from(toggle);
    let enforcer = Data::from(enforcer);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(
                Cors::default()
                    .allow_any_header()
                    .allow_any_method()
                    .allow_any_origin(),
            )
            .app_data(store.clone())
            .app_data(daemon.clone())
            .app_data(toggle.clone())
            .app_data(enforcer.clone())
            .route("/health_check", web::get().to(health_check))
            .route("/servers", web::get().to(servers::list))
            .route("/servers/{id}", web::get().to(servers::get))
            .route(
                "/servers/{id}/expiration",
                web::put().to(servers::update_expiration),
            )
            .route(
                "/servers/{id}/suspension",
                web::post().to(servers::suspension),
            )
            .route(
                "/servers/{id}/resources",
                web::get().to(servers::resources),
            )
            .route(
                "/expirations/check",
                web::post().to(expirations::check),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
