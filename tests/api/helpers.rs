use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fake::{faker::company::en::CompanyName, Fake};
use lapse::application::Application;
use lapse_db::{
    servers::models::{AllocationModel, ServerModel},
    MemoryServerStore, ServerStore,
};
use lapse_shared::{
    servers::ServerStatus,
    settings::get_settings,
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use uuid::Uuid;
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber)
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber)
    };
});

///
/// Servers the store is seeded with before a test runs.
///
pub enum BootstrapType {
    Default,
    /// One active server expiring in 30 days.
    ActiveServer,
    /// One suspended server whose expiration has passed.
    SuspendedServer,
    /// Two expired active servers, one expiring tomorrow and one without expiration.
    ExpiredServers,
}

///
/// How the mocked daemon answers.
///
pub enum DaemonBehaviour {
    Healthy,
    Failing,
}

pub struct TestApplication {
    pub address: String,
    pub port: u16,
    pub store: Arc<MemoryServerStore>,
    pub daemon_server: MockServer,
    test_servers: Vec<TestServer>,
}

impl TestApplication {
    pub fn test_server(&self) -> TestServer {
        self.test_servers.first().unwrap().clone()
    }

    pub fn test_servers(&self) -> Vec<TestServer> {
        self.test_servers.clone()
    }

    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::new()
    }

    pub async fn status_of(&self, server_id: Uuid) -> ServerStatus {
        self.store.status(server_id).await.unwrap().unwrap()
    }

    ///
    /// Amount of suspension requests the daemon received for `server_id`.
    ///
    pub async fn suspension_calls(&self, server_id: Uuid) -> usize {
        let expected_path = format!("/api/servers/{}/suspension", server_id);

        self.daemon_server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| {
                request.method.to_string() == "POST" && request.url.path() == expected_path
            })
            .count()
    }
}

pub async fn spawn_app(
    bootstrap_type: BootstrapType,
    daemon_behaviour: DaemonBehaviour,
) -> TestApplication {
    Lazy::force(&TRACING);

    let daemon_server = MockServer::start().await;
    mount_daemon(&daemon_server, daemon_behaviour).await;

    let settings = {
        let mut settings = get_settings().expect("Failed to read settings");

        settings.application.port = 0;
        settings.daemon.base_url = daemon_server.uri();
        settings.enforcer.enabled = false;

        settings
    };

    let store = Arc::new(MemoryServerStore::new());

    let application = Application::build_with_store(settings, store.clone())
        .await
        .expect("Failed to build application");

    let application_port = application.port();

    let _ = tokio::spawn(application.run_until_stopped());

    let now = Utc::now();

    let test_servers = match bootstrap_type {
        BootstrapType::Default => vec![],
        BootstrapType::ActiveServer => vec![TestServer::generate(
            ServerStatus::Active,
            Some(now + Duration::days(30)),
        )],
        BootstrapType::SuspendedServer => vec![TestServer::generate(
            ServerStatus::Suspended,
            Some(now - Duration::days(3)),
        )],
        BootstrapType::ExpiredServers => vec![
            TestServer::generate(ServerStatus::Active, Some(now - Duration::days(1))),
            TestServer::generate(ServerStatus::Active, Some(now - Duration::hours(1))),
            TestServer::generate(ServerStatus::Active, Some(now + Duration::days(1))),
            TestServer::generate(ServerStatus::Active, None),
        ],
    };

    for test_server in &test_servers {
        test_server.store(&store);
    }

    TestApplication {
        address: format!("http://localhost:{}", application_port),
        port: application_port,
        store,
        daemon_server,
        test_servers,
    }
}

async fn mount_daemon(daemon_server: &MockServer, behaviour: DaemonBehaviour) {
    match behaviour {
        DaemonBehaviour::Healthy => {
            Mock::given(method("POST"))
                .and(path_regex(r"^/api/servers/[0-9a-f-]+/suspension$"))
                .respond_with(ResponseTemplate::new(204))
                .mount(daemon_server)
                .await;

            Mock::given(method("GET"))
                .and(path_regex(r"^/api/servers/[0-9a-f-]+$"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "state": "running",
                    "is_suspended": false,
                    "utilization": {
                        "memory_bytes": 268435456u64,
                        "disk_bytes": 1073741824u64,
                        "cpu_absolute": 37.5,
                        "uptime": 3600,
                    },
                })))
                .mount(daemon_server)
                .await;
        }
        DaemonBehaviour::Failing => {
            Mock::given(path_regex(r"^/api/servers/"))
                .respond_with(ResponseTemplate::new(500).set_body_string("node unreachable"))
                .mount(daemon_server)
                .await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestServer {
    pub id: Uuid,
    pub name: String,
    pub status: ServerStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TestServer {
    pub fn generate(status: ServerStatus, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: CompanyName().fake(),
            status,
            expires_at,
        }
    }

    pub fn store(&self, store: &MemoryServerStore) {
        let now = Utc::now();

        store.insert(
            ServerModel {
                id: self.id,
                name: self.name.clone(),
                owner_id: Uuid::new_v4(),
                status: self.status,
                expires_at: self.expires_at,
                cpu_limit: 200,
                memory_limit: 1024,
                disk_limit: 0,
                updated_at: now,
                created_at: now,
            },
            vec![AllocationModel {
                id: Uuid::new_v4(),
                server_id: self.id,
                ip: "10.0.0.4".to_string(),
                port: 25565,
                alias: Some("play.example.com".to_string()),
                is_default: true,
            }],
        );
    }
}
