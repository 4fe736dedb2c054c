//! Shared fakes for the integration tests: a recording payment gateway, a
//! file fetcher and a service wired to a temporary SQLite file.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use eaglecore::payment::paystack::{
    Authorization, GatewayError, GatewayStatus, InitializeRequest, PaymentGateway, Verification,
};
use eaglecore::registration::{Event, Handled, RegistrationService, SessionStore, Step};
use eaglecore::storage::directory::{self, Payment, Provider};
use eaglecore::{CatalogueStore, Directory, FileFetcher, PlanTier};

pub struct RecordingGateway {
    pub initialized: Mutex<Vec<InitializeRequest>>,
    pub verify_calls: AtomicUsize,
    pub fail_initialize: AtomicBool,
    pub verify_status: Mutex<GatewayStatus>,
    /// When set, `initialize` drops the payments table of this database so
    /// the payment record that follows cannot be written
    pub break_payments: Mutex<Option<Directory>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            initialized: Mutex::new(Vec::new()),
            verify_calls: AtomicUsize::new(0),
            fail_initialize: AtomicBool::new(false),
            verify_status: Mutex::new(GatewayStatus::Success),
            break_payments: Mutex::new(None),
        })
    }

    pub fn initialize_count(&self) -> usize {
        self.initialized.lock().unwrap().len()
    }

    pub fn verify_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn initialize(&self, request: &InitializeRequest) -> Result<Authorization, GatewayError> {
        self.initialized.lock().unwrap().push(request.clone());
        let broken = self.break_payments.lock().unwrap().clone();
        if let Some(directory) = broken {
            directory
                .run(|conn| Ok(conn.execute_batch("ALTER TABLE payments RENAME TO payments_lost")?))
                .await
                .unwrap();
        }
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected("Invalid key".to_string()));
        }
        Ok(Authorization {
            authorization_url: format!("https://checkout.example.com/{}", request.reference),
            access_code: Some("code".to_string()),
            reference: request.reference.clone(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let status = *self.verify_status.lock().unwrap();
        Ok(Verification {
            status,
            raw: serde_json::json!({"reference": reference}),
        })
    }
}

pub struct FakeFiles {
    pub fail: bool,
}

#[async_trait]
impl FileFetcher for FakeFiles {
    async fn fetch(&self, file_id: &str) -> anyhow::Result<Vec<u8>> {
        if self.fail {
            anyhow::bail!("download of {file_id} failed");
        }
        Ok(format!("%PDF-1.4 {file_id}").into_bytes())
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub directory: Directory,
    pub gateway: Arc<RecordingGateway>,
    pub service: RegistrationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_files(FakeFiles { fail: false })
    }

    pub fn with_files(files: FakeFiles) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let directory = Directory::open(dir.path().join("eagles.sqlite").to_str().unwrap()).unwrap();
        let gateway = RecordingGateway::new();
        let catalogues = CatalogueStore::new(dir.path().join("media").to_str().unwrap());
        let service = RegistrationService::new(
            SessionStore::new(std::time::Duration::from_secs(600)),
            directory.clone(),
            gateway.clone(),
            Arc::new(catalogues),
            Arc::new(files),
        )
        .with_currency("NGN");

        Self {
            dir,
            directory,
            gateway,
            service,
        }
    }

    pub async fn send(&self, user_id: i64, event: Event) -> Handled {
        self.service.handle(user_id, event).await.unwrap()
    }

    pub async fn send_all(&self, user_id: i64, events: Vec<Event>) -> Vec<Handled> {
        let mut handled = Vec::new();
        for event in events {
            handled.push(self.send(user_id, event).await);
        }
        handled
    }

    pub async fn provider(&self, user_id: i64) -> Option<Provider> {
        self.directory
            .run(move |conn| Ok(directory::get_provider_by_user(conn, user_id)?))
            .await
            .unwrap()
    }

    pub async fn payments(&self, provider_id: i64) -> Vec<Payment> {
        self.directory
            .run(move |conn| Ok(directory::payments_for_provider(conn, provider_id)?))
            .await
            .unwrap()
    }

    /// Makes every provider insert fail until `allow_providers`
    pub async fn block_providers(&self) {
        self.directory
            .run(|conn| {
                Ok(conn.execute_batch(
                    "CREATE TRIGGER block_providers BEFORE INSERT ON providers
                     BEGIN SELECT RAISE(ABORT, 'providers are blocked'); END;",
                )?)
            })
            .await
            .unwrap();
    }

    pub async fn allow_providers(&self) {
        self.directory
            .run(|conn| Ok(conn.execute_batch("DROP TRIGGER block_providers")?))
            .await
            .unwrap();
    }

    pub async fn count(&self, table: &'static str) -> i64 {
        self.directory
            .run(move |conn| Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?))
            .await
            .unwrap()
    }
}

pub fn text(s: &str) -> Event {
    Event::Text(s.to_string())
}

pub fn pdf(name: &str) -> Event {
    Event::Document {
        file_id: format!("file-{name}"),
        file_name: name.to_string(),
    }
}

/// Every event of a complete registration up to (not including) Confirm
pub fn answers(plan: PlanTier) -> Vec<Event> {
    let mut events = vec![
        Event::Start,
        text("Lash by Sarah"),
        text("Professional lash technician with 3 years experience"),
        text(" Lash, beauty ,, makeup"),
        text("08012345678"),
        text("lashbysarah"),
        Event::Skip(Step::CollectInstagram),
        Event::Skip(Step::CollectCatalogue),
        Event::SelectPlan(plan),
    ];
    if plan.is_top_tier() {
        events.push(text("Daniel Hall"));
    }
    events.push(text("sarah@example.com"));
    events
}
