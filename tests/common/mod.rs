//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use employee_api::config::{ServiceConfig, StoreBackend};
use employee_api::http::HttpServer;
use employee_api::lifecycle::Shutdown;
use employee_api::store::{
    Employee, EmployeeChanges, EmployeeStore, MemoryStore, NewEmployee, StoreError, StoreResult,
};
use tokio::net::TcpListener;

/// A running API instance on an ephemeral port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.store.backend = StoreBackend::Memory;
    config
}

/// Start the API over a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(MemoryStore::default())).await
}

/// Start the API over `store`.
pub async fn spawn_app_with(store: Arc<dyn EmployeeStore>) -> TestApp {
    employee_api::observability::logging::init_test_logging();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(test_config(), store);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    TestApp { addr, client, shutdown }
}

/// Store whose every call fails with the given error.
#[allow(dead_code)]
pub struct FailingStore(pub StoreError);

#[async_trait]
impl EmployeeStore for FailingStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Err(self.0.clone())
    }

    async fn insert_employee(&self, _: NewEmployee) -> StoreResult<Vec<Employee>> {
        Err(self.0.clone())
    }

    async fn update_employee(&self, _: &str, _: EmployeeChanges) -> StoreResult<Vec<Employee>> {
        Err(self.0.clone())
    }

    async fn delete_employee(&self, _: &str) -> StoreResult<Vec<Employee>> {
        Err(self.0.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(self.0.clone())
    }
}

/// Store that accepts every write but returns no rows, and panics on list.
#[allow(dead_code)]
pub struct SilentStore;

#[async_trait]
impl EmployeeStore for SilentStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        panic!("list is not supported by SilentStore");
    }

    async fn insert_employee(&self, _: NewEmployee) -> StoreResult<Vec<Employee>> {
        Ok(Vec::new())
    }

    async fn update_employee(&self, _: &str, _: EmployeeChanges) -> StoreResult<Vec<Employee>> {
        Ok(Vec::new())
    }

    async fn delete_employee(&self, _: &str) -> StoreResult<Vec<Employee>> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
