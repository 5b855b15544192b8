#![allow(dead_code)]

use invoicing_service::config::{InvoicingConfig, StorageBackend, StorageConfig};
use invoicing_service::startup::Application;
use serde_json::{json, Value};
use service_core::config::Config;
use tempfile::TempDir;

pub struct TestApp {
    pub http_address: String,
    pub http_port: u16,
    pub client: reqwest::Client,
    pub data_dir: TempDir,
}

impl TestApp {
    /// Spawn the service on a random port over a fresh file store.
    pub async fn spawn() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data dir");

        let config = InvoicingConfig {
            common: Config {
                port: 0, // Random port
                ..Config::default()
            },
            storage: StorageConfig {
                backend: StorageBackend::File,
                database_file: data_dir
                    .path()
                    .join("invoices.jsonl")
                    .to_string_lossy()
                    .into_owned(),
                id_file: data_dir
                    .path()
                    .join("invoices.id")
                    .to_string_lossy()
                    .into_owned(),
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let http_port = app.port();
        let http_address = format!("http://127.0.0.1:{}", http_port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            http_address,
            http_port,
            client: reqwest::Client::new(),
            data_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.http_address, path)
    }

    /// POST `invoice` and return the saved invoice body.
    pub async fn save_invoice(&self, invoice: &Value) -> Value {
        let response = self
            .client
            .post(self.url("/invoices"))
            .json(invoice)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), 200, "save should succeed");
        response.json().await.expect("Failed to parse JSON")
    }
}

pub fn invoice_json(identifier: &str, buyer: &str, seller: &str, issued_date: &str) -> Value {
    json!({
        "identifier": identifier,
        "issuedDate": issued_date,
        "buyer": buyer,
        "seller": seller,
        "entries": [
            { "description": "Consulting", "price": "1500.00", "vat": "REGULAR" },
            { "description": "Travel", "price": 230.5, "vat": "REDUCED8" }
        ]
    })
}
