#![allow(dead_code)]

//! Shared setup: run the real gateway on a free port with WhatsApp and Gemini
//! pointed at mock servers.

use lib::config::Config;
use lib::gateway;
use lopdf::{dictionary, Document, Object};
use std::io::Write;
use std::time::Duration;
use wiremock::MockServer;

pub const PHONE_ID: &str = "PHONE_ID";
pub const ACCESS_TOKEN: &str = "wa-token";
pub const VERIFY_TOKEN: &str = "verify-me";
pub const GEMINI_KEY: &str = "gemini-key";
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

pub fn test_config(port: u16, whatsapp: &MockServer, gemini: &MockServer) -> Config {
    let mut config = Config::default();
    config.server.port = port;
    config.server.bind = "127.0.0.1".to_string();
    config.whatsapp.api_url = whatsapp.uri();
    config.whatsapp.phone_number_id = Some(PHONE_ID.to_string());
    config.whatsapp.access_token = Some(ACCESS_TOKEN.to_string());
    config.whatsapp.verify_token = Some(VERIFY_TOKEN.to_string());
    config.gemini.base_url = gemini.uri();
    config.gemini.api_key = Some(GEMINI_KEY.to_string());
    config.gemini.model = "gemini-1.5-flash".to_string();
    config
}

/// Start the gateway and wait until GET / answers. Returns the base URL.
/// The server task is left running when the test ends.
pub async fn spawn_gateway(whatsapp: &MockServer, gemini: &MockServer) -> String {
    let port = free_port();
    let config = test_config(port, whatsapp, gemini);
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(format!("{}/", base)).send().await {
            if resp.status().is_success() {
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gateway on port {} did not become ready within 5s", port);
}

pub fn webhook_body(message: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "phone_number_id": PHONE_ID },
                    "messages": [message]
                }
            }]
        }]
    })
}

/// A PDF with `pages` empty pages.
pub fn pdf_with_pages(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id })
                .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save pdf");
    buf
}

/// A deflated zip archive holding `entries` in order.
pub fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, contents) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(contents.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}
