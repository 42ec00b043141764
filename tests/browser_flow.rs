//! End-to-end flows of the browser against an in-memory provider.

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use eth_block_browser::config::Config;
use eth_block_browser::core::{
    render_record, Browser, DataProvider, FetchStatus, MetricsCollector, Record,
};
use eth_block_browser::ui::{self, App};
use eth_block_browser::utils::error::ProviderError;

fn tx(block: u64, n: u64) -> Record {
    Record::from_json(json!({
        "hash": format!("0x{:0>56x}{:08x}", block, n),
        "blockNumber": format!("{:#x}", block),
        "from": "0xa7d9ddbe1f17865597fbd27ec712455208b6b76d",
        "to": "0xf02c1c8e6114b1dbe8937a39260b5b0a374432bb",
        "nonce": format!("{:#x}", n),
        "chainId": "0x1",
        "value": "0x0"
    }))
    .unwrap()
}

fn block(key: u64, count: u64) -> Vec<Record> {
    (0..count).map(|n| tx(key, n)).collect()
}

#[derive(Default)]
struct ScriptedProvider {
    latest: u64,
    blocks: HashMap<u64, Vec<Record>>,
    failures: HashMap<u64, ProviderError>,
    gates: Mutex<HashMap<u64, oneshot::Receiver<()>>>,
    latest_calls: AtomicUsize,
}

impl ScriptedProvider {
    fn with_block(mut self, key: u64, count: u64) -> Self {
        self.blocks.insert(key, block(key, count));
        self
    }

    fn with_failure(mut self, key: u64, error: ProviderError) -> Self {
        self.failures.insert(key, error);
        self
    }

    /// Holds the response for `key` until the returned sender fires.
    fn gate(&self, key: u64) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key, rx);
        tx
    }
}

#[async_trait]
impl DataProvider for ScriptedProvider {
    async fn current_key(&self) -> Result<u64, ProviderError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.latest)
    }

    async fn children_for_key(&self, key: u64) -> Result<Vec<Record>, ProviderError> {
        let gate = self.gates.lock().unwrap().remove(&key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(error) = self.failures.get(&key) {
            return Err(error.clone());
        }
        self.blocks
            .get(&key)
            .cloned()
            .ok_or(ProviderError::NotFound { key })
    }
}

fn browser_for(provider: &Arc<ScriptedProvider>) -> Browser {
    Browser::new(provider.clone(), MetricsCollector::default())
}

fn test_config() -> Config {
    Config {
        rpc_endpoint: Some("http://localhost:8545".into()),
        api_key: None,
        network: "eth-mainnet".into(),
        start_block: None,
        page_size: 10,
        detail_indent: 4,
        log_file: PathBuf::from("block-browser.log"),
        metrics_port: None,
    }
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

#[tokio::test]
async fn three_transactions_fill_grid_and_detail() {
    let provider = Arc::new(ScriptedProvider::default().with_block(100, 3));
    let mut browser = browser_for(&provider);

    browser.set_key(Some(100));
    assert!(browser.next_outcome().await);

    let controller = browser.controller();
    assert_eq!(controller.records(), block(100, 3).as_slice());
    assert_eq!(controller.selected_index(), Some(0));

    let detail = render_record(controller.selected(), 4);
    let expected = {
        let mut out = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(
            &mut out,
            serde_json::ser::PrettyFormatter::with_indent(b"    "),
        );
        serde::Serialize::serialize(block(100, 3)[0].raw(), &mut ser).unwrap();
        String::from_utf8(out).unwrap()
    };
    assert_eq!(detail, expected);
}

#[tokio::test]
async fn unmined_block_empties_the_view() {
    let provider = Arc::new(ScriptedProvider::default().with_block(100, 3));
    let mut browser = browser_for(&provider);

    browser.set_key(Some(100));
    browser.next_outcome().await;
    browser.set_key(Some(50_000_000));
    browser.next_outcome().await;

    let controller = browser.controller();
    assert!(controller.records().is_empty());
    assert_eq!(controller.selected(), None);
    assert_eq!(render_record(controller.selected(), 4), "");
    assert_eq!(
        controller.status(),
        &FetchStatus::Failed {
            key: Some(50_000_000),
            error: ProviderError::NotFound { key: 50_000_000 },
        }
    );
}

#[tokio::test]
async fn stale_fetch_never_overwrites_newer_block() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_block(10, 4)
            .with_block(20, 2),
    );
    let release_first = provider.gate(10);
    let mut browser = browser_for(&provider);

    browser.set_key(Some(10));
    browser.set_key(Some(20));

    assert!(browser.next_outcome().await);
    release_first.send(()).unwrap();
    assert!(!browser.next_outcome().await);

    let controller = browser.controller();
    assert_eq!(controller.key(), Some(20));
    assert_eq!(controller.records(), block(20, 2).as_slice());
}

#[tokio::test]
async fn selection_resets_to_first_row_on_new_block() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_block(100, 3)
            .with_block(101, 5),
    );
    let mut browser = browser_for(&provider);

    browser.set_key(Some(100));
    browser.next_outcome().await;
    let second = browser.controller().records()[1].clone();
    assert!(browser.select_record(&second));
    assert_eq!(browser.controller().selected(), Some(&second));

    browser.set_key(Some(101));
    browser.next_outcome().await;

    assert_eq!(browser.controller().records().len(), 5);
    assert_eq!(browser.controller().selected_index(), Some(0));
    assert_eq!(browser.controller().selected(), Some(&tx(101, 0)));
}

#[tokio::test]
async fn latest_block_is_requested_once_per_session() {
    let provider = Arc::new(ScriptedProvider {
        latest: 7,
        ..ScriptedProvider::default()
    }
    .with_block(7, 1));
    let mut browser = browser_for(&provider);

    browser.mount(None);
    assert!(browser.next_outcome().await);
    assert!(browser.next_outcome().await);
    browser.mount(None);

    assert_eq!(provider.latest_calls.load(Ordering::SeqCst), 1);
    assert_eq!(browser.controller().key(), Some(7));
    assert_eq!(browser.controller().records().len(), 1);
}

#[tokio::test]
async fn configured_start_block_skips_latest_lookup() {
    let provider = Arc::new(ScriptedProvider::default().with_block(3, 2));
    let mut browser = browser_for(&provider);

    browser.mount(Some(3));
    browser.next_outcome().await;

    assert_eq!(provider.latest_calls.load(Ordering::SeqCst), 0);
    assert_eq!(browser.controller().records().len(), 2);
}

#[tokio::test]
async fn failed_block_can_be_retried_by_entering_it_again() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_failure(9, ProviderError::Network("connection reset".into())),
    );
    let mut browser = browser_for(&provider);

    browser.set_key(Some(9));
    browser.next_outcome().await;
    assert!(matches!(
        browser.controller().status(),
        FetchStatus::Failed { error: ProviderError::Network(_), .. }
    ));

    browser.set_key(Some(9));
    assert_eq!(browser.controller().status(), &FetchStatus::Loading { key: 9 });
}

#[tokio::test]
async fn app_keys_drive_the_browser() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_block(100, 3)
            .with_block(20, 12),
    );
    let mut app = App::new(browser_for(&provider), &test_config());

    press(&mut app, KeyCode::Char('b'));
    type_text(&mut app, "100");
    press(&mut app, KeyCode::Enter);
    app.wait_for_fetch().await;
    assert_eq!(app.records().len(), 3);

    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);
    assert_eq!(app.browser().controller().selected_index(), Some(2));

    press(&mut app, KeyCode::Char('b'));
    for _ in 0..3 {
        press(&mut app, KeyCode::Backspace);
    }
    type_text(&mut app, "20");
    press(&mut app, KeyCode::Enter);
    app.wait_for_fetch().await;

    assert_eq!(app.grid().cursor(), 0);
    assert_eq!(app.browser().controller().selected_index(), Some(0));

    press(&mut app, KeyCode::PageDown);
    assert_eq!(app.grid().page(), 1);
    assert_eq!(app.browser().controller().selected_index(), Some(10));
}

#[tokio::test]
async fn garbage_block_input_clears_the_view() {
    let provider = Arc::new(ScriptedProvider::default().with_block(100, 3));
    let mut app = App::new(browser_for(&provider), &test_config());

    press(&mut app, KeyCode::Char('b'));
    type_text(&mut app, "100");
    press(&mut app, KeyCode::Enter);
    app.wait_for_fetch().await;

    press(&mut app, KeyCode::Char('b'));
    type_text(&mut app, "x");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.browser().controller().key(), None);
    assert!(app.records().is_empty());
    assert_eq!(app.status_line(), "Enter a block number");
}

#[tokio::test]
async fn screen_shows_grid_status_and_details() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_block(100, 3)
            .with_failure(5, ProviderError::Network("timed out".into())),
    );
    let mut app = App::new(browser_for(&provider), &test_config());
    app.mount(Some(100));
    app.wait_for_fetch().await;

    let mut terminal = Terminal::new(TestBackend::new(200, 50)).unwrap();
    terminal.draw(|f| ui::draw(f, &app)).unwrap();
    let screen: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect();

    assert!(screen.contains("Block Explorer"));
    assert!(screen.contains("Selected Block Number: 100"));
    assert!(screen.contains("3 transactions in block 100"));
    assert!(screen.contains("blockNumber"));
    assert!(screen.contains("Transaction Details"));
    assert!(screen.contains("\"nonce\": \"0x0\""));

    press(&mut app, KeyCode::Char('b'));
    for _ in 0..3 {
        press(&mut app, KeyCode::Backspace);
    }
    type_text(&mut app, "5");
    press(&mut app, KeyCode::Enter);
    app.wait_for_fetch().await;
    assert_eq!(app.status_line(), "Network error: timed out");
    assert!(app.records().is_empty());
}

#[tokio::test]
async fn search_hiding_first_record_selects_first_visible_row() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .with_block(100, 3)
            .with_block(200, 3),
    );
    let mut app = App::new(browser_for(&provider), &test_config());
    app.mount(Some(100));
    app.wait_for_fetch().await;

    let wanted = tx(200, 1);
    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, &format!("{:?}", wanted.hash));
    press(&mut app, KeyCode::Enter);
    assert!(app.rows().is_empty());
    assert_eq!(app.detail_text(), "");

    press(&mut app, KeyCode::Char('b'));
    for _ in 0..3 {
        press(&mut app, KeyCode::Backspace);
    }
    type_text(&mut app, "200");
    press(&mut app, KeyCode::Enter);
    app.wait_for_fetch().await;

    let rows = app.rows();
    assert_eq!(app.grid().cursor_record(&rows), Some(1));
    assert_eq!(app.browser().controller().selected(), Some(&wanted));
    assert!(app.detail_text().contains(&format!("{:?}", wanted.hash)));
}

#[tokio::test]
async fn search_hiding_every_record_clears_details() {
    let provider = Arc::new(ScriptedProvider::default().with_block(100, 3));
    let mut app = App::new(browser_for(&provider), &test_config());

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "no-such-text");
    press(&mut app, KeyCode::Enter);

    app.mount(Some(100));
    app.wait_for_fetch().await;

    assert_eq!(app.records().len(), 3);
    assert_eq!(app.browser().controller().selected(), None);
    assert_eq!(app.detail_text(), "");
}

#[tokio::test]
async fn grouped_view_opens_the_selected_record_group() {
    let provider = Arc::new(ScriptedProvider::default().with_block(100, 3));
    let mut app = App::new(browser_for(&provider), &test_config());
    press(&mut app, KeyCode::Char('g'));

    app.mount(Some(100));
    app.wait_for_fetch().await;

    let rows = app.rows();
    assert_eq!(app.grid().cursor_record(&rows), Some(0));
    assert_eq!(app.browser().controller().selected_index(), Some(0));
}
