//! Integration tests for BoardBot
//!
//! These tests drive the public API end to end through a `Bot`.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use boardbot::{
    Bot, Category, CollaboratorError, Config, Locator, Outbound, OutboxReceiver, Renderer, SubmitOutcome, Transport,
    TransportError,
};
use tempfile::TempDir;

/// Transport that fails a fixed number of connects before coming up
struct FlakyTransport {
    live: AtomicBool,
    failures_left: AtomicU32,
    connects: AtomicU32,
}

impl FlakyTransport {
    fn new(failures: u32) -> Self {
        Self {
            live: AtomicBool::new(false),
            failures_left: AtomicU32::new(failures),
            connects: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    async fn connect(&self, _identity: &str) -> Result<(), TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(TransportError::Connect("refused".to_string()));
        }
        self.live.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn join(&self, _channel: &str) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Appends each attribute to the artifact file
#[derive(Default)]
struct AppendRenderer {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Renderer for AppendRenderer {
    async fn draw(&self, artifact: &Path, target: &Locator, attribute: &str) -> Result<(), CollaboratorError> {
        let mut content = tokio::fs::read_to_string(artifact).await?;
        content.push_str(&format!("[{} @ {}]", attribute, target));
        tokio::fs::write(artifact, content).await?;
        self.calls.lock().unwrap().push(attribute.to_string());
        Ok(())
    }
}

fn drain(rx: &mut OutboxReceiver) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn artifact_config(temp: &TempDir) -> Config {
    let mut config = Config::default();
    config.artifact.path = temp.path().join("map.webp");
    config.artifact.template = temp.path().join("cb2.webp");
    config.artifact.staging = temp.path().join("map_temp.webp");
    std::fs::write(&config.artifact.path, "map:").unwrap();
    std::fs::write(&config.artifact.template, "blank:").unwrap();
    config
}

// =============================================================================
// Rendezvous Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_rendezvous_completes_before_deadline() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let transport = Arc::new(FlakyTransport::new(0));
    let (bot, mut rx) = Bot::start(artifact_config(&temp), transport, Arc::new(AppendRenderer::default())).unwrap();

    let rendezvous = bot.rendezvous().clone();
    rendezvous.start_default("1", None).unwrap();
    assert!(matches!(
        rendezvous.submit("player1bot", "5").unwrap(),
        SubmitOutcome::Accepted { value: 5, completed: false }
    ));
    assert!(matches!(
        rendezvous.submit("Player2Bot", " 3 ").unwrap(),
        SubmitOutcome::Accepted { value: 3, completed: true }
    ));
    assert!(!rendezvous.is_active());

    // Deadline passing after completion announces nothing
    tokio::time::sleep(Duration::from_secs(120)).await;

    let texts: Vec<String> = drain(&mut rx).iter().map(|m| m.text().to_string()).collect();
    assert_eq!(
        texts,
        vec![
            "!go1 started. Waiting for numbers from player1bot, player2bot. Timeout: 60s",
            "number 5 received for !go1.",
            "number 3 received for !go1.",
            "go1 resulted in 5 + 3",
        ]
    );
    bot.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_rendezvous_times_out_and_slot_reopens() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let transport = Arc::new(FlakyTransport::new(0));
    let (bot, mut rx) = Bot::start(artifact_config(&temp), transport, Arc::new(AppendRenderer::default())).unwrap();

    let rendezvous = bot.rendezvous().clone();
    rendezvous.start_default("2", Some(Duration::from_secs(10))).unwrap();
    rendezvous.submit("player1bot", "4").unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;

    let last = drain(&mut rx).pop().unwrap();
    assert_eq!(last.text(), "!go2 timed out. Missing numbers from: player2bot");
    assert!(!rendezvous.is_active());

    // A new session can start straight away
    assert!(rendezvous.start_default("3", None).is_ok());
    bot.shutdown().await;
}

// =============================================================================
// Update Queue Tests
// =============================================================================

#[tokio::test]
async fn test_marks_then_refresh_apply_in_order() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = artifact_config(&temp);
    let artifact = config.artifact.path.clone();
    let transport = Arc::new(FlakyTransport::new(0));
    let renderer = Arc::new(AppendRenderer::default());
    let (bot, _rx) = Bot::start(config, transport, renderer.clone()).unwrap();

    bot.mark(Locator::new(745, 1136, 755, 1146), Category::Unmortgaged, "p1");
    bot.mark(Locator::new(10, 10, 20, 20), Category::Mortgaged, "p1");
    bot.refresh().await.unwrap();
    bot.mark(Locator::new(30, 30, 40, 40), Category::AuctionFolded, "p1");
    let metrics = bot.shutdown().await;

    assert_eq!(metrics.applied, 4);
    assert_eq!(metrics.failed, 0);
    assert_eq!(renderer.calls.lock().unwrap().len(), 3);
    // Only the draw queued after the refresh is on the fresh map
    let content = std::fs::read_to_string(&artifact).unwrap();
    assert!(content.starts_with("blank:["));
    assert!(content.contains("@ 30,30 40,40]"));
    assert!(!content.contains("745,1136"));
}

#[tokio::test]
async fn test_companion_pinged_only_while_live() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let transport = Arc::new(FlakyTransport::new(0));
    let (bot, mut rx) = Bot::start(artifact_config(&temp), transport.clone(), Arc::new(AppendRenderer::default())).unwrap();

    bot.mark(Locator::new(1, 1, 2, 2), Category::Unmortgaged, "p1");
    // Wait for the worker to consume the first task before going live
    while bot.updates().metrics().pending() > 0 {
        tokio::task::yield_now().await;
    }
    transport.live.store(true, Ordering::SeqCst);
    bot.mark(Locator::new(3, 3, 4, 4), Category::Unmortgaged, "p2");
    bot.shutdown().await;

    let direct: Vec<Outbound> = drain(&mut rx)
        .into_iter()
        .filter(|m| matches!(m, Outbound::Direct { .. }))
        .collect();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].text(), "!up");
}

// =============================================================================
// Reconnect Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_reconnect_backs_off_until_connected() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let transport = Arc::new(FlakyTransport::new(3));
    let (bot, _rx) = Bot::start(artifact_config(&temp), transport.clone(), Arc::new(AppendRenderer::default())).unwrap();

    let started = tokio::time::Instant::now();
    let sequence = bot.reconnect().on_disconnect().expect("sequence should start");
    // A second report while running is ignored
    assert!(bot.reconnect().on_disconnect().is_none());
    sequence.await.unwrap();

    assert!(transport.is_live());
    assert_eq!(transport.connects.load(Ordering::SeqCst), 4);
    // 60 + 120 + 180 seconds of waiting
    assert!(started.elapsed() >= Duration::from_secs(360));
    assert!(!bot.reconnect().is_active());
    bot.shutdown().await;
}
