use std::sync::Arc;

use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Duration};

use wtail::{MemorySource, PollScheduler, SharedEngine, TailConfig, TailEngine};

const PERIOD: Duration = Duration::from_millis(20);
const TIMEOUT_MS: u64 = 2000;

async fn live_engine(source: &MemorySource) -> SharedEngine {
    let (tx, rx) = unbounded_channel();
    // Events are not inspected here
    drop(rx);
    let mut engine = TailEngine::new(&TailConfig::default(), tx);
    engine.open(Box::new(source.clone()), 100).await.unwrap();
    Arc::new(Mutex::new(engine))
}

async fn wait_for_offset(engine: &SharedEngine, expected: u64) {
    timeout(Duration::from_millis(TIMEOUT_MS), async {
        loop {
            if engine.lock().await.offset() == expected {
                return;
            }
            sleep(PERIOD).await;
        }
    })
    .await
    .expect("scheduler never reached the expected offset");
}

#[tokio::test]
async fn scheduler_picks_up_growth() {
    let source = MemorySource::new("app.log");
    let engine = live_engine(&source).await;
    let scheduler = PollScheduler::start(Arc::clone(&engine), PERIOD);

    source.append("first\n");
    wait_for_offset(&engine, 6).await;
    source.append("second\n");
    wait_for_offset(&engine, 13).await;

    let texts: Vec<String> = engine
        .lock()
        .await
        .lines()
        .iter()
        .map(|line| line.text.clone())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);

    scheduler.stop().await;
}

#[tokio::test]
async fn busy_engine_skips_ticks_instead_of_queueing() {
    let source = MemorySource::new("app.log");
    let engine = live_engine(&source).await;
    let scheduler = PollScheduler::start(Arc::clone(&engine), PERIOD);

    {
        let _held = engine.lock().await;
        sleep(PERIOD * 10).await;
    }
    assert!(scheduler.ticks_skipped() > 0);

    source.append("after\n");
    wait_for_offset(&engine, 6).await;
    scheduler.stop().await;
}

#[tokio::test]
async fn stopped_scheduler_no_longer_polls() {
    let source = MemorySource::new("app.log");
    let engine = live_engine(&source).await;
    let scheduler = PollScheduler::start(Arc::clone(&engine), PERIOD);
    assert!(scheduler.is_running());

    scheduler.stop().await;
    source.append("late\n");
    sleep(PERIOD * 5).await;
    assert_eq!(engine.lock().await.offset(), 0);
}

#[tokio::test]
async fn paused_engine_ignores_growth() {
    let source = MemorySource::new("app.log");
    let engine = live_engine(&source).await;
    engine.lock().await.pause();
    let scheduler = PollScheduler::start(Arc::clone(&engine), PERIOD);

    source.append("ignored\n");
    sleep(PERIOD * 5).await;
    assert_eq!(engine.lock().await.offset(), 0);

    engine.lock().await.resume();
    wait_for_offset(&engine, 8).await;
    scheduler.stop().await;
}
