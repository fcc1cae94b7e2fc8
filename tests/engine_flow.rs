use std::time::{Duration, Instant};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use wtail::engine::{TickOutcome, ROTATION_MARKER};
use wtail::render::plain::PlainPrinter;
use wtail::render::protocol::{RenderEvent, TailStatus};
use wtail::{MemorySource, TailConfig, TailEngine};

fn engine_with(config: TailConfig) -> (TailEngine, UnboundedReceiver<RenderEvent>) {
    let (tx, rx) = unbounded_channel();
    (TailEngine::new(&config, tx), rx)
}

fn texts(engine: &TailEngine) -> Vec<String> {
    engine.lines().iter().map(|line| line.text.clone()).collect()
}

fn drain(rx: &mut UnboundedReceiver<RenderEvent>) -> Vec<RenderEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Text of the lines in the last `Full` render, if any
fn last_full(events: &[RenderEvent]) -> Option<Vec<String>> {
    events.iter().rev().find_map(|event| match event {
        RenderEvent::Full { lines, .. } => {
            Some(lines.iter().map(|line| line.text.clone()).collect())
        }
        _ => None,
    })
}

#[tokio::test]
async fn partial_line_is_completed_across_polls() {
    let (mut engine, _rx) = engine_with(TailConfig::default());
    let source = MemorySource::new("app.log");
    engine.open(Box::new(source.clone()), 100).await.unwrap();
    assert_eq!(engine.offset(), 0);

    source.append("line1\nline2\nli");
    engine.tick().await;
    assert_eq!(engine.offset(), 14);
    assert_eq!(texts(&engine), vec!["line1", "line2", "li"]);
    assert!(engine.lines().tail_open());

    source.append("ne3\n");
    engine.tick().await;
    assert_eq!(engine.offset(), 18);
    assert_eq!(texts(&engine), vec!["line1", "line2", "line3"]);
    assert!(!engine.lines().tail_open());
}

#[tokio::test]
async fn lone_newline_closes_line_without_adding_one() {
    let (mut engine, _rx) = engine_with(TailConfig::default());
    let source = MemorySource::new("app.log");
    engine.open(Box::new(source.clone()), 100).await.unwrap();

    source.append("abc");
    engine.tick().await;
    source.append("\n");
    engine.tick().await;
    assert_eq!(texts(&engine), vec!["abc"]);

    source.append("def\n");
    engine.tick().await;
    assert_eq!(texts(&engine), vec!["abc", "def"]);
}

#[tokio::test]
async fn lone_newline_after_complete_lines_adds_nothing() {
    let (mut engine, _rx) = engine_with(TailConfig::default());
    let source = MemorySource::with_contents("app.log", "a\nb\n");
    engine.open(Box::new(source.clone()), 100).await.unwrap();
    assert_eq!(texts(&engine), vec!["a", "b"]);

    source.append("\n");
    engine.tick().await;
    assert_eq!(texts(&engine), vec!["a", "b"]);
    assert_eq!(engine.offset(), 5);

    source.append("c\n");
    engine.tick().await;
    assert_eq!(texts(&engine), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn truncation_restarts_from_zero_with_marker() {
    let (mut engine, _rx) = engine_with(TailConfig::default());
    let before: String = (0..100).map(|i| format!("line-{i:04}\n")).collect();
    assert_eq!(before.len(), 1000);
    let source = MemorySource::with_contents("app.log", &before);
    engine.open(Box::new(source.clone()), 10).await.unwrap();
    assert_eq!(engine.offset(), 1000);

    let after: String = (0..20).map(|i| format!("new--{i:04}\n")).collect();
    assert_eq!(after.len(), 200);
    source.replace(&after);

    let TickOutcome::Progress(report) = engine.tick().await else {
        panic!("expected progress after rotation");
    };
    assert!(report.rotated);
    assert_eq!(report.bytes_read, 200);
    assert_eq!(engine.offset(), 200);

    let lines = texts(&engine);
    let marker = lines.iter().position(|l| l == ROTATION_MARKER).unwrap();
    assert_eq!(lines[marker - 1], "line-0099");
    assert_eq!(lines[marker + 1], "new--0000");
    assert_eq!(lines.last().unwrap(), "new--0019");
}

#[tokio::test]
async fn rate_is_bytes_over_interval_between_reads() {
    let (mut engine, _rx) = engine_with(TailConfig::default());
    let source = MemorySource::new("app.log");
    engine.open(Box::new(source.clone()), 100).await.unwrap();

    let t0 = Instant::now() + Duration::from_secs(1);
    source.append(vec![b'a'; 100]);
    engine.tick_at(t0).await;

    source.append(vec![b'b'; 1024]);
    let TickOutcome::Progress(report) = engine.tick_at(t0 + Duration::from_secs(1)).await else {
        panic!("expected progress");
    };
    let rate = report.rate.unwrap();
    assert!((rate - 1024.0).abs() < 1.0, "rate was {rate}");

    // Ticks without data keep the last rate
    assert_eq!(
        engine.tick_at(t0 + Duration::from_secs(5)).await,
        TickOutcome::Unchanged
    );
    assert!((engine.rate().unwrap() - 1024.0).abs() < 1.0);
}

#[tokio::test]
async fn filter_is_non_destructive() {
    let (mut engine, mut rx) = engine_with(TailConfig::default());
    let source = MemorySource::with_contents(
        "app.log",
        "INFO started\nERROR disk full\nWARN slow\nerror again\n",
    );
    engine.open(Box::new(source), 100).await.unwrap();
    drain(&mut rx);

    engine.set_filter("error");
    assert_eq!(
        last_full(&drain(&mut rx)).unwrap(),
        vec!["ERROR disk full", "error again"]
    );
    assert_eq!(engine.lines().len(), 4);

    engine.set_filter("[unclosed");
    assert_eq!(engine.filter_pattern(), None);
    assert_eq!(last_full(&drain(&mut rx)).unwrap().len(), 4);

    engine.set_filter("");
    assert_eq!(last_full(&drain(&mut rx)).unwrap().len(), 4);
}

#[tokio::test]
async fn filtered_append_only_carries_matching_lines() {
    let (mut engine, mut rx) = engine_with(TailConfig {
        filter: "warn".into(),
        ..TailConfig::default()
    });
    let source = MemorySource::new("app.log");
    engine.open(Box::new(source.clone()), 100).await.unwrap();
    drain(&mut rx);

    source.append("info a\nWARN b\ninfo c\n");
    engine.tick().await;

    let appended: Vec<String> = drain(&mut rx)
        .into_iter()
        .filter_map(|event| match event {
            RenderEvent::Append { lines, .. } => Some(lines),
            _ => None,
        })
        .flatten()
        .map(|line| line.text)
        .collect();
    assert_eq!(appended, vec!["WARN b"]);
    assert_eq!(engine.lines().len(), 3);
}

#[tokio::test]
async fn buffer_stays_bounded_while_tailing() {
    let (mut engine, _rx) = engine_with(TailConfig {
        max_lines: 200,
        ..TailConfig::default()
    });
    let source = MemorySource::new("app.log");
    engine.open(Box::new(source.clone()), 100).await.unwrap();

    for batch in 0..10 {
        let chunk: String = (0..50).map(|i| format!("{batch}-{i}\n")).collect();
        source.append(chunk);
        engine.tick().await;
        assert!(engine.lines().len() <= 200);
    }
    assert_eq!(engine.lines().len(), 200);
    assert_eq!(engine.lines().last().unwrap().text, "9-49");
    assert_eq!(engine.lines().iter().next().unwrap().text, "6-0");
}

#[tokio::test]
async fn unavailable_source_recovers_without_losing_position() {
    let (mut engine, mut rx) = engine_with(TailConfig::default());
    let source = MemorySource::with_contents("app.log", "one\n");
    engine.open(Box::new(source.clone()), 100).await.unwrap();

    source.set_unavailable(Some("permission denied"));
    engine.tick().await;
    engine.tick().await;
    assert!(engine.status().is_unavailable());

    let unavailable_events = drain(&mut rx)
        .iter()
        .filter(|e| matches!(e, RenderEvent::Status(TailStatus::Unavailable(_))))
        .count();
    assert_eq!(unavailable_events, 1);

    source.set_unavailable(None);
    source.append("two\n");
    engine.tick().await;
    assert_eq!(engine.status(), &TailStatus::Tailing);
    assert_eq!(texts(&engine), vec!["one", "two"]);
    assert_eq!(engine.offset(), 8);
}

#[tokio::test]
async fn pause_holds_offset_until_resume() {
    let (mut engine, _rx) = engine_with(TailConfig::default());
    let source = MemorySource::new("app.log");
    engine.open(Box::new(source.clone()), 100).await.unwrap();

    engine.pause();
    source.append("queued\n");
    engine.tick().await;
    assert_eq!(engine.offset(), 0);
    assert_eq!(engine.status(), &TailStatus::Paused);

    engine.resume();
    engine.tick().await;
    assert_eq!(engine.offset(), 7);
    assert_eq!(texts(&engine), vec!["queued"]);
}

#[tokio::test]
async fn reopening_resets_state() {
    let (mut engine, _rx) = engine_with(TailConfig::default());
    engine
        .open(Box::new(MemorySource::with_contents("a.log", "a1\na2\n")), 100)
        .await
        .unwrap();
    engine.pause();

    engine
        .open(Box::new(MemorySource::with_contents("b.log", "b1\n")), 100)
        .await
        .unwrap();
    assert_eq!(engine.source_name(), Some("b.log"));
    assert!(!engine.is_paused());
    assert_eq!(texts(&engine), vec!["b1"]);
    assert_eq!(engine.lines().iter().next().unwrap().seq, 0);
    assert_eq!(engine.offset(), 3);
}

#[tokio::test]
async fn plain_output_follows_a_reopened_source() {
    let (mut engine, mut rx) = engine_with(TailConfig::default());
    let mut printer = PlainPrinter::new(Vec::new());

    let first = MemorySource::with_contents("a.log", "a1\na2\na3\n");
    engine.open(Box::new(first), 100).await.unwrap();
    for event in drain(&mut rx) {
        printer.apply(&event).unwrap();
    }

    let second = MemorySource::with_contents("b.log", "b1\n");
    engine.open(Box::new(second.clone()), 100).await.unwrap();
    second.append("b2\n");
    engine.tick().await;
    for event in drain(&mut rx) {
        printer.apply(&event).unwrap();
    }

    let out = String::from_utf8(printer.into_inner()).unwrap();
    assert_eq!(out, "a1\na2\na3\nb1\nb2\n");
}
