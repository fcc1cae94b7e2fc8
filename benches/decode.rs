use chrono::Local;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;
use wtail::engine::decode::{apply_text, ChunkDecoder};
use wtail::engine::tail_load::load_tail;
use wtail::{LineBuffer, LineFilter, MemorySource};

fn log_content(size_kb: usize) -> Vec<u8> {
    let target_size = size_kb * 1024;
    let mut content = Vec::with_capacity(target_size + 128);
    let mut line_num = 0;

    while content.len() < target_size {
        let level = match line_num % 50 {
            0 => "ERROR",
            1..=4 => "WARN",
            _ => "INFO",
        };
        let line = format!(
            "[2024-09-02T10:{:02}:{:02}] {level}: Request {line_num} user_{}\n",
            (line_num / 60) % 60,
            line_num % 60,
            line_num % 1000
        );
        content.extend_from_slice(line.as_bytes());
        line_num += 1;
    }
    content
}

fn bench_decode_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_chunks");
    let content = log_content(1024);
    group.throughput(Throughput::Bytes(content.len() as u64));

    // Poll-sized reads; odd sizes split lines and UTF-8 sequences
    for chunk_size in [509usize, 4096, 65_536] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = ChunkDecoder::new();
                    let mut buffer = LineBuffer::new(5_000);
                    let now = Local::now();
                    for chunk in content.chunks(chunk_size) {
                        let text = decoder.decode(chunk);
                        apply_text(&mut buffer, &text, now);
                        buffer.trim();
                    }
                    black_box(buffer.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_tail_load(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("tail_load");
    group.sample_size(20);

    for size_kb in [64usize, 1024, 16_384] {
        let source = MemorySource::with_contents("bench.log", log_content(size_kb));
        for lines in [100usize, 5_000] {
            group.bench_with_input(
                BenchmarkId::new(format!("{size_kb}KB"), lines),
                &lines,
                |b, &lines| {
                    b.to_async(&rt).iter(|| async {
                        let mut decoder = ChunkDecoder::new();
                        let window = load_tail(&source, lines, &mut decoder).await.unwrap();
                        black_box(window.lines.len());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let content = String::from_utf8(log_content(256)).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    let mut group = c.benchmark_group("filter");
    group.throughput(Throughput::Elements(lines.len() as u64));

    for pattern in ["error", r"user_\d{3}", "timeout|refused"] {
        let filter = LineFilter::parse(pattern).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(pattern), &filter, |b, filter| {
            b.iter(|| {
                let spans: usize = lines
                    .iter()
                    .filter(|line| filter.matches(line))
                    .map(|line| filter.match_spans(line).len())
                    .sum();
                black_box(spans);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode_chunks, bench_tail_load, bench_filter);
criterion_main!(benches);
