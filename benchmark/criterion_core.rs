use std::sync::OnceLock;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use retext::content::parse_operations;
use retext::encoding::BaseEncoding;
use retext::engine::{Engine, EngineOptions, Replacement};
use retext::font::{EncodingMode, FontMap, FontSet};
use retext::instruction::{BuildContext, HeuristicSpacing, build_instructions};
use retext::projection::project;

const LINE_COUNTS: [usize; 3] = [50, 500, 5000];

fn fonts() -> &'static FontSet {
    static FONTS: OnceLock<FontSet> = OnceLock::new();
    FONTS.get_or_init(|| {
        let glyphs = ('a'..='z')
            .chain(' '..=' ')
            .enumerate()
            .map(|(i, ch)| (i as u32 + 1, ch.to_string()));
        [
            FontMap::new("F1", EncodingMode::Direct),
            FontMap::new("F2", EncodingMode::Named(BaseEncoding::Identity)).with_glyphs(glyphs),
        ]
        .into_iter()
        .collect()
    })
}

/// A page of alternating plain and kerned lines, with a CID-font line every tenth line.
fn synthetic_page(lines: usize) -> Vec<u8> {
    let mut out = String::from("BT /F1 10 Tf 1 0 0 1 72 800 Tm\n");
    for i in 0..lines {
        match i % 10 {
            9 => {
                out.push_str("/F2 10 Tf <");
                for ch in "lorem ipsum".chars() {
                    let id = if ch == ' ' { 27 } else { ch as u32 - 'a' as u32 + 1 };
                    out.push_str(&format!("{id:04X}"));
                }
                out.push_str("> Tj /F1 10 Tf 0 -12 Td\n");
            }
            n if n % 2 == 0 => {
                out.push_str(&format!("(line {i} of the invoice total) Tj 0 -12 Td\n"));
            }
            _ => {
                out.push_str(&format!("[(li) 20 (ne {i}) -300 (dolor) -20 (sit)] TJ 0 -12 Td\n"));
            }
        }
    }
    out.push_str("ET\n");
    out.into_bytes()
}

fn bench_project(c: &mut Criterion) {
    let mut group = c.benchmark_group("project");
    let spacing = HeuristicSpacing::default();
    for lines in LINE_COUNTS {
        let page = synthetic_page(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &page, |b, page| {
            b.iter(|| {
                let ctx = BuildContext {
                    fonts: fonts(),
                    spacing: &spacing,
                };
                let instructions = build_instructions(parse_operations(page), &ctx)
                    .expect("synthetic page builds");
                black_box(project(&instructions).text.len());
            })
        });
    }
    group.finish();
}

fn bench_report_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_report_only");
    let options = EngineOptions {
        report_only: true,
        ..EngineOptions::default()
    };
    let engine = Engine::new(r"line \d+", Replacement::Literal(String::new()), options)
        .expect("valid pattern");
    for lines in LINE_COUNTS {
        let page = synthetic_page(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &page, |b, page| {
            b.iter(|| {
                let outcome = engine.process(fonts(), page).expect("report succeeds");
                black_box(outcome.matches.len());
            })
        });
    }
    group.finish();
}

fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");
    let engine = Engine::new(
        r"(\d+)\s+dolor",
        Replacement::Template("${1} amet".to_string()),
        EngineOptions::default(),
    )
    .expect("valid pattern");
    for lines in LINE_COUNTS {
        let page = synthetic_page(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &page, |b, page| {
            b.iter(|| {
                let outcome = engine.process(fonts(), page).expect("rewrite succeeds");
                black_box(outcome.output.map(|o| o.len()));
            })
        });
    }
    group.finish();
}

fn bench_rewrite_across_lines(c: &mut Criterion) {
    let engine = Engine::new(
        r"total\)?\s*\n\s*line",
        Replacement::Literal("sum, line".to_string()),
        EngineOptions::default(),
    )
    .expect("valid pattern");
    let page = synthetic_page(500);
    c.bench_function("rewrite_across_lines", move |b| {
        b.iter(|| {
            let outcome = engine.process(fonts(), &page).expect("rewrite succeeds");
            black_box(outcome.replaced);
        })
    });
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(2))
        .measurement_time(Duration::from_secs(8))
        .sample_size(50)
}

criterion_group!(
    name = benches;
    config = criterion_config();
    targets =
        bench_project,
        bench_report_only,
        bench_rewrite,
        bench_rewrite_across_lines
);
criterion_main!(benches);
