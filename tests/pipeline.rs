use std::path::Path;

use pretty_assertions::assert_eq;
use retext::config::Config;
use retext::container::{ContentBlock, MemoryContainer, run};
use retext::engine::{Engine, Replacement};
use retext::font::FontSet;
use retext::inspect::inspect;

const CONFIG: &str = "tests/fixtures/retext.toml";

fn load() -> (Config, FontSet) {
    let path = Path::new(CONFIG);
    let config = Config::load(path).expect("fixture config loads");
    let fonts = config
        .font_set(path.parent().expect("fixture dir"))
        .expect("fixture fonts build");
    (config, fonts)
}

fn engine(config: &Config, pattern: &str, replacement: &str) -> Engine {
    Engine::new(
        pattern,
        Replacement::Literal(replacement.to_string()),
        config.engine_options(),
    )
    .expect("valid pattern")
}

/// Hex body for `text` in the fixture CID font.
fn cid(text: &str) -> String {
    text.chars()
        .map(|ch| {
            let code = match ch {
                'A'..='Z' => 0x24 + (ch as u32 - 'A' as u32),
                'a'..='z' => 0x44 + (ch as u32 - 'a' as u32),
                ' ' => 0x03,
                '.' => 0x10,
                other => panic!("no glyph for {other:?}"),
            };
            format!("{code:04X}")
        })
        .collect()
}

#[test]
fn fixture_fonts_are_loaded() {
    let (_, fonts) = load();
    assert_eq!(fonts.len(), 3);
    assert_eq!(fonts.get("C0").unwrap().halfspace(), 150.0);
}

#[test]
fn cid_font_with_ligature_glyph() {
    let (config, fonts) = load();
    let input = format!("/C0 9 Tf <{}0011{}> Tj", cid("Pro"), cid("le"));
    let outcome = engine(&config, "Profile", "Account")
        .process(&fonts, input.as_bytes())
        .unwrap();
    assert_eq!(outcome.text, "Profile");
    assert_eq!(
        outcome.output.unwrap(),
        format!("/C0 9 Tf\n<{}> Tj\n", cid("Account")).into_bytes()
    );
}

#[test]
fn cid_kerning_uses_configured_halfspace() {
    let (config, fonts) = load();
    let input = format!("/C0 9 Tf [<{}> -140 <{}> -160 <{}>] TJ", cid("a"), cid("b"), cid("c"));
    let outcome = engine(&config, "$^", "").process(&fonts, input.as_bytes()).unwrap();
    assert_eq!(outcome.text, "ab c");
}

#[test]
fn positioned_runs_are_squashed_before_matching() {
    let (config, fonts) = load();
    let outcome = engine(&config, "Hello", "Bye")
        .process(&fonts, b"/F1 9 Tf (Hel) Tj 5 0 Td (lo) Tj")
        .unwrap();
    assert_eq!(outcome.text, "Hello ");
    assert_eq!(outcome.output.unwrap(), b"/F1 9 Tf\n(Bye) Tj\n5 0 Td\n".to_vec());
}

#[test]
fn win_ansi_font_with_override() {
    let (config, fonts) = load();
    let outcome = engine(&config, "\u{20ac}", " EUR")
        .process(&fonts, b"/T1 9 Tf (Price: 5\x80) Tj")
        .unwrap();
    assert_eq!(outcome.text, "Price: 5\u{20ac}");
    assert_eq!(outcome.output.unwrap(), b"/T1 9 Tf\n(Price: 5 EUR) Tj\n".to_vec());
}

#[test]
fn inspection_annotates_scheduled_changes() {
    let (config, fonts) = load();
    let plan = engine(&config, "b\nc", "X")
        .plan(&fonts, b"/F1 9 Tf (ab) Tj 0 -9 Td (cd) Tj")
        .unwrap();
    let rows = inspect(&plan.instructions, &plan.schedule);
    let changes: Vec<&str> = rows.iter().map(|r| r.change.as_str()).collect();
    assert_eq!(
        changes,
        vec![
            "",
            "modified; #0: replace with \"aXd\"",
            "move",
            "delete; #0: delete",
        ]
    );
    assert_eq!(rows[3].text, "cd");
}

#[test]
fn container_run_rewrites_each_page() {
    let (config, fonts) = load();
    let mut container = MemoryContainer::new();
    let page_one = format!("BT /C0 9 Tf <{}> Tj ET", cid("Dear Sir."));
    container.push_page(fonts.clone(), vec![ContentBlock::decoded(page_one.into_bytes())]);
    container.push_page(
        fonts,
        vec![
            ContentBlock::decoded(&b"BT /F1 9 Tf (Yours, Sir) Tj ET"[..]),
            ContentBlock::decoded(&b"0 0 m 5 5 l S"[..]),
        ],
    );

    let report = run(&mut container, &engine(&config, "Sir", "Madam")).unwrap();
    assert_eq!(report.match_count(), 2);
    assert_eq!(report.replaced(), 2);
    assert_eq!(report.written(), 2);
    assert_eq!(
        container.block(0, 0).unwrap().data,
        format!("BT\n/C0 9 Tf\n<{}> Tj\nET\n", cid("Dear Madam.")).into_bytes()
    );
    assert_eq!(
        container.block(1, 0).unwrap().data,
        b"BT\n/F1 9 Tf\n(Yours, Madam) Tj\nET\n".to_vec()
    );
    assert_eq!(container.block(1, 1).unwrap().data, b"0 0 m 5 5 l S".to_vec());
}
