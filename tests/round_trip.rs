mod common;

use common::{output_text, replace};
use pretty_assertions::assert_eq;
use retext::content::parse_operations;
use retext::model::write_operations;

const PAGE: &[u8] = b"q 0.5 0 0 0.5 10.25 -3 cm
/Artifact << /Type /Pagination >> BDC
BT /F1 11 Tf 1 0 0 1 72 720 Tm (Invoice \\(draft\\)) Tj
0 -13.5 Td [(Total) -300 (due)] TJ
T* 2 0.5 (next line) \"
ET EMC
BI /W 2 /H 1 /BPC 8 /CS /G ID \x01\x02 EI
Q";

fn canonical(data: &[u8]) -> Vec<u8> {
    write_operations(&parse_operations(data))
}

#[test]
fn no_match_reproduces_canonical_bytes() {
    let outcome = replace(PAGE, "absent", "x");
    assert_eq!(outcome.replaced, 0);
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.output.unwrap(), canonical(PAGE));
}

#[test]
fn canonical_form_is_stable() {
    let once = canonical(PAGE);
    assert_eq!(canonical(&once), once);
}

#[test]
fn projection_of_mixed_page() {
    let outcome = replace(PAGE, "absent", "x");
    assert_eq!(outcome.text, "Invoice (draft)\nTotal due\n\nnext line");
}

#[test]
fn text_free_sequence_projects_to_nothing() {
    let input = b"q 1 0 0 RG 0 0 m 100 100 l S Q";
    let outcome = replace(input, ".", "x");
    assert_eq!(outcome.text, "");
    assert_eq!(outcome.replaced, 0);
    assert_eq!(outcome.output.unwrap(), canonical(input));
}

#[test]
fn edits_leave_surrounding_operations_alone() {
    let outcome = replace(PAGE, r"\(draft\)", "(final)");
    let expected = String::from_utf8(canonical(PAGE))
        .unwrap()
        .replace("(Invoice \\(draft\\)) Tj", "(Invoice \\(final\\)) Tj");
    assert_eq!(output_text(&outcome), expected);
    let reparsed = replace(output_text(&outcome).as_bytes(), "absent", "x");
    assert_eq!(reparsed.text, "Invoice (final)\nTotal due\n\nnext line");
}
