//! Optional rewrites of raw operations that merge fragmented text before
//! instructions are built, so matches are less likely to straddle operators.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{Operand, Operation};

pub const DEFAULT_COLLAPSIBLE_WIDTH: i64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub squash_arrays: bool,
    pub squash_runs: bool,
    /// Widest horizontal `Td` still treated as the same run.
    pub collapsible_width: i64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            squash_arrays: false,
            squash_runs: false,
            collapsible_width: DEFAULT_COLLAPSIBLE_WIDTH,
        }
    }
}

pub fn normalize(operations: Vec<Operation>, options: &NormalizeOptions) -> Vec<Operation> {
    let operations = if options.squash_arrays {
        squash_adjusted_arrays(operations)
    } else {
        operations
    };
    if options.squash_runs {
        squash_positioned_runs(operations, options.collapsible_width)
    } else {
        operations
    }
}

/// Turns every `TJ` into a `Tj` of its concatenated strings. Kerning is lost.
pub fn squash_adjusted_arrays(operations: Vec<Operation>) -> Vec<Operation> {
    operations
        .into_iter()
        .map(|op| {
            if op.operator != "TJ" {
                return op;
            }
            let [Operand::Array(items)] = op.operands.as_slice() else {
                return op;
            };
            let mut reference = None;
            let mut bytes = Vec::new();
            for item in items {
                if let Some(b) = item.as_bytes() {
                    reference.get_or_insert(item);
                    bytes.extend_from_slice(b);
                }
            }
            let operand = match reference {
                Some(reference) => reference.with_bytes(bytes),
                None => Operand::String(bytes),
            };
            Operation::new(vec![operand], "Tj")
        })
        .collect()
}

/// Appends a `Tj` to the previous `Tj` when the last `Td` moved right by less than
/// `collapsible_width` on the same line. The `Td` is kept; offsets stay in effect
/// until the next `Td`. A run never crosses `Tf`, `BT` or `ET`.
pub fn squash_positioned_runs(operations: Vec<Operation>, collapsible_width: i64) -> Vec<Operation> {
    let mut out: Vec<Operation> = Vec::with_capacity(operations.len());
    let (mut dx, mut dy) = (0i64, 0i64);
    let mut previous: Option<usize> = None;
    let mut merged = 0usize;

    for op in operations {
        match op.operator.as_str() {
            "Td" => {
                if let [x, y] = op.operands.as_slice() {
                    dx = x.as_f64().map_or(0, |v| v as i64);
                    dy = y.as_f64().map_or(0, |v| v as i64);
                }
            }
            "Tj" => {
                let same_run = dy == 0 && (0..collapsible_width).contains(&dx);
                if same_run
                    && let Some(index) = previous
                    && let Some(appended) = op.operands.first().and_then(Operand::as_bytes)
                    && let Some(target) = out[index].operands.first_mut()
                    && let Some(existing) = target.as_bytes()
                {
                    let mut bytes = existing.to_vec();
                    bytes.extend_from_slice(appended);
                    *target = target.with_bytes(bytes);
                    merged += 1;
                    continue;
                }
                previous = Some(out.len());
            }
            // Runs end at font switches and at any other show or positioning operator.
            "Tf" | "BT" | "ET" | "TJ" | "'" | "\"" | "T*" | "TD" | "Tm" => previous = None,
            _ => {}
        }
        out.push(op);
    }

    if merged > 0 {
        debug!("merged {merged} positioned Tj run(s)");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_operations;
    use crate::model::write_operations;

    fn squashed(input: &[u8], options: NormalizeOptions) -> String {
        let ops = normalize(parse_operations(input), &options);
        String::from_utf8(write_operations(&ops)).unwrap()
    }

    #[test]
    fn disabled_by_default() {
        let input = b"[(a) -20 (b)] TJ";
        assert_eq!(squashed(input, NormalizeOptions::default()), "[(a) -20 (b)] TJ\n");
    }

    #[test]
    fn arrays_become_plain_shows() {
        let options = NormalizeOptions {
            squash_arrays: true,
            ..NormalizeOptions::default()
        };
        assert_eq!(squashed(b"[<0001> -20 <0002>] TJ", options), "<00010002> Tj\n");
        assert_eq!(squashed(b"[-20] TJ", options), "() Tj\n");
    }

    #[test]
    fn narrow_moves_merge_into_previous_show() {
        let options = NormalizeOptions {
            squash_runs: true,
            ..NormalizeOptions::default()
        };
        let out = squashed(b"(a) Tj 6.5 0 Td (b) Tj 30 0 Td (c) Tj 0 -12 Td (d) Tj", options);
        assert_eq!(out, "(ab) Tj\n6.5 0 Td\n30 0 Td\n(c) Tj\n0 -12 Td\n(d) Tj\n");
    }

    #[test]
    fn font_switch_ends_the_run() {
        let options = NormalizeOptions {
            squash_runs: true,
            ..NormalizeOptions::default()
        };
        let out = squashed(b"/F1 9 Tf (a) Tj /F2 9 Tf 5 0 Td <0001> Tj", options);
        assert_eq!(out, "/F1 9 Tf\n(a) Tj\n/F2 9 Tf\n5 0 Td\n<0001> Tj\n");

        let out = squashed(b"BT (a) Tj ET BT 5 0 Td (b) Tj ET", options);
        assert_eq!(out, "BT\n(a) Tj\nET\nBT\n5 0 Td\n(b) Tj\nET\n");
    }

    #[test]
    fn negative_moves_start_a_new_run() {
        let options = NormalizeOptions {
            squash_runs: true,
            collapsible_width: 10,
            ..NormalizeOptions::default()
        };
        let out = squashed(b"(a) Tj -3 0 Td (b) Tj", options);
        assert_eq!(out, "(a) Tj\n-3 0 Td\n(b) Tj\n");
    }
}
