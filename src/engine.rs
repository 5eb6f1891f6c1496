use std::collections::HashMap;

use log::{debug, warn};
use regex::Regex;

use crate::content::parse_operations;
use crate::error::Result;
use crate::font::FontSet;
use crate::instruction::{BuildContext, HeuristicSpacing, Instruction, build_instructions};
use crate::matcher::{MatchFilter, MatchSpan, ResolvedSpan, find_spans, resolve};
use crate::model::{Operation, write_operations};
use crate::normalize::{NormalizeOptions, normalize};
use crate::projection::project;
use crate::schedule::{Schedule, rewrite, schedule};

/// What a match is replaced with.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    Literal(String),
    /// Regex replacement template, e.g. `$1` or `${name}`.
    Template(String),
}

impl Replacement {
    /// Expands against the captures of `span` taken in the whole of `haystack`, so
    /// assertions such as `\b` see the same context the search did.
    fn expand(&self, pattern: &Regex, haystack: &str, span: &MatchSpan) -> String {
        match self {
            Replacement::Literal(text) => text.clone(),
            Replacement::Template(template) => {
                let mut out = String::new();
                if let Some(captures) = pattern.captures_at(haystack, span.start) {
                    captures.expand(template, &mut out);
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOptions {
    pub spacing: HeuristicSpacing,
    pub normalize: NormalizeOptions,
    /// Project and match only; never produce altered output.
    pub report_only: bool,
}

/// Result of processing one content block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockOutcome {
    pub text: String,
    pub matches: Vec<MatchSpan>,
    pub replaced: usize,
    /// Re-serialized content; `None` in report-only mode.
    pub output: Option<Vec<u8>>,
}

/// Everything computed for a block before rewriting, for inspection.
#[derive(Debug, Clone)]
pub struct Plan {
    pub instructions: Vec<Instruction>,
    pub text: String,
    pub matches: Vec<MatchSpan>,
    pub spans: Vec<ResolvedSpan>,
    pub schedule: Schedule,
}

#[derive(Debug)]
pub struct Engine {
    pattern: Regex,
    replacement: Replacement,
    filter: Option<MatchFilter>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(pattern: &str, replacement: Replacement, options: EngineOptions) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement,
            filter: None,
            options,
        })
    }

    pub fn with_filter(mut self, filter: MatchFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn is_report_only(&self) -> bool {
        self.options.report_only
    }

    fn operations(&self, data: &[u8]) -> Vec<Operation> {
        normalize(parse_operations(data), &self.options.normalize)
    }

    /// Builds, projects, matches and schedules without rewriting.
    pub fn plan(&self, fonts: &FontSet, data: &[u8]) -> Result<Plan> {
        let ctx = BuildContext {
            fonts,
            spacing: &self.options.spacing,
        };
        let instructions = build_instructions(self.operations(data), &ctx)?;
        let projection = project(&instructions);
        let matches = find_spans(&projection.text, &self.pattern, self.filter.as_ref());
        let spans: Vec<ResolvedSpan> = matches
            .iter()
            .filter_map(|span| resolve(span, &projection, &instructions))
            .collect();
        if spans.len() < matches.len() {
            debug!(
                "{} match(es) were empty or covered only inferred spacing",
                matches.len() - spans.len()
            );
        }

        let by_ordinal: HashMap<usize, &MatchSpan> = matches.iter().map(|m| (m.ordinal, m)).collect();
        let substitute = |span: &ResolvedSpan| match by_ordinal.get(&span.ordinal) {
            Some(m) => self.replacement.expand(&self.pattern, &projection.text, m),
            None => span.matched.clone(),
        };
        let schedule = if self.options.report_only {
            Schedule::default()
        } else {
            schedule(&instructions, &spans, &substitute)
        };
        Ok(Plan {
            instructions,
            text: projection.text,
            matches,
            spans,
            schedule,
        })
    }

    pub fn process(&self, fonts: &FontSet, data: &[u8]) -> Result<BlockOutcome> {
        let plan = self.plan(fonts, data)?;
        debug!(
            "block of {} instruction(s): {} char(s) projected, {} match(es)",
            plan.instructions.len(),
            plan.text.chars().count(),
            plan.matches.len()
        );

        if self.options.report_only {
            if !plan.matches.is_empty() {
                warn!("report-only mode: {} match(es) left unchanged", plan.matches.len());
            }
            return Ok(BlockOutcome {
                text: plan.text,
                matches: plan.matches,
                replaced: 0,
                output: None,
            });
        }

        let replaced = plan.schedule.scheduled();
        let operations = rewrite(plan.instructions, &plan.schedule, fonts)?;
        Ok(BlockOutcome {
            text: plan.text,
            matches: plan.matches,
            replaced,
            output: Some(write_operations(&operations)),
        })
    }
}
