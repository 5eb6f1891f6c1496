use log::{debug, info, warn};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::font::FontSet;
use crate::matcher::MatchSpan;

/// One content stream of a page, as handed over by the container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentBlock {
    pub data: Vec<u8>,
    /// Filters still applied to `data`; only decoded blocks (no filters) can be edited.
    pub filters: Vec<String>,
}

impl ContentBlock {
    pub fn decoded(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            filters: Vec::new(),
        }
    }
}

/// Document storage the engine reads fonts and content from and writes results back to.
pub trait Container {
    fn page_count(&self) -> usize;

    fn fonts(&self, page: usize) -> Result<FontSet>;

    fn content_blocks(&self, page: usize) -> Result<Vec<ContentBlock>>;

    fn write_back(&mut self, page: usize, block: usize, data: Vec<u8>) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    pub fonts: FontSet,
    pub blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    pages: Vec<MemoryPage>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&mut self, fonts: FontSet, blocks: Vec<ContentBlock>) {
        self.pages.push(MemoryPage { fonts, blocks });
    }

    pub fn block(&self, page: usize, block: usize) -> Option<&ContentBlock> {
        self.pages.get(page)?.blocks.get(block)
    }

    fn page(&self, page: usize) -> Result<&MemoryPage> {
        self.pages
            .get(page)
            .ok_or_else(|| Error::UnsupportedRepresentation(format!("page {page} does not exist")))
    }
}

impl Container for MemoryContainer {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn fonts(&self, page: usize) -> Result<FontSet> {
        Ok(self.page(page)?.fonts.clone())
    }

    fn content_blocks(&self, page: usize) -> Result<Vec<ContentBlock>> {
        Ok(self.page(page)?.blocks.clone())
    }

    fn write_back(&mut self, page: usize, block: usize, data: Vec<u8>) -> Result<()> {
        let Some(target) = self
            .pages
            .get_mut(page)
            .and_then(|p| p.blocks.get_mut(block))
        else {
            return Err(Error::UnsupportedRepresentation(format!(
                "page {page} has no content block {block}"
            )));
        };
        target.data = data;
        target.filters.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockReport {
    pub page: usize,
    pub block: usize,
    pub text: String,
    pub matches: Vec<MatchSpan>,
    pub replaced: usize,
    pub written: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub blocks: Vec<BlockReport>,
}

impl Report {
    pub fn match_count(&self) -> usize {
        self.blocks.iter().map(|b| b.matches.len()).sum()
    }

    pub fn replaced(&self) -> usize {
        self.blocks.iter().map(|b| b.replaced).sum()
    }

    pub fn written(&self) -> usize {
        self.blocks.iter().filter(|b| b.written).count()
    }
}

/// Runs `engine` over every content block of every page, in order. The first error
/// aborts the run; blocks already written back stay written. In report-only mode
/// encoded blocks are skipped with a warning instead.
pub fn run<C: Container + ?Sized>(container: &mut C, engine: &Engine) -> Result<Report> {
    let mut report = Report::default();
    for page in 0..container.page_count() {
        let fonts = container.fonts(page)?;
        let blocks = container.content_blocks(page)?;
        info!("page {}: {} content block(s)", page + 1, blocks.len());

        for (index, block) in blocks.into_iter().enumerate() {
            if !block.filters.is_empty() {
                let reason = format!(
                    "page {} block {index} is encoded with {}; decode it first",
                    page + 1,
                    block.filters.join(", ")
                );
                if engine.is_report_only() {
                    warn!("{reason}; skipped");
                    continue;
                }
                return Err(Error::UnsupportedRepresentation(reason));
            }
            let outcome = engine.process(&fonts, &block.data)?;
            debug!(
                "page {} block {index}: {} match(es), {} replaced",
                page + 1,
                outcome.matches.len(),
                outcome.replaced
            );

            let written = match outcome.output {
                Some(data) if outcome.replaced > 0 => {
                    container.write_back(page, index, data)?;
                    true
                }
                _ => false,
            };
            report.blocks.push(BlockReport {
                page,
                block: index,
                text: outcome.text,
                matches: outcome.matches,
                replaced: outcome.replaced,
                written,
            });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineOptions, Replacement};
    use crate::font::{EncodingMode, FontMap};

    fn container() -> MemoryContainer {
        let fonts: FontSet = [FontMap::new("F1", EncodingMode::Direct)].into_iter().collect();
        let mut container = MemoryContainer::new();
        container.push_page(
            fonts.clone(),
            vec![
                ContentBlock::decoded(&b"/F1 9 Tf (cat and dog) Tj"[..]),
                ContentBlock::decoded(&b"q Q"[..]),
            ],
        );
        container.push_page(fonts, vec![ContentBlock::decoded(&b"/F1 9 Tf (cat) Tj"[..])]);
        container
    }

    #[test]
    fn writes_back_only_changed_blocks() {
        let mut container = container();
        let engine = Engine::new("cat", Replacement::Literal("cow".into()), EngineOptions::default()).unwrap();
        let report = run(&mut container, &engine).unwrap();
        assert_eq!(report.match_count(), 2);
        assert_eq!(report.replaced(), 2);
        assert_eq!(report.written(), 2);
        assert!(!report.blocks[1].written);
        assert_eq!(
            container.block(0, 0).unwrap().data,
            b"/F1 9 Tf\n(cow and dog) Tj\n".to_vec()
        );
        assert_eq!(container.block(0, 1).unwrap().data, b"q Q".to_vec());
    }

    #[test]
    fn report_only_leaves_container_untouched() {
        let mut container = container();
        let options = EngineOptions {
            report_only: true,
            ..EngineOptions::default()
        };
        let engine = Engine::new("cat", Replacement::Literal("cow".into()), options).unwrap();
        let report = run(&mut container, &engine).unwrap();
        assert_eq!(report.match_count(), 2);
        assert_eq!(report.written(), 0);
        assert_eq!(container.block(1, 0).unwrap().data, b"/F1 9 Tf (cat) Tj".to_vec());
    }

    #[test]
    fn encoded_blocks_are_rejected() {
        let mut container = MemoryContainer::new();
        container.push_page(
            FontSet::new(),
            vec![ContentBlock {
                data: vec![0x78, 0x9c],
                filters: vec!["FlateDecode".to_string()],
            }],
        );
        let engine = Engine::new("x", Replacement::Literal("y".into()), EngineOptions::default()).unwrap();
        let err = run(&mut container, &engine).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRepresentation(ref msg) if msg.contains("FlateDecode")));
    }

    #[test]
    fn report_only_skips_encoded_blocks() {
        let mut container = container();
        container.push_page(
            FontSet::new(),
            vec![ContentBlock {
                data: vec![0x78, 0x9c],
                filters: vec!["FlateDecode".to_string()],
            }],
        );
        let options = EngineOptions {
            report_only: true,
            ..EngineOptions::default()
        };
        let engine = Engine::new("cat", Replacement::Literal("cow".into()), options).unwrap();
        let report = run(&mut container, &engine).unwrap();
        assert_eq!(report.blocks.len(), 3);
        assert_eq!(report.match_count(), 2);
        assert_eq!(container.block(2, 0).unwrap().data, vec![0x78, 0x9c]);
    }
}
