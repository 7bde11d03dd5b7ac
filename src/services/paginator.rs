use crate::models::{BlockKind, ContentBlock, ReadingTime, TocEntry};
use crate::services::classifier;
use crate::utils::text::estimate_reading_time;

pub const BLOCKS_PER_PAGE: usize = 12;

/// A classified book split into fixed-size pages, plus its table of contents.
#[derive(Debug, Clone)]
pub struct Pagination {
    blocks: Vec<ContentBlock>,
    toc: Vec<TocEntry>,
    total_pages: u32,
    reading_time: ReadingTime,
}

fn page_of(block_index: usize) -> u32 {
    (block_index / BLOCKS_PER_PAGE) as u32 + 1
}

impl Pagination {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        let total_pages = blocks.len().div_ceil(BLOCKS_PER_PAGE).max(1) as u32;
        let toc = blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.kind == BlockKind::Heading)
            .filter_map(|(index, block)| {
                block.section.as_ref().map(|section| TocEntry {
                    section_id: section.section_id.clone(),
                    title: section.title.clone(),
                    page_number: page_of(index),
                })
            })
            .collect();
        Pagination {
            blocks,
            toc,
            total_pages,
            reading_time: ReadingTime {
                words: 0,
                minutes: 0,
            },
        }
    }

    /// Classifies raw text and paginates the result.
    pub fn from_text(text: &str) -> Self {
        let mut pagination = Self::new(classifier::classify(text));
        pagination.reading_time = estimate_reading_time(text);
        tracing::debug!(
            "Paginated {} blocks into {} pages with {} sections",
            pagination.blocks.len(),
            pagination.total_pages,
            pagination.toc.len()
        );
        pagination
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    pub fn reading_time(&self) -> ReadingTime {
        self.reading_time
    }

    /// Blocks on a 1-based page; empty for pages out of range.
    pub fn page(&self, page: u32) -> &[ContentBlock] {
        if page == 0 || page > self.total_pages {
            return &[];
        }
        let start = (page as usize - 1) * BLOCKS_PER_PAGE;
        let end = (start + BLOCKS_PER_PAGE).min(self.blocks.len());
        self.blocks.get(start..end).unwrap_or(&[])
    }

    /// Last heading at or before `page`, so a reader mid-chapter sees the chapter it is in.
    pub fn active_entry(&self, page: u32) -> Option<&TocEntry> {
        self.toc.iter().rev().find(|entry| entry.page_number <= page)
    }
}
