//! Markdown chunker: splits notes into heading-respecting, overlapped,
//! line-exact segments.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A chunk of Markdown text with its exact 1-indexed source line range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        ChunkOptions {
            max_chars: 1600,
            overlap_chars: 320,
        }
    }
}

pub struct Chunker {
    options: ChunkOptions,
}

impl Default for Chunker {
    fn default() -> Self {
        Chunker::new()
    }
}

impl Chunker {
    pub fn new() -> Self {
        Chunker {
            options: ChunkOptions::default(),
        }
    }

    pub fn with_options(options: ChunkOptions) -> Self {
        Chunker { options }
    }

    #[instrument(skip(self, text))]
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return vec![];
        }

        let sections = split_at_headings(text);
        let mut chunks = Vec::new();
        for section in sections {
            let section_text = section.text();
            if section_text.trim().is_empty() {
                continue;
            }
            if section_text.trim().len() <= self.options.max_chars {
                chunks.push(Chunk {
                    text: section_text.trim().to_string(),
                    start_line: section.start_line,
                    end_line: section.start_line + section.line_count() - 1,
                });
            } else {
                chunks.extend(split_by_size(&section, &self.options));
            }
        }

        debug!("chunked {} chars into {} chunks", text.len(), chunks.len());
        chunks
    }
}

struct Section {
    lines: Vec<String>,
    start_line: u32,
}

impl Section {
    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }
}

fn is_atx_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(|c: char| c.is_whitespace())
}

fn split_at_headings(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_start: u32 = 1;

    for (idx, line) in text.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        if is_atx_heading(line) && !current.is_empty() {
            sections.push(Section {
                lines: std::mem::take(&mut current),
                start_line: current_start,
            });
            current_start = line_no;
        } else if is_atx_heading(line) && current.is_empty() {
            current_start = line_no;
        }
        current.push(line.to_string());
    }
    if !current.is_empty() {
        sections.push(Section {
            lines: current,
            start_line: current_start,
        });
    }
    sections
}

fn split_by_size(section: &Section, options: &ChunkOptions) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut window: Vec<&str> = Vec::new();
    let mut window_start_line = section.start_line;
    let mut window_chars = 0usize;

    let lines: Vec<&str> = section.lines.iter().map(|s| s.as_str()).collect();

    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i];
        let added = line.len() + 1;
        if !window.is_empty() && window_chars + added > options.max_chars {
            let end_line = window_start_line + window.len() as u32 - 1;
            chunks.push(Chunk {
                text: window.join("\n").trim().to_string(),
                start_line: window_start_line,
                end_line,
            });

            // Walk backward over whole lines from the emitted window to seed
            // the overlap for the next window, bounded by overlap_chars.
            let mut overlap_lines: Vec<&str> = Vec::new();
            let mut overlap_chars = 0usize;
            for &l in window.iter().rev() {
                if overlap_chars + l.len() + 1 > options.overlap_chars && !overlap_lines.is_empty() {
                    break;
                }
                overlap_chars += l.len() + 1;
                overlap_lines.push(l);
            }
            overlap_lines.reverse();

            window_start_line = end_line + 1 - overlap_lines.len() as u32;
            window_chars = overlap_lines.iter().map(|l| l.len() + 1).sum();
            window = overlap_lines;
        }
        window.push(line);
        window_chars += added;
        i += 1;
    }

    if !window.is_empty() && !window.iter().all(|l| l.trim().is_empty()) {
        let end_line = window_start_line + window.len() as u32 - 1;
        chunks.push(Chunk {
            text: window.join("\n").trim().to_string(),
            start_line: window_start_line,
            end_line,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(Chunker::new().chunk("").is_empty());
        assert!(Chunker::new().chunk("   \n\n  ").is_empty());
    }

    #[test]
    fn single_small_section_is_one_chunk() {
        let text = "# Title\n\nSome short body text.\n";
        let chunks = Chunker::new().chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert!(chunks[0].text.contains("Title"));
    }

    #[test]
    fn headings_start_new_sections() {
        let text = "# A\n\nbody a\n\n## B\n\nbody b\n";
        let chunks = Chunker::new().chunk(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.starts_with("# A"));
        assert!(chunks[1].text.starts_with("## B"));
    }

    #[test]
    fn oversized_section_splits_with_overlap() {
        let mut body = String::from("# Heading\n\n");
        for i in 0..40 {
            body.push_str(&format!("This is line number {:03} of a long section.\n", i));
        }
        let options = ChunkOptions {
            max_chars: 400,
            overlap_chars: 100,
        };
        let chunks = Chunker::with_options(options).chunk(&body);
        assert!(chunks.len() >= 2);

        // adjacent chunks share at least one full line of overlap
        let tail_of_first: Vec<&str> = chunks[0].text.lines().rev().take(2).collect();
        assert!(tail_of_first
            .iter()
            .any(|line| chunks[1].text.contains(line)));
    }

    #[test]
    fn line_ranges_stay_within_source() {
        let text = "# A\nline1\nline2\nline3\n\n# B\nline4\nline5\n";
        let chunks = Chunker::new().chunk(text);
        for chunk in &chunks {
            assert!(chunk.start_line >= 1);
            assert!(chunk.end_line >= chunk.start_line);
        }
    }
}
