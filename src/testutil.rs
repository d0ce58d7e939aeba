//! In-memory document engine for unit tests.

use std::path::{Path, PathBuf};

use crate::engine::lopdf_engine::search_in_span;
use crate::engine::{DocumentEngine, DocumentHandle, PageText, RawSpan, TextBlock, TextLine};
use crate::error::{Error, Result};
use crate::types::Rect;

const GLYPH_WIDTH: f64 = 6.0;
const LINE_Y: f64 = 700.0;
const LINE_HEIGHT: f64 = 12.0;

/// Fake document: a list of pages, each a list of span texts laid out left
/// to right on one line. Flattening blanks the text under every staged
/// rectangle, mirroring what the real engine does to content streams.
pub struct FakeDocument {
    pages: Vec<Vec<RawSpan>>,
    staged: Vec<Vec<Rect>>,
    pub saved_to: Vec<PathBuf>,
    pub flattened_pages: Vec<usize>,
    pub fail_on_save: bool,
}

impl FakeDocument {
    pub fn new(pages: Vec<Vec<&str>>) -> Self {
        let pages: Vec<Vec<RawSpan>> = pages
            .into_iter()
            .map(|texts| {
                let mut x = 10.0;
                texts
                    .into_iter()
                    .map(|text| {
                        let width = text.chars().count() as f64 * GLYPH_WIDTH;
                        let bbox = Rect::new(x, LINE_Y, x + width, LINE_Y + LINE_HEIGHT);
                        x += width + GLYPH_WIDTH;
                        RawSpan {
                            text: text.to_string(),
                            bbox,
                        }
                    })
                    .collect()
            })
            .collect();
        let staged = vec![Vec::new(); pages.len()];
        Self {
            pages,
            staged,
            saved_to: Vec::new(),
            flattened_pages: Vec::new(),
            fail_on_save: false,
        }
    }

    pub fn page_string(&self, page: usize) -> String {
        self.pages[page]
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl DocumentHandle for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<PageText> {
        let spans = self
            .pages
            .get(page)
            .ok_or_else(|| Error::DocumentParse(format!("page {page} out of range")))?
            .clone();
        Ok(PageText {
            blocks: vec![TextBlock {
                lines: vec![TextLine { spans }],
            }],
        })
    }

    fn search(&self, page: usize, needle: &str) -> Result<Vec<Rect>> {
        let mut hits = Vec::new();
        for span in &self.pages[page] {
            search_in_span(&span.text, span.bbox, needle, &mut hits);
        }
        Ok(hits)
    }

    fn stage_redaction(&mut self, page: usize, rect: Rect) {
        if let Some(staged) = self.staged.get_mut(page) {
            staged.push(rect);
        }
    }

    fn staged(&self, page: usize) -> &[Rect] {
        self.staged.get(page).map(Vec::as_slice).unwrap_or(&[])
    }

    fn apply_redactions(&mut self, page: usize) -> Result<usize> {
        let rects = std::mem::take(&mut self.staged[page]);
        if rects.is_empty() {
            return Ok(0);
        }
        self.flattened_pages.push(page);
        for span in self.pages[page].iter_mut() {
            if rects.iter().any(|r| r.intersects(&span.bbox)) {
                span.text = " ".repeat(span.text.chars().count());
            }
        }
        Ok(rects.len())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        if self.fail_on_save {
            return Err(Error::Save("injected save failure".into()));
        }
        self.saved_to.push(path.to_path_buf());
        Ok(())
    }
}

/// Canned classification client for orchestrator tests.
pub struct StubClassifier {
    response: std::result::Result<String, String>,
}

impl StubClassifier {
    pub fn ok(body: &str) -> Self {
        Self {
            response: Ok(body.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl crate::detect::semantic::ClassificationClient for StubClassifier {
    async fn classify(&self, _prompt: &str) -> Result<String> {
        self.response.clone().map_err(Error::Classification)
    }
}

/// Engine wrapper handing out pre-built fakes; `open` fails once the
/// prepared handles run out, which doubles as the unreadable-document case.
pub struct FakeEngine {
    handles: std::sync::Mutex<Vec<FakeDocument>>,
}

impl FakeEngine {
    pub fn new(handles: Vec<FakeDocument>) -> Self {
        Self {
            handles: std::sync::Mutex::new(handles),
        }
    }
}

impl DocumentEngine for FakeEngine {
    type Handle = FakeDocument;

    fn open(&self, path: &Path) -> Result<FakeDocument> {
        let mut handles = self.handles.lock().unwrap();
        if handles.is_empty() {
            return Err(Error::DocumentParse(format!(
                "cannot open {}",
                path.display()
            )));
        }
        Ok(handles.remove(0))
    }
}
