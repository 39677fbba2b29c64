//! PDF composition and lenient merging on top of `lopdf`.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use wardbook_application::{DocumentCompositor, DocumentPart, MergedDocument, RejectedPart};
use wardbook_core::{AppError, AppResult};


const PDF_VERSION: &str = "1.7";
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 15.0;
const SUBHEADING_SIZE: f32 = 12.0;
const LINE_SPACING: f32 = 1.4;
// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f32 = 0.5;
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Composes line-oriented report markup into paged PDF documents.
///
/// Markup lines starting with `# ` are headings and lines starting with
/// `## ` are subheadings. Every other non-blank line is body text, wrapped
/// to the page width. Blank lines add vertical space. Text is set in the
/// standard Helvetica faces; characters outside Latin-1 print as `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfDocumentCompositor;

impl LopdfDocumentCompositor {
    /// Creates a compositor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStyle {
    Heading,
    Subheading,
    Body,
}

impl LineStyle {
    fn font(self) -> &'static str {
        match self {
            Self::Heading | Self::Subheading => "F2",
            Self::Body => "F1",
        }
    }

    fn size(self) -> f32 {
        match self {
            Self::Heading => HEADING_SIZE,
            Self::Subheading => SUBHEADING_SIZE,
            Self::Body => BODY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LayoutItem {
    Text { style: LineStyle, text: String },
    Gap,
}

fn layout_items(markup: &str) -> Vec<LayoutItem> {
    let mut items = Vec::new();
    for line in markup.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !matches!(items.last(), None | Some(LayoutItem::Gap)) {
                items.push(LayoutItem::Gap);
            }
            continue;
        }

        let (style, text) = if let Some(text) = line.strip_prefix("## ") {
            (LineStyle::Subheading, text)
        } else if let Some(text) = line.strip_prefix("# ") {
            (LineStyle::Heading, text)
        } else {
            (LineStyle::Body, line)
        };

        for wrapped in wrap_line(text.trim(), style) {
            items.push(LayoutItem::Text {
                style,
                text: wrapped,
            });
        }
    }

    items
}

fn wrap_line(text: &str, style: LineStyle) -> Vec<String> {
    let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (style.size() * GLYPH_WIDTH_RATIO)) as usize;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_owned();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(index, _)| index);
            let rest = word.split_off(split_at);
            lines.push(word);
            word = rest;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word.as_str());
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|character| u8::try_from(u32::from(character)).unwrap_or(b'?'))
        .collect()
}

fn paginate(items: Vec<LayoutItem>) -> Vec<Vec<Operation>> {
    let mut pages = Vec::new();
    let mut operations = Vec::new();
    let mut cursor = PAGE_HEIGHT - MARGIN;

    for item in items {
        let (advance, text) = match item {
            LayoutItem::Gap => (BODY_SIZE * 0.8, None),
            LayoutItem::Text { style, text } => (style.size() * LINE_SPACING, Some((style, text))),
        };

        if cursor - advance < MARGIN && !operations.is_empty() {
            pages.push(std::mem::take(&mut operations));
            cursor = PAGE_HEIGHT - MARGIN;
            if text.is_none() {
                continue;
            }
        }
        cursor -= advance;

        if let Some((style, text)) = text {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![style.font().into(), style.size().into()]),
                Operation::new("Td", vec![MARGIN.into(), cursor.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(latin1_bytes(&text), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ]);
        }
    }

    if !operations.is_empty() || pages.is_empty() {
        pages.push(operations);
    }
    pages
}

fn new_document() -> (Document, ObjectId) {
    let mut document = Document::with_version(PDF_VERSION);
    let pages_id = document.new_object_id();
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0_i64,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    (document, pages_id)
}

fn append_page_refs(
    document: &mut Document,
    pages_id: ObjectId,
    page_ids: &[ObjectId],
) -> Result<(), lopdf::Error> {
    let pages = document.get_object_mut(pages_id)?.as_dict_mut()?;
    let mut kids = pages.get(b"Kids")?.as_array()?.clone();
    let count = pages.get(b"Count")?.as_i64()?;
    kids.extend(page_ids.iter().copied().map(Object::Reference));
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", count + page_ids.len() as i64);

    for page_id in page_ids {
        if let Ok(Object::Dictionary(page)) = document.get_object_mut(*page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(())
}

fn save(document: &mut Document) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|error| error.to_string())?;
    Ok(bytes)
}

fn compose_document(markup: &str) -> Result<Vec<u8>, String> {
    let (mut document, pages_id) = new_document();
    let regular_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut page_ids = Vec::new();
    for operations in paginate(layout_items(markup)) {
        let content = Content { operations }
            .encode()
            .map_err(|error| error.to_string())?;
        let content_id = document.add_object(Stream::new(dictionary! {}, content));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id);
    }
    append_page_refs(&mut document, pages_id, &page_ids).map_err(|error| error.to_string())?;

    save(&mut document)
}

/// Copies objects between documents, remapping references.
///
/// Each source object is copied at most once. The target id is reserved
/// before recursing so reference cycles terminate.
struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        let target_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, target_id);

        let object = self.source.get_object(source_id)?.clone();
        let remapped = self.remap_references(object)?;
        self.target.objects.insert(target_id, remapped);

        Ok(target_id)
    }

    /// Reserves target ids for every page so references between pages, and
    /// annotation `/P` back-links, resolve to the flattened copies.
    fn reserve_pages(&mut self, page_ids: &[ObjectId]) {
        for page_id in page_ids {
            let target_id = self.target.add_object(Object::Null);
            self.id_map.insert(*page_id, target_id);
        }
    }

    /// Copies a page without its parent link, pulling inherited attributes
    /// down from the source page tree.
    fn copy_page(&mut self, page_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        let mut page = self.source.get_dictionary(page_id)?.clone();
        let target_id = match self.id_map.get(&page_id) {
            Some(target_id) => *target_id,
            None => {
                let target_id = self.target.add_object(Object::Null);
                self.id_map.insert(page_id, target_id);
                target_id
            }
        };

        for key in INHERITABLE_PAGE_KEYS {
            if !page.has(key)
                && let Some(value) = inherited_attribute(self.source, &page, key)
            {
                page.set(key.to_vec(), value);
            }
        }
        page.remove(b"Parent");

        let remapped = self.remap_references(Object::Dictionary(page))?;
        self.target.objects.insert(target_id, remapped);

        Ok(target_id)
    }

    fn remap_references(&mut self, object: Object) -> Result<Object, lopdf::Error> {
        match object {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => items
                .into_iter()
                .map(|item| self.remap_references(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Object::Array),
            Object::Dictionary(dictionary) => {
                Ok(Object::Dictionary(self.remap_dictionary(dictionary)?))
            }
            Object::Stream(mut stream) => {
                stream.dict = self.remap_dictionary(stream.dict)?;
                Ok(Object::Stream(stream))
            }
            primitive => Ok(primitive),
        }
    }

    fn remap_dictionary(&mut self, mut dictionary: Dictionary) -> Result<Dictionary, lopdf::Error> {
        for (_, value) in dictionary.iter_mut() {
            let original = std::mem::replace(value, Object::Null);
            *value = self.remap_references(original)?;
        }
        Ok(dictionary)
    }
}

fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent_id = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Bounded walk; malformed trees may loop.
    for _ in 0..32 {
        let parent = source.get_dictionary(parent_id?).ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        parent_id = parent.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn append_source(target: &mut Document, pages_id: ObjectId, bytes: &[u8]) -> Result<usize, String> {
    let source = Document::load_mem(bytes).map_err(|error| error.to_string())?;
    let source_pages = source.get_pages();
    if source_pages.is_empty() {
        return Err("document has no pages".to_owned());
    }

    // Copy into a scratch document first so a failing part leaves the
    // target untouched.
    let mut scratch = Document::with_version(PDF_VERSION);
    scratch.max_id = target.max_id;
    let mut copier = ObjectCopier::new(&source, &mut scratch);
    let source_page_ids: Vec<ObjectId> = source_pages.into_values().collect();
    copier.reserve_pages(&source_page_ids);
    let mut page_ids = Vec::with_capacity(source_page_ids.len());
    for page_id in source_page_ids {
        page_ids.push(copier.copy_page(page_id).map_err(|error| error.to_string())?);
    }

    target.max_id = scratch.max_id;
    target.objects.extend(scratch.objects);
    append_page_refs(target, pages_id, &page_ids).map_err(|error| error.to_string())?;

    Ok(page_ids.len())
}

impl DocumentCompositor for LopdfDocumentCompositor {
    fn compose(&self, markup: &str) -> AppResult<Vec<u8>> {
        compose_document(markup)
            .map_err(|error| AppError::Render(format!("failed to compose document: {error}")))
    }

    fn merge(&self, parts: Vec<DocumentPart>) -> AppResult<MergedDocument> {
        let (mut target, pages_id) = new_document();
        let mut page_count = 0;
        let mut merged_labels = Vec::new();
        let mut rejected = Vec::new();

        for part in parts {
            match append_source(&mut target, pages_id, &part.bytes) {
                Ok(pages) => {
                    page_count += pages;
                    merged_labels.push(part.label);
                }
                Err(reason) => rejected.push(RejectedPart {
                    label: part.label,
                    reason,
                }),
            }
        }

        if merged_labels.is_empty() {
            return Ok(MergedDocument {
                bytes: Vec::new(),
                page_count: 0,
                merged_labels,
                rejected,
            });
        }

        let bytes = save(&mut target)
            .map_err(|error| AppError::Render(format!("failed to write merged document: {error}")))?;

        Ok(MergedDocument {
            bytes,
            page_count,
            merged_labels,
            rejected,
        })
    }
}
