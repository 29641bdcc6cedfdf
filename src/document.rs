//! Editable animation documents
//!
//! A [`Document`] owns its composited frames and tags. A [`Workspace`] holds
//! several open documents and tracks which one is active by handle.

use crate::composite::composite;
use crate::compress::Compressor;
use crate::decode::{read_sub_frames, DecodeError, FrameSource, GifSource};
use crate::export::{export_aseprite, export_gif, AsepriteOptions, ExportError, GifOptions};
use crate::frames::{CompositedFrame, DEFAULT_DELAY_MS};
use crate::tags::{validate_tag, Tag, TagError};
use log::debug;
use std::collections::BTreeMap;
use thiserror::Error;

/// Error from a document edit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Frame {index} out of range (document has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },
    #[error("Frame is {actual_w}x{actual_h} but document is {expected_w}x{expected_h}", actual_w = actual.0, actual_h = actual.1, expected_w = expected.0, expected_h = expected.1)]
    SizeMismatch { expected: (u32, u32), actual: (u32, u32) },
    #[error("Cannot remove the last frame of a document")]
    LastFrame,
    #[error("No tag named '{0}'")]
    UnknownTag(String),
    #[error("No open document with id {0}")]
    UnknownDocument(u64),
}

/// An animation being edited.
#[derive(Debug, Clone)]
pub struct Document {
    width: u32,
    height: u32,
    frames: Vec<CompositedFrame>,
    tags: Vec<Tag>,
}

impl Document {
    /// A document with one transparent frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: vec![CompositedFrame::blank(width, height, DEFAULT_DELAY_MS)],
            tags: Vec::new(),
        }
    }

    /// Decode and composite every frame of a source.
    pub fn from_source<S: FrameSource + ?Sized>(source: &S) -> Result<Self, DocumentError> {
        let sub_frames = read_sub_frames(source)?;
        let frames = composite(&sub_frames, source.width(), source.height());
        Ok(Self { width: source.width(), height: source.height(), frames, tags: Vec::new() })
    }

    /// Load a GIF; any decode failure discards the whole document.
    pub fn from_gif_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let source = GifSource::from_bytes(bytes)?;
        let document = Self::from_source(&source)?;
        debug!(
            "loaded document {}x{} with {} frames",
            document.width,
            document.height,
            document.frames.len()
        );
        Ok(document)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[CompositedFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&CompositedFrame> {
        self.frames.get(index)
    }

    pub fn frame_mut(&mut self, index: usize) -> Option<&mut CompositedFrame> {
        self.frames.get_mut(index)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    fn check_index(&self, index: usize) -> Result<(), DocumentError> {
        if index < self.frames.len() {
            Ok(())
        } else {
            Err(DocumentError::FrameOutOfRange { index, count: self.frames.len() })
        }
    }

    /// Add a tag, rejecting bad ranges and overlaps with existing tags.
    pub fn add_tag(&mut self, tag: Tag) -> Result<(), DocumentError> {
        validate_tag(&tag, self.frames.len())?;
        if let Some(existing) = self.tags.iter().find(|t| t.overlaps(&tag)) {
            return Err(TagError::Overlap { first: existing.name.clone(), second: tag.name }.into());
        }
        self.tags.push(tag);
        Ok(())
    }

    pub fn remove_tag(&mut self, name: &str) -> Result<Tag, DocumentError> {
        let pos = self
            .tags
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| DocumentError::UnknownTag(name.to_string()))?;
        Ok(self.tags.remove(pos))
    }

    /// Insert a frame before `index` (`index == frame_count()` appends).
    ///
    /// Tags at or after the insertion point shift; a tag spanning it grows.
    pub fn insert_frame(&mut self, index: usize, frame: CompositedFrame) -> Result<(), DocumentError> {
        if index > self.frames.len() {
            return Err(DocumentError::FrameOutOfRange { index, count: self.frames.len() });
        }
        if (frame.width(), frame.height()) != (self.width, self.height) {
            return Err(DocumentError::SizeMismatch {
                expected: (self.width, self.height),
                actual: (frame.width(), frame.height()),
            });
        }
        self.frames.insert(index, frame);

        let at = index as u16;
        for tag in &mut self.tags {
            if tag.from_frame >= at {
                tag.from_frame += 1;
                tag.to_frame += 1;
            } else if tag.to_frame >= at {
                tag.to_frame += 1;
            }
        }
        Ok(())
    }

    /// Insert a copy of frame `index` right after it.
    pub fn duplicate_frame(&mut self, index: usize) -> Result<(), DocumentError> {
        self.check_index(index)?;
        let copy = self.frames[index].clone();
        self.insert_frame(index + 1, copy)
    }

    /// Remove frame `index`, shrinking or dropping tags that covered it.
    pub fn remove_frame(&mut self, index: usize) -> Result<CompositedFrame, DocumentError> {
        self.check_index(index)?;
        if self.frames.len() == 1 {
            return Err(DocumentError::LastFrame);
        }
        let removed = self.frames.remove(index);

        let at = index as u16;
        self.tags.retain(|tag| !(tag.from_frame == at && tag.to_frame == at));
        for tag in &mut self.tags {
            if tag.from_frame > at {
                tag.from_frame -= 1;
            }
            if tag.to_frame >= at {
                tag.to_frame -= 1;
            }
        }
        Ok(removed)
    }

    /// Move a frame to a new position. Tags keep their frame ranges.
    pub fn move_frame(&mut self, from: usize, to: usize) -> Result<(), DocumentError> {
        self.check_index(from)?;
        self.check_index(to)?;
        let frame = self.frames.remove(from);
        self.frames.insert(to, frame);
        Ok(())
    }

    pub fn set_frame_delay(&mut self, index: usize, delay_ms: u32) -> Result<(), DocumentError> {
        self.check_index(index)?;
        self.frames[index].delay_ms = delay_ms;
        Ok(())
    }

    /// Export as an animated GIF with a quantized global palette.
    pub fn export_gif(&self, options: &GifOptions) -> Result<Vec<u8>, DocumentError> {
        Ok(export_gif(&self.frames, options)?)
    }

    /// Export as an Aseprite archive with full RGBA cels and this document's tags.
    pub fn export_aseprite<C: Compressor + ?Sized>(
        &self,
        compressor: &C,
        options: &AsepriteOptions,
    ) -> Result<Vec<u8>, DocumentError> {
        Ok(export_aseprite(&self.frames, &self.tags, compressor, options)?)
    }
}

/// Handle to a document open in a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of open documents plus the active one.
#[derive(Debug, Default)]
pub struct Workspace {
    documents: BTreeMap<DocumentId, Document>,
    active: Option<DocumentId>,
    next_id: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document and make it active.
    pub fn open(&mut self, document: Document) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id += 1;
        self.documents.insert(id, document);
        self.active = Some(id);
        id
    }

    /// Close a document; if it was active, the lowest remaining id becomes active.
    pub fn close(&mut self, id: DocumentId) -> Result<Document, DocumentError> {
        let document = self.documents.remove(&id).ok_or(DocumentError::UnknownDocument(id.0))?;
        if self.active == Some(id) {
            self.active = self.documents.keys().next().copied();
        }
        Ok(document)
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(&id)
    }

    pub fn set_active(&mut self, id: DocumentId) -> Result<(), DocumentError> {
        if !self.documents.contains_key(&id) {
            return Err(DocumentError::UnknownDocument(id.0));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    pub fn active(&self) -> Option<&Document> {
        self.active.and_then(|id| self.documents.get(&id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Document> {
        self.active.and_then(|id| self.documents.get_mut(&id))
    }

    pub fn ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.documents.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::ZlibCompressor;
    use image::{Rgba, RgbaImage};

    fn solid(color: [u8; 4]) -> CompositedFrame {
        CompositedFrame::new(RgbaImage::from_pixel(2, 2, Rgba(color)), 100)
    }

    fn doc_with_frames(n: usize) -> Document {
        let mut doc = Document::blank(2, 2);
        for i in 1..n {
            doc.insert_frame(i, solid([i as u8, 0, 0, 255])).unwrap();
        }
        doc
    }

    #[test]
    fn test_blank_document() {
        let doc = Document::blank(4, 3);
        assert_eq!(doc.frame_count(), 1);
        assert_eq!((doc.frames()[0].width(), doc.frames()[0].height()), (4, 3));
    }

    #[test]
    fn test_add_tag_rejects_overlap() {
        let mut doc = doc_with_frames(4);
        doc.add_tag(Tag::new("a", 0, 1)).unwrap();
        let err = doc.add_tag(Tag::new("b", 1, 2)).unwrap_err();
        assert!(matches!(err, DocumentError::Tag(TagError::Overlap { .. })));
        doc.add_tag(Tag::new("b", 2, 3)).unwrap();
        assert_eq!(doc.tags().len(), 2);
    }

    #[test]
    fn test_add_tag_rejects_out_of_range() {
        let mut doc = doc_with_frames(2);
        assert!(matches!(
            doc.add_tag(Tag::new("a", 0, 2)),
            Err(DocumentError::Tag(TagError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_insert_frame_size_mismatch() {
        let mut doc = Document::blank(2, 2);
        let err = doc.insert_frame(1, CompositedFrame::blank(3, 3, 100)).unwrap_err();
        assert!(matches!(err, DocumentError::SizeMismatch { .. }));
    }

    #[test]
    fn test_insert_frame_shifts_tags() {
        let mut doc = doc_with_frames(4);
        doc.add_tag(Tag::new("a", 0, 1)).unwrap();
        doc.add_tag(Tag::new("b", 2, 3)).unwrap();
        doc.insert_frame(1, solid([9, 9, 9, 255])).unwrap();
        assert_eq!((doc.tags()[0].from_frame, doc.tags()[0].to_frame), (0, 2));
        assert_eq!((doc.tags()[1].from_frame, doc.tags()[1].to_frame), (3, 4));
    }

    #[test]
    fn test_remove_frame_shrinks_tags() {
        let mut doc = doc_with_frames(5);
        doc.add_tag(Tag::new("a", 0, 1)).unwrap();
        doc.add_tag(Tag::new("b", 2, 2)).unwrap();
        doc.add_tag(Tag::new("c", 3, 4)).unwrap();

        doc.remove_frame(2).unwrap();
        let names: Vec<&str> = doc.tags().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!((doc.tags()[1].from_frame, doc.tags()[1].to_frame), (2, 3));

        doc.remove_frame(0).unwrap();
        assert_eq!((doc.tags()[0].from_frame, doc.tags()[0].to_frame), (0, 0));
    }

    #[test]
    fn test_cannot_remove_last_frame() {
        let mut doc = Document::blank(1, 1);
        assert!(matches!(doc.remove_frame(0), Err(DocumentError::LastFrame)));
    }

    #[test]
    fn test_duplicate_and_move_frame() {
        let mut doc = doc_with_frames(2);
        doc.duplicate_frame(1).unwrap();
        assert_eq!(doc.frame_count(), 3);
        assert_eq!(doc.frames()[1], doc.frames()[2]);

        doc.move_frame(0, 2).unwrap();
        assert_eq!(doc.frames()[2].image.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert!(doc.move_frame(0, 3).is_err());
    }

    #[test]
    fn test_set_frame_delay() {
        let mut doc = Document::blank(1, 1);
        doc.set_frame_delay(0, 250).unwrap();
        assert_eq!(doc.frames()[0].delay_ms, 250);
        assert!(doc.set_frame_delay(1, 10).is_err());
    }

    #[test]
    fn test_gif_round_trip_through_document() {
        let mut doc = Document::blank(2, 2);
        doc.frame_mut(0).unwrap().image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        doc.insert_frame(1, solid([0, 0, 255, 255])).unwrap();

        let bytes = doc.export_gif(&GifOptions::default()).unwrap();
        let reloaded = Document::from_gif_bytes(&bytes).unwrap();
        assert_eq!(reloaded.frame_count(), 2);
        assert_eq!(reloaded.frames()[1].image.get_pixel(1, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_export_aseprite_uses_tags() {
        let mut doc = doc_with_frames(2);
        doc.add_tag(Tag::new("loop", 0, 1)).unwrap();
        let bytes = doc.export_aseprite(&ZlibCompressor::default(), &AsepriteOptions::default()).unwrap();
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize, bytes.len());
    }

    #[test]
    fn test_malformed_gif_discards_document() {
        assert!(matches!(Document::from_gif_bytes(b"not a gif"), Err(DocumentError::Decode(_))));
    }

    #[test]
    fn test_workspace_switching() {
        let mut ws = Workspace::new();
        assert!(ws.active().is_none());

        let a = ws.open(Document::blank(1, 1));
        let b = ws.open(Document::blank(2, 2));
        assert_eq!(ws.active_id(), Some(b));

        ws.set_active(a).unwrap();
        assert_eq!(ws.active().unwrap().width(), 1);
        ws.active_mut().unwrap().set_frame_delay(0, 30).unwrap();
        assert_eq!(ws.get(a).unwrap().frames()[0].delay_ms, 30);
        assert_eq!(ws.get(b).unwrap().frames()[0].delay_ms, 100);

        ws.close(a).unwrap();
        assert_eq!(ws.active_id(), Some(b));
        assert_eq!(ws.ids().collect::<Vec<_>>(), vec![b]);
        assert!(ws.set_active(a).is_err());
        assert!(ws.close(a).is_err());
    }
}
