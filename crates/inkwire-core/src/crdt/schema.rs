//! Loro document schema and operations for the stroke log.

use super::convert::{stroke_from_loro, stroke_to_loro};
use crate::stroke::Stroke;
use loro::{ExportMode, LoroDoc, LoroList, LoroMap, LoroResult, LoroValue, VersionVector};

/// Key for the stroke list in the document.
pub const STROKES_KEY: &str = "strokes";

/// The CRDT-backed stroke document shared by all peers in a room.
///
/// Wraps a `LoroDoc` holding a single list container of stroke maps.
/// All mutations are whole-stroke appends or whole-range clears; there
/// are no in-place edits, which is what lets concurrent peers merge
/// without coordination.
pub struct StrokeDoc {
    doc: LoroDoc,
}

impl StrokeDoc {
    /// Create a new empty stroke document.
    pub fn new() -> Self {
        Self { doc: LoroDoc::new() }
    }

    /// Create a stroke document from an exported snapshot.
    pub fn from_snapshot(bytes: &[u8]) -> LoroResult<Self> {
        let doc = LoroDoc::new();
        doc.import(bytes)?;
        Ok(Self { doc })
    }

    fn strokes_list(&self) -> LoroList {
        self.doc.get_list(STROKES_KEY)
    }

    /// Number of strokes currently in the log.
    pub fn len(&self) -> usize {
        self.strokes_list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a stroke at the tail of the log.
    pub fn append(&mut self, stroke: &Stroke) -> LoroResult<()> {
        let list = self.strokes_list();
        let map = list.insert_container(list.len(), LoroMap::new())?;
        stroke_to_loro(stroke, &map)?;
        self.doc.commit();
        Ok(())
    }

    /// Remove the full range of strokes in one transaction.
    pub fn clear(&mut self) -> LoroResult<()> {
        let list = self.strokes_list();
        let len = list.len();
        if len > 0 {
            list.delete(0, len)?;
        }
        self.doc.commit();
        Ok(())
    }

    /// Current ordered stroke sequence. Malformed entries are dropped.
    pub fn strokes(&self) -> Vec<Stroke> {
        let value = self.strokes_list().get_deep_value();
        let mut result = Vec::new();
        if let LoroValue::List(items) = value {
            for item in items.iter() {
                if let LoroValue::Map(map) = item {
                    if let Some(stroke) = stroke_from_loro(map) {
                        result.push(stroke);
                    }
                }
            }
        }
        result
    }

    /// Export the document as a full snapshot.
    pub fn export_snapshot(&self) -> Vec<u8> {
        self.doc.export(ExportMode::Snapshot).unwrap_or_default()
    }

    /// Export incremental updates since a version.
    pub fn export_updates(&self, since: &VersionVector) -> Vec<u8> {
        self.doc.export(ExportMode::updates(since)).unwrap_or_default()
    }

    /// Import updates or a snapshot from another peer.
    pub fn import(&mut self, bytes: &[u8]) -> LoroResult<()> {
        self.doc.import(bytes)?;
        Ok(())
    }

    /// Current version vector of the operation log.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }

    /// This replica's Loro peer id.
    pub fn peer_id(&self) -> u64 {
        self.doc.peer_id()
    }
}

impl Default for StrokeDoc {
    fn default() -> Self {
        Self::new()
    }
}
