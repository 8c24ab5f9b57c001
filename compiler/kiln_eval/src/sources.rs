//! Final text of every unit constructed in a session.
//!
//! Spans index into a unit's source as it stood when construction ended,
//! injected text included. Errors and warnings record the [`SourceId`] of
//! the unit their spans belong to; [`SourceMap::get`] gives back the text
//! to render them against.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use kiln_diagnostic::Diagnostic;

/// Index of a unit in its interpreter's [`SourceMap`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(u32);

#[derive(Debug)]
pub struct UnitSource {
    name: String,
    path: Option<PathBuf>,
    text: Rc<str>,
}

impl UnitSource {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the unit was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The text spans index into. While the unit is being constructed this
    /// is its original text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How diagnostics refer to the unit: its path, else its name.
    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SourceMap {
    units: Vec<UnitSource>,
}

impl SourceMap {
    pub(crate) fn add(&mut self, name: String, path: Option<PathBuf>, text: Rc<str>) -> SourceId {
        let id = SourceId(u32::try_from(self.units.len()).unwrap_or(u32::MAX));
        self.units.push(UnitSource { name, path, text });
        id
    }

    /// Record the text construction of `id` ended with.
    pub(crate) fn finish(&mut self, id: SourceId, text: Rc<str>) {
        if let Some(unit) = self.units.get_mut(id.0 as usize) {
            unit.text = text;
        }
    }

    pub fn get(&self, id: SourceId) -> Option<&UnitSource> {
        self.units.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// A construction warning and the unit its spans point into.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitWarning {
    pub source: SourceId,
    pub diagnostic: Diagnostic,
}
