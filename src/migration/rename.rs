//! Field renames applied to ordinary documents.

use serde_json::Value;

use crate::couch::JsonObject;

/// Moves a field to a new name on documents of a given `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRename {
    /// Old field name.
    pub from: &'static str,
    /// New field name.
    pub to: &'static str,
    /// Required value of the document's `type` field, or `None` for any.
    pub document_type: Option<&'static str>,
}

impl FieldRename {
    /// Renames `from` to `to` on documents of any type.
    #[must_use]
    pub const fn any(from: &'static str, to: &'static str) -> Self {
        Self {
            from,
            to,
            document_type: None,
        }
    }

    /// Renames `from` to `to` on documents whose `type` is `document_type`.
    #[must_use]
    pub const fn for_type(document_type: &'static str, from: &'static str, to: &'static str) -> Self {
        Self {
            from,
            to,
            document_type: Some(document_type),
        }
    }

    fn applies_to(&self, document: &JsonObject) -> bool {
        self.document_type.is_none_or(|expected| {
            document.get("type").and_then(Value::as_str) == Some(expected)
        })
    }

    /// Applies the rename in place and reports whether the document changed.
    ///
    /// When both names are present the old value wins and the old name is
    /// removed, so the document never ends up carrying both.
    pub fn apply(&self, document: &mut JsonObject) -> bool {
        if !self.applies_to(document) {
            return false;
        }
        let Some(value) = document.remove(self.from) else {
            return false;
        };
        document.insert(self.to.to_owned(), value);
        true
    }
}

/// Applies every rename and reports whether any of them changed the document.
pub fn apply_renames(renames: &[FieldRename], document: &mut JsonObject) -> bool {
    renames
        .iter()
        .fold(false, |modified, rename| rename.apply(document) || modified)
}
