//! Pure design-document transforms.
//!
//! A design document is kept as a raw JSON object so that members this crate
//! does not know about (`language`, `filters`, `_id`, `_rev`, ...) survive a
//! round trip untouched. Patches install or overwrite named entries only.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::couch::JsonObject;

const VIEWS: &str = "views";
const LISTS: &str = "lists";
const VALIDATE_DOC_UPDATE: &str = "validate_doc_update";

/// Reduce function attached to a view by a patch.
///
/// Reduces already stored in a design document are kept as raw JSON, so
/// `_sum`, `_stats` and custom sources survive untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceKind {
    /// Built-in `_count`.
    Count,
}

impl ReduceKind {
    /// The value stored in the design document's `reduce` member.
    #[must_use]
    pub const fn source(self) -> &'static str {
        match self {
            Self::Count => "_count",
        }
    }
}

/// A map function plus optional reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDefinition {
    /// JavaScript map function source.
    pub map: &'static str,
    /// Optional reduce.
    pub reduce: Option<ReduceKind>,
}

impl ViewDefinition {
    /// A view whose rows are counted by `_count`.
    #[must_use]
    pub const fn counted(map: &'static str) -> Self {
        Self {
            map,
            reduce: Some(ReduceKind::Count),
        }
    }

    /// The JSON shape stored under `views.<name>`.
    #[must_use]
    pub fn to_json(self) -> Value {
        let mut view = Map::new();
        view.insert("map".to_owned(), Value::String(self.map.to_owned()));
        if let Some(reduce) = self.reduce {
            view.insert("reduce".to_owned(), Value::String(reduce.source().to_owned()));
        }
        Value::Object(view)
    }
}

/// One edit to a design document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignPatch {
    /// Install or overwrite a view by name.
    InstallView {
        /// View name.
        name: &'static str,
        /// New definition.
        view: ViewDefinition,
    },
    /// Set the reduce of a view that must already exist.
    SetReduce {
        /// View name.
        view: &'static str,
        /// Reduce to attach.
        reduce: ReduceKind,
    },
    /// Install or overwrite a list function by name.
    InstallList {
        /// List function name.
        name: &'static str,
        /// JavaScript source.
        source: &'static str,
    },
    /// Replace the validation function.
    SetValidation {
        /// JavaScript source.
        source: String,
    },
}

/// Why a transform could not be applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    /// A patch edits a view the document does not define.
    #[error("view {view} does not exist")]
    MissingView {
        /// The absent view.
        view: String,
    },
    /// A member that must be an object has another JSON type.
    #[error("design document member `{member}` is not an object")]
    MalformedMember {
        /// The offending member.
        member: &'static str,
    },
}

/// Computes the new design document from the existing one (or none).
///
/// The result always has a `views` object. Entries not named by a patch are
/// left exactly as they were; the revision token is carried over with every
/// other member.
///
/// # Errors
///
/// Returns [`PatchError`] when a patch cannot apply to the document's
/// current shape.
pub fn apply_patches(
    existing: Option<&JsonObject>,
    patches: &[DesignPatch],
) -> Result<JsonObject, PatchError> {
    let mut document = existing.cloned().unwrap_or_default();
    object_member(&mut document, VIEWS)?;

    for patch in patches {
        match patch {
            DesignPatch::InstallView { name, view } => {
                object_member(&mut document, VIEWS)?.insert((*name).to_owned(), view.to_json());
            }
            DesignPatch::SetReduce { view, reduce } => {
                let views = object_member(&mut document, VIEWS)?;
                let Some(Value::Object(definition)) = views.get_mut(*view) else {
                    return Err(PatchError::MissingView {
                        view: (*view).to_owned(),
                    });
                };
                definition.insert("reduce".to_owned(), Value::String(reduce.source().to_owned()));
            }
            DesignPatch::InstallList { name, source } => {
                object_member(&mut document, LISTS)?
                    .insert((*name).to_owned(), Value::String((*source).to_owned()));
            }
            DesignPatch::SetValidation { source } => {
                document.insert(VALIDATE_DOC_UPDATE.to_owned(), Value::String(source.clone()));
            }
        }
    }

    Ok(document)
}

/// Returns the object stored under `member`, creating it when absent.
fn object_member<'doc>(
    document: &'doc mut JsonObject,
    member: &'static str,
) -> Result<&'doc mut JsonObject, PatchError> {
    match document
        .entry(member)
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(object) => Ok(object),
        _ => Err(PatchError::MalformedMember { member }),
    }
}
