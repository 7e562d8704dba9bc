use crate::runtime::plan::CopyRequest;

/// Server-side copy against the storage backend. Overwrite semantics on an
/// existing destination belong to the backend.
pub trait ObjectCopier {
    fn copy_object(&self, request: &CopyRequest) -> Result<(), String>;
}
