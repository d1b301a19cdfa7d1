#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionErrorKind {
    #[error("Key already exists in the collection. Use an update operation to replace the value")]
    KeyAlreadyExists,
}
