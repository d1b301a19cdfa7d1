mod collection;
mod configuration;
mod disposal;
mod instantiate;
mod instantiator;
mod locate;
mod trail;

pub use collection::CollectionErrorKind;
pub use configuration::ConfigurationErrorKind;
pub use disposal::DisposalErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use locate::{LocateError, LocateErrorKind};
pub use trail::{LocationTrail, TrailEntry};

#[allow(type_alias_bounds)]
pub type InstantiatorResult<T, Err: Into<InstantiateErrorKind> = InstantiateErrorKind> = Result<T, Err>;
