use alloc::{format, string::String, vec::Vec};

#[derive(thiserror::Error, Debug)]
pub enum DisposalErrorKind {
    #[error("Disposal scope is closed and doesn't accept new registrations")]
    Closed,
    #[error("Disposing {name} failed: {source}")]
    Failed {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("{} disposables failed, first: {}", .0.len(), first_failure(.0))]
    Aggregate(Vec<DisposalErrorKind>),
}

impl DisposalErrorKind {
    /// Flattens nested aggregates into the list of individual failures.
    #[must_use]
    pub fn failures(&self) -> Vec<&DisposalErrorKind> {
        match self {
            Self::Aggregate(errors) => errors.iter().flat_map(DisposalErrorKind::failures).collect(),
            other => alloc::vec![other],
        }
    }
}

fn first_failure(errors: &[DisposalErrorKind]) -> String {
    errors.first().map_or_else(|| String::from("-"), |err| format!("{err}"))
}
