//! Accumulating success-or-errors container.
//!
//! Validating factories collect **every** field problem before reporting, so
//! a caller sees all rejected inputs at once instead of fixing them one by
//! one. Guarded mutators stay fail-fast and use plain [`DomainResult`];
//! `Outcome` is the shape of `create`/`restore` and of anything else that
//! can legitimately report more than one error.
//!
//! A successful `Outcome` may carry no payload at all ([`Outcome::empty`]).
//! That is distinct from a success whose payload happens to be
//! `Option::None`: the former answers `has_data() == false`, the latter
//! `has_data() == true`.
//!
//! [`DomainResult`]: crate::DomainResult

use crate::error::DomainError;

/// Either one value or zero-or-more accumulated [`DomainError`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome<T> {
    data: Option<T>,
    errors: Vec<DomainError>,
}

impl<T> Outcome<T> {
    /// A success carrying `value`.
    #[must_use]
    pub fn success(value: T) -> Self {
        Self {
            data: Some(value),
            errors: Vec::new(),
        }
    }

    /// A success that deliberately carries no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: None,
            errors: Vec::new(),
        }
    }

    /// A failure with a single error.
    #[must_use]
    pub fn error(error: DomainError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    /// A failure with one or more errors.
    #[must_use]
    pub fn from_errors(errors: Vec<DomainError>) -> Self {
        Self { data: None, errors }
    }

    /// Append an error, converting a success into a failure.
    ///
    /// Accumulation only ever appends; prior errors are never overwritten.
    pub fn add_error(&mut self, error: DomainError) {
        self.errors.push(error);
    }

    /// Append many errors at once.
    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = DomainError>) {
        self.errors.extend(errors);
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// The payload, if present. A failed outcome never exposes data even if
    /// one was recorded before errors accumulated.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        if self.has_error() {
            return None;
        }
        self.data.as_ref()
    }

    #[must_use]
    pub fn errors(&self) -> &[DomainError] {
        &self.errors
    }

    /// Collapse into a standard `Result`, surrendering the payload.
    ///
    /// An error-free outcome without data (built via [`Outcome::empty`])
    /// cannot produce a value and reports that as an invariant violation at
    /// the call site instead; callers that expect no payload should use
    /// [`Outcome::has_error`] directly.
    pub fn into_result(self) -> Result<T, Vec<DomainError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        match self.data {
            Some(value) => Ok(value),
            None => Err(Vec::new()),
        }
    }
}

/// Run a fallible builder step, stashing its error instead of its value.
///
/// Returns `Some(value)` on success; on failure pushes onto `errors` and
/// returns `None`. Lets factories validate every field before giving up.
pub(crate) fn collect<T>(
    result: Result<T, DomainError>,
    errors: &mut Vec<DomainError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors.push(error);
            None
        }
    }
}
