//! Error types and result definitions for package loading.
//!
//! [`LoaderError`] carries a classification ([`ErrorKind`]), a static description, optional
//! dynamic detail and the callsite where it was raised. The failures of a batch load can be
//! folded into one aggregate with [`LoaderError::aggregate`].

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::iter;
use std::panic::Location;
use std::sync::Arc;

use crate::catalog::CatalogError;

/// Convenient result type for loader operations using [`LoaderError`] as the error type.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Payload stored for single [`LoaderError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Main error type for loader operations.
#[derive(Debug, Clone)]
pub struct LoaderError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// At least two aggregated errors, e.g. one per failed package of a batch.
    Many {
        first: Box<LoaderError>,
        rest: Vec<LoaderError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors that can occur while reconciling packages with a catalog.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Input Errors
    /// A package has no value for any of its identifying fields, or a name looks like an id.
    InvalidInput,
    /// More than one active package exactly matches the identifying fields.
    AmbiguousMatch,
    /// No free package name could be derived from the preferred one.
    NameUnavailable,

    // Catalog Errors
    /// The catalog answered a call with anything other than success or "not found".
    CatalogRequestFailed,
    /// The group a package should be added to does not exist.
    GroupNotFound,
    /// The catalog answered successfully but the payload is unusable.
    InvalidCatalogResponse,

    // Serialization Errors
    SerializationError,
}

impl LoaderError {
    /// Folds `errors` into one error.
    ///
    /// Returns `None` for no errors and the error itself when there is only one.
    #[track_caller]
    pub fn aggregate<I>(errors: I) -> Option<LoaderError>
    where
        I: IntoIterator<Item = LoaderError>,
    {
        let location = Location::caller();
        let mut errors = errors.into_iter();
        let first = errors.next()?;
        let rest: Vec<LoaderError> = errors.collect();

        if rest.is_empty() {
            return Some(first);
        }

        Some(LoaderError {
            repr: ErrorRepr::Many {
                first: Box::new(first),
                rest,
                location,
            },
        })
    }

    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref first, .. } => first.kind(),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { .. } => self.errors().flat_map(|err| err.kinds()).collect(),
        }
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.description.as_ref(),
            ErrorRepr::Many { .. } => "multiple errors",
        }
    }

    /// Returns the dynamic detail, if any.
    ///
    /// For aggregated errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { .. } => self.errors().find_map(|err| err.detail()),
        }
    }

    /// Returns the callsite where this error was created.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward their first error as source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    /// Iterates over the errors of an aggregate, or over this error alone.
    fn errors(&self) -> Box<dyn Iterator<Item = &LoaderError> + '_> {
        match &self.repr {
            ErrorRepr::Single(_) => Box::new(iter::once(self)),
            ErrorRepr::Many { first, rest, .. } => {
                Box::new(iter::once(first.as_ref()).chain(rest.iter()))
            }
        }
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        LoaderError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
            }),
        }
    }
}

impl PartialEq for LoaderError {
    fn eq(&self, other: &LoaderError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { .. }, ErrorRepr::Many { .. }) => self.errors().eq(other.errors()),
            _ => false,
        }
    }
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                write!(f, "[{:?}] {}", payload.kind, payload.description)?;
                if let Some(detail) = payload.detail.as_deref() {
                    write_indented(f, "Detail:", detail)?;
                }

                Ok(())
            }
            ErrorRepr::Many { rest, .. } => {
                write!(f, "[Many] {} errors aggregated", rest.len() + 1)?;

                for (index, error) in self.errors().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    write!(f, "\n  {}. {}", index + 1, lines.next().unwrap_or_default())?;
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { first, .. } => Some(first.as_ref() as &(dyn error::Error + 'static)),
        }
    }
}

fn write_indented(f: &mut fmt::Formatter<'_>, header: &str, body: &str) -> fmt::Result {
    if body.trim().is_empty() {
        return write!(f, "\n  {header} <empty>");
    }

    write!(f, "\n  {header}")?;
    for line in body.lines() {
        write!(f, "\n    {line}")?;
    }

    Ok(())
}

/// Creates a [`LoaderError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for LoaderError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> LoaderError {
        LoaderError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`LoaderError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for LoaderError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> LoaderError {
        LoaderError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts a failed catalog call into [`ErrorKind::CatalogRequestFailed`].
///
/// The status and last payload reported by the catalog end up in the detail.
impl From<CatalogError> for LoaderError {
    #[track_caller]
    fn from(err: CatalogError) -> LoaderError {
        let detail = err.to_string();
        LoaderError::from_components(
            ErrorKind::CatalogRequestFailed,
            Cow::Borrowed("Catalog request failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bail, loader_error};

    fn fails_with_detail(name: &str) -> LoaderResult<()> {
        bail!(
            ErrorKind::InvalidInput,
            "Package has blank identifying fields",
            format!("package '{name}'")
        );
    }

    #[test]
    fn test_single_error_kind_and_detail() {
        let err = fails_with_detail("census").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.description(), "Package has blank identifying fields");
        assert_eq!(err.detail(), Some("package 'census'"));
        assert!(err.to_string().starts_with("[InvalidInput]"));
    }

    #[test]
    fn test_aggregated_errors() {
        let err = LoaderError::aggregate(vec![
            loader_error!(ErrorKind::AmbiguousMatch, "More than one package matches"),
            loader_error!(ErrorKind::CatalogRequestFailed, "Search request failed", "status 500"),
        ])
        .unwrap();

        assert_eq!(err.kind(), ErrorKind::AmbiguousMatch);
        assert_eq!(
            err.kinds(),
            vec![ErrorKind::AmbiguousMatch, ErrorKind::CatalogRequestFailed]
        );
        assert_eq!(err.detail(), Some("status 500"));
        assert!(err.to_string().contains("2 errors aggregated"));
    }

    #[test]
    fn test_single_element_aggregate_is_unwrapped() {
        let err = LoaderError::aggregate(vec![loader_error!(
            ErrorKind::GroupNotFound,
            "Group does not exist"
        )])
        .unwrap();

        assert_eq!(err.kind(), ErrorKind::GroupNotFound);
        assert_eq!(err.description(), "Group does not exist");
        assert!(LoaderError::aggregate(Vec::new()).is_none());
    }

    #[test]
    fn test_catalog_error_conversion_keeps_status() {
        let err: LoaderError = CatalogError::Status {
            status: 500,
            payload: Some("boom".to_owned()),
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::CatalogRequestFailed);
        assert!(err.detail().unwrap().contains("500"));
        assert!(error::Error::source(&err).is_some());
    }
}
