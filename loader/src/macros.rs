//! Macros for loader error handling.

/// Creates a [`crate::error::LoaderError`] from an error kind and description.
///
/// An optional third argument is rendered with `to_string` and stored as detail, and
/// `source: err` attaches an originating error.
#[macro_export]
macro_rules! loader_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::LoaderError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::LoaderError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::LoaderError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::LoaderError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates a [`crate::error::LoaderError`] and returns it from the current function.
///
/// Accepts the same arguments as [`loader_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::loader_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::loader_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::loader_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::loader_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
