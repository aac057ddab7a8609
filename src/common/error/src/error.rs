//! Core error types for Quarry.

use std::fmt;

use thiserror::Error;

/// Result type alias using `QuarryError`.
pub type QuarryResult<T> = std::result::Result<T, QuarryError>;

/// Numeric code reported for a successful operation.
pub const SUCCESS: i32 = 0;

/// Failure categories raised by the product backend and its cursor.
///
/// Every kind carries the numeric code a host sees in an error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StorageErrorKind {
    OutOfMemory,
    FileNotFound,
    FileOpen,
    FileRead,
    InvalidArgument,
    InvalidIndex,
    InvalidName,
    InvalidFormat,
    InvalidDatetime,
    InvalidType,
    ArrayNumDimsMismatch,
    ArrayOutOfBounds,
    NoParent,
    UnsupportedProduct,
    Product,
    OutOfBoundsRead,
    DataDefinition,
    Expression,
}

impl StorageErrorKind {
    /// Numeric code of this kind.
    pub const fn code(self) -> i32 {
        match self {
            Self::OutOfMemory => -1,
            Self::FileNotFound => -20,
            Self::FileOpen => -21,
            Self::FileRead => -22,
            Self::InvalidArgument => -100,
            Self::InvalidIndex => -101,
            Self::InvalidName => -102,
            Self::InvalidFormat => -103,
            Self::InvalidDatetime => -104,
            Self::InvalidType => -105,
            Self::ArrayNumDimsMismatch => -106,
            Self::ArrayOutOfBounds => -107,
            Self::NoParent => -108,
            Self::UnsupportedProduct => -200,
            Self::Product => -300,
            Self::OutOfBoundsRead => -301,
            Self::DataDefinition => -400,
            Self::Expression => -401,
        }
    }

    /// Generic description used when no specific message was recorded.
    pub const fn description(self) -> &'static str {
        match self {
            Self::OutOfMemory => "out of memory",
            Self::FileNotFound => "file not found",
            Self::FileOpen => "could not open file",
            Self::FileRead => "could not read from file",
            Self::InvalidArgument => "invalid argument",
            Self::InvalidIndex => "invalid index argument",
            Self::InvalidName => "invalid name argument",
            Self::InvalidFormat => "invalid format in argument",
            Self::InvalidDatetime => "invalid date/time argument",
            Self::InvalidType => "invalid type",
            Self::ArrayNumDimsMismatch => "incorrect number of dimensions argument",
            Self::ArrayOutOfBounds => "array index out of bounds",
            Self::NoParent => "cursor has no parent",
            Self::UnsupportedProduct => "unsupported product file",
            Self::Product => "product error",
            Self::OutOfBoundsRead => "trying to read beyond the end of the file",
            Self::DataDefinition => "error in data definition",
            Self::Expression => "error in expression",
        }
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Core error type for Quarry operations.
///
/// The engine-level variants mirror the failures a host can provoke through
/// its arguments; [`QuarryError::Storage`] passes backend failures through
/// with their own code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuarryError {
    /// A scalar numeric argument was required.
    #[error("scalar numerical argument expected")]
    ExpectedScalar,

    /// The first argument is neither a data handle nor a product id.
    #[error("expected a DATAHANDLE structure or LONG64 product-file identifier")]
    ExpectedDataHandle,

    /// The first argument is an array of several data handles.
    #[error(
        "expected a single DATAHANDLE structure; use (handles[i], ...) instead of (handles, i, ...)"
    )]
    ExpectedDataHandleGotArray,

    /// A selector argument has an unsupported shape or type.
    #[error("{0}")]
    WrongDataItemSelector(String),

    /// An index vector has more components than allowed or than the array has dimensions.
    #[error("array specification (integer-type vector) has too many elements")]
    WrongNumDimsArray,

    /// A single integer selector was applied to something other than an array.
    #[error("single-integer data-item selector may only be used for one-dimensional arrays")]
    WrongDataItemSelectorInteger,

    /// Unknown option name.
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    /// Every product slot is occupied.
    #[error("maximum number of simultaneously opened product files reached")]
    MaxOpenFiles,

    /// Product id was zero or negative.
    #[error("the product-id must be a positive integer")]
    ProdIdNonPositive,

    /// Product id does not refer to an open product.
    #[error("the LONG64 product ID specified does not refer to a currently opened file")]
    ProdIdNoGood,

    /// Size requested for something that is not an array.
    #[error("size can only be determined for arrays")]
    SizeOfNonArray,

    /// Dimensionality of a selector does not match the array.
    #[error("incorrect number of dimensions")]
    ArrayNumDimsMismatch,

    /// More than one wildcard selector in one path.
    #[error("variable index specified for more than one field")]
    MultipleVariableIndices,

    /// Named record field is absent from this instance.
    #[error("record field {0} is not available")]
    RecordFieldNotAvailable(String),

    /// Operation requires a record but the path ends elsewhere.
    #[error("{0}")]
    NotARecord(String),

    /// Expression evaluates to nothing.
    #[error("cannot evaluate void expressions")]
    VoidExpressionNotSupported,

    /// Failure raised by the product backend.
    #[error("{message}")]
    Storage {
        kind: StorageErrorKind,
        message: String,
    },

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Internal error (bug in Quarry).
    #[error("InternalError: {0}")]
    InternalError(String),

    #[cfg(feature = "python")]
    /// Python interop error.
    #[error("PyO3Error: {0}")]
    PyO3Error(#[from] pyo3::PyErr),
}

impl QuarryError {
    /// Numeric code reported to hosts.
    pub fn code(&self) -> i32 {
        match self {
            Self::ExpectedScalar => -901,
            Self::ExpectedDataHandle => -904,
            Self::ExpectedDataHandleGotArray => -905,
            Self::WrongDataItemSelector(_) => -907,
            Self::WrongNumDimsArray => -908,
            Self::WrongDataItemSelectorInteger => -909,
            Self::UnknownOption(_) => -910,
            Self::MaxOpenFiles => -920,
            Self::ProdIdNoGood => -922,
            Self::ProdIdNonPositive => -923,
            Self::SizeOfNonArray => -990,
            Self::ArrayNumDimsMismatch => -991,
            Self::MultipleVariableIndices => -992,
            Self::RecordFieldNotAvailable(_) => -993,
            Self::NotARecord(_) => -994,
            Self::VoidExpressionNotSupported => -995,
            Self::Storage { kind, .. } => kind.code(),
            Self::IoError(err) => match err.kind() {
                std::io::ErrorKind::NotFound => StorageErrorKind::FileNotFound.code(),
                _ => StorageErrorKind::FileRead.code(),
            },
            Self::SerdeJsonError(_) => StorageErrorKind::DataDefinition.code(),
            Self::InternalError(_) => -999,
            #[cfg(feature = "python")]
            Self::PyO3Error(_) => StorageErrorKind::InvalidArgument.code(),
        }
    }

    /// Create a backend error of the given kind.
    pub fn storage<S: Into<String>>(kind: StorageErrorKind, msg: S) -> Self {
        let message = msg.into();
        let message = if message.is_empty() {
            kind.description().to_string()
        } else {
            message
        };
        Self::Storage { kind, message }
    }

    /// Create an `InvalidArgument` backend error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::storage(StorageErrorKind::InvalidArgument, msg)
    }

    /// Create an `InvalidType` backend error.
    pub fn invalid_type<S: Into<String>>(msg: S) -> Self {
        Self::storage(StorageErrorKind::InvalidType, msg)
    }

    /// Create a `DataDefinition` backend error.
    pub fn data_definition<S: Into<String>>(msg: S) -> Self {
        Self::storage(StorageErrorKind::DataDefinition, msg)
    }

    /// Create an `Expression` backend error.
    pub fn expression<S: Into<String>>(msg: S) -> Self {
        Self::storage(StorageErrorKind::Expression, msg)
    }

    /// Create a `WrongDataItemSelector` error with the default message.
    pub fn wrong_selector() -> Self {
        Self::WrongDataItemSelector(
            "only strings, integer-type scalars, or integer-type vectors may be used to select a data item"
                .to_string(),
        )
    }

    /// Create a `NotARecord` error with the default message.
    pub fn not_a_record() -> Self {
        Self::NotARecord("arguments do not point to a record".to_string())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Backend kind, if this error came from the product layer.
    pub fn storage_kind(&self) -> Option<StorageErrorKind> {
        match self {
            Self::Storage { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Ensure a condition holds, returning the given error if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $kind:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::QuarryError::storage(
                $crate::StorageErrorKind::$kind,
                format!($($msg)*),
            ));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

/// Return early with a backend error of the given kind.
#[macro_export]
macro_rules! storage_err {
    ($kind:ident: $($arg:tt)*) => {
        return Err($crate::QuarryError::storage(
            $crate::StorageErrorKind::$kind,
            format!($($arg)*),
        ))
    };
}
