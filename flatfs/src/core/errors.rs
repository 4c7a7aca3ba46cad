// SPDX-License-Identifier: MIT

use core::fmt;

pub use flatio::errors::*;

/// Stable classification of every failure a volume operation can report.
///
/// Callers (the shell, tests) match on the kind; the layered error values
/// below keep the detail and the cause chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsErrorKind {
    InvalidPath,
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    ParentNotFound,
    TableFull,
    OutOfSpace,
    NotEmpty,
    Corrupted,
    DeviceError,
    Other,
}

impl FsErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FsErrorKind::InvalidPath => "invalid path",
            FsErrorKind::NotFound => "not found",
            FsErrorKind::NotADirectory => "not a directory",
            FsErrorKind::IsADirectory => "is a directory",
            FsErrorKind::AlreadyExists => "already exists",
            FsErrorKind::ParentNotFound => "parent not found",
            FsErrorKind::TableFull => "metadata table full",
            FsErrorKind::OutOfSpace => "out of space",
            FsErrorKind::NotEmpty => "directory not empty",
            FsErrorKind::Corrupted => "corrupted volume",
            FsErrorKind::DeviceError => "device error",
            FsErrorKind::Other => "other error",
        }
    }
}

impl fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsAllocatorError {
    IO(BlockIOError),
    OutOfSpace,
    InvalidRun,
    Other(&'static str),
}

impl FsAllocatorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsAllocatorError::IO(_) => "IO error",
            FsAllocatorError::OutOfSpace => "No contiguous run of free blocks is large enough",
            FsAllocatorError::InvalidRun => "Block run outside the data region",
            FsAllocatorError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsAllocatorError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }

    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsAllocatorError::IO(_) => FsErrorKind::DeviceError,
            FsAllocatorError::OutOfSpace => FsErrorKind::OutOfSpace,
            FsAllocatorError::InvalidRun => FsErrorKind::Corrupted,
            FsAllocatorError::Other(_) => FsErrorKind::Other,
        }
    }
}

impl fmt::Display for FsAllocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsTableError {
    IO(BlockIOError),
    InvalidPath(&'static str),
    NotFound,
    NotADirectory,
    IsADirectory,
    AlreadyExists,
    ParentNotFound,
    TableFull,
    NotEmpty,
    Corrupted(&'static str),
    Other(&'static str),
}

impl FsTableError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsTableError::IO(_) => "IO error",
            FsTableError::InvalidPath(msg) => msg,
            FsTableError::NotFound => "No such file or directory",
            FsTableError::NotADirectory => "Not a directory",
            FsTableError::IsADirectory => "Is a directory",
            FsTableError::AlreadyExists => "Entry already exists",
            FsTableError::ParentNotFound => "Parent directory does not exist",
            FsTableError::TableFull => "Metadata table is full",
            FsTableError::NotEmpty => "Directory not empty",
            FsTableError::Corrupted(msg) => msg,
            FsTableError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsTableError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }

    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsTableError::IO(_) => FsErrorKind::DeviceError,
            FsTableError::InvalidPath(_) => FsErrorKind::InvalidPath,
            FsTableError::NotFound => FsErrorKind::NotFound,
            FsTableError::NotADirectory => FsErrorKind::NotADirectory,
            FsTableError::IsADirectory => FsErrorKind::IsADirectory,
            FsTableError::AlreadyExists => FsErrorKind::AlreadyExists,
            FsTableError::ParentNotFound => FsErrorKind::ParentNotFound,
            FsTableError::TableFull => FsErrorKind::TableFull,
            FsTableError::NotEmpty => FsErrorKind::NotEmpty,
            FsTableError::Corrupted(_) => FsErrorKind::Corrupted,
            FsTableError::Other(_) => FsErrorKind::Other,
        }
    }
}

impl fmt::Display for FsTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFormatterError {
    IO(BlockIOError),
    Table(FsTableError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsFormatterError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatterError::IO(_) => "IO error",
            FsFormatterError::Table(_) => "Metadata table error",
            FsFormatterError::Invalid(msg) => msg,
            FsFormatterError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsFormatterError::IO(e) => Some(FsError::IO(*e)),
            FsFormatterError::Table(e) => Some(FsError::Table(*e)),
            _ => None,
        }
    }

    /// Geometry that cannot describe a volume (or does not match the one
    /// on the device) is reported as corruption.
    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsFormatterError::IO(_) => FsErrorKind::DeviceError,
            FsFormatterError::Table(e) => e.kind(),
            FsFormatterError::Invalid(_) => FsErrorKind::Corrupted,
            FsFormatterError::Other(_) => FsErrorKind::Other,
        }
    }
}

impl fmt::Display for FsFormatterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCheckerError {
    IO(BlockIOError),
    Table(FsTableError),
    Allocator(FsAllocatorError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsCheckerError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCheckerError::IO(_) => "IO error",
            FsCheckerError::Table(_) => "Metadata table error",
            FsCheckerError::Allocator(_) => "Allocator error",
            FsCheckerError::Invalid(msg) => msg,
            FsCheckerError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsCheckerError::IO(e) => Some(FsError::IO(*e)),
            FsCheckerError::Table(e) => Some(FsError::Table(*e)),
            FsCheckerError::Allocator(e) => Some(FsError::Allocator(*e)),
            _ => None,
        }
    }

    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsCheckerError::IO(_) => FsErrorKind::DeviceError,
            FsCheckerError::Table(e) => e.kind(),
            FsCheckerError::Allocator(e) => e.kind(),
            FsCheckerError::Invalid(_) => FsErrorKind::Corrupted,
            FsCheckerError::Other(_) => FsErrorKind::Other,
        }
    }
}

impl fmt::Display for FsCheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(BlockIOError),
    Allocator(FsAllocatorError),
    Table(FsTableError),
    Formatter(FsFormatterError),
    Checker(FsCheckerError),
    Other(&'static str),
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        let mut current = self.source();
        while let Some(src) = current {
            write!(f, "\n  caused by: {}", src.msg())?;
            current = src.source();
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FsError {}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Allocator(e) => e.msg(),
            FsError::Table(e) => e.msg(),
            FsError::Formatter(e) => e.msg(),
            FsError::Checker(e) => e.msg(),
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Allocator(e) => e.source(),
            FsError::Table(e) => e.source(),
            FsError::Formatter(e) => e.source(),
            FsError::Checker(e) => e.source(),
            FsError::IO(_) => None,
            FsError::Other(_) => None,
        }
    }

    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsError::IO(_) => FsErrorKind::DeviceError,
            FsError::Allocator(e) => e.kind(),
            FsError::Table(e) => e.kind(),
            FsError::Formatter(e) => e.kind(),
            FsError::Checker(e) => e.kind(),
            FsError::Other(_) => FsErrorKind::Other,
        }
    }
}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsAllocatorResult<T = ()> = Result<T, FsAllocatorError>;
pub type FsTableResult<T = ()> = Result<T, FsTableError>;
pub type FsFormatterResult<T = ()> = Result<T, FsFormatterError>;
pub type FsCheckerResult<T = ()> = Result<T, FsCheckerError>;

crate::fs_error_wiring! {
    top => FsError {
        BlockIOError     : IO,
        FsAllocatorError : Allocator,
        FsTableError     : Table,
        FsFormatterError : Formatter,
        FsCheckerError   : Checker,
    },
    str_into => [
        FsAllocatorError,
        FsTableError,
        FsFormatterError,
        FsCheckerError,
    ],
    sub => {
        BlockIOError     => [ FsAllocatorError::IO, FsTableError::IO, FsFormatterError::IO, FsCheckerError::IO ],
        FsTableError     => [ FsFormatterError::Table, FsCheckerError::Table ],
        FsAllocatorError => [ FsCheckerError::Allocator ],
    },
}
