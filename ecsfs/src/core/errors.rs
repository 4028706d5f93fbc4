// SPDX-License-Identifier: MIT

pub use ecsio::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsAllocatorError {
    /// No free entry left in the allocation table.
    OutOfBlocks,
    /// A byte offset points past the last block of a chain.
    OffsetBeyondChain,
    /// A chain runs into an entry marked free.
    FreeEntryInChain(u16),
    /// A chain is longer than the table itself.
    LoopDetected,
    /// A chain links to an index outside the table.
    InvalidBlock(u16),
    Other(&'static str),
}

impl FsAllocatorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsAllocatorError::OutOfBlocks => "Allocation table full",
            FsAllocatorError::OffsetBeyondChain => "Offset beyond end of chain",
            FsAllocatorError::FreeEntryInChain(_) => "Free entry inside a chain",
            FsAllocatorError::LoopDetected => "Loop detected in chain",
            FsAllocatorError::InvalidBlock(_) => "Invalid block index in chain",
            FsAllocatorError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFormatterError {
    IO(BlockIOError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsFormatterError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatterError::IO(_) => "IO error",
            FsFormatterError::Invalid(msg) => msg,
            FsFormatterError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsFormatterError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCheckerError {
    IO(BlockIOError),
    Allocator(FsAllocatorError),
    Invalid(&'static str),
    Other(&'static str),
}

impl FsCheckerError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCheckerError::IO(_) => "IO error",
            FsCheckerError::Allocator(_) => "Allocator error",
            FsCheckerError::Invalid(msg) => msg,
            FsCheckerError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsCheckerError::IO(e) => Some(FsError::IO(*e)),
            FsCheckerError::Allocator(e) => Some(FsError::Allocator(*e)),
            _ => None,
        }
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(BlockIOError),
    Allocator(FsAllocatorError),
    /// The device cannot hold a volume at all.
    Volume(&'static str),
    /// Block 0 or the metadata it describes is inconsistent.
    CorruptVolume(&'static str),
    AlreadyMounted,
    NotMounted,
    /// Unmount refused while handles are still open.
    FilesOpen(usize),
    InvalidName,
    AlreadyExists,
    NotFound,
    DirectoryFull,
    TooManyOpenFiles,
    BadHandle,
    OffsetOutOfRange,
    Formatter(FsFormatterError),
    Checker(FsCheckerError),
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Allocator(e) => e.msg(),
            FsError::Volume(msg) => msg,
            FsError::CorruptVolume(msg) => msg,
            FsError::AlreadyMounted => "A volume is already mounted",
            FsError::NotMounted => "No volume mounted",
            FsError::FilesOpen(_) => "Files are still open",
            FsError::InvalidName => "Invalid file name",
            FsError::AlreadyExists => "File already exists",
            FsError::NotFound => "File not found",
            FsError::DirectoryFull => "Directory full",
            FsError::TooManyOpenFiles => "Too many open files",
            FsError::BadHandle => "Bad file handle",
            FsError::OffsetOutOfRange => "Offset out of range",
            FsError::Formatter(e) => e.msg(),
            FsError::Checker(e) => e.msg(),
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Allocator(e) => e.source(),
            FsError::Formatter(e) => e.source(),
            FsError::Checker(e) => e.source(),
            _ => None,
        }
    }

    /// True for the allocation-table-full condition, however it is wrapped.
    pub fn is_out_of_blocks(&self) -> bool {
        matches!(
            self,
            FsError::Allocator(FsAllocatorError::OutOfBlocks)
                | FsError::Checker(FsCheckerError::Allocator(FsAllocatorError::OutOfBlocks))
        )
    }
}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsAllocatorResult<T = ()> = Result<T, FsAllocatorError>;
pub type FsFormatterResult<T = ()> = Result<T, FsFormatterError>;
pub type FsCheckerResult<T = ()> = Result<T, FsCheckerError>;

crate::fs_error_wiring! {
    top => FsError {
        BlockIOError     : IO,
        FsAllocatorError : Allocator,
        FsFormatterError : Formatter,
        FsCheckerError   : Checker,
    },
    str_into => [
        FsAllocatorError,
        FsFormatterError,
        FsCheckerError,
    ],
    sub => {
        BlockIOError     => [ FsFormatterError::IO, FsCheckerError::IO ],
        FsAllocatorError => [ FsCheckerError::Allocator ],
    },
    display => [
        FsAllocatorError,
        FsFormatterError,
        FsCheckerError,
        FsError,
    ],
}
