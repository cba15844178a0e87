//! Classification of line-codec read errors.

use tokio_util::codec::LinesCodecError;

/// What the read loop should do after a failed read.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ReadErrorAction {
    /// The line exceeded the configured maximum. It is discarded and the
    /// client is told; the connection stays open.
    InputTooLong,
    /// The socket is broken or sent invalid UTF-8. Disconnect.
    Fatal,
}

pub(super) fn classify_read_error(e: &LinesCodecError) -> ReadErrorAction {
    match e {
        LinesCodecError::MaxLineLengthExceeded => ReadErrorAction::InputTooLong,
        LinesCodecError::Io(_) => ReadErrorAction::Fatal,
    }
}
