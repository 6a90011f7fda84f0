//! Error kinds shared by all fallible driver operations.

/// Driver error kinds.
///
/// Composite operations short-circuit on the first failing sub-write and
/// return its error unchanged; there is no retry and no rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The transport reported a failed transfer. A transport-level timeout
    /// is indistinguishable from this unless the transport itself says so.
    #[error("SPI transfer failed")]
    TransferFailed,
    /// Register lookup or access failed (e.g. shadow read out of range,
    /// write attempted on a read-only register).
    #[error("register access failed")]
    RegisterAccess,
    /// Out-of-range address or otherwise disallowed argument.
    #[error("invalid parameter")]
    InvalidParameter,
    /// Reserved for transports that can distinguish a timeout.
    #[error("transfer timed out")]
    Timeout,
    /// Reserved.
    #[error("not implemented")]
    NotImplemented,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<scroll::Error> for Error {
    fn from(_: scroll::Error) -> Self {
        Error::InvalidParameter
    }
}
