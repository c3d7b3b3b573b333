//! The fatal error channel.

use core::fmt;

/// An unrecoverable configuration defect, detected during the bootstrap
/// handshake and nowhere else.
///
/// Every variant means the two core images were built or deployed
/// inconsistently. The intended policy is to halt the offending core - there
/// is nothing to retry - but the defect is reported as a value so that the
/// platform owns the halt and tests can assert on the cause. This channel
/// is deliberately disjoint from the transient full/empty rejections the
/// transfer operations report.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The requested signal line does not exist on this link category.
    LineOutOfRange { line: u16 },
    /// The requested signal line already has a queue bound to it.
    LineAlreadyBound { line: u16 },
    /// This link category has no ring memory left for another queue. The
    /// deployment configured more concurrent queues than it provisioned.
    SlotsExhausted,
    /// The peer's registration magic did not match ours: the two images
    /// speak different protocol versions or message shapes.
    BadMagic { got: u32 },
    /// The peer registered with a different line than this side was
    /// configured to expect: the images disagree about the wiring.
    LineMismatch { expected: u16, got: u16 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LineOutOfRange { line } => {
                write!(f, "signal line {line} is out of range for this link")
            }
            ConfigError::LineAlreadyBound { line } => {
                write!(f, "signal line {line} is already bound to a queue")
            }
            ConfigError::SlotsExhausted => {
                write!(f, "no ring slots left on this link category")
            }
            ConfigError::BadMagic { got } => {
                write!(f, "peer registered with magic {got:#010x}")
            }
            ConfigError::LineMismatch { expected, got } => {
                write!(
                    f,
                    "peer registered on line {got}, this side expected line {expected}"
                )
            }
        }
    }
}
