//! Link categories.

use serde::{Deserialize, Serialize};

use crate::{config, translate::AddrParams};

/// A class of core-to-core connection, with its own signal-line numbering,
/// queue budget, and address-correction parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
pub enum Link {
    /// The two application cores talking to each other.
    CoreToCore,
    /// An application core talking to the companion core.
    CoreToCompanion,
}

impl Link {
    /// Number of signal lines this category exposes. Valid line numbers are
    /// `0..line_count()`.
    pub const fn line_count(self) -> u16 {
        match self {
            Link::CoreToCore => config::CORE_LINES as u16,
            Link::CoreToCompanion => config::COMPANION_LINES as u16,
        }
    }

    /// Number of concurrent queues this category has ring memory for.
    pub const fn max_queues(self) -> usize {
        match self {
            Link::CoreToCore => config::CORE_QUEUES,
            Link::CoreToCompanion => config::COMPANION_QUEUES,
        }
    }

    /// Address-correction parameters for pointers crossing this link.
    pub const fn addr_params(self) -> AddrParams {
        match self {
            Link::CoreToCore => config::CORE_ADDR_PARAMS,
            Link::CoreToCompanion => config::COMPANION_ADDR_PARAMS,
        }
    }
}
