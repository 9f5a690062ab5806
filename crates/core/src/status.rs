//! Text-backed status and kind enums.
//!
//! Each enum maps to a `TEXT` column guarded by a `CHECK` constraint in the
//! migrations. The string form is the exact database and wire value.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $val)] $variant ),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database / wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $val => Ok($name::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Invalid {}: '{other}'",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

define_text_enum! {
    /// Kind of lead buyer.
    BuyerType {
        /// A single contractor buying leads for its own business.
        Contractor = "CONTRACTOR",
        /// A lead network reselling to its own buyers.
        Network = "NETWORK",
    }
}

define_text_enum! {
    /// Lead lifecycle status.
    LeadStatus {
        Pending = "PENDING",
        Sold = "SOLD",
        Rejected = "REJECTED",
    }
}

define_text_enum! {
    /// Outbound call kind recorded on a transaction row.
    TransactionAction {
        Ping = "PING",
        Post = "POST",
    }
}

define_text_enum! {
    /// Outcome of a recorded PING/POST call.
    TransactionStatus {
        Success = "SUCCESS",
        Failed = "FAILED",
        Pending = "PENDING",
    }
}

define_text_enum! {
    /// Compliance audit log event kinds.
    ComplianceEvent {
        LeadSubmitted = "LEAD_SUBMITTED",
        AuctionStarted = "AUCTION_STARTED",
        LeadSold = "LEAD_SOLD",
        LeadRejected = "LEAD_REJECTED",
        BuyerFeedback = "BUYER_FEEDBACK",
    }
}

impl LeadStatus {
    /// Whether the status is terminal (no further transitions allowed).
    pub fn is_final(self) -> bool {
        matches!(self, LeadStatus::Sold | LeadStatus::Rejected)
    }
}
