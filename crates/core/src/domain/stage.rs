use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// One step of the procurement approval sequence.
///
/// Declaration order is progression order; `index()` is the discriminant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum Stage {
    #[serde(rename = "purchase_request")]
    PurchaseRequest,
    #[serde(rename = "rfq_1")]
    Rfq1,
    #[serde(rename = "rfq_2")]
    Rfq2,
    #[serde(rename = "rfq_3")]
    Rfq3,
    #[serde(rename = "abstract_of_quotation")]
    AbstractOfQuotation,
    #[serde(rename = "purchase_order")]
    PurchaseOrder,
    #[serde(rename = "notice_of_award")]
    NoticeOfAward,
    #[serde(rename = "notice_to_proceed")]
    NoticeToProceed,
}

impl Stage {
    pub const COUNT: usize = 8;

    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::PurchaseRequest,
        Stage::Rfq1,
        Stage::Rfq2,
        Stage::Rfq3,
        Stage::AbstractOfQuotation,
        Stage::PurchaseOrder,
        Stage::NoticeOfAward,
        Stage::NoticeToProceed,
    ];

    pub const FIRST: Stage = Stage::PurchaseRequest;
    pub const TERMINAL: Stage = Stage::NoticeToProceed;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Storage and wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseRequest => "purchase_request",
            Self::Rfq1 => "rfq_1",
            Self::Rfq2 => "rfq_2",
            Self::Rfq3 => "rfq_3",
            Self::AbstractOfQuotation => "abstract_of_quotation",
            Self::PurchaseOrder => "purchase_order",
            Self::NoticeOfAward => "notice_of_award",
            Self::NoticeToProceed => "notice_to_proceed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PurchaseRequest => "Purchase Request",
            Self::Rfq1 => "RFQ 1",
            Self::Rfq2 => "RFQ 2",
            Self::Rfq3 => "RFQ 3",
            Self::AbstractOfQuotation => "Abstract of Quotation",
            Self::PurchaseOrder => "Purchase Order",
            Self::NoticeOfAward => "Notice of Award",
            Self::NoticeToProceed => "Notice to Proceed",
        }
    }

    /// Accepts either the slug or the display name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s || stage.display_name() == s)
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_first(self) -> bool {
        self == Self::FIRST
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
