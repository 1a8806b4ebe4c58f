pub mod comparison;
pub mod prompt;

pub use crate::domain::model::{
    CompareFundsPayload, ComparisonRequest, ComparisonResult, FundList, PreferenceKey,
    PreferenceSet,
};
pub use crate::domain::ports::{ChatMessage, CompletionClient, CompletionReply};
pub use crate::utils::error::Result;
