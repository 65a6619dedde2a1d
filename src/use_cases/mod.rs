// Use cases layer: turning server notices into tactical decisions.

pub mod decide;
pub mod tactics;
pub mod types;

#[cfg(test)]
mod test_support;

pub use types::{
    Decision, Diagnostic, ErrorNotice, InboundMessage, MatchContext, MatchUpdate,
    OutboundMessage, UnknownMessage,
};
