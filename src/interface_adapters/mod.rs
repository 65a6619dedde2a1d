// Interface adapters: wire protocol and the match session loop.

pub mod protocol;
pub mod session;
