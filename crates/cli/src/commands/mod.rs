pub mod chat;
pub mod eval;
pub mod onboard;
pub mod serve;
