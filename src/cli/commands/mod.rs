pub mod backend;
pub mod serve;
