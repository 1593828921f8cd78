pub mod common;
pub mod completions;
pub mod discard;
pub mod list;
pub mod remote;
pub mod scan;
pub mod session;
pub mod status;
pub mod summary;
pub mod sync;
