pub mod core;
pub mod extract;
pub mod rag;
pub mod server;
pub mod state;
