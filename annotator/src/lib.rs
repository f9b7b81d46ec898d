// Library interface for annotator modules
// This allows tests and the binary to import modules

pub mod assembly;
pub mod clustering;
pub mod collage;
pub mod dispatch;
pub mod fetch;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod subscriber;
pub mod worker;
