pub mod api;
mod buffer;
mod buffer_pool;
pub mod config;
pub mod engine;
pub mod error;
mod gateway;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod validate;

pub use buffer::{ADDRESS_SIZE, NativeBuffer};
pub use buffer_pool::{BufferPool, BufferPoolStats, PooledBuffer};
pub use config::Config;
pub use gateway::{Gateway, Reply};
