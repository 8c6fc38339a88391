//! Cache provider implementations

pub mod memory;
pub mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;
