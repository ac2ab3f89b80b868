mod macros;
mod store;

pub use store::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
