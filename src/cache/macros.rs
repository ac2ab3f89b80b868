/// Read-through caching over the Redis `Cache`.
///
/// Returns the cached value when present. Otherwise awaits `$block`, hands the
/// computed value to the background writer and returns it. A failing cache read
/// is logged and treated as a miss, so Redis being down never fails the caller.
///
/// # Arguments
/// * `$cache`: a `Cache` (anything with `get_from_cache` and `set_in_background`).
/// * `$key`: the `CacheKey` of the value.
/// * `$ttl`: time-to-live of the stored value in seconds.
/// * `$block`: a future resolving to `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let details = cached!(cache, CacheKey::MovieDetails(19995), 86400, async move {
///     fetch_details(19995).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            miss => {
                if let Err(e) = miss {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, computing value");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
