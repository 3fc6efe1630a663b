/// Read-through caching over a [`Cache`](crate::store::Cache).
///
/// Returns the cached value when present. Otherwise evaluates `$block`, queues a
/// background write of its `Ok` value and returns it. A failed cache read is
/// logged and treated as a miss, so the cache never turns a good fetch into an
/// error.
///
/// # Arguments
/// * `$cache`: cache with `get_from_cache` and `set_in_background` methods.
/// * `$key`: the [`CacheKey`](crate::store::CacheKey) to read and write.
/// * `$ttl`: time-to-live for a written entry, in seconds.
/// * `$block`: future producing `Result<T, E>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let details = cached!(cache, CacheKey::Metadata(id.clone()), 3600, async move {
///     provider.fetch_details(&id).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let hit = match $cache.get_from_cache(&$key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %$key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };

        match hit {
            Some(cached) => Ok(cached),
            None => {
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
