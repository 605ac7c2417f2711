/// Read-through cache lookup.
///
/// Yields `Ok(value)` from the cache when present. On a miss `$fetch` is
/// awaited and its value is queued for a background write under `$key` with
/// `$ttl` seconds to live. Fetch errors propagate with `?`, so the enclosing
/// function must return `AppResult`.
///
/// ```rust,ignore
/// cached!(self.cache, key, METADATA_CACHE_TTL, async move { fetch().await })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $fetch:expr) => {{
        match $cache.get(&$key).await {
            Some(hit) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(hit)
            }
            None => {
                let fresh = $fetch.await?;
                $cache.put_in_background(&$key, &fresh, $ttl);
                Ok(fresh)
            }
        }
    }};
}
