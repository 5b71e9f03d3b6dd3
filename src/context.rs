//! Per-request context store.
//!
//! Associates a mutable record with the dynamic extent of one request's
//! asynchronous execution. The record is held in a `tokio::task_local!`
//! cell, so it propagates through every `.await` of the request future and
//! two requests interleaved at suspension points always observe independent
//! records. A plain thread-local or global would leak context between
//! interleaved requests; a task-local cannot.
//!
//! The context populator middleware creates the record and runs the rest of
//! the stack inside [`RequestContext::scope`]; any code reached from the
//! handler (directly or through spawned-in-place futures) can read it with
//! [`RequestContext::get`]. No teardown is needed, the scope ends with the
//! request future.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;

tokio::task_local! {
    static CURRENT: Arc<RwLock<RequestContext>>;
}

/// Snapshot of the inbound request, visible anywhere downstream of the
/// context populator for the duration of that request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw request headers (lowercased names).
    pub headers: HashMap<String, String>,
    /// Raw query parameters.
    pub params: HashMap<String, String>,
    pub method: String,
    pub path: String,
    /// Timezone header value, or the configured default when absent.
    pub timezone: String,
    /// Language header value; no default is substituted.
    pub lang: Option<String>,
}

impl RequestContext {
    /// Cloned snapshot of the current request's context, or `None` when
    /// called outside a request scope.
    pub fn get() -> Option<RequestContext> {
        CURRENT.try_with(|cell| cell.read().clone()).ok()
    }

    /// Read access without cloning the whole record.
    pub fn with_current<R>(f: impl FnOnce(&RequestContext) -> R) -> Option<R> {
        CURRENT.try_with(|cell| f(&cell.read())).ok()
    }

    /// Mutate the current request's record. Returns `false` outside a scope.
    pub fn update(f: impl FnOnce(&mut RequestContext)) -> bool {
        CURRENT.try_with(|cell| f(&mut cell.write())).is_ok()
    }

    /// Run `fut` with `ctx` as the current request context.
    pub async fn scope<F>(ctx: RequestContext, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(Arc::new(RwLock::new(ctx)), fut).await
    }

    /// Language of the current request, if one was sent.
    pub fn current_lang() -> Option<String> {
        Self::with_current(|ctx| ctx.lang.clone()).flatten()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_get_outside_scope_is_none() {
        assert!(RequestContext::get().is_none());
    }

    #[tokio::test]
    async fn test_scope_provides_context() {
        let ctx = RequestContext {
            timezone: "+02:00".to_string(),
            lang: Some("en".to_string()),
            ..Default::default()
        };

        let seen = RequestContext::scope(ctx, async {
            RequestContext::get().expect("context must be set inside scope")
        })
        .await;

        assert_eq!(seen.timezone, "+02:00");
        assert_eq!(seen.lang.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_update_visible_across_await() {
        RequestContext::scope(RequestContext::default(), async {
            assert!(RequestContext::update(|ctx| {
                ctx.params.insert("page".to_string(), "2".to_string());
            }));

            tokio::task::yield_now().await;

            let page = RequestContext::with_current(|ctx| ctx.params.get("page").cloned())
                .flatten()
                .expect("param written before the await point");
            assert_eq!(page, "2");
        })
        .await;
    }

    /// Two requests interleaved at suspension points must never observe
    /// each other's fields.
    #[tokio::test]
    async fn test_concurrent_requests_are_isolated() {
        async fn simulated_request(tz: &str, lang: &str) -> (String, Option<String>) {
            let ctx = RequestContext {
                timezone: tz.to_string(),
                lang: Some(lang.to_string()),
                ..Default::default()
            };

            RequestContext::scope(ctx, async {
                // Interleave with the other request a few times
                for _ in 0..10 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    RequestContext::update(|c| {
                        c.headers
                            .insert("x-touched-by".to_string(), c.timezone.clone());
                    });
                }

                RequestContext::with_current(|c| (c.timezone.clone(), c.lang.clone())).unwrap()
            })
            .await
        }

        let (r1, r2) = tokio::join!(
            simulated_request("+01:00", "en"),
            simulated_request("+07:00", "id"),
        );

        assert_eq!(r1, ("+01:00".to_string(), Some("en".to_string())));
        assert_eq!(r2, ("+07:00".to_string(), Some("id".to_string())));
    }

    #[tokio::test]
    async fn test_outside_scope_update_is_noop() {
        assert!(!RequestContext::update(|_| {}));
        assert!(RequestContext::current_lang().is_none());
    }
}
