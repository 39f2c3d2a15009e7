//! Logging utilities with request and provider context.
//!
//! The request-id middleware scopes [`REQUEST_ID`] around each request, and
//! the provider clients scope [`PROVIDER_CONTEXT`] around each upstream call,
//! so log lines deep in the stack can be correlated without threading the
//! values through every function.

tokio::task_local! {
    /// Task-local storage for the provider handling the current call.
    pub static PROVIDER_CONTEXT: String;
}

tokio::task_local! {
    /// Task-local storage for the current request ID.
    ///
    /// This allows every log line produced while serving a request to carry
    /// the same identifier the client sees in `x-request-id`.
    pub static REQUEST_ID: String;
}

/// Get the current provider name from context, if set.
///
/// Returns an empty string if no provider context is set.
pub fn get_provider_context() -> String {
    PROVIDER_CONTEXT
        .try_with(|ctx| ctx.clone())
        .unwrap_or_default()
}

/// Get the current request ID from context, if set.
///
/// Returns an empty string if no request ID is set.
pub fn get_request_id() -> String {
    REQUEST_ID.try_with(|id| id.clone()).unwrap_or_default()
}

/// Generate a new unique request ID using UUID v4.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_provider_context_get() {
        PROVIDER_CONTEXT
            .scope("gemini".to_string(), async {
                assert_eq!(get_provider_context(), "gemini");
            })
            .await;
    }

    #[tokio::test]
    async fn test_provider_context_default() {
        assert_eq!(get_provider_context(), "");
    }

    #[tokio::test]
    async fn test_request_id_isolation() {
        let task1 = tokio::spawn(async {
            REQUEST_ID
                .scope("request-1".to_string(), async {
                    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
                    get_request_id()
                })
                .await
        });

        let task2 = tokio::spawn(async {
            REQUEST_ID
                .scope("request-2".to_string(), async {
                    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
                    get_request_id()
                })
                .await
        });

        assert_eq!(task1.await.unwrap(), "request-1");
        assert_eq!(task2.await.unwrap(), "request-2");
    }

    #[tokio::test]
    async fn test_request_id_default() {
        assert_eq!(get_request_id(), "");
    }

    #[test]
    fn test_generate_request_id() {
        let id1 = generate_request_id();
        let id2 = generate_request_id();

        // 8-4-4-4-12
        assert_eq!(id1.len(), 36);
        assert_eq!(id1.split('-').count(), 5);
        assert_ne!(id1, id2);
    }

    #[tokio::test]
    async fn test_nested_contexts() {
        REQUEST_ID
            .scope("req-456".to_string(), async {
                PROVIDER_CONTEXT
                    .scope("openai".to_string(), async {
                        assert_eq!(get_request_id(), "req-456");
                        assert_eq!(get_provider_context(), "openai");
                    })
                    .await
            })
            .await;
    }
}
