//! Facade-level behavior: composition of rate limiting, retries, caching,
//! batching, and auth behind `TradeForgeClient`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tradeforge_sdk::prelude::*;

#[derive(Default)]
struct StaticTransport {
    login_calls: AtomicU32,
}

fn granted_session() -> Session {
    let now = Utc::now();
    Session {
        user_id: "u-7".into(),
        session_key: "sk-7".into(),
        created_at: now,
        expires_at: now + ChronoDuration::hours(1),
        active: true,
    }
}

impl AuthTransport for StaticTransport {
    async fn login(&self, _credentials: &Credentials) -> Result<LoginOutcome, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(LoginOutcome::Granted(granted_session()))
    }

    async fn complete_login(
        &self,
        _credentials: &Credentials,
        _challenge_id: &str,
        _code: &str,
    ) -> Result<Session, AuthError> {
        Ok(granted_session())
    }

    async fn refresh(&self, _session: &Session) -> Result<Session, AuthError> {
        Ok(granted_session())
    }

    async fn probe(&self, _session: &Session) -> bool {
        true
    }

    async fn logout(&self, _session: &Session) -> Result<(), AuthError> {
        Ok(())
    }
}

fn fast_policy() -> ClientPolicy {
    let mut policy = ClientPolicy::balanced();
    policy.rate_limit = RateLimitPolicy {
        capacity: 50,
        window: Duration::from_secs(1),
    };
    policy.retry = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(2),
        max_delay: Duration::from_millis(10),
        backoff_factor: 2.0,
        jitter: false,
    };
    policy.batch = BatchPolicy {
        batch_size: 3,
        max_concurrent: 2,
        batch_delay: Duration::from_millis(5),
    };
    policy.cache = CachePolicy {
        ttl: Duration::from_millis(200),
    };
    policy
}

fn client() -> TradeForgeClient<StaticTransport> {
    TradeForgeClient::<StaticTransport>::builder()
        .policy(fast_policy())
        .credentials(Credentials::new("bot@example.com", "pw"))
        .build_with_transport(StaticTransport::default())
        .unwrap()
}

#[tokio::test]
async fn execute_retries_transient_failures() {
    let client = client();
    let calls = AtomicU32::new(0);
    let result: Result<u32, String> = client
        .execute(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("transient {}", n))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn cached_reads_invoke_the_operation_once() {
    let client = client();
    let calls = AtomicU32::new(0);
    let op = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, String>(serde_json::json!({"labs": [1, 2, 3]})) }
    };

    let first = client.execute_cached("labs:all", op).await.unwrap();
    let second = client.execute_cached("labs:all", op).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    client.clear_cache().await;
    client.execute_cached("labs:all", op).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn batch_preserves_order_and_isolates_the_failing_item() {
    let client = client();
    let results: Vec<Result<u32, String>> = client
        .execute_batch((1..=10u32).collect::<Vec<_>>(), |n| async move {
            if n == 5 {
                Err("backtest 5 rejected".to_string())
            } else {
                Ok(n * 10)
            }
        })
        .await;

    assert_eq!(results.len(), 10);
    for (i, result) in results.iter().enumerate() {
        let n = (i + 1) as u32;
        if n == 5 {
            assert_eq!(result.as_ref().unwrap_err(), "backtest 5 rejected");
        } else {
            assert_eq!(*result.as_ref().unwrap(), n * 10);
        }
    }
}

#[tokio::test]
async fn presets_select_concrete_policies() {
    let client = TradeForgeClient::<StaticTransport>::builder()
        .preset("conservative")
        .build_with_transport(StaticTransport::default())
        .unwrap();
    assert_eq!(client.policy().rate_limit.capacity, 10);
    assert_eq!(client.policy().batch.max_concurrent, 2);

    let err = TradeForgeClient::<StaticTransport>::builder()
        .preset("warp-speed")
        .build_with_transport(StaticTransport::default())
        .err()
        .unwrap();
    assert!(matches!(err, SdkError::Config(_)));
}

#[tokio::test]
async fn concurrent_ensure_authenticated_logs_in_once() {
    let client = client();
    let (a, b) = futures_util::join!(
        client.auth().ensure_authenticated(),
        client.auth().ensure_authenticated()
    );
    assert!(a.is_ok() && b.is_ok());
    assert!(client.auth().is_authenticated().await);
}

#[tokio::test]
async fn auth_headers_flow_from_an_established_session() {
    let client = client();
    client
        .auth()
        .authenticate(Credentials::new("bot@example.com", "pw"))
        .await
        .unwrap();
    let headers = client.auth().get_auth_headers().await.unwrap();
    assert_eq!(headers[0].1, "u-7");
    assert_eq!(headers[1].1, "sk-7");
}
