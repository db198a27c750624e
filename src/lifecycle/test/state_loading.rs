use std::time::Duration;

use tokio::time::Instant;

use crate::lifecycle::LifecycleState;
use crate::response::Payload;

use super::Scenario;

#[tokio::test(start_paused = true)]
async fn captured_error_body_rejects_without_polling() {
    let (mut xhr, handle) = Scenario::builder().mobile().open();
    let start = Instant::now();

    handle.loading(500, "boom");

    let rejection = xhr.send(None).await.unwrap().unwrap_err();
    assert_eq!(rejection.status, 500);
    assert_eq!(rejection.status_text, "Internal Server Error");
    assert_eq!(rejection.response, Payload::Text("boom".into()));

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(handle.aborted());
    assert_eq!(xhr.state(), LifecycleState::Failed);
}

#[tokio::test(start_paused = true)]
async fn slow_error_body_is_picked_up_by_polling() {
    let (mut xhr, handle) = Scenario::builder().mobile().open();
    let start = Instant::now();

    // The error status arrives before its body does.
    handle.loading(503, "");
    handle.set_response_text("upstream fell over");

    let rejection = xhr.send(None).await.unwrap().unwrap_err();
    assert_eq!(rejection.status, 503);
    assert_eq!(
        rejection.response,
        Payload::Text("upstream fell over".into())
    );

    // One poll interval was enough.
    assert_eq!(start.elapsed(), Duration::from_millis(200));
    assert!(handle.aborted());
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_still_rejects() {
    let (mut xhr, handle) = Scenario::builder().mobile().open();
    let start = Instant::now();

    // No body ever arrives.
    handle.loading(500, "");

    let rejection = xhr.send(None).await.unwrap().unwrap_err();
    assert_eq!(rejection.status, 500);
    assert_eq!(rejection.response, Payload::Text("".into()));

    // The full budget: 10 attempts at 200ms.
    assert_eq!(start.elapsed(), Duration::from_millis(2000));
    assert!(handle.aborted());
}

#[tokio::test(start_paused = true)]
async fn non_error_loading_is_plain_progress() {
    let (mut xhr, handle) = Scenario::builder().mobile().open();

    handle.loading(200, "half the body");
    handle.done(200, "OK", "the whole body");

    let reply = xhr.send(None).await.unwrap().unwrap();
    assert_eq!(reply.response, Payload::Text("the whole body".into()));
    assert!(!handle.aborted());
}

#[tokio::test(start_paused = true)]
async fn loading_without_poll_guard_is_ignored() {
    // Standard transport: no guard, loading events mean nothing.
    let (mut xhr, handle) = Scenario::builder().open();

    handle.loading(500, "looks bad");
    handle.done(200, "OK", "but ends well");

    let reply = xhr.send(None).await.unwrap().unwrap();
    assert_eq!(reply.status, 200);
    assert!(!handle.aborted());
}
