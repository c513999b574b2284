use tokio_util::sync::CancellationToken;

/// One-shot completion signal shared by the two termination paths of a
/// bounded read (limit reached, tail reached).
///
/// Both paths may fire concurrently; the first fire wins and every later
/// fire is a no-op. Waiters woken by `fired` stay woken. Backed by a
/// `CancellationToken`, which gives the atomic first-fire-wins guard and
/// the close-once broadcast in one primitive.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    token: CancellationToken,
}

impl Trigger {
    pub fn new() -> Trigger {
        Trigger {
            token: CancellationToken::new(),
        }
    }

    /// Fire the trigger. Idempotent and non-blocking.
    pub fn fire(&self) {
        self.token.cancel();
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the trigger has fired. Returns immediately if it already
    /// has.
    pub async fn fired(&self) {
        self.token.cancelled().await;
    }
}
