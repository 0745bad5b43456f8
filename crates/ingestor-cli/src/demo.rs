//! Demo producer - in-memory キューに合成ログインイベントを流し込む
//!
//! 約 1 割は必須キーを欠いた rogue メッセージにする（隔離経路の確認用）。

use std::sync::Arc;

use ingestor_core::impls::InMemoryDeliveryQueue;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

const DEVICE_TYPES: [&str; 3] = ["android", "ios", "web"];
const LOCALES: [&str; 5] = ["en-US", "en-GB", "ja-JP", "de-DE", "pt-BR"];
const ROGUE_RATIO: f64 = 0.1;

/// One synthetic login event. Rogue events lack a random required key.
pub fn login_event<R: Rng>(rng: &mut R, rogue: bool) -> Value {
    let mut event = json!({
        "user_id": format!("{:08x}-{:04x}", rng.r#gen::<u32>(), rng.r#gen::<u16>()),
        "device_type": DEVICE_TYPES.choose(rng).copied().unwrap_or("android"),
        "ip": format!(
            "{}.{}.{}.{}",
            rng.gen_range(1..=223),
            rng.r#gen::<u8>(),
            rng.r#gen::<u8>(),
            rng.gen_range(1..=254)
        ),
        "device_id": format!("{:04}-{:04}-{:04}", rng.gen_range(0..10_000), rng.gen_range(0..10_000), rng.gen_range(0..10_000)),
        "locale": LOCALES.choose(rng).copied().unwrap_or("en-US"),
        "app_version": format!("{}.{}.{}", rng.gen_range(0..5), rng.gen_range(0..10), rng.gen_range(0..10)),
    });

    if rogue {
        if let Some(fields) = event.as_object_mut() {
            let keys: Vec<String> = fields.keys().cloned().collect();
            if let Some(key) = keys.choose(rng) {
                fields.remove(key);
            }
        }
    }
    event
}

/// Publish one event every `interval_ms` until shutdown.
pub async fn run_demo_producer(
    queue: Arc<InMemoryDeliveryQueue>,
    interval_ms: u64,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(interval_ms, "starting demo producer");

    let mut rng = StdRng::from_entropy();
    let mut ticker = interval(Duration::from_millis(interval_ms));
    let mut sent: u64 = 0;

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let rogue = rng.gen_bool(ROGUE_RATIO);
                let body = login_event(&mut rng, rogue).to_string();
                let message_id = queue.send(body).await;
                sent += 1;
                debug!(message_id = %message_id, rogue, "published demo login");
            }
        }
    }

    info!(sent, "demo producer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestor_core::domain::{RawEvent, REQUIRED_KEYS};
    use ingestor_core::pipeline::validate;

    #[test]
    fn generated_events_pass_validation() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let event = login_event(&mut rng, false);
            assert!(validate(RawEvent::from_value(event)).is_ok());
        }
    }

    #[test]
    fn rogue_events_miss_exactly_one_key() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let event = login_event(&mut rng, true);
            let present = REQUIRED_KEYS
                .iter()
                .filter(|k| event.get(**k).is_some())
                .count();
            assert_eq!(present, REQUIRED_KEYS.len() - 1);
        }
    }

    #[tokio::test]
    async fn producer_fills_the_queue_until_shutdown() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let producer = tokio::spawn(run_demo_producer(queue.clone(), 10, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(55)).await;
        shutdown_tx.send(true).unwrap();
        producer.await.unwrap();

        assert!(queue.len().await >= 2);
    }
}
