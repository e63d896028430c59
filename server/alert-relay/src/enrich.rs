//! Enrichment: stamp each accepted alert with a unique id and a resolved timestamp.

use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use uuid::Uuid;

use crate::types::{Alert, EnrichedAlert};

/// Per-process stamping state. Cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct Enricher {
  seq: AtomicU64,
  last_ms: AtomicI64,
}

impl Enricher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Receipt time in epoch milliseconds, never lower than a previous call's.
  pub fn now_ms(&self) -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = self.last_ms.fetch_max(now, Ordering::SeqCst);
    prev.max(now)
  }

  /// `<ms hex>-<sequence hex>-<8 random hex>`.
  ///
  /// The sequence makes ids unique within the process even inside one clock
  /// tick; the random part separates concurrent relay processes.
  pub fn next_id(&self, ms: i64) -> String {
    let seq = self.seq.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();
    format!("{:x}-{:x}-{}", ms, seq, &random[..8])
  }

  /// Build the enriched alert. An inbound `id` key is dropped so the server id
  /// is the only one in the payload; an inbound `ts` is kept verbatim.
  pub fn enrich(&self, alert: Alert) -> EnrichedAlert {
    let now = self.now_ms();
    let id = self.next_id(now);

    let Alert { rule, ts, mut fields } = alert;
    if fields.remove("id").is_some() {
      tracing::debug!(%id, "inbound id replaced by server id");
    }

    EnrichedAlert {
      id,
      ts: ts.unwrap_or_else(|| Value::from(now)),
      rule,
      fields,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::collections::HashSet;

  fn alert(json: &str) -> Alert {
    Alert::from_slice(json.as_bytes()).unwrap()
  }

  #[test]
  fn ts_defaults_to_receipt_time() {
    let enricher = Enricher::new();
    let before = Utc::now().timestamp_millis();
    let enriched = enricher.enrich(alert(r#"{"rule":"cpu_high","severity":"warn"}"#));
    let after = Utc::now().timestamp_millis();

    let ts = enriched.ts.as_i64().unwrap();
    assert!(ts >= before && ts <= after, "{} not in [{}, {}]", ts, before, after);
    assert_eq!(enriched.rule, "cpu_high");
    assert_eq!(enriched.fields["severity"], json!("warn"));
  }

  #[test]
  fn inbound_ts_is_kept() {
    let enricher = Enricher::new();
    let enriched = enricher.enrich(alert(r#"{"rule":"x","ts":12345}"#));
    assert_eq!(enriched.ts, json!(12345));

    let enriched = enricher.enrich(alert(r#"{"rule":"x","ts":"yesterday"}"#));
    assert_eq!(enriched.ts, json!("yesterday"));
  }

  #[test]
  fn inbound_id_is_replaced() {
    let enricher = Enricher::new();
    let enriched = enricher.enrich(alert(r#"{"rule":"x","id":"spoofed"}"#));
    assert_ne!(enriched.id, "spoofed");
    assert!(!enriched.fields.contains_key("id"));

    let value = enriched.to_value().unwrap();
    assert_eq!(value["id"], json!(enriched.id));
  }

  #[test]
  fn ids_are_unique_within_one_tick() {
    let enricher = Enricher::new();
    let ids: HashSet<String> = (0..1000).map(|_| enricher.next_id(42)).collect();
    assert_eq!(ids.len(), 1000);
  }

  #[test]
  fn receipt_time_never_decreases() {
    let enricher = Enricher::new();
    let far_future = Utc::now().timestamp_millis() + 60_000;
    enricher.last_ms.store(far_future, Ordering::SeqCst);
    assert_eq!(enricher.now_ms(), far_future);

    let mut prev = 0;
    for _ in 0..100 {
      let now = enricher.now_ms();
      assert!(now >= prev);
      prev = now;
    }
  }
}
