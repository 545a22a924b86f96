//! Event hub behaviour observed through the public handle

mod common;

use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use tokio::sync::watch;

use common::{channel_subscriber, next_payload, settle};
use todo_hub::{EventHub, HubConfig};

#[tokio::test]
async fn test_departed_subscriber_stops_receiving() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (hub, _task) = EventHub::spawn("todo:created", HubConfig::default(), shutdown_rx);

    let (a, mut rx_a) = channel_subscriber();
    let (b, mut rx_b) = channel_subscriber();
    let id_a = hub.register(a).await.unwrap();
    hub.register(b).await.unwrap();

    hub.publish(r#"{"id":1,"title":"x"}"#).await;
    assert_eq!(next_payload(&mut rx_a).await, json!({ "id": 1, "title": "x" }));
    assert_eq!(next_payload(&mut rx_b).await, json!({ "id": 1, "title": "x" }));

    hub.unregister(id_a);
    settle(&hub, 1).await;

    hub.publish(r#"{"id":2,"title":"y"}"#).await;
    assert_eq!(next_payload(&mut rx_b).await, json!({ "id": 2, "title": "y" }));

    // A's channel was closed by the hub without any further delivery.
    let after_leaving = tokio::time::timeout(Duration::from_secs(2), rx_a.next())
        .await
        .expect("departed subscriber was never closed");
    assert_eq!(after_leaving, None);
}

#[tokio::test]
async fn test_concurrent_publishers_keep_their_own_order() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (hub, _task) = EventHub::spawn("todo:updated", HubConfig::default(), shutdown_rx);

    let (sub, mut rx) = channel_subscriber();
    hub.register(sub).await.unwrap();

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let hub = hub.clone();
            tokio::spawn(async move {
                for seq in 0..10 {
                    hub.publish(json!({ "producer": producer, "seq": seq }).to_string())
                        .await;
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    let mut last_seen = [-1i64; 4];
    for _ in 0..40 {
        let event = next_payload(&mut rx).await;
        let producer = event["producer"].as_u64().unwrap() as usize;
        let seq = event["seq"].as_i64().unwrap();
        assert!(seq > last_seen[producer], "producer {producer} out of order");
        last_seen[producer] = seq;
    }
    assert_eq!(last_seen, [9; 4]);
}

#[tokio::test]
async fn test_late_subscriber_sees_only_later_events() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (hub, _task) = EventHub::spawn("todo:deleted", HubConfig::default(), shutdown_rx);

    let (early, mut rx_early) = channel_subscriber();
    hub.register(early).await.unwrap();
    hub.publish(r#"{"id":1}"#).await;
    assert_eq!(next_payload(&mut rx_early).await, json!({ "id": 1 }));

    let (late, mut rx_late) = channel_subscriber();
    hub.register(late).await.unwrap();
    hub.publish(r#"{"id":2}"#).await;

    assert_eq!(next_payload(&mut rx_late).await, json!({ "id": 2 }));
    assert_eq!(next_payload(&mut rx_early).await, json!({ "id": 2 }));
}

#[tokio::test]
async fn test_publish_with_no_subscribers_is_dropped() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let config = HubConfig {
        queue_capacity: 1,
        ..HubConfig::default()
    };
    let (hub, _task) = EventHub::spawn("todo:created", config, shutdown_rx);

    // The loop keeps draining, so a capacity-1 queue never blocks for long.
    tokio::time::timeout(Duration::from_secs(2), async {
        for id in 0..50 {
            hub.publish(json!({ "id": id }).to_string()).await;
        }
    })
    .await
    .expect("publishing stalled without subscribers");

    let (sub, mut rx) = channel_subscriber();
    hub.register(sub).await.unwrap();
    hub.publish(r#"{"id":"fresh"}"#).await;
    assert_eq!(next_payload(&mut rx).await, json!({ "id": "fresh" }));
}
