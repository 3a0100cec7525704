use std::sync::Arc;

use serde_json::json;
use tokio_stream::StreamExt;

use tycostream_core::{EventKind, Op, Record, Row};
use tycostream_pipeline::{run_subscriber, HubMessage, SourceHub};
use tycostream_test_utils::{orders_source, ScriptedSubscriber};

fn row(id: i64, customer: &str, total: f64) -> Row {
    [
        ("id".into(), json!(id)),
        ("customer".into(), json!(customer)),
        ("total".into(), json!(total)),
    ]
    .into()
}

#[tokio::test]
async fn drives_a_hub_end_to_end_from_a_scripted_subscriber() {
    let hub = Arc::new(SourceHub::new(orders_source()));
    let mut stream = hub.subscribe(false).unwrap();

    let subscriber = ScriptedSubscriber::new(vec![
        Record { timestamp: 1, op: Op::Upsert, row: row(1, "ada", 9.99) },
        Record { timestamp: 2, op: Op::Upsert, row: row(1, "ada", 19.99) },
        Record { timestamp: 3, op: Op::Delete, row: row(1, "ada", 19.99) },
    ]);

    let driver = tokio::spawn(run_subscriber(Arc::clone(&hub), Box::new(subscriber)));

    let insert = stream.next().await.unwrap();
    assert!(matches!(insert, HubMessage::Event(e, 1) if e.kind == EventKind::Insert));

    let update = stream.next().await.unwrap();
    assert!(matches!(update, HubMessage::Event(e, 2) if e.kind == EventKind::Update));

    let delete = stream.next().await.unwrap();
    assert!(matches!(delete, HubMessage::Event(e, 3) if e.kind == EventKind::Delete));

    hub.unsubscribe();
    let disposed = stream.next().await.unwrap();
    assert!(matches!(disposed, HubMessage::Disposed(None)));

    driver.await.unwrap().unwrap();
}
