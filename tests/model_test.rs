mod common;

use orderflow::config::PipelineConfig;
use orderflow::error::OrderError;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Drives random mutations through the pipeline, delivering after each one,
/// and checks the store against a plain map.
#[tokio::test]
async fn test_random_mutations_match_model() {
    let p = common::pipeline(PipelineConfig::default());
    let mut model: HashMap<i64, i64> = HashMap::new();
    let mut rng = rand::thread_rng();

    for _ in 0..500 {
        let id = rng.gen_range(1..=10);
        let quantity = rng.gen_range(1..1000);
        let payload = common::order(id, "widget", quantity);

        match rng.gen_range(0..3) {
            0 => {
                let result = p.coordinator.create(&payload, None).await;
                if model.contains_key(&id) {
                    assert!(matches!(result, Err(OrderError::Conflict(_))));
                } else {
                    assert!(result.is_ok());
                    model.insert(id, quantity);
                }
            }
            1 => {
                let result = p.coordinator.update(id, &payload, None).await;
                if model.contains_key(&id) {
                    assert!(result.is_ok());
                    model.insert(id, quantity);
                } else {
                    assert!(matches!(result, Err(OrderError::NotFound(_))));
                }
            }
            _ => {
                let result = p.coordinator.delete(id, None).await;
                if model.remove(&id).is_some() {
                    assert!(result.is_ok());
                } else {
                    assert!(matches!(result, Err(OrderError::NotFound(_))));
                }
            }
        }
        p.worker.drain().await.unwrap();
    }

    let stored: HashMap<i64, Decimal> = common::stored_orders(&p.store)
        .await
        .into_iter()
        .map(|o| (o.order_id, o.quantity))
        .collect();
    let expected: HashMap<i64, Decimal> = model
        .into_iter()
        .map(|(id, q)| (id, Decimal::from(q)))
        .collect();
    assert_eq!(stored, expected);
    assert!(p.queue.is_empty().await);
}
