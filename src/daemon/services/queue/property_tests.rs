//! Property-based tests for queue invariants.
//!
//! # Tested Invariants
//!
//! - Buffered messages drain in exactly the order they were put
//! - Operations on one queue never affect another
//! - Every put is received exactly once across interleaved puts and gets
//! - Idle queues leave no registry entry behind
//!
//! # Running Tests
//!
//! ```bash
//! cargo test queue::property_tests
//! ```

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::future::pending;
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::daemon::services::queue::{QueueConfig, QueueService};

    /// Operation against a small set of queues.
    #[derive(Debug, Clone)]
    enum Op {
        Put(usize, Vec<u8>),
        Get(usize),
    }

    const QUEUES: [&str; 3] = ["alpha", "beta", "gamma"];

    // ============================================================================
    // Test Strategies - Input Generation
    // ============================================================================

    fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(any::<u8>(), 1..32)
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..QUEUES.len(), payload_strategy()).prop_map(|(q, data)| Op::Put(q, data)),
            (0..QUEUES.len()).prop_map(Op::Get),
        ]
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
    }

    // ============================================================================
    // Ordering and Isolation
    // ============================================================================

    proptest! {
        /// Invariant: a queue with no waiters is a FIFO buffer.
        #[test]
        fn drain_preserves_put_order(payloads in prop::collection::vec(payload_strategy(), 0..50)) {
            let rt = runtime();
            let service = QueueService::new(QueueConfig::default());

            for payload in &payloads {
                service.put("q", payload.clone());
            }
            prop_assert_eq!(service.len("q"), payloads.len());

            let drained: Vec<Vec<u8>> = rt.block_on(async {
                let mut out = Vec::new();
                while let Some(msg) = service.get("q", Duration::ZERO, pending()).await {
                    out.push(msg.data);
                }
                out
            });

            prop_assert_eq!(drained, payloads);
            prop_assert!(service.list_queues().is_empty());
        }

        /// Invariant: the service behaves like one independent FIFO per name.
        ///
        /// Runs an arbitrary sequence of puts and zero-timeout gets against
        /// a model of per-queue `VecDeque`s and compares every result.
        #[test]
        fn matches_per_queue_fifo_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let rt = runtime();
            let service = QueueService::new(QueueConfig::default());
            let mut model: HashMap<&str, VecDeque<Vec<u8>>> = HashMap::new();

            for op in ops {
                match op {
                    Op::Put(q, data) => {
                        service.put(QUEUES[q], data.clone());
                        model.entry(QUEUES[q]).or_default().push_back(data);
                    },
                    Op::Get(q) => {
                        let got = rt
                            .block_on(service.get(QUEUES[q], Duration::ZERO, pending()))
                            .map(|msg| msg.data);
                        let expected = model.get_mut(QUEUES[q]).and_then(VecDeque::pop_front);
                        prop_assert_eq!(got, expected);
                    },
                }

                for name in QUEUES {
                    let expected = model.get(name).map_or(0, VecDeque::len);
                    prop_assert_eq!(service.len(name), expected);
                    prop_assert_eq!(service.waiter_count(name), 0);
                }
            }

            let live: usize = model.values().filter(|q| !q.is_empty()).count();
            prop_assert_eq!(service.list_queues().len(), live);
        }

        /// Invariant: with waiters present, each put is received exactly once.
        #[test]
        fn waiters_receive_each_put_once(
            waiters in 1usize..8,
            extra in 0usize..8,
        ) {
            let rt = runtime();
            let service = QueueService::new(QueueConfig::default());
            let total = waiters + extra;

            let received: Vec<String> = rt.block_on(async {
                let mut handles = Vec::new();
                for _ in 0..waiters {
                    let svc = service.clone();
                    handles.push(tokio::spawn(async move {
                        svc.get("q", Duration::from_secs(5), pending()).await
                    }));
                }
                while service.waiter_count("q") < waiters {
                    tokio::task::yield_now().await;
                }

                for i in 0..total {
                    service.put("q", format!("m{i}"));
                }

                let mut out = Vec::new();
                for handle in handles {
                    if let Some(msg) = handle.await.unwrap() {
                        out.push(String::from_utf8_lossy(&msg.data).into_owned());
                    }
                }
                while let Some(msg) = service.get("q", Duration::ZERO, pending()).await {
                    out.push(String::from_utf8_lossy(&msg.data).into_owned());
                }
                out
            });

            let expected: Vec<String> = (0..total).map(|i| format!("m{i}")).collect();
            prop_assert_eq!(received, expected);
        }
    }
}
