//! End-to-end scenarios for the weighted distribution algorithm: warm-up
//! convergence, variable packet sizes, failover, and recovery.
//!
//! These drive the public `selector`/`dispatch`/`health` surface directly
//! against `wiremock`-backed fake analyzers rather than going through the
//! HTTP ingest layer, which already has its own coverage in `ingest.rs`.

use std::sync::Arc;
use std::time::Duration;

use log_distributor::config::{AnalyzerSpec, Tunables};
use log_distributor::counters::Counters;
use log_distributor::packet::{LogMessage, LogPacket};
use log_distributor::registry::AnalyzerRegistry;
use log_distributor::selector;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn packet(id: &str, n: usize) -> LogPacket {
    LogPacket {
        packet_id: id.to_string(),
        agent_id: "agent-1".to_string(),
        messages: (0..n)
            .map(|i| LogMessage {
                level: "info".to_string(),
                message: format!("line {i}"),
                extra: Default::default(),
            })
            .collect(),
        timestamp: None,
        checksum: None,
        total_messages: None,
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(check(), "condition never became true within timeout");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn warm_up_distribution_converges_to_configured_weights() {
    let mut servers = Vec::new();
    let mut specs = Vec::new();
    for (id, weight) in [("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 0.4)] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        specs.push(AnalyzerSpec {
            id: id.to_string(),
            endpoint: format!("{}/ingest", server.uri()),
            weight,
        });
        servers.push(server);
    }

    let registry = Arc::new(AnalyzerRegistry::new(specs));
    let counters = Arc::new(Counters::new());
    let tunables = Arc::new(Tunables {
        worker_max: 8,
        ..Tunables::default()
    });

    let (dispatch, _handles) = log_distributor::dispatch::DispatchPipeline::new(
        registry.clone(),
        counters.clone(),
        tunables.clone(),
    );

    const TOTAL_PACKETS: u64 = 10_000;
    for i in 0..TOTAL_PACKETS {
        let snapshot = registry.snapshot();
        let total = counters.total_messages_processed();
        let target = selector::select(&snapshot, total, 1, tunables.deficit_threshold)
            .expect("an analyzer is always online in this scenario");
        dispatch
            .enqueue(packet(&format!("p{i}"), 1), target)
            .await;
    }

    wait_until(|| counters.total_messages_processed() == TOTAL_PACKETS).await;

    for (index, expected_weight) in [0.1, 0.2, 0.3, 0.4].into_iter().enumerate() {
        let share = registry.runtime(index).message_count() as f64 / TOTAL_PACKETS as f64;
        let deviation = (share - expected_weight).abs();
        assert!(
            deviation <= 0.02,
            "analyzer {index} share {share:.4} deviates from weight {expected_weight} by {deviation:.4}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn variable_packet_sizes_still_converge_to_weights() {
    let mut specs = Vec::new();
    let mut servers = Vec::new();
    for (id, weight) in [("a", 0.25), ("b", 0.75)] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        specs.push(AnalyzerSpec {
            id: id.to_string(),
            endpoint: format!("{}/ingest", server.uri()),
            weight,
        });
        servers.push(server);
    }

    let registry = Arc::new(AnalyzerRegistry::new(specs));
    let counters = Arc::new(Counters::new());
    let tunables = Arc::new(Tunables {
        worker_max: 8,
        ..Tunables::default()
    });
    let (dispatch, _handles) = log_distributor::dispatch::DispatchPipeline::new(
        registry.clone(),
        counters.clone(),
        tunables.clone(),
    );

    // Packet sizes cycle 1..=20, matching the spec's variable-size scenario.
    let sizes: Vec<u64> = (0..2_000).map(|i| (i % 20) + 1).collect();
    let expected_total: u64 = sizes.iter().sum();

    for (i, size) in sizes.iter().enumerate() {
        let snapshot = registry.snapshot();
        let total = counters.total_messages_processed();
        let target = selector::select(&snapshot, total, *size, tunables.deficit_threshold)
            .expect("an analyzer is always online in this scenario");
        dispatch
            .enqueue(packet(&format!("p{i}"), *size as usize), target)
            .await;
    }

    wait_until(|| counters.total_messages_processed() == expected_total).await;

    for (index, expected_weight) in [0.25, 0.75].into_iter().enumerate() {
        let share = registry.runtime(index).message_count() as f64 / expected_total as f64;
        assert!(
            (share - expected_weight).abs() <= 0.02,
            "analyzer {index} share {share:.4} deviates from weight {expected_weight}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_analyzer_is_taken_offline_and_traffic_shifts() {
    let good = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&good)
        .await;

    let bad = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&bad)
        .await;

    let specs = vec![
        AnalyzerSpec {
            id: "good".to_string(),
            endpoint: format!("{}/ingest", good.uri()),
            weight: 0.5,
        },
        AnalyzerSpec {
            id: "bad".to_string(),
            endpoint: format!("{}/ingest", bad.uri()),
            weight: 0.5,
        },
    ];

    let registry = Arc::new(AnalyzerRegistry::new(specs));
    let counters = Arc::new(Counters::new());
    let tunables = Arc::new(Tunables {
        worker_max: 4,
        max_consecutive_failures: 3,
        ..Tunables::default()
    });
    let (dispatch, _handles) = log_distributor::dispatch::DispatchPipeline::new(
        registry.clone(),
        counters.clone(),
        tunables.clone(),
    );

    // Drive enough traffic at the failing analyzer directly to push it
    // offline, bypassing the selector so the scenario is deterministic.
    for i in 0..3 {
        dispatch.enqueue(packet(&format!("bad{i}"), 1), 1).await;
    }
    wait_until(|| !registry.runtime(1).is_online()).await;

    // From here on the selector must never route to the offline analyzer.
    for i in 0..50 {
        let snapshot = registry.snapshot();
        let total = counters.total_messages_processed();
        let target = selector::select(&snapshot, total, 1, tunables.deficit_threshold)
            .expect("the healthy analyzer is still online");
        assert_eq!(target, 0, "selector must not route to an offline analyzer");
        dispatch.enqueue(packet(&format!("ok{i}"), 1), target).await;
    }

    wait_until(|| registry.runtime(0).message_count() == 50).await;
    assert_eq!(registry.runtime(1).message_count(), 0);
}

#[tokio::test]
async fn offline_analyzer_recovers_after_cooldown_via_sweep() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = Arc::new(AnalyzerRegistry::new(vec![AnalyzerSpec {
        id: "a".to_string(),
        endpoint: format!("{}/ingest", server.uri()),
        weight: 1.0,
    }]));
    let tunables = Tunables {
        max_consecutive_failures: 1,
        offline_timeout: Duration::from_millis(0),
        ..Tunables::default()
    };

    log_distributor::health::record_failure(&registry, 0, &tunables);
    assert!(!registry.runtime(0).is_online());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let promoted = log_distributor::health::sweep(&registry, &tunables);
    assert_eq!(promoted, 1);
    assert!(registry.runtime(0).is_online());
}

#[tokio::test]
async fn no_target_when_every_analyzer_is_offline() {
    let registry = Arc::new(AnalyzerRegistry::new(vec![
        AnalyzerSpec {
            id: "a".to_string(),
            endpoint: "http://127.0.0.1:1/ingest".to_string(),
            weight: 0.5,
        },
        AnalyzerSpec {
            id: "b".to_string(),
            endpoint: "http://127.0.0.1:1/ingest".to_string(),
            weight: 0.5,
        },
    ]));
    let tunables = Tunables {
        max_consecutive_failures: 1,
        ..Tunables::default()
    };

    log_distributor::health::record_failure(&registry, 0, &tunables);
    log_distributor::health::record_failure(&registry, 1, &tunables);

    let snapshot = registry.snapshot();
    assert_eq!(selector::select(&snapshot, 0, 1, tunables.deficit_threshold), None);
}
