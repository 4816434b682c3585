// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline behavior against the SQLite-backed harness.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use sitekit_core::{DeliveryChannel, DeliveryMethod, FormType};
use sitekit_leads::{LeadLog, LeadPipeline, ToastKind};
use sitekit_test_utils::{
    sample_fields, sample_lead, Behavior, FailingKeyValueStore, MemoryKeyValueStore,
    MockDeliveryChannel, TestHarness,
};

fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn rejecting_then_accepting_channel_reports_second() {
    let a = MockDeliveryChannel::rejecting("a").into_arc();
    let b = MockDeliveryChannel::accepting("b").into_arc();
    let harness = TestHarness::builder()
        .with_channel(a.clone())
        .with_channel(b.clone())
        .build()
        .await
        .unwrap();

    let submitted = fields(&[("name", "A"), ("email", "a@b.com"), ("phone", "9999999999")]);
    let outcome = harness.pipeline.submit(&submitted, FormType::Contact).await;

    assert!(outcome.success);
    assert_eq!(outcome.method, DeliveryMethod::Channel("b".into()));
    assert_eq!(outcome.toast().kind, ToastKind::Success);

    let entries = harness.pipeline.log().entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lead.lead_id, outcome.lead_id);
    assert_eq!(entries[0].lead.form_type, FormType::Contact);
    assert_eq!(entries[0].method, DeliveryMethod::Channel("b".into()));
    assert_eq!(a.attempt_count().await, 1);
    assert_eq!(b.attempt_count().await, 1);
}

#[tokio::test]
async fn first_success_short_circuits_the_chain() {
    for winner in 0..4 {
        let channels: Vec<Arc<MockDeliveryChannel>> = (0..4)
            .map(|i| {
                let name = format!("c{i}");
                if i == winner {
                    MockDeliveryChannel::accepting(&name).into_arc()
                } else {
                    MockDeliveryChannel::rejecting(&name).into_arc()
                }
            })
            .collect();
        let mut builder = TestHarness::builder();
        for channel in &channels {
            builder = builder.with_channel(channel.clone());
        }
        let harness = builder.build().await.unwrap();

        let outcome = harness.pipeline.submit_lead(sample_lead()).await;

        assert_eq!(outcome.method, DeliveryMethod::Channel(format!("c{winner}")));
        for (i, channel) in channels.iter().enumerate() {
            let expected = usize::from(i <= winner);
            assert_eq!(channel.attempt_count().await, expected, "channel c{i}");
        }
    }
}

#[tokio::test]
async fn all_channels_failing_keeps_lead_locally() {
    let harness = TestHarness::builder()
        .with_channel(MockDeliveryChannel::rejecting("a").into_arc())
        .with_channel(MockDeliveryChannel::rejecting("b").into_arc())
        .build()
        .await
        .unwrap();
    let before = harness.pipeline.log().entries().await.unwrap().len();

    let outcome = harness.pipeline.submit(&sample_fields(), FormType::QuoteRequest).await;

    assert!(outcome.success);
    assert_eq!(outcome.method, DeliveryMethod::Local);
    assert_eq!(outcome.toast().kind, ToastKind::Warning);
    let entries = harness.pipeline.log().entries().await.unwrap();
    assert_eq!(entries.len(), before + 1);
    assert_eq!(entries[before].lead.lead_id, outcome.lead_id);
    assert!(entries[before].is_pending());
}

#[tokio::test(start_paused = true)]
async fn hanging_channel_falls_through_after_timeout() {
    let slow = MockDeliveryChannel::hanging("slow").into_arc();
    let fast = MockDeliveryChannel::accepting("fast").into_arc();
    let log = LeadLog::new(Arc::new(MemoryKeyValueStore::new()), "leads", 10);
    let pipeline = LeadPipeline::new(
        vec![slow.clone() as Arc<dyn DeliveryChannel>, fast.clone()],
        log,
        Duration::from_secs(10),
    );

    let outcome = pipeline.submit_lead(sample_lead()).await;

    assert_eq!(outcome.method, DeliveryMethod::Channel("fast".into()));
    assert_eq!(slow.attempt_count().await, 1);
}

#[tokio::test]
async fn storage_failure_is_the_only_hard_failure() {
    let log = LeadLog::new(Arc::new(FailingKeyValueStore), "leads", 10);
    let channel: Arc<dyn DeliveryChannel> = MockDeliveryChannel::accepting("web3forms").into_arc();
    let pipeline = LeadPipeline::new(vec![channel], log, Duration::from_secs(10));

    let outcome = pipeline.submit_lead(sample_lead()).await;

    assert!(!outcome.success);
    assert_eq!(outcome.method, DeliveryMethod::Channel("web3forms".into()));
    assert_eq!(outcome.toast().kind, ToastKind::Error);
}

#[tokio::test]
async fn notifier_runs_detached_and_failures_do_not_matter() {
    let notifier = MockDeliveryChannel::rejecting("telegram")
        .with_delay(Duration::from_millis(20))
        .into_arc();
    let harness = TestHarness::builder()
        .with_channel(MockDeliveryChannel::accepting("web3forms").into_arc())
        .with_notifier(notifier.clone())
        .build()
        .await
        .unwrap();

    let outcome = harness.pipeline.submit_lead(sample_lead()).await;
    assert!(outcome.success);

    harness.pipeline.flush_notifications().await;
    assert_eq!(notifier.attempts().await, vec![outcome.lead_id]);
}

#[tokio::test]
async fn sync_pending_redelivers_local_leads() {
    let channel = MockDeliveryChannel::accepting("formspree")
        .with_script([Behavior::Reject("offline".into())])
        .into_arc();
    let harness = TestHarness::builder()
        .with_channel(channel.clone())
        .build()
        .await
        .unwrap();

    let outcome = harness.pipeline.submit_lead(sample_lead()).await;
    assert!(outcome.method.is_local());

    let report = harness.pipeline.sync_pending().await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.delivered, 1);

    let entries = harness.pipeline.log().entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].method, DeliveryMethod::Channel("formspree".into()));
    assert!(harness.pipeline.log().pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_syncs_deliver_each_lead_once() {
    let channel = MockDeliveryChannel::accepting("formspree")
        .with_script([Behavior::Reject("offline".into())])
        .with_delay(Duration::from_millis(50))
        .into_arc();
    let harness = TestHarness::builder()
        .with_channel(channel.clone())
        .build()
        .await
        .unwrap();
    let outcome = harness.pipeline.submit_lead(sample_lead()).await;
    assert!(outcome.method.is_local());

    let (first, second) = tokio::join!(
        harness.pipeline.sync_pending(),
        harness.pipeline.sync_pending()
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.delivered + second.delivered, 1);
    assert_eq!(first.attempted + second.attempted, 1);
    // One rejected submission plus exactly one delivery during sync.
    assert_eq!(channel.attempt_count().await, 2);
}

#[tokio::test]
async fn log_evicts_oldest_on_overflow() {
    let harness = TestHarness::builder()
        .with_log_capacity(3)
        .build()
        .await
        .unwrap();

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(harness.pipeline.submit(&sample_fields(), FormType::Contact).await.lead_id);
    }

    let stored: Vec<_> = harness
        .pipeline
        .log()
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.lead.lead_id)
        .collect();
    assert_eq!(stored, ids[2..].to_vec());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_submission_is_logged_whatever_the_chain(outcomes in prop::collection::vec(any::<bool>(), 0..5)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let channels: Vec<Arc<dyn DeliveryChannel>> = outcomes
                .iter()
                .enumerate()
                .map(|(i, ok)| {
                    let name = format!("c{i}");
                    let channel = if *ok {
                        MockDeliveryChannel::accepting(&name)
                    } else {
                        MockDeliveryChannel::rejecting(&name)
                    };
                    channel.into_arc() as Arc<dyn DeliveryChannel>
                })
                .collect();
            let log = LeadLog::new(Arc::new(MemoryKeyValueStore::new()), "leads", 50);
            let pipeline = LeadPipeline::new(channels, log, Duration::from_secs(10));

            let outcome = pipeline.submit_lead(sample_lead()).await;

            let expected = outcomes
                .iter()
                .position(|ok| *ok)
                .map(|i| DeliveryMethod::Channel(format!("c{i}")))
                .unwrap_or(DeliveryMethod::Local);
            assert!(outcome.success);
            assert_eq!(outcome.method, expected);
            let entries = pipeline.log().entries().await.unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].lead.lead_id, outcome.lead_id);
        });
    }
}
