//! Introspection - read-only projections for the registry and pub/sub panels
//!
//! The mediator records one [`PublishRecord`] per publish into a
//! [`PubSubActivity`] after dispatch has finished. Snapshots combine that
//! history with the registry listing; building them never touches dispatch
//! state.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::schema::{ComponentKey, ComponentSpec, EventEnvelope, EventKey};

/// Outcome of a single publish, as kept in the activity history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRecord {
    pub channel: String,
    pub event: String,
    pub publisher: ComponentKey,
    pub timestamp: i64,
    pub delivered: usize,
    pub unhandled: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
struct EventCounters {
    publish_count: u64,
    delivered_count: u64,
    unhandled_count: u64,
    failed_count: u64,
    last_publisher: Option<ComponentKey>,
    last_timestamp: Option<i64>,
}

/// Running publish counters plus a bounded history
#[derive(Debug)]
pub struct PubSubActivity {
    counters: BTreeMap<EventKey, EventCounters>,
    recent: VecDeque<PublishRecord>,
    capacity: usize,
}

impl PubSubActivity {
    pub fn new(capacity: usize) -> Self {
        Self {
            counters: BTreeMap::new(),
            recent: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn record(
        &mut self,
        envelope: &EventEnvelope,
        delivered: usize,
        unhandled: usize,
        failed: usize,
    ) {
        let counters = self.counters.entry(envelope.key()).or_default();
        counters.publish_count += 1;
        counters.delivered_count += delivered as u64;
        counters.unhandled_count += unhandled as u64;
        counters.failed_count += failed as u64;
        counters.last_publisher = Some(envelope.publisher());
        counters.last_timestamp = Some(envelope.timestamp);

        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(PublishRecord {
            channel: envelope.channel.clone(),
            event: envelope.event.clone(),
            publisher: envelope.publisher(),
            timestamp: envelope.timestamp,
            delivered,
            unhandled,
            failed,
        });
    }

    pub fn total_published(&self) -> u64 {
        self.counters.values().map(|c| c.publish_count).sum()
    }
}

/// One (channel, event) row of the pub/sub status table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubRow {
    pub channel: String,
    pub event: String,
    /// Registered components subscribed, in registration order
    pub subscribers: Vec<ComponentKey>,
    /// Registered components declaring the pair in their publication spec
    pub publishers: Vec<ComponentKey>,
    pub publish_count: u64,
    pub delivered_count: u64,
    pub unhandled_count: u64,
    pub failed_count: u64,
    pub last_publisher: Option<ComponentKey>,
    pub last_timestamp: Option<i64>,
}

impl PubSubRow {
    fn empty(key: &EventKey) -> Self {
        Self {
            channel: key.channel.clone(),
            event: key.event.clone(),
            subscribers: Vec::new(),
            publishers: Vec::new(),
            publish_count: 0,
            delivered_count: 0,
            unhandled_count: 0,
            failed_count: 0,
            last_publisher: None,
            last_timestamp: None,
        }
    }
}

/// Snapshot consumed by the pub/sub status panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubStatus {
    /// Sorted by (channel, event)
    pub rows: Vec<PubSubRow>,
    /// Oldest first
    pub recent: Vec<PublishRecord>,
    pub total_published: u64,
}

impl PubSubStatus {
    pub fn row(&self, channel: &str, event: &str) -> Option<&PubSubRow> {
        self.rows
            .iter()
            .find(|r| r.channel == channel && r.event == event)
    }

    /// Pairs someone subscribes to that nobody has published yet
    pub fn never_published(&self) -> Vec<EventKey> {
        self.rows
            .iter()
            .filter(|r| !r.subscribers.is_empty() && r.publish_count == 0)
            .map(|r| EventKey::new(&r.channel, &r.event))
            .collect()
    }
}

/// Combine a registry listing with recorded activity
pub fn build_status(components: &[ComponentSpec], activity: &PubSubActivity) -> PubSubStatus {
    let mut rows: BTreeMap<EventKey, PubSubRow> = BTreeMap::new();

    for component in components {
        let owner = component.key();
        for key in component.subscription_spec.keys() {
            let row = rows.entry(key.clone()).or_insert_with(|| PubSubRow::empty(&key));
            if !row.subscribers.contains(&owner) {
                row.subscribers.push(owner.clone());
            }
        }
        for key in component.publication_spec.keys() {
            let row = rows.entry(key.clone()).or_insert_with(|| PubSubRow::empty(&key));
            if !row.publishers.contains(&owner) {
                row.publishers.push(owner.clone());
            }
        }
    }

    for (key, counters) in &activity.counters {
        let row = rows.entry(key.clone()).or_insert_with(|| PubSubRow::empty(key));
        row.publish_count = counters.publish_count;
        row.delivered_count = counters.delivered_count;
        row.unhandled_count = counters.unhandled_count;
        row.failed_count = counters.failed_count;
        row.last_publisher = counters.last_publisher.clone();
        row.last_timestamp = counters.last_timestamp;
    }

    PubSubStatus {
        rows: rows.into_values().collect(),
        recent: activity.recent.iter().cloned().collect(),
        total_published: activity.total_published(),
    }
}
