//! Test doubles and common utilities for contract tests
//!
//! This module provides in-memory stand-ins for the IP resolver and the
//! provider API so the update protocol can be exercised without a network.

#![allow(dead_code)]

use cdu_core::error::{Error, Result};
use cdu_core::traits::{DnsApi, DnsRecord, DnsSession, IpResolver, RecordType, Zone};
use cdu_core::{Credentials, RecordUpdater};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "test-token";
pub const ZONE: &str = "example.com";

/// An IP resolver that always answers with the same address
pub struct StaticIpResolver {
    ip: String,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpResolver {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a resolver that shares its counter with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip.clone(),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpResolver for StaticIpResolver {
    async fn resolve(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// An IP resolver that replays scripted outcomes, then repeats `fallback`
pub struct ScriptedIpResolver {
    script: Mutex<VecDeque<Result<String>>>,
    fallback: String,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpResolver {
    pub fn new(script: Vec<Result<String>>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: fallback.to_string(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedIpResolver {
    async fn resolve(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A provider call observed by [`MockDnsApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Authenticate,
    FindZone(String),
    FindRecord(String),
    UpdateContent {
        name: String,
        content: String,
        proxied: bool,
    },
}

#[derive(Default)]
struct MockState {
    zones: HashMap<String, Zone>,
    records: HashMap<(String, String), DnsRecord>,
    calls: Vec<ApiCall>,
    record_type_filters: Vec<Option<RecordType>>,
    update_delay: Option<Duration>,
}

/// An in-memory provider that records every call
#[derive(Clone)]
pub struct MockDnsApi {
    valid_token: String,
    state: Arc<Mutex<MockState>>,
}

impl MockDnsApi {
    pub fn new(valid_token: &str) -> Self {
        Self {
            valid_token: valid_token.to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Provider with `example.com` holding the given records, all at 192.0.2.1
    pub fn with_records(names: &[&str]) -> Self {
        let api = Self::new(TOKEN);
        api.add_zone(ZONE);
        for name in names {
            api.add_record(ZONE, name, "192.0.2.1");
        }
        api
    }

    pub fn add_zone(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let id = format!("zone-{}", state.zones.len() + 1);
        state.zones.insert(
            name.to_string(),
            Zone {
                id,
                name: name.to_string(),
            },
        );
    }

    pub fn add_record(&self, zone: &str, name: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        let zone_id = state.zones[zone].id.clone();
        let id = format!("record-{}", state.records.len() + 1);
        state.records.insert(
            (zone_id, name.to_string()),
            DnsRecord {
                id,
                name: name.to_string(),
                content: content.to_string(),
                proxied: false,
            },
        );
    }

    /// Make every update_content() call take `delay`
    pub fn set_update_delay(&self, delay: Duration) {
        self.state.lock().unwrap().update_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Type filter passed with each record lookup, in call order
    pub fn record_type_filters(&self) -> Vec<Option<RecordType>> {
        self.state.lock().unwrap().record_type_filters.clone()
    }

    pub fn count(&self, matches: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    /// Names passed to update_content(), in call order
    pub fn updated_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::UpdateContent { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Current provider-side (content, proxied) of a record
    pub fn record(&self, zone: &str, name: &str) -> Option<(String, bool)> {
        let state = self.state.lock().unwrap();
        let zone_id = state.zones.get(zone)?.id.clone();
        state
            .records
            .get(&(zone_id, name.to_string()))
            .map(|r| (r.content.clone(), r.proxied))
    }
}

#[async_trait::async_trait]
impl DnsApi for MockDnsApi {
    async fn authenticate(&self, api_token: &str) -> Result<Box<dyn DnsSession>> {
        self.state.lock().unwrap().calls.push(ApiCall::Authenticate);
        if api_token != self.valid_token {
            return Err(Error::auth("Invalid API token"));
        }
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[async_trait::async_trait]
impl DnsSession for MockSession {
    async fn find_zone_by_name(&self, name: &str) -> Result<Option<Zone>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::FindZone(name.to_string()));
        Ok(state.zones.get(name).cloned())
    }

    async fn find_record_by_name(
        &self,
        zone: &Zone,
        name: &str,
        record_type: Option<RecordType>,
    ) -> Result<Option<DnsRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::FindRecord(name.to_string()));
        state.record_type_filters.push(record_type);
        Ok(state
            .records
            .get(&(zone.id.clone(), name.to_string()))
            .cloned())
    }

    async fn update_content(
        &self,
        zone: &Zone,
        record: &DnsRecord,
        content: &str,
        proxied: bool,
    ) -> Result<()> {
        let delay = self.state.lock().unwrap().update_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::UpdateContent {
            name: record.name.clone(),
            content: content.to_string(),
            proxied,
        });
        let stored = state
            .records
            .get_mut(&(zone.id.clone(), record.name.clone()))
            .ok_or_else(|| Error::provider("mock", "record vanished"))?;
        stored.content = content.to_string();
        stored.proxied = proxied;
        Ok(())
    }
}

/// Updater bound to `example.com` over `api`
pub fn updater_for(api: &MockDnsApi) -> RecordUpdater {
    RecordUpdater::new(Arc::new(api.clone()), Credentials::new(TOKEN, ZONE))
}

/// Owned record names
pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
