//! Test doubles and common utilities for reconciler contract tests
//!
//! The doubles record every call so tests can assert not only on outcomes
//! but on which provider operations were (and were not) issued.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{Address, AddressDetector, AddressSource, Registrar};
use ddns_core::{AppConfig, Credentials, RecordType, Target};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A record held by the fake provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeRecord {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    pub record_type: RecordType,
    pub content: String,
    pub proxied: bool,
}

#[derive(Debug, Default)]
struct ProviderState {
    credentials_valid: bool,
    zones: HashMap<String, String>,
    records: Vec<FakeRecord>,
    next_id: usize,
    calls: Vec<String>,
    fail_create: bool,
    fail_update: bool,
    fail_delete: bool,
    fail_get: bool,
}

/// In-memory provider that records calls
///
/// Clones share state, so a test can keep one handle and give the
/// reconciler another.
#[derive(Debug, Clone)]
pub struct FakeRegistrar {
    state: Arc<Mutex<ProviderState>>,
}

impl FakeRegistrar {
    /// A provider that accepts credentials and knows one zone
    pub fn with_zone(zone_name: &str, zone_id: &str) -> Self {
        let mut state = ProviderState {
            credentials_valid: true,
            ..Default::default()
        };
        state.zones.insert(zone_name.to_string(), zone_id.to_string());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Seed an existing record and return its id
    pub fn seed_record(&self, zone_id: &str, name: &str, record_type: RecordType, content: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("seeded-{}", state.next_id);
        state.records.push(FakeRecord {
            id: id.clone(),
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            record_type,
            content: content.to_string(),
            proxied: false,
        });
        id
    }

    pub fn reject_credentials(&self) {
        self.state.lock().unwrap().credentials_valid = false;
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_update(&self) {
        self.state.lock().unwrap().fail_update = true;
    }

    pub fn fail_delete(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }

    pub fn fail_get(&self) {
        self.state.lock().unwrap().fail_get = true;
    }

    /// Every call issued, in order, by operation name
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls to a given operation
    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    /// Number of create/update/delete calls
    pub fn write_calls(&self) -> usize {
        self.call_count("create_record")
            + self.call_count("update_record")
            + self.call_count("delete_record")
    }

    pub fn records(&self) -> Vec<FakeRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn records_named(&self, name: &str, record_type: RecordType) -> Vec<FakeRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.name == name && r.record_type == record_type)
            .collect()
    }

    fn record(&self, op: &str) {
        self.state.lock().unwrap().calls.push(op.to_string());
    }
}

#[async_trait::async_trait]
impl Registrar for FakeRegistrar {
    async fn verify_credentials(&self) -> Result<bool> {
        self.record("verify_credentials");
        Ok(self.state.lock().unwrap().credentials_valid)
    }

    async fn find_zone_id(&self, zone_name: &str) -> Result<Option<String>> {
        self.record("find_zone_id");
        Ok(self.state.lock().unwrap().zones.get(zone_name).cloned())
    }

    async fn find_record_id(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<Option<String>> {
        self.record("find_record_id");
        Ok(self
            .state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.zone_id == zone_id && r.name == fqdn && r.record_type == record_type)
            .map(|r| r.id.clone()))
    }

    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        address: &Address,
        record_type: RecordType,
        proxied: bool,
    ) -> Result<String> {
        self.record("create_record");
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(Error::registrar("HTTP 400 Bad Request"));
        }
        state.next_id += 1;
        let id = format!("created-{}", state.next_id);
        state.records.push(FakeRecord {
            id: id.clone(),
            zone_id: zone_id.to_string(),
            name: fqdn.to_string(),
            record_type,
            content: address.to_string(),
            proxied,
        });
        Ok(id)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        address: &Address,
        record_type: RecordType,
        proxied: bool,
    ) -> Result<()> {
        self.record("update_record");
        let mut state = self.state.lock().unwrap();
        if state.fail_update {
            return Err(Error::registrar("HTTP 500 Internal Server Error"));
        }
        let record = state
            .records
            .iter_mut()
            .find(|r| r.zone_id == zone_id && r.id == record_id)
            .ok_or_else(|| Error::registrar("HTTP 404 Not Found"))?;
        record.name = fqdn.to_string();
        record.content = address.to_string();
        record.record_type = record_type;
        record.proxied = proxied;
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.record("delete_record");
        let mut state = self.state.lock().unwrap();
        if state.fail_delete {
            return Err(Error::registrar("HTTP 403 Forbidden"));
        }
        let before = state.records.len();
        state
            .records
            .retain(|r| !(r.zone_id == zone_id && r.id == record_id));
        if state.records.len() == before {
            return Err(Error::registrar("HTTP 404 Not Found"));
        }
        Ok(())
    }

    async fn get_record_content(&self, zone_id: &str, record_id: &str) -> Result<Option<Address>> {
        self.record("get_record_content");
        let state = self.state.lock().unwrap();
        if state.fail_get {
            return Err(Error::registrar("HTTP 502 Bad Gateway"));
        }
        Ok(state
            .records
            .iter()
            .find(|r| r.zone_id == zone_id && r.id == record_id)
            .map(|r| Address::new(r.content.clone())))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Address source that replays scripted results
///
/// Results are consumed in order; the last one repeats forever.
#[derive(Clone)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Option<&'static str>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// Always resolves to `address`
    pub fn fixed(address: &'static str) -> Self {
        Self::script(vec![Some(address)])
    }

    /// Always fails
    pub fn failing() -> Self {
        Self::script(vec![None])
    }

    /// Replay `results` (`None` = failure)
    pub fn script(results: Vec<Option<&'static str>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(results.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedSource {
    async fn resolve(&self, _record_type: RecordType) -> Result<Address> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().copied().flatten()
        };
        next.map(Address::new)
            .ok_or_else(|| Error::detection("All IPv4 detection methods failed"))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// What a scripted detector does when attempted
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Succeed(&'static str),
    Empty,
    Fail,
}

/// Detection step that counts attempts
#[derive(Clone)]
pub struct ScriptedDetector {
    name: String,
    step: Step,
    attempts: Arc<AtomicUsize>,
}

impl ScriptedDetector {
    pub fn new(name: impl Into<String>, step: Step) -> Self {
        Self {
            name: name.into(),
            step,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressDetector for ScriptedDetector {
    async fn attempt(&self) -> Result<Option<Address>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.step {
            Step::Succeed(address) => Ok(Some(Address::new(address))),
            Step::Empty => Ok(None),
            Step::Fail => Err(Error::http(format!("{} unreachable", self.name))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Configuration for zone/subdomain/type with a token and deletion off
pub fn config_for(zone: &str, subdomain: Option<&str>, record_type: RecordType) -> AppConfig {
    let mut target = Target::new(zone, record_type);
    if let Some(sub) = subdomain {
        target = target.with_subdomain(sub);
    }
    AppConfig {
        credentials: Some(Credentials::Token("test-token".to_string())),
        target,
        ..AppConfig::default()
    }
}
