//! UDM Context Management
//!
//! Per-subscriber UE contexts keyed by SUPI. The context is built once at
//! service start and shared by every request handler through an `Arc`.

use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use ogs_sbi::constants::{api, resource};
use ogs_sbi::SbiServiceType;

use crate::models::{AccessType, AmfRegistration};

/// Resource named by a `Location` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationUri {
    AmfRegistration(AccessType),
    SmfRegistration(i32),
}

/// UDM UE context
#[derive(Debug)]
pub struct UdmUe {
    /// SUPI
    pub supi: String,
    /// UDR serving this subscriber, empty until resolved
    udr_uri: RwLock<String>,
    amf_3gpp_access: RwLock<Option<Arc<AmfRegistration>>>,
    amf_non_3gpp_access: RwLock<Option<Arc<AmfRegistration>>>,
    /// PDU session ID -> SMF context established
    smf_registrations: DashMap<i32, bool>,
}

impl UdmUe {
    pub fn new(supi: impl Into<String>) -> Self {
        Self {
            supi: supi.into(),
            udr_uri: RwLock::new(String::new()),
            amf_3gpp_access: RwLock::new(None),
            amf_non_3gpp_access: RwLock::new(None),
            smf_registrations: DashMap::new(),
        }
    }

    pub fn udr_uri(&self) -> String {
        self.udr_uri
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_udr_uri(&self, uri: impl Into<String>) {
        *self.udr_uri.write().unwrap_or_else(PoisonError::into_inner) = uri.into();
    }

    fn amf_slot(&self, access: AccessType) -> &RwLock<Option<Arc<AmfRegistration>>> {
        match access {
            AccessType::ThreeGppAccess => &self.amf_3gpp_access,
            AccessType::NonThreeGppAccess => &self.amf_non_3gpp_access,
        }
    }

    pub fn amf_context_exists(&self, access: AccessType) -> bool {
        self.amf_slot(access)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current registration record for `access`
    pub fn amf_context(&self, access: AccessType) -> Option<Arc<AmfRegistration>> {
        self.amf_slot(access)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `registration`, returning the record it replaced
    pub fn set_amf_context(
        &self,
        access: AccessType,
        registration: AmfRegistration,
    ) -> Option<Arc<AmfRegistration>> {
        let mut slot = self
            .amf_slot(access)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        slot.replace(Arc::new(registration))
    }

    /// Clear the slot only while it still holds `expected`
    pub fn clear_amf_context_if(
        &self,
        access: AccessType,
        expected: &Arc<AmfRegistration>,
    ) -> bool {
        let mut slot = self
            .amf_slot(access)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(current) if Arc::ptr_eq(current, expected) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Registered with `pei` on either access
    pub fn has_pei(&self, pei: &str) -> bool {
        [AccessType::ThreeGppAccess, AccessType::NonThreeGppAccess]
            .into_iter()
            .filter_map(|access| self.amf_context(access))
            .any(|reg| reg.has_pei(pei))
    }

    pub fn smf_context_exists(&self, pdu_session_id: i32) -> bool {
        self.smf_registrations.contains_key(&pdu_session_id)
    }

    /// Mark the SMF context for `pdu_session_id`. Returns whether it already existed.
    pub fn create_smf_context(&self, pdu_session_id: i32) -> bool {
        self.smf_registrations.insert(pdu_session_id, true).is_some()
    }

    pub fn remove_smf_context(&self, pdu_session_id: i32) -> bool {
        self.smf_registrations.remove(&pdu_session_id).is_some()
    }

    /// No AMF registration on either access and no SMF session
    pub fn is_idle(&self) -> bool {
        !self.amf_context_exists(AccessType::ThreeGppAccess)
            && !self.amf_context_exists(AccessType::NonThreeGppAccess)
            && self.smf_registrations.is_empty()
    }
}

/// UDM Context
#[derive(Debug)]
pub struct UdmContext {
    ue_list: DashMap<String, Arc<UdmUe>>,
    /// Advertised `http://host:port` of this UDM
    sbi_uri: String,
    /// Used for load reporting only
    max_num_of_ue: usize,
}

impl UdmContext {
    pub fn new(sbi_uri: impl Into<String>, max_num_of_ue: usize) -> Self {
        let sbi_uri = sbi_uri.into().trim_end_matches('/').to_string();
        log::info!("UDM context initialized (sbi={sbi_uri}, max_ue={max_num_of_ue})");
        Self {
            ue_list: DashMap::new(),
            sbi_uri,
            max_num_of_ue,
        }
    }

    pub fn sbi_uri(&self) -> &str {
        &self.sbi_uri
    }

    pub fn ue_find_by_supi(&self, supi: &str) -> Option<Arc<UdmUe>> {
        self.ue_list.get(supi).map(|ue| ue.clone())
    }

    /// Find the UE for `supi`, inserting an empty one exactly once if missing
    pub fn ue_find_or_add(&self, supi: &str) -> Arc<UdmUe> {
        if let Some(ue) = self.ue_find_by_supi(supi) {
            return ue;
        }

        self.ue_list
            .entry(supi.to_string())
            .or_insert_with(|| {
                log::debug!("[{supi}] UDM UE added");
                Arc::new(UdmUe::new(supi))
            })
            .clone()
    }

    /// First UE registered with `pei` on either access
    pub fn ue_find_by_pei(&self, pei: &str) -> Option<Arc<UdmUe>> {
        self.ue_list
            .iter()
            .find(|entry| entry.value().has_pei(pei))
            .map(|entry| entry.value().clone())
    }

    /// Evict the context for `supi` once it is idle and no request holds it.
    /// Checked under the map's shard lock, so a concurrent `ue_find_or_add`
    /// either sees the entry before removal or inserts a fresh one.
    pub fn ue_remove(&self, supi: &str) -> bool {
        let removed = self
            .ue_list
            .remove_if(supi, |_, ue| Arc::strong_count(ue) == 1 && ue.is_idle())
            .is_some();
        if removed {
            log::debug!("[{supi}] UDM UE removed");
        }
        removed
    }

    pub fn ue_count(&self) -> usize {
        self.ue_list.len()
    }

    /// UE load percentage
    pub fn get_ue_load(&self) -> i32 {
        if self.max_num_of_ue == 0 {
            return 0;
        }
        ((self.ue_count() * 100) / self.max_num_of_ue) as i32
    }

    pub fn location_uri(&self, ue_id: &str, location: LocationUri) -> String {
        let base = format!(
            "{}/{}/{}/{}/{}",
            self.sbi_uri,
            SbiServiceType::NudmUecm,
            api::V1,
            ue_id,
            resource::REGISTRATIONS
        );
        match location {
            LocationUri::AmfRegistration(access) => format!("{base}/{}", access.resource()),
            LocationUri::SmfRegistration(pdu_session_id) => {
                format!("{base}/{}/{pdu_session_id}", resource::SMF_REGISTRATIONS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Guami, PlmnId};

    fn registration(amf_id: &str, pei: Option<&str>) -> AmfRegistration {
        AmfRegistration {
            amf_instance_id: "amf-1".to_string(),
            dereg_callback_uri: "http://amf1/dereg".to_string(),
            guami: Guami::new(PlmnId::new("001", "01"), amf_id),
            pei: pei.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_ue_find_or_add_is_idempotent() {
        let ctx = UdmContext::new("http://127.0.0.12:7777", 16);
        let a = ctx.ue_find_or_add("imsi-001010000000001");
        let b = ctx.ue_find_or_add("imsi-001010000000001");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(ctx.ue_count(), 1);
        assert!(ctx.ue_find_by_supi("imsi-001010000000002").is_none());
    }

    #[test]
    fn test_ue_find_or_add_concurrent() {
        let ctx = Arc::new(UdmContext::new("http://udm", 0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = ctx.clone();
                std::thread::spawn(move || ctx.ue_find_or_add("imsi-001010000000009"))
            })
            .collect();
        let ues: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ues.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(ctx.ue_count(), 1);
    }

    #[test]
    fn test_amf_context_accessors() {
        let ue = UdmUe::new("imsi-1");
        assert!(!ue.amf_context_exists(AccessType::ThreeGppAccess));

        assert!(ue
            .set_amf_context(AccessType::ThreeGppAccess, registration("cafe00", None))
            .is_none());
        let old = ue.set_amf_context(AccessType::ThreeGppAccess, registration("cafe01", None));
        assert_eq!(old.unwrap().guami.amf_id, "cafe00");
        assert!(!ue.amf_context_exists(AccessType::NonThreeGppAccess));

        assert_eq!(
            ue.amf_context(AccessType::ThreeGppAccess).unwrap().guami.amf_id,
            "cafe01"
        );
        let current = ue.amf_context(AccessType::ThreeGppAccess).unwrap();
        assert!(ue.clear_amf_context_if(AccessType::ThreeGppAccess, &current));
        assert!(!ue.amf_context_exists(AccessType::ThreeGppAccess));
    }

    #[test]
    fn test_smf_context_markers() {
        let ue = UdmUe::new("imsi-1");
        assert!(!ue.create_smf_context(5));
        assert!(ue.create_smf_context(5));
        assert!(ue.smf_context_exists(5));
        assert!(!ue.smf_context_exists(6));
        assert!(ue.remove_smf_context(5));
        assert!(!ue.remove_smf_context(5));
        assert!(ue.is_idle());
    }

    #[test]
    fn test_clear_amf_context_if_keeps_newer_record() {
        let ue = UdmUe::new("imsi-1");
        ue.set_amf_context(AccessType::ThreeGppAccess, registration("cafe00", None));
        let seen = ue.amf_context(AccessType::ThreeGppAccess).unwrap();

        // a re-registration lands between read and purge
        ue.set_amf_context(AccessType::ThreeGppAccess, registration("beef01", None));
        assert!(!ue.clear_amf_context_if(AccessType::ThreeGppAccess, &seen));
        assert_eq!(
            ue.amf_context(AccessType::ThreeGppAccess).unwrap().guami.amf_id,
            "beef01"
        );

        let seen = ue.amf_context(AccessType::ThreeGppAccess).unwrap();
        assert!(ue.clear_amf_context_if(AccessType::ThreeGppAccess, &seen));
        assert!(!ue.amf_context_exists(AccessType::ThreeGppAccess));
        assert!(!ue.clear_amf_context_if(AccessType::ThreeGppAccess, &seen));
    }

    #[test]
    fn test_ue_remove_only_evicts_idle() {
        let ctx = UdmContext::new("http://udm", 0);

        let busy = ctx.ue_find_or_add("imsi-1");
        busy.create_smf_context(5);
        drop(busy);
        assert!(!ctx.ue_remove("imsi-1"));

        let held = ctx.ue_find_or_add("imsi-1");
        held.remove_smf_context(5);
        assert!(held.is_idle());
        assert!(!ctx.ue_remove("imsi-1"));
        drop(held);

        assert!(ctx.ue_remove("imsi-1"));
        assert_eq!(ctx.ue_count(), 0);
        assert!(!ctx.ue_remove("imsi-1"));

        ctx.ue_find_or_add("imsi-2")
            .set_amf_context(AccessType::NonThreeGppAccess, registration("cafe00", None));
        assert!(!ctx.ue_remove("imsi-2"));
        assert_eq!(ctx.ue_count(), 1);
    }

    #[test]
    fn test_ue_find_by_pei() {
        let ctx = UdmContext::new("http://udm", 0);
        ctx.ue_find_or_add("imsi-1")
            .set_amf_context(AccessType::ThreeGppAccess, registration("cafe00", Some("imei-1")));
        ctx.ue_find_or_add("imsi-2").set_amf_context(
            AccessType::NonThreeGppAccess,
            registration("cafe00", Some("imei-2")),
        );

        assert_eq!(ctx.ue_find_by_pei("imei-2").unwrap().supi, "imsi-2");
        assert_eq!(ctx.ue_find_by_pei("imei-1").unwrap().supi, "imsi-1");
        assert!(ctx.ue_find_by_pei("imei-3").is_none());
    }

    #[test]
    fn test_ue_find_by_pei_concurrent() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 500;

        let ctx = Arc::new(UdmContext::new("http://udm", 0));

        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        let supi = format!("imsi-{w}-{i}");
                        let ue = ctx.ue_find_or_add(&supi);
                        if i % 3 == 0 {
                            // stays idle, evicted right away
                            drop(ue);
                            assert!(ctx.ue_remove(&supi));
                        } else {
                            ue.set_amf_context(
                                AccessType::ThreeGppAccess,
                                registration("cafe00", Some(&format!("imei-{w}-{i}"))),
                            );
                        }
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..WRITERS)
            .map(|r| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for k in 0..200 {
                        let pei = format!("imei-{r}-{k}");
                        if let Some(ue) = ctx.ue_find_by_pei(&pei) {
                            assert!(ue.has_pei(&pei));
                            assert_eq!(ue.supi, format!("imsi-{r}-{k}"));
                        }
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        let removed_per_writer = (0..PER_WRITER).filter(|i| i % 3 == 0).count();
        assert_eq!(ctx.ue_count(), WRITERS * (PER_WRITER - removed_per_writer));
        assert_eq!(ctx.ue_find_by_pei("imei-1-1").unwrap().supi, "imsi-1-1");
        assert!(ctx.ue_find_by_pei("imei-1-3").is_none());
    }

    #[test]
    fn test_ue_remove_and_load() {
        let ctx = UdmContext::new("http://udm", 4);
        ctx.ue_find_or_add("imsi-1");
        ctx.ue_find_or_add("imsi-2");
        assert_eq!(ctx.get_ue_load(), 50);

        assert!(ctx.ue_remove("imsi-1"));
        assert!(!ctx.ue_remove("imsi-1"));
        assert_eq!(ctx.get_ue_load(), 25);

        assert_eq!(UdmContext::new("http://udm", 0).get_ue_load(), 0);
    }

    #[test]
    fn test_location_uri() {
        let ctx = UdmContext::new("http://127.0.0.12:7777/", 0);
        assert_eq!(
            ctx.location_uri("imsi-1", LocationUri::AmfRegistration(AccessType::ThreeGppAccess)),
            "http://127.0.0.12:7777/nudm-uecm/v1/imsi-1/registrations/amf-3gpp-access"
        );
        assert_eq!(
            ctx.location_uri(
                "imsi-1",
                LocationUri::AmfRegistration(AccessType::NonThreeGppAccess)
            ),
            "http://127.0.0.12:7777/nudm-uecm/v1/imsi-1/registrations/amf-non-3gpp-access"
        );
        assert_eq!(
            ctx.location_uri("imsi-1", LocationUri::SmfRegistration(5)),
            "http://127.0.0.12:7777/nudm-uecm/v1/imsi-1/registrations/smf-registrations/5"
        );
    }
}
