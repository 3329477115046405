//! nudr-dr Request Building
//!
//! JSON patch documents applied to an AMF registration in the UDR.

use serde_json::json;

use crate::models::{AmfRegistrationModification, PatchItem};

/// One `replace` per field present in `modification`, in the order
/// guami, purgeFlag, pei, imsVoPs, backupAmfInfo. A false purge flag and
/// an empty PEI count as absent.
pub fn build_amf_registration_patch(modification: &AmfRegistrationModification) -> Vec<PatchItem> {
    let mut items = Vec::new();

    if let Some(guami) = &modification.guami {
        items.push(PatchItem::replace("/guami", json!(guami)));
    }
    if modification.purge_flag {
        items.push(PatchItem::replace("/purgeFlag", json!(true)));
    }
    if let Some(pei) = modification.pei.as_deref().filter(|p| !p.is_empty()) {
        items.push(PatchItem::replace("/pei", json!(pei)));
    }
    if let Some(ims_vo_ps) = modification.ims_vo_ps {
        items.push(PatchItem::replace("/imsVoPs", json!(ims_vo_ps)));
    }
    if let Some(backup) = &modification.backup_amf_info {
        items.push(PatchItem::replace("/backupAmfInfo", json!(backup)));
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackupAmfInfo, Guami, ImsVoPs, PatchOperation, PlmnId};

    fn paths(items: &[PatchItem]) -> Vec<&str> {
        items.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_purge_and_pei_only() {
        let modification = AmfRegistrationModification {
            purge_flag: true,
            pei: Some("imei-01234567890123".to_string()),
            ..Default::default()
        };
        let items = build_amf_registration_patch(&modification);
        assert_eq!(paths(&items), vec!["/purgeFlag", "/pei"]);
        assert!(items.iter().all(|i| i.op == PatchOperation::Replace));
        assert_eq!(items[0].value, Some(json!(true)));
        assert_eq!(items[1].value, Some(json!("imei-01234567890123")));
    }

    #[test]
    fn test_all_fields_in_order() {
        let modification = AmfRegistrationModification {
            guami: Some(Guami::new(PlmnId::new("001", "01"), "cafe00")),
            purge_flag: true,
            pei: Some("imei-1".to_string()),
            ims_vo_ps: Some(ImsVoPs::HomogeneousNonSupport),
            backup_amf_info: Some(vec![BackupAmfInfo {
                backup_amf: "amf-b".to_string(),
                guami_list: None,
            }]),
        };
        let items = build_amf_registration_patch(&modification);
        assert_eq!(
            paths(&items),
            vec!["/guami", "/purgeFlag", "/pei", "/imsVoPs", "/backupAmfInfo"]
        );
        assert_eq!(
            items[0].value,
            Some(json!({"plmnId": {"mcc": "001", "mnc": "01"}, "amfId": "cafe00"}))
        );
        assert_eq!(items[3].value, Some(json!("HOMOGENEOUS_NON_SUPPORT")));
        assert_eq!(items[4].value, Some(json!([{"backupAmf": "amf-b"}])));
    }

    #[test]
    fn test_zero_values_are_skipped() {
        let modification = AmfRegistrationModification {
            purge_flag: false,
            pei: Some(String::new()),
            ..Default::default()
        };
        assert!(build_amf_registration_patch(&modification).is_empty());
    }

    #[test]
    fn test_empty_backup_list_is_sent() {
        let modification = AmfRegistrationModification {
            backup_amf_info: Some(Vec::new()),
            ..Default::default()
        };
        let items = build_amf_registration_patch(&modification);
        assert_eq!(paths(&items), vec!["/backupAmfInfo"]);
        assert_eq!(items[0].value, Some(json!([])));
    }
}
