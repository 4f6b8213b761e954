//! Initiator Group and Target Resolution
//!
//! Resolves which driver-owned initiator group a LUN is mapped to and
//! lists the cluster's target endpoints.

use crate::domain::ports::{BackendClient, TargetEndpoint};
use crate::error::Result;
use tracing::debug;

/// Prefix for initiator groups owned by this driver
///
/// Groups without the prefix belong to other consumers of the cluster
/// and are never matched.
pub const GROUP_PREFIX: &str = "blockd-";

/// Find the driver-owned initiator group a LUN is mapped to
///
/// Returns the group name and LUN ID of the first mapping whose group
/// both contains one of the given initiators and carries the driver
/// prefix; `None` when no such mapping exists.
pub async fn mapped_lun_group(
    backend: &dyn BackendClient,
    path: &str,
    initiators: &[String],
) -> Result<Option<(String, u32)>> {
    let groups = backend.initiator_groups(initiators).await?;
    let mappings = backend.lun_mappings(path).await?;

    for group in &groups {
        if !group.name.starts_with(GROUP_PREFIX) {
            continue;
        }
        for mapping in &mappings {
            if mapping.initiator_group == group.name {
                return Ok(Some((group.name.clone(), mapping.lun_id)));
            }
        }
    }

    Ok(None)
}

/// List the cluster's target endpoints
///
/// `include_partner` is accepted for interface compatibility but has no
/// effect: the cluster reports one flat endpoint list and partner
/// selection is not part of its contract.
pub async fn target_endpoints(
    backend: &dyn BackendClient,
    include_partner: bool,
) -> Result<Vec<TargetEndpoint>> {
    if include_partner {
        debug!("partner endpoint inclusion requested; cluster reports a flat endpoint list");
    }
    backend.target_endpoints().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        BackendClient, BlockRange, LunProperties, RawInitiatorGroup, RawLunMapping, RawLunRecord,
        RawPoolRecord,
    };
    use async_trait::async_trait;

    struct MappingBackend {
        groups: Vec<RawInitiatorGroup>,
        mappings: Vec<RawLunMapping>,
        endpoints: Vec<TargetEndpoint>,
    }

    #[async_trait]
    impl BackendClient for MappingBackend {
        async fn create_lun(
            &self,
            _pool: &str,
            _name: &str,
            _size_bytes: u64,
            _properties: &LunProperties,
            _qos_policy: Option<&str>,
        ) -> Result<()> {
            unimplemented!("mapping-only backend")
        }

        async fn clone_lun(
            &self,
            _pool: &str,
            _source_name: &str,
            _new_name: &str,
            _space_reserved: bool,
            _block_range: Option<BlockRange>,
        ) -> Result<()> {
            unimplemented!("mapping-only backend")
        }

        async fn destroy_lun(&self, _path: &str) -> Result<()> {
            unimplemented!("mapping-only backend")
        }

        async fn find_luns(
            &self,
            _context: Option<&str>,
            _path: &str,
        ) -> Result<Vec<RawLunRecord>> {
            Ok(Vec::new())
        }

        async fn initiator_groups(
            &self,
            _initiators: &[String],
        ) -> Result<Vec<RawInitiatorGroup>> {
            Ok(self.groups.clone())
        }

        async fn lun_mappings(&self, _path: &str) -> Result<Vec<RawLunMapping>> {
            Ok(self.mappings.clone())
        }

        async fn list_pools(&self) -> Result<Vec<RawPoolRecord>> {
            Ok(Vec::new())
        }

        async fn target_endpoints(&self) -> Result<Vec<TargetEndpoint>> {
            Ok(self.endpoints.clone())
        }

        async fn notify_usage(
            &self,
            _context: &str,
            _driver_name: &str,
            _version: &str,
        ) -> Result<()> {
            Ok(())
        }

        fn backend_name(&self) -> &str {
            "mapping-test"
        }
    }

    fn group(name: &str) -> RawInitiatorGroup {
        RawInitiatorGroup {
            name: name.into(),
            group_type: "iscsi".into(),
            os_type: "linux".into(),
            initiators: vec!["iqn.2026-01.io.blockd:host1".into()],
        }
    }

    fn mapping(group: &str, lun_id: u32) -> RawLunMapping {
        RawLunMapping {
            initiator_group: group.into(),
            lun_id,
            path: "/vol/pool1/lun1".into(),
        }
    }

    #[tokio::test]
    async fn test_mapped_group_matches_prefixed_group_only() {
        let backend = MappingBackend {
            groups: vec![group("other-group"), group("blockd-group1")],
            mappings: vec![mapping("other-group", 0), mapping("blockd-group1", 3)],
            endpoints: Vec::new(),
        };

        let initiators = vec!["iqn.2026-01.io.blockd:host1".to_string()];
        let found = mapped_lun_group(&backend, "/vol/pool1/lun1", &initiators)
            .await
            .unwrap();

        assert_eq!(found, Some(("blockd-group1".into(), 3)));
    }

    #[tokio::test]
    async fn test_no_match_without_driver_prefix() {
        let backend = MappingBackend {
            groups: vec![group("other-group")],
            mappings: vec![mapping("other-group", 0)],
            endpoints: Vec::new(),
        };

        let initiators = vec!["iqn.2026-01.io.blockd:host1".to_string()];
        let found = mapped_lun_group(&backend, "/vol/pool1/lun1", &initiators)
            .await
            .unwrap();

        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_partner_toggle_is_a_no_op() {
        let backend = MappingBackend {
            groups: Vec::new(),
            mappings: Vec::new(),
            endpoints: vec![TargetEndpoint {
                wwpn: "50:0a:09:81:00:00:00:01".into(),
                node: "node-a".into(),
            }],
        };

        // The toggle is accepted but must not change the result.
        let with_partner = target_endpoints(&backend, true).await.unwrap();
        let without_partner = target_endpoints(&backend, false).await.unwrap();

        assert_eq!(with_partner, without_partner);
        assert_eq!(with_partner.len(), 1);
    }
}
