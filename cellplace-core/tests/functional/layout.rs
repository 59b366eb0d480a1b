// vim: tw=80
//! Layouts computed from the mask that the health monitor publishes

use std::sync::Arc;

use cellplace_core::{
    mask::DiskMask,
    placement::{MapStrategy, PlacementMap},
    types::*,
};
use rstest::rstest;

use super::CellBuilder;

/// Every disk of the cell except those of the local node
fn peers(topology: Topology) -> DiskMask {
    let mut mask = DiskMask::full(topology);
    for d in 0..topology.disks_per_node {
        mask.offline(&topology.disk(0, d));
    }
    mask
}

#[rstest]
#[case(MapStrategy::Golden)]
#[case(MapStrategy::Seeded)]
#[tokio::test]
async fn whole_cell(#[case] strategy: MapStrategy) {
    let cell = CellBuilder::default().build();
    let topology = cell.config.topology();
    cell.membership.set_peer_mask(Some(peers(topology)));
    t!(cell.monitor.start(None).await);
    let proxy = cell.monitor.layout_proxy(
        Arc::new(PlacementMap::new(strategy)));
    assert_eq!(proxy.snapshot().mask, DiskMask::full(topology));
    for map_id in 0..1000 {
        let layout = t!(proxy.layout_for_store(map_id));
        assert!(layout.is_complete(), "{layout}");
    }
    cell.monitor.shutdown().await;
}

/// Once a local disk leaves service, no layout uses it, and every layout can
/// still be completed.
#[tokio::test]
async fn local_disk_pulled() {
    let cell = CellBuilder::default().build();
    let topology = cell.config.topology();
    let pulled = topology.disk(0, 2);
    cell.membership.set_peer_mask(Some(peers(topology)));
    t!(cell.monitor.start(None).await);
    let proxy = cell.monitor.layout_proxy(
        Arc::new(PlacementMap::new(MapStrategy::Golden)));
    let before = (0..1000)
        .filter(|map_id| {
            t!(proxy.fragment_id(*map_id, &pulled)).is_some()
        }).count();
    assert!(before > 0);

    t!(cell.monitor.pull(pulled).await);
    cell.monitor.refresh().await;
    assert!(!proxy.snapshot().mask.is_online(&pulled));
    for map_id in 0..1000 {
        let layout = t!(proxy.layout_for_retrieve(map_id));
        assert!(layout.is_complete(), "{layout}");
        assert_eq!(layout.fragment_of(&pulled), None);
    }
    cell.monitor.shutdown().await;
}

/// A recovery can still see where fragments lived under an older mask
#[tokio::test]
async fn recover_with_old_mask() {
    let cell = CellBuilder::default().build();
    let topology = cell.config.topology();
    cell.membership.set_peer_mask(Some(peers(topology)));
    t!(cell.monitor.start(None).await);
    let proxy = cell.monitor.layout_proxy(
        Arc::new(PlacementMap::new(MapStrategy::Golden)));
    let old = proxy.snapshot();
    let victim = topology.disk(0, 1);
    let map_id = (0..1000)
        .find(|map_id| t!(proxy.fragment_id(*map_id, &victim)).is_some())
        .expect("no map places a fragment on the local node");
    let before = t!(proxy.layout_for_retrieve(map_id));
    assert!(before.fragment_of(&victim).is_some());
    t!(cell.monitor.dismount(victim).await);
    cell.monitor.refresh().await;
    let now = t!(proxy.layout_for_recover(map_id, None));
    assert_ne!(now, before);
    assert_eq!(now.fragment_of(&victim), None);
    assert_eq!(t!(proxy.layout_for_recover(map_id, Some(&old.mask))),
               before);
    cell.monitor.shutdown().await;
}
