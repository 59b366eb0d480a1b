// vim: tw=80
//! The disk health monitor
//!
//! Owns the local disks' health records and keeps the published `DiskMask` up
//! to date.  Four background tasks drive it: a periodic self-test, the mask
//! computation cycle, the quorum report, and a listener for kernel disk
//! events.  Those tasks and the administrative API all change disk state
//! through the same few methods, each of which holds the disk array's lock for
//! its whole read-modify-write.

use futures_locks::Mutex;
use rand::Rng;
use std::{collections::BTreeSet, path::PathBuf, sync::Arc};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, error, info, instrument, warn};
use tracing_futures::Instrument;

use crate::{
    collaborator::{Membership, ObjectStore},
    config::Config,
    disk::{Disk, DiskArray, DiskStatus},
    disk_ops::DiskOps,
    grace::GracePeriod,
    kmsg::{DiskEvent, EventStream},
    label::DiskLabel,
    layout::LayoutComputer,
    placement::PlacementMap,
    published::{LayoutProxy, Published},
    quorum::QuorumReporter,
    types::*,
};

mod loops;

use self::loops::{Listener, Periodic};

/// Size of the buffer written by each self-test
const SELF_TEST_LEN: usize = 4096;

fn random_buffer() -> Vec<u8> {
    let mut buf = vec![0u8; SELF_TEST_LEN];
    rand::thread_rng().fill(&mut buf[..]);
    buf
}

/// State private to the mask computation cycle
struct MaskState {
    grace: GracePeriod,
    /// Local disks that the object store currently has open
    opened: BTreeSet<DiskId>,
}

struct Loops {
    self_test: Periodic,
    mask: Periodic,
    quorum: Periodic,
    listener: Option<Listener>,
}

struct Inner {
    config: Config,
    topology: Topology,
    ops: Arc<dyn DiskOps>,
    store: Arc<dyn ObjectStore>,
    membership: Arc<dyn Membership>,
    published: Arc<Published>,
    disks: Mutex<DiskArray>,
    mask_state: Mutex<MaskState>,
    quorum: Mutex<QuorumReporter>,
    loops: Mutex<Option<Loops>>,
    /// Serializes start, shutdown and reinitialization.  Set once the
    /// monitor has been shut down.
    lifecycle: Mutex<bool>,
}

impl Inner {
    /// The label to write for `disk`, keeping its uuid if it has one of ours
    fn label_for(disk: &Disk, disabled: bool) -> DiskLabel {
        let mut label = disk.label
            .filter(|l| l.matches(&disk.id))
            .unwrap_or_else(|| DiskLabel::new(disk.id));
        label.disabled = disabled;
        label
    }

    async fn write_label(&self, disk: &mut Disk, label: DiskLabel)
        -> Result<()>
    {
        self.ops.write_label(&disk.device, &label.encode()?).await?;
        disk.label = Some(label);
        Ok(())
    }

    /// Read a disk's label.  An unreadable label is as good as none.
    async fn read_label(&self, disk: &Disk) -> Result<Option<DiskLabel>> {
        match self.ops.read_label(&disk.device).await? {
            None => Ok(None),
            Some(buf) => match DiskLabel::decode(buf) {
                Ok(label) => Ok(Some(label)),
                Err(e) => {
                    warn!(disk = %disk.id, "treating disk as blank: {e}");
                    Ok(None)
                }
            }
        }
    }

    /// Mount the data partition, checking it first unless it was cleanly
    /// unmounted.
    async fn mount(&self, disk: &mut Disk) -> Result<()> {
        let fsck = !self.ops.is_clean(&disk.device).await;
        if fsck {
            info!(disk = %disk.id, "not cleanly unmounted; checking it");
        }
        self.ops.mount(&disk.device, fsck).await?;
        self.ops.set_clean(&disk.device, false).await?;
        disk.status = DiskStatus::Enabled;
        disk.errors = 0;
        Ok(())
    }

    /// Label and format a blank disk, then put it in service.
    async fn initialize(&self, disk: &mut Disk) -> Result<()> {
        self.write_label(disk, DiskLabel::new(disk.id)).await?;
        self.ops.mkfs(&disk.device).await?;
        self.ops.set_clean(&disk.device, true).await?;
        self.mount(disk).await
    }

    /// Work out what is in a slot, and bring it into service if possible.
    async fn process_insertion(&self, disk: &mut Disk) {
        disk.errors = 0;
        disk.last_self_test = None;
        disk.label = None;
        if !self.ops.probe(&disk.device).await {
            disk.status = DiskStatus::Absent;
            debug!(disk = %disk.id, "slot is empty");
            return;
        }
        let r = match self.read_label(disk).await {
            Ok(None) => {
                info!(disk = %disk.id, "blank disk; labeling it");
                self.initialize(disk).await
            }
            Ok(Some(label)) if !label.matches(&disk.id) => {
                warn!(disk = %disk.id, claims = %label.disk_id(),
                    "disk belongs to another slot");
                disk.label = Some(label);
                disk.status = DiskStatus::Foreign;
                Ok(())
            }
            Ok(Some(label)) if label.disabled => {
                disk.label = Some(label);
                disk.status = DiskStatus::Disabled;
                Ok(())
            }
            Ok(Some(label)) => {
                disk.label = Some(label);
                self.mount(disk).await
            }
            Err(e) => Err(e)
        };
        if let Err(e) = r {
            error!(disk = %disk.id, "bringing disk into service: {e}");
            disk.status = DiskStatus::Offline;
        }
        info!(disk = %disk.id, status = %disk.status, "disk inserted");
    }

    /// Take a disk out of service, cleanly unmounting it if it was enabled.
    ///
    /// If `persist` is set, the disabled state is also written to the label
    /// so that it survives a reboot.
    async fn take_out_of_service(&self, disk: &mut Disk, persist: bool)
        -> Result<()>
    {
        if disk.status == DiskStatus::Enabled {
            self.ops.unmount(&disk.device).await?;
            self.ops.set_clean(&disk.device, true).await?;
            disk.status = DiskStatus::Disabled;
        }
        if persist {
            let label = Self::label_for(disk, true);
            self.write_label(disk, label).await?;
        }
        disk.status = DiskStatus::Disabled;
        Ok(())
    }

    /// Check that a disk may be wiped or relabeled.
    fn check_wipeable(disk: &Disk) -> Result<()> {
        match disk.status {
            DiskStatus::Disabled | DiskStatus::Foreign => Ok(()),
            DiskStatus::Enabled => Err(Error::DiskEnabled(disk.id)),
            DiskStatus::Absent => Err(Error::DiskAbsent(disk.id)),
            DiskStatus::Offline => Err(Error::DiskOffline(disk.id)),
        }
    }

    async fn report_error(&self, id: DiskId) -> Result<bool> {
        let mut da = self.disks.lock().await;
        let disk = da.get_mut(&id)?;
        if disk.status != DiskStatus::Enabled {
            debug!(disk = %id, status = %disk.status,
                "ignoring error on a disk that is not in service");
            return Ok(false);
        }
        disk.errors += 1;
        warn!(disk = %id, errors = disk.errors, "disk error");
        if disk.errors < self.config.error_threshold {
            return Ok(false);
        }
        error!(disk = %id, "too many errors; disabling disk");
        let r = self.take_out_of_service(disk, true).await;
        if let Err(e) = &r {
            error!(disk = %id, "disabling disk: {e}");
            disk.status = DiskStatus::Disabled;
        }
        drop(da);
        self.kick_mask().await;
        r.map(|_| true)
    }

    async fn device_error(&self, line: &str) -> Option<(DiskId, bool)> {
        let id = self.disks.lock().await.by_message(line);
        let Some(id) = id else {
            debug!(line, "error message matches no disk");
            return None;
        };
        match self.report_error(id).await {
            Ok(disabled) => Some((id, disabled)),
            Err(e) => {
                error!(disk = %id, "reporting error: {e}");
                None
            }
        }
    }

    async fn disk_inserted(&self, id: DiskId) -> Result<()> {
        let mut da = self.disks.lock().await;
        let disk = da.get_mut(&id)?;
        match disk.status {
            DiskStatus::Absent | DiskStatus::Offline => {
                self.process_insertion(disk).await;
            }
            status => {
                debug!(disk = %id, %status, "disk is already present");
            }
        }
        drop(da);
        self.kick_mask().await;
        Ok(())
    }

    async fn disk_removed(&self, id: DiskId) -> Result<()> {
        let mut da = self.disks.lock().await;
        let disk = da.get_mut(&id)?;
        if disk.status == DiskStatus::Enabled {
            // The device is most likely gone already
            if let Err(e) = self.take_out_of_service(disk, false).await {
                debug!(disk = %id, "unmounting removed disk: {e}");
            }
        }
        info!(disk = %id, "disk removed");
        disk.status = DiskStatus::Absent;
        disk.label = None;
        disk.errors = 0;
        disk.last_self_test = None;
        drop(da);
        self.kick_mask().await;
        Ok(())
    }

    async fn handle_event(&self, ev: DiskEvent) {
        let (name, inserted) = match ev {
            DiskEvent::Attached(name) => (name, true),
            DiskEvent::Detached(name) => (name, false),
            DiskEvent::Error(line) => {
                self.device_error(&line).await;
                return;
            }
        };
        let id = self.disks.lock().await.by_device_name(&name);
        let Some(id) = id else {
            debug!(%name, "event for an unmonitored device");
            return;
        };
        let r = if inserted {
            self.disk_inserted(id).await
        } else {
            self.disk_removed(id).await
        };
        if let Err(e) = r {
            error!(disk = %id, "handling disk event: {e}");
        }
    }

    /// Self-test every enabled disk, and refresh every present disk's sensors.
    async fn self_test_pass(&self) {
        let targets = self.disks.lock().await
            .iter()
            .filter(|d| d.status.is_available())
            .map(|d| (d.id, d.device.clone(), d.status))
            .collect::<Vec<(DiskId, PathBuf, DiskStatus)>>();
        for (id, device, status) in targets {
            let smart = self.ops.smart(&device).await;
            let usage = self.ops.usage(&device).await;
            let test = if status.is_enabled() {
                let buf = random_buffer();
                Some(self.ops.self_test(&device, &buf).await)
            } else {
                None
            };
            {
                let mut da = self.disks.lock().await;
                if let Ok(disk) = da.get_mut(&id) {
                    match smart {
                        Ok(s) => disk.smart = s,
                        Err(e) => debug!(disk = %id, "reading sensors: {e}")
                    }
                    match usage {
                        Ok(u) => disk.usage = u,
                        Err(e) => debug!(disk = %id, "reading usage: {e}")
                    }
                    if let Some(r) = &test {
                        disk.last_self_test = Some(r.is_ok());
                    }
                }
            }
            if let Some(Err(e)) = test {
                warn!(disk = %id, "self-test failed: {e}");
                if let Err(e) = self.report_error(id).await {
                    error!(disk = %id, "reporting error: {e}");
                }
            }
        }
    }

    /// One mask computation cycle.  Returns whether a new mask was published.
    async fn refresh(&self) -> bool {
        let watermark = self.config.usage_high_watermark;
        let (local, ids, block_writes) = {
            let da = self.disks.lock().await;
            let block = da.iter()
                .any(|d| d.status.is_enabled() && d.usage >= watermark);
            let ids = da.iter().map(|d| d.id).collect::<Vec<_>>();
            (da.local_mask(self.topology), ids, block)
        };
        let mut raw = local;
        if let Some(peers) = self.membership.peer_mask().await {
            raw.or(&peers);
        }

        let mut state = self.mask_state.lock().await;
        let prev = self.published.load();
        let mut candidate = state.grace.smooth(&prev.mask, &raw,
                                               Instant::now());
        for id in ids {
            let online = candidate.is_online(&id);
            let opened = state.opened.contains(&id);
            if online && !opened {
                match self.store.open_disk(id).await {
                    Ok(()) => {
                        state.opened.insert(id);
                    }
                    Err(e) => {
                        warn!(disk = %id, "opening disk in the object store: {e}");
                        candidate.offline(&id);
                    }
                }
            } else if !online && opened {
                match self.store.close_disk(id).await {
                    Ok(()) => {
                        state.opened.remove(&id);
                    }
                    Err(e) => {
                        warn!(disk = %id, "closing disk in the object store: {e}");
                    }
                }
            }
        }
        if block_writes && !prev.block_writes {
            warn!("a disk is nearly full; blocking new writes");
        }
        self.published.publish(candidate, block_writes)
    }

    async fn report_quorum(&self) -> bool {
        let count = self.disks.lock().await.enabled_count();
        self.quorum.lock().await.report(count).await
    }

    async fn kick_mask(&self) {
        if let Some(loops) = self.loops.lock().await.as_ref() {
            loops.mask.kick();
        }
    }

    fn spawn_loops(self: &Arc<Self>, events: Option<EventStream>) -> Loops {
        let interval = self.config.poll_interval();
        let i = self.clone();
        let self_test = Periodic::spawn("self-test", interval, move || {
            let i = i.clone();
            async move { i.self_test_pass().await }
        });
        let i = self.clone();
        let mask = Periodic::spawn("mask", interval, move || {
            let i = i.clone();
            async move {
                i.refresh().await;
            }
        });
        let i = self.clone();
        let quorum = Periodic::spawn("quorum", interval, move || {
            let i = i.clone();
            async move {
                i.report_quorum().await;
            }
        });
        let listener = events.map(|events| {
            let i = self.clone();
            Listener::spawn(events, move |ev| {
                let i = i.clone();
                async move { i.handle_event(ev).await }
            })
        });
        Loops { self_test, mask, quorum, listener }
    }

    async fn start_loops(self: &Arc<Self>, events: Option<EventStream>) {
        let loops = self.spawn_loops(events);
        *self.loops.lock().await = Some(loops);
    }

    /// Stop the background tasks, if running.
    ///
    /// Returns `None` if they weren't running.  Otherwise returns the event
    /// stream, if the listener still had one.
    async fn stop_loops(&self) -> Option<Option<EventStream>> {
        let loops = self.loops.lock().await.take()?;
        let limit = self.config.join_timeout();
        loops.self_test.shutdown(limit).await;
        loops.mask.shutdown(limit).await;
        loops.quorum.shutdown(limit).await;
        let events = match loops.listener {
            Some(l) => l.shutdown(limit).await,
            None => None
        };
        Some(events)
    }

    /// Rebuild the disk array from scratch, then swap it in.
    ///
    /// Enabled disks are carried over as they are.  Every other slot is
    /// probed again.  The disk array stays locked throughout, so any other
    /// change waits for the swap and then applies to the new array.
    async fn reinit(self: Arc<Self>) {
        let shut_down = self.lifecycle.lock().await;
        if *shut_down {
            info!("monitor is shut down; not reinitializing");
            return;
        }
        info!("reinitializing the disk health monitor");
        let events = self.stop_loops().await;
        {
            let mut da = self.disks.lock().await;
            let mut fresh = DiskArray::new(self.config.disks());
            for disk in fresh.iter_mut() {
                match da.get(&disk.id) {
                    Ok(prev) if prev.status.is_enabled() => {
                        *disk = prev.clone()
                    }
                    _ => self.process_insertion(disk).await
                }
            }
            *da = fresh;
        }
        self.mask_state.lock().await.grace.reset();
        self.refresh().await;
        if let Some(events) = events {
            self.start_loops(events).await;
        }
        info!("disk health monitor reinitialized");
    }
}

/// Tracks the health of the local disks and publishes the resulting mask.
///
/// Constructed explicitly and shared by reference.  `start` launches the
/// background tasks; `shutdown` stops them and must be called before the
/// monitor is dropped.
pub struct DiskHealthMonitor {
    inner: Arc<Inner>,
}

impl DiskHealthMonitor {
    pub fn new(config: Config,
               ops: Arc<dyn DiskOps>,
               store: Arc<dyn ObjectStore>,
               membership: Arc<dyn Membership>) -> Result<Self>
    {
        config.validate()?;
        let topology = config.topology();
        let disks = DiskArray::new(config.disks());
        let quorum = QuorumReporter::new(membership.clone(),
            config.quorum_retries, config.quorum_retry_delay());
        let mask_state = MaskState {
            grace: GracePeriod::new(config.grace_period()),
            opened: BTreeSet::new(),
        };
        let inner = Inner {
            topology,
            ops,
            store,
            membership,
            published: Arc::new(Published::new(topology)),
            disks: Mutex::new(disks),
            mask_state: Mutex::new(mask_state),
            quorum: Mutex::new(quorum),
            loops: Mutex::new(None),
            lifecycle: Mutex::new(false),
            config,
        };
        Ok(DiskHealthMonitor { inner: Arc::new(inner) })
    }

    pub fn published(&self) -> Arc<Published> {
        self.inner.published.clone()
    }

    /// Build the interface that the object store uses to place fragments.
    pub fn layout_proxy(&self, map: Arc<PlacementMap>) -> LayoutProxy {
        LayoutProxy::new(LayoutComputer::new(map), self.published())
    }

    pub async fn is_running(&self) -> bool {
        self.inner.loops.lock().await.is_some()
    }

    /// Probe every disk, publish the first mask, and start the background
    /// tasks.
    ///
    /// Kernel disk events are taken from `events`, if supplied.
    pub async fn start(&self, events: Option<EventStream>) -> Result<()> {
        let mut shut_down = self.inner.lifecycle.lock().await;
        if self.is_running().await {
            warn!("disk health monitor is already running");
            return Ok(());
        }
        {
            let mut da = self.inner.disks.lock().await;
            for disk in da.iter_mut() {
                self.inner.process_insertion(disk).await;
            }
        }
        self.inner.refresh().await;
        self.inner.report_quorum().await;
        self.inner.start_loops(events).await;
        *shut_down = false;
        info!("disk health monitor started");
        Ok(())
    }

    /// Stop the background tasks and cleanly unmount every enabled disk.
    ///
    /// Waits for a reinitialization already in progress, and keeps any later
    /// one from running.
    pub async fn shutdown(&self) {
        let mut shut_down = self.inner.lifecycle.lock().await;
        *shut_down = true;
        self.inner.stop_loops().await;
        let mut da = self.inner.disks.lock().await;
        for disk in da.iter_mut().filter(|d| d.status.is_enabled()) {
            if let Err(e) = self.inner.take_out_of_service(disk, false).await {
                warn!(disk = %disk.id, "unmounting disk: {e}");
            }
        }
        info!("disk health monitor stopped");
    }

    /// Record an error on a disk.
    ///
    /// Returns `true` if this error pushed the disk over the error threshold,
    /// disabling it.  Errors on disks that are not enabled are ignored.  If
    /// the disabled state can't be persisted, the disk is still taken out of
    /// service, and the error is returned.
    #[instrument(skip(self))]
    pub async fn report_error(&self, id: DiskId) -> Result<bool> {
        self.inner.report_error(id).await
    }

    /// Report a kernel error message, and charge it to the disk it names.
    ///
    /// Returns the disk, and whether it was disabled, if any disk matched.
    pub async fn device_error(&self, line: &str) -> Option<(DiskId, bool)> {
        self.inner.device_error(line).await
    }

    /// Put a disabled disk back in service.
    #[instrument(skip(self))]
    pub async fn enable(&self, id: DiskId) -> Result<()> {
        let mut da = self.inner.disks.lock().await;
        let disk = da.get_mut(&id)?;
        match disk.status {
            DiskStatus::Enabled => return Ok(()),
            DiskStatus::Absent => return Err(Error::DiskAbsent(id)),
            DiskStatus::Foreign => return Err(Error::Foreign(id)),
            DiskStatus::Disabled | DiskStatus::Offline => ()
        }
        match self.inner.read_label(disk).await? {
            None => self.inner.initialize(disk).await?,
            Some(label) if !label.matches(&id) => {
                disk.label = Some(label);
                disk.status = DiskStatus::Foreign;
                return Err(Error::Foreign(id));
            }
            Some(mut label) => {
                if label.disabled {
                    label.disabled = false;
                    self.inner.write_label(disk, label).await?;
                } else {
                    disk.label = Some(label);
                }
                self.inner.mount(disk).await?;
            }
        }
        info!(disk = %id, "disk enabled");
        drop(da);
        self.inner.kick_mask().await;
        Ok(())
    }

    /// Take a disk out of service, persistently.
    #[instrument(skip(self))]
    pub async fn disable(&self, id: DiskId) -> Result<()> {
        let mut da = self.inner.disks.lock().await;
        let disk = da.get_mut(&id)?;
        match disk.status {
            DiskStatus::Absent => return Err(Error::DiskAbsent(id)),
            DiskStatus::Foreign => return Err(Error::Foreign(id)),
            _ => ()
        }
        self.inner.take_out_of_service(disk, true).await?;
        info!(disk = %id, "disk disabled");
        drop(da);
        self.inner.kick_mask().await;
        Ok(())
    }

    /// Cleanly unmount an enabled disk, without persisting anything.
    ///
    /// The disk comes back into service on the next start.
    #[instrument(skip(self))]
    pub async fn dismount(&self, id: DiskId) -> Result<()> {
        let mut da = self.inner.disks.lock().await;
        let disk = da.get_mut(&id)?;
        match disk.status {
            DiskStatus::Enabled => {
                self.inner.take_out_of_service(disk, false).await?;
            }
            DiskStatus::Disabled => return Ok(()),
            DiskStatus::Absent => return Err(Error::DiskAbsent(id)),
            DiskStatus::Offline => return Err(Error::DiskOffline(id)),
            DiskStatus::Foreign => return Err(Error::Foreign(id)),
        }
        drop(da);
        self.inner.kick_mask().await;
        Ok(())
    }

    /// Erase a disabled or foreign disk's data and claim it for this slot.
    ///
    /// The disk stays disabled afterwards.
    #[instrument(skip(self))]
    pub async fn wipe(&self, id: DiskId) -> Result<()> {
        let mut da = self.inner.disks.lock().await;
        let disk = da.get_mut(&id)?;
        Inner::check_wipeable(disk)?;
        let mut label = DiskLabel::new(id);
        label.disabled = true;
        self.inner.write_label(disk, label).await?;
        self.inner.ops.mkfs(&disk.device).await?;
        self.inner.ops.set_clean(&disk.device, true).await?;
        disk.status = DiskStatus::Disabled;
        disk.errors = 0;
        info!(disk = %id, "disk wiped");
        Ok(())
    }

    /// Claim a disabled or foreign disk for this slot, keeping its data.
    ///
    /// The disk stays disabled afterwards.
    #[instrument(skip(self))]
    pub async fn relabel(&self, id: DiskId) -> Result<()> {
        let mut da = self.inner.disks.lock().await;
        let disk = da.get_mut(&id)?;
        Inner::check_wipeable(disk)?;
        let mut label = DiskLabel::new(id);
        label.disabled = true;
        self.inner.write_label(disk, label).await?;
        disk.status = DiskStatus::Disabled;
        info!(disk = %id, "disk relabeled");
        Ok(())
    }

    /// Destroy a disabled or foreign disk's label, then reinitialize the
    /// monitor, which brings the now blank disk into service from scratch.
    ///
    /// The reinitialization runs in the background; the returned handle
    /// completes when it is done.
    #[instrument(skip(self))]
    pub async fn full_wipe(&self, id: DiskId) -> Result<JoinHandle<()>> {
        {
            let mut da = self.inner.disks.lock().await;
            let disk = da.get_mut(&id)?;
            Inner::check_wipeable(disk)?;
            self.inner.ops.destroy_label(&disk.device).await?;
            disk.label = None;
        }
        info!(disk = %id, "disk label destroyed");
        let inner = self.inner.clone();
        Ok(tokio::spawn(inner.reinit().in_current_span()))
    }

    /// Administratively simulate the removal of a disk
    pub async fn pull(&self, id: DiskId) -> Result<()> {
        self.disk_removed(id).await
    }

    /// Administratively simulate the insertion of a disk
    pub async fn push(&self, id: DiskId) -> Result<()> {
        self.disk_inserted(id).await
    }

    /// A disk appeared in a slot
    #[instrument(skip(self))]
    pub async fn disk_inserted(&self, id: DiskId) -> Result<()> {
        self.inner.disk_inserted(id).await
    }

    /// A disk left its slot.  It is disabled first, then marked absent.
    #[instrument(skip(self))]
    pub async fn disk_removed(&self, id: DiskId) -> Result<()> {
        self.inner.disk_removed(id).await
    }

    /// A copy of every disk's health record
    pub async fn disks(&self) -> Vec<Disk> {
        self.inner.disks.lock().await.iter().cloned().collect()
    }

    pub async fn disk(&self, id: DiskId) -> Result<Disk> {
        self.inner.disks.lock().await.get(&id).cloned()
    }

    /// Run one mask computation cycle now.  Returns whether a new mask was
    /// published.
    pub async fn refresh(&self) -> bool {
        self.inner.refresh().await
    }

    /// Run one self-test pass now.
    pub async fn self_test(&self) {
        self.inner.self_test_pass().await
    }

    /// Report the active disk count now.  Returns whether it was accepted.
    pub async fn report_quorum(&self) -> bool {
        self.inner.report_quorum().await
    }
}

// LCOV_EXCL_STOP
