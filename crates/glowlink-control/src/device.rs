//! Per-Device sACN Broadcaster
//!
//! One [`DeviceOutput`] drives one physical endpoint: it owns a contiguous
//! run of universes fed from a layout's shared channel buffer, resolves its
//! target host off the send path, and runs a single background task with
//! two schedules: data packets at the configured output rate and universe
//! discovery every 10 seconds.
//!
//! State machine per device: Unknown (resolving, retried at 1 Hz, never
//! fatal) -> Broadcasting. An IP change tears the task down and starts the
//! resolution over; a universe-start change renumbers the universes in
//! place and re-advertises them without interrupting data sends.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use glowlink_core::layout::SharedChannels;
use glowlink_core::scene::DeviceDefinition;

use crate::sacn::{PacketFactory, SacnSender, SACN_PORT, SOURCE_NAME};
use crate::universe::{self, Universe};
use crate::{ControlError, Result};

/// Default output rate in frames per second
pub const DEFAULT_FPS: f32 = 30.0;

/// Universe discovery cadence required by E1.31-2016 section 4.3
const DISCOVERY_INTERVAL: Duration = Duration::from_secs(10);

/// Delay between host resolution attempts
const RESOLVE_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Static configuration of one output endpoint
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Target host: dotted IP or DNS name
    pub remote_host: String,
    /// First universe ID of this device's run
    pub start_universe: u16,
    /// Data packet rate in frames per second
    pub fps: f32,
    /// Multicast instead of unicast
    pub use_broadcast: bool,
}

impl DeviceConfig {
    /// Config for a device definition from a scene file
    pub fn from_definition(definition: &DeviceDefinition) -> Self {
        Self {
            remote_host: definition.device_ip.clone(),
            start_universe: definition.start_universe,
            fps: DEFAULT_FPS,
            use_broadcast: false,
        }
    }
}

enum DeviceCommand {
    SendDiscovery,
    Shutdown,
}

/// A running (or resolving) broadcaster for one device
pub struct DeviceOutput {
    config: DeviceConfig,
    universes: Arc<Mutex<Vec<Universe>>>,
    channels: SharedChannels,
    runtime: tokio::runtime::Handle,
    task: Option<(mpsc::Sender<DeviceCommand>, JoinHandle<()>)>,
    broadcasting: Arc<AtomicBool>,
    sender_generation: Arc<AtomicU64>,
}

impl DeviceOutput {
    /// Create a stopped device output reading from `channels`
    pub fn new(
        config: DeviceConfig,
        channels: SharedChannels,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            config,
            universes: Arc::new(Mutex::new(Vec::new())),
            channels,
            runtime,
            task: None,
            broadcasting: Arc::new(AtomicBool::new(false)),
            sender_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bind a channel range of the source layout into this device's
    /// universe run, opening universes as needed.
    pub fn append_layout_channels(&self, layout_start: usize, channel_count: usize) -> Result<()> {
        let mut universes = self.universes.lock();
        universe::append_channels(
            &mut universes,
            self.config.start_universe,
            layout_start,
            channel_count,
        )
    }

    /// Universe IDs currently bound to this device
    pub fn universe_ids(&self) -> Vec<u16> {
        self.universes.lock().iter().map(|u| u.id).collect()
    }

    /// True once the host is resolved and the send loop is running
    pub fn is_broadcasting(&self) -> bool {
        self.broadcasting.load(Ordering::Acquire)
    }

    /// Number of senders created over this device's lifetime. A patch that
    /// does not touch networking must not advance this.
    pub fn sender_generation(&self) -> u64 {
        self.sender_generation.load(Ordering::Acquire)
    }

    /// Start the broadcaster task. A running task is stopped first.
    pub fn start(&mut self) {
        self.stop();

        let (tx, rx) = mpsc::channel(8);
        let handle = self.runtime.spawn(run_device(
            self.config.clone(),
            Arc::clone(&self.universes),
            Arc::clone(&self.channels),
            rx,
            Arc::clone(&self.broadcasting),
            Arc::clone(&self.sender_generation),
        ));
        self.task = Some((tx, handle));
    }

    /// Stop the broadcaster and wait for the task to wind down.
    ///
    /// Must be called from outside the runtime (the host render thread or a
    /// blocking context); no packet is sent after this returns.
    pub fn stop(&mut self) {
        if let Some((tx, handle)) = self.task.take() {
            let _ = tx.try_send(DeviceCommand::Shutdown);
            drop(tx);
            if self.runtime.block_on(handle).is_err() {
                tracing::warn!("Broadcast task for {} ended abnormally", self.config.remote_host);
            }
            tracing::info!("Halting broadcast to {}", self.config.remote_host);
        }
    }

    /// Reconcile against an updated device definition.
    ///
    /// An IP change restarts the broadcaster from resolution; a
    /// universe-start change renumbers the in-memory universes in place and
    /// re-issues discovery without interrupting data transmission.
    pub fn patch(&mut self, definition: &DeviceDefinition) {
        if definition.device_ip != self.config.remote_host {
            let was_running = self.task.is_some();
            self.stop();
            self.config.remote_host = definition.device_ip.clone();
            if was_running {
                self.start();
            }
        }

        if definition.start_universe != self.config.start_universe {
            self.config.start_universe = definition.start_universe;
            {
                let mut universes = self.universes.lock();
                let mut next_id = definition.start_universe;
                for universe in universes.iter_mut() {
                    universe.id = next_id;
                    next_id += 1;
                }
            }

            if let Some((tx, _)) = &self.task {
                let _ = tx.try_send(DeviceCommand::SendDiscovery);
            }
        }
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        // Best-effort shutdown without joining; stop() is the orderly path.
        if let Some((tx, _)) = self.task.take() {
            let _ = tx.try_send(DeviceCommand::Shutdown);
        }
    }
}

/// The broadcaster task: resolve, then serve two periodic schedules
async fn run_device(
    config: DeviceConfig,
    universes: Arc<Mutex<Vec<Universe>>>,
    channels: SharedChannels,
    mut commands: mpsc::Receiver<DeviceCommand>,
    broadcasting: Arc<AtomicBool>,
    sender_generation: Arc<AtomicU64>,
) {
    let factory = PacketFactory::new(SOURCE_NAME);

    // Resolution happens off the send path and retries at a fixed interval
    // until it succeeds or the device is stopped.
    let sender = loop {
        match create_sender(&config).await {
            Ok(sender) => break sender,
            Err(e) => {
                tracing::error!("Failed to find sACN host {}: {}", config.remote_host, e);
            }
        }

        tokio::select! {
            command = commands.recv() => match command {
                Some(DeviceCommand::SendDiscovery) => {} // Nothing to advertise yet
                Some(DeviceCommand::Shutdown) | None => return,
            },
            _ = tokio::time::sleep(RESOLVE_RETRY_INTERVAL) => {}
        }
    };

    sender_generation.fetch_add(1, Ordering::AcqRel);
    broadcasting.store(true, Ordering::Release);
    tracing::info!(
        "Broadcasting {} universes to {}",
        universes.lock().len(),
        config.remote_host
    );

    let frame = Duration::from_secs_f32(1.0 / config.fps.max(1.0));
    let mut data_tick = tokio::time::interval(frame);
    data_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut discovery_tick = tokio::time::interval(DISCOVERY_INTERVAL);
    discovery_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = data_tick.tick() => {
                send_universe_data(&factory, &sender, &universes, &channels).await;
            }
            _ = discovery_tick.tick() => {
                send_discovery(&factory, &sender, &universes).await;
            }
            command = commands.recv() => match command {
                Some(DeviceCommand::SendDiscovery) => {
                    send_discovery(&factory, &sender, &universes).await;
                }
                Some(DeviceCommand::Shutdown) | None => break,
            },
        }
    }

    broadcasting.store(false, Ordering::Release);
}

/// Pack every universe from the layout's channel buffer and send one data
/// packet per universe. Per-packet failures are logged and skipped.
async fn send_universe_data(
    factory: &PacketFactory,
    sender: &SacnSender,
    universes: &Mutex<Vec<Universe>>,
    channels: &SharedChannels,
) {
    // Snapshot the channel bytes, then fill the universe payloads under the
    // universe lock; sends happen outside both locks.
    let snapshot = channels.lock().clone();

    let frames: Vec<(u16, Vec<u8>)> = {
        let mut universes = universes.lock();
        universes
            .iter_mut()
            .filter(|universe| !universe.sections().is_empty())
            .map(|universe| {
                universe.pack(&snapshot);
                let sequence = universe.next_sequence();
                match factory.data_packet(universe.id, sequence, universe.data()) {
                    Ok(packet) => (universe.id, packet),
                    Err(_) => (universe.id, Vec::new()),
                }
            })
            .collect()
    };

    for (universe_id, packet) in frames {
        if packet.is_empty() {
            tracing::warn!("Skipping unencodable universe {}", universe_id);
            continue;
        }
        if let Err(e) = sender.send_data(universe_id, &packet).await {
            tracing::warn!("sACN send failed for universe {}: {}", universe_id, e);
        }
    }
}

/// Advertise all bound universe IDs
async fn send_discovery(
    factory: &PacketFactory,
    sender: &SacnSender,
    universes: &Mutex<Vec<Universe>>,
) {
    let ids: Vec<u16> = universes.lock().iter().map(|u| u.id).collect();
    if ids.is_empty() {
        return;
    }

    for packet in factory.discovery_packets(&ids) {
        if let Err(e) = sender.send_discovery(&packet).await {
            tracing::warn!("sACN discovery send failed: {}", e);
        }
    }
}

async fn create_sender(config: &DeviceConfig) -> Result<SacnSender> {
    if config.use_broadcast {
        return SacnSender::multicast().await;
    }

    let address = resolve_host(&config.remote_host).await?;
    tracing::info!("Found sACN host {}", address);
    SacnSender::unicast(address).await
}

/// Literal IP parse first, then DNS, taking the first IPv4 result
async fn resolve_host(host: &str) -> Result<IpAddr> {
    if let Ok(address) = host.parse::<IpAddr>() {
        return Ok(address);
    }

    let addresses = tokio::net::lookup_host((host, SACN_PORT)).await?;
    addresses
        .map(|a| a.ip())
        .find(|ip| ip.is_ipv4())
        .ok_or_else(|| ControlError::DmxError(format!("No IPv4 address for host {}", host)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_literal_ip() {
        let address = resolve_host("192.168.1.20").await.unwrap();
        assert_eq!(address, "192.168.1.20".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let address = resolve_host("localhost").await.unwrap();
        assert!(address.is_ipv4());
    }

    #[tokio::test]
    async fn test_resolve_failure_is_an_error() {
        assert!(resolve_host("no-such-host.invalid").await.is_err());
    }

    #[test]
    fn test_device_config_from_definition() {
        let definition = DeviceDefinition {
            device_ip: "10.0.0.9".to_string(),
            start_universe: 4,
            led_count: 170,
        };
        let config = DeviceConfig::from_definition(&definition);
        assert_eq!(config.remote_host, "10.0.0.9");
        assert_eq!(config.start_universe, 4);
        assert_eq!(config.fps, DEFAULT_FPS);
        assert!(!config.use_broadcast);
    }
}
