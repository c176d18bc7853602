// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Entry point: parse the CLI, load and validate configuration, build the
//! interface registry, digipeaters, and beacon scheduler, then drive
//! everything from one `tokio::select!` loop until shutdown.

mod beacon;
mod cli;
mod config;
mod filterparse;
mod interface;
mod regexfilter;
mod transport;

use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use aprx_app::{init_logging, ConfigFile};
use aprx_core::ax25::{Ax25Address, Ax25Path};
use aprx_core::pbuf::{PBuf, PbufInner};
use aprx_core::{DropReason, DynResult, IfGroup, InterfaceIndex};
use aprx_digipeater::tables::TraceWideTable;
use aprx_digipeater::{DigipeatOutcome, Digipeater};
use aprx_filter::{FilterChain, FilterResult};

use beacon::BeaconScheduler;
use cli::Cli;
use config::{AprxConfig, BeaconMode, InterfaceKind, RelayType, SourceConfig};
use filterparse::parse_filter;
use interface::{InterfaceHandle, InterfaceRegistry, TxFrame};
use regexfilter::CompiledRegexFilter;
use transport::{NullTransport, RawFrame, TcpKissTransport, Transport};

/// One decoded frame arriving from a radio interface, tagged with the
/// interface it arrived on.
struct RxFrame {
    ifindex: InterfaceIndex,
    bytes: Vec<u8>,
}

/// One `<digipeater.source>`'s resolved runtime state: everything needed to
/// run a received PBuf through its reject filters and into `Digipeater::receive`.
struct SourceRuntime {
    index: InterfaceIndex,
    directonly: bool,
    viscous_delay: u8,
    source_trace: Option<TraceWideTable>,
    source_wide: Option<TraceWideTable>,
    filter_chain: Option<FilterChain>,
    regex_filter: CompiledRegexFilter,
}

/// A digipeater plus the interface index it transmits on and the set of
/// source interfaces it is subscribed to.
struct RunningDigipeater {
    digi: Digipeater,
    transmitter_index: InterfaceIndex,
    sources: Vec<SourceRuntime>,
}

async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    if *shutdown_rx.borrow() {
        return;
    }
    while shutdown_rx.changed().await.is_ok() {
        if *shutdown_rx.borrow() {
            return;
        }
    }
}

/// Spawn one transport task per configured interface: it reads frames and
/// forwards them to `rx_tx`, and owns its `TxFrame` receiver for outbound
/// writes. Returns the `InterfaceHandle` the rest of the daemon uses to
/// address it.
fn spawn_interface(
    index: InterfaceIndex,
    cfg: &config::InterfaceConfig,
    rx_tx: mpsc::Sender<RxFrame>,
    shutdown_rx: watch::Receiver<bool>,
    handles: &mut Vec<JoinHandle<()>>,
) -> InterfaceHandle {
    let (tx_tx, tx_rx) = mpsc::channel::<TxFrame>(256);
    let handle = InterfaceHandle {
        index,
        callsign: cfg.callsign.clone(),
        ifgroup: cfg.igate_group,
        tx_ok: cfg.tx_ok,
        tx: tx_tx,
    };

    let kind = cfg.kind.clone();
    let poll_interval = Duration::from_secs(cfg.poll_interval_secs.max(1));
    let callsign = cfg.callsign.clone();

    handles.push(tokio::spawn(async move {
        tokio::select! {
            _ = run_interface_transport(index, kind, poll_interval, rx_tx, tx_rx) => {}
            _ = wait_for_shutdown(shutdown_rx) => {
                info!(%callsign, "interface task shutting down");
            }
        }
    }));

    handle
}

async fn run_interface_transport(
    index: InterfaceIndex,
    kind: InterfaceKind,
    poll_interval: Duration,
    rx_tx: mpsc::Sender<RxFrame>,
    mut tx_rx: mpsc::Receiver<TxFrame>,
) {
    let mut transport: Box<dyn Transport> = match kind {
        InterfaceKind::Null => Box::new(NullTransport),
        InterfaceKind::TcpKiss { host, port } => {
            match TcpKissTransport::connect(&host, port, poll_interval).await {
                Ok(t) => Box::new(t),
                Err(e) => {
                    error!(%host, port, error = %e, "failed to connect kiss interface");
                    return;
                }
            }
        }
        InterfaceKind::Agwpe { .. } => {
            warn!("agwpe interfaces are not implemented, running as null");
            Box::new(NullTransport)
        }
    };

    loop {
        tokio::select! {
            biased;
            frame = tx_rx.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = transport.send(&frame.bytes).await {
                            warn!(error = %e, "interface send failed");
                        }
                    }
                    None => return,
                }
            }
            received = transport.recv() => {
                match received {
                    Ok(Some(RawFrame { bytes })) => {
                        if rx_tx.send(RxFrame { ifindex: index, bytes }).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => return,
                    Err(e) => {
                        warn!(error = %e, "interface recv failed");
                        return;
                    }
                }
            }
        }

        if let Err(e) = transport.maybe_poll().await {
            warn!(error = %e, "interface poll failed");
        }
    }
}

fn build_digipeaters(
    cfg: &AprxConfig,
    registry: &InterfaceRegistry,
) -> Vec<RunningDigipeater> {
    let mut out = Vec::new();
    for digi_cfg in &cfg.digipeaters {
        let Some(transmitter_handle) = registry.find_by_callsign(&digi_cfg.transmitter) else {
            warn!(transmitter = %digi_cfg.transmitter, "digipeater transmitter not found in registry, skipping");
            continue;
        };
        let Ok(transmitter_addr) = parse_transmitter(&digi_cfg.transmitter) else {
            warn!(transmitter = %digi_cfg.transmitter, "invalid transmitter callsign, skipping digipeater");
            continue;
        };

        let aliases: Vec<String> = cfg
            .interfaces
            .iter()
            .find(|i| i.callsign.eq_ignore_ascii_case(&digi_cfg.transmitter))
            .map(|i| i.alias.clone())
            .unwrap_or_default();

        let mut digi = Digipeater::new(transmitter_addr, aliases);
        if let Some(trace) = &digi_cfg.trace {
            digi.trace_table = trace.into();
        }
        if let Some(wide) = &digi_cfg.wide {
            digi.wide_table = wide.into();
        }

        let sources: Vec<SourceRuntime> = digi_cfg
            .source
            .iter()
            .filter_map(|s| {
                let handle = registry.find_by_callsign(&s.source)?;
                Some(build_source_runtime(s, handle.index))
            })
            .collect();

        out.push(RunningDigipeater {
            digi,
            transmitter_index: transmitter_handle.index,
            sources,
        });
    }
    out
}

fn build_source_runtime(cfg: &SourceConfig, index: InterfaceIndex) -> SourceRuntime {
    SourceRuntime {
        index,
        directonly: cfg.relay_type == RelayType::Directonly,
        viscous_delay: cfg.viscous_delay,
        source_trace: cfg.trace.as_ref().map(Into::into),
        source_wide: cfg.wide.as_ref().map(Into::into),
        filter_chain: cfg.filter.as_deref().map(parse_filter),
        regex_filter: CompiledRegexFilter::compile(&cfg.regex_filter, &cfg.source),
    }
}

fn parse_transmitter(callsign: &str) -> Result<Ax25Address, aprx_core::AprxError> {
    match callsign.split_once('-') {
        Some((call, ssid)) => {
            let ssid: u8 = ssid
                .parse()
                .map_err(|_| aprx_core::AprxError::fatal(format!("bad ssid in '{callsign}'")))?;
            Ax25Address::new(call, ssid)
        }
        None => Ax25Address::new(callsign, 0),
    }
}

fn dispatch_outcome(outcome: DigipeatOutcome, registry: &InterfaceRegistry, digi: &RunningDigipeater) {
    match outcome {
        DigipeatOutcome::Emit(path) => {
            if let Some(handle) = registry.find_by_index(digi.transmitter_index) {
                handle.try_send(TxFrame { bytes: path.encode() });
            }
        }
        DigipeatOutcome::Queued | DigipeatOutcome::Duplicate => {}
        DigipeatOutcome::Dropped(reason) => {
            info!(%reason, "packet dropped");
        }
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    let (cfg, source_path) = match &cli.config {
        Some(path) => (AprxConfig::load_from_file(path)?, Some(path.clone())),
        None => {
            let (cfg, path) = AprxConfig::load_from_default_paths()?;
            (cfg, path)
        }
    };
    cfg.validate().map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { e.into() })?;

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&cfg)?);
        return Ok(());
    }

    init_logging(cli.log_level.as_deref().or(cfg.logging.level.as_deref()));
    info!(config = ?source_path, "starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();

    let (rx_tx, mut rx_rx) = mpsc::channel::<RxFrame>(256);
    let mut registry = InterfaceRegistry::new();
    for (i, iface_cfg) in cfg.interfaces.iter().enumerate() {
        let index = InterfaceIndex(i as u32);
        let handle = spawn_interface(
            index,
            iface_cfg,
            rx_tx.clone(),
            shutdown_rx.clone(),
            &mut task_handles,
        );
        registry.insert(handle);
    }
    drop(rx_tx);

    let mut digipeaters = build_digipeaters(&cfg, &registry);
    let mut source_to_digis: HashMap<InterfaceIndex, Vec<(usize, usize)>> = HashMap::new();
    for (i, digi) in digipeaters.iter().enumerate() {
        for (j, src) in digi.sources.iter().enumerate() {
            source_to_digis.entry(src.index).or_default().push((i, j));
        }
    }

    let mut beacon_schedulers: Vec<BeaconScheduler> =
        cfg.beacons.iter().map(BeaconScheduler::new).collect();

    let (aprsis_inbound_tx, mut aprsis_inbound_rx) =
        mpsc::channel::<aprx_aprsis::IsInbound>(256);
    let (aprsis_outbound_tx, aprsis_outbound_rx) =
        mpsc::channel::<aprx_aprsis::IsOutbound>(256);
    let aprsis_enabled = cfg.aprsis.enabled;
    if aprsis_enabled {
        let aprsis_cfg = aprx_aprsis::AprsIsConfig {
            host: cfg.aprsis.host.clone(),
            port: cfg.aprsis.port,
            login: cfg.aprsis.login.clone(),
            software_name: "aprx".to_string(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            filter: cfg.aprsis.filter.clone(),
            heartbeat_timeout: cfg.aprsis.heartbeat_timeout(),
        };
        let shutdown_rx = shutdown_rx.clone();
        task_handles.push(tokio::spawn(async move {
            tokio::select! {
                _ = aprx_aprsis::run(aprsis_cfg, aprsis_inbound_tx, aprsis_outbound_rx) => {}
                _ = wait_for_shutdown(shutdown_rx) => {}
            }
        }));
    }

    let owner_callsign = cfg
        .interfaces
        .first()
        .map(|i| i.callsign.clone())
        .unwrap_or_else(|| "N0CALL".to_string());

    info!(
        interfaces = registry.iter().count(),
        digipeaters = digipeaters.len(),
        "ready"
    );

    loop {
        let next_deadline = digipeaters
            .iter()
            .filter_map(|d| d.digi.next_deadline())
            .chain(beacon_schedulers.iter().filter_map(|b| b.next_deadline()))
            .min();
        let sleep = match next_deadline {
            Some(deadline) => tokio::time::sleep_until(deadline.into()),
            None => tokio::time::sleep(Duration::from_secs(3600)),
        };
        tokio::pin!(sleep);

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("ctrl-c received, shutting down");
                let _ = shutdown_tx.send(true);
                tokio::time::sleep(Duration::from_millis(400)).await;
                for handle in &task_handles {
                    if !handle.is_finished() {
                        handle.abort();
                    }
                }
                for handle in task_handles {
                    let _ = handle.await;
                }
                return Ok(());
            }
            Some(rx) = rx_rx.recv() => {
                handle_rx_frame(rx, &registry, &mut digipeaters, &source_to_digis);
            }
            Some(line) = aprsis_inbound_rx.recv(), if aprsis_enabled => {
                handle_aprsis_line(line, &mut digipeaters, &registry);
            }
            _ = &mut sleep => {
                run_scheduled_work(&mut digipeaters, &mut beacon_schedulers, &registry, &aprsis_outbound_tx, &owner_callsign).await;
            }
        }
    }
}

fn handle_rx_frame(
    rx: RxFrame,
    registry: &InterfaceRegistry,
    digipeaters: &mut [RunningDigipeater],
    source_to_digis: &HashMap<InterfaceIndex, Vec<(usize, usize)>>,
) {
    let Some(handle) = registry.find_by_index(rx.ifindex) else {
        return;
    };
    let Ok((path, consumed)) = Ax25Path::decode(&rx.bytes) else {
        return;
    };
    if consumed + 2 > rx.bytes.len() {
        return;
    }
    let info = rx.bytes[consumed + 2..].to_vec();
    let ifgroup = handle.ifgroup;
    let Ok(pbuf) = PbufInner::from_ax25(path, info, true, ifgroup) else {
        return;
    };

    if let Some(targets) = source_to_digis.get(&rx.ifindex) {
        for &(di, si) in targets {
            process_for_source(&mut digipeaters[di], si, &pbuf, registry, ifgroup);
        }
    }
}

/// APRS-IS traffic is gated back to RF by every digipeater configured with
/// `via-path` reach, the same way a source interface's traffic is.
fn handle_aprsis_line(
    line: aprx_aprsis::IsInbound,
    digipeaters: &mut [RunningDigipeater],
    registry: &InterfaceRegistry,
) {
    let Ok(pbuf) = PbufInner::from_tnc2(&line.tnc2, true, aprx_core::IFGROUP_APRSIS) else {
        return;
    };
    for digi in digipeaters.iter_mut() {
        for si in 0..digi.sources.len() {
            process_for_source(digi, si, &pbuf, registry, aprx_core::IFGROUP_APRSIS);
        }
    }
}

/// Run one PBuf through a single source's reject filters (regex/reserved,
/// then the configured filter chain), and on acceptance through history
/// tracking and the digipeat pipeline itself.
fn process_for_source(
    running: &mut RunningDigipeater,
    source_idx: usize,
    pbuf: &PBuf,
    registry: &InterfaceRegistry,
    ifgroup: IfGroup,
) {
    let mycall = running.digi.transmitter.call.clone();
    let src = &running.sources[source_idx];

    if src.regex_filter.rejects(pbuf, &mycall) {
        info!(reason = %DropReason::FilterReject, "packet dropped");
        return;
    }

    if let Some(chain) = &src.filter_chain {
        match chain.evaluate(pbuf, &running.digi.historydb) {
            FilterResult::Accept => {}
            FilterResult::Reject | FilterResult::NoMatch => {
                info!(reason = %DropReason::FilterReject, "packet dropped");
                return;
            }
        }
    }

    running.digi.historydb.insert_heard(pbuf, ifgroup);
    running.digi.historydb.insert(pbuf);

    let src = &running.sources[source_idx];
    let (source_trace, source_wide, viscous_delay, directonly) = (
        src.source_trace.clone(),
        src.source_wide.clone(),
        src.viscous_delay,
        src.directonly,
    );

    let outcome = running.digi.receive(
        pbuf,
        source_trace.as_ref(),
        source_wide.as_ref(),
        viscous_delay,
        directonly,
    );
    dispatch_outcome(outcome, registry, running);
}

async fn run_scheduled_work(
    digipeaters: &mut [RunningDigipeater],
    beacon_schedulers: &mut [BeaconScheduler],
    registry: &InterfaceRegistry,
    aprsis_outbound_tx: &mpsc::Sender<aprx_aprsis::IsOutbound>,
    owner_callsign: &str,
) {
    let now = std::time::Instant::now();
    for digi in digipeaters.iter_mut() {
        let outcomes = digi.digi.run_viscous_queue(now);
        for outcome in outcomes {
            if let Some(handle) = registry.find_by_index(digi.transmitter_index) {
                if let DigipeatOutcome::Emit(path) = outcome {
                    handle.try_send(TxFrame { bytes: path.encode() });
                }
            }
        }
    }

    for scheduler in beacon_schedulers.iter_mut() {
        for frame in scheduler.run_due(now) {
            if matches!(frame.mode, BeaconMode::RfOnly | BeaconMode::Both) {
                for handle in registry.iter() {
                    let mut bytes = Vec::new();
                    bytes.extend_from_slice(&frame.ax25_control_pid);
                    bytes.extend_from_slice(&frame.payload);
                    handle.try_send(TxFrame { bytes });
                }
            }
            if matches!(frame.mode, BeaconMode::NetOnly | BeaconMode::Both) {
                let via = frame.via.clone().unwrap_or_else(|| "TCPIP*".to_string());
                let tnc2 = format!(
                    "{}>{},{}:{}",
                    owner_callsign,
                    frame.dest,
                    via,
                    String::from_utf8_lossy(&frame.payload)
                );
                let _ = aprsis_outbound_tx
                    .send(aprx_aprsis::IsOutbound { tnc2 })
                    .await;
            }
        }
    }
}
