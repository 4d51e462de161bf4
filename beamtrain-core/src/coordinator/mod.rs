//! Phase Coordinator
//!
//! Drives every station pair through the training sequence
//!
//! ```text
//! Idle -> SectorSweep -> SisoFeedback -> CandidateSelection -> MimoPhase -> Complete
//! ```
//!
//! strictly in response to collaborator signals, and issues the instruction
//! that starts each following phase. A signal for a pair that never started
//! training, or that arrives in a phase which cannot accept it, is a protocol
//! violation and aborts the run.
//!
//! The coordinator owns its collaborators and the trace sink. Run-wide
//! counters live in a [`RunContext`] owned by the driver and lent to every
//! call, so two runs never share state.

mod signal;
mod state;

use std::collections::BTreeMap;

use tracing::{debug, info, trace, warn};

use crate::collaborator::{CodebookController, MacController};
use crate::config::RunConfig;
use crate::error::{BeamError, Result};
use crate::model::{
    AccessPeriod, AntennaSector, FeedbackMap, MimoCombination, SisoMeasurement, Station,
    StationId, TxCandidateTable,
};
use crate::reducer::{reduce_for_diversity, select_k_best, RankedCombinations};
use crate::timing::EventScheduler;
use crate::trace::{TraceRecord, TraceSink};

pub use signal::{DeferredAction, Signal, SignalContext};
pub use state::{FrameCounters, FrameEventKind, LinkKey, LinkTrainingState, Phase, RunContext};

/// Default MU group trained when the scenario names none
pub const DEFAULT_GROUP_ID: u8 = 1;

/// Per-station bookkeeping
#[derive(Debug, Clone)]
struct StationContext {
    station: Station,
    aid: Option<u16>,
    sweep_started: bool,
}

/// Event-driven controller of the beam-training phases
pub struct PhaseCoordinator<M, C, S> {
    mac: M,
    codebook: C,
    sink: S,
    config: RunConfig,
    group_id: u8,
    stations: BTreeMap<StationId, StationContext>,
    aids: BTreeMap<u16, StationId>,
    links: BTreeMap<LinkKey, LinkTrainingState>,
}

impl<M, C, S> PhaseCoordinator<M, C, S>
where
    M: MacController,
    C: CodebookController,
    S: TraceSink,
{
    pub fn new(config: RunConfig, mac: M, codebook: C, sink: S) -> Self {
        Self {
            mac,
            codebook,
            sink,
            config,
            group_id: DEFAULT_GROUP_ID,
            stations: BTreeMap::new(),
            aids: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// Set the MU group trained once the trigger fires
    pub fn with_group_id(mut self, group_id: u8) -> Self {
        self.group_id = group_id;
        self
    }

    /// Register a participant; every station must be registered before it
    /// appears in a signal
    pub fn register_station(&mut self, station: Station) -> Result<()> {
        if self.stations.contains_key(&station.id) {
            return Err(BeamError::ScenarioError {
                reason: format!("station {} registered twice", station.id),
            });
        }
        if station.is_coordinator() && self.coordinator().is_ok() {
            return Err(BeamError::ScenarioError {
                reason: format!("station {} is a second coordinator", station.id),
            });
        }
        debug!(station = %station.id, role = %station.role, "Registered station");
        self.stations.insert(
            station.id,
            StationContext {
                station,
                aid: None,
                sweep_started: false,
            },
        );
        Ok(())
    }

    /// Dispatch one collaborator signal
    pub fn handle(
        &mut self,
        run: &mut RunContext,
        scheduler: &mut dyn EventScheduler,
        ctx: SignalContext,
        signal: &Signal,
    ) -> Result<()> {
        self.station(signal.station())?;
        trace!(signal = signal.name(), station = %signal.station(), time = %ctx.time, "Dispatching signal");

        match signal {
            Signal::AssociationCompleted {
                station,
                coordinator,
                aid,
            } => self.on_association(*station, *coordinator, *aid),
            Signal::DataIntervalStarted { station } => self.on_data_interval(*station),
            Signal::CoordinatorDataIntervalStarted { coordinator } => {
                self.on_coordinator_data_interval(run, scheduler, ctx, *coordinator)
            }
            Signal::SectorSweepCompleted {
                station,
                peer,
                antenna_id,
                sector_id,
                access_period,
            } => self.on_sector_sweep(
                run,
                ctx,
                LinkKey::new(*station, *peer),
                *antenna_id,
                *sector_id,
                *access_period,
            ),
            Signal::FeedbackPollReceived { station, from } => {
                self.on_feedback_poll(ctx, LinkKey::new(*station, *from), signal.name())
            }
            Signal::SisoMeasurementsReported {
                station,
                from,
                measurements,
            } => self.on_siso_measurements(
                ctx,
                LinkKey::new(*station, *from),
                measurements,
                signal.name(),
            ),
            Signal::SisoPhaseComplete {
                station,
                feedback,
                n_tx,
                n_rx,
            } => self.on_siso_phase_complete(ctx, *station, feedback, *n_tx, *n_rx, signal.name()),
            Signal::MimoCandidatesSelected {
                station,
                group_id,
                candidates,
            } => self.on_mimo_candidates(ctx, *station, *group_id, candidates, signal.name()),
            Signal::MimoPhaseMeasurementsReported {
                station,
                from,
                combinations,
                distinct_rx,
                n_tx,
                n_rx,
            } => self.on_mimo_measurements(
                ctx,
                LinkKey::new(*station, *from),
                combinations,
                *distinct_rx,
                (*n_tx, *n_rx),
                signal.name(),
            ),
            Signal::MimoPhaseComplete { station } => {
                self.on_mimo_phase_complete(run, ctx, *station, signal.name())
            }
            Signal::RxSnrReported { station, snr_db } => self.sink.record(TraceRecord::RxSnr {
                station: *station,
                time: ctx.time,
                snr_db: *snr_db,
            }),
            Signal::FrameEvent { kind, .. } => {
                run.count_frame(*kind);
                Ok(())
            }
        }
    }

    /// Run an action this coordinator deferred earlier
    pub fn on_deferred(&mut self, ctx: SignalContext, action: &DeferredAction) -> Result<()> {
        match action {
            DeferredAction::StartGroupTraining {
                coordinator,
                group_id,
            } => {
                info!(
                    "Coordinator {} starting group beam training with group {} at {}",
                    coordinator, group_id, ctx.time
                );
                self.mac.start_group_training(*coordinator, *group_id)?;

                let members: Vec<LinkKey> = self
                    .links
                    .iter()
                    .filter(|(key, state)| key.touches(*coordinator) && state.phase == Phase::SectorSweep)
                    .map(|(key, _)| *key)
                    .collect();
                if members.is_empty() {
                    warn!(coordinator = %coordinator, "Group training started with no swept links");
                }
                for key in members {
                    self.transition(key, Phase::SisoFeedback, ctx)?;
                }
                Ok(())
            }
        }
    }

    /// Flush the trace sink
    pub fn finish(&mut self) -> Result<()> {
        self.sink.flush()
    }

    pub fn mac(&self) -> &M {
        &self.mac
    }

    pub fn codebook(&self) -> &C {
        &self.codebook
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn group_id(&self) -> u8 {
        self.group_id
    }

    pub fn links(&self) -> &BTreeMap<LinkKey, LinkTrainingState> {
        &self.links
    }

    pub fn link(&self, key: LinkKey) -> Option<&LinkTrainingState> {
        self.links.get(&key)
    }

    /// Links that have not reached `Complete`
    pub fn incomplete_links(&self) -> Vec<LinkKey> {
        self.links
            .iter()
            .filter(|(_, state)| !state.phase.is_complete())
            .map(|(key, _)| *key)
            .collect()
    }

    /// Association id of a station, once associated
    pub fn aid_of(&self, station: StationId) -> Option<u16> {
        self.stations.get(&station).and_then(|s| s.aid)
    }

    // ─── signal handlers ────────────────────────────────────────────────

    fn on_association(&mut self, station: StationId, coordinator: StationId, aid: u16) -> Result<()> {
        let coordinator_address = self.station(coordinator)?.station.address;
        let context = self.station_mut(station)?;
        context.aid = Some(aid);
        let address = context.station.address;
        self.aids.insert(aid, station);
        info!(
            "Station {} ({}) associated with coordinator {}, AID = {}",
            station, address, coordinator_address, aid
        );
        Ok(())
    }

    fn on_data_interval(&mut self, station: StationId) -> Result<()> {
        let context = self.station(station)?;
        if context.aid.is_none() {
            trace!(station = %station, "Data interval before association");
            return Ok(());
        }
        if context.sweep_started {
            return Ok(());
        }

        let bssid = self.coordinator()?.address;
        self.mac.start_sector_sweep(station, bssid)?;
        self.codebook.append_refinement_steering_vectors(station)?;
        self.station_mut(station)?.sweep_started = true;
        info!("Station {} starting sector sweep towards {}", station, bssid);
        Ok(())
    }

    fn on_coordinator_data_interval(
        &mut self,
        run: &mut RunContext,
        scheduler: &mut dyn EventScheduler,
        ctx: SignalContext,
        coordinator: StationId,
    ) -> Result<()> {
        if !self.station(coordinator)?.station.is_coordinator() {
            warn!(station = %coordinator, "Coordinator data interval reported by a client");
            return Ok(());
        }
        if run.group_trigger_fired() || run.group_training_completed() {
            return Ok(());
        }
        if run.beamformed_links() != self.config.group_training_links {
            trace!(
                beamformed_links = run.beamformed_links(),
                required = self.config.group_training_links,
                "Group training not armed"
            );
            return Ok(());
        }

        info!(
            "Coordinator {} initiating group beam training with group {} at {}",
            coordinator, self.group_id, ctx.time
        );
        scheduler.schedule(
            self.config.group_trigger_delay(),
            DeferredAction::StartGroupTraining {
                coordinator,
                group_id: self.group_id,
            },
        );
        run.mark_group_trigger_fired();
        Ok(())
    }

    fn on_sector_sweep(
        &mut self,
        run: &mut RunContext,
        ctx: SignalContext,
        key: LinkKey,
        antenna_id: u8,
        sector_id: u8,
        access_period: AccessPeriod,
    ) -> Result<()> {
        self.station(key.dst)?;
        let role = self.station(key.src)?.station.role;
        let bss_id = self.coordinator()?.id;

        if !self.links.contains_key(&key) {
            self.links.insert(key, LinkTrainingState::new());
            self.transition(key, Phase::SectorSweep, ctx)?;
        }
        self.link_mut(key)?.measurements += 1;

        self.sink.record(TraceRecord::SectorSweep {
            src: key.src,
            dst: key.dst,
            trace_index: ctx.trace_index,
            sector_id,
            antenna_id,
            role,
            bss_id,
            time: ctx.time,
        })?;

        info!(
            "Station {} completed sector sweep with {}: antenna {}, sector {}",
            key.src, key.dst, antenna_id, sector_id
        );
        if access_period.is_committed() {
            let count = run.record_beamformed_link();
            debug!(link = %key, beamformed_links = count, "Beamformed link established");
        }
        Ok(())
    }

    fn on_feedback_poll(&mut self, ctx: SignalContext, key: LinkKey, signal: &'static str) -> Result<()> {
        let target = self.station(key.dst)?.station.address;
        // group training moves swept links into SisoFeedback before any poll
        self.expect_phase(key, &[Phase::SisoFeedback], signal)?;

        info!(
            "Station {} polled for SISO feedback by {} at {}",
            key.src, key.dst, ctx.time
        );
        self.mac
            .send_feedback_report(key.src, target, self.config.feedback_includes_awv)
    }

    fn on_siso_measurements(
        &mut self,
        ctx: SignalContext,
        key: LinkKey,
        measurements: &[SisoMeasurement],
        signal: &'static str,
    ) -> Result<()> {
        self.station(key.dst)?;
        self.expect_phase(key, &[Phase::SisoFeedback], signal)?;

        for m in measurements {
            self.sink.record(TraceRecord::SisoMeasurement {
                src: key.src,
                dst: key.dst,
                trace_index: ctx.trace_index,
                rx_antenna_id: m.rx_antenna_id,
                peer_tx_antenna_id: m.peer_tx.antenna_id,
                peer_tx_sector_id: m.peer_tx.sector_id,
                snr: m.snr,
                time: ctx.time,
            })?;
        }
        self.link_mut(key)?.measurements += measurements.len() as u32;

        info!(
            "Station {} reported {} SISO measurements with {} at {}",
            key.src,
            measurements.len(),
            key.dst,
            ctx.time
        );
        Ok(())
    }

    fn on_siso_phase_complete(
        &mut self,
        ctx: SignalContext,
        station: StationId,
        feedback: &FeedbackMap,
        n_tx: u8,
        n_rx: u8,
        signal: &'static str,
    ) -> Result<()> {
        if n_tx == 0 || n_rx == 0 {
            return Err(BeamError::InvalidAntennaCount { n_tx, n_rx });
        }
        let group = self.group_links(station)?;
        for key in &group {
            self.expect_phase(*key, &[Phase::SisoFeedback], signal)?;
        }

        for (entry, snr) in feedback {
            let dst = self.aids.get(&entry.peer_aid).copied().unwrap_or(StationId(0));
            self.sink.record(TraceRecord::SisoResult {
                src: station,
                dst,
                trace_index: ctx.trace_index,
                station_aid: entry.peer_aid,
                tx_antenna_id: entry.tx_antenna_id,
                tx_sector_id: entry.tx_sector_id,
                snr: *snr,
                time: ctx.time,
            })?;
        }

        let candidates = select_k_best(feedback, self.config.k_best_combinations, n_tx, n_rx);
        for key in &group {
            self.transition(*key, Phase::CandidateSelection, ctx)?;
            let state = self.link_mut(*key)?;
            state.candidates = candidates.clone();
            state.measurements += feedback.len() as u32;
        }

        info!(
            "Station {} finished SISO phase at {}: {} candidates from {} feedback entries",
            station,
            ctx.time,
            candidates.len(),
            feedback.len()
        );

        self.codebook.append_refinement_steering_vectors(station)?;
        self.mac
            .start_mimo_phase(station, &candidates, self.config.mimo_phase_uses_awv)?;
        for key in group {
            self.transition(key, Phase::MimoPhase, ctx)?;
        }
        Ok(())
    }

    fn on_mimo_candidates(
        &mut self,
        ctx: SignalContext,
        station: StationId,
        group_id: u8,
        candidates: &TxCandidateTable,
        signal: &'static str,
    ) -> Result<()> {
        let group = self.group_links(station)?;
        if !group.iter().any(|key| self.phase_of(*key) == Some(Phase::MimoPhase)) {
            self.expect_phase(group[0], &[Phase::MimoPhase], signal)?;
        }

        let rows = candidates.values().map(Vec::len).min().unwrap_or(0);
        if candidates.values().any(|sectors| sectors.len() != rows) {
            warn!(
                station = %station,
                "Candidate lists differ in length, truncating to {}", rows
            );
        }
        for i in 0..rows {
            let sectors = candidates
                .iter()
                .map(|(antenna, sectors)| AntennaSector::new(*antenna, sectors[i]))
                .collect();
            self.sink.record(TraceRecord::MimoCandidates {
                src: station,
                dst: station,
                trace_index: ctx.trace_index,
                sectors,
            })?;
        }

        info!(
            "Station {} selected {} MIMO candidates for group {} at {}",
            station, rows, group_id, ctx.time
        );
        Ok(())
    }

    fn on_mimo_measurements(
        &mut self,
        ctx: SignalContext,
        key: LinkKey,
        combinations: &[MimoCombination],
        distinct_rx: bool,
        (n_tx, n_rx): (u8, u8),
        signal: &'static str,
    ) -> Result<()> {
        self.station(key.dst)?;
        self.expect_phase(key, &[Phase::MimoPhase], signal)?;
        if n_tx == 0 || n_rx == 0 {
            return Err(BeamError::InvalidAntennaCount { n_tx, n_rx });
        }

        let streams = usize::from(n_tx) * usize::from(n_rx);
        let valid: Vec<&MimoCombination> = combinations
            .iter()
            .filter(|c| {
                c.n_tx() == usize::from(n_tx) && c.n_rx() == usize::from(n_rx) && c.stream_snr.len() == streams
            })
            .collect();
        if valid.len() != combinations.len() {
            warn!(
                link = %key,
                dropped = combinations.len() - valid.len(),
                "Dropped MIMO combinations with unexpected shape"
            );
        }

        let ranked = RankedCombinations::rank_by_min_stream(valid.iter().copied())?;
        let reduced = reduce_for_diversity(&ranked, distinct_rx);
        if let Some(limit) = ranked.best().and_then(|best| best.combination.weakest_stream()) {
            debug!(
                link = %key,
                tx = %limit.tx,
                rx = %limit.rx,
                snr_db = limit.snr.to_db(),
                "Best MIMO combination limited by stream"
            );
        }

        let full = ranked.iter().map(|r| (false, r));
        for (is_reduced, r) in full.chain(reduced.iter().map(|r| (true, r))) {
            self.sink.record(TraceRecord::MimoMeasurement {
                reduced: is_reduced,
                src: key.src,
                dst: key.dst,
                trace_index: ctx.trace_index,
                tx: r.combination.tx.clone(),
                rx: r.combination.rx.clone(),
                stream_snr: r.combination.stream_snr.clone(),
                min_stream_snr: r.score,
            })?;
        }
        self.link_mut(key)?.measurements += ranked.len() as u32;

        info!(
            "Station {} reported {} MIMO measurements with {} at {}, {} kept after diversity reduction",
            key.src,
            ranked.len(),
            key.dst,
            ctx.time,
            reduced.len()
        );
        Ok(())
    }

    fn on_mimo_phase_complete(
        &mut self,
        run: &mut RunContext,
        ctx: SignalContext,
        station: StationId,
        signal: &'static str,
    ) -> Result<()> {
        let coordinator = self.coordinator()?.id;
        let owned: Vec<LinkKey> = self
            .links
            .keys()
            .filter(|key| key.src == station && key.touches(coordinator))
            .copied()
            .collect();
        if owned.is_empty() {
            return Err(BeamError::UnknownLink {
                src: station.0,
                dst: coordinator.0,
            });
        }
        for key in &owned {
            self.expect_phase(*key, &[Phase::MimoPhase], signal)?;
        }
        for key in owned {
            self.transition(key, Phase::Complete, ctx)?;
        }
        run.mark_group_training_completed();

        info!("Station {} finished MIMO phase at {}", station, ctx.time);
        Ok(())
    }

    // ─── helpers ────────────────────────────────────────────────────────

    fn coordinator(&self) -> Result<&Station> {
        self.stations
            .values()
            .map(|c| &c.station)
            .find(|s| s.is_coordinator())
            .ok_or_else(|| BeamError::ScenarioError {
                reason: "no coordinator station registered".to_string(),
            })
    }

    fn station(&self, id: StationId) -> Result<&StationContext> {
        self.stations
            .get(&id)
            .ok_or(BeamError::UnknownStation { station: id.0 })
    }

    fn station_mut(&mut self, id: StationId) -> Result<&mut StationContext> {
        self.stations
            .get_mut(&id)
            .ok_or(BeamError::UnknownStation { station: id.0 })
    }

    fn link_mut(&mut self, key: LinkKey) -> Result<&mut LinkTrainingState> {
        self.links.get_mut(&key).ok_or(BeamError::UnknownLink {
            src: key.src.0,
            dst: key.dst.0,
        })
    }

    fn phase_of(&self, key: LinkKey) -> Option<Phase> {
        self.links.get(&key).map(|state| state.phase)
    }

    /// Every link touching `station`; at least one must exist
    fn group_links(&self, station: StationId) -> Result<Vec<LinkKey>> {
        let group: Vec<LinkKey> = self.links.keys().filter(|key| key.touches(station)).copied().collect();
        if group.is_empty() {
            let coordinator = self.coordinator()?.id;
            return Err(BeamError::UnknownLink {
                src: station.0,
                dst: coordinator.0,
            });
        }
        Ok(group)
    }

    fn expect_phase(&self, key: LinkKey, allowed: &[Phase], signal: &'static str) -> Result<()> {
        let phase = self.phase_of(key).ok_or(BeamError::UnknownLink {
            src: key.src.0,
            dst: key.dst.0,
        })?;
        if allowed.contains(&phase) {
            Ok(())
        } else {
            Err(BeamError::OutOfOrderSignal {
                src: key.src.0,
                dst: key.dst.0,
                signal: signal.to_string(),
                phase: phase.to_string(),
            })
        }
    }

    /// Move a link to `to` and persist the transition
    fn transition(&mut self, key: LinkKey, to: Phase, ctx: SignalContext) -> Result<()> {
        let state = self.link_mut(key)?;
        let from = state.phase;
        if from == to {
            return Ok(());
        }
        state.phase = to;
        debug!(link = %key, %from, %to, "Phase transition");
        self.sink.record(TraceRecord::PhaseCompletion {
            src: key.src,
            dst: key.dst,
            from,
            to,
            time: ctx.time,
        })
    }
}
