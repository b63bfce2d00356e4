use std::sync::{Arc, Weak};
use std::time::Duration;

use chorus_audio::{
    AudioPipeline, CaptureSource, DetectionGraph, PlaybackSink, SAMPLE_RATE, SpeechDetector,
};
use chorus_core::{NegotiationMessage, PresenceInfo, UserId};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_remote::TrackRemote;

use crate::error::SessionError;
use crate::pool::{NegotiationState, PeerPool, PeerSession, incoming_offer_wins};
use crate::session::command::SessionCommand;
use crate::session::config::VoiceSessionConfig;
use crate::session::factory::PlaybackFactory;
use crate::session::handle::VoiceSessionHandle;
use crate::session::snapshot::RoomSnapshot;
use crate::signaling::{Profile, ProfileLookup, RosterState, SignalEvent, SignalingChannel};
use crate::transport::{MicTrack, PeerTransport, TransportEvent, decode_samples};

const COMMAND_BUFFER: usize = 64;
const TRANSPORT_BUFFER: usize = 256;
const STALL_SWEEP_PERIOD: Duration = Duration::from_millis(500);

/// Per-room actor owning the roster, the peer pool and the mic pipeline.
///
/// Everything runs on one event loop: commands from the handle, signaling
/// events from the channel, and transport events from the pooled peer
/// connections. The loop keeps the pool converged with the roster and
/// tears everything down when asked to leave.
pub struct VoiceSession {
    config: VoiceSessionConfig,
    local: PresenceInfo,
    channel: Arc<dyn SignalingChannel>,
    playback_factory: Arc<dyn PlaybackFactory>,
    mic: MicTrack,
    pipeline: Option<AudioPipeline>,
    roster: RosterState,
    pool: PeerPool,
    deafened: bool,
    output_device: Option<String>,
    last_error: Option<String>,
    signal_rx: mpsc::Receiver<SignalEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    snapshot_tx: watch::Sender<RoomSnapshot>,
}

impl VoiceSession {
    /// Joins a room and spawns the session loop.
    ///
    /// Resources are claimed in order: profile, subscription, microphone,
    /// presence. A failure at any step releases what came before it and
    /// returns the error, leaving nothing half-joined.
    pub async fn join(
        config: VoiceSessionConfig,
        channel: Arc<dyn SignalingChannel>,
        profiles: Arc<dyn ProfileLookup>,
        capture: Arc<dyn CaptureSource>,
        playback_factory: Arc<dyn PlaybackFactory>,
    ) -> Result<VoiceSessionHandle, SessionError> {
        let profile = match profiles.profile(&config.local_user).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(%err, "profile lookup failed, joining with placeholder");
                Profile::placeholder(&config.local_user)
            }
        };
        let mut local = PresenceInfo::new(config.local_user.clone(), profile.username);
        local.avatar_url = profile.avatar_url;

        let signal_rx = timeout(config.subscribe_timeout, channel.subscribe(&local.user_id))
            .await
            .map_err(|_| SessionError::Signaling("room subscription timed out".into()))??;

        let mic = MicTrack::new();
        let pipeline = match AudioPipeline::acquire(
            capture,
            Arc::new(mic.clone()),
            config.input_device.as_deref(),
            config.noise_cancellation,
        )
        .await
        {
            Ok(pipeline) => pipeline,
            Err(err) => {
                channel.unsubscribe().await;
                return Err(err.into());
            }
        };

        if let Err(err) = channel.track(local.clone()).await {
            pipeline.release();
            channel.unsubscribe().await;
            return Err(err);
        }

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_BUFFER);

        let mut roster = RosterState::new(local.user_id.clone());
        roster.apply_join(vec![local.clone()]);

        let (snapshot_tx, snapshot_rx) = watch::channel(RoomSnapshot {
            participants: roster.participants(),
            sessions: Vec::new(),
            joined: true,
            muted: false,
            deafened: false,
            noise_cancellation: pipeline.noise_cancellation_level(),
            input_device: pipeline.input_device().to_string(),
            last_error: None,
        });

        info!(room = %config.room, user = %local.user_id, "joined room");

        let session = VoiceSession {
            output_device: config.output_device.clone(),
            config,
            local: local.clone(),
            channel,
            playback_factory,
            mic,
            pipeline: Some(pipeline),
            roster,
            pool: PeerPool::new(),
            deafened: false,
            last_error: None,
            signal_rx,
            command_rx,
            transport_rx,
            transport_tx,
            snapshot_tx,
        };
        let handle = VoiceSessionHandle::new(local.user_id, command_tx, snapshot_rx);
        tokio::spawn(session.run());
        Ok(handle)
    }

    async fn run(mut self) {
        info!(room = %self.config.room, "session loop started");

        let mut speaking_rx = match &self.pipeline {
            Some(pipeline) => pipeline.speaking(),
            None => return,
        };
        let mut stall_sweep = tokio::time::interval(STALL_SWEEP_PERIOD);
        stall_sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Leave(ack)) => {
                            self.shutdown().await;
                            let _ = ack.send(());
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            debug!("handle dropped, leaving room");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                evt = self.signal_rx.recv() => {
                    match evt {
                        Some(evt) => self.handle_signal(evt).await,
                        None => {
                            warn!("signaling channel closed, leaving room");
                            self.shutdown().await;
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    // The loop holds a sender, so this arm never yields None.
                    if let Some(evt) = evt {
                        self.handle_transport(evt).await;
                    }
                }

                changed = speaking_rx.changed() => {
                    if changed.is_ok() {
                        let speaking = *speaking_rx.borrow_and_update();
                        let local = self.local.user_id.clone();
                        if self.roster.set_speaking(&local, speaking) {
                            self.publish();
                        }
                    }
                }

                _ = stall_sweep.tick() => {
                    self.sweep_stalled().await;
                }
            }
        }

        info!(room = %self.config.room, "session loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            // Leave is intercepted in `run` before reaching here.
            SessionCommand::Leave(ack) => {
                let _ = ack.send(());
            }

            SessionCommand::ToggleMute => {
                let Some(pipeline) = self.pipeline.as_mut() else {
                    return;
                };
                let muted = !pipeline.is_muted();
                pipeline.set_muted(muted);
                self.local.muted = muted;
                let local = self.local.user_id.clone();
                self.roster.set_muted(&local, muted);
                self.channel
                    .send(NegotiationMessage::MuteStatus { from: local, muted })
                    .await;
                self.publish();
            }

            SessionCommand::ToggleDeafen => {
                self.deafened = !self.deafened;
                for session in self.pool.sessions() {
                    if let Some(playback) = &session.playback {
                        playback.set_muted(self.deafened || self.roster.is_muted(&session.remote));
                    }
                }
                self.publish();
            }

            SessionCommand::SetNoiseCancellation(level) => {
                if let Some(pipeline) = &self.pipeline {
                    pipeline.set_noise_cancellation_level(level);
                }
                self.publish();
            }

            SessionCommand::SwitchInputDevice(device) => {
                let Some(pipeline) = self.pipeline.as_mut() else {
                    return;
                };
                if let Err(err) = pipeline.switch_input_device(&device).await {
                    warn!(%err, device, "input device switch failed");
                    self.last_error = Some(err.to_string());
                }
                self.publish();
            }

            SessionCommand::SwitchOutputDevice(device) => {
                for session in self.pool.sessions() {
                    if let Some(playback) = &session.playback {
                        if let Err(err) = playback.set_output_device(&device) {
                            warn!(%err, device, remote = %session.remote, "output device switch failed");
                            self.last_error = Some(err.to_string());
                        }
                    }
                }
                self.output_device = Some(device);
                self.publish();
            }
        }
    }

    async fn handle_signal(&mut self, event: SignalEvent) {
        match event {
            SignalEvent::PresenceSync(infos) => {
                self.roster.apply_sync(infos);
                self.converge().await;
                self.publish();
            }

            SignalEvent::PresenceJoin(infos) => {
                self.roster.apply_join(infos.clone());
                for info in infos {
                    let remote = info.user_id;
                    if remote != *self.roster.local() && !self.pool.contains(&remote) {
                        self.open_offer_session(remote).await;
                    }
                }
                self.publish();
            }

            SignalEvent::PresenceLeave(ids) => {
                self.roster.apply_leave(&ids);
                for id in &ids {
                    if self.pool.remove(id).await {
                        debug!(remote = %id, "peer left, session closed");
                    }
                }
                self.publish();
            }

            SignalEvent::Message(message) => {
                let local = self.roster.local().clone();
                if *message.from_user() == local || !message.addressed_to(&local) {
                    return;
                }
                self.handle_message(message).await;
            }
        }
    }

    async fn handle_message(&mut self, message: NegotiationMessage) {
        match message {
            NegotiationMessage::Offer { from, sdp, .. } => {
                self.handle_offer(from, sdp).await;
            }

            NegotiationMessage::Answer { from, sdp, .. } => {
                let Some(session) = self.pool.get(&from) else {
                    debug!(remote = %from, "answer for unknown session, dropped");
                    return;
                };
                if session.negotiation != NegotiationState::OfferSent {
                    debug!(remote = %from, "stale answer, dropped");
                    return;
                }
                if let Err(err) = session.transport.apply_answer(sdp).await {
                    self.fail_peer(from, err.to_string()).await;
                }
            }

            NegotiationMessage::IceCandidate {
                from, candidate, ..
            } => {
                let Some(session) = self.pool.get(&from) else {
                    debug!(remote = %from, "candidate for unknown session, dropped");
                    return;
                };
                if let Err(err) = session.transport.add_ice_candidate(&candidate).await {
                    debug!(remote = %from, %err, "ice candidate rejected");
                }
            }

            NegotiationMessage::MuteStatus { from, muted } => {
                if self.roster.set_muted(&from, muted) {
                    if let Some(session) = self.pool.get(&from) {
                        if let Some(playback) = &session.playback {
                            playback.set_muted(muted || self.deafened);
                        }
                    }
                    self.publish();
                }
            }
        }
    }

    async fn handle_offer(&mut self, from: UserId, sdp: String) {
        if let Some(existing) = self.pool.get(&from) {
            let glare = existing.negotiation == NegotiationState::OfferSent;
            if glare && !incoming_offer_wins(&from, self.roster.local()) {
                debug!(remote = %from, "glare: our offer wins, incoming dropped");
                return;
            }
            debug!(remote = %from, glare, "discarding existing session for incoming offer");
            self.pool.remove(&from).await;
        }

        if let Err(err) = self.open_answer_session(from.clone(), sdp).await {
            self.fail_peer(from, err.to_string()).await;
        }
        self.publish();
    }

    /// Creates a transport toward `remote`, sends our offer over signaling
    /// and pools the session as `OfferSent`.
    async fn open_offer_session(&mut self, remote: UserId) {
        let result = async {
            let transport = PeerTransport::new(
                remote.clone(),
                &self.config.transport,
                self.transport_tx.clone(),
                self.mic.track(),
            )
            .await?;
            let sdp = transport.create_offer().await?;
            Ok::<_, SessionError>((transport, sdp))
        }
        .await;

        match result {
            Ok((transport, sdp)) => {
                self.channel
                    .send(NegotiationMessage::Offer {
                        from: self.roster.local().clone(),
                        to: remote.clone(),
                        sdp,
                    })
                    .await;
                self.pool
                    .insert(PeerSession::new(transport, NegotiationState::OfferSent))
                    .await;
                debug!(remote = %remote, "offer sent");
            }
            Err(err) => {
                self.fail_peer(remote, err.to_string()).await;
            }
        }
    }

    /// Answers `remote`'s offer and pools the session as `OfferReceived`.
    async fn open_answer_session(&mut self, remote: UserId, sdp: String) -> Result<(), SessionError> {
        let transport = PeerTransport::new(
            remote.clone(),
            &self.config.transport,
            self.transport_tx.clone(),
            self.mic.track(),
        )
        .await?;
        let answer = transport.apply_offer(sdp).await?;
        self.channel
            .send(NegotiationMessage::Answer {
                from: self.roster.local().clone(),
                to: remote.clone(),
                sdp: answer,
            })
            .await;
        self.pool
            .insert(PeerSession::new(transport, NegotiationState::OfferReceived))
            .await;
        debug!(remote = %remote, "offer answered");
        Ok(())
    }

    /// Brings the pool in line with the roster: a session per remote
    /// participant, none for anyone who is gone.
    async fn converge(&mut self) {
        for id in self.pool.ids() {
            if !self.roster.contains(&id) {
                debug!(remote = %id, "participant gone from roster, closing session");
                self.pool.remove(&id).await;
            }
        }
        for id in self.roster.remote_ids() {
            if !self.pool.contains(&id) {
                self.open_offer_session(id).await;
            }
        }
    }

    /// Fails sessions still negotiating past the timeout. Signaling is
    /// best-effort: a lost answer leaves a session in `OfferSent` with no
    /// remote description, so ICE never runs and no state change arrives.
    /// The stalled session is torn down and, while the peer remains in the
    /// roster, negotiation starts over with a fresh offer.
    async fn sweep_stalled(&mut self) {
        let stalled = self.pool.stalled(self.config.negotiation_timeout);
        if stalled.is_empty() {
            return;
        }
        for remote in stalled {
            warn!(remote = %remote, "negotiation timed out");
            self.fail_peer(remote.clone(), "negotiation timed out".into())
                .await;
            if self.roster.contains(&remote) {
                self.open_offer_session(remote).await;
            }
        }
        self.publish();
    }

    async fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(remote, candidate) => {
                self.channel
                    .send(NegotiationMessage::IceCandidate {
                        from: self.roster.local().clone(),
                        to: remote,
                        candidate,
                    })
                    .await;
            }

            TransportEvent::StateChanged(remote, state) => match state {
                RTCPeerConnectionState::Connected => {
                    if let Some(session) = self.pool.get_mut(&remote) {
                        session.negotiation = NegotiationState::Connected;
                        info!(remote = %remote, "peer connected");
                        self.publish();
                    }
                }
                // `Closed` is what our own teardown emits, so only the
                // states a live connection degrades into count as failure.
                RTCPeerConnectionState::Failed | RTCPeerConnectionState::Disconnected => {
                    if self.pool.remove(&remote).await {
                        warn!(remote = %remote, %state, "peer connection lost");
                        self.last_error = Some(
                            SessionError::Negotiation {
                                peer: remote,
                                reason: format!("connection {state}"),
                            }
                            .to_string(),
                        );
                        self.publish();
                    }
                }
                _ => {}
            },

            TransportEvent::RemoteTrack(remote, track) => {
                self.attach_playback(remote, track);
                self.publish();
            }

            TransportEvent::SpeakingChanged(remote, speaking) => {
                if self.roster.set_speaking(&remote, speaking) {
                    self.publish();
                }
            }
        }
    }

    /// Starts playback for a peer's remote track and spawns the reader
    /// task that feeds the sink and derives the peer's speaking flag.
    fn attach_playback(&mut self, remote: UserId, track: Arc<TrackRemote>) {
        let muted = self.deafened || self.roster.is_muted(&remote);
        let Some(session) = self.pool.get_mut(&remote) else {
            debug!(remote = %remote, "track for unknown session, dropped");
            return;
        };

        let playback = match self
            .playback_factory
            .create(&remote, self.output_device.as_deref())
        {
            Ok(playback) => playback,
            Err(err) => {
                warn!(remote = %remote, %err, "playback sink creation failed");
                self.last_error = Some(err.to_string());
                return;
            }
        };
        playback.set_muted(muted);

        spawn_track_reader(
            remote.clone(),
            track,
            Arc::downgrade(&playback),
            self.transport_tx.clone(),
        );
        session.playback = Some(playback);
        info!(remote = %remote, "playback started");
    }

    async fn fail_peer(&mut self, remote: UserId, reason: String) {
        warn!(remote = %remote, reason, "negotiation failed");
        self.pool.remove(&remote).await;
        self.last_error = Some(
            SessionError::Negotiation {
                peer: remote,
                reason,
            }
            .to_string(),
        );
        self.publish();
    }

    /// Teardown in reverse join order: presence, subscription, peer
    /// connections, microphone.
    async fn shutdown(&mut self) {
        info!(room = %self.config.room, "leaving room");

        self.channel.untrack().await;
        self.channel.unsubscribe().await;

        let closed = self.pool.clear().await;
        debug!(closed, "peer sessions closed");

        if let Some(pipeline) = self.pipeline.take() {
            pipeline.release();
        }

        self.roster.clear();
        self.snapshot_tx.send_replace(RoomSnapshot {
            joined: false,
            noise_cancellation: self.config.noise_cancellation,
            ..RoomSnapshot::default()
        });
    }

    fn publish(&self) {
        let (muted, noise_cancellation, input_device) = match &self.pipeline {
            Some(pipeline) => (
                pipeline.is_muted(),
                pipeline.noise_cancellation_level(),
                pipeline.input_device().to_string(),
            ),
            None => (false, self.config.noise_cancellation, String::new()),
        };
        self.snapshot_tx.send_replace(RoomSnapshot {
            participants: self.roster.participants(),
            sessions: self.pool.summaries(),
            joined: true,
            muted,
            deafened: self.deafened,
            noise_cancellation,
            input_device,
            last_error: self.last_error.clone(),
        });
    }
}

/// Reads a peer's track until it ends, feeding playback and speech
/// detection. Holds only a weak handle to the sink so a closed session
/// stops the reader instead of keeping the sink alive.
fn spawn_track_reader(
    remote: UserId,
    track: Arc<TrackRemote>,
    playback: Weak<dyn PlaybackSink>,
    events: mpsc::Sender<TransportEvent>,
) {
    tokio::spawn(async move {
        // Level 0 keeps the graph transparent; remote audio gets speech
        // detection but no suppression.
        let mut graph = DetectionGraph::new(SAMPLE_RATE as f32, 0);
        let mut detector = SpeechDetector::new();

        while let Ok((packet, _)) = track.read_rtp().await {
            let Some(playback) = playback.upgrade() else {
                break;
            };
            let samples = decode_samples(&packet.payload);
            if samples.is_empty() {
                continue;
            }
            let activity = graph.process(&samples);
            playback.write(&samples);
            if let Some(speaking) = detector.update(activity) {
                let _ = events
                    .send(TransportEvent::SpeakingChanged(remote.clone(), speaking))
                    .await;
            }
        }

        debug!(remote = %remote, "track reader finished");
        if detector.is_speaking() {
            let _ = events
                .send(TransportEvent::SpeakingChanged(remote, false))
                .await;
        }
    });
}
