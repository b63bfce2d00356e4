use std::sync::Arc;

use chorus_core::UserId;
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::error::SessionError;
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::TransportEvent;

/// One WebRTC connection to a remote participant.
///
/// The shared mic track is attached at construction, so renegotiation is
/// never needed when the local user mutes or switches devices. Everything
/// asynchronous about the connection surfaces on `event_tx`.
pub struct PeerTransport {
    pub remote: UserId,
    pub peer_connection: Arc<RTCPeerConnection>,
}

impl PeerTransport {
    pub async fn new(
        remote: UserId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
        mic_track: Arc<TrackLocalStaticSample>,
    ) -> Result<Self, SessionError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        peer_connection
            .add_track(mic_track as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        // Callbacks must be 'static, so each one gets its own clones.
        let state_tx = event_tx.clone();
        let uid_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    debug!(remote = %uid, state = %s, "peer connection state changed");
                    let _ = tx.send(TransportEvent::StateChanged(uid, s)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let uid_ice = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(uid, str_candidate))
                    .await;
            })
        }));

        let track_tx = event_tx.clone();
        let uid_track = remote.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>, _: Arc<RTCRtpReceiver>, _: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    debug!(remote = %uid, "remote track arrived");
                    let _ = tx.send(TransportEvent::RemoteTrack(uid, track)).await;
                })
            },
        ));

        Ok(Self {
            remote,
            peer_connection,
        })
    }

    /// Creates an offer and installs it as the local description.
    pub async fn create_offer(&self) -> Result<String, SessionError> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    /// Applies a remote offer and produces the local answer.
    pub async fn apply_offer(&self, sdp: String) -> Result<String, SessionError> {
        let desc = RTCSessionDescription::offer(sdp)?;
        self.peer_connection.set_remote_description(desc).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    /// Applies the remote answer to our outstanding offer.
    pub async fn apply_answer(&self, sdp: String) -> Result<(), SessionError> {
        let desc = RTCSessionDescription::answer(sdp)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    /// Adds a trickled remote ICE candidate.
    pub async fn add_ice_candidate(&self, candidate_json: &str) -> Result<(), SessionError> {
        let candidate: RTCIceCandidateInit = serde_json::from_str(candidate_json)?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    pub async fn close(&self) -> Result<(), SessionError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
