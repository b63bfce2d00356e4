use chorus_core::IceServerConfig;

/// ICE configuration shared by every peer connection in a session.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![
                    "stun:stun.l.google.com:19302".to_string(),
                    "stun:stun1.l.google.com:19302".to_string(),
                    "stun:stun2.l.google.com:19302".to_string(),
                    "stun:stun3.l.google.com:19302".to_string(),
                    "stun:stun4.l.google.com:19302".to_string(),
                ],
                username: None,
                credential: None,
            }],
        }
    }
}
