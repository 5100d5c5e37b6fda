//! ZeroMQ transport: commands are pushed, frames arrive on a subscription.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, trace, warn};

use crate::config::ClientConfig;
use crate::core::{GymError, Result};
use crate::remote::wire::{self, Command};
use crate::remote::{RemoteRobot, Reply};

static MONITOR_ID: AtomicUsize = AtomicUsize::new(0);

/// Connection to a running simulator. Created once and never reconnected.
///
/// The simulator publishes frames rather than answering requests, so the
/// newest frame seen is cached and `observe` serves it without blocking.
pub struct ZmqRobot {
    // Sockets must drop before the context.
    commands: zmq::Socket,
    frames: zmq::Socket,
    // Present until the frame subscription has completed its handshake.
    handshake: Option<zmq::Socket>,
    _context: zmq::Context,
    latest: Option<Reply>,
    own_ip: String,
    config: ClientConfig,
}

impl ZmqRobot {
    /// Opens both sockets. Connecting is lazy, so this succeeds without a
    /// server; the first command waits until the frame subscription is live.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let context = zmq::Context::new();

        let commands = context.socket(zmq::PUSH)?;
        commands.set_linger(0)?;
        commands.connect(&config.action_endpoint())?;

        // A publisher drops frames for subscribers that have not joined yet,
        // so handshake events are watched before connecting.
        let frames = context.socket(zmq::SUB)?;
        frames.set_subscribe(b"")?;
        let monitor_endpoint =
            format!("inproc://gym-duckietown-agent/frames-{}", MONITOR_ID.fetch_add(1, Ordering::Relaxed));
        frames.monitor(&monitor_endpoint, i32::from(zmq::SocketEvent::HANDSHAKE_SUCCEEDED.to_raw()))?;
        let handshake = context.socket(zmq::PAIR)?;
        handshake.connect(&monitor_endpoint)?;
        frames.connect(&config.observation_endpoint())?;

        let own_ip = local_ip_towards(&config.host, config.action_port).to_string();
        debug!(
            actions = %config.action_endpoint(),
            observations = %config.observation_endpoint(),
            own_ip = %own_ip,
            "connected to simulator"
        );
        Ok(Self {
            commands,
            frames,
            handshake: Some(handshake),
            _context: context,
            latest: None,
            own_ip,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    /// Address the simulator is told to publish frames for.
    pub fn own_ip(&self) -> &str { &self.own_ip }

    /// The newest frame received so far, if any.
    pub fn latest(&self) -> Option<&Reply> { self.latest.as_ref() }

    /// Blocks until the frame subscription has reached the server. Only the
    /// first call waits.
    fn wait_for_subscription(&mut self) -> Result<()> {
        let Some(monitor) = self.handshake.take() else {
            return Ok(());
        };
        loop {
            let event = monitor.recv_multipart(0)?;
            let Some(&[lo, hi]) = event.first().and_then(|frame| frame.get(..2)) else {
                return Err(GymError::Transport("malformed socket monitor event".into()));
            };
            if zmq::SocketEvent::from_raw(u16::from_ne_bytes([lo, hi])) == zmq::SocketEvent::HANDSHAKE_SUCCEEDED {
                debug!(observations = %self.config.observation_endpoint(), "frame subscription is live");
                return Ok(());
            }
        }
    }

    fn send(&mut self, command: &Command) -> Result<()> {
        self.wait_for_subscription()?;
        // Frames already queued predate this command and must not answer it.
        self.drain()?;
        trace!(kind = ?command.kind, "sending command");
        self.commands.send(command.encode()?, 0)?;
        Ok(())
    }

    fn decode(parts: &[Vec<u8>]) -> Result<Reply> {
        match parts {
            [header, payload] => wire::decode_frame(header, payload),
            [header] => wire::decode_frame(header, &[]),
            other => Err(GymError::Protocol(format!("expected 2 message parts, got {}", other.len()))),
        }
    }

    /// Blocks for the next published frame and caches it.
    fn recv_frame(&mut self) -> Result<Reply> {
        let parts = self.frames.recv_multipart(0)?;
        let reply = Self::decode(&parts)?;
        self.latest = Some(reply.clone());
        Ok(reply)
    }

    /// Reads every frame already queued without blocking, keeping the newest.
    fn drain(&mut self) -> Result<usize> {
        let mut received = 0;
        loop {
            match self.frames.recv_multipart(zmq::DONTWAIT) {
                Ok(parts) => {
                    self.latest = Some(Self::decode(&parts)?);
                    received += 1;
                }
                Err(zmq::Error::EAGAIN) => return Ok(received),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl RemoteRobot for ZmqRobot {
    fn reset(&mut self) -> Result<()> {
        self.send(&Command::reset(&self.own_ip))?;
        // The first frame after a reset acknowledges it; its contents are not needed.
        let ack = self.recv_frame()?;
        trace!(has_observation = ack.observation.is_some(), "reset acknowledged");
        Ok(())
    }

    fn step(&mut self, action: [f32; 2], with_observation: bool) -> Result<Option<Reply>> {
        self.send(&Command::step(&self.own_ip, action))?;
        if with_observation { self.recv_frame().map(Some) } else { Ok(None) }
    }

    fn observe(&mut self) -> Result<Reply> {
        let received = self.drain()?;
        trace!(received, cached = self.latest.is_some(), "observing");
        Ok(self.latest.clone().unwrap_or_default())
    }
}

// The interface used to reach the simulator determines which address it should
// publish to. A UDP connect does not send anything.
fn local_ip_towards(host: &str, port: u16) -> IpAddr {
    let probe = UdpSocket::bind("0.0.0.0:0")
        .and_then(|sock| sock.connect((host, port)).map(|_| sock))
        .and_then(|sock| sock.local_addr());
    match probe {
        Ok(addr) => addr.ip(),
        Err(e) => {
            warn!(host, error = %e, "could not determine local address, using loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> ClientConfig {
        ClientConfig { host: "127.0.0.1".into(), action_port: 45558, observation_port: 45557 }
    }

    #[test]
    fn loopback_host_resolves_to_loopback_interface() {
        assert!(local_ip_towards("127.0.0.1", 5558).is_loopback());
    }

    #[test]
    fn connect_does_not_require_a_running_server() {
        // zmq connects lazily, so construction succeeds without a peer.
        let cfg = unreachable_config();
        let robot = ZmqRobot::connect(cfg.clone()).unwrap();
        assert_eq!(robot.config(), &cfg);
        assert!(!robot.own_ip().is_empty());
        assert!(robot.latest().is_none());
    }

    #[test]
    fn observe_without_any_frame_returns_an_empty_reply() {
        let mut robot = ZmqRobot::connect(unreachable_config()).unwrap();
        let reply = robot.observe().unwrap();
        assert_eq!(reply, Reply::default());
        assert!(reply.observation.is_none());
    }
}
