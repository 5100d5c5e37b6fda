#![cfg(feature = "zmq")]

//! Runs the adapter against an in-process simulator speaking the real
//! PUSH/PULL + PUB/SUB transport.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{Value, json};

use gym_duckietown_agent::remote::wire;
use gym_duckietown_agent::{
    CAMERA_HEIGHT, CAMERA_WIDTH, ClientConfig, Env, Image, RenderMode, Reply, SimpleSimAgentEnv, ZmqRobot,
};

const DEADLINE: Duration = Duration::from_secs(10);

/// A simulator that publishes one scripted frame per command it pulls.
struct FakeSimulator {
    config: ClientConfig,
    commands: mpsc::Receiver<Value>,
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl FakeSimulator {
    fn spawn(replies: Vec<Reply>, latency: Duration) -> Self {
        let (ports_tx, ports_rx) = mpsc::channel();
        let (commands_tx, commands) = mpsc::channel();
        let (shutdown, shutdown_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let ctx = zmq::Context::new();
            let pull = ctx.socket(zmq::PULL).unwrap();
            pull.set_rcvtimeo(DEADLINE.as_millis() as i32).unwrap();
            pull.bind("tcp://127.0.0.1:*").unwrap();
            let publisher = ctx.socket(zmq::PUB).unwrap();
            publisher.bind("tcp://127.0.0.1:*").unwrap();
            ports_tx.send((bound_port(&pull), bound_port(&publisher))).unwrap();

            for reply in replies {
                let Ok(bytes) = pull.recv_bytes(0) else { return };
                commands_tx.send(serde_json::from_slice(&bytes).unwrap()).unwrap();
                thread::sleep(latency);
                let (header, payload) = wire::encode_frame(&reply).unwrap();
                publisher.send_multipart([header, payload], 0).unwrap();
            }
            let _ = shutdown_rx.recv_timeout(DEADLINE);
        });
        let (action_port, observation_port) = ports_rx.recv_timeout(DEADLINE).unwrap();
        let config = ClientConfig { host: "127.0.0.1".into(), action_port, observation_port };
        Self { config, commands, shutdown, handle }
    }

    fn received(&self) -> Vec<Value> { self.commands.try_iter().collect() }

    fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.join().unwrap();
    }
}

fn bound_port(socket: &zmq::Socket) -> u16 {
    let endpoint = socket.get_last_endpoint().unwrap().unwrap();
    endpoint.rsplit(':').next().unwrap().parse().unwrap()
}

/// Run `f` on its own thread and fail instead of hanging if it blocks.
fn within_deadline<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(DEADLINE).expect("simulator call blocked")
}

fn frame(seed: u8) -> Image {
    let data = (0..CAMERA_HEIGHT * CAMERA_WIDTH * 3).map(|i| (i as u8).wrapping_mul(seed)).collect();
    Image::from_raw(CAMERA_HEIGHT, CAMERA_WIDTH, 3, data).unwrap()
}

fn reply(seed: u8, reward: f32, done: bool) -> Reply { Reply { observation: Some(frame(seed)), reward, done } }

#[test]
fn episode_round_trips_over_real_sockets() {
    let sim = FakeSimulator::spawn(
        vec![reply(1, 0.0, false), reply(2, -4.5, false), reply(3, 0.0, false)],
        Duration::from_millis(50),
    );
    let config = sim.config.clone();

    let rendered = within_deadline(move || {
        let mut env = SimpleSimAgentEnv::with_robot(ZmqRobot::connect(config).unwrap(), false).unwrap();
        let step = env.step(vec![0.5, -0.25]).unwrap();
        let first = env.render(RenderMode::RgbArray, false).unwrap();
        let second = env.render(RenderMode::RgbArray, false).unwrap();
        env.reset().unwrap();
        (step.observation, step.reward, step.done, first, second)
    });

    let (observation, reward, done, first, second) = rendered;
    assert_eq!(observation, Some(frame(2)));
    assert_eq!((reward, done), (-4.5, false));
    // Rendering reads the newest frame and does not advance the simulation.
    assert_eq!(first, Some(frame(2)));
    assert_eq!(second, Some(frame(2)));

    let commands = sim.received();
    assert_eq!(commands.len(), 3, "{commands:?}");
    assert_eq!(commands[0]["type"], "reset");
    assert!(commands[0].get("data").is_none());
    assert_eq!(commands[1]["type"], "step");
    assert_eq!(commands[1]["data"], json!([0.5, -0.25]));
    assert_eq!(commands[2]["type"], "reset");
    for command in &commands {
        assert_eq!(command["ip"], "127.0.0.1");
    }
    sim.stop();
}

#[test]
fn construction_sees_an_immediate_reset_reply() {
    for _ in 0..5 {
        let sim = FakeSimulator::spawn(vec![Reply { observation: None, reward: 0.0, done: false }], Duration::ZERO);
        let config = sim.config.clone();
        let constructed = within_deadline(move || {
            SimpleSimAgentEnv::with_robot(ZmqRobot::connect(config).unwrap(), false).map(|_| ()).is_ok()
        });
        assert!(constructed);
        assert_eq!(sim.received().len(), 1);
        sim.stop();
    }
}

#[test]
fn render_before_any_step_returns_the_reset_frame() {
    let sim = FakeSimulator::spawn(vec![reply(7, 0.0, false)], Duration::ZERO);
    let config = sim.config.clone();
    let rendered = within_deadline(move || {
        let mut env = SimpleSimAgentEnv::with_robot(ZmqRobot::connect(config).unwrap(), false).unwrap();
        env.render(RenderMode::RgbArray, false).unwrap()
    });
    assert_eq!(rendered, Some(frame(7)));
    sim.stop();
}
