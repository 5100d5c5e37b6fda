// Environment registration: construct environments by id.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::core::{Env, GymError, Result};
use crate::spaces::Image;

/// Id of the remote road simulator environment.
pub const SIMPLESIM_AGENT_ID: &str = "SimpleSim-Agent-v0";

/// Key-value kwargs for `make`. Stringly-typed; each factory parses what it needs.
pub type KwArgs = HashMap<String, String>;

/// A constructed environment with the camera observation and steering action types.
pub type BoxedEnv = Box<dyn Env<Obs = Image, Act = Vec<f32>>>;

/// Factory closure building an environment from kwargs.
pub type FactoryFn = Box<dyn Fn(&KwArgs) -> Result<BoxedEnv> + Send + Sync>;

/// Environment specification metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvSpec {
    /// Unique identifier like "SimpleSim-Agent-v0".
    pub id: String,
    pub max_episode_steps: Option<u32>,
    pub reward_threshold: Option<f32>,
    /// Whether outcomes depend on more than the local seed.
    pub nondeterministic: bool,
    pub version: Option<String>,
}

impl EnvSpec {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into(), max_episode_steps: None, reward_threshold: None, nondeterministic: false, version: None }
    }
}

#[derive(Default)]
struct RegistryInner {
    specs: HashMap<String, EnvSpec>,
    factories: HashMap<String, FactoryFn>,
}

struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    fn new() -> Self { Self { inner: RwLock::new(RegistryInner::default()) } }

    fn register(&self, spec: EnvSpec, factory: FactoryFn) -> Result<()> {
        let mut g = self.inner.write().map_err(|_| GymError::Other("registry poisoned".into()))?;
        if g.specs.contains_key(&spec.id) {
            return Err(GymError::Other(format!("Env id already registered: {}", spec.id)));
        }
        g.factories.insert(spec.id.clone(), factory);
        g.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    fn contains(&self, id: &str) -> bool {
        self.inner.read().map(|g| g.specs.contains_key(id)).unwrap_or(false)
    }

    fn get_spec(&self, id: &str) -> Option<EnvSpec> {
        let g = self.inner.read().ok()?;
        g.specs.get(id).cloned()
    }

    fn make(&self, id: &str, kwargs: &KwArgs) -> Result<BoxedEnv> {
        let guard = self.inner.read().map_err(|_| GymError::Other("registry poisoned".into()))?;
        match guard.factories.get(id) {
            Some(f) => f(kwargs),
            None => Err(GymError::Other(format!("Unknown environment id: {id}"))),
        }
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry { REGISTRY.get_or_init(Registry::new) }

/// Register an environment spec and its factory globally.
pub fn register(spec: EnvSpec, factory: FactoryFn) -> Result<()> { registry().register(spec, factory) }

/// Fetch a registered EnvSpec by id.
pub fn get_spec(id: &str) -> Option<EnvSpec> { registry().get_spec(id) }

/// Construct a registered environment. For remote environments this connects
/// and performs the initial reset.
pub fn make<S: AsRef<str>>(id: S, kwargs: &KwArgs) -> Result<BoxedEnv> { registry().make(id.as_ref(), kwargs) }

/// Read an optional boolean kwarg (`true`/`false`/`1`/`0`).
pub fn kwarg_bool(kwargs: &KwArgs, key: &str) -> Result<Option<bool>> {
    match kwargs.get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if v == "true" || v == "1" => Ok(Some(true)),
        Some(v) if v == "false" || v == "0" => Ok(Some(false)),
        Some(v) => Err(GymError::Other(format!("kwarg `{key}` expects a boolean, got `{v}`"))),
    }
}

/// Register the crate's built-in environments. Safe to call more than once.
#[cfg(feature = "zmq")]
pub fn register_defaults() -> Result<()> {
    use crate::envs::SimpleSimAgentEnv;

    if registry().contains(SIMPLESIM_AGENT_ID) {
        return Ok(());
    }
    let spec = EnvSpec {
        id: SIMPLESIM_AGENT_ID.into(),
        max_episode_steps: None,
        reward_threshold: None,
        nondeterministic: true,
        version: Some("0".into()),
    };
    let factory: FactoryFn = Box::new(|kwargs: &KwArgs| -> Result<BoxedEnv> {
        let debug = kwarg_bool(kwargs, "debug")?.unwrap_or(false);
        Ok(Box::new(SimpleSimAgentEnv::new(debug)?))
    });
    match register(spec, factory) {
        // Lost a race with another caller registering the same id.
        Err(_) if registry().contains(SIMPLESIM_AGENT_ID) => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RenderMode;
    use crate::envs::SimpleSimAgentEnv;
    use crate::remote::{RemoteRobot, Reply};

    struct EchoRobot;

    impl RemoteRobot for EchoRobot {
        fn reset(&mut self) -> Result<()> { Ok(()) }
        fn step(&mut self, action: [f32; 2], _with_observation: bool) -> Result<Option<Reply>> {
            Ok(Some(Reply { observation: None, reward: action[0] + action[1], done: false }))
        }
        fn observe(&mut self) -> Result<Reply> { Ok(Reply::default()) }
    }

    #[test]
    fn register_and_make_with_kwargs() {
        let spec = EnvSpec { version: Some("0".into()), ..EnvSpec::new("Echo-v0") };
        let factory: FactoryFn = Box::new(|kwargs: &KwArgs| -> Result<BoxedEnv> {
            let debug = kwarg_bool(kwargs, "debug")?.unwrap_or(false);
            Ok(Box::new(SimpleSimAgentEnv::with_robot(EchoRobot, debug)?))
        });
        register(spec.clone(), factory).expect("register ok");
        assert_eq!(get_spec("Echo-v0"), Some(spec));

        let mut kwargs = KwArgs::new();
        kwargs.insert("debug".into(), "true".into());
        let mut env = make("Echo-v0", &kwargs).expect("make ok");
        let s = env.step(vec![0.25, 0.5]).unwrap();
        assert_eq!(s.reward, 0.75);
        assert_eq!(env.render(RenderMode::RgbArray, false).unwrap(), None);
    }

    #[test]
    fn duplicate_and_unknown_ids_fail() {
        let f = || -> FactoryFn {
            Box::new(|_: &KwArgs| -> Result<BoxedEnv> {
                Ok(Box::new(SimpleSimAgentEnv::with_robot(EchoRobot, false)?))
            })
        };
        register(EnvSpec::new("Dup-v0"), f()).unwrap();
        assert!(register(EnvSpec::new("Dup-v0"), f()).is_err());
        assert!(make("Missing-v0", &KwArgs::new()).is_err());
    }

    #[test]
    fn bad_boolean_kwarg_is_rejected() {
        let mut kwargs = KwArgs::new();
        kwargs.insert("debug".into(), "maybe".into());
        assert!(kwarg_bool(&kwargs, "debug").is_err());
        assert_eq!(kwarg_bool(&KwArgs::new(), "debug").unwrap(), None);
    }
}
