// Registration and specs for the avoidance environment variants.
// Maps environment ids such as `MovingBoxTargetUR5DoF3Sim-v0` to their
// metadata and configuration.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::client::RobotServer;
use crate::core::{GymError, Result};
use crate::envs::ur5::{ActionDim, Deployment, EnvConfig, ObstacleAvoidanceEnv, SplinePath, TargetMotion};

/// Key-value kwargs for `make`. Stringly-typed, parsed per key.
pub type KwArgs = HashMap<String, String>;

/// Environment specification metadata.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvSpec {
    /// Unique identifier like "MovingBoxTargetUR5Sim-v0".
    pub id: String,
    /// Steps after which an episode ends with `final_status = success`.
    pub max_episode_steps: Option<u32>,
    /// Whether the environment has nondeterminism beyond the RNG seed.
    pub nondeterministic: bool,
    /// Version string, free-form.
    pub version: Option<String>,
}

impl EnvSpec {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into(), max_episode_steps: None, nondeterministic: false, version: None }
    }
}

#[derive(Default)]
struct RegistryInner {
    specs: HashMap<String, EnvSpec>,
    configs: HashMap<String, EnvConfig>,
}

struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    fn new() -> Self { Self { inner: RwLock::new(RegistryInner::default()) } }

    fn with_builtins() -> Self {
        let registry = Self::new();
        for (spec, config) in builtin_variants() {
            let id = spec.id.clone();
            let registered = registry.register(spec, config);
            debug_assert!(registered.is_ok(), "built-in id {id} registered twice");
        }
        registry
    }

    fn register(&self, spec: EnvSpec, config: EnvConfig) -> Result<()> {
        let mut g = self.inner.write().map_err(|_| GymError::Other("registry poisoned".into()))?;
        if g.specs.contains_key(&spec.id) {
            return Err(GymError::Other(format!("Env id already registered: {}", spec.id)));
        }
        g.configs.insert(spec.id.clone(), config);
        g.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    fn get_spec(&self, id: &str) -> Option<EnvSpec> {
        let g = self.inner.read().ok()?;
        g.specs.get(id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        let Ok(g) = self.inner.read() else { return Vec::new() };
        let mut ids: Vec<String> = g.specs.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn make_config(&self, id: &str, kwargs: &KwArgs) -> Result<EnvConfig> {
        let guard = self.inner.read().map_err(|_| GymError::Other("registry poisoned".into()))?;
        let mut config = guard
            .configs
            .get(id)
            .cloned()
            .ok_or_else(|| GymError::Other(format!("Unknown environment id: {}", id)))?;
        apply_kwargs(&mut config, kwargs)?;
        Ok(config)
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::with_builtins)
}

/// The twelve built-in variants: {vertical, spline} x {3, 5, 6 DoF} x {sim, real}.
fn builtin_variants() -> Vec<(EnvSpec, EnvConfig)> {
    let mut out = Vec::new();
    let motions = [
        ("MovingBoxTargetUR5", TargetMotion::default()),
        ("MovingBox3DSplineTargetUR5", TargetMotion::Spline(SplinePath::default())),
    ];
    for (prefix, motion) in motions {
        for (dof, dim) in [("", ActionDim::Six), ("DoF3", ActionDim::Three), ("DoF5", ActionDim::Five)] {
            for (suffix, simulated) in [("Sim", true), ("Rob", false)] {
                let config = if simulated {
                    EnvConfig::simulated(dim, motion.clone())
                } else {
                    EnvConfig::physical(dim, motion.clone())
                };
                let spec = EnvSpec {
                    id: format!("{prefix}{dof}{suffix}-v0"),
                    max_episode_steps: Some(config.max_episode_steps),
                    nondeterministic: true,
                    version: Some("0".into()),
                };
                out.push((spec, config));
            }
        }
    }
    out
}

fn parse_kwarg<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| GymError::Validation(format!("invalid value for `{key}`: {value:?}")))
}

fn apply_kwargs(config: &mut EnvConfig, kwargs: &KwArgs) -> Result<()> {
    for (key, value) in kwargs {
        match (&mut config.deployment, key.as_str()) {
            (Deployment::Simulated(launch), "ip") => launch.ip = Some(value.clone()),
            (Deployment::Simulated(launch), "lower_bound_port") => launch.lower_bound_port = Some(parse_kwarg(key, value)?),
            (Deployment::Simulated(launch), "upper_bound_port") => launch.upper_bound_port = Some(parse_kwarg(key, value)?),
            (Deployment::Simulated(launch), "gui") => launch.gui = parse_kwarg(key, value)?,
            (Deployment::Physical { address }, "rs_address") => *address = Some(value.clone()),
            (_, "max_episode_steps") => config.max_episode_steps = parse_kwarg(key, value)?,
            _ => return Err(GymError::Validation(format!("unsupported keyword argument `{key}`"))),
        }
    }
    config.validate()
}

/// Register an environment spec and its configuration globally.
pub fn register(spec: EnvSpec, config: EnvConfig) -> Result<()> { registry().register(spec, config) }

/// Fetch a registered EnvSpec by id.
///
/// The returned `EnvSpec` holds the registered defaults. A `max_episode_steps` kwarg
/// passed to [`make`] changes only the built environment's config.
pub fn get_spec(id: &str) -> Option<EnvSpec> { registry().get_spec(id) }

/// All registered ids, sorted.
pub fn registered_ids() -> Vec<String> { registry().ids() }

/// Configuration for `id` with `kwargs` applied and validated.
pub fn make_config<S: AsRef<str>>(id: S, kwargs: &KwArgs) -> Result<EnvConfig> {
    registry().make_config(id.as_ref(), kwargs)
}

/// Construct the environment registered under `id`, talking to `server`.
pub fn make<S: AsRef<str>, R: RobotServer>(id: S, kwargs: &KwArgs, server: R) -> Result<ObstacleAvoidanceEnv<R>> {
    Ok(ObstacleAvoidanceEnv::new(make_config(id, kwargs)?, server))
}
