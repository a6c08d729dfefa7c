// Core traits and types shared by every environment in the crate.

/// A small ordered info map returned alongside observations.
/// Stores a handful of key-value pairs; lookups are linear.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Info {
    entries: Vec<(String, InfoValue)>,
}

impl Info {
    /// Create an empty Info map.
    pub fn new() -> Self { Self { entries: Vec::new() } }

    /// Insert or replace a key with the given value.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: InfoValue) {
        let k = key.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(kk, _)| kk == &k) {
            *v = value;
        } else {
            self.entries.push((k, value));
        }
    }

    /// Get a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a string value by key, if present and of string type.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(InfoValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }
}

/// Value types that can live in an [`Info`] map.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    /// A short numeric vector, e.g. a Cartesian coordinate.
    Vector(Vec<f64>),
}

impl From<bool> for InfoValue { fn from(v: bool) -> Self { InfoValue::Bool(v) } }
impl From<i64> for InfoValue { fn from(v: i64) -> Self { InfoValue::I64(v) } }
impl From<u32> for InfoValue { fn from(v: u32) -> Self { InfoValue::I64(v as i64) } }
impl From<f64> for InfoValue { fn from(v: f64) -> Self { InfoValue::F64(v) } }
impl From<&str> for InfoValue { fn from(v: &str) -> Self { InfoValue::Str(v.to_string()) } }
impl From<String> for InfoValue { fn from(v: String) -> Self { InfoValue::Str(v) } }
impl From<Vec<f64>> for InfoValue { fn from(v: Vec<f64>) -> Self { InfoValue::Vector(v) } }
impl<const N: usize> From<[f64; N]> for InfoValue { fn from(v: [f64; N]) -> Self { InfoValue::Vector(v.to_vec()) } }

/// A frame returned by `Env::render`.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderFrame {
    /// Textual representation of the current state.
    Text(String),
}

/// A step result from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<Obs> {
    pub observation: Obs,
    pub reward: f64,
    /// The episode ended because of the task itself (e.g. a collision).
    pub terminated: bool,
    /// The episode ended because the step budget ran out.
    pub truncated: bool,
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub fn new(observation: Obs, reward: f64, terminated: bool, truncated: bool, info: Info) -> Self {
        Self { observation, reward, terminated, truncated, info }
    }

    /// Gym-style `done` flag: either terminated or truncated.
    pub fn done(&self) -> bool { self.terminated || self.truncated }
}

/// Errors surfaced by environments. All of them are fatal to the current call.
#[derive(thiserror::Error, Debug)]
pub enum GymError {
    /// The robot server rejected a reset or action command.
    #[error("Robot server error: {0}")]
    Server(String),
    /// Telemetry or the observation derived from it is not usable.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// A caller-supplied argument is malformed.
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Other error: {0}")]
    Other(String),
}

/// Convenience alias for results using GymError.
pub type Result<T> = std::result::Result<T, GymError>;

/// Core environment trait following the Gymnasium contract.
///
/// Unlike purely simulated environments, every call here may talk to an
/// external robot server, so both `reset` and `step` are fallible.
pub trait Env {
    type Obs;
    type Act;

    /// Reset the environment to an initial state.
    /// Implementations should re-seed internal RNGs when `seed` is provided.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)>;

    /// Apply an action and advance the environment by one step.
    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>>;

    /// Render a frame of the current state, if supported.
    fn render(&self) -> Option<RenderFrame> { None }

    /// Close and release any external resources.
    fn close(&mut self) {}
}
