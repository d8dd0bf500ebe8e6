//! Working out which model is on the other end of a port.
//!
//! Every model answers `*IDN?` with a string containing its model number. Detection opens the port as
//! [`GENERIC`], asks for the identity, closes it again and looks the answer up in [`MODELS`]. The caller then
//! reopens the port for the detected model, since line endings and timings differ between families.

use embedded_io::{Read, ReadReady, Write};
use log::{debug, warn};

use crate::{
    error::Result,
    model::{DEFAULT_MODEL, GENERIC, MODELS, Model},
    psu::Tenma,
    transport::LineEnding,
};

/// Outcome of model detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMatch {
    pub model: &'static Model,
    /// The identity string reported by the unit.
    pub identity: String,
    /// The match string which selected `model`. `None` if nothing matched and the default was used.
    pub matched: Option<&'static str>,
}

impl ModelMatch {
    /// True if the unit was not recognised and [`DEFAULT_MODEL`] was assumed.
    pub fn is_fallback(&self) -> bool {
        self.matched.is_none()
    }
}

/// Pick the first registered model whose match string occurs in `identity`.
///
/// Falls back to [`DEFAULT_MODEL`] for unknown units, logging a warning. Never fails.
pub fn resolve(identity: &str) -> ModelMatch {
    for &model in MODELS.iter() {
        if let Some(matched) = model.matches(identity) {
            debug!("Detected {} from {:?}", model.name, identity);
            return ModelMatch {
                model,
                identity: identity.to_owned(),
                matched: Some(matched),
            };
        }
    }

    warn!(
        "Could not detect Tenma model from {:?}, assuming {}",
        identity, DEFAULT_MODEL.name
    );
    ModelMatch {
        model: DEFAULT_MODEL,
        identity: identity.to_owned(),
        matched: None,
    }
}

/// Ask an open session for its identity.
///
/// Some units ignore a bare `*IDN?`, so an empty answer is retried once with a newline.
pub fn probe_identity<S: Read + Write + ReadReady>(psu: &mut Tenma<S>) -> Result<String, S::Error> {
    let identity = psu.identity()?;
    if !identity.is_empty() {
        return Ok(identity);
    }

    debug!("No answer to *IDN?, retrying with a newline");
    psu.identity_with(LineEnding::Newline)
}

/// Open a generic session with `open`, read the identity, close it and resolve the model.
pub fn probe<S, F>(mut open: F) -> Result<ModelMatch, S::Error>
where
    S: Read + Write + ReadReady,
    F: FnMut(&'static Model) -> Result<Tenma<S>, S::Error>,
{
    let mut psu = open(&GENERIC)?;
    let identity = probe_identity(&mut psu)?;
    psu.close();
    Ok(resolve(&identity))
}

/// Detect the model, then open a session configured for it.
///
/// `open` is called twice: once for the generic probe and once for the detected model.
pub fn connect<S, F>(mut open: F) -> Result<(Tenma<S>, ModelMatch), S::Error>
where
    S: Read + Write + ReadReady,
    F: FnMut(&'static Model) -> Result<Tenma<S>, S::Error>,
{
    let found = probe(&mut open)?;
    let psu = open(found.model)?;
    Ok((psu, found))
}
