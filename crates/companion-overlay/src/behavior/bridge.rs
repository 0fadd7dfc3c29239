use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Weak;

use rand::Rng;

use crate::api::error::OverlayError;
use crate::api::types::{ControlHandle, ControlKind};
use crate::host::window::HostWindow;

/// What a synthetic activation did to the control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Activated,
    IndexAdvanced { from: usize, to: usize },
    ValueSet(i32),
    /// The control kind has no primary action.
    Skipped,
}

/// Turns an interaction into a real control activation on the host.
///
/// Never propagates failure: stale handles are a silent no-op and host
/// errors (including panics inside host callbacks) are logged and dropped.
pub struct SyntheticInputBridge<H: HostWindow> {
    host: Weak<RefCell<H>>,
}

impl<H: HostWindow> SyntheticInputBridge<H> {
    pub fn new(host: Weak<RefCell<H>>) -> Self {
        Self { host }
    }

    /// Fire the control's primary action and report what happened.
    pub fn perform<R: Rng + ?Sized>(
        &self,
        target: &ControlHandle,
        rng: &mut R,
    ) -> Result<ActionOutcome, OverlayError> {
        let host = self.host.upgrade().ok_or(OverlayError::HostUnavailable)?;
        let mut host = host.try_borrow_mut().map_err(|_| OverlayError::HostUnavailable)?;
        let id = target.id;

        match target.kind {
            ControlKind::Button | ControlKind::Checkbox => {
                host.activate(id)?;
                Ok(ActionOutcome::Activated)
            }
            ControlKind::Tab | ControlKind::Combo => {
                let count = host.index_count(id)?;
                if count == 0 {
                    return Ok(ActionOutcome::Skipped);
                }
                let from = host.get_index(id)?;
                let to = (from + 1) % count;
                host.set_index(id, to)?;
                Ok(ActionOutcome::IndexAdvanced { from, to })
            }
            ControlKind::Slider => {
                let range = host.get_range(id)?;
                if range.is_empty() {
                    return Ok(ActionOutcome::Skipped);
                }
                let value = rng.gen_range(range);
                host.set_value(id, value)?;
                Ok(ActionOutcome::ValueSet(value))
            }
            ControlKind::Textbox | ControlKind::Other => Ok(ActionOutcome::Skipped),
        }
    }

    /// `perform`, with every failure downgraded to a log line.
    pub fn invoke<R: Rng + ?Sized>(&self, target: &ControlHandle, rng: &mut R) -> Option<ActionOutcome> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.perform(target, rng)));
        match result {
            Ok(Ok(outcome)) => {
                log::info!(
                    "interacted with {} {:?}: {:?}",
                    target.kind.type_name(),
                    target.id,
                    outcome
                );
                Some(outcome)
            }
            Ok(Err(OverlayError::StaleHandle(id))) => {
                log::debug!("control {:?} vanished before activation", id);
                None
            }
            Ok(Err(err)) => {
                log::warn!("activation of {:?} failed: {}", target.id, err);
                None
            }
            Err(_) => {
                log::warn!("host panicked while activating {:?}", target.id);
                None
            }
        }
    }
}
