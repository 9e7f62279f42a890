// SPDX-License-Identifier: MIT OR Apache-2.0
//! Instant unit invoking a host closure.

use crate::error::UnitError;
use crate::unit::{PlayContext, Unit};

/// Calls a closure each time it plays
pub struct CallbackUnit {
    label: String,
    callback: Box<dyn FnMut(&PlayContext) + Send>,
}

impl CallbackUnit {
    /// Create a callback unit
    pub fn new(label: impl Into<String>, callback: impl FnMut(&PlayContext) + Send + 'static) -> Self {
        Self {
            label: label.into(),
            callback: Box::new(callback),
        }
    }
}

impl Unit for CallbackUnit {
    fn label(&self) -> &str {
        &self.label
    }

    fn play(&mut self, ctx: &PlayContext) -> Result<(), UnitError> {
        (self.callback)(ctx);
        Ok(())
    }
}

impl std::fmt::Debug for CallbackUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackUnit").field("label", &self.label).finish_non_exhaustive()
    }
}
