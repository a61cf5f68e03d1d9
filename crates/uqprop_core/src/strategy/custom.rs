use std::fmt;
use std::sync::Arc;

use crate::config::Method;
use crate::error::Result;
use crate::result::PropagationResult;

use super::{PropagationContext, Strategy};

type CustomFn =
    dyn Fn(&PropagationContext<'_>, &[String]) -> Result<PropagationResult> + Send + Sync;

/// A caller-supplied propagation routine.
#[derive(Clone)]
pub struct CustomStrategy {
    run: Arc<CustomFn>,
}

impl CustomStrategy {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&PropagationContext<'_>, &[String]) -> Result<PropagationResult>
            + Send
            + Sync
            + 'static,
    {
        Self { run: Arc::new(run) }
    }
}

impl fmt::Debug for CustomStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomStrategy")
    }
}

impl Strategy for CustomStrategy {
    fn method(&self) -> Method {
        Method::Custom
    }

    fn propagate(
        &self,
        ctx: &PropagationContext<'_>,
        uncertain: &[String],
    ) -> Result<PropagationResult> {
        (self.run)(ctx, uncertain)
    }
}
