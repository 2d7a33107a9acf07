use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use tracing::debug;

use crate::image_buf::ImageBuf;
use crate::pipeline::Chain;

/// Runs chains on tokio's blocking pool. Each request takes a generation
/// ticket; a result whose ticket was overtaken by a newer request or by
/// [`PreviewRenderer::invalidate`] resolves to `None`.
#[derive(Clone, Debug, Default)]
pub struct PreviewRenderer {
    generation: Arc<AtomicU64>,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Discard every render still in flight.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Start rendering `image` through `chain`. The ticket is taken when this
    /// is called, not when the future is first polled.
    pub fn render(
        &self,
        chain: Chain,
        image: ImageBuf,
    ) -> impl Future<Output = Result<Option<ImageBuf>>> + Send + use<> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        async move {
            let output = tokio::task::spawn_blocking(move || chain.run(&image))
                .await
                .context("preview render task failed")?;
            if generation.load(Ordering::SeqCst) != ticket {
                debug!(ticket, "discarding stale preview");
                return Ok(None);
            }
            Ok(Some(output))
        }
    }
}
