//! Rendering surfaces
//!
//! A surface is handed to the renderer at init and is never touched by anyone
//! else afterwards. Frames leave the renderer by move.

use shared_types::{PlotError, PlotResult};
use tokio::sync::mpsc;

use crate::frame::FrameBuffer;

/// Exclusive drawing target owned by the renderer
pub trait RenderSurface: Send {
    /// Prepare for frames of the given physical size
    fn configure(&mut self, width: u32, height: u32) -> PlotResult<()>;

    /// Hand a finished frame to whatever displays it
    fn present(&mut self, frame: FrameBuffer) -> PlotResult<()>;
}

/// Surface that forwards every presented frame over a channel
#[derive(Debug)]
pub struct ChannelSurface {
    sender: mpsc::UnboundedSender<FrameBuffer>,
    size: (u32, u32),
}

impl ChannelSurface {
    /// Create the surface and the receiving end for presented frames
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FrameBuffer>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, size: (0, 0) }, receiver)
    }
}

impl RenderSurface for ChannelSurface {
    fn configure(&mut self, width: u32, height: u32) -> PlotResult<()> {
        if self.sender.is_closed() {
            return Err(PlotError::Surface {
                message: "frame consumer is gone".to_string(),
            });
        }
        self.size = (width, height);
        Ok(())
    }

    fn present(&mut self, frame: FrameBuffer) -> PlotResult<()> {
        if (frame.width, frame.height) != self.size {
            log::warn!(
                "[ChannelSurface] Frame {}x{} does not match configured {}x{}",
                frame.width,
                frame.height,
                self.size.0,
                self.size.1
            );
        }
        self.sender.send(frame).map_err(|_| PlotError::Surface {
            message: "frame consumer is gone".to_string(),
        })
    }
}

/// Surface that discards frames, or refuses to be configured at all
#[derive(Debug, Default)]
pub struct NullSurface {
    refusal: Option<String>,
    presented: u64,
}

impl NullSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose context cannot be created
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refusal: Some(reason.into()),
            presented: 0,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl RenderSurface for NullSurface {
    fn configure(&mut self, _width: u32, _height: u32) -> PlotResult<()> {
        match &self.refusal {
            Some(reason) => Err(PlotError::Surface {
                message: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn present(&mut self, _frame: FrameBuffer) -> PlotResult<()> {
        self.presented += 1;
        Ok(())
    }
}
