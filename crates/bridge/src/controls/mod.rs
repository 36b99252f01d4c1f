pub mod interaction;

pub use interaction::{InteractionBounds, InteractionController, MIN_DRAG_PIXELS};
