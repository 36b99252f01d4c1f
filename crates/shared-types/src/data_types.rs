//! Sample, playback and dataset types used across the system

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One render-ready point
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A point that can be placed on the canvas
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A resolved value of one path expression at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time the message was received by the player
    pub receive_time: f64,
    /// Time stamped in the message header, if it has one
    pub header_time: Option<f64>,
    pub value: f64,
}

impl Sample {
    pub fn new(receive_time: f64, value: f64) -> Self {
        Self {
            receive_time,
            header_time: None,
            value,
        }
    }

    pub fn with_header_time(mut self, header_time: f64) -> Self {
        self.header_time = Some(header_time);
        self
    }
}

/// A chunk of preloaded history, keyed by path expression
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub samples: HashMap<String, Vec<Sample>>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(mut self, path: impl Into<String>, samples: Vec<Sample>) -> Self {
        self.samples.insert(path.into(), samples);
        self
    }
}

/// Snapshot pushed by the playback pipeline on every tick
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    /// Playback position
    pub current_time: f64,
    /// Start of the recording; timestamp x values are relative to it
    pub start_time: f64,
    /// Samples received since the previous snapshot, per path expression
    pub messages: HashMap<String, Vec<Sample>>,
    /// Block-indexed preloaded history; `None` entries are not loaded yet
    pub blocks: Vec<Option<Arc<Block>>>,
}

impl PlayerState {
    pub fn new(current_time: f64) -> Self {
        Self {
            current_time,
            ..Default::default()
        }
    }

    pub fn with_messages(mut self, path: impl Into<String>, samples: Vec<Sample>) -> Self {
        self.messages.entry(path.into()).or_default().extend(samples);
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<Option<Arc<Block>>>) -> Self {
        self.blocks = blocks;
        self
    }
}

/// Styling carried alongside a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStyle {
    pub label: String,
    pub color: [f32; 4],
    pub line_width: f32,
    pub show_line: bool,
}

/// One renderable series, already downsampled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Position of the path in the configured list
    pub series_index: usize,
    pub style: DatasetStyle,
    pub points: Vec<DataPoint>,
}

/// Full-resolution export form of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvDataset {
    pub label: String,
    pub points: Vec<DataPoint>,
}
