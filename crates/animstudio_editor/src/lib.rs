// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation Studio editor core.
//!
//! Everything the editor UI drives, without the UI:
//! - Pose editing of named rig parts, recorded into keyframes
//! - Keyframe, progression curve and tool operations
//! - Full undo/redo support
//! - Playback, `.dca` load/save and procedure export
//! - Batch frame export for GIF capture
//!
//! ## Architecture
//!
//! [`EditorContext`] owns the document ([`EditorState`]), the
//! [`CommandLog`] and the [`EditorSettings`]. Every mutation is a tagged
//! [`EditorCommand`] that knows how to apply and revert itself.

pub mod commands;
pub mod context;
pub mod error;
pub mod history;
pub mod play_mode;
pub mod settings;
pub mod state;
pub mod tools;

pub use commands::EditorCommand;
pub use context::{parse_axis_value, EditorContext};
pub use error::{EditorError, Result};
pub use history::{CommandLog, HistoryStats, MAX_HISTORY};
pub use play_mode::{export_frames, frame_count, frame_range, BusyScope, CapturedFrame, FrameBuffer, FrameSink};
pub use settings::{EditorSettings, SETTINGS_FILE_NAME, SETTINGS_FORMAT_VERSION};
pub use state::{EditorState, Selection};
pub use tools::{Axis, GizmoSpace, TransformTool};
