//! The dual-pane console: output scrollback fed by the reader thread, and the
//! command line with its history driven by key presses.

pub mod editor;
pub mod engine;
pub mod history;
pub mod reader;
pub mod scrollback;
pub mod style;

pub use editor::InputEditor;
pub use engine::{
    classify_key, ConsoleEngine, DirtyPanes, EngineState, KeyAction, SessionStats,
    ShutdownReason,
};
pub use history::{DuplicatePolicy, HistoryBuffer, HistoryDirection};
pub use reader::{pump_lines, LineSink, ReaderEvent, ReaderHandle};
pub use scrollback::{OutputLine, ScrollbackBuffer, SharedScrollback, Stamp};
pub use style::{parse_color, Matcher, PatternMatcher, PatternRule};
