use std::fmt::{self, Write as _};
use std::io::{self, Write as _};

use parking_lot::{Mutex, RwLock};

use crate::{LaneRegistry, ThreadLocalCounter, Toggle, TraceConfig, UnitIdSource};

/// Marker preceding each debug statement.
const DEBUG_STATEMENT_MARKER: &str = "  | ";
/// Marker closing a block of debug statements.
const DEBUG_END_MARKER: &str = "  v";
/// Prefix of the line announcing a new lane.
const BANNER_LABEL: &str = "Lane| ";
/// Line underneath the lane announcement.
const BANNER_SEPARATOR: &str = "|||";

/// Writes lines indented according to which execution unit emitted them.
///
/// Each execution unit is assigned a lane the first time it logs something,
/// and every line it emits afterwards is indented by one
/// [indentation unit](TraceConfig::indent_unit) per lane index. The first
/// output from a new lane is preceded by a banner announcing the lane number.
///
/// Each call holds an internal lock for its whole output, so one execution
/// unit's banner and lines are never split by another's.
///
/// Output errors are logged and otherwise ignored.
pub struct Tracer<W = io::Stdout> {
    lanes: LaneRegistry,
    debug_statements: Toggle,
    lane_marking: Toggle,
    indent_unit: RwLock<String>,
    source: Box<dyn UnitIdSource>,
    /// Emission lock, held for the duration of one log call.
    out: Mutex<W>,
}

impl Tracer<io::Stdout> {
    /// Constructs a tracer that writes to standard output and identifies
    /// threads using [`ThreadLocalCounter`].
    pub fn stdout() -> Self {
        Self::new(io::stdout(), ThreadLocalCounter)
    }
}

impl<W: io::Write> Tracer<W> {
    /// Constructs a tracer with the default configuration.
    pub fn new(out: W, source: impl UnitIdSource + 'static) -> Self {
        Self::with_config(out, source, &TraceConfig::default())
    }

    /// Constructs a tracer with a specific configuration.
    pub fn with_config(
        out: W,
        source: impl UnitIdSource + 'static,
        config: &TraceConfig,
    ) -> Self {
        Self {
            lanes: LaneRegistry::new(),
            debug_statements: Toggle::new(config.debug_statements),
            lane_marking: Toggle::new(config.lane_marking),
            indent_unit: RwLock::new(config.indent_unit.clone()),
            source: Box::new(source),
            out: Mutex::new(out),
        }
    }

    /// Sets whether [`Tracer::emit_debug()`] produces output.
    pub fn set_debug_statements_enabled(&self, enabled: bool) {
        self.debug_statements.set(enabled);
    }
    /// Returns whether [`Tracer::emit_debug()`] produces output.
    pub fn debug_statements_enabled(&self) -> bool {
        self.debug_statements.get()
    }

    /// Sets whether lines are indented by lane.
    ///
    /// While disabled, execution units are not identified, no lanes are
    /// allocated, and no banners are written.
    pub fn set_lane_marking_enabled(&self, enabled: bool) {
        self.lane_marking.set(enabled);
    }
    /// Returns whether lines are indented by lane.
    pub fn lane_marking_enabled(&self) -> bool {
        self.lane_marking.get()
    }

    /// Applies both toggles and the indentation unit from `config`.
    ///
    /// Lanes that have already been allocated keep their indices.
    pub fn apply_config(&self, config: &TraceConfig) {
        self.debug_statements.set(config.debug_statements);
        self.lane_marking.set(config.lane_marking);
        *self.indent_unit.write() = config.indent_unit.clone();
    }

    /// Returns the number of lanes allocated so far.
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }
    /// Returns the lane index of the calling execution unit, if it has one.
    /// Never allocates a lane.
    pub fn current_lane(&self) -> Option<usize> {
        self.lanes.lane_of(self.source.current_unit_id()?)
    }

    /// Writes one line consisting of `parts` concatenated with no separator.
    ///
    /// This is not affected by [`Tracer::set_debug_statements_enabled()`].
    pub fn emit_message(&self, parts: &[&dyn fmt::Display]) {
        let mut out = self.out.lock();
        let mut block = self.begin_block();
        block.line(Concat(parts));
        block.write_to(&mut *out);
    }

    /// Writes a bracketed block of debug statements, or nothing if debug
    /// statements are disabled.
    ///
    /// ```text
    ///
    ///   | first statement
    ///   | second statement
    ///   v
    /// ```
    pub fn emit_debug(&self, statement: &str, more_statements: &[&str]) {
        if !self.debug_statements.get() {
            return;
        }

        let mut out = self.out.lock();
        let mut block = self.begin_block();
        block.line("");
        for stmt in std::iter::once(&statement).chain(more_statements) {
            block.line(format_args!("{DEBUG_STATEMENT_MARKER}{stmt}"));
        }
        block.line(DEBUG_END_MARKER);
        block.write_to(&mut *out);
    }

    /// Runs `f` on the output while holding the emission lock.
    pub fn with_output<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        f(&mut *self.out.lock())
    }

    /// Consumes the tracer and returns the output.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    /// Resolves the calling execution unit's lane and starts a block indented
    /// for it, beginning with a banner if the lane is new.
    ///
    /// Must be called while holding the emission lock.
    fn begin_block(&self) -> Block {
        let mut block = Block::default();

        if !self.lane_marking.get() {
            return block;
        }

        let Some(id) = self.source.current_unit_id() else {
            log::trace!("unable to identify execution unit; using lane 1");
            return block;
        };
        let lane = self.lanes.resolve_lane(id);

        block.indent = self.indent_unit.read().repeat(lane.index);
        if lane.is_new {
            block.text.push('\n');
            block.line(format_args!("{BANNER_LABEL}{}", lane.number()));
            block.line(BANNER_SEPARATOR);
        }

        block
    }
}

/// Lines of output buffered so that they can be written all at once.
#[derive(Debug, Default)]
struct Block {
    indent: String,
    text: String,
}
impl Block {
    fn line(&mut self, contents: impl fmt::Display) {
        // Writing to a `String` is infallible.
        let _ = writeln!(self.text, "{}{contents}", self.indent);
    }

    fn write_to(self, out: &mut impl io::Write) {
        let result = out
            .write_all(self.text.as_bytes())
            .and_then(|()| out.flush());
        if let Err(e) = result {
            log::warn!("error writing trace output: {e}");
        }
    }
}

struct Concat<'a>(&'a [&'a dyn fmt::Display]);
impl fmt::Display for Concat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|part| fmt::Display::fmt(part, f))
    }
}
