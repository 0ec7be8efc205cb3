//! Stack capture for recovered panics.
//!
//! By the time `catch_unwind` returns, the panicking frames are gone. The
//! stack therefore has to be walked from inside the panic hook, while it is
//! still intact. A process-wide hook is installed once; it only acts when
//! the panicking thread is inside a [`CaptureScope`], and hands every other
//! panic to the hook that was installed before it.
//!
//! Scopes form a per-thread stack, so a guard nested inside another guard
//! records its own panic and leaves the outer scope untouched.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::mem;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Once;

/// Upper bound on frames walked per capture. The byte budget normally ends
/// the walk long before this.
const MAX_FRAMES: usize = 4096;

/// Frames searched for the panic runtime before giving up and keeping all.
const MAX_LEADING_FRAMES: usize = 64;

/// Symbol prefixes of the panic runtime. The first contiguous run of these
/// marks where the hook's own frames end and the panicking code begins.
const PANIC_RUNTIME: &[&str] = &[
    "std::panicking::",
    "core::panicking::",
    "std::panic::panic_any",
    "std::rt::begin_panic",
    "rust_begin_unwind",
    "__rustc::rust_begin_unwind",
    "std::sys::backtrace::__rust_end_short_backtrace",
    "std::sys_common::backtrace::__rust_end_short_backtrace",
];

struct Slot {
    stack_size: usize,
    trace: Option<Vec<String>>,
}

thread_local! {
    static SCOPES: RefCell<Vec<Slot>> = const { RefCell::new(Vec::new()) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !capture_into_scope() {
                previous(info);
            }
        }));
    });
}

/// Records a trace into the innermost active scope. Returns `false` when the
/// thread has no active scope.
fn capture_into_scope() -> bool {
    let stack_size = SCOPES
        .try_with(|scopes| Some(scopes.try_borrow().ok()?.last()?.stack_size))
        .ok()
        .flatten();
    let Some(stack_size) = stack_size else {
        return false;
    };

    let trace = capture(stack_size);
    let _ = SCOPES.try_with(|scopes| {
        if let Some(slot) = scopes.borrow_mut().last_mut() {
            slot.trace = Some(trace);
        }
    });
    true
}

/// A region of one thread in which panics are captured rather than reported.
///
/// Entered and exited within a single poll; never crosses threads.
pub(crate) struct CaptureScope {
    _not_send: PhantomData<*const ()>,
}

impl CaptureScope {
    pub(crate) fn enter(stack_size: usize) -> Self {
        install_hook();
        SCOPES.with(|scopes| scopes.borrow_mut().push(Slot { stack_size, trace: None }));
        Self { _not_send: PhantomData }
    }

    /// Leaves the scope, returning the trace of the last panic raised in it.
    /// Empty if nothing panicked or the hook was replaced after installation.
    pub(crate) fn exit(self) -> Vec<String> {
        SCOPES
            .with(|scopes| scopes.borrow_mut().last_mut().and_then(|slot| slot.trace.take()))
            .unwrap_or_default()
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        let _ = SCOPES.try_with(|scopes| scopes.borrow_mut().pop());
    }
}

// ── Capture ───────────────────────────────────────────────────────────────────

struct Frame {
    name: Option<String>,
    file: Option<PathBuf>,
    line: Option<u32>,
}

impl Frame {
    fn is_panic_runtime(&self) -> bool {
        self.name.as_deref()
            .is_some_and(|name| PANIC_RUNTIME.iter().any(|prefix| name.starts_with(prefix)))
    }

    fn lines(&self) -> impl Iterator<Item = String> + '_ {
        let name = self.name.clone().unwrap_or_else(|| "<unknown>".to_owned());
        let location = self.file.as_deref().map(|file| match self.line {
            Some(line) => format!("\t{}:{line}", file.display()),
            None => format!("\t{}", file.display()),
        });
        std::iter::once(name).chain(location)
    }
}

/// Walks the current stack, rendering frames into at most `budget` bytes
/// (one newline counted per line). The walk ends once the budget is spent.
fn capture(budget: usize) -> Vec<String> {
    let mut collector = Collector::new(budget);
    let mut walked = 0;

    backtrace::trace(|frame| {
        let mut resolved = false;
        let mut more = true;
        backtrace::resolve_frame(frame, |symbol| {
            resolved = true;
            if more {
                more = collector.push(Frame {
                    name: symbol.name().map(|name| format!("{name:#}")),
                    file: symbol.filename().map(Path::to_path_buf),
                    line: symbol.lineno(),
                });
            }
        });
        if !resolved {
            more = collector.push(Frame { name: None, file: None, line: None });
        }
        walked += 1;
        more && walked < MAX_FRAMES
    });

    collector.finish()
}

enum Phase {
    /// Buffering leading frames until the panic runtime shows up.
    Searching,
    /// Inside the first run of panic-runtime frames.
    Runtime,
    /// Past the runtime; every frame is kept.
    Keeping,
}

/// Drops everything up to and including the first run of panic-runtime
/// frames, and renders the rest into the byte budget. When no run appears
/// within [`MAX_LEADING_FRAMES`], the buffered frames are kept.
struct Collector {
    phase: Phase,
    leading: Vec<Frame>,
    lines: Vec<String>,
    remaining: usize,
}

impl Collector {
    fn new(budget: usize) -> Self {
        Self { phase: Phase::Searching, leading: Vec::new(), lines: Vec::new(), remaining: budget }
    }

    /// Returns `false` once the budget is spent.
    fn push(&mut self, frame: Frame) -> bool {
        match self.phase {
            Phase::Searching if frame.is_panic_runtime() => {
                self.leading.clear();
                self.phase = Phase::Runtime;
                true
            }
            Phase::Searching => {
                self.leading.push(frame);
                if self.leading.len() < MAX_LEADING_FRAMES {
                    return true;
                }
                self.phase = Phase::Keeping;
                self.flush_leading()
            }
            Phase::Runtime if frame.is_panic_runtime() => true,
            Phase::Runtime | Phase::Keeping => {
                self.phase = Phase::Keeping;
                self.emit(&frame)
            }
        }
    }

    fn flush_leading(&mut self) -> bool {
        mem::take(&mut self.leading).iter().all(|frame| self.emit(frame))
    }

    fn emit(&mut self, frame: &Frame) -> bool {
        for line in frame.lines() {
            let cost = line.len() + 1;
            if cost > self.remaining {
                self.remaining = 0;
                return false;
            }
            self.remaining -= cost;
            self.lines.push(line);
        }
        true
    }

    fn finish(mut self) -> Vec<String> {
        if let Phase::Searching = self.phase {
            self.flush_leading();
        }
        self.lines
    }
}
