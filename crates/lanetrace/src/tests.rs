use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use crate::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Execution unit source whose answer is chosen by the test.
#[derive(Debug, Default, Clone)]
struct ScriptedUnit {
    current: Arc<Mutex<Option<ExecutionUnitId>>>,
    lookups: Arc<AtomicUsize>,
}
impl ScriptedUnit {
    fn set(&self, id: Option<u64>) {
        *self.current.lock() = id.map(ExecutionUnitId);
    }
    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}
impl UnitIdSource for ScriptedUnit {
    fn current_unit_id(&self) -> Option<ExecutionUnitId> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        *self.current.lock()
    }
}

fn scripted_tracer() -> (Tracer<Vec<u8>>, ScriptedUnit) {
    init_logging();
    let unit = ScriptedUnit::default();
    (Tracer::new(Vec::new(), unit.clone()), unit)
}

fn output(tracer: Tracer<Vec<u8>>) -> String {
    String::from_utf8(tracer.into_inner()).expect("output is not UTF-8")
}

#[test]
fn test_two_units_get_banners_and_indentation() {
    let (tracer, unit) = scripted_tracer();

    unit.set(Some(17));
    msg!(tracer => "hello from ", "A");
    unit.set(Some(3));
    msg!(tracer => "hello from ", "B");
    unit.set(Some(17));
    msg!(tracer => "A again, x = ", 42);

    assert_eq!(2, tracer.lane_count());
    assert_eq!(Some(0), tracer.current_lane());
    assert_eq!(
        output(tracer),
        "\n\
         Lane| 1\n\
         |||\n\
         hello from A\n\
         \n\
         \tLane| 2\n\
         \t|||\n\
         \thello from B\n\
         A again, x = 42\n",
    );
}

#[test]
fn test_debug_block() {
    let (tracer, unit) = scripted_tracer();

    unit.set(Some(1));
    msg!(tracer => "first");
    unit.set(Some(2));
    debug_block!(tracer => "checking", format!("n = {}", 5));
    debug_block!(tracer => "single");

    assert_eq!(
        output(tracer),
        "\n\
         Lane| 1\n\
         |||\n\
         first\n\
         \n\
         \tLane| 2\n\
         \t|||\n\
         \t\n\
         \t  | checking\n\
         \t  | n = 5\n\
         \t  v\n\
         \t\n\
         \t  | single\n\
         \t  v\n",
    );
}

#[test]
fn test_debug_statements_toggle() {
    let (tracer, unit) = scripted_tracer();
    unit.set(Some(1));

    tracer.set_debug_statements_enabled(false);
    assert!(!tracer.debug_statements_enabled());
    debug_block!(tracer => "hidden");
    // Disabled debug statements do not even identify the caller.
    assert_eq!(0, unit.lookups());
    assert_eq!(0, tracer.lane_count());

    msg!(tracer => "shown");

    tracer.set_debug_statements_enabled(true);
    debug_block!(tracer => "shown too");

    assert_eq!(
        output(tracer),
        "\nLane| 1\n|||\nshown\n\n  | shown too\n  v\n",
    );
}

#[test]
fn test_lane_marking_disabled() {
    let (tracer, unit) = scripted_tracer();
    tracer.set_lane_marking_enabled(false);
    assert!(!tracer.lane_marking_enabled());

    for id in [5, 6, 7] {
        unit.set(Some(id));
        msg!(tracer => "unit ", id);
        debug_block!(tracer => "stmt");
    }

    assert_eq!(0, unit.lookups());
    assert_eq!(0, tracer.lane_count());
    assert_eq!(
        output(tracer),
        "unit 5\n\n  | stmt\n  v\n\
         unit 6\n\n  | stmt\n  v\n\
         unit 7\n\n  | stmt\n  v\n",
    );
}

#[test]
fn test_lane_marking_reenabled_keeps_lanes() {
    let (tracer, unit) = scripted_tracer();

    unit.set(Some(10));
    msg!(tracer => "a");
    unit.set(Some(20));
    msg!(tracer => "b");

    tracer.set_lane_marking_enabled(false);
    msg!(tracer => "c");
    tracer.set_lane_marking_enabled(true);
    msg!(tracer => "d");

    assert_eq!(
        output(tracer),
        "\nLane| 1\n|||\na\n\n\tLane| 2\n\t|||\n\tb\nc\n\td\n",
    );
}

#[test]
fn test_unknown_unit_uses_lane_zero() {
    let (tracer, unit) = scripted_tracer();

    unit.set(None);
    msg!(tracer => "who am I?");
    debug_block!(tracer => "still nobody");
    unit.set(Some(8));
    msg!(tracer => "now known");
    unit.set(None);
    msg!(tracer => "unknown again");

    assert_eq!(1, tracer.lane_count());
    assert_eq!(None, tracer.current_lane());
    assert_eq!(
        output(tracer),
        "who am I?\n\
         \n  | still nobody\n  v\n\
         \nLane| 1\n|||\nnow known\n\
         unknown again\n",
    );
}

#[test]
fn test_repeated_calls_do_not_repeat_banner() {
    let (tracer, unit) = scripted_tracer();
    unit.set(Some(99));
    for _ in 0..3 {
        msg!(tracer => "tick");
    }
    assert_eq!(1, tracer.lane_count());
    assert_eq!(output(tracer), "\nLane| 1\n|||\ntick\ntick\ntick\n");
}

#[test]
fn test_message_parts_are_concatenated() {
    let (tracer, unit) = scripted_tracer();
    tracer.set_lane_marking_enabled(false);
    unit.set(Some(1));

    msg!(tracer =>);
    msg!(tracer => 1, 2.5, 'c', "d", ExecutionUnitId(4));
    tracer.emit_message(&[&"direct", &String::from(" call")]);

    assert_eq!(output(tracer), "\n12.5cd#4\ndirect call\n");
}

#[test]
fn test_apply_config() {
    let (tracer, unit) = scripted_tracer();
    tracer.apply_config(&TraceConfig {
        debug_statements: false,
        lane_marking: true,
        indent_unit: "--".to_owned(),
    });

    unit.set(Some(1));
    msg!(tracer => "one");
    unit.set(Some(2));
    msg!(tracer => "two");
    debug_block!(tracer => "muted");

    assert_eq!(
        output(tracer),
        "\nLane| 1\n|||\none\n\n--Lane| 2\n--|||\n--two\n",
    );
}

#[test]
fn test_with_config() {
    init_logging();
    let config = TraceConfig {
        debug_statements: true,
        lane_marking: false,
        indent_unit: DEFAULT_INDENT_UNIT.to_owned(),
    };
    let tracer = Tracer::with_config(Vec::new(), || Some(ExecutionUnitId(1)), &config);
    assert!(tracer.debug_statements_enabled());
    assert!(!tracer.lane_marking_enabled());
    msg!(tracer => "plain");
    assert_eq!(tracer.with_output(|out| out.len()), "plain\n".len());
}

struct BrokenPipe;
impl io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_write_errors_are_ignored() {
    init_logging();
    let tracer = Tracer::new(BrokenPipe, || Some(ExecutionUnitId(1)));
    msg!(tracer => "lost");
    debug_block!(tracer => "also lost");
    assert_eq!(1, tracer.lane_count());
}

#[test]
fn test_concurrent_threads_keep_blocks_intact() {
    const THREADS: usize = 8;

    init_logging();
    let tracer = Tracer::new(Vec::new(), ThreadLocalCounter);
    let barrier = Barrier::new(THREADS);

    let lanes: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|k| {
                let tracer = &tracer;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    msg!(tracer => "worker ", k, " start");
                    debug_block!(tracer => format!("worker {k} a"), format!("worker {k} b"));
                    msg!(tracer => "worker ", k, " end");
                    tracer.current_lane().expect("worker has no lane")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect()
    });

    let mut sorted_lanes = lanes.clone();
    sorted_lanes.sort_unstable();
    assert_eq!((0..THREADS).collect::<Vec<_>>(), sorted_lanes);
    assert_eq!(THREADS, tracer.lane_count());

    let out = output(tracer);
    assert_eq!(THREADS, out.matches("Lane| ").count());
    for (k, &lane) in lanes.iter().enumerate() {
        let i = "\t".repeat(lane);
        let n = lane + 1;
        let start = format!("\n{i}Lane| {n}\n{i}|||\n{i}worker {k} start\n");
        let debug = format!("{i}\n{i}  | worker {k} a\n{i}  | worker {k} b\n{i}  v\n");
        let end = format!("{i}worker {k} end\n");

        let start_pos = out.find(&start).expect("banner split from first line");
        let debug_pos = out.find(&debug).expect("debug block was split");
        let end_pos = out.find(&end).expect("missing last line");
        assert!(start_pos < debug_pos && debug_pos < end_pos);
    }
}

#[test]
fn test_global_toggles() {
    init_logging();
    set_debug_statements_enabled(false);
    assert!(!global().debug_statements_enabled());
    debug_block!("not printed");
    set_debug_statements_enabled(true);
    assert!(global().debug_statements_enabled());

    set_lane_marking_enabled(false);
    assert!(!global().lane_marking_enabled());
    msg!("printed without a lane");
    assert_eq!(None, global().current_lane());
    set_lane_marking_enabled(true);

    emit_message(&[&"printed ", &"in a lane"]);
    emit_debug("first", &["second"]);
    assert!(global().current_lane().is_some());
}
