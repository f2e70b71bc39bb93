//! End-to-end console behavior on the in-memory hardware models.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cons_common::control::{ctrl, CURSOR_END, CURSOR_HOME};
use cons_common::{BatchOutcome, ReadError};
use cons_hal::mock::{MemoryGrid, MemorySerial, MockCpu, MockProcess};
use cons_hal::Cpu;
use cons_kernel::console::INPUT_BUF;
use cons_kernel::sync::panic::BACKTRACE_DEPTH;
use cons_kernel::Console;
use crossbeam_queue::ArrayQueue;

type TestConsole = Console<MemoryGrid, MemorySerial, MockCpu>;

fn console() -> (TestConsole, MemoryGrid, MemorySerial) {
    let grid = MemoryGrid::vga();
    let serial = MemorySerial::new();
    let console = Console::new(grid.clone(), serial.clone(), MockCpu::new(0));
    (console, grid, serial)
}

fn read_all(console: &TestConsole, process: &MockProcess) -> Vec<u8> {
    let mut dst = [0u8; INPUT_BUF];
    let n = console.read(process, &mut dst).expect("read");
    dst[..n].to_vec()
}

fn assert_invariant(console: &TestConsole) {
    console.inspect(|state| assert!(state.input.invariant_holds()));
}

#[test]
fn test_insert_then_erase_mid_line() {
    let (console, grid, _) = console();
    console.interrupt(b"abc".iter().copied());
    console.interrupt([CURSOR_HOME, b'X']);

    console.inspect(|state| {
        assert_eq!(state.input.current_line().collect::<Vec<_>>(), b"Xabc");
        assert_eq!(state.input.size(), 1);
    });
    assert_eq!(grid.row(0), "Xabc");
    assert_eq!(grid.cursor_pos(), 1);

    console.interrupt([ctrl(b'H')]);
    console.inspect(|state| {
        assert_eq!(state.input.current_line().collect::<Vec<_>>(), b"abc");
        assert_eq!(state.input.size(), 0);
    });
    assert_eq!(grid.row(0), "abc");
    assert_eq!(grid.cursor_pos(), 0);
    assert_invariant(&console);
}

#[test]
fn test_kill_then_commit_empty_line() {
    let (console, grid, _) = console();
    console.interrupt(b"ab".iter().copied());
    console.interrupt([ctrl(b'U')]);
    console.inspect(|state| assert_eq!(state.input.size(), 0));
    assert_eq!(grid.row(0), "");

    let writes = grid.cursor_writes();
    console.interrupt([ctrl(b'U')]);
    assert_eq!(grid.cursor_writes(), writes);

    assert_eq!(console.interrupt([b'\n']), BatchOutcome::COMMITTED);
    assert_eq!(read_all(&console, &MockProcess::new()), b"\n");
    assert_invariant(&console);
}

#[test]
fn test_round_trip_with_edits() {
    let (console, _, serial) = console();
    let process = MockProcess::new();

    console.interrupt(b"lx\x08s -a\r".iter().copied());
    assert_eq!(read_all(&console, &process), b"ls -a\n");
    assert!(serial.text().starts_with("lx"));
}

/// Reads into `len` bytes and checks the read index moved by exactly the
/// count returned.
fn read_counted(console: &TestConsole, process: &MockProcess, len: usize) -> Vec<u8> {
    let before = console.inspect(|state| state.input.read_idx());
    let mut dst = vec![0u8; len];
    let n = console.read(process, &mut dst).expect("read");
    let after = console.inspect(|state| state.input.read_idx());
    assert_eq!(after, before + n);
    dst.truncate(n);
    dst
}

#[test]
fn test_read_consumes_exactly_what_it_returns() {
    let (console, _, _) = console();
    let process = MockProcess::new();

    console.interrupt(b"hello\n".iter().copied());
    assert_eq!(read_counted(&console, &process, 3), b"hel");
    assert_eq!(read_counted(&console, &process, 3), b"lo\n");

    console.interrupt(b"a\nb\n".iter().copied());
    assert_eq!(read_counted(&console, &process, INPUT_BUF), b"a\nb\n");
    assert_invariant(&console);
}

#[test]
fn test_read_index_advances_across_wrap() {
    let (console, _, _) = console();
    let process = MockProcess::new();

    // Forty eight-byte lines carry the indices well past the ring size.
    for i in 0..40u8 {
        let line = [b'l', b'i', b'n', b'e', b' ', b'0' + i / 10, b'0' + i % 10, b'\n'];
        console.interrupt(line.iter().copied());
        assert_eq!(read_counted(&console, &process, 5), &line[..5]);
        assert_eq!(read_counted(&console, &process, INPUT_BUF), &line[5..]);
    }
    console.inspect(|state| {
        assert_eq!(state.input.read_idx(), 40 * 8);
        assert!(state.input.read_idx() > 2 * INPUT_BUF);
    });

    // A line that straddles the wrap point.
    let offset = console.inspect(|state| state.input.read_idx() % INPUT_BUF);
    let fill = INPUT_BUF - offset - 2;
    let line: Vec<u8> = std::iter::repeat(b'w').take(fill + 4).chain([b'\n']).collect();
    console.interrupt(line.iter().copied());
    assert_eq!(read_counted(&console, &process, fill), &line[..fill]);
    assert_eq!(read_counted(&console, &process, INPUT_BUF), &line[fill..]);
    assert_invariant(&console);
}

#[test]
fn test_full_buffer_boundary() {
    let (console, _, _) = console();
    let process = MockProcess::new();

    console.interrupt(std::iter::repeat(b'a').take(INPUT_BUF));
    let outcome = console.interrupt([b'b']);
    assert_eq!(outcome, BatchOutcome::DROPPED);
    console.inspect(|state| {
        assert!(state.input.is_full());
        assert_eq!(state.input.size(), INPUT_BUF);
    });

    // The line still goes through, without its newline.
    assert_eq!(console.interrupt([b'\n']), BatchOutcome::COMMITTED);
    let line = read_all(&console, &process);
    assert_eq!(line.len(), INPUT_BUF);
    assert!(line.iter().all(|&b| b == b'a'));

    console.interrupt(b"ok\n".iter().copied());
    assert_eq!(read_all(&console, &process), b"ok\n");
    assert_invariant(&console);
}

#[test]
fn test_end_of_input_observed_once() {
    let (console, _, _) = console();
    let process = MockProcess::new();

    console.interrupt([b'x', ctrl(b'D'), b'y', b'\n']);
    assert_eq!(read_all(&console, &process), b"x");
    assert_eq!(read_all(&console, &process), b"");
    assert_eq!(read_all(&console, &process), b"y\n");
}

#[test]
fn test_end_of_input_on_full_buffer() {
    let (console, _, _) = console();
    let process = MockProcess::new();

    console.interrupt(std::iter::repeat(b'a').take(INPUT_BUF));
    let outcome = console.interrupt([ctrl(b'D')]);
    assert!(outcome.contains(BatchOutcome::COMMITTED | BatchOutcome::END_OF_INPUT));
    assert_invariant(&console);

    let mut dst = [0u8; INPUT_BUF];
    assert_eq!(console.read(&process, &mut dst), Ok(INPUT_BUF));
    assert_eq!(console.read(&process, &mut dst), Ok(0));

    // The marker is gone once seen.
    console.interrupt(b"more\n".iter().copied());
    assert_eq!(read_all(&console, &process), b"more\n");
    assert_invariant(&console);
}

#[test]
fn test_end_of_input_on_empty_line() {
    let (console, _, _) = console();
    let process = MockProcess::new();

    let outcome = console.interrupt([ctrl(b'D')]);
    assert!(outcome.contains(BatchOutcome::END_OF_INPUT));
    assert_eq!(read_all(&console, &process), b"");
    assert_invariant(&console);
}

#[test]
fn test_blocked_reader_wakes_on_commit() {
    let console = Arc::new(console().0);
    let process = MockProcess::new();

    let reader = {
        let (console, process) = (console.clone(), process.clone());
        thread::spawn(move || read_all(&console, &process))
    };

    thread::sleep(Duration::from_millis(20));
    console.interrupt(b"partial".iter().copied());
    thread::sleep(Duration::from_millis(20));
    assert!(!reader.is_finished());

    console.interrupt([b'\n']);
    assert_eq!(reader.join().expect("reader panicked"), b"partial\n");
}

#[test]
fn test_killed_reader_is_cancelled() {
    let console = Arc::new(console().0);
    let process = MockProcess::new();

    let reader = {
        let (console, process) = (console.clone(), process.clone());
        thread::spawn(move || {
            let mut dst = [0u8; 8];
            console.read(&process, &mut dst)
        })
    };

    thread::sleep(Duration::from_millis(20));
    process.kill();
    assert_eq!(
        reader.join().expect("reader panicked"),
        Err(ReadError::Cancelled)
    );

    // Input committed afterwards is still there for the next reader.
    console.interrupt(b"next\n".iter().copied());
    assert_eq!(read_all(&console, &MockProcess::new()), b"next\n");
}

/// Lines read back by a single-threaded run of the same input, reading each
/// line as soon as it is committed.
fn reference_lines(input: &[u8]) -> Vec<Vec<u8>> {
    let (console, _, _) = console();
    let process = MockProcess::new();

    let mut lines = Vec::new();
    for &code in input {
        if console.interrupt([code]).contains(BatchOutcome::COMMITTED) {
            lines.push(read_all(&console, &process));
        }
    }
    lines
}

/// Bytes typed but not yet read.
fn backlog(console: &TestConsole) -> usize {
    console.inspect(|state| state.input.last_idx() - state.input.read_idx())
}

#[test]
fn test_concurrent_reader_matches_reference() {
    let mut input = Vec::new();
    for i in 0..40u8 {
        input.extend_from_slice(b"line ");
        input.push(b'a' + i % 26);
        input.extend_from_slice(&[CURSOR_HOME, b'>', CURSOR_END, b'\n']);
    }
    let expected = reference_lines(&input);
    assert_eq!(expected.len(), 40);

    let console = Arc::new(console().0);
    let queue = Arc::new(ArrayQueue::new(16));

    let reader = {
        let console = console.clone();
        thread::spawn(move || {
            let process = MockProcess::new();
            (0..40).map(|_| read_all(&console, &process)).collect::<Vec<_>>()
        })
    };

    let irq = {
        let (console, queue) = (console.clone(), queue.clone());
        let total = input.len();
        thread::spawn(move || {
            let mut fed = 0;
            while fed < total {
                // Typing never gets more than a few lines ahead of the reader.
                while backlog(&console) > INPUT_BUF / 2 {
                    thread::yield_now();
                }
                let batch = std::iter::from_fn(|| queue.pop())
                    .take(8)
                    .inspect(|_| fed += 1);
                console.interrupt(batch);
                assert!(console.inspect(|state| state.input.invariant_holds()));
                thread::yield_now();
            }
        })
    };

    for &code in &input {
        while queue.push(code).is_err() {
            thread::yield_now();
        }
    }

    irq.join().expect("interrupt thread panicked");
    let lines = reader.join().expect("reader panicked");
    assert_eq!(lines, expected);
}

#[test]
fn test_dump_hook_runs_after_batch() {
    fn hook(console: &TestConsole) {
        console.write(b"1 run echo\n");
    }

    let (console, grid, _) = console();
    assert!(console.on_process_dump(hook));
    console.interrupt([b'a', ctrl(b'P'), b'b']);

    let text = grid.text();
    assert!(text.contains("1 run echo"));
    console.inspect(|state| {
        assert_eq!(state.input.current_line().collect::<Vec<_>>(), b"ab");
    });
}

#[test]
fn test_fatal_diagnostic_and_halt() {
    let (console, grid, serial) = console();
    console.write(b"booting\n");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        console.fatal(format_args!("acquire {}", "cons"));
    }));
    let payload = result.expect_err("fatal must not return");
    assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("cpu 0 halted"));
    assert!(console.governor().is_halted());

    let text = serial.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "booting");
    assert_eq!(lines[1], "cpu 0: panic: acquire cons");
    assert_eq!(lines.len(), 2 + BACKTRACE_DEPTH);
    assert_eq!(grid.row(1), "cpu 0: panic: acquire cons");

    // The serial mirror left its locked path before the first diagnostic byte.
    assert_eq!(serial.fatal_at(), Some("booting\n".len()));

    // Every later output stops the CPU before touching the display.
    let before = serial.bytes().len();
    let halted = panic::catch_unwind(AssertUnwindSafe(|| {
        console.interrupt([b'z']);
    }));
    assert!(halted.is_err());
    assert_eq!(serial.bytes().len(), before);
    MockCpu::new(0).enable_interrupts();
}
