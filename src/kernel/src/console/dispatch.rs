//! Input dispatcher: turns raw input codes into editor operations.

use cons_common::{BatchOutcome, ControlCode, DisplayError};
use cons_hal::{Serial, TextGrid};
use log::{debug, trace, warn};

use super::ConsoleState;

/// Applies one input code to the console state. The caller holds the lock.
pub(crate) fn dispatch<G: TextGrid, S: Serial>(
    state: &mut ConsoleState<G, S>,
    code: u8,
) -> Result<BatchOutcome, DisplayError> {
    let ConsoleState { input, display } = state;

    match ControlCode::classify(code) {
        ControlCode::KillLine => input.kill_line(display)?,
        ControlCode::Backspace => {
            input.erase_before_cursor(display)?;
        }
        ControlCode::CursorHome => input.move_cursor_home(display)?,
        ControlCode::CursorEnd => input.move_cursor_end(display)?,
        ControlCode::ProcessDump => return Ok(BatchOutcome::PROCESS_DUMP),
        ControlCode::EndOfInput => {
            if !input.end_of_input(display)? {
                warn!("console: end-of-input marker dropped, an earlier one is still unread");
            }
            debug!("console: end of input at index {}", input.write_idx());
            return Ok(BatchOutcome::COMMITTED | BatchOutcome::END_OF_INPUT);
        }
        ControlCode::Newline => {
            if !input.commit_line(display)? {
                warn!("console: input buffer full, line committed without newline");
            }
            trace!("console: line committed, write index {}", input.write_idx());
            return Ok(BatchOutcome::COMMITTED);
        }
        ControlCode::Ignore => {}
        ControlCode::Char(ch) => {
            if !input.insert_at_cursor(ch, display)? {
                warn!("console: input buffer full, dropping {:#04x}", ch);
                return Ok(BatchOutcome::DROPPED);
            }
        }
    }
    Ok(BatchOutcome::empty())
}
