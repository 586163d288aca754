use std::io::{BufRead, Write};

use depot_core::ActionLists;

use crate::errors::SessionError;
use crate::logging::Logger;
use crate::render::render_action_lists;

// The gate between a resolved transaction and any host mutation. With
// assume-yes the input source is never consulted.
pub fn confirm_transaction(
    lists: &ActionLists,
    assume_yes: bool,
    operator: &Logger,
    input: &mut dyn BufRead,
) -> Result<(), SessionError> {
    for line in render_action_lists(lists) {
        operator.say(1, &line);
    }

    if assume_yes {
        return Ok(());
    }

    print!("Is this ok [y/N]: ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|err| SessionError::Fatal(format!("cannot read confirmation: {err}")))?;

    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(()),
        _ => Err(SessionError::Declined),
    }
}
