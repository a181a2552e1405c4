//! Command service and CLI handlers.
//!
//! Commands are numbered actions the client can discover and trigger;
//! the CLI is a raw text pipe into the application's console. Both are
//! thin adapters over their capability traits.

use core::fmt::Write as _;

use crate::config::COUNT_COMMANDS_IN_RESPONSE;
use crate::error::{ErrorCode, Result};
use crate::ports::{CliPort, CommandPort};
use crate::wire::types::{
    BigString, CliData, DiscoverCommandsResponse, SendCommand, SendCommandResponse,
};

/// First frame of DISCOVER_COMMANDS; the command table has no ID-list
/// form, discovery always walks the whole table.
pub fn handle_discover_commands(
    app: &mut impl CommandPort,
) -> Result<(DiscoverCommandsResponse, u32)> {
    app.command_discover_reset(0)?;
    let total = app.command_count();
    let frames = (total.div_ceil(COUNT_COMMANDS_IN_RESPONSE)) as u32;
    let first = produce_commands_batch(app);
    Ok((first, frames.saturating_sub(1)))
}

/// One DISCOVER_COMMANDS frame worth of descriptors.
pub fn produce_commands_batch(app: &mut impl CommandPort) -> DiscoverCommandsResponse {
    let mut response = DiscoverCommandsResponse::default();
    while !response.available_commands.is_full() {
        let Ok(info) = app.command_discover_next() else {
            break;
        };
        let _ = response.available_commands.push(info);
    }
    response
}

/// SEND_COMMAND. Execution failures come back in the response result
/// so the client sees which command failed; `NO_RESPONSE` propagates
/// for commands that deliberately answer with silence (reboot and the
/// like).
pub fn handle_send_command(
    req: &SendCommand,
    app: &mut impl CommandPort,
) -> Result<SendCommandResponse> {
    match app.command_execute(req.command_id) {
        Ok(()) => Ok(SendCommandResponse {
            result: 0,
            result_message: None,
        }),
        Err(ErrorCode::NoResponse) => Err(ErrorCode::NoResponse),
        Err(code) => {
            let mut message = BigString::new();
            let _ = write!(message, "command {}: {}", req.command_id, code);
            Ok(SendCommandResponse {
                result: code.as_i32(),
                result_message: Some(message),
            })
        }
    }
}

/// Inbound CLI_NOTIFICATION. The line goes to the application console;
/// no response frame is generated for it.
pub fn handle_cli_line(data: &CliData, app: &mut impl CliPort) -> Result<()> {
    app.cli_enter(data.message_data.as_str())
}
