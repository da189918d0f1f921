//! Data units that flow through the driver.

mod command;
mod sample;

pub use command::{CommandAck, CommandPayload, PayloadGenerator, PayloadPolicy, COMMAND_DATA_LEN};
pub use sample::Sample;
