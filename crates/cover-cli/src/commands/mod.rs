pub mod eph5;
pub mod rang;

use crate::cli::Command;
use crate::error::Result;

pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Eph5(cmd) => eph5::run(cmd),
        Command::Rang(cmd) => rang::run(cmd),
    }
}
