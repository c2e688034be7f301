//! The standard command set.
//!
//! Each module installs its commands into an interpreter's global namespace.
//! Everything is loaded explicitly from the interpreter constructor; there
//! is no process-init side channel.

use crate::interp::Interp;
use crate::proc;

mod control;
mod evalcmd;
mod field;
mod io;
mod list;
mod math;
mod ns;
mod strings;
mod vars;

pub(crate) fn install_std(interp: &mut Interp) {
    control::install(interp);
    vars::install(interp);
    list::install(interp);
    math::install(interp);
    strings::install(interp);
    io::install(interp);
    ns::install(interp);
    evalcmd::install(interp);
    field::install(interp);
    interp.define("proc", proc::cmd_proc);
    interp.define("macro", proc::cmd_macro);
}
