//! IDE-facing entry points of Vega: code actions, their resolution and
//! commands, and test code lenses.
//!
//! This crate bridges `vega-refactor` and LSP concepts. Cheap fixes are
//! returned with their edits inline; refactorings whose edits are costly
//! carry a typed [`CommandArgs`] record instead, and are completed by
//! [`resolve_code_action`] or [`execute_command`].

mod code_action;
mod code_lens;
pub mod command;
pub mod diagnostics;
mod error;
pub mod kinds;
mod producers;
mod resolve;
mod test_discovery;

pub use code_action::{code_actions, ClientCapabilities, CodeActionRequest, CodeActionResponse, Trigger};
pub use code_lens::code_lenses;
pub use command::CommandArgs;
pub use error::CodeActionError;
pub use resolve::{command_edit, execute_command, resolve_code_action, CommandOutcome};
pub use test_discovery::{discover_tests, tests_in_range, TestFunc, TestKind};
