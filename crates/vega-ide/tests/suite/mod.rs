mod harness;

mod code_actions;
mod code_lens;
mod diagnostics;
mod resolve;
