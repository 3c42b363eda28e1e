//! Refactoring kernels for Vega.
//!
//! Every kernel maps a checked package and a selection to a
//! [`SuggestedFix`]: token-position edits plus any files to create. Kernels
//! never touch the snapshot they read; [`WorkspaceEdit::assemble`] turns a
//! fix into protocol edits, and the heavier kernels re-check the edited
//! workspace through a snapshot overlay before answering.
//!
//! Kernels that are offered lazily are registered by name in [`fixers`];
//! the `probe_*` functions answer cheaply whether a kernel applies at a
//! selection so the code-action layer can offer it without running it.
//!
//! A kernel refuses with [`RefactorError::Structural`] when the selection
//! does not fit its shape and [`RefactorError::Semantic`] when the code
//! cannot be transformed safely; both are expected outcomes, not bugs.

mod add_test;
mod change_signature;
mod edit;
mod error;
mod extract;
mod extract_file;
mod extract_function;
mod extract_interface;
mod fill;
pub mod fixers;
pub mod imports;
mod inline;
mod inline_call;
mod inline_variable;
mod invert_if;
mod lines;
pub mod lsp;
mod qualify;
mod selection;
mod string_literal;
mod stub_methods;
mod util;

pub use add_test::{add_test, probe_add_test, test_file_for, AddTestOptions};
pub use change_signature::{change_signature, probe_change_signature, ParameterChoice, SignatureChange};
pub use edit::{diff_edits, DocumentChange, Edit, FileEdit, NewFile, RangeEdit, SuggestedFix, WorkspaceEdit};
pub use error::RefactorError;
pub use extract::{probe_extract_variable, ExtractProbe};
pub use extract_file::selected_decls;
pub use extract_function::probe_extract_function;
pub use extract_interface::probe_extract_interface;
pub use fill::{probe_fill_struct, probe_fill_switch};
pub use fixers::{apply_fix, FileInput, PackageInput};
pub use inline::{guarded_inline, InlineRequest, Inliner, SimpleInliner};
pub use inline_call::probe_inline_call;
pub use inline_variable::probe_inline_variable;
pub use invert_if::probe_invert_if;
pub use lines::probe_lines;
pub use selection::{enclosing_static_call, find_parameter, range_pos, ParamSite, Selection, StaticCall};
pub use string_literal::{probe_string_literal, Quoting};
pub use stub_methods::probe_stub_methods;
