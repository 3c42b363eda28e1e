//! Typed command records.
//!
//! Actions whose edits are computed on demand carry one of these records,
//! either as code-action `data` (for `codeAction/resolve`) or as the single
//! argument of a `workspace/executeCommand` request.

use lsp_types::{Command, Range, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vega_core::FileId;
use vega_refactor::SignatureChange;

use crate::CodeActionError;

pub const APPLY_FIX: &str = "vega.applyFix";
pub const CHANGE_SIGNATURE: &str = "vega.changeSignature";
pub const ADD_TEST: &str = "vega.addTest";
pub const RUN_TESTS: &str = "vega.runTests";

/// Every command id Vega registers with the client.
pub const COMMANDS: &[&str] = &[APPLY_FIX, CHANGE_SIGNATURE, ADD_TEST, RUN_TESTS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandArgs {
    /// Run the named fixer on `range`.
    #[serde(rename_all = "camelCase")]
    ApplyFix { fix: String, uri: Uri, range: Range },
    #[serde(rename_all = "camelCase")]
    ChangeSignature {
        uri: Uri,
        range: Range,
        change: SignatureChange,
    },
    #[serde(rename_all = "camelCase")]
    AddTest { uri: Uri, range: Range },
    #[serde(rename_all = "camelCase")]
    RunTests {
        uri: Uri,
        tests: Vec<String>,
        benchmarks: Vec<String>,
    },
}

impl CommandArgs {
    pub fn command_id(&self) -> &'static str {
        match self {
            CommandArgs::ApplyFix { .. } => APPLY_FIX,
            CommandArgs::ChangeSignature { .. } => CHANGE_SIGNATURE,
            CommandArgs::AddTest { .. } => ADD_TEST,
            CommandArgs::RunTests { .. } => RUN_TESTS,
        }
    }

    pub fn uri(&self) -> &Uri {
        match self {
            CommandArgs::ApplyFix { uri, .. }
            | CommandArgs::ChangeSignature { uri, .. }
            | CommandArgs::AddTest { uri, .. }
            | CommandArgs::RunTests { uri, .. } => uri,
        }
    }

    pub fn file(&self) -> Result<FileId, CodeActionError> {
        let uri = self.uri();
        FileId::from_uri(uri.as_str()).ok_or_else(|| CodeActionError::InvalidData(format!("not a file uri: {}", uri.as_str())))
    }

    pub fn to_value(&self) -> Result<Value, CodeActionError> {
        serde_json::to_value(self).map_err(|err| CodeActionError::InvalidData(err.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, CodeActionError> {
        serde_json::from_value(value).map_err(|err| CodeActionError::InvalidData(err.to_string()))
    }

    pub fn into_command(self, title: impl Into<String>) -> Result<Command, CodeActionError> {
        Ok(Command {
            title: title.into(),
            command: self.command_id().to_string(),
            arguments: Some(vec![self.to_value()?]),
        })
    }

    /// Decode the arguments of an `executeCommand` request for `command`.
    pub fn from_command(command: &str, arguments: &[Value]) -> Result<Self, CodeActionError> {
        if !COMMANDS.contains(&command) {
            return Err(CodeActionError::UnknownCommand(command.to_string()));
        }
        let [arg] = arguments else {
            return Err(CodeActionError::InvalidData(format!(
                "{command} expects one argument, got {}",
                arguments.len()
            )));
        };
        let args = Self::from_value(arg.clone())?;
        if args.command_id() != command {
            return Err(CodeActionError::InvalidData(format!(
                "{command} cannot run {} arguments",
                args.command_id()
            )));
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;
    use serde_json::json;

    fn uri() -> Uri {
        "file:///ws/p/a.go".parse().unwrap()
    }

    #[test]
    fn records_are_tagged_on_the_wire() {
        let args = CommandArgs::ChangeSignature {
            uri: uri(),
            range: Range::new(Position::new(2, 9), Position::new(2, 10)),
            change: SignatureChange::Remove(1),
        };
        let value = args.to_value().unwrap();
        assert_eq!(value["type"], "changeSignature");
        assert_eq!(value["change"], json!({ "kind": "remove", "index": 1 }));
        assert_eq!(CommandArgs::from_value(value).unwrap(), args);
    }

    #[test]
    fn command_ids_must_match_their_arguments() {
        let args = CommandArgs::AddTest {
            uri: uri(),
            range: Range::default(),
        };
        let value = args.to_value().unwrap();
        assert_eq!(CommandArgs::from_command(ADD_TEST, &[value.clone()]).unwrap(), args);
        assert!(matches!(
            CommandArgs::from_command(RUN_TESTS, &[value.clone()]),
            Err(CodeActionError::InvalidData(_))
        ));
        assert!(matches!(
            CommandArgs::from_command("vega.nope", &[value]),
            Err(CodeActionError::UnknownCommand(_))
        ));
        assert!(matches!(
            CommandArgs::from_command(ADD_TEST, &[]),
            Err(CodeActionError::InvalidData(_))
        ));
    }

    #[test]
    fn file_comes_from_the_uri() {
        let args = CommandArgs::RunTests {
            uri: uri(),
            tests: vec!["TestA".into()],
            benchmarks: Vec::new(),
        };
        assert_eq!(args.file().unwrap(), FileId::new("/ws/p/a.go"));
    }
}
