use lsp_types::{CodeLens, Range as LspRange};
use vega_core::FileId;
use vega_db::Snapshot;
use vega_refactor::lsp::file_uri;
use vega_syntax::NodeKind;

use crate::command::CommandArgs;
use crate::test_discovery::{discover_tests, TestKind};
use crate::CodeActionError;

/// `run test` and `run benchmark` lenses over the tests of a `_test.go`
/// file, plus `run file benchmarks` on its package clause.
pub fn code_lenses(snapshot: &Snapshot, file: &FileId) -> Result<Vec<CodeLens>, CodeActionError> {
    if !file.is_test_file() {
        return Ok(Vec::new());
    }
    let parsed = snapshot.parse(file)?;
    let uri = file_uri(file)?;
    let tests = discover_tests(&parsed);

    let mut lenses = Vec::with_capacity(tests.len() + 1);
    let benchmarks: Vec<String> = tests
        .iter()
        .filter(|t| t.kind.is_benchmark())
        .map(|t| t.name.clone())
        .collect();
    if !benchmarks.is_empty() {
        if let NodeKind::File { name, .. } = parsed.tree.kind(parsed.tree.root()) {
            let range: LspRange = parsed.mapper.node_range(&parsed.tree, *name)?.into();
            let args = CommandArgs::RunTests {
                uri: uri.clone(),
                tests: Vec::new(),
                benchmarks,
            };
            lenses.push(CodeLens {
                range,
                command: Some(args.into_command("run file benchmarks")?),
                data: None,
            });
        }
    }

    for test in tests {
        let range: LspRange = parsed
            .mapper
            .range_of(test.name_range.start(), test.name_range.end())?
            .into();
        let (title, args) = match test.kind {
            TestKind::Benchmark => (
                "run benchmark",
                CommandArgs::RunTests {
                    uri: uri.clone(),
                    tests: Vec::new(),
                    benchmarks: vec![test.name],
                },
            ),
            TestKind::Test | TestKind::Fuzz | TestKind::Example => (
                "run test",
                CommandArgs::RunTests {
                    uri: uri.clone(),
                    tests: vec![test.name],
                    benchmarks: Vec::new(),
                },
            ),
        };
        lenses.push(CodeLens {
            range,
            command: Some(args.into_command(title)?),
            data: None,
        });
    }
    tracing::debug!(target: "vega.ide", file = %file, lenses = lenses.len(), "computed code lenses");
    Ok(lenses)
}
