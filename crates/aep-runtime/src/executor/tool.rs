//! Runs a code fragment inside the shared tools environment.

use aep_core::LifecycleManager;
use aep_protocols::{ExecOutcome, Scope};
use tracing::info;

use super::{ExecContext, capture};
use crate::error::ExecError;

/// Python program passed to `python -c`; the user's code is `sys.argv[1]`.
///
/// Loads every `tools/*.py` into a `tools` namespace, then evaluates the code
/// REPL-style so the value of a trailing expression is printed.
pub const TOOL_WRAPPER: &str = r#"
import ast
import importlib.util
import json
import os
import re
import sys
from pathlib import Path

cwd = Path(os.environ.get("AEP_CWD") or os.getcwd())
workspace = Path(os.environ.get("AEP_WORKSPACE") or cwd)
tools_dir = Path(os.environ["AEP_TOOLS_DIR"])


class _Tools:
    def __repr__(self):
        return "tools(%s)" % ", ".join(sorted(vars(self)))


tools = _Tools()
for _path in sorted(tools_dir.glob("*.py")):
    if _path.name.startswith((".", "_")):
        continue
    try:
        _spec = importlib.util.spec_from_file_location("tools." + _path.stem, _path)
        _module = importlib.util.module_from_spec(_spec)
        _spec.loader.exec_module(_module)
        setattr(tools, _path.stem, _module)
    except Exception as _e:
        print("Warning: failed to load tool %s: %s" % (_path.stem, _e), file=sys.stderr)


def _run(_source, _globals):
    try:
        _tree = ast.parse(_source, "<code>")
    except SyntaxError as _e:
        print("SyntaxError: %s" % _e, file=sys.stderr)
        sys.exit(1)
    if not _tree.body:
        return
    _last = _tree.body[-1]
    if isinstance(_last, ast.Expr):
        _head = ast.Module(body=_tree.body[:-1], type_ignores=[])
        exec(compile(_head, "<code>", "exec"), _globals)
        _value = eval(compile(ast.Expression(body=_last.value), "<code>", "eval"), _globals)
        if _value is not None:
            print(_value)
    else:
        exec(compile(_tree, "<code>", "exec"), _globals)


try:
    _run(sys.argv[1], globals())
except SystemExit:
    raise
except Exception as _e:
    print("%s: %s" % (type(_e).__name__, _e), file=sys.stderr)
    sys.exit(1)
"#;

pub struct ToolExecutor {
    manager: LifecycleManager,
}

impl ToolExecutor {
    pub fn new(manager: LifecycleManager) -> Self {
        Self { manager }
    }

    /// Run `code` with the tools-env interpreter.
    ///
    /// Never installs anything: a missing environment is an error.
    pub async fn run(&self, code: &str, ctx: ExecContext<'_>) -> Result<ExecOutcome, ExecError> {
        let env = self.manager.environment(&Scope::Tools);
        if !env.exists() {
            return Err(ExecError::missing_environment(Scope::Tools));
        }

        let port = self.manager.port();
        let interpreter = port.interpreter(&env);
        info!("Running tool code in {}", ctx.cwd.display());

        let mut cmd = port.command_in(&env, interpreter.as_os_str());
        cmd.arg("-c")
            .arg(TOOL_WRAPPER)
            .arg(code)
            .current_dir(ctx.cwd)
            .envs(ctx.env)
            .env("AEP_TOOLS_DIR", self.manager.layout().tools_dir())
            .env("AEP_CWD", ctx.cwd)
            .env("AEP_WORKSPACE", ctx.workspace);

        capture(cmd, &interpreter.to_string_lossy()).await
    }
}
