use serde::{Deserialize, Serialize};

/// Operation name for evaluating code on the server
pub const EVAL_OP: &str = "eval";

/// Task the server runs when no arguments are given
pub const HELP_TASK: &str = "help";

/// Message sent to the build server
///
/// Encodes as `{"code": ..., "op": "eval"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub op: String,
    pub code: String,
}

impl Request {
    /// An `eval` request for the given program text
    pub fn eval(code: impl Into<String>) -> Self {
        Self {
            op: EVAL_OP.to_string(),
            code: code.into(),
        }
    }
}

/// Build the request that runs `args` as boot tasks
///
/// No arguments yields `(boot help)`; otherwise every argument becomes its
/// own string literal, as in `(boot "run" "say hi")`.
pub fn build_request<S: AsRef<str>>(args: &[S]) -> Request {
    Request::eval(build_code(args))
}

/// The `(boot ...)` form for `args`
pub fn build_code<S: AsRef<str>>(args: &[S]) -> String {
    if args.is_empty() {
        return format!("(boot {})", HELP_TASK);
    }

    let mut code = String::from("(boot");
    for arg in args {
        code.push(' ');
        push_quoted(&mut code, arg.as_ref());
    }
    code.push(')');
    code
}

/// Quote `arg` as a single string literal
///
/// Backslashes and double quotes are escaped; every other character,
/// whitespace included, is kept as is.
pub fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    push_quoted(&mut out, arg);
    out
}

fn push_quoted(out: &mut String, arg: &str) {
    out.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}
