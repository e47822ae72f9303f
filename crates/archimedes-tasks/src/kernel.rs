//! Symbolic computation through an external kernel process.

use archimedes_commands::HandlerError;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

#[derive(thiserror::Error, Debug)]
pub enum KernelError {
    #[error("failed to run kernel: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("kernel produced no output")]
    NoOutput,
    #[error("kernel exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("kernel output is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<KernelError> for HandlerError {
    fn from(e: KernelError) -> Self {
        HandlerError::Kernel(Box::new(e))
    }
}

/// Evaluates a command in the kernel's language and returns what it
/// printed.
pub trait ComputeKernel {
    fn evaluate(&self, command: &str) -> Result<String, KernelError>;
}

/// Wolfram Language kernel driven through `wolframscript`-style script
/// execution: the command is wrapped in `Print[...]`, written to a
/// temporary file and run with `<program> -script <file>`.
#[derive(Clone, Debug)]
pub struct WolframScript {
    program: PathBuf,
}

impl Default for WolframScript {
    fn default() -> Self {
        Self::new("wolfram")
    }
}

impl WolframScript {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ComputeKernel for WolframScript {
    fn evaluate(&self, command: &str) -> Result<String, KernelError> {
        let mut script = tempfile::Builder::new()
            .prefix("archimedes-")
            .suffix(".wl")
            .tempfile()?;
        write!(script, "Print[{command}]")?;
        script.flush()?;

        let path = script.into_temp_path();
        log::debug!("running {} -script {}", self.program.display(), path.display());
        let output = Command::new(&self.program)
            .arg("-script")
            .arg(&path)
            .output()?;

        if !output.status.success() {
            return Err(KernelError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        if output.stdout.is_empty() {
            return Err(KernelError::NoOutput);
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Kernel expression that parses `tex` as TeX and evaluates it.
pub fn tex_to_expression(tex: &str) -> String {
    let escaped = tex.replace('\\', "\\\\").replace('"', "\\\"");
    format!("ToExpression[\"{escaped}\", TeXForm]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tex_is_escaped_into_a_string_literal() {
        assert_eq!(
            tex_to_expression(r"\frac{1}{2} + x"),
            r#"ToExpression["\\frac{1}{2} + x", TeXForm]"#
        );
        assert_eq!(
            tex_to_expression(r#"\text{"a"}"#),
            r#"ToExpression["\\text{\"a\"}", TeXForm]"#
        );
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let kernel = WolframScript::new("/nonexistent/archimedes-kernel");
        assert!(matches!(kernel.evaluate("1+1"), Err(KernelError::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn script_program_outcomes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let fake = |name: &str, body: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
            WolframScript::new(path)
        };

        // echo the script back: `$1` is `-script`, `$2` the file
        let echo = fake("echo-kernel", r#"cat "$2""#);
        assert_eq!(echo.evaluate("1+1").expect("output"), "Print[1+1]");

        let silent = fake("silent-kernel", "exit 0");
        assert!(matches!(silent.evaluate("x"), Err(KernelError::NoOutput)));

        let broken = fake("broken-kernel", "echo syntax >&2; exit 3");
        match broken.evaluate("x") {
            Err(KernelError::Failed { stderr, .. }) => assert_eq!(stderr, "syntax"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
