//! In-memory stand-ins for the Go toolchain
//!
//! `MiniGo` understands a tiny Go subset, enough to produce the diagnostic,
//! runtime-failure and incomplete-input shapes the real toolchain emits.

#![allow(dead_code)]

use async_trait::async_trait;
use engine::{FixConfig, FixLoop, FixPlacement, RunResult, Session, Toolchain, ToolchainError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Simulated `goimports` + `go run` for a Go subset:
/// `x := 5`, `_ = x`, `println(x)`, `panic("msg")`, `var s string = 1`,
/// and brace blocks whose bodies run unconditionally.
#[derive(Default)]
pub struct MiniGo {
    format_calls: AtomicUsize,
    run_calls: AtomicUsize,
}

impl MiniGo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format_calls(&self) -> usize {
        self.format_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Toolchain for MiniGo {
    async fn organize_imports(
        &self,
        source: &str,
        _working_dir: &Path,
    ) -> Result<String, ToolchainError> {
        self.format_calls.fetch_add(1, Ordering::SeqCst);

        if source.matches('{').count() > source.matches('}').count() {
            return Err(ToolchainError::Rejected {
                message: format!(
                    "<standard input>:{}:1: expected '}}', found 'EOF'",
                    source.lines().count() + 1
                ),
            });
        }
        for (idx, line) in source.lines().enumerate() {
            if line.trim_end().ends_with('+') {
                return Err(ToolchainError::Rejected {
                    message: format!(
                        "<standard input>:{}:{}: expected operand",
                        idx + 1,
                        line.len() + 1
                    ),
                });
            }
        }
        Ok(source.to_string())
    }

    async fn compile_and_run(
        &self,
        file_path: &Path,
        _working_dir: &Path,
    ) -> Result<RunResult, ToolchainError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);

        let source =
            std::fs::read_to_string(file_path).map_err(|source| ToolchainError::Spawn {
                program: "go".to_string(),
                source,
            })?;
        let marker = format!(
            "./{}",
            file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        Ok(simulate(&source, &marker))
    }
}

struct Binding {
    name: String,
    line: usize,
    value: i64,
    used: bool,
}

enum Effect {
    Print(i64),
    Panic(String),
}

fn lookup<'a>(bindings: &'a mut [Binding], name: &str) -> Option<&'a mut Binding> {
    bindings.iter_mut().find(|b| b.name == name)
}

fn simulate(source: &str, marker: &str) -> RunResult {
    let mut bindings: Vec<Binding> = Vec::new();
    let mut errors: Vec<(usize, usize, String)> = Vec::new();
    let mut effects = Vec::new();
    let mut in_main = false;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if !in_main {
            in_main = line == "func main() {";
            continue;
        }
        if line.is_empty() || line == "}" || line.ends_with('{') {
            continue;
        }

        if let Some(name) = line.strip_prefix("_ = ") {
            match lookup(&mut bindings, name) {
                Some(binding) => binding.used = true,
                None => errors.push((line_no, 5, format!("undefined: {}", name))),
            }
        } else if let Some(arg) = line
            .strip_prefix("println(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            match arg.parse::<i64>() {
                Ok(value) => effects.push(Effect::Print(value)),
                Err(_) => match lookup(&mut bindings, arg) {
                    Some(binding) => {
                        binding.used = true;
                        effects.push(Effect::Print(binding.value));
                    }
                    None => errors.push((line_no, 9, format!("undefined: {}", arg))),
                },
            }
        } else if let Some(message) = line
            .strip_prefix("panic(\"")
            .and_then(|rest| rest.strip_suffix("\")"))
        {
            effects.push(Effect::Panic(message.to_string()));
        } else if line.starts_with("var ") {
            let column = line.rfind("= ").map(|i| i + 3).unwrap_or(1);
            errors.push((
                line_no,
                column,
                "cannot use 1 (untyped int constant) as string value in variable declaration"
                    .to_string(),
            ));
        } else if let Some((name, value)) = line.split_once(" := ") {
            let (name, value) = (name.trim(), value.trim());
            if bindings.iter().any(|b| b.name == name) {
                errors.push((line_no, 3, "no new variables on left side of :=".to_string()));
            } else {
                match value.parse::<i64>() {
                    Ok(value) => bindings.push(Binding {
                        name: name.to_string(),
                        line: line_no,
                        value,
                        used: false,
                    }),
                    Err(_) => errors.push((line_no, 6, format!("undefined: {}", value))),
                }
            }
        } else {
            let token = line.split_whitespace().next().unwrap_or(line);
            errors.push((line_no, 1, format!("syntax error: unexpected {}", token)));
        }
    }

    for binding in bindings.iter().filter(|b| !b.used) {
        errors.push((
            binding.line,
            1,
            format!("declared and not used: {}", binding.name),
        ));
    }

    if !errors.is_empty() {
        errors.sort_by_key(|(line, column, _)| (*line, *column));
        let mut output = String::from("# command-line-arguments\n");
        for (line, column, message) in errors {
            output.push_str(&format!("{}:{}:{}: {}\n", marker, line, column, message));
        }
        return RunResult::new(output, false);
    }

    let mut output = String::new();
    for effect in effects {
        match effect {
            Effect::Print(value) => output.push_str(&format!("{}\n", value)),
            Effect::Panic(message) => {
                output.push_str(&format!(
                    "panic: {}\n\ngoroutine 1 [running]:\nmain.main()\nexit status 2\n",
                    message
                ));
                return RunResult::new(output, false);
            }
        }
    }
    RunResult::new(output, true)
}

/// Toolchain whose run results come from a closure over the attempt number
pub struct Canned<F> {
    respond: F,
    runs: AtomicUsize,
}

impl<F> Canned<F>
where
    F: Fn(usize) -> Result<RunResult, ToolchainError> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> Toolchain for Canned<F>
where
    F: Fn(usize) -> Result<RunResult, ToolchainError> + Send + Sync,
{
    async fn organize_imports(
        &self,
        source: &str,
        _working_dir: &Path,
    ) -> Result<String, ToolchainError> {
        Ok(source.to_string())
    }

    async fn compile_and_run(
        &self,
        _file_path: &Path,
        _working_dir: &Path,
    ) -> Result<RunResult, ToolchainError> {
        let attempt = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        (self.respond)(attempt)
    }
}

/// Session over `dir/main.go` with an empty `package main` preamble
pub fn scratch_session(dir: &Path) -> Session {
    Session::new(dir, dir.join("main.go"), "package main")
}

pub fn config(placement: FixPlacement) -> FixConfig {
    FixConfig {
        max_fix_passes: 16,
        placement,
    }
}

pub fn mini_go_loop(placement: FixPlacement) -> FixLoop<MiniGo> {
    FixLoop::new(MiniGo::new(), config(placement))
}
