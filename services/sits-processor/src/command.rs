//! External algorithms run as child processes.
//!
//! The executable is called as
//! `<command> <args...> --nclasses <n> [--param name=value]... <rasters...>`
//! and reports on stdout:
//! - `progress=<percent> <message>` lines, forwarded to the progress sink
//! - `<name>=<path>` lines naming its outputs, relative paths being resolved
//!   against the working directory

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use sits_common::{SitsError, SitsResult};
use sits_pipeline::{Algorithm, AlgorithmOutputs, AlgorithmParams, ProgressSink};
use tracing::{debug, info, instrument, warn};

use crate::config::AlgorithmConfig;

const PROGRESS_KEY: &str = "progress";

pub struct CommandAlgorithm {
    name: String,
    command: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandAlgorithm {
    pub fn new(config: &AlgorithmConfig, working_dir: &Path) -> Self {
        Self {
            name: config.name.clone(),
            command: config.command.clone(),
            args: config.args.clone(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    fn arguments(&self, inputs: &[PathBuf], params: &AlgorithmParams) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--nclasses".to_string());
        args.push(params.n_classes.to_string());
        for (name, value) in &params.named {
            args.push("--param".to_string());
            args.push(format!("{}={}", name, value));
        }
        args.extend(inputs.iter().map(|p| p.display().to_string()));
        args
    }
}

/// One meaningful line of algorithm output.
#[derive(Debug, Clone, PartialEq)]
enum OutputLine {
    Progress(u8, String),
    Output(String, PathBuf),
}

fn parse_output_line(line: &str) -> Option<OutputLine> {
    let (key, value) = line.trim().split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    if key == PROGRESS_KEY {
        let (percent, message) = value.split_once(' ').unwrap_or((value, ""));
        let percent = percent.trim().parse::<u8>().ok()?.min(100);
        return Some(OutputLine::Progress(percent, message.trim().to_string()));
    }
    Some(OutputLine::Output(key.to_string(), PathBuf::from(value.trim())))
}

impl Algorithm for CommandAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(algorithm = %self.name, inputs = inputs.len()))]
    fn run(
        &self,
        inputs: &[PathBuf],
        params: &AlgorithmParams,
        progress: &mut dyn ProgressSink,
    ) -> SitsResult<AlgorithmOutputs> {
        let args = self.arguments(inputs, params);
        debug!(command = %self.command.display(), args = ?args, "Starting algorithm");

        let mut child = Command::new(&self.command)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SitsError::Algorithm(format!("failed to start {}: {}", self.command.display(), e))
            })?;

        let mut outputs = BTreeMap::new();
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line?;
                match parse_output_line(&line) {
                    Some(OutputLine::Progress(percent, message)) => progress.update(percent, &message),
                    Some(OutputLine::Output(name, path)) => {
                        outputs.insert(name, self.working_dir.join(path));
                    }
                    None => debug!(line = %line, "Algorithm output"),
                }
            }
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(SitsError::Algorithm(format!("{} exited with {}", self.name, status)));
        }
        if outputs.is_empty() {
            warn!(algorithm = %self.name, "Algorithm reported no outputs");
        }

        info!(algorithm = %self.name, outputs = outputs.len(), "Algorithm finished");
        Ok(AlgorithmOutputs::Named(outputs))
    }
}
