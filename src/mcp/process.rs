// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Child process management.
//!
//! Spawns the wrapped tool server with piped stdio, pumps its stderr to ours,
//! and kills it when the session ends. On Linux the child is additionally
//! bound to our lifetime with `PR_SET_PDEATHSIG`, so a crashed guard never
//! leaves an orphaned server behind.

use crate::engine_core::errors::GuardError;
use crate::mcp::pipeline::spawn_stderr_pump;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long `close` waits for the stderr pump to drain after the child is gone.
const STDERR_DRAIN_GRACE: Duration = Duration::from_millis(250);

pub struct ProcessSupervisor {
    child: Child,
    stderr_pump: Option<JoinHandle<u64>>,
}

pub type ProcessSpawnResult = (ProcessSupervisor, ChildStdin, ChildStdout);

impl ProcessSupervisor {
    /// Spawn `argv[0]` with `argv[1..]`, inheriting the environment.
    pub fn spawn(argv: &[String]) -> Result<ProcessSpawnResult, GuardError> {
        let (cmd, args) = argv
            .split_first()
            .ok_or_else(|| GuardError::ChildUnavailable("no command given".to_string()))?;
        debug!("ProcessSupervisor: spawning '{}' with args {:?}", cmd, args);

        let mut command = Command::new(cmd);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(target_os = "linux")]
        // SAFETY: prctl(PR_SET_PDEATHSIG) is async-signal-safe and only touches
        // the forked child's own process attributes.
        unsafe {
            command.pre_exec(|| {
                // Send SIGKILL to child if the guard dies
                let ret = libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL);
                if ret != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = command.spawn().map_err(|e| {
            GuardError::ChildUnavailable(format!("failed to spawn '{}': {}", cmd, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GuardError::ChildUnavailable("child stdin not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GuardError::ChildUnavailable("child stdout not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GuardError::ChildUnavailable("child stderr not piped".to_string()))?;

        let stderr_pump = Some(spawn_stderr_pump(stderr, tokio::io::stderr()));
        info!("Spawned child '{}' (pid {:?})", cmd, child.id());

        Ok((Self { child, stderr_pump }, stdin, stdout))
    }

    /// Exit status if the child has already terminated.
    pub fn try_exit_status(&mut self) -> Option<ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    /// Kill the child if it is still running and reap it. No graceful phase.
    pub async fn close(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => debug!("Child already exited: {}", status),
            _ => {
                if let Err(e) = self.child.start_kill() {
                    warn!("Failed to kill child: {}", e);
                }
                match self.child.wait().await {
                    Ok(status) => debug!("Child terminated: {}", status),
                    Err(e) => warn!("Failed to reap child: {}", e),
                }
            }
        }

        if let Some(mut pump) = self.stderr_pump.take() {
            if tokio::time::timeout(STDERR_DRAIN_GRACE, &mut pump)
                .await
                .is_err()
            {
                debug!("Child stderr still open after exit, detaching pump");
                pump.abort();
            }
        }
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        // kill_on_drop covers the process; the pump must not outlive us either.
        if let Some(pump) = self.stderr_pump.take() {
            pump.abort();
        }
    }
}
