//! Test doubles for tool invocation and hostname lookup

use async_trait::async_trait;
use lanscan_core::UNKNOWN_HOSTNAME;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::command::{CommandOutput, CommandRunner, ToolCommand};
use crate::error::CommandError;
use crate::hostname::HostnameResolver;
use crate::interface::InterfaceResolver;
use crate::platform::Platform;
use crate::strategy::ScanContext;

#[derive(Clone)]
enum Reply {
    Output(CommandOutput),
    Hang,
}

/// Command runner answering from a script
///
/// Commands are matched on their full command line first, then on the
/// program name. Anything unscripted behaves like a missing tool.
#[derive(Clone, Default)]
pub struct FakeRunner {
    exact: HashMap<String, Reply>,
    programs: HashMap<String, Reply>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, command_line: &str, status: i32, stdout: &str) -> Self {
        self.exact.insert(command_line.to_string(), reply(status, stdout));
        self
    }

    pub fn hang(mut self, command_line: &str) -> Self {
        self.exact.insert(command_line.to_string(), Reply::Hang);
        self
    }

    pub fn program_output(mut self, program: &str, status: i32, stdout: &str) -> Self {
        self.programs.insert(program.to_string(), reply(status, stdout));
        self
    }

    pub fn program_hang(mut self, program: &str) -> Self {
        self.programs.insert(program.to_string(), Reply::Hang);
        self
    }

    /// Command lines run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn reply(status: i32, stdout: &str) -> Reply {
    Reply::Output(CommandOutput {
        status: Some(status),
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput, CommandError> {
        let line = command.to_string();
        self.calls.lock().unwrap().push(line.clone());

        let reply = self
            .exact
            .get(&line)
            .or_else(|| self.programs.get(&command.program))
            .cloned();

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(CommandError::NotFound(command.program.clone())),
        }
    }
}

/// Hostname table; unknown addresses resolve to `"Unknown"`
#[derive(Default)]
pub struct FixedHostnames(pub HashMap<Ipv4Addr, String>);

impl FixedHostnames {
    pub fn with(mut self, ip: Ipv4Addr, name: &str) -> Self {
        self.0.insert(ip, name.to_string());
        self
    }
}

#[async_trait]
impl HostnameResolver for FixedHostnames {
    async fn resolve(&self, ip: Ipv4Addr) -> String {
        self.0
            .get(&ip)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string())
    }
}

/// Scan context wired to fakes, with system interface enumeration disabled
pub fn context(platform: Platform, runner: FakeRunner, hostnames: FixedHostnames) -> ScanContext {
    let runner: Arc<dyn CommandRunner> = Arc::new(runner);
    let timeout = Duration::from_secs(30);
    let interfaces =
        InterfaceResolver::new(platform, runner.clone(), timeout).without_system_enumeration();

    ScanContext {
        platform,
        runner,
        interfaces: Arc::new(interfaces),
        hostnames: Arc::new(hostnames),
        command_timeout: timeout,
    }
}
