//! Host platform detection

/// Which family of networking tools the host provides
///
/// Detected once at startup; every tool invocation and output grammar is
/// chosen from this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// iproute2 (`ip route`, `ip neigh`) and net-tools `arp -n`
    Linux,
    /// BSD `route`, `arp -a`, `ipconfig`, `networksetup`
    MacOs,
}

impl Platform {
    /// Detect the platform this binary was built for
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Whether the kernel neighbor table can be dumped with `ip neigh`
    pub fn has_neighbor_table(self) -> bool {
        matches!(self, Platform::Linux)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
        }
    }
}
