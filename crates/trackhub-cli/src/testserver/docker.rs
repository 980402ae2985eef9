//! Docker orchestration for the local test backend container.

use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use regex::Regex;

/// In-container ports for the backend and fixture services.
const BASE_CONTAINER_PORT: &str = "8080";
const FIXTURE_CONTAINER_PORT: &str = "9015";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerPorts {
    pub base_port: u16,
    pub fixture_port: u16,
}

/// The image coordinates to run.
#[derive(Debug, Clone)]
pub struct ImageSpec {
    pub registry: String,
    pub repository: String,
    pub tag: String,
    /// Docker `--pull` policy: always, never, or missing.
    pub pull: String,
}

impl ImageSpec {
    fn image_ref(&self) -> String {
        format!("{}/{}:{}", self.registry, self.repository, self.tag)
    }
}

/// Issue `docker run` for the test container and return immediately.
pub fn run_container(name: &str, image: &ImageSpec) -> Result<()> {
    let image_ref = image.image_ref();
    let volume = format!("{name}-vol:/vol");
    let status = Command::new("docker")
        .args([
            "run",
            "--rm",
            "--detach",
            "--pull",
            &image.pull,
            "-e",
            "TRACKHUB_ENABLE_TEST_CONTAINER=true",
            "--name",
            name,
            "--volume",
            &volume,
            // Expose ports to the host on ephemeral port numbers.
            "--publish",
            BASE_CONTAINER_PORT,
            "--publish",
            FIXTURE_CONTAINER_PORT,
            // The image is only published for this platform; without it,
            // docker defaults to the host platform and fails elsewhere.
            "--platform",
            "linux/amd64",
            &image_ref,
        ])
        .stdout(Stdio::null())
        .status()
        .context("Failed to run docker")?;
    if !status.success() {
        anyhow::bail!("docker run failed with {status}");
    }
    Ok(())
}

pub fn remove_container(name: &str) -> Result<()> {
    let status = Command::new("docker")
        .args(["rm", "-f", name])
        .stdout(Stdio::null())
        .status()
        .context("Failed to run docker")?;
    if !status.success() {
        anyhow::bail!("docker rm failed with {status}");
    }
    Ok(())
}

/// `docker port` can report an incomplete list right after `docker run`,
/// so retry for up to a second.
pub fn container_ports_retrying(name: &str) -> Result<ContainerPorts> {
    let deadline = Instant::now() + Duration::from_secs(1);
    loop {
        if let Some(ports) = container_ports(name)? {
            return Ok(ports);
        }
        if Instant::now() >= deadline {
            anyhow::bail!("Failed to get ports from container {name}");
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

/// Query the container's published ports; `None` until both are visible.
fn container_ports(name: &str) -> Result<Option<ContainerPorts>> {
    let output = Command::new("docker")
        .args(["port", name])
        .output()
        .context("Failed to run docker")?;
    if !output.status.success() {
        anyhow::bail!("docker port failed with {}", output.status);
    }
    Ok(parse_port_lines(&String::from_utf8_lossy(&output.stdout)))
}

// The host side may be an IPv4 address, a bracketed IPv6 address, or
// empty, so anchor the port on the final colon.
static PORT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(/\w+)? -> .*:(\d+)$").expect("port line regex"));

fn parse_port_lines(text: &str) -> Option<ContainerPorts> {
    let mut base_port: u16 = 0;
    let mut fixture_port: u16 = 0;
    for line in text.lines() {
        let Some(caps) = PORT_LINE_RE.captures(line.trim()) else {
            continue;
        };
        let internal_port = &caps[1];
        let Ok(external_port) = caps[3].parse::<u16>() else {
            continue;
        };
        if internal_port == BASE_CONTAINER_PORT {
            base_port = external_port;
        } else if internal_port == FIXTURE_CONTAINER_PORT {
            fixture_port = external_port;
        }
    }
    if base_port == 0 || fixture_port == 0 {
        return None;
    }
    Some(ContainerPorts {
        base_port,
        fixture_port,
    })
}
