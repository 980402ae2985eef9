use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::{ConnectArgs, StartArgs, StopArgs};
use crate::output::{print_error, print_info, print_success};
use crate::testserver::docker::{self, ImageSpec};
use crate::testserver::state::{ServerInfo, StateStore};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn start(args: &StartArgs) -> Result<()> {
    match &args.hostname {
        None => start_interactively(&args.name).await,
        Some(hostname) => {
            let base_port = args.base_port.context("--base-port required")?;
            let fixture_port = args.fixture_port.context("--fixture-port required")?;
            start_external(&args.name, hostname, base_port, fixture_port).await
        }
    }
}

async fn start_interactively(name: &str) -> Result<()> {
    let store = StateStore::default_location()?;
    let _guard = store.lock()?;
    let mut state = store.load()?;

    if let Some(existing) = state.servers.get(name) {
        if existing.wait_until_healthy(PROBE_TIMEOUT).await.is_ok() {
            print_info(&format!("Server {name:?} is already running."));
            return Ok(());
        }
        print_info(&format!(
            "Server {name:?} is not healthy or no longer running. Restarting."
        ));
    }

    let image = prompt_image_spec()?;
    docker::run_container(name, &image)?;
    let ports = docker::container_ports_retrying(name)?;

    let server = ServerInfo {
        managed: true,
        hostname: "localhost".to_string(),
        base_port: ports.base_port,
        fixture_port: ports.fixture_port,
    };
    state.servers.insert(name.to_string(), server.clone());
    store.save(&state)?;

    if server.wait_until_healthy(STARTUP_TIMEOUT).await.is_err() {
        print_error(&format!("Server {name:?} did not become healthy in time."));
        std::process::exit(1);
    }
    print_success(&format!("Server {name:?} is up and healthy!"));
    Ok(())
}

async fn start_external(
    name: &str,
    hostname: &str,
    base_port: u16,
    fixture_port: u16,
) -> Result<()> {
    let store = StateStore::default_location()?;
    let _guard = store.lock()?;
    let mut state = store.load()?;

    if state.servers.contains_key(name) {
        print_error(&format!("Server {name:?} is already running."));
        std::process::exit(1);
    }

    let server = ServerInfo {
        managed: false,
        hostname: hostname.to_string(),
        base_port,
        fixture_port,
    };
    state.servers.insert(name.to_string(), server.clone());
    store.save(&state)?;

    if server.wait_until_healthy(STARTUP_TIMEOUT).await.is_err() {
        print_error(&format!("Server {name:?} did not become healthy in time."));
        std::process::exit(1);
    }
    print_success("Server is healthy!");
    Ok(())
}

/// Exit 0 and print the ports as JSON if the named server is healthy;
/// exit 1 otherwise.
pub async fn connect(args: &ConnectArgs) -> Result<()> {
    let store = StateStore::default_location()?;
    let server = {
        let _guard = store.lock()?;
        store.load()?.servers.get(&args.name).cloned()
    };

    let Some(server) = server else {
        print_error(&format!(
            "Server {:?} is not running. To start it, run:\n\ttrackhub testserver start --name={:?}",
            args.name, args.name
        ));
        std::process::exit(1);
    };

    if server.wait_until_healthy(PROBE_TIMEOUT).await.is_err() {
        print_error(&format!("Server {:?} is not healthy.", args.name));
        std::process::exit(1);
    }

    print_info(&format!("Server {:?} is healthy.", args.name));
    println!(
        "{}",
        serde_json::json!({
            "base_port": server.base_port,
            "fixture_port": server.fixture_port,
        })
    );
    Ok(())
}

pub fn stop(args: &StopArgs) -> Result<()> {
    let store = StateStore::default_location()?;
    let _guard = store.lock()?;
    let mut state = store.load()?;

    let names: Vec<String> = if args.names.is_empty() {
        state.servers.keys().cloned().collect()
    } else {
        args.names.clone()
    };
    if names.is_empty() {
        print_error("No servers to stop.");
        std::process::exit(1);
    }

    let mut all_good = true;
    for name in &names {
        let Some(server) = state.servers.remove(name) else {
            print_error(&format!("No server called {name:?}."));
            all_good = false;
            continue;
        };

        if !server.managed {
            print_info(&format!(
                "Forgetting {name:?}, but not stopping it because it wasn't started by this tool."
            ));
            continue;
        }

        match docker::remove_container(name) {
            Ok(()) => print_info(&format!("Shut down {name:?}.")),
            Err(err) => {
                print_error(&format!("Failed to stop {name:?}; forgetting it anyway: {err:#}"));
                all_good = false;
            }
        }
    }
    store.save(&state)?;

    if !all_good {
        std::process::exit(1);
    }
    Ok(())
}

pub fn print_debug() -> Result<()> {
    let store = StateStore::default_location()?;
    let _guard = store.lock()?;
    let state = store.load()?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn prompt_image_spec() -> Result<ImageSpec> {
    Ok(ImageSpec {
        registry: prompt("Registry", "us-central1-docker.pkg.dev")?,
        repository: prompt("Repository", "trackhub-production/images/local-testcontainer")?,
        tag: prompt("Tag", "master")?,
        pull: prompt("--pull", "always")?,
    })
}

fn prompt(label: &str, default: &str) -> Result<String> {
    eprint!("{label} [{default}]: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    let trimmed = line.trim();
    Ok(if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    })
}
