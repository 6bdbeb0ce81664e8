use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use reqwest::Url;

const DEFAULT_URL: &str = "http://127.0.0.1:5000/health";

fn main() -> ExitCode {
    match check(&env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Health check failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn check(url: &str) -> Result<()> {
    let url = Url::parse(url).with_context(|| format!("Invalid URL {url}"))?;

    let response = reqwest::blocking::get(url)?;
    if !response.status().is_success() {
        bail!("Server answered with {}", response.status())
    }

    Ok(())
}
