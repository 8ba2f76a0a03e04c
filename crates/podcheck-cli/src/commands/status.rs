//! `podcheck status`: show the session and verification status.

use clap::Args;

use super::{unreachable, StatusResponse, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Endpoint of the podcheck server.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/", args.endpoint.trim_end_matches('/'));
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let status: StatusResponse = r.json().await?;
            status.print();
        }
        Ok(r) => {
            anyhow::bail!("server returned HTTP {}", r.status());
        }
        Err(e) => unreachable(&args.endpoint, &e),
    }

    Ok(())
}
