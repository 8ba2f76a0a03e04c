//! `podcheck login`: start a login and print the provider URL.

use clap::Args;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;

use super::{unreachable, ErrorResponse, StatusResponse, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// OpenID issuer to log in with.
    #[arg(short, long)]
    pub issuer: String,

    /// Endpoint of the podcheck server.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &LoginArgs) -> anyhow::Result<()> {
    let url = format!("{}/login", args.endpoint.trim_end_matches('/'));

    // The server answers with a redirect meant for a browser; keep it.
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
    let resp = client
        .get(&url)
        .query(&[("oidcIssuer", args.issuer.as_str())])
        .send()
        .await;

    match resp {
        Ok(r) if r.status().is_redirection() => {
            let location = r
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| anyhow::anyhow!("redirect without a Location header"))?;
            println!("Open this URL in your browser to log in:");
            println!("  {}", location);
        }
        Ok(r) if r.status().is_success() => {
            let status: StatusResponse = r.json().await?;
            println!("{}", status.login_status);
        }
        Ok(r) => {
            let status = r.status();
            if let Ok(err) = r.json::<ErrorResponse>().await {
                anyhow::bail!("login failed (HTTP {}): {}", status, err.error);
            } else {
                anyhow::bail!("login failed (HTTP {})", status);
            }
        }
        Err(e) => unreachable(&args.endpoint, &e),
    }

    Ok(())
}
