//! `podcheck verify`: run a verification pipeline on the server.

use clap::{Args, ValueEnum};

use super::{unreachable, ErrorResponse, StatusResponse, DEFAULT_ENDPOINT};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    DateOfBirth,
    CreditScore,
}

impl Kind {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::DateOfBirth => "date-of-birth",
            Self::CreditScore => "credit-score",
        }
    }
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// What to verify.
    #[arg(value_enum)]
    pub kind: Kind,

    /// Subject document to read the claim from.
    pub resource: String,

    /// Endpoint of the podcheck server.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let url = format!(
        "{}/verify/{}",
        args.endpoint.trim_end_matches('/'),
        args.kind.path_segment()
    );

    let client = reqwest::Client::new();
    let resp = client
        .get(&url)
        .query(&[("resource", args.resource.as_str())])
        .send()
        .await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let status: StatusResponse = r.json().await?;
            let view = match args.kind {
                Kind::DateOfBirth => &status.date_of_birth,
                Kind::CreditScore => &status.credit_score,
            };
            for line in view.status.lines() {
                println!("{}", line);
            }
        }
        Ok(r) => {
            let status = r.status();
            if let Ok(err) = r.json::<ErrorResponse>().await {
                anyhow::bail!("verification failed (HTTP {}): {}", status, err.error);
            } else {
                anyhow::bail!("verification failed (HTTP {})", status);
            }
        }
        Err(e) => unreachable(&args.endpoint, &e),
    }

    Ok(())
}
