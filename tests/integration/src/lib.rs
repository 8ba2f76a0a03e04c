//! Fixtures shared by the podcheck integration scenarios.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use podcheck_core::{PipelineConfig, VerificationKind};
use podcheck_crypto::digest_hex;
use podcheck_pipeline::{
    AuthError, AuthorityResolver, Credentials, LoginInfo, LoginProvider, MemoryFetcher,
    Orchestrator, Pipeline,
};

pub const WEBID: &str = "https://alice.solidcommunity.net/profile/card#me";
pub const CARD: &str = "https://alice.solidcommunity.net/profile/card";
pub const SCHUFA: &str = "https://alice.solidcommunity.net/private/info/schufa.rdf";
pub const CALLBACK: &str = "http://localhost:3001/redirect?code=abc&state=xyz";

/// A profile document in Turtle carrying a name and a birthday.
pub fn profile_card(name: &str, birthday: &str) -> String {
    format!(
        "@prefix vcard: <http://www.w3.org/2006/vcard/ns#> .\n\
         @prefix foaf: <http://xmlns.com/foaf/0.1/> .\n\
         <> a foaf:PersonalProfileDocument ; foaf:primaryTopic <#me> .\n\
         <#me> a foaf:Person ;\n\
         \x20   vcard:fn \"{}\" ;\n\
         \x20   vcard:bday \"{}\" .\n",
        name, birthday
    )
}

/// A credit record in XML as stored in the subject's pod.
pub fn credit_record(name: &str, score: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n\
         \x20 <rdf:Description rdf:about=\"#me\">\n\
         \x20   <dc:Name>{}</dc:Name>\n\
         \x20   <dc:SchufaScore>{}</dc:SchufaScore>\n\
         \x20 </rdf:Description>\n\
         </rdf:RDF>\n",
        name, score
    )
}

/// The authority's attestation of a date of birth.
pub fn birth_attestation(birthday: &str) -> String {
    attestation("dc:DateOfBirth", &digest_hex(birthday))
}

/// The authority's attestation of a credit score.
pub fn score_attestation(score: &str) -> String {
    attestation("dc:score", &digest_hex(score))
}

/// An authority record whose tag carries `value` verbatim.
pub fn attestation(tag: &str, value: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n\
         \x20 <rdf:Description>\n\
         \x20   <{tag}>{value}</{tag}>\n\
         \x20 </rdf:Description>\n\
         </rdf:RDF>\n"
    )
}

/// Where the default authority keeps the record for `subject_document`.
pub fn authority_for(kind: VerificationKind, subject_document: &str) -> String {
    let subject = Url::parse(subject_document).expect("fixture URI");
    AuthorityResolver::default()
        .resolve(kind, &subject)
        .expect("fixture resolves")
        .to_string()
}

/// A login provider that completes exactly one login per `login` call.
pub struct ScriptedLogin {
    logged_in: bool,
    pending: AtomicBool,
}

impl ScriptedLogin {
    pub fn accepting() -> Self {
        Self {
            logged_in: true,
            pending: AtomicBool::new(false),
        }
    }

    pub fn refusing() -> Self {
        Self {
            logged_in: false,
            pending: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl LoginProvider for ScriptedLogin {
    async fn login(&self, issuer: &Url, _redirect_target: &Url) -> Result<Url, AuthError> {
        self.pending.store(true, Ordering::SeqCst);
        issuer
            .join("authorize")
            .map_err(|e| AuthError::Discovery(e.to_string()))
    }

    async fn handle_incoming_redirect(
        &self,
        _callback: &Url,
    ) -> Result<Option<LoginInfo>, AuthError> {
        if !self.pending.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        if !self.logged_in {
            return Ok(Some(LoginInfo::rejected()));
        }
        let subject = Url::parse(WEBID).map_err(|e| AuthError::IdToken(e.to_string()))?;
        Ok(Some(LoginInfo {
            is_logged_in: true,
            subject: Some(subject),
            credentials: Some(Credentials::bearer("alice-token")),
        }))
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.pending.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// An orchestrator over an in-memory pod.
pub fn orchestrator(fetcher: Arc<MemoryFetcher>, login: ScriptedLogin) -> Orchestrator {
    let config = PipelineConfig {
        default_credit_resource: Some(SCHUFA.to_string()),
        ..Default::default()
    };
    let redirect_target = Url::parse("http://localhost:3001/redirect").expect("fixture URI");
    Orchestrator::new(Pipeline::new(fetcher, &config), Arc::new(login), redirect_target)
        .with_default_issuer("https://solidcommunity.net/")
        .with_default_credit_resource(config.default_credit_resource.clone())
}
