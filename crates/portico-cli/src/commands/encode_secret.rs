use anyhow::{Result, bail};
use console::Term;
use portico_core::{Base64Codec, CredentialCodec};

/// Print the encoded form of a secret for `--secret` or a credentials file
///
/// Prompts without echo when no secret is passed.
pub fn execute(secret: Option<String>) -> Result<()> {
    let secret = match secret {
        Some(secret) => secret,
        None => {
            let term = Term::stderr();
            term.write_str("Secret: ")?;
            term.read_secure_line()?
        }
    };

    println!("{}", encode(&secret)?);
    Ok(())
}

fn encode(secret: &str) -> Result<String> {
    if secret.is_empty() {
        bail!("secret must not be empty");
    }
    Ok(Base64Codec.encrypt(secret))
}
