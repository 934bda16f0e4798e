use zeroize::Zeroizing;

use crate::prompt::prompt_hidden;

pub(crate) const PASSWORD_ENV_VAR: &str = "INFBK_PASSWORD";

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn env_password() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV_VAR)
        .ok()
        .filter(|p| !p.is_empty())
        .map(Zeroizing::new)
}

/// Password for opening an existing archive.
pub(crate) fn get_password(archive: &str) -> CliResult<Zeroizing<String>> {
    if let Some(pass) = env_password() {
        return Ok(pass);
    }
    Ok(Zeroizing::new(prompt_hidden(&format!(
        "Enter password for '{archive}': "
    ))?))
}

/// Password for a new archive, entered twice when prompted.
pub(crate) fn get_new_password() -> CliResult<Zeroizing<String>> {
    if let Some(pass) = env_password() {
        return Ok(pass);
    }
    let p1 = Zeroizing::new(prompt_hidden("Enter archive password: ")?);
    let p2 = Zeroizing::new(prompt_hidden("Confirm archive password: ")?);
    if *p1 != *p2 {
        return Err("passwords do not match".into());
    }
    Ok(p1)
}
