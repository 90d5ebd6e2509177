use std::io::{stdin, stdout, Write};

use usso::openid::{sreg, BoxError, Client, DiscoveryCache, NonceStore, Request};
use usso::UbuntuSsoServer;

/// Only checks the nonce; a real service must check the assertion signature with the provider.
fn check_nonce(url: &str, _: &dyn DiscoveryCache, nonce_store: &dyn NonceStore) -> Result<String, BoxError> {
    let url = url::Url::parse(url)?;
    let query = |key: &str| {
        url.query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    };

    nonce_store.accept(&query("openid.op_endpoint"), &query("openid.response_nonce"))?;
    Ok(query("openid.claimed_id"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let client = Client::new(UbuntuSsoServer::staging(), check_nonce);

    let request = Request {
        sreg_required: vec![sreg::EMAIL.to_string()],
        sreg_optional: vec![sreg::FULL_NAME.to_string(), sreg::NICKNAME.to_string()],
        teams: vec![String::from("ubuntu-team")],
        ..Request::new("http://localhost:8000/callback")
    };

    println!("Open this URL in a browser:\n\n{}\n", client.redirect_url(&request));

    let mut response_url = String::new();
    print!("Paste the URL you were redirected to: ");
    stdout().flush().unwrap();
    stdin().read_line(&mut response_url).unwrap();

    match client.verify(response_url.trim()) {
        Ok(response) => {
            println!("Logged in as {}.", response.claimed_id);
            println!("Teams: {:?}", response.teams);
            println!("Registration: {:?}", response.sreg);
        },
        Err(error) => Err(format!("{}", error)).unwrap(),
    }
}
