use std::io::{stdin, stdout, Write};

use usso::session::SsoError;
use usso::{Credentials, Session, TokenRequest, UbuntuSsoServer};

fn prompt(label: &str) -> String {
    let mut value = String::new();

    print!("{}: ", label);
    stdout().flush().unwrap();
    stdin().read_line(&mut value).unwrap();

    value.trim().to_string()
}

fn prompt_password() -> String {
    rpassword::prompt_password("Ubuntu SSO password: ").unwrap()
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // read email address and password from stdin
    let email = prompt("Ubuntu SSO email");
    let password = prompt_password();

    let session = Session::builder(UbuntuSsoServer::staging()).build().unwrap();
    let mut request = TokenRequest::new(email, password, "usso-rs-demo");

    let credentials: Credentials = match session.get_token(&request).await {
        Ok(credentials) => credentials,
        Err(SsoError::ProviderError(error)) if error.is_two_factor_required() => {
            request = request.otp(prompt("One-time password"));
            session.get_token(&request).await.unwrap()
        },
        Err(error) => Err(format!("{}", error)).unwrap(),
    };

    let account = session.get_account(&credentials).await.unwrap();
    println!("Logged in as {:?}.", account.displayname.unwrap_or_default());

    let path = Credentials::default_path().unwrap();
    credentials.write_to_disk(&path).unwrap();
    println!("Credentials written to {}.", path.display());
}
