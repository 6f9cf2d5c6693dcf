//! Pages returned from the OAuth callback. Each one posts the outcome to the
//! window that opened the login popup and then closes itself.

use minijinja::{context, Environment};
use once_cell::sync::Lazy;

use crate::model::response::TokenResponse;

const AUTH_SUCCESS_TEMPLATE: &str = include_str!("templates/auth_success.html");
const AUTH_ERROR_TEMPLATE: &str = include_str!("templates/auth_error.html");

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("auth_success.html", AUTH_SUCCESS_TEMPLATE)
        .unwrap();
    env.add_template("auth_error.html", AUTH_ERROR_TEMPLATE)
        .unwrap();
    env
});

pub fn success_page(tokens: &TokenResponse) -> Result<String, minijinja::Error> {
    TEMPLATES
        .get_template("auth_success.html")?
        .render(context! { tokens => tokens })
}

/// `error` is posted to the opener, `notice` is shown in the popup.
pub fn error_page(error: &str, notice: &str) -> Result<String, minijinja::Error> {
    TEMPLATES
        .get_template("auth_error.html")?
        .render(context! { error => error, notice => notice })
}
