use url::Url;

use crate::error::HarnessError;

/// `{base}/users/{login}`
pub fn user_url(base: &Url, login: &str) -> Result<Url, HarnessError> {
    let login = login.trim();
    if login.is_empty() {
        return Err(HarnessError::invalid_url(base.as_str(), "login cannot be empty"));
    }
    // `.` and `..` would be folded away by the path normalizer
    if login == "." || login == ".." || login.contains(['/', '?', '#']) {
        return Err(HarnessError::invalid_url(
            login,
            "login must be a single path segment",
        ));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| HarnessError::invalid_url(base.as_str(), "base URL cannot carry a path"))?
        .pop_if_empty()
        .extend(["users", login]);
    Ok(url)
}

/// Parse a configured base URL such as `https://api.github.com`
pub fn parse_base(base: &str) -> Result<Url, HarnessError> {
    Url::parse(base.trim()).map_err(|e| HarnessError::invalid_url(base, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_url() {
        let base = parse_base("https://api.github.com").unwrap();
        let url = user_url(&base, "alexander-wiltz").unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/users/alexander-wiltz");
    }

    #[test]
    fn test_user_url_keeps_base_path() {
        let base = parse_base("http://127.0.0.1:8080/api/v3/").unwrap();
        let url = user_url(&base, "octocat").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/v3/users/octocat");
    }

    #[test]
    fn test_user_url_rejects_bad_logins() {
        let base = parse_base("https://api.github.com").unwrap();
        for login in ["", "  ", "a/b", "a?b", "a#b", ".", ".."] {
            assert!(
                matches!(user_url(&base, login), Err(HarnessError::InvalidUrl { .. })),
                "login `{}` should be rejected",
                login
            );
        }
    }
}
